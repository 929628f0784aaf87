//! Output formatting module

use anyhow::Result;
use echoverse_core::domain::span::SpanKind;
use echoverse_core::application::StrategyRecommendation;
use echoverse_core::{
    analyze, ChunkRoute, Config, DocumentChunker, ProcessingDecision, StrategyClassifier,
    StructureMetrics,
};
use serde::Serialize;

/// Characters of span text shown in a report
const PREVIEW_CHARS: usize = 60;

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Format and output one analysed document
    fn format_analysis(&mut self, report: &AnalysisReport) -> Result<()>;

    /// Finalize output (e.g., close JSON array)
    fn finish(&mut self) -> Result<()>;
}

pub mod json;
pub mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

/// Everything `echoverse analyze` reports about one document
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// File path or `<text>`
    pub source: String,
    pub metrics: StructureMetrics,
    pub decision: ProcessingDecision,
    pub route: ChunkRoute,
    pub spans: Vec<SpanSummary>,
    /// Tiers that fit the requested time budget
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetReport {
    pub seconds: f64,
    pub recommendation: StrategyRecommendation,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpanSummary {
    pub index: usize,
    pub kind: SpanKind,
    pub chars: usize,
    pub starts_paragraph: bool,
    pub preview: String,
}

impl AnalysisReport {
    /// Analyse `text` with the chunking and tier settings of `config`
    pub fn build(
        source: impl Into<String>,
        text: &str,
        config: &Config,
        budget: Option<f64>,
    ) -> Self {
        let classifier = StrategyClassifier::new();
        let metrics = analyze(text);
        let decision = classifier.classify_metrics(&metrics, config.preferences());
        let budget = budget.map(|seconds| BudgetReport {
            seconds,
            recommendation: classifier.recommend(&metrics, config.preferences(), Some(seconds)),
        });
        let plan = DocumentChunker::from_config(config.processor()).chunk(text);

        let spans = plan
            .spans
            .iter()
            .map(|span| SpanSummary {
                index: span.index,
                kind: span.kind,
                chars: span.char_len(),
                starts_paragraph: span.starts_paragraph,
                preview: preview(&span.text),
            })
            .collect();

        Self {
            source: source.into(),
            metrics,
            decision,
            route: plan.route,
            spans,
            budget,
        }
    }
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    }
}
