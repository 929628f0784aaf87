//! Adaptive processing
//!
//! Classifies each request, executes the chosen tier and records how long it
//! took. Per-bucket timing history feeds [`AdaptiveProcessor::performance_stats`]
//! and budget-aware [`AdaptiveProcessor::recommend_strategy`].

use crate::application::chunking::DocumentChunker;
use crate::application::config::ProcessorConfig;
use crate::application::orchestrator::{ChunkOrchestrator, ChunkOutcome, ChunkProgress};
use crate::application::rewriter::{RewriteOptions, Rewriter};
use crate::application::strategies::{
    ProcessingDecision, ProcessingPreferences, ProcessingStrategy, StrategyClassifier,
    StrategyRecommendation,
};
use crate::domain::analysis::analyze;
use crate::domain::span::{recombine, ChunkPlan};
use crate::domain::tone::{quick_transform, Tone};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Timing samples kept per (tier, length bucket).
const HISTORY_WINDOW: usize = 10;
/// Width of a length bucket in characters.
const LENGTH_BUCKET: usize = 100;
/// Actual times below this are clamped when computing efficiency.
const MIN_MEASURED_SECS: f64 = 0.1;

/// Progress notifications emitted while a request is processed
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Classification finished
    Analysis {
        strategy: ProcessingStrategy,
        text_length: usize,
        estimated_time: f64,
    },
    /// The chunk plan is ready
    ChunksCreated { count: usize },
    /// One chunk finished; `partial_text` joins every chunk finished so far in order
    ChunkComplete {
        outcome: ChunkOutcome,
        partial_text: String,
    },
    Progress(ChunkProgress),
    /// Final text is available
    Complete { text: String },
}

/// What happened while processing one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingReport {
    pub strategy: ProcessingStrategy,
    pub base_strategy: ProcessingStrategy,
    /// Model-free lexical substitution was used instead of the adaptive path
    pub string_optimized: bool,
    pub text_length: usize,
    pub processing_time: f64,
    pub estimated_time: f64,
    pub time_saved: f64,
    pub efficiency_ratio: f64,
    pub quality_score: f64,
    pub chunk_count: usize,
    pub chunk_failures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The model ran out of memory or disk; the output is not usable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_error: Option<String>,
}

impl ProcessingReport {
    fn from_decision(decision: &ProcessingDecision, elapsed: f64) -> Self {
        Self {
            strategy: decision.strategy,
            base_strategy: decision.base_strategy,
            string_optimized: false,
            text_length: decision.text_length,
            processing_time: elapsed,
            estimated_time: decision.estimated_time,
            time_saved: (decision.estimated_time - elapsed).max(0.0),
            efficiency_ratio: decision.estimated_time / elapsed.max(MIN_MEASURED_SECS),
            quality_score: decision.quality_score,
            chunk_count: decision.chunk_count,
            chunk_failures: 0,
            error: None,
            resource_error: None,
        }
    }
}

/// Timing statistics for one (tier, length bucket)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub strategy: ProcessingStrategy,
    /// Lower bound of the length bucket in characters
    pub length_bucket: usize,
    pub avg_time: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub sample_count: usize,
}

/// Rolling timing history
#[derive(Debug, Default)]
pub struct PerformanceHistory {
    samples: BTreeMap<(ProcessingStrategy, usize), VecDeque<f64>>,
}

impl PerformanceHistory {
    pub fn record(&mut self, strategy: ProcessingStrategy, text_length: usize, seconds: f64) {
        let bucket = text_length / LENGTH_BUCKET * LENGTH_BUCKET;
        let times = self.samples.entry((strategy, bucket)).or_default();
        times.push_back(seconds);
        while times.len() > HISTORY_WINDOW {
            times.pop_front();
        }
    }

    pub fn stats(&self) -> Vec<PerformanceStats> {
        self.samples
            .iter()
            .filter(|(_, times)| !times.is_empty())
            .map(|(&(strategy, length_bucket), times)| PerformanceStats {
                strategy,
                length_bucket,
                avg_time: times.iter().sum::<f64>() / times.len() as f64,
                min_time: times.iter().copied().fold(f64::INFINITY, f64::min),
                max_time: times.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                sample_count: times.len(),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Executes the tier the classifier selects
pub struct AdaptiveProcessor {
    rewriter: Arc<dyn Rewriter>,
    classifier: StrategyClassifier,
    chunker: DocumentChunker,
    max_concurrency: usize,
    overlap_context: bool,
    progressive_direct_limit: usize,
    history: Mutex<PerformanceHistory>,
}

impl std::fmt::Debug for AdaptiveProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveProcessor")
            .field("chunker", &self.chunker)
            .field("max_concurrency", &self.max_concurrency)
            .field("overlap_context", &self.overlap_context)
            .field("progressive_direct_limit", &self.progressive_direct_limit)
            .finish()
    }
}

impl AdaptiveProcessor {
    pub fn new(rewriter: Arc<dyn Rewriter>, config: &ProcessorConfig) -> Self {
        Self {
            rewriter,
            classifier: StrategyClassifier::new(),
            chunker: DocumentChunker::from_config(config),
            max_concurrency: config.max_concurrency,
            overlap_context: config.overlap_context,
            progressive_direct_limit: config.progressive_direct_limit,
            history: Mutex::new(PerformanceHistory::default()),
        }
    }

    pub fn classifier(&self) -> &StrategyClassifier {
        &self.classifier
    }

    pub fn chunker(&self) -> &DocumentChunker {
        &self.chunker
    }

    /// Process `text` in `tone`; never fails, returning the original text on error
    pub fn process(
        &self,
        text: &str,
        tone: Tone,
        preferences: ProcessingPreferences,
    ) -> (String, ProcessingReport) {
        self.process_with_events(text, tone, preferences, |_| {})
    }

    /// Like [`process`](Self::process), emitting [`ProgressEvent`]s
    pub fn process_with_events<F>(
        &self,
        text: &str,
        tone: Tone,
        preferences: ProcessingPreferences,
        mut on_event: F,
    ) -> (String, ProcessingReport)
    where
        F: FnMut(ProgressEvent),
    {
        let decision = self.classifier.classify(text, preferences);
        log::info!(
            "Using {} strategy for {} char text",
            decision.strategy,
            decision.text_length
        );
        on_event(ProgressEvent::Analysis {
            strategy: decision.strategy,
            text_length: decision.text_length,
            estimated_time: decision.estimated_time,
        });

        let started = Instant::now();
        let executed = self.execute(text, tone, &decision, &mut on_event);
        let elapsed = started.elapsed().as_secs_f64();

        let mut report = ProcessingReport::from_decision(&decision, elapsed);
        let output = match executed {
            Ok(run) => {
                self.lock_history().record(decision.strategy, decision.text_length, elapsed);
                report.chunk_count = run.chunk_count;
                report.chunk_failures = run.failures;
                run.text
            }
            Err(e) => {
                log::error!("Error in adaptive processing: {e}");
                report.error = Some(e.to_string());
                text.to_string()
            }
        };

        on_event(ProgressEvent::Complete {
            text: output.clone(),
        });
        (output, report)
    }

    fn execute<F>(
        &self,
        text: &str,
        tone: Tone,
        decision: &ProcessingDecision,
        on_event: &mut F,
    ) -> Result<TierRun, crate::application::config::ProcessingError>
    where
        F: FnMut(ProgressEvent),
    {
        let fast = RewriteOptions::fast().with_hint(decision.max_tokens, decision.temperature);

        match decision.strategy {
            ProcessingStrategy::Micro => Ok(TierRun::single(quick_transform(text, tone))),
            ProcessingStrategy::Express => Ok(TierRun::single(self.rewrite_whole(text, tone, &fast))),
            ProcessingStrategy::Standard => {
                let full = RewriteOptions::full().with_hint(decision.max_tokens, decision.temperature);
                Ok(TierRun::single(self.rewrite_whole(text, tone, &full)))
            }
            ProcessingStrategy::Chunked => {
                let plan = self.plan(text);
                on_event(ProgressEvent::ChunksCreated { count: plan.len() });
                let orchestrator = ChunkOrchestrator::new(self.workers(decision)).with_options(fast);
                let output = orchestrator.run(&plan.spans, tone, self.rewriter.as_ref())?;
                Ok(TierRun {
                    text: output.join(&plan.spans),
                    chunk_count: plan.len(),
                    failures: output.failures(),
                })
            }
            ProcessingStrategy::Progressive => {
                if text.chars().count() < self.progressive_direct_limit {
                    return Ok(TierRun::single(self.rewrite_whole(text, tone, &fast)));
                }

                let plan = self.plan(text);
                on_event(ProgressEvent::ChunksCreated { count: plan.len() });

                let mut finished: Vec<Option<String>> = vec![None; plan.len()];
                let orchestrator = ChunkOrchestrator::new(self.workers(decision)).with_options(fast);
                let output = orchestrator.run_streaming(
                    &plan.spans,
                    tone,
                    self.rewriter.as_ref(),
                    |outcome, progress| {
                        if let Some(slot) = plan.spans.iter().position(|s| s.index == outcome.index) {
                            finished[slot] = Some(outcome.text.clone());
                        }
                        on_event(ProgressEvent::ChunkComplete {
                            outcome: outcome.clone(),
                            partial_text: partial_text(&plan, &finished),
                        });
                        on_event(ProgressEvent::Progress(progress));
                    },
                )?;

                Ok(TierRun {
                    text: output.join(&plan.spans),
                    chunk_count: plan.len(),
                    failures: output.failures(),
                })
            }
        }
    }

    fn rewrite_whole(&self, text: &str, tone: Tone, options: &RewriteOptions) -> String {
        self.rewriter
            .rewrite(text, tone, options)
            .unwrap_or_else(|e| {
                log::warn!("Rewrite failed, keeping original text: {e}");
                text.to_string()
            })
    }

    fn plan(&self, text: &str) -> ChunkPlan {
        let plan = self.chunker.chunk(text);
        if self.overlap_context {
            self.chunker.with_overlap(plan)
        } else {
            plan
        }
    }

    fn workers(&self, decision: &ProcessingDecision) -> usize {
        decision.concurrency.min(self.max_concurrency).max(1)
    }

    /// Timing statistics per tier and length bucket
    pub fn performance_stats(&self) -> Vec<PerformanceStats> {
        self.lock_history().stats()
    }

    pub fn clear_performance_history(&self) {
        self.lock_history().clear();
    }

    /// Recommended tier for `text`; with a budget, every tier estimated to fit it
    pub fn recommend_strategy(
        &self,
        text: &str,
        preferences: ProcessingPreferences,
        time_budget: Option<f64>,
    ) -> StrategyRecommendation {
        self.classifier.recommend(&analyze(text), preferences, time_budget)
    }

    fn lock_history(&self) -> MutexGuard<'_, PerformanceHistory> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct TierRun {
    text: String,
    chunk_count: usize,
    failures: usize,
}

impl TierRun {
    fn single(text: String) -> Self {
        Self {
            text,
            chunk_count: 1,
            failures: 0,
        }
    }
}

fn partial_text(plan: &ChunkPlan, finished: &[Option<String>]) -> String {
    let (spans, texts): (Vec<_>, Vec<_>) = plan
        .spans
        .iter()
        .zip(finished)
        .filter_map(|(span, text)| text.as_deref().map(|t| (span.clone(), t)))
        .unzip();
    recombine(&spans, &texts)
}
