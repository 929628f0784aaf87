//! Strategy classification
//!
//! Maps text metrics and user preferences to a processing tier. The mapping
//! is a pure function of its inputs.

use super::{ProcessingStrategy, TierParams};
use crate::domain::analysis::{analyze, StructureMetrics};
use serde::Serialize;

/// Fast mode downgrades a tier while quality preference stays below this.
const FAST_MODE_QUALITY_CEILING: f64 = 0.7;
/// Quality preference above which small inputs are upgraded.
const UPGRADE_QUALITY_FLOOR: f64 = 0.8;
/// Complexity above which complex text is upgraded...
const COMPLEX_TEXT_THRESHOLD: f64 = 0.7;
/// ...provided quality preference exceeds this.
const COMPLEX_TEXT_QUALITY_FLOOR: f64 = 0.6;

/// User preferences that steer tier selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProcessingPreferences {
    /// Prefer faster tiers
    pub ultra_fast: bool,
    /// 0.0 favours speed, 1.0 favours quality
    pub quality_preference: f64,
}

impl Default for ProcessingPreferences {
    fn default() -> Self {
        Self {
            ultra_fast: true,
            quality_preference: 0.5,
        }
    }
}

/// A tier that fits a time budget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyAlternative {
    pub strategy: ProcessingStrategy,
    pub estimated_time: f64,
    pub quality_score: f64,
}

/// Recommended tier plus alternatives within the budget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyRecommendation {
    pub recommended: ProcessingStrategy,
    pub estimated_time: f64,
    pub quality_score: f64,
    pub alternatives: Vec<StrategyAlternative>,
}

/// Outcome of classifying one request. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingDecision {
    pub strategy: ProcessingStrategy,
    /// Tier chosen by length alone, before preference adjustment
    pub base_strategy: ProcessingStrategy,
    pub text_length: usize,
    pub word_count: usize,
    pub complexity_score: f64,
    pub estimated_time: f64,
    pub chunk_count: usize,
    pub max_tokens: usize,
    pub concurrency: usize,
    pub temperature: f32,
    pub quality_score: f64,
    pub speed_score: f64,
    pub uses_model: bool,
    pub streaming: bool,
}

impl ProcessingDecision {
    fn new(
        strategy: ProcessingStrategy,
        base_strategy: ProcessingStrategy,
        metrics: &StructureMetrics,
    ) -> Self {
        let TierParams {
            estimated_time,
            chunk_count,
            max_tokens,
            concurrency,
            temperature,
        } = strategy.params(metrics.length, metrics.word_count);

        Self {
            strategy,
            base_strategy,
            text_length: metrics.length,
            word_count: metrics.word_count,
            complexity_score: metrics.complexity_score,
            estimated_time,
            chunk_count,
            max_tokens,
            concurrency,
            temperature,
            quality_score: strategy.quality_weight(),
            speed_score: strategy.speed_score(),
            uses_model: strategy.uses_model(),
            streaming: strategy.supports_streaming(),
        }
    }
}

/// Selects a processing tier per request
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyClassifier;

impl StrategyClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify `text` under the given preferences
    pub fn classify(&self, text: &str, preferences: ProcessingPreferences) -> ProcessingDecision {
        self.classify_metrics(&analyze(text), preferences)
    }

    /// Classify pre-computed metrics
    pub fn classify_metrics(
        &self,
        metrics: &StructureMetrics,
        preferences: ProcessingPreferences,
    ) -> ProcessingDecision {
        let base = ProcessingStrategy::for_length(metrics.length);
        let strategy = Self::select(
            metrics.length,
            preferences.ultra_fast,
            preferences.quality_preference,
            metrics.complexity_score,
        );

        log::debug!(
            "Classified {} chars (complexity {:.2}): {} -> {}",
            metrics.length,
            metrics.complexity_score,
            base,
            strategy
        );

        ProcessingDecision::new(strategy, base, metrics)
    }

    /// Decision for a forced tier, e.g. when evaluating alternatives
    pub fn decision_for(
        &self,
        strategy: ProcessingStrategy,
        metrics: &StructureMetrics,
    ) -> ProcessingDecision {
        ProcessingDecision::new(
            strategy,
            ProcessingStrategy::for_length(metrics.length),
            metrics,
        )
    }

    /// Recommended tier; with a budget, every tier estimated to fit it
    pub fn recommend(
        &self,
        metrics: &StructureMetrics,
        preferences: ProcessingPreferences,
        time_budget: Option<f64>,
    ) -> StrategyRecommendation {
        let decision = self.classify_metrics(metrics, preferences);

        let alternatives = time_budget
            .map(|budget| {
                ProcessingStrategy::ALL
                    .into_iter()
                    .map(|strategy| self.decision_for(strategy, metrics))
                    .filter(|d| d.estimated_time <= budget)
                    .map(|d| StrategyAlternative {
                        strategy: d.strategy,
                        estimated_time: d.estimated_time,
                        quality_score: d.quality_score,
                    })
                    .collect()
            })
            .unwrap_or_default();

        StrategyRecommendation {
            recommended: decision.strategy,
            estimated_time: decision.estimated_time,
            quality_score: decision.quality_score,
            alternatives,
        }
    }

    /// Pure tier selection.
    ///
    /// Fast mode with modest quality preference downgrades one tier and is final.
    /// Otherwise a strong quality preference upgrades the two smallest tiers,
    /// then complex text with a decent quality preference is upgraded once.
    pub fn select(
        length: usize,
        ultra_fast: bool,
        quality_preference: f64,
        complexity: f64,
    ) -> ProcessingStrategy {
        use ProcessingStrategy::*;

        let base = ProcessingStrategy::for_length(length);

        if ultra_fast && quality_preference < FAST_MODE_QUALITY_CEILING {
            return match base {
                Standard => Express,
                Chunked => Standard,
                Progressive => Chunked,
                other => other,
            };
        }

        if quality_preference > UPGRADE_QUALITY_FLOOR {
            match base {
                Micro => return Express,
                Express => return Standard,
                _ => {}
            }
        }

        if complexity > COMPLEX_TEXT_THRESHOLD && quality_preference > COMPLEX_TEXT_QUALITY_FLOOR {
            return match base {
                Express => Standard,
                Standard => Chunked,
                other => other,
            };
        }

        base
    }
}
