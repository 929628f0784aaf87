//! Processing strategies
//!
//! Five tiers trade output quality against latency, from an instant string
//! transform up to streamed, concurrent chunk rewriting. The
//! [`StrategyClassifier`] picks one per request.

mod classifier;

pub use classifier::{
    ProcessingDecision, ProcessingPreferences, StrategyAlternative, StrategyClassifier,
    StrategyRecommendation,
};

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Processing tier, ordered from fastest to highest quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStrategy {
    /// Instant string transform, no model
    Micro,
    /// Single fast model call
    Express,
    /// Single full model call
    Standard,
    /// Chunked rewrite on a small worker pool
    Chunked,
    /// Chunked rewrite reporting each chunk as it completes
    Progressive,
}

/// Tier-specific parameters derived from the input size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierParams {
    /// Expected wall-clock seconds
    pub estimated_time: f64,
    pub chunk_count: usize,
    pub max_tokens: usize,
    pub concurrency: usize,
    pub temperature: f32,
}

impl ProcessingStrategy {
    pub const ALL: [ProcessingStrategy; 5] = [
        ProcessingStrategy::Micro,
        ProcessingStrategy::Express,
        ProcessingStrategy::Standard,
        ProcessingStrategy::Chunked,
        ProcessingStrategy::Progressive,
    ];

    /// Strategy name for logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            ProcessingStrategy::Micro => "micro",
            ProcessingStrategy::Express => "express",
            ProcessingStrategy::Standard => "standard",
            ProcessingStrategy::Chunked => "chunked",
            ProcessingStrategy::Progressive => "progressive",
        }
    }

    /// Largest input length (in characters) this tier is the base choice for
    pub fn length_threshold(&self) -> Option<usize> {
        match self {
            ProcessingStrategy::Micro => Some(50),
            ProcessingStrategy::Express => Some(150),
            ProcessingStrategy::Standard => Some(500),
            ProcessingStrategy::Chunked => Some(2000),
            ProcessingStrategy::Progressive => None,
        }
    }

    /// Base tier for an input of `length` characters
    pub fn for_length(length: usize) -> Self {
        Self::ALL
            .into_iter()
            .find(|tier| tier.length_threshold().map_or(true, |max| length <= max))
            .unwrap_or(ProcessingStrategy::Progressive)
    }

    /// Expected output quality in `[0, 1]`
    pub fn quality_weight(&self) -> f64 {
        match self {
            ProcessingStrategy::Micro => 0.3,
            ProcessingStrategy::Express => 0.6,
            ProcessingStrategy::Standard => 0.8,
            ProcessingStrategy::Chunked => 0.85,
            ProcessingStrategy::Progressive => 0.9,
        }
    }

    pub fn speed_score(&self) -> f64 {
        1.0 - self.quality_weight()
    }

    pub fn uses_model(&self) -> bool {
        !matches!(self, ProcessingStrategy::Micro)
    }

    /// Check if this strategy splits work across workers
    pub fn supports_parallel(&self) -> bool {
        matches!(
            self,
            ProcessingStrategy::Chunked | ProcessingStrategy::Progressive
        )
    }

    /// Check if this strategy reports chunks as they complete
    pub fn supports_streaming(&self) -> bool {
        matches!(self, ProcessingStrategy::Progressive)
    }

    /// Parameters for an input of `length` characters and `word_count` words
    pub fn params(&self, length: usize, word_count: usize) -> TierParams {
        let length_f = length as f64;
        match self {
            ProcessingStrategy::Micro => TierParams {
                estimated_time: 0.1,
                chunk_count: 1,
                max_tokens: 10,
                concurrency: 1,
                temperature: 0.0,
            },
            ProcessingStrategy::Express => TierParams {
                estimated_time: (length_f / 50.0).min(3.0),
                chunk_count: 1,
                max_tokens: (word_count + 10).min(30),
                concurrency: 1,
                temperature: 0.1,
            },
            ProcessingStrategy::Standard => TierParams {
                estimated_time: (length_f / 30.0).min(8.0),
                chunk_count: 1,
                max_tokens: (word_count * 2).min(80),
                concurrency: 1,
                temperature: 0.3,
            },
            ProcessingStrategy::Chunked => {
                let chunk_count = (length / 200).max(1);
                TierParams {
                    estimated_time: chunk_count as f64 * 4.0,
                    chunk_count,
                    max_tokens: 50,
                    concurrency: chunk_count.min(2),
                    temperature: 0.2,
                }
            }
            ProcessingStrategy::Progressive => {
                let chunk_count = (length / 150).max(1);
                TierParams {
                    estimated_time: chunk_count as f64 * 3.0,
                    chunk_count,
                    max_tokens: 60,
                    concurrency: 2,
                    temperature: 0.2,
                }
            }
        }
    }
}

impl fmt::Display for ProcessingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProcessingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown processing strategy '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_thresholds() {
        assert_eq!(ProcessingStrategy::for_length(0), ProcessingStrategy::Micro);
        assert_eq!(ProcessingStrategy::for_length(50), ProcessingStrategy::Micro);
        assert_eq!(ProcessingStrategy::for_length(51), ProcessingStrategy::Express);
        assert_eq!(ProcessingStrategy::for_length(150), ProcessingStrategy::Express);
        assert_eq!(ProcessingStrategy::for_length(500), ProcessingStrategy::Standard);
        assert_eq!(ProcessingStrategy::for_length(2000), ProcessingStrategy::Chunked);
        assert_eq!(ProcessingStrategy::for_length(2001), ProcessingStrategy::Progressive);
    }

    #[test]
    fn test_quality_and_speed() {
        assert_eq!(ProcessingStrategy::Chunked.quality_weight(), 0.85);
        assert!((ProcessingStrategy::Micro.speed_score() - 0.7).abs() < 1e-9);
        assert!(!ProcessingStrategy::Micro.uses_model());
        assert!(ProcessingStrategy::Progressive.supports_streaming());
        assert!(ProcessingStrategy::Chunked.supports_parallel());
        assert!(!ProcessingStrategy::Standard.supports_parallel());
    }

    #[test]
    fn test_params() {
        let express = ProcessingStrategy::Express.params(100, 18);
        assert_eq!(express.estimated_time, 2.0);
        assert_eq!(express.max_tokens, 28);

        let standard = ProcessingStrategy::Standard.params(450, 80);
        assert_eq!(standard.estimated_time, 8.0);
        assert_eq!(standard.max_tokens, 80);

        let chunked = ProcessingStrategy::Chunked.params(2200, 400);
        assert_eq!(chunked.chunk_count, 11);
        assert_eq!(chunked.estimated_time, 44.0);
        assert_eq!(chunked.concurrency, 2);

        let small_chunked = ProcessingStrategy::Chunked.params(150, 30);
        assert_eq!(small_chunked.chunk_count, 1);
        assert_eq!(small_chunked.concurrency, 1);

        let progressive = ProcessingStrategy::Progressive.params(3000, 500);
        assert_eq!(progressive.chunk_count, 20);
        assert_eq!(progressive.estimated_time, 60.0);
    }

    #[test]
    fn test_parse_and_order() {
        assert_eq!("Chunked".parse::<ProcessingStrategy>(), Ok(ProcessingStrategy::Chunked));
        assert!("batch".parse::<ProcessingStrategy>().is_err());
        assert!(ProcessingStrategy::Micro < ProcessingStrategy::Progressive);
    }
}
