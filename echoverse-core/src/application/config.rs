//! Pipeline tuning and the shared processing error
//!
//! [`ProcessorConfig`] sizes the spans the chunker emits, caps the rewrite
//! pool and the results cache, and tunes the speed guard. Every component in
//! `application` reports failures as a [`ProcessingError`].

use crate::application::speed_guard::ReprobePolicy;
use std::time::Duration;
use thiserror::Error;

/// Knobs for chunking, rewriting and the speed guard
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    /// Largest span handed to the rewriter, in characters
    pub max_chunk_size: usize,
    /// Spans below this many characters are folded into a neighbour
    pub min_chunk_size: usize,
    /// Words of neighbouring text shown alongside a span (split across both sides)
    pub overlap_size: usize,
    /// Whether spans carry neighbour context into the rewrite prompt
    pub overlap_context: bool,
    /// Rewrites allowed in flight at once
    pub max_concurrency: usize,
    /// Entries kept by the rewrite cache before the oldest is dropped
    pub cache_capacity: usize,
    /// A probe slower than this switches the pipeline to lexical transforms
    pub slow_threshold: Duration,
    pub reprobe: ReprobePolicy,
    /// Below this length the progressive tier skips chunking
    pub progressive_direct_limit: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 200,
            min_chunk_size: 50,
            overlap_size: 30,
            overlap_context: false,
            max_concurrency: 2,
            cache_capacity: 50,
            slow_threshold: Duration::from_secs(15),
            reprobe: ReprobePolicy::Never,
            progressive_direct_limit: 300,
        }
    }
}

impl ProcessorConfig {
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::new()
    }

    /// Reject settings the chunker, pool or cache cannot work with
    pub fn validate(&self) -> ProcessingResult<()> {
        let reason = if self.max_chunk_size == 0 {
            "Max chunk size must be greater than 0"
        } else if self.min_chunk_size > self.max_chunk_size {
            "Min chunk size must not exceed max chunk size"
        } else if self.max_concurrency == 0 {
            "Max concurrency must be greater than 0"
        } else if self.cache_capacity == 0 {
            "Cache capacity must be greater than 0"
        } else if self.reprobe == ReprobePolicy::EveryRequests(0) {
            "Re-probe interval must be at least one request"
        } else {
            return Ok(());
        };

        Err(ProcessingError::InvalidConfig {
            reason: reason.to_string(),
        })
    }
}

/// Failures raised while chunking or rewriting
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The rayon pool for a run could not be started
    #[error("Failed to build worker pool")]
    WorkerPool {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Rewrite worker panicked: {0}")]
    WorkerPanic(String),

    #[error("Other error: {0}")]
    Other(String),
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Chained setters over [`ProcessorConfig::default`]
#[derive(Debug, Clone, Default)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_chunk_size(mut self, chars: usize) -> Self {
        self.config.max_chunk_size = chars;
        self
    }

    pub fn min_chunk_size(mut self, chars: usize) -> Self {
        self.config.min_chunk_size = chars;
        self
    }

    pub fn overlap_size(mut self, words: usize) -> Self {
        self.config.overlap_size = words;
        self
    }

    /// Show each span's neighbours to the model; only the span itself is rewritten
    pub fn overlap_context(mut self, enabled: bool) -> Self {
        self.config.overlap_context = enabled;
        self
    }

    pub fn max_concurrency(mut self, workers: usize) -> Self {
        self.config.max_concurrency = workers;
        self
    }

    pub fn cache_capacity(mut self, entries: usize) -> Self {
        self.config.cache_capacity = entries;
        self
    }

    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.config.slow_threshold = threshold;
        self
    }

    pub fn reprobe(mut self, policy: ReprobePolicy) -> Self {
        self.config.reprobe = policy;
        self
    }

    pub fn progressive_direct_limit(mut self, chars: usize) -> Self {
        self.config.progressive_direct_limit = chars;
        self
    }

    pub fn build(self) -> ProcessingResult<ProcessorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Skip validation; lets tests construct degenerate configs
    pub fn build_unchecked(self) -> ProcessorConfig {
        self.config
    }
}
