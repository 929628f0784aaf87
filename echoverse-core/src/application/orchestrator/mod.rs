//! Chunk orchestration
//!
//! Runs the rewriter over every span of a plan and reassembles the results in
//! index order. Two spans or fewer run sequentially; larger plans fan out on a
//! bounded worker pool. A failing chunk keeps its original text and never
//! aborts the batch.

mod concurrent;
mod sequential;
mod streaming;

use crate::application::config::ProcessingResult;
use crate::application::rewriter::{RewriteOptions, Rewriter};
use crate::domain::span::{recombine, TextSpan};
use crate::domain::tone::Tone;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Plans with at most this many spans are never fanned out.
pub const SEQUENTIAL_LIMIT: usize = 2;

/// Result of rewriting one span
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkOutcome {
    /// Index of the span this outcome belongs to
    pub index: usize,
    pub text: String,
    /// Set when the rewrite failed and `text` is the original span text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChunkOutcome {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// How a plan was executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Sequential,
    Concurrent,
    Streaming,
}

/// Ordered outcomes for a whole plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestrationOutput {
    /// One outcome per input span, in span order
    pub outcomes: Vec<ChunkOutcome>,
    pub mode: ExecutionMode,
    /// Worker threads used
    pub workers: usize,
}

impl OrchestrationOutput {
    /// Rewritten texts joined in span order, restoring paragraph breaks
    pub fn join(&self, spans: &[TextSpan]) -> String {
        let texts: Vec<&str> = self.outcomes.iter().map(|o| o.text.as_str()).collect();
        recombine(spans, &texts)
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.failed()).count()
    }
}

/// Progress of a streaming run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProgress {
    pub completed: usize,
    pub total: usize,
}

impl ChunkProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Dispatches span rewrites sequentially or over a bounded pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkOrchestrator {
    concurrency: usize,
    options: RewriteOptions,
}

impl Default for ChunkOrchestrator {
    fn default() -> Self {
        Self::new(2)
    }
}

impl ChunkOrchestrator {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            options: RewriteOptions::fast(),
        }
    }

    /// Rewrite options applied to every span
    pub fn with_options(mut self, options: RewriteOptions) -> Self {
        self.options = options;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Workers used for `span_count` spans
    pub fn pool_size(&self, span_count: usize) -> usize {
        self.concurrency.min(span_count).max(1)
    }

    /// Rewrite all spans; outcomes come back in span order
    pub fn run(
        &self,
        spans: &[TextSpan],
        tone: Tone,
        rewriter: &dyn Rewriter,
    ) -> ProcessingResult<OrchestrationOutput> {
        if spans.len() <= SEQUENTIAL_LIMIT || self.concurrency == 1 {
            return Ok(OrchestrationOutput {
                outcomes: sequential::run(spans, tone, rewriter, &self.options),
                mode: ExecutionMode::Sequential,
                workers: 1,
            });
        }

        let workers = self.pool_size(spans.len());
        log::debug!("Rewriting {} spans on {} workers", spans.len(), workers);

        Ok(OrchestrationOutput {
            outcomes: concurrent::run(spans, tone, rewriter, &self.options, workers)?,
            mode: ExecutionMode::Concurrent,
            workers,
        })
    }

    /// Like [`run`](Self::run), reporting each outcome to `observer` as soon
    /// as it completes (completion order, not span order)
    pub fn run_streaming<F>(
        &self,
        spans: &[TextSpan],
        tone: Tone,
        rewriter: &dyn Rewriter,
        mut observer: F,
    ) -> ProcessingResult<OrchestrationOutput>
    where
        F: FnMut(&ChunkOutcome, ChunkProgress),
    {
        if spans.len() <= SEQUENTIAL_LIMIT {
            let total = spans.len();
            let outcomes: Vec<ChunkOutcome> = spans
                .iter()
                .enumerate()
                .map(|(i, span)| {
                    let outcome = rewrite_span(rewriter, span, tone, &self.options);
                    observer(&outcome, ChunkProgress { completed: i + 1, total });
                    outcome
                })
                .collect();

            return Ok(OrchestrationOutput {
                outcomes,
                mode: ExecutionMode::Sequential,
                workers: 1,
            });
        }

        let workers = self.pool_size(spans.len());
        Ok(OrchestrationOutput {
            outcomes: streaming::run(spans, tone, rewriter, &self.options, workers, &mut observer)?,
            mode: ExecutionMode::Streaming,
            workers,
        })
    }
}

/// Rewrite one span, converting errors and panics into a tagged original
pub(crate) fn rewrite_span(
    rewriter: &dyn Rewriter,
    span: &TextSpan,
    tone: Tone,
    options: &RewriteOptions,
) -> ChunkOutcome {
    let attempt = catch_unwind(AssertUnwindSafe(|| {
        rewriter.rewrite_in_context(&span.text, span.context.as_deref(), tone, options)
    }));

    let error = match attempt {
        Ok(Ok(text)) => {
            return ChunkOutcome {
                index: span.index,
                text,
                error: None,
            }
        }
        Ok(Err(e)) => e.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };

    log::warn!("Chunk {} failed, keeping original text: {}", span.index, error);
    ChunkOutcome {
        index: span.index,
        text: span.text.clone(),
        error: Some(error),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {s}")
    } else {
        "worker panicked".to_string()
    }
}
