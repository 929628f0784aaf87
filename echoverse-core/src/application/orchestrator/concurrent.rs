//! Fan-out on a bounded worker pool with an order-preserving join

use super::ChunkOutcome;
use crate::application::config::ProcessingResult;
use crate::application::rewriter::{RewriteOptions, Rewriter};
use crate::domain::span::TextSpan;
use crate::domain::tone::Tone;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
pub(super) fn run(
    spans: &[TextSpan],
    tone: Tone,
    rewriter: &dyn Rewriter,
    options: &RewriteOptions,
    workers: usize,
) -> ProcessingResult<Vec<ChunkOutcome>> {
    let pool = build_pool(workers)?;

    // collect() on an indexed parallel iterator keeps span order
    Ok(pool.install(|| {
        spans
            .par_iter()
            .map(|span| super::rewrite_span(rewriter, span, tone, options))
            .collect()
    }))
}

/// Fallback to sequential processing when parallel feature is disabled
#[cfg(not(feature = "parallel"))]
pub(super) fn run(
    spans: &[TextSpan],
    tone: Tone,
    rewriter: &dyn Rewriter,
    options: &RewriteOptions,
    _workers: usize,
) -> ProcessingResult<Vec<ChunkOutcome>> {
    Ok(super::sequential::run(spans, tone, rewriter, options))
}

#[cfg(feature = "parallel")]
pub(super) fn build_pool(workers: usize) -> ProcessingResult<rayon::ThreadPool> {
    use crate::application::config::ProcessingError;

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("echoverse-rewrite-{i}"))
        .build()
        .map_err(|e| ProcessingError::WorkerPool {
            source: Box::new(e),
        })
}
