//! Streaming execution: outcomes are reported as they complete
//!
//! Workers send `(position, outcome)` over a channel; the calling thread
//! reports each one to the observer and slots it by position, so the final
//! vector is in span order regardless of completion order.

use super::{ChunkOutcome, ChunkProgress};
use crate::application::config::{ProcessingError, ProcessingResult};
use crate::application::rewriter::{RewriteOptions, Rewriter};
use crate::domain::span::TextSpan;
use crate::domain::tone::Tone;

#[cfg(feature = "parallel")]
pub(super) fn run(
    spans: &[TextSpan],
    tone: Tone,
    rewriter: &dyn Rewriter,
    options: &RewriteOptions,
    workers: usize,
    observer: &mut dyn FnMut(&ChunkOutcome, ChunkProgress),
) -> ProcessingResult<Vec<ChunkOutcome>> {
    use std::sync::mpsc;

    let pool = super::concurrent::build_pool(workers)?;
    let total = spans.len();
    let mut slots: Vec<Option<ChunkOutcome>> = vec![None; total];
    let (tx, rx) = mpsc::channel::<(usize, ChunkOutcome)>();

    std::thread::scope(|scope| {
        scope.spawn(move || {
            pool.scope(|s| {
                for (position, span) in spans.iter().enumerate() {
                    let tx = tx.clone();
                    s.spawn(move |_| {
                        let outcome = super::rewrite_span(rewriter, span, tone, options);
                        // the receiver only disappears if the caller panicked
                        let _ = tx.send((position, outcome));
                    });
                }
            });
        });

        for (completed, (position, outcome)) in rx.iter().enumerate() {
            observer(
                &outcome,
                ChunkProgress {
                    completed: completed + 1,
                    total,
                },
            );
            slots[position] = Some(outcome);
        }
    });

    collect_slots(slots)
}

/// Sequential streaming when the parallel feature is disabled
#[cfg(not(feature = "parallel"))]
pub(super) fn run(
    spans: &[TextSpan],
    tone: Tone,
    rewriter: &dyn Rewriter,
    options: &RewriteOptions,
    _workers: usize,
    observer: &mut dyn FnMut(&ChunkOutcome, ChunkProgress),
) -> ProcessingResult<Vec<ChunkOutcome>> {
    let total = spans.len();
    let slots = spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let outcome = super::rewrite_span(rewriter, span, tone, options);
            observer(&outcome, ChunkProgress { completed: i + 1, total });
            Some(outcome)
        })
        .collect();

    collect_slots(slots)
}

fn collect_slots(slots: Vec<Option<ChunkOutcome>>) -> ProcessingResult<Vec<ChunkOutcome>> {
    let total = slots.len();
    let outcomes: Vec<ChunkOutcome> = slots.into_iter().flatten().collect();
    if outcomes.len() != total {
        return Err(ProcessingError::WorkerPanic(format!(
            "{} of {} chunk results missing",
            total - outcomes.len(),
            total
        )));
    }
    Ok(outcomes)
}
