//! In-order execution on the calling thread

use super::{rewrite_span, ChunkOutcome};
use crate::application::rewriter::{RewriteOptions, Rewriter};
use crate::domain::span::TextSpan;
use crate::domain::tone::Tone;

pub(super) fn run(
    spans: &[TextSpan],
    tone: Tone,
    rewriter: &dyn Rewriter,
    options: &RewriteOptions,
) -> Vec<ChunkOutcome> {
    spans
        .iter()
        .map(|span| rewrite_span(rewriter, span, tone, options))
        .collect()
}
