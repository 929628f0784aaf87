//! Neighbour context for spans
//!
//! The overlap pass gives the rewriter a few words on either side of a span
//! so tone stays continuous across span boundaries. The span's own `text` is
//! left untouched.

use crate::domain::span::ChunkPlan;

/// Attach `overlap_words / 2` words of each neighbour as generation context
pub fn add_overlap(mut plan: ChunkPlan, overlap_words: usize) -> ChunkPlan {
    let half = overlap_words / 2;
    if half == 0 || plan.spans.len() < 2 {
        return plan;
    }

    let words: Vec<Vec<&str>> = plan
        .spans
        .iter()
        .map(|s| s.text.split_whitespace().collect())
        .collect();

    let contexts: Vec<Option<String>> = (0..plan.spans.len())
        .map(|i| {
            let mut context = plan.spans[i].text.clone();
            let mut changed = false;

            if let Some(prev) = i.checked_sub(1).map(|p| &words[p]) {
                if prev.len() > half {
                    context = format!("...{} {context}", prev[prev.len() - half..].join(" "));
                    changed = true;
                }
            }

            if let Some(next) = words.get(i + 1) {
                if next.len() > half {
                    context = format!("{context} {}...", next[..half].join(" "));
                    changed = true;
                }
            }

            changed.then_some(context)
        })
        .collect();

    for (span, context) in plan.spans.iter_mut().zip(contexts) {
        span.context = context;
    }

    plan
}
