//! Document chunking
//!
//! [`DocumentChunker`] cuts text into bounded spans for the rewriter:
//!
//! 1. Text within the budget stays a single span.
//! 2. Multi-paragraph text with short paragraphs is packed paragraph by paragraph.
//! 3. Text with short sentences is packed sentence by sentence.
//! 4. Anything else is packed clause by clause.
//!
//! Oversized sentences and clauses fall back to comma, conjunction and word
//! window splitting. Spans never cross a paragraph boundary, and the first
//! span of every paragraph is flagged so recombination can restore the break.

mod overlap;
pub mod splitters;

pub use overlap::add_overlap;
pub use splitters::{split_to_fit, Split, Splitter};

use crate::application::config::ProcessorConfig;
use crate::domain::analysis::{analyze, paragraphs, StructureMetrics};
use crate::domain::span::{ChunkPlan, ChunkRoute, SpanKind, TextSpan, PARAGRAPH_BREAK};
use splitters::Packer;

/// Paragraph packing applies while paragraphs average below this many spans.
const PARAGRAPH_ROUTE_FACTOR: f64 = 1.5;

/// Sentence packing applies while sentences average below this share of a span.
const SENTENCE_ROUTE_FACTOR: f64 = 0.8;

/// A span under construction: text, kind and whether it opens a paragraph
type Piece = (String, SpanKind, bool);

/// Splits documents into bounded spans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentChunker {
    max_chunk_size: usize,
    min_chunk_size: usize,
    overlap: usize,
}

impl Default for DocumentChunker {
    fn default() -> Self {
        Self::new(200, 50, 30)
    }
}

impl DocumentChunker {
    /// Sizes are in characters; `overlap` is in words.
    pub fn new(max_chunk_size: usize, min_chunk_size: usize, overlap: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
            min_chunk_size,
            overlap,
        }
    }

    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self::new(
            config.max_chunk_size,
            config.min_chunk_size,
            config.overlap_size,
        )
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn min_chunk_size(&self) -> usize {
        self.min_chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split followed by the merge pass
    pub fn chunk(&self, text: &str) -> ChunkPlan {
        self.optimize_chunk_sizes(self.smart_chunk(text))
    }

    /// Split `text` along its structure. Never fails; non-empty input yields at least one span.
    pub fn smart_chunk(&self, text: &str) -> ChunkPlan {
        let metrics = analyze(text);
        if metrics.is_empty() {
            return ChunkPlan {
                spans: Vec::new(),
                route: ChunkRoute::Single,
            };
        }

        if metrics.length <= self.max_chunk_size {
            return self.single(text);
        }

        let route = self.route_for(&metrics);
        let mut pieces = Vec::new();

        match route {
            ChunkRoute::Paragraph => self.chunk_paragraphs(text, &mut pieces),
            ChunkRoute::Sentence | ChunkRoute::Semantic | ChunkRoute::Single => {
                for (i, paragraph) in paragraphs(text).into_iter().enumerate() {
                    let first = pieces.len();
                    if route == ChunkRoute::Semantic {
                        self.chunk_clauses(paragraph, &mut pieces);
                    } else {
                        self.chunk_sentences(paragraph, &mut pieces);
                    }
                    if i > 0 {
                        if let Some(piece) = pieces.get_mut(first) {
                            piece.2 = true;
                        }
                    }
                }
            }
        }

        if pieces.is_empty() {
            return self.single(text);
        }

        log::debug!(
            "Chunked {} chars into {} spans via {} route",
            metrics.length,
            pieces.len(),
            route
        );

        ChunkPlan {
            spans: pieces
                .into_iter()
                .enumerate()
                .map(|(index, (text, kind, starts_paragraph))| TextSpan {
                    starts_paragraph,
                    ..TextSpan::new(text, index, kind)
                })
                .collect(),
            route,
        }
    }

    /// Merge undersized spans into their successor (or, at the end, their predecessor)
    /// while the result stays within the maximum size. Indices are renumbered.
    pub fn optimize_chunk_sizes(&self, mut plan: ChunkPlan) -> ChunkPlan {
        let mut spans = std::mem::take(&mut plan.spans).into_iter();
        let Some(mut current) = spans.next() else {
            return plan;
        };

        let mut merged: Vec<TextSpan> = Vec::new();
        for next in spans {
            if current.char_len() < self.min_chunk_size && self.fits(&current, &next) {
                current = merge(current, next);
            } else {
                merged.push(current);
                current = next;
            }
        }

        match merged.pop() {
            Some(prev) if current.char_len() < self.min_chunk_size && self.fits(&prev, &current) => {
                merged.push(merge(prev, current));
            }
            Some(prev) => {
                merged.push(prev);
                merged.push(current);
            }
            None => merged.push(current),
        }

        plan.spans = merged;
        plan.renumber();
        plan
    }

    /// Attach neighbour context to every span using the configured overlap
    pub fn with_overlap(&self, plan: ChunkPlan) -> ChunkPlan {
        add_overlap(plan, self.overlap)
    }

    fn route_for(&self, metrics: &StructureMetrics) -> ChunkRoute {
        let max = self.max_chunk_size as f64;
        if metrics.paragraph_count > 1 && metrics.avg_paragraph_length < PARAGRAPH_ROUTE_FACTOR * max {
            ChunkRoute::Paragraph
        } else if metrics.chars_per_sentence() < SENTENCE_ROUTE_FACTOR * max {
            ChunkRoute::Sentence
        } else {
            ChunkRoute::Semantic
        }
    }

    fn single(&self, text: &str) -> ChunkPlan {
        ChunkPlan {
            spans: vec![TextSpan::new(text, 0, SpanKind::Single)],
            route: ChunkRoute::Single,
        }
    }

    fn fits(&self, first: &TextSpan, second: &TextSpan) -> bool {
        first.char_len() + second.separator().chars().count() + second.char_len()
            <= self.max_chunk_size
    }

    fn chunk_paragraphs(&self, text: &str, out: &mut Vec<Piece>) {
        let mut packer = Packer::new(self.max_chunk_size, PARAGRAPH_BREAK);

        for paragraph in paragraphs(text) {
            if paragraph.chars().count() <= self.max_chunk_size {
                packer.push(paragraph);
                continue;
            }

            flush(&mut packer, SpanKind::Paragraph, out, true);
            let first = out.len();
            self.chunk_sentences(paragraph, out);
            if first > 0 {
                if let Some(piece) = out.get_mut(first) {
                    piece.2 = true;
                }
            }
        }

        flush(&mut packer, SpanKind::Paragraph, out, true);
    }

    fn chunk_sentences(&self, text: &str, out: &mut Vec<Piece>) {
        self.pack_units(text, Splitter::Sentence, SpanKind::Sentence, out);
    }

    fn chunk_clauses(&self, text: &str, out: &mut Vec<Piece>) {
        self.pack_units(text, Splitter::Clause, SpanKind::Semantic, out);
    }

    /// Pack the units `splitter` finds; oversized units go through the sub-sentence chain.
    fn pack_units(&self, text: &str, splitter: Splitter, kind: SpanKind, out: &mut Vec<Piece>) {
        let units = match splitter.split(text) {
            Split::Pieces(units) => units,
            Split::Atomic => vec![text.trim()],
        };

        let chain = Splitter::sub_sentence_chain(self.max_chunk_size);
        let mut packer = Packer::new(self.max_chunk_size, splitter.joiner());

        for unit in units.into_iter().filter(|u| !u.is_empty()) {
            if unit.chars().count() <= self.max_chunk_size {
                packer.push(unit);
                continue;
            }

            flush(&mut packer, kind, out, false);
            out.extend(
                split_to_fit(unit, &chain, self.max_chunk_size)
                    .into_iter()
                    .map(|piece| (piece, SpanKind::SubSentence, false)),
            );
        }

        flush(&mut packer, kind, out, false);
    }
}

/// Move packed spans into `out`. With `paragraph_breaks`, every packed span after
/// the first output span opens a paragraph.
fn flush(packer: &mut Packer, kind: SpanKind, out: &mut Vec<Piece>, paragraph_breaks: bool) {
    for text in packer.drain() {
        let starts_paragraph = paragraph_breaks && !out.is_empty();
        out.push((text, kind, starts_paragraph));
    }
}

fn merge(first: TextSpan, second: TextSpan) -> TextSpan {
    TextSpan {
        text: format!("{}{}{}", first.text, second.separator(), second.text),
        kind: SpanKind::Merged,
        context: None,
        ..first
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_empty_text_has_no_spans() {
        let plan = DocumentChunker::default().smart_chunk("");
        assert!(plan.is_empty());
    }

    #[test]
    fn test_short_text_is_single() {
        let text = "The quick brown fox jumps over the lazy dog. It ran away.";
        let plan = DocumentChunker::default().smart_chunk(text);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.spans[0].kind, SpanKind::Single);
        assert_eq!(plan.spans[0].text, text);
        assert_eq!(plan.route, ChunkRoute::Single);
    }

    #[test]
    fn test_exactly_max_is_single() {
        let text = "x".repeat(200);
        let plan = DocumentChunker::default().smart_chunk(&text);
        assert_eq!(plan.spans[0].kind, SpanKind::Single);
    }

    #[test]
    fn test_paragraph_route() {
        let para = "A short paragraph about the sea and the sky above it.";
        let text = [para; 6].join("\n\n");
        let chunker = DocumentChunker::new(120, 10, 0);
        let plan = chunker.smart_chunk(&text);

        assert_eq!(plan.route, ChunkRoute::Paragraph);
        assert!(plan.spans.iter().all(|s| s.kind == SpanKind::Paragraph));
        assert!(plan.spans.iter().all(|s| s.char_len() <= 120));
        assert!(!plan.spans[0].starts_paragraph);
        assert!(plan.spans[1..].iter().all(|s| s.starts_paragraph));
        assert_eq!(plan.joined_text(), text);
    }

    #[test]
    fn test_sentence_route_respects_paragraphs() {
        let sentence = "The wind moved through the old pines near the river.";
        let paragraph = [sentence; 8].join(" ");
        let text = [paragraph.as_str(); 3].join("\n\n");
        let plan = DocumentChunker::default().smart_chunk(&text);

        assert_eq!(plan.route, ChunkRoute::Sentence);
        assert!(plan.len() >= 6);
        assert!(plan.spans.iter().all(|s| s.char_len() <= 200));
        let breaks = plan.spans.iter().filter(|s| s.starts_paragraph).count();
        assert_eq!(breaks, 2);
        assert_eq!(non_ws(&plan.joined_text()), non_ws(&text));
        assert_eq!(plan.joined_text().matches("\n\n").count(), 2);
    }

    #[test]
    fn test_semantic_route_for_run_on_text() {
        let clause = "the corridor stretched on without end or light or sound";
        let text = [clause; 6].join("; ");
        let plan = DocumentChunker::default().smart_chunk(&text);

        assert_eq!(plan.route, ChunkRoute::Semantic);
        assert!(plan.spans.iter().all(|s| s.kind == SpanKind::Semantic));
        assert!(plan.spans.iter().all(|s| s.char_len() <= 200));
        assert_eq!(non_ws(&plan.joined_text()), non_ws(&text));
    }

    #[test]
    fn test_long_sentence_falls_back_to_sub_sentences() {
        let text = "word ".repeat(120);
        let plan = DocumentChunker::default().smart_chunk(text.trim());
        assert!(plan.len() > 1);
        assert!(plan.spans.iter().all(|s| s.kind == SpanKind::SubSentence));
        assert!(plan.spans.iter().all(|s| s.char_len() <= 200));
        assert!(plan.spans.iter().all(|s| s.text.split_whitespace().count() <= 33));
    }

    #[test]
    fn test_oversized_word_is_kept_whole() {
        let giant = "a".repeat(300);
        let text = format!("before {giant} after");
        let plan = DocumentChunker::default().smart_chunk(&text);
        assert!(plan.spans.iter().any(|s| s.text == giant));
        assert_eq!(non_ws(&plan.joined_text()), non_ws(&text));
    }

    #[test]
    fn test_whitespace_only_long_text_is_single() {
        let text = " ".repeat(300);
        let plan = DocumentChunker::default().smart_chunk(&text);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.spans[0].kind, SpanKind::Single);
    }

    #[test]
    fn test_optimize_merges_small_spans() {
        let chunker = DocumentChunker::new(100, 20, 0);
        let plan = ChunkPlan {
            spans: vec![
                TextSpan::new("tiny.", 0, SpanKind::Sentence),
                TextSpan::new("A longer sentence that is comfortably sized.", 1, SpanKind::Sentence),
                TextSpan::new("Another sentence of a reasonable length here.", 2, SpanKind::Sentence),
            ],
            route: ChunkRoute::Sentence,
        };

        let optimized = chunker.optimize_chunk_sizes(plan);
        assert_eq!(optimized.len(), 2);
        assert_eq!(optimized.spans[0].kind, SpanKind::Merged);
        assert!(optimized.spans[0].text.starts_with("tiny. A longer"));
        assert_eq!(optimized.spans[0].index, 0);
        assert_eq!(optimized.spans[1].index, 1);
    }

    #[test]
    fn test_optimize_folds_tiny_trailing_span() {
        let chunker = DocumentChunker::new(100, 20, 0);
        let plan = ChunkPlan {
            spans: vec![
                TextSpan::new("A sentence that is long enough to stand alone.", 0, SpanKind::Sentence),
                TextSpan::new("End.", 1, SpanKind::Sentence),
            ],
            route: ChunkRoute::Sentence,
        };

        let optimized = chunker.optimize_chunk_sizes(plan);
        assert_eq!(optimized.len(), 1);
        assert!(optimized.spans[0].text.ends_with("alone. End."));
    }

    #[test]
    fn test_optimize_respects_max_size() {
        let chunker = DocumentChunker::new(20, 10, 0);
        let plan = ChunkPlan {
            spans: vec![
                TextSpan::new("short", 0, SpanKind::Sentence),
                TextSpan::new("eighteen chars....", 1, SpanKind::Sentence),
            ],
            route: ChunkRoute::Sentence,
        };
        let optimized = chunker.optimize_chunk_sizes(plan);
        assert_eq!(optimized.len(), 2);
    }

    #[test]
    fn test_merge_keeps_paragraph_break() {
        let chunker = DocumentChunker::new(100, 20, 0);
        let mut second = TextSpan::new("Second paragraph text here.", 1, SpanKind::Paragraph);
        second.starts_paragraph = true;
        let plan = ChunkPlan {
            spans: vec![TextSpan::new("Tiny.", 0, SpanKind::Paragraph), second],
            route: ChunkRoute::Paragraph,
        };
        let optimized = chunker.optimize_chunk_sizes(plan);
        assert_eq!(optimized.spans[0].text, "Tiny.\n\nSecond paragraph text here.");
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let text = "Sentence number one is here. ".repeat(40);
        let plan = DocumentChunker::default().chunk(&text);
        for (i, span) in plan.spans.iter().enumerate() {
            assert_eq!(span.index, i);
        }
    }

    #[test]
    fn test_with_overlap_uses_configured_words() {
        let text = "The wind moved through the old pines near the river. ".repeat(10);
        let chunker = DocumentChunker::new(120, 10, 4);
        let plan = chunker.with_overlap(chunker.chunk(&text));
        assert!(plan.len() > 1);
        assert!(plan.spans[0].context.as_deref().unwrap().ends_with("..."));
    }
}
