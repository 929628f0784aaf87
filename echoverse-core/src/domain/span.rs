//! Text spans produced by the document chunker

use serde::Serialize;
use std::fmt;

/// Separator restored between spans that start a new paragraph
pub const PARAGRAPH_BREAK: &str = "\n\n";

/// How a span was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// The whole input fit in one span
    Single,
    /// Packed whole paragraphs
    Paragraph,
    /// Packed whole sentences
    Sentence,
    /// Packed clauses (split on semicolons)
    Semantic,
    /// Result of folding an undersized span into a neighbour
    Merged,
    /// Piece of an oversized sentence or clause
    SubSentence,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Single => "single",
            SpanKind::Paragraph => "paragraph",
            SpanKind::Sentence => "sentence",
            SpanKind::Semantic => "semantic",
            SpanKind::Merged => "merged",
            SpanKind::SubSentence => "sub_sentence",
        }
    }
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous piece of the input text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSpan {
    /// Original text of the span
    pub text: String,
    /// Position in recombination order
    pub index: usize,
    pub kind: SpanKind,
    /// First span of a paragraph (other than the first paragraph)
    pub starts_paragraph: bool,
    /// Text with neighbouring overlap; shown to the model as context, never rewritten
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, index: usize, kind: SpanKind) -> Self {
        Self {
            text: text.into(),
            index,
            kind,
            starts_paragraph: false,
            context: None,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Separator placed before this span when recombining
    pub fn separator(&self) -> &'static str {
        if self.starts_paragraph {
            PARAGRAPH_BREAK
        } else {
            " "
        }
    }
}

/// Which chunking route produced a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkRoute {
    Single,
    Paragraph,
    Sentence,
    Semantic,
}

impl fmt::Display for ChunkRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChunkRoute::Single => "single",
            ChunkRoute::Paragraph => "paragraph",
            ChunkRoute::Sentence => "sentence",
            ChunkRoute::Semantic => "semantic",
        };
        f.write_str(s)
    }
}

/// Ordered spans plus the route that produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkPlan {
    pub spans: Vec<TextSpan>,
    pub route: ChunkRoute,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Original span texts recombined
    pub fn joined_text(&self) -> String {
        let texts: Vec<&str> = self.spans.iter().map(|s| s.text.as_str()).collect();
        recombine(&self.spans, &texts)
    }

    /// Reassign indices to be contiguous from zero
    pub(crate) fn renumber(&mut self) {
        for (index, span) in self.spans.iter_mut().enumerate() {
            span.index = index;
        }
    }
}

/// Join per-span outputs in index order, restoring paragraph breaks.
///
/// `outputs[i]` belongs to `spans[i]`.
pub fn recombine<S: AsRef<str>>(spans: &[TextSpan], outputs: &[S]) -> String {
    let mut joined = String::new();
    for (i, (span, output)) in spans.iter().zip(outputs).enumerate() {
        if i > 0 {
            joined.push_str(span.separator());
        }
        joined.push_str(output.as_ref().trim());
    }
    joined
}
