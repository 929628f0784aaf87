//! Text structure analysis
//!
//! Produces the [`StructureMetrics`] the chunker and the strategy classifier
//! base their decisions on. Everything here is pure and deterministic.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// A run of sentence terminators followed by whitespace or end of text.
fn sentence_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+(\s+|$)").expect("valid sentence regex"))
}

/// A blank line, possibly containing other whitespace.
fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"))
}

const STRUCTURAL_PUNCTUATION: &[char] = &[',', ';', ':', '(', ')', '[', ']', '{', '}', '"'];

/// Words longer than this count towards lexical complexity.
const LONG_WORD_CHARS: usize = 7;

/// Structural metrics of a text
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureMetrics {
    /// Length in characters (Unicode scalar values)
    pub length: usize,
    /// Whitespace-separated words
    pub word_count: usize,
    /// Terminator runs followed by whitespace or end of text
    pub sentence_count: usize,
    /// Non-blank blocks separated by blank lines
    pub paragraph_count: usize,
    /// Words per sentence
    pub avg_sentence_length: f64,
    /// Characters per paragraph
    pub avg_paragraph_length: f64,
    /// Blend of long-word ratio, punctuation density and sentence variance, in `[0, 1]`
    pub complexity_score: f64,
}

impl StructureMetrics {
    /// Characters per sentence, treating unterminated text as one sentence
    pub fn chars_per_sentence(&self) -> f64 {
        self.length as f64 / self.sentence_count.max(1) as f64
    }

    /// Whether the text has no content at all
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Analyze the structure of `text`
pub fn analyze(text: &str) -> StructureMetrics {
    if text.is_empty() {
        return StructureMetrics::default();
    }

    let length = text.chars().count();
    let word_count = text.split_whitespace().count();
    let sentence_count = sentence_end().find_iter(text).count();
    let paragraph_count = paragraphs(text).len().max(1);

    StructureMetrics {
        length,
        word_count,
        sentence_count,
        paragraph_count,
        avg_sentence_length: word_count as f64 / sentence_count.max(1) as f64,
        avg_paragraph_length: length as f64 / paragraph_count as f64,
        complexity_score: complexity(text, length),
    }
}

/// Split `text` into trimmed, non-blank paragraphs
pub fn paragraphs(text: &str) -> Vec<&str> {
    paragraph_break()
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split `text` into trimmed sentences, keeping their terminators.
///
/// Trailing text without a terminator becomes the final sentence.
pub fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;

    for m in sentence_end().find_iter(text) {
        let piece = text[start..m.end()].trim();
        if !piece.is_empty() {
            out.push(piece);
        }
        start = m.end();
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        out.push(rest);
    }

    out
}

fn complexity(text: &str, length: usize) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() || length == 0 {
        return 0.0;
    }

    let long_words = words
        .iter()
        .filter(|w| w.chars().count() > LONG_WORD_CHARS)
        .count();
    let long_word_ratio = long_words as f64 / words.len() as f64;

    let punctuation = text
        .chars()
        .filter(|c| STRUCTURAL_PUNCTUATION.contains(c))
        .count();
    let punctuation_density = punctuation as f64 / length as f64;

    let score = long_word_ratio * 0.4
        + (punctuation_density * 10.0).min(1.0) * 0.3
        + (sentence_length_stddev(text) / 50.0).min(1.0) * 0.3;

    score.min(1.0)
}

/// Population standard deviation of words per sentence
fn sentence_length_stddev(text: &str) -> f64 {
    let lengths: Vec<f64> = sentences(text)
        .iter()
        .map(|s| s.split_whitespace().count() as f64)
        .collect();

    if lengths.len() < 2 {
        return 0.0;
    }

    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    variance.sqrt()
}
