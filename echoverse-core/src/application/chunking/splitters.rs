//! Split strategies tried in priority order
//!
//! Each [`Splitter`] either cuts a text into smaller pieces or reports that
//! it cannot ([`Split::Atomic`]). Pieces are trimmed substrings of the input,
//! so splitting never drops a non-whitespace character.

use crate::domain::analysis::{paragraphs, sentences};
use regex::Regex;
use std::sync::OnceLock;

fn conjunction() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(and|or|but|yet|so|because|although|while|since|if|when|where)\b")
            .expect("valid conjunction regex")
    })
}

/// A way of cutting text into smaller pieces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splitter {
    /// Blank-line separated paragraphs
    Paragraph,
    /// Terminated sentences
    Sentence,
    /// Cut after semicolons
    Clause,
    /// Cut after commas
    Comma,
    /// Cut before coordinating and subordinating conjunctions
    Conjunction,
    /// Runs of at most `max_words` words and `max_chars` characters
    WordWindow { max_words: usize, max_chars: usize },
}

/// Outcome of a split attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Split<'a> {
    Pieces(Vec<&'a str>),
    /// The splitter found nothing to cut at
    Atomic,
}

impl Splitter {
    /// Fallback chain for sentences and clauses that exceed `max_chars`
    pub fn sub_sentence_chain(max_chars: usize) -> [Splitter; 3] {
        [
            Splitter::Comma,
            Splitter::Conjunction,
            Splitter::WordWindow {
                max_words: (max_chars / 6).max(1),
                max_chars,
            },
        ]
    }

    pub fn split<'a>(&self, text: &'a str) -> Split<'a> {
        let pieces = match self {
            Splitter::Paragraph => paragraphs(text),
            Splitter::Sentence => sentences(text),
            Splitter::Clause => split_after(text, ';'),
            Splitter::Comma => split_after(text, ','),
            Splitter::Conjunction => split_before_conjunctions(text),
            Splitter::WordWindow {
                max_words,
                max_chars,
            } => word_windows(text, *max_words, *max_chars),
        };

        if pieces.len() < 2 {
            Split::Atomic
        } else {
            Split::Pieces(pieces)
        }
    }

    /// Separator used when packing this splitter's pieces back together
    pub fn joiner(&self) -> &'static str {
        match self {
            Splitter::Paragraph => "\n\n",
            _ => " ",
        }
    }
}

fn split_after(text: &str, separator: char) -> Vec<&str> {
    text.split_inclusive(separator)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn split_before_conjunctions(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for m in conjunction().find_iter(text) {
        let head = text[start..m.start()].trim();
        if !head.is_empty() {
            pieces.push(head);
            start = m.start();
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        pieces.push(tail);
    }

    pieces
}

fn word_windows(text: &str, max_words: usize, max_chars: usize) -> Vec<&str> {
    let max_words = max_words.max(1);
    let mut windows = Vec::new();
    // (byte start, byte end, words, chars) of the window being built
    let mut window: Option<(usize, usize, usize, usize)> = None;

    for (start, word) in word_offsets(text) {
        let end = start + word.len();
        let word_chars = word.chars().count();

        window = match window {
            None => Some((start, end, 1, word_chars)),
            Some((w_start, w_end, words, _)) => {
                let chars = text[w_start..end].chars().count();
                if words < max_words && chars <= max_chars {
                    Some((w_start, end, words + 1, chars))
                } else {
                    windows.push(&text[w_start..w_end]);
                    Some((start, end, 1, word_chars))
                }
            }
        };
    }

    if let Some((w_start, w_end, _, _)) = window {
        windows.push(&text[w_start..w_end]);
    }

    windows
}

/// Byte offsets of whitespace-separated words
fn word_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_whitespace()
        .map(move |word| (word.as_ptr() as usize - text.as_ptr() as usize, word))
}

/// Greedy packer: appends pieces to the current span while it stays within budget
#[derive(Debug)]
pub(crate) struct Packer {
    max_chars: usize,
    joiner: &'static str,
    current: String,
    current_chars: usize,
    done: Vec<String>,
}

impl Packer {
    pub(crate) fn new(max_chars: usize, joiner: &'static str) -> Self {
        Self {
            max_chars,
            joiner,
            current: String::new(),
            current_chars: 0,
            done: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, piece: &str) {
        let piece_chars = piece.chars().count();

        if self.current.is_empty() {
            self.current.push_str(piece);
            self.current_chars = piece_chars;
            return;
        }

        let joined = self.current_chars + self.joiner.chars().count() + piece_chars;
        if joined <= self.max_chars {
            self.current.push_str(self.joiner);
            self.current.push_str(piece);
            self.current_chars = joined;
        } else {
            self.done.push(std::mem::take(&mut self.current));
            self.current.push_str(piece);
            self.current_chars = piece_chars;
        }
    }

    /// Flush the span in progress and return everything packed so far
    pub(crate) fn drain(&mut self) -> Vec<String> {
        if !self.current.is_empty() {
            self.done.push(std::mem::take(&mut self.current));
            self.current_chars = 0;
        }
        std::mem::take(&mut self.done)
    }
}

/// Cut `text` down to pieces of at most `max_chars` using `chain` in order.
///
/// A piece is left oversized only when every remaining splitter reports it
/// atomic, i.e. a single word longer than the budget.
pub fn split_to_fit(text: &str, chain: &[Splitter], max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let Some((splitter, rest)) = chain.split_first() else {
        return vec![text.to_string()];
    };

    match splitter.split(text) {
        Split::Atomic => split_to_fit(text, rest, max_chars),
        Split::Pieces(pieces) => {
            let mut packer = Packer::new(max_chars, splitter.joiner());
            let mut out = Vec::new();
            for piece in pieces {
                if piece.chars().count() > max_chars {
                    out.extend(packer.drain());
                    out.extend(split_to_fit(piece, rest, max_chars));
                } else {
                    packer.push(piece);
                }
            }
            out.extend(packer.drain());
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_keeps_separator() {
        assert_eq!(
            Splitter::Comma.split("one, two, three"),
            Split::Pieces(vec!["one,", "two,", "three"])
        );
        assert_eq!(Splitter::Comma.split("no commas here"), Split::Atomic);
    }

    #[test]
    fn test_clause_split() {
        assert_eq!(
            Splitter::Clause.split("first part; second part;"),
            Split::Pieces(vec!["first part;", "second part;"])
        );
    }

    #[test]
    fn test_conjunction_keeps_word() {
        assert_eq!(
            Splitter::Conjunction.split("I ran and she walked because it rained"),
            Split::Pieces(vec!["I ran", "and she walked", "because it rained"])
        );
        // a leading conjunction does not produce an empty piece
        assert_eq!(
            Splitter::Conjunction.split("And then nothing"),
            Split::Atomic
        );
        // whole words only
        assert_eq!(Splitter::Conjunction.split("Android sandbox"), Split::Atomic);
    }

    #[test]
    fn test_word_windows_respect_both_limits() {
        let by_words = Splitter::WordWindow {
            max_words: 2,
            max_chars: 100,
        };
        assert_eq!(
            by_words.split("a b c d e"),
            Split::Pieces(vec!["a b", "c d", "e"])
        );

        let by_chars = Splitter::WordWindow {
            max_words: 10,
            max_chars: 9,
        };
        assert_eq!(
            by_chars.split("alpha beta gamma delta"),
            Split::Pieces(vec!["alpha", "beta", "gamma", "delta"])
        );
    }

    #[test]
    fn test_single_word_is_atomic() {
        let splitter = Splitter::WordWindow {
            max_words: 3,
            max_chars: 4,
        };
        assert_eq!(splitter.split("supercalifragilistic"), Split::Atomic);
    }

    #[test]
    fn test_packer() {
        let mut packer = Packer::new(11, " ");
        for piece in ["aaa", "bbb", "ccc", "dddd"] {
            packer.push(piece);
        }
        assert_eq!(packer.drain(), vec!["aaa bbb ccc", "dddd"]);
        assert!(packer.drain().is_empty());
    }

    #[test]
    fn test_split_to_fit_fallback_order() {
        let chain = Splitter::sub_sentence_chain(20);
        let text = "the storm rolled in and the lights went out while we waited";
        let pieces = split_to_fit(text, &chain, 20);
        assert!(pieces.iter().all(|p| p.chars().count() <= 20));
        assert_eq!(pieces.join(" "), text);
        assert!(pieces.iter().any(|p| p.starts_with("and")));
    }

    #[test]
    fn test_split_to_fit_atomic_word() {
        let chain = Splitter::sub_sentence_chain(6);
        let pieces = split_to_fit("tiny enormousword end", &chain, 6);
        assert_eq!(pieces, vec!["tiny", "enormousword", "end"]);
    }

    #[test]
    fn test_split_to_fit_short_text_untouched() {
        assert_eq!(
            split_to_fit("  short  ", &[Splitter::Comma], 50),
            vec!["short"]
        );
    }
}
