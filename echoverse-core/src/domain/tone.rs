//! Narrative tones and the deterministic, model-free tone transforms

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Narrative register applied by the rewriter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Neutral,
    Suspenseful,
    Inspiring,
}

/// Unrecognized tone name
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown tone '{0}' (expected neutral, suspenseful or inspiring)")]
pub struct UnknownTone(pub String);

const SUSPENSE_WORDS: &[&str] = &["mysterious", "ominous", "threatening", "dark", "foreboding"];
const INSPIRING_WORDS: &[&str] = &["incredible", "amazing", "extraordinary", "remarkable", "powerful"];

/// Only this many sentences receive a descriptive word in the lexical transform.
const DECORATED_SENTENCES: usize = 3;

/// Above this many characters the quick transform works sentence by sentence.
const QUICK_SENTENCE_THRESHOLD: usize = 50;

fn decoration_anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(the|a|an|and|but)\s+").expect("valid anchor regex"))
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Neutral, Tone::Suspenseful, Tone::Inspiring];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Neutral => "neutral",
            Tone::Suspenseful => "suspenseful",
            Tone::Inspiring => "inspiring",
        }
    }

    /// Display label, also used as the prompt's output marker
    pub fn label(&self) -> &'static str {
        match self {
            Tone::Neutral => "Neutral",
            Tone::Suspenseful => "Suspenseful",
            Tone::Inspiring => "Inspiring",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tone::Neutral => "Clear, even narration that keeps the original register",
            Tone::Suspenseful => "Dramatic and tense, trailing off into ellipses",
            Tone::Inspiring => "Uplifting and motivational, ending on exclamations",
        }
    }

    /// Instruction sentence opening the rewrite prompt
    pub fn instruction(&self) -> &'static str {
        match self {
            Tone::Neutral => "Rewrite the following text in a clear and neutral tone while keeping the same meaning",
            Tone::Suspenseful => {
                "Rewrite the following text to make it more suspenseful and dramatic while keeping the same meaning"
            }
            Tone::Inspiring => {
                "Rewrite the following text to make it more inspiring and motivational while keeping the same meaning"
            }
        }
    }

    /// Marker after which the model is expected to write its answer
    pub fn marker(&self) -> String {
        format!("{} version:", self.label())
    }

    /// Punctuation a finished sentence in this tone ends with
    pub fn terminal(&self) -> &'static str {
        match self {
            Tone::Neutral => ".",
            Tone::Suspenseful => "...",
            Tone::Inspiring => "!",
        }
    }

    fn decoration_words(&self) -> &'static [&'static str] {
        match self {
            Tone::Neutral => &[],
            Tone::Suspenseful => SUSPENSE_WORDS,
            Tone::Inspiring => INSPIRING_WORDS,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tone {
    type Err = UnknownTone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" => Ok(Tone::Neutral),
            "suspenseful" | "suspense" => Ok(Tone::Suspenseful),
            "inspiring" | "inspirational" => Ok(Tone::Inspiring),
            _ => Err(UnknownTone(s.to_string())),
        }
    }
}

/// Append the tone's terminal punctuation unless the text already ends a sentence
pub fn ensure_terminal(text: &str, tone: Tone) -> String {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.ends_with(['.', '!', '?', '…', '"', '\'']) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{}", tone.terminal())
    }
}

/// Rough sentence split used by the transforms: every terminator ends a sentence.
fn rough_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

/// Instant tone transform used for micro inputs and for degenerate model output.
///
/// Never calls a model and never fails.
pub fn quick_transform(text: &str, tone: Tone) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    if text.chars().count() > QUICK_SENTENCE_THRESHOLD {
        return rough_sentences(text)
            .map(|sentence| {
                let sentence = match tone {
                    Tone::Suspenseful if !contains_any(sentence, &["danger", "threat"]) => {
                        sentence.replacen(' ', " mysterious ", 1)
                    }
                    Tone::Inspiring if !contains_any(sentence, &["will", "can"]) => {
                        sentence.replacen(' ', " incredible ", 1)
                    }
                    _ => sentence.to_string(),
                };
                format!("{sentence}{}", tone.terminal())
            })
            .collect::<Vec<_>>()
            .join(" ");
    }

    match tone {
        Tone::Suspenseful => format!("{}...", text.trim_end_matches(['.', '!', '?'])),
        Tone::Inspiring => match text.strip_suffix('.') {
            Some(stem) if !stem.ends_with('.') => format!("{stem}!"),
            _ if text.ends_with('!') => text.to_string(),
            _ => format!("{text}!"),
        },
        Tone::Neutral => text.replace("...", ".").replace('!', "."),
    }
}

/// Lexical substitution transform applied when the model is too slow to use.
///
/// Inserts tone words after the first article or conjunction of the opening
/// sentences and closes every sentence with the tone's punctuation.
pub fn lexical_transform(text: &str, tone: Tone) -> String {
    let words = tone.decoration_words();

    rough_sentences(text)
        .enumerate()
        .map(|(i, sentence)| {
            let decorated = if i < DECORATED_SENTENCES && !words.is_empty() {
                decorate(sentence, words[i % words.len()])
            } else {
                sentence.to_string()
            };
            format!("{decorated}{}", tone.terminal())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn decorate(sentence: &str, word: &str) -> String {
    match decoration_anchor().find(sentence) {
        Some(m) => format!("{}{word} {}", &sentence[..m.end()], &sentence[m.end()..]),
        None => sentence.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tone() {
        assert_eq!("Neutral".parse::<Tone>().unwrap(), Tone::Neutral);
        assert_eq!("SUSPENSEFUL".parse::<Tone>().unwrap(), Tone::Suspenseful);
        assert_eq!(" inspiring ".parse::<Tone>().unwrap(), Tone::Inspiring);
        let err = "angry".parse::<Tone>().unwrap_err();
        assert!(err.to_string().contains("angry"));
    }

    #[test]
    fn test_marker_and_terminal() {
        assert_eq!(Tone::Suspenseful.marker(), "Suspenseful version:");
        assert_eq!(Tone::Inspiring.terminal(), "!");
        assert_eq!(Tone::Neutral.to_string(), "Neutral");
    }

    #[test]
    fn test_ensure_terminal() {
        assert_eq!(ensure_terminal("It begins", Tone::Suspenseful), "It begins...");
        assert_eq!(ensure_terminal("It begins", Tone::Inspiring), "It begins!");
        assert_eq!(ensure_terminal("Done.", Tone::Inspiring), "Done.");
        assert_eq!(ensure_terminal("   ", Tone::Neutral), "");
    }

    #[test]
    fn test_quick_transform_short_text() {
        assert_eq!(quick_transform("The door opened.", Tone::Suspenseful), "The door opened...");
        assert_eq!(quick_transform("We did it.", Tone::Inspiring), "We did it!");
        assert_eq!(quick_transform("Wow! Really...", Tone::Neutral), "Wow. Really.");
    }

    #[test]
    fn test_quick_transform_long_text() {
        let text = "The house stood alone on the hill. Nobody had lived there for years.";
        let out = quick_transform(text, Tone::Suspenseful);
        assert!(out.starts_with("The mysterious house"));
        assert!(out.ends_with("..."));

        let out = quick_transform("You will win this race today. Keep running hard now!", Tone::Inspiring);
        assert!(out.starts_with("You will win"));
        assert!(out.contains("Keep incredible running"));
    }

    #[test]
    fn test_quick_transform_skips_danger_sentences() {
        let text = "There was danger everywhere in the valley. The wind was cold and sharp.";
        let out = quick_transform(text, Tone::Suspenseful);
        assert!(out.starts_with("There was danger"));
        assert!(out.contains("The mysterious wind"));
    }

    #[test]
    fn test_lexical_transform_suspenseful() {
        let out = lexical_transform("She opened the door. A cat ran out! Nothing moved?", Tone::Suspenseful);
        assert_eq!(
            out,
            "She opened the mysterious door... A ominous cat ran out... Nothing moved..."
        );
    }

    #[test]
    fn test_lexical_transform_limits_decoration() {
        let text = "The a. The b. The c. The d.";
        let out = lexical_transform(text, Tone::Inspiring);
        assert_eq!(
            out,
            "The incredible a! The amazing b! The extraordinary c! The d!"
        );
    }

    #[test]
    fn test_lexical_transform_neutral() {
        assert_eq!(lexical_transform("Hello there! Bye", Tone::Neutral), "Hello there. Bye.");
    }

    #[test]
    fn test_transforms_handle_empty_input() {
        assert_eq!(quick_transform("", Tone::Inspiring), "");
        assert_eq!(lexical_transform("", Tone::Suspenseful), "");
    }
}
