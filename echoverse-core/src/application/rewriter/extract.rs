//! Extraction of the rewritten text from raw model output
//!
//! Instruction-tuned models tend to echo the prompt, announce their answer
//! ("Here is the rewritten text:") or append notes. This module strips all of
//! that and returns only the rewritten passage.

use crate::domain::tone::Tone;
use regex::Regex;
use std::sync::OnceLock;

/// Lines starting like this end the answer.
const TRAILER_PREFIXES: &[&str] = &["text:", "original:", "note:", "explanation:", "rewritten version:"];

fn scaffold() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(here is|here's|sure|certainly|rewritten)[^:\n]*:\s*")
            .expect("valid scaffold regex")
    })
}

fn annotation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]\n]*\]").expect("valid annotation regex"))
}

fn horizontal_space() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").expect("valid whitespace regex"))
}

/// Pull the rewritten passage out of `raw`, given the `prompt` that produced it
pub fn extract_rewrite(raw: &str, prompt: &str, tone: Tone) -> String {
    let answer = after_marker(raw, &tone.marker())
        .or_else(|| raw.strip_prefix(prompt))
        .unwrap_or(raw);

    clean(answer)
}

/// Text after the last case-insensitive occurrence of `marker`
fn after_marker<'a>(raw: &'a str, marker: &str) -> Option<&'a str> {
    let pattern = Regex::new(&format!("(?i){}", regex::escape(marker))).ok()?;
    pattern.find_iter(raw).last().map(|m| &raw[m.end()..])
}

fn clean(answer: &str) -> String {
    let mut lines = Vec::new();
    for line in answer.trim().lines() {
        let lowered = line.trim_start().to_lowercase();
        if TRAILER_PREFIXES.iter().any(|p| lowered.starts_with(p)) && !lines.is_empty() {
            break;
        }
        lines.push(line);
    }

    let body = lines.join("\n");
    let body = scaffold().replace(&body, "");
    let body = annotation().replace_all(&body, "");
    let body = horizontal_space().replace_all(&body, " ");

    strip_quotes(body.trim()).trim().to_string()
}

fn strip_quotes(text: &str) -> &str {
    for (open, close) in [('"', '"'), ('“', '”'), ('\'', '\'')] {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            if !inner.contains(open) && !inner.contains(close) {
                return inner;
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "Rewrite...\n\nText: hi\n\nSuspenseful version:";

    #[test]
    fn test_extracts_after_marker() {
        let raw = format!("{PROMPT} The night fell, and silence crept in...");
        assert_eq!(
            extract_rewrite(&raw, PROMPT, Tone::Suspenseful),
            "The night fell, and silence crept in..."
        );
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        let raw = "SUSPENSEFUL VERSION: Darkness.";
        assert_eq!(extract_rewrite(raw, PROMPT, Tone::Suspenseful), "Darkness.");
    }

    #[test]
    fn test_strips_echoed_prompt_without_marker() {
        let prompt = "Rewrite this:";
        assert_eq!(
            extract_rewrite("Rewrite this: A bright day.", prompt, Tone::Neutral),
            "A bright day."
        );
    }

    #[test]
    fn test_removes_scaffold_and_annotations() {
        let raw = "Here is the rewritten text: \"We rise [inspiring] again!\"";
        assert_eq!(extract_rewrite(raw, "unrelated", Tone::Inspiring), "We rise again!");
    }

    #[test]
    fn test_stops_at_trailer() {
        let raw = "Inspiring version: Keep going!\nNote: I added energy.";
        assert_eq!(extract_rewrite(raw, PROMPT, Tone::Inspiring), "Keep going!");
    }

    #[test]
    fn test_collapses_spaces_but_keeps_lines() {
        let raw = "Neutral version:   One   line.\nTwo\tlines.";
        assert_eq!(extract_rewrite(raw, PROMPT, Tone::Neutral), "One line.\nTwo lines.");
    }

    #[test]
    fn test_unicode_marker_search() {
        let raw = "Ünïcode prefix. Neutral version: Calm words.";
        assert_eq!(extract_rewrite(raw, PROMPT, Tone::Neutral), "Calm words.");
    }
}
