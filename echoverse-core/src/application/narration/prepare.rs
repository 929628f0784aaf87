//! Text preparation for the speech service

const ELLIPSIS: &str = "...";

/// Flatten line breaks into spaces and trim
pub fn flatten(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}

/// Cut `text` to at most `max_chars` characters.
///
/// Ends on the last sentence period when one lies past 80% of the limit,
/// otherwise hard-cuts so the appended `...` still fits the limit.
pub fn truncate_for_speech(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let head = take_chars(text, max_chars);
    let floor = max_chars * 4 / 5;
    match head.rfind('.') {
        Some(pos) if head[..pos].chars().count() >= floor => head[..=pos].to_string(),
        _ => hard_cut(text, max_chars),
    }
}

/// Retry text: at most `max_chars` characters including the trailing `...`
pub fn fallback_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    hard_cut(text, max_chars)
}

fn hard_cut(text: &str, max_chars: usize) -> String {
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    format!("{}{ELLIPSIS}", take_chars(text, keep).trim_end())
}

fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}
