//! Google Translate speech endpoint
//!
//! The endpoint accepts at most 100 characters per request, so text is cut
//! at word boundaries and the MP3 frames of every piece are concatenated.

use super::build_http_client;
use echoverse_core::{SpeechSynthesizer, SynthesisError};
use reqwest::blocking::Client;
use std::time::Duration;

/// Longest text accepted by one request
pub const MAX_PIECE_CHARS: usize = 100;

const SLOW_SPEED: &str = "0.3";
const NORMAL_SPEED: &str = "1";

pub struct GoogleTts {
    client: Client,
}

impl GoogleTts {
    pub fn new(timeout: Duration) -> Result<Self, SynthesisError> {
        let client = build_http_client(Duration::from_secs(10), timeout)
            .map_err(|e| SynthesisError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    fn endpoint(regional_variant: &str) -> String {
        format!("https://translate.google.{regional_variant}/translate_tts")
    }

    fn fetch_piece(
        &self,
        url: &str,
        piece: &str,
        language: &str,
        slow: bool,
        (idx, total): (usize, usize),
    ) -> Result<Vec<u8>, SynthesisError> {
        let speed = if slow { SLOW_SPEED } else { NORMAL_SPEED };
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = piece.chars().count().to_string();

        let response = self
            .client
            .get(url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", piece),
                ("ttsspeed", speed),
                ("idx", idx.as_str()),
                ("total", total.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        let bytes = response
            .bytes()
            .map_err(|e| SynthesisError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl SpeechSynthesizer for GoogleTts {
    fn synthesize(
        &self,
        text: &str,
        language: &str,
        regional_variant: &str,
        slow: bool,
    ) -> Result<Vec<u8>, SynthesisError> {
        let pieces = split_for_requests(text, MAX_PIECE_CHARS);
        if pieces.is_empty() {
            return Err(SynthesisError::InvalidAudio("nothing to speak".to_string()));
        }

        let url = Self::endpoint(regional_variant);
        log::debug!("Synthesizing {} piece(s) via {}", pieces.len(), url);

        let mut audio = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            let frames = self.fetch_piece(&url, piece, language, slow, (i, pieces.len()))?;
            if frames.is_empty() {
                return Err(SynthesisError::InvalidAudio(format!(
                    "empty response for piece {} of {}",
                    i + 1,
                    pieces.len()
                )));
            }
            audio.extend_from_slice(&frames);
        }
        Ok(audio)
    }
}

/// Pack whole words into pieces of at most `max_chars` characters
///
/// Words longer than the limit are cut into `max_chars` slices.
pub fn split_for_requests(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            pieces.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            pieces.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_piece() {
        assert_eq!(split_for_requests("  Hello   world. ", 100), vec!["Hello world."]);
    }

    #[test]
    fn test_pieces_respect_limit() {
        let text = "The night was long and the wind did not stop howling. ".repeat(10);
        let pieces = split_for_requests(&text, MAX_PIECE_CHARS);
        assert!(pieces.len() > 1);
        for piece in &pieces {
            assert!(piece.chars().count() <= MAX_PIECE_CHARS, "{piece}");
        }
        assert_eq!(
            pieces.join(" ").split_whitespace().collect::<Vec<_>>(),
            text.split_whitespace().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_overlong_word_is_sliced() {
        let word = "é".repeat(25);
        let pieces = split_for_requests(&format!("a {word} b"), 10);
        assert_eq!(pieces, vec!["a", "éééééééééé", "éééééééééé", "ééééé", "b"]);
    }

    #[test]
    fn test_blank_text_has_no_pieces() {
        assert!(split_for_requests(" \n\t ", 100).is_empty());
    }

    #[test]
    fn test_blank_text_is_invalid_audio() {
        let tts = GoogleTts::new(Duration::from_secs(1)).unwrap();
        let err = tts.synthesize("   ", "en", "com", false).unwrap_err();
        assert!(matches!(err, SynthesisError::InvalidAudio(_)));
    }

    #[test]
    fn test_endpoint_uses_regional_domain() {
        assert_eq!(
            GoogleTts::endpoint("co.uk"),
            "https://translate.google.co.uk/translate_tts"
        );
    }
}
