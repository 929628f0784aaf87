//! Narration synthesis
//!
//! Prepares rewritten text for the speech service, calls it with the selected
//! voice and validates the returned audio. A failed or implausibly small
//! result triggers one retry with a short excerpt and the default voice.

mod prepare;

pub use prepare::{fallback_excerpt, flatten, truncate_for_speech};

use crate::domain::capabilities::{SpeechSynthesizer, SynthesisError};
use crate::domain::voice::{default_voice, VoiceProfile};
use std::sync::Arc;
use thiserror::Error;

/// Speech service input limit in characters
pub const MAX_SPEECH_CHARS: usize = 5000;
/// Retry excerpt limit in characters, `...` included
pub const FALLBACK_CHARS: usize = 500;
/// Audio smaller than this is treated as a failed synthesis
pub const MIN_AUDIO_BYTES: usize = 1000;

/// Errors from narration
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("Cannot narrate empty text")]
    EmptyText,

    /// Both the first attempt and the fallback failed
    #[error("Audio generation is currently unavailable: {first}; fallback: {fallback}")]
    Unavailable { first: String, fallback: String },
}

/// Audio plus how it was produced
#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub audio: Vec<u8>,
    /// Voice that produced `audio`
    pub voice: &'static VoiceProfile,
    /// Text that was spoken
    pub spoken_text: String,
    /// The fallback excerpt was used
    pub used_fallback: bool,
}

/// Wraps a [`SpeechSynthesizer`] with preparation, validation and retry
pub struct NarrationSynthesizer {
    tts: Arc<dyn SpeechSynthesizer>,
    max_chars: usize,
    fallback_chars: usize,
    min_audio_bytes: usize,
}

impl std::fmt::Debug for NarrationSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationSynthesizer")
            .field("max_chars", &self.max_chars)
            .field("fallback_chars", &self.fallback_chars)
            .field("min_audio_bytes", &self.min_audio_bytes)
            .finish()
    }
}

impl NarrationSynthesizer {
    pub fn new(tts: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            tts,
            max_chars: MAX_SPEECH_CHARS,
            fallback_chars: FALLBACK_CHARS,
            min_audio_bytes: MIN_AUDIO_BYTES,
        }
    }

    pub fn with_limits(mut self, max_chars: usize, fallback_chars: usize, min_audio_bytes: usize) -> Self {
        self.max_chars = max_chars;
        self.fallback_chars = fallback_chars;
        self.min_audio_bytes = min_audio_bytes;
        self
    }

    /// Narrate `text` with `voice`
    pub fn narrate(&self, text: &str, voice: &'static VoiceProfile) -> Result<Narration, NarrationError> {
        let flat = flatten(text);
        if flat.is_empty() {
            return Err(NarrationError::EmptyText);
        }

        let prepared = truncate_for_speech(&flat, self.max_chars);
        if prepared.len() < flat.len() {
            log::warn!(
                "Text truncated for speech from {} to {} characters",
                flat.chars().count(),
                prepared.chars().count()
            );
        }

        log::info!("Synthesizing {} characters with {}", prepared.chars().count(), voice.name);
        let first = match self.attempt(&prepared, voice) {
            Ok(audio) => {
                return Ok(Narration {
                    audio,
                    voice,
                    spoken_text: prepared,
                    used_fallback: false,
                })
            }
            Err(e) => e,
        };

        log::warn!("Audio generation failed ({first}), attempting fallback");
        let excerpt = fallback_excerpt(&flat, self.fallback_chars);
        let fallback_voice = default_voice();

        match self.attempt(&excerpt, fallback_voice) {
            Ok(audio) => {
                log::warn!("Used fallback audio generation with truncated text");
                Ok(Narration {
                    audio,
                    voice: fallback_voice,
                    spoken_text: excerpt,
                    used_fallback: true,
                })
            }
            Err(fallback) => Err(NarrationError::Unavailable {
                first: first.to_string(),
                fallback: fallback.to_string(),
            }),
        }
    }

    fn attempt(&self, text: &str, voice: &VoiceProfile) -> Result<Vec<u8>, SynthesisError> {
        let audio = self.tts.synthesize(
            text,
            voice.language_code,
            voice.regional_variant,
            voice.speed_class.is_slow(),
        )?;

        if audio.len() < self.min_audio_bytes {
            return Err(SynthesisError::InvalidAudio(format!(
                "{} bytes is too small",
                audio.len()
            )));
        }
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::find_voice;
    use std::sync::Mutex;

    /// Replays scripted results and records each call
    struct Scripted {
        replies: Mutex<Vec<Result<Vec<u8>, SynthesisError>>>,
        calls: Mutex<Vec<(String, String, bool)>>,
    }

    impl Scripted {
        fn new(mut replies: Vec<Result<Vec<u8>, SynthesisError>>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    impl SpeechSynthesizer for Scripted {
        fn synthesize(
            &self,
            text: &str,
            _language: &str,
            regional_variant: &str,
            slow: bool,
        ) -> Result<Vec<u8>, SynthesisError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), regional_variant.to_string(), slow));
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(SynthesisError::Request("script exhausted".into())))
        }
    }

    fn audio() -> Vec<u8> {
        vec![0xFF; 4096]
    }

    #[test]
    fn test_first_attempt_succeeds() {
        let tts = Scripted::new(vec![Ok(audio())]);
        let narrator = NarrationSynthesizer::new(tts.clone());
        let james = find_voice("James").unwrap();

        let out = narrator.narrate("Line one.\nLine two.", james).unwrap();
        assert!(!out.used_fallback);
        assert_eq!(out.spoken_text, "Line one. Line two.");

        let calls = tts.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "co.uk");
        assert!(calls[0].2);
    }

    #[test]
    fn test_small_audio_triggers_fallback() {
        let tts = Scripted::new(vec![Ok(vec![0; 10]), Ok(audio())]);
        let narrator = NarrationSynthesizer::new(tts.clone());
        let text = "A long sentence for narration. ".repeat(40);

        let out = narrator.narrate(&text, find_voice("David").unwrap()).unwrap();
        assert!(out.used_fallback);
        assert_eq!(out.voice.name, "Sarah (Female)");
        assert!(out.spoken_text.chars().count() <= FALLBACK_CHARS);

        let calls = tts.calls.lock().unwrap();
        assert_eq!(calls[1].1, "com");
        assert!(!calls[1].2);
    }

    #[test]
    fn test_second_failure_is_terminal() {
        let tts = Scripted::new(vec![
            Err(SynthesisError::Request("timeout".into())),
            Err(SynthesisError::Request("timeout again".into())),
        ]);
        let narrator = NarrationSynthesizer::new(tts);
        let err = narrator.narrate("Some text.", default_voice()).unwrap_err();
        assert!(matches!(err, NarrationError::Unavailable { .. }));
        assert!(err.to_string().contains("timeout again"));
    }

    #[test]
    fn test_empty_text_rejected() {
        let tts = Scripted::new(vec![]);
        let narrator = NarrationSynthesizer::new(tts.clone());
        assert!(matches!(
            narrator.narrate(" \n ", default_voice()),
            Err(NarrationError::EmptyText)
        ));
        assert!(tts.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_long_text_truncated_before_synthesis() {
        let tts = Scripted::new(vec![Ok(audio())]);
        let narrator = NarrationSynthesizer::new(tts.clone());
        let text = "Sentence number here. ".repeat(400);
        let out = narrator.narrate(&text, default_voice()).unwrap();
        assert!(out.spoken_text.chars().count() <= MAX_SPEECH_CHARS);
        assert!(out.spoken_text.ends_with('.'));
    }
}
