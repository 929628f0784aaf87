//! Audiobook studio: the end-to-end entry point

use crate::api::config::Config;
use crate::api::history::{NarrationRecord, SessionHistory};
use crate::api::input::{prepare_input, Input};
use crate::api::{Error, Result};
use crate::application::adaptive::{ProcessingReport, ProgressEvent};
use crate::application::narration::{Narration, NarrationSynthesizer};
use crate::application::smart::SmartProcessor;
use crate::application::speed_guard::SpeedVerdict;
use crate::domain::capabilities::{LanguageModel, ModelError, SpeechSynthesizer};
use crate::domain::tone::Tone;
use crate::domain::voice::{find_voice, VoiceProfile};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What to produce for one input
#[derive(Debug, Clone, Default)]
pub struct AudiobookRequest {
    pub tone: Tone,
    /// Voice name; the configured voice when `None`
    pub voice: Option<String>,
    /// File stem replacing the generated `echoverse_<tone>_<timestamp>` name
    pub name: Option<String>,
    /// Rewrite only, skip narration
    pub text_only: bool,
}

impl AudiobookRequest {
    pub fn new(tone: Tone) -> Self {
        Self {
            tone,
            ..Self::default()
        }
    }

    pub fn voice(mut self, name: impl Into<String>) -> Self {
        self.voice = Some(name.into());
        self
    }

    pub fn name(mut self, stem: impl Into<String>) -> Self {
        self.name = Some(stem.into());
        self
    }

    pub fn text_only(mut self, enabled: bool) -> Self {
        self.text_only = enabled;
        self
    }
}

/// Result of one studio run
#[derive(Debug, Clone)]
pub struct Audiobook {
    /// Input text after limits were applied
    pub original_text: String,
    pub rewritten_text: String,
    /// Characters in the input before truncation
    pub original_chars: usize,
    pub input_truncated: bool,
    pub report: ProcessingReport,
    /// `None` for text-only requests
    pub narration: Option<Narration>,
    pub filename: String,
    /// Seconds for the whole run
    pub processing_time: f64,
}

impl Audiobook {
    pub fn audio(&self) -> Option<&[u8]> {
        self.narration.as_ref().map(|n| n.audio.as_slice())
    }
}

/// Rewrites text in a tone and narrates it, keeping a session history
pub struct AudiobookStudio {
    processor: SmartProcessor,
    narrator: NarrationSynthesizer,
    config: Config,
    history: SessionHistory,
}

impl std::fmt::Debug for AudiobookStudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudiobookStudio")
            .field("processor", &self.processor)
            .field("narrator", &self.narrator)
            .field("history", &self.history.len())
            .finish()
    }
}

impl AudiobookStudio {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        tts: Arc<dyn SpeechSynthesizer>,
        config: Config,
    ) -> Self {
        let narrator = NarrationSynthesizer::new(tts).with_limits(
            config.tts_max_chars,
            config.tts_fallback_chars,
            config.min_audio_bytes,
        );
        Self {
            processor: SmartProcessor::new(model, config.processor()),
            narrator,
            history: SessionHistory::new(config.history_capacity()),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn processor(&self) -> &SmartProcessor {
        &self.processor
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Never contact the model; every request uses the lexical transform
    pub fn force_offline(&self) {
        self.processor.force(SpeedVerdict::Slow(Duration::ZERO));
    }

    pub fn create(&mut self, input: Input, request: &AudiobookRequest) -> Result<Audiobook> {
        self.create_with_events(input, request, |_| {})
    }

    /// Like [`create`](Self::create), reporting rewrite progress
    pub fn create_with_events<F>(
        &mut self,
        input: Input,
        request: &AudiobookRequest,
        on_event: F,
    ) -> Result<Audiobook>
    where
        F: FnMut(ProgressEvent),
    {
        let started = Instant::now();
        let voice = self.resolve_voice(request.voice.as_deref())?;

        let raw = input.into_text()?;
        let prepared = prepare_input(&raw, self.config.max_input_chars())?;

        let (rewritten, report) = self.processor.process_with_events(
            &prepared.text,
            request.tone,
            self.config.preferences(),
            on_event,
        );
        if let Some(detail) = &report.resource_error {
            return Err(ModelError::ResourceExhausted(detail.clone()).into());
        }

        let narration = if request.text_only {
            None
        } else {
            Some(self.narrator.narrate(&rewritten, voice)?)
        };

        let filename = audiobook_filename(request.tone, request.name.as_deref(), Local::now());
        let processing_time = started.elapsed().as_secs_f64();

        if let Some(narration) = &narration {
            self.history.push(NarrationRecord {
                timestamp: Local::now(),
                tone: request.tone,
                voice: narration.voice.name.to_string(),
                original_excerpt: NarrationRecord::excerpt(&prepared.text),
                rewritten_text: rewritten.clone(),
                audio: narration.audio.clone(),
                filename: filename.clone(),
                processing_time,
            });
        }

        log::info!(
            "Created {} in {:.1}s ({} strategy)",
            filename,
            processing_time,
            report.strategy
        );

        Ok(Audiobook {
            original_text: prepared.text,
            rewritten_text: rewritten,
            original_chars: prepared.original_chars,
            input_truncated: prepared.truncated,
            report,
            narration,
            filename,
            processing_time,
        })
    }

    fn resolve_voice(&self, name: Option<&str>) -> Result<&'static VoiceProfile> {
        match name {
            None => Ok(self.config.voice()),
            Some(name) => find_voice(name).ok_or_else(|| Error::UnknownVoice(name.to_string())),
        }
    }
}

/// `<custom>.mp3`, or `echoverse_<tone>_<YYYYMMDD_HHMMSS>.mp3` without a custom stem
pub fn audiobook_filename(tone: Tone, custom: Option<&str>, at: DateTime<Local>) -> String {
    let custom = custom
        .map(|stem| {
            let stem = stem.trim();
            stem.strip_suffix(".mp3").unwrap_or(stem).replace(['/', '\\'], "_")
        })
        .filter(|stem| !stem.is_empty());

    match custom {
        Some(stem) => format!("{stem}.mp3"),
        None => format!("echoverse_{}_{}.mp3", tone.as_str(), at.format("%Y%m%d_%H%M%S")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generated_filename() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            audiobook_filename(Tone::Suspenseful, None, at),
            "echoverse_suspenseful_20240309_140507.mp3"
        );
        assert_eq!(
            audiobook_filename(Tone::Neutral, Some("  "), at),
            "echoverse_neutral_20240309_140507.mp3"
        );
    }

    #[test]
    fn test_custom_filename() {
        let at = Local::now();
        assert_eq!(audiobook_filename(Tone::Neutral, Some("chapter1"), at), "chapter1.mp3");
        assert_eq!(audiobook_filename(Tone::Neutral, Some("chapter1.mp3"), at), "chapter1.mp3");
        assert_eq!(audiobook_filename(Tone::Neutral, Some("a/b"), at), "a_b.mp3");
    }

    #[test]
    fn test_request_builder() {
        let request = AudiobookRequest::new(Tone::Inspiring).voice("Emma").name("x").text_only(true);
        assert_eq!(request.tone, Tone::Inspiring);
        assert_eq!(request.voice.as_deref(), Some("Emma"));
        assert!(request.text_only);
    }
}
