//! Configuration API for the audiobook studio

use crate::api::Error;
use crate::application::config::ProcessorConfig;
use crate::application::speed_guard::ReprobePolicy;
use crate::application::strategies::ProcessingPreferences;
use crate::domain::voice::{find_voice, VoiceProfile};
use std::time::Duration;

/// Default configuration constants
pub mod defaults {
    use std::time::Duration;

    /// Maximum span size in characters
    pub const MAX_CHUNK_SIZE: usize = 200;

    /// Spans shorter than this are merged
    pub const MIN_CHUNK_SIZE: usize = 50;

    /// Overlap context in words
    pub const OVERLAP_SIZE: usize = 30;

    /// Concurrent rewrite workers
    pub const MAX_CONCURRENCY: usize = 2;

    /// Rewrite results cache entries
    pub const CACHE_CAPACITY: usize = 50;

    pub const SLOW_THRESHOLD: Duration = Duration::from_secs(15);

    /// Characters accepted per request
    pub const MAX_INPUT_CHARS: usize = 10_000;

    /// Narration records kept per session
    pub const HISTORY_CAPACITY: usize = 5;

    /// Speech service input limit
    pub const TTS_MAX_CHARS: usize = 5000;

    /// Retry excerpt limit
    pub const TTS_FALLBACK_CHARS: usize = 500;

    /// Audio smaller than this is a failed synthesis
    pub const MIN_AUDIO_BYTES: usize = 1000;

    pub const QUALITY_PREFERENCE: f64 = 0.5;

    pub const VOICE: &str = crate::domain::voice::DEFAULT_VOICE;
}

/// Studio configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) processor: ProcessorConfig,
    pub(crate) preferences: ProcessingPreferences,
    pub(crate) max_input_chars: usize,
    pub(crate) history_capacity: usize,
    pub(crate) tts_max_chars: usize,
    pub(crate) tts_fallback_chars: usize,
    pub(crate) min_audio_bytes: usize,
    pub(crate) voice: &'static VoiceProfile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            processor: ProcessorConfig::default(),
            preferences: ProcessingPreferences::default(),
            max_input_chars: defaults::MAX_INPUT_CHARS,
            history_capacity: defaults::HISTORY_CAPACITY,
            tts_max_chars: defaults::TTS_MAX_CHARS,
            tts_fallback_chars: defaults::TTS_FALLBACK_CHARS,
            min_audio_bytes: defaults::MIN_AUDIO_BYTES,
            voice: crate::domain::voice::default_voice(),
        }
    }
}

impl Config {
    /// Create a configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn processor(&self) -> &ProcessorConfig {
        &self.processor
    }

    pub fn preferences(&self) -> ProcessingPreferences {
        self.preferences
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// Voice used when a request does not name one
    pub fn voice(&self) -> &'static VoiceProfile {
        self.voice
    }

    /// Validate the configuration
    pub(crate) fn validate(&self) -> Result<(), Error> {
        self.processor
            .validate()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        if !(0.0..=1.0).contains(&self.preferences.quality_preference) {
            return Err(Error::Configuration(
                "quality_preference must be between 0 and 1".into(),
            ));
        }

        if self.max_input_chars == 0 {
            return Err(Error::Configuration(
                "max_input_chars must be greater than 0".into(),
            ));
        }

        if self.history_capacity == 0 {
            return Err(Error::Configuration(
                "history_capacity must be greater than 0".into(),
            ));
        }

        if self.tts_fallback_chars < 4 || self.tts_fallback_chars > self.tts_max_chars {
            return Err(Error::Configuration(
                "tts_fallback_chars must be between 4 and tts_max_chars".into(),
            ));
        }

        Ok(())
    }
}

/// Fluent builder for configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    max_chunk_size: Option<usize>,
    min_chunk_size: Option<usize>,
    overlap_size: Option<usize>,
    overlap_context: Option<bool>,
    max_concurrency: Option<usize>,
    cache_capacity: Option<usize>,
    slow_threshold: Option<Duration>,
    reprobe: Option<ReprobePolicy>,
    ultra_fast: Option<bool>,
    quality_preference: Option<f64>,
    max_input_chars: Option<usize>,
    history_capacity: Option<usize>,
    tts_max_chars: Option<usize>,
    tts_fallback_chars: Option<usize>,
    min_audio_bytes: Option<usize>,
    voice: Option<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_chunk_size(mut self, chars: usize) -> Self {
        self.max_chunk_size = Some(chars);
        self
    }

    pub fn min_chunk_size(mut self, chars: usize) -> Self {
        self.min_chunk_size = Some(chars);
        self
    }

    /// Overlap context in words
    pub fn overlap_size(mut self, words: usize) -> Self {
        self.overlap_size = Some(words);
        self
    }

    pub fn overlap_context(mut self, enabled: bool) -> Self {
        self.overlap_context = Some(enabled);
        self
    }

    pub fn max_concurrency(mut self, workers: usize) -> Self {
        self.max_concurrency = Some(workers);
        self
    }

    pub fn cache_capacity(mut self, entries: usize) -> Self {
        self.cache_capacity = Some(entries);
        self
    }

    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = Some(threshold);
        self
    }

    pub fn reprobe(mut self, policy: ReprobePolicy) -> Self {
        self.reprobe = Some(policy);
        self
    }

    pub fn ultra_fast(mut self, enabled: bool) -> Self {
        self.ultra_fast = Some(enabled);
        self
    }

    /// 0.0 favours speed, 1.0 favours quality
    pub fn quality_preference(mut self, preference: f64) -> Self {
        self.quality_preference = Some(preference);
        self
    }

    pub fn max_input_chars(mut self, chars: usize) -> Self {
        self.max_input_chars = Some(chars);
        self
    }

    pub fn history_capacity(mut self, records: usize) -> Self {
        self.history_capacity = Some(records);
        self
    }

    pub fn tts_limits(mut self, max_chars: usize, fallback_chars: usize) -> Self {
        self.tts_max_chars = Some(max_chars);
        self.tts_fallback_chars = Some(fallback_chars);
        self
    }

    pub fn min_audio_bytes(mut self, bytes: usize) -> Self {
        self.min_audio_bytes = Some(bytes);
        self
    }

    /// Set the default voice by name
    pub fn voice(mut self, name: impl Into<String>) -> Self {
        self.voice = Some(name.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config, Error> {
        let mut config = Config::default();

        let processor = &mut config.processor;
        if let Some(size) = self.max_chunk_size {
            processor.max_chunk_size = size;
        }
        if let Some(size) = self.min_chunk_size {
            processor.min_chunk_size = size;
        }
        if let Some(words) = self.overlap_size {
            processor.overlap_size = words;
        }
        if let Some(enabled) = self.overlap_context {
            processor.overlap_context = enabled;
        }
        if let Some(workers) = self.max_concurrency {
            processor.max_concurrency = workers;
        }
        if let Some(entries) = self.cache_capacity {
            processor.cache_capacity = entries;
        }
        if let Some(threshold) = self.slow_threshold {
            processor.slow_threshold = threshold;
        }
        if let Some(policy) = self.reprobe {
            processor.reprobe = policy;
        }

        if let Some(enabled) = self.ultra_fast {
            config.preferences.ultra_fast = enabled;
        }
        if let Some(preference) = self.quality_preference {
            config.preferences.quality_preference = preference;
        }
        if let Some(chars) = self.max_input_chars {
            config.max_input_chars = chars;
        }
        if let Some(records) = self.history_capacity {
            config.history_capacity = records;
        }
        if let Some(chars) = self.tts_max_chars {
            config.tts_max_chars = chars;
        }
        if let Some(chars) = self.tts_fallback_chars {
            config.tts_fallback_chars = chars;
        }
        if let Some(bytes) = self.min_audio_bytes {
            config.min_audio_bytes = bytes;
        }
        if let Some(name) = self.voice {
            config.voice = find_voice(&name).ok_or(Error::UnknownVoice(name))?;
        }

        config.validate()?;
        Ok(config)
    }
}
