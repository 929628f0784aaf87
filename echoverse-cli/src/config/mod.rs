//! Configuration module
//!
//! The CLI reads an optional TOML file (see `echoverse generate-config`).
//! Every section and key may be omitted; missing values fall back to the
//! library defaults.

use crate::error::CliError;
use anyhow::{Context, Result};
use echoverse_core::api::defaults;
use echoverse_core::{Config, ReprobePolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// CLI configuration structure
#[derive(Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct CliConfig {
    /// Language model backend
    #[serde(default)]
    pub model: ModelConfig,

    /// Speech service backend
    #[serde(default)]
    pub tts: TtsConfig,

    /// Processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Performance configuration
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Language model backend configuration
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of an Ollama-compatible server (`OLLAMA_URL` overrides it)
    pub url: String,

    /// Model name passed with every request
    pub name: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: crate::backends::ollama::DEFAULT_URL.to_string(),
            name: crate::backends::ollama::DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

/// Speech service configuration
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TtsConfig {
    /// Default narration voice
    pub voice: String,

    /// Longest text sent for one narration
    pub max_chars: usize,

    /// Longest excerpt used for the retry attempt
    pub fallback_chars: usize,

    /// Audio smaller than this counts as a failed synthesis
    pub min_audio_bytes: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            voice: defaults::VOICE.to_string(),
            max_chars: defaults::TTS_MAX_CHARS,
            fallback_chars: defaults::TTS_FALLBACK_CHARS,
            min_audio_bytes: defaults::MIN_AUDIO_BYTES,
            timeout_secs: 30,
        }
    }
}

/// Processing-related configuration
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Prefer the fastest tiers
    pub ultra_fast: bool,

    /// 0.0 favours speed, 1.0 favours quality
    pub quality_preference: f64,

    /// Characters accepted per input
    pub max_input_chars: usize,

    /// Narrations kept in the session history
    pub history_capacity: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            ultra_fast: true,
            quality_preference: defaults::QUALITY_PREFERENCE,
            max_input_chars: defaults::MAX_INPUT_CHARS,
            history_capacity: defaults::HISTORY_CAPACITY,
        }
    }
}

/// Performance-related configuration
#[derive(Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Maximum span size in characters
    pub max_chunk_size: usize,

    /// Spans shorter than this are merged with a neighbour
    pub min_chunk_size: usize,

    /// Words of preceding context attached to each span
    pub overlap_size: usize,

    /// Concurrent rewrite workers
    pub max_concurrency: usize,

    /// Cached rewrite results
    pub cache_capacity: usize,

    /// Probe rewrites slower than this switch to offline transforms
    pub slow_threshold_secs: f64,

    /// Probe the model again after this many requests (0 = never)
    pub reprobe_every: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: defaults::MAX_CHUNK_SIZE,
            min_chunk_size: defaults::MIN_CHUNK_SIZE,
            overlap_size: defaults::OVERLAP_SIZE,
            max_concurrency: defaults::MAX_CONCURRENCY,
            cache_capacity: defaults::CACHE_CAPACITY,
            slow_threshold_secs: defaults::SLOW_THRESHOLD.as_secs_f64(),
            reprobe_every: 0,
        }
    }
}

impl PerformanceConfig {
    fn reprobe_policy(&self) -> ReprobePolicy {
        match self.reprobe_every {
            0 => ReprobePolicy::Never,
            n => ReprobePolicy::EveryRequests(n),
        }
    }
}

impl CliConfig {
    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| CliError::ConfigError(e.to_string()))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` when given, the defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Build the library configuration
    pub fn to_core(&self) -> Result<Config> {
        if !self.performance.slow_threshold_secs.is_finite()
            || self.performance.slow_threshold_secs <= 0.0
        {
            return Err(CliError::ConfigError(
                "slow_threshold_secs must be a positive number".to_string(),
            )
            .into());
        }

        let config = Config::builder()
            .max_chunk_size(self.performance.max_chunk_size)
            .min_chunk_size(self.performance.min_chunk_size)
            .overlap_size(self.performance.overlap_size)
            .max_concurrency(self.performance.max_concurrency)
            .cache_capacity(self.performance.cache_capacity)
            .slow_threshold(Duration::from_secs_f64(self.performance.slow_threshold_secs))
            .reprobe(self.performance.reprobe_policy())
            .ultra_fast(self.processing.ultra_fast)
            .quality_preference(self.processing.quality_preference)
            .max_input_chars(self.processing.max_input_chars)
            .history_capacity(self.processing.history_capacity)
            .tts_limits(self.tts.max_chars, self.tts.fallback_chars)
            .min_audio_bytes(self.tts.min_audio_bytes)
            .voice(self.tts.voice.clone())
            .build()
            .map_err(|e| CliError::ConfigError(e.to_string()))?;
        Ok(config)
    }
}
