//! Generate config command implementation

use crate::config::CliConfig;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the generate-config command
#[derive(Debug, Args)]
pub struct GenerateConfigArgs {
    /// Output file path
    #[arg(short, long, value_name = "FILE", required = true)]
    pub output: PathBuf,
}

impl GenerateConfigArgs {
    /// Execute the generate-config command
    pub fn execute(&self) -> Result<()> {
        use std::fs;

        println!("Generating configuration template...");
        println!("  Output file: {}", self.output.display());

        let template = self.generate_template();

        fs::write(&self.output, template)
            .with_context(|| format!("Failed to write to {}", self.output.display()))?;

        println!("✓ Configuration template generated successfully!");
        println!();
        println!("Next steps:");
        println!("1. Point [model] at your Ollama server and pick a model");
        println!("2. Use it for generation:");
        println!(
            "   echoverse generate -i story.txt -t suspenseful --config {}",
            self.output.display()
        );

        Ok(())
    }

    /// Generate template configuration content
    fn generate_template(&self) -> String {
        let defaults = CliConfig::default();
        let model = &defaults.model;
        let tts = &defaults.tts;
        let processing = &defaults.processing;
        let performance = &defaults.performance;

        format!(
            r#"# EchoVerse configuration
#
# Every key is optional; removed keys fall back to the values shown here.

# Ollama-compatible language model server.
# The OLLAMA_URL environment variable overrides `url`.
[model]
url = "{}"
name = "{}"
timeout_secs = {}
connect_timeout_secs = {}

# Speech service
[tts]
# Default voice (see `echoverse list voices`)
voice = "{}"
# Longer rewritten text is cut at a sentence end before narration
max_chars = {}
# Excerpt length for the retry with the default voice
fallback_chars = {}
# Smaller responses count as failed synthesis
min_audio_bytes = {}
timeout_secs = {}

[processing]
# Prefer the fastest strategies
ultra_fast = {}
# 0.0 favours speed, 1.0 favours quality
quality_preference = {:.1}
# Longer input is truncated at a sentence end
max_input_chars = {}
# Narrations listed in the session summary
history_capacity = {}

[performance]
# Span sizes in characters
max_chunk_size = {}
min_chunk_size = {}
# Words of preceding context given to each span
overlap_size = {}
# Concurrent rewrite requests
max_concurrency = {}
# Cached rewrite results
cache_capacity = {}
# A probe rewrite slower than this switches to offline transforms
slow_threshold_secs = {:.1}
# Probe the model again after this many requests (0 = never)
reprobe_every = {}
"#,
            model.url,
            model.name,
            model.timeout_secs,
            model.connect_timeout_secs,
            tts.voice,
            tts.max_chars,
            tts.fallback_chars,
            tts.min_audio_bytes,
            tts.timeout_secs,
            processing.ultra_fast,
            processing.quality_preference,
            processing.max_input_chars,
            processing.history_capacity,
            performance.max_chunk_size,
            performance.min_chunk_size,
            performance.overlap_size,
            performance.max_concurrency,
            performance.cache_capacity,
            performance.slow_threshold_secs,
            performance.reprobe_every,
        )
    }
}
