//! CLI command implementations

use crate::config::ProcessingConfig;
use crate::error::CliError;
use anyhow::Result;
use clap::{Args, Subcommand};
use echoverse_core::{voices, Input, Tone, DEFAULT_VOICE};
use std::fmt;
use std::path::PathBuf;

pub mod analyze;
pub mod generate;
pub mod generate_config;

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rewrite text in a narrative tone and narrate it to MP3
    Generate(generate::GenerateArgs),

    /// Show text metrics, the chosen processing strategy and the chunk plan
    Analyze(analyze::AnalyzeArgs),

    /// List available components
    List {
        #[command(subcommand)]
        subcommand: ListCommands,
    },

    /// Write a commented configuration template
    GenerateConfig(generate_config::GenerateConfigArgs),
}

/// List subcommands
#[derive(Debug, Subcommand)]
pub enum ListCommands {
    /// List narration voices
    Voices,

    /// List narrative tones
    Tones,
}

impl Commands {
    pub fn execute(&self) -> Result<()> {
        match self {
            Commands::Generate(args) => args.execute(),
            Commands::Analyze(args) => args.execute(),
            Commands::List { subcommand } => {
                subcommand.execute();
                Ok(())
            }
            Commands::GenerateConfig(args) => args.execute(),
        }
    }
}

impl ListCommands {
    pub fn execute(&self) {
        match self {
            ListCommands::Voices => {
                println!("Available voices:");
                for voice in voices() {
                    let marker = if voice.name == DEFAULT_VOICE { " (default)" } else { "" };
                    println!(
                        "  {:<16} {:<14} {:<7} {}{}",
                        voice.name, voice.accent, voice.speed_class, voice.description, marker
                    );
                }
            }
            ListCommands::Tones => {
                println!("Available tones:");
                for tone in Tone::ALL {
                    let marker = if tone == Tone::default() { " (default)" } else { "" };
                    println!("  {:<12} {}{}", tone.as_str(), tone.description(), marker);
                }
            }
        }
    }
}

/// Where the text comes from: files and glob patterns, or inline text
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Input files or patterns (supports glob)
    #[arg(short, long, value_name = "FILE/PATTERN")]
    pub input: Vec<String>,

    /// Inline text to process
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,
}

/// One resolved input
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Text(String),
    File(PathBuf),
}

impl Source {
    pub fn to_input(&self) -> Input {
        match self {
            Source::Text(text) => Input::from_text(text.clone()),
            Source::File(path) => Input::from_file(path),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Text(_) => f.write_str("<text>"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl SourceArgs {
    /// Expand patterns into the list of inputs to process
    pub fn resolve(&self) -> Result<Vec<Source>> {
        match &self.text {
            Some(text) => Ok(vec![Source::Text(text.clone())]),
            None => Ok(crate::input::resolve_patterns(&self.input)?
                .into_iter()
                .map(Source::File)
                .collect()),
        }
    }
}

/// Speed versus quality overrides shared by `generate` and `analyze`
#[derive(Debug, Args, Default)]
pub struct PreferenceArgs {
    /// Prefer the fastest processing tiers
    #[arg(long)]
    pub ultra_fast: bool,

    /// Quality preference between 0 (speed) and 1 (quality); disables ultra-fast unless given too
    #[arg(long, value_name = "0-1")]
    pub quality: Option<f64>,
}

impl PreferenceArgs {
    pub fn apply(&self, processing: &mut ProcessingConfig) -> Result<()> {
        if let Some(quality) = self.quality {
            if !(0.0..=1.0).contains(&quality) {
                return Err(CliError::ConfigError(format!(
                    "quality must be between 0 and 1, got {quality}"
                ))
                .into());
            }
            processing.quality_preference = quality;
            processing.ultra_fast = false;
        }
        if self.ultra_fast {
            processing.ultra_fast = true;
        }
        Ok(())
    }
}

/// Initialize logging based on verbosity level
pub(crate) fn init_logging(verbose: u8, quiet: bool) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    if !quiet {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .try_init();
    }
}
