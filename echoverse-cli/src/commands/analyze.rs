//! Analyze command implementation

use super::{init_logging, PreferenceArgs, Source, SourceArgs};
use crate::config::CliConfig;
use crate::error::CliError;
use crate::input::FileReader;
use crate::output::{AnalysisReport, JsonFormatter, OutputFormatter, TextFormatter};
use anyhow::{Context, Result};
use clap::Args;
use echoverse_core::api::prepare_input;
use std::io;
use std::path::PathBuf;

/// Arguments for the analyze command
#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub preferences: PreferenceArgs,

    /// List the strategies estimated to finish within this many seconds
    #[arg(long, value_name = "SECS")]
    pub budget: Option<f64>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Supported output formats
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// JSON array with one report per input
    Json,
}

impl AnalyzeArgs {
    /// Execute the analyze command
    pub fn execute(&self) -> Result<()> {
        init_logging(self.verbose, false);
        log::debug!("Arguments: {:?}", self);

        if let Some(budget) = self.budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(CliError::ConfigError(format!(
                    "budget must be a non-negative number of seconds, got {budget}"
                ))
                .into());
            }
        }

        let mut settings = CliConfig::load(self.config.as_deref())?;
        self.preferences.apply(&mut settings.processing)?;
        let config = settings.to_core()?;

        let mut formatter: Box<dyn OutputFormatter> = match self.format {
            OutputFormat::Text => Box::new(TextFormatter::stdout()),
            OutputFormat::Json => Box::new(JsonFormatter::new(io::stdout())),
        };

        for source in self.source.resolve()? {
            let text = match &source {
                Source::Text(text) => text.clone(),
                Source::File(path) => FileReader::read_text(path)?,
            };
            let prepared = prepare_input(&text, config.max_input_chars())
                .with_context(|| format!("Cannot analyze {}", source))?;
            if prepared.truncated {
                log::warn!(
                    "{}: analysing the first {} of {} chars",
                    source,
                    prepared.text.chars().count(),
                    prepared.original_chars
                );
            }

            let report = AnalysisReport::build(source.to_string(), &prepared.text, &config, self.budget);
            formatter.format_analysis(&report)?;
        }

        formatter.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_args_debug() {
        let args = AnalyzeArgs {
            source: SourceArgs {
                input: vec![],
                text: Some("Hello.".to_string()),
            },
            format: OutputFormat::Json,
            preferences: PreferenceArgs::default(),
            budget: Some(3.0),
            config: None,
            verbose: 0,
        };

        let debug_str = format!("{:?}", args);
        assert!(debug_str.contains("AnalyzeArgs"));
        assert!(debug_str.contains("Json"));
    }

    #[test]
    fn test_negative_budget_rejected() {
        let args = AnalyzeArgs {
            source: SourceArgs {
                input: vec![],
                text: Some("Hello.".to_string()),
            },
            format: OutputFormat::Text,
            preferences: PreferenceArgs::default(),
            budget: Some(-1.0),
            config: None,
            verbose: 0,
        };
        assert!(args.execute().is_err());
    }
}
