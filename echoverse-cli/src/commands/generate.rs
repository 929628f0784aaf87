//! Generate command implementation

use super::{init_logging, PreferenceArgs, Source, SourceArgs};
use crate::backends::{GoogleTts, OllamaModel};
use crate::config::CliConfig;
use crate::error::CliError;
use crate::input::FileReader;
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use clap::Args;
use echoverse_core::{
    ApiError, Audiobook, AudiobookRequest, AudiobookStudio, Config, ModelError, SessionHistory, Tone,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Arguments for the generate command
#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Narrative tone
    #[arg(short, long, default_value = "neutral")]
    pub tone: Tone,

    /// Narration voice, by name or first name (see `echoverse list voices`)
    #[arg(short = 'V', long, value_name = "NAME")]
    pub voice: Option<String>,

    /// Directory for the generated MP3 files
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Audiobook file name (without `.mp3`)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Never contact the language model; use offline tone transforms
    #[arg(long)]
    pub offline: bool,

    /// Print the rewritten text instead of narrating it
    #[arg(long)]
    pub text_only: bool,

    #[command(flatten)]
    pub preferences: PreferenceArgs,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GenerateArgs {
    /// Execute the generate command
    pub fn execute(&self) -> Result<()> {
        init_logging(self.verbose, self.quiet);

        log::info!("Starting audiobook generation");
        log::debug!("Arguments: {:?}", self);

        let mut settings = CliConfig::load(self.config.as_deref())?;
        self.preferences.apply(&mut settings.processing)?;
        let config = settings.to_core()?;

        let sources = self.source.resolve()?;
        let mut studio = self.build_studio(&settings, config)?;

        if !self.text_only {
            fs::create_dir_all(&self.output_dir).with_context(|| {
                format!("Failed to create output directory: {}", self.output_dir.display())
            })?;
        }

        let mut progress = ProgressReporter::new(self.quiet);
        progress.init_files(sources.len() as u64);

        let mut failures = 0;
        for (i, source) in sources.iter().enumerate() {
            let request = self.request_for(source, i, sources.len());

            let created = studio.create_with_events(source.to_input(), &request, |event| {
                progress.on_event(&event)
            });

            match created {
                Ok(book) => {
                    self.deliver(source, &book, &progress)?;
                    progress.file_completed(&book.filename);
                }
                Err(e) => {
                    if let Some(fatal) = fatal_error(&e) {
                        progress.finish();
                        return Err(fatal.into());
                    }
                    failures += 1;
                    log::error!("{}: {}", source, e);
                    progress.println(format!("✗ {}: {}", source, e));
                    progress.file_failed(&source.to_string());
                }
            }
        }

        progress.finish();

        if !self.quiet && !studio.history().is_empty() {
            print_history(studio.history());
        }

        for stats in studio.processor().adaptive().performance_stats() {
            log::info!(
                "{} @ {}+ chars: avg {:.2}s (min {:.2}s, max {:.2}s, {} run(s))",
                stats.strategy,
                stats.length_bucket,
                stats.avg_time,
                stats.min_time,
                stats.max_time,
                stats.sample_count
            );
        }

        if failures > 0 {
            return Err(CliError::ProcessingError(format!(
                "{} of {} input(s) failed",
                failures,
                sources.len()
            ))
            .into());
        }

        Ok(())
    }

    fn build_studio(&self, settings: &CliConfig, config: Config) -> Result<AudiobookStudio> {
        let tts = GoogleTts::new(Duration::from_secs(settings.tts.timeout_secs))
            .map_err(|e| CliError::BackendUnavailable(e.to_string()))?;
        let model = OllamaModel::new(&settings.model)
            .map_err(|e| CliError::BackendUnavailable(e.to_string()))?;

        let online = !self.offline
            && match model.check_available() {
                Ok(()) => {
                    log::info!("Using model '{}' at {}", settings.model.name, model.base_url());
                    true
                }
                Err(ModelError::ResourceExhausted(detail)) => {
                    return Err(CliError::ResourceExhausted(detail).into());
                }
                Err(e) => {
                    log::warn!("{}; falling back to offline tone transforms", e);
                    false
                }
            };

        let studio = AudiobookStudio::new(Arc::new(model), Arc::new(tts), config);
        if !online {
            studio.force_offline();
        }
        Ok(studio)
    }

    fn request_for(&self, source: &Source, index: usize, total: usize) -> AudiobookRequest {
        let mut request = AudiobookRequest::new(self.tone).text_only(self.text_only);
        if let Some(voice) = &self.voice {
            request = request.voice(voice.clone());
        }
        if let Some(name) = self.book_name(source, index, total) {
            request = request.name(name);
        }
        request
    }

    /// `--name` for a single input, `<name>_<n>` for several; files default to `<stem>_<tone>`
    fn book_name(&self, source: &Source, index: usize, total: usize) -> Option<String> {
        match (&self.name, source) {
            (Some(name), _) if total == 1 => Some(name.clone()),
            (Some(name), _) => Some(format!("{}_{}", name, index + 1)),
            (None, Source::File(path)) => {
                FileReader::stem(path).map(|stem| format!("{}_{}", stem, self.tone.as_str()))
            }
            (None, Source::Text(_)) => None,
        }
    }

    fn deliver(&self, source: &Source, book: &Audiobook, progress: &ProgressReporter) -> Result<()> {
        if book.input_truncated {
            log::warn!(
                "{}: input of {} chars was truncated before processing",
                source,
                book.original_chars
            );
        }
        if let Some(error) = &book.report.error {
            log::warn!("{}: rewrite failed, original text kept ({})", source, error);
        }

        if self.text_only {
            println!("{}", book.rewritten_text);
            return Ok(());
        }

        let Some(narration) = &book.narration else {
            return Ok(());
        };
        if narration.used_fallback {
            log::warn!(
                "{}: narrated a {}-char excerpt with {}",
                source,
                narration.spoken_text.chars().count(),
                narration.voice.name
            );
        }

        let path = self.output_dir.join(&book.filename);
        fs::write(&path, &narration.audio)
            .with_context(|| format!("Failed to write audio: {}", path.display()))?;

        progress.println(format!(
            "✓ {} -> {} ({:.1} KB, {}, {} strategy, {:.1}s)",
            source,
            path.display(),
            narration.audio.len() as f64 / 1024.0,
            narration.voice.name,
            book.report.strategy,
            book.processing_time
        ));
        Ok(())
    }
}

fn print_history(history: &SessionHistory) {
    println!();
    println!("Session history ({} of {}):", history.len(), history.capacity());
    for record in history.iter() {
        println!(
            "  {}  {:<11}  {:<16}  {}  ({:.1}s)",
            record.timestamp.format("%H:%M:%S"),
            record.tone.as_str(),
            record.voice,
            record.filename,
            record.processing_time
        );
        println!("      {}", record.original_excerpt);
    }
}

/// Errors that end the whole run instead of failing a single input
fn fatal_error(err: &ApiError) -> Option<CliError> {
    match err {
        ApiError::Model(ModelError::ResourceExhausted(detail)) => {
            Some(CliError::ResourceExhausted(detail.clone()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: Option<&str>) -> GenerateArgs {
        GenerateArgs {
            source: SourceArgs {
                input: vec!["*.txt".to_string()],
                text: None,
            },
            tone: Tone::Suspenseful,
            voice: None,
            output_dir: PathBuf::from("."),
            name: name.map(str::to_string),
            offline: true,
            text_only: false,
            preferences: PreferenceArgs::default(),
            config: None,
            quiet: true,
            verbose: 0,
        }
    }

    #[test]
    fn test_generate_args_debug() {
        let debug_str = format!("{:?}", args(None));
        assert!(debug_str.contains("GenerateArgs"));
        assert!(debug_str.contains("Suspenseful"));
    }

    #[test]
    fn test_file_inputs_named_after_stem_and_tone() {
        let source = Source::File(PathBuf::from("books/chapter1.txt"));
        assert_eq!(
            args(None).book_name(&source, 0, 2),
            Some("chapter1_suspenseful".to_string())
        );
    }

    #[test]
    fn test_custom_name_numbered_for_several_inputs() {
        let source = Source::File(PathBuf::from("a.txt"));
        assert_eq!(args(Some("saga")).book_name(&source, 0, 1), Some("saga".to_string()));
        assert_eq!(args(Some("saga")).book_name(&source, 1, 3), Some("saga_2".to_string()));
    }

    #[test]
    fn test_inline_text_uses_generated_name() {
        let source = Source::Text("Hi.".to_string());
        assert_eq!(args(None).book_name(&source, 0, 1), None);
    }

    #[test]
    fn test_request_carries_voice_and_mode() {
        let mut generate = args(None);
        generate.voice = Some("emma".to_string());
        generate.text_only = true;
        let request = generate.request_for(&Source::Text("Hi.".to_string()), 0, 1);
        assert_eq!(request.tone, Tone::Suspenseful);
        assert_eq!(request.voice.as_deref(), Some("emma"));
        assert!(request.text_only);
        assert!(request.name.is_none());
    }

    #[test]
    fn test_resource_exhaustion_is_fatal() {
        let err = ApiError::Model(ModelError::ResourceExhausted("out of memory".to_string()));
        let fatal = fatal_error(&err).expect("resource errors stop the run");
        assert!(matches!(fatal, CliError::ResourceExhausted(ref d) if d == "out of memory"));
        assert!(fatal.to_string().contains("Free up memory or disk space"));
    }

    #[test]
    fn test_other_failures_only_fail_one_input() {
        assert!(fatal_error(&ApiError::UnknownVoice("Zed".to_string())).is_none());
        assert!(fatal_error(&ApiError::Model(ModelError::Unavailable("refused".to_string()))).is_none());
    }
}
