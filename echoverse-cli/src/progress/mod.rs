//! Progress reporting module

use echoverse_core::ProgressEvent;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for audiobook generation
///
/// One bar counts finished inputs; its message follows the rewrite of the
/// input currently being processed.
pub struct ProgressReporter {
    progress_bar: Option<ProgressBar>,
    quiet: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new(quiet: bool) -> Self {
        Self {
            progress_bar: None,
            quiet,
        }
    }

    /// Initialize progress bar for the given number of inputs
    pub fn init_files(&mut self, total_files: u64) {
        if self.quiet {
            return;
        }

        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} books {msg}")
            .map(|style| style.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        let pb = ProgressBar::new(total_files);
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));

        self.progress_bar = Some(pb);
    }

    /// Reflect a rewrite event in the bar message
    pub fn on_event(&self, event: &ProgressEvent) {
        let Some(pb) = &self.progress_bar else {
            return;
        };
        if let Some(message) = describe(event) {
            pb.set_message(message);
        }
    }

    /// Update progress for a completed input
    pub fn file_completed(&self, name: &str) {
        if let Some(pb) = &self.progress_bar {
            pb.set_message(format!("Created: {}", name));
            pb.inc(1);
        }
    }

    /// Count an input that could not be processed
    pub fn file_failed(&self, name: &str) {
        if let Some(pb) = &self.progress_bar {
            pb.set_message(format!("Failed: {}", name));
            pb.inc(1);
        }
    }

    /// Print a line without tearing the bar
    pub fn println(&self, line: impl AsRef<str>) {
        match &self.progress_bar {
            Some(pb) => pb.println(line.as_ref()),
            None if !self.quiet => eprintln!("{}", line.as_ref()),
            None => {}
        }
    }

    /// Finish progress reporting
    pub fn finish(&self) {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message("Complete");
        }
    }
}

fn describe(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::Analysis {
            strategy,
            text_length,
            estimated_time,
        } => Some(format!(
            "{} strategy for {} chars (~{:.1}s)",
            strategy, text_length, estimated_time
        )),
        ProgressEvent::ChunksCreated { count } => Some(format!("Rewriting 0/{count} chunks")),
        ProgressEvent::Progress(progress) => Some(format!(
            "Rewriting {}/{} chunks",
            progress.completed, progress.total
        )),
        ProgressEvent::ChunkComplete { .. } => None,
        ProgressEvent::Complete { .. } => Some("Narrating".to_string()),
    }
}
