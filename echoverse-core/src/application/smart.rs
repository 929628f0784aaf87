//! Smart fallback processing
//!
//! Puts the [`SpeedGuard`] in front of the [`AdaptiveProcessor`]. Once the
//! guard has latched a slow verdict, requests are served by the lexical
//! transform and the model is never contacted again.

use crate::application::adaptive::{AdaptiveProcessor, ProcessingReport, ProgressEvent};
use crate::application::config::ProcessorConfig;
use crate::application::rewriter::{RewriteOptions, ToneRewriter};
use crate::application::speed_guard::{SpeedGuard, SpeedVerdict, PROBE_TEXT};
use crate::application::strategies::{ProcessingPreferences, ProcessingStrategy};
use crate::domain::capabilities::LanguageModel;
use crate::domain::tone::{lexical_transform, Tone};
use std::sync::Arc;
use std::time::Instant;

/// Quality reported for lexical substitution output
const STRING_OPTIMIZED_QUALITY: f64 = 0.4;
/// Seconds a slow model is assumed to need; baseline for the savings figures
const SLOW_MODEL_BASELINE_SECS: f64 = 300.0;

/// Guarded entry point for tone processing
#[derive(Debug)]
pub struct SmartProcessor {
    rewriter: Arc<ToneRewriter>,
    adaptive: AdaptiveProcessor,
    guard: SpeedGuard,
}

impl SmartProcessor {
    pub fn new(model: Arc<dyn LanguageModel>, config: &ProcessorConfig) -> Self {
        let rewriter = Arc::new(ToneRewriter::new(model, config.cache_capacity));
        Self {
            adaptive: AdaptiveProcessor::new(rewriter.clone(), config),
            guard: SpeedGuard::new(config.slow_threshold, config.reprobe),
            rewriter,
        }
    }

    pub fn guard(&self) -> &SpeedGuard {
        &self.guard
    }

    pub fn adaptive(&self) -> &AdaptiveProcessor {
        &self.adaptive
    }

    pub fn rewriter(&self) -> &ToneRewriter {
        &self.rewriter
    }

    /// Clear the latched verdict so the next request probes again
    pub fn rearm(&self) {
        self.guard.rearm();
    }

    /// Pin the verdict without probing
    pub fn force(&self, verdict: SpeedVerdict) {
        self.guard.force(verdict);
    }

    /// Probe if needed and return the verdict for this request
    pub fn verdict(&self) -> SpeedVerdict {
        self.guard.check(|| {
            self.rewriter
                .rewrite_uncached(PROBE_TEXT, Tone::Neutral, &RewriteOptions::fast())
                .map(|_| ())
        })
    }

    pub fn process(
        &self,
        text: &str,
        tone: Tone,
        preferences: ProcessingPreferences,
    ) -> (String, ProcessingReport) {
        self.process_with_events(text, tone, preferences, |_| {})
    }

    pub fn process_with_events<F>(
        &self,
        text: &str,
        tone: Tone,
        preferences: ProcessingPreferences,
        mut on_event: F,
    ) -> (String, ProcessingReport)
    where
        F: FnMut(ProgressEvent),
    {
        let verdict = self.verdict();
        if let Some(detail) = self.rewriter.take_resource_fault() {
            // the probe never really ran; judge speed again once resources are freed
            self.guard.rearm();
            log::error!("Language model is out of resources: {detail}");
            return (text.to_string(), halted(text, detail));
        }

        if verdict.is_slow() {
            log::info!("Model too slow, using string optimization");
            let (output, report) = string_optimized(text, tone);
            on_event(ProgressEvent::Complete {
                text: output.clone(),
            });
            return (output, report);
        }

        let (output, mut report) = self
            .adaptive
            .process_with_events(text, tone, preferences, on_event);
        if let Some(detail) = self.rewriter.take_resource_fault() {
            log::error!("Language model is out of resources: {detail}");
            report.resource_error = Some(detail);
        }
        (output, report)
    }
}

/// Report for a request abandoned because the model host ran out of resources
fn halted(text: &str, detail: String) -> ProcessingReport {
    let length = text.chars().count();
    let strategy = ProcessingStrategy::for_length(length);
    ProcessingReport {
        strategy,
        base_strategy: strategy,
        string_optimized: false,
        text_length: length,
        processing_time: 0.0,
        estimated_time: 0.0,
        time_saved: 0.0,
        efficiency_ratio: 0.0,
        quality_score: 0.0,
        chunk_count: 0,
        chunk_failures: 0,
        error: None,
        resource_error: Some(detail),
    }
}

fn string_optimized(text: &str, tone: Tone) -> (String, ProcessingReport) {
    let started = Instant::now();
    let output = lexical_transform(text, tone);
    let elapsed = started.elapsed().as_secs_f64();
    let length = text.chars().count();

    let report = ProcessingReport {
        strategy: ProcessingStrategy::Micro,
        base_strategy: ProcessingStrategy::for_length(length),
        string_optimized: true,
        text_length: length,
        processing_time: elapsed,
        estimated_time: elapsed,
        time_saved: (SLOW_MODEL_BASELINE_SECS - elapsed).max(0.0),
        efficiency_ratio: SLOW_MODEL_BASELINE_SECS / elapsed.max(0.1),
        quality_score: STRING_OPTIMIZED_QUALITY,
        chunk_count: 1,
        chunk_failures: 0,
        error: None,
        resource_error: None,
    };
    (output, report)
}
