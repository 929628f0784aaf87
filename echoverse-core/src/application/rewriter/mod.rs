//! Tone rewriting through a language model
//!
//! [`ToneRewriter`] builds the tone prompt, calls the model with a token
//! budget scaled to the input, extracts the answer and caches it. Model
//! failures never escape [`Rewriter::rewrite`]: the caller gets the original
//! text back.

mod cache;
mod extract;

pub use cache::{CacheKey, ResultCache};
pub use extract::extract_rewrite;

use crate::domain::capabilities::{GenerationRequest, LanguageModel, ModelError};
use crate::domain::tone::{ensure_terminal, quick_transform, Tone};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Extracted output shorter than this is treated as a failed generation.
const MIN_USEFUL_OUTPUT_CHARS: usize = 10;

const FAST_PROMPT_TOKENS: usize = 512;
const FULL_PROMPT_TOKENS: usize = 1024;

const FAST_TEMPERATURE: f32 = 0.3;
const FULL_TEMPERATURE: f32 = 0.7;

/// Errors from a rewrite attempt
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Rewrite failed: {0}")]
    Model(#[from] ModelError),

    #[error("Rewrite failed: {0}")]
    Other(String),
}

/// Per-call rewrite settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewriteOptions {
    /// Smaller budgets and prompt limits
    pub ultra_fast: bool,
    /// Tier-suggested token budget; raises the scaled budget, never lowers it
    pub max_tokens_hint: Option<usize>,
    /// Overrides the default temperature for the mode
    pub temperature: Option<f32>,
}

impl RewriteOptions {
    pub fn fast() -> Self {
        Self {
            ultra_fast: true,
            max_tokens_hint: None,
            temperature: None,
        }
    }

    pub fn full() -> Self {
        Self {
            ultra_fast: false,
            ..Self::fast()
        }
    }

    pub fn with_hint(mut self, max_tokens: usize, temperature: f32) -> Self {
        self.max_tokens_hint = Some(max_tokens);
        self.temperature = Some(temperature);
        self
    }
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self::fast()
    }
}

/// Capability to rewrite a piece of text in a tone
pub trait Rewriter: Send + Sync {
    fn rewrite(&self, text: &str, tone: Tone, options: &RewriteOptions) -> Result<String, RewriteError>;

    /// Rewrite `text` only; `context` (the text with its neighbours' words)
    /// may guide continuity but is never part of the output
    fn rewrite_in_context(
        &self,
        text: &str,
        context: Option<&str>,
        tone: Tone,
        options: &RewriteOptions,
    ) -> Result<String, RewriteError> {
        let _ = context;
        self.rewrite(text, tone, options)
    }
}

/// Build the prompt for rewriting `text` in `tone`
pub fn build_prompt(text: &str, tone: Tone) -> String {
    format!(
        "{}:\n\nText: {}\n\n{}",
        tone.instruction(),
        text.trim(),
        tone.marker()
    )
}

/// Prompt that shows the surrounding passage but asks for `text` alone
pub fn build_context_prompt(text: &str, context: &str, tone: Tone) -> String {
    format!(
        "{}. Rewrite only the Text; the Context is for continuity and must not be repeated:\n\nContext: {}\n\nText: {}\n\n{}",
        tone.instruction(),
        context.trim(),
        text.trim(),
        tone.marker()
    )
}

/// Token budget scaled to the input's word count, with per-bucket floors
pub fn token_budget(text: &str, ultra_fast: bool) -> usize {
    let words = text.split_whitespace().count();
    let (factor, floor) = match (ultra_fast, words) {
        (true, 0..=19) => (2, 40),
        (true, 20..=59) => (2, 100),
        (true, 60..=149) => (2, 200),
        (true, _) => (2, 300),
        (false, 0..=19) => (3, 60),
        (false, 20..=59) => (3, 150),
        (false, 60..=149) => (3, 300),
        (false, _) => (3, 400),
    };
    (words * factor).max(floor)
}

/// Model-backed rewriter with a bounded results cache
pub struct ToneRewriter {
    model: Arc<dyn LanguageModel>,
    cache: Mutex<ResultCache>,
    /// Detail of the last resource-exhaustion failure not yet collected
    resource_fault: Mutex<Option<String>>,
}

impl std::fmt::Debug for ToneRewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToneRewriter")
            .field("model", &self.model.name())
            .field("cached", &self.cached_entries())
            .finish()
    }
}

impl ToneRewriter {
    pub fn new(model: Arc<dyn LanguageModel>, cache_capacity: usize) -> Self {
        Self {
            model,
            cache: Mutex::new(ResultCache::new(cache_capacity)),
            resource_fault: Mutex::new(None),
        }
    }

    /// Take the detail of a resource-exhaustion failure seen since the last call.
    ///
    /// [`Rewriter::rewrite`] hides model failures behind the original text;
    /// this is how callers learn that the host ran out of memory or disk.
    pub fn take_resource_fault(&self) -> Option<String> {
        self.lock_fault().take()
    }

    /// Rewrite through the cache, surfacing model failures
    pub fn try_rewrite(
        &self,
        text: &str,
        tone: Tone,
        options: &RewriteOptions,
    ) -> Result<String, RewriteError> {
        self.try_rewrite_in_context(text, None, tone, options)
    }

    /// [`ToneRewriter::try_rewrite`] with optional neighbour context in the prompt
    pub fn try_rewrite_in_context(
        &self,
        text: &str,
        context: Option<&str>,
        tone: Tone,
        options: &RewriteOptions,
    ) -> Result<String, RewriteError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let key = CacheKey::with_context(text, context, tone, options.ultra_fast);
        if let Some(hit) = self.lock_cache().get(&key) {
            log::debug!("Rewrite cache hit ({} chars, {})", text.len(), tone);
            return Ok(hit.to_string());
        }

        let rewritten = self.generate(text, context, tone, options)?;
        self.lock_cache().insert(key, rewritten.clone());
        Ok(rewritten)
    }

    /// One model call, bypassing the cache
    pub fn rewrite_uncached(
        &self,
        text: &str,
        tone: Tone,
        options: &RewriteOptions,
    ) -> Result<String, RewriteError> {
        self.generate(text, None, tone, options)
    }

    fn generate(
        &self,
        text: &str,
        context: Option<&str>,
        tone: Tone,
        options: &RewriteOptions,
    ) -> Result<String, RewriteError> {
        let prompt = match context {
            Some(context) => build_context_prompt(text, context, tone),
            None => build_prompt(text, tone),
        };
        let budget = token_budget(text, options.ultra_fast)
            .max(options.max_tokens_hint.unwrap_or(0));
        let temperature = options.temperature.unwrap_or(if options.ultra_fast {
            FAST_TEMPERATURE
        } else {
            FULL_TEMPERATURE
        });

        let request = GenerationRequest {
            prompt,
            max_new_tokens: budget,
            temperature,
            sampling: temperature > 0.0,
            max_prompt_tokens: if options.ultra_fast {
                FAST_PROMPT_TOKENS
            } else {
                FULL_PROMPT_TOKENS
            },
        };

        let raw = self.model.generate(&request).map_err(|e| {
            if let ModelError::ResourceExhausted(detail) = &e {
                *self.lock_fault() = Some(detail.clone());
            }
            e
        })?;
        let extracted = extract_rewrite(&raw, &request.prompt, tone);

        if extracted.chars().count() < MIN_USEFUL_OUTPUT_CHARS {
            log::debug!(
                "Model output too short ({} chars), using quick transform",
                extracted.chars().count()
            );
            return Ok(quick_transform(text, tone));
        }

        Ok(ensure_terminal(&extracted, tone))
    }

    /// Drop every cached result
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.lock_cache().len()
    }

    fn lock_cache(&self) -> MutexGuard<'_, ResultCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_fault(&self) -> MutexGuard<'_, Option<String>> {
        self.resource_fault.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Rewriter for ToneRewriter {
    fn rewrite(&self, text: &str, tone: Tone, options: &RewriteOptions) -> Result<String, RewriteError> {
        self.rewrite_in_context(text, None, tone, options)
    }

    fn rewrite_in_context(
        &self,
        text: &str,
        context: Option<&str>,
        tone: Tone,
        options: &RewriteOptions,
    ) -> Result<String, RewriteError> {
        match self.try_rewrite_in_context(text, context, tone, options) {
            Ok(rewritten) => Ok(rewritten),
            Err(e) => {
                log::warn!("Rewrite failed, keeping original text: {e}");
                Ok(text.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        reply: Result<String, String>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("boom".to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl LanguageModel for Scripted {
        fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(reply) => Ok(format!("{}{}", request.prompt, reply)),
                Err(e) => Err(ModelError::Generation(e.clone())),
            }
        }
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = build_prompt(" The door creaked. ", Tone::Suspenseful);
        assert!(prompt.starts_with("Rewrite the following text to make it more suspenseful"));
        assert!(prompt.contains("Text: The door creaked.\n\n"));
        assert!(prompt.ends_with("Suspenseful version:"));
    }

    #[test]
    fn test_context_prompt_asks_for_text_only() {
        let prompt = build_context_prompt("the middle.", "...before the middle. after...", Tone::Neutral);
        assert!(prompt.contains("Context: ...before the middle. after...\n\n"));
        assert!(prompt.contains("Text: the middle.\n\n"));
        assert!(prompt.ends_with("Neutral version:"));
    }

    #[test]
    fn test_context_changes_cache_key_not_output_scope() {
        let model = Scripted::ok(" A calm rewrite of the middle part.");
        let rewriter = ToneRewriter::new(model.clone(), 50);
        let options = RewriteOptions::fast();

        let plain = rewriter.rewrite("The middle part.", Tone::Neutral, &options).unwrap();
        let framed = rewriter
            .rewrite_in_context("The middle part.", Some("...end of one. The middle part. Start of..."), Tone::Neutral, &options)
            .unwrap();

        assert_eq!(plain, framed);
        assert!(!framed.contains("end of one"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert_eq!(rewriter.cached_entries(), 2);
    }

    #[test]
    fn test_token_budget_floors() {
        assert_eq!(token_budget("a few words", true), 40);
        assert_eq!(token_budget("a few words", false), 60);
        assert_eq!(token_budget(&"w ".repeat(100), true), 200);
        assert_eq!(token_budget(&"w ".repeat(200), true), 400);
        assert_eq!(token_budget(&"w ".repeat(200), false), 600);
    }

    #[test]
    fn test_rewrite_extracts_and_punctuates() {
        let model = Scripted::ok(" The door creaked open slowly");
        let rewriter = ToneRewriter::new(model, 50);
        let out = rewriter
            .rewrite("The door opened.", Tone::Suspenseful, &RewriteOptions::fast())
            .unwrap();
        assert_eq!(out, "The door creaked open slowly...");
    }

    #[test]
    fn test_cache_hit_skips_model() {
        let model = Scripted::ok(" We can do anything we set our minds to!");
        let rewriter = ToneRewriter::new(model.clone(), 50);
        let options = RewriteOptions::fast();

        let first = rewriter.rewrite("We can try.", Tone::Inspiring, &options).unwrap();
        let second = rewriter.rewrite("We can try.", Tone::Inspiring, &options).unwrap();

        assert_eq!(first, second);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(rewriter.cached_entries(), 1);

        rewriter.clear_cache();
        rewriter.rewrite("We can try.", Tone::Inspiring, &options).unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_speed_flag_is_part_of_cache_key() {
        let model = Scripted::ok(" A calm and measured sentence.");
        let rewriter = ToneRewriter::new(model.clone(), 50);
        rewriter.rewrite("Text.", Tone::Neutral, &RewriteOptions::fast()).unwrap();
        rewriter.rewrite("Text.", Tone::Neutral, &RewriteOptions::full()).unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_short_output_falls_back_to_quick_transform() {
        let model = Scripted::ok(" Ok");
        let rewriter = ToneRewriter::new(model, 50);
        let out = rewriter
            .rewrite("We did it.", Tone::Inspiring, &RewriteOptions::fast())
            .unwrap();
        assert_eq!(out, "We did it!");
    }

    #[test]
    fn test_model_failure_returns_original() {
        let model = Scripted::failing();
        let rewriter = ToneRewriter::new(model.clone(), 50);
        let options = RewriteOptions::fast();

        let out = rewriter.rewrite("Keep this.", Tone::Neutral, &options).unwrap();
        assert_eq!(out, "Keep this.");
        assert!(rewriter.try_rewrite("Keep this.", Tone::Neutral, &options).is_err());
        // failures are not cached
        assert_eq!(rewriter.cached_entries(), 0);
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_text_skips_model() {
        let model = Scripted::ok(" anything at all here");
        let rewriter = ToneRewriter::new(model.clone(), 50);
        assert_eq!(rewriter.rewrite("  ", Tone::Neutral, &RewriteOptions::fast()).unwrap(), "");
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_hint_raises_budget() {
        struct Budget(AtomicUsize);
        impl LanguageModel for Budget {
            fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
                self.0.store(request.max_new_tokens, Ordering::SeqCst);
                Ok("Neutral version: A sufficiently long reply.".into())
            }
        }

        let model = Arc::new(Budget(AtomicUsize::new(0)));
        let rewriter = ToneRewriter::new(model.clone(), 50);
        let options = RewriteOptions::fast().with_hint(120, 0.2);
        rewriter.rewrite("short", Tone::Neutral, &options).unwrap();
        assert_eq!(model.0.load(Ordering::SeqCst), 120);
    }
}
