//! Tone-adjusted audiobook generation
//!
//! This crate rewrites text in a narrative tone using an instruction-tuned
//! language model and narrates the result through a speech service. Both
//! services are consumed through the [`LanguageModel`] and
//! [`SpeechSynthesizer`] traits.
//!
//! # Architecture
//!
//! - **Domain layer**: text metrics, spans, tones, voices and the capability traits
//! - **Application layer**: chunking, tier classification, orchestration,
//!   rewriting, the speed guard and narration
//! - **API layer**: input decoding, configuration, session history and the
//!   [`AudiobookStudio`] facade
//!
//! # Example
//!
//! ```rust
//! use echoverse_core::{analyze, DocumentChunker, ProcessingPreferences, StrategyClassifier};
//!
//! let text = "The old house stood silent. Nobody had lived there for years.";
//! let metrics = analyze(text);
//! assert_eq!(metrics.sentence_count, 2);
//!
//! let decision = StrategyClassifier::new().classify(text, ProcessingPreferences::default());
//! assert_eq!(decision.strategy.name(), "express");
//!
//! let plan = DocumentChunker::default().chunk(text);
//! assert_eq!(plan.len(), 1);
//! ```

pub mod api;
pub mod application;
pub mod domain;

pub use api::{
    Audiobook, AudiobookRequest, AudiobookStudio, Config, ConfigBuilder, Error as ApiError, Input,
    InputError, NarrationRecord, SessionHistory,
};
pub use application::{
    AdaptiveProcessor, ChunkOrchestrator, DocumentChunker, NarrationError, NarrationSynthesizer,
    ProcessingDecision, ProcessingError, ProcessingPreferences, ProcessingReport,
    ProcessingStrategy, ProcessorConfig, ProgressEvent, ReprobePolicy, RewriteOptions, Rewriter,
    SmartProcessor, SpeedGuard, SpeedVerdict, StrategyClassifier, ToneRewriter,
};
pub use domain::*;
