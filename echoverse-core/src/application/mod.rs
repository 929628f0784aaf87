//! Application layer for tone processing and narration
//!
//! Coordinates the pure domain logic with the external model and speech
//! services. It handles:
//!
//! - Chunking text into spans that fit a single model call
//! - Choosing a processing tier per request
//! - Bounded concurrent rewriting with order-preserving reassembly
//! - Latency probing and the lexical fallback for slow models
//! - Speech synthesis with a single truncated retry
//!
//! # Example
//!
//! ```rust
//! use echoverse_core::application::{DocumentChunker, StrategyClassifier, ProcessingPreferences};
//!
//! let text = "A short line.";
//! let decision = StrategyClassifier::new().classify(text, ProcessingPreferences::default());
//! assert_eq!(decision.chunk_count, 1);
//!
//! let plan = DocumentChunker::default().chunk(text);
//! assert_eq!(plan.len(), 1);
//! ```

pub mod adaptive;
pub mod chunking;
pub mod config;
pub mod narration;
pub mod orchestrator;
pub mod rewriter;
pub mod smart;
pub mod speed_guard;
pub mod strategies;

pub use adaptive::{
    AdaptiveProcessor, PerformanceHistory, PerformanceStats, ProcessingReport, ProgressEvent,
};
pub use chunking::DocumentChunker;
pub use config::{ProcessingError, ProcessingResult, ProcessorConfig, ProcessorConfigBuilder};
pub use narration::{Narration, NarrationError, NarrationSynthesizer};
pub use orchestrator::{ChunkOrchestrator, ChunkOutcome, ChunkProgress, ExecutionMode, OrchestrationOutput};
pub use rewriter::{RewriteError, RewriteOptions, Rewriter, ToneRewriter};
pub use smart::SmartProcessor;
pub use speed_guard::{ReprobePolicy, SpeedGuard, SpeedVerdict};
pub use strategies::{
    ProcessingDecision, ProcessingPreferences, ProcessingStrategy, StrategyAlternative,
    StrategyClassifier, StrategyRecommendation,
};
