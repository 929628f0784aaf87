//! Domain layer: text metrics, spans, tones, voices and external capabilities
//!
//! Nothing in this layer performs I/O or spawns threads.

pub mod analysis;
pub mod capabilities;
pub mod span;
pub mod tone;
pub mod voice;

pub use analysis::{analyze, StructureMetrics};
pub use capabilities::{GenerationRequest, LanguageModel, ModelError, SpeechSynthesizer, SynthesisError};
pub use span::{recombine, ChunkPlan, ChunkRoute, SpanKind, TextSpan, PARAGRAPH_BREAK};
pub use tone::{ensure_terminal, lexical_transform, quick_transform, Tone, UnknownTone};
pub use voice::{default_voice, find_voice, voices, SpeedClass, VoiceProfile, DEFAULT_VOICE};
