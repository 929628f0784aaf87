//! External capabilities the pipeline depends on
//!
//! The language model and the speech synthesizer are consumed as opaque
//! services. Implementations must be shareable across worker threads.

use thiserror::Error;

/// A single text-generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Upper bound on generated tokens
    pub max_new_tokens: usize,
    pub temperature: f32,
    /// Sample instead of greedy decoding
    pub sampling: bool,
    /// The backend truncates longer prompts to this many tokens
    pub max_prompt_tokens: usize,
}

/// Errors raised by a language model backend
#[derive(Debug, Error)]
pub enum ModelError {
    /// Backend not reachable or model not loaded
    #[error("Language model unavailable: {0}")]
    Unavailable(String),

    /// Not enough memory or disk to load or run the model
    #[error("Insufficient resources for the language model: {0}")]
    ResourceExhausted(String),

    /// The call itself failed
    #[error("Generation failed: {0}")]
    Generation(String),
}

impl ModelError {
    /// Memory or disk ran out; retrying cannot help until the host is fixed
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, ModelError::ResourceExhausted(_))
    }
}

/// Instruction-tuned text generation
pub trait LanguageModel: Send + Sync {
    /// Generate a continuation of `request.prompt`.
    ///
    /// The returned text may echo the prompt; callers extract the answer.
    fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError>;

    /// Backend name for logs
    fn name(&self) -> &str {
        "language-model"
    }
}

/// Errors raised by a speech synthesis backend
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Speech service request failed: {0}")]
    Request(String),

    #[error("Speech service returned invalid audio: {0}")]
    InvalidAudio(String),
}

/// Text-to-speech producing MP3 bytes
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(
        &self,
        text: &str,
        language: &str,
        regional_variant: &str,
        slow: bool,
    ) -> Result<Vec<u8>, SynthesisError>;
}
