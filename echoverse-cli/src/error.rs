//! Error handling for the CLI application

use std::fmt;

/// Custom error type for CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// File not found or inaccessible
    FileNotFound(String),
    /// Invalid file pattern
    InvalidPattern(String),
    /// Configuration error
    ConfigError(String),
    /// A backend service could not be reached
    BackendUnavailable(String),
    /// The model host ran out of memory or disk; the run stops
    ResourceExhausted(String),
    /// Audiobook creation failed
    ProcessingError(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::FileNotFound(path) => write!(f, "File not found: {path}"),
            CliError::InvalidPattern(pattern) => write!(f, "Invalid file pattern: {pattern}"),
            CliError::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
            CliError::BackendUnavailable(msg) => write!(f, "Backend unavailable: {msg}"),
            CliError::ResourceExhausted(msg) => write!(
                f,
                "Insufficient resources for the language model: {msg}\n\
                 Free up memory or disk space, or set a smaller [model] name in the config, then run again"
            ),
            CliError::ProcessingError(msg) => write!(f, "Processing error: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_error_display() {
        let error = CliError::FileNotFound("story.txt".to_string());
        assert_eq!(error.to_string(), "File not found: story.txt");
    }

    #[test]
    fn test_config_error_display() {
        let error = CliError::ConfigError("quality must be between 0 and 1".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: quality must be between 0 and 1"
        );
    }

    #[test]
    fn test_backend_unavailable_display() {
        let error = CliError::BackendUnavailable("http://localhost:11434".to_string());
        assert!(error.to_string().starts_with("Backend unavailable:"));
    }

    #[test]
    fn test_resource_exhausted_display_has_remedy() {
        let error = CliError::ResourceExhausted("model requires 5.1 GiB".to_string());
        let message = error.to_string();
        assert!(message.starts_with("Insufficient resources for the language model: model requires 5.1 GiB"));
        assert!(message.contains("Free up memory or disk space"));
    }

    #[test]
    fn test_error_converts_into_anyhow() {
        let failure: CliResult<()> = Err(CliError::InvalidPattern("[bad".to_string()).into());
        let err = failure.unwrap_err();
        assert_eq!(err.to_string(), "Invalid file pattern: [bad");
        assert!(err.downcast_ref::<CliError>().is_some());
    }

    #[test]
    fn test_error_with_unicode_path() {
        let error = CliError::FileNotFound("物語/第一章.txt".to_string());
        assert_eq!(error.to_string(), "File not found: 物語/第一章.txt");
    }
}
