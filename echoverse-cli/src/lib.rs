//! EchoVerse CLI library
//!
//! This library provides the command-line interface for the EchoVerse
//! audiobook generator: HTTP backends, configuration files, input
//! resolution, progress reporting and output formatting.

pub mod backends;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod progress;

pub use error::{CliError, CliResult};
