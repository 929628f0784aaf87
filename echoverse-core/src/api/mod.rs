//! Public API for echoverse-core
//!
//! [`AudiobookStudio`] ties input handling, tone processing, narration and
//! the session history together behind one call.

mod config;
mod error;
mod history;
mod input;
mod studio;

pub use config::{defaults, Config, ConfigBuilder};
pub use error::{Error, Result};
pub use history::{NarrationRecord, SessionHistory};
pub use input::{decode_bytes, prepare_input, Input, InputError, PreparedInput, MAX_INPUT_CHARS};
pub use studio::{audiobook_filename, Audiobook, AudiobookRequest, AudiobookStudio};
