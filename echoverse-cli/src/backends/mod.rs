//! HTTP implementations of the model and speech capabilities

pub mod google_tts;
pub mod ollama;

pub use google_tts::GoogleTts;
pub use ollama::OllamaModel;

use reqwest::blocking::Client;
use std::time::Duration;

pub(crate) fn build_http_client(
    connect_timeout: Duration,
    timeout: Duration,
) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("echoverse/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(connect_timeout)
        .timeout(timeout)
        .build()
}
