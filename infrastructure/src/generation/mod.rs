//! Text generation adapters.
//!
//! [`OfflineTextClient`] is always available. [`HttpTextClient`] talks to an
//! OpenAI-compatible `/chat/completions` endpoint and requires the
//! `http-client` feature.

#[cfg(feature = "http-client")]
mod http;
mod offline;

#[cfg(feature = "http-client")]
pub use http::HttpTextClient;
pub use offline::OfflineTextClient;

use crate::config::{FileGenerationConfig, TextProvider};
use conclave_application::TextGenerationClient;
use std::sync::Arc;
use tracing::warn;

/// Build the configured client, falling back to offline when the HTTP client
/// is unavailable or misconfigured
pub fn build_text_client(config: &FileGenerationConfig) -> Arc<dyn TextGenerationClient> {
    let (provider, issues) = config.parse_provider();
    for issue in &issues {
        warn!("{}", issue);
    }

    match provider {
        TextProvider::Offline => Arc::new(OfflineTextClient::new()),
        TextProvider::Http => http_client(config),
    }
}

#[cfg(feature = "http-client")]
fn http_client(config: &FileGenerationConfig) -> Arc<dyn TextGenerationClient> {
    match HttpTextClient::from_config(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("HTTP text client unavailable ({}), using offline completions", e);
            Arc::new(OfflineTextClient::new())
        }
    }
}

#[cfg(not(feature = "http-client"))]
fn http_client(_config: &FileGenerationConfig) -> Arc<dyn TextGenerationClient> {
    warn!("Built without the http-client feature, using offline completions");
    Arc::new(OfflineTextClient::new())
}
