//! OpenAI client configuration with sensible defaults.

use crate::error::{CorteError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client for the given key with the default timeout.
pub fn create_client(api_key: &str) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom timeout.
///
/// Uploads of long audio tracks can take minutes, so the timeout applies per
/// request rather than per stage.
pub fn create_client_with_timeout(api_key: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    if api_key.trim().is_empty() {
        return Err(CorteError::Config(
            "OpenAI API key is empty. Pass --api-key or set OPENAI_API_KEY".to_string(),
        ));
    }

    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CorteError::Config(format!("Failed to create HTTP client: {e}")))?;

    let config = OpenAIConfig::new().with_api_key(api_key);
    Ok(Client::with_config(config).with_http_client(http_client))
}
