//! Completion provider implementations for Palaver.
//!
//! All providers implement the `palaver_core::Provider` trait.
//! [`build_from_config`] turns the `[provider]` config section into a
//! ready-to-use client.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use palaver_config::ProviderConfig;
use palaver_core::error::ProviderError;
use std::time::Duration;

/// Build the configured provider.
///
/// Remote endpoints need an API key; local ones (localhost, 127.0.0.1)
/// work without one.
pub fn build_from_config(config: &ProviderConfig) -> Result<OpenAiCompatProvider, ProviderError> {
    let api_key = match (&config.api_key, is_local_endpoint(&config.base_url)) {
        (Some(key), _) => key.clone(),
        (None, true) => "local".to_string(),
        (None, false) => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for provider '{}'; set provider.api_key or PALAVER_API_KEY",
                config.name
            )));
        }
    };

    tracing::debug!(
        provider = %config.name,
        base_url = %config.base_url,
        timeout_secs = config.request_timeout_secs,
        "Building provider from config"
    );

    OpenAiCompatProvider::with_timeout(
        config.name.clone(),
        config.base_url.clone(),
        api_key,
        Duration::from_secs(config.request_timeout_secs),
    )
}

fn is_local_endpoint(base_url: &str) -> bool {
    let rest = base_url
        .strip_prefix("http://")
        .or_else(|| base_url.strip_prefix("https://"))
        .unwrap_or(base_url);
    let host = rest.split(['/', ':']).next().unwrap_or_default();
    matches!(host, "localhost" | "127.0.0.1" | "0.0.0.0")
}
