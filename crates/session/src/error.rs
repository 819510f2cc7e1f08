//! Session-level error type.

use palaver_config::ConfigError;
use palaver_core::error::{ProviderError, TranscriptError};

/// Everything `SessionManager` operations can fail with.
///
/// A gated refusal is not an error; it is `SubmitOutcome::Refused`.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The completion provider failed (timeout, transport, auth, rate limit,
    /// malformed or empty reply). The user message stays in the transcript.
    #[error("Provider failure: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid session configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Invalid relevance keywords: {0}")]
    Relevance(#[from] regex::Error),
}

impl SessionError {
    /// Whether this is the provider-failure outcome (safe to retry `submit`).
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}
