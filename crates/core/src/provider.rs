//! Provider trait — the abstraction over remote completion endpoints.
//!
//! A Provider knows how to send a rendered transcript to an LLM and get a
//! complete reply back. Every failure mode (transport, auth, rate limiting,
//! malformed or empty bodies, timeouts) is reported as a [`ProviderError`].
//!
//! Implementations: OpenAI-compatible endpoints (Together, OpenAI,
//! OpenRouter, Ollama, vLLM).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// Sampling parameters forwarded with every completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// The model to use (e.g., "meta-llama/Llama-Vision-Free", "gpt-4o")
    pub model: String,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f64,

    /// Nucleus sampling probability mass
    pub top_p: f64,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

/// A completion request: the whole transcript plus sampling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The conversation messages, system entry first
    pub messages: Vec<Message>,

    /// Model and sampling settings
    #[serde(flatten)]
    pub sampling: SamplingParams,
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated assistant message
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The session orchestrator calls `complete()` without knowing which backend
/// is being used.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "together", "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}
