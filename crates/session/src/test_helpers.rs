//! Shared test doubles for session tests.

use palaver_core::error::ProviderError;
use palaver_core::message::Message;
use palaver_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use palaver_core::token::TokenCounter;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock provider that returns scripted outcomes in sequence and records
/// every request it receives.
///
/// Panics if more calls are made than outcomes provided.
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(outcomes: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers with each reply in turn.
    pub fn replies(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.sampling.model.clone();
        self.requests.lock().unwrap().push(request);

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider: no more scripted outcomes");

        outcome.map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// A provider whose calls never complete.
pub struct HangingProvider;

#[async_trait::async_trait]
impl Provider for HangingProvider {
    fn name(&self) -> &str {
        "hanging_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        std::future::pending().await
    }
}

/// Counts one token per whitespace-separated word.
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn name(&self) -> &str {
        "words"
    }

    fn count(&self, _model: &str, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// `n` copies of `tag` separated by spaces: exactly `n` words.
pub fn words(n: usize, tag: &str) -> String {
    vec![tag; n].join(" ")
}
