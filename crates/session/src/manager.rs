//! The session orchestrator.
//!
//! `SessionManager` owns one transcript and one session configuration and
//! exposes the single conversational operation: submit a prompt, get a
//! reply. Flow per submission:
//!
//! 1. Append the prompt as a user message, enforce the budget.
//! 2. If relevance gating rejects the prompt, append the refusal and return
//!    it without calling the provider.
//! 3. Send the whole transcript with the sampling parameters to the
//!    provider, bounded by the request timeout.
//! 4. On success append the reply and enforce the budget again; on failure
//!    return the provider error and leave only the user message behind.

use std::sync::Arc;
use std::time::Duration;

use palaver_config::{
    AppConfig, SessionConfig, validate_model, validate_positive, validate_unit_interval,
};
use palaver_core::error::ProviderError;
use palaver_core::message::{Message, Transcript};
use palaver_core::provider::{Provider, ProviderRequest};
use palaver_core::token::TokenCounter;
use tracing::{debug, info, warn};

use crate::budget::{BudgetReport, enforce_budget};
use crate::error::SessionError;
use crate::relevance::RelevanceClassifier;
use crate::token::TiktokenCounter;

/// Upper bound on one provider call unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// What a successful `submit` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The provider's reply, now the last assistant message.
    Reply(String),
    /// The prompt was off-topic; this is the recorded refusal text.
    Refused(String),
}

impl SubmitOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Reply(text) | Self::Refused(text) => text,
        }
    }

    pub fn is_refused(&self) -> bool {
        matches!(self, Self::Refused(_))
    }
}

/// One conversation: transcript, configuration and collaborators.
///
/// Mutating operations take `&mut self`, so a session has exactly one
/// writer at a time. Independent sessions share nothing but the provider
/// and counter handles.
pub struct SessionManager {
    id: String,
    provider: Arc<dyn Provider>,
    counter: Arc<dyn TokenCounter>,
    config: SessionConfig,
    transcript: Transcript,
    relevance: Option<RelevanceClassifier>,
    refusal_message: String,
    request_timeout: Duration,
    last_budget: Option<BudgetReport>,
}

impl SessionManager {
    /// Create a session with relevance gating off.
    pub fn new(
        provider: Arc<dyn Provider>,
        counter: Arc<dyn TokenCounter>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let transcript = Transcript::new(config.system_prompt.clone());
        let mut session = Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider,
            counter,
            config,
            transcript,
            relevance: None,
            refusal_message: palaver_config::DEFAULT_REFUSAL_MESSAGE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            last_budget: None,
        };
        session.enforce();

        info!(
            session = %session.id,
            provider = session.provider.name(),
            model = %session.config.model,
            "Session started"
        );
        Ok(session)
    }

    /// Create a session from the loaded application config, counting tokens
    /// with tiktoken. The whole config is validated first.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>) -> Result<Self, SessionError> {
        config.validate()?;
        let counter: Arc<dyn TokenCounter> = Arc::new(TiktokenCounter::new());
        let mut session = Self::new(provider, counter, config.session.clone())?
            .with_refusal_message(config.relevance.refusal_message.clone())
            .with_request_timeout(Duration::from_secs(config.provider.request_timeout_secs));

        if let Some(classifier) = RelevanceClassifier::from_config(&config.relevance)? {
            session = session.with_relevance(classifier);
        }
        Ok(session)
    }

    /// Gate prompts through `classifier` before they reach the provider.
    pub fn with_relevance(mut self, classifier: RelevanceClassifier) -> Self {
        self.relevance = Some(classifier);
        self
    }

    pub fn with_refusal_message(mut self, message: impl Into<String>) -> Self {
        self.refusal_message = message.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    // --- Conversation ---

    /// Submit a prompt and wait for the reply.
    ///
    /// On `Err(SessionError::Provider(_))` the prompt remains in the
    /// transcript and no assistant message was added, so the caller may
    /// retry. Dropping the returned future mid-call has the same effect.
    pub async fn submit(&mut self, prompt: &str) -> Result<SubmitOutcome, SessionError> {
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }

        self.transcript.append(Message::user(prompt))?;
        self.enforce();

        let allowed = self
            .relevance
            .as_ref()
            .map_or(true, |classifier| classifier.is_allowed(prompt));
        if !allowed {
            info!(session = %self.id, "Prompt rejected by relevance filter");
            let refusal = self.refusal_message.clone();
            self.transcript.append(Message::assistant(refusal.clone()))?;
            self.enforce();
            return Ok(SubmitOutcome::Refused(refusal));
        }

        let request = ProviderRequest {
            messages: self.transcript.messages().to_vec(),
            sampling: self.config.sampling(),
        };

        debug!(
            session = %self.id,
            model = %request.sampling.model,
            messages = request.messages.len(),
            "Requesting completion"
        );

        let reply = match self.complete(request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Provider call failed");
                return Err(SessionError::Provider(e));
            }
        };

        self.transcript.append(Message::assistant(reply.clone()))?;
        self.enforce();
        Ok(SubmitOutcome::Reply(reply))
    }

    /// Submit text extracted from a document. Treated exactly like a typed prompt.
    pub async fn submit_document(&mut self, text: &str) -> Result<SubmitOutcome, SessionError> {
        debug!(session = %self.id, bytes = text.len(), "Submitting document text");
        self.submit(text).await
    }

    async fn complete(&self, request: ProviderRequest) -> Result<String, ProviderError> {
        let response = tokio::time::timeout(self.request_timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "no reply within {}s",
                    self.request_timeout.as_secs_f32()
                ))
            })??;

        let content = response.message.content;
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content)
    }

    fn enforce(&mut self) -> BudgetReport {
        let report = enforce_budget(
            &mut self.transcript,
            self.counter.as_ref(),
            &self.config.model,
            self.config.token_budget,
        );
        self.last_budget = Some(report);
        report
    }

    // --- Accessors ---

    pub fn session_id(&self) -> &str {
        &self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// User and assistant messages, oldest first.
    pub fn history(&self) -> &[Message] {
        self.transcript.history()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn relevance(&self) -> Option<&RelevanceClassifier> {
        self.relevance.as_ref()
    }

    /// Current transcript cost under the configured model.
    pub fn total_tokens(&self) -> usize {
        self.transcript
            .total_tokens(self.counter.as_ref(), &self.config.model)
    }

    /// Report from the most recent budget pass.
    pub fn last_budget(&self) -> Option<&BudgetReport> {
        self.last_budget.as_ref()
    }

    // --- Configuration ---

    pub fn set_model(&mut self, model: impl Into<String>) -> Result<(), SessionError> {
        let model = model.into();
        validate_model(&model)?;
        debug!(session = %self.id, model = %model, "Model changed");
        self.config.model = model;
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<(), SessionError> {
        validate_unit_interval("temperature", temperature)?;
        self.config.temperature = temperature;
        Ok(())
    }

    pub fn set_top_p(&mut self, top_p: f64) -> Result<(), SessionError> {
        validate_unit_interval("top_p", top_p)?;
        self.config.top_p = top_p;
        Ok(())
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<(), SessionError> {
        validate_positive("max_tokens", u64::from(max_tokens))?;
        self.config.max_tokens = max_tokens;
        Ok(())
    }

    /// Change the budget. It takes effect at the next append.
    pub fn set_token_budget(&mut self, token_budget: usize) -> Result<(), SessionError> {
        validate_positive("token_budget", token_budget as u64)?;
        self.config.token_budget = token_budget;
        Ok(())
    }

    /// Replace the system prompt. Always discards the history.
    pub fn update_system_prompt(&mut self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        info!(session = %self.id, "System prompt updated, history cleared");
        self.config.system_prompt = prompt.clone();
        self.transcript.reset(Some(prompt));
        self.enforce();
    }

    /// Clear the history, keeping the current system prompt.
    pub fn reset(&mut self) {
        info!(session = %self.id, "Session reset");
        self.transcript.reset(None);
        self.enforce();
    }

    /// Replace the whole configuration at once.
    ///
    /// The history is kept unless the system prompt changed.
    pub fn apply_config(&mut self, config: SessionConfig) -> Result<(), SessionError> {
        config.validate()?;
        let prompt_changed = config.system_prompt != self.config.system_prompt;
        self.config = config;
        if prompt_changed {
            self.transcript.reset(Some(self.config.system_prompt.clone()));
            self.enforce();
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("id", &self.id)
            .field("provider", &self.provider.name())
            .field("counter", &self.counter.name())
            .field("config", &self.config)
            .field("messages", &self.transcript.len())
            .field("relevance", &self.relevance.is_some())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
