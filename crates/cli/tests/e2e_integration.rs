//! End-to-end integration tests for Palaver sessions.
//!
//! These tests drive `SessionManager` the way the CLI does: config loaded
//! from TOML, a provider behind the `Provider` trait, prompts submitted in
//! sequence, and the transcript inspected afterwards.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use palaver_config::{AppConfig, SessionConfig};
use palaver_core::error::ProviderError;
use palaver_core::message::{Message, Role};
use palaver_core::provider::{Provider, ProviderRequest, ProviderResponse};
use palaver_core::token::TokenCounter;
use palaver_session::{
    RelevanceClassifier, SessionError, SessionManager, SubmitOutcome, TiktokenCounter,
};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted replies in sequence and keeps the
/// requests it was sent.
struct ScriptedProvider {
    replies: Mutex<Vec<String>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.sampling.model.clone();
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop()
            .expect("ScriptedProvider exhausted");
        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: None,
            model,
        })
    }
}

/// A provider that never answers.
struct StalledProvider;

#[async_trait::async_trait]
impl Provider for StalledProvider {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
        Err(ProviderError::Network("unreachable".into()))
    }
}

/// One token per whitespace-separated word, so costs are exact.
struct WordCounter;

impl TokenCounter for WordCounter {
    fn name(&self) -> &str {
        "words"
    }

    fn count(&self, _model: &str, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

fn words(n: usize, tag: &str) -> String {
    vec![tag; n].join(" ")
}

fn session(provider: Arc<dyn Provider>, budget: usize) -> SessionManager {
    let config = SessionConfig {
        token_budget: budget,
        system_prompt: words(10, "sys"),
        ..SessionConfig::default()
    };
    SessionManager::new(provider, Arc::new(WordCounter), config).unwrap()
}

fn tags(session: &SessionManager) -> Vec<String> {
    session
        .history()
        .iter()
        .map(|m| m.content.split_whitespace().next().unwrap_or_default().to_string())
        .collect()
}

// ── Scenario 1: oldest pair evicted ──────────────────────────────────────

#[tokio::test]
async fn e2e_budget_evicts_oldest_pair() {
    let a1 = words(10, "a1");
    let a2 = words(10, "a2");
    let a3 = words(10, "a3");
    let provider = Arc::new(ScriptedProvider::new(&[a1.as_str(), a2.as_str(), a3.as_str()]));
    let mut session = session(provider.clone(), 50);

    session.submit(&words(10, "u1")).await.unwrap();
    session.submit(&words(10, "u2")).await.unwrap();
    assert_eq!(tags(&session), vec!["u1", "a1", "u2", "a2"]);
    assert_eq!(session.total_tokens(), 50);

    session.submit(&words(10, "u3")).await.unwrap();
    assert_eq!(tags(&session), vec!["u2", "a2", "u3", "a3"]);
    assert!(session.total_tokens() <= 50);
    assert_eq!(session.transcript().messages()[0].role, Role::System);

    // The provider saw the third prompt after the oldest user turn was dropped.
    let third = &provider.requests()[2];
    assert_eq!(third.messages.len(), 5);
    assert!(third.messages[1].content.starts_with("a1"));
}

// ── Scenario 2: relevance gating ─────────────────────────────────────────

#[tokio::test]
async fn e2e_relevance_gate_from_config() {
    let toml_str = r#"
[relevance]
enabled = true
refusal_message = "I can only help with career questions."

[relevance.keywords]
english = ["resume"]
"#;
    let config: AppConfig = toml::from_str(toml_str).unwrap();
    config.validate().unwrap();

    let classifier = RelevanceClassifier::from_config(&config.relevance)
        .unwrap()
        .unwrap();
    assert!(classifier.is_allowed("Can you review my resume?"));
    assert!(!classifier.is_allowed("What's the weather today?"));

    let provider = Arc::new(ScriptedProvider::new(&["Happy to help with that."]));
    let mut session = SessionManager::from_config(&config, provider.clone()).unwrap();

    let refused = session.submit("What's the weather today?").await.unwrap();
    assert_eq!(
        refused,
        SubmitOutcome::Refused("I can only help with career questions.".into())
    );
    assert_eq!(provider.calls(), 0);

    let reply = session.submit("Can you review my resume?").await.unwrap();
    assert_eq!(reply, SubmitOutcome::Reply("Happy to help with that.".into()));
    assert_eq!(provider.calls(), 1);
}

// ── Scenario 3: provider timeout ─────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn e2e_timeout_is_a_provider_failure() {
    let mut session =
        session(Arc::new(StalledProvider), 4096).with_request_timeout(Duration::from_secs(30));

    let err = session.submit("Are you there?").await.unwrap_err();
    assert!(err.is_provider_failure());
    assert!(matches!(
        err,
        SessionError::Provider(ProviderError::Timeout(_))
    ));

    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[0].content, "Are you there?");
}

// ── Scenario 4: budget below the system prompt cost ──────────────────────

#[tokio::test]
async fn e2e_budget_smaller_than_system_prompt() {
    let provider = Arc::new(ScriptedProvider::new(&["fine"]));
    let mut session = session(provider, 5);

    let outcome = session.submit("hello there").await.unwrap();
    assert_eq!(outcome.text(), "fine");

    assert_eq!(session.transcript().len(), 1);
    assert_eq!(session.transcript().messages()[0].role, Role::System);
    let report = session.last_budget().unwrap();
    assert!(report.total_tokens > report.budget);
    assert!(report.system_prompt_exceeds_budget());
}

// ── Reconfiguration ──────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_system_prompt_change_discards_history() {
    let provider = Arc::new(ScriptedProvider::new(&["first", "second"]));
    let mut session = session(provider.clone(), 4096);

    session.submit("hello").await.unwrap();
    session.update_system_prompt("You are a concise interview coach.");
    assert_eq!(session.transcript().len(), 1);

    session.submit("hello again").await.unwrap();
    let last = &provider.requests()[1];
    assert_eq!(last.messages.len(), 2);
    assert_eq!(last.messages[0].content, "You are a concise interview coach.");
}

#[tokio::test]
async fn e2e_zero_temperature_reaches_provider() {
    let provider = Arc::new(ScriptedProvider::new(&["deterministic"]));
    let mut session = session(provider.clone(), 4096);
    session.set_temperature(0.0).unwrap();
    session.submit("hi").await.unwrap();

    let request = &provider.requests()[0];
    assert_eq!(request.sampling.temperature, 0.0);
}

#[tokio::test]
async fn e2e_config_file_to_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[session]
model = "gpt-4o-mini"
temperature = 0.0
token_budget = 2048
system_prompt = "You help people prepare for job interviews."
"#,
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    let provider = Arc::new(ScriptedProvider::new(&["Tell me about the role."]));
    let mut session = SessionManager::from_config(&config, provider.clone()).unwrap();

    assert_eq!(session.config().model, "gpt-4o-mini");
    assert_eq!(
        session.transcript().system_prompt(),
        "You help people prepare for job interviews."
    );

    session.submit("I have an interview tomorrow").await.unwrap();
    let expected = TiktokenCounter::new().count(
        "gpt-4o-mini",
        "You help people prepare for job interviews.",
    ) + TiktokenCounter::new().count("gpt-4o-mini", "I have an interview tomorrow")
        + TiktokenCounter::new().count("gpt-4o-mini", "Tell me about the role.");
    assert_eq!(session.total_tokens(), expected);
}
