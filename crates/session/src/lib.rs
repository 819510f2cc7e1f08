//! Conversation sessions for Palaver.
//!
//! Composes the core domain types into a working session:
//! - [`token`]: tokenizer adapters (tiktoken with a heuristic fallback)
//! - [`relevance`]: keyword-based topic gating
//! - [`budget`]: oldest-first eviction to keep a transcript within budget
//! - [`manager`]: [`SessionManager`], the submit/reset/configure façade

pub mod budget;
pub mod error;
pub mod manager;
pub mod relevance;
pub mod token;

#[cfg(test)]
mod test_helpers;

pub use budget::{BudgetReport, enforce_budget};
pub use error::SessionError;
pub use manager::{DEFAULT_REQUEST_TIMEOUT, SessionManager, SubmitOutcome};
pub use relevance::RelevanceClassifier;
pub use token::{HeuristicCounter, TiktokenCounter};
