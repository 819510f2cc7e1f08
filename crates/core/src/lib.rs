//! # Palaver Core
//!
//! Domain types, traits, and error definitions for the Palaver conversation
//! session manager. This crate has **no I/O**; it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here. Implementations
//! live in their respective crates:
//! - [`Provider`] — the remote completion endpoint (`palaver-providers`)
//! - [`TokenCounter`] — model-aware token counting (`palaver-session`)
//!
//! The [`Transcript`] is the one stateful type: an ordered, role-tagged
//! message list whose first entry is always the single system message.

pub mod error;
pub mod message;
pub mod provider;
pub mod token;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, TranscriptError};
pub use message::{Message, Role, Transcript};
pub use provider::{Provider, ProviderRequest, ProviderResponse, SamplingParams, Usage};
pub use token::TokenCounter;
