//! TokenCounter trait — the abstraction over model tokenizers.
//!
//! Token counts drive budget enforcement. They are an approximation, so an
//! implementation must always produce *some* count: when no exact tokenizer
//! is known for a model it falls back to a default encoding instead of
//! failing.

/// Counts tokens in a piece of text for a given model.
///
/// Implementations must be deterministic: the same `(model, text)` pair
/// always yields the same count.
pub trait TokenCounter: Send + Sync {
    /// A human-readable name for this counter (e.g., "tiktoken", "heuristic").
    fn name(&self) -> &str;

    /// Count the tokens `text` occupies under `model`'s encoding.
    fn count(&self, model: &str, text: &str) -> usize;
}
