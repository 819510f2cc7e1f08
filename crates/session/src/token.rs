//! Token counting for budget enforcement.
//!
//! [`TiktokenCounter`] resolves a BPE encoding per model identifier and
//! falls back to `cl100k_base` for models tiktoken does not know (hosted
//! open-weight models such as `meta-llama/*`). [`HeuristicCounter`] is the
//! last resort when no encoding can be loaded at all.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use palaver_core::token::TokenCounter;
use tiktoken_rs::CoreBPE;
use tiktoken_rs::tokenizer::{Tokenizer, get_tokenizer};
use tracing::{debug, warn};

/// Estimate tokens from byte length.
///
/// Heuristic: 1 token ≈ 4 bytes. Rounds up.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicCounter;

impl HeuristicCounter {
    pub fn estimate(text: &str) -> usize {
        text.len().div_ceil(4)
    }
}

impl TokenCounter for HeuristicCounter {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn count(&self, _model: &str, text: &str) -> usize {
        Self::estimate(text)
    }
}

/// BPE token counter backed by `tiktoken-rs`.
///
/// Model identifiers resolve to an encoding; models tiktoken does not know
/// resolve to `cl100k_base`. Loaded encodings are cached per encoding, so any
/// number of model ids share a handful of BPE tables. A `None` cache entry
/// means the encoding could not be loaded and the heuristic is used.
#[derive(Default)]
pub struct TiktokenCounter {
    encodings: Mutex<HashMap<Tokenizer, Option<Arc<CoreBPE>>>>,
}

impl TiktokenCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn tokenizer_for(model: &str) -> Tokenizer {
        get_tokenizer(model).unwrap_or_else(|| {
            debug!(model, "No tokenizer mapping for model, using cl100k_base");
            Tokenizer::Cl100kBase
        })
    }

    fn encoding_for(&self, model: &str) -> Option<Arc<CoreBPE>> {
        let tokenizer = Self::tokenizer_for(model);
        let mut cache = self
            .encodings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        cache
            .entry(tokenizer)
            .or_insert_with(|| match tiktoken_rs::get_bpe_from_tokenizer(tokenizer) {
                Ok(bpe) => Some(Arc::new(bpe)),
                Err(e) => {
                    warn!(model, ?tokenizer, error = %e, "Failed to load encoding, estimating tokens");
                    None
                }
            })
            .clone()
    }
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self
            .encodings
            .lock()
            .map(|cache| cache.len())
            .unwrap_or_default();
        f.debug_struct("TiktokenCounter")
            .field("cached_encodings", &cached)
            .finish()
    }
}

impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &str {
        "tiktoken"
    }

    fn count(&self, model: &str, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.encoding_for(model) {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => HeuristicCounter::estimate(text),
        }
    }
}
