//! Budget enforcement: oldest-first eviction of whole messages.

use palaver_core::message::Transcript;
use palaver_core::token::TokenCounter;
use tracing::{debug, warn};

/// Outcome of one enforcement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetReport {
    /// Messages removed during this pass
    pub evicted: usize,
    /// Transcript cost after the pass, system entry included
    pub total_tokens: usize,
    pub budget: usize,
    pub within_budget: bool,
}

impl BudgetReport {
    /// The configuration warning condition: nothing is left to evict and
    /// the system message alone still exceeds the budget.
    pub fn system_prompt_exceeds_budget(&self) -> bool {
        !self.within_budget
    }
}

/// Evict the oldest non-system messages until the transcript costs at most
/// `budget` tokens or only the system message remains.
///
/// An over-budget system message is accepted: the pass stops, logs a
/// warning and reports `within_budget: false`.
pub fn enforce_budget(
    transcript: &mut Transcript,
    counter: &dyn TokenCounter,
    model: &str,
    budget: usize,
) -> BudgetReport {
    let mut total = transcript.total_tokens(counter, model);
    let mut evicted = 0;

    while total > budget {
        match transcript.evict_oldest() {
            Some(message) => {
                total = total.saturating_sub(counter.count(model, &message.content));
                evicted += 1;
            }
            None => {
                warn!(
                    total_tokens = total,
                    budget,
                    model,
                    "System prompt alone exceeds the token budget"
                );
                break;
            }
        }
    }

    if evicted > 0 {
        debug!(evicted, total_tokens = total, budget, "Evicted oldest messages");
    }

    BudgetReport {
        evicted,
        total_tokens: total,
        budget,
        within_budget: total <= budget,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{WordCounter, words};

    #[test]
    fn under_budget_is_untouched() {
        let mut t = Transcript::new(words(10, "sys"));
        t.push_user(words(5, "u"));
        let report = enforce_budget(&mut t, &WordCounter, "m", 50);
        assert_eq!(report.evicted, 0);
        assert_eq!(report.total_tokens, 15);
        assert!(report.within_budget);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn exactly_at_budget_is_kept() {
        let mut t = Transcript::new(words(10, "sys"));
        t.push_user(words(40, "u"));
        let report = enforce_budget(&mut t, &WordCounter, "m", 50);
        assert_eq!(report.evicted, 0);
        assert_eq!(report.total_tokens, 50);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut t = Transcript::new(words(10, "sys"));
        for tag in ["a", "b", "c", "d"] {
            t.push_user(words(10, tag));
        }
        let report = enforce_budget(&mut t, &WordCounter, "m", 30);

        assert_eq!(report.evicted, 2);
        assert_eq!(report.total_tokens, 30);
        let remaining: Vec<&str> = t.history().iter().map(|m| &m.content[..1]).collect();
        assert_eq!(remaining, vec!["c", "d"]);
    }

    #[test]
    fn survivors_are_a_suffix_for_every_budget() {
        let original: Vec<String> = (0..6).map(|i| words(i + 1, &format!("m{i}"))).collect();

        for budget in 0..40 {
            let mut t = Transcript::new(words(3, "sys"));
            for content in &original {
                t.push_user(content.clone());
            }
            let report = enforce_budget(&mut t, &WordCounter, "m", budget);

            let survivors: Vec<String> = t.history().iter().map(|m| m.content.clone()).collect();
            assert!(original.ends_with(&survivors), "budget {budget}");
            assert_eq!(t.messages()[0].role, palaver_core::Role::System);

            // Stops exactly: within budget, or nothing left to evict.
            assert!(report.within_budget || !t.has_history(), "budget {budget}");
            if report.evicted > 0 {
                // Putting back the last evicted message would exceed the budget.
                let last_evicted = &original[original.len() - survivors.len() - 1];
                let restored_cost = report.total_tokens + WordCounter.count("m", last_evicted);
                assert!(restored_cost > budget, "budget {budget}");
            }
        }
    }

    #[test]
    fn system_prompt_over_budget_stops_without_error() {
        let mut t = Transcript::new(words(10, "sys"));
        t.push_user(words(3, "u"));
        let report = enforce_budget(&mut t, &WordCounter, "m", 5);

        assert_eq!(report.evicted, 1);
        assert_eq!(report.total_tokens, 10);
        assert!(!report.within_budget);
        assert!(report.system_prompt_exceeds_budget());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn only_system_entry_is_a_noop() {
        let mut t = Transcript::new(words(10, "sys"));
        let report = enforce_budget(&mut t, &WordCounter, "m", 5);
        assert_eq!(report.evicted, 0);
        assert_eq!(t.len(), 1);
    }
}
