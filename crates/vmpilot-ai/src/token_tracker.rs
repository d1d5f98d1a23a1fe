//! Token usage tracking across sampling steps and models.

use std::collections::HashMap;

use crate::{ModelChoice, TokenUsage};

/// Tracks cumulative token usage per model for one session.
#[derive(Debug, Default, Clone)]
pub struct TokenTracker {
    total: TokenUsage,
    by_model: HashMap<&'static str, TokenUsage>,
    call_count: u64,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record token usage from one sampling step.
    pub fn record(&mut self, model: ModelChoice, usage: &TokenUsage) {
        add(&mut self.total, usage);
        add(self.by_model.entry(model.name()).or_default(), usage);
        self.call_count += 1;
    }

    pub fn total(&self) -> &TokenUsage {
        &self.total
    }

    pub fn for_model(&self, model: ModelChoice) -> Option<&TokenUsage> {
        self.by_model.get(model.name())
    }

    pub fn total_tokens(&self) -> u64 {
        self.total.total_tokens()
    }

    /// Number of sampling steps recorded.
    pub fn call_count(&self) -> u64 {
        self.call_count
    }
}

fn add(into: &mut TokenUsage, usage: &TokenUsage) {
    into.input_tokens = into.input_tokens.saturating_add(usage.input_tokens);
    into.output_tokens = into.output_tokens.saturating_add(usage.output_tokens);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_per_model() {
        let mut tracker = TokenTracker::new();
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 20,
        };
        tracker.record(ModelChoice::Sonnet37, &usage);
        tracker.record(ModelChoice::Sonnet37, &usage);
        tracker.record(ModelChoice::Sonnet35, &usage);

        assert_eq!(tracker.call_count(), 3);
        assert_eq!(tracker.total_tokens(), 360);
        assert_eq!(
            tracker.for_model(ModelChoice::Sonnet37).unwrap().input_tokens,
            200
        );
        assert!(tracker.for_model(ModelChoice::Sonnet37Thinking).is_none());
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        let mut tracker = TokenTracker::new();
        let huge = TokenUsage {
            input_tokens: u64::MAX,
            output_tokens: 0,
        };
        tracker.record(ModelChoice::Sonnet35, &huge);
        tracker.record(ModelChoice::Sonnet35, &huge);
        assert_eq!(tracker.total().input_tokens, u64::MAX);
    }
}
