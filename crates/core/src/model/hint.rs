use chrono::{DateTime, Utc};

use crate::model::ids::{ClueUsageId, CrosswordId, ProfileId};

/// Number of hint reveals allowed per attempt.
pub const HINT_BUDGET: usize = 3;

/// One hint reveal. Rows are append-only until a restart deletes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClueUsage {
    pub id: ClueUsageId,
    pub crossword_id: CrosswordId,
    pub profile_id: ProfileId,
    pub used_at: DateTime<Utc>,
}

/// Hint allowance derived from the usage log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintBudget {
    used: Vec<ClueUsage>,
}

impl HintBudget {
    #[must_use]
    pub fn new(used: Vec<ClueUsage>) -> Self {
        Self { used }
    }

    #[must_use]
    pub fn used(&self) -> usize {
        self.used.len()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        HINT_BUDGET.saturating_sub(self.used.len())
    }

    #[must_use]
    pub fn no_hints_left(&self) -> bool {
        self.used.len() >= HINT_BUDGET
    }

    pub fn record(&mut self, usage: ClueUsage) {
        self.used.push(usage);
    }

    pub fn clear(&mut self) {
        self.used.clear();
    }

    #[must_use]
    pub fn usages(&self) -> &[ClueUsage] {
        &self.used
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn usage(id: u64) -> ClueUsage {
        ClueUsage {
            id: ClueUsageId::new(id),
            crossword_id: CrosswordId::new(1),
            profile_id: ProfileId::random(),
            used_at: fixed_now(),
        }
    }

    #[test]
    fn budget_runs_out_at_three() {
        let mut budget = HintBudget::new(vec![usage(1), usage(2)]);
        assert!(!budget.no_hints_left());
        assert_eq!(budget.remaining(), 1);

        budget.record(usage(3));
        assert!(budget.no_hints_left());
        assert_eq!(budget.remaining(), 0);

        budget.record(usage(4));
        assert_eq!(budget.remaining(), 0);

        budget.clear();
        assert_eq!(budget.used(), 0);
        assert!(!budget.no_hints_left());
    }
}
