//! The `ledger` module tracks private withdrawals per user and ISO week.
use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::commission::WeekKey;

/// Withdrawals seen so far in one allowance window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyWithdrawalState {
    /// Number of withdrawals processed, whether free or charged.
    pub operation_count: u32,
    /// Running total of withdrawn amounts in the base currency.
    pub cumulative_eur: Decimal,
}

/// Keyed store of weekly withdrawal states.
///
/// Entries are created lazily and never evicted. Updates must be applied in
/// input order since later fees depend on earlier totals.
#[derive(Debug, Default)]
pub struct WithdrawalLedger {
    weeks: HashMap<WeekKey, WeeklyWithdrawalState>,
}

impl WithdrawalLedger {
    /// Retrieves the state of a week, or an empty one if nothing was recorded yet.
    pub fn get_or_default(&self, key: &WeekKey) -> WeeklyWithdrawalState {
        self.weeks.get(key).cloned().unwrap_or_default()
    }

    /// Stores the state of a week, replacing the previous one.
    pub fn commit(&mut self, key: WeekKey, state: WeeklyWithdrawalState) {
        self.weeks.insert(key, state);
    }

    #[cfg(test)]
    pub fn get(&self, key: &WeekKey) -> Option<&WeeklyWithdrawalState> {
        self.weeks.get(key)
    }

    /// Number of allowance windows seen so far.
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_lazy_creation() {
        let mut ledger = WithdrawalLedger::default();
        assert!(ledger.is_empty());
        let key = WeekKey::new(1, NaiveDate::from_ymd_opt(2016, 1, 5).unwrap());
        assert!(ledger.get(&key).is_none());

        let mut state = ledger.get_or_default(&key);
        assert_eq!(state, WeeklyWithdrawalState::default());
        // reading does not create an entry
        assert!(ledger.is_empty());

        state.operation_count += 1;
        state.cumulative_eur += dec!(100);
        ledger.commit(key, state);

        let state = ledger.get_or_default(&key);
        assert_eq!(state.operation_count, 1);
        assert_eq!(state.cumulative_eur, dec!(100));
        assert_eq!(ledger.len(), 1);
    }
}
