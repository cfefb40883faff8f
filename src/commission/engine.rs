//! Dispatches transactions to the commission rule of their operation and user type.
use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::commission::{
    BUSINESS_WITHDRAW_RATE, CommissionError, CommissionRule, DEPOSIT_RATE, DecimalMath,
    ExchangeRateProvider, FlatRateRule, OperationType, PrivateWithdrawRule, Transaction, UserType,
    WithdrawalLedger,
};

/// Rules registered for one operation type.
///
/// A rule registered for the user type of a transaction takes precedence;
/// otherwise the default rule applies, if any.
#[derive(Default)]
pub struct OperationRules {
    by_user_type: HashMap<UserType, Box<dyn CommissionRule>>,
    default: Option<Box<dyn CommissionRule>>,
}

impl OperationRules {
    pub fn new() -> Self {
        OperationRules::default()
    }

    /// Creates rules applying `rule` to every user type.
    pub fn uniform(rule: impl CommissionRule + 'static) -> Self {
        OperationRules {
            by_user_type: HashMap::new(),
            default: Some(Box::new(rule)),
        }
    }

    /// Registers a rule for a specific user type.
    pub fn with_user_type(
        mut self,
        user_type: UserType,
        rule: impl CommissionRule + 'static,
    ) -> Self {
        self.by_user_type.insert(user_type, Box::new(rule));
        self
    }

    fn resolve(&self, user_type: UserType) -> Option<&dyn CommissionRule> {
        self.by_user_type
            .get(&user_type)
            .or(self.default.as_ref())
            .map(|rule| rule.as_ref())
    }
}

/// Registry of commission rules together with the weekly withdrawal state
/// they depend on.
///
/// Transactions must be passed to [`CommissionEngine::calculate`] in input
/// order.
#[derive(Default)]
pub struct CommissionEngine {
    rules: HashMap<OperationType, OperationRules>,
    ledger: WithdrawalLedger,
}

impl CommissionEngine {
    /// Creates an engine without any rules.
    pub fn new() -> Self {
        CommissionEngine::default()
    }

    /// Creates an engine with the standard deposit and withdrawal rules.
    pub fn with_default_rules(math: DecimalMath, rates: Arc<ExchangeRateProvider>) -> Self {
        let mut engine = CommissionEngine::new();
        engine.register(
            OperationType::Deposit,
            OperationRules::uniform(FlatRateRule::new(math, DEPOSIT_RATE)),
        );
        engine.register(
            OperationType::Withdraw,
            OperationRules::new()
                .with_user_type(UserType::Private, PrivateWithdrawRule::new(math, rates))
                .with_user_type(
                    UserType::Business,
                    FlatRateRule::new(math, BUSINESS_WITHDRAW_RATE),
                ),
        );
        engine
    }

    /// Registers the rules of an operation type, replacing any previous ones.
    pub fn register(&mut self, operation_type: OperationType, rules: OperationRules) {
        self.rules.insert(operation_type, rules);
    }

    /// Gets the weekly withdrawal state accumulated so far.
    pub fn ledger(&self) -> &WithdrawalLedger {
        &self.ledger
    }

    /// Calculates the commission of a transaction, formatted with the
    /// precision of its currency.
    pub fn calculate(&mut self, transaction: &Transaction) -> Result<String, CommissionError> {
        let operation = transaction.get_operation_type();
        let user_type = transaction.get_user_type();
        let rule = self
            .rules
            .get(&operation)
            .ok_or(CommissionError::UnsupportedOperation(operation))?
            .resolve(user_type)
            .ok_or(CommissionError::UnsupportedUserType {
                operation,
                user_type,
            })?;
        let fee = rule.calculate(transaction, &mut self.ledger)?;
        debug!(
            user_id = transaction.get_user_id(),
            date = %transaction.get_date(),
            %operation,
            %user_type,
            amount = %transaction.get_amount(),
            currency = transaction.get_currency(),
            %fee,
            "Calculated commission"
        );
        Ok(fee)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;

    fn math() -> DecimalMath {
        DecimalMath::new(10).unwrap()
    }

    fn engine() -> CommissionEngine {
        CommissionEngine::with_default_rules(
            math(),
            Arc::new(ExchangeRateProvider::builtin(math())),
        )
    }

    fn transaction(
        user_type: UserType,
        operation_type: OperationType,
        amount: Decimal,
        currency: &str,
    ) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(),
            1,
            user_type,
            operation_type,
            amount,
            currency,
        )
    }

    #[test]
    fn test_deposit_commission() {
        let mut engine = engine();
        for user_type in [UserType::Private, UserType::Business] {
            let tx = transaction(user_type, OperationType::Deposit, dec!(100.00), "EUR");
            assert_eq!(engine.calculate(&tx).unwrap(), "0.03");
        }
    }

    #[test]
    fn test_business_withdraw_commission() {
        let mut engine = engine();
        let tx = transaction(UserType::Business, OperationType::Withdraw, dec!(100.00), "EUR");
        assert_eq!(engine.calculate(&tx).unwrap(), "0.50");
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn test_private_withdraw_commission() {
        let mut engine = engine();
        let tx = transaction(UserType::Private, OperationType::Withdraw, dec!(800.00), "EUR");
        assert_eq!(engine.calculate(&tx).unwrap(), "0.00");
        let tx = transaction(UserType::Private, OperationType::Withdraw, dec!(300.00), "EUR");
        assert_eq!(engine.calculate(&tx).unwrap(), "0.30");
        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn test_unsupported_operation() {
        let mut engine = CommissionEngine::new();
        let tx = transaction(UserType::Private, OperationType::Deposit, dec!(100.00), "EUR");
        assert_eq!(
            engine.calculate(&tx),
            Err(CommissionError::UnsupportedOperation(OperationType::Deposit))
        );
    }

    #[test]
    fn test_unsupported_user_type() {
        let mut engine = CommissionEngine::new();
        engine.register(
            OperationType::Withdraw,
            OperationRules::new()
                .with_user_type(UserType::Business, FlatRateRule::new(math(), dec!(0.005))),
        );
        let tx = transaction(UserType::Private, OperationType::Withdraw, dec!(100.00), "EUR");
        assert_eq!(
            engine.calculate(&tx),
            Err(CommissionError::UnsupportedUserType {
                operation: OperationType::Withdraw,
                user_type: UserType::Private,
            })
        );
    }

    #[test]
    fn test_user_type_override() {
        let mut engine = CommissionEngine::new();
        engine.register(
            OperationType::Deposit,
            OperationRules::uniform(FlatRateRule::new(math(), DEPOSIT_RATE))
                .with_user_type(UserType::Business, FlatRateRule::new(math(), dec!(0.01))),
        );
        let tx = transaction(UserType::Business, OperationType::Deposit, dec!(100.00), "EUR");
        assert_eq!(engine.calculate(&tx).unwrap(), "1.00");
        let tx = transaction(UserType::Private, OperationType::Deposit, dec!(100.00), "EUR");
        assert_eq!(engine.calculate(&tx).unwrap(), "0.03");
    }
}
