//! Transaction module describing one deposit or withdrawal record.
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};

use crate::commission::{OperationType, UserId, UserType, WeekKey};

/// Number of columns in a transaction record.
pub const TRANSACTION_FIELDS: usize = 6;

/// Represents a single operation performed by a user.
///
/// Fields are declared in input column order; records carry no header.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The date the operation was performed on.
    date: NaiveDate,

    /// The account holder performing the operation.
    user_id: UserId,

    /// The account class of the user.
    user_type: UserType,

    /// The kind of operation (deposit or withdraw).
    operation_type: OperationType,

    /// The operation amount, kept exactly as supplied. Never negative.
    #[serde(deserialize_with = "non_negative_amount")]
    amount: Decimal,

    /// The currency code of the amount.
    currency: String,
}

fn non_negative_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = rust_decimal::serde::str::deserialize(deserializer)?;
    if amount < Decimal::ZERO {
        return Err(de::Error::custom(format!("negative amount {amount}")));
    }
    Ok(amount)
}

impl Transaction {
    #[cfg(test)]
    pub fn new(
        date: NaiveDate,
        user_id: UserId,
        user_type: UserType,
        operation_type: OperationType,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Transaction {
            date,
            user_id,
            user_type,
            operation_type,
            amount,
            currency: currency.into(),
        }
    }

    pub fn get_date(&self) -> NaiveDate {
        self.date
    }

    pub fn get_user_id(&self) -> UserId {
        self.user_id
    }

    pub fn get_user_type(&self) -> UserType {
        self.user_type
    }

    pub fn get_operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn get_amount(&self) -> Decimal {
        self.amount
    }

    pub fn get_currency(&self) -> &str {
        &self.currency
    }

    /// Gets the weekly allowance window this transaction falls into.
    pub fn week_key(&self) -> WeekKey {
        WeekKey::new(self.user_id, self.date)
    }
}
