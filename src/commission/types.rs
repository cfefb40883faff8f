//! Types used throughout the commission engine.
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

/// Scale used for intermediate decimal arithmetic.
/// Fees are only rounded to the currency precision at the very end.
pub const DEFAULT_SCALE: u32 = 10;

/// Currency all exchange rates are anchored to.
pub const BASE_CURRENCY: &str = "EUR";

/// User ID type, representing the account holder of a transaction.
pub type UserId = u32;

/// Account class of the user performing a transaction.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Private,
    Business,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Private => "private",
            UserType::Business => "business",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of operation a transaction performs.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Deposit,
    Withdraw,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "deposit",
            OperationType::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one weekly free-allowance window of a user.
///
/// Weeks follow ISO-8601 numbering: they start on Monday and the week-year
/// may differ from the calendar year around new year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekKey {
    pub user_id: UserId,
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    pub fn new(user_id: UserId, date: NaiveDate) -> Self {
        let iso = date.iso_week();
        WeekKey {
            user_id,
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:02}", self.user_id, self.year, self.week)
    }
}

/// Number of fractional digits fees are rounded to in the given currency.
pub fn currency_precision(currency: &str) -> u32 {
    match currency {
        "EUR" | "USD" => 2,
        "JPY" => 0,
        _ => 2,
    }
}
