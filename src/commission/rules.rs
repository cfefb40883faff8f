//! Commission rules for each operation and user type.
use std::{cmp::Ordering, sync::Arc};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::commission::{
    BASE_CURRENCY, CommissionError, DecimalMath, ExchangeRateProvider, Transaction,
    WeeklyWithdrawalState, WithdrawalLedger, currency_precision,
};

/// Deposit commission, 0.03% of the amount.
pub const DEPOSIT_RATE: Decimal = dec!(0.0003);
/// Business withdrawal commission, 0.5% of the amount.
pub const BUSINESS_WITHDRAW_RATE: Decimal = dec!(0.005);
/// Private withdrawal commission, 0.3% of the charged amount.
pub const PRIVATE_WITHDRAW_RATE: Decimal = dec!(0.003);
/// Amount a private user may withdraw for free each week.
pub const FREE_AMOUNT_PER_WEEK_EUR: Decimal = dec!(1000.00);
/// Number of withdrawals per week eligible for the free amount.
pub const FREE_OPERATIONS_PER_WEEK: u32 = 3;

/// Computes the commission of a single transaction.
///
/// Rules that keep weekly state read and update it through `ledger`, which is
/// owned by the engine.
pub trait CommissionRule: Send {
    fn calculate(
        &self,
        transaction: &Transaction,
        ledger: &mut WithdrawalLedger,
    ) -> Result<String, CommissionError>;
}

/// Rounds a fee up to the precision of its currency.
fn round_fee(
    math: &DecimalMath,
    fee: Decimal,
    currency: &str,
) -> Result<String, CommissionError> {
    math.ceiling(fee, currency_precision(currency))
}

/// Charges a fixed percentage of the amount.
#[derive(Debug, Clone)]
pub struct FlatRateRule {
    math: DecimalMath,
    rate: Decimal,
}

impl FlatRateRule {
    pub fn new(math: DecimalMath, rate: Decimal) -> Self {
        FlatRateRule { math, rate }
    }
}

impl CommissionRule for FlatRateRule {
    fn calculate(
        &self,
        transaction: &Transaction,
        _ledger: &mut WithdrawalLedger,
    ) -> Result<String, CommissionError> {
        let fee = self.math.multiply(transaction.get_amount(), self.rate)?;
        round_fee(&self.math, fee, transaction.get_currency())
    }
}

/// Private withdrawals: the first [`FREE_OPERATIONS_PER_WEEK`] withdrawals of
/// an ISO week are free up to [`FREE_AMOUNT_PER_WEEK_EUR`] in total. Only the
/// part above the free amount is charged; any later withdrawal of the week
/// is charged in full.
#[derive(Debug, Clone)]
pub struct PrivateWithdrawRule {
    math: DecimalMath,
    rates: Arc<ExchangeRateProvider>,
}

impl PrivateWithdrawRule {
    pub fn new(math: DecimalMath, rates: Arc<ExchangeRateProvider>) -> Self {
        PrivateWithdrawRule { math, rates }
    }
}

impl CommissionRule for PrivateWithdrawRule {
    fn calculate(
        &self,
        transaction: &Transaction,
        ledger: &mut WithdrawalLedger,
    ) -> Result<String, CommissionError> {
        let key = transaction.week_key();
        let amount = transaction.get_amount();
        let currency = transaction.get_currency();
        let scale = self.math.scale();
        let amount_eur = self.rates.convert(amount, currency, BASE_CURRENCY, scale)?;

        let previous = ledger.get_or_default(&key);
        let week = WeeklyWithdrawalState {
            operation_count: previous.operation_count + 1,
            cumulative_eur: self.math.add(previous.cumulative_eur, amount_eur)?,
        };
        let remaining_free = self
            .math
            .subtract(FREE_AMOUNT_PER_WEEK_EUR, previous.cumulative_eur)?;

        let free_window = week.operation_count <= FREE_OPERATIONS_PER_WEEK
            && self.math.compare(remaining_free, Decimal::ZERO) == Ordering::Greater;

        let chargeable = if !free_window {
            amount
        } else if self.math.compare(amount_eur, remaining_free) != Ordering::Greater {
            Decimal::ZERO
        } else {
            let exceeded_eur = self.math.subtract(amount_eur, remaining_free)?;
            self.rates.convert(exceeded_eur, BASE_CURRENCY, currency, scale)?
        };
        let fee = self.math.multiply(chargeable, PRIVATE_WITHDRAW_RATE)?;
        let fee = round_fee(&self.math, fee, currency)?;
        debug!(
            week = %key,
            operations = week.operation_count,
            withdrawn_eur = %week.cumulative_eur,
            %chargeable,
            "Private withdrawal"
        );

        // only a withdrawal that produced a fee counts towards the week
        ledger.commit(key, week);
        Ok(fee)
    }
}
