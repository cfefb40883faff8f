//! Exchange rates anchored to the base currency and conversions between currencies.
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::{info, warn};

use crate::commission::{BASE_CURRENCY, CommissionError, DecimalMath, RateSourceError};

/// Rates used when the configured source cannot deliver any.
const FALLBACK_RATES: [(&str, Decimal); 3] = [
    ("EUR", dec!(1.0)),
    ("USD", dec!(1.1497)),
    ("JPY", dec!(129.53)),
];

/// Supplies rates as units of a currency per one base-currency unit.
pub trait RateSource {
    fn fetch(&self) -> Result<HashMap<String, Decimal>, RateSourceError>;
}

/// A fixed, in-memory rate table.
#[derive(Debug, Clone, Default)]
pub struct StaticRates {
    rates: HashMap<String, Decimal>,
}

impl StaticRates {
    pub fn new(rates: HashMap<String, Decimal>) -> Self {
        StaticRates { rates }
    }
}

impl FromIterator<(String, Decimal)> for StaticRates {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        StaticRates::new(iter.into_iter().collect())
    }
}

impl RateSource for StaticRates {
    fn fetch(&self) -> Result<HashMap<String, Decimal>, RateSourceError> {
        Ok(self.rates.clone())
    }
}

/// Rate document in the shape served by exchangeratesapi-style services.
#[derive(Deserialize)]
struct RatesDocument {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    rates: HashMap<String, serde_json::Number>,
}

fn default_success() -> bool {
    true
}

/// Reads rates from a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileRates {
    path: PathBuf,
}

impl JsonFileRates {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonFileRates {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn parse(content: &str) -> Result<HashMap<String, Decimal>, RateSourceError> {
        let document: RatesDocument = serde_json::from_str(content)?;
        if !document.success {
            return Err(RateSourceError::Rejected);
        }
        if let Some(base) = document.base.filter(|base| base != BASE_CURRENCY) {
            return Err(RateSourceError::BaseMismatch(base));
        }
        document
            .rates
            .into_iter()
            .map(|(currency, number)| {
                // Go through the textual form so the rate stays exactly as written.
                let text = number.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(|rate| (currency.clone(), rate))
                    .map_err(|_| RateSourceError::InvalidRate {
                        currency,
                        value: text,
                    })
            })
            .collect()
    }
}

impl RateSource for JsonFileRates {
    fn fetch(&self) -> Result<HashMap<String, Decimal>, RateSourceError> {
        let content = fs::read_to_string(&self.path)?;
        Self::parse(&content)
    }
}

/// Exchange rates anchored to [`BASE_CURRENCY`].
///
/// The table is read-only once constructed, so a provider can be shared
/// between rules without locking.
#[derive(Debug, Clone)]
pub struct ExchangeRateProvider {
    rates: HashMap<String, Decimal>,
    math: DecimalMath,
    fallback: bool,
}

impl ExchangeRateProvider {
    /// Loads rates from `source`, falling back to the built-in table when the
    /// source fails or returns unusable rates.
    pub fn load(source: &dyn RateSource, math: DecimalMath) -> Self {
        match source.fetch().and_then(Self::checked) {
            Ok(mut rates) => {
                rates.insert(BASE_CURRENCY.to_string(), Decimal::ONE);
                info!(currencies = rates.len(), "Loaded exchange rates");
                ExchangeRateProvider {
                    rates,
                    math,
                    fallback: false,
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Exchange rate source unavailable, using built-in fallback rates"
                );
                Self::builtin(math)
            }
        }
    }

    /// Creates a provider backed by the built-in fallback table.
    pub fn builtin(math: DecimalMath) -> Self {
        let rates = FALLBACK_RATES
            .iter()
            .map(|(currency, rate)| (currency.to_string(), *rate))
            .collect();
        ExchangeRateProvider {
            rates,
            math,
            fallback: true,
        }
    }

    fn checked(
        rates: HashMap<String, Decimal>,
    ) -> Result<HashMap<String, Decimal>, RateSourceError> {
        if rates.is_empty() {
            return Err(RateSourceError::Empty);
        }
        if let Some((currency, rate)) = rates.iter().find(|(_, rate)| **rate <= Decimal::ZERO) {
            return Err(RateSourceError::InvalidRate {
                currency: currency.clone(),
                value: rate.to_string(),
            });
        }
        Ok(rates)
    }

    /// Indicates whether the built-in fallback rates are in effect.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Gets the rate such that `amount_in_to = amount_in_from * rate`.
    pub fn get_rate(&self, from: &str, to: &str) -> Result<Decimal, CommissionError> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        let (Some(from_rate), Some(to_rate)) = (self.rates.get(from), self.rates.get(to)) else {
            return Err(CommissionError::RateUnavailable {
                from: from.to_string(),
                to: to.to_string(),
            });
        };
        if from == BASE_CURRENCY {
            Ok(*to_rate)
        } else if to == BASE_CURRENCY {
            self.math.divide(Decimal::ONE, *from_rate)
        } else {
            self.math.divide(*to_rate, *from_rate)
        }
    }

    /// Converts `amount` from one currency to another, keeping `scale` digits.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
        scale: u32,
    ) -> Result<Decimal, CommissionError> {
        if from == to {
            return Ok(amount);
        }
        let rate = self.get_rate(from, to)?;
        DecimalMath::new(scale)?.multiply(amount, rate)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;

    fn math() -> DecimalMath {
        DecimalMath::new(10).unwrap()
    }

    fn provider() -> ExchangeRateProvider {
        let source: StaticRates = [
            ("USD".to_string(), dec!(1.1497)),
            ("JPY".to_string(), dec!(129.53)),
        ]
        .into_iter()
        .collect();
        ExchangeRateProvider::load(&source, math())
    }

    #[test]
    fn test_static_source_is_not_fallback() {
        let provider = provider();
        assert!(!provider.is_fallback());
        assert_eq!(provider.get_rate("EUR", "EUR").unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_get_rate_directions() {
        let provider = provider();
        assert_eq!(provider.get_rate("EUR", "USD").unwrap(), dec!(1.1497));
        assert_eq!(provider.get_rate("USD", "EUR").unwrap(), dec!(0.8697921196));
        assert_eq!(provider.get_rate("USD", "JPY").unwrap(), dec!(112.6641732625));
        assert_eq!(provider.get_rate("JPY", "JPY").unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_get_rate_unknown_currency() {
        assert_eq!(
            provider().get_rate("GBP", "EUR"),
            Err(CommissionError::RateUnavailable {
                from: "GBP".to_string(),
                to: "EUR".to_string(),
            })
        );
        assert!(provider().get_rate("EUR", "GBP").is_err());
    }

    #[test]
    fn test_convert() {
        let provider = provider();
        assert_eq!(
            provider.convert(dec!(30000), "JPY", "EUR", 10).unwrap(),
            dec!(231.606576)
        );
        assert_eq!(
            provider.convert(dec!(100), "EUR", "JPY", 10).unwrap(),
            dec!(12953)
        );
        // identity does not need a known rate
        assert_eq!(
            provider.convert(dec!(12.5), "GBP", "GBP", 10).unwrap(),
            dec!(12.5)
        );
    }

    #[test]
    fn test_fallback_on_source_error() {
        let source = JsonFileRates::new("/nonexistent/rates.json");
        let provider = ExchangeRateProvider::load(&source, math());
        assert!(provider.is_fallback());
        assert_eq!(provider.get_rate("EUR", "JPY").unwrap(), dec!(129.53));
    }

    #[test]
    fn test_fallback_on_invalid_rate() {
        let source: StaticRates = [("USD".to_string(), dec!(0))].into_iter().collect();
        assert!(ExchangeRateProvider::load(&source, math()).is_fallback());
        assert!(ExchangeRateProvider::load(&StaticRates::default(), math()).is_fallback());
    }

    #[test]
    fn test_json_file_rates() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"success": true, "base": "EUR", "rates": {{"USD": 1.2, "JPY": 130.5, "GBP": 0.89}}}}"#
        )
        .unwrap();
        let provider = ExchangeRateProvider::load(&JsonFileRates::new(file.path()), math());
        assert!(!provider.is_fallback());
        assert_eq!(provider.get_rate("EUR", "GBP").unwrap(), dec!(0.89));
        assert_eq!(provider.get_rate("EUR", "JPY").unwrap(), dec!(130.5));
    }

    #[test]
    fn test_json_document_rejected() {
        assert!(matches!(
            JsonFileRates::parse(r#"{"success": false}"#),
            Err(RateSourceError::Rejected)
        ));
        assert!(matches!(
            JsonFileRates::parse(r#"{"base": "USD", "rates": {"EUR": 0.9}}"#),
            Err(RateSourceError::BaseMismatch(base)) if base == "USD"
        ));
        assert!(matches!(
            JsonFileRates::parse("not json"),
            Err(RateSourceError::Json(_))
        ));
    }

    proptest! {
        #[test]
        fn conversion_round_trip(cents in 0i64..100_000_000) {
            let provider = provider();
            let amount = Decimal::new(cents, 2);
            let there = provider.convert(amount, "EUR", "USD", 10).unwrap();
            let back = provider.convert(there, "USD", "EUR", 10).unwrap();
            prop_assert!((back - amount).abs() < dec!(0.001));
        }
    }
}
