//! Application configuration management.
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::commission::{DEFAULT_SCALE, StaticRates};

/// Application configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Fractional digits kept by intermediate arithmetic.
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// JSON document with exchange rates. Built-in rates are used when unset.
    #[serde(default)]
    pub rates_file: Option<PathBuf>,
    /// Fixed rates per one EUR, used when no rates file is set.
    /// Values are kept as text so they stay exact.
    #[serde(default)]
    pub rates: HashMap<String, String>,
    /// Size of the channel feeding transactions to the engine.
    #[serde(default = "default_channel_size")]
    pub channel_size: usize,
}

fn default_scale() -> u32 {
    DEFAULT_SCALE
}

fn default_channel_size() -> usize {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            scale: default_scale(),
            rates_file: None,
            rates: HashMap::new(),
            channel_size: default_channel_size(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `commission.toml` in the working directory,
    /// the given file, and `COMMISSION_*` environment variables, in that order.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("commission").required(false));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(config::Environment::with_prefix("COMMISSION"))
            .build()?
            .try_deserialize()
    }

    /// Gets the fixed rates from the configuration, if any.
    pub fn static_rates(&self) -> Result<Option<StaticRates>, rust_decimal::Error> {
        if self.rates.is_empty() {
            return Ok(None);
        }
        self.rates
            .iter()
            .map(|(currency, rate)| {
                Decimal::from_str(rate).map(|rate| (currency.to_uppercase(), rate))
            })
            .collect::<Result<StaticRates, _>>()
            .map(Some)
    }
}
