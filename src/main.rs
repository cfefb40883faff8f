use std::{fs::File, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::commission::{
    CommissionEngine, DecimalMath, ExchangeRateProvider, JsonFileRates, Sequencer, feed_csv,
};
use crate::config::AppConfig;

mod commission;
mod config;

/// Calculates commission fees for deposits and withdrawals read from a CSV file.
#[derive(Parser, Debug)]
#[command(name = "commission", version)]
struct Cli {
    /// CSV file with one transaction per line
    input: PathBuf,

    /// JSON file with exchange rates against EUR
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Fractional digits kept by intermediate arithmetic
    #[arg(long)]
    scale: Option<u32>,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "commission=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(rates) = cli.rates {
        config.rates_file = Some(rates);
    }
    if let Some(scale) = cli.scale {
        config.scale = scale;
    }

    let math = DecimalMath::new(config.scale)?;
    let static_rates = config
        .static_rates()
        .context("Invalid exchange rate in configuration")?;
    let rates = match (&config.rates_file, static_rates) {
        (Some(path), _) => ExchangeRateProvider::load(&JsonFileRates::new(path), math),
        (None, Some(source)) => ExchangeRateProvider::load(&source, math),
        (None, None) => {
            info!("No exchange rate source configured");
            ExchangeRateProvider::builtin(math)
        }
    };
    if rates.is_fallback() {
        warn!("Commissions are calculated with built-in fallback exchange rates");
    }
    let engine = CommissionEngine::with_default_rules(math, Arc::new(rates));

    let input = File::open(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;

    let (sender, receiver) = mpsc::channel(config.channel_size);
    let mut sequencer = Sequencer::new(engine, receiver);
    let handle = tokio::spawn(async move {
        let fees = sequencer.run().await;
        (fees, sequencer)
    });

    let fed = feed_csv(input, sender).await;

    let (fees, sequencer) = handle
        .await
        .context("Failed to join the commission task")?;
    info!(
        allowance_weeks = sequencer.engine().ledger().len(),
        "Tracked private withdrawal weeks"
    );
    let fees = fees?;
    fed.with_context(|| format!("Failed to read {}", cli.input.display()))?;
    for fee in fees {
        println!("{fee}");
    }
    Ok(())
}
