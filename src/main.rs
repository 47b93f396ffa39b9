use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use scalpbot::api::{BinanceClient, MarketDataProvider, OrderExecutor, PaperExchange};
use scalpbot::execution::{PositionController, PriceFeed};
use scalpbot::settings::{credentials_from_env, Settings};
use scalpbot::strategy::{latest_buy, StochasticMomentum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scalpbot", version, about = "Single-position stochastic momentum trader")]
struct Cli {
    /// Extra settings file layered over config/default.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check for an entry and, if taken, manage the position until it closes
    Run {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        quantity: Option<Decimal>,
        /// Simulate fills at the latest close instead of sending orders
        #[arg(long)]
        paper: bool,
    },
    /// Print the latest indicator values and buy decision without trading
    Signal {
        #[arg(long)]
        symbol: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Command::Run {
            symbol,
            quantity,
            paper,
        } => {
            if let Some(symbol) = symbol {
                settings.symbol = symbol;
            }
            if let Some(quantity) = quantity {
                settings.quantity = quantity;
            }
            settings.validate().context("Invalid settings")?;
            run(settings, paper).await
        }
        Command::Signal { symbol } => {
            if let Some(symbol) = symbol {
                settings.symbol = symbol;
            }
            signal(settings).await
        }
    }
}

// ============================================================================
// Initialization Functions
// ============================================================================

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scalpbot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn create_binance_client(settings: &Settings, require_credentials: bool) -> Result<BinanceClient> {
    let credentials = credentials_from_env();
    if require_credentials && credentials.is_none() {
        anyhow::bail!("API_KEY and SECRET_KEY must be set for live trading (or pass --paper)");
    }
    Ok(BinanceClient::new(settings.binance.clone(), credentials)?)
}

fn create_strategy(settings: &Settings) -> StochasticMomentum {
    StochasticMomentum::new(settings.indicators.clone(), settings.signal.clone())
}

// ============================================================================
// Commands
// ============================================================================

async fn run(settings: Settings, paper: bool) -> Result<()> {
    let venue = create_binance_client(&settings, !paper)?;

    let market: Arc<dyn MarketDataProvider> = Arc::new(venue.clone());
    let orders: Arc<dyn OrderExecutor> = if paper {
        Arc::new(PaperExchange::new(venue))
    } else {
        Arc::new(venue)
    };

    tracing::info!("🚀 scalpbot starting{}", if paper { " (paper)" } else { "" });
    tracing::info!("  Symbol: {}", settings.symbol);
    tracing::info!("  Quantity: {}", settings.quantity);
    tracing::info!(
        "  Bands: +{:.2}% / -{:.2}%",
        (settings.controller.take_profit_ratio - 1.0) * 100.0,
        (1.0 - settings.controller.stop_loss_ratio) * 100.0
    );
    tracing::info!("  Poll interval: {:?}", settings.controller.poll_interval());

    let controller = PositionController::new(
        market,
        orders,
        Arc::new(create_strategy(&settings)),
        settings.controller.clone(),
    );
    let mut stream = controller.run(&settings.symbol, settings.quantity);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::warn!("⚠️  Received Ctrl+C, stopping (an open position is NOT closed)");
                break;
            }
            line = stream.next() => match line {
                Some(Ok(line)) => println!("{}", line),
                Some(Err(e)) => return Err(e).context("Run failed"),
                None => break,
            }
        }
    }

    tracing::info!("👋 scalpbot stopped");
    Ok(())
}

async fn signal(settings: Settings) -> Result<()> {
    let venue = create_binance_client(&settings, false)?;
    let controller = &settings.controller;
    let feed = PriceFeed::new(
        Arc::new(venue),
        controller.interval,
        chrono::Duration::minutes(controller.entry_lookback_minutes),
        chrono::Duration::minutes(controller.monitor_lookback_minutes),
    );

    let series = feed
        .entry_series(&settings.symbol)
        .await
        .context("Failed to fetch candles")?;
    let strategy = create_strategy(&settings);
    let frame = strategy.frame(&series);

    println!("{} candles, {} indicator rows", series.len(), frame.len());
    match frame.latest() {
        Some(row) => {
            println!("  Time:  {}", row.timestamp);
            println!("  Close: {}", row.close);
            println!("  %K:    {:.2}", row.stoch_k);
            println!("  %D:    {:.2}", row.stoch_d);
            println!("  RSI:   {:.2}", row.rsi);
            println!("  MACD:  {:.6}", row.macd_hist);
            println!("  Buy:   {}", latest_buy(&frame, strategy.signal_config()));
        }
        None => println!("  Not enough data for indicators"),
    }

    Ok(())
}
