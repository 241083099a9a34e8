//! Spot price watcher entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spot_arb::config::Config;
use spot_arb::exchange::{Exchange, LiveSource, PriceSource, SpotClient};
use spot_arb::poll::PollLoop;
use spot_arb::report::{OpportunityLog, Reporter};

/// Cross-exchange spot price divergence and TWAP pattern watcher.
#[derive(Parser, Debug)]
#[command(name = "spot-arb")]
#[command(about = "Watches Binance, Bybit, and Coinbase spot prices for divergence and TWAP patterns")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// Trading symbol override (canonical dash form, e.g. BTC-USD).
    #[arg(short, long)]
    symbol: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the polling loop (default).
    Run {
        /// Trading symbol override (canonical dash form, e.g. BTC-USD).
        #[arg(short, long)]
        symbol: Option<String>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Fetch all three spot prices once and print them.
    Snapshot {
        /// Trading symbol override.
        #[arg(short, long)]
        symbol: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("spot_arb=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::Snapshot { symbol }) => cmd_snapshot(symbol).await,
        Some(Command::Run { symbol }) => cmd_run(symbol).await,
        None => cmd_run(args.symbol).await,
    }
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SPOT-ARB - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Symbol: {}", config.symbol);
    println!("  History Size: {} samples", config.history_size);
    println!("  Arbitrage Threshold: {}%", config.arbitrage_threshold_pct);
    println!("  TWAP Period: {}s", config.twap_period_seconds);
    println!("  TWAP Detect Samples: {}", config.twap_detect_samples);
    println!("  TWAP Pattern Threshold: {}", config.twap_pattern_threshold);
    println!("  Poll Interval: {}ms", config.poll_interval_ms);
    println!("  Fetch Timeout: {}ms", config.fetch_timeout_ms);
    println!("  Opportunity Log: {}", config.opportunity_log);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Fetch all three spot prices once and print them.
async fn cmd_snapshot(symbol_override: Option<String>) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(symbol) = symbol_override {
        config.symbol = symbol;
    }
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    println!("======================================================================");
    println!("SPOT-ARB - PRICE SNAPSHOT ({})", config.symbol);
    println!("======================================================================");

    let client = Arc::new(SpotClient::new(&config));

    for exchange in Exchange::ALL {
        print!("  {:<10}", exchange.to_string());
        match tokio::time::timeout(
            config.fetch_timeout(),
            client.fetch_price(exchange, &config.symbol),
        )
        .await
        {
            Ok(Ok(price)) => println!("{}", price),
            Ok(Err(e)) => println!("FAILED: {}", e),
            Err(_) => println!("FAILED: timed out after {}ms", config.fetch_timeout_ms),
        }
    }

    println!("======================================================================");
    Ok(())
}

/// Run the polling loop until ctrl-c.
async fn cmd_run(symbol_override: Option<String>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Some(symbol) = symbol_override {
        config.symbol = symbol;
    }

    // ConfigInvalid is the only fatal error; everything after this point
    // recovers per cycle.
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Configuration loaded successfully");
    info!("Symbol: {}", config.symbol);
    info!("Arbitrage threshold: {}%", config.arbitrage_threshold_pct);
    info!("Poll interval: {}ms", config.poll_interval_ms);
    info!("Opportunity log: {}", config.opportunity_log);

    let client = Arc::new(SpotClient::new(&config));
    let sources: Vec<Arc<dyn PriceSource>> = LiveSource::all(client)
        .into_iter()
        .map(|s| Arc::new(s) as Arc<dyn PriceSource>)
        .collect();

    let reporter = Reporter::new(config.symbol.clone());
    let opportunity_log = OpportunityLog::new(config.opportunity_log.clone());

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut poll = PollLoop::new(config, sources, reporter, opportunity_log);
    poll.run(shutdown_rx).await;

    // Give the final summary lines a moment to flush.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
