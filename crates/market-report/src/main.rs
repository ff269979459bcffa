use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use market_core::{MarketDataProvider, SentimentProvider};
use market_data_client::{FearGreedClient, MockMarketData, MockSentiment, YahooChartClient};
use market_orchestrator::MarketDataService;

mod config;
mod report;

use config::AppConfig;

const DEFAULT_LOG_FILTER: &str = "market_report=info,market_orchestrator=info,market_data_client=warn";

/// Daily market report: index levels, watchlist technicals and sentiment
#[derive(Parser, Debug)]
#[command(name = "market-report")]
#[command(version)]
struct Args {
    /// Use deterministic offline data instead of the live APIs
    #[arg(long)]
    mock: bool,

    /// Write the report to this file instead of the default location
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the report to stdout without saving it
    #[arg(long)]
    no_save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = AppConfig::from_env()?;

    let (market_data, sentiment): (Arc<dyn MarketDataProvider>, Arc<dyn SentimentProvider>) =
        if args.mock {
            tracing::info!("Using offline mock data");
            (Arc::new(MockMarketData::new()), Arc::new(MockSentiment::default()))
        } else {
            (
                Arc::new(YahooChartClient::new(
                    config.market_data_base_url.clone(),
                    config.http_timeout(),
                )),
                Arc::new(FearGreedClient::new(
                    config.sentiment_url.clone(),
                    config.http_timeout(),
                )),
            )
        };

    let service = MarketDataService::new(market_data, sentiment, config.service_config());

    let now = chrono::Utc::now();
    tracing::info!(
        "Generating market report ({} indices, {} watchlist symbols)",
        config.indices.len(),
        config.ai_stocks.len() + config.power_stocks.len()
    );

    let data = report::collect_report_data(&service, &config, now).await;
    let rendered = report::render_report(&data);

    if args.no_save {
        println!("{}", rendered);
        return Ok(());
    }

    let path = args
        .output
        .unwrap_or_else(|| report::default_report_path(&config.output_dir, now));
    report::save_report(&rendered, &path)?;

    tracing::info!("Report saved to {}", path.display());
    println!("{}", path.display());

    Ok(())
}

fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr so --no-save output stays clean.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter())
            .init();
    }
}
