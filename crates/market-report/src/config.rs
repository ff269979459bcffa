use anyhow::{Context, Result};
use market_data_client::{DEFAULT_FEAR_GREED_URL, DEFAULT_YAHOO_BASE_URL};
use market_orchestrator::ServiceConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_AI_STOCKS: &str = "NVDA=NVIDIA,MSFT=Microsoft,GOOGL=Alphabet,AMD=AMD,TSLA=Tesla,TSM=TSMC";
const DEFAULT_POWER_STOCKS: &str = "CEG=Constellation Energy,VST=Vistra";
const DEFAULT_INDICES: &str = "^GSPC=S&P 500,^IXIC=Nasdaq Composite,^DJI=Dow Jones,^VIX=VIX";

/// One watched symbol with an optional display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchItem {
    pub symbol: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // Watchlists
    pub ai_stocks: Vec<WatchItem>,
    pub power_stocks: Vec<WatchItem>,
    pub indices: Vec<WatchItem>,

    // Fetching
    pub cache_ttl_secs: u64,       // 300 (5 minutes)
    pub request_delay_ms: u64,     // 200
    pub http_timeout_secs: u64,    // 10
    pub history_range: String,     // "1mo"

    // External APIs
    pub market_data_base_url: String,
    pub sentiment_url: String,

    // Output
    pub output_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            ai_stocks: parse_watchlist(&var("REPORT_AI_STOCKS", DEFAULT_AI_STOCKS)),
            power_stocks: parse_watchlist(&var("REPORT_POWER_STOCKS", DEFAULT_POWER_STOCKS)),
            indices: parse_watchlist(&var("REPORT_INDICES", DEFAULT_INDICES)),

            cache_ttl_secs: var("CACHE_TTL_SECS", "300")
                .parse()
                .context("CACHE_TTL_SECS must be a whole number of seconds")?,
            request_delay_ms: var("REQUEST_DELAY_MS", "200")
                .parse()
                .context("REQUEST_DELAY_MS must be a whole number of milliseconds")?,
            http_timeout_secs: var("HTTP_TIMEOUT_SECS", "10")
                .parse()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            history_range: var("HISTORY_RANGE", "1mo"),

            market_data_base_url: var("MARKET_DATA_BASE_URL", DEFAULT_YAHOO_BASE_URL),
            sentiment_url: var("SENTIMENT_URL", DEFAULT_FEAR_GREED_URL),

            output_dir: PathBuf::from(var("REPORT_OUTPUT_DIR", "reports")),
        };

        if config.http_timeout_secs == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be greater than zero");
        }

        Ok(config)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            request_delay: Duration::from_millis(self.request_delay_ms),
            history_range: self.history_range.clone(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Parse `"NVDA=NVIDIA,MSFT"` into watch items; blank entries are ignored.
pub fn parse_watchlist(raw: &str) -> Vec<WatchItem> {
    raw.split(',')
        .filter_map(|entry| {
            let (symbol, name) = match entry.split_once('=') {
                Some((symbol, name)) => (symbol.trim(), Some(name.trim())),
                None => (entry.trim(), None),
            };
            if symbol.is_empty() {
                return None;
            }
            Some(WatchItem {
                symbol: symbol.to_uppercase(),
                name: name.filter(|n| !n.is_empty()).map(str::to_string),
            })
        })
        .collect()
}
