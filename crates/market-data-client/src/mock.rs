//! Deterministic offline providers for `--mock` runs.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use market_core::{FetchResult, MarketDataProvider, PricePoint, QuoteSnapshot, SentimentProvider};

const MOCK_HISTORY_DAYS: usize = 22;

#[derive(Debug, Clone, Default)]
pub struct MockMarketData;

impl MockMarketData {
    pub fn new() -> Self {
        Self
    }

    fn base_price(symbol: &str) -> f64 {
        match symbol {
            "^GSPC" => 5200.0,
            "^IXIC" => 16400.0,
            "^DJI" => 38900.0,
            "^VIX" => 14.5,
            _ => {
                let seed: u32 = symbol.bytes().map(u32::from).sum();
                20.0 + (seed % 480) as f64
            }
        }
    }

    fn closes(symbol: &str) -> Vec<f64> {
        let base = Self::base_price(symbol);
        let phase = symbol.len() as f64;
        (0..MOCK_HISTORY_DAYS)
            .map(|i| {
                let t = i as f64;
                let drift = 1.0 + 0.002 * t;
                let wave = 1.0 + 0.015 * (t * 0.9 + phase).sin();
                (base * drift * wave * 100.0).round() / 100.0
            })
            .collect()
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn snapshot(&self, symbol: &str) -> FetchResult<QuoteSnapshot> {
        let closes = Self::closes(symbol);
        let last = closes[closes.len() - 1];
        let prev = closes[closes.len() - 2];
        let high = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let low = closes.iter().cloned().fold(f64::INFINITY, f64::min);

        Ok(QuoteSnapshot {
            name: None,
            current_price: None,
            regular_market_price: Some(last),
            previous_close: Some(prev),
            volume: (!symbol.starts_with('^')).then_some(1_000_000.0),
            average_volume: None,
            market_cap: None,
            fifty_two_week_high: Some(high),
            fifty_two_week_low: Some(low),
            currency: Some("USD".to_string()),
            exchange: Some("MOCK".to_string()),
        })
    }

    async fn history(&self, symbol: &str, _range: &str) -> FetchResult<Vec<PricePoint>> {
        let today = Utc::now();
        let closes = Self::closes(symbol);
        let n = closes.len() as i64;

        Ok(closes
            .into_iter()
            .enumerate()
            .map(|(i, close)| PricePoint {
                date: today - Duration::days(n - 1 - i as i64),
                close,
            })
            .collect())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Debug, Clone)]
pub struct MockSentiment {
    score: f64,
}

impl MockSentiment {
    pub fn new(score: f64) -> Self {
        Self { score }
    }
}

impl Default for MockSentiment {
    fn default() -> Self {
        Self::new(52.0)
    }
}

#[async_trait]
impl SentimentProvider for MockSentiment {
    async fn score(&self) -> FetchResult<f64> {
        Ok(self.score)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
