use async_trait::async_trait;
use chrono::DateTime;
use market_core::{FetchError, FetchResult, MarketDataProvider, PricePoint, QuoteSnapshot};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::http::{build_client, get_json};

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Market data from the Yahoo Finance chart API.
///
/// One endpoint serves both calls: `range=1d` for the snapshot (its `meta`
/// block carries price, previous close and 52-week range) and the requested
/// range with daily bars for the closing-price history.
#[derive(Clone)]
pub struct YahooChartClient {
    base_url: String,
    client: Client,
}

impl YahooChartClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: build_client(timeout),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_YAHOO_BASE_URL, Duration::from_secs(10))
    }

    async fn get_chart(&self, symbol: &str, range: &str) -> FetchResult<ChartResult> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let body: ChartResponse = get_json(
            self.client
                .get(&url)
                .query(&[("range", range), ("interval", "1d")]),
        )
        .await?;

        body.into_result(symbol)
    }
}

#[async_trait]
impl MarketDataProvider for YahooChartClient {
    async fn snapshot(&self, symbol: &str) -> FetchResult<QuoteSnapshot> {
        let result = self.get_chart(symbol, "1d").await?;
        Ok(result.meta.into_snapshot())
    }

    async fn history(&self, symbol: &str, range: &str) -> FetchResult<Vec<PricePoint>> {
        let result = self.get_chart(symbol, range).await?;
        let points = result.price_points();
        tracing::debug!("Fetched {} daily closes for {} ({})", points.len(), symbol, range);
        Ok(points)
    }

    fn provider_name(&self) -> &'static str {
        "yahoo"
    }
}

// Response structures
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    exchange_name: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
    #[serde(default)]
    regular_market_volume: Option<f64>,
    #[serde(default)]
    fifty_two_week_high: Option<f64>,
    #[serde(default)]
    fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResponse {
    fn into_result(self, symbol: &str) -> FetchResult<ChartResult> {
        if let Some(err) = self.chart.error {
            return Err(FetchError::ProviderUnavailable(format!(
                "{} for {}: {}",
                err.code.unwrap_or_else(|| "chart error".to_string()),
                symbol,
                err.description.unwrap_or_default()
            )));
        }

        self.chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| FetchError::MalformedResponse(format!("no chart result for {}", symbol)))
    }
}

impl ChartMeta {
    fn into_snapshot(self) -> QuoteSnapshot {
        QuoteSnapshot {
            name: self.short_name.or(self.long_name),
            // The chart API has no separate last-trade field
            current_price: None,
            regular_market_price: self.regular_market_price,
            previous_close: self.previous_close.or(self.chart_previous_close),
            volume: self.regular_market_volume,
            average_volume: None,
            market_cap: None,
            fifty_two_week_high: self.fifty_two_week_high,
            fifty_two_week_low: self.fifty_two_week_low,
            currency: self.currency,
            exchange: self.exchange_name,
        }
    }
}

impl ChartResult {
    /// Pair timestamps with closes, dropping bars without a close (halted days).
    fn price_points(&self) -> Vec<PricePoint> {
        let closes = match self.indicators.as_ref().and_then(|i| i.quote.first()) {
            Some(q) => &q.close,
            None => return Vec::new(),
        };

        self.timestamp
            .iter()
            .zip(closes.iter())
            .filter_map(|(&ts, close)| {
                let close = (*close)?;
                let date = DateTime::from_timestamp(ts, 0)?;
                Some(PricePoint { date, close })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "symbol": "NVDA",
                    "exchangeName": "NMS",
                    "longName": "NVIDIA Corporation",
                    "shortName": "NVIDIA Corp",
                    "regularMarketPrice": 131.5,
                    "chartPreviousClose": 128.0,
                    "regularMarketVolume": 250000000,
                    "fiftyTwoWeekHigh": 153.13,
                    "fiftyTwoWeekLow": 86.62
                },
                "timestamp": [1717430400, 1717516800, 1717603200],
                "indicators": {
                    "quote": [{"close": [120.5, null, 124.0]}]
                }
            }],
            "error": null
        }
    }"#;

    const NOT_FOUND_FIXTURE: &str = r#"{
        "chart": {
            "result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
        }
    }"#;

    #[test]
    fn test_snapshot_from_meta() {
        let body: ChartResponse = serde_json::from_str(CHART_FIXTURE).unwrap();
        let snap = body.into_result("NVDA").unwrap().meta.into_snapshot();

        assert_eq!(snap.name.as_deref(), Some("NVIDIA Corp"));
        assert_eq!(snap.regular_market_price, Some(131.5));
        assert_eq!(snap.previous_close, Some(128.0));
        assert_eq!(snap.volume, Some(250000000.0));
        assert_eq!(snap.exchange.as_deref(), Some("NMS"));
        assert!(snap.current_price.is_none());
    }

    #[test]
    fn test_previous_close_prefers_explicit_field() {
        let meta: ChartMeta =
            serde_json::from_str(r#"{"previousClose": 99.0, "chartPreviousClose": 97.0}"#).unwrap();
        assert_eq!(meta.into_snapshot().previous_close, Some(99.0));
    }

    #[test]
    fn test_price_points_skip_null_closes() {
        let body: ChartResponse = serde_json::from_str(CHART_FIXTURE).unwrap();
        let points = body.into_result("NVDA").unwrap().price_points();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].close, 120.5);
        assert_eq!(points[1].close, 124.0);
        assert!(points[0].date < points[1].date);
    }

    #[test]
    fn test_chart_error_is_provider_unavailable() {
        let body: ChartResponse = serde_json::from_str(NOT_FOUND_FIXTURE).unwrap();
        match body.into_result("ZZZZ") {
            Err(FetchError::ProviderUnavailable(msg)) => assert!(msg.contains("ZZZZ")),
            other => panic!("expected ProviderUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_result_is_malformed() {
        let body: ChartResponse =
            serde_json::from_str(r#"{"chart": {"result": [], "error": null}}"#).unwrap();
        assert!(matches!(
            body.into_result("NVDA"),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = YahooChartClient::new("http://localhost:9000/", Duration::from_secs(1));
        assert_eq!(client.base_url, "http://localhost:9000");
    }

    #[tokio::test]
    #[ignore] // Hits the live Yahoo endpoint
    async fn test_live_snapshot() {
        let client = YahooChartClient::with_defaults();
        let snap = client.snapshot("^GSPC").await.unwrap();
        println!("S&P 500: {:?}", snap.regular_market_price);
        assert!(snap.regular_market_price.is_some());
    }
}
