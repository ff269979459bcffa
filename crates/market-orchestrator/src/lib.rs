use chrono::Utc;
use market_core::{
    FetchError, FetchResult, MarketDataProvider, Quote, QuoteKind, SectorPerformance,
    SentimentProvider, SentimentReading, TechnicalSnapshot,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use technical_analysis::{closes, technical_snapshot, RSI_PERIOD};

pub mod cache;
pub mod market_hours;
pub mod sectors;

pub use cache::TtlCache;
pub use market_hours::is_market_open;
pub use sectors::{sector_performance_from, sector_symbols, SECTOR_ETFS};

pub const VIX_SYMBOL: &str = "^VIX";
const SENTIMENT_CACHE_KEY: &str = "sentiment";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// How long a fetched quote or sentiment reading is served from cache
    pub cache_ttl: Duration,
    /// Pause between consecutive symbols in a batch; zero disables it
    pub request_delay: Duration,
    /// History window requested for indicator calculation
    pub history_range: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            request_delay: Duration::from_millis(200),
            history_range: "1mo".to_string(),
        }
    }
}

/// Cached access to quotes, indicators and market sentiment.
///
/// Every fetch is sequential. Failures are logged and returned as
/// `FetchError`; batch calls drop failed symbols instead of aborting.
pub struct MarketDataService {
    market_data: Arc<dyn MarketDataProvider>,
    sentiment: Arc<dyn SentimentProvider>,
    config: ServiceConfig,
    /// Quotes keyed by `stock:<symbol>` or `index:<symbol>`
    quote_cache: TtlCache<Quote>,
    sentiment_cache: TtlCache<SentimentReading>,
}

impl MarketDataService {
    pub fn new(
        market_data: Arc<dyn MarketDataProvider>,
        sentiment: Arc<dyn SentimentProvider>,
        config: ServiceConfig,
    ) -> Self {
        tracing::debug!(
            "Market data service using {} quotes and {} sentiment (ttl {}s)",
            market_data.provider_name(),
            sentiment.provider_name(),
            config.cache_ttl.as_secs()
        );

        Self {
            market_data,
            sentiment,
            quote_cache: TtlCache::new(config.cache_ttl),
            sentiment_cache: TtlCache::new(config.cache_ttl),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Quote for an equity or a `^`-prefixed index symbol.
    pub async fn get_quote(&self, symbol: &str) -> FetchResult<Quote> {
        self.fetch_quote(symbol, QuoteKind::from_symbol(symbol)).await
    }

    /// Equity quote with RSI(14), MA20 and MA50 (cached, 5-min TTL)
    pub async fn get_stock_quote(&self, symbol: &str) -> FetchResult<Quote> {
        self.fetch_quote(symbol, QuoteKind::Equity).await
    }

    /// Index quote, price fields only (cached, 5-min TTL)
    pub async fn get_index_quote(&self, symbol: &str) -> FetchResult<Quote> {
        self.fetch_quote(symbol, QuoteKind::Index).await
    }

    pub async fn get_vix(&self) -> FetchResult<Quote> {
        self.get_index_quote(VIX_SYMBOL).await
    }

    async fn fetch_quote(&self, symbol: &str, kind: QuoteKind) -> FetchResult<Quote> {
        let cache_key = format!("{}:{}", kind.cache_prefix(), symbol);
        if let Some(quote) = self.quote_cache.get(&cache_key) {
            tracing::debug!("Cache hit for {}", cache_key);
            return Ok(quote);
        }

        let snapshot = match self.market_data.snapshot(symbol).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Failed to fetch {} quote: {}", symbol, e);
                return Err(e);
            }
        };

        if snapshot.effective_price(kind).is_none() {
            let err = FetchError::MalformedResponse(format!("no price reported for {}", symbol));
            tracing::warn!("Failed to fetch {} quote: {}", symbol, err);
            return Err(err);
        }

        let technicals = match kind {
            QuoteKind::Equity => self.fetch_technicals(symbol).await,
            QuoteKind::Index => TechnicalSnapshot::default(),
        };

        let quote = Quote::from_snapshot(symbol, kind, snapshot, technicals, Utc::now());
        self.quote_cache.insert(cache_key, quote.clone());

        Ok(quote)
    }

    /// Indicators from the configured history window. Short or failed
    /// history leaves the indicators empty; the quote itself is still usable.
    async fn fetch_technicals(&self, symbol: &str) -> TechnicalSnapshot {
        match self.indicator_closes(symbol).await {
            Ok(closes) => technical_snapshot(&closes),
            Err(e @ FetchError::InsufficientHistory { .. }) => {
                tracing::debug!("{}: {}", symbol, e);
                TechnicalSnapshot::default()
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {} history, indicators unavailable: {}", symbol, e);
                TechnicalSnapshot::default()
            }
        }
    }

    /// Closing prices for indicator work; fewer than RSI(14) needs is an error.
    async fn indicator_closes(&self, symbol: &str) -> FetchResult<Vec<f64>> {
        let points = self.market_data.history(symbol, &self.config.history_range).await?;
        let closes = closes(&points);

        let needed = RSI_PERIOD + 1;
        if closes.len() < needed {
            return Err(FetchError::InsufficientHistory {
                needed,
                got: closes.len(),
            });
        }
        Ok(closes)
    }

    /// Composite fear & greed reading (cached, 5-min TTL)
    pub async fn get_sentiment(&self) -> FetchResult<SentimentReading> {
        if let Some(reading) = self.sentiment_cache.get(SENTIMENT_CACHE_KEY) {
            tracing::debug!("Cache hit for {}", SENTIMENT_CACHE_KEY);
            return Ok(reading);
        }

        let score = match self.sentiment.score().await {
            Ok(score) => score,
            Err(e) => {
                tracing::warn!("Failed to fetch market sentiment: {}", e);
                return Err(e);
            }
        };

        if !score.is_finite() || !(0.0..=100.0).contains(&score) {
            let err = FetchError::MalformedResponse(format!("sentiment score {} outside [0, 100]", score));
            tracing::warn!("Failed to fetch market sentiment: {}", err);
            return Err(err);
        }

        let reading = SentimentReading::new(score, Utc::now());
        self.sentiment_cache.insert(SENTIMENT_CACHE_KEY, reading.clone());

        Ok(reading)
    }

    /// Fetch equities one at a time; symbols that fail are left out.
    pub async fn batch_get_stocks<S: AsRef<str>>(&self, symbols: &[S]) -> HashMap<String, Quote> {
        self.batch_get(symbols, QuoteKind::Equity).await
    }

    pub async fn batch_get_indices<S: AsRef<str>>(&self, symbols: &[S]) -> HashMap<String, Quote> {
        self.batch_get(symbols, QuoteKind::Index).await
    }

    async fn batch_get<S: AsRef<str>>(&self, symbols: &[S], kind: QuoteKind) -> HashMap<String, Quote> {
        let mut results = HashMap::with_capacity(symbols.len());

        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 && !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }

            let symbol = symbol.as_ref();
            // Failure already logged by fetch_quote
            if let Ok(quote) = self.fetch_quote(symbol, kind).await {
                results.insert(symbol.to_string(), quote);
            }
        }

        tracing::info!(
            "Fetched {}/{} {} quotes",
            results.len(),
            symbols.len(),
            kind.cache_prefix()
        );
        results
    }

    /// Daily change of each sector ETF, in sector table order.
    pub async fn sector_performance(&self) -> Vec<SectorPerformance> {
        let quotes = self.batch_get_stocks(&sector_symbols()).await;
        sector_performance_from(&quotes)
    }
}
