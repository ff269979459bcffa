use async_trait::async_trait;
use crate::{FetchResult, PricePoint, QuoteSnapshot};

/// Pull-only source of quotes and daily closing prices.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Current snapshot fields for an equity or `^`-prefixed index symbol.
    async fn snapshot(&self, symbol: &str) -> FetchResult<QuoteSnapshot>;

    /// Daily closes over `range` (e.g. "1mo"), oldest first.
    async fn history(&self, symbol: &str, range: &str) -> FetchResult<Vec<PricePoint>>;

    fn provider_name(&self) -> &'static str;
}

/// Source of a single composite market-sentiment score in [0, 100].
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    async fn score(&self) -> FetchResult<f64>;

    fn provider_name(&self) -> &'static str;
}
