//! HTTP and offline implementations of the market-data and sentiment providers.

mod http;
pub mod fear_greed;
pub mod mock;
pub mod yahoo;

pub use fear_greed::{FearGreedClient, DEFAULT_FEAR_GREED_URL};
pub use mock::{MockMarketData, MockSentiment};
pub use yahoo::{YahooChartClient, DEFAULT_YAHOO_BASE_URL};
