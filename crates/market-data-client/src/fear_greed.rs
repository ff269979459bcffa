use async_trait::async_trait;
use market_core::{FetchError, FetchResult, SentimentProvider};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::http::{build_client, get_json};

pub const DEFAULT_FEAR_GREED_URL: &str =
    "https://production.dataviz.cnn.io/index/fearandgreed/graphdata";

/// CNN Fear & Greed composite index.
#[derive(Clone)]
pub struct FearGreedClient {
    url: String,
    client: Client,
}

impl FearGreedClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: build_client(timeout),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_FEAR_GREED_URL, Duration::from_secs(10))
    }
}

#[async_trait]
impl SentimentProvider for FearGreedClient {
    async fn score(&self) -> FetchResult<f64> {
        let body: Value = get_json(self.client.get(&self.url)).await?;
        parse_score(&body)
    }

    fn provider_name(&self) -> &'static str {
        "cnn-fear-greed"
    }
}

/// Extract the score from `{"fear_and_greed": {"score": ..}}` or `{"score": ..}`.
pub fn parse_score(body: &Value) -> FetchResult<f64> {
    let raw = match body.get("fear_and_greed") {
        Some(nested) => nested.get("score"),
        None => body.get("score"),
    };

    raw.and_then(Value::as_f64)
        .ok_or_else(|| FetchError::MalformedResponse("missing numeric sentiment score".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_nested_score() {
        let body = json!({
            "fear_and_greed": {"score": 62.4857, "rating": "greed", "previous_close": 60.1}
        });
        assert_eq!(parse_score(&body).unwrap(), 62.4857);
    }

    #[test]
    fn test_parse_flat_score() {
        let body = json!({"score": 18});
        assert_eq!(parse_score(&body).unwrap(), 18.0);
    }

    #[test]
    fn test_missing_score_is_malformed() {
        assert!(matches!(
            parse_score(&json!({"rating": "fear"})),
            Err(FetchError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_score(&json!({"fear_and_greed": {"score": "high"}})),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    #[ignore] // Hits the live CNN endpoint
    async fn test_live_score() {
        let client = FearGreedClient::with_defaults();
        let score = client.score().await.unwrap();
        println!("Fear & Greed: {:.1}", score);
        assert!((0.0..=100.0).contains(&score));
    }
}
