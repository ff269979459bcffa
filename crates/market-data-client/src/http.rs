use market_core::{FetchError, FetchResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

// Both upstream endpoints reject requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub(crate) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send a GET request and decode the JSON body.
///
/// Transport failures and non-2xx statuses are `ProviderUnavailable`; a body
/// that does not decode as `T` is `MalformedResponse`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    builder: reqwest::RequestBuilder,
) -> FetchResult<T> {
    let response = builder
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| FetchError::ProviderUnavailable(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FetchError::ProviderUnavailable(format!(
            "HTTP {}: {}",
            response.status(),
            response.text().await.unwrap_or_default()
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))
}
