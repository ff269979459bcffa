use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Insufficient history: need {needed} points, got {got}")]
    InsufficientHistory { needed: usize, got: usize },
}

pub type FetchResult<T> = Result<T, FetchError>;
