use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("no result for {0:?}")]
    NoResult(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    #[error("stop count must be between 1 and {max}, got {requested}")]
    StopCount { requested: u32, max: u32 },
}

pub type Result<T> = std::result::Result<T, RouteError>;
