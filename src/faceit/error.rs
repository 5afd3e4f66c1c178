use thiserror::Error;

/// Failures of a pull request against the stats API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("stats API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("stats API error: HTTP {0}")]
    Status(u16),

    #[error("failed to decode stats API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("player not found: {0}")]
    PlayerNotFound(String),

    #[error("invalid stats API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::PlayerNotFound(_))
    }
}
