use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotionError>;

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl NotionError {
    /// Whether a later retry could succeed (rate limiting or a server fault).
    pub fn is_transient(&self) -> bool {
        match self {
            NotionError::Network(_) | NotionError::Timeout(_) => true,
            NotionError::Api { status, .. } => *status == 429 || *status >= 500,
            NotionError::Parse(_) => false,
        }
    }
}

impl From<reqwest::Error> for NotionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotionError::Timeout(err.to_string())
        } else {
            NotionError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NotionError {
    fn from(err: serde_json::Error) -> Self {
        NotionError::Parse(err.to_string())
    }
}
