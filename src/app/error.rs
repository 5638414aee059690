use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowseError {
    #[error("Store credentials not found. Set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY.")]
    InvalidCredentials,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Store error ({status}): {body}")]
    Aws { status: u16, body: String },

    #[error("Invalid response from store")]
    InvalidResponse,

    #[error("No items found matching the query criteria")]
    NoItemsFound,

    #[error("No items available to select from")]
    NoItemsAvailable,

    #[error("Preload timed out")]
    PreloadTimeout,

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Renderer error: {0}")]
    Renderer(String),
}

impl BrowseError {
    /// Whether the transport should spend another attempt on this failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            BrowseError::Network(_) => true,
            BrowseError::Aws { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BrowseError {
    fn from(e: reqwest::Error) -> Self {
        BrowseError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for BrowseError {
    fn from(e: serde_json::Error) -> Self {
        BrowseError::Parse(e.to_string())
    }
}

impl From<rusqlite::Error> for BrowseError {
    fn from(e: rusqlite::Error) -> Self {
        BrowseError::Database(e.to_string())
    }
}

impl From<std::io::Error> for BrowseError {
    fn from(e: std::io::Error) -> Self {
        BrowseError::Io(e.to_string())
    }
}

impl From<url::ParseError> for BrowseError {
    fn from(e: url::ParseError) -> Self {
        BrowseError::Config(format!("Invalid URL: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, BrowseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        let err = BrowseError::Aws {
            status: 503,
            body: "unavailable".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let err = BrowseError::Aws {
            status: 400,
            body: "ValidationException".into(),
        };
        assert!(!err.is_retryable());
        assert!(!BrowseError::InvalidCredentials.is_retryable());
        assert!(BrowseError::Network("reset".into()).is_retryable());
    }

    #[test]
    fn test_display_includes_status() {
        let err = BrowseError::Aws {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "Store error (500): boom");
    }
}
