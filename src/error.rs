//! Error types for the dashboard client.

/// Everything that can go wrong between the dashboard and the backend.
///
/// None of these are fatal to the client: channel errors feed the reconnect
/// loop, parse errors are logged and dropped, and request/validation errors
/// become notifications or inline error panels.
#[derive(Debug, thiserror::Error)]
pub enum DashError {
    /// WebSocket transport failure.
    #[error("push channel error: {0}")]
    Channel(#[from] tokio_tungstenite::tungstenite::Error),

    /// Push channel closed or failed without a transport error to report.
    #[error("push channel error: {0}")]
    ChannelClosed(String),

    /// Push payload that could not be decoded.
    #[error("malformed push payload: {0}")]
    Parse(String),

    /// HTTP request failed (network error, timeout, undecodable body).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP error: {status} - {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// Server answered with an `{"error": ...}` body.
    #[error("{0}")]
    Server(String),

    /// Input rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// I/O error while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl DashError {
    /// Whether this error belongs to a pull or mutation request.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            DashError::Request(_) | DashError::HttpStatus { .. } | DashError::Server(_)
        )
    }

    /// Whether this error was raised before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, DashError::Validation(_))
    }
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::Parse(err.to_string())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, DashError>;
