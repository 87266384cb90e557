//! Error types for the Cloud Deploy client

use thiserror::Error;

/// Main error type for the Cloud Deploy client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Error while calling Cloud Deploy: [{status}] {body}")]
    ApiError { status: u16, body: String },

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("The job is not started")]
    JobNotStarted,

    #[error("Websocket server is unavailable: {0}")]
    StreamUnavailable(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        ClientError::Internal(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::ChannelError(err.to_string())
    }
}
