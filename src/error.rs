// Error types for postfeed.
// Covers REST API failures, missing request parameters, and config errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("No id was provided for {0}")]
    MissingParameter(&'static str),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Unknown screen: {0}")]
    UnknownScreen(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FeedError>;
