//! Klok client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KlokError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Response did not contain a session token")]
    MissingToken,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Proxy error: {0}")]
    Proxy(String),

    #[error("Invalid proxy format: {0}")]
    InvalidProxy(String),
}
