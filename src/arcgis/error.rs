//! Errors raised while talking to an ArcGIS REST endpoint

use thiserror::Error;

/// Errors that can occur when fetching directory listings or layer data
#[derive(Debug, Error)]
pub enum ArcGisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    /// ArcGIS reports most failures as a 200 response with an `error` envelope
    #[error("ArcGIS error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("No features returned from {0}")]
    EmptyResult(String),
}

impl ArcGisError {
    pub fn decode(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}
