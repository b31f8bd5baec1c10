//! Error types for steadyfetch

use thiserror::Error;

/// Errors that abort a fetch call
///
/// Every variant is fatal for the call that produced it. Content that was
/// fetched successfully but is not final yet is never reported as an error.
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL could not be parsed or is not http/https
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to build HTTP client
    #[error("Failed to create HTTP client")]
    ClientBuildError(#[source] reqwest::Error),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Failed to connect to server
    #[error("Failed to connect to server")]
    ConnectError(#[source] reqwest::Error),

    /// Reading the response body failed midway
    #[error("Failed to read response body")]
    BodyReadError(#[source] reqwest::Error),

    /// Response body could not be decompressed
    #[error("Failed to decode response body")]
    Decode(#[source] reqwest::Error),

    /// Other request error
    #[error("Request failed: {0}")]
    RequestError(String),
}

impl FetchError {
    /// Create an error from a reqwest error raised while sending a request
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::ConnectError(err)
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else {
            FetchError::RequestError(err.to_string())
        }
    }

    /// Create an error from a reqwest error raised while reading the body
    pub fn from_body(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err)
        } else if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::BodyReadError(err)
        }
    }
}

/// Non-fatal failure of a site handler's content transform
///
/// The fetch controller treats this as a no-op and keeps the content it had
/// before calling the handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Markup or selector could not be parsed
    #[error("Handler parse error: {0}")]
    Parse(String),
}

/// Errors from configuring a [`ContentDetector`](crate::ContentDetector)
#[derive(Debug, Error)]
pub enum DetectorError {
    /// Custom loading pattern is not a valid regular expression
    #[error("Invalid loading pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
