//! AstroPay client error types.

use astropay_crypto::ControlError;

use crate::config::ConfigError;

/// Errors from AstroPay calls.
///
/// Only local failures surface here. A response body AstroPay sends back,
/// error payload or not, is returned as an [`ApiResponse`](crate::ApiResponse).
#[derive(Debug, thiserror::Error)]
pub enum AstroPayError {
    /// HTTP transport error (DNS, connect, timeout, body read).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),
    /// Control code computation failed.
    #[error("control code error: {0}")]
    Control(#[from] ControlError),
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
