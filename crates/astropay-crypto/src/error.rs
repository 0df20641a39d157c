//! Control-code error types.

use thiserror::Error;

/// Error computing a control code.
#[derive(Error, Debug)]
pub enum ControlError {
    /// The MAC rejected the secret key.
    #[error("invalid control key: {0}")]
    InvalidKey(String),
}
