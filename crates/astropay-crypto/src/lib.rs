//! # astropay-crypto: Control Codes
//!
//! Computes the control values AstroPay uses to bind a request's field
//! values to the merchant's credentials:
//!
//! - **Card** controls: lowercase hex MD5 over `login ++ transaction_id ++ amount`.
//! - **Direct** controls: upper-case hex HMAC-SHA256, keyed with the merchant
//!   secret, over `invoice ++ "D" ++ amount ++ "P" ++ iduser ++ "A"`.
//!
//! ## Crate Policy
//!
//! - Pure functions only. No I/O, no configuration lookup.
//! - Amounts are taken as the exact text that goes on the wire. This crate
//!   never reformats a number, so the control and the parameter it covers
//!   cannot drift apart.
//! - No `.unwrap()` outside tests.

pub mod control;
pub mod error;

pub use control::{
    card_control_code, direct_control_code, direct_control_message, verify_direct_control,
};
pub use error::ControlError;
