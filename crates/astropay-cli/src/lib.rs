//! # astropay-cli: AstroPay Command-Line Interface
//!
//! Runs any AstroPay operation from a shell, with credentials taken from
//! the `ASTROPAY_*` environment variables.
//!
//! ## Subcommands
//!
//! - `control`: Card MD5 and Direct HMAC control codes, and Direct control
//!   verification
//! - `card`: authorize, capture, auth-capture, refund, void, status
//! - `direct`: create, banks, status, exchange
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in the subcommand modules; request semantics
//!   live in `astropay-client`.
//! - Handlers are generic over the transport so they can be tested offline.

pub mod card;
pub mod control;
pub mod direct;
pub mod output;

use anyhow::{bail, Context};
use serde_json::Value;

/// Parse a `key=value` argument.
pub fn parse_key_value(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected key=value, got {raw:?}");
    };
    if key.trim().is_empty() {
        bail!("empty key in {raw:?}");
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// Turn `--field key=value` arguments into the input bag the request types
/// accept.
pub fn field_bag(fields: &[String]) -> anyhow::Result<Vec<(String, Value)>> {
    fields
        .iter()
        .map(|raw| {
            parse_key_value(raw)
                .map(|(k, v)| (k, Value::String(v)))
                .with_context(|| format!("invalid --field {raw:?}"))
        })
        .collect()
}

/// Print any keys a request type did not recognize to stderr.
pub(crate) fn report_unrecognized(unrecognized: &astropay_client::Unrecognized) {
    for key in unrecognized.keys() {
        eprintln!("warning: ignoring unknown field {key:?}");
    }
}
