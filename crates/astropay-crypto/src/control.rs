//! # Control Code Computation
//!
//! Card and direct requests are signed with different schemes. Both take
//! every input as the literal text sent to AstroPay; callers must hand in
//! the same `amount` string they place in the request body.

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;

use crate::error::ControlError;

type HmacSha256 = Hmac<Sha256>;

/// Compute the card-line control code.
///
/// Returns the lowercase hex MD5 digest (32 chars) of
/// `login ++ transaction_id ++ amount`.
pub fn card_control_code(login: &str, transaction_id: &str, amount: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(login.as_bytes());
    hasher.update(transaction_id.as_bytes());
    hasher.update(amount.as_bytes());
    hex::encode(hasher.finalize())
}

/// The message a direct control code signs: `{invoice}D{amount}P{iduser}A`.
pub fn direct_control_message(invoice: &str, amount: &str, iduser: &str) -> String {
    format!("{invoice}D{amount}P{iduser}A")
}

/// Compute the direct-line control code sent as `control` on `create`.
///
/// Upper-case hex HMAC-SHA256 of [`direct_control_message`], keyed with the
/// merchant secret.
pub fn direct_control_code(
    secret_key: &str,
    invoice: &str,
    amount: &str,
    iduser: &str,
) -> Result<String, ControlError> {
    let mac = keyed_mac(secret_key, invoice, amount, iduser)?;
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}

/// Check a received direct control value against the expected one.
///
/// Hex case is ignored. The comparison runs in constant time; malformed hex
/// never matches.
pub fn verify_direct_control(
    secret_key: &str,
    invoice: &str,
    amount: &str,
    iduser: &str,
    candidate: &str,
) -> bool {
    let Ok(expected) = hex::decode(candidate.trim()) else {
        return false;
    };
    match keyed_mac(secret_key, invoice, amount, iduser) {
        Ok(mac) => mac.verify_slice(&expected).is_ok(),
        Err(_) => false,
    }
}

fn keyed_mac(
    secret_key: &str,
    invoice: &str,
    amount: &str,
    iduser: &str,
) -> Result<HmacSha256, ControlError> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| ControlError::InvalidKey(e.to_string()))?;
    mac.update(direct_control_message(invoice, amount, iduser).as_bytes());
    Ok(mac)
}
