//! # Control Subcommand
//!
//! Computes and checks control codes without contacting AstroPay.

use clap::{Args, Subcommand};

/// Arguments for the control subcommand.
#[derive(Args, Debug)]
pub struct ControlArgs {
    #[command(subcommand)]
    pub scheme: ControlScheme,
}

#[derive(Subcommand, Debug)]
pub enum ControlScheme {
    /// MD5 card control: md5(login ++ transaction_id ++ amount).
    Card {
        /// Card `x_login`. Defaults to `ASTROPAY_CARD_X_LOGIN`.
        #[arg(long, env = "ASTROPAY_CARD_X_LOGIN")]
        login: String,
        #[arg(long)]
        transaction_id: String,
        /// Amount, exactly as sent to AstroPay.
        #[arg(long)]
        amount: String,
    },
    /// HMAC-SHA256 direct control sent with `create`.
    Direct {
        /// Direct secret key. Defaults to `ASTROPAY_DIRECT_SECRET_KEY`.
        #[arg(long, env = "ASTROPAY_DIRECT_SECRET_KEY", hide_env_values = true)]
        secret: String,
        #[arg(long)]
        invoice: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        iduser: String,
    },
    /// Check a direct control value received from AstroPay.
    VerifyDirect {
        #[arg(long, env = "ASTROPAY_DIRECT_SECRET_KEY", hide_env_values = true)]
        secret: String,
        #[arg(long)]
        invoice: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        iduser: String,
        /// The control value to check.
        #[arg(long)]
        control: String,
    },
}

/// Execute the control subcommand and return the line to print.
pub fn run_control(args: &ControlArgs) -> anyhow::Result<String> {
    match &args.scheme {
        ControlScheme::Card {
            login,
            transaction_id,
            amount,
        } => Ok(astropay_crypto::card_control_code(
            login,
            transaction_id,
            amount,
        )),
        ControlScheme::Direct {
            secret,
            invoice,
            amount,
            iduser,
        } => Ok(astropay_crypto::direct_control_code(
            secret, invoice, amount, iduser,
        )?),
        ControlScheme::VerifyDirect {
            secret,
            invoice,
            amount,
            iduser,
            control,
        } => {
            if astropay_crypto::verify_direct_control(secret, invoice, amount, iduser, control) {
                Ok("valid".to_string())
            } else {
                anyhow::bail!("control mismatch for invoice {invoice}")
            }
        }
    }
}
