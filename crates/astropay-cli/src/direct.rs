//! # Direct Subcommand
//!
//! AstroPay Direct operations.

use astropay_client::{ApiResponse, AstroPayClient, DirectRequest, Transport};
use clap::{Args, ValueEnum};

use crate::{field_bag, report_unrecognized};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectAction {
    /// Create a payment and get the bank redirect link.
    Create,
    /// List banks for a country.
    Banks,
    /// Invoice status.
    Status,
    /// USD exchange rate for a country.
    Exchange,
}

/// Arguments for the direct subcommand.
#[derive(Args, Debug)]
pub struct DirectArgs {
    /// Operation to perform.
    #[arg(value_enum)]
    pub action: DirectAction,
    /// Request field as key=value (e.g. invoice=..., returnUrl=...).
    #[arg(long = "field", short = 'f')]
    pub fields: Vec<String>,
}

/// Build the request described by `args`.
pub fn build_request(args: &DirectArgs) -> anyhow::Result<DirectRequest> {
    Ok(DirectRequest::from_fields(field_bag(&args.fields)?))
}

/// Execute the direct subcommand.
pub fn run_direct<T: Transport + Clone>(
    args: &DirectArgs,
    client: &AstroPayClient<T>,
) -> anyhow::Result<ApiResponse> {
    let req = build_request(args)?;
    report_unrecognized(&req.unrecognized);
    let direct = client.direct();
    let resp = match args.action {
        DirectAction::Create => direct.create(&req)?,
        DirectAction::Banks => direct.banks_by_country(&req)?,
        DirectAction::Status => direct.invoice_status(&req)?,
        DirectAction::Exchange => direct.exchange_rate(&req)?,
    };
    Ok(resp)
}
