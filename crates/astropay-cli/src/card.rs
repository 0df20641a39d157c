//! # Card Subcommand
//!
//! AstroPay Card operations.

use astropay_client::{ApiResponse, AstroPayClient, CardRequest, StatusDetail, Transport};
use clap::{Args, ValueEnum};

use crate::{field_bag, parse_key_value, report_unrecognized};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardAction {
    /// AUTH_ONLY
    Auth,
    /// CAPTURE_ONLY
    Capture,
    /// AUTH_CAPTURE
    AuthCapture,
    /// REFUND
    Refund,
    /// VOID
    Void,
    /// Transaction status by invoice number.
    Status,
}

/// Arguments for the card subcommand.
#[derive(Args, Debug)]
pub struct CardArgs {
    /// Operation to perform.
    #[arg(value_enum)]
    pub action: CardAction,
    /// Request field as key=value (e.g. number=..., exp_date=12/2030).
    #[arg(long = "field", short = 'f')]
    pub fields: Vec<String>,
    /// Extra reference parameter forwarded verbatim, as key=value.
    #[arg(long = "param", short = 'p')]
    pub params: Vec<String>,
    /// Ask for detailed status information.
    #[arg(long)]
    pub detailed: bool,
}

/// Build the request described by `args`.
pub fn build_request(args: &CardArgs) -> anyhow::Result<CardRequest> {
    let mut req = CardRequest::from_fields(field_bag(&args.fields)?);
    for raw in &args.params {
        let (key, value) = parse_key_value(raw)?;
        req.additional_params.insert(key, value);
    }
    if args.detailed {
        req.status_detail = StatusDetail::Detailed;
    }
    Ok(req)
}

/// Execute the card subcommand.
pub fn run_card<T: Transport + Clone>(
    args: &CardArgs,
    client: &AstroPayClient<T>,
) -> anyhow::Result<ApiResponse> {
    let req = build_request(args)?;
    report_unrecognized(&req.unrecognized);
    let card = client.card();
    let resp = match args.action {
        CardAction::Auth => card.authorize(&req)?,
        CardAction::Capture => card.capture(&req)?,
        CardAction::AuthCapture => card.authorize_capture(&req)?,
        CardAction::Refund => card.refund(&req)?,
        CardAction::Void => card.void(&req)?,
        CardAction::Status => card.check_status(&req)?,
    };
    Ok(resp)
}
