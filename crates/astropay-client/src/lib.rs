//! # astropay-client -- Typed Rust client for the AstroPay APIs
//!
//! Covers both AstroPay product lines:
//! - **Card** via `api.astropaycard.com/verif/*`: authorize, capture,
//!   authorize+capture, refund, void, and transaction status.
//! - **Direct** via `astropaycard.com/api_curl/apd/*` and `/apd/*`: signed
//!   payment creation, bank listing, invoice status, and currency exchange.
//!
//! ## Request Model
//!
//! Every operation is a single blocking form POST. The request builders
//! assemble a flat parameter map from protocol constants, credentials,
//! computed control codes, and caller fields, then hand it to a
//! [`Transport`]. Responses come back as an [`ApiResponse`]: parsed JSON
//! when the body is JSON, the untouched body text otherwise.
//!
//! ## Configuration
//!
//! [`AstroPayConfig`] is passed into each client constructor. Endpoints and
//! credentials are resolved at construction, so a client never observes
//! later configuration changes.

pub mod card;
pub mod config;
pub mod direct;
pub mod error;
pub mod fields;
pub mod transport;

pub use card::{CardClient, CardOperation, CardRequest, StatusDetail};
pub use config::AstroPayConfig;
pub use direct::{DirectClient, DirectRequest};
pub use error::AstroPayError;
pub use fields::{apply_fields, FieldTarget, Unrecognized};
pub use transport::{ApiResponse, HttpTransport, ParameterMap, Transport};

use std::collections::BTreeMap;

/// Top-level AstroPay client. Holds one sub-client per product line, both
/// sharing a single transport.
#[derive(Debug, Clone)]
pub struct AstroPayClient<T = HttpTransport> {
    card: CardClient<T>,
    direct: DirectClient<T>,
}

impl AstroPayClient<HttpTransport> {
    /// Create a client that talks HTTP, per `config`.
    pub fn new(config: &AstroPayConfig) -> Result<Self, AstroPayError> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport + Clone> AstroPayClient<T> {
    /// Create a client over a caller-supplied transport.
    pub fn with_transport(config: &AstroPayConfig, transport: T) -> Result<Self, AstroPayError> {
        Ok(Self {
            card: CardClient::new(config, transport.clone())?,
            direct: DirectClient::new(config, transport)?,
        })
    }

    /// Access the AstroPay Card client.
    pub fn card(&self) -> &CardClient<T> {
        &self.card
    }

    /// Access the AstroPay Direct client.
    pub fn direct(&self) -> &DirectClient<T> {
        &self.direct
    }

    /// Charge a card in one step (authorize and capture).
    #[allow(clippy::too_many_arguments)]
    pub fn create_card(
        &self,
        number: &str,
        ccv: &str,
        exp_date: &str,
        amount: &str,
        unique_id: &str,
        invoice_num: &str,
        additional_params: BTreeMap<String, String>,
    ) -> Result<ApiResponse, AstroPayError> {
        let mut req = CardRequest::payment(number, ccv, exp_date, amount, unique_id, invoice_num);
        req.additional_params = additional_params;
        self.card.authorize_capture(&req)
    }

    /// Create a Direct payment. `extra` is applied first, so the positional
    /// arguments win over any overlapping key in it.
    #[allow(clippy::too_many_arguments)]
    pub fn create_direct<I>(
        &self,
        invoice: &str,
        amount: &str,
        iduser: &str,
        country: &str,
        bank: &str,
        sub_code: &str,
        extra: I,
    ) -> Result<ApiResponse, AstroPayError>
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        let mut req = DirectRequest::from_fields(extra);
        req.invoice = Some(invoice.to_string());
        req.amount = Some(amount.to_string());
        req.iduser = Some(iduser.to_string());
        req.country = Some(country.to_string());
        req.bank = Some(bank.to_string());
        req.sub_code = Some(sub_code.to_string());
        self.direct.create(&req)
    }
}
