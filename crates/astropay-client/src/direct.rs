//! Typed client for the AstroPay Direct API.
//!
//! Base URL: `astropaycard.com` (sandbox: `sandbox.astropaycard.com`)
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/api_curl/apd/create` | Create a bank-redirect payment |
//! | POST   | `/api_curl/apd/get_banks_by_country` | List banks of a country |
//! | POST   | `/apd/webpaystatus` | Invoice status |
//! | POST   | `/apd/webcurrencyexchange` | USD exchange rate for a country |
//!
//! `create` is signed: its `control` parameter is the HMAC-SHA256 of the
//! invoice, amount and user id under the merchant secret. Status and
//! exchange calls authenticate with the dedicated webpaystatus credentials.

use serde_json::Value;
use url::Url;
use zeroize::Zeroizing;

use crate::config::{join_endpoint, AstroPayConfig};
use crate::error::AstroPayError;
use crate::fields::{apply_fields, present, set_text, Annotations, FieldTarget, Unrecognized};
use crate::transport::{ApiResponse, HttpTransport, ParameterMap, Transport};

/// Default `type` / `x_response_format` of Direct calls.
pub const DEFAULT_RESPONSE_TYPE: &str = "json";
/// Default `x_sub_code`. Mandatory for PSPs.
pub const DEFAULT_SUB_CODE: &str = "1";

const CREATE_PATH: &str = "api_curl/apd/create";
const STATUS_PATH: &str = "apd/webpaystatus";
const EXCHANGE_PATH: &str = "apd/webcurrencyexchange";
const BANKS_PATH: &str = "api_curl/apd/get_banks_by_country";

/// Fields of one AstroPay Direct call.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectRequest {
    /// Unique transaction id at the merchant.
    pub invoice: Option<String>,
    /// Amount, exactly as it should appear on the wire. The control code
    /// signs this same text.
    pub amount: Option<String>,
    /// User's unique id at the merchant.
    pub iduser: Option<String>,
    /// Bank code.
    pub bank: Option<String>,
    /// Country code.
    pub country: Option<String>,
    pub currency: Option<String>,
    pub description: Option<String>,
    /// Brazilian taxpayer id.
    pub cpf: Option<String>,
    pub sub_code: Option<String>,
    /// Where AstroPay sends the user after payment.
    pub return_url: Option<String>,
    /// Where AstroPay posts the payment confirmation.
    pub confirmation_url: Option<String>,
    /// Response format. Default: `json`.
    pub response_type: String,
    pub annotations: Annotations,
    /// Input keys [`DirectRequest::from_fields`] could not assign.
    pub unrecognized: Unrecognized,
}

impl Default for DirectRequest {
    fn default() -> Self {
        Self {
            invoice: None,
            amount: None,
            iduser: None,
            bank: None,
            country: None,
            currency: None,
            description: None,
            cpf: None,
            sub_code: None,
            return_url: None,
            confirmation_url: None,
            response_type: DEFAULT_RESPONSE_TYPE.to_string(),
            annotations: Annotations::default(),
            unrecognized: Unrecognized::new(),
        }
    }
}

impl DirectRequest {
    /// A `create` request with an empty bank and the default sub code.
    pub fn new(
        invoice: impl Into<String>,
        amount: impl Into<String>,
        iduser: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            invoice: Some(invoice.into()),
            amount: Some(amount.into()),
            iduser: Some(iduser.into()),
            country: Some(country.into()),
            bank: Some(String::new()),
            sub_code: Some(DEFAULT_SUB_CODE.to_string()),
            ..Self::default()
        }
    }

    /// Build a request from a loosely-typed bag of values.
    ///
    /// Unknown keys end up in [`DirectRequest::unrecognized`].
    pub fn from_fields<I>(input: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut request = Self::default();
        request.unrecognized = apply_fields(&mut request, input);
        request
    }
}

impl FieldTarget for DirectRequest {
    const FIELDS: &'static [&'static str] = &[
        "invoice",
        "amount",
        "iduser",
        "bank",
        "country",
        "currency",
        "description",
        "cpf",
        "sub_code",
        "return_url",
        "confirmation_url",
        "response_type",
        "error",
        "message",
    ];

    fn assign(&mut self, field: &str, value: &Value) -> bool {
        match field {
            "invoice" => set_text(&mut self.invoice, value),
            "amount" => set_text(&mut self.amount, value),
            "iduser" => set_text(&mut self.iduser, value),
            "bank" => set_text(&mut self.bank, value),
            "country" => set_text(&mut self.country, value),
            "currency" => set_text(&mut self.currency, value),
            "description" => set_text(&mut self.description, value),
            "cpf" => set_text(&mut self.cpf, value),
            "sub_code" => set_text(&mut self.sub_code, value),
            "return_url" => set_text(&mut self.return_url, value),
            "confirmation_url" => set_text(&mut self.confirmation_url, value),
            "response_type" => {
                let mut slot = Some(self.response_type.clone());
                if !set_text(&mut slot, value) {
                    return false;
                }
                self.response_type = slot.unwrap_or_else(|| DEFAULT_RESPONSE_TYPE.to_string());
                true
            }
            other => self.annotations.assign(other, value),
        }
    }
}

/// Resolved AstroPay Direct endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectEndpoints {
    pub create: Url,
    pub status: Url,
    pub exchange: Url,
    pub banks: Url,
}

impl DirectEndpoints {
    /// Resolve the endpoints from the configured host.
    pub fn resolve(config: &AstroPayConfig) -> Result<Self, AstroPayError> {
        let base = config.direct_base()?;
        Ok(Self {
            create: join_endpoint(&base, CREATE_PATH)?,
            status: join_endpoint(&base, STATUS_PATH)?,
            exchange: join_endpoint(&base, EXCHANGE_PATH)?,
            banks: join_endpoint(&base, BANKS_PATH)?,
        })
    }
}

/// Client for the AstroPay Direct API.
///
/// Credentials and endpoints are captured when the client is built.
#[derive(Clone)]
pub struct DirectClient<T = HttpTransport> {
    transport: T,
    login: String,
    trans_key: Zeroizing<String>,
    status_login: String,
    status_trans_key: Zeroizing<String>,
    secret_key: Zeroizing<String>,
    endpoints: DirectEndpoints,
}

impl<T> std::fmt::Debug for DirectClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectClient")
            .field("login", &self.login)
            .field("status_login", &self.status_login)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> DirectClient<T> {
    pub fn new(config: &AstroPayConfig, transport: T) -> Result<Self, AstroPayError> {
        Ok(Self {
            transport,
            login: config.direct_login.clone(),
            trans_key: config.direct_trans_key.clone(),
            status_login: config.direct_login_for_status.clone(),
            status_trans_key: config.direct_trans_key_for_status.clone(),
            secret_key: config.direct_secret_key.clone(),
            endpoints: DirectEndpoints::resolve(config)?,
        })
    }

    pub fn endpoints(&self) -> &DirectEndpoints {
        &self.endpoints
    }

    /// Create a payment. The response carries the URL to redirect the user to.
    ///
    /// Calls `POST {base_url}/api_curl/apd/create`.
    pub fn create(&self, req: &DirectRequest) -> Result<ApiResponse, AstroPayError> {
        let params = self.create_params(req)?;
        self.transport.post(&self.endpoints.create, &params)
    }

    /// List the banks available in `country`.
    ///
    /// Calls `POST {base_url}/api_curl/apd/get_banks_by_country`.
    pub fn banks_by_country(&self, req: &DirectRequest) -> Result<ApiResponse, AstroPayError> {
        let params = self.banks_params(req);
        self.transport.post(&self.endpoints.banks, &params)
    }

    /// Status of the payment identified by `invoice`.
    ///
    /// Calls `POST {base_url}/apd/webpaystatus`.
    pub fn invoice_status(&self, req: &DirectRequest) -> Result<ApiResponse, AstroPayError> {
        let params = self.status_params(req);
        self.transport.post(&self.endpoints.status, &params)
    }

    /// Exchange rate from USD to the currency of `country`, applied to `amount`.
    ///
    /// Calls `POST {base_url}/apd/webcurrencyexchange`.
    pub fn exchange_rate(&self, req: &DirectRequest) -> Result<ApiResponse, AstroPayError> {
        let params = self.exchange_params(req);
        self.transport.post(&self.endpoints.exchange, &params)
    }

    /// Parameters for `create`, including the computed `control`.
    ///
    /// Optional fields are left out entirely when unset or empty.
    pub fn create_params(&self, req: &DirectRequest) -> Result<ParameterMap, AstroPayError> {
        let invoice = text(&req.invoice);
        let amount = text(&req.amount);
        let iduser = text(&req.iduser);
        let control =
            astropay_crypto::direct_control_code(&self.secret_key, invoice, amount, iduser)?;

        let mut params = ParameterMap::new();
        params.insert("x_login".into(), self.login.clone());
        params.insert("x_trans_key".into(), self.trans_key.to_string());
        params.insert("x_invoice".into(), invoice.into());
        params.insert("x_amount".into(), amount.into());
        params.insert("x_iduser".into(), iduser.into());
        params.insert("x_bank".into(), text(&req.bank).into());
        params.insert("x_country".into(), text(&req.country).into());
        params.insert("x_sub_code".into(), text(&req.sub_code).into());
        params.insert("type".into(), req.response_type.clone());
        params.insert("control".into(), control);

        let optional = [
            ("x_currency", &req.currency),
            ("x_description", &req.description),
            ("x_cpf", &req.cpf),
            ("x_return", &req.return_url),
            ("x_confirmation", &req.confirmation_url),
        ];
        for (key, value) in optional {
            if let Some(value) = present(value) {
                params.insert(key.into(), value.into());
            }
        }
        Ok(params)
    }

    pub fn banks_params(&self, req: &DirectRequest) -> ParameterMap {
        let mut params = ParameterMap::new();
        params.insert("x_login".into(), self.login.clone());
        params.insert("x_trans_key".into(), self.trans_key.to_string());
        params.insert("country_code".into(), text(&req.country).into());
        params.insert("type".into(), req.response_type.clone());
        params
    }

    pub fn status_params(&self, req: &DirectRequest) -> ParameterMap {
        let mut params = ParameterMap::new();
        params.insert("x_login".into(), self.status_login.clone());
        params.insert("x_trans_key".into(), self.status_trans_key.to_string());
        params.insert("x_invoice".into(), text(&req.invoice).into());
        params.insert("x_response_format".into(), req.response_type.clone());
        params
    }

    pub fn exchange_params(&self, req: &DirectRequest) -> ParameterMap {
        let mut params = ParameterMap::new();
        params.insert("x_login".into(), self.status_login.clone());
        params.insert("x_trans_key".into(), self.status_trans_key.to_string());
        params.insert("x_country".into(), text(&req.country).into());
        params.insert("x_amount".into(), text(&req.amount).into());
        params
    }
}

fn text(slot: &Option<String>) -> &str {
    slot.as_deref().unwrap_or_default()
}
