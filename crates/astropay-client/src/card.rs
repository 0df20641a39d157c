//! Typed client for the AstroPay Card API.
//!
//! Base URL: `api.astropaycard.com` (sandbox: `sandbox-api.astropaycard.com`)
//!
//! | Method | Path | Operation | `x_type` |
//! |--------|------|-----------|----------|
//! | POST   | `/verif/validator` | Authorize | `AUTH_ONLY` |
//! | POST   | `/verif/validator` | Capture an authorization | `CAPTURE_ONLY` |
//! | POST   | `/verif/validator` | Authorize and capture | `AUTH_CAPTURE` |
//! | POST   | `/verif/validator` | Refund | `REFUND` |
//! | POST   | `/verif/validator` | Void | `VOID` |
//! | POST   | `/verif/transtatus` | Transaction status | `0` or `1` |
//!
//! Validator requests carry the full credential set, then any merchant
//! `additional_params`, then the card fields, then the operation fields.
//! A later layer overwrites an earlier one on a key collision.

use std::collections::BTreeMap;

use serde_json::Value;
use url::Url;
use zeroize::Zeroizing;

use crate::config::{join_endpoint, AstroPayConfig};
use crate::error::AstroPayError;
use crate::fields::{apply_fields, scalar_text, set_text, Annotations, FieldTarget, Unrecognized};
use crate::transport::{ApiResponse, HttpTransport, ParameterMap, Transport};

/// AstroPay API version sent as `x_version`.
pub const API_VERSION: &str = "2.0";
/// Field delimiter sent as `x_delim_char`.
pub const DELIM_CHAR: &str = "|";
/// `x_test_request` flag. AstroPay selects test mode by host, not by this flag.
pub const TEST_REQUEST: &str = "N";
/// Seconds within which an identical transaction counts as a duplicate.
pub const DUPLICATE_WINDOW: u32 = 30;
/// Payment method sent as `x_method`.
pub const METHOD: &str = "CC";
/// Response format requested from AstroPay.
pub const RESPONSE_FORMAT: &str = "json";

const VALIDATOR_PATH: &str = "verif/validator";
const TRANSTATUS_PATH: &str = "verif/transtatus";

/// Validator operations, sent as `x_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardOperation {
    AuthOnly,
    CaptureOnly,
    AuthCapture,
    Refund,
    Void,
}

impl CardOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            CardOperation::AuthOnly => "AUTH_ONLY",
            CardOperation::CaptureOnly => "CAPTURE_ONLY",
            CardOperation::AuthCapture => "AUTH_CAPTURE",
            CardOperation::Refund => "REFUND",
            CardOperation::Void => "VOID",
        }
    }
}

impl std::fmt::Display for CardOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail level of a status check, sent as `x_type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusDetail {
    #[default]
    Basic,
    Detailed,
}

impl StatusDetail {
    pub fn code(self) -> &'static str {
        match self {
            StatusDetail::Basic => "0",
            StatusDetail::Detailed => "1",
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match scalar_text(value)?.to_ascii_lowercase().as_str() {
            "0" | "basic" => Some(StatusDetail::Basic),
            "1" | "detailed" => Some(StatusDetail::Detailed),
            _ => None,
        }
    }
}

/// Fields of one AstroPay Card call.
///
/// Which fields matter depends on the operation. Unset fields that an
/// operation sends go out as empty strings; AstroPay reports them missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardRequest {
    /// Card number (16 digits).
    pub number: Option<String>,
    /// Card security code.
    pub ccv: Option<String>,
    /// Expiration date, `MM/YYYY`.
    pub exp_date: Option<String>,
    /// Amount, exactly as it should appear on the wire.
    pub amount: Option<String>,
    /// Anonymized identifier of the user at the merchant.
    pub unique_id: Option<String>,
    /// Merchant transaction identifier (order number).
    pub invoice_num: Option<String>,
    /// AstroPay transaction id, for refunds and voids.
    pub transaction_id: Option<String>,
    /// `x_auth_code` returned by an authorization, for captures.
    pub approval_code: Option<String>,
    /// Extra reference values forwarded to AstroPay with validator calls.
    pub additional_params: BTreeMap<String, String>,
    /// Status check detail level.
    pub status_detail: StatusDetail,
    pub annotations: Annotations,
    /// Input keys [`CardRequest::from_fields`] could not assign.
    pub unrecognized: Unrecognized,
}

impl CardRequest {
    /// A payment request with the fields every charge needs.
    pub fn payment(
        number: impl Into<String>,
        ccv: impl Into<String>,
        exp_date: impl Into<String>,
        amount: impl Into<String>,
        unique_id: impl Into<String>,
        invoice_num: impl Into<String>,
    ) -> Self {
        Self {
            number: Some(number.into()),
            ccv: Some(ccv.into()),
            exp_date: Some(exp_date.into()),
            amount: Some(amount.into()),
            unique_id: Some(unique_id.into()),
            invoice_num: Some(invoice_num.into()),
            ..Self::default()
        }
    }

    /// Build a request from a loosely-typed bag of values.
    ///
    /// Unknown keys end up in [`CardRequest::unrecognized`].
    pub fn from_fields<I>(input: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut request = Self::default();
        request.unrecognized = apply_fields(&mut request, input);
        request
    }
}

impl FieldTarget for CardRequest {
    const FIELDS: &'static [&'static str] = &[
        "number",
        "ccv",
        "exp_date",
        "amount",
        "unique_id",
        "invoice_num",
        "transaction_id",
        "approval_code",
        "additional_params",
        "type",
        "status_detail",
        "error",
        "message",
    ];

    fn assign(&mut self, field: &str, value: &Value) -> bool {
        match field {
            "number" => set_text(&mut self.number, value),
            "ccv" => set_text(&mut self.ccv, value),
            "exp_date" => set_text(&mut self.exp_date, value),
            "amount" => set_text(&mut self.amount, value),
            "unique_id" => set_text(&mut self.unique_id, value),
            "invoice_num" => set_text(&mut self.invoice_num, value),
            "transaction_id" => set_text(&mut self.transaction_id, value),
            "approval_code" => set_text(&mut self.approval_code, value),
            "additional_params" => match value {
                Value::Object(map) => {
                    self.additional_params = map
                        .iter()
                        .map(|(k, v)| (k.clone(), param_text(v)))
                        .collect();
                    true
                }
                Value::Null => {
                    self.additional_params.clear();
                    true
                }
                _ => false,
            },
            "type" | "status_detail" => match StatusDetail::from_value(value) {
                Some(detail) => {
                    self.status_detail = detail;
                    true
                }
                None => false,
            },
            other => self.annotations.assign(other, value),
        }
    }
}

/// Resolved AstroPay Card endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardEndpoints {
    pub validator: Url,
    pub transtatus: Url,
}

impl CardEndpoints {
    /// Resolve the endpoints from the configured host.
    pub fn resolve(config: &AstroPayConfig) -> Result<Self, AstroPayError> {
        let base = config.card_base()?;
        Ok(Self {
            validator: join_endpoint(&base, VALIDATOR_PATH)?,
            transtatus: join_endpoint(&base, TRANSTATUS_PATH)?,
        })
    }
}

/// Client for the AstroPay Card API.
///
/// Credentials and endpoints are captured when the client is built; later
/// changes to the configuration do not affect it.
#[derive(Clone)]
pub struct CardClient<T = HttpTransport> {
    transport: T,
    login: String,
    trans_key: Zeroizing<String>,
    endpoints: CardEndpoints,
}

impl<T> std::fmt::Debug for CardClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardClient")
            .field("login", &self.login)
            .field("trans_key", &"[REDACTED]")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> CardClient<T> {
    pub fn new(config: &AstroPayConfig, transport: T) -> Result<Self, AstroPayError> {
        Ok(Self {
            transport,
            login: config.card_login.clone(),
            trans_key: config.card_trans_key.clone(),
            endpoints: CardEndpoints::resolve(config)?,
        })
    }

    pub fn endpoints(&self) -> &CardEndpoints {
        &self.endpoints
    }

    /// MD5 control code for a transaction under this merchant's login.
    ///
    /// Never added to requests automatically. Integrations that verify
    /// AstroPay callbacks compute it on demand.
    pub fn control_code(&self, transaction_id: &str, amount: &str) -> String {
        astropay_crypto::card_control_code(&self.login, transaction_id, amount)
    }

    /// Authorize a transaction.
    ///
    /// Calls `POST {base_url}/verif/validator` with `x_type=AUTH_ONLY`.
    pub fn authorize(&self, req: &CardRequest) -> Result<ApiResponse, AstroPayError> {
        self.validate(CardOperation::AuthOnly, req)
    }

    /// Capture a previously authorized transaction. `approval_code` carries
    /// the `x_auth_code` the authorization returned.
    ///
    /// Calls `POST {base_url}/verif/validator` with `x_type=CAPTURE_ONLY`.
    pub fn capture(&self, req: &CardRequest) -> Result<ApiResponse, AstroPayError> {
        self.validate(CardOperation::CaptureOnly, req)
    }

    /// Authorize and capture in one step.
    ///
    /// Calls `POST {base_url}/verif/validator` with `x_type=AUTH_CAPTURE`.
    pub fn authorize_capture(&self, req: &CardRequest) -> Result<ApiResponse, AstroPayError> {
        self.validate(CardOperation::AuthCapture, req)
    }

    /// Refund a transaction identified by `transaction_id`.
    ///
    /// Calls `POST {base_url}/verif/validator` with `x_type=REFUND`.
    pub fn refund(&self, req: &CardRequest) -> Result<ApiResponse, AstroPayError> {
        self.validate(CardOperation::Refund, req)
    }

    /// Void a transaction identified by `transaction_id`.
    ///
    /// Calls `POST {base_url}/verif/validator` with `x_type=VOID`.
    pub fn void(&self, req: &CardRequest) -> Result<ApiResponse, AstroPayError> {
        self.validate(CardOperation::Void, req)
    }

    /// Run any validator operation.
    pub fn validate(
        &self,
        operation: CardOperation,
        req: &CardRequest,
    ) -> Result<ApiResponse, AstroPayError> {
        tracing::debug!(operation = %operation, "AstroPay card request");
        let params = self.transaction_params(operation, req);
        self.transport.post(&self.endpoints.validator, &params)
    }

    /// Check the status of a transaction by `invoice_num`.
    ///
    /// Calls `POST {base_url}/verif/transtatus`.
    pub fn check_status(&self, req: &CardRequest) -> Result<ApiResponse, AstroPayError> {
        let params = self.status_params(req);
        self.transport.post(&self.endpoints.transtatus, &params)
    }

    /// Parameters for a validator operation.
    pub fn transaction_params(&self, operation: CardOperation, req: &CardRequest) -> ParameterMap {
        let mut params = self.full_params(req);
        match operation {
            CardOperation::AuthOnly | CardOperation::AuthCapture => {
                insert(&mut params, "x_unique_id", &req.unique_id);
                insert(&mut params, "x_invoice_num", &req.invoice_num);
            }
            CardOperation::CaptureOnly => {
                insert(&mut params, "x_unique_id", &req.unique_id);
                insert(&mut params, "x_invoice_num", &req.invoice_num);
                insert(&mut params, "x_auth_code", &req.approval_code);
            }
            CardOperation::Refund | CardOperation::Void => {
                insert(&mut params, "x_trans_id", &req.transaction_id);
            }
        }
        params.insert("x_type".into(), operation.as_str().into());
        params
    }

    /// Parameters for a status check. Card fields and additional params are
    /// never included.
    pub fn status_params(&self, req: &CardRequest) -> ParameterMap {
        let mut params = self.basic_credentials();
        params.insert("x_trans_key".into(), self.trans_key.to_string());
        insert(&mut params, "x_invoice_num", &req.invoice_num);
        params.insert("x_type".into(), req.status_detail.code().into());
        params
    }

    fn basic_credentials(&self) -> ParameterMap {
        let mut params = ParameterMap::new();
        params.insert("x_login".into(), self.login.clone());
        params.insert("x_tran_key".into(), self.trans_key.to_string());
        params.insert("x_delim_char".into(), DELIM_CHAR.into());
        params.insert("x_test_request".into(), TEST_REQUEST.into());
        params.insert("x_response_format".into(), RESPONSE_FORMAT.into());
        params
    }

    fn full_credentials(&self) -> ParameterMap {
        let mut params = self.basic_credentials();
        params.insert("x_method".into(), METHOD.into());
        params.insert("x_version".into(), API_VERSION.into());
        params.insert("x_duplicate_window".into(), DUPLICATE_WINDOW.to_string());
        params
    }

    fn full_params(&self, req: &CardRequest) -> ParameterMap {
        let mut params = self.full_credentials();
        params.extend(
            req.additional_params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        insert(&mut params, "x_card_num", &req.number);
        insert(&mut params, "x_card_code", &req.ccv);
        insert(&mut params, "x_exp_date", &req.exp_date);
        insert(&mut params, "x_amount", &req.amount);
        params
    }
}

/// Wire text of an `additional_params` value. `null` is sent empty.
fn param_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => scalar_text(other).unwrap_or_else(|| other.to_string()),
    }
}

fn insert(params: &mut ParameterMap, key: &str, value: &Option<String>) {
    params.insert(key.into(), value.clone().unwrap_or_default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn config() -> AstroPayConfig {
        AstroPayConfig::default().configure(|c| {
            c.card_login = "merchant".into();
            c.card_trans_key = Zeroizing::new("tk".into());
        })
    }

    fn payment() -> CardRequest {
        CardRequest::payment("1175000000000000", "123", "12/2030", "10.50", "user-9", "ORD-1")
    }

    fn keys(params: &ParameterMap) -> BTreeSet<&str> {
        params.keys().map(String::as_str).collect()
    }

    #[test]
    fn authorize_sends_full_credentials_card_fields_and_type() {
        let transport = RecordingTransport::replying(r#"{"response_code":"1"}"#);
        let client = CardClient::new(&config(), transport.clone()).unwrap();

        let resp = client.authorize(&payment()).unwrap();
        assert_eq!(resp.get_str("response_code"), Some("1"));

        let (url, params) = transport.last();
        assert_eq!(url.as_str(), "https://sandbox-api.astropaycard.com/verif/validator");
        assert_eq!(params["x_login"], "merchant");
        assert_eq!(params["x_tran_key"], "tk");
        assert_eq!(params["x_version"], "2.0");
        assert_eq!(params["x_delim_char"], "|");
        assert_eq!(params["x_test_request"], "N");
        assert_eq!(params["x_duplicate_window"], "30");
        assert_eq!(params["x_method"], "CC");
        assert_eq!(params["x_response_format"], "json");
        assert_eq!(params["x_card_num"], "1175000000000000");
        assert_eq!(params["x_card_code"], "123");
        assert_eq!(params["x_exp_date"], "12/2030");
        assert_eq!(params["x_amount"], "10.50");
        assert_eq!(params["x_unique_id"], "user-9");
        assert_eq!(params["x_invoice_num"], "ORD-1");
        assert_eq!(params["x_type"], "AUTH_ONLY");
        assert!(!params.contains_key("x_auth_code"));
        assert!(!params.contains_key("x_trans_id"));
    }

    #[test]
    fn capture_adds_auth_code() {
        let client = CardClient::new(&config(), RecordingTransport::replying("{}")).unwrap();
        let mut req = payment();
        req.approval_code = Some("AUTH-77".into());

        let params = client.transaction_params(CardOperation::CaptureOnly, &req);
        assert_eq!(params["x_auth_code"], "AUTH-77");
        assert_eq!(params["x_type"], "CAPTURE_ONLY");
        assert_eq!(params["x_unique_id"], "user-9");
    }

    #[test]
    fn auth_capture_has_the_authorize_field_set() {
        let client = CardClient::new(&config(), RecordingTransport::replying("{}")).unwrap();
        let auth = client.transaction_params(CardOperation::AuthOnly, &payment());
        let both = client.transaction_params(CardOperation::AuthCapture, &payment());
        assert_eq!(keys(&auth), keys(&both));
        assert_eq!(both["x_type"], "AUTH_CAPTURE");
    }

    #[test]
    fn refund_and_void_send_transaction_id() {
        let client = CardClient::new(&config(), RecordingTransport::replying("{}")).unwrap();
        let req = CardRequest {
            transaction_id: Some("TX-5".into()),
            amount: Some("3".into()),
            ..CardRequest::default()
        };
        for (op, ty) in [(CardOperation::Refund, "REFUND"), (CardOperation::Void, "VOID")] {
            let params = client.transaction_params(op, &req);
            assert_eq!(params["x_trans_id"], "TX-5");
            assert_eq!(params["x_type"], ty);
            assert!(!params.contains_key("x_unique_id"));
            assert!(!params.contains_key("x_invoice_num"));
            assert_eq!(params["x_card_num"], "");
        }
    }

    #[test]
    fn later_layers_override_additional_params() {
        let client = CardClient::new(&config(), RecordingTransport::replying("{}")).unwrap();
        let mut req = payment();
        req.additional_params.insert("x_amount".into(), "999".into());
        req.additional_params.insert("x_type".into(), "BOGUS".into());
        req.additional_params.insert("x_method".into(), "DC".into());
        req.additional_params.insert("merchant_ref".into(), "abc".into());

        let params = client.transaction_params(CardOperation::AuthOnly, &req);
        assert_eq!(params["x_amount"], "10.50");
        assert_eq!(params["x_type"], "AUTH_ONLY");
        assert_eq!(params["x_method"], "DC");
        assert_eq!(params["merchant_ref"], "abc");
    }

    #[test]
    fn status_check_sends_only_credentials_invoice_and_type() {
        let transport = RecordingTransport::replying("{}");
        let client = CardClient::new(&config(), transport.clone()).unwrap();
        let mut req = payment();
        req.additional_params.insert("merchant_ref".into(), "abc".into());
        req.status_detail = StatusDetail::Detailed;

        client.check_status(&req).unwrap();
        let (url, params) = transport.last();
        assert_eq!(url.as_str(), "https://sandbox-api.astropaycard.com/verif/transtatus");
        assert_eq!(
            keys(&params),
            BTreeSet::from([
                "x_login",
                "x_tran_key",
                "x_trans_key",
                "x_delim_char",
                "x_test_request",
                "x_response_format",
                "x_invoice_num",
                "x_type",
            ])
        );
        assert_eq!(params["x_trans_key"], "tk");
        assert_eq!(params["x_type"], "1");
    }

    #[test]
    fn status_type_defaults_to_basic() {
        let client = CardClient::new(&config(), RecordingTransport::replying("{}")).unwrap();
        let params = client.status_params(&CardRequest::default());
        assert_eq!(params["x_type"], "0");
    }

    #[test]
    fn sandbox_toggle_changes_only_the_host() {
        let sandbox_tx = RecordingTransport::replying("{}");
        let production_tx = RecordingTransport::replying("{}");
        let sandbox = CardClient::new(&config(), sandbox_tx.clone()).unwrap();
        let production = CardClient::new(
            &config().configure(|c| c.sandbox = false),
            production_tx.clone(),
        )
        .unwrap();

        sandbox.void(&payment()).unwrap();
        production.void(&payment()).unwrap();
        let (sandbox_url, sandbox_params) = sandbox_tx.last();
        let (production_url, production_params) = production_tx.last();

        assert_eq!(sandbox_url.host_str(), Some("sandbox-api.astropaycard.com"));
        assert_eq!(production_url.host_str(), Some("api.astropaycard.com"));
        assert_eq!(sandbox_url.path(), production_url.path());
        assert_eq!(sandbox_params, production_params);
    }

    #[test]
    fn endpoints_are_fixed_at_construction() {
        let mut cfg = config();
        let client = CardClient::new(&cfg, RecordingTransport::replying("{}")).unwrap();
        cfg.sandbox = false;
        cfg.card_login = "changed".into();
        assert_eq!(
            client.endpoints().validator.host_str(),
            Some("sandbox-api.astropaycard.com")
        );
        let params = client.transaction_params(CardOperation::Void, &payment());
        assert_eq!(params["x_login"], "merchant");
    }

    #[test]
    fn control_code_uses_configured_login() {
        let client = CardClient::new(&config(), RecordingTransport::replying("{}")).unwrap();
        assert_eq!(
            client.control_code("1001", "10.50"),
            "bbfa9a7d1a8455740a58c6534b8d53c2"
        );
        let params = client.transaction_params(CardOperation::CaptureOnly, &payment());
        assert!(params.values().all(|v| v != "bbfa9a7d1a8455740a58c6534b8d53c2"));
    }

    #[test]
    fn from_fields_sets_known_and_keeps_unknown() {
        let input = json!({
            "number": "1175000000000000",
            "expDate": "01/2031",
            "amount": 12.5,
            "InvoiceNum": "ORD-2",
            "type": 1,
            "additionalParams": {"note": "gift", "qty": 2},
            "favouriteColour": "green"
        });
        let Value::Object(map) = input else { unreachable!() };
        let req = CardRequest::from_fields(map);

        assert_eq!(req.number.as_deref(), Some("1175000000000000"));
        assert_eq!(req.exp_date.as_deref(), Some("01/2031"));
        assert_eq!(req.amount.as_deref(), Some("12.5"));
        assert_eq!(req.invoice_num.as_deref(), Some("ORD-2"));
        assert_eq!(req.status_detail, StatusDetail::Detailed);
        assert_eq!(req.additional_params["note"], "gift");
        assert_eq!(req.additional_params["qty"], "2");
        assert_eq!(req.unrecognized.len(), 1);
        assert!(req.unrecognized.contains_key("favouriteColour"));
    }

    #[test]
    fn null_additional_param_is_sent_empty() {
        let req = CardRequest::from_fields(vec![(
            "additional_params".to_string(),
            json!({"coupon": null, "tags": ["a"]}),
        )]);
        assert_eq!(req.additional_params["coupon"], "");
        assert_eq!(req.additional_params["tags"], r#"["a"]"#);

        let client = CardClient::new(&config(), RecordingTransport::replying("{}")).unwrap();
        let params = client.transaction_params(CardOperation::AuthOnly, &req);
        assert_eq!(params["coupon"], "");
    }

    #[test]
    fn invalid_status_type_is_unrecognized() {
        let req = CardRequest::from_fields(vec![("type".to_string(), json!(7))]);
        assert_eq!(req.status_detail, StatusDetail::Basic);
        assert!(req.unrecognized.contains_key("type"));
    }

    #[test]
    fn raw_body_is_returned_unchanged() {
        let transport = RecordingTransport::replying("Invalid login<br>");
        let client = CardClient::new(&config(), transport).unwrap();
        let resp = client.authorize(&payment()).unwrap();
        assert_eq!(resp, ApiResponse::Raw("Invalid login<br>".into()));
    }
}
