//! Contract tests for CardClient against a mock AstroPay Card host.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST   | `/verif/validator` | `authorize_*`, `capture_*`, `refund_*`, `void_*` |
//! | POST   | `/verif/transtatus` | `check_status_*` |
//!
//! The client is blocking, so every call runs on the blocking pool while the
//! mock server keeps serving on the runtime.

use astropay_client::{ApiResponse, AstroPayClient, AstroPayConfig, CardRequest, StatusDetail};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn blocking<F, R>(f: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

fn payment() -> CardRequest {
    CardRequest::payment("1175000000000000", "123", "12/2030", "10.50", "user-9", "ORD-1")
}

// ── POST /verif/validator ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn authorize_posts_form_to_validator_and_parses_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/verif/validator"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("x_login=test-card-login"))
        .and(body_string_contains("x_tran_key=test-card-key"))
        .and(body_string_contains("x_type=AUTH_ONLY"))
        .and(body_string_contains("x_amount=10.50"))
        .and(body_string_contains("x_exp_date=12%2F2030"))
        .and(body_string_contains("x_delim_char=%7C"))
        .and(body_string_contains("x_invoice_num=ORD-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response_code": "1",
            "response_reason_text": "Approved",
            "x_auth_code": "A1B2",
            "TransactionID": "990011"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = AstroPayConfig::local_mock(&mock_server.uri()).unwrap();
    let resp = blocking(move || {
        let client = AstroPayClient::new(&config)?;
        client.card().authorize(&payment())
    })
    .await
    .unwrap();

    assert!(resp.is_json());
    assert_eq!(resp.get_str("response_code"), Some("1"));
    assert_eq!(resp.get_str("x_auth_code"), Some("A1B2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn capture_sends_auth_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/verif/validator"))
        .and(body_string_contains("x_type=CAPTURE_ONLY"))
        .and(body_string_contains("x_auth_code=A1B2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response_code": "1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = AstroPayConfig::local_mock(&mock_server.uri()).unwrap();
    let resp = blocking(move || {
        let client = AstroPayClient::new(&config)?;
        let mut req = payment();
        req.approval_code = Some("A1B2".into());
        client.card().capture(&req)
    })
    .await
    .unwrap();

    assert_eq!(resp.get_str("response_code"), Some("1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn refund_and_void_send_transaction_id() {
    let mock_server = MockServer::start().await;

    for ty in ["REFUND", "VOID"] {
        Mock::given(method("POST"))
            .and(path("/verif/validator"))
            .and(body_string_contains(format!("x_type={ty}").as_str()))
            .and(body_string_contains("x_trans_id=990011"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response_code": "1",
                "type": ty
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = AstroPayConfig::local_mock(&mock_server.uri()).unwrap();
    let (refund, void) = blocking(move || {
        let client = AstroPayClient::new(&config)?;
        let req = CardRequest {
            transaction_id: Some("990011".into()),
            amount: Some("10.50".into()),
            ..CardRequest::default()
        };
        let refund = client.card().refund(&req)?;
        let void = client.card().void(&req)?;
        Ok::<_, astropay_client::AstroPayError>((refund, void))
    })
    .await
    .unwrap();

    assert_eq!(refund.get_str("type"), Some("REFUND"));
    assert_eq!(void.get_str("type"), Some("VOID"));
}

#[tokio::test(flavor = "multi_thread")]
async fn pipe_delimited_reply_is_returned_as_raw_text() {
    let mock_server = MockServer::start().await;
    let body = "1|1|1|This transaction has been approved.|A1B2|990011|";

    Mock::given(method("POST"))
        .and(path("/verif/validator"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&mock_server)
        .await;

    let config = AstroPayConfig::local_mock(&mock_server.uri()).unwrap();
    let resp = blocking(move || {
        let client = AstroPayClient::new(&config)?;
        client.card().authorize_capture(&payment())
    })
    .await
    .unwrap();

    assert_eq!(resp, ApiResponse::Raw(body.to_string()));
}

// ── POST /verif/transtatus ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn check_status_posts_to_transtatus_without_card_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/verif/transtatus"))
        .and(body_string_contains("x_invoice_num=ORD-1"))
        .and(body_string_contains("x_trans_key=test-card-key"))
        .and(body_string_contains("x_type=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": "1",
            "x_invoice_num": "ORD-1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = AstroPayConfig::local_mock(&mock_server.uri()).unwrap();
    let resp = blocking(move || {
        let client = AstroPayClient::new(&config)?;
        let mut req = payment();
        req.status_detail = StatusDetail::Detailed;
        client.card().check_status(&req)
    })
    .await
    .unwrap();
    assert_eq!(resp.get_str("x_invoice_num"), Some("ORD-1"));

    let received = mock_server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&received[0].body).to_string();
    assert!(!body.contains("x_card_num"));
    assert!(!body.contains("x_card_code"));
    assert!(!body.contains("x_amount"));
}
