//! Form-POST transport and response normalization.
//!
//! Every AstroPay operation is one `application/x-www-form-urlencoded` POST
//! of a flat parameter map. The body that comes back is parsed as JSON when
//! it can be; anything else is handed to the caller verbatim. Transport
//! failures are not recovered.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::AstroPayConfig;
use crate::error::AstroPayError;

/// Outgoing request parameters. Inserting an existing key replaces it.
pub type ParameterMap = BTreeMap<String, String>;

/// A normalized AstroPay response.
///
/// AstroPay answers most calls with JSON, but error pages and some legacy
/// replies are plain text. Callers branch on the variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    /// The body parsed as JSON.
    Json(Value),
    /// The body as received, when it is not JSON.
    Raw(String),
}

impl ApiResponse {
    /// Parse a response body, falling back to the raw text.
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => ApiResponse::Json(value),
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    len = body.len(),
                    "response body is not JSON, keeping raw text"
                );
                ApiResponse::Raw(body)
            }
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ApiResponse::Json(_))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            ApiResponse::Json(_) => None,
            ApiResponse::Raw(text) => Some(text),
        }
    }

    /// Look up a top-level key of a JSON object response.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_json().and_then(|value| value.get(key))
    }

    /// Look up a top-level string value of a JSON object response.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Raw(_) => None,
        }
    }
}

/// The HTTP POST capability the request builders depend on.
pub trait Transport {
    /// POST `params` as a form body to `url` and normalize the reply.
    fn post(&self, url: &Url, params: &ParameterMap) -> Result<ApiResponse, AstroPayError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post(&self, url: &Url, params: &ParameterMap) -> Result<ApiResponse, AstroPayError> {
        (**self).post(url, params)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn post(&self, url: &Url, params: &ParameterMap) -> Result<ApiResponse, AstroPayError> {
        (**self).post(url, params)
    }
}

/// Blocking `reqwest` transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build the HTTP client from the TLS and timeout settings in `config`.
    pub fn new(config: &AstroPayConfig) -> Result<Self, AstroPayError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if !config.verify_tls {
            tracing::warn!("TLS certificate verification is disabled for AstroPay requests");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(AstroPayError::ClientInit)?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &Url, params: &ParameterMap) -> Result<ApiResponse, AstroPayError> {
        let endpoint = format!("POST {}", url.path());
        tracing::debug!(endpoint = %endpoint, params = params.len(), "sending AstroPay request");

        let resp = self
            .http
            .post(url.clone())
            .form(params)
            .send()
            .map_err(|e| AstroPayError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        let status = resp.status();
        // Decoded with the Content-Type charset, UTF-8 when none is given.
        let body = resp.text().map_err(|e| AstroPayError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        if status.is_success() {
            tracing::debug!(endpoint = %endpoint, status = status.as_u16(), "AstroPay responded");
        } else {
            tracing::warn!(
                endpoint = %endpoint,
                status = status.as_u16(),
                "AstroPay returned a non-success status"
            );
        }

        Ok(ApiResponse::from_body(body))
    }
}
