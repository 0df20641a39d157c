//! AstroPay client configuration.
//!
//! Holds the merchant credentials for both product lines plus the sandbox
//! and TLS flags. A value is built once at startup (explicitly, from the
//! environment, or through [`AstroPayConfig::configure`]) and handed to each
//! client constructor. Nothing here is global.

use url::Url;
use zeroize::Zeroizing;

/// Production host for the card line.
pub const CARD_PRODUCTION_URL: &str = "https://api.astropaycard.com/";
/// Sandbox host for the card line.
pub const CARD_SANDBOX_URL: &str = "https://sandbox-api.astropaycard.com/";
/// Production host for the direct line.
pub const DIRECT_PRODUCTION_URL: &str = "https://astropaycard.com/";
/// Sandbox host for the direct line.
pub const DIRECT_SANDBOX_URL: &str = "https://sandbox.astropaycard.com/";

/// Configuration for connecting to AstroPay.
///
/// Credentials are not validated. An empty login or key produces a request
/// AstroPay rejects, and its rejection comes back through the normal
/// response path.
///
/// Custom `Debug` implementation redacts the transaction keys and the
/// secret key.
#[derive(Clone)]
pub struct AstroPayConfig {
    /// `x_login` for AstroPay Card.
    pub card_login: String,
    /// `x_trans_key` for AstroPay Card.
    pub card_trans_key: Zeroizing<String>,
    /// `x_login` for AstroPay Direct.
    pub direct_login: String,
    /// `x_trans_key` for AstroPay Direct.
    pub direct_trans_key: Zeroizing<String>,
    /// `x_login` for the Direct webpaystatus and exchange endpoints.
    pub direct_login_for_status: String,
    /// `x_trans_key` for the Direct webpaystatus and exchange endpoints.
    pub direct_trans_key_for_status: Zeroizing<String>,
    /// Secret key used to sign Direct `create` requests.
    pub direct_secret_key: Zeroizing<String>,
    /// Use the sandbox hosts. Default: `true`.
    pub sandbox: bool,
    /// Verify the server certificate. Default: `true`.
    ///
    /// When `false` the connection is still TLS, but any certificate is
    /// accepted. This is insecure and only exists for hosts with broken
    /// certificate chains.
    pub verify_tls: bool,
    /// Override for the card host. Takes precedence over `sandbox`.
    pub card_base_url: Option<Url>,
    /// Override for the direct host. Takes precedence over `sandbox`.
    pub direct_base_url: Option<Url>,
    /// Request timeout in seconds. `None` keeps the transport default.
    pub timeout_secs: Option<u64>,
}

impl Default for AstroPayConfig {
    fn default() -> Self {
        Self {
            card_login: String::new(),
            card_trans_key: Zeroizing::new(String::new()),
            direct_login: String::new(),
            direct_trans_key: Zeroizing::new(String::new()),
            direct_login_for_status: String::new(),
            direct_trans_key_for_status: Zeroizing::new(String::new()),
            direct_secret_key: Zeroizing::new(String::new()),
            sandbox: true,
            verify_tls: true,
            card_base_url: None,
            direct_base_url: None,
            timeout_secs: None,
        }
    }
}

impl std::fmt::Debug for AstroPayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AstroPayConfig")
            .field("card_login", &self.card_login)
            .field("card_trans_key", &"[REDACTED]")
            .field("direct_login", &self.direct_login)
            .field("direct_trans_key", &"[REDACTED]")
            .field("direct_login_for_status", &self.direct_login_for_status)
            .field("direct_trans_key_for_status", &"[REDACTED]")
            .field("direct_secret_key", &"[REDACTED]")
            .field("sandbox", &self.sandbox)
            .field("verify_tls", &self.verify_tls)
            .field("card_base_url", &self.card_base_url)
            .field("direct_base_url", &self.direct_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AstroPayConfig {
    /// Apply a setup callback and return the result.
    ///
    /// ```
    /// use astropay_client::AstroPayConfig;
    ///
    /// let config = AstroPayConfig::default().configure(|c| {
    ///     c.card_login = "merchant".into();
    ///     c.sandbox = false;
    /// });
    /// assert!(!config.sandbox);
    /// ```
    pub fn configure(mut self, setup: impl FnOnce(&mut Self)) -> Self {
        setup(&mut self);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `ASTROPAY_CARD_X_LOGIN`, `ASTROPAY_CARD_X_TRANS_KEY`
    /// - `ASTROPAY_DIRECT_X_LOGIN`, `ASTROPAY_DIRECT_X_TRANS_KEY`
    /// - `ASTROPAY_DIRECT_X_LOGIN_FOR_WEBPAYSTATUS`,
    ///   `ASTROPAY_DIRECT_X_TRANS_KEY_FOR_WEBPAYSTATUS`
    /// - `ASTROPAY_DIRECT_SECRET_KEY`
    /// - `ASTROPAY_SANDBOX` (default: `true`)
    /// - `ASTROPAY_VERIFY_TLS` (default: `true`)
    /// - `ASTROPAY_CARD_URL`, `ASTROPAY_DIRECT_URL` (optional host overrides)
    /// - `ASTROPAY_TIMEOUT_SECS` (optional)
    ///
    /// Missing credentials become empty strings.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |var: &str| lookup(var).unwrap_or_default();
        let secret = |var: &str| Zeroizing::new(lookup(var).unwrap_or_default());

        Ok(Self {
            card_login: text("ASTROPAY_CARD_X_LOGIN"),
            card_trans_key: secret("ASTROPAY_CARD_X_TRANS_KEY"),
            direct_login: text("ASTROPAY_DIRECT_X_LOGIN"),
            direct_trans_key: secret("ASTROPAY_DIRECT_X_TRANS_KEY"),
            direct_login_for_status: text("ASTROPAY_DIRECT_X_LOGIN_FOR_WEBPAYSTATUS"),
            direct_trans_key_for_status: secret("ASTROPAY_DIRECT_X_TRANS_KEY_FOR_WEBPAYSTATUS"),
            direct_secret_key: secret("ASTROPAY_DIRECT_SECRET_KEY"),
            sandbox: env_bool("ASTROPAY_SANDBOX", lookup("ASTROPAY_SANDBOX"), true)?,
            verify_tls: env_bool("ASTROPAY_VERIFY_TLS", lookup("ASTROPAY_VERIFY_TLS"), true)?,
            card_base_url: env_url("ASTROPAY_CARD_URL", lookup("ASTROPAY_CARD_URL"))?,
            direct_base_url: env_url("ASTROPAY_DIRECT_URL", lookup("ASTROPAY_DIRECT_URL"))?,
            timeout_secs: match lookup("ASTROPAY_TIMEOUT_SECS") {
                Some(raw) => Some(
                    raw.trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
                ),
                None => None,
            },
        })
    }

    /// Create a configuration pointing both product lines at one local mock
    /// server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if `base_url` cannot be parsed.
    pub fn local_mock(base_url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?;
        Ok(Self {
            card_login: "test-card-login".into(),
            card_trans_key: Zeroizing::new("test-card-key".into()),
            direct_login: "test-direct-login".into(),
            direct_trans_key: Zeroizing::new("test-direct-key".into()),
            direct_login_for_status: "test-status-login".into(),
            direct_trans_key_for_status: Zeroizing::new("test-status-key".into()),
            direct_secret_key: Zeroizing::new("test-secret".into()),
            card_base_url: Some(url.clone()),
            direct_base_url: Some(url),
            timeout_secs: Some(5),
            ..Self::default()
        })
    }

    /// Host for the card line: the override if set, otherwise the sandbox or
    /// production host.
    pub fn card_base(&self) -> Result<Url, ConfigError> {
        resolve_base(
            self.card_base_url.as_ref(),
            if self.sandbox {
                CARD_SANDBOX_URL
            } else {
                CARD_PRODUCTION_URL
            },
        )
    }

    /// Host for the direct line: the override if set, otherwise the sandbox
    /// or production host.
    pub fn direct_base(&self) -> Result<Url, ConfigError> {
        resolve_base(
            self.direct_base_url.as_ref(),
            if self.sandbox {
                DIRECT_SANDBOX_URL
            } else {
                DIRECT_PRODUCTION_URL
            },
        )
    }
}

fn resolve_base(custom: Option<&Url>, default: &str) -> Result<Url, ConfigError> {
    match custom {
        Some(url) => Ok(url.clone()),
        None => Url::parse(default)
            .map_err(|e| ConfigError::InvalidUrl(default.to_string(), e.to_string())),
    }
}

/// Join an endpoint path onto a host, treating the host path as a directory.
pub(crate) fn join_endpoint(base: &Url, path: &str) -> Result<Url, ConfigError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    base.join(path)
        .map_err(|e| ConfigError::InvalidUrl(format!("{base}{path}"), e.to_string()))
}

fn env_bool(var: &str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool(var.to_string(), raw)),
    }
}

fn env_url(var: &str, raw: Option<String>) -> Result<Option<Url>, ConfigError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => Url::parse(raw.trim())
            .map(Some)
            .map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string())),
        _ => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid boolean for {0}: {1:?}")]
    InvalidBool(String, String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid ASTROPAY_TIMEOUT_SECS: {0:?}")]
    InvalidTimeout(String),
}
