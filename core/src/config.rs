//! Connection settings for the transactional endpoint.
//!
//! # Design
//! A `TransactConfig` is built once (from TOML, the environment, or code)
//! and moved into each `Transact`. Nothing reads global state, so two
//! clients pointed at different instances can coexist in one process.
//! Credentials are carried for the transport and FTP tooling but never
//! inspected by the request assembler or response interpreter.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::error::TransactError;

#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TransactConfig {
    /// Pod number substituted into `transact{instance}.silverpop.com`.
    #[serde(default)]
    pub instance: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ftp_username: Option<String>,
    pub ftp_password: Option<String>,
    /// Full endpoint URL, used instead of the instance template when set.
    pub base_url: Option<String>,
    /// Whole-request timeout in milliseconds. Unset or `0` means no limit.
    pub timeout_ms: Option<u64>,
}

impl TransactConfig {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sub-millisecond remainders round up, so a non-zero timeout never
    /// collapses to "no limit".
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_micros().div_ceil(1000);
        self.timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn endpoint(&self) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None => format!("https://transact{}.silverpop.com/XTMail", self.instance),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, TransactError> {
        toml::from_str(raw).map_err(|e| TransactError::Config(e.to_string()))
    }

    /// Read `ENGAGE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, TransactError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset and empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TransactError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let timeout_ms = match get("ENGAGE_TIMEOUT_MS") {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| TransactError::Config(format!("ENGAGE_TIMEOUT_MS is not a number: {raw}")))?,
            ),
            None => None,
        };

        Ok(Self {
            instance: get("ENGAGE_INSTANCE").unwrap_or_default(),
            username: get("ENGAGE_USERNAME"),
            password: get("ENGAGE_PASSWORD"),
            ftp_username: get("ENGAGE_FTP_USERNAME"),
            ftp_password: get("ENGAGE_FTP_PASSWORD"),
            base_url: get("ENGAGE_BASE_URL"),
            timeout_ms,
        })
    }
}

impl fmt::Debug for TransactConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("TransactConfig")
            .field("instance", &self.instance)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("ftp_username", &self.ftp_username)
            .field("ftp_password", &redact(&self.ftp_password))
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}
