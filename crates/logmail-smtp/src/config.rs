//! SMTP connection parameters.

use std::time::Duration;

use lettre::transport::smtp::authentication::Mechanism;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Security/encryption mode for the SMTP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Security {
    /// No encryption (local relays only).
    #[default]
    None,
    /// Implicit TLS (connect directly with TLS).
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    StartTls,
}

impl Security {
    /// Get default port for the security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::StartTls => 587,
            Self::Tls => 465,
        }
    }

    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::None => "None (insecure)",
            Self::Tls => "SSL/TLS",
            Self::StartTls => "STARTTLS",
        }
    }
}

/// SMTP server configuration.
///
/// Field names follow the options hosts usually pass straight through to a
/// mail client, so the struct can be flattened into a larger options object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Server hostname.
    pub host: String,
    /// Server port. Derived from the security mode when absent.
    pub port: Option<u16>,
    /// Username for authentication.
    #[serde(alias = "user")]
    pub username: Option<String>,
    /// Password for authentication.
    #[serde(alias = "pass")]
    pub password: Option<String>,
    /// Connect with implicit TLS.
    #[serde(alias = "secure")]
    pub ssl: bool,
    /// Upgrade the connection with STARTTLS.
    pub tls: bool,
    /// Connection and I/O timeout in milliseconds; 10 seconds when unset.
    pub timeout: Option<u64>,
    /// Allowed authentication mechanisms (`PLAIN`, `LOGIN`, `XOAUTH2`).
    pub authentication: Vec<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            username: None,
            password: None,
            ssl: false,
            tls: false,
            timeout: None,
            authentication: Vec::new(),
        }
    }
}

impl SmtpConfig {
    /// Create a configuration for the given host with defaults elsewhere.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Security mode implied by the `ssl` and `tls` flags.
    ///
    /// Implicit TLS wins when both are set.
    #[must_use]
    pub const fn security(&self) -> Security {
        if self.ssl {
            Security::Tls
        } else if self.tls {
            Security::StartTls
        } else {
            Security::None
        }
    }

    /// Port to connect to.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.security().default_port())
    }

    /// Connection and I/O timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout.map_or(DEFAULT_TIMEOUT, Duration::from_millis)
    }

    /// Parsed authentication mechanisms.
    ///
    /// # Errors
    ///
    /// Returns an error if a mechanism name is not recognized.
    pub fn mechanisms(&self) -> Result<Vec<Mechanism>> {
        self.authentication
            .iter()
            .map(|name| parse_mechanism(name))
            .collect()
    }
}

fn parse_mechanism(name: &str) -> Result<Mechanism> {
    match name.trim().to_ascii_uppercase().as_str() {
        "PLAIN" => Ok(Mechanism::Plain),
        "LOGIN" => Ok(Mechanism::Login),
        "XOAUTH2" => Ok(Mechanism::Xoauth2),
        other => Err(Error::Config(format!(
            "unsupported authentication mechanism: {other}"
        ))),
    }
}
