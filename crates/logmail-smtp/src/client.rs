//! Mail client trait and SMTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::config::{Security, SmtpConfig};
use crate::error::Result;
use crate::message::Email;

/// Async email sending trait.
///
/// Implement this trait to deliver through something other than SMTP
/// (a provider API, a queue, a test double).
#[async_trait]
pub trait MailClient: Send + Sync + 'static {
    /// Send an email.
    async fn send(&self, email: &Email) -> Result<()>;
}

/// SMTP client backed by lettre's async transport.
///
/// A connection is opened for each send, so building a client does not
/// touch the network.
#[derive(Clone)]
pub struct SmtpClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    port: u16,
    timeout: Duration,
}

impl std::fmt::Debug for SmtpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpClient")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SmtpClient {
    /// Create a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if TLS parameters cannot be built for the host or an
    /// authentication mechanism is not recognized.
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let mut builder = match config.security() {
            Security::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            Security::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            Security::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            }
        };

        builder = builder.port(config.port()).timeout(Some(config.timeout()));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let mechanisms = config.mechanisms()?;
        if !mechanisms.is_empty() {
            builder = builder.authentication(mechanisms);
        }

        tracing::debug!(
            host = %config.host,
            port = config.port(),
            timeout = ?config.timeout(),
            security = config.security().display_name(),
            "Configured SMTP client"
        );

        Ok(Self {
            transport: builder.build(),
            host: config.host.clone(),
            port: config.port(),
            timeout: config.timeout(),
        })
    }

    /// Server hostname this client delivers to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port this client delivers to.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Timeout applied to connecting and to each SMTP command.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl MailClient for SmtpClient {
    async fn send(&self, email: &Email) -> Result<()> {
        let message = email.to_message()?;
        let response = self.transport.send(message).await?;

        tracing::debug!(
            code = %response.code(),
            recipients = %email.recipients(),
            "Message accepted by SMTP server"
        );

        Ok(())
    }
}
