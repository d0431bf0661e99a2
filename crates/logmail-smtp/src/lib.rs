//! # logmail-smtp
//!
//! The mail-client side of `logmail`: connection parameters, the email
//! payload and the [`MailClient`] seam the log transport sends through.
//!
//! ## Features
//!
//! - **Pass-through configuration**: [`SmtpConfig`] accepts the options hosts
//!   usually hand straight to a mail client (`host`, `port`, `ssl`, `tls`,
//!   credentials, `timeout`, `authentication`)
//! - **SMTP delivery**: [`SmtpClient`] wraps lettre's async transport with
//!   implicit TLS, STARTTLS or plaintext relays
//! - **HTML alternatives**: [`Email`] renders as `multipart/alternative` when
//!   an HTML body is attached
//! - **Test double**: [`MemoryClient`] records emails and can simulate failures
//!
//! ## Quick Start
//!
//! ```ignore
//! use logmail_smtp::{Email, MailClient, SmtpClient, SmtpConfig, parse_mailbox};
//!
//! #[tokio::main]
//! async fn main() -> logmail_smtp::Result<()> {
//!     let config = SmtpConfig {
//!         tls: true,
//!         username: Some("alerts@example.com".into()),
//!         password: Some("app-password".into()),
//!         ..SmtpConfig::new("smtp.example.com")
//!     };
//!     let client = SmtpClient::from_config(&config)?;
//!
//!     let email = Email::builder()
//!         .from(parse_mailbox("alerts@example.com")?)
//!         .to(parse_mailbox("oncall@example.com")?)
//!         .subject("error: disk full")
//!         .text("disk full on /var")
//!         .build()?;
//!
//!     client.send(&email).await
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod memory;
mod message;

pub use client::{MailClient, SmtpClient};
pub use config::{DEFAULT_TIMEOUT, Security, SmtpConfig};
pub use error::{Error, Result};
pub use lettre::message::Mailbox;
pub use memory::MemoryClient;
pub use message::{Email, EmailBuilder, parse_mailbox};
