//! # logmail
//!
//! A logging transport that sends log events as email.
//!
//! The crate maps a log event (level, message, metadata) onto an email
//! (subject, body) and hands it to a [`MailClient`]. Everything else, from
//! SMTP to connection handling, belongs to the mail client; level hierarchy
//! and dispatch belong to the logging host.
//!
//! ## Features
//!
//! - **Two calling conventions**: [`LogCall::legacy`] and [`LogCall::info`]
//!   normalize into one [`LogEvent`]
//! - **Templated subjects**: `{{level}}` and `{{message}}` placeholders
//! - **Metadata rendering**: pretty-printed JSON after the message, with errors
//!   reduced to `message`/`name`/`stack`
//! - **Unique mode, filters and formatters** for deciding what is sent and how
//! - **Non-fatal delivery**: send failures surface as [`TransportEvent::Error`]
//!   signals, never as errors to the caller
//! - **`tracing` integration**: [`MailLayer`] registers any [`Transport`] with
//!   `tracing-subscriber`
//!
//! ## Quick Start
//!
//! ```ignore
//! use logmail::{MailLayer, MailOptions, MailTransport};
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), logmail::ConfigError> {
//!     let transport = MailTransport::new(
//!         MailOptions::default()
//!             .to("oncall@example.com")
//!             .from("app@example.com")
//!             .level("error")
//!             .subject("[{{level}}] {{message}}"),
//!     )?;
//!
//!     tracing_subscriber::registry()
//!         .with(tracing_subscriber::fmt::layer())
//!         .with(MailLayer::new(transport))
//!         .init();
//!
//!     tracing::error!(disk = "/var", "disk full");
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`event`]: Log events, metadata and calling conventions
//! - [`format`]: Default subject and body rendering
//! - [`layer`]: `tracing-subscriber` registration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod event;
pub mod format;
pub mod layer;
mod options;
mod transport;

pub use error::{ConfigError, Result, SendError};
pub use event::{
    Callback, ErrorMeta, LogCall, LogEvent, LogInfo, Metadata, Outcome, SkipReason,
};
pub use layer::MailLayer;
pub use logmail_smtp::{MailClient, MemoryClient, SmtpConfig};
pub use options::{DEFAULT_FROM, DEFAULT_LEVEL, Filter, Formatter, MailOptions};
pub use transport::{MailTransport, Transport, TransportEvent};
