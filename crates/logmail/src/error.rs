//! Error types for the transport.

use thiserror::Error;

/// Failure to deliver an email, reported through
/// [`TransportEvent::Error`](crate::TransportEvent::Error).
pub type SendError = logmail_smtp::Error;

/// Errors that abort transport construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No recipient was configured.
    #[error("mail transport requires a 'to' address")]
    MissingRecipient,

    /// A configured address does not parse.
    #[error("invalid '{field}' address: {source}")]
    InvalidAddress {
        /// Option the address came from.
        field: &'static str,
        /// Parse failure.
        #[source]
        source: logmail_smtp::Error,
    },

    /// The mail client could not be built from the connection parameters.
    #[error("mail client error: {0}")]
    Client(#[from] logmail_smtp::Error),
}

/// Result type alias for transport construction.
pub type Result<T> = std::result::Result<T, ConfigError>;
