//! Error types for mail client operations.

/// Result type alias for mail client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Mail client error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Address could not be parsed as a mailbox.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message could not be assembled.
    #[error("Failed to build message: {0}")]
    Build(String),

    /// SMTP transport reported a failure.
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// Connection parameters are unusable.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if the failure happened before anything reached the network.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::InvalidAddress(_) | Self::Build(_) | Self::Config(_))
    }
}

impl From<lettre::transport::smtp::Error> for Error {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Smtp(err.to_string())
    }
}

impl From<lettre::error::Error> for Error {
    fn from(err: lettre::error::Error) -> Self {
        Self::Build(err.to_string())
    }
}
