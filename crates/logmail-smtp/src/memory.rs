//! In-memory mail client for tests and dry runs.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::client::MailClient;
use crate::error::{Error, Result};
use crate::message::Email;

/// Mail client that records emails instead of delivering them.
///
/// Clones share the same mailbox, so a test can keep one handle while the
/// code under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    sent: Arc<Mutex<Vec<Email>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MemoryClient {
    /// Creates an empty client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following send fail with an SMTP error carrying `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    /// Lets sends succeed again.
    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns the emails accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Email> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the most recently accepted email.
    #[must_use]
    pub fn last(&self) -> Option<Email> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    /// Forgets recorded emails.
    pub fn clear(&self) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl MailClient for MemoryClient {
    async fn send(&self, email: &Email) -> Result<()> {
        if let Some(message) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(Error::Smtp(message));
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_mailbox;

    fn email(subject: &str) -> Email {
        Email::builder()
            .from(parse_mailbox("logs@example.com").unwrap())
            .to(parse_mailbox("dev@example.com").unwrap())
            .subject(subject)
            .text("body")
            .build()
            .unwrap()
    }

    #[test]
    fn test_records_sent() {
        let client = MemoryClient::new();
        let handle = client.clone();

        tokio_test::block_on(client.send(&email("first"))).unwrap();
        tokio_test::block_on(client.send(&email("second"))).unwrap();

        assert_eq!(handle.sent().len(), 2);
        assert_eq!(handle.last().unwrap().subject, "second");

        handle.clear();
        assert!(client.sent().is_empty());
    }

    #[test]
    fn test_failure_toggle() {
        let client = MemoryClient::new();
        client.fail_with("connection refused");

        let err = tokio_test::block_on(client.send(&email("lost"))).unwrap_err();
        assert!(matches!(err, Error::Smtp(ref m) if m == "connection refused"));
        assert!(client.sent().is_empty());

        client.recover();
        tokio_test::block_on(client.send(&email("kept"))).unwrap();
        assert_eq!(client.sent().len(), 1);
    }
}
