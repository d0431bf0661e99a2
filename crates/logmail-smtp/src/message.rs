//! Email payload and its conversion into a wire message.

use lettre::Message;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};

use crate::error::{Error, Result};

/// Parses a single address (`user@host` or `Name <user@host>`).
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] if the address does not parse.
pub fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|e| Error::InvalidAddress(format!("{address}: {e}")))
}

/// An email ready to be handed to a [`MailClient`](crate::MailClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    /// Sender.
    pub from: Mailbox,
    /// Recipients.
    pub to: Vec<Mailbox>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text: String,
    /// HTML alternative of the body.
    pub html: Option<String>,
}

impl Email {
    /// Create a new email builder.
    #[must_use]
    pub fn builder() -> EmailBuilder {
        EmailBuilder::default()
    }

    /// Recipients joined for display and logging.
    #[must_use]
    pub fn recipients(&self) -> String {
        self.to
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Builds the RFC 5322 message.
    ///
    /// A body with an HTML alternative becomes `multipart/alternative`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Build`] if the message cannot be assembled.
    pub fn to_message(&self) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(self.subject.as_str());

        for mailbox in &self.to {
            builder = builder.to(mailbox.clone());
        }

        let message = match &self.html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                self.text.clone(),
                html.clone(),
            ))?,
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(self.text.clone())?,
        };

        Ok(message)
    }
}

/// Builder for constructing [`Email`] instances.
#[derive(Debug, Default)]
pub struct EmailBuilder {
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    subject: String,
    text: String,
    html: Option<String>,
}

impl EmailBuilder {
    /// Set the sender.
    #[must_use]
    pub fn from(mut self, mailbox: Mailbox) -> Self {
        self.from = Some(mailbox);
        self
    }

    /// Add a recipient.
    #[must_use]
    pub fn to(mut self, mailbox: Mailbox) -> Self {
        self.to.push(mailbox);
        self
    }

    /// Add several recipients.
    #[must_use]
    pub fn to_many(mut self, mailboxes: impl IntoIterator<Item = Mailbox>) -> Self {
        self.to.extend(mailboxes);
        self
    }

    /// Set the subject line.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the plain text body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Attach an HTML alternative.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Build the email, validating required fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Build`] if the sender or every recipient is missing.
    pub fn build(self) -> Result<Email> {
        let from = self
            .from
            .ok_or_else(|| Error::Build("sender required".into()))?;

        if self.to.is_empty() {
            return Err(Error::Build("at least one recipient required".into()));
        }

        Ok(Email {
            from,
            to: self.to,
            subject: self.subject,
            text: self.text,
            html: self.html,
        })
    }
}
