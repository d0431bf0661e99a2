//! Transport options and their resolved form.

use std::fmt;
use std::sync::Arc;

use logmail_smtp::{Mailbox, SmtpConfig, parse_mailbox};
use serde::{Deserialize, Deserializer};

use crate::error::{ConfigError, Result};
use crate::event::LogEvent;
use crate::format::DEFAULT_SUBJECT;

/// Sender used when none is configured.
pub const DEFAULT_FROM: &str = "logmail@localhost";

/// Minimum level used when none is configured.
pub const DEFAULT_LEVEL: &str = "info";

/// Predicate deciding whether an event is sent.
pub type Filter = Arc<dyn Fn(&LogEvent) -> bool + Send + Sync>;

/// Function producing the whole email body for an event.
pub type Formatter = Arc<dyn Fn(&LogEvent) -> String + Send + Sync>;

/// Options accepted by [`MailTransport`](crate::MailTransport).
///
/// Deserializes from any serde format; unrecognized keys are ignored and the
/// connection fields (`host`, `port`, `username`, `password`, `ssl`, `tls`,
/// `timeout`, `authentication`) pass straight through to [`SmtpConfig`].
/// `filter` and `formatter` are closures and can only be set in code.
///
/// ```ignore
/// let options = MailOptions::default()
///     .to("oncall@example.com")
///     .level("error")
///     .subject("[{{level}}] {{message}}");
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct MailOptions {
    /// Recipients. A string may hold several comma separated addresses.
    #[serde(deserialize_with = "recipients")]
    pub to: Vec<String>,
    /// Sender address.
    pub from: Option<String>,
    /// Minimum level, or the only level when `unique` is set.
    pub level: Option<String>,
    /// React to exactly `level` instead of everything at or above it.
    pub unique: bool,
    /// Handle events without sending anything.
    pub silent: bool,
    /// Subject template with `{{level}}` and `{{message}}` placeholders.
    pub subject: Option<String>,
    /// Attach the body as an HTML alternative.
    pub html: bool,
    /// Events for which this returns false are not sent.
    #[serde(skip)]
    pub filter: Option<Filter>,
    /// Replaces default body rendering.
    #[serde(skip)]
    pub formatter: Option<Formatter>,
    /// Connection parameters for the mail client.
    #[serde(flatten)]
    pub smtp: SmtpConfig,
}

impl fmt::Debug for MailOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailOptions")
            .field("to", &self.to)
            .field("from", &self.from)
            .field("level", &self.level)
            .field("unique", &self.unique)
            .field("silent", &self.silent)
            .field("subject", &self.subject)
            .field("html", &self.html)
            .field("filter", &self.filter.is_some())
            .field("formatter", &self.formatter.is_some())
            .field("smtp", &self.smtp)
            .finish()
    }
}

impl MailOptions {
    /// Adds recipients; a comma separated list adds each address.
    #[must_use]
    pub fn to(mut self, addresses: &str) -> Self {
        self.to.extend(split_addresses(addresses));
        self
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.from = Some(address.into());
        self
    }

    /// Sets the minimum level.
    #[must_use]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Restricts sending to exactly the configured level.
    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Suppresses sending.
    #[must_use]
    pub const fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Sets the subject template.
    #[must_use]
    pub fn subject(mut self, template: impl Into<String>) -> Self {
        self.subject = Some(template.into());
        self
    }

    /// Attaches the body as an HTML alternative.
    #[must_use]
    pub const fn html(mut self, html: bool) -> Self {
        self.html = html;
        self
    }

    /// Sets the filter predicate.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&LogEvent) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Sets the body formatter.
    #[must_use]
    pub fn formatter(
        mut self,
        formatter: impl Fn(&LogEvent) -> String + Send + Sync + 'static,
    ) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Sets the mail client connection parameters.
    #[must_use]
    pub fn smtp(mut self, smtp: SmtpConfig) -> Self {
        self.smtp = smtp;
        self
    }
}

/// Options with defaults applied and addresses parsed.
#[derive(Clone)]
pub(crate) struct Settings {
    pub to: Vec<Mailbox>,
    pub from: Mailbox,
    pub level: String,
    pub unique: bool,
    pub silent: bool,
    pub subject: String,
    pub html: bool,
    pub filter: Option<Filter>,
    pub formatter: Option<Formatter>,
}

impl Settings {
    pub fn resolve(options: &MailOptions) -> Result<Self> {
        if options.to.is_empty() {
            return Err(ConfigError::MissingRecipient);
        }

        let to = options
            .to
            .iter()
            .map(|address| parse_mailbox(address))
            .collect::<logmail_smtp::Result<Vec<_>>>()
            .map_err(|source| ConfigError::InvalidAddress { field: "to", source })?;

        let from = parse_mailbox(options.from.as_deref().unwrap_or(DEFAULT_FROM))
            .map_err(|source| ConfigError::InvalidAddress {
                field: "from",
                source,
            })?;

        Ok(Self {
            to,
            from,
            level: options
                .level
                .clone()
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            unique: options.unique,
            silent: options.silent,
            subject: options
                .subject
                .clone()
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            html: options.html,
            filter: options.filter.clone(),
            formatter: options.formatter.clone(),
        })
    }
}

fn split_addresses(addresses: &str) -> impl Iterator<Item = String> + '_ {
    addresses
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(ToString::to_string)
}

fn recipients<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Recipients {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Recipients::deserialize(deserializer)? {
        Recipients::One(list) => split_addresses(&list).collect(),
        Recipients::Many(items) => items
            .iter()
            .flat_map(|item| split_addresses(item))
            .collect(),
    })
}
