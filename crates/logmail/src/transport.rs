//! The mail transport and the contract hosts register transports through.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use logmail_smtp::{Email, MailClient, SmtpClient};
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::error::{Result, SendError};
use crate::event::{Callback, LogCall, LogEvent, Outcome, SkipReason};
use crate::format::{render_body, render_subject};
use crate::options::{MailOptions, Settings};

/// Buffered signals per subscriber before the slowest one starts lagging.
const SIGNAL_CAPACITY: usize = 64;

/// What a logging host needs from a transport.
///
/// The host owns the level hierarchy: it only calls [`log`](Self::log) for
/// events at or above [`level`](Self::level), and may skip silent transports
/// entirely.
pub trait Transport: Send + Sync + 'static {
    /// Name the transport is registered under.
    fn name(&self) -> &str;

    /// Minimum level the transport wants to see.
    fn level(&self) -> &str;

    /// Whether the transport currently discards everything.
    fn silent(&self) -> bool;

    /// Handles one event. Must not block; completion is reported through the
    /// callback carried by `call`.
    fn log(&self, call: LogCall);
}

/// Signals emitted by [`MailTransport`] to its subscribers.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// An event went through the send step, successfully or not.
    Logged {
        /// Level of the event.
        level: String,
    },
    /// The mail client failed to deliver an email.
    Error(Arc<SendError>),
}

/// Transport that turns log events into emails.
///
/// Cloning is cheap and clones share configuration, mail client and
/// subscribers.
#[derive(Clone)]
pub struct MailTransport {
    inner: Arc<Inner>,
}

struct Inner {
    settings: Settings,
    client: Arc<dyn MailClient>,
    signals: broadcast::Sender<TransportEvent>,
}

impl fmt::Debug for MailTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = &self.inner.settings;
        f.debug_struct("MailTransport")
            .field("to", &settings.to)
            .field("from", &settings.from)
            .field("level", &settings.level)
            .field("unique", &settings.unique)
            .field("silent", &settings.silent)
            .finish_non_exhaustive()
    }
}

impl MailTransport {
    /// Name every mail transport registers under.
    pub const NAME: &'static str = "mail";

    /// Creates a transport delivering over SMTP with the connection
    /// parameters in `options.smtp`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::ConfigError) if no recipient is
    /// configured, an address does not parse, or the SMTP client cannot be
    /// built.
    pub fn new(options: MailOptions) -> Result<Self> {
        let settings = Settings::resolve(&options)?;
        let client = SmtpClient::from_config(&options.smtp)?;
        Ok(Self::from_parts(settings, Arc::new(client)))
    }

    /// Creates a transport delivering through `client`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`](crate::ConfigError) if no recipient is
    /// configured or an address does not parse.
    pub fn with_client(options: MailOptions, client: impl MailClient) -> Result<Self> {
        let settings = Settings::resolve(&options)?;
        Ok(Self::from_parts(settings, Arc::new(client)))
    }

    fn from_parts(settings: Settings, client: Arc<dyn MailClient>) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        tracing::debug!(
            recipients = settings.to.len(),
            level = %settings.level,
            unique = settings.unique,
            silent = settings.silent,
            "Created mail transport"
        );
        Self {
            inner: Arc::new(Inner {
                settings,
                client,
                signals,
            }),
        }
    }

    /// Subscribes to [`TransportEvent`]s emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.inner.signals.subscribe()
    }

    /// Runs one event through the transport and resolves once it settles.
    ///
    /// [`Transport::log`] runs the same checks before spawning the send;
    /// hosts that are already async can await this directly.
    pub async fn dispatch(&self, event: LogEvent) -> Outcome {
        if let Some(reason) = self.skip_reason(&event) {
            tracing::debug!(level = %event.level, ?reason, "Skipped log email");
            return Outcome::Skipped(reason);
        }
        self.deliver(event).await
    }

    /// Sends an event that already passed the skip checks.
    async fn deliver(&self, event: LogEvent) -> Outcome {
        let sent = match self.build_email(&event) {
            Ok(email) => self.inner.client.send(&email).await,
            Err(err) => Err(err),
        };

        let outcome = match sent {
            Ok(()) => {
                tracing::debug!(level = %event.level, "Sent log email");
                Outcome::Delivered
            }
            Err(err) => {
                tracing::warn!(level = %event.level, error = %err, "Failed to send log email");
                self.emit(TransportEvent::Error(Arc::new(err)));
                Outcome::Undelivered
            }
        };

        self.emit(TransportEvent::Logged { level: event.level });
        outcome
    }

    fn skip_reason(&self, event: &LogEvent) -> Option<SkipReason> {
        let settings = &self.inner.settings;

        if settings.silent {
            return Some(SkipReason::Silent);
        }
        if settings.unique && event.level != settings.level {
            return Some(SkipReason::Level);
        }
        if let Some(filter) = &settings.filter
            && !filter(event)
        {
            return Some(SkipReason::Filtered);
        }
        None
    }

    fn build_email(&self, event: &LogEvent) -> logmail_smtp::Result<Email> {
        let settings = &self.inner.settings;

        let body = match &settings.formatter {
            Some(formatter) => formatter(event),
            None => render_body(event),
        };

        let mut builder = Email::builder()
            .from(settings.from.clone())
            .to_many(settings.to.iter().cloned())
            .subject(render_subject(&settings.subject, event));

        if settings.html {
            builder = builder.html(body.clone());
        }

        builder.text(body).build()
    }

    fn emit(&self, signal: TransportEvent) {
        // No subscribers is fine.
        let _ = self.inner.signals.send(signal);
    }
}

impl Transport for MailTransport {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn level(&self) -> &str {
        &self.inner.settings.level
    }

    fn silent(&self) -> bool {
        self.inner.settings.silent
    }

    fn log(&self, call: LogCall) {
        let (event, callback) = call.normalize();

        if let Some(reason) = self.skip_reason(&event) {
            tracing::debug!(level = %event.level, ?reason, "Skipped log email");
            complete(callback, Outcome::Skipped(reason));
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            tracing::error!(level = %event.level, "No tokio runtime to send log email on");
            complete(callback, Outcome::Skipped(SkipReason::NoRuntime));
            return;
        };

        let transport = self.clone();
        runtime.spawn(async move {
            let outcome = transport.deliver(event).await;
            complete(callback, outcome);
        });
    }
}

/// Invokes a completion callback, containing any panic it raises.
fn complete(callback: Callback, outcome: Outcome) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(outcome))) {
        let reason = panic
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(%reason, ?outcome, "Log callback panicked");
    }
}
