//! Registration of a [`Transport`] with `tracing-subscriber`.
//!
//! ```ignore
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let transport = MailTransport::new(MailOptions::default().to("oncall@example.com"))?;
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(MailLayer::new(transport))
//!     .init();
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::event::{ErrorMeta, LogCall, LogInfo, Metadata};
use crate::transport::Transport;

/// Crates whose own diagnostics must never be mailed.
const OWN_CRATES: [&str; 2] = ["logmail", "logmail_smtp"];

/// Fields added by `tracing-log` when bridging `log` records.
const LOG_BRIDGE_PREFIX: &str = "log.";

/// A `tracing-subscriber` layer forwarding events to a [`Transport`].
///
/// Events less severe than the transport's level are dropped here, as are
/// all events while the transport is silent.
#[derive(Debug, Clone)]
pub struct MailLayer<T> {
    transport: T,
}

impl<T: Transport> MailLayer<T> {
    /// Wraps a transport.
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The wrapped transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Least severe level forwarded. Unknown level names mean `info`.
    pub fn threshold(&self) -> Level {
        Level::from_str(self.transport.level()).unwrap_or(Level::INFO)
    }
}

impl<S, T> Layer<S> for MailLayer<T>
where
    S: Subscriber,
    T: Transport,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        if is_own_target(metadata.target()) || self.transport.silent() {
            return;
        }
        if *metadata.level() > self.threshold() {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let info = visitor.into_info(metadata.level().as_str().to_ascii_lowercase());
        self.transport.log(LogCall::info(info, |_| {}));
    }
}

/// Whether `target` is one of [`OWN_CRATES`] or a module inside one.
fn is_own_target(target: &str) -> bool {
    OWN_CRATES.iter().any(|krate| {
        target
            .strip_prefix(krate)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Collects an event's fields into a message and metadata.
#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
    error: Option<(String, ErrorMeta)>,
}

impl EventVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name.starts_with(LOG_BRIDGE_PREFIX) {
            return;
        }
        self.fields.insert(name.to_string(), value);
    }

    fn into_info(self, level: String) -> LogInfo {
        let mut fields = self.fields;

        let meta = match self.error {
            Some((_, err)) if fields.is_empty() => Some(Metadata::Error(err)),
            Some((name, err)) => {
                fields.insert(name, Metadata::Error(err).to_value());
                Some(Metadata::Value(Value::Object(fields)))
            }
            None if fields.is_empty() => None,
            None => Some(Metadata::Value(Value::Object(fields))),
        };

        LogInfo {
            level,
            message: self.message.unwrap_or_default(),
            meta,
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(text);
        } else {
            self.insert(field, Value::String(text));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let reduced = ErrorMeta::from_dyn(value);
        if let Some((name, previous)) = self.error.replace((field.name().to_string(), reduced)) {
            self.fields
                .insert(name, Metadata::Error(previous).to_value());
        }
    }
}
