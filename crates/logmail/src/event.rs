//! Log events and the two calling conventions that produce them.
//!
//! Hosts either pass the four pieces of a record separately
//! ([`LogCall::legacy`]) or bundle them into a [`LogInfo`]
//! ([`LogCall::info`]). Both are normalized into one [`LogEvent`] before
//! the transport looks at them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An error reduced to plain data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorMeta {
    /// Display text of the error.
    pub message: String,
    /// Short type name of the error.
    pub name: String,
    /// Chain of underlying causes, one per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorMeta {
    /// Reduces a concrete error, naming it after its type.
    pub fn of<E: std::error::Error + 'static>(err: &E) -> Self {
        let type_name = std::any::type_name::<E>();
        let base = type_name.split('<').next().unwrap_or(type_name);
        let name = base.rsplit("::").next().unwrap_or(base);
        Self::build(err, name.to_string())
    }

    /// Reduces a type-erased error.
    ///
    /// The name is taken from the leading identifier of its `Debug` output,
    /// which is the type or variant name for derived implementations.
    pub fn from_dyn(err: &(dyn std::error::Error + 'static)) -> Self {
        let debug = format!("{err:?}");
        let name: String = debug
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        let name = if name.is_empty() { "Error".to_string() } else { name };
        Self::build(err, name)
    }

    fn build(err: &(dyn std::error::Error + 'static), name: String) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        Self {
            message: err.to_string(),
            name,
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
        }
    }
}

/// Structured data attached to a log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metadata {
    /// An error value, already reduced.
    Error(ErrorMeta),
    /// Any other value.
    Value(Value),
}

impl Metadata {
    /// Wraps an error as metadata.
    pub fn error<E: std::error::Error + 'static>(err: &E) -> Self {
        Self::Error(ErrorMeta::of(err))
    }

    /// True for `null` and for objects or arrays without entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Error(_) => false,
            Self::Value(Value::Null) => true,
            Self::Value(Value::Object(map)) => map.is_empty(),
            Self::Value(Value::Array(items)) => items.is_empty(),
            Self::Value(_) => false,
        }
    }

    /// Plain JSON view of the metadata.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Error(err) => serde_json::to_value(err).unwrap_or(Value::Null),
            Self::Value(value) => value.clone(),
        }
    }
}

impl From<Value> for Metadata {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<ErrorMeta> for Metadata {
    fn from(err: ErrorMeta) -> Self {
        Self::Error(err)
    }
}

/// The consolidated record shape: level, message and metadata together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogInfo {
    /// Severity name.
    pub level: String,
    /// Log message.
    pub message: String,
    /// Attached metadata.
    #[serde(default, alias = "metadata", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Metadata>,
}

impl LogInfo {
    /// Creates a record without metadata.
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            message: message.into(),
            meta: None,
        }
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: impl Into<Metadata>) -> Self {
        self.meta = Some(meta.into());
        self
    }
}

/// A normalized log event, as seen by filters and formatters.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// Severity name.
    pub level: String,
    /// Log message.
    pub message: String,
    /// Attached metadata.
    pub meta: Option<Metadata>,
    /// When the event reached the transport.
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// Creates an event stamped with the current time.
    pub fn new(level: impl Into<String>, message: impl Into<String>, meta: Option<Metadata>) -> Self {
        Self {
            level: level.into(),
            message: message.into(),
            meta,
            timestamp: Utc::now(),
        }
    }

    /// Message text up to the first line break.
    #[must_use]
    pub fn first_line(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }
}

impl From<LogInfo> for LogEvent {
    fn from(info: LogInfo) -> Self {
        Self::new(info.level, info.message, info.meta)
    }
}

/// Why an event was handled without sending anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The transport is silent.
    Silent,
    /// Unique mode and the level differs from the configured one.
    Level,
    /// The filter rejected the event.
    Filtered,
    /// No async runtime was available to send on.
    NoRuntime,
}

/// Result handed to a completion callback.
///
/// Every outcome means the event was handled; a failed delivery is reported
/// to observers through signals, never to the caller as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was sent.
    Skipped(SkipReason),
    /// The mail client accepted the email.
    Delivered,
    /// The mail client failed; an error signal was emitted.
    Undelivered,
}

impl Outcome {
    /// True if an email was accepted by the mail client.
    #[must_use]
    pub const fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Completion callback invoked once an event has been handled.
pub type Callback = Box<dyn FnOnce(Outcome) + Send + 'static>;

/// One invocation of a transport's log entrypoint.
pub enum LogCall {
    /// Level, message, metadata and callback passed separately.
    Legacy {
        /// Severity name.
        level: String,
        /// Log message.
        message: String,
        /// Attached metadata.
        meta: Option<Metadata>,
        /// Completion callback.
        callback: Callback,
    },
    /// A consolidated record plus callback.
    Info {
        /// The record.
        info: LogInfo,
        /// Completion callback.
        callback: Callback,
    },
}

impl LogCall {
    /// Builds a call in the four-argument convention.
    pub fn legacy(
        level: impl Into<String>,
        message: impl Into<String>,
        meta: Option<Metadata>,
        callback: impl FnOnce(Outcome) + Send + 'static,
    ) -> Self {
        Self::Legacy {
            level: level.into(),
            message: message.into(),
            meta,
            callback: Box::new(callback),
        }
    }

    /// Builds a call in the consolidated convention.
    pub fn info(info: LogInfo, callback: impl FnOnce(Outcome) + Send + 'static) -> Self {
        Self::Info {
            info,
            callback: Box::new(callback),
        }
    }

    /// Splits the call into its event and callback.
    #[must_use]
    pub fn normalize(self) -> (LogEvent, Callback) {
        match self {
            Self::Legacy {
                level,
                message,
                meta,
                callback,
            } => (LogEvent::new(level, message, meta), callback),
            Self::Info { info, callback } => (LogEvent::from(info), callback),
        }
    }
}

impl fmt::Debug for LogCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy {
                level,
                message,
                meta,
                ..
            } => f
                .debug_struct("Legacy")
                .field("level", level)
                .field("message", message)
                .field("meta", meta)
                .finish_non_exhaustive(),
            Self::Info { info, .. } => f
                .debug_struct("Info")
                .field("info", info)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[derive(Debug, thiserror::Error)]
    #[error("write failed")]
    struct WriteFailed {
        #[source]
        cause: DiskFull,
    }

    #[test]
    fn test_error_meta_of() {
        let meta = ErrorMeta::of(&DiskFull);
        assert_eq!(meta.message, "disk full");
        assert_eq!(meta.name, "DiskFull");
        assert!(meta.stack.is_none());
    }

    #[test]
    fn test_error_meta_chain() {
        let meta = ErrorMeta::of(&WriteFailed { cause: DiskFull });
        assert_eq!(meta.name, "WriteFailed");
        assert_eq!(meta.stack.as_deref(), Some("caused by: disk full"));
    }

    #[test]
    fn test_error_meta_from_dyn() {
        let err: Box<dyn std::error::Error> = Box::new(DiskFull);
        let meta = ErrorMeta::from_dyn(err.as_ref());
        assert_eq!(meta.name, "DiskFull");
        assert_eq!(meta.message, "disk full");
    }

    #[test]
    fn test_metadata_is_empty() {
        assert!(Metadata::from(json!({})).is_empty());
        assert!(Metadata::from(json!([])).is_empty());
        assert!(Metadata::from(Value::Null).is_empty());
        assert!(!Metadata::from(json!({"a": 1})).is_empty());
        assert!(!Metadata::from(json!(0)).is_empty());
        assert!(!Metadata::from(json!("")).is_empty());
        assert!(!Metadata::error(&DiskFull).is_empty());
    }

    #[test]
    fn test_info_deserialize() {
        let info: LogInfo =
            serde_json::from_str(r#"{"level":"warn","message":"hot","meta":{"temp":92}}"#)
                .unwrap();
        assert_eq!(info.level, "warn");
        assert_eq!(info.meta, Some(Metadata::Value(json!({"temp": 92}))));

        let err: LogInfo = serde_json::from_str(
            r#"{"level":"error","message":"x","metadata":{"message":"boom","name":"Io"}}"#,
        )
        .unwrap();
        assert!(matches!(err.meta, Some(Metadata::Error(ref e)) if e.name == "Io"));
    }

    #[test]
    fn test_first_line() {
        let event = LogEvent::new("info", "first\nsecond", None);
        assert_eq!(event.first_line(), "first");

        let empty = LogEvent::new("info", "", None);
        assert_eq!(empty.first_line(), "");
    }

    #[test]
    fn test_normalize_both_conventions() {
        let (legacy, _) =
            LogCall::legacy("info", "hello", Some(json!({"a": 1}).into()), |_| {}).normalize();
        let (info, _) =
            LogCall::info(LogInfo::new("info", "hello").with_meta(json!({"a": 1})), |_| {})
                .normalize();

        assert_eq!(legacy.level, info.level);
        assert_eq!(legacy.message, info.message);
        assert_eq!(legacy.meta, info.meta);
    }

    #[test]
    fn test_normalize_keeps_callback() {
        let (tx, rx) = std::sync::mpsc::channel();
        let (_, callback) = LogCall::info(LogInfo::new("info", "x"), move |outcome| {
            tx.send(outcome).unwrap();
        })
        .normalize();

        callback(Outcome::Delivered);
        assert_eq!(rx.recv().unwrap(), Outcome::Delivered);
    }
}
