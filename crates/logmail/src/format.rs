//! Default subject and body rendering.

use crate::event::{LogEvent, Metadata};

/// Subject template used when none is configured.
pub const DEFAULT_SUBJECT: &str = "logmail: {{level}} {{message}}";

/// Renders a subject template.
///
/// `{{level}}` becomes the event level and `{{message}}` (or `{{msg}}`) the
/// first line of the message. Other text is kept as is.
#[must_use]
pub fn render_subject(template: &str, event: &LogEvent) -> String {
    let mut subject = String::with_capacity(template.len() + event.message.len());
    let mut rest = template;

    // Inserted values are never scanned again.
    while let Some(start) = rest.find("{{") {
        subject.push_str(&rest[..start]);
        let tail = &rest[start..];
        match placeholder(tail, event) {
            Some((value, len)) => {
                subject.push_str(value);
                rest = &tail[len..];
            }
            None => {
                subject.push('{');
                rest = &tail[1..];
            }
        }
    }
    subject.push_str(rest);
    subject
}

/// Value and length of the placeholder `tail` starts with, if any.
fn placeholder<'a>(tail: &str, event: &'a LogEvent) -> Option<(&'a str, usize)> {
    [
        ("{{level}}", event.level.as_str()),
        ("{{message}}", event.first_line()),
        ("{{msg}}", event.first_line()),
    ]
    .into_iter()
    .find(|(name, _)| tail.starts_with(name))
    .map(|(name, value)| (value, name.len()))
}

/// Renders the default body: the message, then pretty-printed metadata
/// after a blank line when there is any.
#[must_use]
pub fn render_body(event: &LogEvent) -> String {
    match event.meta.as_ref().filter(|meta| !meta.is_empty()) {
        Some(meta) => format!("{}\n\n{}", event.message, pretty(meta)),
        None => event.message.clone(),
    }
}

fn pretty(meta: &Metadata) -> String {
    let value = meta.to_value();
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}
