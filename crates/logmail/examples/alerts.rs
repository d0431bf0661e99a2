//! Example: mail every error-level event to an on-call address.
//!
//! Options are read as JSON from the file named by `LOGMAIL_CONFIG`, e.g.
//!
//! ```json
//! {
//!   "to": "oncall@example.com",
//!   "from": "alerts@example.com",
//!   "level": "error",
//!   "host": "smtp.example.com",
//!   "tls": true,
//!   "username": "alerts@example.com",
//!   "password": "app-password"
//! }
//! ```
//!
//! Console output honours `RUST_LOG` as usual.
//!
//! Run with: `LOGMAIL_CONFIG=alerts.json cargo run --example alerts`

use std::time::Duration;

use anyhow::Context;
use logmail::{MailLayer, MailOptions, MailTransport, TransportEvent};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var("LOGMAIL_CONFIG").context("LOGMAIL_CONFIG is not set")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let options: MailOptions = serde_json::from_str(&raw).context("parsing mail options")?;

    let transport = MailTransport::new(options.subject("[{{level}}] {{message}}"))?;
    let mut signals = transport.subscribe();

    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(EnvFilter::from_default_env()))
        .with(MailLayer::new(transport))
        .init();

    tracing::info!("alerts example started");
    tracing::error!(job = "nightly-backup", exit_code = 2, "backup failed");

    // Wait for the send to settle before the runtime shuts down.
    match tokio::time::timeout(Duration::from_secs(30), signals.recv()).await {
        Ok(Ok(TransportEvent::Logged { level })) => println!("mailed {level} event"),
        Ok(Ok(TransportEvent::Error(err))) => println!("delivery failed: {err}"),
        Ok(Err(err)) => println!("signal channel closed: {err}"),
        Err(_) => println!("timed out waiting for delivery"),
    }

    Ok(())
}
