use std::io::Read;

use anyhow::{Context, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;

use iap_remediator::config::Settings;
use iap_remediator::event::Envelope;
use iap_remediator::handler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let raw = read_event().context("reading event payload")?;
    let envelope: Envelope = match serde_json::from_str(&raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            // Same policy as an undecodable payload: log and end cleanly.
            error!("event envelope not in JSON format: {e}");
            return Ok(());
        }
    };

    let settings = Settings::from_env();
    handler::run(&envelope, &settings).await?;
    Ok(())
}

fn read_event() -> Result<String> {
    match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("reading {path}")),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
