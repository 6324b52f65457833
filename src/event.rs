use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use tracing::info;

use crate::error::EventError;
use crate::types::AssetFeed;

/// Pub/Sub-style push envelope carrying one asset feed message.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

/// Decode and parse the envelope payload. No schema validation beyond
/// parseability: missing fields are handled downstream as "not enabled".
pub fn parse_event(event: &Envelope) -> Result<AssetFeed, EventError> {
    let payload = match event.data.as_deref() {
        Some(data) if !data.is_empty() => data,
        _ => return Err(EventError::MissingPayload),
    };
    info!("parsing event data");
    let bytes = BASE64.decode(payload).map_err(|e| {
        info!(payload = %payload, "received event data is not valid base64");
        EventError::from(e)
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        info!(data = %String::from_utf8_lossy(&bytes), "received event data is not valid JSON");
        EventError::from(e)
    })
}
