use reqwest::StatusCode;
use thiserror::Error;

/// The event cannot be used at all. Terminal for the invocation: the handler
/// logs it and exits cleanly instead of signalling the host to redeliver.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("no event received, or no data in event")]
    MissingPayload,

    #[error("cannot decode event data: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("event data not in JSON format: {0}")]
    Json(#[from] serde_json::Error),
}

/// A remote call or the state derived for one went wrong. Unless caught at a
/// narrower scope (per-service ingress updates, finding create conflicts),
/// these propagate and fail the invocation.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{api} returned HTTP {status}: {body}")]
    Status {
        api: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("request to {api} failed: {source}")]
    Transport {
        api: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("operation {name} did not complete: {detail}")]
    Operation { name: String, detail: String },

    #[error("asset {0} has no organizations/ ancestor")]
    NoOrganizationAncestor(String),

    #[error("no finding source with display name {0:?} under {1}")]
    SourceNotFound(String, String),

    #[error("asset resource data has no id field")]
    MissingResourceId,
}

impl RemoteError {
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RemoteError::Status {
                status: StatusCode::CONFLICT,
                ..
            }
        )
    }
}
