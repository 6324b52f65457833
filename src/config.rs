use std::env;

pub const DEFAULT_SOURCE_DISPLAY_NAME: &str = "app_engine_iap_finding_source";

/// Runtime settings, all overridable through the environment. The endpoint
/// overrides let the same binary drive a local mock server in tests.
#[derive(Debug, Clone)]
pub struct Settings {
    pub appengine_endpoint: String,
    pub scc_endpoint: String,
    pub metadata_endpoint: String,
    pub source_display_name: String,
    pub access_token: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Settings {
            appengine_endpoint: env_or("APPENGINE_API_ENDPOINT", "https://appengine.googleapis.com"),
            scc_endpoint: env_or("SCC_API_ENDPOINT", "https://securitycenter.googleapis.com"),
            metadata_endpoint: env_or("METADATA_ENDPOINT", "http://metadata.google.internal"),
            source_display_name: env_or("FINDING_SOURCE_DISPLAY_NAME", DEFAULT_SOURCE_DISPLAY_NAME),
            access_token: env::var("GCP_ACCESS_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
