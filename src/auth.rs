use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Settings;
use crate::error::RemoteError;
use crate::http;

/// Where remote clients get their bearer token from. Each invocation builds a
/// fresh provider; nothing is cached across events.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, RemoteError>;
}

/// Fixed token handed in through the environment; local runs and tests.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, RemoteError> {
        Ok(self.0.clone())
    }
}

/// Ambient credentials from the hosting environment's metadata server.
pub struct MetadataToken {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl MetadataToken {
    pub fn new(endpoint: &str) -> Result<Self, RemoteError> {
        Ok(MetadataToken {
            http: http::client()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TokenProvider for MetadataToken {
    async fn access_token(&self) -> Result<String, RemoteError> {
        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.endpoint
        );
        let resp = self
            .http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(http::transport("metadata"))?;
        let token: TokenResponse = http::check("metadata", resp)
            .await?
            .json()
            .await
            .map_err(http::transport("metadata"))?;
        Ok(token.access_token)
    }
}

pub fn provider(settings: &Settings) -> Result<Arc<dyn TokenProvider>, RemoteError> {
    match &settings.access_token {
        Some(token) => Ok(Arc::new(StaticToken(token.clone()))),
        None => Ok(Arc::new(MetadataToken::new(&settings.metadata_endpoint)?)),
    }
}
