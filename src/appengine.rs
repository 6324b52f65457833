//! App Engine Admin API client and the internal-only ingress enforcement.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::auth::TokenProvider;
use crate::error::RemoteError;
use crate::http;
use crate::types::AssetFeed;

const API: &str = "appengine";
const OP_POLL_ATTEMPTS: usize = 20;
const OP_POLL_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IngressTraffic {
    #[default]
    #[serde(rename = "INGRESS_TRAFFIC_ALLOWED_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "INGRESS_TRAFFIC_ALLOWED_ALL")]
    All,
    #[serde(rename = "INGRESS_TRAFFIC_ALLOWED_INTERNAL_ONLY")]
    InternalOnly,
    #[serde(rename = "INGRESS_TRAFFIC_ALLOWED_INTERNAL_AND_LB")]
    InternalAndLb,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_traffic_allowed: Option<IngressTraffic>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_settings: Option<NetworkSettings>,
}

impl Service {
    pub fn internal_only(&self) -> bool {
        self.network_settings
            .as_ref()
            .and_then(|n| n.ingress_traffic_allowed)
            == Some(IngressTraffic::InternalOnly)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListServicesResponse {
    services: Vec<Service>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Operation {
    name: String,
    done: bool,
    error: Option<OperationStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OperationStatus {
    message: String,
}

pub struct ServicesClient {
    http: reqwest::Client,
    base: String,
    token: Arc<dyn TokenProvider>,
}

impl ServicesClient {
    pub fn new(base: &str, token: Arc<dyn TokenProvider>) -> Result<Self, RemoteError> {
        Ok(ServicesClient {
            http: http::client()?,
            base: base.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub async fn list_services(&self, app: &str) -> Result<Vec<Service>, RemoteError> {
        let mut services = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self
                .http
                .get(format!("{}/v1/{}/services", self.base, app))
                .bearer_auth(self.token.access_token().await?);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token)]);
            }
            let resp = req.send().await.map_err(http::transport(API))?;
            let page: ListServicesResponse = http::check(API, resp)
                .await?
                .json()
                .await
                .map_err(http::transport(API))?;
            services.extend(page.services);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(services),
            }
        }
    }

    pub async fn get_service(&self, name: &str) -> Result<Service, RemoteError> {
        let resp = self
            .http
            .get(format!("{}/v1/{}", self.base, name))
            .bearer_auth(self.token.access_token().await?)
            .send()
            .await
            .map_err(http::transport(API))?;
        http::check(API, resp)
            .await?
            .json()
            .await
            .map_err(http::transport(API))
    }

    /// Patch the service down to internal-only ingress, masked to the network
    /// settings field, and wait for the long-running operation to finish.
    pub async fn set_internal_only(&self, name: &str) -> Result<(), RemoteError> {
        let body = json!({
            "networkSettings": { "ingressTrafficAllowed": IngressTraffic::InternalOnly }
        });
        let resp = self
            .http
            .patch(format!("{}/v1/{}", self.base, name))
            .query(&[("updateMask", "networkSettings")])
            .bearer_auth(self.token.access_token().await?)
            .json(&body)
            .send()
            .await
            .map_err(http::transport(API))?;
        let op: Operation = http::check(API, resp)
            .await?
            .json()
            .await
            .map_err(http::transport(API))?;
        self.wait_operation(op).await
    }

    async fn wait_operation(&self, mut op: Operation) -> Result<(), RemoteError> {
        let mut attempts = 0;
        loop {
            if let Some(status) = op.error {
                return Err(RemoteError::Operation {
                    name: op.name,
                    detail: status.message,
                });
            }
            if op.done {
                return Ok(());
            }
            if attempts == OP_POLL_ATTEMPTS {
                return Err(RemoteError::Operation {
                    name: op.name,
                    detail: "timed out waiting for completion".into(),
                });
            }
            attempts += 1;
            tokio::time::sleep(Duration::from_millis(OP_POLL_MS)).await;
            let resp = self
                .http
                .get(format!("{}/v1/{}", self.base, op.name))
                .bearer_auth(self.token.access_token().await?)
                .send()
                .await
                .map_err(http::transport(API))?;
            op = http::check(API, resp)
                .await?
                .json()
                .await
                .map_err(http::transport(API))?;
        }
    }
}

/// Force every service under the asset's application to internal-only
/// ingress. Already-compliant services are skipped; a failed update on one
/// service is logged and does not stop the rest.
pub async fn enforce_internal_ingress(
    client: &ServicesClient,
    feed: &AssetFeed,
) -> Result<(), RemoteError> {
    let app = feed.app_path();
    for service in client.list_services(&app).await? {
        let current = client.get_service(&service.name).await?;
        if current.internal_only() {
            info!(service = %current.name, "service already has internal-only ingress");
            continue;
        }
        match client.set_internal_only(&current.name).await {
            Ok(()) => info!(service = %current.name, "updated service to internal-only ingress"),
            Err(e) => error!(service = %current.name, "error updating service: {e}"),
        }
    }
    Ok(())
}
