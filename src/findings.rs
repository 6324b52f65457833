//! Security Command Center client and the finding lifecycle operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::auth::TokenProvider;
use crate::error::RemoteError;
use crate::http;
use crate::types::AssetFeed;

pub const FINDING_CATEGORY: &str = "APP_ENGINE_IAP_DISABLED";

const API: &str = "securitycenter";
const REACTIVATE_MASK: &str = "eventTime,state,severity,findingClass";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingState {
    #[default]
    StateUnspecified,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    SeverityUnspecified,
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingClass {
    #[default]
    FindingClassUnspecified,
    Threat,
    Vulnerability,
    Misconfiguration,
    Observation,
    SccError,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Finding {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resource_name: String,
    pub state: FindingState,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<DateTime<Utc>>,
    pub severity: Severity,
    pub finding_class: FindingClass,
}

impl Finding {
    fn active(name: String, resource_name: String) -> Self {
        Finding {
            name,
            resource_name,
            state: FindingState::Active,
            category: FINDING_CATEGORY.into(),
            event_time: Some(Utc::now()),
            severity: Severity::High,
            finding_class: FindingClass::Vulnerability,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Source {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListSourcesResponse {
    sources: Vec<Source>,
    next_page_token: Option<String>,
}

/// Outcome of the idempotent upsert: either the finding was freshly created,
/// or it already existed and was flipped back to ACTIVE.
#[derive(Debug)]
pub enum FindingUpsert {
    Created(Finding),
    Reactivated(Finding),
}

pub struct SccClient {
    http: reqwest::Client,
    base: String,
    token: Arc<dyn TokenProvider>,
    source_display_name: String,
}

impl SccClient {
    pub fn new(
        base: &str,
        token: Arc<dyn TokenProvider>,
        source_display_name: &str,
    ) -> Result<Self, RemoteError> {
        Ok(SccClient {
            http: http::client()?,
            base: base.trim_end_matches('/').to_string(),
            token,
            source_display_name: source_display_name.to_string(),
        })
    }

    /// Find the well-known finding source under the organization.
    pub async fn locate_source(&self, organization: &str) -> Result<Source, RemoteError> {
        let mut page_token: Option<String> = None;
        loop {
            let mut req = self
                .http
                .get(format!("{}/v1/{}/sources", self.base, organization))
                .bearer_auth(self.token.access_token().await?);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token)]);
            }
            let resp = req.send().await.map_err(http::transport(API))?;
            let page: ListSourcesResponse = http::check(API, resp)
                .await?
                .json()
                .await
                .map_err(http::transport(API))?;
            if let Some(source) = page
                .sources
                .into_iter()
                .find(|s| s.display_name == self.source_display_name)
            {
                return Ok(source);
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => {
                    return Err(RemoteError::SourceNotFound(
                        self.source_display_name.clone(),
                        organization.to_string(),
                    ))
                }
            }
        }
    }

    async fn create_finding(
        &self,
        source: &str,
        finding_id: &str,
        finding: &Finding,
    ) -> Result<Finding, RemoteError> {
        let resp = self
            .http
            .post(format!("{}/v1/{}/findings", self.base, source))
            .query(&[("findingId", finding_id)])
            .bearer_auth(self.token.access_token().await?)
            .json(finding)
            .send()
            .await
            .map_err(http::transport(API))?;
        http::check(API, resp)
            .await?
            .json()
            .await
            .map_err(http::transport(API))
    }

    async fn update_finding(&self, finding: &Finding, mask: &str) -> Result<Finding, RemoteError> {
        let resp = self
            .http
            .patch(format!("{}/v1/{}", self.base, finding.name))
            .query(&[("updateMask", mask)])
            .bearer_auth(self.token.access_token().await?)
            .json(finding)
            .send()
            .await
            .map_err(http::transport(API))?;
        http::check(API, resp)
            .await?
            .json()
            .await
            .map_err(http::transport(API))
    }

    async fn set_finding_state(
        &self,
        name: &str,
        state: FindingState,
    ) -> Result<Finding, RemoteError> {
        let body = json!({ "state": state, "startTime": Utc::now() });
        let resp = self
            .http
            .post(format!("{}/v1/{}:setState", self.base, name))
            .bearer_auth(self.token.access_token().await?)
            .json(&body)
            .send()
            .await
            .map_err(http::transport(API))?;
        http::check(API, resp)
            .await?
            .json()
            .await
            .map_err(http::transport(API))
    }
}

fn derived_ids(feed: &AssetFeed) -> Result<(&str, String), RemoteError> {
    let organization = feed
        .organization()
        .ok_or_else(|| RemoteError::NoOrganizationAncestor(feed.asset.name.clone()))?;
    let finding_id = feed.finding_id().ok_or(RemoteError::MissingResourceId)?;
    Ok((organization, finding_id))
}

/// Create the ACTIVE finding for the asset, or, when one with the derived id
/// already exists, fall back to reactivating it.
pub async fn upsert_active(
    client: &SccClient,
    feed: &AssetFeed,
) -> Result<FindingUpsert, RemoteError> {
    let (organization, finding_id) = derived_ids(feed)?;
    let source = client.locate_source(organization).await?;
    let finding = Finding::active(String::new(), feed.asset.name.clone());
    match client.create_finding(&source.name, &finding_id, &finding).await {
        Ok(created) => {
            info!(finding = %created.name, "created finding");
            Ok(FindingUpsert::Created(created))
        }
        Err(e) if e.is_conflict() => {
            error!("finding {finding_id} already exists, activating finding state if inactive");
            let updated = reactivate_under(client, &source, &finding_id, feed).await?;
            Ok(FindingUpsert::Reactivated(updated))
        }
        Err(e) => Err(e),
    }
}

/// Flip an existing finding back to ACTIVE with a full replace over the
/// reactivation field mask. Idempotent on an already-active finding.
pub async fn reactivate(client: &SccClient, feed: &AssetFeed) -> Result<Finding, RemoteError> {
    let (organization, finding_id) = derived_ids(feed)?;
    let source = client.locate_source(organization).await?;
    reactivate_under(client, &source, &finding_id, feed).await
}

async fn reactivate_under(
    client: &SccClient,
    source: &Source,
    finding_id: &str,
    feed: &AssetFeed,
) -> Result<Finding, RemoteError> {
    let name = format!("{}/findings/{}", source.name, finding_id);
    let finding = Finding::active(name, feed.asset.name.clone());
    let updated = client.update_finding(&finding, REACTIVATE_MASK).await?;
    info!(finding = %updated.name, "finding is now active");
    Ok(updated)
}

/// Mark the asset's finding INACTIVE as of now.
pub async fn deactivate(client: &SccClient, feed: &AssetFeed) -> Result<Finding, RemoteError> {
    let (organization, finding_id) = derived_ids(feed)?;
    let source = client.locate_source(organization).await?;
    let name = format!("{}/findings/{}", source.name, finding_id);
    let updated = client.set_finding_state(&name, FindingState::Inactive).await?;
    info!(finding = %updated.name, "finding is now inactive");
    Ok(updated)
}
