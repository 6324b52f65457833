use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const SERVICE_ASSET_TYPE: &str = "appengine.googleapis.com/Service";

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("static pattern"));

/// One asset-change message as published by the inventory feed. Everything is
/// defaulted: an absent field means "not configured", never a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetFeed {
    pub asset: Asset,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Asset {
    pub name: String,
    pub asset_type: String,
    pub resource: Resource,
    pub ancestors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub data: ResourceData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceData {
    pub name: Option<String>,
    pub id: Option<String>,
    pub iap: Option<IapSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IapSettings {
    pub enabled: Option<bool>,
}

impl AssetFeed {
    /// IAP counts as enabled only on an explicit `enabled: true`. A missing
    /// `iap` block, a missing `enabled` key, and `false` are all the same.
    pub fn iap_enabled(&self) -> bool {
        self.asset
            .resource
            .data
            .iap
            .as_ref()
            .and_then(|iap| iap.enabled)
            .unwrap_or(false)
    }

    /// The application the networking API is addressed with.
    ///
    /// A Service asset names `apps/{project}/services/{service}`, so the app
    /// is rebuilt from the project segment. Any other asset's resource name
    /// already is the app path. Without a name, fall back to the resource id.
    pub fn app_path(&self) -> String {
        let data = &self.asset.resource.data;
        match data.name.as_deref() {
            Some(name) if self.asset.asset_type == SERVICE_ASSET_TYPE => {
                let project = name.split('/').nth(1).unwrap_or_default();
                format!("apps/{project}")
            }
            Some(name) => name.to_string(),
            None => format!("apps/{}", data.id.as_deref().unwrap_or_default()),
        }
    }

    /// Stable finding key: the resource id with everything outside `[\w\s]`
    /// stripped.
    pub fn finding_id(&self) -> Option<String> {
        self.asset
            .resource
            .data
            .id
            .as_deref()
            .map(|id| NON_WORD.replace_all(id, "").into_owned())
    }

    /// First `organizations/` entry among the asset's ancestors.
    pub fn organization(&self) -> Option<&str> {
        self.asset
            .ancestors
            .iter()
            .map(String::as_str)
            .find(|a| a.starts_with("organizations/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(asset_type: &str, name: Option<&str>, id: Option<&str>) -> AssetFeed {
        AssetFeed {
            asset: Asset {
                name: "//appengine.googleapis.com/apps/proj-1".into(),
                asset_type: asset_type.into(),
                resource: Resource {
                    data: ResourceData {
                        name: name.map(str::to_string),
                        id: id.map(str::to_string),
                        iap: None,
                    },
                },
                ancestors: vec!["projects/111".into(), "organizations/123".into()],
            },
        }
    }

    #[test]
    fn app_path_from_service_name_uses_project_segment() {
        let f = feed(SERVICE_ASSET_TYPE, Some("apps/proj-1/services/default"), None);
        assert_eq!(f.app_path(), "apps/proj-1");
    }

    #[test]
    fn app_path_from_other_asset_uses_name_verbatim() {
        let f = feed("appengine.googleapis.com/Application", Some("apps/proj-1"), None);
        assert_eq!(f.app_path(), "apps/proj-1");
    }

    #[test]
    fn app_path_without_name_falls_back_to_id() {
        let f = feed("appengine.googleapis.com/Application", None, Some("proj-1"));
        assert_eq!(f.app_path(), "apps/proj-1");
    }

    #[test]
    fn finding_id_strips_non_word_characters() {
        let f = feed("appengine.googleapis.com/Application", None, Some("s~my-app.123!"));
        assert_eq!(f.finding_id().unwrap(), "smyapp123");
    }

    #[test]
    fn finding_id_absent_without_resource_id() {
        let f = feed("appengine.googleapis.com/Application", None, None);
        assert!(f.finding_id().is_none());
    }

    #[test]
    fn organization_picks_first_org_ancestor() {
        let f = feed("appengine.googleapis.com/Application", None, None);
        assert_eq!(f.organization(), Some("organizations/123"));
    }
}
