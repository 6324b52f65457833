use crate::types::{AssetFeed, SERVICE_ASSET_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EnforceInternalIngress,
    UpsertFinding,
    DeactivateFinding,
}

/// Map one asset feed to the remediation steps it requires. Pure; the handler
/// owns all side effects.
pub fn classify(feed: &AssetFeed) -> Vec<Action> {
    if feed.asset.asset_type == SERVICE_ASSET_TYPE {
        return vec![Action::EnforceInternalIngress];
    }
    if feed.iap_enabled() {
        vec![Action::DeactivateFinding]
    } else {
        vec![Action::EnforceInternalIngress, Action::UpsertFinding]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Asset, IapSettings, Resource, ResourceData};

    fn feed(asset_type: &str, iap: Option<IapSettings>) -> AssetFeed {
        AssetFeed {
            asset: Asset {
                asset_type: asset_type.into(),
                resource: Resource {
                    data: ResourceData {
                        iap,
                        ..Default::default()
                    },
                },
                ..Default::default()
            },
        }
    }

    #[test]
    fn service_asset_only_enforces_ingress() {
        let actions = classify(&feed(SERVICE_ASSET_TYPE, None));
        assert_eq!(actions, vec![Action::EnforceInternalIngress]);
        // Same even when the service carries an iap block.
        let actions = classify(&feed(
            SERVICE_ASSET_TYPE,
            Some(IapSettings { enabled: Some(true) }),
        ));
        assert_eq!(actions, vec![Action::EnforceInternalIngress]);
    }

    #[test]
    fn iap_enabled_deactivates_finding() {
        let actions = classify(&feed(
            "appengine.googleapis.com/Application",
            Some(IapSettings { enabled: Some(true) }),
        ));
        assert_eq!(actions, vec![Action::DeactivateFinding]);
    }

    #[test]
    fn iap_not_enabled_shapes_are_indistinguishable() {
        let shapes = [
            None,
            Some(IapSettings { enabled: None }),
            Some(IapSettings { enabled: Some(false) }),
        ];
        for iap in shapes {
            let actions = classify(&feed("appengine.googleapis.com/Application", iap));
            assert_eq!(
                actions,
                vec![Action::EnforceInternalIngress, Action::UpsertFinding]
            );
        }
    }
}
