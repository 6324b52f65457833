use tracing::{error, info};

use crate::appengine::{self, ServicesClient};
use crate::auth;
use crate::classify::{classify, Action};
use crate::config::Settings;
use crate::error::RemoteError;
use crate::event::{parse_event, Envelope};
use crate::findings::{self, SccClient};

/// Process one asset-change envelope end to end.
///
/// A malformed event is logged and swallowed; the invocation still counts as
/// handled. Remote failures (other than the narrower cases the clients catch
/// themselves) propagate so the host can decide whether to redeliver.
pub async fn run(event: &Envelope, settings: &Settings) -> Result<(), RemoteError> {
    let feed = match parse_event(event) {
        Ok(feed) => feed,
        Err(e) => {
            error!("{e}");
            return Ok(());
        }
    };
    info!(
        asset = %feed.asset.name,
        asset_type = %feed.asset.asset_type,
        "processing asset change"
    );

    for action in classify(&feed) {
        match action {
            Action::EnforceInternalIngress => {
                let client =
                    ServicesClient::new(&settings.appengine_endpoint, auth::provider(settings)?)?;
                appengine::enforce_internal_ingress(&client, &feed).await?;
            }
            Action::UpsertFinding => {
                info!("IAP is not enabled on the application");
                let client = scc_client(settings)?;
                findings::upsert_active(&client, &feed).await?;
            }
            Action::DeactivateFinding => {
                info!("IAP is enabled on the application");
                let client = scc_client(settings)?;
                findings::deactivate(&client, &feed).await?;
            }
        }
    }
    Ok(())
}

fn scc_client(settings: &Settings) -> Result<SccClient, RemoteError> {
    SccClient::new(
        &settings.scc_endpoint,
        auth::provider(settings)?,
        &settings.source_display_name,
    )
}
