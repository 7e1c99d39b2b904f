use tokio::time::sleep;

use super::remediation_models::{PauseOutcome, RemediationSettings};
use crate::core::ads::{AdStatus, AdsError, AdsPlatform, RemediationCandidate};
use crate::core::throttle::with_quota_retry;

/// Pause the original ad, then poll until the platform reports it paused.
///
/// The update itself must succeed; confirmation is best effort and only
/// produces a warning if the new status never shows up.
pub async fn pause_ad<P: AdsPlatform>(
    platform: &P,
    settings: &RemediationSettings,
    customer_id: &str,
    candidate: &RemediationCandidate,
) -> Result<PauseOutcome, AdsError> {
    let resource_name = candidate.resource_name();

    if settings.dry_run {
        tracing::info!(ad_id = candidate.ad_id(), resource = resource_name, "[dry run] Would pause ad");
        return Ok(PauseOutcome::DryRun);
    }

    with_quota_retry(&settings.retry, "update_ad_status", move || {
        platform.update_ad_status(customer_id, resource_name, AdStatus::Paused)
    })
    .await?;

    let confirmed = confirm_paused(platform, settings, customer_id, resource_name).await;
    if confirmed {
        tracing::info!(ad_id = candidate.ad_id(), resource = resource_name, "Paused ad");
    } else {
        tracing::warn!(
            ad_id = candidate.ad_id(),
            resource = resource_name,
            attempts = settings.pause_confirm_attempts,
            "Pause sent but status not yet reported as PAUSED"
        );
    }

    Ok(PauseOutcome::Paused { confirmed })
}

async fn confirm_paused<P: AdsPlatform>(
    platform: &P,
    settings: &RemediationSettings,
    customer_id: &str,
    resource_name: &str,
) -> bool {
    for attempt in 1..=settings.pause_confirm_attempts {
        sleep(settings.pause_confirm_delay).await;

        match platform.get_ad_status(customer_id, resource_name).await {
            Ok(Some(AdStatus::Paused)) => return true,
            Ok(status) => {
                tracing::debug!(resource = resource_name, attempt, ?status, "Ad not paused yet");
            }
            Err(e) => {
                tracing::debug!(resource = resource_name, attempt, "Status check failed: {}", e);
            }
        }
    }
    false
}
