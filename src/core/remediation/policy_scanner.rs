use std::collections::BTreeMap;

use super::remediation_models::RemediationPolicy;
use crate::core::ads::{AdRecord, AdsError, AdsPlatform, ApprovalStatus};
use crate::core::throttle::{with_quota_retry, RetryPolicy};

/// Query every ad in enabled/paused campaigns and keep the ones the policy
/// says need attention.
///
/// Quota errors get the usual single retry; anything else (auth included)
/// goes straight back to the caller.
pub async fn scan_unfavorable_ads<P: AdsPlatform>(
    platform: &P,
    customer_id: &str,
    policy: &RemediationPolicy,
    retry: &RetryPolicy,
) -> Result<Vec<AdRecord>, AdsError> {
    let all_ads = with_quota_retry(retry, "search_ads", move || platform.search_ads(customer_id)).await?;

    tracing::info!(
        customer_id,
        scanned = all_ads.len(),
        "Scanned ads in enabled/paused campaigns"
    );
    for (status, count) in status_breakdown(&all_ads) {
        tracing::info!(approval = %status, count, "Approval status breakdown");
    }

    let flagged: Vec<AdRecord> = all_ads
        .into_iter()
        .filter(|ad| policy.is_actionable(ad.approval))
        .collect();

    for ad in &flagged {
        tracing::debug!(
            ad_id = %ad.ad_id,
            approval = %ad.approval,
            campaign = %ad.campaign.name,
            ad_group = %ad.ad_group.name,
            "Ad needs attention"
        );
    }

    Ok(flagged)
}

pub fn status_breakdown(ads: &[AdRecord]) -> BTreeMap<ApprovalStatus, usize> {
    let mut counts = BTreeMap::new();
    for ad in ads {
        *counts.entry(ad.approval).or_insert(0) += 1;
    }
    counts
}
