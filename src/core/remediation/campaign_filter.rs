use crate::core::ads::{AdRecord, RemediationCandidate};

/// Ads of one campaign, in scan order.
#[derive(Debug, Clone)]
pub struct CampaignGroup {
    pub campaign_id: String,
    pub campaign_name: String,
    pub ads: Vec<AdRecord>,
}

/// Group ads by campaign id, keeping first-seen order of campaigns.
pub fn group_by_campaign(ads: Vec<AdRecord>) -> Vec<CampaignGroup> {
    let mut groups: Vec<CampaignGroup> = Vec::new();

    for ad in ads {
        match groups.iter_mut().find(|g| g.campaign_id == ad.campaign.id) {
            Some(group) => group.ads.push(ad),
            None => groups.push(CampaignGroup {
                campaign_id: ad.campaign.id.clone(),
                campaign_name: ad.campaign.name.clone(),
                ads: vec![ad],
            }),
        }
    }

    groups
}

/// Keep only campaigns whose name contains `marker` (case-insensitive) and
/// flatten them into the candidate list. An empty marker keeps everything.
pub fn filter_by_campaign(ads: Vec<AdRecord>, marker: &str) -> Vec<RemediationCandidate> {
    let marker = marker.trim().to_lowercase();

    let kept: Vec<CampaignGroup> = group_by_campaign(ads)
        .into_iter()
        .filter(|g| marker.is_empty() || g.campaign_name.to_lowercase().contains(&marker))
        .collect();

    for group in &kept {
        tracing::info!(
            campaign = %group.campaign_name,
            campaign_id = %group.campaign_id,
            ads = group.ads.len(),
            "Campaign has ads with policy issues"
        );
    }

    kept.into_iter()
        .flat_map(|g| g.ads)
        .map(|record| RemediationCandidate { record })
        .collect()
}
