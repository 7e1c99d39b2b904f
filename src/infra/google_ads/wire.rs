// JSON shapes of the Google Ads REST API (camelCase, every field optional)
// and their mapping onto the core ads models.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::ads::{
    AdDetails, AdGroup, AdRecord, AdStatus, AdType, ApprovalStatus, Campaign, Creative, NewAd,
    PolicyTopic, ResponsiveCreative, SimpleTextCreative, TextAsset,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchRow>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRow {
    pub ad_group_ad: Option<ApiAdGroupAd>,
    pub ad_group: Option<ApiNamedEntity>,
    pub campaign: Option<ApiNamedEntity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAdGroupAd {
    pub resource_name: Option<String>,
    pub status: Option<String>,
    pub ad: Option<ApiAd>,
    pub policy_summary: Option<ApiPolicySummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAd {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub ad_type: Option<String>,
    #[serde(default)]
    pub final_urls: Vec<String>,
    pub expanded_text_ad: Option<ApiExpandedTextAd>,
    pub responsive_search_ad: Option<ApiResponsiveSearchAd>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiExpandedTextAd {
    pub headline_part1: Option<String>,
    pub headline_part2: Option<String>,
    pub headline_part3: Option<String>,
    pub description: Option<String>,
    pub description2: Option<String>,
    pub path1: Option<String>,
    pub path2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponsiveSearchAd {
    #[serde(default)]
    pub headlines: Vec<ApiTextAsset>,
    #[serde(default)]
    pub descriptions: Vec<ApiTextAsset>,
    pub path1: Option<String>,
    pub path2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTextAsset {
    pub text: Option<String>,
    pub pinned_field: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPolicySummary {
    pub approval_status: Option<String>,
    pub review_status: Option<String>,
    #[serde(default)]
    pub policy_topic_entries: Vec<ApiPolicyTopicEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPolicyTopicEntry {
    pub topic: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Ad group or campaign: only the fields we select.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNamedEntity {
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateResponse {
    #[serde(default)]
    pub results: Vec<MutateResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateResult {
    pub resource_name: Option<String>,
}

// ----------------------------------------------------------------------------
// Wire -> core
// ----------------------------------------------------------------------------

fn named(entity: Option<ApiNamedEntity>) -> (String, String, Option<AdStatus>) {
    let entity = entity.unwrap_or_default();
    (
        entity.id.unwrap_or_default(),
        entity.name.unwrap_or_default(),
        entity.status.as_deref().and_then(AdStatus::parse),
    )
}

/// Map one scan row. Rows without an ad or resource name are dropped.
pub fn to_ad_record(row: SearchRow) -> Option<AdRecord> {
    let ad_group_ad = row.ad_group_ad?;
    let resource_name = ad_group_ad.resource_name?;
    let ad = ad_group_ad.ad.unwrap_or_default();
    let summary = ad_group_ad.policy_summary.unwrap_or_default();

    let (group_id, group_name, group_status) = named(row.ad_group);
    let (campaign_id, campaign_name, campaign_status) = named(row.campaign);

    Some(AdRecord {
        ad_id: ad.id.unwrap_or_default(),
        resource_name,
        ad_type: AdType::parse(ad.ad_type.as_deref().unwrap_or("UNKNOWN")),
        status: ad_group_ad
            .status
            .as_deref()
            .and_then(AdStatus::parse)
            .unwrap_or(AdStatus::Enabled),
        approval: ApprovalStatus::from_policy_summary(
            summary.approval_status.as_deref(),
            summary.review_status.as_deref(),
        ),
        ad_group: AdGroup {
            id: group_id,
            name: group_name,
            status: group_status,
        },
        campaign: Campaign {
            id: campaign_id,
            name: campaign_name,
            status: campaign_status,
        },
    })
}

fn text_assets(assets: Vec<ApiTextAsset>) -> Vec<TextAsset> {
    assets
        .into_iter()
        .filter_map(|a| {
            a.text.map(|text| TextAsset {
                text,
                pinned_field: a.pinned_field,
            })
        })
        .collect()
}

/// Map a detail row onto the creative we may copy.
pub fn to_ad_details(row: SearchRow) -> Option<AdDetails> {
    let ad_group_ad = row.ad_group_ad?;
    let ad = ad_group_ad.ad?;
    let ad_type = AdType::parse(ad.ad_type.as_deref().unwrap_or("UNKNOWN"));

    let creative = match &ad_type {
        AdType::SimpleTextAd => ad
            .expanded_text_ad
            .map(|e| {
                Creative::SimpleText(SimpleTextCreative {
                    headline_part1: e.headline_part1,
                    headline_part2: e.headline_part2,
                    headline_part3: e.headline_part3,
                    description: e.description,
                    description2: e.description2,
                    path1: e.path1,
                    path2: e.path2,
                })
            })
            .unwrap_or(Creative::Unsupported),
        AdType::ResponsiveAd => ad
            .responsive_search_ad
            .map(|r| {
                Creative::Responsive(ResponsiveCreative {
                    headlines: text_assets(r.headlines),
                    descriptions: text_assets(r.descriptions),
                    path1: r.path1,
                    path2: r.path2,
                })
            })
            .unwrap_or(Creative::Unsupported),
        AdType::Unsupported(_) => Creative::Unsupported,
    };

    let policy_topics = ad_group_ad
        .policy_summary
        .map(|s| s.policy_topic_entries)
        .unwrap_or_default()
        .into_iter()
        .map(|entry| PolicyTopic {
            topic: entry.topic.unwrap_or_default(),
            kind: entry.kind.unwrap_or_default(),
        })
        .collect();

    Some(AdDetails {
        ad_id: ad.id.unwrap_or_default(),
        ad_type,
        ad_group_id: row.ad_group.and_then(|g| g.id).unwrap_or_default(),
        final_urls: ad.final_urls,
        creative,
        policy_topics,
    })
}

// ----------------------------------------------------------------------------
// Core -> wire
// ----------------------------------------------------------------------------

fn asset_json(asset: &TextAsset) -> Value {
    match &asset.pinned_field {
        Some(field) => json!({ "text": asset.text, "pinnedField": field }),
        None => json!({ "text": asset.text }),
    }
}

/// Insert `value` under `key` only when present.
fn put(target: &mut Value, key: &str, value: &Option<String>) {
    if let (Some(v), Some(obj)) = (value, target.as_object_mut()) {
        obj.insert(key.to_string(), Value::String(v.clone()));
    }
}

/// The `create` operation for a new, enabled ad.
pub fn create_operation(ad: &NewAd) -> Value {
    let mut ad_json = json!({ "finalUrls": ad.final_urls });

    match &ad.creative {
        Creative::SimpleText(c) => {
            let mut body = json!({});
            put(&mut body, "headlinePart1", &c.headline_part1);
            put(&mut body, "headlinePart2", &c.headline_part2);
            put(&mut body, "headlinePart3", &c.headline_part3);
            put(&mut body, "description", &c.description);
            put(&mut body, "description2", &c.description2);
            put(&mut body, "path1", &c.path1);
            put(&mut body, "path2", &c.path2);
            ad_json["expandedTextAd"] = body;
        }
        Creative::Responsive(c) => {
            let mut body = json!({
                "headlines": c.headlines.iter().map(asset_json).collect::<Vec<_>>(),
                "descriptions": c.descriptions.iter().map(asset_json).collect::<Vec<_>>(),
            });
            put(&mut body, "path1", &c.path1);
            put(&mut body, "path2", &c.path2);
            ad_json["responsiveSearchAd"] = body;
        }
        Creative::Unsupported => {}
    }

    json!({
        "create": {
            "adGroup": ad.ad_group_resource,
            "status": AdStatus::Enabled.as_str(),
            "ad": ad_json,
        }
    })
}

/// The `update` operation that only touches `status`.
pub fn status_update_operation(resource_name: &str, status: AdStatus) -> Value {
    json!({
        "update": {
            "resourceName": resource_name,
            "status": status.as_str(),
        },
        "updateMask": "status",
    })
}
