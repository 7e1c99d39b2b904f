// GAQL statements issued by the REST client.

use crate::core::ads::CapacityScope;

/// Quote a value as a GAQL string literal.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Ids are spliced in unquoted, so only digits are allowed.
pub fn is_numeric_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Every enabled ad in enabled/paused campaigns and ad groups. Paused ads are
/// left out so an original paused by a previous cycle is not picked up again.
pub fn scan_query() -> String {
    "SELECT ad_group_ad.ad.id, ad_group_ad.ad.type, ad_group_ad.status, \
     ad_group_ad.policy_summary.approval_status, ad_group_ad.policy_summary.review_status, \
     ad_group_ad.resource_name, ad_group.id, ad_group.name, ad_group.status, \
     campaign.id, campaign.name, campaign.status \
     FROM ad_group_ad \
     WHERE campaign.status IN ('ENABLED', 'PAUSED') \
     AND ad_group.status IN ('ENABLED', 'PAUSED') \
     AND ad_group_ad.status = 'ENABLED'"
        .to_string()
}

pub fn details_query(resource_name: &str) -> String {
    format!(
        "SELECT ad_group_ad.ad.id, ad_group_ad.ad.type, ad_group_ad.ad.final_urls, \
         ad_group_ad.ad.expanded_text_ad.headline_part1, \
         ad_group_ad.ad.expanded_text_ad.headline_part2, \
         ad_group_ad.ad.expanded_text_ad.headline_part3, \
         ad_group_ad.ad.expanded_text_ad.description, \
         ad_group_ad.ad.expanded_text_ad.description2, \
         ad_group_ad.ad.expanded_text_ad.path1, \
         ad_group_ad.ad.expanded_text_ad.path2, \
         ad_group_ad.ad.responsive_search_ad.headlines, \
         ad_group_ad.ad.responsive_search_ad.descriptions, \
         ad_group_ad.ad.responsive_search_ad.path1, \
         ad_group_ad.ad.responsive_search_ad.path2, \
         ad_group_ad.policy_summary.policy_topic_entries, \
         ad_group.id \
         FROM ad_group_ad \
         WHERE ad_group_ad.resource_name = {}",
        quote(resource_name)
    )
}

/// GAQL has no COUNT; the caller counts the returned rows.
pub fn capacity_query(ad_group_id: &str, scope: CapacityScope) -> String {
    let status_filter = match scope {
        CapacityScope::NonRemoved => "ad_group_ad.status != 'REMOVED'",
        CapacityScope::Enabled => "ad_group_ad.status = 'ENABLED'",
    };
    format!(
        "SELECT ad_group_ad.ad.id FROM ad_group_ad \
         WHERE ad_group.id = {} AND {}",
        ad_group_id, status_filter
    )
}

pub fn status_query(resource_name: &str) -> String {
    format!(
        "SELECT ad_group_ad.status FROM ad_group_ad WHERE ad_group_ad.resource_name = {}",
        quote(resource_name)
    )
}
