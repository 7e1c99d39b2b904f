// Domain models for the ads platform.
// Nothing in here knows about HTTP, JSON field names or GAQL. The infra layer
// maps the wire format onto these types.

use std::fmt;

// ============================================================================
// ENUMS
// ============================================================================

/// Serving status of an ad (or ad group / campaign).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdStatus {
    Enabled,
    Paused,
    Removed,
}

impl AdStatus {
    /// Parse the platform's enum name. Numeric codes are accepted because some
    /// client libraries hand them back instead of names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ENABLED" | "2" => Some(AdStatus::Enabled),
            "PAUSED" | "3" => Some(AdStatus::Paused),
            "REMOVED" | "4" => Some(AdStatus::Removed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Enabled => "ENABLED",
            AdStatus::Paused => "PAUSED",
            AdStatus::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The platform's policy-review verdict for an ad's creative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApprovalStatus {
    Approved,
    ApprovedLimited,
    Disapproved,
    UnderReview,
    Unknown,
}

impl ApprovalStatus {
    /// Combine `approvalStatus` and `reviewStatus` into one verdict.
    ///
    /// A disapproval always wins. Otherwise an ad that is still being reviewed
    /// is reported as under review, whatever its provisional approval says.
    pub fn from_policy_summary(approval: Option<&str>, review: Option<&str>) -> Self {
        let approval = approval.map(Self::parse).unwrap_or(ApprovalStatus::Unknown);
        if approval == ApprovalStatus::Disapproved {
            return approval;
        }

        let in_review = review
            .map(|r| r.eq_ignore_ascii_case("REVIEW_IN_PROGRESS"))
            .unwrap_or(false);
        if in_review {
            ApprovalStatus::UnderReview
        } else {
            approval
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "APPROVED" => ApprovalStatus::Approved,
            "APPROVED_LIMITED" | "AREA_OF_INTEREST_ONLY" => ApprovalStatus::ApprovedLimited,
            "DISAPPROVED" => ApprovalStatus::Disapproved,
            "UNDER_REVIEW" | "REVIEW_IN_PROGRESS" => ApprovalStatus::UnderReview,
            _ => ApprovalStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::ApprovedLimited => "APPROVED_LIMITED",
            ApprovalStatus::Disapproved => "DISAPPROVED",
            ApprovalStatus::UnderReview => "UNDER_REVIEW",
            ApprovalStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of ad types we know how to duplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdType {
    /// Structured text ad with fixed headline/description slots.
    SimpleTextAd,
    /// Multi-asset ad; the platform mixes headlines and descriptions.
    ResponsiveAd,
    /// Anything else, keeping the raw code for logging.
    Unsupported(String),
}

impl AdType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "EXPANDED_TEXT_AD" | "3" => AdType::SimpleTextAd,
            "RESPONSIVE_SEARCH_AD" | "15" => AdType::ResponsiveAd,
            other => AdType::Unsupported(other.to_string()),
        }
    }
}

/// Which ads count towards the per-ad-group limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityScope {
    /// Everything that is not removed (enabled + paused).
    NonRemoved,
    /// Only enabled ads.
    Enabled,
}

impl CapacityScope {
    pub fn counts(&self, status: AdStatus) -> bool {
        match self {
            CapacityScope::NonRemoved => status != AdStatus::Removed,
            CapacityScope::Enabled => status == AdStatus::Enabled,
        }
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub status: Option<AdStatus>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdGroup {
    pub id: String,
    pub name: String,
    pub status: Option<AdStatus>,
}

/// One row of the policy scan: an ad joined with its ad group and campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct AdRecord {
    pub ad_id: String,
    /// `customers/{cid}/adGroupAds/{ad_group_id}~{ad_id}`
    pub resource_name: String,
    pub ad_type: AdType,
    pub status: AdStatus,
    pub approval: ApprovalStatus,
    pub ad_group: AdGroup,
    pub campaign: Campaign,
}

/// Why the platform flagged an ad.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTopic {
    pub topic: String,
    pub kind: String,
}

/// A headline or description asset of a responsive ad.
#[derive(Debug, Clone, PartialEq)]
pub struct TextAsset {
    pub text: String,
    /// e.g. `HEADLINE_1`; must survive duplication untouched.
    pub pinned_field: Option<String>,
}

impl TextAsset {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pinned_field: None,
        }
    }

    pub fn pinned(text: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pinned_field: Some(field.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleTextCreative {
    pub headline_part1: Option<String>,
    pub headline_part2: Option<String>,
    pub headline_part3: Option<String>,
    pub description: Option<String>,
    pub description2: Option<String>,
    pub path1: Option<String>,
    pub path2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponsiveCreative {
    pub headlines: Vec<TextAsset>,
    pub descriptions: Vec<TextAsset>,
    pub path1: Option<String>,
    pub path2: Option<String>,
}

/// Type-specific creative content.
#[derive(Debug, Clone, PartialEq)]
pub enum Creative {
    SimpleText(SimpleTextCreative),
    Responsive(ResponsiveCreative),
    /// The platform returned a type we do not copy; nothing to carry over.
    Unsupported,
}

/// Full creative content of one ad, as returned by the detail fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct AdDetails {
    pub ad_id: String,
    pub ad_type: AdType,
    pub ad_group_id: String,
    pub final_urls: Vec<String>,
    pub creative: Creative,
    pub policy_topics: Vec<PolicyTopic>,
}

/// Payload for creating a new ad. Always created ENABLED.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAd {
    /// `customers/{cid}/adGroups/{ad_group_id}`
    pub ad_group_resource: String,
    pub final_urls: Vec<String>,
    pub creative: Creative,
}

/// An ad we intend to remediate, in scan order.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationCandidate {
    pub record: AdRecord,
}

impl RemediationCandidate {
    pub fn ad_id(&self) -> &str {
        &self.record.ad_id
    }

    pub fn resource_name(&self) -> &str {
        &self.record.resource_name
    }

    pub fn ad_group_id(&self) -> &str {
        &self.record.ad_group.id
    }
}

/// Build the ad group resource name for a create operation.
pub fn ad_group_resource(customer_id: &str, ad_group_id: &str) -> String {
    format!("customers/{}/adGroups/{}", customer_id, ad_group_id)
}
