pub mod ads_models;
pub mod ads_platform;

pub use ads_models::{
    ad_group_resource, AdDetails, AdGroup, AdRecord, AdStatus, AdType, ApprovalStatus, Campaign,
    CapacityScope, Creative, NewAd, PolicyTopic, RemediationCandidate, ResponsiveCreative,
    SimpleTextCreative, TextAsset,
};
pub use ads_platform::{AdsError, AdsPlatform};
