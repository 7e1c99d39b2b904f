use async_trait::async_trait;
use thiserror::Error;

use super::ads_models::{AdDetails, AdRecord, AdStatus, CapacityScope, NewAd};

/// Errors the ads platform can hand back.
///
/// The variants are what the rest of the pipeline branches on: quota errors
/// get one retry, resource limits turn into skips, authentication is fatal.
#[derive(Debug, Error)]
pub enum AdsError {
    #[error("Quota or rate limit exceeded: {0}")]
    Quota(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Resource limit reached: {0}")]
    ResourceLimit(String),

    #[error("Ads API error: {0}")]
    Api(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl AdsError {
    /// Only quota errors are worth waiting out.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AdsError::Quota(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, AdsError::Auth(_))
    }
}

/// The calls the remediation pipeline needs from the ads platform.
///
/// The core defines this port; `infra::google_ads` implements it against the
/// REST API, and tests implement it in memory.
#[async_trait]
pub trait AdsPlatform: Send + Sync {
    /// All ads in enabled/paused campaigns and ad groups, with policy status.
    async fn search_ads(&self, customer_id: &str) -> Result<Vec<AdRecord>, AdsError>;

    /// Full creative for one ad. `Ok(None)` if it no longer exists.
    async fn fetch_ad_details(
        &self,
        customer_id: &str,
        resource_name: &str,
    ) -> Result<Option<AdDetails>, AdsError>;

    /// Number of ads in the ad group that count towards the per-group limit.
    async fn count_ads_in_ad_group(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        scope: CapacityScope,
    ) -> Result<usize, AdsError>;

    /// Create an enabled ad. Returns the new resource name.
    async fn create_ad(&self, customer_id: &str, ad: &NewAd) -> Result<String, AdsError>;

    /// Change an ad's status (update with a `status` field mask).
    async fn update_ad_status(
        &self,
        customer_id: &str,
        resource_name: &str,
        status: AdStatus,
    ) -> Result<(), AdsError>;

    /// Current status of one ad. `Ok(None)` if it no longer exists.
    async fn get_ad_status(
        &self,
        customer_id: &str,
        resource_name: &str,
    ) -> Result<Option<AdStatus>, AdsError>;
}

// Lets the composition root pick an implementation at runtime.
#[async_trait]
impl AdsPlatform for Box<dyn AdsPlatform> {
    async fn search_ads(&self, customer_id: &str) -> Result<Vec<AdRecord>, AdsError> {
        (**self).search_ads(customer_id).await
    }

    async fn fetch_ad_details(
        &self,
        customer_id: &str,
        resource_name: &str,
    ) -> Result<Option<AdDetails>, AdsError> {
        (**self).fetch_ad_details(customer_id, resource_name).await
    }

    async fn count_ads_in_ad_group(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        scope: CapacityScope,
    ) -> Result<usize, AdsError> {
        (**self)
            .count_ads_in_ad_group(customer_id, ad_group_id, scope)
            .await
    }

    async fn create_ad(&self, customer_id: &str, ad: &NewAd) -> Result<String, AdsError> {
        (**self).create_ad(customer_id, ad).await
    }

    async fn update_ad_status(
        &self,
        customer_id: &str,
        resource_name: &str,
        status: AdStatus,
    ) -> Result<(), AdsError> {
        (**self)
            .update_ad_status(customer_id, resource_name, status)
            .await
    }

    async fn get_ad_status(
        &self,
        customer_id: &str,
        resource_name: &str,
    ) -> Result<Option<AdStatus>, AdsError> {
        (**self).get_ad_status(customer_id, resource_name).await
    }
}
