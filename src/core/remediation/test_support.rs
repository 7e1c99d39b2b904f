// In-memory ads platform for exercising the pipeline without HTTP.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::core::ads::{
    AdDetails, AdGroup, AdRecord, AdStatus, AdType, AdsError, AdsPlatform, ApprovalStatus,
    Campaign, CapacityScope, Creative, NewAd, ResponsiveCreative, SimpleTextCreative, TextAsset,
};

struct FakeAd {
    record: AdRecord,
    details: Option<AdDetails>,
}

/// Behaves like the platform for the handful of calls the pipeline makes.
///
/// Failures can be queued per operation name (`search_ads`, `create_ad`, ...),
/// and every call is logged so tests can assert on what was (not) attempted.
pub struct FakePlatform {
    ads: Mutex<Vec<FakeAd>>,
    failures: DashMap<&'static str, VecDeque<AdsError>>,
    calls: Mutex<Vec<String>>,
    created: Mutex<Vec<NewAd>>,
    /// How many status reads keep returning the pre-pause status.
    status_lag: Mutex<u32>,
    next_id: Mutex<u64>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            ads: Mutex::new(Vec::new()),
            failures: DashMap::new(),
            calls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            status_lag: Mutex::new(0),
            next_id: Mutex::new(9000),
        }
    }

    pub fn add_ad(&self, record: AdRecord, details: Option<AdDetails>) {
        self.ads.lock().unwrap().push(FakeAd { record, details });
    }

    pub fn fail_next(&self, operation: &'static str, error: AdsError) {
        self.failures.entry(operation).or_default().push_back(error);
    }

    pub fn set_status_lag(&self, reads: u32) {
        *self.status_lag.lock().unwrap() = reads;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == operation)
            .count()
    }

    pub fn created(&self) -> Vec<NewAd> {
        self.created.lock().unwrap().clone()
    }

    pub fn status_of(&self, resource_name: &str) -> Option<AdStatus> {
        self.ads
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.record.resource_name == resource_name)
            .map(|a| a.record.status)
    }

    pub fn ads_in_group(&self, ad_group_id: &str, scope: CapacityScope) -> usize {
        self.ads
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.record.ad_group.id == ad_group_id && scope.counts(a.record.status))
            .count()
    }

    fn enter(&self, operation: &'static str) -> Result<(), AdsError> {
        self.calls.lock().unwrap().push(operation.to_string());
        match self.failures.get_mut(operation) {
            Some(mut queue) => match queue.pop_front() {
                Some(err) => Err(err),
                None => Ok(()),
            },
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdsPlatform for FakePlatform {
    async fn search_ads(&self, _customer_id: &str) -> Result<Vec<AdRecord>, AdsError> {
        self.enter("search_ads")?;
        Ok(self
            .ads
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.record.status == AdStatus::Enabled)
            .map(|a| a.record.clone())
            .collect())
    }

    async fn fetch_ad_details(
        &self,
        _customer_id: &str,
        resource_name: &str,
    ) -> Result<Option<AdDetails>, AdsError> {
        self.enter("fetch_ad_details")?;
        Ok(self
            .ads
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.record.resource_name == resource_name)
            .and_then(|a| a.details.clone()))
    }

    async fn count_ads_in_ad_group(
        &self,
        _customer_id: &str,
        ad_group_id: &str,
        scope: CapacityScope,
    ) -> Result<usize, AdsError> {
        self.enter("count_ads_in_ad_group")?;
        Ok(self.ads_in_group(ad_group_id, scope))
    }

    async fn create_ad(&self, customer_id: &str, ad: &NewAd) -> Result<String, AdsError> {
        self.enter("create_ad")?;

        let ad_group_id = ad
            .ad_group_resource
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let ad_id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            next.to_string()
        };
        let resource_name = format!("customers/{}/adGroupAds/{}~{}", customer_id, ad_group_id, ad_id);

        let mut ads = self.ads.lock().unwrap();
        let template = ads
            .iter()
            .find(|a| a.record.ad_group.id == ad_group_id)
            .map(|a| a.record.clone());
        if let Some(mut record) = template {
            record.ad_id = ad_id;
            record.resource_name = resource_name.clone();
            record.status = AdStatus::Enabled;
            record.approval = ApprovalStatus::UnderReview;
            ads.push(FakeAd {
                record,
                details: None,
            });
        }
        drop(ads);

        self.created.lock().unwrap().push(ad.clone());
        Ok(resource_name)
    }

    async fn update_ad_status(
        &self,
        _customer_id: &str,
        resource_name: &str,
        status: AdStatus,
    ) -> Result<(), AdsError> {
        self.enter("update_ad_status")?;
        let mut ads = self.ads.lock().unwrap();
        match ads.iter_mut().find(|a| a.record.resource_name == resource_name) {
            Some(ad) => {
                ad.record.status = status;
                Ok(())
            }
            None => Err(AdsError::Api(format!("{} not found", resource_name))),
        }
    }

    async fn get_ad_status(
        &self,
        _customer_id: &str,
        resource_name: &str,
    ) -> Result<Option<AdStatus>, AdsError> {
        self.enter("get_ad_status")?;

        let mut lag = self.status_lag.lock().unwrap();
        if *lag > 0 {
            *lag -= 1;
            return Ok(Some(AdStatus::Enabled));
        }
        drop(lag);

        Ok(self.status_of(resource_name))
    }
}

// ----------------------------------------------------------------------------
// Builders
// ----------------------------------------------------------------------------

pub fn record(
    ad_id: &str,
    ad_group_id: &str,
    campaign_name: &str,
    ad_type: AdType,
    approval: ApprovalStatus,
) -> AdRecord {
    AdRecord {
        ad_id: ad_id.to_string(),
        resource_name: format!("customers/123/adGroupAds/{}~{}", ad_group_id, ad_id),
        ad_type,
        status: AdStatus::Enabled,
        approval,
        ad_group: AdGroup {
            id: ad_group_id.to_string(),
            name: format!("Ad group {}", ad_group_id),
            status: Some(AdStatus::Enabled),
        },
        campaign: Campaign {
            id: format!("c-{}", campaign_name.to_lowercase().replace(' ', "-")),
            name: campaign_name.to_string(),
            status: Some(AdStatus::Enabled),
        },
    }
}

pub fn simple_text_details(ad_id: &str, ad_group_id: &str, headline: &str) -> AdDetails {
    AdDetails {
        ad_id: ad_id.to_string(),
        ad_type: AdType::SimpleTextAd,
        ad_group_id: ad_group_id.to_string(),
        final_urls: vec!["https://visago.ae/dubai-visa?utm_source=google&x=1".to_string()],
        creative: Creative::SimpleText(SimpleTextCreative {
            headline_part1: Some(headline.to_string()),
            headline_part2: Some("Apply Online Today".to_string()),
            headline_part3: None,
            description: Some("Trusted visa processing for residents and tourists.".to_string()),
            description2: None,
            path1: Some("visa".to_string()),
            path2: None,
        }),
        policy_topics: Vec::new(),
    }
}

pub fn responsive_details(
    ad_id: &str,
    ad_group_id: &str,
    headlines: &[&str],
    descriptions: &[&str],
) -> AdDetails {
    AdDetails {
        ad_id: ad_id.to_string(),
        ad_type: AdType::ResponsiveAd,
        ad_group_id: ad_group_id.to_string(),
        final_urls: vec!["https://visago.ae/".to_string()],
        creative: Creative::Responsive(ResponsiveCreative {
            headlines: headlines.iter().map(|h| TextAsset::new(*h)).collect(),
            descriptions: descriptions.iter().map(|d| TextAsset::new(*d)).collect(),
            path1: None,
            path2: None,
        }),
        policy_topics: Vec::new(),
    }
}
