// Process-local pacing for platform calls.
//
// The limiter remembers when the last call went out and sleeps off whatever is
// left of the minimum interval before letting the next one through. It is an
// explicit object rather than ambient state so it can be shared (via Arc)
// between the scheduler and the HTTP trigger without any globals.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::core::ads::{
    AdDetails, AdRecord, AdStatus, AdsError, AdsPlatform, CapacityScope, NewAd,
};

/// Enforces a minimum wall-clock spacing between consecutive calls.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Wait until a call is allowed, then record it as made.
    ///
    /// The lock is held across the sleep so concurrent callers queue up
    /// instead of all waking at the same instant.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let since_last = previous.elapsed();
            if since_last < self.min_interval {
                let wait = self.min_interval - since_last;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "Rate limiting before next API call");
                sleep(wait).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}

/// Decorator that runs every platform call through a shared [`RateLimiter`].
pub struct RateLimitedPlatform<P: AdsPlatform> {
    inner: P,
    limiter: Arc<RateLimiter>,
}

impl<P: AdsPlatform> RateLimitedPlatform<P> {
    pub fn new(inner: P, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }
}

#[async_trait]
impl<P: AdsPlatform> AdsPlatform for RateLimitedPlatform<P> {
    async fn search_ads(&self, customer_id: &str) -> Result<Vec<AdRecord>, AdsError> {
        self.limiter.acquire().await;
        self.inner.search_ads(customer_id).await
    }

    async fn fetch_ad_details(
        &self,
        customer_id: &str,
        resource_name: &str,
    ) -> Result<Option<AdDetails>, AdsError> {
        self.limiter.acquire().await;
        self.inner.fetch_ad_details(customer_id, resource_name).await
    }

    async fn count_ads_in_ad_group(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        scope: CapacityScope,
    ) -> Result<usize, AdsError> {
        self.limiter.acquire().await;
        self.inner
            .count_ads_in_ad_group(customer_id, ad_group_id, scope)
            .await
    }

    async fn create_ad(&self, customer_id: &str, ad: &NewAd) -> Result<String, AdsError> {
        self.limiter.acquire().await;
        self.inner.create_ad(customer_id, ad).await
    }

    async fn update_ad_status(
        &self,
        customer_id: &str,
        resource_name: &str,
        status: AdStatus,
    ) -> Result<(), AdsError> {
        self.limiter.acquire().await;
        self.inner
            .update_ad_status(customer_id, resource_name, status)
            .await
    }

    async fn get_ad_status(
        &self,
        customer_id: &str,
        resource_name: &str,
    ) -> Result<Option<AdStatus>, AdsError> {
        self.limiter.acquire().await;
        self.inner.get_ad_status(customer_id, resource_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::remediation::test_support::FakePlatform;

    #[tokio::test(start_paused = true)]
    async fn first_call_is_not_delayed() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_calls_are_spaced_by_min_interval() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_once_interval_has_passed() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        limiter.acquire().await;

        sleep(Duration::from_secs(5)).await;

        let before = Instant::now();
        limiter.acquire().await;
        assert!(before.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn decorator_paces_platform_calls() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(2)));
        let platform = RateLimitedPlatform::new(FakePlatform::new(), Arc::clone(&limiter));

        let start = Instant::now();
        platform.search_ads("123").await.unwrap();
        platform
            .get_ad_status("123", "customers/123/adGroupAds/1~1")
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
