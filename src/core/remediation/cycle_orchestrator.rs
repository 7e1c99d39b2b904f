use tokio::sync::Mutex;
use tokio::time::sleep;

use super::ad_pauser::pause_ad;
use super::campaign_filter::filter_by_campaign;
use super::duplicate_creator::duplicate_ad;
use super::policy_scanner::scan_unfavorable_ads;
use super::remediation_models::{CycleError, CycleReport, RemediationSettings};
use crate::core::ads::{AdsError, AdsPlatform, RemediationCandidate};
use crate::core::rewrite::{RewriteProvider, TextRewriter};

/// How a single candidate ended up.
enum AdResult {
    Processed,
    Skipped,
    Failed,
}

pub struct RemediationService<P: AdsPlatform, R: RewriteProvider> {
    platform: P,
    rewriter: TextRewriter<R>,
    settings: RemediationSettings,
    cycle_lock: Mutex<()>,
}

impl<P: AdsPlatform, R: RewriteProvider> RemediationService<P, R> {
    pub fn new(platform: P, rewriter: TextRewriter<R>, settings: RemediationSettings) -> Self {
        Self {
            platform,
            rewriter,
            settings,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn settings(&self) -> &RemediationSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.cycle_lock.try_lock().is_err()
    }

    /// Run one cycle, waiting for any cycle already in flight to finish first.
    pub async fn run_cycle(&self, customer_id: &str) -> Result<CycleReport, CycleError> {
        let _guard = self.cycle_lock.lock().await;
        self.run_locked(customer_id).await
    }

    /// Run one cycle unless another one is in flight, in which case return
    /// [`CycleError::Busy`] immediately.
    pub async fn try_run_cycle(&self, customer_id: &str) -> Result<CycleReport, CycleError> {
        let _guard = self.cycle_lock.try_lock().map_err(|_| CycleError::Busy)?;
        self.run_locked(customer_id).await
    }

    async fn run_locked(&self, customer_id: &str) -> Result<CycleReport, CycleError> {
        let mut report = CycleReport::start(customer_id, self.settings.dry_run);
        tracing::info!(customer_id, dry_run = self.settings.dry_run, "Starting remediation cycle");

        let flagged = scan_unfavorable_ads(
            &self.platform,
            customer_id,
            &self.settings.policy,
            &self.settings.retry,
        )
        .await
        .map_err(|e| match e {
            AdsError::Auth(_) => CycleError::Auth(e),
            other => CycleError::Scan(other),
        })?;

        let candidates = filter_by_campaign(flagged, &self.settings.campaign_marker);
        tracing::info!(
            candidates = candidates.len(),
            marker = %self.settings.campaign_marker,
            "Ads selected for remediation"
        );

        for candidate in &candidates {
            match self.remediate(customer_id, candidate).await {
                Ok(AdResult::Processed) => report.record_processed(),
                Ok(AdResult::Skipped) => report.record_skipped(),
                Ok(AdResult::Failed) => report.record_error(),
                Err(e) => {
                    report.record_error();
                    tracing::error!(
                        ad_id = candidate.ad_id(),
                        processed = report.processed,
                        "Authentication failed mid-cycle, aborting: {}",
                        e
                    );
                    return Err(CycleError::Auth(e));
                }
            }
        }

        let report = report.finish();
        tracing::info!(
            customer_id,
            processed = report.processed,
            skipped = report.skipped,
            errored = report.errored,
            total = report.total,
            dry_run = report.dry_run,
            "Remediation cycle complete"
        );
        Ok(report)
    }

    /// Pause then duplicate one ad. Only an auth failure escapes as `Err`;
    /// everything else is folded into the per-ad result.
    async fn remediate(
        &self,
        customer_id: &str,
        candidate: &RemediationCandidate,
    ) -> Result<AdResult, AdsError> {
        let record = &candidate.record;
        tracing::info!(
            ad_id = %record.ad_id,
            campaign = %record.campaign.name,
            ad_group = %record.ad_group.name,
            approval = %record.approval,
            "Remediating ad"
        );

        match pause_ad(&self.platform, &self.settings, customer_id, candidate).await {
            Ok(_) => {}
            Err(e @ AdsError::Auth(_)) => return Err(e),
            Err(e) => {
                tracing::error!(ad_id = %record.ad_id, resource = %record.resource_name, "Failed to pause ad: {}", e);
                return Ok(AdResult::Failed);
            }
        }
        self.step_delay().await;

        let outcome = duplicate_ad(
            &self.platform,
            &self.rewriter,
            &self.settings,
            customer_id,
            candidate,
        )
        .await;
        self.step_delay().await;

        match outcome {
            Ok(outcome) if outcome.is_skip() => Ok(AdResult::Skipped),
            Ok(_) => Ok(AdResult::Processed),
            Err(e @ AdsError::Auth(_)) => Err(e),
            Err(e) => {
                tracing::error!(ad_id = %record.ad_id, ad_group = %record.ad_group.id, "Failed to duplicate ad: {}", e);
                Ok(AdResult::Failed)
            }
        }
    }

    async fn step_delay(&self) {
        if !self.settings.dry_run && !self.settings.step_delay.is_zero() {
            sleep(self.settings.step_delay).await;
        }
    }
}
