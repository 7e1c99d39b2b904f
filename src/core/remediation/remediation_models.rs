use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

use crate::core::ads::{AdsError, ApprovalStatus, CapacityScope};
use crate::core::throttle::RetryPolicy;

// ============================================================================
// POLICY & SETTINGS
// ============================================================================

/// Which approval verdicts trigger remediation.
///
/// Default is DISAPPROVED + APPROVED_LIMITED. Ads still under review are left
/// alone because they may well come back approved, and APPROVED / UNKNOWN are
/// never actionable regardless of configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationPolicy {
    actionable: BTreeSet<ApprovalStatus>,
}

impl Default for RemediationPolicy {
    fn default() -> Self {
        Self::new([ApprovalStatus::Disapproved, ApprovalStatus::ApprovedLimited])
    }
}

impl RemediationPolicy {
    pub fn new(statuses: impl IntoIterator<Item = ApprovalStatus>) -> Self {
        let actionable = statuses
            .into_iter()
            .filter(|s| !matches!(s, ApprovalStatus::Approved | ApprovalStatus::Unknown))
            .collect();
        Self { actionable }
    }

    /// Parse a comma separated list such as `DISAPPROVED,UNDER_REVIEW`.
    /// Returns the offending token on failure.
    pub fn parse_list(value: &str) -> Result<Self, String> {
        let mut statuses = Vec::new();
        for token in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match ApprovalStatus::parse(token) {
                ApprovalStatus::Unknown | ApprovalStatus::Approved => return Err(token.to_string()),
                status => statuses.push(status),
            }
        }
        if statuses.is_empty() {
            return Err(value.to_string());
        }
        Ok(Self::new(statuses))
    }

    pub fn is_actionable(&self, status: ApprovalStatus) -> bool {
        self.actionable.contains(&status)
    }

}

/// Knobs for one remediation pipeline. Everything here is configuration, not
/// state; the only cross-cycle state is the rate limiter inside the platform.
#[derive(Debug, Clone)]
pub struct RemediationSettings {
    /// Case-insensitive substring a campaign name must contain. Empty = all.
    pub campaign_marker: String,
    /// Max counted ads per ad group.
    pub ad_group_ad_limit: usize,
    pub capacity_scope: CapacityScope,
    pub policy: RemediationPolicy,
    pub retry: RetryPolicy,
    /// Fixed wait after the pause and after the duplicate of each ad.
    pub step_delay: Duration,
    pub pause_confirm_attempts: u32,
    pub pause_confirm_delay: Duration,
    /// Rewrite copy in duplicates; when false the text is copied verbatim.
    pub rewrite_text: bool,
    /// Build and log mutations without sending them.
    pub dry_run: bool,
}

impl Default for RemediationSettings {
    fn default() -> Self {
        Self {
            campaign_marker: "AMG".to_string(),
            ad_group_ad_limit: 3,
            capacity_scope: CapacityScope::NonRemoved,
            policy: RemediationPolicy::default(),
            retry: RetryPolicy::default(),
            step_delay: Duration::from_secs(2),
            pause_confirm_attempts: 3,
            pause_confirm_delay: Duration::from_secs(3),
            rewrite_text: true,
            dry_run: false,
        }
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Result of trying to duplicate one ad.
#[derive(Debug, Clone, PartialEq)]
pub enum DuplicateOutcome {
    Created(String),
    /// Payload built but not submitted.
    DryRun,
    SkippedLimit { active: usize },
    SkippedUnsupported(String),
    InsufficientContent { headlines: usize, descriptions: usize },
    MissingCreative,
}

impl DuplicateOutcome {
    pub fn is_skip(&self) -> bool {
        !matches!(self, DuplicateOutcome::Created(_) | DuplicateOutcome::DryRun)
    }

    pub fn describe(&self) -> String {
        match self {
            DuplicateOutcome::Created(resource) => format!("created {}", resource),
            DuplicateOutcome::DryRun => "dry run".to_string(),
            DuplicateOutcome::SkippedLimit { active } => {
                format!("skipped: limit ({} ads in ad group)", active)
            }
            DuplicateOutcome::SkippedUnsupported(code) => {
                format!("skipped: unsupported type {}", code)
            }
            DuplicateOutcome::InsufficientContent {
                headlines,
                descriptions,
            } => format!(
                "insufficient content: {} headlines (need 3+), {} descriptions (need 2+)",
                headlines, descriptions
            ),
            DuplicateOutcome::MissingCreative => "skipped: creative no longer available".to_string(),
        }
    }
}

/// Result of pausing the original ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    /// `confirmed` is false if the re-query never showed PAUSED in time.
    Paused { confirmed: bool },
    DryRun,
}

/// End-of-cycle counts. `total == processed + skipped + errored`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CycleReport {
    pub customer_id: String,
    pub processed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub total: usize,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CycleReport {
    pub fn start(customer_id: &str, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            customer_id: customer_id.to_string(),
            processed: 0,
            skipped: 0,
            errored: 0,
            total: 0,
            dry_run,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn record_processed(&mut self) {
        self.processed += 1;
        self.total += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
        self.total += 1;
    }

    pub fn record_error(&mut self) {
        self.errored += 1;
        self.total += 1;
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("Failed to enumerate remediation candidates: {0}")]
    Scan(AdsError),

    #[error("Ads platform rejected our credentials: {0}")]
    Auth(AdsError),

    #[error("A remediation cycle is already running")]
    Busy,
}

impl CycleError {
    /// Rejected credentials stay rejected; no later cycle can succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CycleError::Auth(_))
    }
}
