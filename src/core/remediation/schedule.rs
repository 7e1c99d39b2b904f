// Decides *when* a cycle runs. The service itself only knows how to run one.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

use super::cycle_orchestrator::RemediationService;
use super::remediation_models::{CycleError, CycleReport};
use crate::core::ads::AdsPlatform;
use crate::core::rewrite::RewriteProvider;

pub type ShutdownSignal = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Source of "run a cycle now" signals.
#[async_trait]
pub trait CycleTrigger: Send {
    /// Wait for the next signal. `false` means stop.
    async fn next(&mut self) -> bool;

    /// Whether a failed cycle should be logged and skipped rather than
    /// returned to the caller.
    fn tolerates_failures(&self) -> bool;
}

/// Fires exactly once.
#[derive(Default)]
pub struct OnceTrigger {
    fired: bool,
}

impl OnceTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CycleTrigger for OnceTrigger {
    async fn next(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }

    fn tolerates_failures(&self) -> bool {
        false
    }
}

/// Fires immediately, then every `period`, until `shutdown` resolves.
pub struct IntervalTrigger {
    ticker: Interval,
    shutdown: ShutdownSignal,
    stopped: bool,
}

impl IntervalTrigger {
    pub fn new(period: Duration, shutdown: ShutdownSignal) -> Self {
        let mut ticker = interval(period);
        // A cycle that overruns the period pushes the next one back instead of
        // triggering a burst of catch-up cycles.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            ticker,
            shutdown,
            stopped: false,
        }
    }
}

#[async_trait]
impl CycleTrigger for IntervalTrigger {
    async fn next(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        tokio::select! {
            _ = self.ticker.tick() => true,
            _ = &mut self.shutdown => {
                tracing::info!("Shutdown requested, stopping scheduler");
                self.stopped = true;
                false
            }
        }
    }

    fn tolerates_failures(&self) -> bool {
        true
    }
}

/// Run one cycle per trigger signal.
///
/// Returns the last successful report. Under a trigger that does not tolerate
/// failures the first cycle error is returned instead. Rejected credentials
/// stop every trigger.
pub async fn run_with_trigger<P, R, T>(
    service: &RemediationService<P, R>,
    customer_id: &str,
    trigger: &mut T,
) -> Result<Option<CycleReport>, CycleError>
where
    P: AdsPlatform,
    R: RewriteProvider,
    T: CycleTrigger + ?Sized,
{
    let mut last = None;
    let mut cycles: u64 = 0;

    while trigger.next().await {
        cycles += 1;
        match service.run_cycle(customer_id).await {
            Ok(report) => last = Some(report),
            Err(e) if e.is_fatal() => {
                tracing::error!(cycle = cycles, "Stopping scheduler: {}", e);
                return Err(e);
            }
            Err(e) if trigger.tolerates_failures() => {
                tracing::error!(cycle = cycles, "Remediation cycle failed: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(cycles, "Scheduler finished");
    Ok(last)
}
