pub mod ad_pauser;
pub mod campaign_filter;
pub mod cycle_orchestrator;
pub mod duplicate_creator;
pub mod policy_scanner;
pub mod remediation_models;
pub mod schedule;

#[cfg(test)]
pub mod test_support;

pub use cycle_orchestrator::RemediationService;
pub use remediation_models::{CycleError, RemediationPolicy, RemediationSettings};
pub use schedule::{run_with_trigger, IntervalTrigger, OnceTrigger, ShutdownSignal};
