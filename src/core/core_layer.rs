// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "ads/mod.rs"]
pub mod ads;

#[path = "throttle/mod.rs"]
pub mod throttle;

#[path = "rewrite/mod.rs"]
pub mod rewrite;

#[path = "remediation/mod.rs"]
pub mod remediation;
