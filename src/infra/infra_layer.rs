// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "google_ads/mod.rs"]
pub mod google_ads;

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "config/mod.rs"]
pub mod config;
