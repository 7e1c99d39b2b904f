// HTTP surface: liveness, health and the on-demand cycle trigger.

#[path = "routes.rs"]
pub mod routes;

#[path = "server.rs"]
pub mod server;

pub use routes::{AppState, CredentialPresence, DynRemediationService};
pub use server::HttpServer;
