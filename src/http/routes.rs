//! REST handlers: liveness, health, and the remediation trigger.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::ads::AdsPlatform;
use crate::core::remediation::{CycleError, RemediationService};
use crate::core::rewrite::RewriteProvider;
use crate::infra::config::env_config::is_placeholder;
use crate::infra::config::AgentConfig;

pub const SERVICE_NAME: &str = "Google Ads Policy Remediation Agent";

/// The service as the HTTP layer sees it: both ports erased.
pub type DynRemediationService = RemediationService<Box<dyn AdsPlatform>, Box<dyn RewriteProvider>>;

/// Which credentials were found at startup. Values are never exposed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CredentialPresence {
    pub client_id: bool,
    pub client_secret: bool,
    pub developer_token: bool,
    pub refresh_token: bool,
    pub openai_api_key: bool,
}

impl From<&AgentConfig> for CredentialPresence {
    fn from(config: &AgentConfig) -> Self {
        let loaded = |value: &str| !is_placeholder(value);
        Self {
            client_id: loaded(&config.credentials.client_id),
            client_secret: loaded(&config.credentials.client_secret),
            developer_token: loaded(&config.credentials.developer_token),
            refresh_token: loaded(&config.credentials.refresh_token),
            openai_api_key: config
                .openai
                .as_ref()
                .is_some_and(|(key, _)| loaded(key)),
        }
    }
}

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DynRemediationService>,
    pub customer_id: String,
    /// How long `/run-monitoring` waits before answering `timeout`.
    pub deadline: Duration,
    pub credentials: CredentialPresence,
    pub start_time: Instant,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub cycle_running: bool,
    pub dry_run: bool,
    pub credentials: CredentialPresence,
    pub endpoints: Value,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health_check))
        .route("/run-monitoring", get(run_monitoring))
        .with_state(state)
}

/// GET / returns plain liveness text.
pub async fn liveness() -> &'static str {
    "Google Ads policy remediation agent is running"
}

/// GET /health reports detailed status.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        cycle_running: state.service.is_running(),
        dry_run: state.service.settings().dry_run,
        credentials: state.credentials,
        endpoints: json!({
            "/": "Liveness check",
            "/health": "Detailed health status",
            "/run-monitoring": "Trigger one remediation cycle",
        }),
    })
}

/// GET /run-monitoring runs one cycle.
///
/// The cycle runs in its own task. If it outlives the deadline the caller
/// gets `timeout` while the cycle carries on in the background.
pub async fn run_monitoring(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    tracing::info!("Remediation cycle triggered over HTTP");

    if state.service.is_running() {
        return busy();
    }

    let service = Arc::clone(&state.service);
    let customer_id = state.customer_id.clone();
    let mut cycle = tokio::spawn(async move { service.try_run_cycle(&customer_id).await });

    match tokio::time::timeout(state.deadline, &mut cycle).await {
        Ok(Ok(Ok(report))) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Monitoring cycle completed",
                "results": report,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        ),
        Ok(Ok(Err(CycleError::Busy))) => busy(),
        Ok(Ok(Err(e))) => {
            tracing::error!("Remediation cycle failed: {}", e);
            error_response(e.to_string())
        }
        Ok(Err(join_error)) => {
            tracing::error!("Remediation task panicked: {}", join_error);
            error_response(join_error.to_string())
        }
        Err(_) => {
            tracing::warn!(
                deadline_secs = state.deadline.as_secs(),
                "Cycle still running at deadline, answering timeout"
            );
            // Dropping the JoinHandle detaches the task; it keeps running.
            (
                StatusCode::ACCEPTED,
                Json(json!({
                    "success": false,
                    "status": "timeout",
                    "message": "Monitoring cycle is still running in the background",
                    "timestamp": Utc::now().to_rfc3339(),
                })),
            )
        }
    }
}

fn busy() -> (StatusCode, Json<Value>) {
    (
        StatusCode::CONFLICT,
        Json(json!({
            "success": false,
            "status": "busy",
            "message": "A monitoring cycle is already running",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

fn error_response(error: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": error,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::core::ads::{AdType, AdsError, ApprovalStatus};
    use crate::core::remediation::test_support::{record, simple_text_details, FakePlatform};
    use crate::core::remediation::RemediationSettings;
    use crate::core::rewrite::{NoRewriteProvider, TextRewriter};

    fn state(platform: FakePlatform, settings: RemediationSettings, deadline: Duration) -> AppState {
        let provider: Box<dyn RewriteProvider> = Box::new(NoRewriteProvider);
        let platform: Box<dyn AdsPlatform> = Box::new(platform);
        AppState {
            service: Arc::new(RemediationService::new(
                platform,
                TextRewriter::new(provider).unwrap(),
                settings,
            )),
            customer_id: "123".to_string(),
            deadline,
            credentials: CredentialPresence {
                client_id: true,
                client_secret: true,
                developer_token: true,
                refresh_token: true,
                openai_api_key: false,
            },
            start_time: Instant::now(),
        }
    }

    fn fast_settings() -> RemediationSettings {
        RemediationSettings {
            step_delay: Duration::ZERO,
            pause_confirm_delay: Duration::ZERO,
            ..RemediationSettings::default()
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn liveness_returns_text() {
        let app = router(state(FakePlatform::new(), fast_settings(), Duration::from_secs(5)));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_reports_credentials_and_endpoints() {
        let app = router(state(FakePlatform::new(), fast_settings(), Duration::from_secs(5)));

        let (status, body) = get_json(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["credentials"]["developer_token"], true);
        assert_eq!(body["credentials"]["openai_api_key"], false);
        assert!(body["endpoints"]["/run-monitoring"].is_string());
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn credential_presence_follows_loaded_config() {
        let vars: std::collections::HashMap<String, String> = [
            ("GOOGLE_ADS_CLIENT_ID", "id.apps.googleusercontent.com"),
            ("GOOGLE_ADS_CLIENT_SECRET", "secret"),
            ("GOOGLE_ADS_DEVELOPER_TOKEN", "devtoken"),
            ("GOOGLE_ADS_REFRESH_TOKEN", "1//refresh"),
            ("GOOGLE_ADS_CUSTOMER_ID", "208-030-7721"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let mut config = AgentConfig::from_map(&vars).unwrap();

        let presence = CredentialPresence::from(&config);
        assert!(presence.client_id && presence.client_secret);
        assert!(presence.developer_token && presence.refresh_token);
        assert!(!presence.openai_api_key);

        config.openai = Some(("sk-test".to_string(), Default::default()));
        assert!(CredentialPresence::from(&config).openai_api_key);
    }

    #[tokio::test]
    async fn run_monitoring_returns_report() {
        let platform = FakePlatform::new();
        platform.add_ad(
            record("1", "g1", "AMG Dubai", AdType::SimpleTextAd, ApprovalStatus::Disapproved),
            Some(simple_text_details("1", "g1", "Fast Dubai Visa Service")),
        );
        let app = router(state(platform, fast_settings(), Duration::from_secs(30)));

        let (status, body) = get_json(app, "/run-monitoring").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["results"]["processed"], 1);
        assert_eq!(body["results"]["total"], 1);
    }

    #[tokio::test]
    async fn scan_failure_is_500() {
        let platform = FakePlatform::new();
        platform.fail_next("search_ads", AdsError::Api("INVALID_CUSTOMER_ID".into()));
        let app = router(state(platform, fast_settings(), Duration::from_secs(30)));

        let (status, body) = get_json(app, "/run-monitoring").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("INVALID_CUSTOMER_ID"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cycle_answers_timeout_and_finishes_in_background() {
        let platform = FakePlatform::new();
        platform.add_ad(
            record("1", "g1", "AMG Dubai", AdType::SimpleTextAd, ApprovalStatus::Disapproved),
            Some(simple_text_details("1", "g1", "Visa Help")),
        );
        // Default step delays (2s + 3s confirm) outlast a 1s deadline.
        let state = state(platform, RemediationSettings::default(), Duration::from_secs(1));
        let service = Arc::clone(&state.service);
        let app = router(state);

        let (status, body) = get_json(app, "/run-monitoring").await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["status"], "timeout");
        assert!(service.is_running());

        // Waiting for the lock means waiting for the detached cycle to finish.
        // The original is paused and its replacement is still under review.
        let report = service.run_cycle("123").await.unwrap();
        assert_eq!(report.total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_trigger_is_busy() {
        let platform = FakePlatform::new();
        platform.add_ad(
            record("1", "g1", "AMG Dubai", AdType::SimpleTextAd, ApprovalStatus::Disapproved),
            Some(simple_text_details("1", "g1", "Visa Help")),
        );
        let state = state(platform, RemediationSettings::default(), Duration::from_secs(1));
        let app = router(state.clone());

        let (first, _) = get_json(app.clone(), "/run-monitoring").await;
        assert_eq!(first, StatusCode::ACCEPTED);

        let (second, body) = get_json(app, "/run-monitoring").await;
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(body["status"], "busy");
    }
}
