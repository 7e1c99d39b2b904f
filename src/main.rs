// This is the entry point of the ads policy remediation agent.
//
// **Architecture Overview:**
// - `core/`  = Business logic (platform-agnostic): scan, filter, pause, duplicate
// - `infra/` = Implementations of core traits (Google Ads REST, OpenAI, env config)
// - `http/`  = Health checks and the on-demand cycle trigger
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Pick a trigger: one cycle, a timer, or the HTTP server

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::ads::AdsPlatform;
use crate::core::remediation::{
    run_with_trigger, IntervalTrigger, OnceTrigger, RemediationService, ShutdownSignal,
};
use crate::core::rewrite::{NoRewriteProvider, RewriteProvider, TextRewriter};
use crate::core::throttle::{RateLimitedPlatform, RateLimiter};
use crate::http::{AppState, CredentialPresence, DynRemediationService, HttpServer};
use crate::infra::ai::OpenAiClient;
use crate::infra::config::AgentConfig;
use crate::infra::google_ads::GoogleAdsRestClient;

#[derive(Parser, Debug)]
#[command(name = "ads-policy-agent")]
#[command(about = "Pauses policy-flagged Google Ads and replaces them with rewritten copies")]
#[command(version)]
struct Cli {
    /// Customer account to remediate (overrides GOOGLE_ADS_CUSTOMER_ID)
    #[arg(long, global = true)]
    customer_id: Option<String>,

    /// Only touch campaigns whose name contains this (overrides CAMPAIGN_MARKER)
    #[arg(long, global = true)]
    campaign_marker: Option<String>,

    /// Log the mutations instead of sending them
    #[arg(long, global = true, default_value_t = false)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single cycle and exit (non-zero on failure)
    Once,

    /// Run a cycle now and then every interval until interrupted
    Watch {
        /// Minutes between cycles (overrides MONITOR_INTERVAL_MINUTES)
        #[arg(long)]
        interval_minutes: Option<u64>,
    },

    /// Serve `/`, `/health` and `/run-monitoring`
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Also run cycles on the timer while serving
        #[arg(long, default_value_t = false)]
        with_timer: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Missing credentials abort here, before any cycle runs.
    let mut config = AgentConfig::from_env().context("Invalid configuration")?;

    // Apply CLI overrides
    if let Some(customer_id) = cli.customer_id {
        config.customer_id = infra::google_ads::normalize_customer_id(&customer_id);
    }
    if let Some(marker) = cli.campaign_marker {
        config.settings.campaign_marker = marker;
    }
    if cli.dry_run {
        config.settings.dry_run = true;
    }

    tracing::info!(
        customer_id = %config.customer_id,
        manager_account = config.login_customer_id.as_deref().unwrap_or("-"),
        marker = %config.settings.campaign_marker,
        ad_group_ad_limit = config.settings.ad_group_ad_limit,
        dry_run = config.settings.dry_run,
        "Configuration loaded"
    );

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    let service = Arc::new(build_service(&config).await?);

    match cli.command {
        Command::Once => {
            let report = run_with_trigger(&service, &config.customer_id, &mut OnceTrigger::new())
                .await
                .context("Remediation cycle failed")?;
            if let Some(report) = report {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Command::Watch { interval_minutes } => {
            let period = interval_minutes
                .map(|m| Duration::from_secs(m.max(1).saturating_mul(60)))
                .unwrap_or(config.monitor_interval);
            tracing::info!(interval_secs = period.as_secs(), "Starting scheduled monitoring");
            let mut trigger = IntervalTrigger::new(period, shutdown_signal());
            run_with_trigger(&service, &config.customer_id, &mut trigger)
                .await
                .context("Scheduled monitoring stopped")?;
        }
        Command::Serve { port, with_timer } => {
            let state = AppState {
                service: Arc::clone(&service),
                customer_id: config.customer_id.clone(),
                deadline: config.http_deadline,
                credentials: CredentialPresence::from(&config),
                start_time: Instant::now(),
            };
            let server = HttpServer::new(state, port.unwrap_or(config.port)).run(shutdown_signal());

            if with_timer {
                // Rejected credentials end the timer with an error, which
                // takes the server down with it.
                let mut trigger = IntervalTrigger::new(config.monitor_interval, shutdown_signal());
                let timer = async {
                    run_with_trigger(&service, &config.customer_id, &mut trigger)
                        .await
                        .context("Scheduled monitoring stopped")
                };
                tokio::try_join!(server, timer)?;
            } else {
                server.await?;
            }
        }
    }

    Ok(())
}

/// Wire the Google Ads client, rate limiter and rewriter into one service.
///
/// Credentials the token endpoint rejects abort startup. A token endpoint
/// that is merely unreachable is left for the first cycle to retry.
async fn build_service(config: &AgentConfig) -> anyhow::Result<DynRemediationService> {
    let client = GoogleAdsRestClient::new(
        config.credentials.clone(),
        config.login_customer_id.clone(),
        &config.api_version,
    )?;
    match client.verify_credentials().await {
        Ok(()) => tracing::info!("Google Ads credentials accepted"),
        Err(e) if e.is_fatal() => {
            return Err(anyhow::Error::new(e).context("Google Ads rejected the configured credentials"))
        }
        Err(e) => tracing::warn!("Could not verify Google Ads credentials yet: {}", e),
    }
    let limiter = Arc::new(RateLimiter::new(config.min_api_interval));
    let platform: Box<dyn AdsPlatform> = Box::new(RateLimitedPlatform::new(client, limiter));

    let provider: Box<dyn RewriteProvider> = match &config.openai {
        Some((api_key, openai_config)) => {
            tracing::info!(model = %openai_config.model, "Using OpenAI to shorten over-length copy");
            Box::new(OpenAiClient::new(api_key.clone(), openai_config.clone())?)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, over-length copy will be truncated");
            Box::new(NoRewriteProvider)
        }
    };
    let rewriter = TextRewriter::new(provider)?;

    Ok(RemediationService::new(platform, rewriter, config.settings.clone()))
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
fn shutdown_signal() -> ShutdownSignal {
    Box::pin(async {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::error!("Failed to listen for SIGTERM: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
        tracing::info!("Shutdown signal received");
    })
}
