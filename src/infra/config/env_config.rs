// Environment-driven configuration.
//
// Everything is read through a lookup function so tests can feed a map
// instead of mutating the process environment.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::core::ads::CapacityScope;
use crate::core::remediation::{RemediationPolicy, RemediationSettings};
use crate::core::throttle::RetryPolicy;
use crate::infra::ai::openai_client::{OpenAiConfig, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::infra::google_ads::{normalize_customer_id, GoogleAdsCredentials, DEFAULT_API_VERSION};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing Google Ads credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Could not read secrets file {path}: {reason}")]
    SecretsFile { path: String, reason: String },
}

/// Everything the agent needs to run, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub customer_id: String,
    pub login_customer_id: Option<String>,
    pub credentials: GoogleAdsCredentials,
    pub api_version: String,
    pub min_api_interval: Duration,
    pub monitor_interval: Duration,
    pub http_deadline: Duration,
    pub port: u16,
    pub settings: RemediationSettings,
    /// `None` when no API key is configured.
    pub openai: Option<(String, OpenAiConfig)>,
}

/// Shape of the optional local secrets file.
#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    client_id: Option<String>,
    client_secret: Option<String>,
    developer_token: Option<String>,
    refresh_token: Option<String>,
    customer_id: Option<String>,
    login_customer_id: Option<String>,
}

const CREDENTIAL_KEYS: [&str; 4] = [
    "GOOGLE_ADS_CLIENT_ID",
    "GOOGLE_ADS_CLIENT_SECRET",
    "GOOGLE_ADS_DEVELOPER_TOKEN",
    "GOOGLE_ADS_REFRESH_TOKEN",
];

/// Empty strings and `YOUR_...` template values count as absent.
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.to_ascii_uppercase().starts_with("YOUR_")
}

fn present(value: Option<String>) -> Option<String> {
    value
        .filter(|v| !is_placeholder(v))
        .map(|v| v.trim().to_string())
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| present(lookup(key));

        let secrets = match var("GOOGLE_ADS_SECRETS_FILE") {
            Some(path) => read_secrets_file(Path::new(&path))?,
            None => SecretsFile::default(),
        };

        let credentials = resolve_credentials(&var, &secrets)?;

        let customer_id = var("GOOGLE_ADS_CUSTOMER_ID")
            .or_else(|| present(secrets.customer_id.clone()))
            .map(|id| normalize_customer_id(&id))
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::Missing("GOOGLE_ADS_CUSTOMER_ID"))?;
        let login_customer_id = var("GOOGLE_ADS_MCC_ID")
            .or_else(|| present(secrets.login_customer_id.clone()))
            .map(|id| normalize_customer_id(&id))
            .filter(|id| !id.is_empty());

        let defaults = RemediationSettings::default();
        let retry = RetryPolicy {
            max_attempts: parse_or(&var, "QUOTA_MAX_ATTEMPTS", defaults.retry.max_attempts)?,
            backoff: vec![Duration::from_secs(parse_or(&var, "QUOTA_BACKOFF_SECS", 60u64)?)],
        };
        if retry.max_attempts == 0 {
            return Err(invalid("QUOTA_MAX_ATTEMPTS", "0", "must be at least 1"));
        }

        let policy = match var("REMEDIATE_STATUSES") {
            Some(list) => RemediationPolicy::parse_list(&list).map_err(|token| {
                invalid(
                    "REMEDIATE_STATUSES",
                    &list,
                    &format!("{:?} is not an actionable approval status", token),
                )
            })?,
            None => defaults.policy.clone(),
        };

        let capacity_scope = match var("AD_LIMIT_SCOPE").map(|s| s.to_ascii_lowercase()) {
            None => defaults.capacity_scope,
            Some(s) if s == "non_removed" || s == "non-removed" => CapacityScope::NonRemoved,
            Some(s) if s == "enabled" => CapacityScope::Enabled,
            Some(other) => {
                return Err(invalid("AD_LIMIT_SCOPE", &other, "expected non_removed or enabled"))
            }
        };

        let ad_group_ad_limit: usize = parse_or(&var, "AD_GROUP_AD_LIMIT", defaults.ad_group_ad_limit)?;
        if ad_group_ad_limit == 0 {
            return Err(invalid("AD_GROUP_AD_LIMIT", "0", "must be at least 1"));
        }

        let settings = RemediationSettings {
            // An explicitly empty marker means "all campaigns", so read it raw.
            campaign_marker: lookup("CAMPAIGN_MARKER")
                .map(|m| m.trim().to_string())
                .unwrap_or(defaults.campaign_marker),
            ad_group_ad_limit,
            capacity_scope,
            policy,
            retry,
            step_delay: millis_or(&var, "STEP_DELAY_MS", defaults.step_delay)?,
            pause_confirm_attempts: parse_or(&var, "PAUSE_CONFIRM_ATTEMPTS", defaults.pause_confirm_attempts)?,
            pause_confirm_delay: millis_or(&var, "PAUSE_CONFIRM_DELAY_MS", defaults.pause_confirm_delay)?,
            rewrite_text: bool_or(&var, "REWRITE_TEXT", defaults.rewrite_text)?,
            dry_run: bool_or(&var, "DRY_RUN", defaults.dry_run)?,
        };

        let monitor_minutes: u64 = parse_or(&var, "MONITOR_INTERVAL_MINUTES", 60)?;
        if monitor_minutes == 0 {
            return Err(invalid("MONITOR_INTERVAL_MINUTES", "0", "must be at least 1"));
        }
        let monitor_interval = monitor_minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                invalid("MONITOR_INTERVAL_MINUTES", &monitor_minutes.to_string(), "interval is too large")
            })?;

        let openai = var("OPENAI_API_KEY").map(|key| {
            (
                key,
                OpenAiConfig {
                    model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                    base_url: var("OPENAI_BASE_URL")
                        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                    ..OpenAiConfig::default()
                },
            )
        });

        Ok(Self {
            customer_id,
            login_customer_id,
            credentials,
            api_version: var("GOOGLE_ADS_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            min_api_interval: millis_or(&var, "MIN_API_INTERVAL_MS", Duration::from_millis(2000))?,
            monitor_interval,
            http_deadline: Duration::from_secs(parse_or(&var, "HTTP_DEADLINE_SECS", 240u64)?),
            port: parse_or(&var, "PORT", 8080u16)?,
            settings,
            openai,
        })
    }
}

fn read_secrets_file(path: &Path) -> Result<SecretsFile, ConfigError> {
    let file_error = |reason: String| ConfigError::SecretsFile {
        path: path.display().to_string(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| file_error(e.to_string()))
}

/// Environment first, then the secrets file. Reports every missing key.
fn resolve_credentials<V>(var: &V, secrets: &SecretsFile) -> Result<GoogleAdsCredentials, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    let from_file = [
        &secrets.client_id,
        &secrets.client_secret,
        &secrets.developer_token,
        &secrets.refresh_token,
    ];

    let mut values = Vec::with_capacity(CREDENTIAL_KEYS.len());
    let mut missing = Vec::new();
    for (key, file_value) in CREDENTIAL_KEYS.iter().zip(from_file) {
        match var(*key).or_else(|| present(file_value.clone())) {
            Some(value) => values.push(value),
            None => missing.push(key.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(ConfigError::MissingCredentials(missing));
    }

    let mut values = values.into_iter();
    let mut next = || values.next().unwrap_or_default();
    Ok(GoogleAdsCredentials {
        client_id: next(),
        client_secret: next(),
        developer_token: next(),
        refresh_token: next(),
    })
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<V, T>(var: &V, key: &'static str, default: T) -> Result<T, ConfigError>
where
    V: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| invalid(key, &raw, &e.to_string())),
        None => Ok(default),
    }
}

fn millis_or<V>(var: &V, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    let default_ms = default.as_millis() as u64;
    parse_or(var, key, default_ms).map(Duration::from_millis)
}

fn bool_or<V>(var: &V, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(key, &v, "expected true or false")),
        },
    }
}
