// OAuth2 access tokens for the Google Ads API.
//
// The service runs unattended with a long-lived refresh token; every access
// token is obtained by exchanging it at Google's token endpoint and cached
// until shortly before it expires.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::core::ads::AdsError;

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh a token this long before Google says it expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// The four secrets the Google Ads API needs.
#[derive(Clone, Deserialize, PartialEq)]
pub struct GoogleAdsCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub developer_token: String,
    pub refresh_token: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for GoogleAdsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleAdsCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("developer_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Hands out access tokens, refreshing them when needed.
pub struct RefreshTokenAuth {
    credentials: GoogleAdsCredentials,
    client: Client,
    token_url: String,
    cached_token: RwLock<Option<CachedToken>>,
}

impl RefreshTokenAuth {
    pub fn new(credentials: GoogleAdsCredentials, client: Client) -> Self {
        Self::with_token_url(credentials, client, GOOGLE_TOKEN_URL.to_string())
    }

    pub fn with_token_url(credentials: GoogleAdsCredentials, client: Client, token_url: String) -> Self {
        Self {
            credentials,
            client,
            token_url,
            cached_token: RwLock::new(None),
        }
    }

    pub fn developer_token(&self) -> &str {
        &self.credentials.developer_token
    }

    /// A valid access token, from cache when possible.
    pub async fn access_token(&self) -> Result<String, AdsError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;
        // Another caller may have refreshed while we waited for the write lock.
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.exchange_refresh_token().await?;
        let token = fresh.access_token.clone();
        *cached = Some(CachedToken {
            token: fresh.access_token,
            expires_at: Instant::now() + Duration::from_secs(fresh.expires_in),
        });
        tracing::debug!(expires_in = fresh.expires_in, "Refreshed Google Ads access token");

        Ok(token)
    }

    /// Drop the cached token so the next call refreshes it.
    pub async fn invalidate(&self) {
        *self.cached_token.write().await = None;
    }

    async fn exchange_refresh_token(&self) -> Result<TokenResponse, AdsError> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AdsError::Transport(format!("token request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdsError::Transport(format!("token response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(token_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| AdsError::Auth(format!("unexpected token response: {}", e)))
    }
}

/// Any rejection of the refresh token itself is an auth failure; server-side
/// trouble at the token endpoint is treated as transport.
fn token_error(status: u16, body: &str) -> AdsError {
    let parsed: Option<TokenErrorResponse> = serde_json::from_str(body).ok();
    let detail = match parsed {
        Some(TokenErrorResponse {
            error: Some(error),
            error_description,
        }) => match error_description {
            Some(description) => format!("{}: {}", error, description),
            None => error,
        },
        _ => body.chars().take(200).collect(),
    };

    if status >= 500 {
        AdsError::Transport(format!("token endpoint returned {}: {}", status, detail))
    } else {
        AdsError::Auth(format!("token exchange rejected ({}): {}", status, detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_grant_is_auth_error() {
        let err = token_error(
            400,
            r#"{"error":"invalid_grant","error_description":"Token has been expired or revoked."}"#,
        );
        match err {
            AdsError::Auth(detail) => assert!(detail.contains("invalid_grant")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn server_error_is_transport() {
        assert!(matches!(token_error(503, "unavailable"), AdsError::Transport(_)));
    }

    #[test]
    fn token_response_defaults_expiry() {
        let parsed: TokenResponse = serde_json::from_str(r#"{"access_token":"ya29.x"}"#).unwrap();
        assert_eq!(parsed.expires_in, 3600);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = GoogleAdsCredentials {
            client_id: "id.apps.googleusercontent.com".into(),
            client_secret: "shh".into(),
            developer_token: "dev".into(),
            refresh_token: "1//refresh".into(),
        };
        let printed = format!("{:?}", creds);
        assert!(printed.contains("id.apps.googleusercontent.com"));
        assert!(!printed.contains("shh"));
        assert!(!printed.contains("1//refresh"));
    }
}
