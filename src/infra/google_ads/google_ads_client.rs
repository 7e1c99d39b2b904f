use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use super::gaql;
use super::oauth::{GoogleAdsCredentials, RefreshTokenAuth};
use super::wire::{self, MutateResponse, SearchResponse, SearchRow};
use crate::core::ads::{
    AdDetails, AdRecord, AdStatus, AdsError, AdsPlatform, CapacityScope, NewAd,
};

pub const DEFAULT_API_VERSION: &str = "v17";
const DEFAULT_BASE_URL: &str = "https://googleads.googleapis.com";

/// Google Ads REST client. Only the handful of calls the remediation
/// pipeline needs are implemented.
pub struct GoogleAdsRestClient {
    client: Client,
    auth: RefreshTokenAuth,
    base_url: String,
    api_version: String,
    login_customer_id: Option<String>,
}

impl GoogleAdsRestClient {
    pub fn new(
        credentials: GoogleAdsCredentials,
        login_customer_id: Option<String>,
        api_version: &str,
    ) -> Result<Self, AdsError> {
        let client = Client::builder()
            .user_agent(concat!("ads-policy-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdsError::Transport(e.to_string()))?;

        Ok(Self {
            auth: RefreshTokenAuth::new(credentials, client.clone()),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: api_version.to_string(),
            login_customer_id: login_customer_id.map(|id| normalize_customer_id(&id)),
        })
    }

    /// Exchange the refresh token once so bad credentials fail at startup.
    pub async fn verify_credentials(&self) -> Result<(), AdsError> {
        self.auth.access_token().await.map(|_| ())
    }

    fn endpoint(&self, customer_id: &str, method: &str) -> String {
        format!(
            "{}/{}/customers/{}/{}",
            self.base_url,
            self.api_version,
            normalize_customer_id(customer_id),
            method
        )
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, AdsError> {
        let token = self.auth.access_token().await?;

        let mut request = self
            .client
            .post(url)
            .bearer_auth(token)
            .header("developer-token", self.auth.developer_token())
            .json(body);
        if let Some(login) = &self.login_customer_id {
            request = request.header("login-customer-id", login);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdsError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AdsError::Transport(e.to_string()))?;

        if !status.is_success() {
            let err = classify_error(status, &text);
            if err.is_fatal() {
                // A revoked token would otherwise be reused until it expires.
                self.auth.invalidate().await;
            }
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&text).map_err(|e| AdsError::Api(format!("invalid JSON response: {}", e)))
    }

    /// Run a GAQL query and collect every page.
    async fn search(&self, customer_id: &str, query: &str) -> Result<Vec<SearchRow>, AdsError> {
        let url = self.endpoint(customer_id, "googleAds:search");
        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut body = json!({ "query": query });
            if let Some(token) = &page_token {
                body["pageToken"] = Value::String(token.clone());
            }

            let value = self.post(&url, &body).await?;
            let page: SearchResponse = serde_json::from_value(value)
                .map_err(|e| AdsError::Api(format!("unexpected search response: {}", e)))?;
            rows.extend(page.results);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(rows)
    }

    async fn mutate_ad_group_ads(&self, customer_id: &str, operation: Value) -> Result<MutateResponse, AdsError> {
        let url = self.endpoint(customer_id, "adGroupAds:mutate");
        let value = self.post(&url, &json!({ "operations": [operation] })).await?;
        serde_json::from_value(value)
            .map_err(|e| AdsError::Api(format!("unexpected mutate response: {}", e)))
    }
}

#[async_trait]
impl AdsPlatform for GoogleAdsRestClient {
    async fn search_ads(&self, customer_id: &str) -> Result<Vec<AdRecord>, AdsError> {
        let rows = self.search(customer_id, &gaql::scan_query()).await?;
        Ok(rows.into_iter().filter_map(wire::to_ad_record).collect())
    }

    async fn fetch_ad_details(
        &self,
        customer_id: &str,
        resource_name: &str,
    ) -> Result<Option<AdDetails>, AdsError> {
        let rows = self
            .search(customer_id, &gaql::details_query(resource_name))
            .await?;
        Ok(rows.into_iter().next().and_then(wire::to_ad_details))
    }

    async fn count_ads_in_ad_group(
        &self,
        customer_id: &str,
        ad_group_id: &str,
        scope: CapacityScope,
    ) -> Result<usize, AdsError> {
        if !gaql::is_numeric_id(ad_group_id) {
            return Err(AdsError::Api(format!("invalid ad group id {:?}", ad_group_id)));
        }
        let rows = self
            .search(customer_id, &gaql::capacity_query(ad_group_id, scope))
            .await?;
        Ok(rows.len())
    }

    async fn create_ad(&self, customer_id: &str, ad: &NewAd) -> Result<String, AdsError> {
        let response = self
            .mutate_ad_group_ads(customer_id, wire::create_operation(ad))
            .await?;
        response
            .results
            .into_iter()
            .next()
            .and_then(|r| r.resource_name)
            .ok_or_else(|| AdsError::Api("create returned no resource name".to_string()))
    }

    async fn update_ad_status(
        &self,
        customer_id: &str,
        resource_name: &str,
        status: AdStatus,
    ) -> Result<(), AdsError> {
        self.mutate_ad_group_ads(customer_id, wire::status_update_operation(resource_name, status))
            .await?;
        Ok(())
    }

    async fn get_ad_status(
        &self,
        customer_id: &str,
        resource_name: &str,
    ) -> Result<Option<AdStatus>, AdsError> {
        let rows = self
            .search(customer_id, &gaql::status_query(resource_name))
            .await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|r| r.ad_group_ad)
            .and_then(|a| a.status)
            .and_then(|s| AdStatus::parse(&s)))
    }
}

/// `123-456-7890` -> `1234567890`.
pub fn normalize_customer_id(id: &str) -> String {
    id.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Sort a failed response into the error kinds the pipeline acts on.
pub fn classify_error(status: StatusCode, body: &str) -> AdsError {
    let detail = error_message(body);

    if status == StatusCode::TOO_MANY_REQUESTS
        || body.contains("RESOURCE_EXHAUSTED")
        || body.contains("quotaError")
    {
        AdsError::Quota(detail)
    } else if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || body.contains("UNAUTHENTICATED")
        || body.contains("PERMISSION_DENIED")
        || body.contains("authenticationError")
        || body.contains("authorizationError")
    {
        AdsError::Auth(detail)
    } else if body.contains("resourceCountLimitExceededError") {
        AdsError::ResourceLimit(detail)
    } else {
        AdsError::Api(format!("{}: {}", status, detail))
    }
}

/// Pull the most specific message out of a Google error body.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().map(|v| &v["error"]);

    let specific = error
        .and_then(|e| e["details"].as_array())
        .and_then(|details| {
            details
                .iter()
                .filter_map(|d| d["errors"].as_array())
                .flatten()
                .filter_map(|e| e["message"].as_str())
                .next()
        });

    specific
        .or_else(|| error.and_then(|e| e["message"].as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| body.chars().take(300).collect())
}
