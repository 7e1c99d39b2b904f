// =============================================================================
// OPENAI CLIENT - chat/completions for ad copy shortening
// =============================================================================
//
// Implements the core `RewriteProvider` port against any OpenAI-compatible
// `chat/completions` endpoint. One user message in, first choice out.
//
// **Environment Variables:**
// - `OPENAI_API_KEY`  - Bearer token; without it no client is built
// - `OPENAI_MODEL`    - defaults to `gpt-3.5-turbo`
// - `OPENAI_BASE_URL` - defaults to `https://api.openai.com/v1`

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::core::rewrite::{RewriteError, RewriteProvider, RewriteRequest};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            max_tokens: 60,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(api_key: String, config: OpenAiConfig) -> Result<Self, RewriteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RewriteError::Provider(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl RewriteProvider for OpenAiClient {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, RewriteError> {
        let payload = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": request.prompt() }],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RewriteError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RewriteError::Provider(format!(
                "OpenAI API error: {} - {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::Provider(e.to_string()))?;

        first_content(body)
    }
}

fn first_content(body: ChatResponse) -> Result<String, RewriteError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .map(|c| c.trim().to_string())
        .ok_or_else(|| RewriteError::Provider("Failed to parse response content".to_string()))
}
