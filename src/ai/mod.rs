use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

mod error;

pub use error::AIError;
use crate::config::{AIConfig, AIProvider};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const OPENAI_API_URL: &str = "https://api.openai.com";

/// One prompt for the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// The hosted language model. Returns the raw completion text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError>;
}

pub struct HttpCompletionClient {
    client: reqwest::Client,
    config: AIConfig,
}

impl HttpCompletionClient {
    pub fn new(config: AIConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, default_base: &str, path: &str) -> String {
        let base = self.config.api_url.as_deref().unwrap_or(default_base);
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    fn max_tokens(&self, request: &CompletionRequest) -> u32 {
        request.max_tokens.min(self.config.max_tokens)
    }

    async fn complete_anthropic(&self, request: &CompletionRequest) -> Result<String, AIError> {
        let api_key = self.config.anthropic_api_key.as_ref()
            .ok_or_else(|| AIError::ValidationError("Anthropic API key not configured".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert("x-api-key", HeaderValue::from_str(api_key)
            .map_err(|e| AIError::ValidationError(format!("Invalid API key: {}", e)))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut body = json!({
            "model": &self.config.model,
            "max_tokens": self.max_tokens(request),
            "messages": [
                {
                    "role": "user",
                    "content": &request.prompt
                }
            ]
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        let response_text = self
            .post(&self.endpoint(ANTHROPIC_API_URL, "/v1/messages"), headers, &body)
            .await?;

        #[derive(Debug, Deserialize)]
        struct AnthropicResponse {
            #[serde(default)]
            content: Vec<AnthropicContent>,
        }

        #[derive(Debug, Deserialize)]
        struct AnthropicContent {
            #[serde(default)]
            text: String,
        }

        let parsed: AnthropicResponse = serde_json::from_str(&response_text)
            .map_err(|e| AIError::ParseError(format!(
                "Failed to parse Anthropic response: {} - Raw response: {}",
                e, response_text
            )))?;

        let text: String = parsed.content.into_iter().map(|c| c.text).collect();
        if text.trim().is_empty() {
            return Err(AIError::ParseError(format!("Empty response from Anthropic: {}", response_text)));
        }
        Ok(text)
    }

    async fn complete_openai(&self, request: &CompletionRequest) -> Result<String, AIError> {
        let api_key = self.config.openai_api_key.as_ref()
            .ok_or_else(|| AIError::ValidationError("OpenAI API key not configured".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| AIError::ValidationError(format!("Invalid API key: {}", e)))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut body = json!({
            "model": &self.config.model,
            "max_tokens": self.max_tokens(request),
            "messages": [
                {
                    "role": "user",
                    "content": &request.prompt
                }
            ]
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }

        let response_text = self
            .post(&self.endpoint(OPENAI_API_URL, "/v1/chat/completions"), headers, &body)
            .await?;

        let parsed: Value = serde_json::from_str(&response_text)
            .map_err(|e| AIError::ParseError(format!("Failed to parse API response: {}", e)))?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .filter(|text| !text.trim().is_empty())
            .map(String::from)
            .ok_or_else(|| AIError::ParseError(format!("Empty response from OpenAI: {}", response_text)))
    }

    async fn post(&self, url: &str, headers: HeaderMap, body: &Value) -> Result<String, AIError> {
        debug!(url, "sending completion request");

        let response = self.client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => (),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(AIError::RateLimitError("Rate limit exceeded".to_string()));
            }
            StatusCode::UNAUTHORIZED => {
                return Err(AIError::AuthenticationError("Invalid API key".to_string()));
            }
            status => {
                let error_body = response.text().await
                    .unwrap_or_else(|_| "Could not read error response".to_string());
                return Err(AIError::APIError(format!(
                    "Unexpected status code: {} - Response: {}",
                    status, error_body
                )));
            }
        }

        response.text().await
            .map_err(|e| AIError::NetworkError(format!("Failed to read response body: {}", e)))
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError> {
        match self.config.provider {
            AIProvider::Anthropic => self.complete_anthropic(request).await,
            AIProvider::OpenAI => self.complete_openai(request).await,
        }
    }
}
