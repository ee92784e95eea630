//! Messages-API completion client.
//!
//! This is the ONLY place that interprets HTTP status codes. Two retry
//! budgets apply independently:
//!
//! - connection-level failures sleep `n * transport_delay` before retry `n`;
//! - non-success statuses sleep a fixed `status_delay` between attempts.
//!
//! Exhausting either budget is fatal for the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde_json::json;
use tracing::{debug, error, warn};

use super::{CompletionRequest, LlmClient, LlmResponse};
use crate::config::{ClientRetryConfig, SleuthConfig};
use crate::error::{SleuthError, SleuthResult};

const USER_AGENT_VALUE: &str = concat!("sleuth/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
enum Failure {
    Transport(String),
    Status { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    api_version: String,
    model: String,
    max_tokens: u32,
    retry: ClientRetryConfig,
    debug: bool,
}

impl AnthropicClient {
    pub fn new(config: &SleuthConfig) -> SleuthResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| SleuthError::config("ANTHROPIC_API_KEY is not set"))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| SleuthError::config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.api_url.clone(),
            api_key,
            api_version: config.api_version.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            retry: config.client_retry.clone(),
            debug: config.debug,
        })
    }

    fn body(&self, request: &CompletionRequest) -> serde_json::Value {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": request.turns,
            "system": request.system,
        })
    }

    async fn send_once(&self, body: &serde_json::Value) -> Result<serde_json::Value, Failure> {
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Failure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(Failure::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| Failure::Transport(format!("failed to read response body: {}", e)))
    }
}

fn completion_text(json: &serde_json::Value) -> SleuthResult<String> {
    json.pointer("/content/0/text")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| SleuthError::InvalidResponse {
            message: "response missing content[0].text".to_string(),
        })
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> SleuthResult<LlmResponse> {
        let body = self.body(request);
        if self.debug {
            debug!(request = %body, "completion request");
        }

        let mut attempts = 0u32;
        let mut transport_failures = 0u32;
        let mut status_failures = 0u32;

        loop {
            attempts += 1;
            match self.send_once(&body).await {
                Ok(json) => {
                    if self.debug {
                        debug!(response = %json, "completion response");
                    }
                    let text = completion_text(&json)?;
                    return Ok(LlmResponse {
                        text,
                        provider: self.provider_name().to_string(),
                        model: self.model.clone(),
                        attempts,
                    });
                }
                Err(Failure::Transport(message)) => {
                    transport_failures += 1;
                    if transport_failures >= self.retry.transport_attempts {
                        return Err(SleuthError::Transport { attempts, message });
                    }
                    let backoff = self.retry.transport_delay * transport_failures;
                    warn!(
                        error = %message,
                        retry = transport_failures,
                        max_retries = self.retry.transport_attempts,
                        backoff_ms = backoff.as_millis(),
                        "retrying completion request"
                    );
                    sleep(backoff).await;
                }
                Err(Failure::Status { status, body }) => {
                    status_failures += 1;
                    error!(status, body = %body, "completion endpoint rejected request");
                    if status_failures >= self.retry.status_attempts {
                        return Err(SleuthError::Unavailable {
                            status,
                            attempts,
                            body,
                        });
                    }
                    warn!(
                        retry = status_failures,
                        max_retries = self.retry.status_attempts,
                        backoff_ms = self.retry.status_delay.as_millis(),
                        "retrying..."
                    );
                    sleep(self.retry.status_delay).await;
                }
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}

async fn sleep(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}
