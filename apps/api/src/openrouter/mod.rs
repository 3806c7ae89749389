//! OpenRouter client — the single point of entry for all LLM calls.
//!
//! ARCHITECTURAL RULE: no other module may call the OpenRouter API directly.
//! All structured completions MUST go through this module.
//!
//! Every call is attempted exactly once: no retries, no backoff. Failures are
//! surfaced as one of six closed [`OpenRouterError`] variants so callers can
//! match exhaustively instead of probing error types.

use anyhow::{bail, Result};
use reqwest::Client;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

pub mod schema;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Default model for structured completions.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Closed set of failure kinds for an OpenRouter call.
/// One variant per failure category; no transport or serde error leaks unwrapped.
#[derive(Debug, Error)]
pub enum OpenRouterError {
    #[error("OpenRouter network error: {0}")]
    Network(String),

    #[error("OpenRouter authentication failed: {0}")]
    Auth(String),

    #[error("OpenRouter rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid request to OpenRouter: {0}")]
    Request(String),

    #[error("OpenRouter server error: {0}")]
    Server(String),

    #[error("OpenRouter response validation failed: {0}")]
    ResponseValidation(String),
}

impl OpenRouterError {
    /// Stable identifier for audit logs.
    pub fn code(&self) -> &'static str {
        match self {
            OpenRouterError::Network(_) => "OPENROUTER_NETWORK_ERROR",
            OpenRouterError::Auth(_) => "OPENROUTER_AUTH_ERROR",
            OpenRouterError::RateLimit(_) => "OPENROUTER_RATE_LIMIT_ERROR",
            OpenRouterError::Request(_) => "OPENROUTER_REQUEST_ERROR",
            OpenRouterError::Server(_) => "OPENROUTER_SERVER_ERROR",
            OpenRouterError::ResponseValidation(_) => "OPENROUTER_RESPONSE_VALIDATION_ERROR",
        }
    }
}

/// Stateless client for the OpenRouter chat-completions endpoint.
/// Holds only immutable configuration; constructed once in `main` and
/// injected via `AppState` — never a process-global singleton.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    site_url: String,
    api_base: String,
}

impl OpenRouterClient {
    /// Fails immediately if the API key is absent or empty, so a
    /// misconfigured deployment dies at startup rather than on first use.
    pub fn new(api_key: String, site_url: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            bail!("OPENROUTER_API_KEY must not be empty");
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            site_url,
            api_base: OPENROUTER_API_BASE.to_string(),
        })
    }

    /// Overrides the API base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Generates a chat completion constrained to return JSON matching the
    /// schema derived for `T`, then parses and validates the model output.
    ///
    /// `model` defaults to [`DEFAULT_MODEL`]; `params` (temperature,
    /// max_tokens, ...) are merged verbatim into the request body.
    pub async fn generate_structured_completion<T>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: Option<&str>,
        params: &Value,
    ) -> Result<T, OpenRouterError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let response_schema = schema::provider_schema::<T>();

        let mut payload = json!({
            "model": model.unwrap_or(DEFAULT_MODEL),
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "structured_response",
                    "strict": true,
                    "schema": response_schema,
                },
            },
        });
        if let (Some(body), Some(extra)) = (payload.as_object_mut(), params.as_object()) {
            for (key, value) in extra {
                body.insert(key.clone(), value.clone());
            }
        }

        let response = self.perform_api_call(&payload).await?;

        let content = match response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
        {
            Some(text) => text,
            None => {
                return Err(OpenRouterError::ResponseValidation(
                    "API response contained no textual content".to_string(),
                ))
            }
        };

        let parsed: Value = serde_json::from_str(content).map_err(|_| {
            OpenRouterError::ResponseValidation(
                "response content could not be parsed as JSON".to_string(),
            )
        })?;

        let validator = jsonschema::validator_for(&schema::provider_schema::<T>())
            .map_err(|e| OpenRouterError::ResponseValidation(format!("invalid schema: {e}")))?;
        if let Err(error) = validator.validate(&parsed) {
            return Err(OpenRouterError::ResponseValidation(format!(
                "response did not match the expected schema: {error}"
            )));
        }

        serde_json::from_value(parsed).map_err(|e| {
            OpenRouterError::ResponseValidation(format!(
                "validated response failed to deserialize: {e}"
            ))
        })
    }

    /// Issues the single HTTP call and maps every non-2xx status and
    /// transport failure to its error variant.
    async fn perform_api_call(&self, payload: &Value) -> Result<Value, OpenRouterError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.site_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| OpenRouterError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            // Error bodies are informative but optional; 5xx stays a server
            // error even when the body is not JSON.
            let error_body: Value = response.json().await.unwrap_or_else(|_| json!({}));

            return Err(match status.as_u16() {
                401 => OpenRouterError::Auth("API key rejected (HTTP 401)".to_string()),
                429 => OpenRouterError::RateLimit("too many requests (HTTP 429)".to_string()),
                400 | 422 => OpenRouterError::Request(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    error_body
                )),
                code if code >= 500 => OpenRouterError::Server(format!("HTTP {code}")),
                code => OpenRouterError::Server(format!("unexpected status HTTP {code}")),
            });
        }

        debug!("OpenRouter call succeeded with status {}", status);

        response
            .json::<Value>()
            .await
            .map_err(|e| OpenRouterError::Network(format!("failed to read response body: {e}")))
    }
}
