use crate::config::{Config, Provider, ProviderSettings};
use crate::converters::gemini::{GeminiRequest, GeminiResponse};
use crate::converters::helpers::upstream_error_message;
use crate::converters::openai::{OpenAIRequest, OpenAIResponse};
use crate::error::GatewayError;
use crate::models::{Completion, PromptRequest};
use crate::request_id::{RequestId, X_REQUEST_ID};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Provider adapters: turns a [`PromptRequest`] into each provider's wire
/// request and the wire response back into a [`Completion`].
#[derive(Debug)]
pub struct LlmClient {
    http_client: Arc<reqwest::Client>,
    config: Arc<Config>,
}

impl LlmClient {
    pub fn new(http_client: Arc<reqwest::Client>, config: Arc<Config>) -> Self {
        Self { http_client, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn build_target_url(provider: Provider, settings: &ProviderSettings) -> String {
        let api_base = settings.api_base.trim_end_matches('/');
        match provider {
            Provider::Gemini => format!("{}/models/{}:generateContent", api_base, settings.model),
            Provider::Groq | Provider::OpenAI => format!("{}/chat/completions", api_base),
        }
    }

    fn build_body(provider: Provider, settings: &ProviderSettings, request: &PromptRequest) -> Result<Value, GatewayError> {
        let body = match provider {
            Provider::Gemini => serde_json::to_value(GeminiRequest::from_prompt(request, settings)),
            Provider::Groq | Provider::OpenAI => serde_json::to_value(OpenAIRequest::from_prompt(request, settings)),
        };
        body.map_err(|e| GatewayError::Internal(format!("failed to encode {} request: {}", provider, e)))
    }

    fn normalize(provider: Provider, raw: Value) -> Result<Completion, GatewayError> {
        let completion = match provider {
            Provider::Gemini => GeminiResponse::normalize(raw),
            Provider::Groq | Provider::OpenAI => OpenAIResponse::normalize(raw),
        };
        completion.map_err(|e| GatewayError::Decode { provider, message: e.to_string() })
    }

    fn transport_error(&self, provider: Provider, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout { provider, secs: self.config.request_timeout.as_secs() }
        } else {
            // The Gemini URL carries the key in its query string
            GatewayError::Transport { provider, source: e.without_url() }
        }
    }

    /// One request/response exchange with `provider`.
    ///
    /// Every failure comes back as a [`GatewayError`]; a missing credential
    /// short-circuits before any network I/O.
    pub async fn invoke(
        &self,
        provider: Provider,
        request: &PromptRequest,
        request_id: Option<&RequestId>,
    ) -> Result<Completion, GatewayError> {
        let settings = self.config.settings(provider);
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| GatewayError::MissingCredential(settings.api_key_env.clone()))?;

        let target_body = Self::build_body(provider, settings, request)?;
        let target_url = Self::build_target_url(provider, settings);

        let mut target_request = self
            .http_client
            .post(&target_url)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.config.request_timeout);

        if let Some(id) = request_id {
            if let Ok(val) = HeaderValue::from_str(id.as_str()) {
                target_request = target_request.header(X_REQUEST_ID.clone(), val);
            }
        }

        target_request = match provider {
            Provider::Gemini => target_request.query(&[("key", api_key)]),
            Provider::Groq | Provider::OpenAI => {
                target_request.header(AUTHORIZATION, format!("Bearer {}", api_key))
            }
        };

        info!("Forwarding {} request to: {}", provider, target_url);
        debug!("{} request body: {}", provider, target_body);

        let response = target_request
            .json(&target_body)
            .send()
            .await
            .map_err(|e| self.transport_error(provider, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(provider, e))?;

        debug!("raw {} response ({}): {}", provider, status, body);

        if !status.is_success() {
            warn!("{} request failed with status {}: {}", provider, status, body);
            return Err(GatewayError::Upstream {
                provider,
                status,
                message: upstream_error_message(&body),
            });
        }

        let raw: Value = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Decode { provider, message: e.to_string() })?;
        Self::normalize(provider, raw)
    }
}
