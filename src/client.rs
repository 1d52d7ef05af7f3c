use crate::config::Provider;
use crate::converters::openai::NO_RESPONSE_PLACEHOLDER;
use crate::models::{CallStatus, PromptRequest};
use anyhow::bail;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

/// State of one provider panel on the caller's side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelUpdate {
    pub provider: Provider,
    pub status: CallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: Option<u64>,
}

impl PanelUpdate {
    pub fn running(provider: Provider) -> Self {
        Self {
            provider,
            status: CallStatus::Running,
            text: None,
            error: None,
            duration_ms: None,
        }
    }
}

/// Text to show for a provider's successful gateway response.
///
/// `/api/gemini` answers `{text, ...}`; the other two pass the chat-completion
/// body through, so the text sits in `choices[0].message.content`.
pub fn display_text(provider: Provider, body: &Value) -> String {
    let text = match provider {
        Provider::Gemini => body.get("text"),
        Provider::Groq | Provider::OpenAI => body.pointer("/choices/0/message/content"),
    };
    text.and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or(NO_RESPONSE_PLACEHOLDER)
        .to_string()
}

/// Calls the gateway's per-provider endpoints, one request each.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, provider: Provider) -> String {
        format!("{}/api/{}", self.base_url.trim_end_matches('/'), provider)
    }

    async fn fetch(&self, provider: Provider, request: &PromptRequest) -> anyhow::Result<String> {
        let response = self.http.post(self.endpoint(provider)).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        debug!("{} gateway response ({}): {}", provider, status, body);

        if !status.is_success() {
            match body.get("error").and_then(Value::as_str) {
                Some(message) => bail!("{}", message),
                None => bail!("HTTP {}", status),
            }
        }
        Ok(display_text(provider, &body))
    }

    /// One provider, timed. Never fails; errors land in the update.
    pub async fn call(&self, provider: Provider, request: &PromptRequest) -> PanelUpdate {
        let started = Instant::now();
        let result = self.fetch(provider, request).await;
        let duration_ms = Some(started.elapsed().as_millis() as u64);
        match result {
            Ok(text) => PanelUpdate {
                provider,
                status: CallStatus::Done,
                text: Some(text),
                error: None,
                duration_ms,
            },
            Err(e) => PanelUpdate {
                provider,
                status: CallStatus::Error,
                text: None,
                error: Some(e.to_string()),
                duration_ms,
            },
        }
    }

    /// Marks every provider running, then reports each as it settles.
    ///
    /// The returned status is advisory: `Done` only when all providers succeeded.
    pub async fn ask_all<F>(&self, request: &PromptRequest, mut on_update: F) -> CallStatus
    where
        F: FnMut(&PanelUpdate),
    {
        for provider in Provider::ALL {
            on_update(&PanelUpdate::running(provider));
        }

        let mut pending: FuturesUnordered<_> = Provider::ALL
            .into_iter()
            .map(|provider| self.call(provider, request))
            .collect();

        let mut all_ok = true;
        while let Some(update) = pending.next().await {
            all_ok &= update.status == CallStatus::Done;
            on_update(&update);
        }

        if all_ok { CallStatus::Done } else { CallStatus::Error }
    }
}
