use crate::config::Provider;
use crate::error::GatewayError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// Provider-agnostic prompt, as posted by callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, deserialize_with = "number_or_none", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Number>,
    #[serde(default, deserialize_with = "number_or_none", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Number>,
}

// Strings, nulls, booleans and objects are all "absent": the adapter default applies.
fn number_or_none<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => Ok(Some(n)),
        _ => Ok(None),
    }
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Number::from_f64(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(Number::from(max_tokens));
        self
    }

    /// The prompt is opaque text: it is checked for emptiness but never trimmed.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.prompt.is_empty() {
            return Err(GatewayError::InvalidRequest("prompt is required".to_string()));
        }
        Ok(())
    }
}

/// A successful, normalized provider answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: Option<Value>,
    pub model_version: Option<String>,
    /// Upstream body exactly as received
    pub raw: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Running,
    Done,
    Error,
}

/// Wire form of one provider's outcome in fan-out responses.
///
/// Exactly one of `text` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResult {
    pub provider: Provider,
    pub status: CallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<Value>,
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

impl CanonicalResult {
    pub fn new(provider: Provider, result: &Result<Completion, GatewayError>, latency_ms: u64) -> Self {
        match result {
            Ok(c) => Self {
                provider,
                status: CallStatus::Done,
                text: Some(c.text.clone()),
                finish_reason: c.finish_reason.clone(),
                usage: c.usage.clone(),
                model_version: c.model_version.clone(),
                error: None,
                latency_ms,
            },
            Err(e) => Self {
                provider,
                status: CallStatus::Error,
                text: None,
                finish_reason: None,
                usage: None,
                model_version: None,
                error: Some(e.to_string()),
                latency_ms,
            },
        }
    }
}

/// Body of `POST /api/gemini`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiReply {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage_metadata: Option<Value>,
    pub model_version: Option<String>,
}

impl From<Completion> for GeminiReply {
    fn from(c: Completion) -> Self {
        Self {
            text: c.text,
            finish_reason: c.finish_reason,
            usage_metadata: c.usage,
            model_version: c.model_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_numeric_options_are_absent() {
        let req: PromptRequest = serde_json::from_value(json!({
            "prompt": "hi",
            "temperature": "0.9",
            "maxTokens": null
        }))
        .unwrap();
        assert_eq!(req.temperature, None);
        assert_eq!(req.max_tokens, None);

        let req: PromptRequest = serde_json::from_value(json!({
            "prompt": "hi",
            "temperature": true,
            "maxTokens": {"n": 5}
        }))
        .unwrap();
        assert_eq!(req.temperature, None);
        assert_eq!(req.max_tokens, None);
    }

    #[test]
    fn test_numeric_options_kept() {
        let req: PromptRequest = serde_json::from_value(json!({
            "prompt": "hi",
            "temperature": 0.25,
            "maxTokens": 128
        }))
        .unwrap();
        assert_eq!(req.temperature, Number::from_f64(0.25));
        assert_eq!(req.max_tokens, Some(Number::from(128)));
    }

    #[test]
    fn test_validate() {
        assert!(PromptRequest::default().validate().is_err());
        // whitespace is still a prompt; it is never trimmed
        assert!(PromptRequest::new("  ").validate().is_ok());
    }

    #[test]
    fn test_canonical_result_shape() {
        let ok = Ok(Completion {
            text: "4".to_string(),
            finish_reason: Some("STOP".to_string()),
            usage: None,
            model_version: None,
            raw: json!({}),
        });
        let value = serde_json::to_value(CanonicalResult::new(Provider::Gemini, &ok, 12)).unwrap();
        assert_eq!(value["status"], "done");
        assert_eq!(value["text"], "4");
        assert_eq!(value["latencyMs"], 12);
        assert!(value.get("error").is_none());

        let failed = Err(GatewayError::MissingCredential("GROQ_API_KEY".to_string()));
        let value = serde_json::to_value(CanonicalResult::new(Provider::Groq, &failed, 0)).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "GROQ_API_KEY not set");
        assert!(value.get("text").is_none());
        assert_eq!(value["finishReason"], Value::Null);
    }
}
