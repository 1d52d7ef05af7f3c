use crate::config::ProviderSettings;
use crate::models::PromptRequest;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

// Numeric-or-default, one rule per field, shared by every adapter.

pub fn temperature_or_default(request: &PromptRequest, settings: &ProviderSettings) -> Number {
    match &request.temperature {
        Some(t) => t.clone(),
        None => Number::from_f64(settings.default_temperature).unwrap_or_else(|| Number::from(0)),
    }
}

pub fn max_tokens_or_default(request: &PromptRequest, settings: &ProviderSettings) -> Number {
    match &request.max_tokens {
        Some(m) => m.clone(),
        None => Number::from(settings.default_max_tokens),
    }
}

/// For upstream fields read best-effort: a value of an unexpected type reads
/// as absent instead of failing the whole body.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Pull a human-readable message out of an upstream error body.
///
/// Gemini, Groq and OpenAI all use `{"error": {"message": ...}}`; anything
/// else falls back to the (truncated) raw body.
pub fn upstream_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .and_then(Value::as_str)
            .or_else(|| v.get("error").and_then(Value::as_str))
    });
    match message {
        Some(m) => m.to_string(),
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => truncate(body.trim(), 500),
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}…", &s[..idx]),
    }
}
