use crate::converters::gemini::GeminiCandidate;
use crate::converters::helpers::lenient;
use crate::models::Completion;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NO_TEXT_PLACEHOLDER: &str = "[no text]";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub candidates: Option<Vec<GeminiCandidate>>,
    // Passed through verbatim, so left untyped
    #[serde(rename = "usageMetadata")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<Value>,
    #[serde(rename = "modelVersion")]
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(rename = "promptFeedback")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<Value>,
}

impl GeminiResponse {
    pub fn first_candidate(&self) -> Option<&GeminiCandidate> {
        self.candidates.as_ref().and_then(|c| c.first())
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.first_candidate()
            .and_then(|c| c.finish_reason.as_deref())
            .filter(|r| !r.is_empty())
    }

    /// Text segments of the first candidate, joined in order and trimmed only at the ends.
    pub fn text(&self) -> String {
        let joined: String = self
            .first_candidate()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.iter().filter_map(|p| p.as_text()).collect())
            .unwrap_or_default();
        joined.trim().to_string()
    }

    /// Never empty: falls back to `[no text]`, with the finish reason when there is one.
    pub fn text_or_placeholder(&self) -> String {
        let text = self.text();
        if !text.is_empty() {
            return text;
        }
        match self.finish_reason() {
            Some(reason) => format!("{} finishReason={}", NO_TEXT_PLACEHOLDER, reason),
            None => NO_TEXT_PLACEHOLDER.to_string(),
        }
    }

    /// Fails only when the body is not a JSON object; odd field types read as absent.
    pub fn normalize(raw: Value) -> Result<Completion, serde_json::Error> {
        if !raw.is_object() {
            return Err(serde::de::Error::custom("expected a JSON object"));
        }
        let resp: GeminiResponse = serde_json::from_value(raw.clone())?;
        Ok(Completion {
            text: resp.text_or_placeholder(),
            finish_reason: resp.finish_reason().map(str::to_string),
            usage: resp.usage_metadata.clone().filter(|u| !u.is_null()),
            model_version: resp.model_version.clone().filter(|m| !m.is_empty()),
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate_with_parts(parts: Value, finish_reason: Value) -> Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": parts},
                "finishReason": finish_reason,
                "index": 0
            }],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5},
            "modelVersion": "gemini-2.0-flash-001"
        })
    }

    #[test]
    fn test_segments_joined_in_order() {
        let raw = candidate_with_parts(json!([{"text": "Hello, "}, {"text": "world."}]), json!("STOP"));
        let completion = GeminiResponse::normalize(raw).unwrap();
        assert_eq!(completion.text, "Hello, world.");
        assert_eq!(completion.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(completion.model_version.as_deref(), Some("gemini-2.0-flash-001"));
        assert_eq!(completion.usage.unwrap()["totalTokenCount"], 5);
    }

    #[test]
    fn test_trim_only_at_ends() {
        let raw = candidate_with_parts(json!([{"text": "\n  a "}, {"text": " b  \n"}]), json!("STOP"));
        assert_eq!(GeminiResponse::normalize(raw).unwrap().text, "a  b");
    }

    #[test]
    fn test_non_text_parts_skipped() {
        let raw = candidate_with_parts(
            json!([
                {"text": "4"},
                {"functionCall": {"name": "add", "args": {"a": 2}}},
                {"text": 5}
            ]),
            json!("STOP"),
        );
        assert_eq!(GeminiResponse::normalize(raw).unwrap().text, "4");
    }

    #[test]
    fn test_empty_text_with_finish_reason() {
        let raw = candidate_with_parts(json!([{"text": "   "}]), json!("MAX_TOKENS"));
        let completion = GeminiResponse::normalize(raw).unwrap();
        assert_eq!(completion.text, "[no text] finishReason=MAX_TOKENS");
        assert_eq!(completion.finish_reason.as_deref(), Some("MAX_TOKENS"));
    }

    #[test]
    fn test_blocked_candidate_without_content() {
        let raw = json!({"candidates": [{"finishReason": "SAFETY"}]});
        let completion = GeminiResponse::normalize(raw).unwrap();
        assert_eq!(completion.text, "[no text] finishReason=SAFETY");
        assert_eq!(completion.usage, None);
        assert_eq!(completion.model_version, None);
    }

    #[test]
    fn test_no_candidates() {
        let raw = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let completion = GeminiResponse::normalize(raw).unwrap();
        assert_eq!(completion.text, "[no text]");
        assert_eq!(completion.finish_reason, None);

        let completion = GeminiResponse::normalize(json!({"candidates": null})).unwrap();
        assert_eq!(completion.text, "[no text]");
    }

    #[test]
    fn test_odd_field_types_read_as_absent() {
        let completion = GeminiResponse::normalize(json!({"candidates": "nope"})).unwrap();
        assert_eq!(completion.text, "[no text]");

        let raw = json!({
            "candidates": [{
                "content": {"role": 1, "parts": [{"text": "4"}]},
                "finishReason": 3,
                "index": "zero"
            }],
            "modelVersion": 7
        });
        let completion = GeminiResponse::normalize(raw.clone()).unwrap();
        assert_eq!(completion.text, "4");
        assert_eq!(completion.finish_reason, None);
        assert_eq!(completion.model_version, None);
        assert_eq!(completion.raw, raw);
    }

    #[test]
    fn test_non_object_body_is_an_error() {
        assert!(GeminiResponse::normalize(json!([1, 2])).is_err());
        assert!(GeminiResponse::normalize(json!("text")).is_err());
    }
}
