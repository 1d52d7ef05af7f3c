use crate::converters::helpers::lenient;
use crate::converters::openai::OpenAIChoice;
use crate::models::Completion;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NO_RESPONSE_PLACEHOLDER: &str = "(no response)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIResponse {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub choices: Option<Vec<OpenAIChoice>>,
    #[serde(default)]
    pub usage: Option<Value>,
}

impl OpenAIResponse {
    pub fn first_choice(&self) -> Option<&OpenAIChoice> {
        self.choices.as_ref().and_then(|c| c.first())
    }

    /// First choice's message content, untrimmed; `(no response)` when absent or empty.
    pub fn text_or_placeholder(&self) -> String {
        self.first_choice()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.text())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string())
    }

    /// Fails only when the body is not a JSON object; odd field types read as absent.
    pub fn normalize(raw: Value) -> Result<Completion, serde_json::Error> {
        if !raw.is_object() {
            return Err(serde::de::Error::custom("expected a JSON object"));
        }
        let resp: OpenAIResponse = serde_json::from_value(raw.clone())?;
        Ok(Completion {
            text: resp.text_or_placeholder(),
            finish_reason: resp.first_choice().and_then(|c| c.finish_reason.clone()),
            usage: resp.usage.clone(),
            model_version: resp.model.clone(),
            raw,
        })
    }
}
