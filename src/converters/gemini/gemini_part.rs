use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeminiPart {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    // functionCall, inlineData, executableCode, ...; none of them carry answer text
    Other(Value),
}

impl GeminiPart {
    pub fn text(text: impl Into<String>) -> Self {
        GeminiPart::Text { text: text.into(), thought: None }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            GeminiPart::Text { text, .. } => Some(text),
            GeminiPart::Other(_) => None,
        }
    }
}
