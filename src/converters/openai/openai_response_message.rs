use crate::converters::helpers::lenient;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIResponseMessage {
    #[serde(default, deserialize_with = "lenient")]
    pub role: Option<String>,
    // Null for tool-call turns; some compatible servers send arrays
    #[serde(default)]
    pub content: Option<Value>,
}

impl OpenAIResponseMessage {
    pub fn text(&self) -> Option<&str> {
        self.content.as_ref().and_then(Value::as_str)
    }
}
