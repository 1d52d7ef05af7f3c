use crate::converters::gemini::GeminiContent;
use crate::converters::helpers::lenient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiCandidate {
    // Missing entirely when the candidate was blocked
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<GeminiContent>,
    // Kept as the raw enum string (STOP, MAX_TOKENS, SAFETY, ...) so new values pass through
    #[serde(rename = "finishReason")]
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}
