use crate::config::ProviderSettings;
use crate::converters::helpers::{max_tokens_or_default, temperature_or_default};
use crate::converters::openai::OpenAIMessage;
use crate::models::PromptRequest;
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Chat-completion request body; Groq speaks the same dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAIRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Number>,
}

impl OpenAIRequest {
    pub fn from_prompt(request: &PromptRequest, settings: &ProviderSettings) -> Self {
        let (temperature, max_tokens) = if settings.forward_sampling {
            (
                Some(temperature_or_default(request, settings)),
                Some(max_tokens_or_default(request, settings)),
            )
        } else {
            (None, None)
        };
        OpenAIRequest {
            model: settings.model.clone(),
            messages: vec![OpenAIMessage::user(request.prompt.clone())],
            temperature,
            max_tokens,
        }
    }
}
