use crate::config::ProviderSettings;
use crate::converters::gemini::{GeminiContent, GeminiGenerationConfig, GeminiPart};
use crate::converters::helpers::{max_tokens_or_default, temperature_or_default};
use crate::models::PromptRequest;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

impl GeminiRequest {
    /// Single-turn request; the model is part of the URL, not the body.
    pub fn from_prompt(request: &PromptRequest, settings: &ProviderSettings) -> Self {
        let generation_config = settings.forward_sampling.then(|| GeminiGenerationConfig {
            temperature: Some(temperature_or_default(request, settings)),
            max_output_tokens: Some(max_tokens_or_default(request, settings)),
        });
        GeminiRequest {
            contents: vec![GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(request.prompt.clone())],
            }],
            generation_config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use serde_json::json;

    #[test]
    fn test_wire_shape_with_defaults() {
        let settings = ProviderSettings::defaults_for(Provider::Gemini);
        let req = GeminiRequest::from_prompt(&PromptRequest::new("2+2"), &settings);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "contents": [{"parts": [{"text": "2+2"}]}],
                "generationConfig": {"temperature": 0.7, "maxOutputTokens": 512}
            })
        );
    }

    #[test]
    fn test_prompt_is_not_trimmed() {
        let settings = ProviderSettings::defaults_for(Provider::Gemini);
        let req = GeminiRequest::from_prompt(&PromptRequest::new("  hi \n"), &settings);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "  hi \n");
    }

    #[test]
    fn test_sampling_can_be_disabled() {
        let mut settings = ProviderSettings::defaults_for(Provider::Gemini);
        settings.forward_sampling = false;
        let req = GeminiRequest::from_prompt(&PromptRequest::new("x").with_temperature(1.0), &settings);
        assert!(serde_json::to_value(&req).unwrap().get("generationConfig").is_none());
    }
}
