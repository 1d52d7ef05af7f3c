use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    Groq,
    OpenAI,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::Groq, Provider::OpenAI];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Groq => "groq",
            Provider::OpenAI => "openai",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub model: String,
    pub api_base: String,
    /// Name of the environment variable holding the credential.
    pub api_key_env: String,
    /// Resolved once at startup; never read from the environment per request.
    pub api_key: Option<String>,
    pub default_temperature: f64,
    pub default_max_tokens: u32,
    /// Whether temperature / max tokens are sent upstream at all.
    pub forward_sampling: bool,
}

impl ProviderSettings {
    pub fn defaults_for(provider: Provider) -> Self {
        let (model, api_base, api_key_env, forward_sampling) = match provider {
            Provider::Gemini => (
                "gemini-2.0-flash-001",
                "https://generativelanguage.googleapis.com/v1beta",
                "GEMINI_API_KEY",
                true,
            ),
            // Groq only ever received model + messages
            Provider::Groq => (
                "llama-3.3-70b-versatile",
                "https://api.groq.com/openai/v1",
                "GROQ_API_KEY",
                false,
            ),
            Provider::OpenAI => (
                "gpt-3.5-turbo",
                "https://api.openai.com/v1",
                "OPENAI_API_KEY",
                true,
            ),
        };
        Self {
            model: model.to_string(),
            api_base: api_base.to_string(),
            api_key_env: api_key_env.to_string(),
            api_key: None,
            default_temperature: DEFAULT_TEMPERATURE,
            default_max_tokens: DEFAULT_MAX_TOKENS,
            forward_sampling,
        }
    }

    fn apply(mut self, overrides: ProviderOverrides) -> Self {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(api_base) = overrides.api_base {
            self.api_base = api_base;
        }
        if let Some(api_key_env) = overrides.api_key_env {
            self.api_key_env = api_key_env;
        }
        if let Some(t) = overrides.default_temperature {
            self.default_temperature = t;
        }
        if let Some(m) = overrides.default_max_tokens {
            self.default_max_tokens = m;
        }
        if let Some(f) = overrides.forward_sampling {
            self.forward_sampling = f;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub gemini: ProviderSettings,
    pub groq: ProviderSettings,
    pub openai: ProviderSettings,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini: ProviderSettings::defaults_for(Provider::Gemini),
            groq: ProviderSettings::defaults_for(Provider::Groq),
            openai: ProviderSettings::defaults_for(Provider::OpenAI),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

// On-disk shape: every field optional, unset fields keep the provider defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    gemini: ProviderOverrides,
    groq: ProviderOverrides,
    openai: ProviderOverrides,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ProviderOverrides {
    model: Option<String>,
    api_base: Option<String>,
    api_key_env: Option<String>,
    default_temperature: Option<f64>,
    default_max_tokens: Option<u32>,
    forward_sampling: Option<bool>,
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not to a mapping
        let file: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(content)?
        };
        if file.request_timeout_secs == Some(0) {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }
        let defaults = Config::default();
        Ok(Self {
            gemini: defaults.gemini.apply(file.gemini),
            groq: defaults.groq.apply(file.groq),
            openai: defaults.openai.apply(file.openai),
            request_timeout: file
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        })
    }

    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Fill in every provider's credential through `lookup`; empty values count as unset.
    pub fn with_credentials<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for provider in Provider::ALL {
            let settings = self.settings_mut(provider);
            settings.api_key = lookup(&settings.api_key_env).filter(|k| !k.is_empty());
        }
        self
    }

    pub fn with_credentials_from_env(self) -> Self {
        self.with_credentials(|name| std::env::var(name).ok())
    }

    pub fn settings(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::Gemini => &self.gemini,
            Provider::Groq => &self.groq,
            Provider::OpenAI => &self.openai,
        }
    }

    fn settings_mut(&mut self, provider: Provider) -> &mut ProviderSettings {
        match provider {
            Provider::Gemini => &mut self.gemini,
            Provider::Groq => &mut self.groq,
            Provider::OpenAI => &mut self.openai,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gemini.model, "gemini-2.0-flash-001");
        assert_eq!(config.groq.api_key_env, "GROQ_API_KEY");
        assert!(!config.groq.forward_sampling);
        assert!(config.openai.forward_sampling);
        assert_eq!(config.openai.default_max_tokens, 512);
        assert_eq!(config.gemini.default_temperature, 0.7);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
request_timeout_secs: 15
openai:
  model: gpt-4o-mini
groq:
  forward_sampling: true
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.api_base, "https://api.openai.com/v1");
        assert!(config.groq.forward_sampling);
        assert_eq!(config.gemini, ProviderSettings::defaults_for(Provider::Gemini));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = Config::from_yaml("request_timeout_secs: 0\n").unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"), "{err}");
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Config::from_yaml("openai:\n  modle: typo\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "gemini:\n  api_base: http://localhost:9999").unwrap();
        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.gemini.api_base, "http://localhost:9999");
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_credentials_lookup() {
        let config = Config::default().with_credentials(|name| match name {
            "GEMINI_API_KEY" => Some("g-key".to_string()),
            "GROQ_API_KEY" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.gemini.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.groq.api_key, None);
        assert_eq!(config.openai.api_key, None);
    }

    #[test]
    fn test_provider_names() {
        for p in Provider::ALL {
            assert_eq!(Provider::from_name(p.as_str()), Some(p));
        }
        assert_eq!(Provider::from_name("claude"), None);
        assert_eq!(serde_json::to_string(&Provider::OpenAI).unwrap(), "\"openai\"");
    }
}
