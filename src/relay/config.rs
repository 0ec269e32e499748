//! Backend and agent configuration.
//!
//! Provides [`BackendKind`] / [`BackendConfig`] for turning a backend name plus environment
//! credentials into a ready [`ClientWrapper`], and [`AgentProfile`] for the two built-in
//! participants. Configuration errors are fatal and are reported before any turn runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_relay::config::{AgentProfile, BackendConfig, BackendKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = BackendConfig::from_env(BackendKind::Groq, None)?;
//! let researcher = AgentProfile::researcher().build(backend.into_client());
//! assert_eq!(researcher.name, "ResearchBot");
//! # Ok(())
//! # }
//! ```

use crate::relay::agent::Agent;
use crate::relay::client_wrapper::ClientWrapper;
use crate::relay::clients::common::CompletionSettings;
use crate::relay::clients::groq::GroqClient;
use crate::relay::clients::openai::OpenAIClient;
use std::env;
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Optional OpenAI compatible proxy (LiteLLM) used by OpenAI backed agents.
pub const LITELLM_BASE_URL_VAR: &str = "LITELLM_BASE_URL";

/// Default transcript destination.
pub const DEFAULT_TRANSCRIPT_PATH: &str = "mcp_transcript.json";
/// Default number of researcher/synthesizer turns.
pub const DEFAULT_TURNS: usize = 3;

/// Fatal configuration problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The credential variable for the selected backend is unset or empty.
    MissingCredential(&'static str),
    /// The backend name is not one of `groq` / `openai`.
    UnsupportedBackend(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingCredential(var) => {
                write!(f, "{} environment variable is required", var)
            }
            ConfigError::UnsupportedBackend(name) => write!(f, "Unsupported agent type: {}", name),
        }
    }
}

impl Error for ConfigError {}

/// Supported model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Groq,
    OpenAI,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Groq => "groq",
            BackendKind::OpenAI => "openai",
        }
    }

    /// Model used when none is given explicitly.
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::Groq => "llama3-70b-8192",
            BackendKind::OpenAI => "gpt-4o",
        }
    }

    pub fn api_key_var(&self) -> &'static str {
        match self {
            BackendKind::Groq => GROQ_API_KEY_VAR,
            BackendKind::OpenAI => OPENAI_API_KEY_VAR,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "groq" => Ok(BackendKind::Groq),
            "openai" => Ok(BackendKind::OpenAI),
            _ => Err(ConfigError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// Everything needed to build one backend client.
#[derive(Clone, PartialEq)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub model: String,
    pub api_key: String,
    /// Only honoured for [`BackendKind::OpenAI`].
    pub base_url: Option<String>,
    /// Sampling parameters, temperature 0.7 and 2048 max tokens unless overridden.
    pub settings: CompletionSettings,
}

impl BackendConfig {
    /// Build from explicit values, falling back to the backend's default model.
    pub fn new(kind: BackendKind, model: Option<String>, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.unwrap_or_else(|| kind.default_model().to_string()),
            api_key: api_key.into(),
            base_url: None,
            settings: CompletionSettings::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.settings.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.settings.max_tokens = max_tokens;
        self
    }

    /// Read credentials from the process environment.
    pub fn from_env(kind: BackendKind, model: Option<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(kind, model, |var| env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable lookup.
    pub fn from_lookup<F>(
        kind: BackendKind,
        model: Option<String>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(kind.api_key_var())
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingCredential(kind.api_key_var()))?;

        let mut config = Self::new(kind, model, api_key);
        if kind == BackendKind::OpenAI {
            config.base_url = lookup(LITELLM_BASE_URL_VAR).filter(|url| !url.trim().is_empty());
        }
        Ok(config)
    }

    /// Whether requests go through a LiteLLM proxy instead of the provider directly.
    pub fn uses_proxy(&self) -> bool {
        self.kind == BackendKind::OpenAI && self.base_url.is_some()
    }

    pub fn into_client(self) -> Arc<dyn ClientWrapper> {
        match (self.kind, self.base_url) {
            (BackendKind::Groq, _) => Arc::new(
                GroqClient::new_with_model_str(&self.api_key, &self.model)
                    .with_settings(self.settings),
            ),
            (BackendKind::OpenAI, Some(base_url)) => Arc::new(
                OpenAIClient::new_with_base_url(&self.api_key, &self.model, &base_url)
                    .with_settings(self.settings),
            ),
            (BackendKind::OpenAI, None) => Arc::new(
                OpenAIClient::new_with_model_string(&self.api_key, &self.model)
                    .with_settings(self.settings),
            ),
        }
    }
}

impl fmt::Debug for BackendConfig {
    // Keeps the API key out of logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Identity and directive of one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    pub role: String,
    pub system_prompt: Option<String>,
}

impl AgentProfile {
    /// The primary participant: gathers information on the query.
    pub fn researcher() -> Self {
        Self {
            id: "researcher_1".to_string(),
            name: "ResearchBot".to_string(),
            role: "information_gatherer".to_string(),
            system_prompt: Some(
                "You are ResearchBot, an AI research assistant.\n\
                 Your role is to find and provide comprehensive information on given topics.\n\
                 Focus on gathering facts, citing sources when possible, and covering different perspectives.\n\
                 Organize information clearly and identify any gaps in knowledge.\n"
                    .to_string(),
            ),
        }
    }

    /// The secondary participant: critiques and condenses the research.
    pub fn synthesizer() -> Self {
        Self {
            id: "synthesizer_1".to_string(),
            name: "SynthBot".to_string(),
            role: "critic_summarizer".to_string(),
            system_prompt: Some(
                "You are SynthBot, an AI synthesis and critique specialist.\n\
                 Your role is to analyze information provided by a researcher, extract key insights,\n\
                 identify patterns, evaluate the quality of information, highlight limitations,\n\
                 and suggest areas for further investigation.\n\
                 Be critical but constructive, and always strive for objectivity.\n"
                    .to_string(),
            ),
        }
    }

    pub fn build(self, client: Arc<dyn ClientWrapper>) -> Agent {
        Agent::new(self.id, self.name, self.role, self.system_prompt, client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn backend_names_parse_case_insensitively() {
        assert_eq!("Groq".parse::<BackendKind>(), Ok(BackendKind::Groq));
        assert_eq!("OPENAI".parse::<BackendKind>(), Ok(BackendKind::OpenAI));
        assert_eq!(
            "claude".parse::<BackendKind>(),
            Err(ConfigError::UnsupportedBackend("claude".to_string()))
        );
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = BackendConfig::from_lookup(BackendKind::Groq, None, lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingCredential(GROQ_API_KEY_VAR));
        assert_eq!(err.to_string(), "GROQ_API_KEY environment variable is required");

        let blank = BackendConfig::from_lookup(
            BackendKind::OpenAI,
            None,
            lookup(&[(OPENAI_API_KEY_VAR, "  ")]),
        );
        assert!(blank.is_err());
    }

    #[test]
    fn default_models_follow_backend() {
        let groq =
            BackendConfig::from_lookup(BackendKind::Groq, None, lookup(&[(GROQ_API_KEY_VAR, "g")]))
                .unwrap();
        assert_eq!(groq.model, "llama3-70b-8192");

        let openai = BackendConfig::from_lookup(
            BackendKind::OpenAI,
            Some("gpt-4.1".to_string()),
            lookup(&[(OPENAI_API_KEY_VAR, "o")]),
        )
        .unwrap();
        assert_eq!(openai.model, "gpt-4.1");
        assert!(!openai.uses_proxy());
    }

    #[test]
    fn litellm_proxy_applies_to_openai_only() {
        let vars = [
            (OPENAI_API_KEY_VAR, "o"),
            (GROQ_API_KEY_VAR, "g"),
            (LITELLM_BASE_URL_VAR, "http://localhost:4000"),
        ];
        let openai = BackendConfig::from_lookup(BackendKind::OpenAI, None, lookup(&vars)).unwrap();
        assert_eq!(openai.base_url.as_deref(), Some("http://localhost:4000"));
        assert!(openai.uses_proxy());

        let groq = BackendConfig::from_lookup(BackendKind::Groq, None, lookup(&vars)).unwrap();
        assert!(groq.base_url.is_none());
        assert!(!groq.uses_proxy());
    }

    #[test]
    fn sampling_settings_default_and_override() {
        let config = BackendConfig::new(BackendKind::Groq, None, "g");
        assert_eq!(config.settings, CompletionSettings::default());
        assert_eq!(config.settings.temperature, 0.7);
        assert_eq!(config.settings.max_tokens, 2048);

        let tuned = config.with_temperature(0.3).with_max_tokens(1024);
        assert_eq!(tuned.settings.temperature, 0.3);
        assert_eq!(tuned.settings.max_tokens, 1024);
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = BackendConfig::new(BackendKind::Groq, None, "super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn built_in_profiles() {
        let researcher = AgentProfile::researcher();
        assert_eq!(researcher.id, "researcher_1");
        assert_eq!(researcher.role, "information_gatherer");
        let synthesizer = AgentProfile::synthesizer();
        assert_eq!(synthesizer.name, "SynthBot");
        assert!(synthesizer
            .system_prompt
            .as_deref()
            .unwrap_or_default()
            .starts_with("You are SynthBot"));
    }
}
