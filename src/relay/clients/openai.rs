//! The `OpenAIClient` struct implements `ClientWrapper` for OpenAI’s Chat API,
//! capturing both the assistant response and detailed token usage (input vs output).
//!
//! # Key Features
//!
//! - **send_message(...)**: converts the formatted history and returns the assistant `Message`.
//! - **Automatic Usage Capture**: stores the latest `TokenUsage` internally.
//! - **Proxy support**: [`OpenAIClient::new_with_base_url`] targets any OpenAI compatible
//!   endpoint, such as a LiteLLM proxy.
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_relay::clients::openai::{OpenAIClient, Model};
//! use agent_relay::client_wrapper::{ClientWrapper, Message, Role};
//!
//! #[tokio::main]
//! async fn main() {
//!     let secret_key: String = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
//!     let client = OpenAIClient::new_with_model_enum(&secret_key, Model::GPT4o);
//!
//!     let resp = client.send_message(&[
//!         Message::new(Role::System, "You are an assistant."),
//!         Message::new(Role::User, "Hello!"),
//!     ]).await.unwrap();
//!     println!("Assistant: {}", resp.content);
//!
//!     if let Some(usage) = client.get_last_usage().await {
//!         println!("Tokens — input: {}, output: {}", usage.input_tokens, usage.output_tokens);
//!     }
//! }
//! ```
use async_trait::async_trait;
use openai_rust::chat;
use openai_rust2 as openai_rust;
use tokio::sync::Mutex;

use crate::relay::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
use crate::relay::clients::common::{get_shared_http_client, send_and_track, CompletionSettings};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Model identifiers commonly used with OpenAI's Chat Completions API.
pub enum Model {
    /// `gpt-4o` – Omni model, the default for OpenAI backed agents.
    GPT4o,
    /// `gpt-4o-mini` – cost effective GPT-4o derivative.
    GPT4oMini,
    /// `gpt-4.1` – general availability GPT-4.1.
    GPT41,
    /// `gpt-4.1-mini` – reduced cost GPT-4.1 tier.
    GPT41Mini,
    /// `gpt-4.1-nano` – ultra low cost GPT-4.1 derivative.
    GPT41Nano,
    /// `o3-mini` – compact reasoning model.
    O3Mini,
}

/// Convert a [`Model`] variant into the string identifier expected by the REST API.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::GPT4o => "gpt-4o".to_string(),
        Model::GPT4oMini => "gpt-4o-mini".to_string(),
        Model::GPT41 => "gpt-4.1".to_string(),
        Model::GPT41Mini => "gpt-4.1-mini".to_string(),
        Model::GPT41Nano => "gpt-4.1-nano".to_string(),
        Model::O3Mini => "o3-mini".to_string(),
    }
}

/// Client wrapper for OpenAI's Chat Completions API.
///
/// The wrapper keeps the selected model identifier plus an internal [`TokenUsage`] slot so
/// callers can inspect how many tokens each request consumed. It reuses the shared HTTP
/// client configured in [`crate::relay::clients::common`].
pub struct OpenAIClient {
    /// Underlying SDK client pointing at the REST endpoint.
    client: openai_rust::Client,
    /// Model name that will be injected into each request.
    model: String,
    /// Label reported through [`ClientWrapper::provider_name`].
    provider: String,
    /// Temperature and length cap sent with every request.
    settings: CompletionSettings,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Construct a new client using the provided API key and [`Model`] variant.
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// Construct a new client using the provided API key and explicit model name.
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        OpenAIClient {
            client: openai_rust::Client::new_with_client(
                secret_key,
                get_shared_http_client().clone(),
            ),
            model: model_name.to_string(),
            provider: "OpenAI".to_string(),
            settings: CompletionSettings::default(),
            token_usage: Mutex::new(None),
        }
    }

    /// Construct a client targeting a custom OpenAI compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAIClient {
            client: openai_rust::Client::new_with_client_and_base_url(
                secret_key,
                get_shared_http_client().clone(),
                base_url,
            ),
            model: model_name.to_string(),
            provider: "OpenAI".to_string(),
            settings: CompletionSettings::default(),
            token_usage: Mutex::new(None),
        }
    }

    /// Override the provider label used in diagnostics (delegating wrappers set their own).
    pub fn with_provider_name(mut self, provider: &str) -> Self {
        self.provider = provider.to_string();
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

    pub fn with_settings(mut self, settings: CompletionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }
}

/// Convert backend messages into the format expected by openai_rust.
pub(crate) fn to_chat_messages(messages: &[Message]) -> Vec<chat::Message> {
    messages
        .iter()
        .map(|msg| chat::Message {
            role: match msg.role {
                Role::System => "system".to_owned(),
                Role::User => "user".to_owned(),
                Role::Assistant => "assistant".to_owned(),
            },
            content: msg.content.to_string(),
        })
        .collect()
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        let formatted_messages = to_chat_messages(messages);

        let content = send_and_track(
            &self.client,
            &self.model,
            formatted_messages,
            &self.settings,
            Some(CHAT_COMPLETIONS_PATH.to_string()),
            &self.token_usage,
        )
        .await
        .map_err(|e| {
            if log::log_enabled!(log::Level::Error) {
                log::error!(
                    "OpenAIClient::send_message(...): {} API Error: {}",
                    self.provider,
                    e
                );
            }
            e
        })?;

        Ok(Message::new(Role::Assistant, &content))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
