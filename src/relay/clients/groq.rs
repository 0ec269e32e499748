//! Groq client wrapper built on the OpenAI-compatible transport.
//!
//! Groq serves Llama and Mixtral models behind an OpenAI compatible Chat Completions
//! endpoint, so this wrapper only picks the base URL and delegates every request to
//! [`OpenAIClient`].

use crate::relay::client_wrapper::{ClientError, ClientWrapper, Message, TokenUsage};
use crate::relay::clients::common::CompletionSettings;
use crate::relay::clients::openai::OpenAIClient;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Base URL of Groq's OpenAI compatible API (the chat path is appended by the delegate).
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai";

pub struct GroqClient {
    client: OpenAIClient,
    model: String,
}

// Production models served by Groq
#[allow(non_camel_case_types)]
pub enum Model {
    Llama3_70b8192,
    Llama3_8b8192,
    Llama33_70bVersatile,
    Llama31_8bInstant,
    Mixtral8x7b32768,
    Gemma2_9bIt,
}

pub fn model_to_string(model: Model) -> String {
    match model {
        Model::Llama3_70b8192 => "llama3-70b-8192".to_string(),
        Model::Llama3_8b8192 => "llama3-8b-8192".to_string(),
        Model::Llama33_70bVersatile => "llama-3.3-70b-versatile".to_string(),
        Model::Llama31_8bInstant => "llama-3.1-8b-instant".to_string(),
        Model::Mixtral8x7b32768 => "mixtral-8x7b-32768".to_string(),
        Model::Gemma2_9bIt => "gemma2-9b-it".to_string(),
    }
}

impl GroqClient {
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_str(secret_key, &model_to_string(model))
    }

    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        GroqClient {
            client: OpenAIClient::new_with_base_url(secret_key, model_name, GROQ_BASE_URL)
                .with_provider_name("Groq"),
            model: model_name.to_string(),
        }
    }

    pub fn with_settings(mut self, settings: CompletionSettings) -> Self {
        self.client = self.client.with_settings(settings);
        self
    }

    pub fn settings(&self) -> &CompletionSettings {
        self.client.settings()
    }
}

#[async_trait]
impl ClientWrapper for GroqClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        self.client.send_message(messages).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "Groq"
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        self.client.usage_slot()
    }
}
