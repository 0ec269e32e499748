use crate::relay::client_wrapper::{ClientError, TokenUsage};
use lazy_static::lazy_static;
use openai_rust::chat;
use openai_rust2 as openai_rust;
use std::time::Duration;
use tokio::sync::Mutex;

lazy_static! {
    /// Process-wide HTTP client shared by every provider wrapper so connections are pooled.
    static ref SHARED_HTTP_CLIENT: reqwest::Client = build_http_client();
}

fn build_http_client() -> reqwest::Client {
    reqwest::ClientBuilder::new()
        // Keep idle connections alive for 90 seconds
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        // Upper bound for a whole completion request
        .timeout(Duration::from_secs(300))
        .build()
        .unwrap_or_else(|e| {
            log::warn!(
                "clients::common::build_http_client(): falling back to default client: {}",
                e
            );
            reqwest::Client::new()
        })
}

/// Shared [`reqwest::Client`] configured for persistent connections.
pub fn get_shared_http_client() -> &'static reqwest::Client {
    &SHARED_HTTP_CLIENT
}

/// Default sampling temperature sent with every completion.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default completion length cap.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Sampling parameters applied to each chat completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        CompletionSettings {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Build the request body for `model` with `settings` applied.
pub fn chat_arguments(
    model: &str,
    formatted_msgs: Vec<chat::Message>,
    settings: &CompletionSettings,
) -> chat::ChatArguments {
    let mut chat_arguments = chat::ChatArguments::new(model, formatted_msgs);
    chat_arguments.temperature = Some(settings.temperature);
    chat_arguments.max_tokens = Some(settings.max_tokens);
    chat_arguments
}

/// Send a chat request, record its usage, and return the assistant’s content.
pub async fn send_and_track(
    api: &openai_rust::Client,
    model: &str,
    formatted_msgs: Vec<chat::Message>,
    settings: &CompletionSettings,
    url_path: Option<String>,
    usage_slot: &Mutex<Option<TokenUsage>>,
) -> Result<String, ClientError> {
    let arguments = chat_arguments(model, formatted_msgs, settings);

    let response = api.create_chat(arguments, url_path).await;

    match response {
        Ok(response) => {
            let usage = TokenUsage {
                input_tokens: response.usage.prompt_tokens as usize,
                output_tokens: response.usage.completion_tokens as usize,
                total_tokens: response.usage.total_tokens as usize,
            };

            // Store it for get_last_usage()
            *usage_slot.lock().await = Some(usage);

            match response.choices.first() {
                Some(choice) => Ok(choice.message.content.clone()),
                None => Err("API response contained no choices".into()),
            }
        }
        Err(err) => {
            log::error!(
                "agent_relay::clients::common::send_and_track(...): API Error: {}",
                err
            );
            Err(err.to_string().into())
        }
    }
}
