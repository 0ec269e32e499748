use agent_relay::client_wrapper::ClientWrapper;
use agent_relay::clients::common::get_shared_http_client;
use agent_relay::clients::groq::GroqClient;
use agent_relay::clients::openai::OpenAIClient;
use agent_relay::config::{BackendConfig, BackendKind};

#[test]
fn test_shared_http_client_is_a_singleton() {
    let first = get_shared_http_client() as *const reqwest::Client;
    let second = get_shared_http_client() as *const reqwest::Client;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_fresh_clients_report_no_usage() {
    let client = OpenAIClient::new_with_model_string("key", "gpt-4o");
    assert!(client.get_last_usage().await.is_none());
    let client = GroqClient::new_with_model_str("key", "llama3-70b-8192");
    assert!(client.get_last_usage().await.is_none());
}

#[test]
fn test_backend_config_builds_matching_client() {
    let groq = BackendConfig::new(BackendKind::Groq, None, "g").into_client();
    assert_eq!(groq.model_name(), "llama3-70b-8192");
    assert_eq!(groq.provider_name(), "Groq");

    let openai = BackendConfig::new(BackendKind::OpenAI, None, "o").into_client();
    assert_eq!(openai.model_name(), "gpt-4o");
    assert_eq!(openai.provider_name(), "OpenAI");

    let proxied = BackendConfig::new(BackendKind::OpenAI, Some("gpt-4.1".to_string()), "o")
        .with_base_url("http://localhost:4000")
        .into_client();
    assert_eq!(proxied.model_name(), "gpt-4.1");
    assert_eq!(proxied.provider_name(), "OpenAI");
}
