use agent_relay::client_wrapper::{ClientError, ClientWrapper, Message, Role, TokenUsage};
use agent_relay::{Agent, AgentError, BackendFailurePolicy, ProtocolMessage};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Replies with a fixed text and remembers what it was sent.
struct MockClient {
    response: String,
    seen: Mutex<Vec<Vec<Message>>>,
    usage: tokio::sync::Mutex<Option<TokenUsage>>,
}

impl MockClient {
    fn new(response: &str) -> Self {
        MockClient {
            response: response.to_string(),
            seen: Mutex::new(Vec::new()),
            usage: tokio::sync::Mutex::new(None),
        }
    }

    fn calls(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClientWrapper for MockClient {
    async fn send_message(&self, messages: &[Message]) -> Result<Message, ClientError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        *self.usage.lock().await = Some(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        });
        Ok(Message::new(Role::Assistant, &self.response))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn usage_slot(&self) -> Option<&tokio::sync::Mutex<Option<TokenUsage>>> {
        Some(&self.usage)
    }
}

struct FailingClient;

#[async_trait]
impl ClientWrapper for FailingClient {
    async fn send_message(&self, _messages: &[Message]) -> Result<Message, ClientError> {
        Err("connection refused".into())
    }

    fn model_name(&self) -> &str {
        "broken"
    }

    fn provider_name(&self) -> &str {
        "Groq"
    }
}

fn researcher(client: Arc<dyn ClientWrapper>) -> Agent {
    Agent::new(
        "researcher_1",
        "ResearchBot",
        "information_gatherer",
        None,
        client,
    )
}

#[test]
fn test_new_agent_seeds_system_directive() {
    let agent = researcher(Arc::new(MockClient::new("ok")));

    assert_eq!(agent.messages().len(), 1);
    let system = agent.system_message();
    assert_eq!(system.role(), Role::System);
    assert_eq!(system.author_id(), "researcher_1");
    assert_eq!(
        system.content(),
        "You are ResearchBot, an AI assistant with the role of information_gatherer."
    );
    assert_eq!(system.message_type(), Some("system_instruction"));
    assert_eq!(agent.model_name(), "mock-model");
    assert_eq!(agent.failure_policy(), BackendFailurePolicy::DegradeToContent);
}

#[test]
fn test_explicit_system_prompt_is_used() {
    let agent = Agent::new(
        "synthesizer_1",
        "SynthBot",
        "critic_summarizer",
        Some("Be critical.".to_string()),
        Arc::new(MockClient::new("ok")),
    );
    assert_eq!(agent.system_message().content(), "Be critical.");
}

#[tokio::test]
async fn test_generate_response_with_prompt() {
    let client = Arc::new(MockClient::new("Entanglement links particle states."));
    let mut agent = researcher(client.clone());

    let reply = agent
        .generate_response(Some("What is quantum entanglement?"))
        .await
        .unwrap();

    // system, prompt, reply
    let log = agent.messages();
    assert_eq!(log.len(), 3);
    let prompt = &log[1];
    assert_eq!(prompt.role(), Role::User);
    assert_eq!(prompt.author_id(), "human");
    assert_eq!(prompt.message_type(), Some("query"));

    assert_eq!(reply.role(), Role::Assistant);
    assert_eq!(reply.author_id(), "researcher_1");
    assert_eq!(reply.content(), "Entanglement links particle states.");
    assert_eq!(reply.references(), &[prompt.id().to_string()]);
    assert_eq!(
        reply.metadata().get("agent_role").and_then(|v| v.as_str()),
        Some("information_gatherer")
    );
    assert_eq!(agent.last_message(), Some(&reply));

    // The backend only ever sees role/content, system first.
    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[0][0].role, Role::System);
    assert_eq!(&*calls[0][1].content, "What is quantum entanglement?");
}

#[tokio::test]
async fn test_response_without_preceding_user_message_has_no_references() {
    let mut agent = researcher(Arc::new(MockClient::new("unprompted")));
    let reply = agent.generate_response(None).await.unwrap();
    assert!(reply.references().is_empty());

    // The last entry is now assistant-role, so the next reply has no references either.
    let again = agent.generate_response(None).await.unwrap();
    assert!(again.references().is_empty());
    assert_eq!(agent.messages().len(), 3);
}

#[tokio::test]
async fn test_response_references_received_user_message() {
    let mut agent = researcher(Arc::new(MockClient::new("answer")));
    let instruction = ProtocolMessage::new(Role::User, "Investigate further.", "orchestrator");
    let instruction_id = instruction.id().to_string();
    agent.add_message(instruction).await;

    let reply = agent.generate_response(None).await.unwrap();
    assert!(reply.responds_to(&instruction_id));
}

#[tokio::test]
async fn test_backend_failure_degrades_to_content() {
    let mut agent = researcher(Arc::new(FailingClient));
    let reply = agent
        .generate_response(Some("What is quantum entanglement?"))
        .await
        .unwrap();

    assert!(reply.content().contains("Error in"));
    assert_eq!(
        reply.content(),
        "Error in Groq API call: connection refused"
    );
    assert_eq!(reply.role(), Role::Assistant);
    assert_eq!(reply.message_type(), Some("backend_error"));
    assert_eq!(reply.references().len(), 1);
    assert_eq!(agent.messages().len(), 3);
}

#[tokio::test]
async fn test_backend_failure_fail_round_policy() {
    let mut agent =
        researcher(Arc::new(FailingClient)).with_failure_policy(BackendFailurePolicy::FailRound);
    let err = agent.generate_response(None).await.unwrap_err();

    match &err {
        AgentError::Backend {
            agent_id,
            provider,
            message,
        } => {
            assert_eq!(agent_id, "researcher_1");
            assert_eq!(provider, "Groq");
            assert_eq!(message, "connection refused");
        }
    }
    assert!(err.to_string().contains("Error in Groq API call"));
    // Nothing was appended.
    assert_eq!(agent.messages().len(), 1);
}

#[tokio::test]
async fn test_fail_round_drops_prompt_from_log() {
    let mut agent =
        researcher(Arc::new(FailingClient)).with_failure_policy(BackendFailurePolicy::FailRound);
    assert!(agent
        .generate_response(Some("What is quantum entanglement?"))
        .await
        .is_err());

    assert_eq!(agent.messages().len(), 1);
    assert_eq!(agent.last_message().map(|m| m.role()), Some(Role::System));
}

#[tokio::test]
async fn test_empty_prompt_is_not_appended() {
    let client = Arc::new(MockClient::new("ok"));
    let mut agent = researcher(client.clone());

    let reply = agent.generate_response(Some("")).await.unwrap();

    // system, reply
    assert_eq!(agent.messages().len(), 2);
    assert!(agent.messages().iter().all(|m| m.author_id() != "human"));
    assert!(reply.references().is_empty());
    assert_eq!(client.calls()[0].len(), 1);
}

#[tokio::test]
async fn test_token_usage_is_exposed_after_response() {
    let client = Arc::new(MockClient::new("ok"));
    let mut agent = researcher(client.clone());
    assert!(client.get_last_usage().await.is_none());

    agent.generate_response(Some("hi")).await.unwrap();
    let usage = client.get_last_usage().await.unwrap();
    assert_eq!(usage.total_tokens, 15);
}
