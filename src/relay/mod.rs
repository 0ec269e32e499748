// src/relay/mod.rs

pub mod agent;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod event;
pub mod orchestrator;
pub mod protocol;
pub mod transcript;

// Let's explicitly export the core types so we don't have to reach them through their modules,
// e.g. agent_relay::relay::Orchestrator instead of agent_relay::relay::orchestrator::Orchestrator
pub use agent::Agent;
pub use orchestrator::Orchestrator;
pub use protocol::ProtocolMessage;
