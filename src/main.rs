//! agent-relay binary.
//!
//! ```bash
//! GROQ_API_KEY=xxx agent-relay --query "What is quantum entanglement?" --turns 2
//! ```

mod cli;

use agent_relay::config::{AgentProfile, BackendConfig};
use agent_relay::event::LoggingEventHandler;
use agent_relay::transcript;
use agent_relay::Orchestrator;
use clap::Parser;
use cli::Cli;
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load .env.local or .env if present (GROQ_API_KEY, OPENAI_API_KEY, LITELLM_BASE_URL)
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());

    let cli = Cli::parse();
    agent_relay::init_logger_with_default(cli.log_filter());

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    // Credentials are checked for both agents before any turn runs.
    let researcher_backend = BackendConfig::from_env(cli.researcher, cli.researcher_model.clone())?
        .with_temperature(cli.temperature)
        .with_max_tokens(cli.max_tokens);
    let synthesizer_backend =
        BackendConfig::from_env(cli.synthesizer, cli.synthesizer_model.clone())?
            .with_temperature(cli.temperature)
            .with_max_tokens(cli.max_tokens);

    println!("Starting research on: {}", cli.query);
    describe_backend("Researcher", &researcher_backend);
    describe_backend("Synthesizer", &synthesizer_backend);

    let synthesizer_profile = AgentProfile::synthesizer();
    let synthesizer_name = synthesizer_profile.name.clone();

    let researcher = AgentProfile::researcher().build(researcher_backend.into_client());
    let synthesizer = synthesizer_profile.build(synthesizer_backend.into_client());

    let mut orchestrator = Orchestrator::new(vec![researcher, synthesizer])?
        .with_event_handler(Arc::new(LoggingEventHandler));

    let results = orchestrator.run_workflow(&cli.query, cli.turns).await?;

    println!("\n{}", "=".repeat(50));
    println!("FINAL RESEARCH RESULTS");
    println!("{}", "=".repeat(50));
    match transcript::final_entry_by(&results, &synthesizer_name) {
        Some(entry) => println!("\nFINAL SYNTHESIS:\n{}\n", entry.content),
        None => println!("\nNo synthesis found in results.\n"),
    }

    orchestrator.save_transcript(&cli.output)?;
    println!("Research complete! Transcript saved to {}", cli.output.display());
    Ok(())
}

fn describe_backend(label: &str, backend: &BackendConfig) {
    println!("{}: {} ({})", label, backend.kind, backend.model);
    if backend.uses_proxy() {
        println!("Using LiteLLM as proxy for {}", label.to_lowercase());
    }
}
