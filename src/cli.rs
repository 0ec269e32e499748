//! Command-line interface definition using clap.

use agent_relay::clients::common::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use agent_relay::config::{BackendKind, DEFAULT_TRANSCRIPT_PATH, DEFAULT_TURNS};
use std::path::PathBuf;

/// Run a researcher/synthesizer conversation and save its transcript
#[derive(clap::Parser, Debug)]
#[command(name = "agent-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Initial research query
    #[arg(long)]
    pub query: String,

    /// Number of conversation turns
    #[arg(long, default_value_t = DEFAULT_TURNS)]
    pub turns: usize,

    /// Output file for transcript
    #[arg(long, default_value = DEFAULT_TRANSCRIPT_PATH)]
    pub output: PathBuf,

    /// Researcher agent backend (groq or openai)
    #[arg(long, default_value_t = BackendKind::Groq)]
    pub researcher: BackendKind,

    /// Model for researcher agent (backend default when omitted)
    #[arg(long)]
    pub researcher_model: Option<String>,

    /// Synthesizer agent backend (groq or openai)
    #[arg(long, default_value_t = BackendKind::Groq)]
    pub synthesizer: BackendKind,

    /// Model for synthesizer agent (backend default when omitted)
    #[arg(long)]
    pub synthesizer_model: Option<String>,

    /// Sampling temperature for both agents
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Maximum completion tokens for both agents
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Enable verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Default log filter derived from `-v` count; `RUST_LOG` still wins.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "agent_relay=info,warn",
            1 => "agent_relay=debug,info",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_match_documented_surface() {
        let cli = Cli::try_parse_from(["agent-relay", "--query", "What is quantum entanglement?"])
            .unwrap();
        assert_eq!(cli.turns, 3);
        assert_eq!(cli.output, PathBuf::from("mcp_transcript.json"));
        assert_eq!(cli.researcher, BackendKind::Groq);
        assert_eq!(cli.synthesizer, BackendKind::Groq);
        assert_eq!(cli.temperature, 0.7);
        assert_eq!(cli.max_tokens, 2048);
        assert!(cli.researcher_model.is_none());
        assert_eq!(cli.log_filter(), "agent_relay=info,warn");
    }

    #[test]
    fn query_is_required() {
        assert!(Cli::try_parse_from(["agent-relay"]).is_err());
    }

    #[test]
    fn backend_and_models_are_parsed() {
        let cli = Cli::try_parse_from([
            "agent-relay",
            "--query",
            "q",
            "--turns",
            "1",
            "--researcher",
            "OpenAI",
            "--researcher-model",
            "gpt-4.1",
            "--synthesizer-model",
            "mixtral-8x7b-32768",
            "--temperature",
            "0.2",
            "--max-tokens",
            "512",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.turns, 1);
        assert_eq!(cli.researcher, BackendKind::OpenAI);
        assert_eq!(cli.synthesizer, BackendKind::Groq);
        assert_eq!(cli.temperature, 0.2);
        assert_eq!(cli.max_tokens, 512);
        assert_eq!(cli.researcher_model.as_deref(), Some("gpt-4.1"));
        assert_eq!(cli.synthesizer_model.as_deref(), Some("mixtral-8x7b-32768"));
        assert_eq!(cli.log_filter(), "trace");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = Cli::try_parse_from(["agent-relay", "--query", "q", "--researcher", "claude"])
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported agent type: claude"));
    }
}
