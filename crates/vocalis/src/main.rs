// SPDX-FileCopyrightText: 2026 Vocalis Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vocalis - conversational avatars that speak while they think and
//! remember each user separately.
//!
//! This is the binary entry point.

mod chat;
mod config_cmd;
mod memory_cmd;
mod services;
mod shutdown;
mod sink;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vocalis_core::{TenantScope, VocalisError};

use crate::chat::SpeakOptions;

/// Vocalis - streaming speech with per-user memory.
#[derive(Parser, Debug)]
#[command(name = "vocalis", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// The (avatar, user) pair a command acts for.
#[derive(Args, Debug, Clone)]
struct ScopeArgs {
    /// Avatar identifier.
    #[arg(long)]
    avatar: String,
    /// User identifier.
    #[arg(long)]
    user: String,
}

impl From<ScopeArgs> for TenantScope {
    fn from(args: ScopeArgs) -> Self {
        TenantScope::new(args.avatar, args.user)
    }
}

#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Directory receiving one numbered audio file per sentence.
    #[arg(long, default_value = "vocalis-audio")]
    out_dir: PathBuf,
    /// Voice to use instead of `elevenlabs.voice_id`.
    #[arg(long)]
    voice: Option<String>,
    /// Do not print captions.
    #[arg(long, short)]
    quiet: bool,
}

impl From<OutputArgs> for SpeakOptions {
    fn from(args: OutputArgs) -> Self {
        SpeakOptions {
            out_dir: args.out_dir,
            voice: args.voice,
            quiet: args.quiet,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a message and speak the avatar's streamed reply.
    Chat {
        #[command(flatten)]
        scope: ScopeArgs,
        #[command(flatten)]
        output: OutputArgs,
        /// The user's message.
        message: String,
    },
    /// Speak literal text through the sentence pipeline.
    Speak {
        #[command(flatten)]
        output: OutputArgs,
        /// Text to speak.
        text: String,
    },
    /// Print the memories an avatar holds about a user that match a query.
    Recall {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Maximum number of fragments (defaults to `memory.top_k`).
        #[arg(long)]
        top_k: Option<usize>,
        query: String,
    },
    /// Record a user statement and extract memories from it.
    Remember {
        #[command(flatten)]
        scope: ScopeArgs,
        text: String,
    },
    /// Delete one memory fragment.
    Forget {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Fragment id as printed by `recall`.
        id: String,
    },
    /// Validate and print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match vocalis_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            vocalis_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);
    vocalis_speech::recording::register_metrics();
    vocalis_memory::recording::register_metrics();

    let result: Result<(), VocalisError> = match cli.command {
        Commands::Chat {
            scope,
            output,
            message,
        } => chat::run_chat(&config, scope.into(), message, output.into()).await,
        Commands::Speak { output, text } => chat::run_speak(&config, text, output.into()).await,
        Commands::Recall {
            scope,
            top_k,
            query,
        } => memory_cmd::run_recall(&config, scope.into(), query, top_k).await,
        Commands::Remember { scope, text } => {
            memory_cmd::run_remember(&config, scope.into(), text).await
        }
        Commands::Forget { scope, id } => memory_cmd::run_forget(&config, scope.into(), id).await,
        Commands::Config => config_cmd::run_config(&config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence over `agent.log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vocalis={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = vocalis_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.name, "vocalis");
    }

    #[test]
    fn chat_parses_scope_and_message() {
        let cli = Cli::try_parse_from([
            "vocalis", "chat", "--avatar", "grandma", "--user", "alice", "--out-dir", "/tmp/x",
            "Tell me a story",
        ])
        .unwrap();
        match cli.command {
            Commands::Chat {
                scope,
                output,
                message,
            } => {
                let scope: TenantScope = scope.into();
                assert_eq!(scope, TenantScope::new("grandma", "alice"));
                assert_eq!(output.out_dir, PathBuf::from("/tmp/x"));
                assert!(output.voice.is_none());
                assert_eq!(message, "Tell me a story");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn recall_requires_both_scope_ids() {
        assert!(Cli::try_parse_from(["vocalis", "recall", "--avatar", "a", "dogs"]).is_err());
        let cli =
            Cli::try_parse_from(["vocalis", "recall", "--avatar", "a", "--user", "u", "--top-k", "2", "dogs"])
                .unwrap();
        assert!(matches!(cli.command, Commands::Recall { top_k: Some(2), .. }));
    }

    #[test]
    fn speak_defaults_output_dir() {
        let cli = Cli::try_parse_from(["vocalis", "speak", "-q", "Hello."]).unwrap();
        match cli.command {
            Commands::Speak { output, text } => {
                assert_eq!(output.out_dir, PathBuf::from("vocalis-audio"));
                assert!(output.quiet);
                assert_eq!(text, "Hello.");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
