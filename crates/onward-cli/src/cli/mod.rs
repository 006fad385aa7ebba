//! CLI command definitions for the `onward` binary.
//!
//! Uses clap derive macros. Config-file settings can be overridden per
//! invocation with the global `--memory-*` and `--fast-answer-*` flags.

pub mod chat;
pub mod config;
pub mod kb;
pub mod memory;
pub mod practice;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use onward_types::config::{GlobalConfig, StoreKind};

/// Onward journey assistant with conversation memory and retrieval.
#[derive(Parser)]
#[command(name = "onward", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "ONWARD_OTEL")]
    pub otel: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Per-invocation overrides applied on top of `config.toml`.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Session memory backend: in_memory, json or none.
    #[arg(long, global = true)]
    pub memory_store: Option<StoreKind>,

    /// Session memory JSON file (json backend).
    #[arg(long, global = true)]
    pub memory_path: Option<PathBuf>,

    /// Number of session entries recalled per turn.
    #[arg(long, global = true)]
    pub memory_k: Option<usize>,

    /// Maximum entries kept per session.
    #[arg(long, global = true)]
    pub memory_max_items: Option<usize>,

    /// Similarity at or above which a prior answer is reused.
    #[arg(long, global = true)]
    pub fast_answer_threshold: Option<f32>,

    /// Never reuse prior answers.
    #[arg(long, global = true)]
    pub no_fast_answer: bool,

    /// Knowledge-base JSON file.
    #[arg(long, global = true)]
    pub knowledge_path: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut GlobalConfig) {
        if let Some(store) = self.memory_store {
            config.memory.store = store;
        }
        if let Some(path) = &self.memory_path {
            config.memory.path = path.clone();
        }
        if let Some(k) = self.memory_k {
            config.memory.k = k;
        }
        if let Some(max) = self.memory_max_items {
            config.memory.max_items = Some(max);
        }
        if let Some(threshold) = self.fast_answer_threshold {
            config.fast_answer.threshold = threshold;
        }
        if self.no_fast_answer {
            config.fast_answer.enabled = false;
        }
        if let Some(path) = &self.knowledge_path {
            config.knowledge.path = Some(path.clone());
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session.
    Chat {
        /// Session to continue; a new one is started when omitted.
        #[arg(long, short)]
        session: Option<String>,

        /// Tags used to filter best practices (comma-separated).
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Answer a single question and exit.
    Ask {
        /// The question.
        query: String,

        #[arg(long, short)]
        session: Option<String>,

        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Continue a conversation handed over from the upstream chatbot.
    Handoff {
        /// JSON file with the handoff package.
        file: PathBuf,

        #[arg(long, short)]
        session: Option<String>,
    },

    /// Inspect and label session memory.
    Memory {
        #[command(subcommand)]
        action: memory::MemoryCommand,
    },

    /// Manage best practices.
    Practice {
        #[command(subcommand)]
        action: practice::PracticeCommand,
    },

    /// Query the knowledge base.
    Kb {
        #[command(subcommand)]
        action: kb::KbCommand,
    },

    /// Show the effective configuration.
    Config {
        #[command(subcommand)]
        action: config::ConfigCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_parse_and_apply() {
        let cli = Cli::try_parse_from([
            "onward",
            "--memory-store",
            "json",
            "--memory-k",
            "8",
            "--memory-max-items",
            "20",
            "--fast-answer-threshold",
            "0.9",
            "ask",
            "where is my passport",
        ])
        .unwrap();

        let mut config = GlobalConfig::default();
        cli.overrides.apply(&mut config);
        assert_eq!(config.memory.store, StoreKind::Json);
        assert_eq!(config.memory.k, 8);
        assert_eq!(config.memory.max_items, Some(20));
        assert!((config.fast_answer.threshold - 0.9).abs() < f32::EPSILON);
        assert!(config.fast_answer.enabled);
        assert!(matches!(cli.command, Commands::Ask { .. }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "onward",
            "memory",
            "sessions",
            "--memory-store",
            "none",
            "--no-fast-answer",
            "--json",
        ])
        .unwrap();
        let mut config = GlobalConfig::default();
        cli.overrides.apply(&mut config);
        assert_eq!(config.memory.store, StoreKind::None);
        assert!(!config.fast_answer.enabled);
        assert!(cli.json);
    }

    #[test]
    fn test_invalid_store_kind_rejected() {
        assert!(Cli::try_parse_from(["onward", "--memory-store", "sqlite", "kb", "stats"]).is_err());
    }

    #[test]
    fn test_tags_are_comma_separated() {
        let cli = Cli::try_parse_from(["onward", "chat", "--tags", "passport,travel"]).unwrap();
        match cli.command {
            Commands::Chat { tags, session } => {
                assert_eq!(tags, vec!["passport", "travel"]);
                assert!(session.is_none());
            }
            _ => panic!("expected chat"),
        }
    }
}
