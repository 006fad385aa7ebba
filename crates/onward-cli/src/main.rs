//! Onward CLI entry point.
//!
//! Binary name: `onward`
//!
//! Parses CLI arguments, loads configuration, wires the memory stores and
//! knowledge base, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "info,onward_core=debug,onward_infra=debug",
        _ => "trace",
    };
    if let Err(e) = onward_observe::tracing_setup::init_tracing(filter, cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    onward_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "onward", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(&cli.overrides).await?;

    match cli.command {
        Commands::Chat { session, tags } => {
            cli::chat::interactive(&state, session, &tags, cli.verbose > 0).await?;
        }
        Commands::Ask {
            query,
            session,
            tags,
        } => {
            cli::chat::ask(&state, session, &query, &tags, cli.json).await?;
        }
        Commands::Handoff { file, session } => {
            cli::chat::handoff(&state, &file, session, cli.json).await?;
        }
        Commands::Memory { action } => {
            cli::memory::run(&state, action, cli.json).await?;
        }
        Commands::Practice { action } => {
            cli::practice::run(&state, action, cli.json).await?;
        }
        Commands::Kb { action } => {
            cli::kb::run(&state, action, cli.json).await?;
        }
        Commands::Config { action } => {
            cli::config::run(&state, action, cli.json)?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
