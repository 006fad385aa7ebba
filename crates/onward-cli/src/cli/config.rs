//! Configuration inspection.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration (file plus CLI overrides).
    Show,

    /// Print the data directory.
    Path,
}

pub fn run(state: &AppState, command: ConfigCommand, json: bool) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            if json {
                println!("{}", serde_json::to_string_pretty(&state.config)?);
            } else {
                println!(
                    "  {} {}",
                    style("#").dim(),
                    style(state.data_dir.join("config.toml").display()).dim()
                );
                println!();
                print!("{}", toml::to_string_pretty(&state.config)?);
            }
        }
        ConfigCommand::Path => {
            if json {
                println!("{}", serde_json::json!({"data_dir": state.data_dir}));
            } else {
                println!("{}", state.data_dir.display());
            }
        }
    }
    Ok(())
}
