//! Best-practice CLI commands: add, list, search, delete.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use onward_types::memory::Outcome;

use super::memory::{new_table, outcome_cell, truncate};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum PracticeCommand {
    /// Add a best practice by hand.
    Add {
        /// The guidance snippet.
        snippet: String,

        /// Tags (comma-separated).
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Only `good` practices are injected into prompts.
        #[arg(long, default_value = "good")]
        outcome: Outcome,
    },

    /// List stored practices, oldest first.
    List,

    /// Rank good practices by similarity to a query.
    Search {
        query: String,

        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        #[arg(short, long, default_value = "3")]
        k: usize,
    },

    /// Delete a practice.
    Delete {
        id: Uuid,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(state: &AppState, command: PracticeCommand, json: bool) -> Result<()> {
    let store = state
        .practices
        .as_deref()
        .context("best-practice store is disabled (best_practice.store = \"none\")")?;

    match command {
        PracticeCommand::Add {
            snippet,
            tags,
            outcome,
        } => {
            let service = state.offline_service();
            let practice = service
                .add_best_practice(&snippet, &tags, outcome)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&practice)?);
            } else {
                println!(
                    "  {} Best practice {} saved",
                    style("*").green().bold(),
                    style(practice.id).dim()
                );
            }
        }

        PracticeCommand::List => {
            let practices = store.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&practices)?);
                return Ok(());
            }
            if practices.is_empty() {
                println!();
                println!(
                    "  {} No best practices yet. Rate a good answer with {} or add one with {}",
                    style("i").blue().bold(),
                    style("/good").yellow(),
                    style("onward practice add").yellow()
                );
                println!();
                return Ok(());
            }

            let mut table = new_table(vec!["Id", "Snippet", "Tags", "Outcome", "Source"]);
            for practice in &practices {
                table.add_row(vec![
                    Cell::new(practice.id).fg(Color::DarkGrey),
                    Cell::new(truncate(&practice.snippet, 60)).fg(Color::White),
                    Cell::new(practice.tags.join(", ")).fg(Color::Cyan),
                    outcome_cell(Some(practice.outcome)),
                    Cell::new(practice.source_session.as_deref().unwrap_or("manual"))
                        .fg(Color::DarkGrey),
                ]);
            }
            println!();
            println!("{table}");
            println!();
            println!(
                "  {} practice{}",
                style(practices.len()).bold(),
                if practices.len() == 1 { "" } else { "s" }
            );
            println!();
        }

        PracticeCommand::Search { query, tags, k } => {
            let embedding = state.embedder.embed_one(&query).await?;
            let hits = store.search(&embedding, &tags, k).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
                return Ok(());
            }
            let mut table = new_table(vec!["Similarity", "Snippet", "Tags"]);
            for hit in &hits {
                table.add_row(vec![
                    Cell::new(format!("{:.3}", hit.similarity)).fg(Color::Yellow),
                    Cell::new(truncate(&hit.practice.snippet, 70)),
                    Cell::new(hit.practice.tags.join(", ")).fg(Color::Cyan),
                ]);
            }
            println!();
            println!("{table}");
            println!();
        }

        PracticeCommand::Delete { id, force } => {
            if !force && !json {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete best practice {id}?"))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("  Cancelled.");
                    return Ok(());
                }
            }
            store
                .delete(&id)
                .await
                .with_context(|| format!("best practice {id} not found"))?;
            if json {
                println!("{}", serde_json::json!({"deleted": true, "id": id}));
            } else {
                println!("  {} Deleted {}", style("*").green().bold(), style(id).dim());
            }
        }
    }

    Ok(())
}
