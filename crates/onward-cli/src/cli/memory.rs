//! Session memory CLI commands: sessions, list, search, label, clear.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use onward_core::memory::box_session::BoxSessionMemoryStore;
use onward_types::memory::{Outcome, SessionEntry};

use crate::state::AppState;

#[derive(Subcommand)]
pub enum MemoryCommand {
    /// List sessions with stored turns.
    Sessions,

    /// List the turns of a session in order.
    List {
        /// Session id.
        session: String,
    },

    /// Rank stored turns by similarity to a query.
    Search {
        query: String,

        /// Restrict to one session; all sessions are searched otherwise.
        #[arg(long, short)]
        session: Option<String>,

        /// Number of results.
        #[arg(short, long, default_value = "5")]
        k: usize,

        /// Only turns rated with this outcome.
        #[arg(long)]
        outcome: Option<Outcome>,
    },

    /// Rate a turn. A first `good` rating promotes it to a best practice.
    Label {
        /// Entry id.
        entry: Uuid,
        /// good, bad or neutral.
        outcome: Outcome,
    },

    /// Delete every turn of a session.
    Clear {
        session: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(state: &AppState, command: MemoryCommand, json: bool) -> Result<()> {
    let store = state
        .sessions
        .as_deref()
        .context("session memory is disabled (memory.store = \"none\")")?;

    if state.memory_is_ephemeral() && !json {
        println!(
            "  {} Session memory is in-memory; use --memory-store json to inspect stored turns.",
            style("i").blue().bold()
        );
    }

    match command {
        MemoryCommand::Sessions => sessions(store, json).await,
        MemoryCommand::List { session } => list(store, &session, json).await,
        MemoryCommand::Search {
            query,
            session,
            k,
            outcome,
        } => {
            let embedding = state.embedder.embed_one(&query).await?;
            let hits = match session {
                Some(session) => {
                    let mut hits = store.search(&session, &embedding, k).await?;
                    if let Some(outcome) = outcome {
                        hits.retain(|h| h.entry.outcome == Some(outcome));
                    }
                    hits
                }
                None => store.search_by_outcome(&embedding, outcome, k).await?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
                return Ok(());
            }
            let mut table = new_table(vec!["Similarity", "Session", "Turn", "Query", "Outcome"]);
            for hit in &hits {
                table.add_row(vec![
                    Cell::new(format!("{:.3}", hit.similarity)).fg(Color::Yellow),
                    Cell::new(&hit.entry.session_id).fg(Color::DarkGrey),
                    Cell::new(hit.entry.turn_index),
                    Cell::new(truncate(&hit.entry.query, 60)),
                    outcome_cell(hit.entry.outcome),
                ]);
            }
            println!();
            println!("{table}");
            println!();
            Ok(())
        }
        MemoryCommand::Label { entry, outcome } => {
            let service = state.offline_service();
            let promoted = service.record_outcome(&entry, outcome).await?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({"entry_id": entry, "outcome": outcome, "promoted": promoted})
                );
            } else {
                println!("  {} Marked {} as {outcome}", style("*").green().bold(), style(entry).dim());
                if let Some(practice) = promoted {
                    println!(
                        "  {} Promoted to best practice {}",
                        style("*").green().bold(),
                        style(practice.id).dim()
                    );
                }
            }
            Ok(())
        }
        MemoryCommand::Clear { session, force } => clear(store, &session, force, json).await,
    }
}

async fn sessions(store: &BoxSessionMemoryStore, json: bool) -> Result<()> {
    let ids = store.sessions().await?;
    let mut rows = Vec::with_capacity(ids.len());
    for id in ids {
        let count = store.count(&id).await?;
        rows.push((id, count));
    }

    if json {
        let value: Vec<_> = rows
            .iter()
            .map(|(id, count)| serde_json::json!({"session_id": id, "turns": count}))
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!();
        println!("  {} No stored sessions.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = new_table(vec!["Session", "Turns"]);
    for (id, count) in &rows {
        table.add_row(vec![Cell::new(id).fg(Color::Cyan), Cell::new(count)]);
    }
    println!();
    println!("{table}");
    println!();
    Ok(())
}

async fn list(store: &BoxSessionMemoryStore, session: &str, json: bool) -> Result<()> {
    let entries = store.list(session).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!();
        println!(
            "  {} No turns stored for session '{}'.",
            style("i").blue().bold(),
            style(session).cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = new_table(vec!["Turn", "Id", "Query", "Answer", "Outcome", "Date"]);
    for entry in &entries {
        table.add_row(entry_row(entry));
    }
    println!();
    println!("  Session '{}'", style(session).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} turn{}",
        style(entries.len()).bold(),
        if entries.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

async fn clear(store: &BoxSessionMemoryStore, session: &str, force: bool, json: bool) -> Result<()> {
    let count = store.count(session).await?;
    if count == 0 {
        if json {
            println!("{}", serde_json::json!({"deleted": 0, "session_id": session}));
        } else {
            println!("  {} Nothing stored for '{}'.", style("i").blue().bold(), session);
        }
        return Ok(());
    }

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {count} turn(s) from session '{session}'?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let deleted = store.clear_session(session).await?;
    if json {
        println!("{}", serde_json::json!({"deleted": deleted, "session_id": session}));
    } else {
        println!(
            "  {} Deleted {deleted} turn(s) from '{}'",
            style("*").green().bold(),
            style(session).cyan()
        );
    }
    Ok(())
}

fn entry_row(entry: &SessionEntry) -> Vec<Cell> {
    vec![
        Cell::new(entry.turn_index),
        Cell::new(&entry.id.to_string()[..8]).fg(Color::DarkGrey),
        Cell::new(truncate(&entry.query, 40)),
        Cell::new(truncate(&entry.answer, 50)).fg(Color::White),
        outcome_cell(entry.outcome),
        Cell::new(entry.created_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
    ]
}

pub(crate) fn outcome_cell(outcome: Option<Outcome>) -> Cell {
    match outcome {
        Some(Outcome::Good) => Cell::new("good").fg(Color::Green),
        Some(Outcome::Bad) => Cell::new("bad").fg(Color::Red),
        Some(Outcome::Neutral) => Cell::new("neutral").fg(Color::Yellow),
        None => Cell::new("-").fg(Color::DarkGrey),
    }
}

pub(crate) fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.into_iter().map(|h| Cell::new(h).fg(Color::White)).collect::<Vec<_>>());
    table
}

/// Shorten to `max` characters, respecting char boundaries.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
