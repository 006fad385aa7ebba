//! Knowledge-base CLI commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, Color};
use console::style;

use onward_core::knowledge::scorer::CandidateScorer;
use onward_core::knowledge::slots::ServiceSlots;
use onward_core::knowledge::{DEFAULT_KNOWLEDGE_K, KnowledgeBase};

use super::memory::{new_table, truncate};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum KbCommand {
    /// Show what the knowledge base contains.
    Stats,

    /// Retrieve the chunks closest to a query.
    Search {
        query: String,

        #[arg(short, long, default_value_t = DEFAULT_KNOWLEDGE_K)]
        k: usize,

        /// Print the context block exactly as injected into the prompt.
        #[arg(long)]
        raw: bool,
    },

    /// Score candidate services for a query and show the verdict.
    Candidates { query: String },
}

pub async fn run(state: &AppState, command: KbCommand, json: bool) -> Result<()> {
    let kb = state
        .knowledge()
        .await?
        .context("no knowledge base configured; set knowledge.path or pass --knowledge-path")?;

    match command {
        KbCommand::Stats => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({"chunks": kb.len(), "embedding_model": kb.embedding_model()})
                );
            } else {
                println!();
                println!(
                    "  {} chunk{} embedded with {}",
                    style(kb.len()).bold(),
                    if kb.len() == 1 { "" } else { "s" },
                    style(kb.embedding_model()).cyan()
                );
                println!();
            }
        }
        KbCommand::Search { query, k, raw } => {
            let embedding = state.embedder.embed_one(&query).await?;
            let chunks = kb.retrieve(&embedding, k);

            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else if raw {
                println!("{}", KnowledgeBase::format_context(&chunks));
            } else {
                let mut table = new_table(vec!["Similarity", "Uid", "Chunk"]);
                for chunk in &chunks {
                    table.add_row(vec![
                        Cell::new(format!("{:.3}", chunk.similarity)).fg(Color::Yellow),
                        Cell::new(&chunk.uid).fg(Color::Cyan),
                        Cell::new(truncate(&chunk.text, 90)),
                    ]);
                }
                println!();
                println!("{table}");
                println!();
            }
        }
        KbCommand::Candidates { query } => {
            let scorer = CandidateScorer::new(state.config.knowledge.candidates);
            let embedding = state.embedder.embed_one(&query).await?;
            let candidates = kb.candidates(&query, &embedding, &scorer);
            let assessment = scorer.assess(candidates.clone(), &ServiceSlots::default());

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "candidates": candidates,
                        "assessment": assessment.label(),
                        "guidance": assessment.prompt_guidance(),
                    }))?
                );
            } else {
                let mut table =
                    new_table(vec!["Score", "Similarity", "Bonus", "Service", "Department", "User type"]);
                for c in &candidates {
                    table.add_row(vec![
                        Cell::new(format!("{:.3}", c.score)).fg(Color::Yellow),
                        Cell::new(format!("{:.3}", c.base_score)),
                        Cell::new(format!("{:.3}", c.bonus)),
                        Cell::new(truncate(&c.record.service_name, 40)).fg(Color::Cyan),
                        Cell::new(&c.record.department),
                        Cell::new(&c.record.user_type),
                    ]);
                }
                println!();
                println!("{table}");
                println!();
                println!("  {} {}", style("Verdict:").bold(), assessment.label());
                if let Some(guidance) = assessment.prompt_guidance() {
                    println!("  {}", style(guidance).dim());
                }
                println!();
            }
        }
    }
    Ok(())
}
