//! Answering commands: interactive chat, one-shot ask and handoff replay.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use uuid::Uuid;

use onward_core::chat::service::ChatService;
use onward_types::chat::{AnswerSource, TurnResult};
use onward_types::handoff::HandoffPackage;
use onward_types::memory::Outcome;

use crate::state::AppState;

/// Interactive chat loop.
///
/// Slash commands inside the loop:
/// `/good`, `/bad`, `/neutral` label the last answer, `/history` lists the
/// session, `/reset` drops any open clarifying question, `/exit` quits.
pub async fn interactive(
    state: &AppState,
    session: Option<String>,
    tags: &[String],
    verbose: bool,
) -> Result<()> {
    let service = state.chat_service().await?;
    let session_id = session.unwrap_or_else(|| Uuid::now_v7().to_string());

    println!();
    println!(
        "  {} Onward journey assistant  {}",
        style(">").cyan().bold(),
        style(format!("session {session_id}")).dim()
    );
    if state.memory_is_ephemeral() {
        println!(
            "  {}",
            style("Session memory is in-memory and ends with this process.").dim()
        );
    }
    println!(
        "  {}",
        style("Type /good, /bad or /neutral to rate the last answer, /exit to quit.").dim()
    );
    println!();

    let mut last_entry: Option<Uuid> = None;

    loop {
        let line: String = Input::new()
            .with_prompt(format!("{}", style("you").green().bold()))
            .allow_empty(true)
            .interact_text()?;
        let line = line.trim();

        match line {
            "" => continue,
            "/exit" | "/quit" => break,
            "/good" | "/bad" | "/neutral" => {
                let outcome: Outcome = line.trim_start_matches('/').parse().map_err(anyhow::Error::msg)?;
                match last_entry {
                    Some(entry_id) => label(&service, &entry_id, outcome).await,
                    None => println!("  {}", style("Nothing to rate yet.").dim()),
                }
                continue;
            }
            "/reset" => {
                service.reset_retrieval(&session_id).await;
                println!("  {}", style("Cleared the service the assistant was narrowing down.").dim());
                continue;
            }
            "/history" => {
                if let Some(sessions) = &state.sessions {
                    for entry in sessions.list(&session_id).await? {
                        println!("  {}", style(entry.format_for_prompt()).dim());
                    }
                }
                continue;
            }
            _ => {}
        }

        match service.respond(&session_id, line, tags).await {
            Ok(turn) => {
                print_turn(&turn, verbose);
                last_entry = turn.entry_id;
            }
            Err(e) => {
                tracing::warn!(error = %e, session_id = %session_id, "Turn failed");
                println!("  {} {e}", style("!").red().bold());
            }
        }
    }

    println!();
    println!("  {}", style(format!("Session {session_id} ended.")).dim());
    Ok(())
}

async fn label(service: &ChatService, entry_id: &Uuid, outcome: Outcome) {
    match service.record_outcome(entry_id, outcome).await {
        Ok(Some(practice)) => println!(
            "  {} Marked {outcome}; promoted to best practice {}",
            style("*").green().bold(),
            style(practice.id).dim()
        ),
        Ok(None) => println!("  {} Marked {outcome}", style("*").green().bold()),
        Err(e) => println!("  {} {e}", style("!").red().bold()),
    }
}

/// Answer one question and exit.
pub async fn ask(
    state: &AppState,
    session: Option<String>,
    query: &str,
    tags: &[String],
    json: bool,
) -> Result<()> {
    let service = state.chat_service().await?;
    let session_id = session.unwrap_or_else(|| Uuid::now_v7().to_string());
    let turn = service.respond(&session_id, query, tags).await?;
    emit(&session_id, &turn, json)
}

/// Replay a handoff package from a JSON file.
pub async fn handoff(
    state: &AppState,
    file: &Path,
    session: Option<String>,
    json: bool,
) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let package: HandoffPackage = serde_json::from_str(&content)
        .with_context(|| format!("invalid handoff package in {}", file.display()))?;

    let service = state.chat_service().await?;
    let session_id = session.unwrap_or_else(|| Uuid::now_v7().to_string());
    let turn = service.process_handoff(&session_id, &package).await?;
    emit(&session_id, &turn, json)
}

fn emit(session_id: &str, turn: &TurnResult, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "session_id": session_id,
            "turn": turn,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_turn(turn, true);
        println!("  {}", style(format!("session {session_id}")).dim());
    }
    Ok(())
}

fn print_turn(turn: &TurnResult, verbose: bool) {
    println!();
    println!("{}", turn.answer.trim());
    println!();

    if let AnswerSource::FastAnswer { similarity, .. } = &turn.source {
        println!(
            "  {}",
            style(format!("reused an earlier answer (similarity {similarity:.3})")).dim()
        );
    }
    if verbose {
        let mut details = vec![
            format!("memories {}", turn.memories_injected),
            format!("practices {}", turn.practices_injected),
        ];
        if let AnswerSource::Generated { usage } = &turn.source {
            details.push(format!(
                "tokens {} in / {} out",
                usage.input_tokens, usage.output_tokens
            ));
        }
        if let Some(id) = turn.entry_id {
            details.push(format!("entry {id}"));
        }
        println!("  {}", style(details.join("  ")).dim());
    }
}
