//! System prompt builder for the onward-journey assistant.
//!
//! Assembles the system prompt from the base instructions, soft guidance,
//! good best practices, recalled session memory, retrieved knowledge and
//! candidate guidance using XML tag boundaries for clear section delineation.

use onward_types::memory::{RankedBestPractice, ScoredEntry};

/// Fixed conflict-resolution order emitted alongside guidance.
pub const PRIORITY_ORDER: &str = "1) Safety and policy compliance\n\
2) Correctness and grounded answers\n\
3) User task completion\n\
4) Style alignment from guidance";

/// Everything that can go into one turn's system prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptInputs<'a> {
    pub instructions: &'a str,
    pub guidance: &'a str,
    pub best_practices: &'a [RankedBestPractice],
    pub memories: &'a [ScoredEntry],
    pub retrieved_context: &'a str,
    /// Confident-match hint or clarifying question for this turn.
    pub retrieval_guidance: &'a str,
}

/// Builds the system prompt for a turn.
///
/// Layout (empty sections are omitted):
/// ```text
/// <instructions>{base instructions}</instructions>
/// <priority_order>1) Safety ... 4) Style ...</priority_order>
/// <guidance>{soft policy text}</guidance>
/// <best_practices>- [tags] snippet</best_practices>
/// <session_memory>[turn] summary</session_memory>
/// <retrieved_context>Retrieved Context: ...</retrieved_context>
/// <retrieval_guidance>Single strong match: ...</retrieval_guidance>
/// ```
pub struct SystemPromptBuilder;

impl SystemPromptBuilder {
    pub fn build(inputs: &PromptInputs<'_>) -> String {
        let mut sections = Vec::with_capacity(7);

        if !inputs.instructions.trim().is_empty() {
            sections.push(format!(
                "<instructions>\n{}\n</instructions>",
                inputs.instructions.trim()
            ));
        }

        let has_guidance = !inputs.guidance.trim().is_empty();
        if has_guidance || !inputs.best_practices.is_empty() {
            sections.push(format!(
                "<priority_order>\n{PRIORITY_ORDER}\n</priority_order>"
            ));
        }

        if has_guidance {
            sections.push(format!(
                "<guidance>\n{}\n</guidance>",
                inputs.guidance.trim()
            ));
        }

        if !inputs.best_practices.is_empty() {
            let lines: Vec<String> = inputs
                .best_practices
                .iter()
                .map(|bp| bp.practice.format_for_prompt())
                .collect();
            sections.push(format!(
                "<best_practices>\n\
                Approaches that worked well before. Follow them where they fit:\n\
                {}\n\
                </best_practices>",
                lines.join("\n")
            ));
        }

        if !inputs.memories.is_empty() {
            // Turn order, not relevance order.
            let mut recalled: Vec<&ScoredEntry> = inputs.memories.iter().collect();
            recalled.sort_by_key(|m| m.entry.turn_index);
            let lines: Vec<String> = recalled
                .iter()
                .map(|m| m.entry.format_for_prompt())
                .collect();
            sections.push(format!(
                "<session_memory>\n\
                Earlier in this conversation:\n\
                {}\n\
                </session_memory>",
                lines.join("\n")
            ));
        }

        if !inputs.retrieved_context.trim().is_empty() {
            sections.push(format!(
                "<retrieved_context>\n{}\n</retrieved_context>",
                inputs.retrieved_context.trim()
            ));
        }

        if !inputs.retrieval_guidance.trim().is_empty() {
            sections.push(format!(
                "<retrieval_guidance>\n{}\n</retrieval_guidance>",
                inputs.retrieval_guidance.trim()
            ));
        }

        sections.join("\n\n")
    }
}
