//! Turn results returned by the chat service.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::Usage;

/// Where the answer of a turn came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerSource {
    /// The LLM produced a fresh answer.
    Generated { usage: Usage },
    /// A prior answer from the same session was reused without inference.
    FastAnswer { entry_id: Uuid, similarity: f32 },
}

impl AnswerSource {
    pub fn is_fast_answer(&self) -> bool {
        matches!(self, AnswerSource::FastAnswer { .. })
    }
}

/// Outcome of a single `respond` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResult {
    pub answer: String,
    pub source: AnswerSource,
    /// Session entry recorded for this turn, or the reused entry on a fast answer.
    pub entry_id: Option<Uuid>,
    pub memories_injected: usize,
    pub practices_injected: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_source_serde_tagged() {
        let source = AnswerSource::FastAnswer {
            entry_id: Uuid::nil(),
            similarity: 0.97,
        };
        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(value["type"], "fast_answer");
        assert!(source.is_fast_answer());

        let generated = AnswerSource::Generated {
            usage: Usage::default(),
        };
        assert_eq!(serde_json::to_value(&generated).unwrap()["type"], "generated");
        assert!(!generated.is_fast_answer());
    }
}
