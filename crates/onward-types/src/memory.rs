//! Memory types for Onward.
//!
//! Two collections live side by side: the per-session conversation log
//! (`SessionEntry`) used for recall and fast-answer reuse, and the global
//! best-practice collection (`BestPractice`) injected into the system prompt
//! as soft guardrails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Outcome label attached to a remembered answer.
///
/// Only `Good` best practices are ever injected, and `Bad` session entries
/// are never reused as fast answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Good,
    Bad,
    Neutral,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Good => write!(f, "good"),
            Outcome::Bad => write!(f, "bad"),
            Outcome::Neutral => write!(f, "neutral"),
        }
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "good" => Ok(Outcome::Good),
            "bad" => Ok(Outcome::Bad),
            "neutral" => Ok(Outcome::Neutral),
            other => Err(format!("invalid outcome: '{other}'")),
        }
    }
}

/// Normalize a tag for comparison: trimmed and lower-cased.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Normalize a tag list, dropping empty tags and duplicates while keeping order.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let t = normalize_tag(tag.as_ref());
        if !t.is_empty() && !out.contains(&t) {
            out.push(t);
        }
    }
    out
}

/// One remembered turn of a session: the user's query and the answer given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub id: Uuid,
    pub session_id: String,
    /// Position of this turn within its session (0-based).
    pub turn_index: u32,
    pub query: String,
    pub answer: String,
    /// Optional condensed form used when injecting into the prompt.
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Name of the embedding model used for the stored vector.
    pub embedding_model: String,
    pub created_at: DateTime<Utc>,
}

impl SessionEntry {
    /// Concise line for inclusion in the system prompt.
    pub fn format_for_prompt(&self) -> String {
        match &self.summary {
            Some(summary) if !summary.trim().is_empty() => {
                format!("[{}] {}", self.turn_index, summary.trim())
            }
            _ => format!(
                "[{}] Q: {} A: {}",
                self.turn_index,
                self.query.trim(),
                self.answer.trim()
            ),
        }
    }

    /// Snippet used when promoting this entry to a best practice.
    pub fn as_snippet(&self) -> String {
        format!("Q: {} A: {}", self.query.trim(), self.answer.trim())
    }
}

/// Input for appending a new turn to a session.
#[derive(Debug, Clone, Default)]
pub struct NewSessionEntry {
    pub session_id: String,
    pub query: String,
    pub answer: String,
    pub summary: Option<String>,
    /// Explicit turn index; `None` assigns the next index in the session.
    pub turn_index: Option<u32>,
    pub outcome: Option<Outcome>,
    pub tags: Vec<String>,
}

/// A session entry with its cosine similarity to a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEntry {
    pub entry: SessionEntry,
    pub similarity: f32,
}

/// A reusable snippet of known-good behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestPractice {
    pub id: Uuid,
    pub snippet: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub outcome: Outcome,
    /// Session the practice was promoted from (None for manual entries).
    #[serde(default)]
    pub source_session: Option<String>,
    /// Session entry the practice was promoted from.
    #[serde(default)]
    pub source_entry: Option<Uuid>,
    pub embedding_model: String,
    pub created_at: DateTime<Utc>,
}

impl BestPractice {
    /// Whether this practice shares at least one tag with `wanted`.
    ///
    /// `wanted` must already be normalized.
    pub fn matches_any_tag(&self, wanted: &[String]) -> bool {
        self.tags
            .iter()
            .map(|t| normalize_tag(t))
            .any(|t| !t.is_empty() && wanted.contains(&t))
    }

    /// Line for inclusion in the `<best_practices>` prompt section.
    pub fn format_for_prompt(&self) -> String {
        if self.tags.is_empty() {
            format!("- {}", self.snippet.trim())
        } else {
            format!("- [{}] {}", self.tags.join(", "), self.snippet.trim())
        }
    }
}

/// Input for inserting a best practice.
#[derive(Debug, Clone)]
pub struct NewBestPractice {
    pub snippet: String,
    pub tags: Vec<String>,
    pub outcome: Outcome,
    pub source_session: Option<String>,
    pub source_entry: Option<Uuid>,
}

/// A best practice with its cosine similarity to a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedBestPractice {
    pub practice: BestPractice,
    pub similarity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(summary: Option<&str>) -> SessionEntry {
        SessionEntry {
            id: Uuid::now_v7(),
            session_id: "s1".to_string(),
            turn_index: 2,
            query: "How do I contact HMRC?".to_string(),
            answer: "Call 0300 200 3300.".to_string(),
            summary: summary.map(String::from),
            outcome: None,
            tags: vec![],
            embedding_model: "hashing-256".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_outcome_roundtrip() {
        for outcome in [Outcome::Good, Outcome::Bad, Outcome::Neutral] {
            let parsed: Outcome = outcome.to_string().parse().unwrap();
            assert_eq!(outcome, parsed);
        }
        assert_eq!(" GOOD ".parse::<Outcome>().unwrap(), Outcome::Good);
        assert!("meh".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_outcome_serde() {
        let json = serde_json::to_string(&Outcome::Bad).unwrap();
        assert_eq!(json, "\"bad\"");
    }

    #[test]
    fn test_normalize_tags_dedups_and_drops_empty() {
        let tags = normalize_tags(&[" Tax ", "tax", "", "  ", "Benefits"]);
        assert_eq!(tags, vec!["tax".to_string(), "benefits".to_string()]);
    }

    #[test]
    fn test_format_for_prompt_prefers_summary() {
        assert_eq!(
            entry(Some("User asked for HMRC number")).format_for_prompt(),
            "[2] User asked for HMRC number"
        );
        assert_eq!(
            entry(None).format_for_prompt(),
            "[2] Q: How do I contact HMRC? A: Call 0300 200 3300."
        );
    }

    #[test]
    fn test_session_entry_deserialize_without_optional_fields() {
        let json = r#"{
            "id": "0190a6c4-0000-7000-8000-000000000000",
            "session_id": "s1",
            "turn_index": 0,
            "query": "q",
            "answer": "a",
            "embedding_model": "m",
            "created_at": "2026-01-01T00:00:00Z"
        }"#;
        let parsed: SessionEntry = serde_json::from_str(json).unwrap();
        assert!(parsed.outcome.is_none());
        assert!(parsed.tags.is_empty());
    }

    #[test]
    fn test_best_practice_tag_matching_is_case_insensitive() {
        let practice = BestPractice {
            id: Uuid::now_v7(),
            snippet: "Offer the phone number when no live chat exists".to_string(),
            tags: vec!["Live-Chat".to_string(), " Phone".to_string()],
            outcome: Outcome::Good,
            source_session: None,
            source_entry: None,
            embedding_model: "m".to_string(),
            created_at: Utc::now(),
        };
        assert!(practice.matches_any_tag(&["phone".to_string()]));
        assert!(practice.matches_any_tag(&["live-chat".to_string()]));
        assert!(!practice.matches_any_tag(&["tax".to_string()]));
        assert!(!practice.matches_any_tag(&[]));
    }
}
