//! Handoff package received from the upstream generic chatbot.

use serde::{Deserialize, Serialize};

/// One turn of the conversation that happened before the handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

/// Everything the upstream agent passes over when it hands a user on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffPackage {
    pub handoff_agent_id: String,
    #[serde(default)]
    pub final_conversation_history: Vec<HistoryTurn>,
    pub next_agent_prompt: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl HandoffPackage {
    /// Fold the prior history and the user's final request into one prompt.
    pub fn context_prompt(&self) -> String {
        let history = serde_json::to_string(&self.final_conversation_history)
            .unwrap_or_else(|_| "[]".to_string());
        format!(
            "Previous conversation history: {history}. \
             The user's final request is: {}. \
             Please analyze the history and fulfill the user's request.",
            self.next_agent_prompt.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prompt_includes_history_and_request() {
        let json = r#"{
            "handoff_agent_id": "GenericChatbot",
            "final_conversation_history": [
                {"role": "user", "content": "I lost my passport"},
                {"role": "assistant", "content": "I can hand you over."}
            ],
            "next_agent_prompt": "How do I report it? ",
            "status": "COMPLETED"
        }"#;
        let package: HandoffPackage = serde_json::from_str(json).unwrap();
        let prompt = package.context_prompt();
        assert!(prompt.contains("I lost my passport"));
        assert!(prompt.contains("The user's final request is: How do I report it?."));
        assert_eq!(package.status.as_deref(), Some("COMPLETED"));
    }

    #[test]
    fn test_history_defaults_to_empty() {
        let package: HandoffPackage = serde_json::from_str(
            r#"{"handoff_agent_id":"a","next_agent_prompt":"hello"}"#,
        )
        .unwrap();
        assert!(package.final_conversation_history.is_empty());
        assert!(package.context_prompt().starts_with("Previous conversation history: []."));
    }
}
