//! Global configuration types for Onward.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! memory backends, fast-answer policy, knowledge base and LLM settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::MemoryError;

/// Top-level configuration for Onward.
///
/// Loaded from `~/.onward/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub best_practice: BestPracticeConfig,
    #[serde(default)]
    pub fast_answer: FastAnswerConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

impl GlobalConfig {
    /// Reject settings that would make the service misbehave at runtime.
    pub fn validate(&self) -> Result<(), MemoryError> {
        if !(0.0..=1.0).contains(&self.fast_answer.threshold) {
            return Err(MemoryError::InvalidConfig(format!(
                "fast_answer.threshold must be within [0.0, 1.0], got {}",
                self.fast_answer.threshold
            )));
        }
        if self.memory.k == 0 {
            return Err(MemoryError::InvalidConfig(
                "memory.k must be at least 1".to_string(),
            ));
        }
        if self.memory.max_items == Some(0) {
            return Err(MemoryError::InvalidConfig(
                "memory.max_items must be at least 1 when set".to_string(),
            ));
        }
        if self.best_practice.max_items == Some(0) {
            return Err(MemoryError::InvalidConfig(
                "best_practice.max_items must be at least 1 when set".to_string(),
            ));
        }
        if self.knowledge.candidates.top_n == 0 {
            return Err(MemoryError::InvalidConfig(
                "knowledge.candidates.top_n must be at least 1".to_string(),
            ));
        }
        if self.embedding.dimension == 0 {
            return Err(MemoryError::InvalidConfig(
                "embedding.dimension must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which backend holds a memory collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    InMemory,
    Json,
    None,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::InMemory => write!(f, "in_memory"),
            StoreKind::Json => write!(f, "json"),
            StoreKind::None => write!(f, "none"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "in_memory" | "memory" => Ok(StoreKind::InMemory),
            "json" => Ok(StoreKind::Json),
            "none" | "off" => Ok(StoreKind::None),
            other => Err(format!("invalid store kind: '{other}'")),
        }
    }
}

/// `[memory]`: per-session conversation memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_store")]
    pub store: StoreKind,
    /// JSON file for the `json` backend; relative paths resolve against the data dir.
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,
    /// How many entries are recalled per turn.
    #[serde(default = "default_memory_k")]
    pub k: usize,
    /// Per-session bound; `None` keeps everything.
    #[serde(default = "default_memory_max_items")]
    pub max_items: Option<usize>,
}

fn default_memory_store() -> StoreKind {
    StoreKind::InMemory
}

fn default_memory_path() -> PathBuf {
    PathBuf::from("memory/session_memory.json")
}

fn default_memory_k() -> usize {
    5
}

fn default_memory_max_items() -> Option<usize> {
    Some(100)
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            store: default_memory_store(),
            path: default_memory_path(),
            k: default_memory_k(),
            max_items: default_memory_max_items(),
        }
    }
}

/// `[best_practice]`: the global collection of known-good snippets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestPracticeConfig {
    #[serde(default = "default_best_practice_store")]
    pub store: StoreKind,
    #[serde(default = "default_best_practice_path")]
    pub path: PathBuf,
    #[serde(default = "default_best_practice_k")]
    pub k: usize,
    #[serde(default = "default_best_practice_max_items")]
    pub max_items: Option<usize>,
}

fn default_best_practice_store() -> StoreKind {
    StoreKind::Json
}

fn default_best_practice_path() -> PathBuf {
    PathBuf::from("memory/best_practices.json")
}

fn default_best_practice_k() -> usize {
    3
}

fn default_best_practice_max_items() -> Option<usize> {
    Some(200)
}

impl Default for BestPracticeConfig {
    fn default() -> Self {
        Self {
            store: default_best_practice_store(),
            path: default_best_practice_path(),
            k: default_best_practice_k(),
            max_items: default_best_practice_max_items(),
        }
    }
}

/// `[fast_answer]`: reuse of near-identical prior answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastAnswerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_fast_answer_threshold")]
    pub threshold: f32,
}

fn default_true() -> bool {
    true
}

fn default_fast_answer_threshold() -> f32 {
    0.95
}

impl Default for FastAnswerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_fast_answer_threshold(),
        }
    }
}

/// Which embedding backend turns text into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderKind {
    Hashing,
    Fastembed,
}

impl fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedderKind::Hashing => write!(f, "hashing"),
            EmbedderKind::Fastembed => write!(f, "fastembed"),
        }
    }
}

/// `[embedding]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedder_kind")]
    pub provider: EmbedderKind,
    /// Vector width for the hashing embedder (fastembed models fix their own).
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

fn default_embedder_kind() -> EmbedderKind {
    EmbedderKind::Hashing
}

fn default_embedding_dimension() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedder_kind(),
            dimension: default_embedding_dimension(),
        }
    }
}

/// `[knowledge]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Knowledge records as a `.csv` table or a JSON array. No path means no retrieval.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_knowledge_k")]
    pub k: usize,
    #[serde(default)]
    pub candidates: CandidateConfig,
}

fn default_knowledge_k() -> usize {
    3
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: None,
            k: default_knowledge_k(),
            candidates: CandidateConfig::default(),
        }
    }
}

/// `[knowledge.candidates]`: thresholds for judging retrieved services.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Top two scores this close together count as a tie.
    #[serde(default = "default_ambiguity_gap")]
    pub ambiguity_gap: f32,
    #[serde(default = "default_strong_threshold")]
    pub strong_threshold: f32,
    #[serde(default = "default_confident_threshold")]
    pub confident_threshold: f32,
    #[serde(default = "default_confident_margin")]
    pub confident_margin: f32,
    /// Candidates scoring below this are dropped.
    #[serde(default = "default_weak_floor")]
    pub weak_floor: f32,
    #[serde(default = "default_candidate_top_n")]
    pub top_n: usize,
}

fn default_ambiguity_gap() -> f32 {
    0.05
}

fn default_strong_threshold() -> f32 {
    0.35
}

fn default_confident_threshold() -> f32 {
    0.55
}

fn default_confident_margin() -> f32 {
    0.15
}

fn default_weak_floor() -> f32 {
    0.25
}

fn default_candidate_top_n() -> usize {
    3
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ambiguity_gap: default_ambiguity_gap(),
            strong_threshold: default_strong_threshold(),
            confident_threshold: default_confident_threshold(),
            confident_margin: default_confident_margin(),
            weak_floor: default_weak_floor(),
            top_n: default_candidate_top_n(),
        }
    }
}

/// `[llm]`: Bedrock completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Region override; otherwise detected from the bearer token.
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f64>,
}

fn default_llm_model() -> String {
    "claude-3-7-sonnet-20250219".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            region: None,
            max_tokens: default_max_tokens(),
            temperature: None,
        }
    }
}

/// `[prompt]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_instructions")]
    pub instructions: String,
    /// Markdown file with soft behaviour guidance.
    #[serde(default)]
    pub policy_path: Option<PathBuf>,
}

fn default_instructions() -> String {
    "You are the onward journey assistant. A user has been handed over to you \
     from a general chatbot. Help them reach the right government service, \
     using the retrieved context for phone numbers, links and departments. \
     If the context does not contain the answer, say so rather than guessing."
        .to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            instructions: default_instructions(),
            policy_path: None,
        }
    }
}
