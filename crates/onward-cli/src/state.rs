//! Application state wiring configuration, embedder and stores together.
//!
//! The LLM provider is only built for commands that generate answers, so
//! memory and best-practice management work without Bedrock credentials.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use onward_core::chat::service::{ChatService, ChatSettings};
use onward_core::knowledge::KnowledgeBase;
use onward_core::llm::box_provider::BoxLlmProvider;
use onward_core::llm::provider::LlmProvider;
use onward_core::memory::best_practice::InMemoryBestPracticeStore;
use onward_core::memory::box_best_practice::BoxBestPracticeStore;
use onward_core::memory::box_embedder::BoxEmbedder;
use onward_core::memory::box_session::BoxSessionMemoryStore;
use onward_core::memory::fast_answer::FastAnswerPolicy;
use onward_core::memory::hashing::HashingEmbedder;
use onward_core::memory::session::InMemorySessionStore;
use onward_infra::config::{load_global_config, load_policy_text};
use onward_infra::filesystem::{resolve_data_dir, resolve_path};
use onward_infra::json::{JsonBestPracticeStore, JsonSessionStore};
use onward_infra::knowledge::load_knowledge_records;
use onward_infra::llm::{BEDROCK_TOKEN_ENV, create_provider};
use onward_types::config::{EmbedderKind, GlobalConfig, StoreKind};
use onward_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities,
};

use crate::cli::ConfigOverrides;

/// Shared state for all CLI commands.
pub struct AppState {
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
    pub embedder: Arc<BoxEmbedder>,
    pub sessions: Option<Arc<BoxSessionMemoryStore>>,
    pub practices: Option<Arc<BoxBestPracticeStore>>,
    fast_answer: FastAnswerPolicy,
    guidance: String,
}

impl AppState {
    /// Load and validate configuration, then open the configured stores.
    pub async fn init(overrides: &ConfigOverrides) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let mut config = load_global_config(&data_dir).await;
        overrides.apply(&mut config);
        config.validate()?;
        let fast_answer = FastAnswerPolicy::from_config(&config.fast_answer)?;

        let embedder = Arc::new(build_embedder(&config, &data_dir)?);

        let sessions = match config.memory.store {
            StoreKind::InMemory => Some(BoxSessionMemoryStore::new(InMemorySessionStore::new(
                config.memory.max_items,
            ))),
            StoreKind::Json => {
                let path = resolve_path(&data_dir, &config.memory.path);
                let store = JsonSessionStore::open(path, config.memory.max_items).await?;
                Some(BoxSessionMemoryStore::new(store))
            }
            StoreKind::None => None,
        }
        .map(Arc::new);

        let practices = match config.best_practice.store {
            StoreKind::InMemory => Some(BoxBestPracticeStore::new(
                InMemoryBestPracticeStore::new(config.best_practice.max_items),
            )),
            StoreKind::Json => {
                let path = resolve_path(&data_dir, &config.best_practice.path);
                let store = JsonBestPracticeStore::open(path, config.best_practice.max_items).await?;
                Some(BoxBestPracticeStore::new(store))
            }
            StoreKind::None => None,
        }
        .map(Arc::new);

        let guidance = match &config.prompt.policy_path {
            Some(path) => load_policy_text(&resolve_path(&data_dir, path)).await,
            None => String::new(),
        };

        tracing::info!(
            data_dir = %data_dir.display(),
            memory_store = %config.memory.store,
            best_practice_store = %config.best_practice.store,
            embedder = embedder.model_name(),
            fast_answer = fast_answer.enabled(),
            threshold = fast_answer.threshold(),
            "Onward initialized"
        );

        Ok(Self {
            config,
            data_dir,
            embedder,
            sessions,
            practices,
            fast_answer,
            guidance,
        })
    }

    /// Load and embed the knowledge base, if one is configured.
    pub async fn knowledge(&self) -> anyhow::Result<Option<KnowledgeBase>> {
        let Some(path) = &self.config.knowledge.path else {
            return Ok(None);
        };
        let path = resolve_path(&self.data_dir, path);
        let records = load_knowledge_records(&path).await?;
        let kb = KnowledgeBase::build(&records, &self.embedder).await?;
        Ok(Some(kb))
    }

    /// Full service: Bedrock provider plus memory, best practices and knowledge.
    pub async fn chat_service(&self) -> anyhow::Result<ChatService> {
        let token = std::env::var(BEDROCK_TOKEN_ENV).ok();
        let provider = create_provider(&self.config.llm, token.as_deref())
            .with_context(|| format!("set {BEDROCK_TOKEN_ENV} to a Bedrock API key"))?;

        let mut service = self.service_with(provider);
        if let Some(kb) = self.knowledge().await? {
            service = service.with_knowledge(Arc::new(kb));
        }
        Ok(service)
    }

    /// Service for labelling and curation commands that never call the LLM.
    pub fn offline_service(&self) -> ChatService {
        self.service_with(BoxLlmProvider::new(OfflineProvider::default()))
    }

    fn service_with(&self, provider: BoxLlmProvider) -> ChatService {
        let settings = ChatSettings::from_config(&self.config, self.guidance.clone());
        let mut service = ChatService::new(Arc::new(provider), self.embedder.clone(), settings)
            .with_fast_answer(self.fast_answer)
            .with_candidate_scoring(self.config.knowledge.candidates);
        if let Some(sessions) = &self.sessions {
            service = service.with_sessions(sessions.clone());
        }
        if let Some(practices) = &self.practices {
            service = service.with_best_practices(practices.clone());
        }
        service
    }

    /// Whether session memory lives only as long as this process.
    pub fn memory_is_ephemeral(&self) -> bool {
        self.config.memory.store == StoreKind::InMemory
    }
}

fn build_embedder(config: &GlobalConfig, data_dir: &std::path::Path) -> anyhow::Result<BoxEmbedder> {
    match config.embedding.provider {
        EmbedderKind::Hashing => Ok(BoxEmbedder::new(HashingEmbedder::new(
            config.embedding.dimension,
        ))),
        #[cfg(feature = "fastembed")]
        EmbedderKind::Fastembed => Ok(BoxEmbedder::new(
            onward_infra::vector::embedder::FastEmbedder::new(Some(data_dir.join("models"))),
        )),
        #[cfg(not(feature = "fastembed"))]
        EmbedderKind::Fastembed => {
            let _ = data_dir;
            anyhow::bail!("embedding.provider = \"fastembed\" requires building with --features fastembed")
        }
    }
}

/// Stand-in provider for commands that only touch the stores.
#[derive(Debug)]
struct OfflineProvider {
    capabilities: ProviderCapabilities,
}

impl Default for OfflineProvider {
    fn default() -> Self {
        Self {
            capabilities: ProviderCapabilities {
                streaming: false,
                tool_calling: false,
                max_context_tokens: 0,
                max_output_tokens: 0,
            },
        }
    }
}

impl LlmProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::Provider {
            message: "no LLM provider configured for this command".to_string(),
        })
    }
}
