//! Chat service orchestrating a single onward-journey turn.
//!
//! ChatService coordinates the embedder, session memory, best-practice store,
//! knowledge base and LLM provider. Every turn embeds the query once and
//! reuses that vector for recall, the fast-answer gate, best-practice lookup,
//! knowledge retrieval and the stored session entry.

use std::collections::HashMap;
use std::sync::Arc;

use onward_types::chat::{AnswerSource, TurnResult};
use onward_types::config::{CandidateConfig, GlobalConfig};
use onward_types::error::{MemoryError, RepositoryError};
use onward_types::handoff::HandoffPackage;
use onward_types::llm::{CompletionRequest, Message};
use onward_types::memory::{
    BestPractice, NewBestPractice, NewSessionEntry, Outcome, normalize_tags,
};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::agent::prompt::{PromptInputs, SystemPromptBuilder};
use crate::knowledge::KnowledgeBase;
use crate::knowledge::scorer::{CandidateAssessment, CandidateScorer, ScoredCandidate};
use crate::knowledge::slots::ServiceSlots;
use crate::llm::box_provider::BoxLlmProvider;
use crate::memory::box_best_practice::BoxBestPracticeStore;
use crate::memory::box_embedder::BoxEmbedder;
use crate::memory::box_session::BoxSessionMemoryStore;
use crate::memory::fast_answer::{FastAnswerDecision, FastAnswerPolicy};

/// Per-turn knobs for the chat service.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub instructions: String,
    /// Soft policy text; empty means no `<guidance>` section.
    pub guidance: String,
    pub memory_k: usize,
    pub best_practice_k: usize,
    pub knowledge_k: usize,
}

impl ChatSettings {
    pub fn from_config(config: &GlobalConfig, guidance: String) -> Self {
        Self {
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            instructions: config.prompt.instructions.clone(),
            guidance,
            memory_k: config.memory.k,
            best_practice_k: config.best_practice.k,
            knowledge_k: config.knowledge.k,
        }
    }
}

/// Per-session candidate state: filled slots and an open clarifying question.
#[derive(Debug, Default)]
struct RetrievalState {
    slots: ServiceSlots,
    pending: Vec<ScoredCandidate>,
}

/// Memory-aware answering service.
pub struct ChatService {
    provider: Arc<BoxLlmProvider>,
    embedder: Arc<BoxEmbedder>,
    sessions: Option<Arc<BoxSessionMemoryStore>>,
    practices: Option<Arc<BoxBestPracticeStore>>,
    knowledge: Option<Arc<KnowledgeBase>>,
    scorer: Option<CandidateScorer>,
    retrieval: Mutex<HashMap<String, RetrievalState>>,
    /// Serializes outcome labelling so one entry is promoted at most once.
    promotion: Mutex<()>,
    fast_answer: FastAnswerPolicy,
    settings: ChatSettings,
}

impl ChatService {
    /// Create a service with no memory, no best practices and no knowledge base.
    pub fn new(
        provider: Arc<BoxLlmProvider>,
        embedder: Arc<BoxEmbedder>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            provider,
            embedder,
            sessions: None,
            practices: None,
            knowledge: None,
            scorer: None,
            retrieval: Mutex::new(HashMap::new()),
            promotion: Mutex::new(()),
            fast_answer: FastAnswerPolicy::default(),
            settings,
        }
    }

    pub fn with_sessions(mut self, sessions: Arc<BoxSessionMemoryStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn with_best_practices(mut self, practices: Arc<BoxBestPracticeStore>) -> Self {
        self.practices = Some(practices);
        self
    }

    pub fn with_knowledge(mut self, knowledge: Arc<KnowledgeBase>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    /// Judge knowledge candidates each turn. A disabled config turns scoring off.
    pub fn with_candidate_scoring(mut self, config: CandidateConfig) -> Self {
        self.scorer = config.enabled.then(|| CandidateScorer::new(config));
        self
    }

    pub fn with_fast_answer(mut self, policy: FastAnswerPolicy) -> Self {
        self.fast_answer = policy;
        self
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn memory_enabled(&self) -> bool {
        self.sessions.is_some()
    }

    /// Answer one user query within a session.
    pub async fn respond(
        &self,
        session_id: &str,
        query: &str,
        tags: &[String],
    ) -> Result<TurnResult, MemoryError> {
        if query.trim().is_empty() {
            return Err(MemoryError::EmptyQuery);
        }

        let query_embedding = self.embedder.embed_one(query).await?;

        // --- Session recall and fast-answer gate ---
        let memories = match &self.sessions {
            Some(sessions) => {
                sessions
                    .search(session_id, &query_embedding, self.settings.memory_k)
                    .await?
            }
            None => Vec::new(),
        };

        if self.sessions.is_some() {
            match self.fast_answer.evaluate(memories.first()) {
                FastAnswerDecision::Reuse(hit) => {
                    info!(
                        session_id,
                        entry_id = %hit.entry.id,
                        similarity = hit.similarity,
                        threshold = self.fast_answer.threshold(),
                        "Fast answer reused"
                    );
                    return Ok(TurnResult {
                        answer: hit.entry.answer.clone(),
                        source: AnswerSource::FastAnswer {
                            entry_id: hit.entry.id,
                            similarity: hit.similarity,
                        },
                        entry_id: Some(hit.entry.id),
                        memories_injected: 0,
                        practices_injected: 0,
                    });
                }
                FastAnswerDecision::Miss(reason) => {
                    debug!(session_id, ?reason, "Fast answer miss");
                }
            }
        }

        // --- Guardrails and retrieval ---
        let wanted_tags = normalize_tags(tags);
        let practices = match &self.practices {
            Some(store) => {
                store
                    .search(&query_embedding, &wanted_tags, self.settings.best_practice_k)
                    .await?
            }
            None => Vec::new(),
        };

        let (context, retrieval_guidance) = match &self.knowledge {
            Some(kb) => {
                let context = KnowledgeBase::format_context(
                    &kb.retrieve(&query_embedding, self.settings.knowledge_k),
                );
                let guidance = self
                    .retrieval_guidance(session_id, query, &query_embedding, kb)
                    .await;
                (context, guidance.unwrap_or_default())
            }
            None => (String::new(), String::new()),
        };

        // --- Inference ---
        let system = SystemPromptBuilder::build(&PromptInputs {
            instructions: &self.settings.instructions,
            guidance: &self.settings.guidance,
            best_practices: &practices,
            memories: &memories,
            retrieved_context: &context,
            retrieval_guidance: &retrieval_guidance,
        });

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message::user(query)],
            system: Some(system),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stop_sequences: None,
        };
        let response = self.provider.complete(&request).await?;

        info!(
            session_id,
            provider = self.provider.name(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            memories = memories.len(),
            practices = practices.len(),
            "Generated answer"
        );

        // --- Remember the turn ---
        let entry_id = match &self.sessions {
            Some(sessions) => {
                let entry = sessions
                    .append(
                        NewSessionEntry {
                            session_id: session_id.to_string(),
                            query: query.to_string(),
                            answer: response.content.clone(),
                            tags: wanted_tags,
                            ..Default::default()
                        },
                        query_embedding,
                        self.embedder.model_name(),
                    )
                    .await?;
                Some(entry.id)
            }
            None => None,
        };

        Ok(TurnResult {
            answer: response.content,
            source: AnswerSource::Generated {
                usage: response.usage,
            },
            entry_id,
            memories_injected: memories.len(),
            practices_injected: practices.len(),
        })
    }

    /// Candidate guidance for this turn, resolving an open clarifying
    /// question first when the session has one.
    async fn retrieval_guidance(
        &self,
        session_id: &str,
        query: &str,
        query_embedding: &[f32],
        kb: &KnowledgeBase,
    ) -> Option<String> {
        let scorer = self.scorer.as_ref()?;
        let mut states = self.retrieval.lock().await;
        let state = states.entry(session_id.to_string()).or_default();

        let pending = std::mem::take(&mut state.pending);
        if let Some(chosen) = scorer.select_from_clarification(query, &pending) {
            state.slots.update_from(&chosen.record);
            info!(
                session_id,
                service = %chosen.record.service_name,
                slots = %state.slots,
                "Clarification resolved"
            );
            return Some(scorer.selection_hint(chosen));
        }

        let candidates = kb.candidates(query, query_embedding, scorer);
        let assessment = scorer.assess(candidates, &state.slots);
        debug!(
            session_id,
            assessment = assessment.label(),
            slots = %state.slots,
            "Candidates assessed"
        );
        let guidance = assessment.prompt_guidance();
        match assessment {
            CandidateAssessment::Confident { candidate, .. } => {
                state.slots.update_from(&candidate.record);
            }
            CandidateAssessment::Ambiguous { candidates, .. } => {
                state.pending = candidates;
            }
            CandidateAssessment::Unclear | CandidateAssessment::NoMatch => {}
        }
        guidance
    }

    /// Forget filled slots and any open clarifying question for a session.
    pub async fn reset_retrieval(&self, session_id: &str) {
        self.retrieval.lock().await.remove(session_id);
    }

    /// Label a session entry. A `good` label promotes the entry to a best
    /// practice unless one was already promoted from it.
    ///
    /// Promotion runs before the label is saved, so a failed promotion
    /// leaves the entry unlabelled and the call can be retried.
    pub async fn record_outcome(
        &self,
        entry_id: &Uuid,
        outcome: Outcome,
    ) -> Result<Option<BestPractice>, MemoryError> {
        let sessions = self.sessions.as_ref().ok_or_else(|| {
            MemoryError::InvalidConfig("session memory is disabled".to_string())
        })?;

        let _guard = self.promotion.lock().await;
        let entry = sessions
            .get(entry_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let promoted = match (&self.practices, outcome) {
            (Some(store), Outcome::Good) => {
                let already = store
                    .list()
                    .await?
                    .iter()
                    .any(|p| p.source_entry == Some(*entry_id));
                if already {
                    debug!(entry_id = %entry_id, "Entry already promoted");
                    None
                } else {
                    let snippet = entry.as_snippet();
                    let embedding = self.embedder.embed_one(&snippet).await?;
                    let practice = store
                        .add(
                            NewBestPractice {
                                snippet,
                                tags: entry.tags.clone(),
                                outcome: Outcome::Good,
                                source_session: Some(entry.session_id.clone()),
                                source_entry: Some(*entry_id),
                            },
                            embedding,
                            self.embedder.model_name(),
                        )
                        .await?;
                    info!(practice_id = %practice.id, entry_id = %entry_id, "Promoted entry to best practice");
                    Some(practice)
                }
            }
            _ => None,
        };

        let entry = sessions.set_outcome(entry_id, outcome).await?;
        info!(entry_id = %entry_id, %outcome, session_id = %entry.session_id, "Outcome recorded");
        Ok(promoted)
    }

    /// Insert a best practice by hand.
    pub async fn add_best_practice(
        &self,
        snippet: &str,
        tags: &[String],
        outcome: Outcome,
    ) -> Result<BestPractice, MemoryError> {
        if snippet.trim().is_empty() {
            return Err(MemoryError::EmptySnippet);
        }
        let store = self.practices.as_ref().ok_or_else(|| {
            MemoryError::InvalidConfig("best-practice store is disabled".to_string())
        })?;

        let embedding = self.embedder.embed_one(snippet).await?;
        let practice = store
            .add(
                NewBestPractice {
                    snippet: snippet.to_string(),
                    tags: tags.to_vec(),
                    outcome,
                    source_session: None,
                    source_entry: None,
                },
                embedding,
                self.embedder.model_name(),
            )
            .await?;
        Ok(practice)
    }

    /// Continue a conversation handed over from the upstream chatbot.
    pub async fn process_handoff(
        &self,
        session_id: &str,
        package: &HandoffPackage,
    ) -> Result<TurnResult, MemoryError> {
        if package.next_agent_prompt.trim().is_empty() {
            return Err(MemoryError::EmptyQuery);
        }
        info!(
            session_id,
            handoff_agent_id = %package.handoff_agent_id,
            history_turns = package.final_conversation_history.len(),
            "Processing handoff"
        );
        self.respond(session_id, &package.context_prompt(), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use onward_types::handoff::HistoryTurn;
    use onward_types::knowledge::KnowledgeRecord;
    use onward_types::llm::{
        CompletionResponse, LlmError, ProviderCapabilities, StopReason, Usage,
    };

    use crate::llm::provider::LlmProvider;
    use crate::memory::best_practice::InMemoryBestPracticeStore;
    use crate::memory::hashing::HashingEmbedder;
    use crate::memory::session::InMemorySessionStore;

    // --- Mock provider ---

    struct MockProvider {
        capabilities: ProviderCapabilities,
        calls: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<CompletionRequest>>>,
        fail: bool,
    }

    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn capabilities(&self) -> &ProviderCapabilities {
            &self.capabilities
        }

        fn complete(
            &self,
            request: &CompletionRequest,
        ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.requests.lock().unwrap().push(request.clone());
            let fail = self.fail;
            async move {
                if fail {
                    return Err(LlmError::Provider {
                        message: "boom".to_string(),
                    });
                }
                Ok(CompletionResponse {
                    id: format!("resp-{n}"),
                    content: format!("generated answer {n}"),
                    model: "mock-model".to_string(),
                    stop_reason: StopReason::EndTurn,
                    usage: Usage {
                        input_tokens: 10,
                        output_tokens: 5,
                        ..Default::default()
                    },
                })
            }
        }
    }

    struct Harness {
        service: ChatService,
        calls: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<CompletionRequest>>>,
        practices: Arc<BoxBestPracticeStore>,
    }

    impl Harness {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_system_prompt(&self) -> String {
            self.requests
                .lock()
                .unwrap()
                .last()
                .and_then(|r| r.system.clone())
                .unwrap_or_default()
        }
    }

    fn settings() -> ChatSettings {
        ChatSettings {
            model: "claude-test".to_string(),
            max_tokens: 256,
            temperature: None,
            instructions: "You are the onward journey assistant.".to_string(),
            guidance: String::new(),
            memory_k: 5,
            best_practice_k: 3,
            knowledge_k: 3,
        }
    }

    fn harness_with(memory: bool, fail: bool, policy: FastAnswerPolicy) -> Harness {
        let calls = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let provider = Arc::new(BoxLlmProvider::new(MockProvider {
            capabilities: ProviderCapabilities {
                streaming: false,
                tool_calling: false,
                max_context_tokens: 200_000,
                max_output_tokens: 4096,
            },
            calls: calls.clone(),
            requests: requests.clone(),
            fail,
        }));
        let embedder = Arc::new(BoxEmbedder::new(HashingEmbedder::new(256)));
        let practices = Arc::new(BoxBestPracticeStore::new(InMemoryBestPracticeStore::new(
            None,
        )));

        let mut service = ChatService::new(provider, embedder, settings())
            .with_best_practices(practices.clone())
            .with_fast_answer(policy);
        if memory {
            service = service.with_sessions(Arc::new(BoxSessionMemoryStore::new(
                InMemorySessionStore::new(Some(100)),
            )));
        }

        Harness {
            service,
            calls,
            requests,
            practices,
        }
    }

    fn harness() -> Harness {
        harness_with(true, false, FastAnswerPolicy::default())
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_without_inference() {
        let h = harness();
        let err = h.service.respond("s", "   ", &[]).await.unwrap_err();
        assert!(matches!(err, MemoryError::EmptyQuery));
        assert_eq!(h.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_query_is_answered_from_memory() {
        let h = harness();
        let first = h
            .service
            .respond("s", "What is the number for the DVLA?", &[])
            .await
            .unwrap();
        assert!(matches!(first.source, AnswerSource::Generated { .. }));
        assert_eq!(h.calls(), 1);

        let second = h
            .service
            .respond("s", "what is the number for the DVLA", &[])
            .await
            .unwrap();
        assert_eq!(h.calls(), 1);
        assert_eq!(second.answer, first.answer);
        match second.source {
            AnswerSource::FastAnswer { entry_id, similarity } => {
                assert_eq!(Some(entry_id), first.entry_id);
                assert!(similarity >= 0.95);
            }
            other => panic!("expected fast answer, got {other:?}"),
        }

        // The reused answer is not stored again.
        let sessions = h.service.sessions.as_ref().unwrap();
        assert_eq!(sessions.count("s").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fast_answer_does_not_cross_sessions() {
        let h = harness();
        h.service.respond("a", "Where do I apply for a blue badge?", &[]).await.unwrap();
        let other = h
            .service
            .respond("b", "Where do I apply for a blue badge?", &[])
            .await
            .unwrap();
        assert!(matches!(other.source, AnswerSource::Generated { .. }));
        assert_eq!(h.calls(), 2);
    }

    #[tokio::test]
    async fn test_bad_outcome_blocks_reuse() {
        let h = harness();
        let first = h.service.respond("s", "How do I renew my passport?", &[]).await.unwrap();
        let promoted = h
            .service
            .record_outcome(&first.entry_id.unwrap(), Outcome::Bad)
            .await
            .unwrap();
        assert!(promoted.is_none());

        let second = h.service.respond("s", "How do I renew my passport?", &[]).await.unwrap();
        assert!(matches!(second.source, AnswerSource::Generated { .. }));
        assert_eq!(h.calls(), 2);
    }

    #[tokio::test]
    async fn test_threshold_one_requires_identical_wording() {
        let h = harness_with(true, false, FastAnswerPolicy::new(true, 1.0).unwrap());
        h.service.respond("s", "council tax band appeal", &[]).await.unwrap();
        h.service
            .respond("s", "council tax band appeal deadline", &[])
            .await
            .unwrap();
        assert_eq!(h.calls(), 2);
    }

    #[tokio::test]
    async fn test_disabled_fast_answer_still_recalls_memory() {
        let h = harness_with(true, false, FastAnswerPolicy::disabled());
        h.service.respond("s", "Tell me about child benefit", &[]).await.unwrap();
        let second = h
            .service
            .respond("s", "Tell me about child benefit", &[])
            .await
            .unwrap();
        assert_eq!(h.calls(), 2);
        assert_eq!(second.memories_injected, 1);
        assert!(h.last_system_prompt().contains("<session_memory>"));
        assert!(h.last_system_prompt().contains("[0] Q: Tell me about child benefit"));
    }

    #[tokio::test]
    async fn test_memory_disabled_never_reuses_or_records() {
        let h = harness_with(false, false, FastAnswerPolicy::default());
        let first = h.service.respond("s", "same question", &[]).await.unwrap();
        let second = h.service.respond("s", "same question", &[]).await.unwrap();
        assert_eq!(h.calls(), 2);
        assert!(first.entry_id.is_none());
        assert!(matches!(second.source, AnswerSource::Generated { .. }));

        let err = h
            .service
            .record_outcome(&Uuid::now_v7(), Outcome::Good)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_good_outcome_promotes_to_best_practice_once() {
        let h = harness();
        let turn = h
            .service
            .respond("s", "Which office handles tax credits?", &["Tax".to_string()])
            .await
            .unwrap();
        let entry_id = turn.entry_id.unwrap();

        let practice = h
            .service
            .record_outcome(&entry_id, Outcome::Good)
            .await
            .unwrap()
            .expect("promoted");
        assert_eq!(practice.outcome, Outcome::Good);
        assert_eq!(practice.tags, vec!["tax".to_string()]);
        assert_eq!(practice.source_session.as_deref(), Some("s"));
        assert!(practice.snippet.starts_with("Q: Which office handles tax credits? A: "));

        assert_eq!(practice.source_entry, Some(entry_id));

        let again = h.service.record_outcome(&entry_id, Outcome::Good).await.unwrap();
        assert!(again.is_none());
        // Relabelling through bad back to good does not duplicate either.
        h.service.record_outcome(&entry_id, Outcome::Bad).await.unwrap();
        let relabelled = h.service.record_outcome(&entry_id, Outcome::Good).await.unwrap();
        assert!(relabelled.is_none());
        assert_eq!(h.practices.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_promotion_leaves_entry_unlabelled_for_retry() {
        let h = harness();
        let turn = h
            .service
            .respond("s", "Where do I report a pothole?", &[])
            .await
            .unwrap();
        let entry_id = turn.entry_id.unwrap();

        // A 2-dim practice makes the store reject the 256-dim promotion.
        let seed = h
            .practices
            .add(
                NewBestPractice {
                    snippet: "seed".to_string(),
                    tags: vec![],
                    outcome: Outcome::Good,
                    source_session: None,
                    source_entry: None,
                },
                vec![1.0, 0.0],
                "other-model",
            )
            .await
            .unwrap();

        let err = h
            .service
            .record_outcome(&entry_id, Outcome::Good)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::Repository(RepositoryError::Conflict(_))));
        let sessions = h.service.sessions.as_ref().unwrap();
        let stored = sessions.get(&entry_id).await.unwrap().unwrap();
        assert_eq!(stored.outcome, None);

        h.practices.delete(&seed.id).await.unwrap();
        let practice = h
            .service
            .record_outcome(&entry_id, Outcome::Good)
            .await
            .unwrap()
            .expect("retry promotes");
        assert_eq!(practice.source_entry, Some(entry_id));
        let stored = sessions.get(&entry_id).await.unwrap().unwrap();
        assert_eq!(stored.outcome, Some(Outcome::Good));
        assert_eq!(h.practices.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_good_labels_promote_once() {
        let h = harness();
        let turn = h
            .service
            .respond("s", "How do I register a birth?", &[])
            .await
            .unwrap();
        let entry_id = turn.entry_id.unwrap();

        let (a, b) = tokio::join!(
            h.service.record_outcome(&entry_id, Outcome::Good),
            h.service.record_outcome(&entry_id, Outcome::Good),
        );
        let promoted = [a.unwrap(), b.unwrap()].into_iter().flatten().count();
        assert_eq!(promoted, 1);
        assert_eq!(h.practices.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_best_practices_are_injected_by_tag() {
        let h = harness();
        h.service
            .add_best_practice(
                "Give the phone number before the web link",
                &["phone".to_string()],
                Outcome::Good,
            )
            .await
            .unwrap();

        let tagged = h
            .service
            .respond("s", "phone number for HMRC", &["PHONE".to_string()])
            .await
            .unwrap();
        assert_eq!(tagged.practices_injected, 1);
        let prompt = h.last_system_prompt();
        assert!(prompt.contains("<priority_order>"));
        assert!(prompt.contains("- [phone] Give the phone number before the web link"));

        let untagged = h
            .service
            .respond("t", "phone number for HMRC", &["benefits".to_string()])
            .await
            .unwrap();
        assert_eq!(untagged.practices_injected, 0);
        assert!(!h.last_system_prompt().contains("<best_practices>"));
    }

    #[tokio::test]
    async fn test_blank_snippet_is_rejected() {
        let h = harness();
        let err = h
            .service
            .add_best_practice("  ", &[], Outcome::Good)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::EmptySnippet));
    }

    #[tokio::test]
    async fn test_unknown_entry_is_not_found() {
        let h = harness();
        let err = h
            .service
            .record_outcome(&Uuid::now_v7(), Outcome::Neutral)
            .await
            .unwrap_err();
        assert!(matches!(err, MemoryError::Repository(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_knowledge_context_is_injected() {
        let h = harness();
        let embedder = BoxEmbedder::new(HashingEmbedder::new(256));
        let kb = KnowledgeBase::build(
            &[KnowledgeRecord {
                uid: "9".to_string(),
                service_name: "Driving licence renewal".to_string(),
                phone_number: "0300 790 6801".to_string(),
                ..Default::default()
            }],
            &embedder,
        )
        .await
        .unwrap();
        let service = h.service.with_knowledge(Arc::new(kb));

        service
            .respond("s", "renew my driving licence", &[])
            .await
            .unwrap();
        let prompt = h
            .requests
            .lock()
            .unwrap()
            .last()
            .and_then(|r| r.system.clone())
            .unwrap();
        assert!(prompt.contains("<retrieved_context>\nRetrieved Context:\nThe unique id is 9."));
        assert!(!prompt.contains("<retrieval_guidance>"));
    }

    fn student_finance(uid: &str, department: &str) -> KnowledgeRecord {
        KnowledgeRecord {
            uid: uid.to_string(),
            service_name: "Student finance".to_string(),
            department: department.to_string(),
            tags: "loans".to_string(),
            ..Default::default()
        }
    }

    async fn knowledge(records: &[KnowledgeRecord]) -> Arc<KnowledgeBase> {
        let embedder = BoxEmbedder::new(HashingEmbedder::new(256));
        Arc::new(KnowledgeBase::build(records, &embedder).await.unwrap())
    }

    #[tokio::test]
    async fn test_confident_candidate_adds_hint_and_fills_slots() {
        let h = harness();
        let kb = knowledge(&[KnowledgeRecord {
            uid: "9".to_string(),
            service_name: "Driving licence renewal".to_string(),
            department: "DVLA".to_string(),
            ..Default::default()
        }])
        .await;
        let service = h
            .service
            .with_knowledge(kb)
            .with_candidate_scoring(CandidateConfig {
                weak_floor: -1.0,
                confident_threshold: -1.0,
                ..Default::default()
            });

        service.respond("s", "renew my driving licence", &[]).await.unwrap();
        let prompt = h.requests.lock().unwrap().last().and_then(|r| r.system.clone()).unwrap();
        assert!(prompt.contains(
            "<retrieval_guidance>\nSingle strong match: Driving licence renewal. department: DVLA."
        ));

        let states = service.retrieval.lock().await;
        let slots = &states.get("s").unwrap().slots;
        assert_eq!(slots.department.as_deref(), Some("DVLA"));
    }

    #[tokio::test]
    async fn test_close_candidates_ask_then_resolve_clarification() {
        let h = harness();
        let kb = knowledge(&[
            student_finance("1", "Student Finance England"),
            student_finance("2", "Student Awards Agency Scotland"),
        ])
        .await;
        // Every candidate counts as strong and close; nothing is confident.
        let service = h
            .service
            .with_knowledge(kb)
            .with_candidate_scoring(CandidateConfig {
                weak_floor: -1.0,
                strong_threshold: -1.0,
                ambiguity_gap: 2.0,
                confident_threshold: 2.0,
                ..Default::default()
            });

        service.respond("s", "student finance loans", &[]).await.unwrap();
        let prompt = h.requests.lock().unwrap().last().and_then(|r| r.system.clone()).unwrap();
        assert!(prompt.contains("<retrieval_guidance>\nSeveral services match"));
        assert!(prompt.contains("Are you based in"));
        assert!(prompt.contains("England") && prompt.contains("Scotland"));

        service.respond("s", "I study in Scotland", &[]).await.unwrap();
        let prompt = h.requests.lock().unwrap().last().and_then(|r| r.system.clone()).unwrap();
        assert!(prompt.contains(
            "Selected service: Student finance (department: Student Awards Agency Scotland)"
        ));
        {
            let states = service.retrieval.lock().await;
            let state = states.get("s").unwrap();
            assert!(state.pending.is_empty());
            assert_eq!(
                state.slots.department.as_deref(),
                Some("Student Awards Agency Scotland")
            );
        }

        // Other sessions never see the open question.
        service.respond("t", "I study in Scotland", &[]).await.unwrap();
        let prompt = h.requests.lock().unwrap().last().and_then(|r| r.system.clone()).unwrap();
        assert!(!prompt.contains("Selected service"));

        service.reset_retrieval("s").await;
        assert!(service.retrieval.lock().await.get("s").is_none());
    }

    #[tokio::test]
    async fn test_disabled_candidate_scoring_adds_no_guidance() {
        let h = harness();
        let kb = knowledge(&[student_finance("1", "Student Finance England")]).await;
        let service = h
            .service
            .with_knowledge(kb)
            .with_candidate_scoring(CandidateConfig {
                enabled: false,
                weak_floor: -1.0,
                confident_threshold: -1.0,
                ..Default::default()
            });
        service.respond("s", "student finance loans", &[]).await.unwrap();
        let prompt = h.requests.lock().unwrap().last().and_then(|r| r.system.clone()).unwrap();
        assert!(prompt.contains("<retrieved_context>"));
        assert!(!prompt.contains("<retrieval_guidance>"));
    }

    #[tokio::test]
    async fn test_provider_error_records_nothing() {
        let h = harness_with(true, true, FastAnswerPolicy::default());
        let err = h.service.respond("s", "anything", &[]).await.unwrap_err();
        assert!(matches!(err, MemoryError::Llm(LlmError::Provider { .. })));
        let sessions = h.service.sessions.as_ref().unwrap();
        assert_eq!(sessions.count("s").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_handoff_renders_history_into_query() {
        let h = harness();
        let package = HandoffPackage {
            handoff_agent_id: "GenericChatbot".to_string(),
            final_conversation_history: vec![HistoryTurn {
                role: "user".to_string(),
                content: "I moved house".to_string(),
            }],
            next_agent_prompt: "Who do I tell about my new address?".to_string(),
            status: Some("COMPLETED".to_string()),
        };
        let result = h.service.process_handoff("s", &package).await.unwrap();
        assert!(matches!(result.source, AnswerSource::Generated { .. }));

        let requests = h.requests.lock().unwrap();
        let user_message = &requests.last().unwrap().messages[0].content;
        assert!(user_message.contains("I moved house"));
        assert!(user_message.contains("Who do I tell about my new address?"));
    }
}
