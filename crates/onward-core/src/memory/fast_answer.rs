//! Fast-answer gate: reuse a prior answer when a query nearly repeats one.

use onward_types::config::FastAnswerConfig;
use onward_types::error::MemoryError;
use onward_types::memory::{Outcome, ScoredEntry};

/// Default similarity at or above which a prior answer is reused.
pub const DEFAULT_FAST_ANSWER_THRESHOLD: f32 = 0.95;

/// Whether and when near-duplicate queries skip inference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastAnswerPolicy {
    enabled: bool,
    threshold: f32,
}

/// Why the gate declined to reuse an answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FastAnswerMiss {
    Disabled,
    NoCandidate,
    BelowThreshold { similarity: f32 },
    BadOutcome,
    BlankAnswer,
}

/// Result of evaluating the gate against the nearest session entry.
#[derive(Debug, Clone, Copy)]
pub enum FastAnswerDecision<'a> {
    Reuse(&'a ScoredEntry),
    Miss(FastAnswerMiss),
}

impl FastAnswerPolicy {
    /// Build a policy. The threshold must lie in `[0.0, 1.0]`.
    pub fn new(enabled: bool, threshold: f32) -> Result<Self, MemoryError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(MemoryError::InvalidConfig(format!(
                "fast-answer threshold must be within [0.0, 1.0], got {threshold}"
            )));
        }
        Ok(Self { enabled, threshold })
    }

    pub fn from_config(config: &FastAnswerConfig) -> Result<Self, MemoryError> {
        Self::new(config.enabled, config.threshold)
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            threshold: DEFAULT_FAST_ANSWER_THRESHOLD,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Decide on the single nearest entry of the session.
    ///
    /// Only the nearest entry is inspected: a `bad` nearest entry is a miss
    /// even if a lower-ranked entry would qualify.
    pub fn evaluate<'a>(&self, nearest: Option<&'a ScoredEntry>) -> FastAnswerDecision<'a> {
        if !self.enabled {
            return FastAnswerDecision::Miss(FastAnswerMiss::Disabled);
        }
        let Some(candidate) = nearest else {
            return FastAnswerDecision::Miss(FastAnswerMiss::NoCandidate);
        };
        if candidate.similarity.is_nan() || candidate.similarity < self.threshold {
            return FastAnswerDecision::Miss(FastAnswerMiss::BelowThreshold {
                similarity: candidate.similarity,
            });
        }
        if candidate.entry.outcome == Some(Outcome::Bad) {
            return FastAnswerDecision::Miss(FastAnswerMiss::BadOutcome);
        }
        if candidate.entry.answer.trim().is_empty() {
            return FastAnswerDecision::Miss(FastAnswerMiss::BlankAnswer);
        }
        FastAnswerDecision::Reuse(candidate)
    }
}

impl Default for FastAnswerPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_FAST_ANSWER_THRESHOLD,
        }
    }
}
