//! Candidate scoring over knowledge-base services.
//!
//! Cosine similarity gets a small lexical bonus when the record's tags or
//! description words appear in the query. The ranked candidates then decide
//! whether a turn has one clear service, a near tie worth a clarifying
//! question, or neither.

use std::collections::BTreeSet;

use onward_types::config::CandidateConfig;
use onward_types::knowledge::KnowledgeRecord;
use serde::Serialize;

use super::slots::{ServiceSlots, Slot};

/// Bonus per tag found in the query.
pub const TAG_BONUS: f32 = 0.02;
/// Bonus per distinct description word (4+ letters) found in the query.
pub const DESCRIPTION_BONUS: f32 = 0.005;
/// Ceiling on the total lexical bonus.
pub const MAX_LEXICAL_BONUS: f32 = 0.05;

type RegionTable = &'static [(&'static str, &'static [&'static str])];

/// Regions a candidate record can be attributed to.
const CANDIDATE_REGIONS: RegionTable = &[
    ("england", &["england", "english", "dfe", "uk"]),
    ("northern ireland", &["ni", "northern ireland"]),
    ("scotland", &["scotland", "scottish"]),
    ("wales", &["wales", "welsh"]),
];

/// Regions offered back to the user in a clarifying question.
const QUESTION_REGIONS: RegionTable = &[
    ("England", &["england", "english", "dfe"]),
    ("Northern Ireland", &["ni", "northern ireland"]),
    ("Scotland", &["scotland", "scottish"]),
    ("Wales", &["wales", "welsh"]),
    ("UK-wide", &["uk", "united kingdom"]),
];

/// A knowledge record with its combined score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub record: KnowledgeRecord,
    /// `base_score + bonus`.
    pub score: f32,
    pub base_score: f32,
    pub bonus: f32,
}

/// What the ranked candidates say about a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateAssessment {
    /// One service stands clear of the rest.
    Confident {
        candidate: ScoredCandidate,
        hint: String,
    },
    /// Close matches from different services; ask before answering.
    Ambiguous {
        candidates: Vec<ScoredCandidate>,
        question: String,
    },
    /// Candidates exist but none is clear and they do not tie.
    Unclear,
    /// Nothing cleared the weak floor.
    NoMatch,
}

impl CandidateAssessment {
    /// Text for the `<retrieval_guidance>` prompt section, if any.
    pub fn prompt_guidance(&self) -> Option<String> {
        match self {
            CandidateAssessment::Confident { hint, .. } => Some(hint.clone()),
            CandidateAssessment::Ambiguous { question, .. } => Some(format!(
                "Several services match this request closely. \
                 Ask the user this before giving contact details: {question}"
            )),
            CandidateAssessment::Unclear | CandidateAssessment::NoMatch => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CandidateAssessment::Confident { .. } => "confident",
            CandidateAssessment::Ambiguous { .. } => "ambiguous",
            CandidateAssessment::Unclear => "unclear",
            CandidateAssessment::NoMatch => "no_match",
        }
    }
}

/// Scores and judges knowledge-base candidates for a query.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateScorer {
    config: CandidateConfig,
}

impl CandidateScorer {
    pub fn new(config: CandidateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CandidateConfig {
        &self.config
    }

    /// Combine similarity with the lexical bonus, drop weak candidates and
    /// keep the best `top_n`. Equal scores keep their input order.
    pub fn rank<'a>(
        &self,
        query: &str,
        hits: impl IntoIterator<Item = (&'a KnowledgeRecord, f32)>,
    ) -> Vec<ScoredCandidate> {
        let mut ranked: Vec<ScoredCandidate> = hits
            .into_iter()
            .filter(|(_, base)| !base.is_nan())
            .filter_map(|(record, base_score)| {
                let bonus = lexical_bonus(record, query);
                let score = base_score + bonus;
                (score >= self.config.weak_floor).then(|| ScoredCandidate {
                    record: record.clone(),
                    score,
                    base_score,
                    bonus,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(self.config.top_n);
        ranked
    }

    /// Whether the top two candidates are too close to pick between.
    ///
    /// Requires a score gap within `ambiguity_gap`, at least two strong
    /// candidates, and more than one distinct service among the candidates.
    pub fn needs_disambiguation(&self, candidates: &[ScoredCandidate]) -> bool {
        let [top, second, ..] = candidates else {
            return false;
        };
        let close = (top.score - second.score).abs() <= self.config.ambiguity_gap;
        let strong = candidates
            .iter()
            .filter(|c| c.score >= self.config.strong_threshold)
            .count();
        let services: BTreeSet<(&str, &str, &str)> = candidates
            .iter()
            .map(|c| &c.record)
            .filter(|r| !r.service_name.trim().is_empty())
            .map(|r| {
                (
                    r.service_name.trim(),
                    r.department.trim(),
                    r.user_type.trim(),
                )
            })
            .collect();
        close && strong >= 2 && services.len() > 1
    }

    /// Hint for a single clear match, or `None` when no candidate stands out.
    pub fn confidence_hint(&self, candidates: &[ScoredCandidate]) -> Option<String> {
        let top = candidates.first()?;
        let second = candidates.get(1).map_or(0.0, |c| c.score);
        let margin = top.score - second;

        let clear = top.score >= self.config.confident_threshold
            && margin >= self.config.confident_margin;
        let single = candidates.len() == 1 && top.score >= self.config.confident_threshold;
        if !(clear || single) {
            return None;
        }

        let service = non_empty(&top.record.service_name).unwrap_or("one service");
        let mut details = vec![format!("Single strong match: {service}")];
        if let Some(department) = non_empty(&top.record.department) {
            details.push(format!("department: {department}"));
        }
        details.push(format!("score={:.2}, margin={margin:.2}", top.score));
        details.push(
            "Answer with this service's details without asking a clarifying question."
                .to_string(),
        );
        Some(details.join(". "))
    }

    /// A short question that separates close candidates, preferring slots
    /// the conversation has not filled yet.
    pub fn disambiguation_question(
        &self,
        candidates: &[ScoredCandidate],
        slots: &ServiceSlots,
    ) -> Option<String> {
        if !self.needs_disambiguation(candidates) {
            return None;
        }
        let leading = &candidates[..candidates.len().min(3)];

        let distinct = |slot: Slot| {
            let mut seen: Vec<&str> = Vec::new();
            for candidate in leading {
                let value = slot.value_of(&candidate.record);
                if !value.is_empty() && !seen.contains(&value) {
                    seen.push(value);
                }
            }
            seen
        };

        let target = Slot::PRIORITY
            .into_iter()
            .find(|s| slots.is_missing(*s) && distinct(*s).len() > 1)
            .or_else(|| Slot::PRIORITY.into_iter().find(|s| distinct(*s).len() > 1));

        if let Some(slot) = target {
            let values = distinct(slot);
            let examples = values[..2].join(" or ");

            let mut regions: Vec<&str> = Vec::new();
            for candidate in leading {
                let r = &candidate.record;
                let text = word_text(&[
                    r.service_name.as_str(),
                    r.department.as_str(),
                    r.tags.as_str(),
                ]);
                for (label, synonyms) in QUESTION_REGIONS {
                    if !regions.contains(label) && synonyms.iter().any(|s| has_phrase(&text, s)) {
                        regions.push(*label);
                    }
                }
            }
            if regions.len() > 1 {
                return Some(format!(
                    "Are you based in {} or {}? That decides which contact to give you.",
                    regions[0], regions[1]
                ));
            }

            return Some(match slot {
                Slot::Department => {
                    format!("Which department does this relate to? For example: {examples}.")
                }
                Slot::UserType => {
                    format!("Are you asking as {examples}? That helps me pick the right contact.")
                }
                Slot::Tags => format!("Which topic best fits this request ({examples})?"),
                Slot::ServiceName => format!("Which service name matches best: {examples}?"),
            });
        }

        let options: Vec<String> = candidates
            .iter()
            .take(2)
            .map(|c| {
                let r = &c.record;
                let service = non_empty(&r.service_name).unwrap_or("this service");
                let mut parts = Vec::new();
                if let Some(d) = non_empty(&r.department) {
                    parts.push(format!("department: {d}"));
                }
                if let Some(u) = non_empty(&r.user_type) {
                    parts.push(format!("user type: {u}"));
                }
                if let Some(t) = non_empty(&r.tags) {
                    parts.push(format!("tags: {t}"));
                }
                if parts.is_empty() {
                    service.to_string()
                } else {
                    format!("{service} ({})", parts.join("; "))
                }
            })
            .collect();
        Some(format!(
            "I found a couple of close matches: {}. Which one fits your request?",
            options.join(" or ")
        ))
    }

    /// Judge ranked candidates: a confident match wins over a tie.
    pub fn assess(
        &self,
        candidates: Vec<ScoredCandidate>,
        slots: &ServiceSlots,
    ) -> CandidateAssessment {
        if candidates.is_empty() {
            return CandidateAssessment::NoMatch;
        }
        if let Some(hint) = self.confidence_hint(&candidates) {
            let candidate = candidates[0].clone();
            return CandidateAssessment::Confident { candidate, hint };
        }
        match self.disambiguation_question(&candidates, slots) {
            Some(question) => CandidateAssessment::Ambiguous {
                candidates,
                question,
            },
            None => CandidateAssessment::Unclear,
        }
    }

    /// Pick the candidate a clarification reply refers to.
    ///
    /// A region named in the reply wins; otherwise the candidate sharing the
    /// most words with the reply, falling back to the top candidate.
    pub fn select_from_clarification<'a>(
        &self,
        reply: &str,
        candidates: &'a [ScoredCandidate],
    ) -> Option<&'a ScoredCandidate> {
        let first = candidates.first()?;
        let reply = reply.to_lowercase();

        let mut best_region: Option<(usize, &ScoredCandidate)> = None;
        for candidate in candidates {
            let score = candidate_regions(&candidate.record)
                .into_iter()
                .filter(|region| reply.contains(region))
                .count()
                * 2;
            if score > best_region.map_or(0, |(s, _)| s) {
                best_region = Some((score, candidate));
            }
        }
        if let Some((_, candidate)) = best_region {
            return Some(candidate);
        }

        let mut best: Option<(usize, &ScoredCandidate)> = None;
        for candidate in candidates {
            let r = &candidate.record;
            let text = [
                r.service_name.as_str(),
                r.department.as_str(),
                r.tags.as_str(),
                r.description.as_str(),
            ]
            .join(" ")
            .to_lowercase();
            let words: BTreeSet<&str> = ascii_words(&text, 3).collect();
            let overlap = words.iter().filter(|w| reply.contains(**w)).count();
            let better = match best {
                None => true,
                Some((o, b)) => overlap > o || (overlap == o && candidate.score > b.score),
            };
            if better {
                best = Some((overlap, candidate));
            }
        }
        match best {
            Some((overlap, candidate)) if overlap > 0 => Some(candidate),
            _ => Some(first),
        }
    }

    /// Prompt text after a clarification picked a candidate.
    pub fn selection_hint(&self, candidate: &ScoredCandidate) -> String {
        let r = &candidate.record;
        let service = non_empty(&r.service_name).unwrap_or("the matching service");
        match non_empty(&r.department) {
            Some(department) => format!(
                "The user answered the clarifying question. Selected service: {service} \
                 (department: {department}). Answer with this service's details."
            ),
            None => format!(
                "The user answered the clarifying question. Selected service: {service}. \
                 Answer with this service's details."
            ),
        }
    }
}

/// Small bonus when the record's tags or description words occur in the query.
pub fn lexical_bonus(record: &KnowledgeRecord, query: &str) -> f32 {
    let query = query.to_lowercase();
    let mut bonus = 0.0;

    for tag in record.tags.split([',', '/', ';', '|']) {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && query.contains(&tag) {
            bonus += TAG_BONUS;
        }
    }

    let description = record.description.to_lowercase();
    let words: BTreeSet<&str> = ascii_words(&description, 4).collect();
    for word in words {
        if query.contains(word) {
            bonus += DESCRIPTION_BONUS;
        }
    }

    f32::min(bonus, MAX_LEXICAL_BONUS)
}

fn candidate_regions(record: &KnowledgeRecord) -> Vec<&'static str> {
    let text = word_text(&[
        record.service_name.as_str(),
        record.department.as_str(),
        record.tags.as_str(),
        record.description.as_str(),
    ]);
    CANDIDATE_REGIONS
        .iter()
        .filter(|(_, synonyms)| synonyms.iter().any(|s| has_phrase(&text, s)))
        .map(|(label, _)| *label)
        .collect()
}

/// Runs of ASCII letters at least `min_len` long.
fn ascii_words(text: &str, min_len: usize) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(move |w| w.len() >= min_len)
}

/// Lower-cased words separated by single spaces, padded at both ends.
fn word_text(parts: &[&str]) -> String {
    let joined = parts.join(" ").to_lowercase();
    let words: Vec<&str> = joined
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    format!(" {} ", words.join(" "))
}

fn has_phrase(text: &str, phrase: &str) -> bool {
    text.contains(&format!(" {phrase} "))
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(service: &str, department: &str, user_type: &str, tags: &str) -> KnowledgeRecord {
        KnowledgeRecord {
            service_name: service.to_string(),
            department: department.to_string(),
            user_type: user_type.to_string(),
            tags: tags.to_string(),
            ..Default::default()
        }
    }

    fn candidate(record: KnowledgeRecord, score: f32) -> ScoredCandidate {
        ScoredCandidate {
            record,
            score,
            base_score: score,
            bonus: 0.0,
        }
    }

    fn scorer() -> CandidateScorer {
        CandidateScorer::new(CandidateConfig::default())
    }

    #[test]
    fn test_tag_bonus_is_capped() {
        let mut r = record("Student finance", "SFE", "", "loan, grant, fees, tuition");
        assert!((lexical_bonus(&r, "loan question") - 0.02).abs() < 1e-6);
        assert!((lexical_bonus(&r, "loan and grant") - 0.04).abs() < 1e-6);
        assert!((lexical_bonus(&r, "loan grant fees tuition") - MAX_LEXICAL_BONUS).abs() < 1e-6);

        r.tags.clear();
        r.description = "Apply for student finance, student loans".to_string();
        // "student" repeats but counts once; "loans" is not in the query.
        let bonus = lexical_bonus(&r, "apply for student finance");
        assert!((bonus - 3.0 * DESCRIPTION_BONUS).abs() < 1e-6);
    }

    #[test]
    fn test_rank_applies_weak_floor_and_top_n() {
        let records = [
            record("A", "", "", ""),
            record("B", "", "", ""),
            record("C", "", "", ""),
            record("D", "", "", ""),
            record("E", "", "", ""),
        ];
        let hits = records.iter().zip([0.24, 0.6, 0.26, 0.4, f32::NAN]);
        let ranked = scorer().rank("unrelated", hits);
        let names: Vec<&str> = ranked.iter().map(|c| c.record.service_name.as_str()).collect();
        assert_eq!(names, vec!["B", "D", "C"]);

        let narrow = CandidateScorer::new(CandidateConfig {
            top_n: 1,
            ..Default::default()
        });
        assert_eq!(narrow.rank("x", records.iter().zip([0.3, 0.5, 0.0, 0.0, 0.0])).len(), 1);
    }

    #[test]
    fn test_bonus_can_lift_candidate_over_floor() {
        let r = record("Blue badge", "", "", "parking");
        let ranked = scorer().rank("parking permit", [(&r, 0.24)]);
        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].bonus - TAG_BONUS).abs() < 1e-6);
        assert!((ranked[0].score - 0.26).abs() < 1e-6);
    }

    #[test]
    fn test_disambiguation_needs_close_gap() {
        let s = scorer();
        let a = record("Student finance England", "SFE", "", "");
        let b = record("Student finance Wales", "SFW", "", "");
        assert!(s.needs_disambiguation(&[candidate(a.clone(), 0.50), candidate(b.clone(), 0.46)]));
        assert!(!s.needs_disambiguation(&[candidate(a.clone(), 0.50), candidate(b.clone(), 0.44)]));
        assert!(!s.needs_disambiguation(&[candidate(a, 0.50)]));
    }

    #[test]
    fn test_disambiguation_needs_two_strong_candidates() {
        let s = scorer();
        let a = record("Student finance England", "SFE", "", "");
        let b = record("Student finance Wales", "SFW", "", "");
        assert!(s.needs_disambiguation(&[candidate(a.clone(), 0.37), candidate(b.clone(), 0.36)]));
        assert!(!s.needs_disambiguation(&[candidate(a, 0.36), candidate(b, 0.34)]));
    }

    #[test]
    fn test_disambiguation_needs_distinct_services() {
        let s = scorer();
        let a = record("Passport renewal", "HMPO", "citizen", "");
        let same = vec![candidate(a.clone(), 0.50), candidate(a.clone(), 0.49)];
        assert!(!s.needs_disambiguation(&same));

        let other_user = record("Passport renewal", "HMPO", "overseas", "");
        assert!(s.needs_disambiguation(&[candidate(a, 0.50), candidate(other_user, 0.49)]));
    }

    #[test]
    fn test_confidence_hint_thresholds() {
        let s = scorer();
        let top = record("Child Benefit", "HMRC", "", "");
        let other = record("Tax credits", "HMRC", "", "");

        let hint = s
            .confidence_hint(&[candidate(top.clone(), 0.72), candidate(other.clone(), 0.50)])
            .expect("clear margin");
        assert_eq!(
            hint,
            "Single strong match: Child Benefit. department: HMRC. score=0.72, margin=0.22. \
             Answer with this service's details without asking a clarifying question."
        );

        // Margin just under 0.15.
        assert!(s.confidence_hint(&[candidate(top.clone(), 0.70), candidate(other.clone(), 0.56)]).is_none());
        // Score just under 0.55.
        assert!(s.confidence_hint(&[candidate(top.clone(), 0.54), candidate(other, 0.20)]).is_none());
        // A lone candidate only needs the score.
        assert!(s.confidence_hint(&[candidate(top.clone(), 0.56)]).is_some());
        assert!(s.confidence_hint(&[candidate(top, 0.53)]).is_none());
        assert!(s.confidence_hint(&[]).is_none());
    }

    #[test]
    fn test_question_targets_first_missing_slot() {
        let s = scorer();
        let candidates = vec![
            candidate(record("Jobseeker's Allowance", "DWP", "employee", ""), 0.50),
            candidate(record("Jobseeker's Allowance", "DWP", "employer", ""), 0.48),
        ];
        assert_eq!(
            s.disambiguation_question(&candidates, &ServiceSlots::default()).as_deref(),
            Some("Are you asking as employee or employer? That helps me pick the right contact.")
        );

        let candidates = vec![
            candidate(record("Pension credit", "DWP", "", ""), 0.50),
            candidate(record("State pension", "DWP", "", ""), 0.48),
        ];
        let known_service = ServiceSlots {
            service_name: Some("State pension".to_string()),
            ..Default::default()
        };
        // Only service_name differs, so it is asked even though filled.
        assert_eq!(
            s.disambiguation_question(&candidates, &known_service).as_deref(),
            Some("Which service name matches best: Pension credit or State pension?")
        );
    }

    #[test]
    fn test_question_prefers_missing_slot_over_filled() {
        let s = scorer();
        let candidates = vec![
            candidate(record("Apprenticeships", "DfE", "", "training"), 0.50),
            candidate(record("Skills bootcamps", "DWP", "", "jobs"), 0.47),
        ];
        let slots = ServiceSlots {
            service_name: Some("Apprenticeships".to_string()),
            ..Default::default()
        };
        assert_eq!(
            s.disambiguation_question(&candidates, &slots).as_deref(),
            Some("Which department does this relate to? For example: DfE or DWP.")
        );
    }

    #[test]
    fn test_question_asks_region_when_candidates_span_regions() {
        let s = scorer();
        let candidates = vec![
            candidate(record("Student finance", "Student Finance England", "", "loans"), 0.50),
            candidate(record("Student finance", "Student Awards Agency Scotland", "", "loans"), 0.49),
        ];
        assert_eq!(
            s.disambiguation_question(&candidates, &ServiceSlots::default()).as_deref(),
            Some("Are you based in England or Scotland? That decides which contact to give you.")
        );
    }

    #[test]
    fn test_region_tokens_match_whole_words() {
        let s = scorer();
        // "united" and "community" contain "ni" but are not Northern Ireland.
        let candidates = vec![
            candidate(record("Community care", "United services", "", ""), 0.50),
            candidate(record("Carer's allowance", "DWP", "", ""), 0.49),
        ];
        assert_eq!(
            s.disambiguation_question(&candidates, &ServiceSlots::default()).as_deref(),
            Some("Which service name matches best: Community care or Carer's allowance?")
        );
    }

    #[test]
    fn test_question_falls_back_to_listing_options() {
        let s = scorer();
        // Only the second candidate has a user type, so no slot has two values.
        let candidates = vec![
            candidate(record("Blue badge", "Council", "", ""), 0.50),
            candidate(record("Blue badge", "Council", "carer", ""), 0.49),
        ];
        assert_eq!(
            s.disambiguation_question(&candidates, &ServiceSlots::default()).as_deref(),
            Some(
                "I found a couple of close matches: Blue badge (department: Council) or \
                 Blue badge (department: Council; user type: carer). Which one fits your request?"
            )
        );

        let identical_slots = vec![
            candidate(record("Blue badge", "Council", "", ""), 0.50),
            candidate(
                KnowledgeRecord {
                    url: "https://example.gov.uk/b".to_string(),
                    ..record("Blue badge", "Council", "", "")
                },
                0.49,
            ),
        ];
        assert!(s.disambiguation_question(&identical_slots, &ServiceSlots::default()).is_none());
    }

    #[test]
    fn test_assess_prefers_confident_then_ambiguous() {
        let s = scorer();
        let slots = ServiceSlots::default();
        assert_eq!(s.assess(vec![], &slots), CandidateAssessment::NoMatch);

        let clear = vec![
            candidate(record("Child Benefit", "HMRC", "", ""), 0.80),
            candidate(record("Tax credits", "HMRC", "", ""), 0.40),
        ];
        match s.assess(clear, &slots) {
            CandidateAssessment::Confident { candidate, hint } => {
                assert_eq!(candidate.record.service_name, "Child Benefit");
                assert!(hint.starts_with("Single strong match: Child Benefit"));
            }
            other => panic!("expected confident, got {other:?}"),
        }

        let tied = vec![
            candidate(record("Child Benefit", "HMRC", "", ""), 0.50),
            candidate(record("Tax credits", "HMRC", "", ""), 0.48),
        ];
        let assessment = s.assess(tied, &slots);
        assert_eq!(assessment.label(), "ambiguous");
        assert!(
            assessment
                .prompt_guidance()
                .unwrap()
                .ends_with("Which service name matches best: Child Benefit or Tax credits?")
        );

        let loose = vec![
            candidate(record("Child Benefit", "HMRC", "", ""), 0.50),
            candidate(record("Tax credits", "HMRC", "", ""), 0.40),
        ];
        let assessment = s.assess(loose, &slots);
        assert_eq!(assessment, CandidateAssessment::Unclear);
        assert!(assessment.prompt_guidance().is_none());
    }

    #[test]
    fn test_clarification_selects_by_region_then_overlap() {
        let s = scorer();
        let candidates = vec![
            candidate(record("Student finance", "Student Finance England", "", "loans"), 0.50),
            candidate(record("Student finance", "Student Awards Agency Scotland", "", "loans"), 0.49),
        ];
        let picked = s.select_from_clarification("I live in Scotland", &candidates).unwrap();
        assert_eq!(picked.record.department, "Student Awards Agency Scotland");

        let candidates = vec![
            candidate(record("Pension credit", "DWP", "", "low income"), 0.50),
            candidate(record("State pension", "DWP", "", "retirement"), 0.49),
        ];
        let picked = s
            .select_from_clarification("the one about retirement", &candidates)
            .unwrap();
        assert_eq!(picked.record.service_name, "State pension");

        let picked = s.select_from_clarification("hmm", &candidates).unwrap();
        assert_eq!(picked.record.service_name, "Pension credit");
        assert!(s.select_from_clarification("anything", &[]).is_none());
    }
}
