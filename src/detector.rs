//! Service detection: the base keyword/pattern detector and the fused
//! detector that also weighs description overlap and conversation context.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::catalog::{LanguageCatalog, ServiceEntry};
use crate::context::{has_continuation_cue, has_switch_cue, ServiceContext};
use crate::preprocess::{preprocess_message, tokenize};
use crate::scorer::{KeywordAnalysis, KeywordScorer};
use crate::similarity::token_cosine;

/// Scale of the one canonical raw-to-[0, 1] normalisation.
pub const SCORE_SCALE: f32 = 10.0;

const PATTERN_WEIGHT: f32 = 5.0;
const EXACT_BONUS: f32 = 2.0;
const MAX_DENSITY_BONUS: f32 = 2.0;
const MAX_ALTERNATIVES: usize = 2;

const KEYWORD_WEIGHT: f32 = 0.35;
const DESCRIPTION_WEIGHT: f32 = 0.30;
const BASE_WEIGHT: f32 = 0.25;
const CONTEXT_WEIGHT: f32 = 0.10;

/// Two contributions closer than this (relative) count as a combined call.
const COMBINED_MARGIN: f32 = 0.15;
const DESCRIPTION_EVIDENCE: f32 = 0.5;

/// Maps a raw score onto [0, 1) with `1 - e^(-raw / SCORE_SCALE)`.
/// Strictly increasing for positive input, so strong matches stay apart.
pub fn normalize_score(raw: f32) -> f32 {
    if raw <= 0.0 {
        return 0.0;
    }
    (1.0 - (-raw / SCORE_SCALE).exp()).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    KeywordPrimary,
    DescriptionPrimary,
    BasePrimary,
    ContextPrimary,
    Combined,
    FallbackBasic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub service: String,
    pub keywords: Vec<String>,
    pub pattern_matches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceScore {
    pub service: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub service: Option<String>,
    pub confidence: f32,
    pub exact_matches: usize,
    pub matched_terms: Vec<MatchRecord>,
    pub alternative_services: Vec<ServiceScore>,
    pub detection_method: DetectionMethod,
}

impl DetectionResult {
    pub fn none(detection_method: DetectionMethod) -> Self {
        Self {
            service: None,
            confidence: 0.0,
            exact_matches: 0,
            matched_terms: Vec::new(),
            alternative_services: Vec::new(),
            detection_method,
        }
    }

    /// The detected service if its confidence reaches `threshold`.
    pub fn service_at(&self, threshold: f32) -> Option<&str> {
        self.service
            .as_deref()
            .filter(|_| self.confidence >= threshold)
    }
}

/// Per-service evidence from the base scorer.
struct BaseCandidate<'a> {
    service: &'a ServiceEntry,
    analysis: KeywordAnalysis,
    pattern_matches: usize,
    raw: f32,
}

impl BaseCandidate<'_> {
    fn has_direct_evidence(&self) -> bool {
        self.analysis.total_matches > 0 || self.pattern_matches > 0
    }

    fn match_record(&self) -> MatchRecord {
        MatchRecord {
            service: self.service.name.clone(),
            keywords: self.analysis.matched_keywords.clone(),
            pattern_matches: self.pattern_matches,
        }
    }
}

struct FusedCandidate<'a> {
    base: BaseCandidate<'a>,
    contributions: [(DetectionMethod, f32); 4],
    description_overlap: f32,
    score: f32,
}

/// Higher score first, then service name.
fn rank(a_score: f32, a_name: &str, b_score: f32, b_name: &str) -> Ordering {
    b_score
        .partial_cmp(&a_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_name.cmp(b_name))
}

#[derive(Debug, Clone, Default)]
pub struct ServiceDetector {
    scorer: KeywordScorer,
}

impl ServiceDetector {
    pub fn new(scorer: KeywordScorer) -> Self {
        Self { scorer }
    }

    fn base_candidates<'a>(
        &self,
        raw_lower: &str,
        processed: &str,
        catalog: &'a LanguageCatalog,
    ) -> Vec<BaseCandidate<'a>> {
        catalog
            .services
            .iter()
            .filter(|service| {
                let vetoed = service.is_vetoed(raw_lower, processed);
                if vetoed {
                    log::debug!("'{}' vetoed by a negative pattern", service.name);
                }
                !vetoed
            })
            .map(|service| {
                let analysis = self.scorer.score(processed, &service.keywords, catalog.language);
                let pattern_matches = service.pattern_matches(raw_lower, processed);
                let raw = analysis.relevance_score
                    + pattern_matches as f32 * PATTERN_WEIGHT
                    + (analysis.density_score * 0.1).min(MAX_DENSITY_BONUS)
                    + analysis.exact_matches as f32 * EXACT_BONUS;
                BaseCandidate {
                    service,
                    analysis,
                    pattern_matches,
                    raw,
                }
            })
            .collect()
    }

    /// Keyword and pattern detection without context.
    pub fn detect_service_from_message(&self, message: &str, catalog: &LanguageCatalog) -> DetectionResult {
        if message.trim().is_empty() {
            return DetectionResult::none(DetectionMethod::BasePrimary);
        }
        let raw_lower = message.to_lowercase();
        let processed = preprocess_message(message, catalog.language);

        let mut candidates: Vec<BaseCandidate> = self
            .base_candidates(&raw_lower, &processed, catalog)
            .into_iter()
            .filter(|c| c.raw > 0.0)
            .collect();
        candidates.sort_by(|a, b| {
            rank(
                normalize_score(a.raw),
                &a.service.name,
                normalize_score(b.raw),
                &b.service.name,
            )
        });

        let Some(best) = candidates.first() else {
            return DetectionResult::none(DetectionMethod::BasePrimary);
        };
        DetectionResult {
            service: Some(best.service.name.clone()),
            confidence: normalize_score(best.raw),
            exact_matches: best.analysis.exact_matches,
            matched_terms: candidates.iter().map(BaseCandidate::match_record).collect(),
            alternative_services: candidates
                .iter()
                .skip(1)
                .take(MAX_ALTERNATIVES)
                .map(|c| ServiceScore {
                    service: c.service.name.clone(),
                    score: normalize_score(c.raw),
                })
                .collect(),
            detection_method: DetectionMethod::BasePrimary,
        }
    }

    /// Fused detection over keywords, descriptions, the base score and the
    /// conversation context.
    pub fn detect_with_confidence(
        &self,
        message: &str,
        catalog: &LanguageCatalog,
        context: &ServiceContext,
    ) -> DetectionResult {
        if message.trim().is_empty() {
            return DetectionResult::none(DetectionMethod::Combined);
        }
        if !catalog.has_descriptions() {
            let mut result = self.detect_service_from_message(message, catalog);
            result.detection_method = DetectionMethod::FallbackBasic;
            return result;
        }

        let language = catalog.language;
        let raw_lower = message.to_lowercase();
        let processed = preprocess_message(message, language);
        let tokens = tokenize(&processed, language);
        let continuation = has_continuation_cue(&processed, language);
        let switching = has_switch_cue(&processed, language);

        let base = self.base_candidates(&raw_lower, &processed, catalog);
        let any_direct = base.iter().any(BaseCandidate::has_direct_evidence);

        if !any_direct && continuation {
            if let Some(current) = &context.current_service {
                let confidence = (0.5 + context.conversation_depth as f32 * 0.02).min(0.7);
                log::debug!("continuing with '{}' from context ({:.2})", current, confidence);
                return DetectionResult {
                    service: Some(current.clone()),
                    confidence,
                    exact_matches: 0,
                    matched_terms: Vec::new(),
                    alternative_services: Vec::new(),
                    detection_method: DetectionMethod::ContextPrimary,
                };
            }
        }

        let mut candidates: Vec<FusedCandidate> = base
            .into_iter()
            .map(|candidate| {
                let (overlap, description) =
                    self.description_score(&tokens, candidate.service.description_tokens());
                let keyword = normalize_score(candidate.analysis.relevance_score);
                let base_score = normalize_score(candidate.raw);
                let context_score =
                    context_score(&candidate.service.name, context, continuation, switching);
                let contributions = [
                    (DetectionMethod::KeywordPrimary, keyword * KEYWORD_WEIGHT),
                    (DetectionMethod::DescriptionPrimary, description * DESCRIPTION_WEIGHT),
                    (DetectionMethod::BasePrimary, base_score * BASE_WEIGHT),
                    (DetectionMethod::ContextPrimary, context_score * CONTEXT_WEIGHT),
                ];
                let score = contributions.iter().map(|(_, v)| v).sum::<f32>().clamp(0.0, 1.0);
                FusedCandidate {
                    base: candidate,
                    contributions,
                    description_overlap: overlap,
                    score,
                }
            })
            .filter(|c| c.base.has_direct_evidence() || c.description_overlap >= DESCRIPTION_EVIDENCE)
            .collect();
        candidates.sort_by(|a, b| {
            rank(a.score, &a.base.service.name, b.score, &b.base.service.name)
        });

        let Some(best) = candidates.first() else {
            return DetectionResult::none(DetectionMethod::Combined);
        };
        let method = primary_method(&best.contributions);
        log::debug!(
            "detected '{}' ({:.2}, {:?})",
            best.base.service.name,
            best.score,
            method
        );

        DetectionResult {
            service: Some(best.base.service.name.clone()),
            confidence: best.score,
            exact_matches: best.base.analysis.exact_matches,
            matched_terms: candidates
                .iter()
                .filter(|c| c.base.has_direct_evidence())
                .map(|c| c.base.match_record())
                .collect(),
            alternative_services: candidates
                .iter()
                .skip(1)
                .take(MAX_ALTERNATIVES)
                .map(|c| ServiceScore {
                    service: c.base.service.name.clone(),
                    score: c.score,
                })
                .collect(),
            detection_method: method,
        }
    }

    /// Returns `(overlap, score)`: the share of message tokens found in the
    /// description, and the larger of that share and the token cosine.
    fn description_score(&self, tokens: &[String], description: &[String]) -> (f32, f32) {
        if tokens.is_empty() || description.is_empty() {
            return (0.0, 0.0);
        }
        let found = tokens
            .iter()
            .filter(|token| self.scorer.token_matches(token, description))
            .count();
        let overlap = found as f32 / tokens.len() as f32;
        (overlap, overlap.max(token_cosine(tokens, description)))
    }
}

fn context_score(service: &str, context: &ServiceContext, continuation: bool, switching: bool) -> f32 {
    let score = if context.current_service.as_deref() == Some(service) {
        let mut score = 0.6 + context.conversation_depth as f32 * 0.02;
        if continuation {
            score += 0.2;
        }
        if switching {
            score -= 0.5;
        }
        score
    } else if context.service_history.iter().any(|s| s == service) {
        0.3
    } else {
        0.0
    };
    score.clamp(0.0, 1.0)
}

fn primary_method(contributions: &[(DetectionMethod, f32); 4]) -> DetectionMethod {
    let mut sorted = contributions.to_vec();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    let (top_method, top) = sorted[0];
    let second = sorted[1].1;
    if top > 0.0 && second > 0.0 && (top - second) / top <= COMBINED_MARGIN {
        DetectionMethod::Combined
    } else {
        top_method
    }
}
