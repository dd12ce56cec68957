//! Keyword scoring for one service against one message.

use serde::Serialize;
use std::sync::Arc;

use crate::language::Language;
use crate::preprocess::{is_stop_word, tokenize};
use crate::similarity::{Levenshtein, Similarity};

const FUZZY_THRESHOLD: f32 = 0.75;
const FUZZY_MIN_CHARS: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordAnalysis {
    pub matched_keywords: Vec<String>,
    pub total_matches: usize,
    pub exact_matches: usize,
    pub density_score: f32,
    pub relevance_score: f32,
    pub total_words: usize,
}

#[derive(Clone)]
pub struct KeywordScorer {
    similarity: Arc<dyn Similarity>,
    threshold: f32,
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new(Arc::new(Levenshtein))
    }
}

impl std::fmt::Debug for KeywordScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordScorer")
            .field("similarity", &self.similarity.name())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl KeywordScorer {
    pub fn new(similarity: Arc<dyn Similarity>) -> Self {
        Self {
            similarity,
            threshold: FUZZY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Scores `processed` (already normalised) against `keywords` (normalised at
    /// catalog load).
    pub fn score(&self, processed: &str, keywords: &[String], language: Language) -> KeywordAnalysis {
        let tokens = tokenize(processed, language);
        let mut analysis = KeywordAnalysis {
            total_words: tokens.len(),
            ..Default::default()
        };
        if processed.is_empty() {
            return analysis;
        }

        for keyword in keywords {
            let mut matched = false;
            if processed.contains(keyword.as_str()) {
                analysis.total_matches += 2;
                analysis.exact_matches += 1;
                matched = true;
            }

            let sub_words: Vec<&str> = keyword
                .split_whitespace()
                .filter(|w| w.chars().count() > 2 && !is_stop_word(w, language))
                .collect();
            if !sub_words.is_empty() && sub_words.iter().all(|w| self.token_matches(w, &tokens)) {
                analysis.total_matches += sub_words.len();
                matched = true;
            }

            if matched {
                analysis.matched_keywords.push(keyword.clone());
            }
        }

        if analysis.total_words > 0 {
            analysis.density_score =
                analysis.total_matches as f32 / analysis.total_words as f32 * 100.0;
        }
        analysis.relevance_score =
            (analysis.exact_matches * 3 + analysis.total_matches) as f32;
        analysis
    }

    /// Containment either way, else similarity for words long enough to fuzz.
    pub fn token_matches(&self, word: &str, tokens: &[String]) -> bool {
        let word_len = word.chars().count();
        tokens.iter().any(|token| {
            let token_len = token.chars().count();
            if token.contains(word) {
                return true;
            }
            // short tokens would match inside too many longer words
            if token_len >= FUZZY_MIN_CHARS && word.contains(token.as_str()) {
                return true;
            }
            token_len >= FUZZY_MIN_CHARS
                && word_len >= FUZZY_MIN_CHARS
                && self.similarity.similarity(word, token) >= self.threshold
        })
    }
}
