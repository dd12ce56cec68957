//! String similarity strategies used for near-miss keyword matching.

use ndarray::Array1;
use std::collections::{HashMap, HashSet};

/// Similarity score in `[0, 1]` between two words.
pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f32;

    fn name(&self) -> &'static str;
}

/// Normalised Levenshtein similarity: `1 - distance / max_len`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Levenshtein;

impl Similarity for Levenshtein {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        let max_len = a.chars().count().max(b.chars().count());
        if max_len == 0 {
            return 1.0;
        }
        1.0 - levenshtein_distance(a, b) as f32 / max_len as f32
    }

    fn name(&self) -> &'static str {
        "levenshtein"
    }
}

/// Jaccard similarity over character bigrams.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigramJaccard;

impl Similarity for BigramJaccard {
    fn similarity(&self, a: &str, b: &str) -> f32 {
        let bigrams = |s: &str| -> HashSet<(char, char)> {
            let chars: Vec<char> = s.chars().collect();
            chars.windows(2).map(|w| (w[0], w[1])).collect()
        };
        let set1 = bigrams(a);
        let set2 = bigrams(b);
        let union = set1.union(&set2).count();
        if union == 0 {
            return if a == b { 1.0 } else { 0.0 };
        }
        set1.intersection(&set2).count() as f32 / union as f32
    }

    fn name(&self) -> &'static str {
        "bigram_jaccard"
    }
}

/// Levenshtein edit distance, two-row variant.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();
    let len1 = s1_chars.len();
    let len2 = s2_chars.len();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut prev_row: Vec<usize> = (0..=len2).collect();
    let mut curr_row: Vec<usize> = vec![0; len2 + 1];

    for i in 1..=len1 {
        curr_row[0] = i;
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };
            curr_row[j] = (prev_row[j] + 1)
                .min(curr_row[j - 1] + 1)
                .min(prev_row[j - 1] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[len2]
}

/// Jaccard similarity between the word sets of two texts.
pub fn jaccard_similarity(text1: &str, text2: &str) -> f32 {
    let set1: HashSet<&str> = text1.split_whitespace().collect();
    let set2: HashSet<&str> = text2.split_whitespace().collect();
    let intersection = set1.intersection(&set2).count();
    let union = set1.union(&set2).count();
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

pub fn cosine_similarity(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    let dot_product = a.dot(b);
    let norm_a = a.dot(a).sqrt();
    let norm_b = b.dot(b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Term-frequency vectors for two token lists over their shared vocabulary.
pub fn term_vectors(left: &[String], right: &[String]) -> (Array1<f32>, Array1<f32>) {
    let mut vocab: HashMap<&str, usize> = HashMap::new();
    for token in left.iter().chain(right.iter()) {
        let next = vocab.len();
        vocab.entry(token.as_str()).or_insert(next);
    }

    let mut a = Array1::<f32>::zeros(vocab.len());
    let mut b = Array1::<f32>::zeros(vocab.len());
    for token in left {
        a[vocab[token.as_str()]] += 1.0;
    }
    for token in right {
        b[vocab[token.as_str()]] += 1.0;
    }
    (a, b)
}

/// Cosine similarity between two token bags.
pub fn token_cosine(left: &[String], right: &[String]) -> f32 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let (a, b) = term_vectors(left, right);
    cosine_similarity(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("coaching", "coaching"), 0);
    }

    #[test]
    fn test_levenshtein_similarity_catches_typos() {
        let sim = Levenshtein.similarity("coachng", "coaching");
        assert!(sim >= 0.75, "got {sim}");
        assert!(Levenshtein.similarity("price", "keynote") < 0.5);
    }

    #[test]
    fn test_bigram_jaccard() {
        assert_eq!(BigramJaccard.similarity("keynote", "keynote"), 1.0);
        assert!(BigramJaccard.similarity("workshop", "workshops") > 0.8);
        assert_eq!(BigramJaccard.similarity("ab", "cd"), 0.0);
    }

    #[test]
    fn test_jaccard_similarity() {
        assert_eq!(jaccard_similarity("a b", "a b"), 1.0);
        assert_eq!(jaccard_similarity("", ""), 0.0);
        assert!((jaccard_similarity("a b c", "a b d") - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_token_cosine() {
        let left = vec!["leadership".to_string(), "training".to_string()];
        let right = vec!["training".to_string(), "leadership".to_string()];
        assert!((token_cosine(&left, &right) - 1.0).abs() < 1e-6);
        assert_eq!(token_cosine(&left, &[]), 0.0);
    }
}
