//! Message normalisation shared by the scorer, detector and FAQ matcher.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::language::Language;

/// A large, but not exhaustive, list of common English stop words.
/// Apostrophes are already stripped by the time tokens are compared.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and",
    "any", "are", "arent", "as", "at", "be", "because", "been", "before", "being",
    "below", "between", "both", "but", "by", "can", "cant", "cannot", "could",
    "couldnt", "did", "didnt", "do", "does", "doesnt", "doing", "dont", "down",
    "during", "each", "few", "for", "from", "further", "had", "hadnt", "has",
    "hasnt", "have", "havent", "having", "he", "hed", "hell", "hes", "her",
    "here", "heres", "hers", "herself", "him", "himself", "his", "how", "hows",
    "i", "id", "ill", "im", "ive", "if", "in", "into", "is", "isnt", "it",
    "its", "itself", "lets", "me", "more", "most", "much", "my", "myself", "no",
    "nor", "not", "of", "off", "on", "once", "only", "or", "other", "ought",
    "our", "ours", "ourselves", "out", "over", "own", "please", "same", "she",
    "shed", "shell", "shes", "should", "shouldnt", "so", "some", "such", "than",
    "that", "thats", "the", "their", "theirs", "them", "themselves", "then",
    "there", "theres", "these", "they", "theyd", "theyll", "theyre", "theyve",
    "this", "those", "through", "to", "too", "under", "until", "up", "very",
    "was", "wasnt", "we", "wed", "well", "were", "weve", "werent", "what",
    "whats", "when", "whens", "where", "wheres", "which", "while", "who", "whos",
    "whom", "why", "whys", "will", "with", "wont", "would", "wouldnt", "you",
    "youd", "youll", "youre", "youve", "your", "yours", "yourself", "yourselves",
];

/// Swahili function words and common question particles.
const SWAHILI_STOP_WORDS: &[&str] = &[
    "na", "ya", "wa", "za", "la", "cha", "vya", "kwa", "ni", "si", "katika", "kwamba",
    "hii", "hiyo", "huo", "hizi", "ile", "yako", "yangu", "wako", "wangu", "yenu", "zenu",
    "kama", "lakini", "au", "pia", "sana", "tu", "je", "nini", "gani", "hapa", "pale",
    "huu", "ule", "mimi", "wewe", "sisi", "nyinyi", "yeye", "wao", "kuna", "ndani",
    "kuhusu", "tafadhali", "naomba", "nataka", "ili", "hata", "bado", "sasa",
];

static ENGLISH_STOP_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());
static SWAHILI_STOP_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| SWAHILI_STOP_WORDS.iter().copied().collect());

pub fn stop_words(language: Language) -> &'static HashSet<&'static str> {
    match language {
        Language::En => &ENGLISH_STOP_SET,
        Language::Sw => &SWAHILI_STOP_SET,
    }
}

pub fn is_stop_word(word: &str, language: Language) -> bool {
    stop_words(language).contains(word)
}

/// Lowercases the message, turns punctuation and hyphens into spaces and
/// collapses whitespace.
///
/// Apostrophes are handled per language: Swahili keeps the `ng'` letter
/// (`ng'ambo`), everything else drops apostrophes inside words (`what's` -> `whats`).
pub fn preprocess_message(message: &str, language: Language) -> String {
    let lower = message.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();
    let mut cleaned = String::with_capacity(lower.len());

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() {
            cleaned.push(c);
        } else if c == '\'' || c == '\u{2019}' {
            let after_ng = i >= 2 && chars[i - 2] == 'n' && chars[i - 1] == 'g';
            let before_letter = chars.get(i + 1).is_some_and(|n| n.is_alphabetic());
            if language == Language::Sw && after_ng && before_letter {
                cleaned.push('\'');
            }
            // otherwise the apostrophe simply joins the two halves
        } else {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Words longer than two characters that are not stop words of `language`.
pub fn tokenize(processed: &str, language: Language) -> Vec<String> {
    processed
        .split_whitespace()
        .filter(|word| word.chars().count() > 2 && !is_stop_word(word, language))
        .map(str::to_string)
        .collect()
}

/// Multi-word terms match by substring, single words only as whole words.
pub fn contains_term(processed: &str, term: &str) -> bool {
    if term.contains(' ') {
        processed.contains(term)
    } else {
        processed.split_whitespace().any(|word| word == term)
    }
}

pub fn contains_any(processed: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| contains_term(processed, term))
}

/// Shortens `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_strips_punctuation_and_hyphens() {
        let processed = preprocess_message("  One-on-One   COACHING?! ", Language::En);
        assert_eq!(processed, "one on one coaching");
    }

    #[test]
    fn test_preprocess_empty() {
        assert_eq!(preprocess_message("", Language::En), "");
        assert_eq!(preprocess_message("?!...", Language::Sw), "");
    }

    #[test]
    fn test_apostrophes_per_language() {
        assert_eq!(preprocess_message("What's the price", Language::En), "whats the price");
        assert_eq!(preprocess_message("Ng'ambo ya mto", Language::Sw), "ng'ambo ya mto");
        assert_eq!(preprocess_message("Ng'ambo", Language::En), "ngambo");
    }

    #[test]
    fn test_tokenize_drops_short_and_stop_words() {
        let tokens = tokenize("what is the price for executive coaching", Language::En);
        assert_eq!(tokens, vec!["price", "executive", "coaching"]);

        let tokens = tokenize("bei ya mafunzo ya uongozi ni ngapi", Language::Sw);
        assert_eq!(tokens, vec!["bei", "mafunzo", "uongozi", "ngapi"]);
    }

    #[test]
    fn test_contains_term() {
        assert!(contains_term("how much is it", "how much"));
        assert!(contains_term("price please", "price"));
        assert!(!contains_term("enterprise plan", "price"));
        assert!(contains_any("niambie zaidi", &["zaidi", "endelea"]));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
    }
}
