//! Supported chat languages and the language detection signal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChatError;

/// The two languages the widget is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Sw,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Sw];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Sw => "sw",
        }
    }

    /// Accepts plain codes, region-tagged codes (`en-US`) and the language names.
    pub fn parse(value: &str) -> Option<Self> {
        let lower = value.trim().to_lowercase();
        let primary = lower.split(['-', '_']).next().unwrap_or_default();
        match primary {
            "en" | "eng" | "english" => Some(Language::En),
            "sw" | "swa" | "swahili" | "kiswahili" => Some(Language::Sw),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s).ok_or_else(|| ChatError::UnsupportedLanguage(s.to_string()))
    }
}

const SWAHILI_MARKERS: &[&str] = &[
    "na", "ya", "wa", "kwa", "ni", "za", "nini", "gani", "bei", "habari", "asante", "ndiyo",
    "hapana", "je", "tafadhali", "huduma", "mafunzo", "ngapi", "kuhusu", "nataka", "naomba",
    "karibu", "sana", "hii", "yako", "zenu", "mnatoa", "wapi", "lini", "gharama", "jambo",
    "uongozi", "niambie", "zaidi", "mko", "kwaheri",
];

const ENGLISH_MARKERS: &[&str] = &[
    "the", "is", "are", "what", "how", "you", "your", "do", "does", "for", "and", "price",
    "can", "i", "want", "tell", "about", "please", "thanks", "hello", "much", "me", "with",
    "services", "offer", "cost", "more", "would", "like",
];

/// Which language a message appears to be written in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LanguageSignal {
    pub language: Language,
    pub confidence: f32,
}

/// Counts marker words for each language. Returns `None` when there is too
/// little evidence or the counts tie.
pub fn detect_language(text: &str) -> Option<LanguageSignal> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect();

    let sw = words.iter().filter(|w| SWAHILI_MARKERS.contains(w)).count();
    let en = words.iter().filter(|w| ENGLISH_MARKERS.contains(w)).count();
    let total = sw + en;
    if total < 2 || sw == en {
        return None;
    }

    let (language, hits) = if sw > en {
        (Language::Sw, sw)
    } else {
        (Language::En, en)
    };
    Some(LanguageSignal {
        language,
        confidence: hits as f32 / total as f32,
    })
}
