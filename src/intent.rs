//! Rule-based intent analysis: indicator lexicons, casual-interaction
//! detection and common-question typing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::language::Language;
use crate::preprocess::{contains_any, contains_term, is_stop_word, preprocess_message};

const CONFIRMATION_MAX_WORDS: usize = 4;
const ELABORATION_MAX_WORDS: usize = 8;

/// Question-type confidence needed to outrank keyword intents.
const QUESTION_TYPE_THRESHOLD: f32 = 0.7;

struct Lexicon {
    contact: &'static [&'static str],
    location: &'static [&'static str],
    pricing: &'static [&'static str],
    info: &'static [&'static str],
    service: &'static [&'static str],
    booking: &'static [&'static str],
    urgency: &'static [&'static str],
    confirmation: &'static [&'static str],
    elaboration: &'static [&'static str],
    greetings: &'static [&'static str],
    thanks: &'static [&'static str],
    goodbyes: &'static [&'static str],
    filler: &'static [&'static str],
    interrogatives: &'static [&'static str],
}

static ENGLISH: Lexicon = Lexicon {
    contact: &[
        "contact", "email", "phone", "call", "reach", "get in touch", "talk to someone",
        "speak to someone", "whatsapp", "number",
    ],
    location: &["where", "location", "located", "based", "office", "address", "city", "country"],
    pricing: &[
        "price", "prices", "pricing", "cost", "costs", "fee", "fees", "rate", "rates", "charge",
        "budget", "how much", "package", "packages", "quote", "expensive", "affordable",
    ],
    info: &["what", "how", "why", "tell", "explain", "info", "information", "details", "describe", "learn"],
    service: &[
        "service", "services", "offer", "provide", "keynote", "coaching", "training", "workshop",
        "workshops", "consulting", "webinar", "speaker", "program",
    ],
    booking: &[
        "book", "booking", "schedule", "reserve", "hire", "available", "availability", "date",
        "appointment", "sign up",
    ],
    urgency: &["urgent", "asap", "soon", "immediately", "quickly", "today", "tomorrow", "this week"],
    confirmation: &[
        "yes", "yeah", "yep", "sure", "ok", "okay", "of course", "sounds good",
        "go ahead", "definitely", "absolutely",
    ],
    elaboration: &[
        "more", "tell me more", "details", "elaborate", "explain", "go on", "continue", "what else",
        "expand",
    ],
    greetings: &[
        "hi", "hello", "hey", "good morning", "good afternoon", "good evening", "greetings", "howdy",
    ],
    thanks: &["thanks", "thank you", "thank", "cheers", "appreciate", "appreciated"],
    goodbyes: &["bye", "goodbye", "see you", "farewell", "good night", "take care"],
    filler: &[
        "there", "much", "lot", "again", "guys", "team", "morning", "afternoon", "evening", "good",
        "great", "nice", "cool", "day", "everyone", "soon", "later", "help",
    ],
    interrogatives: &[
        "what", "how", "which", "who", "where", "when", "why", "do", "does", "can", "could", "is",
        "are", "would",
    ],
};

static SWAHILI: Lexicon = Lexicon {
    contact: &[
        "wasiliana", "kuwasiliana", "mawasiliano", "barua pepe", "simu", "piga simu", "namba",
        "nambari", "email", "whatsapp",
    ],
    location: &["wapi", "mahali", "ofisi", "anwani", "mji", "nchi"],
    pricing: &[
        "bei", "gharama", "ngapi", "kiasi gani", "malipo", "ada", "shilingi", "pesa", "kifurushi",
        "vifurushi",
    ],
    info: &["nini", "vipi", "eleza", "maelezo", "taarifa", "jinsi"],
    service: &[
        "huduma", "mnatoa", "mnafanya", "hotuba", "ukocha", "mafunzo", "warsha", "ushauri",
        "programu",
    ],
    booking: &[
        "weka nafasi", "kuweka nafasi", "nafasi", "ratiba", "panga", "kuajiri", "tarehe", "miadi",
        "mnapatikana",
    ],
    urgency: &["haraka", "sasa hivi", "leo", "kesho", "wiki hii", "mapema"],
    confirmation: &["ndiyo", "ndio", "sawa", "naam", "bila shaka", "hakika", "endelea"],
    elaboration: &["zaidi", "niambie zaidi", "eleza", "maelezo zaidi", "endelea", "nini kingine"],
    greetings: &["habari", "hujambo", "jambo", "mambo", "salaam", "shikamoo", "hodi"],
    thanks: &["asante", "asanteni", "shukrani", "nashukuru"],
    goodbyes: &["kwaheri", "kwaherini", "tutaonana", "usiku mwema"],
    filler: &[
        "nzuri", "njema", "asubuhi", "mchana", "jioni", "rafiki", "wote", "tena", "leo", "baadaye",
    ],
    interrogatives: &["je", "nini", "vipi", "wapi", "lini", "nani", "mnatoa", "mnafanya"],
};

fn lexicon(language: Language) -> &'static Lexicon {
    match language {
        Language::En => &ENGLISH,
        Language::Sw => &SWAHILI,
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    // the pattern tables are fixed; a bad entry is a programming error
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("intent pattern must compile"))
        .collect()
}

static LOCATION_CONTACT_EN: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\bwhere\s+(are\s+you|is\s+your|can\s+i\s+find)\b",
        r"\b(your|the)\s+(office|address|location)\b",
        r"\bhow\s+(can|do)\s+i\s+(reach|contact|find)\b",
    ])
});
static LOCATION_CONTACT_SW: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\bmko\s+wapi\b",
        r"\bofisi\s+(yenu|zenu|yako)\b",
        r"\bnawezaje\s+kuwasiliana\b",
        r"\bnitawapata\s+wapi\b",
    ])
});
static SERVICE_INQUIRY_EN: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\bwhat\s+(services|do\s+you\s+(offer|do|provide))\b",
        r"\bdo\s+you\s+(offer|provide|do|run|have)\b",
        r"\b(tell|show)\s+me\s+about\s+your\b",
    ])
});
static SERVICE_INQUIRY_SW: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\bmnatoa\s+huduma\b",
        r"\bhuduma\s+(gani|zenu|zako)\b",
        r"\bmnafanya\b",
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Services,
    Pricing,
    Methodology,
    MoreInfo,
}

impl QuestionType {
    const ALL: [QuestionType; 4] = [
        QuestionType::Services,
        QuestionType::Pricing,
        QuestionType::Methodology,
        QuestionType::MoreInfo,
    ];

    fn intent(self) -> PrimaryIntent {
        match self {
            QuestionType::Services => PrimaryIntent::Services,
            QuestionType::Pricing => PrimaryIntent::Pricing,
            QuestionType::Methodology | QuestionType::MoreInfo => PrimaryIntent::Information,
        }
    }
}

static QUESTION_PATTERNS: Lazy<Vec<(Language, QuestionType, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            Language::En,
            QuestionType::Services,
            compile(&[
                r"\bwhat\s+(services|do\s+you\s+offer|do\s+you\s+do)\b",
                r"\b(list|all)\s+(of\s+)?(your\s+)?services\b",
                r"\bwhat\s+can\s+you\s+(help|do)\b",
                r"\bservices\s+(do\s+you|you)\s+(offer|provide)\b",
            ]),
        ),
        (
            Language::En,
            QuestionType::Pricing,
            compile(&[
                r"\bhow\s+much\b",
                r"\b(prices?|pricing|costs?|rates?|fees?)\b",
                r"\bwhat\s+(are|is)\s+(your|the)\s+(prices?|pricing|rates?|fees?|costs?)\b",
            ]),
        ),
        (
            Language::En,
            QuestionType::Methodology,
            compile(&[
                r"\bhow\s+do\s+you\s+work\b",
                r"\b(approach|methodology|method|process)\b",
                r"\bwhat\s+makes\s+you\s+different\b",
            ]),
        ),
        (
            Language::En,
            QuestionType::MoreInfo,
            compile(&[
                r"\bmore\s+(info|information|details)\b",
                r"\btell\s+me\s+(more|about\s+you)\b",
                r"\bwho\s+are\s+you\b",
                r"\babout\s+(you|your\s+(company|business))\b",
            ]),
        ),
        (
            Language::Sw,
            QuestionType::Services,
            compile(&[
                r"\bmnatoa\s+huduma\s+gani\b",
                r"\bhuduma\s+(gani|zenu|zako)\b",
                r"\bmnafanya\s+nini\b",
            ]),
        ),
        (
            Language::Sw,
            QuestionType::Pricing,
            compile(&[r"\bbei\b", r"\bgharama\b", r"\b(ngapi|kiasi\s+gani)\b"]),
        ),
        (
            Language::Sw,
            QuestionType::Methodology,
            compile(&[
                r"\bmnafanyaje\s+kazi\b",
                r"\bmbinu\b",
                r"\bmchakato\b",
                r"\bnjia\s+yenu\b",
            ]),
        ),
        (
            Language::Sw,
            QuestionType::MoreInfo,
            compile(&[
                r"\bmaelezo\s+zaidi\b",
                r"\bniambie\s+zaidi\b",
                r"\bniambie\s+kuhusu\s+(wewe|ninyi|nyinyi|kampuni)\b",
                r"\bninyi\s+ni\s+nani\b",
            ]),
        ),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuestionMatch {
    pub question_type: QuestionType,
    pub confidence: f32,
    pub matched_patterns: usize,
}

/// Detects one of the common questions the bot answers from templates.
pub fn detect_question_type(message: &str, language: Language) -> Option<QuestionMatch> {
    let processed = preprocess_message(message, language);
    if processed.is_empty() {
        return None;
    }
    let question_form = is_question_form(message, &processed, language);

    let mut best: Option<QuestionMatch> = None;
    for question_type in QuestionType::ALL {
        let matched = QUESTION_PATTERNS
            .iter()
            .filter(|(lang, qt, _)| *lang == language && *qt == question_type)
            .flat_map(|(_, _, patterns)| patterns.iter())
            .filter(|re| re.is_match(&processed))
            .count();
        if matched == 0 {
            continue;
        }
        let mut confidence = 0.65 + 0.15 * (matched - 1) as f32;
        if question_form {
            confidence += 0.1;
        }
        let candidate = QuestionMatch {
            question_type,
            confidence: confidence.min(1.0),
            matched_patterns: matched,
        };
        if best.map_or(true, |b| candidate.confidence > b.confidence) {
            best = Some(candidate);
        }
    }
    best
}

fn is_question_form(raw: &str, processed: &str, language: Language) -> bool {
    raw.contains('?')
        || processed
            .split_whitespace()
            .next()
            .is_some_and(|first| lexicon(language).interrogatives.contains(&first))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasualKind {
    Greeting,
    Thanks,
    Goodbye,
}

/// A message is casual when it holds a greeting, thanks or goodbye and
/// nothing else of substance.
pub fn detect_casual(message: &str, language: Language) -> Option<CasualKind> {
    let processed = preprocess_message(message, language);
    if processed.is_empty() {
        return None;
    }
    let lex = lexicon(language);

    let kind = [
        (CasualKind::Thanks, lex.thanks),
        (CasualKind::Goodbye, lex.goodbyes),
        (CasualKind::Greeting, lex.greetings),
    ]
    .into_iter()
    .find(|(_, terms)| contains_any(&processed, terms))
    .map(|(kind, _)| kind)?;

    let mut rest = format!(" {} ", processed);
    for term in lex.thanks.iter().chain(lex.goodbyes).chain(lex.greetings) {
        let padded = format!(" {} ", term);
        while rest.contains(&padded) {
            rest = rest.replace(&padded, " ");
        }
    }
    let substantive = rest.split_whitespace().any(|word| {
        !is_stop_word(word, language) && !lex.filler.contains(&word)
    });
    if substantive {
        None
    } else {
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryIntent {
    Contact,
    Pricing,
    Services,
    Booking,
    Information,
    Casual,
    General,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentIndicators {
    pub contact: bool,
    pub location: bool,
    pub pricing: bool,
    pub info: bool,
    pub service: bool,
    pub booking: bool,
    pub urgency: bool,
    pub location_contact_pattern: bool,
    pub service_inquiry_pattern: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub primary_intent: PrimaryIntent,
    pub confidence: f32,
    pub indicators: IntentIndicators,
    pub is_confirmation: bool,
    pub is_elaboration_request: bool,
    pub casual: Option<CasualKind>,
    pub question_type: Option<QuestionMatch>,
}

impl IntentAnalysis {
    pub fn wants_contact(&self) -> bool {
        self.indicators.contact || self.indicators.location_contact_pattern
    }

    pub fn asked_location(&self) -> bool {
        self.indicators.location || self.indicators.location_contact_pattern
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentAnalyzer;

impl IntentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, message: &str, language: Language) -> IntentAnalysis {
        let processed = preprocess_message(message, language);
        let lex = lexicon(language);
        let word_count = processed.split_whitespace().count();

        let (location_patterns, inquiry_patterns) = match language {
            Language::En => (&*LOCATION_CONTACT_EN, &*SERVICE_INQUIRY_EN),
            Language::Sw => (&*LOCATION_CONTACT_SW, &*SERVICE_INQUIRY_SW),
        };
        let indicators = IntentIndicators {
            contact: contains_any(&processed, lex.contact),
            location: contains_any(&processed, lex.location),
            pricing: contains_any(&processed, lex.pricing),
            info: contains_any(&processed, lex.info),
            service: contains_any(&processed, lex.service),
            booking: contains_any(&processed, lex.booking),
            urgency: contains_any(&processed, lex.urgency),
            location_contact_pattern: location_patterns.iter().any(|re| re.is_match(&processed)),
            service_inquiry_pattern: inquiry_patterns.iter().any(|re| re.is_match(&processed)),
        };

        let is_confirmation = word_count > 0
            && word_count <= CONFIRMATION_MAX_WORDS
            && lex.confirmation.iter().any(|t| contains_term(&processed, t));
        let is_elaboration_request = word_count > 0
            && word_count <= ELABORATION_MAX_WORDS
            && lex.elaboration.iter().any(|t| contains_term(&processed, t));

        let casual = detect_casual(message, language);
        let question_type = detect_question_type(message, language);
        let question_form = !processed.is_empty() && is_question_form(message, &processed, language);

        let keyword_intent = if indicators.contact || indicators.location_contact_pattern {
            Some((PrimaryIntent::Contact, 0.85))
        } else if indicators.pricing {
            Some((PrimaryIntent::Pricing, 0.8))
        } else if indicators.service || indicators.service_inquiry_pattern {
            Some((PrimaryIntent::Services, 0.8))
        } else if indicators.booking {
            Some((PrimaryIntent::Booking, 0.85))
        } else if indicators.info || question_form {
            Some((PrimaryIntent::Information, 0.7))
        } else {
            None
        };

        let (primary_intent, mut confidence): (PrimaryIntent, f32) = if let Some(kind) = casual {
            log::debug!("casual message: {:?}", kind);
            (PrimaryIntent::Casual, 0.9)
        } else if let Some(qt) = question_type.filter(|q| q.confidence > QUESTION_TYPE_THRESHOLD) {
            (qt.question_type.intent(), 0.95)
        } else {
            keyword_intent.unwrap_or((PrimaryIntent::General, 0.5))
        };
        if primary_intent != PrimaryIntent::Casual {
            if indicators.urgency {
                confidence += 0.1;
            }
            let keyword = keyword_intent.map(|(intent, _)| intent);
            let questioned = question_type.map(|q| q.question_type.intent());
            if keyword == Some(primary_intent) && questioned == Some(primary_intent) {
                confidence += 0.15;
            }
        }

        IntentAnalysis {
            primary_intent,
            confidence: confidence.clamp(0.0, 1.0),
            indicators,
            is_confirmation,
            is_elaboration_request,
            casual,
            question_type,
        }
    }
}
