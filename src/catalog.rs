//! Static service catalog: services, pricing, FAQs, contact details and the
//! localised phrase templates, per language.
//!
//! The catalog is plain JSON. A default copy is compiled into the crate and a
//! file on disk can replace it at startup. Regex patterns are compiled and
//! keywords normalised once, at load time.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs::read_to_string;
use std::path::Path;

use crate::error::{ChatError, Result};
use crate::language::Language;
use crate::preprocess::{preprocess_message, tokenize};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

pub const CATALOG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescription {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    #[serde(default)]
    pub key_benefits: Vec<String>,
    #[serde(default)]
    pub target_audience: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingPackage {
    pub name: String,
    pub price: u64,
    pub duration: String,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pricing {
    pub currency: String,
    pub packages: Vec<PricingPackage>,
}

impl Pricing {
    /// Cheapest package, used for "from ..." overviews.
    pub fn starting_package(&self) -> Option<&PricingPackage> {
        self.packages.iter().min_by_key(|p| p.price)
    }

    pub fn format_amount(&self, price: u64) -> String {
        format!("{} {}", self.currency, group_thousands(price))
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub location: String,
    pub hours: String,
}

/// Named reply templates. Placeholders are written `{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phrases {
    pub welcome: String,
    pub greeting_replies: Vec<String>,
    pub thanks_replies: Vec<String>,
    pub goodbye_replies: Vec<String>,
    pub services_overview_intro: String,
    pub services_overview_item: String,
    pub pricing_overview_intro: String,
    pub pricing_overview_item: String,
    pub methodology: String,
    pub more_info: String,
    pub history_note: String,
    pub depth_note: String,
    pub followup_service: String,
    pub benefits_heading: String,
    pub audience_note: String,
    pub followup_pricing: String,
    pub followup_contact: String,
    pub followup_general: String,
    pub contact_intro: String,
    pub contact_details: String,
    pub location_note: String,
    pub contact_service_note: String,
    pub pricing_intro: String,
    pub pricing_item: String,
    pub pricing_comparison_note: String,
    pub pricing_unavailable: String,
    pub service_intro: String,
    pub clarification_note: String,
    pub alternatives_note: String,
    pub insight_deep: String,
    pub insight_multiple: String,
    pub fallback: String,
    pub fallback_history: String,
    pub fallback_examples: String,
    pub example_questions: Vec<String>,
    pub suggest_services: String,
    pub suggest_pricing: String,
    pub suggest_more: String,
    pub suggest_contact: String,
    pub suggest_book: String,
    pub suggest_compare: String,
    pub suggest_general_pricing: String,
}

/// Replaces every `{key}` in `template` with its value.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut text = template.to_string();
    for (key, value) in values {
        text = text.replace(&format!("{{{}}}", key), value);
    }
    text
}

#[derive(Debug, Deserialize)]
struct ServiceRecord {
    name: String,
    keywords: Vec<String>,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    negative_patterns: Vec<String>,
    description: Option<ServiceDescription>,
    pricing: Option<Pricing>,
}

#[derive(Debug, Deserialize)]
struct LanguageRecord {
    services: Vec<ServiceRecord>,
    #[serde(default)]
    faqs: Vec<FaqItem>,
    contact: ContactInfo,
    phrases: Phrases,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: u32,
    languages: HashMap<Language, LanguageRecord>,
}

/// A catalog service with its patterns compiled and keywords normalised.
#[derive(Debug, Clone)]
pub struct ServiceEntry {
    pub name: String,
    pub keywords: Vec<String>,
    pub patterns: Vec<Regex>,
    pub negative_patterns: Vec<Regex>,
    pub description: Option<ServiceDescription>,
    pub pricing: Option<Pricing>,
    description_tokens: Vec<String>,
}

impl ServiceEntry {
    /// Localised display name, falling back to the canonical name.
    pub fn title(&self) -> &str {
        self.description
            .as_ref()
            .map(|d| d.title.as_str())
            .unwrap_or(&self.name)
    }

    /// Tokens of title, descriptions, benefits and audience text.
    pub fn description_tokens(&self) -> &[String] {
        &self.description_tokens
    }

    pub fn is_vetoed(&self, raw_lower: &str, processed: &str) -> bool {
        self.negative_patterns
            .iter()
            .any(|re| re.is_match(raw_lower) || re.is_match(processed))
    }

    pub fn pattern_matches(&self, raw_lower: &str, processed: &str) -> usize {
        self.patterns
            .iter()
            .filter(|re| re.is_match(raw_lower) || re.is_match(processed))
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct LanguageCatalog {
    pub language: Language,
    pub services: Vec<ServiceEntry>,
    pub faqs: Vec<FaqItem>,
    pub contact: ContactInfo,
    pub phrases: Phrases,
}

impl LanguageCatalog {
    pub fn service(&self, name: &str) -> Option<&ServiceEntry> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn has_descriptions(&self) -> bool {
        self.services.iter().any(|s| s.description.is_some())
    }

    /// Display title for a canonical service name.
    pub fn title_of(&self, name: &str) -> String {
        self.service(name)
            .map(|s| s.title().to_string())
            .unwrap_or_else(|| name.to_string())
    }

    /// Titles joined for inline lists ("A, B and C" style is left to the template).
    pub fn titles_of(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|n| self.title_of(n))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub version: u32,
    en: LanguageCatalog,
    sw: LanguageCatalog,
}

impl Catalog {
    /// The catalog compiled into the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path)
            .map_err(|e| ChatError::Catalog(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut file: CatalogFile = serde_json::from_str(json)?;
        if file.version != CATALOG_VERSION {
            return Err(ChatError::Catalog(format!(
                "unsupported catalog version {}",
                file.version
            )));
        }

        let mut take = |language: Language| -> Result<LanguageCatalog> {
            let record = file.languages.remove(&language).ok_or_else(|| {
                ChatError::Catalog(format!("missing language section '{}'", language))
            })?;
            build_language(language, record)
        };
        let en = take(Language::En)?;
        let sw = take(Language::Sw)?;

        let en_names: Vec<&str> = en.services.iter().map(|s| s.name.as_str()).collect();
        let sw_names: Vec<&str> = sw.services.iter().map(|s| s.name.as_str()).collect();
        if en_names != sw_names {
            return Err(ChatError::Catalog(
                "service names differ between languages".to_string(),
            ));
        }

        Ok(Catalog {
            version: file.version,
            en,
            sw,
        })
    }

    pub fn language(&self, language: Language) -> &LanguageCatalog {
        match language {
            Language::En => &self.en,
            Language::Sw => &self.sw,
        }
    }

    pub fn service(&self, language: Language, name: &str) -> Option<&ServiceEntry> {
        self.language(language).service(name)
    }

    /// Canonical service names in catalog order.
    pub fn service_names(&self) -> Vec<&str> {
        self.en.services.iter().map(|s| s.name.as_str()).collect()
    }
}

fn build_language(language: Language, record: LanguageRecord) -> Result<LanguageCatalog> {
    if record.services.is_empty() {
        return Err(ChatError::Catalog(format!("no services for '{}'", language)));
    }

    let mut seen = HashSet::new();
    let mut services = Vec::with_capacity(record.services.len());
    for service in record.services {
        if !seen.insert(service.name.clone()) {
            return Err(ChatError::Catalog(format!(
                "duplicate service '{}' for '{}'",
                service.name, language
            )));
        }
        services.push(build_service(language, service)?);
    }

    Ok(LanguageCatalog {
        language,
        services,
        faqs: record.faqs,
        contact: record.contact,
        phrases: record.phrases,
    })
}

fn build_service(language: Language, record: ServiceRecord) -> Result<ServiceEntry> {
    let keywords: Vec<String> = record
        .keywords
        .iter()
        .map(|k| preprocess_message(k, language))
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Err(ChatError::Catalog(format!(
            "service '{}' has no keywords",
            record.name
        )));
    }

    let description_tokens = record
        .description
        .as_ref()
        .map(|d| {
            let text = format!(
                "{} {} {} {} {}",
                d.title,
                d.short_description,
                d.full_description,
                d.key_benefits.join(" "),
                d.target_audience
            );
            tokenize(&preprocess_message(&text, language), language)
        })
        .unwrap_or_default();

    Ok(ServiceEntry {
        patterns: compile_patterns(&record.patterns)?,
        negative_patterns: compile_patterns(&record.negative_patterns)?,
        name: record.name,
        keywords,
        description: record.description,
        pricing: record.pricing,
        description_tokens,
    })
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| ChatError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
        })
        .collect()
}
