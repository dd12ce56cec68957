//! Reply selection. Steps run in a fixed priority order and the first one
//! that applies produces the reply.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::catalog::{render, Catalog, FaqItem, LanguageCatalog, ServiceEntry};
use crate::context::{ConversationInsight, ServiceContext, CONTEXT_UPDATE_THRESHOLD};
use crate::detector::{DetectionResult, ServiceDetector};
use crate::error::{ChatError, Result};
use crate::intent::{CasualKind, IntentAnalysis, PrimaryIntent, QuestionType};
use crate::language::Language;
use crate::preprocess::{preprocess_message, tokenize};
use crate::similarity::jaccard_similarity;

const COMMON_QUESTION_THRESHOLD: f32 = 0.6;
const EXPLICIT_SERVICE_THRESHOLD: f32 = 0.6;
const SERVICE_THRESHOLD: f32 = 0.5;
const CLARIFY_BELOW: f32 = 0.7;
const FAQ_THRESHOLD: f32 = 0.5;
const DEEP_DEPTH: u32 = 3;

const LAST_RESORT: &str = "Sorry, something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Welcome,
    Casual,
    CommonQuestion,
    ContextualFollowup,
    Contact,
    Pricing,
    Service,
    Faq,
    Insight,
    Fallback,
    Legacy,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Welcome => "welcome",
            ResponseType::Casual => "casual",
            ResponseType::CommonQuestion => "common_question",
            ResponseType::ContextualFollowup => "contextual_followup",
            ResponseType::Contact => "contact",
            ResponseType::Pricing => "pricing",
            ResponseType::Service => "service",
            ResponseType::Faq => "faq",
            ResponseType::Insight => "insight",
            ResponseType::Fallback => "fallback",
            ResponseType::Legacy => "legacy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotResponse {
    pub text: String,
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub metadata: Value,
}

impl BotResponse {
    fn new(text: String, response_type: ResponseType) -> Self {
        Self {
            text,
            response_type,
            service: None,
            confidence: None,
            metadata: json!({}),
        }
    }

    fn with_service(mut self, service: Option<&str>) -> Self {
        self.service = service.map(str::to_string);
        self
    }

    fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    fn with_meta(mut self, key: &str, value: Value) -> Self {
        if let Value::Object(map) = &mut self.metadata {
            map.insert(key.to_string(), value);
        }
        self
    }
}

/// A reply must carry text and, if present, a confidence in `[0, 1]`.
pub fn validate_response(response: &BotResponse) -> Result<()> {
    if response.text.trim().is_empty() {
        return Err(ChatError::InvalidResponse(format!(
            "empty {} response",
            response.response_type.as_str()
        )));
    }
    if let Some(confidence) = response.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ChatError::InvalidResponse(format!(
                "confidence {} out of range",
                confidence
            )));
        }
    }
    Ok(())
}

/// Everything one turn knows when choosing a reply.
#[derive(Debug, Clone, Copy)]
pub struct ResponseRequest<'a> {
    pub message: &'a str,
    pub language: Language,
    pub detection: &'a DetectionResult,
    pub intent: &'a IntentAnalysis,
    pub context: &'a ServiceContext,
}

/// Best FAQ for a message: substring containment either way, else token
/// Jaccard of at least 0.5.
pub fn find_faq<'a>(message: &str, catalog: &'a LanguageCatalog) -> Option<&'a FaqItem> {
    let language = catalog.language;
    let processed = preprocess_message(message, language);
    let tokens = tokenize(&processed, language);
    if tokens.is_empty() {
        return None;
    }
    let joined = tokens.join(" ");

    catalog
        .faqs
        .iter()
        .filter_map(|faq| {
            let question = preprocess_message(&faq.question, language);
            let substring = processed.contains(&question)
                || (tokens.len() >= 2 && question.contains(&processed));
            let score = if substring {
                1.0
            } else {
                jaccard_similarity(&joined, &tokenize(&question, language).join(" "))
            };
            (score >= FAQ_THRESHOLD).then_some((faq, score))
        })
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(faq, _)| faq)
}

pub struct ResponseGenerator {
    catalog: Arc<Catalog>,
    detector: ServiceDetector,
}

impl ResponseGenerator {
    pub fn new(catalog: Arc<Catalog>, detector: ServiceDetector) -> Self {
        Self { catalog, detector }
    }

    /// Picks the reply for one turn and validates it.
    pub fn generate(&self, request: &ResponseRequest) -> Result<BotResponse> {
        let response = self.select(request);
        validate_response(&response)?;
        Ok(response)
    }

    fn select(&self, req: &ResponseRequest) -> BotResponse {
        let lang = self.catalog.language(req.language);
        let meta_intent = json!(req.intent.primary_intent);

        if let Some(kind) = req.intent.casual {
            return self.casual(lang, kind).with_meta("intent", meta_intent);
        }
        if let Some(response) = self.common_question(lang, req) {
            return response.with_meta("intent", meta_intent);
        }
        if let Some(response) = self.contextual_followup(lang, req) {
            return response.with_meta("intent", meta_intent);
        }
        if req.intent.primary_intent == PrimaryIntent::Contact {
            return self.contact(lang, req.intent, req.context).with_meta("intent", meta_intent);
        }
        if req.intent.primary_intent == PrimaryIntent::Pricing {
            return self.pricing(lang, req).with_meta("intent", meta_intent);
        }
        if let Some(response) = self.service(lang, req) {
            return response.with_meta("intent", meta_intent);
        }
        if let Some(faq) = find_faq(req.message, lang) {
            return BotResponse::new(faq.answer.clone(), ResponseType::Faq)
                .with_meta("faq_question", json!(faq.question))
                .with_meta("intent", meta_intent);
        }
        if let Some(response) = self.insight(lang, req.context) {
            return response.with_meta("intent", meta_intent);
        }
        self.fallback(lang, req.context).with_meta("intent", meta_intent)
    }

    fn casual(&self, lang: &LanguageCatalog, kind: CasualKind) -> BotResponse {
        let replies = match kind {
            CasualKind::Greeting => &lang.phrases.greeting_replies,
            CasualKind::Thanks => &lang.phrases.thanks_replies,
            CasualKind::Goodbye => &lang.phrases.goodbye_replies,
        };
        let text = replies
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default();
        BotResponse::new(text, ResponseType::Casual).with_meta("casual", json!(kind))
    }

    fn common_question(&self, lang: &LanguageCatalog, req: &ResponseRequest) -> Option<BotResponse> {
        let question = req
            .intent
            .question_type
            .filter(|q| q.confidence > COMMON_QUESTION_THRESHOLD)?;
        let explicit_service = req.detection.service_at(EXPLICIT_SERVICE_THRESHOLD).is_some();
        let skip = match question.question_type {
            QuestionType::Services | QuestionType::Pricing => explicit_service,
            QuestionType::MoreInfo => req.context.last_response.is_some(),
            QuestionType::Methodology => false,
        };
        if skip {
            return None;
        }

        let phrases = &lang.phrases;
        let mut lines = match question.question_type {
            QuestionType::Services => self.services_overview(lang),
            QuestionType::Pricing => self.pricing_overview(lang),
            QuestionType::Methodology => vec![phrases.methodology.clone()],
            QuestionType::MoreInfo => vec![phrases.more_info.clone()],
        };
        lines.extend(context_notes(lang, req.context));

        Some(
            BotResponse::new(lines.join("\n"), ResponseType::CommonQuestion)
                .with_confidence(question.confidence)
                .with_meta("question_type", json!(question.question_type)),
        )
    }

    fn services_overview(&self, lang: &LanguageCatalog) -> Vec<String> {
        let phrases = &lang.phrases;
        let mut lines = vec![phrases.services_overview_intro.clone()];
        for service in &lang.services {
            let summary = service
                .description
                .as_ref()
                .map(|d| d.short_description.as_str())
                .unwrap_or_default();
            lines.push(render(
                &phrases.services_overview_item,
                &[("title", service.title()), ("summary", summary)],
            ));
        }
        lines
    }

    fn pricing_overview(&self, lang: &LanguageCatalog) -> Vec<String> {
        let phrases = &lang.phrases;
        let mut lines = vec![phrases.pricing_overview_intro.clone()];
        for service in &lang.services {
            let Some(pricing) = &service.pricing else { continue };
            if let Some(package) = pricing.starting_package() {
                let amount = pricing.format_amount(package.price);
                lines.push(render(
                    &phrases.pricing_overview_item,
                    &[("title", service.title()), ("amount", &amount)],
                ));
            }
        }
        lines
    }

    fn contextual_followup(&self, lang: &LanguageCatalog, req: &ResponseRequest) -> Option<BotResponse> {
        if !(req.intent.is_confirmation || req.intent.is_elaboration_request) {
            return None;
        }
        // an explicit contact, pricing or booking request takes its own path
        if req.intent.wants_contact()
            || matches!(req.intent.primary_intent, PrimaryIntent::Pricing | PrimaryIntent::Booking)
        {
            return None;
        }
        let last = req.context.last_response.as_ref()?;
        let focus = last.service.as_deref().or(req.context.current_service.as_deref());
        if let Some(explicit) = req.detection.service_at(EXPLICIT_SERVICE_THRESHOLD) {
            if Some(explicit) != focus {
                return None;
            }
        }

        let phrases = &lang.phrases;
        let focused = focus.and_then(|name| lang.service(name));
        let text = match (last.response_type, focused) {
            (ResponseType::Service, Some(service)) => service_details(lang, service),
            (ResponseType::Pricing, Some(service)) => {
                let mut lines = vec![render(&phrases.followup_pricing, &[("title", service.title())])];
                lines.extend(package_lines(lang, service, true));
                lines.join("\n")
            }
            (ResponseType::Contact, _) => render(
                &phrases.followup_contact,
                &[("email", &lang.contact.email), ("phone", &lang.contact.phone)],
            ),
            _ => phrases.followup_general.clone(),
        };
        log::debug!("contextual follow-up on {}", last.response_type.as_str());

        Some(
            BotResponse::new(text, ResponseType::ContextualFollowup)
                .with_service(focused.map(|s| s.name.as_str()))
                .with_meta("follows", json!(last.response_type)),
        )
    }

    fn contact(&self, lang: &LanguageCatalog, intent: &IntentAnalysis, context: &ServiceContext) -> BotResponse {
        let phrases = &lang.phrases;
        let contact = &lang.contact;
        let mut lines = vec![
            phrases.contact_intro.clone(),
            render(
                &phrases.contact_details,
                &[
                    ("email", &contact.email),
                    ("phone", &contact.phone),
                    ("hours", &contact.hours),
                ],
            ),
        ];
        if intent.asked_location() {
            lines.push(render(&phrases.location_note, &[("location", &contact.location)]));
        }
        let current = context.current_service.as_deref();
        if let Some(service) = current.filter(|_| context.conversation_depth > DEEP_DEPTH) {
            lines.push(render(
                &phrases.contact_service_note,
                &[("title", &lang.title_of(service))],
            ));
        }
        BotResponse::new(lines.join("\n"), ResponseType::Contact)
            .with_service(current)
            .with_confidence(intent.confidence)
    }

    fn pricing(&self, lang: &LanguageCatalog, req: &ResponseRequest) -> BotResponse {
        let phrases = &lang.phrases;
        let service_name = req
            .detection
            .service_at(CONTEXT_UPDATE_THRESHOLD)
            .or(req.context.current_service.as_deref());
        let Some(service) = service_name.and_then(|name| lang.service(name)) else {
            return BotResponse::new(self.pricing_overview(lang).join("\n"), ResponseType::Pricing)
                .with_confidence(req.intent.confidence);
        };

        let mut lines = vec![render(&phrases.pricing_intro, &[("title", service.title())])];
        if service.pricing.is_some() {
            lines.extend(package_lines(lang, service, false));
        } else {
            lines = vec![render(&phrases.pricing_unavailable, &[("title", service.title())])];
        }
        if req.context.service_history.len() > 1 {
            lines.push(render(
                &phrases.pricing_comparison_note,
                &[("services", &lang.titles_of(&req.context.service_history))],
            ));
        }
        BotResponse::new(lines.join("\n"), ResponseType::Pricing)
            .with_service(Some(&service.name))
            .with_confidence(req.intent.confidence)
            .with_meta("currency", json!(service.pricing.as_ref().map(|p| &p.currency)))
    }

    fn service(&self, lang: &LanguageCatalog, req: &ResponseRequest) -> Option<BotResponse> {
        let detection = req.detection;
        if detection.confidence <= SERVICE_THRESHOLD {
            return None;
        }
        let service = detection.service.as_deref().and_then(|name| lang.service(name))?;
        let phrases = &lang.phrases;

        let (summary, full) = service
            .description
            .as_ref()
            .map(|d| (d.short_description.as_str(), d.full_description.as_str()))
            .unwrap_or_default();
        let mut lines = vec![render(
            &phrases.service_intro,
            &[("title", service.title()), ("summary", summary)],
        )];
        if !full.is_empty() {
            lines.push(full.to_string());
        }
        if detection.confidence < CLARIFY_BELOW {
            lines.push(render(&phrases.clarification_note, &[("title", service.title())]));
        }
        if !detection.alternative_services.is_empty() {
            let names: Vec<String> = detection
                .alternative_services
                .iter()
                .map(|alt| alt.service.clone())
                .collect();
            lines.push(render(
                &phrases.alternatives_note,
                &[("services", &lang.titles_of(&names))],
            ));
        }

        Some(
            BotResponse::new(lines.join("\n"), ResponseType::Service)
                .with_service(Some(&service.name))
                .with_confidence(detection.confidence)
                .with_meta("detection_method", json!(detection.detection_method))
                .with_meta("alternatives", json!(detection.alternative_services)),
        )
    }

    fn insight(&self, lang: &LanguageCatalog, context: &ServiceContext) -> Option<BotResponse> {
        let insight = context.insights().into_iter().next()?;
        let phrases = &lang.phrases;
        let (text, service) = match &insight {
            ConversationInsight::DeepEngagement { service, .. } => (
                render(&phrases.insight_deep, &[("title", &lang.title_of(service))]),
                Some(service.as_str()),
            ),
            ConversationInsight::MultipleServicesExplored { services } => (
                render(&phrases.insight_multiple, &[("services", &lang.titles_of(services))]),
                None,
            ),
        };
        Some(
            BotResponse::new(text, ResponseType::Insight)
                .with_service(service)
                .with_meta("insight", json!(insight)),
        )
    }

    fn fallback(&self, lang: &LanguageCatalog, context: &ServiceContext) -> BotResponse {
        let phrases = &lang.phrases;
        let mut lines = vec![phrases.fallback.clone()];
        if !context.service_history.is_empty() {
            lines.push(render(
                &phrases.fallback_history,
                &[("services", &lang.titles_of(&context.service_history))],
            ));
        }
        if !phrases.example_questions.is_empty() {
            lines.push(phrases.fallback_examples.clone());
            lines.extend(phrases.example_questions.iter().map(|q| format!("- {}", q)));
        }
        BotResponse::new(lines.join("\n"), ResponseType::Fallback)
    }

    /// Simple path used when the main reply fails validation: FAQ, then the
    /// base detector's service description, then the fallback text.
    pub fn legacy_response(&self, message: &str, language: Language) -> BotResponse {
        let lang = self.catalog.language(language);
        if let Some(faq) = find_faq(message, lang) {
            return BotResponse::new(faq.answer.clone(), ResponseType::Legacy);
        }

        let detection = self.detector.detect_service_from_message(message, lang);
        if let Some(service) = detection.service.as_deref().and_then(|name| lang.service(name)) {
            if let Some(description) = &service.description {
                let text = render(
                    &lang.phrases.service_intro,
                    &[("title", service.title()), ("summary", &description.short_description)],
                );
                if !text.trim().is_empty() {
                    return BotResponse::new(text, ResponseType::Legacy)
                        .with_service(Some(&service.name))
                        .with_confidence(detection.confidence);
                }
            }
        }

        let text = if lang.phrases.fallback.trim().is_empty() {
            LAST_RESORT.to_string()
        } else {
            lang.phrases.fallback.clone()
        };
        BotResponse::new(text, ResponseType::Legacy)
    }
}

/// History and depth reminders appended to overview answers.
fn context_notes(lang: &LanguageCatalog, context: &ServiceContext) -> Vec<String> {
    let mut notes = Vec::new();
    if !context.service_history.is_empty() {
        notes.push(render(
            &lang.phrases.history_note,
            &[("services", &lang.titles_of(&context.service_history))],
        ));
    }
    if let Some(current) = &context.current_service {
        if context.conversation_depth > DEEP_DEPTH {
            notes.push(render(&lang.phrases.depth_note, &[("title", &lang.title_of(current))]));
        }
    }
    notes
}

fn service_details(lang: &LanguageCatalog, service: &ServiceEntry) -> String {
    let phrases = &lang.phrases;
    let mut lines = vec![render(&phrases.followup_service, &[("title", service.title())])];
    if let Some(description) = &service.description {
        lines.push(description.full_description.clone());
        if !description.key_benefits.is_empty() {
            lines.push(phrases.benefits_heading.clone());
            lines.extend(description.key_benefits.iter().map(|b| format!("- {}", b)));
        }
        if !description.target_audience.is_empty() {
            lines.push(render(
                &phrases.audience_note,
                &[("audience", &description.target_audience)],
            ));
        }
    }
    lines.join("\n")
}

fn package_lines(lang: &LanguageCatalog, service: &ServiceEntry, with_features: bool) -> Vec<String> {
    let Some(pricing) = &service.pricing else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    for package in &pricing.packages {
        let amount = pricing.format_amount(package.price);
        lines.push(render(
            &lang.phrases.pricing_item,
            &[
                ("name", &package.name),
                ("amount", &amount),
                ("duration", &package.duration),
            ],
        ));
        if with_features && !package.features.is_empty() {
            lines.push(format!("  {}", package.features.join(", ")));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ServiceContext;
    use crate::intent::IntentAnalyzer;

    struct Fixture {
        catalog: Arc<Catalog>,
        generator: ResponseGenerator,
        detector: ServiceDetector,
    }

    impl Fixture {
        fn new() -> Self {
            let catalog = Arc::new(Catalog::builtin().unwrap());
            Self {
                generator: ResponseGenerator::new(catalog.clone(), ServiceDetector::default()),
                catalog,
                detector: ServiceDetector::default(),
            }
        }

        fn reply(&self, message: &str, language: Language, context: &ServiceContext) -> BotResponse {
            let detection =
                self.detector
                    .detect_with_confidence(message, self.catalog.language(language), context);
            let intent = IntentAnalyzer::new().analyze(message, language);
            self.generator
                .generate(&ResponseRequest {
                    message,
                    language,
                    detection: &detection,
                    intent: &intent,
                    context,
                })
                .unwrap()
        }
    }

    #[test]
    fn test_english_pricing_for_detected_service() {
        let fx = Fixture::new();
        let response = fx.reply("What is the price for executive coaching?", Language::En, &ServiceContext::new());
        assert_eq!(response.response_type, ResponseType::Pricing);
        assert_eq!(response.service.as_deref(), Some("Executive Coaching"));
        assert!(response.text.contains("USD 2,500"));
    }

    #[test]
    fn test_swahili_pricing_for_leadership() {
        let fx = Fixture::new();
        let response = fx.reply("Bei ya mafunzo ya uongozi ni ngapi?", Language::Sw, &ServiceContext::new());
        assert_eq!(response.response_type, ResponseType::Pricing);
        assert_eq!(response.service.as_deref(), Some("Leadership Training"));
        assert!(response.text.starts_with("Bei za Mafunzo ya Uongozi"));
        assert!(response.text.contains("KES 780,000"));
    }

    #[test]
    fn test_greeting_is_casual() {
        let fx = Fixture::new();
        let response = fx.reply("Hello!", Language::En, &ServiceContext::new());
        assert_eq!(response.response_type, ResponseType::Casual);
        let phrases = &fx.catalog.language(Language::En).phrases;
        assert!(phrases.greeting_replies.contains(&response.text));
    }

    #[test]
    fn test_services_overview_lists_everything() {
        let fx = Fixture::new();
        let response = fx.reply("What services do you offer?", Language::En, &ServiceContext::new());
        assert_eq!(response.response_type, ResponseType::CommonQuestion);
        for service in &fx.catalog.language(Language::En).services {
            assert!(response.text.contains(service.title()));
        }
    }

    #[test]
    fn test_contact_with_location() {
        let fx = Fixture::new();
        let response = fx.reply("Where are you located?", Language::En, &ServiceContext::new());
        assert_eq!(response.response_type, ResponseType::Contact);
        assert!(response.text.contains("Nairobi"));
        assert!(response.text.contains("hello@podiumspeaking.co.ke"));
    }

    #[test]
    fn test_contact_request_beats_followup() {
        let fx = Fixture::new();
        let mut context = ServiceContext::new();
        context.update(Some("Keynote Speaking"), "I need a speaker for our conference");
        context.record_response(
            ResponseType::Service,
            Some("Keynote Speaking".to_string()),
            "Keynote Speaking: ...",
        );

        let response = fx.reply("yes, phone number please", Language::En, &context);
        assert_eq!(response.response_type, ResponseType::Contact);
        assert!(response.text.contains("+254 712 345 678"));

        let response = fx.reply("namba ya simu tafadhali", Language::Sw, &context);
        assert_eq!(response.response_type, ResponseType::Contact);
    }

    #[test]
    fn test_followup_after_service_reply() {
        let fx = Fixture::new();
        let mut context = ServiceContext::new();
        context.update(Some("Corporate Workshops"), "workshops");
        context.record_response(
            ResponseType::Service,
            Some("Corporate Workshops".to_string()),
            "Corporate Workshops: ...",
        );
        let response = fx.reply("yes please", Language::En, &context);
        assert_eq!(response.response_type, ResponseType::ContextualFollowup);
        assert_eq!(response.service.as_deref(), Some("Corporate Workshops"));
        assert!(response.text.contains("Key benefits:"));
    }

    #[test]
    fn test_service_reply_for_keyword() {
        let fx = Fixture::new();
        let response = fx.reply("I need a speaker for our conference", Language::En, &ServiceContext::new());
        assert_eq!(response.response_type, ResponseType::Service);
        assert_eq!(response.service.as_deref(), Some("Keynote Speaking"));
    }

    #[test]
    fn test_faq_match() {
        let fx = Fixture::new();
        let response = fx.reply("what is your cancellation policy", Language::En, &ServiceContext::new());
        assert_eq!(response.response_type, ResponseType::Faq);
        assert!(response.text.contains("30 days"));
    }

    #[test]
    fn test_fallback_mentions_history() {
        let fx = Fixture::new();
        let mut context = ServiceContext::new();
        context.update(Some("Virtual Events"), "webinar");
        let response = fx.reply("blue elephants", Language::En, &context);
        assert_eq!(response.response_type, ResponseType::Fallback);
        assert!(response.text.contains("Virtual Events"));
        assert!(response.text.contains("What services do you offer?"));
    }

    #[test]
    fn test_insight_before_fallback() {
        let fx = Fixture::new();
        let mut context = ServiceContext::new();
        context.update(Some("Virtual Events"), "webinar");
        context.update(Some("Keynote Speaking"), "keynote");
        let response = fx.reply("blue elephants", Language::En, &context);
        assert_eq!(response.response_type, ResponseType::Insight);
    }

    #[test]
    fn test_validation() {
        let empty = BotResponse::new("  ".to_string(), ResponseType::Faq);
        assert!(matches!(validate_response(&empty), Err(ChatError::InvalidResponse(_))));
        let bad = BotResponse::new("ok".to_string(), ResponseType::Faq).with_confidence(1.5);
        assert!(validate_response(&bad).is_err());
    }

    #[test]
    fn test_legacy_response() {
        let fx = Fixture::new();
        let legacy = fx.generator.legacy_response("coaching", Language::En);
        assert_eq!(legacy.response_type, ResponseType::Legacy);
        assert_eq!(legacy.service.as_deref(), Some("Executive Coaching"));
        let legacy = fx.generator.legacy_response("zzz", Language::En);
        assert_eq!(legacy.text, fx.catalog.language(Language::En).phrases.fallback);
    }

    #[test]
    fn test_find_faq_needs_substance() {
        let fx = Fixture::new();
        let en = fx.catalog.language(Language::En);
        assert!(find_faq("what", en).is_none());
        assert!(find_faq("Do you travel internationally?", en).is_some());
    }
}
