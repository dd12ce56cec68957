//! Per-turn orchestration: detection, intent analysis, context update,
//! reply and suggestions.

use serde::Serialize;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::context::{ServiceContext, CONTEXT_UPDATE_THRESHOLD};
use crate::conversation::{Conversation, ConversationMessage, DEFAULT_MAX_MESSAGES};
use crate::detector::{DetectionResult, ServiceDetector};
use crate::intent::{IntentAnalysis, IntentAnalyzer};
use crate::language::{detect_language, Language, LanguageSignal};
use crate::response::{BotResponse, ResponseGenerator, ResponseRequest};
use crate::scorer::KeywordScorer;
use crate::suggestions::generate_suggestions;

/// Language signal confidence needed before an automatic switch.
const AUTO_SWITCH_CONFIDENCE: f32 = 0.7;

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub max_messages: usize,
    pub auto_switch_language: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            auto_switch_language: false,
        }
    }
}

/// A user message that has been recorded but not answered yet.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub message: String,
    pub language: Language,
    pub detection: DetectionResult,
    pub intent: IntentAnalysis,
    pub language_signal: Option<LanguageSignal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub response: BotResponse,
    pub suggestions: Vec<String>,
    pub detection: DetectionResult,
    pub intent: IntentAnalysis,
    pub language_signal: Option<LanguageSignal>,
}

pub struct ChatEngine {
    catalog: Arc<Catalog>,
    detector: ServiceDetector,
    analyzer: IntentAnalyzer,
    generator: ResponseGenerator,
    options: EngineOptions,
}

impl ChatEngine {
    pub fn new(catalog: Arc<Catalog>, options: EngineOptions) -> Self {
        let detector = ServiceDetector::new(KeywordScorer::default());
        Self {
            generator: ResponseGenerator::new(catalog.clone(), detector.clone()),
            catalog,
            detector,
            analyzer: IntentAnalyzer::new(),
            options,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn welcome(&self, language: Language) -> &str {
        &self.catalog.language(language).phrases.welcome
    }

    pub fn new_conversation(&self, id: &str, language: Language) -> Conversation {
        Conversation::new(id, language, self.welcome(language))
    }

    pub fn detect_service_from_message(&self, message: &str, language: Language) -> DetectionResult {
        self.detector
            .detect_service_from_message(message, self.catalog.language(language))
    }

    pub fn detect_with_confidence(
        &self,
        message: &str,
        language: Language,
        context: &ServiceContext,
    ) -> DetectionResult {
        self.detector
            .detect_with_confidence(message, self.catalog.language(language), context)
    }

    pub fn analyze_message_intent(&self, message: &str, language: Language) -> IntentAnalysis {
        self.analyzer.analyze(message, language)
    }

    /// Generates the reply, falling back to the legacy path when the
    /// generated reply does not validate.
    pub fn generate_contextual_response(
        &self,
        message: &str,
        language: Language,
        detection: &DetectionResult,
        intent: &IntentAnalysis,
        context: &ServiceContext,
    ) -> BotResponse {
        let request = ResponseRequest {
            message,
            language,
            detection,
            intent,
            context,
        };
        match self.generator.generate(&request) {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Falling back to legacy response: {}", e);
                self.generator.legacy_response(message, language)
            }
        }
    }

    /// Records the user message and analyses it against the context as it
    /// stood before this turn.
    pub fn accept_user_message(&self, conversation: &mut Conversation, message: &str) -> PendingTurn {
        let language_signal = detect_language(message);
        if let Some(signal) = language_signal {
            if signal.language != conversation.language {
                log::debug!(
                    "message in {} looks like {} ({:.2})",
                    conversation.language,
                    signal.language,
                    signal.confidence
                );
                if self.options.auto_switch_language && signal.confidence >= AUTO_SWITCH_CONFIDENCE {
                    log::info!(
                        "Switching conversation {} to {}",
                        conversation.id,
                        signal.language
                    );
                    conversation.language = signal.language;
                }
            }
        }

        let language = conversation.language;
        let detection = self.detect_with_confidence(message, language, &conversation.context);
        let intent = self.analyze_message_intent(message, language);
        log::debug!(
            "turn: service={:?} confidence={:.2} intent={:?}",
            detection.service,
            detection.confidence,
            intent.primary_intent
        );

        conversation.push(
            ConversationMessage::user(message, language).with_detection(&detection),
            self.options.max_messages,
        );

        PendingTurn {
            message: message.to_string(),
            language,
            detection,
            intent,
            language_signal,
        }
    }

    /// Updates the context, produces the reply and records it.
    pub fn complete_turn(&self, conversation: &mut Conversation, pending: PendingTurn) -> TurnOutcome {
        let PendingTurn {
            message,
            language,
            detection,
            intent,
            language_signal,
        } = pending;

        conversation
            .context
            .update(detection.service_at(CONTEXT_UPDATE_THRESHOLD), &message);

        let response = self.generate_contextual_response(
            &message,
            language,
            &detection,
            &intent,
            &conversation.context,
        );
        conversation.context.record_response(
            response.response_type,
            response.service.clone(),
            &response.text,
        );
        conversation.push(
            ConversationMessage::bot(&response.text, language, response.response_type),
            self.options.max_messages,
        );

        let suggestions = generate_suggestions(
            &response,
            &conversation.context,
            self.catalog.language(language),
        );

        TurnOutcome {
            response,
            suggestions,
            detection,
            intent,
            language_signal,
        }
    }

    pub fn handle_message(&self, conversation: &mut Conversation, message: &str) -> TurnOutcome {
        let pending = self.accept_user_message(conversation, message);
        self.complete_turn(conversation, pending)
    }
}
