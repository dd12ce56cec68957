use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::context::ServiceContext;
use crate::detector::DetectionResult;
use crate::language::Language;
use crate::response::ResponseType;

pub const DEFAULT_MAX_MESSAGES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_detection: Option<DetectionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
}

impl ConversationMessage {
    pub fn user(content: &str, language: Language) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            timestamp: Utc::now(),
            language,
            detected_service: None,
            confidence: None,
            enhanced_detection: None,
            response_type: None,
        }
    }

    pub fn bot(content: &str, language: Language, response_type: ResponseType) -> Self {
        Self {
            role: Role::Bot,
            response_type: Some(response_type),
            ..Self::user(content, language)
        }
    }

    /// Attaches the detection made for a user message.
    pub fn with_detection(mut self, detection: &DetectionResult) -> Self {
        self.detected_service = detection.service.clone();
        self.confidence = Some(detection.confidence);
        self.enhanced_detection = Some(detection.clone());
        self
    }
}

/// Keeps message 0 (the welcome message) and the most recent `max - 1`.
pub fn prune_conversation(messages: &mut Vec<ConversationMessage>, max: usize) {
    if max == 0 {
        messages.clear();
        return;
    }
    if messages.len() <= max {
        return;
    }
    let excess = messages.len() - max;
    messages.drain(1..1 + excess);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub bot_messages: usize,
    pub services_discussed: Vec<String>,
    pub current_service: Option<String>,
    pub conversation_depth: u32,
    pub average_confidence: Option<f32>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub duration_secs: i64,
    pub language: Language,
    /// Bot replies counted by response type.
    pub message_types: BTreeMap<String, usize>,
    /// Languages seen, in order of first use.
    pub languages: Vec<Language>,
}

pub fn message_type_counts(messages: &[ConversationMessage]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for kind in messages.iter().filter_map(|m| m.response_type) {
        *counts.entry(kind.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn languages_used(messages: &[ConversationMessage]) -> Vec<Language> {
    let mut languages = Vec::new();
    for message in messages {
        if !languages.contains(&message.language) {
            languages.push(message.language);
        }
    }
    languages
}

#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub language: Language,
    pub messages: Vec<ConversationMessage>,
    pub context: ServiceContext,
}

impl Conversation {
    /// A fresh conversation that opens with the welcome message.
    pub fn new(id: &str, language: Language, welcome: &str) -> Self {
        Self {
            id: id.to_string(),
            language,
            messages: vec![ConversationMessage::bot(welcome, language, ResponseType::Welcome)],
            context: ServiceContext::new(),
        }
    }

    pub fn push(&mut self, message: ConversationMessage, max_messages: usize) {
        self.messages.push(message);
        prune_conversation(&mut self.messages, max_messages);
    }

    /// Drops history and context, keeping the id.
    pub fn reset(&mut self, language: Language, welcome: &str) {
        self.language = language;
        self.messages = vec![ConversationMessage::bot(welcome, language, ResponseType::Welcome)];
        self.context.reset();
    }

    pub fn user_messages(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages.iter().filter(|m| m.role == Role::User)
    }

    pub fn stats(&self) -> ConversationStats {
        let user_messages = self.user_messages().count();
        let confidences: Vec<f32> = self.user_messages().filter_map(|m| m.confidence).collect();
        let average_confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
        };

        let mut seen = HashSet::new();
        let mut services_discussed: Vec<String> = self
            .messages
            .iter()
            .filter_map(|m| m.detected_service.clone())
            .filter(|s| seen.insert(s.clone()))
            .collect();
        for service in &self.context.service_history {
            if seen.insert(service.clone()) {
                services_discussed.push(service.clone());
            }
        }

        let started_at = self.messages.first().map(|m| m.timestamp);
        let last_activity = self.messages.last().map(|m| m.timestamp);
        let duration_secs = match (started_at, last_activity) {
            (Some(start), Some(end)) => (end - start).num_seconds().max(0),
            _ => 0,
        };

        ConversationStats {
            total_messages: self.messages.len(),
            user_messages,
            bot_messages: self.messages.len() - user_messages,
            services_discussed,
            current_service: self.context.current_service.clone(),
            conversation_depth: self.context.conversation_depth,
            average_confidence,
            started_at,
            last_activity,
            duration_secs,
            language: self.language,
            message_types: message_type_counts(&self.messages),
            languages: languages_used(&self.messages),
        }
    }
}
