//! Conversation export: stats, usage patterns and optional PII scrubbing.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::context::ServiceContext;
use crate::conversation::{
    languages_used, message_type_counts, Conversation, ConversationMessage, ConversationStats, Role,
};
use crate::language::Language;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex")
});
static CARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{4}[ -]?){3}\d{1,4}\b").expect("valid regex"));
// international (+254 712 345 678), local with a leading 0, or 3-3-4 groups
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\+\d{1,3}(?:[\s.-]?\(?\d{2,4}\)?){2,4}\b",
        r"|\b0\d{2,3}[\s.-]?\d{3}[\s.-]?\d{3,4}\b",
        r"|(?:\(\d{3}\)|\b\d{3})[\s.-]\d{3}[\s.-]\d{4}\b",
    ))
    .expect("valid regex")
});

/// Replaces e-mail addresses, card numbers and phone numbers, in that order.
pub fn anonymize_text(text: &str) -> String {
    let text = EMAIL_RE.replace_all(text, "[EMAIL]");
    let text = CARD_RE.replace_all(&text, "[CARD]");
    PHONE_RE.replace_all(&text, "[PHONE]").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub include_messages: bool,
    pub include_context: bool,
    pub anonymize: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_messages: true,
            include_context: true,
            anonymize: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationPatterns {
    pub user_messages: usize,
    pub average_user_message_length: f32,
    pub questions_asked: usize,
    /// Detected services in order, repeats collapsed.
    pub service_sequence: Vec<String>,
    pub topic_changes: usize,
    pub response_types: BTreeMap<String, usize>,
    pub languages_used: Vec<Language>,
}

pub fn analyze_patterns(messages: &[ConversationMessage]) -> ConversationPatterns {
    let mut patterns = ConversationPatterns::default();
    let mut total_len = 0usize;

    for message in messages.iter().filter(|m| m.role == Role::User) {
        patterns.user_messages += 1;
        total_len += message.content.chars().count();
        if message.content.contains('?') {
            patterns.questions_asked += 1;
        }
        if let Some(service) = &message.detected_service {
            if patterns.service_sequence.last() != Some(service) {
                patterns.service_sequence.push(service.clone());
            }
        }
    }
    patterns.response_types = message_type_counts(messages);
    patterns.languages_used = languages_used(messages);

    if patterns.user_messages > 0 {
        patterns.average_user_message_length = total_len as f32 / patterns.user_messages as f32;
    }
    patterns.topic_changes = patterns.service_sequence.len().saturating_sub(1);
    patterns
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationExport {
    pub exported_at: DateTime<Utc>,
    pub conversation_id: String,
    pub stats: ConversationStats,
    pub patterns: ConversationPatterns,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ConversationMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_context: Option<ServiceContext>,
}

pub fn export_conversation(conversation: &Conversation, options: ExportOptions) -> ConversationExport {
    let messages = options.include_messages.then(|| {
        let mut messages = conversation.messages.clone();
        if options.anonymize {
            for message in &mut messages {
                message.content = anonymize_text(&message.content);
            }
        }
        messages
    });

    let service_context = options.include_context.then(|| {
        let mut context = conversation.context.clone();
        if options.anonymize {
            for interaction in &mut context.conversation_flow {
                interaction.message = anonymize_text(&interaction.message);
            }
            if let Some(last) = &mut context.last_response {
                last.text = anonymize_text(&last.text);
            }
        }
        context
    });

    ConversationExport {
        exported_at: Utc::now(),
        conversation_id: conversation.id.clone(),
        stats: conversation.stats(),
        patterns: analyze_patterns(&conversation.messages),
        messages,
        service_context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::DEFAULT_MAX_MESSAGES;
    use crate::response::ResponseType;

    #[test]
    fn test_anonymize_text() {
        let text = "Mail jane.doe@example.com, card 4111 1111 1111 1111, call +254 712 345 678";
        assert_eq!(anonymize_text(text), "Mail [EMAIL], card [CARD], call [PHONE]");
        assert_eq!(anonymize_text("no secrets here"), "no secrets here");
    }

    #[test]
    fn test_phone_shapes() {
        assert_eq!(anonymize_text("call 0712 345 678"), "call [PHONE]");
        assert_eq!(anonymize_text("call +254712345678 now"), "call [PHONE] now");
        assert_eq!(anonymize_text("office (555) 123-4567"), "office [PHONE]");
    }

    #[test]
    fn test_dates_and_counts_are_not_phones() {
        for text in [
            "the event is on 2025-01-15 10",
            "meet on 2025-01-15 10:30",
            "order 12345678",
            "between 2024 and 2025 we ran 120 events",
        ] {
            assert_eq!(anonymize_text(text), text);
        }
    }

    #[test]
    fn test_short_numbers_survive() {
        assert_eq!(anonymize_text("a team of 25 people in 2025"), "a team of 25 people in 2025");
    }

    fn sample() -> Conversation {
        let mut conversation = Conversation::new("exp", Language::En, "Welcome!");
        let mut first = ConversationMessage::user("Do you do keynotes?", Language::En);
        first.detected_service = Some("Keynote Speaking".to_string());
        conversation.push(first, DEFAULT_MAX_MESSAGES);
        conversation.push(
            ConversationMessage::bot("Keynote Speaking: ...", Language::En, ResponseType::Service),
            DEFAULT_MAX_MESSAGES,
        );
        let mut second = ConversationMessage::user("email me at a@b.co", Language::En);
        second.detected_service = Some("Virtual Events".to_string());
        conversation.push(second, DEFAULT_MAX_MESSAGES);
        conversation.context.update(Some("Virtual Events"), "email me at a@b.co");
        conversation
    }

    #[test]
    fn test_patterns() {
        let patterns = analyze_patterns(&sample().messages);
        assert_eq!(patterns.user_messages, 2);
        assert_eq!(patterns.questions_asked, 1);
        assert_eq!(patterns.service_sequence, vec!["Keynote Speaking", "Virtual Events"]);
        assert_eq!(patterns.topic_changes, 1);
        assert_eq!(patterns.response_types.get("service"), Some(&1));
        assert_eq!(patterns.response_types.get("welcome"), Some(&1));
    }

    #[test]
    fn test_export_options() {
        let conversation = sample();
        let full = export_conversation(&conversation, ExportOptions { anonymize: true, ..Default::default() });
        let messages = full.messages.unwrap();
        assert_eq!(messages[3].content, "email me at [EMAIL]");
        let context = full.service_context.unwrap();
        assert_eq!(context.conversation_flow[0].message, "email me at [EMAIL]");

        let bare = export_conversation(
            &conversation,
            ExportOptions {
                include_messages: false,
                include_context: false,
                anonymize: false,
            },
        );
        assert!(bare.messages.is_none());
        assert!(bare.service_context.is_none());
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("messages").is_none());
        assert_eq!(json["conversation_id"], "exp");
    }
}
