use chrono::{Duration, Utc};
use std::sync::Arc;

use podium_chat::conversation::Role;
use podium_chat::export::{export_conversation, ConversationExport, ExportOptions};
use podium_chat::store::{
    restore_conversation_state, restore_conversation_state_at, save_conversation_state, PersistedState,
};
use podium_chat::{
    Catalog, ChatEngine, ConversationStore, EngineOptions, InMemoryStore, Language, ResponseType,
};

fn engine() -> ChatEngine {
    ChatEngine::new(Arc::new(Catalog::builtin().unwrap()), EngineOptions::default())
}

#[test]
fn english_pricing_question() {
    let engine = engine();
    let mut conversation = engine.new_conversation("en-pricing", Language::En);

    let outcome = engine.handle_message(&mut conversation, "What is the price for executive coaching?");
    assert_eq!(outcome.response.response_type, ResponseType::Pricing);
    assert_eq!(outcome.response.service.as_deref(), Some("Executive Coaching"));
    assert!(outcome.response.text.contains("USD 2,500"));
    assert!(outcome.detection.confidence >= 0.7);
    assert!(outcome.suggestions.len() <= 4);
}

#[test]
fn swahili_pricing_question() {
    let engine = engine();
    let mut conversation = engine.new_conversation("sw-pricing", Language::Sw);

    let outcome = engine.handle_message(&mut conversation, "Bei ya mafunzo ya uongozi ni ngapi?");
    assert_eq!(outcome.response.response_type, ResponseType::Pricing);
    assert_eq!(outcome.response.service.as_deref(), Some("Leadership Training"));
    assert!(outcome.response.text.contains("Mafunzo ya Uongozi"));
    assert!(outcome.response.text.contains("KES"));
    assert_eq!(conversation.context.current_service.as_deref(), Some("Leadership Training"));
}

#[test]
fn empty_message_gets_a_fallback() {
    let engine = engine();
    let mut conversation = engine.new_conversation("empty", Language::En);

    let outcome = engine.handle_message(&mut conversation, "");
    assert_eq!(outcome.response.response_type, ResponseType::Fallback);
    assert!(!outcome.response.text.trim().is_empty());
    assert!(outcome.detection.service.is_none());
    assert!(conversation.context.current_service.is_none());
}

#[test]
fn history_is_pruned_but_keeps_welcome() {
    let engine = engine();
    let mut conversation = engine.new_conversation("prune", Language::En);
    // welcome + 25 turns = 51 messages before pruning
    for i in 0..25 {
        engine.handle_message(&mut conversation, &format!("keynote question {}", i));
    }
    assert_eq!(conversation.messages.len(), 50);
    assert_eq!(conversation.messages[0].response_type, Some(ResponseType::Welcome));
    assert_eq!(conversation.messages[1].role, Role::Bot);
    assert!(conversation.context.conversation_depth <= 10);
    assert!(conversation.context.conversation_flow.len() <= 20);
}

#[test]
fn user_message_is_recorded_once() {
    let engine = engine();
    let mut conversation = engine.new_conversation("dupes", Language::En);
    let message = "Tell me about your webinars";

    engine.handle_message(&mut conversation, message);
    let copies = conversation
        .messages
        .iter()
        .filter(|m| m.role == Role::User && m.content == message)
        .count();
    assert_eq!(copies, 1);
    assert_eq!(conversation.messages.len(), 3);
}

#[test]
fn negative_pattern_vetoes_service() {
    let engine = engine();
    let result = engine.detect_service_from_message("We want a keynote, not virtual", Language::En);
    assert_eq!(result.service.as_deref(), Some("Keynote Speaking"));
    assert!(result
        .alternative_services
        .iter()
        .all(|alt| alt.service != "Virtual Events"));
}

#[test]
fn export_survives_json_and_scrubs_contact_details() {
    let engine = engine();
    let mut conversation = engine.new_conversation("export", Language::En);
    engine.handle_message(&mut conversation, "I need a speaker for our conference");
    engine.handle_message(&mut conversation, "Email me at jane.doe@example.com or call +254 700 111 222");

    let export = export_conversation(
        &conversation,
        ExportOptions {
            anonymize: true,
            ..Default::default()
        },
    );
    let json = serde_json::to_string(&export).unwrap();
    assert!(!json.contains("jane.doe@example.com"));
    assert!(!json.contains("700 111 222"));

    let parsed: ConversationExport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.conversation_id, "export");
    assert_eq!(parsed.stats.total_messages, conversation.messages.len());
    assert_eq!(parsed.stats.user_messages, 2);
    let messages = parsed.messages.unwrap();
    assert_eq!(messages[3].content, "Email me at [EMAIL] or call [PHONE]");
    assert!(parsed.service_context.is_some());
    assert_eq!(parsed.patterns.user_messages, 2);
}

#[test]
fn stale_state_is_not_restored() {
    let engine = engine();
    let store = InMemoryStore::new();
    let mut conversation = engine.new_conversation("stale", Language::En);
    engine.handle_message(&mut conversation, "coaching");

    let mut state = PersistedState::from_conversation(&conversation);
    state.timestamp = Utc::now() - Duration::hours(2);
    store
        .save("stale", serde_json::to_string(&state).unwrap())
        .unwrap();
    assert!(restore_conversation_state(&store, "stale", Duration::hours(1)).is_none());

    assert!(save_conversation_state(&store, &conversation));
    let restored = restore_conversation_state(&store, "stale", Duration::hours(1)).unwrap();
    assert_eq!(restored.messages.len(), 3);
    assert_eq!(restored.active_service.as_deref(), Some("Executive Coaching"));

    let later = Utc::now() + Duration::hours(2);
    assert!(restore_conversation_state_at(&store, "stale", Duration::hours(1), later).is_none());
}

#[test]
fn welcome_only_state_is_not_restored() {
    let engine = engine();
    let store = InMemoryStore::new();
    let conversation = engine.new_conversation("welcome-only", Language::Sw);
    assert!(save_conversation_state(&store, &conversation));
    assert!(restore_conversation_state(&store, "welcome-only", Duration::hours(1)).is_none());
}

#[test]
fn follow_up_stays_on_the_service() {
    let engine = engine();
    let mut conversation = engine.new_conversation("followup", Language::En);
    engine.handle_message(&mut conversation, "Tell me about corporate workshops");
    let outcome = engine.handle_message(&mut conversation, "yes please");
    assert_eq!(outcome.response.response_type, ResponseType::ContextualFollowup);
    assert_eq!(outcome.response.service.as_deref(), Some("Corporate Workshops"));
}
