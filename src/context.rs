//! Per-session service context: which service the visitor is on, how long
//! they have stayed there and what they have looked at before.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::language::Language;
use crate::preprocess::{contains_any, truncate_chars};
use crate::response::ResponseType;

pub const MAX_DEPTH: u32 = 10;
pub const MAX_FLOW: usize = 20;
pub const FLOW_MESSAGE_CHARS: usize = 100;

/// Minimum detection confidence before a turn moves the context.
pub const CONTEXT_UPDATE_THRESHOLD: f32 = 0.4;

const CONTINUATION_CUES_EN: &[&str] = &[
    "tell me more", "more about", "more details", "more info", "go on", "continue",
    "what else", "elaborate", "keep going", "and also",
];
const CONTINUATION_CUES_SW: &[&str] = &[
    "niambie zaidi", "zaidi", "endelea", "nini kingine", "maelezo zaidi", "eleza",
];
const SWITCH_CUES_EN: &[&str] = &[
    "instead", "something else", "another service", "different service", "rather", "switch",
];
const SWITCH_CUES_SW: &[&str] = &["badala", "kitu kingine", "huduma nyingine", "tofauti"];

pub fn has_continuation_cue(processed: &str, language: Language) -> bool {
    match language {
        Language::En => contains_any(processed, CONTINUATION_CUES_EN),
        Language::Sw => contains_any(processed, CONTINUATION_CUES_SW),
    }
}

pub fn has_switch_cue(processed: &str, language: Language) -> bool {
    match language {
        Language::En => contains_any(processed, SWITCH_CUES_EN),
        Language::Sw => contains_any(processed, SWITCH_CUES_SW),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub detected_service: Option<String>,
    pub context_service: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastResponse {
    pub response_type: ResponseType,
    pub service: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversationState {
    Fresh,
    ServiceFocused { service: String, depth: u32 },
    DeepEngagement { service: String, depth: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationInsight {
    DeepEngagement { service: String, depth: u32 },
    MultipleServicesExplored { services: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceContext {
    pub current_service: Option<String>,
    pub service_history: Vec<String>,
    pub conversation_depth: u32,
    pub conversation_flow: VecDeque<Interaction>,
    pub last_service_mention: Option<DateTime<Utc>>,
    pub last_response: Option<LastResponse>,
}

impl ServiceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, detected_service: Option<&str>, message: &str) {
        self.update_at(detected_service, message, Utc::now());
    }

    /// Applies one user turn. `detected_service` must already be filtered by
    /// [`CONTEXT_UPDATE_THRESHOLD`].
    pub fn update_at(&mut self, detected_service: Option<&str>, message: &str, now: DateTime<Utc>) {
        match detected_service {
            Some(service) if self.current_service.as_deref() != Some(service) => {
                self.current_service = Some(service.to_string());
                self.conversation_depth = 1;
                if !self.service_history.iter().any(|s| s == service) {
                    self.service_history.push(service.to_string());
                }
                self.last_service_mention = Some(now);
            }
            Some(_) => {
                self.conversation_depth = (self.conversation_depth + 1).min(MAX_DEPTH);
                self.last_service_mention = Some(now);
            }
            None => {
                if self.current_service.is_some() {
                    self.conversation_depth = (self.conversation_depth + 1).min(MAX_DEPTH);
                }
            }
        }

        self.conversation_flow.push_back(Interaction {
            timestamp: now,
            message: truncate_chars(message, FLOW_MESSAGE_CHARS),
            detected_service: detected_service.map(str::to_string),
            context_service: self.current_service.clone(),
        });
        while self.conversation_flow.len() > MAX_FLOW {
            self.conversation_flow.pop_front();
        }
    }

    pub fn record_response(&mut self, response_type: ResponseType, service: Option<String>, text: &str) {
        self.last_response = Some(LastResponse {
            response_type,
            service,
            text: text.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn state(&self) -> ConversationState {
        match &self.current_service {
            None => ConversationState::Fresh,
            Some(service) if self.conversation_depth > 3 => ConversationState::DeepEngagement {
                service: service.clone(),
                depth: self.conversation_depth,
            },
            Some(service) => ConversationState::ServiceFocused {
                service: service.clone(),
                depth: self.conversation_depth,
            },
        }
    }

    pub fn insights(&self) -> Vec<ConversationInsight> {
        let mut insights = Vec::new();
        if let ConversationState::DeepEngagement { service, depth } = self.state() {
            insights.push(ConversationInsight::DeepEngagement { service, depth });
        }
        if self.service_history.len() > 1 {
            insights.push(ConversationInsight::MultipleServicesExplored {
                services: self.service_history.clone(),
            });
        }
        insights
    }
}
