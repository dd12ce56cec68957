//! Bilingual (English/Swahili) rule-based chat core for a speaking and
//! consulting website: service detection, intent analysis, conversation
//! context, reply selection and session persistence.

pub mod catalog;
pub mod context;
pub mod conversation;
pub mod detector;
pub mod engine;
pub mod error;
pub mod export;
pub mod intent;
pub mod language;
pub mod preprocess;
pub mod response;
pub mod scorer;
pub mod server;
pub mod session;
pub mod settings;
pub mod similarity;
pub mod store;
pub mod suggestions;

pub use catalog::Catalog;
pub use context::ServiceContext;
pub use conversation::{Conversation, ConversationMessage};
pub use detector::{normalize_score, DetectionResult, ServiceDetector};
pub use engine::{ChatEngine, EngineOptions, TurnOutcome};
pub use error::{ChatError, Result};
pub use intent::{IntentAnalysis, IntentAnalyzer};
pub use language::Language;
pub use response::{BotResponse, ResponseType};
pub use session::{ChatReply, ChatService, ServiceOptions};
pub use store::{ConversationStore, InMemoryStore};
