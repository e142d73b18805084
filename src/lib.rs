pub mod config;
pub mod error;
pub mod models;
pub mod poller;
pub mod reply;
pub mod source;
pub mod storage;
pub mod suggestion;
pub mod thread;

pub use config::BotConfig;
pub use error::{ConfigError, GenerationError, PollError, SourceError};
pub use models::{FeedItem, MemeCoinSuggestion};
pub use poller::{poll_once, spawn_poller, Event, PollConfig, PollerHandle};
pub use reply::{extract_original_content, ReplyEngine, EMPTY_CONTENT_REPLY};
pub use source::FeedSource;
pub use storage::{processed_key, InteractionStore, ProcessedRecord};
pub use suggestion::{format_response, SuggestionGenerator};
pub use thread::build_conversation_thread;
