//! Transcript logging.
//!
//! Provides [`JsonlConversationLogger`], the file-backed implementation of
//! the [`ConversationLogger`](converse_application::ConversationLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;
