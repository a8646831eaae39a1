//! Conversation session domain.
//!
//! - [`entities::Message`]: a single role-tagged message
//! - [`history::ConversationHistory`]: bounded FIFO buffer plus system slot
//! - [`request::ConverseRequest`]: structured conversational call
//! - [`stream::StreamEvent`]: one item of a streaming response

pub mod entities;
pub mod history;
pub mod request;
pub mod stream;
