//! Application layer for bedrock-converse
//!
//! This crate contains the conversation dispatcher, its port definitions and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{RetryPolicy, SessionConfig};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    model_invoker::{InvocationError, ModelInvoker, StreamHandle},
};
pub use use_cases::converse::{
    ConverseError, ConverseInput, ConverseOutput, ConverseUseCase, PromptInput, Protocol,
};
pub use use_cases::retry::retry_on_throttle;
