//! Interactive chat module
//!
//! Provides a line-editor based chat loop over a single conversation.

mod repl;

pub use repl::{ChatRepl, print_stream};
