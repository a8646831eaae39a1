//! Presentation layer for bedrock-converse
//!
//! This crate contains the CLI definition, console output formatting,
//! progress reporting, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatRepl, print_stream};
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::ProgressReporter;
