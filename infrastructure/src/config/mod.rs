//! Configuration file loading for bedrock-converse
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `BEDROCK_CONVERSE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./converse.toml` or `./.converse.toml`
//! 4. Global: `$XDG_CONFIG_HOME/bedrock-converse/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    DEFAULT_MODEL_ID, FileBedrockConfig, FileConfig, FileHistoryConfig, FileLoggingConfig,
    FileModelConfig, FileRetryConfig,
};
pub use loader::ConfigLoader;
