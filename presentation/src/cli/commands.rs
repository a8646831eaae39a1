//! CLI command definitions

use clap::{Parser, ValueEnum};
use converse_domain::{ModelConfig, Variables};
use std::path::PathBuf;

/// Output format for one-shot replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain reply text
    Text,
    /// JSON object with model and reply
    Json,
}

/// CLI arguments for bedrock-converse
#[derive(Parser, Debug)]
#[command(name = "bedrock-converse")]
#[command(author, version, about = "Chat with AWS Bedrock models using a tagged prompt markup")]
#[command(long_about = r#"
bedrock-converse sends prompts to models hosted on AWS Bedrock.

Prompts may carry role tags to script a conversation:

  <<system>> You are terse. <<user>> Hi <<assistant>> Hello! <<user>> Bye

Untagged text is a single user message. `{{name}}` placeholders are
filled from --var name=value.

Configuration files are loaded from (in priority order):
1. BEDROCK_CONVERSE_<SECTION>__<KEY>   Environment variables
2. --config <path>                     Explicit config file
3. ./converse.toml or ./.converse.toml Project-level config
4. ~/.config/bedrock-converse/config.toml  Global config

Example:
  bedrock-converse "Explain the borrow checker in one sentence"
  bedrock-converse -m meta.llama3-8b-instruct-v1:0 --stream "Write a haiku about {{topic}}" --var topic=rust
  bedrock-converse --chat -m amazon.nova-lite-v1:0
"#)]
pub struct Cli {
    /// The prompt to send (not required in chat mode)
    pub prompt: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Bedrock model identifier
    #[arg(short, long, value_name = "MODEL_ID")]
    pub model: Option<String>,

    /// Maximum number of generated tokens
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature in [0, 1]
    #[arg(long, value_name = "T")]
    pub temperature: Option<f64>,

    /// Nucleus sampling threshold in [0, 1]
    #[arg(long, value_name = "P")]
    pub top_p: Option<f64>,

    /// Template variable, as name=value (can be specified multiple times)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_variable)]
    pub vars: Vec<(String, String)>,

    /// Print the reply as it is generated
    #[arg(short, long)]
    pub stream: bool,

    /// Do not send earlier turns along with the prompt
    #[arg(long)]
    pub no_history: bool,

    /// Skip throttling retries and fall back to the raw completion API immediately
    #[arg(long)]
    pub no_retry: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the configured model.
    pub fn model_config(&self, base: ModelConfig) -> ModelConfig {
        let mut config = base;
        if let Some(id) = &self.model {
            config.model_id = id.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(top_p) = self.top_p {
            config = config.with_top_p(top_p);
        }
        config
    }

    /// Template variables from every `--var`; later values win.
    pub fn variables(&self) -> Variables {
        self.vars.iter().cloned().collect()
    }
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("variable name must not be empty".to_string());
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_no_retry_help_describes_fallback() {
        let command = Cli::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == "no_retry")
            .unwrap();
        let help = arg.get_help().unwrap().to_string();
        assert!(help.contains("fall back to the raw completion API"));
    }

    #[test]
    fn test_one_shot_flags() {
        let cli = Cli::try_parse_from([
            "bedrock-converse",
            "-m",
            "mistral.mistral-7b-instruct-v0:2",
            "--temperature",
            "0.4",
            "--var",
            "topic=rust",
            "--var",
            "tone=dry=ish",
            "--stream",
            "--no-retry",
            "Tell me about {{topic}}",
        ])
        .unwrap();

        assert_eq!(cli.prompt.as_deref(), Some("Tell me about {{topic}}"));
        assert!(cli.stream);
        assert!(cli.no_retry);
        assert!(!cli.no_history);
        assert_eq!(cli.output, OutputFormat::Text);

        let vars = cli.variables();
        assert_eq!(vars["topic"], "rust");
        assert_eq!(vars["tone"], "dry=ish");

        let model = cli.model_config(ModelConfig::new("anthropic.claude-3-haiku-20240307-v1:0"));
        assert_eq!(model.model_id, "mistral.mistral-7b-instruct-v0:2");
        assert_eq!(model.temperature, 0.4);
        assert_eq!(model.max_tokens, 512);
    }

    #[test]
    fn test_chat_without_prompt() {
        let cli = Cli::try_parse_from(["bedrock-converse", "--chat", "-vv"]).unwrap();
        assert!(cli.chat);
        assert!(cli.prompt.is_none());
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_variable() {
        assert_eq!(
            parse_variable("a=b"),
            Ok(("a".to_string(), "b".to_string()))
        );
        assert_eq!(parse_variable("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_variable("novalue").is_err());
        assert!(parse_variable("=x").is_err());
    }

    #[test]
    fn test_bad_var_is_rejected_by_clap() {
        assert!(Cli::try_parse_from(["bedrock-converse", "--var", "oops", "hi"]).is_err());
    }
}
