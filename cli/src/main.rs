//! CLI entrypoint for bedrock-converse
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use converse_application::{
    ConversationLogger, ConverseInput, ConverseOutput, ConverseUseCase, NoConversationLogger,
};
use converse_infrastructure::{BedrockModelInvoker, ConfigLoader, FileConfig, JsonlConversationLogger};
use converse_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputFormat, ProgressReporter, print_stream,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    let config = load_config(&cli)?;
    info!(model = %config.model.id, region = %config.bedrock.region, "Starting bedrock-converse");

    let model = cli.model_config(config.model.to_model_config());
    model.validate()?;

    // === Dependency Injection ===
    let invoker = Arc::new(BedrockModelInvoker::new(&config.bedrock).await);
    let mut use_case = ConverseUseCase::new(invoker, config.to_session_config())
        .with_conversation_logger(conversation_logger(&config));

    let include_history = cli.no_history.then_some(false);

    // Chat mode
    if cli.chat {
        let mut repl = ChatRepl::new(use_case, model)
            .with_variables(cli.variables())
            .with_stream(cli.stream)
            .with_retry(!cli.no_retry)
            .with_history(include_history)
            .with_progress(!cli.quiet);

        repl.run().await?;
        return Ok(());
    }

    // One-shot mode - prompt is required
    let Some(prompt) = cli.prompt.clone() else {
        bail!("A prompt is required. Use --chat for interactive mode.");
    };

    let mut input = ConverseInput::new(prompt, model.clone())
        .with_variables(cli.variables())
        .with_stream(cli.stream)
        .with_retry(!cli.no_retry);
    if let Some(include) = include_history {
        input = input.with_history(include);
    }

    let progress = ProgressReporter::for_mode(&model.model_id, cli.quiet);
    let output = match use_case.converse(input).await {
        Ok(output) => {
            progress.finish();
            output
        }
        Err(e) => {
            progress.fail(&e.to_string());
            return Err(e.into());
        }
    };

    match (output, cli.output) {
        (ConverseOutput::Stream(handle), OutputFormat::Text) => {
            print_stream(handle).await;
        }
        (output, OutputFormat::Text) => {
            let reply = output.into_text().await?;
            print!("{}", ConsoleFormatter::format_reply(&reply));
        }
        (output, OutputFormat::Json) => {
            let reply = output.into_text().await?;
            println!("{}", ConsoleFormatter::format_json(&model.model_id, &reply));
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };

    let issues = config.validate();
    if !issues.is_empty() {
        eprint!("{}", ConsoleFormatter::format_issues(&issues));
    }
    if issues.iter().any(|issue| issue.is_error()) {
        bail!("Configuration is invalid");
    }

    Ok(config)
}

fn conversation_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    let Some(path) = &config.logging.conversation_log else {
        return Arc::new(NoConversationLogger);
    };

    match JsonlConversationLogger::open(path) {
        Ok(logger) => {
            info!(path = %logger.path().display(), "Writing conversation transcript");
            Arc::new(logger)
        }
        Err(e) => {
            warn!("Could not open conversation log {}: {}", path.display(), e);
            Arc::new(NoConversationLogger)
        }
    }
}
