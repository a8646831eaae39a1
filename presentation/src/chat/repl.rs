//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleFormatter;
use crate::ProgressReporter;
use colored::Colorize;
use converse_application::{ConverseInput, ConverseOutput, ConverseUseCase, StreamHandle};
use converse_domain::{ModelConfig, Variables};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::io::{self, Write};

const HISTORY_CAPACITY: usize = 1000;

/// What the loop should do after a slash command
#[derive(Debug, PartialEq, Eq)]
enum CommandResult {
    Continue,
    Exit,
}

/// Interactive chat REPL
pub struct ChatRepl {
    use_case: ConverseUseCase,
    model: ModelConfig,
    variables: Variables,
    stream: bool,
    retry: bool,
    include_history: Option<bool>,
    show_progress: bool,
}

impl ChatRepl {
    pub fn new(use_case: ConverseUseCase, model: ModelConfig) -> Self {
        Self {
            use_case,
            model,
            variables: Variables::new(),
            stream: false,
            retry: true,
            include_history: None,
            show_progress: true,
        }
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    /// Print replies as they are generated
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    /// Override the session's history-inclusion default
    pub fn with_history(mut self, include: Option<bool>) -> Self {
        self.include_history = include;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> io::Result<()> {
        let mut line_editor = Reedline::create();

        let history_path = dirs::data_dir().map(|p| p.join("bedrock-converse").join("history.txt"));
        if let Some(path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(history) = FileBackedHistory::with_file(HISTORY_CAPACITY, path) {
                line_editor = line_editor.with_history(Box::new(history));
            }
        }

        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(self.model.model_id.clone()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match line_editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(line) == CommandResult::Exit {
                            break;
                        }
                        continue;
                    }

                    self.process_prompt(line).await;
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│         Bedrock Converse - Chat Mode        │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Model: {}", self.model.model_id.bold());
        println!();
        print!("{}", Self::help_text());
        println!();
    }

    fn help_text() -> &'static str {
        "Commands:\n  \
         /help, /h, /?     - Show this help\n  \
         /history          - Show the conversation so far\n  \
         /clear            - Forget the conversation\n  \
         /quit, /exit, /q  - Exit chat\n"
    }

    fn handle_command(&mut self, cmd: &str) -> CommandResult {
        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                CommandResult::Exit
            }
            "/help" | "/h" | "/?" => {
                println!();
                print!("{}", Self::help_text());
                println!();
                CommandResult::Continue
            }
            "/history" => {
                print!("{}", ConsoleFormatter::format_history(self.use_case.history()));
                CommandResult::Continue
            }
            "/clear" => {
                self.use_case.clear_history();
                println!("{}", "History cleared.".dimmed());
                CommandResult::Continue
            }
            _ => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                CommandResult::Continue
            }
        }
    }

    fn input_for(&self, prompt: &str) -> ConverseInput {
        let mut input = ConverseInput::new(prompt, self.model.clone())
            .with_variables(self.variables.clone())
            .with_stream(self.stream)
            .with_retry(self.retry);
        if let Some(include) = self.include_history {
            input = input.with_history(include);
        }
        input
    }

    async fn process_prompt(&mut self, prompt: &str) {
        println!();

        let progress = ProgressReporter::for_mode(&self.model.model_id, !self.show_progress);
        let input = self.input_for(prompt);
        let result = self.use_case.converse(input).await;

        match result {
            Ok(ConverseOutput::Text(reply)) => {
                progress.finish();
                print!("{}", ConsoleFormatter::format_reply(&reply));
            }
            Ok(ConverseOutput::Stream(handle)) => {
                progress.finish();
                let reply = print_stream(handle).await;
                if !reply.is_empty() && !self.use_case.record_streamed(&reply) {
                    println!("{}", "(raw stream reply not added to history)".dimmed());
                }
            }
            Err(e) => {
                progress.fail(&e.to_string());
                eprintln!("{}", ConsoleFormatter::format_error(&e));
            }
        }
        println!();
    }
}

/// Echo chunks as they arrive and return everything received.
///
/// A transport error ends the reply early; the text received so far is kept.
pub async fn print_stream(mut handle: StreamHandle) -> String {
    let mut reply = String::new();
    let mut stdout = io::stdout();

    while let Some(chunk) = handle.next_chunk().await {
        match chunk {
            Ok(text) => {
                let _ = write!(stdout, "{}", text);
                let _ = stdout.flush();
                reply.push_str(&text);
            }
            Err(e) => {
                eprintln!();
                eprintln!("{}", ConsoleFormatter::format_error(&e));
                break;
            }
        }
    }

    if !reply.ends_with('\n') {
        println!();
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use converse_application::{InvocationError, ModelInvoker, SessionConfig};
    use converse_domain::ConverseRequest;
    use serde_json::Value;
    use std::sync::Arc;

    struct EchoInvoker;

    #[async_trait]
    impl ModelInvoker for EchoInvoker {
        async fn invoke_structured(
            &self,
            request: &ConverseRequest,
        ) -> Result<String, InvocationError> {
            let last = request.messages.last().map(|m| m.content()).unwrap_or_default();
            Ok(format!("echo: {}", last))
        }

        async fn invoke_raw(&self, _model_id: &str, _body: &Value) -> Result<Vec<u8>, InvocationError> {
            Err(InvocationError::RequestFailed("raw unused".to_string()))
        }

        async fn invoke_raw_stream(
            &self,
            _model_id: &str,
            _body: &Value,
        ) -> Result<StreamHandle, InvocationError> {
            Err(InvocationError::RequestFailed("raw unused".to_string()))
        }
    }

    fn repl() -> ChatRepl {
        let use_case = ConverseUseCase::new(Arc::new(EchoInvoker), SessionConfig::default());
        ChatRepl::new(use_case, ModelConfig::new("anthropic.claude-3-haiku-20240307-v1:0"))
            .with_progress(false)
    }

    #[tokio::test]
    async fn test_prompt_then_clear() {
        let mut repl = repl();
        repl.process_prompt("hello").await;
        assert_eq!(repl.use_case.history().len(), 2);
        assert_eq!(repl.use_case.history().messages()[1].content(), "echo: hello");

        assert_eq!(repl.handle_command("/clear"), CommandResult::Continue);
        assert!(repl.use_case.history().is_empty());
    }

    #[tokio::test]
    async fn test_streamed_reply_is_recorded() {
        let mut repl = repl().with_stream(true);
        repl.process_prompt("ping").await;

        let history = repl.use_case.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].content(), "ping");
        assert_eq!(history.messages()[1].content(), "echo: ping");
    }

    #[tokio::test]
    async fn test_streamed_turn_records_rendered_prompt() {
        let variables = Variables::from([("name".to_string(), "Ada".to_string())]);
        let mut repl = repl().with_stream(true).with_variables(variables);
        repl.process_prompt("<<system>>Be brief.<<user>>Greet {{name}}").await;

        let history = repl.use_case.history();
        assert_eq!(history.system_message(), Some("Be brief."));
        assert_eq!(history.messages()[0].content(), "Greet Ada");
        assert_eq!(history.messages()[1].content(), "echo: Greet Ada");
    }

    #[tokio::test]
    async fn test_print_stream_keeps_text_before_error() {
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(converse_domain::StreamEvent::Delta("part".to_string())).await.unwrap();
        tx.send(converse_domain::StreamEvent::Error("reset".to_string())).await.unwrap();
        assert_eq!(print_stream(StreamHandle::new(rx)).await, "part");
    }

    #[test]
    fn test_commands() {
        let mut repl = repl();
        assert_eq!(repl.handle_command("/quit"), CommandResult::Exit);
        assert_eq!(repl.handle_command("/q"), CommandResult::Exit);
        assert_eq!(repl.handle_command("/history"), CommandResult::Continue);
        assert_eq!(repl.handle_command("/bogus"), CommandResult::Continue);
    }

    #[test]
    fn test_input_carries_session_flags() {
        let repl = repl().with_retry(false).with_history(Some(false));
        let input = repl.input_for("x");
        assert!(!input.should_retry);
        assert_eq!(input.include_history, Some(false));
        assert!(!input.stream);
    }
}
