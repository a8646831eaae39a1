//! Converse use case.
//!
//! Runs one conversational turn against a model backend:
//!
//! 1. Render the prompt (template, variables, optional few-shot block)
//! 2. Merge it with conversation history and parse the result
//! 3. Try the structured protocol, retrying throttled calls
//! 4. Fall back to the vendor's raw completion protocol on failure
//! 5. Record the turn in history (streams once the caller has drained them)

use crate::config::{RetryPolicy, SessionConfig};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::model_invoker::{InvocationError, ModelInvoker, StreamHandle};
use crate::use_cases::retry::retry_on_throttle;
use converse_domain::{
    ConversationHistory, ConverseRequest, DomainError, ModelConfig, ParsedPrompt, PromptTemplate,
    RenderExamples, Role, Variables,
};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by [`ConverseUseCase::converse`].
///
/// Structured-protocol failures never appear here; they trigger the raw
/// fallback instead.
#[derive(Error, Debug)]
pub enum ConverseError {
    #[error("Invalid input: {0}")]
    Validation(DomainError),

    #[error("Raw completion failed: {0}")]
    Raw(#[source] InvocationError),

    #[error("{0}")]
    Decode(DomainError),
}

impl From<DomainError> for ConverseError {
    fn from(err: DomainError) -> Self {
        if err.is_validation() {
            ConverseError::Validation(err)
        } else {
            ConverseError::Decode(err)
        }
    }
}

/// Wire protocol used for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Role-tagged message list plus separate system block.
    Structured,
    /// Single flattened prompt in the vendor's own convention.
    Raw,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Structured => "structured",
            Protocol::Raw => "raw",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prompt source for a turn.
#[derive(Debug, Clone)]
pub enum PromptInput {
    /// Markup text. Text without any role tag is sent as a user turn.
    Text(String),
    Template(PromptTemplate),
}

impl From<&str> for PromptInput {
    fn from(text: &str) -> Self {
        PromptInput::Text(text.to_string())
    }
}

impl From<String> for PromptInput {
    fn from(text: String) -> Self {
        PromptInput::Text(text)
    }
}

impl From<PromptTemplate> for PromptInput {
    fn from(template: PromptTemplate) -> Self {
        PromptInput::Template(template)
    }
}

/// Input for [`ConverseUseCase::converse`].
#[derive(Clone)]
pub struct ConverseInput {
    pub prompt: PromptInput,
    pub model: ModelConfig,
    pub variables: Variables,
    pub few_shot: Option<Arc<dyn RenderExamples>>,
    pub stream: bool,
    /// `None` uses the session default.
    pub include_history: Option<bool>,
    pub should_retry: bool,
}

impl ConverseInput {
    pub fn new(prompt: impl Into<PromptInput>, model: ModelConfig) -> Self {
        Self {
            prompt: prompt.into(),
            model,
            variables: Variables::new(),
            few_shot: None,
            stream: false,
            include_history: None,
            should_retry: true,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_few_shot(mut self, few_shot: Arc<dyn RenderExamples>) -> Self {
        self.few_shot = Some(few_shot);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_history(mut self, include: bool) -> Self {
        self.include_history = Some(include);
        self
    }

    pub fn with_retry(mut self, should_retry: bool) -> Self {
        self.should_retry = should_retry;
        self
    }
}

/// Reply produced by a turn.
#[derive(Debug)]
pub enum ConverseOutput {
    Text(String),
    /// Lazy, single-pass chunk sequence. History is not updated until the
    /// caller hands the drained text to [`ConverseUseCase::record_streamed`].
    Stream(StreamHandle),
}

impl ConverseOutput {
    /// Returns the reply text for non-streaming output.
    pub fn text(&self) -> Option<&str> {
        match self {
            ConverseOutput::Text(text) => Some(text),
            ConverseOutput::Stream(_) => None,
        }
    }

    /// Resolve to the full reply text, draining a stream if necessary.
    pub async fn into_text(self) -> Result<String, InvocationError> {
        match self {
            ConverseOutput::Text(text) => Ok(text),
            ConverseOutput::Stream(handle) => handle.collect_text().await,
        }
    }
}

/// The conversation dispatcher.
///
/// Owns the session's [`ConversationHistory`]. `converse` takes `&mut self`,
/// so one turn's history reads and writes never interleave with another's.
pub struct ConverseUseCase {
    invoker: Arc<dyn ModelInvoker>,
    history: ConversationHistory,
    config: SessionConfig,
    conversation_logger: Arc<dyn ConversationLogger>,
    pending_stream: Option<PendingStream>,
}

/// The last streamed turn, kept until its reply has been drained.
struct PendingStream {
    protocol: Protocol,
    model: ModelConfig,
    prompt: String,
    new_messages: ParsedPrompt,
}

impl ConverseUseCase {
    pub fn new(invoker: Arc<dyn ModelInvoker>, config: SessionConfig) -> Self {
        Self {
            invoker,
            history: ConversationHistory::new(config.max_history_messages),
            config,
            conversation_logger: Arc::new(NoConversationLogger),
            pending_stream: None,
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Mutable access, e.g. to append a reply accumulated from a stream.
    pub fn history_mut(&mut self) -> &mut ConversationHistory {
        &mut self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.pending_stream = None;
    }

    /// Parse markup text without running a turn.
    pub fn parse(&self, text: &str) -> ParsedPrompt {
        ParsedPrompt::parse(text)
    }

    /// Run one turn.
    pub async fn converse(&mut self, input: ConverseInput) -> Result<ConverseOutput, ConverseError> {
        self.pending_stream = None;
        input.model.validate()?;

        let prompt_text = render_prompt(&input)?;
        let new_messages = ParsedPrompt::parse(&prompt_text);

        let include_history = input.include_history.unwrap_or(self.config.include_history);
        let full_prompt = if include_history && !self.history.is_blank() {
            ParsedPrompt::parse(&format!("{}\n{}", self.history.to_markup(), prompt_text))
        } else {
            new_messages.clone()
        };

        let family = input.model.family();
        let use_structured = !full_prompt.ends_with_assistant() || family.prefers_structured();
        debug!(
            model = %input.model.model_id,
            %family,
            users = full_prompt.user.len(),
            assistants = full_prompt.assistant.len(),
            use_structured,
            "Selecting protocol"
        );

        if use_structured {
            match self.try_structured(&input, &full_prompt).await {
                Ok(ConverseOutput::Text(reply)) => {
                    self.record_turn(&new_messages, &reply);
                    self.log_turn(Protocol::Structured, &input.model, &prompt_text, &reply);
                    return Ok(ConverseOutput::Text(reply));
                }
                Ok(stream) => {
                    self.pending_stream = Some(PendingStream {
                        protocol: Protocol::Structured,
                        model: input.model.clone(),
                        prompt: prompt_text,
                        new_messages,
                    });
                    return Ok(stream);
                }
                Err(e) => {
                    warn!(model = %input.model.model_id, error = %e, "Structured call failed, falling back to raw completion");
                    self.conversation_logger.log(ConversationEvent::new(
                        "structured_fallback",
                        json!({
                            "model": input.model.model_id,
                            "error": e.to_string(),
                        }),
                    ));
                }
            }
        }

        let formatter = family.formatter();
        let body = formatter.encode_request_body(&full_prompt, &input.model);
        info!(model = %input.model.model_id, %family, "Using raw completion protocol");

        if input.stream {
            let handle = self
                .invoker
                .invoke_raw_stream(&input.model.model_id, &body)
                .await
                .map_err(ConverseError::Raw)?;
            self.pending_stream = Some(PendingStream {
                protocol: Protocol::Raw,
                model: input.model.clone(),
                prompt: prompt_text,
                new_messages,
            });
            return Ok(ConverseOutput::Stream(handle));
        }

        let bytes = self
            .invoker
            .invoke_raw(&input.model.model_id, &body)
            .await
            .map_err(ConverseError::Raw)?;
        let reply = formatter.decode_response_bytes(&bytes)?;

        self.history.add_message(Role::Assistant, reply.clone());
        self.log_turn(Protocol::Raw, &input.model, &prompt_text, &reply);
        Ok(ConverseOutput::Text(reply))
    }

    async fn try_structured(
        &self,
        input: &ConverseInput,
        full_prompt: &ParsedPrompt,
    ) -> Result<ConverseOutput, InvocationError> {
        let request = ConverseRequest::from_parsed(full_prompt, &input.model);
        let policy = if input.should_retry {
            self.config.retry
        } else {
            RetryPolicy::none()
        };
        let invoker = self.invoker.as_ref();
        let request = &request;

        if input.stream {
            let handle =
                retry_on_throttle(&policy, move || invoker.invoke_structured_stream(request))
                    .await?;
            Ok(ConverseOutput::Stream(handle))
        } else {
            let text = retry_on_throttle(&policy, move || invoker.invoke_structured(request)).await?;
            Ok(ConverseOutput::Text(text))
        }
    }

    /// Record the last streamed turn once the caller has drained the stream.
    ///
    /// The rendered prompt that was actually sent is appended, followed by
    /// `reply`. Raw-protocol chunks are undecoded vendor payloads, so those
    /// turns are not recorded. Returns whether history changed.
    pub fn record_streamed(&mut self, reply: &str) -> bool {
        let Some(pending) = self.pending_stream.take() else {
            return false;
        };
        if pending.protocol == Protocol::Raw {
            debug!(model = %pending.model.model_id, "Raw stream reply not recorded");
            return false;
        }

        self.record_turn(&pending.new_messages, reply);
        self.log_turn(pending.protocol, &pending.model, &pending.prompt, reply);
        true
    }

    /// Append the new turn (not the history it was merged with) and the reply.
    fn record_turn(&mut self, new_messages: &ParsedPrompt, reply: &str) {
        if !new_messages.system.is_empty() {
            self.history
                .add_message(Role::System, new_messages.system.clone());
        }
        for (i, user) in new_messages.user.iter().enumerate() {
            self.history.add_message(Role::User, user.clone());
            if let Some(assistant) = new_messages.assistant.get(i) {
                self.history.add_message(Role::Assistant, assistant.clone());
            }
        }
        self.history.add_message(Role::Assistant, reply);
    }

    fn log_turn(&self, protocol: Protocol, model: &ModelConfig, prompt: &str, reply: &str) {
        self.conversation_logger.log(ConversationEvent::new(
            "turn_completed",
            json!({
                "protocol": protocol.as_str(),
                "model": model.model_id,
                "prompt": prompt,
                "response": reply,
            }),
        ));
    }
}

/// Render template, variables and few-shot block into markup text.
///
/// Unknown `<<word>>` tags are rejected only in input that already uses role
/// tags; untagged text is a single user turn and is sent as written.
fn render_prompt(input: &ConverseInput) -> Result<String, DomainError> {
    let (template, tagged) = match &input.prompt {
        PromptInput::Text(text) => {
            if ParsedPrompt::has_role_tag(text) {
                (PromptTemplate::new("inline", text.clone())?, true)
            } else {
                (PromptTemplate::new("inline", format!("<<user>>\n{text}"))?, false)
            }
        }
        PromptInput::Template(template) => {
            (template.clone(), ParsedPrompt::has_role_tag(template.content()))
        }
    };
    if tagged {
        ParsedPrompt::check_tags(template.content())?;
    }

    let rendered = template.render(&input.variables)?;
    match &input.few_shot {
        Some(few_shot) => Ok(format!("{}\n\n{}", few_shot.render()?, rendered)),
        None => Ok(rendered),
    }
}
