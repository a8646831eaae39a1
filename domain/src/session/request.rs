//! Vendor-agnostic request for the structured conversational protocol.

use super::entities::Message;
use crate::core::model::ModelConfig;
use crate::prompt::markup::ParsedPrompt;
use serde::{Deserialize, Serialize};

/// The three sampling knobs every backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl From<&ModelConfig> for InferenceConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }
}

/// A structured conversational call: alternating messages plus an optional
/// system block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverseRequest {
    pub model_id: String,
    pub messages: Vec<Message>,
    pub system: Option<String>,
    pub inference: InferenceConfig,
}

impl ConverseRequest {
    /// Build the request from a parsed prompt.
    ///
    /// Each user segment is followed by the assistant segment at the same
    /// position, when there is one. Assistant segments without a matching
    /// user segment are not sent. An empty system segment is omitted.
    pub fn from_parsed(parsed: &ParsedPrompt, config: &ModelConfig) -> Self {
        let messages = parsed
            .user
            .iter()
            .enumerate()
            .flat_map(|(i, user)| {
                std::iter::once(Message::user(user.as_str()))
                    .chain(parsed.assistant.get(i).map(|a| Message::assistant(a.as_str())))
            })
            .collect();

        let system = (!parsed.system.is_empty()).then(|| parsed.system.clone());

        Self {
            model_id: config.model_id.clone(),
            messages,
            system,
            inference: InferenceConfig::from(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::entities::Role;

    #[test]
    fn test_messages_alternate() {
        let parsed = ParsedPrompt::parse("<<system>>S<<user>>a<<assistant>>b<<user>>c");
        let config = ModelConfig::new("anthropic.claude-3-haiku-20240307-v1:0");
        let request = ConverseRequest::from_parsed(&parsed, &config);

        let roles: Vec<Role> = request.messages.iter().map(|m| m.role()).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(request.messages[2].content(), "c");
        assert_eq!(request.system.as_deref(), Some("S"));
        assert_eq!(request.inference.max_tokens, 512);
    }

    #[test]
    fn test_unpaired_assistant_is_not_sent() {
        let parsed = ParsedPrompt::parse("<<assistant>>a<<assistant>>b<<user>>u");
        let request = ConverseRequest::from_parsed(&parsed, &ModelConfig::new("amazon.nova-pro-v1:0"));
        assert_eq!(
            request.messages,
            vec![Message::user("u"), Message::assistant("a")]
        );
    }

    #[test]
    fn test_empty_system_is_omitted() {
        let parsed = ParsedPrompt::parse("hello");
        let request = ConverseRequest::from_parsed(&parsed, &ModelConfig::new("amazon.nova-lite-v1:0"));
        assert_eq!(request.system, None);
        assert_eq!(request.messages, vec![Message::user("hello")]);
    }
}
