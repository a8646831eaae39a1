//! Type conversions between the AWS Bedrock SDK and domain types
//!
//! Builds Converse API messages from a [`ConverseRequest`] and maps SDK
//! failures onto [`InvocationError`].

use aws_sdk_bedrockruntime::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_bedrockruntime::types as bedrock;
use converse_application::InvocationError;
use converse_domain::{ConverseRequest, InferenceConfig, Message, Role};

// ─── Domain → Bedrock ────────────────────────────────────────────

fn convert_role(role: Role) -> bedrock::ConversationRole {
    match role {
        Role::Assistant => bedrock::ConversationRole::Assistant,
        // System text travels in its own block; anything else is a user turn
        Role::User | Role::System => bedrock::ConversationRole::User,
    }
}

/// Convert a domain message to a Bedrock message with a single text block.
pub fn convert_message(message: &Message) -> Result<bedrock::Message, InvocationError> {
    bedrock::Message::builder()
        .role(convert_role(message.role()))
        .content(bedrock::ContentBlock::Text(message.content().to_string()))
        .build()
        .map_err(|e| InvocationError::RequestFailed(format!("Failed to build message: {}", e)))
}

pub fn convert_messages(request: &ConverseRequest) -> Result<Vec<bedrock::Message>, InvocationError> {
    request.messages.iter().map(convert_message).collect()
}

/// System prompt as a block list; empty when the request carries none.
pub fn system_blocks(request: &ConverseRequest) -> Vec<bedrock::SystemContentBlock> {
    request
        .system
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| bedrock::SystemContentBlock::Text(s.clone()))
        .collect()
}

pub fn inference_config(config: &InferenceConfig) -> bedrock::InferenceConfiguration {
    bedrock::InferenceConfiguration::builder()
        .max_tokens(i32::try_from(config.max_tokens).unwrap_or(i32::MAX))
        .temperature(config.temperature as f32)
        .top_p(config.top_p as f32)
        .build()
}

// ─── Bedrock → Domain ────────────────────────────────────────────

/// Text of the first text block of a Converse reply.
pub fn output_text(output: &bedrock::ConverseOutput) -> Result<String, InvocationError> {
    let bedrock::ConverseOutput::Message(message) = output else {
        return Err(InvocationError::RequestFailed(
            "Bedrock reply carried no message".to_string(),
        ));
    };

    message
        .content()
        .iter()
        .find_map(|block| block.as_text().ok())
        .cloned()
        .ok_or_else(|| {
            InvocationError::RequestFailed("Bedrock reply carried no text block".to_string())
        })
}

/// Text carried by a streaming delta, if any.
pub fn delta_text(event: &bedrock::ConverseStreamOutput) -> Option<&str> {
    match event {
        bedrock::ConverseStreamOutput::ContentBlockDelta(delta) => match delta.delta()? {
            bedrock::ContentBlockDelta::Text(text) => Some(text.as_str()),
            _ => None,
        },
        _ => None,
    }
}

// ─── Errors ──────────────────────────────────────────────────────

/// Map a Bedrock service error code onto an invocation error.
pub fn classify_error_code(code: &str, message: &str) -> InvocationError {
    match code {
        "ThrottlingException" | "ServiceQuotaExceededException" => {
            InvocationError::Throttled(message.to_string())
        }
        "ModelTimeoutException" => InvocationError::Timeout,
        "ModelNotReadyException" | "ResourceNotFoundException" => {
            InvocationError::ModelNotAvailable(message.to_string())
        }
        "" => InvocationError::RequestFailed(message.to_string()),
        other => InvocationError::RequestFailed(format!("{}: {}", other, message)),
    }
}

/// Convert any Bedrock SDK error to an [`InvocationError`].
pub fn convert_sdk_error<E, R>(err: SdkError<E, R>) -> InvocationError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(service) => {
            let inner = service.err();
            classify_error_code(
                inner.code().unwrap_or_default(),
                inner.message().unwrap_or_default(),
            )
        }
        SdkError::TimeoutError(_) => InvocationError::Timeout,
        SdkError::DispatchFailure(_) => {
            InvocationError::ConnectionError(DisplayErrorContext(&err).to_string())
        }
        _ => InvocationError::RequestFailed(DisplayErrorContext(&err).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converse_domain::{ModelConfig, ParsedPrompt};

    fn request(markup: &str) -> ConverseRequest {
        ConverseRequest::from_parsed(
            &ParsedPrompt::parse(markup),
            &ModelConfig::new("anthropic.claude-3-haiku-20240307-v1:0"),
        )
    }

    #[test]
    fn test_convert_messages_keeps_roles() {
        let messages = convert_messages(&request("<<user>>a<<assistant>>b<<user>>c")).unwrap();
        let roles: Vec<_> = messages.iter().map(|m| m.role().clone()).collect();
        assert_eq!(
            roles,
            vec![
                bedrock::ConversationRole::User,
                bedrock::ConversationRole::Assistant,
                bedrock::ConversationRole::User,
            ]
        );
        assert_eq!(messages[2].content()[0].as_text().unwrap(), "c");
    }

    #[test]
    fn test_system_blocks() {
        assert_eq!(system_blocks(&request("<<system>>Be brief<<user>>hi")).len(), 1);
        assert!(system_blocks(&request("hi")).is_empty());
    }

    #[test]
    fn test_inference_config() {
        let config = inference_config(&InferenceConfig {
            max_tokens: 256,
            temperature: 0.5,
            top_p: 0.9,
        });
        assert_eq!(config.max_tokens(), Some(256));
        assert_eq!(config.temperature(), Some(0.5));
    }

    #[test]
    fn test_output_text_takes_first_text_block() {
        let message = bedrock::Message::builder()
            .role(bedrock::ConversationRole::Assistant)
            .content(bedrock::ContentBlock::Text("Hello".to_string()))
            .content(bedrock::ContentBlock::Text("ignored".to_string()))
            .build()
            .unwrap();
        let output = bedrock::ConverseOutput::Message(message);
        assert_eq!(output_text(&output).unwrap(), "Hello");
    }

    #[test]
    fn test_delta_text() {
        let event = bedrock::ConverseStreamOutput::ContentBlockDelta(
            bedrock::ContentBlockDeltaEvent::builder()
                .content_block_index(0)
                .delta(bedrock::ContentBlockDelta::Text("chunk".to_string()))
                .build()
                .unwrap(),
        );
        assert_eq!(delta_text(&event), Some("chunk"));
    }

    #[test]
    fn test_classify_error_code() {
        assert!(classify_error_code("ThrottlingException", "Too many requests").is_throttling());
        assert_eq!(
            classify_error_code("ModelTimeoutException", "slow"),
            InvocationError::Timeout
        );
        assert!(matches!(
            classify_error_code("ResourceNotFoundException", "no such model"),
            InvocationError::ModelNotAvailable(_)
        ));
        assert_eq!(
            classify_error_code("ValidationException", "bad body"),
            InvocationError::RequestFailed("ValidationException: bad body".to_string())
        );
    }
}
