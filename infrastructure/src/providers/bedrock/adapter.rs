//! Bedrock model invoker
//!
//! Implements [`ModelInvoker`] over the Bedrock Runtime client: `Converse` /
//! `ConverseStream` for the structured protocol and `InvokeModel` /
//! `InvokeModelWithResponseStream` for vendor-specific bodies.

use super::types;
use crate::config::FileBedrockConfig;
use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::ResponseStream;
use aws_smithy_types::Blob;
use converse_application::{InvocationError, ModelInvoker, StreamHandle};
use converse_domain::{ConverseRequest, StreamEvent};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

const JSON_CONTENT_TYPE: &str = "application/json";
const STREAM_BUFFER: usize = 64;

pub struct BedrockModelInvoker {
    client: Arc<BedrockClient>,
    region: String,
}

impl BedrockModelInvoker {
    /// Resolve AWS credentials for the configured region and profile and
    /// create a Bedrock Runtime client.
    pub async fn new(config: &FileBedrockConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(profile) = config.profile_name() {
            loader = loader.profile_name(profile);
        }

        let aws_config = loader.load().await;
        info!(region = %config.region, "Bedrock client initialized");

        Self {
            client: Arc::new(BedrockClient::new(&aws_config)),
            region: config.region.clone(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn encode_body(body: &Value) -> Result<Blob, InvocationError> {
        serde_json::to_vec(body)
            .map(Blob::new)
            .map_err(|e| InvocationError::RequestFailed(format!("Failed to encode body: {}", e)))
    }
}

#[async_trait]
impl ModelInvoker for BedrockModelInvoker {
    async fn invoke_structured(&self, request: &ConverseRequest) -> Result<String, InvocationError> {
        debug!(
            model = %request.model_id,
            messages = request.messages.len(),
            "Calling Bedrock Converse API"
        );

        let response = self
            .client
            .converse()
            .model_id(&request.model_id)
            .set_system(Some(types::system_blocks(request)))
            .set_messages(Some(types::convert_messages(request)?))
            .inference_config(types::inference_config(&request.inference))
            .send()
            .await
            .map_err(types::convert_sdk_error)?;

        let output = response.output().ok_or_else(|| {
            InvocationError::RequestFailed("No output in Bedrock response".to_string())
        })?;
        types::output_text(output)
    }

    async fn invoke_structured_stream(
        &self,
        request: &ConverseRequest,
    ) -> Result<StreamHandle, InvocationError> {
        debug!(model = %request.model_id, "Calling Bedrock ConverseStream API");

        let mut output = self
            .client
            .converse_stream()
            .model_id(&request.model_id)
            .set_system(Some(types::system_blocks(request)))
            .set_messages(Some(types::convert_messages(request)?))
            .inference_config(types::inference_config(&request.inference))
            .send()
            .await
            .map_err(types::convert_sdk_error)?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            loop {
                let event = match output.stream.recv().await {
                    Ok(Some(event)) => match types::delta_text(&event) {
                        Some(text) => StreamEvent::Delta(text.to_string()),
                        None => continue,
                    },
                    Ok(None) => StreamEvent::Completed,
                    Err(e) => StreamEvent::Error(DisplayErrorContext(&e).to_string()),
                };
                let terminal = event.is_terminal();
                if tx.send(event).await.is_err() || terminal {
                    break;
                }
            }
        });

        Ok(StreamHandle::new(rx))
    }

    async fn invoke_raw(&self, model_id: &str, body: &Value) -> Result<Vec<u8>, InvocationError> {
        debug!(model = %model_id, "Calling Bedrock InvokeModel API");

        let response = self
            .client
            .invoke_model()
            .model_id(model_id)
            .content_type(JSON_CONTENT_TYPE)
            .accept(JSON_CONTENT_TYPE)
            .body(Self::encode_body(body)?)
            .send()
            .await
            .map_err(types::convert_sdk_error)?;

        Ok(response.body.into_inner())
    }

    async fn invoke_raw_stream(
        &self,
        model_id: &str,
        body: &Value,
    ) -> Result<StreamHandle, InvocationError> {
        debug!(model = %model_id, "Calling Bedrock InvokeModelWithResponseStream API");

        let mut output = self
            .client
            .invoke_model_with_response_stream()
            .model_id(model_id)
            .content_type(JSON_CONTENT_TYPE)
            .accept(JSON_CONTENT_TYPE)
            .body(Self::encode_body(body)?)
            .send()
            .await
            .map_err(types::convert_sdk_error)?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            loop {
                let event = match output.body.recv().await {
                    Ok(Some(ResponseStream::Chunk(part))) => match part.bytes() {
                        Some(bytes) => {
                            StreamEvent::Delta(String::from_utf8_lossy(bytes.as_ref()).into_owned())
                        }
                        None => continue,
                    },
                    Ok(Some(_)) => continue,
                    Ok(None) => StreamEvent::Completed,
                    Err(e) => StreamEvent::Error(DisplayErrorContext(&e).to_string()),
                };
                let terminal = event.is_terminal();
                if tx.send(event).await.is_err() || terminal {
                    break;
                }
            }
        });

        Ok(StreamHandle::new(rx))
    }
}
