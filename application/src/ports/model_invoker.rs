//! Model invocation port
//!
//! Defines the interface for sending requests to a model backend, using
//! either the structured conversational protocol or the raw completion
//! protocol.

use async_trait::async_trait;
use converse_domain::{ConverseRequest, StreamEvent};
use futures::Stream;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors reported by a model backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    #[error("Throttled: {0}")]
    Throttled(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Stream error: {0}")]
    Stream(String),
}

impl InvocationError {
    /// Check if the backend asked us to slow down
    pub fn is_throttling(&self) -> bool {
        matches!(self, InvocationError::Throttled(_))
    }
}

/// Backend capable of running a model
///
/// This port defines how the application layer reaches a model backend.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Send a structured conversational request and return the reply text.
    async fn invoke_structured(&self, request: &ConverseRequest) -> Result<String, InvocationError>;

    /// Send a structured conversational request and stream the reply.
    ///
    /// Default implementation calls `invoke_structured()` and yields the
    /// whole reply as a single chunk.
    async fn invoke_structured_stream(
        &self,
        request: &ConverseRequest,
    ) -> Result<StreamHandle, InvocationError> {
        let text = self.invoke_structured(request).await?;
        Ok(StreamHandle::from_chunks([text]))
    }

    /// Send a vendor-specific completion body and return the raw response bytes.
    async fn invoke_raw(&self, model_id: &str, body: &Value) -> Result<Vec<u8>, InvocationError>;

    /// Send a vendor-specific completion body and stream each response chunk
    /// as text.
    async fn invoke_raw_stream(
        &self,
        model_id: &str,
        body: &Value,
    ) -> Result<StreamHandle, InvocationError>;
}

/// Handle for receiving a streaming model response.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. Chunks are pulled one at a time;
/// dropping the handle abandons whatever the transport has not delivered yet.
#[derive(Debug)]
pub struct StreamHandle {
    receiver: mpsc::Receiver<StreamEvent>,
    finished: bool,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self {
            receiver,
            finished: false,
        }
    }

    /// A handle that yields the given chunks and then completes.
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let chunks: Vec<String> = chunks.into_iter().map(Into::into).collect();
        let (tx, rx) = mpsc::channel(chunks.len() + 1);
        for chunk in chunks {
            // Capacity covers every event
            let _ = tx.try_send(StreamEvent::Delta(chunk));
        }
        let _ = tx.try_send(StreamEvent::Completed);
        Self::new(rx)
    }

    /// Pull the next text chunk.
    ///
    /// Returns `None` once the stream has completed or the sender is gone.
    pub async fn next_chunk(&mut self) -> Option<Result<String, InvocationError>> {
        if self.finished {
            return None;
        }
        match self.receiver.recv().await {
            Some(StreamEvent::Delta(chunk)) => Some(Ok(chunk)),
            Some(StreamEvent::Error(e)) => {
                self.finished = true;
                Some(Err(InvocationError::Stream(e)))
            }
            Some(StreamEvent::Completed) | None => {
                self.finished = true;
                None
            }
        }
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, InvocationError> {
        let mut full_text = String::new();
        while let Some(chunk) = self.next_chunk().await {
            full_text.push_str(&chunk?);
        }
        Ok(full_text)
    }

    /// Adapt into a `futures::Stream` of text chunks.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, InvocationError>> + Send {
        futures::stream::unfold(self, |mut handle| async move {
            handle.next_chunk().await.map(|item| (item, handle))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_collect_text_joins_chunks() {
        let handle = StreamHandle::from_chunks(["Hel", "lo"]);
        assert_eq!(handle.collect_text().await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_next_chunk_stops_after_completed() {
        let mut handle = StreamHandle::from_chunks(["a"]);
        assert_eq!(handle.next_chunk().await, Some(Ok("a".to_string())));
        assert_eq!(handle.next_chunk().await, None);
        assert_eq!(handle.next_chunk().await, None);
    }

    #[tokio::test]
    async fn test_error_event_surfaces() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(StreamEvent::Delta("partial".to_string())).await.unwrap();
        tx.send(StreamEvent::Error("reset".to_string())).await.unwrap();
        let handle = StreamHandle::new(rx);
        assert_eq!(
            handle.collect_text().await,
            Err(InvocationError::Stream("reset".to_string()))
        );
    }

    #[tokio::test]
    async fn test_closed_channel_ends_stream() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(StreamEvent::Delta("x".to_string())).await.unwrap();
        drop(tx);
        assert_eq!(StreamHandle::new(rx).collect_text().await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_into_stream() {
        let chunks: Vec<_> = StreamHandle::from_chunks(["1", "2", "3"])
            .into_stream()
            .collect()
            .await;
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(Result::is_ok));
    }

    #[test]
    fn test_is_throttling() {
        assert!(InvocationError::Throttled("slow down".to_string()).is_throttling());
        assert!(!InvocationError::Timeout.is_throttling());
        assert!(!InvocationError::RequestFailed("400".to_string()).is_throttling());
    }
}
