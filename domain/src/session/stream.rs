//! Streaming events for model responses.
//!
//! [`StreamEvent`] represents one item of a streaming response, whether it
//! came from the structured conversational API or the raw completion API.

/// An event in a streaming model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text fragment from the model.
    Delta(String),
    /// The transport reported the end of the response.
    Completed,
    /// An error that occurred mid-stream.
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event signals the end of the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed | StreamEvent::Error(_))
    }
}
