//! Agent stream events
//!
//! An agent's response is a lazy, finite, single-pass sequence of
//! [`StreamEvent`]s delivered over an mpsc channel. Dropping the receiver
//! cancels the stream cooperatively.

use crate::types::TokenUsage;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// The event sequence returned by an agent's `send_message`.
pub type EventStream = mpsc::Receiver<StreamEvent>;

/// Sender half handed to agent implementations.
pub type EventSink = mpsc::Sender<StreamEvent>;

/// Default channel capacity for agent event streams.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Create a connected (sink, stream) pair with the default capacity.
pub fn event_channel() -> (EventSink, EventStream) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}

/// What kind of user input an [`InputRequest`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Binary approve/reject decision. Requires exactly two choices.
    Approval,
    /// Pick one of N choices, or reject. Requires at least two choices.
    Choice,
    /// Free-form non-empty text, or reject.
    Text,
}

/// The outcome of an interactive input request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResponse {
    Approve,
    Reject,
    Choice { index: usize, value: String },
    Text(String),
}

/// One-shot sink the stream processor resolves exactly once per request.
///
/// The sender side is owned by the agent that emitted the request; the
/// processor consumes it when the user answers.
pub type ResponseHandle = oneshot::Sender<InputResponse>;

/// An interactive pause emitted mid-stream by an agent.
#[derive(Debug)]
pub struct InputRequest {
    pub prompt: String,
    pub input_type: InputKind,
    pub choices: Vec<String>,
    /// Absent handles are logged and skipped by the processor.
    pub response_handle: Option<ResponseHandle>,
}

/// One step of an agent's incremental response.
#[derive(Debug)]
pub enum StreamEvent {
    /// A fragment of assistant text.
    TextDelta { text: String },

    /// The agent started invoking a tool.
    ToolUseStart {
        name: String,
        id: String,
        input: Value,
    },

    /// A tool finished and produced output.
    ToolResult {
        name: String,
        id: String,
        result: String,
        is_error: bool,
    },

    /// Token accounting for the response so far.
    Usage {
        input_tokens: u64,
        output_tokens: u64,
    },

    /// An agent-side failure. Fatal errors terminate the stream.
    Error { message: String, fatal: bool },

    /// The agent needs a user decision before it can continue.
    InputRequest(InputRequest),
}

impl StreamEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    pub fn usage(usage: TokenUsage) -> Self {
        Self::Usage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }

    pub fn error(message: impl Into<String>, fatal: bool) -> Self {
        Self::Error {
            message: message.into(),
            fatal,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_channel_is_single_pass() {
        let (tx, mut rx) = event_channel();
        tx.send(StreamEvent::text("a")).await.unwrap();
        drop(tx);

        assert!(matches!(
            rx.recv().await,
            Some(StreamEvent::TextDelta { text }) if text == "a"
        ));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_response_handle_resolves_once() {
        let (tx, rx) = oneshot::channel();
        let request = InputRequest {
            prompt: "Proceed?".to_string(),
            input_type: InputKind::Approval,
            choices: vec!["Approve".to_string(), "Reject".to_string()],
            response_handle: Some(tx),
        };

        let handle = request.response_handle.unwrap();
        handle.send(InputResponse::Approve).unwrap();
        assert_eq!(rx.await.unwrap(), InputResponse::Approve);
    }
}
