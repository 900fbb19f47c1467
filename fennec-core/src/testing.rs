//! Test doubles for the shell and agent contracts
//!
//! A recording shell and a scripted agent used by the crate's own tests
//! and available to embedding applications for theirs.

use crate::completer::Completer;
use crate::error::{AgentError, PluginError, ShellError};
use crate::event::{event_channel, EventStream, InputResponse, StreamEvent};
use crate::plugin::{AgentPlugin, Plugin};
use crate::shell::Shell;
use crate::types::{ConversationTurn, MessageContext};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// One recorded shell interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCall {
    ReadLine,
    Markdown(String),
    Info(String),
    Error(String),
    Dim(String),
    ToolUse { name: String, summary: Option<String> },
    ToolHeader { name: String, is_error: bool },
    ToolBody(String),
    StartSpinner,
    StopSpinner,
    StartLive,
    AppendLive(String),
    FinishLive,
    PushCollapsed(String),
    ClearCollapsed,
    PromptApproval(String),
    PromptChoice(String),
    PromptText(String),
}

/// Shell that records every call and replays scripted inputs.
#[derive(Default)]
pub struct RecordingShell {
    calls: Mutex<Vec<ShellCall>>,
    lines: Mutex<VecDeque<String>>,
    responses: Mutex<VecDeque<InputResponse>>,
    collapsed: Mutex<Vec<String>>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line for `read_line`. When exhausted, `read_line` reports EOF.
    pub fn push_line(&self, line: impl Into<String>) {
        self.lines.lock().push_back(line.into());
    }

    /// Queue a response for the next interactive prompt.
    pub fn push_response(&self, response: InputResponse) {
        self.responses.lock().push_back(response);
    }

    pub fn calls(&self) -> Vec<ShellCall> {
        self.calls.lock().clone()
    }

    pub fn collapsed(&self) -> Vec<String> {
        self.collapsed.lock().clone()
    }

    /// Count calls matching a predicate.
    pub fn count(&self, pred: impl Fn(&ShellCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: ShellCall) {
        self.calls.lock().push(call);
    }

    fn next_response(&self) -> InputResponse {
        self.responses
            .lock()
            .pop_front()
            .unwrap_or(InputResponse::Reject)
    }
}

#[async_trait]
impl Shell for RecordingShell {
    async fn read_line(&self) -> Result<String, ShellError> {
        self.record(ShellCall::ReadLine);
        self.lines.lock().pop_front().ok_or(ShellError::Eof)
    }

    fn print_markdown(&self, text: &str) {
        self.record(ShellCall::Markdown(text.to_string()));
    }

    fn print_info(&self, message: &str) {
        self.record(ShellCall::Info(message.to_string()));
    }

    fn print_error(&self, message: &str) {
        self.record(ShellCall::Error(message.to_string()));
    }

    fn print_dim(&self, text: &str) {
        self.record(ShellCall::Dim(text.to_string()));
    }

    fn print_tool_use(&self, name: &str, summary: Option<&str>) {
        self.record(ShellCall::ToolUse {
            name: name.to_string(),
            summary: summary.map(|s| s.to_string()),
        });
    }

    fn print_tool_result_header(&self, name: &str, is_error: bool) {
        self.record(ShellCall::ToolHeader {
            name: name.to_string(),
            is_error,
        });
    }

    fn print_tool_body(&self, body: &str) {
        self.record(ShellCall::ToolBody(body.to_string()));
    }

    fn start_spinner(&self) {
        self.record(ShellCall::StartSpinner);
    }

    fn stop_spinner(&self) {
        self.record(ShellCall::StopSpinner);
    }

    fn start_live(&self) {
        self.record(ShellCall::StartLive);
    }

    fn append_live(&self, text: &str) {
        self.record(ShellCall::AppendLive(text.to_string()));
    }

    fn finish_live(&self) {
        self.record(ShellCall::FinishLive);
    }

    fn push_collapsed(&self, body: String) {
        self.record(ShellCall::PushCollapsed(body.clone()));
        self.collapsed.lock().push(body);
    }

    fn clear_collapsed(&self) {
        self.record(ShellCall::ClearCollapsed);
        self.collapsed.lock().clear();
    }

    async fn prompt_approval(&self, prompt: &str, _choices: &[String]) -> InputResponse {
        self.record(ShellCall::PromptApproval(prompt.to_string()));
        self.next_response()
    }

    async fn prompt_choice(&self, prompt: &str, _choices: &[String]) -> InputResponse {
        self.record(ShellCall::PromptChoice(prompt.to_string()));
        self.next_response()
    }

    async fn prompt_text(&self, prompt: &str) -> InputResponse {
        self.record(ShellCall::PromptText(prompt.to_string()));
        self.next_response()
    }

    fn bind_completer(&self, _completer: Arc<Mutex<Completer>>) {}
}

/// Agent that replays a scripted event sequence.
pub struct ScriptedAgent {
    name: String,
    events: Mutex<VecDeque<Vec<StreamEvent>>>,
    contexts: Mutex<Vec<MessageContext>>,
    fail_send: Mutex<Option<String>>,
}

impl ScriptedAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Mutex::new(VecDeque::new()),
            contexts: Mutex::new(Vec::new()),
            fail_send: Mutex::new(None),
        }
    }

    /// Queue the event sequence for the next `send_message` call.
    pub fn script(&self, events: Vec<StreamEvent>) {
        self.events.lock().push_back(events);
    }

    /// Make the next `send_message` fail outright.
    pub fn fail_next_send(&self, message: impl Into<String>) {
        *self.fail_send.lock() = Some(message.into());
    }

    /// Message contexts received so far.
    pub fn contexts(&self) -> Vec<MessageContext> {
        self.contexts.lock().clone()
    }
}

#[async_trait]
impl Plugin for ScriptedAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "scripted test agent"
    }

    fn as_agent(self: Arc<Self>) -> Option<Arc<dyn AgentPlugin>> {
        Some(self)
    }
}

#[async_trait]
impl AgentPlugin for ScriptedAgent {
    async fn send_message(&self, ctx: MessageContext) -> Result<EventStream, AgentError> {
        self.contexts.lock().push(ctx);
        if let Some(message) = self.fail_send.lock().take() {
            return Err(AgentError::request(message));
        }

        let events = self.events.lock().pop_front().unwrap_or_default();
        let (tx, rx) = event_channel();
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn compact_history(&self, history: &[ConversationTurn]) -> Result<String, AgentError> {
        Ok(format!("summary of {} turns", history.len()))
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}

/// Plugin whose `on_load` always fails; used to exercise skip-on-failure.
pub struct FailingPlugin {
    pub name: String,
}

#[async_trait]
impl Plugin for FailingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "always fails to load"
    }

    async fn on_load(&self, _ctx: &crate::context::AppContext) -> Result<(), PluginError> {
        Err(PluginError::on_load(&self.name, "deliberate failure"))
    }
}
