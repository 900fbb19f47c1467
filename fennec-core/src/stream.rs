//! Agent stream processing
//!
//! Consumes the lazy event sequence of one agent response, drives the UI
//! incrementally, pauses for interactive input requests, and produces
//! exactly one conversation turn per stream, including the empty-stream
//! and cancelled cases.

use crate::event::{EventStream, InputKind, InputResponse, StreamEvent};
use crate::notify::Notifier;
use crate::session::Session;
use crate::shell::Shell;
use crate::types::{ConversationTurn, Role, TokenUsage, ToolUse};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Maximum characters of a tool-input value shown in the invocation summary.
const MAX_INPUT_VALUE_CHARS: usize = 60;

/// Tool-result bodies longer than this many lines are collapsed.
const MAX_RESULT_LINES: usize = 3;

/// Event-driven state machine over one agent response stream.
pub struct StreamProcessor {
    shell: Arc<dyn Shell>,
    notifier: Option<Arc<Notifier>>,
}

impl StreamProcessor {
    pub fn new(shell: Arc<dyn Shell>, notifier: Option<Arc<Notifier>>) -> Self {
        Self { shell, notifier }
    }

    /// Consume the stream to completion (or cancellation) and append the
    /// resulting assistant turn to the session.
    ///
    /// The `cancel` watch flips to `true` when the user interrupts an
    /// in-flight response; the partial content accumulated so far is
    /// finalized into the turn.
    pub async fn process(
        &self,
        mut stream: EventStream,
        session: &Mutex<Session>,
        mut cancel: watch::Receiver<bool>,
    ) -> ConversationTurn {
        let mut accum_text = String::new();
        let mut tool_uses: Vec<ToolUse> = Vec::new();
        let mut usage_total = TokenUsage::default();
        let mut pending_inputs: HashMap<String, Value> = HashMap::new();
        let mut spinner_active = true;
        let mut live_active = false;
        let mut cancel_open = true;

        if let Some(notifier) = &self.notifier {
            notifier.mark_turn_start();
        }
        self.shell.start_spinner();

        loop {
            let received = tokio::select! {
                event = stream.recv() => Some(event),
                res = cancel.changed(), if cancel_open => {
                    match res {
                        Ok(()) => {
                            if *cancel.borrow() {
                                break;
                            }
                        }
                        Err(_) => cancel_open = false,
                    }
                    None
                }
            };
            let Some(received) = received else { continue };
            let Some(event) = received else { break };

            match event {
                StreamEvent::TextDelta { text } => {
                    if spinner_active {
                        self.shell.stop_spinner();
                        spinner_active = false;
                    }
                    if !live_active {
                        self.shell.start_live();
                        live_active = true;
                    }
                    self.shell.append_live(&text);
                    accum_text.push_str(&text);
                }

                StreamEvent::ToolUseStart { name, id, input } => {
                    if spinner_active {
                        self.shell.stop_spinner();
                        spinner_active = false;
                    }
                    if live_active {
                        self.shell.finish_live();
                        live_active = false;
                    }
                    let summary = format_tool_input(&input);
                    self.shell.print_tool_use(&name, summary.as_deref());
                    pending_inputs.insert(id, input);
                }

                StreamEvent::ToolResult {
                    name,
                    id,
                    result,
                    is_error,
                } => {
                    if spinner_active {
                        self.shell.stop_spinner();
                        spinner_active = false;
                    }
                    self.shell.print_tool_result_header(&name, is_error);
                    self.render_tool_body(&result, is_error);

                    let input = pending_inputs.remove(&id).unwrap_or(Value::Null);
                    tool_uses.push(ToolUse {
                        name: name.clone(),
                        input,
                        result,
                        is_error,
                    });
                    if let Some(notifier) = &self.notifier {
                        notifier.queue(&format!("Tool completed: {name}"));
                    }
                }

                StreamEvent::Usage {
                    input_tokens,
                    output_tokens,
                } => {
                    usage_total.add(&TokenUsage::new(input_tokens, output_tokens));
                }

                StreamEvent::Error { message, fatal } => {
                    if spinner_active {
                        self.shell.stop_spinner();
                        spinner_active = false;
                    }
                    self.shell.print_error(&message);
                    if let Some(notifier) = &self.notifier {
                        notifier.queue(&message);
                    }
                    if fatal {
                        break;
                    }
                }

                StreamEvent::InputRequest(request) => {
                    let Some(handle) = request.response_handle else {
                        tracing::warn!("input request without response handle, skipping");
                        continue;
                    };
                    if spinner_active {
                        self.shell.stop_spinner();
                        spinner_active = false;
                    }
                    if live_active {
                        self.shell.finish_live();
                        live_active = false;
                    }

                    let response = match request.input_type {
                        InputKind::Approval => {
                            self.shell
                                .prompt_approval(&request.prompt, &request.choices)
                                .await
                        }
                        InputKind::Choice => {
                            self.shell
                                .prompt_choice(&request.prompt, &request.choices)
                                .await
                        }
                        InputKind::Text => self.shell.prompt_text(&request.prompt).await,
                    };

                    let rejected = response == InputResponse::Reject;
                    // Resolve the one-shot sink exactly once; a dropped
                    // receiver means the agent gave up waiting.
                    let _ = handle.send(response);

                    if rejected {
                        self.shell.print_info("Rejected. Agent response cancelled.");
                        break;
                    }
                    self.shell.start_spinner();
                    spinner_active = true;
                }
            }
        }

        if spinner_active {
            self.shell.stop_spinner();
        }
        if live_active {
            self.shell.finish_live();
        }

        let turn = ConversationTurn {
            role: Role::Assistant,
            content: accum_text.clone(),
            file_contexts: Vec::new(),
            tool_uses,
            usage: (!usage_total.is_zero()).then_some(usage_total),
        };
        session.lock().add_turn(turn.clone());

        if let Some(notifier) = &self.notifier {
            notifier.queue(&accum_text);
            notifier.flush();
        }

        turn
    }

    fn render_tool_body(&self, body: &str, is_error: bool) {
        let lines: Vec<&str> = body.lines().collect();
        if is_error || lines.len() <= MAX_RESULT_LINES {
            self.shell.print_tool_body(body);
            return;
        }

        let shown = lines[..MAX_RESULT_LINES].join("\n");
        self.shell.print_tool_body(&shown);
        self.shell
            .print_dim(&collapse_hint(lines.len() - MAX_RESULT_LINES));
        self.shell.push_collapsed(body.to_string());
    }
}

/// Compact single-line summary of a tool input record.
///
/// Returns `None` for empty input (no summary line is rendered).
pub fn format_tool_input(input: &Value) -> Option<String> {
    match input {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{key}={}", render_value(value)))
                .collect();
            Some(pairs.join("  "))
        }
        other => Some(render_value(other)),
    }
}

fn render_value(value: &Value) -> String {
    let rendered = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
        other => other.to_string(),
    };
    truncate_chars(&rendered, MAX_INPUT_VALUE_CHARS)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}

fn collapse_hint(hidden: usize) -> String {
    let plural = if hidden == 1 { "" } else { "s" };
    format!("▸ {hidden} more line{plural} (Ctrl+O to expand)")
}
