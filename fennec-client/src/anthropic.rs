//! Anthropic Messages API client
//!
//! A thin non-streaming client: one request per turn, the full response
//! parsed into content blocks and usage. The REPL's live view still
//! renders block-by-block because each text block becomes its own delta
//! event.

use fennec_core::error::AgentError;
use fennec_core::types::{ConversationTurn, FileContext, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Default model requested when the embedding application does not
/// override it.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-5";

/// Default connect timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
/// Tokens requested per response.
const MAX_TOKENS: u32 = 4096;

/// Client for the Anthropic Messages API.
#[derive(Debug)]
pub struct AnthropicClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

/// Builder for [`AnthropicClient`].
pub struct AnthropicClientBuilder {
    api_key: String,
    base_url: String,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl AnthropicClientBuilder {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set a custom base URL (proxies, test servers).
    pub fn base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<AnthropicClient, AgentError> {
        let http = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|err| AgentError::unavailable(format!("HTTP client: {err}")))?;

        Ok(AnthropicClient {
            api_key: self.api_key,
            base_url: self.base_url,
            http,
        })
    }
}

impl AnthropicClient {
    pub fn new(api_key: String) -> Result<Self, AgentError> {
        AnthropicClientBuilder::new(api_key).build()
    }

    pub fn builder(api_key: String) -> AnthropicClientBuilder {
        AnthropicClientBuilder::new(api_key)
    }

    /// Create from `FENNEC_ANTHROPIC_API_KEY` or `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self, AgentError> {
        let api_key = std::env::var("FENNEC_ANTHROPIC_API_KEY")
            .or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AgentError::unavailable(
                    "no Claude authentication configured; set ANTHROPIC_API_KEY",
                )
            })?;
        Self::new(api_key)
    }

    /// Send one Messages API request and parse the response.
    pub async fn complete(
        &self,
        model: &str,
        request: MessagesRequest,
    ) -> Result<MessagesResponse, AgentError> {
        let body = request.into_body(model);

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| AgentError::request(format!("connection failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::request(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        response
            .json::<MessagesResponse>()
            .await
            .map_err(|err| AgentError::request(format!("invalid response: {err}")))
    }
}

/// One request worth of conversation context.
#[derive(Debug, Default)]
pub struct MessagesRequest {
    pub system: Option<String>,
    pub messages: Vec<Value>,
}

impl MessagesRequest {
    /// Assemble the request from session history plus the current message
    /// and its file contexts.
    ///
    /// System turns (compaction summaries) become the system prompt; file
    /// contexts are prepended to the current message as tagged blocks.
    pub fn from_conversation(
        history: &[ConversationTurn],
        message: &str,
        file_contexts: &[FileContext],
    ) -> Self {
        let mut system_parts = Vec::new();
        let mut messages = Vec::new();

        for turn in history {
            match turn.role {
                Role::System => system_parts.push(turn.content.clone()),
                Role::User if !turn.content.is_empty() => {
                    messages.push(json!({"role": "user", "content": turn.content}));
                }
                Role::Assistant if !turn.content.is_empty() => {
                    messages.push(json!({"role": "assistant", "content": turn.content}));
                }
                _ => {}
            }
        }

        messages.push(json!({
            "role": "user",
            "content": render_user_content(message, file_contexts),
        }));

        Self {
            system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
            messages,
        }
    }

    fn into_body(self, model: &str) -> Value {
        let mut body = json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "messages": self.messages,
        });
        if let Some(system) = self.system {
            body["system"] = Value::String(system);
        }
        body
    }
}

/// Current message with file-context blocks prepended.
fn render_user_content(message: &str, file_contexts: &[FileContext]) -> String {
    let blocks: Vec<String> = file_contexts
        .iter()
        .filter_map(|fc| {
            fc.as_content()
                .map(|content| format!("<file path=\"{}\">\n{}\n</file>", fc.path, content))
        })
        .collect();

    if blocks.is_empty() {
        message.to_string()
    } else {
        format!("{}\n\n{}", blocks.join("\n\n"), message)
    }
}

/// Parsed Messages API response.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
}

impl MessagesResponse {
    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for block in &self.content {
            if let ContentBlock::Text { text } = block {
                out.push_str(text);
            }
        }
        out
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}
