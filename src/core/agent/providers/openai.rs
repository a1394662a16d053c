//! `OpenAI` provider implementation.
//!
//! Provides streaming completions via the `OpenAI` Chat Completions API.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::super::error::{AgentError, Result};
use super::super::provider::{CompletionEvent, CompletionRequest, CompletionStream, LlmProvider};
use super::super::types::{Message, Role, StopReason};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// LLM provider for the `OpenAI` API and compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a new provider instance.
    ///
    /// # Errors
    ///
    /// Returns error if API key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AgentError::ApiKeyMissing);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            api_key: Some(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a provider with optional API key and base URL.
    ///
    /// Use this for OpenAI-compatible providers that may not require an API
    /// key (e.g., local endpoints) or use a different base URL.
    #[must_use]
    pub fn with_config(api_key: Option<String>, base_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

// Request types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<OpenAiMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

// Response types for SSE parsing

#[derive(Debug, Deserialize)]
struct OpenAiChunk {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    delta: OpenAiDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Convert our messages to the format expected by the chat completions API.
fn convert_messages(messages: &[Message], system: Option<&str>) -> Vec<OpenAiMessage> {
    let mut result = Vec::new();

    if let Some(sys) = system {
        result.push(OpenAiMessage {
            role: "system",
            content: sys.to_string(),
        });
    }

    for msg in messages {
        let role = match msg.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        result.push(OpenAiMessage {
            role,
            content: msg.content.clone(),
        });
    }

    result
}

/// Parse a single SSE event from the buffer.
///
/// Returns the parsed chunk (if any) and the remaining buffer content.
/// Returns `None` when the buffer holds no complete event yet.
fn parse_sse_event(buffer: &str) -> Option<(Option<OpenAiChunk>, String)> {
    // Find double newline (end of event)
    let end = buffer.find("\n\n")?;
    let event_str = &buffer[..end];
    let remainder = buffer[end + 2..].to_string();

    let mut data = None;

    for line in event_str.lines() {
        if let Some(rest) = line.strip_prefix("data: ") {
            data = Some(rest.to_string());
        }
    }

    // Skip non-data events
    let Some(data) = data else {
        return Some((None, remainder));
    };

    // Handle [DONE] marker
    if data.trim() == "[DONE]" {
        return Some((None, remainder));
    }

    match serde_json::from_str::<OpenAiChunk>(&data) {
        Ok(chunk) => Some((Some(chunk), remainder)),
        Err(e) => {
            tracing::debug!(data = %data, error = %e, "failed to parse OpenAI event");
            Some((None, remainder))
        }
    }
}

/// Convert finish reason to our stop reason.
fn convert_stop_reason(reason: &str) -> Option<StopReason> {
    match reason {
        "stop" => Some(StopReason::EndTurn),
        "length" => Some(StopReason::MaxTokens),
        _ => None,
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref key) = self.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|_| AgentError::ApiKeyMissing)?,
            );
        }

        let openai_request = OpenAiRequest {
            model: request.model,
            max_tokens: request.max_tokens,
            messages: convert_messages(&request.messages, request.system.as_deref()),
            stream: true,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .headers(headers)
            .json(&openai_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let byte_stream = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = String::new();
            let mut current_text = String::new();
            let mut finished = false;
            let mut errored = false;

            futures::pin_mut!(byte_stream);

            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(AgentError::Http(e));
                        errored = true;
                        break;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Process complete SSE events
                while let Some((chunk_opt, remainder)) = parse_sse_event(&buffer) {
                    buffer = remainder;

                    let Some(chunk) = chunk_opt else {
                        continue;
                    };

                    for choice in chunk.choices {
                        if let Some(text) = choice.delta.content {
                            if !text.is_empty() {
                                current_text.push_str(&text);
                                yield Ok(CompletionEvent::TextDelta(text));
                            }
                        }

                        if let Some(reason) = choice.finish_reason {
                            finished = true;
                            yield Ok(CompletionEvent::TextDone(std::mem::take(&mut current_text)));
                            yield Ok(CompletionEvent::Done {
                                stop_reason: convert_stop_reason(&reason),
                            });
                        }
                    }
                }
            }

            // Stream closed without a finish_reason
            if !finished && !errored {
                if !current_text.is_empty() {
                    yield Ok(CompletionEvent::TextDone(std::mem::take(&mut current_text)));
                }
                yield Ok(CompletionEvent::Done { stop_reason: None });
            }
        };

        Ok(Box::pin(stream))
    }
}
