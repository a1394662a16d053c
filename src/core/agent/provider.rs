//! LLM provider abstraction.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use super::error::Result;
use super::types::{Message, StopReason};

/// Configuration for an LLM request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// System prompt.
    pub system: Option<String>,
}

/// A streaming event from the LLM.
///
/// Events arrive as an ordered sequence of partial fragments
/// ([`CompletionEvent::TextDelta`]) interleaved with final-for-that-content
/// events ([`CompletionEvent::TextDone`]); only the latter contribute to the
/// accumulated reply.
#[derive(Debug, Clone)]
pub enum CompletionEvent {
    /// A partial fragment of in-progress text.
    TextDelta(String),
    /// The complete text of a finished content block.
    TextDone(String),
    /// The completion has finished.
    Done { stop_reason: Option<StopReason> },
}

/// Stream of completion events.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionEvent>> + Send>>;

/// Trait for LLM providers.
///
/// Implement this trait to add support for a new LLM provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &'static str;

    /// Stream a completion request.
    ///
    /// Returns a stream of completion events.
    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream>;
}
