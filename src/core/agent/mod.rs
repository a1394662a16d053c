//! Conversational agent over a streaming LLM provider.

mod conversation;
mod error;
mod provider;
pub mod providers;
mod types;

use std::sync::Arc;

use futures::StreamExt;

pub use conversation::Conversation;
pub use error::{AgentError, Result};
pub use provider::{CompletionEvent, CompletionRequest, CompletionStream, LlmProvider};
pub use providers::OpenAiProvider;
pub use types::{Message, Role, StopReason};

/// Agent that orchestrates a conversation with an LLM.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    conversation: Conversation,
    model: String,
    max_tokens: u32,
}

impl Agent {
    /// Create a new agent with an empty conversation.
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            conversation: Conversation::new(),
            model: model.into(),
            max_tokens,
        }
    }

    /// Create an agent with a system prompt.
    pub fn with_system(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        max_tokens: u32,
        system: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            conversation: Conversation::with_system(system),
            model: model.into(),
            max_tokens,
        }
    }

    /// Create an agent bound to an existing conversation.
    ///
    /// Used by the endpoint to continue a session's history.
    pub fn resume(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        max_tokens: u32,
        conversation: Conversation,
    ) -> Self {
        Self {
            provider,
            conversation,
            model: model.into(),
            max_tokens,
        }
    }

    /// Get the conversation state.
    #[must_use]
    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Consume the agent, returning the conversation state.
    #[must_use]
    pub fn into_conversation(self) -> Conversation {
        self.conversation
    }

    /// Send a message and accumulate the streamed reply.
    ///
    /// Consumes the provider's event stream in emission order: partial
    /// fragments ([`CompletionEvent::TextDelta`]) are skipped, the text of
    /// each finished content block ([`CompletionEvent::TextDone`]) is
    /// appended to the reply.
    ///
    /// # Errors
    ///
    /// Returns error if the provider request or the event stream fails.
    pub async fn reply(&mut self, message: &str) -> Result<String> {
        self.conversation.add_user_message(message);

        let request = CompletionRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: self.conversation.messages().to_vec(),
            system: self.conversation.system().map(String::from),
        };

        let stream = self.provider.stream(request).await?;
        futures::pin_mut!(stream);

        let mut reply = String::new();

        while let Some(event) = stream.next().await {
            match event? {
                CompletionEvent::TextDelta(_) => {}
                CompletionEvent::TextDone(text) => reply.push_str(&text),
                CompletionEvent::Done { .. } => break,
            }
        }

        if !reply.is_empty() {
            self.conversation.add_assistant_message(&reply);
        }

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    /// Provider that replays a scripted event sequence.
    struct ScriptedProvider {
        events: Vec<CompletionEvent>,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn stream(&self, _request: CompletionRequest) -> Result<CompletionStream> {
            let events = self.events.clone();
            Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
        }
    }

    fn agent_with(events: Vec<CompletionEvent>) -> Agent {
        Agent::with_system(
            Arc::new(ScriptedProvider { events }),
            "test-model",
            256,
            "be brief",
        )
    }

    #[tokio::test]
    async fn partial_fragments_are_excluded() {
        let mut agent = agent_with(vec![
            CompletionEvent::TextDelta("Hel".to_string()),
            CompletionEvent::TextDone("Hello there".to_string()),
            CompletionEvent::Done {
                stop_reason: Some(StopReason::EndTurn),
            },
        ]);

        let reply = agent.reply("hi").await.unwrap();
        assert_eq!(reply, "Hello there");
    }

    #[tokio::test]
    async fn finished_blocks_concatenate_in_emission_order() {
        let mut agent = agent_with(vec![
            CompletionEvent::TextDone("first ".to_string()),
            CompletionEvent::TextDelta("sec".to_string()),
            CompletionEvent::TextDone("second".to_string()),
            CompletionEvent::Done { stop_reason: None },
        ]);

        let reply = agent.reply("hi").await.unwrap();
        assert_eq!(reply, "first second");
    }

    #[tokio::test]
    async fn reply_extends_conversation() {
        let mut agent = agent_with(vec![
            CompletionEvent::TextDone("pong".to_string()),
            CompletionEvent::Done { stop_reason: None },
        ]);

        agent.reply("ping").await.unwrap();

        let messages = agent.conversation().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].content, "pong");
    }

    #[tokio::test]
    async fn stream_error_propagates() {
        struct FailingProvider;

        #[async_trait]
        impl LlmProvider for FailingProvider {
            fn name(&self) -> &'static str {
                "failing"
            }

            async fn stream(&self, _request: CompletionRequest) -> Result<CompletionStream> {
                Ok(Box::pin(futures::stream::iter(vec![Err(
                    AgentError::Stream("boom".to_string()),
                )])))
            }
        }

        let mut agent = Agent::new(Arc::new(FailingProvider), "test-model", 256);
        let err = agent.reply("hi").await.unwrap_err();
        assert!(matches!(err, AgentError::Stream(_)));
    }
}
