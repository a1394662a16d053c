//! Multi-turn conversation state.

use serde::{Deserialize, Serialize};

use super::types::{Message, Role};

/// Manages multi-turn conversation state.
///
/// Holds an optional system prompt and the ordered user/assistant message
/// history fed to the provider on each request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    system: Option<String>,
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            system: None,
            messages: Vec::new(),
        }
    }

    /// Create a conversation with a system prompt.
    pub fn with_system(system: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            messages: Vec::new(),
        }
    }

    /// Get the system prompt, if set.
    #[must_use]
    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    /// Get the message history.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append a user message.
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append an assistant message.
    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Number of messages in the history.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternating_turns_preserved() {
        let mut conversation = Conversation::with_system("be helpful");
        conversation.add_user_message("hi");
        conversation.add_assistant_message("hello");
        conversation.add_user_message("bye");

        assert_eq!(conversation.system(), Some("be helpful"));
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages()[0].role, Role::User);
        assert_eq!(conversation.messages()[1].role, Role::Assistant);
        assert_eq!(conversation.messages()[2].content, "bye");
    }

    #[test]
    fn serde_round_trip() {
        let mut conversation = Conversation::with_system("sys");
        conversation.add_user_message("one");

        let json = serde_json::to_string(&conversation).unwrap();
        let restored: Conversation = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.system(), Some("sys"));
        assert_eq!(restored.messages(), conversation.messages());
    }
}
