//! Client-side send flow.
//!
//! Orchestrates the task heuristic, prompt augmentation, the HTTP call to
//! the agent endpoint, and response handling. Transport failures never
//! surface as errors to the user; they become a synthetic apology turn so
//! the history stays append-only.

pub mod prompt;
pub mod state;
pub mod tasks;

use thiserror::Error;

use crate::api::{AgentReply, AgentRequest};
use crate::core::storage::{Storage, StorageError};

pub use state::{ChatTurn, ConversationState};

/// Bot text shown when the request or response handling fails.
pub const ERROR_REPLY: &str = "An error occurred. Please try again.";

/// Client-side request errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport or decode failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned status {0}")]
    Status(u16),
}

/// HTTP client for the agent endpoint.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AgentClient {
    /// Create a client for the given endpoint URL.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// POST a message, returning the agent's reply.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status, or an
    /// undecodable body.
    pub async fn send(
        &self,
        message: &str,
        session_id: &str,
    ) -> Result<AgentReply, ClientError> {
        let request = AgentRequest {
            message: Some(message.to_string()),
            session_id: Some(session_id.to_string()),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

/// Fold a request outcome into the conversation state.
///
/// On success appends `{ user: input, bot: reply }` and adopts the returned
/// session id; on failure appends the fixed apology turn instead. The
/// optimistically recorded task is not rolled back on failure.
///
/// # Errors
///
/// Returns error only when local persistence fails; request failures are
/// absorbed into the history.
pub fn apply_outcome(
    state: &mut ConversationState,
    storage: &Storage,
    input: &str,
    outcome: Result<AgentReply, ClientError>,
) -> Result<(), StorageError> {
    match outcome {
        Ok(reply) => {
            state.set_session_id(storage, reply.session_id)?;
            state.push_turn(
                storage,
                ChatTurn {
                    user: input.to_string(),
                    bot: reply.reply,
                },
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "agent request failed");
            state.push_turn(
                storage,
                ChatTurn {
                    user: input.to_string(),
                    bot: ERROR_REPLY.to_string(),
                },
            )
        }
    }
}

/// Run one full send: heuristic, augmentation, HTTP call, state update.
///
/// # Errors
///
/// Returns error only when local persistence fails; request failures are
/// absorbed into the history via [`apply_outcome`].
pub async fn send_message(
    state: &mut ConversationState,
    storage: &Storage,
    client: &AgentClient,
    input: &str,
) -> Result<(), StorageError> {
    state.record_task(storage, input)?;

    let message = prompt::augment(&state.tasks, input);
    let outcome = client.send(&message, &state.session_id).await;

    apply_outcome(state, storage, input, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_state() -> (ConversationState, Storage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_root(dir.path().to_path_buf());
        let state = ConversationState::load(&storage).unwrap();
        (state, storage, dir)
    }

    #[test]
    fn successful_outcome_appends_reply_and_adopts_session() {
        let (mut state, storage, _dir) = temp_state();

        apply_outcome(
            &mut state,
            &storage,
            "hello",
            Ok(AgentReply {
                reply: "Hello there".to_string(),
                session_id: "srv-1".to_string(),
            }),
        )
        .unwrap();

        assert_eq!(state.turns.len(), 1);
        assert_eq!(state.turns[0].user, "hello");
        assert_eq!(state.turns[0].bot, "Hello there");
        assert_eq!(state.session_id, "srv-1");
    }

    #[test]
    fn failed_outcome_appends_apology_turn() {
        let (mut state, storage, _dir) = temp_state();
        let session_before = state.session_id.clone();

        apply_outcome(
            &mut state,
            &storage,
            "hello",
            Err(ClientError::Status(500)),
        )
        .unwrap();

        assert_eq!(state.turns.len(), 1);
        assert_eq!(state.turns[0].bot, ERROR_REPLY);
        assert_eq!(state.session_id, session_before);
    }

    #[test]
    fn history_stays_append_only_across_outcomes() {
        let (mut state, storage, _dir) = temp_state();

        apply_outcome(
            &mut state,
            &storage,
            "one",
            Err(ClientError::Status(502)),
        )
        .unwrap();
        let session_id = state.session_id.clone();
        apply_outcome(
            &mut state,
            &storage,
            "two",
            Ok(AgentReply {
                reply: "ok".to_string(),
                session_id,
            }),
        )
        .unwrap();

        assert_eq!(state.turns.len(), 2);
        assert_eq!(state.turns[0].user, "one");
        assert_eq!(state.turns[1].user, "two");
    }
}
