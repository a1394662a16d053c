//! Client-side conversation state and persistence.
//!
//! The state lives in two independently keyed JSON blobs (conversation
//! history and task list) plus the persisted session id. Every mutation is
//! written back synchronously; an explicit clear empties the sequences and
//! removes the blobs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::storage::{Result, Storage};

use super::tasks;

const MESSAGES_KEY: &str = "messages";
const TASKS_KEY: &str = "tasks";
const SESSION_KEY: &str = "session";

/// One displayed exchange: what the user sent and what the agent replied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    pub user: String,
    pub bot: String,
}

/// Client conversation state.
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// Ordered exchange history, append-only.
    pub turns: Vec<ChatTurn>,

    /// Tracked task labels, unique by exact match.
    pub tasks: Vec<String>,

    /// Session id echoed to the endpoint for continuity.
    pub session_id: String,
}

impl ConversationState {
    /// Load persisted state, generating a session id when none is stored.
    ///
    /// Missing or unreadable blobs load as empty sequences. The generated
    /// session id is persisted immediately so later runs continue the same
    /// session.
    ///
    /// # Errors
    ///
    /// Returns error if the generated session id cannot be persisted.
    pub fn load(storage: &Storage) -> Result<Self> {
        let turns = storage.read(MESSAGES_KEY).unwrap_or_default();
        let tasks = storage.read(TASKS_KEY).unwrap_or_default();

        let session_id = match storage.read::<String>(SESSION_KEY) {
            Ok(id) => id,
            Err(_) => {
                let id = Uuid::new_v4().to_string();
                storage.write(SESSION_KEY, &id)?;
                id
            }
        };

        Ok(Self {
            turns,
            tasks,
            session_id,
        })
    }

    /// Append an exchange and persist the history blob.
    ///
    /// # Errors
    ///
    /// Returns error if the blob cannot be written.
    pub fn push_turn(&mut self, storage: &Storage, turn: ChatTurn) -> Result<()> {
        self.turns.push(turn);
        storage.write(MESSAGES_KEY, &self.turns)
    }

    /// Run the task heuristic and persist the list when it changed.
    ///
    /// # Errors
    ///
    /// Returns error if the blob cannot be written.
    pub fn record_task(&mut self, storage: &Storage, input: &str) -> Result<bool> {
        let changed = tasks::record_task(&mut self.tasks, input);
        if changed {
            storage.write(TASKS_KEY, &self.tasks)?;
        }
        Ok(changed)
    }

    /// Adopt the session id returned by the endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the blob cannot be written.
    pub fn set_session_id(&mut self, storage: &Storage, session_id: String) -> Result<()> {
        if self.session_id != session_id {
            self.session_id = session_id;
            storage.write(SESSION_KEY, &self.session_id)?;
        }
        Ok(())
    }

    /// Clear conversation and tasks, removing the persisted blobs.
    ///
    /// Starts a fresh session id so the next send does not continue the old
    /// agent session.
    ///
    /// # Errors
    ///
    /// Returns error if a blob cannot be removed or the new id persisted.
    pub fn clear(&mut self, storage: &Storage) -> Result<()> {
        self.turns.clear();
        self.tasks.clear();
        storage.remove(MESSAGES_KEY)?;
        storage.remove(TASKS_KEY)?;

        self.session_id = Uuid::new_v4().to_string();
        storage.write(SESSION_KEY, &self.session_id)
    }
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
    fn fresh_state_is_empty_with_generated_session() {
        let (state, storage, _dir) = temp_state();
        assert!(state.turns.is_empty());
        assert!(state.tasks.is_empty());
        assert!(!state.session_id.is_empty());
        assert!(storage.exists("session"));
    }

    #[test]
    fn mutations_round_trip_through_storage() {
        let (mut state, storage, _dir) = temp_state();

        state.record_task(&storage, "add buy milk").unwrap();
        state
            .push_turn(
                &storage,
                ChatTurn {
                    user: "add buy milk".to_string(),
                    bot: "Noted.".to_string(),
                },
            )
            .unwrap();

        let reloaded = ConversationState::load(&storage).unwrap();
        assert_eq!(reloaded.tasks, vec!["buy milk"]);
        assert_eq!(reloaded.turns, state.turns);
        assert_eq!(reloaded.session_id, state.session_id);
    }

    #[test]
    fn clear_empties_state_and_removes_blobs() {
        let (mut state, storage, _dir) = temp_state();
        state.record_task(&storage, "add buy milk").unwrap();
        state
            .push_turn(
                &storage,
                ChatTurn {
                    user: "hi".to_string(),
                    bot: "hello".to_string(),
                },
            )
            .unwrap();
        let old_session = state.session_id.clone();

        state.clear(&storage).unwrap();

        assert!(state.turns.is_empty());
        assert!(state.tasks.is_empty());
        assert!(!storage.exists("messages"));
        assert!(!storage.exists("tasks"));
        assert_ne!(state.session_id, old_session);
    }

    #[test]
    fn session_id_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::with_root(dir.path().to_path_buf());

        let first = ConversationState::load(&storage).unwrap();
        let second = ConversationState::load(&storage).unwrap();
        assert_eq!(first.session_id, second.session_id);
    }
}
