//! Session: the live [`SessionState`] mirrored to a [`PersistedStore`]
//!
//! All mutation goes through [`Session::apply`] (backend events) or
//! [`Session::update`] (local edits). Both run to completion before the
//! changed fields are written, so the store never sees a partial transition.

pub mod reducer;

use crate::events::ServerEvent;
use crate::store::PersistedStore;
use crate::types::state::{SessionState, Severity};

pub use reducer::apply_event;

/// Session state plus its persistence
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    store: PersistedStore,
}

impl Session {
    /// Restore the session from `store`, falling back to defaults
    #[must_use]
    pub fn load(store: PersistedStore, log_capacity: usize) -> Self {
        let state = store.load_state(log_capacity);
        log::debug!(
            "Loaded session: status={}, {} candidates, {} classified",
            state.status.as_str(),
            state.candidates.len(),
            state.results.len()
        );
        Self { state, store }
    }

    /// Fresh session backed by memory only
    #[must_use]
    pub fn in_memory(log_capacity: usize) -> Self {
        Self::load(PersistedStore::in_memory(), log_capacity)
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Underlying store
    #[must_use]
    pub fn store(&self) -> &PersistedStore {
        &self.store
    }

    /// Fold a backend event into the state and persist what changed
    pub fn apply(&mut self, event: ServerEvent) {
        self.update(|state| apply_event(state, event));
    }

    /// Run a local edit and persist what changed
    pub fn update<R>(&mut self, edit: impl FnOnce(&mut SessionState) -> R) -> R {
        let before = self.state.clone();
        let out = edit(&mut self.state);
        self.store.save_changes(Some(&before), &self.state);
        out
    }

    /// Restore defaults and wipe the store
    ///
    /// The log capacity is kept; the reset itself is the first new log line.
    pub fn reset(&mut self) {
        let capacity = self.state.log_capacity;
        self.store.clear();
        self.state = SessionState::with_log_capacity(capacity);
        self.state.log(Severity::Info, "Restarted, state reset");
        self.store.save_state(&self.state);
    }
}
