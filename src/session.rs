//! ==============================================================================
//! session.rs - per-session history store
//! ==============================================================================
//!
//! purpose:
//!     the only state that survives a page rebuild. each session key owns its
//!     own RollingHistory; a key seen for the first time starts empty.
//!
//! relationships:
//!     - used by: dashboard.rs (looked up at the start of every cycle)
//!     - uses: history.rs
//!
//! ==============================================================================

use crate::history::RollingHistory;
use std::collections::HashMap;

/// key used by the refresh loop for the local display
pub const DISPLAY_SESSION: &str = "display";

#[derive(Debug)]
pub struct SessionStore {
    capacity: usize,
    sessions: HashMap<String, RollingHistory>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, sessions: HashMap::new() }
    }

    /// history for `key`, created fresh if this session has none yet
    pub fn history_mut(&mut self, key: &str) -> &mut RollingHistory {
        let capacity = self.capacity;
        self.sessions.entry(key.to_string()).or_insert_with(|| {
            tracing::debug!(session = key, "starting new session history");
            RollingHistory::new(capacity)
        })
    }

    pub fn history(&self, key: &str) -> Option<&RollingHistory> {
        self.sessions.get(key)
    }

    /// forget a session; its next lookup starts empty
    pub fn reset(&mut self, key: &str) -> bool {
        self.sessions.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
