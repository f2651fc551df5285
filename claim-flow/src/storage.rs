use dashmap::DashMap;
use std::sync::Arc;

use crate::session::SessionManager;

/// In-memory registry of live claim attempts, keyed by session id.
///
/// A claim attempt lives exactly as long as its entry here; there is no
/// persistence behind this map.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SessionManager>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn insert(&self, id: String, manager: Arc<SessionManager>) {
        self.sessions.insert(id, manager);
    }

    pub fn get(&self, id: &str) -> Option<Arc<SessionManager>> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    pub fn remove(&self, id: &str) {
        self.sessions.remove(id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
