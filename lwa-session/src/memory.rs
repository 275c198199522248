use std::collections::HashMap;

use async_trait::async_trait;
use lwa_core::AuthError;

use crate::SessionStore;

/// An in-memory implementation of [`SessionStore`].
///
/// **Note**: This store is not persistent and will be cleared when the
/// application restarts. It is primarily intended for development and testing.
#[derive(Default)]
pub struct MemoryStore {
    values: std::sync::Mutex<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create a new, empty `MemoryStore`.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, session_id: &str, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self
            .values
            .lock()
            .unwrap()
            .get(session_id)
            .and_then(|session| session.get(key).cloned()))
    }

    async fn set(&self, session_id: &str, key: &str, value: &str) -> Result<(), AuthError> {
        self.values
            .lock()
            .unwrap()
            .entry(session_id.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, session_id: &str, key: &str) -> Result<(), AuthError> {
        if let Some(session) = self.values.lock().unwrap().get_mut(session_id) {
            session.remove(key);
        }
        Ok(())
    }

    // Atomic under the store lock, unlike the default get-then-remove.
    async fn take(&self, session_id: &str, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self
            .values
            .lock()
            .unwrap()
            .get_mut(session_id)
            .and_then(|session| session.remove(key)))
    }
}
