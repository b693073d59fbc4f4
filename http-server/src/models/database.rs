use cards::error::StoreError;
use hex;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// Session id -> twitch id. Stands in for the OAuth session layer.
#[derive(Clone, Default)]
pub struct SessionStorage {
    sessions: Arc<Mutex<HashMap<String, String>>>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // Hash the twitch id with a random nonce so session ids are not guessable
    fn new_session_id(twitch_id: &str) -> String {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);

        let mut hasher = Sha256::new();
        hasher.update(twitch_id.as_bytes());
        hasher.update(nonce);
        hex::encode(hasher.finalize())
    }

    // Start a new session for the user
    pub fn create_session(&self, twitch_id: &str) -> Result<String, StoreError> {
        let session_id = Self::new_session_id(twitch_id);
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Poisoned("sessions"))?;
        sessions.insert(session_id.clone(), twitch_id.to_string());
        Ok(session_id)
    }

    // Resolve the twitch id behind a session
    pub fn twitch_id_for_session(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Poisoned("sessions"))?;
        Ok(sessions.get(session_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_are_unique_and_resolvable() {
        let storage = SessionStorage::new();
        let first = storage.create_session("1001").unwrap();
        let second = storage.create_session("1001").unwrap();

        assert_ne!(first, second);
        assert_eq!(first.len(), 64);
        assert_eq!(
            storage.twitch_id_for_session(&first).unwrap().as_deref(),
            Some("1001")
        );
        assert!(storage.twitch_id_for_session("nope").unwrap().is_none());
    }
}
