//! In-memory credential store for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{CredentialError, CredentialStore, Secret};

/// A call observed by [`MemoryCredentialStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    Set(String),
    Delete(String),
}

/// Credential store held in memory.
///
/// `set` stands in for the interactive prompt: it stores the configured
/// prompt answer, if any.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    available: bool,
    entries: Mutex<HashMap<String, Secret>>,
    prompt_answer: Option<Secret>,
    calls: Mutex<Vec<StoreCall>>,
}

impl MemoryCredentialStore {
    /// An available, empty store.
    pub fn new() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }

    /// A store whose backing tool is not installed.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Pre-populate a password.
    pub fn with_entry(self, username: &str, password: &str) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(username.to_string(), Secret::new(password));
        self
    }

    /// Password "typed" when `set` is invoked.
    pub fn with_prompt_answer(mut self, password: &str) -> Self {
        self.prompt_answer = Some(Secret::new(password));
        self
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn contains(&self, username: &str) -> bool {
        self.entries.lock().unwrap().contains_key(username)
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn available(&self) -> bool {
        self.available
    }

    fn get(&self, username: &str) -> Option<Secret> {
        self.record(StoreCall::Get(username.to_string()));
        if !self.available {
            return None;
        }
        self.entries.lock().unwrap().get(username).cloned()
    }

    fn set(&self, username: &str) -> Result<(), CredentialError> {
        self.record(StoreCall::Set(username.to_string()));
        if !self.available {
            return Err(CredentialError::Unavailable);
        }
        if let Some(ref answer) = self.prompt_answer {
            self.entries
                .lock()
                .unwrap()
                .insert(username.to_string(), answer.clone());
        }
        Ok(())
    }

    fn delete(&self, username: &str) -> Result<(), CredentialError> {
        self.record(StoreCall::Delete(username.to_string()));
        if !self.available {
            return Err(CredentialError::Unavailable);
        }
        self.entries.lock().unwrap().remove(username);
        Ok(())
    }
}
