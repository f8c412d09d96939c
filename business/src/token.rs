//! Bearer token storage.
//!
//! The API client never reads a global: it is handed an `Arc<dyn TokenProvider>`
//! at construction and asks it for the token on every request. Login writes the
//! token through the same provider, logout clears it.

use std::any::Any;
use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};

use userdesk_states::{SnapshotClone, State};

/// Read/write contract of the persisted token store.
pub trait TokenProvider: Send + Sync + Debug {
    fn get_token(&self) -> Option<String>;

    fn set_token(&self, token: String);

    fn clear_token(&self);
}

/// In-process token store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set_token(token.into());
        store
    }
}

impl TokenProvider for MemoryTokenStore {
    fn get_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Blank tokens clear the slot instead of being stored.
    fn set_token(&self, token: String) {
        let token = token.trim();
        let mut slot = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *slot = if token.is_empty() {
            None
        } else {
            Some(token.to_owned())
        };
    }

    fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// The token provider as a registered state, so commands can reach it.
#[derive(Debug, Clone)]
pub struct TokenStore {
    provider: Arc<dyn TokenProvider>,
}

impl TokenStore {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> Arc<dyn TokenProvider> {
        Arc::clone(&self.provider)
    }

    pub fn is_authenticated(&self) -> bool {
        self.provider.get_token().is_some()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }
}

impl SnapshotClone for TokenStore {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for TokenStore {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
