//! # Key-Value Store Port
//!
//! The persistent store is owned by the host platform (AsyncStorage on
//! mobile). This module defines the port the cache talks to and an
//! in-memory implementation for tests and the demo binary.
//!
//! ```text
//! ┌──────────────┐   get_item / set_item / remove_item   ┌────────────────┐
//! │    Cache     │ ─────────────────────────────────────► │ KeyValueStore  │
//! │  (cache.rs)  │          raw strings only             │ (platform)     │
//! └──────────────┘                                        └────────────────┘
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::error::{StateError, StateResult};

/// String key-value storage provided by the host platform.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> StateResult<Option<String>>;

    async fn set_item(&self, key: &str, value: String) -> StateResult<()>;

    async fn remove_item(&self, key: &str) -> StateResult<()>;
}

// =============================================================================
// Memory Store
// =============================================================================

/// Process-local store backed by a `HashMap`.
///
/// Can be switched offline to simulate an unavailable platform store.
#[derive(Debug)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
    online: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            items: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
            reads: AtomicUsize::new(0),
        }
    }

    /// Makes every subsequent call fail with `StoreUnavailable` (or succeed
    /// again when `true`).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of `get_item` calls served so far, including failed ones.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    fn ensure_online(&self) -> StateResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StateError::StoreUnavailable("memory store is offline".into()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> StateResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> StateResult<()> {
        self.ensure_online()?;
        self.items.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StateResult<()> {
        self.ensure_online()?;
        self.items.write().await.remove(key);
        Ok(())
    }
}
