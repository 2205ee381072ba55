//! # Cache Service
//!
//! Typed, expiring cache on top of a raw [`KeyValueStore`].
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Cache::get(key)                                │
//! │                                                                         │
//! │   store.get_item("@ns:<key>_exp") ──► past deadline? ──► None          │
//! │                │                                                        │
//! │                ▼ (no marker / still fresh)                              │
//! │   store.get_item("@ns:<key>")     ──► missing?       ──► None          │
//! │                │                                                        │
//! │                ▼                                                        │
//! │   parse JSON (raw string fallback) ──► decode into T                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Path
//! `set` updates a synchronous in-process mirror first, so [`Cache::peek`]
//! sees the value immediately, then writes the expiry marker and the item.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use shopfront_core::envelope;
use shopfront_core::CacheKey;

use crate::config::CacheSettings;
use crate::error::StateResult;
use crate::store::KeyValueStore;

// =============================================================================
// Cache Source Port
// =============================================================================

/// Read-only access to cached values, as consumed by
/// [`CachedValueLoader`](crate::loader::CachedValueLoader).
#[async_trait]
pub trait CacheSource: Send + Sync {
    /// Reads the current value for `key`, or `None` if absent or expired.
    async fn read(&self, key: CacheKey) -> StateResult<Option<Value>>;
}

// =============================================================================
// Cache
// =============================================================================

/// Persistent cache keyed by [`CacheKey`].
pub struct Cache {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
    mirror: RwLock<HashMap<CacheKey, Value>>,
}

impl Cache {
    pub fn new(store: Arc<dyn KeyValueStore>, settings: &CacheSettings) -> Self {
        Cache {
            store,
            prefix: settings.prefix.clone(),
            mirror: RwLock::new(HashMap::new()),
        }
    }

    /// Reads and decodes the value for `key`.
    pub async fn get<T: DeserializeOwned>(&self, key: CacheKey) -> StateResult<Option<T>> {
        match self.read(key).await? {
            Some(value) => Ok(Some(envelope::decode_item(key, value)?)),
            None => Ok(None),
        }
    }

    /// Reads the value for `key`, returning `fallback` when absent or expired.
    pub async fn get_or<T: DeserializeOwned>(&self, key: CacheKey, fallback: T) -> StateResult<T> {
        Ok(self.get(key).await?.unwrap_or(fallback))
    }

    /// Stores `value` under `key`, optionally expiring after the given number
    /// of minutes.
    pub async fn set<T: Serialize>(
        &self,
        key: CacheKey,
        value: &T,
        expires_in_minutes: Option<u32>,
    ) -> StateResult<()> {
        let raw = envelope::encode_item(key, value)?;
        let deadline = expires_in_minutes
            .map(|minutes| envelope::expiry_deadline(Utc::now(), minutes))
            .transpose()?;

        if let Ok(mut mirror) = self.mirror.write() {
            mirror.insert(key, envelope::parse_item(&raw));
        }

        let expiry_key = envelope::expiry_key(&self.prefix, key);
        match deadline {
            Some(deadline) => self.store.set_item(&expiry_key, deadline.to_string()).await?,
            // A marker left by an earlier write would expire the new value.
            None => self.store.remove_item(&expiry_key).await?,
        }

        self.store
            .set_item(&envelope::storage_key(&self.prefix, key), raw)
            .await?;

        if key.is_sensitive() {
            debug!(key = %key, "Cached value (redacted)");
        } else {
            debug!(key = %key, ?deadline, "Cached value");
        }
        Ok(())
    }

    /// Deletes `key` and its expiry marker.
    pub async fn remove(&self, key: CacheKey) -> StateResult<()> {
        self.store
            .remove_item(&envelope::storage_key(&self.prefix, key))
            .await?;
        self.store
            .remove_item(&envelope::expiry_key(&self.prefix, key))
            .await?;

        if let Ok(mut mirror) = self.mirror.write() {
            mirror.remove(&key);
        }
        debug!(key = %key, "Removed cached value");
        Ok(())
    }

    /// Returns the last value written through this instance, without touching
    /// the store.
    pub fn peek(&self, key: CacheKey) -> Option<Value> {
        self.mirror
            .read()
            .ok()
            .and_then(|mirror| mirror.get(&key).cloned())
    }
}

#[async_trait]
impl CacheSource for Cache {
    async fn read(&self, key: CacheKey) -> StateResult<Option<Value>> {
        let marker = self
            .store
            .get_item(&envelope::expiry_key(&self.prefix, key))
            .await?;
        if envelope::is_expired(marker.as_deref(), Utc::now()) {
            debug!(key = %key, "Cached value expired");
            return Ok(None);
        }

        let item = self
            .store
            .get_item(&envelope::storage_key(&self.prefix, key))
            .await?;
        // An empty item counts as never written.
        Ok(item
            .filter(|raw| !raw.is_empty())
            .as_deref()
            .map(envelope::parse_item))
    }
}
