//! # Cached Value Loader
//!
//! Reads one value from the persistent cache when a UI component mounts and
//! holds it for that component, without blocking the render that asked.
//!
//! ## Activation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CachedValueLoader<T>                               │
//! │                                                                         │
//! │  load(key) ──► same key as the live activation? ──► return held value  │
//! │       │                                                                 │
//! │       ▼ (first call or new key)                                         │
//! │  cancel previous activation token, clear holder                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  spawn ──► source.read(key) ──► decode T                               │
//! │                                    │                                    │
//! │                  token cancelled? ─┤                                    │
//! │                     yes: discard   │ no: holder = value, on_loaded(value)│
//! │                                                                         │
//! │  Failures: holder stays None, observer notified, callback not invoked. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `None` from [`CachedValueLoader::value`] means "not known yet". It does not
//! mean the cache is empty; the completion callback is how a caller learns
//! that a read finished and found nothing.

use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use shopfront_core::envelope;
use shopfront_core::CacheKey;

use crate::cache::CacheSource;
use crate::error::StateResult;
use crate::observer::{FailureObserver, NoOpObserver, SyncFailure};

type OnLoaded<T> = Box<dyn FnOnce(Option<T>) + Send + 'static>;

/// The live activation: which key was requested and the token that scopes
/// its in-flight read.
struct Activation {
    key: CacheKey,
    token: CancellationToken,
}

/// Loads a cached value for one component instance.
///
/// Must be used from within a Tokio runtime.
pub struct CachedValueLoader<T> {
    id: Uuid,
    source: Arc<dyn CacheSource>,
    observer: Arc<dyn FailureObserver>,
    holder: Arc<RwLock<Option<T>>>,
    activation: Option<Activation>,
}

impl<T> CachedValueLoader<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(source: Arc<dyn CacheSource>) -> Self {
        CachedValueLoader {
            id: Uuid::new_v4(),
            source,
            observer: Arc::new(NoOpObserver),
            holder: Arc::new(RwLock::new(None)),
            activation: None,
        }
    }

    /// Reports swallowed read failures to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn FailureObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Activates for `key` and returns the value held so far.
    ///
    /// Calling again with the same key issues no new read.
    pub fn load(&mut self, key: CacheKey) -> Option<T> {
        self.activate(key, None);
        self.value()
    }

    /// Like [`load`](Self::load), and calls `on_loaded` once when the read
    /// issued by this activation resolves. The callback is dropped unused if
    /// the key is unchanged, the read fails, or the loader deactivates first.
    ///
    /// `on_loaded` runs while the loaded value is locked and must not call
    /// back into this loader.
    pub fn load_with<F>(&mut self, key: CacheKey, on_loaded: F) -> Option<T>
    where
        F: FnOnce(Option<T>) + Send + 'static,
    {
        self.activate(key, Some(Box::new(on_loaded)));
        self.value()
    }

    /// The most recently loaded value for the active key.
    pub fn value(&self) -> Option<T> {
        self.holder
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The key of the live activation.
    pub fn key(&self) -> Option<CacheKey> {
        self.activation.as_ref().map(|a| a.key)
    }

    pub fn is_active(&self) -> bool {
        self.activation.is_some()
    }

    /// Ends the activation. Reads still in flight complete but their results
    /// are discarded.
    pub fn deactivate(&mut self) {
        if let Some(activation) = self.activation.take() {
            activation.token.cancel();
            self.clear_holder();
            debug!(loader = %self.id, key = %activation.key, "Cached value loader deactivated");
        }
    }

    fn activate(&mut self, key: CacheKey, on_loaded: Option<OnLoaded<T>>) {
        if self.key() == Some(key) {
            return;
        }

        if let Some(previous) = self.activation.take() {
            previous.token.cancel();
            self.clear_holder();
            debug!(loader = %self.id, from = %previous.key, to = %key, "Cache key changed");
        }

        let token = CancellationToken::new();
        self.activation = Some(Activation {
            key,
            token: token.clone(),
        });

        debug!(loader = %self.id, key = %key, "Issuing cache read");
        tokio::spawn(read_into_holder(
            self.id,
            key,
            self.source.clone(),
            self.observer.clone(),
            self.holder.clone(),
            token,
            on_loaded,
        ));
    }

    fn clear_holder(&self) {
        *self.holder.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl<T> Drop for CachedValueLoader<T> {
    fn drop(&mut self) {
        if let Some(activation) = self.activation.take() {
            activation.token.cancel();
            // Waits out a callback already running.
            *self.holder.write().unwrap_or_else(PoisonError::into_inner) = None;
        }
    }
}

/// Body of the spawned read for one activation.
async fn read_into_holder<T>(
    loader: Uuid,
    key: CacheKey,
    source: Arc<dyn CacheSource>,
    observer: Arc<dyn FailureObserver>,
    holder: Arc<RwLock<Option<T>>>,
    token: CancellationToken,
    on_loaded: Option<OnLoaded<T>>,
) where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let result = read_typed::<T>(source.as_ref(), key).await;

    let value = match result {
        Ok(value) => value,
        Err(e) => {
            if !token.is_cancelled() {
                debug!(loader = %loader, key = %key, error = %e, "Cache read failed");
                observer.on_failure(&SyncFailure::CacheRead {
                    key,
                    error: e.to_string(),
                });
            }
            return;
        }
    };

    // The liveness check, the write and the callback all happen under the
    // holder lock. A concurrent deactivate either waits for all three or
    // wins and none of them happen.
    let mut held = holder.write().unwrap_or_else(PoisonError::into_inner);
    if token.is_cancelled() {
        debug!(loader = %loader, key = %key, "Discarding cache read for ended activation");
        return;
    }

    *held = value.clone();
    debug!(loader = %loader, key = %key, found = value.is_some(), "Cache read resolved");
    if let Some(callback) = on_loaded {
        callback(value);
    }
}

async fn read_typed<T: DeserializeOwned>(
    source: &dyn CacheSource,
    key: CacheKey,
) -> StateResult<Option<T>> {
    match source.read(key).await? {
        Some(raw) => Ok(Some(envelope::decode_item(key, raw)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::config::CacheSettings;
    use crate::observer::testing::RecordingObserver;
    use crate::store::{KeyValueStore, MemoryStore};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Source whose reads block until the test releases them.
    struct GatedSource {
        values: HashMap<CacheKey, Value>,
        reads: AtomicUsize,
        gate: Semaphore,
    }

    impl GatedSource {
        fn open(values: HashMap<CacheKey, Value>) -> Arc<Self> {
            Arc::new(GatedSource {
                values,
                reads: AtomicUsize::new(0),
                gate: Semaphore::new(Semaphore::MAX_PERMITS),
            })
        }

        fn closed(values: HashMap<CacheKey, Value>) -> Arc<Self> {
            Arc::new(GatedSource {
                values,
                reads: AtomicUsize::new(0),
                gate: Semaphore::new(0),
            })
        }

        fn release(&self, reads: usize) {
            self.gate.add_permits(reads);
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CacheSource for GatedSource {
        async fn read(&self, key: CacheKey) -> StateResult<Option<Value>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let permit = self.gate.acquire().await.expect("gate closed");
            permit.forget();
            Ok(self.values.get(&key).cloned())
        }
    }

    /// Lets every spawned task run until it blocks.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnOnce(T) + Send + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        (calls, move |value| sink.lock().unwrap().push(value))
    }

    #[tokio::test(start_paused = true)]
    async fn test_unwritten_key_resolves_to_none() {
        let source = GatedSource::open(HashMap::new());
        let mut loader = CachedValueLoader::<String>::new(source.clone());
        let (calls, callback) = recorder();

        assert_eq!(loader.load_with(CacheKey::LastTickerText, callback), None);
        settle().await;

        assert_eq!(loader.value(), None);
        assert_eq!(*calls.lock().unwrap(), vec![None]);
        assert_eq!(source.reads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stored_value_is_loaded_and_reported_once() {
        let source = GatedSource::open(HashMap::from([(CacheKey::PushEnabled, json!(true))]));
        let mut loader = CachedValueLoader::<bool>::new(source.clone());
        let (calls, callback) = recorder();

        assert_eq!(loader.load_with(CacheKey::PushEnabled, callback), None);
        settle().await;

        assert_eq!(loader.load(CacheKey::PushEnabled), Some(true));
        assert_eq!(*calls.lock().unwrap(), vec![Some(true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_read_per_distinct_key() {
        let source = GatedSource::open(HashMap::from([
            (CacheKey::IsShippingSame, json!(true)),
            (CacheKey::IsDeliverySame, json!(false)),
        ]));
        let mut loader = CachedValueLoader::<bool>::new(source.clone());

        loader.load(CacheKey::IsShippingSame);
        loader.load(CacheKey::IsShippingSame);
        settle().await;
        assert_eq!(loader.load(CacheKey::IsShippingSame), Some(true));
        assert_eq!(source.reads(), 1);

        loader.load(CacheKey::IsDeliverySame);
        settle().await;
        assert_eq!(loader.value(), Some(false));
        assert_eq!(source.reads(), 2);

        // Switching back is a new activation and reads again.
        loader.load(CacheKey::IsShippingSame);
        settle().await;
        assert_eq!(loader.value(), Some(true));
        assert_eq!(source.reads(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_change_discards_stale_read() {
        let source = GatedSource::closed(HashMap::from([
            (CacheKey::ViewedProducts(shopfront_core::InterestCategory::Apparel), json!(["hoodie"])),
            (CacheKey::ViewedProducts(shopfront_core::InterestCategory::Sneakers), json!(["dunk"])),
        ]));
        let mut loader = CachedValueLoader::<Vec<String>>::new(source.clone());
        let (stale_calls, stale_callback) = recorder();

        loader.load_with(
            CacheKey::ViewedProducts(shopfront_core::InterestCategory::Apparel),
            stale_callback,
        );
        settle().await;
        loader.load(CacheKey::ViewedProducts(shopfront_core::InterestCategory::Sneakers));
        settle().await;

        // Both reads resolve; only the second activation's lands.
        source.release(2);
        settle().await;

        assert_eq!(loader.value(), Some(vec!["dunk".to_string()]));
        assert!(stale_calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_with_pending_read_discards_result() {
        let source = GatedSource::closed(HashMap::from([(CacheKey::RecentSearches, json!(["a"]))]));
        let mut loader = CachedValueLoader::<Vec<String>>::new(source.clone());
        let (calls, callback) = recorder();

        loader.load_with(CacheKey::RecentSearches, callback);
        settle().await;
        loader.deactivate();
        assert!(!loader.is_active());

        source.release(1);
        settle().await;

        assert_eq!(loader.value(), None);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_deactivate_racing_read_never_reports_afterwards() {
        use std::sync::atomic::AtomicBool;

        for _ in 0..200 {
            let source = GatedSource::closed(HashMap::from([(CacheKey::LastLocale, json!("en"))]));
            let mut loader = CachedValueLoader::<String>::new(source.clone());
            let deactivated = Arc::new(AtomicBool::new(false));
            let late = Arc::new(AtomicBool::new(false));

            let (seen_deactivated, report_late) = (deactivated.clone(), late.clone());
            loader.load_with(CacheKey::LastLocale, move |_| {
                std::thread::yield_now();
                if seen_deactivated.load(Ordering::SeqCst) {
                    report_late.store(true, Ordering::SeqCst);
                }
            });

            source.release(1);
            loader.deactivate();
            deactivated.store(true, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(2)).await;
            assert!(!late.load(Ordering::SeqCst));
            assert_eq!(loader.value(), None);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_cached_item_loads_as_none_without_failure() {
        let store = Arc::new(MemoryStore::new());
        store.set_item("@ns:is_delivery_same", String::new()).await.unwrap();
        let cache = Arc::new(Cache::new(store, &CacheSettings::default()));
        let observer = Arc::new(RecordingObserver::default());
        let mut loader = CachedValueLoader::<bool>::new(cache).with_observer(observer.clone());
        let (calls, callback) = recorder();

        loader.load_with(CacheKey::IsDeliverySame, callback);
        settle().await;

        assert_eq!(*calls.lock().unwrap(), vec![None]);
        assert!(observer.failures().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_with_pending_read_is_silent() {
        let source = GatedSource::closed(HashMap::from([(CacheKey::Token, json!("t"))]));
        let observer = Arc::new(RecordingObserver::default());
        let (calls, callback) = recorder();
        {
            let mut loader =
                CachedValueLoader::<String>::new(source.clone()).with_observer(observer.clone());
            loader.load_with(CacheKey::Token, callback);
            settle().await;
        }

        source.release(1);
        settle().await;

        assert!(calls.lock().unwrap().is_empty());
        assert!(observer.failures().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_read_stays_unknown_and_is_observed() {
        let store = Arc::new(MemoryStore::new());
        store.set_online(false);
        let cache = Arc::new(Cache::new(store, &CacheSettings::default()));
        let observer = Arc::new(RecordingObserver::default());
        let mut loader = CachedValueLoader::<bool>::new(cache).with_observer(observer.clone());
        let (calls, callback) = recorder();

        loader.load_with(CacheKey::PushEnabled, callback);
        settle().await;

        assert_eq!(loader.value(), None);
        assert!(calls.lock().unwrap().is_empty());
        assert!(matches!(
            observer.failures().as_slice(),
            [SyncFailure::CacheRead { key: CacheKey::PushEnabled, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_value_counts_as_failure() {
        let source = GatedSource::open(HashMap::from([(CacheKey::AppOpenCount, json!("many"))]));
        let observer = Arc::new(RecordingObserver::default());
        let mut loader = CachedValueLoader::<u32>::new(source).with_observer(observer.clone());

        loader.load(CacheKey::AppOpenCount);
        settle().await;

        assert_eq!(loader.value(), None);
        assert_eq!(observer.failures().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_through_real_cache() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(Cache::new(store.clone(), &CacheSettings::default()));
        cache
            .set(CacheKey::RecentSearches, &vec!["jordan 1"], None)
            .await
            .unwrap();

        let mut loader = CachedValueLoader::<Vec<String>>::new(cache);
        loader.load(CacheKey::RecentSearches);
        settle().await;

        assert_eq!(loader.value(), Some(vec!["jordan 1".to_string()]));
        // One read for the expiry marker, one for the item.
        assert_eq!(store.read_count(), 2);
    }
}
