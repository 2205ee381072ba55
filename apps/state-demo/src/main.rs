//! # Shopfront State Demo
//!
//! Walks through a typical session:
//!
//! 1. The settings screen mounts. The recent-searches loader and the push
//!    toggle both start unknown and fill in asynchronously.
//! 2. The user leaves the app and turns notification permission on in the
//!    system settings.
//! 3. The app returns to the foreground. The toggle re-queries, then confirms
//!    a second later.
//! 4. The user turns push off from inside the app.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopfront_core::{AppState, CacheKey, Platform};
use shopfront_state::{
    Cache, CachedValueLoader, LifecycleBus, MemoryStore, PushCapability, PushDeviceState,
    PushProvider, StateConfig, StateResult, SynchronizedCapability, TracingObserver,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = StateConfig::load_or_default(None);
    info!(
        prefix = %config.cache.prefix,
        confirm_delay_ms = config.capability.confirm_delay_ms,
        "Configuration loaded"
    );

    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(Cache::new(store, &config.cache));
    cache
        .set(
            CacheKey::RecentSearches,
            &serde_json::json!(["jordan 1", "dunk low"]),
            None,
        )
        .await?;
    cache.set(CacheKey::PushEnabled, &true, Some(60)).await?;

    let bus = LifecycleBus::init_global(&config.lifecycle);
    let observer = Arc::new(TracingObserver);

    // 1. Mount.
    let mut searches = CachedValueLoader::<Vec<String>>::new(cache.clone())
        .with_observer(observer.clone());
    let initial = searches.load_with(CacheKey::RecentSearches, |loaded| {
        info!(?loaded, "Recent searches loaded");
    });
    info!(?initial, "Recent searches on first render");

    let device = SimulatedPush::new(false, true);
    let push = SynchronizedCapability::activate_with_observer(
        Arc::new(PushCapability::new(device.clone(), Platform::Android)),
        bus,
        &config.capability,
        observer,
    );
    let mut snapshots = push.subscribe();
    info!(snapshot = ?push.snapshot(), "Push toggle on first render");

    snapshots.changed().await?;
    let synced = *snapshots.borrow_and_update();
    info!(snapshot = ?synced, "Push toggle synced");
    info!(searches = ?searches.value(), "Recent searches after load");

    // 2. Background, permission granted outside the app.
    bus.publish(AppState::Background);
    device.grant_permission();

    // 3. Foreground: query now, confirm after the delay.
    bus.publish(AppState::Active);
    tokio::time::sleep(config.capability.confirm_delay() + Duration::from_millis(100)).await;
    let resynced = *snapshots.borrow_and_update();
    info!(snapshot = ?resynced, "Push toggle after foreground");

    // 4. Toggle off.
    push.request_toggle();
    snapshots.changed().await?;
    let toggled = *snapshots.borrow_and_update();
    info!(snapshot = ?toggled, "Push toggle after user toggle");

    push.deactivate();
    searches.deactivate();
    tokio::task::yield_now().await;
    info!(listeners = bus.subscriber_count(), "Settings screen unmounted");

    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show every cache read and capability resolution
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopfront_state=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Push SDK stand-in whose permission can be flipped from "system settings".
/// Clones share the same device.
#[derive(Clone)]
struct SimulatedPush {
    permission: Arc<AtomicBool>,
    subscribed: Arc<AtomicBool>,
}

impl SimulatedPush {
    fn new(permission: bool, subscribed: bool) -> Self {
        SimulatedPush {
            permission: Arc::new(AtomicBool::new(permission)),
            subscribed: Arc::new(AtomicBool::new(subscribed)),
        }
    }

    fn grant_permission(&self) {
        info!("User granted notification permission in system settings");
        self.permission.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PushProvider for SimulatedPush {
    async fn device_state(&self) -> StateResult<Option<PushDeviceState>> {
        Ok(Some(PushDeviceState {
            has_notification_permission: self.permission.load(Ordering::SeqCst),
            is_subscribed: self.subscribed.load(Ordering::SeqCst),
        }))
    }

    async fn prompt_for_permission(&self) -> StateResult<bool> {
        self.permission.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn disable_push(&self, disabled: bool) -> StateResult<()> {
        self.subscribed.store(!disabled, Ordering::SeqCst);
        Ok(())
    }
}
