//! # Synchronized Capability
//!
//! Keeps a UI-bound boolean in step with an external capability (push
//! notifications, tracking permission) that can change while the app is in
//! the background.
//!
//! ## Synchronization Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     SynchronizedCapability                              │
//! │                                                                         │
//! │  activate ──► subscribe to LifecycleBus ──► query #1 (Activation)      │
//! │                                                                         │
//! │  LifecycleBus: Background ──► Active                                   │
//! │       │                                                                 │
//! │       ├──► query #n   (Foreground)                                     │
//! │       └──► sleep(confirm_delay) ──► query #n+1 (ForegroundConfirm)     │
//! │                                                                         │
//! │  request_toggle ──► set_enabled(!enabled) #m (Toggle)                  │
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────┐     │
//! │  │ resolve(#k, value)                                            │     │
//! │  │   deactivated?        ──► discard                             │     │
//! │  │   #k older than last applied? ──► discard (superseded)        │     │
//! │  │   else                ──► state = Synced(value), notify UI    │     │
//! │  └───────────────────────────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calls are numbered when issued. A resolution is applied only if no later
//! issued call has already been applied, so the confirmatory query always
//! has the final word over the query it follows, whichever returns first.
//!
//! Failed calls leave the state untouched. They are logged at `debug` and
//! handed to the configured [`FailureObserver`]; nothing reaches the UI.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use shopfront_core::{CapabilitySnapshot, CapabilityState, SyncTrigger};

use crate::config::CapabilitySettings;
use crate::error::StateResult;
use crate::lifecycle::{LifecycleBus, LifecycleSubscription};
use crate::observer::{FailureObserver, NoOpObserver, SyncFailure};

// =============================================================================
// Capability Port
// =============================================================================

/// An external boolean feature that can be queried and changed.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Short name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Current value as reported by the external system.
    async fn is_enabled(&self) -> StateResult<bool>;

    /// Requests a new value. Returns the value the external system ended up
    /// with, which may differ from `enabled`.
    async fn set_enabled(&self, enabled: bool) -> StateResult<bool>;
}

// =============================================================================
// Shared State
// =============================================================================

struct Tracked {
    state: CapabilityState,
    /// Issue number of the last applied resolution.
    applied: u64,
}

struct Shared {
    id: Uuid,
    capability: Arc<dyn Capability>,
    observer: Arc<dyn FailureObserver>,
    confirm_delay: Duration,
    token: CancellationToken,
    issued: AtomicU64,
    tracked: Mutex<Tracked>,
    snapshots: watch::Sender<CapabilitySnapshot>,
}

impl Shared {
    fn tracked(&self) -> MutexGuard<'_, Tracked> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn spawn_query(self: &Arc<Self>, trigger: SyncTrigger) {
        let issue = self.next_issue();
        let shared = self.clone();
        debug!(sync = %self.id, capability = self.capability.name(), %trigger, issue, "Querying capability");

        tokio::spawn(async move {
            match shared.capability.is_enabled().await {
                Ok(value) => shared.resolve(issue, trigger, value),
                Err(e) => shared.report(SyncFailure::CapabilityQuery {
                    capability: shared.capability.name().to_string(),
                    trigger,
                    error: e.to_string(),
                }),
            }
        });
    }

    fn spawn_toggle(self: &Arc<Self>) {
        let requested = self.tracked().state.toggle_target();
        let issue = self.next_issue();
        let shared = self.clone();
        debug!(sync = %self.id, capability = self.capability.name(), requested, issue, "Requesting capability change");

        tokio::spawn(async move {
            match shared.capability.set_enabled(requested).await {
                Ok(value) => shared.resolve(issue, SyncTrigger::Toggle, value),
                Err(e) => shared.report(SyncFailure::CapabilityMutate {
                    capability: shared.capability.name().to_string(),
                    requested,
                    error: e.to_string(),
                }),
            }
        });
    }

    /// Queries now and again after the confirm delay.
    fn resync(self: &Arc<Self>) {
        self.spawn_query(SyncTrigger::Foreground);

        let shared = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shared.token.cancelled() => {}
                _ = tokio::time::sleep(shared.confirm_delay) => {
                    shared.spawn_query(SyncTrigger::ForegroundConfirm);
                }
            }
        });
    }

    fn resolve(&self, issue: u64, trigger: SyncTrigger, value: bool) {
        let mut tracked = self.tracked();

        if self.token.is_cancelled() {
            debug!(sync = %self.id, %trigger, issue, "Discarding result for deactivated capability");
            return;
        }
        if issue < tracked.applied {
            debug!(sync = %self.id, %trigger, issue, applied = tracked.applied, "Discarding superseded result");
            return;
        }

        tracked.applied = issue;
        let changed = tracked.state.apply(trigger, value);
        let snapshot = tracked.state.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });

        debug!(sync = %self.id, capability = self.capability.name(), %trigger, value, changed, "Capability resolved");
    }

    fn report(&self, failure: SyncFailure) {
        if self.token.is_cancelled() {
            return;
        }
        debug!(sync = %self.id, ?failure, "Capability call failed, keeping previous value");
        self.observer.on_failure(&failure);
    }
}

// =============================================================================
// Synchronized Capability
// =============================================================================

/// Mirrors a [`Capability`] for one UI owner for as long as it is active.
///
/// Must be created from within a Tokio runtime. Deactivates on drop.
pub struct SynchronizedCapability {
    shared: Arc<Shared>,
}

impl SynchronizedCapability {
    /// Starts mirroring `capability`: subscribes to `bus` and issues the
    /// initial query.
    pub fn activate(
        capability: Arc<dyn Capability>,
        bus: &LifecycleBus,
        settings: &CapabilitySettings,
    ) -> Self {
        Self::activate_with_observer(capability, bus, settings, Arc::new(NoOpObserver))
    }

    /// Like [`activate`](Self::activate), reporting swallowed failures to
    /// `observer`.
    pub fn activate_with_observer(
        capability: Arc<dyn Capability>,
        bus: &LifecycleBus,
        settings: &CapabilitySettings,
        observer: Arc<dyn FailureObserver>,
    ) -> Self {
        let (snapshots, _) = watch::channel(CapabilitySnapshot::default());
        let shared = Arc::new(Shared {
            id: Uuid::new_v4(),
            capability,
            observer,
            confirm_delay: settings.confirm_delay(),
            token: CancellationToken::new(),
            issued: AtomicU64::new(0),
            tracked: Mutex::new(Tracked {
                state: CapabilityState::new(),
                applied: 0,
            }),
            snapshots,
        });

        // Subscribe before the first query so no transition is missed.
        let subscription = bus.subscribe();
        debug!(
            sync = %shared.id,
            capability = shared.capability.name(),
            subscription = %subscription.id(),
            "Capability sync activated"
        );

        tokio::spawn(listen(shared.clone(), subscription));
        shared.spawn_query(SyncTrigger::Activation);

        SynchronizedCapability { shared }
    }

    pub fn name(&self) -> &str {
        self.shared.capability.name()
    }

    /// The value to render. `false` until the first resolution.
    pub fn enabled(&self) -> bool {
        self.shared.tracked().state.enabled()
    }

    pub fn state(&self) -> CapabilityState {
        self.shared.tracked().state
    }

    pub fn snapshot(&self) -> CapabilitySnapshot {
        self.shared.tracked().state.snapshot()
    }

    /// Receives a new snapshot each time the rendered state changes.
    pub fn subscribe(&self) -> watch::Receiver<CapabilitySnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Asks the external system for the inverse of the current value. The
    /// value it reports back becomes the new state.
    pub fn request_toggle(&self) {
        if !self.is_active() {
            debug!(sync = %self.shared.id, "Ignoring toggle on deactivated capability");
            return;
        }
        self.shared.spawn_toggle();
    }

    pub fn is_active(&self) -> bool {
        !self.shared.token.is_cancelled()
    }

    /// Stops listening for lifecycle events and discards the results of any
    /// call still in flight.
    pub fn deactivate(&self) {
        if self.is_active() {
            self.shared.token.cancel();
            debug!(sync = %self.shared.id, capability = self.name(), "Capability sync deactivated");
        }
    }
}

impl Drop for SynchronizedCapability {
    fn drop(&mut self) {
        self.deactivate();
    }
}

/// Reacts to lifecycle events until deactivated. Owns the subscription, so
/// returning releases it.
async fn listen(shared: Arc<Shared>, mut subscription: LifecycleSubscription) {
    loop {
        tokio::select! {
            _ = shared.token.cancelled() => break,
            event = subscription.recv() => match event {
                Some(event) if event.is_foreground_transition() => {
                    debug!(sync = %shared.id, %event, "Foreground transition, resyncing");
                    shared.resync();
                }
                Some(_) => {}
                None => break,
            },
        }
    }
}
