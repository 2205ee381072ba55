//! # Lifecycle Bus
//!
//! Process-wide fan-out of application foreground/background changes.
//!
//! ## Message Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Lifecycle Bus                                  │
//! │                                                                         │
//! │  Platform callback ──► publish(AppState::Active)                       │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                  ┌───────────────────────┐                              │
//! │                  │ current: Background   │  unchanged state → dropped   │
//! │                  │ → Active              │                              │
//! │                  └───────────┬───────────┘                              │
//! │                              │ LifecycleEvent { Background, Active }    │
//! │              ┌───────────────┼───────────────┐                          │
//! │              ▼               ▼               ▼                          │
//! │      Subscription A   Subscription B   Subscription C                   │
//! │      (push toggle)    (tracking)       (...)                            │
//! │                                                                         │
//! │  Dropping a subscription unregisters it. There is no other way to      │
//! │  leave the bus, so a dropped owner can never leak a listener.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{OnceLock, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use shopfront_core::{AppState, LifecycleEvent};

use crate::config::LifecycleSettings;

static GLOBAL_BUS: OnceLock<LifecycleBus> = OnceLock::new();

// =============================================================================
// Lifecycle Bus
// =============================================================================

/// Broadcasts [`LifecycleEvent`]s to every live subscription.
pub struct LifecycleBus {
    tx: broadcast::Sender<LifecycleEvent>,
    current: RwLock<AppState>,
}

impl LifecycleBus {
    /// Creates a standalone bus. The app uses [`LifecycleBus::global`]; tests
    /// create their own so they do not observe each other's events.
    pub fn new(settings: &LifecycleSettings) -> Self {
        let (tx, _) = broadcast::channel(settings.channel_capacity.max(1));
        LifecycleBus {
            tx,
            current: RwLock::new(AppState::Active),
        }
    }

    /// The process-wide bus, created on first use with default settings.
    pub fn global() -> &'static LifecycleBus {
        Self::init_global(&LifecycleSettings::default())
    }

    /// Creates the process-wide bus with `settings`. Has no effect if the bus
    /// already exists.
    pub fn init_global(settings: &LifecycleSettings) -> &'static LifecycleBus {
        GLOBAL_BUS.get_or_init(|| {
            debug!(capacity = settings.channel_capacity, "Creating global lifecycle bus");
            LifecycleBus::new(settings)
        })
    }

    /// Last state published.
    pub fn current(&self) -> AppState {
        self.current.read().map(|s| *s).unwrap_or_default()
    }

    /// Records a new platform state and notifies subscribers if it changed.
    ///
    /// Returns the delivered event, or `None` if the state was unchanged.
    pub fn publish(&self, state: AppState) -> Option<LifecycleEvent> {
        let previous = {
            let mut current = match self.current.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::replace(&mut *current, state)
        };

        if previous == state {
            debug!(%state, "Ignoring repeated app state");
            return None;
        }

        let event = LifecycleEvent::new(previous, state);
        // No receivers is fine: nothing is mounted that cares.
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!(%event, delivered, "Published lifecycle event");
        Some(event)
    }

    /// Registers a new listener. Events published before this call are not
    /// replayed.
    pub fn subscribe(&self) -> LifecycleSubscription {
        let id = Uuid::new_v4();
        debug!(subscription = %id, "Lifecycle subscription registered");
        LifecycleSubscription {
            id,
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

// =============================================================================
// Lifecycle Subscription
// =============================================================================

/// A registered listener on a [`LifecycleBus`]. Unregisters on drop.
pub struct LifecycleSubscription {
    id: Uuid,
    rx: broadcast::Receiver<LifecycleEvent>,
}

impl LifecycleSubscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the next event. Returns `None` once the bus is gone.
    ///
    /// A listener that fell behind skips the events it missed and continues
    /// with the oldest one still buffered.
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(subscription = %self.id, skipped, "Lifecycle listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for LifecycleSubscription {
    fn drop(&mut self) {
        debug!(subscription = %self.id, "Lifecycle subscription released");
    }
}
