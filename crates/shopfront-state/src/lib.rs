//! # shopfront-state: Cache-Backed Async State for Shopfront
//!
//! This crate keeps UI-facing values in step with sources that are slow
//! (the persistent cache) or owned by someone else (OS permissions, the push
//! SDK), without ever surfacing their failures to the UI.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shopfront State Layer                           │
//! │                                                                         │
//! │  ┌──────────────────────────┐        ┌──────────────────────────────┐  │
//! │  │   CachedValueLoader<T>   │        │   SynchronizedCapability     │  │
//! │  │                          │        │                              │  │
//! │  │ One read per activation  │        │ Query on activation          │  │
//! │  │ and per key change       │        │ Query + confirm on foreground│  │
//! │  │ Results dropped after    │        │ Toggle applies the reported  │  │
//! │  │ deactivation             │        │ result                       │  │
//! │  └────────────┬─────────────┘        └───────┬──────────────┬───────┘  │
//! │               │                              │              │          │
//! │               ▼                              ▼              │          │
//! │  ┌──────────────────────────┐   ┌────────────────────────┐  │          │
//! │  │ Cache (expiry, prefix)   │   │ PushCapability         │  │          │
//! │  │        │                 │   │ TrackingCapability     │  │          │
//! │  │        ▼                 │   └────────────────────────┘  │          │
//! │  │ KeyValueStore (platform) │                               │          │
//! │  └──────────────────────────┘   ┌───────────────────────────▼───────┐  │
//! │                                 │ LifecycleBus (process-wide)       │  │
//! │                                 │ RAII subscriptions                │  │
//! │                                 └───────────────────────────────────┘  │
//! │                                                                         │
//! │  Swallowed failures ──► FailureObserver (NoOp by default)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`loader`] - `CachedValueLoader` for mount-time cache reads
//! - [`capability`] - `Capability` port and `SynchronizedCapability`
//! - [`lifecycle`] - Process-wide foreground/background bus
//! - [`cache`] - Typed, expiring cache over a key-value store
//! - [`store`] - Key-value store port and in-memory store
//! - [`push`] - Push notification capability adapter
//! - [`tracking`] - Tracking permission capability adapter
//! - [`observer`] - Failure observers
//! - [`config`] - State layer configuration
//! - [`error`] - State layer error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopfront_state::{
//!     Cache, CachedValueLoader, LifecycleBus, MemoryStore, StateConfig, SynchronizedCapability,
//! };
//! use shopfront_core::{AppState, CacheKey};
//!
//! let config = StateConfig::load_or_default(None);
//! let cache = Arc::new(Cache::new(Arc::new(MemoryStore::new()), &config.cache));
//!
//! let mut searches = CachedValueLoader::<Vec<String>>::new(cache);
//! searches.load(CacheKey::RecentSearches);
//!
//! let push = SynchronizedCapability::activate(push_capability, LifecycleBus::global(), &config.capability);
//! LifecycleBus::global().publish(AppState::Active);
//! push.request_toggle();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod capability;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod observer;
pub mod push;
pub mod store;
pub mod tracking;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::{Cache, CacheSource};
pub use capability::{Capability, SynchronizedCapability};
pub use config::{CacheSettings, CapabilitySettings, LifecycleSettings, StateConfig};
pub use error::{StateError, StateResult};
pub use lifecycle::{LifecycleBus, LifecycleSubscription};
pub use loader::CachedValueLoader;
pub use observer::{FailureObserver, NoOpObserver, SyncFailure, TracingObserver};
pub use push::{PushCapability, PushDeviceState, PushProvider};
pub use store::{KeyValueStore, MemoryStore};
pub use tracking::{PermissionProvider, TrackingCapability};
