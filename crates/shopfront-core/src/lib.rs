//! # shopfront-core: Pure Domain Types for the Shopfront App
//!
//! This crate holds the rules of the storefront's cache-backed state layer
//! as plain data and pure functions. Everything that suspends (storage
//! reads, permission prompts, timers) lives in `shopfront-state`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI Layer (screens, controls)                 │   │
//! │  │     Settings toggle ──► Search history ──► Checkout defaults    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopfront-state (async layer)                   │   │
//! │  │   CachedValueLoader, SynchronizedCapability, LifecycleBus       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopfront-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │ cache_key │  │ envelope  │  │ capability │  │ lifecycle │  │   │
//! │  │   │ CacheKey  │  │ prefixes  │  │ Phase      │  │ AppState  │  │   │
//! │  │   │ Category  │  │ expiry    │  │ Snapshot   │  │ Event     │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TIMERS • NO TASKS • PURE FUNCTIONS                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cache_key`] - Closed set of persistent cache keys
//! - [`envelope`] - How values are laid out in the key-value store
//! - [`capability`] - State machine for an externally owned boolean
//! - [`lifecycle`] - Foreground/background application states
//! - [`permission`] - OS permission statuses and platforms
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfront_core::{AppState, CacheKey, LifecycleEvent};
//!
//! let key: CacheKey = "recent_searches".parse().unwrap();
//! assert_eq!(key.as_str(), "recent_searches");
//!
//! let event = LifecycleEvent::new(AppState::Background, AppState::Active);
//! assert!(event.is_foreground_transition());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache_key;
pub mod capability;
pub mod envelope;
pub mod error;
pub mod lifecycle;
pub mod permission;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cache_key::{CacheKey, InterestCategory};
pub use capability::{CapabilityPhase, CapabilitySnapshot, CapabilityState, SyncTrigger};
pub use error::{CoreError, CoreResult};
pub use lifecycle::{AppState, LifecycleEvent};
pub use permission::{PermissionStatus, Platform};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix applied to every cache entry in the key-value store.
pub const DEFAULT_CACHE_PREFIX: &str = "@ns:";

/// Delay between the first and the confirmatory capability query after the
/// app returns to the foreground.
///
/// ## Business Reason
/// OS permission dialogs resolve a moment after the app regains focus, so a
/// single query right after the transition frequently reads the old value.
pub const DEFAULT_CONFIRM_DELAY_MS: u64 = 1_000;
