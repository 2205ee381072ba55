//! # Error Types
//!
//! Domain-specific error types for shopfront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopfront-core errors (this file)                                     │
//! │  └── CoreError        - Parsing and envelope rule violations           │
//! │                                                                         │
//! │  shopfront-state errors (separate crate)                               │
//! │  └── StateError       - Store, capability, and config failures         │
//! │                                                                         │
//! │  Flow: CoreError → StateError → (swallowed at loader/capability edge)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised by the pure domain rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A string did not name any known cache key.
    ///
    /// ## When This Occurs
    /// Only when a key arrives as text (config files, CLI input). Code that
    /// uses [`crate::CacheKey`] directly cannot produce it.
    #[error("Unknown cache key: '{0}'")]
    UnknownCacheKey(String),

    /// A string did not name any application lifecycle state.
    #[error("Unknown app state: '{0}'")]
    UnknownAppState(String),

    /// A string did not name any permission status.
    #[error("Unknown permission status: '{0}'")]
    UnknownPermissionStatus(String),

    /// An expiry of zero minutes would expire the value before it is written.
    #[error("Cache expiry must be at least one minute, got {minutes}")]
    InvalidExpiry { minutes: u32 },

    /// A stored value could not be decoded into the requested type.
    #[error("Cannot decode cached value for '{key}': {reason}")]
    Decode { key: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
