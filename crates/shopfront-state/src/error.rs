//! # State Error Types
//!
//! Error types for the store, cache, capability, and config layers.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       State Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Store       │  │     Capability          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  StoreUnavail.  │  │  CapabilityUnavailable  │ │
//! │  │  ConfigLoad     │  │  Corrupt        │  │  PermissionRejected     │ │
//! │  │  ConfigSave     │  │  Domain         │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  None of these reach the UI: CachedValueLoader and                     │
//! │  SynchronizedCapability swallow them and report to a FailureObserver.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use shopfront_core::CoreError;

/// Result type alias for state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors from the async state layer.
#[derive(Debug, Error)]
pub enum StateError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid state configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// The key-value store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored entry exists but cannot be used.
    #[error("Corrupt cache entry {key}: {reason}")]
    CorruptEntry { key: String, reason: String },

    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    // =========================================================================
    // Capability Errors
    // =========================================================================
    /// The platform SDK behind a capability failed or timed out.
    #[error("Capability '{capability}' unavailable: {reason}")]
    CapabilityUnavailable { capability: String, reason: String },

    /// The platform refused to apply a requested change.
    #[error("Capability '{capability}' rejected the change: {reason}")]
    PermissionRejected { capability: String, reason: String },
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::CorruptEntry {
            key: "<unknown>".into(),
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for StateError {
    fn from(err: std::io::Error) -> Self {
        StateError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for StateError {
    fn from(err: toml::de::Error) -> Self {
        StateError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for StateError {
    fn from(err: toml::ser::Error) -> Self {
        StateError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl StateError {
    /// Returns true if a later attempt may succeed without any change on our
    /// side (the store or SDK was only temporarily unreachable).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StateError::StoreUnavailable(_) | StateError::CapabilityUnavailable { .. }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StateError::InvalidConfig(_)
                | StateError::ConfigLoadFailed(_)
                | StateError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(StateError::StoreUnavailable("disk busy".into()).is_retryable());
        assert!(StateError::CapabilityUnavailable {
            capability: "push".into(),
            reason: "sdk not ready".into(),
        }
        .is_retryable());

        assert!(!StateError::InvalidConfig("bad".into()).is_retryable());
        assert!(!StateError::PermissionRejected {
            capability: "tracking".into(),
            reason: "blocked".into(),
        }
        .is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(StateError::ConfigLoadFailed("missing".into()).is_config_error());
        assert!(!StateError::StoreUnavailable("offline".into()).is_config_error());
    }

    #[test]
    fn test_core_error_passes_through() {
        let err: StateError = CoreError::InvalidExpiry { minutes: 0 }.into();
        assert_eq!(
            err.to_string(),
            "Cache expiry must be at least one minute, got 0"
        );
    }
}
