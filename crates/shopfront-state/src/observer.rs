//! # Failure Observers
//!
//! The loader and the synchronized capability never surface errors to the
//! UI. Instead they hand each swallowed failure to a [`FailureObserver`], so
//! an app can count or report them without changing what the user sees.

use shopfront_core::{CacheKey, SyncTrigger};
use tracing::warn;

/// A failure that was absorbed at the UI boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncFailure {
    /// A cache read failed; the loaded value stays unknown.
    CacheRead { key: CacheKey, error: String },

    /// A capability query failed; the previous value is kept.
    CapabilityQuery {
        capability: String,
        trigger: SyncTrigger,
        error: String,
    },

    /// A capability mutation failed; the previous value is kept.
    CapabilityMutate {
        capability: String,
        requested: bool,
        error: String,
    },
}

/// Receives failures swallowed by the state layer.
pub trait FailureObserver: Send + Sync {
    fn on_failure(&self, failure: &SyncFailure);
}

/// Discards failures. The default.
pub struct NoOpObserver;

impl FailureObserver for NoOpObserver {
    fn on_failure(&self, _failure: &SyncFailure) {}
}

/// Logs every failure at `warn` level.
pub struct TracingObserver;

impl FailureObserver for TracingObserver {
    fn on_failure(&self, failure: &SyncFailure) {
        match failure {
            SyncFailure::CacheRead { key, error } => {
                warn!(key = %key, error = %error, "Cache read failed");
            }
            SyncFailure::CapabilityQuery {
                capability,
                trigger,
                error,
            } => {
                warn!(capability = %capability, trigger = %trigger, error = %error, "Capability query failed");
            }
            SyncFailure::CapabilityMutate {
                capability,
                requested,
                error,
            } => {
                warn!(capability = %capability, requested, error = %error, "Capability change failed");
            }
        }
    }
}
