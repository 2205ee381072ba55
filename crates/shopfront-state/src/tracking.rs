//! # Tracking Permission Capability
//!
//! App tracking transparency only exists on iOS. Elsewhere tracking is
//! always allowed and the provider is never consulted.
//!
//! ```text
//! check() ──► granted | limited | unavailable ──► true
//!         ──► blocked                          ──► false
//!         ──► denied ──► request() ──► granted | limited | unavailable ──► true
//!                                  ──► anything else                   ──► false
//! ```

use async_trait::async_trait;
use tracing::debug;

use shopfront_core::{PermissionStatus, Platform};

use crate::capability::Capability;
use crate::error::StateResult;

/// Port to the OS permission API for a single permission.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn check(&self) -> StateResult<PermissionStatus>;

    /// Shows the OS prompt if the user has not decided yet.
    async fn request(&self) -> StateResult<PermissionStatus>;
}

/// The tracking permission as a [`Capability`].
///
/// On iOS a query that finds the permission undecided shows the OS prompt.
/// [`SynchronizedCapability`](crate::capability::SynchronizedCapability)
/// queries on activation, so mounting one over this capability may prompt
/// right away rather than on the next return to the foreground.
pub struct TrackingCapability<P> {
    provider: P,
    platform: Platform,
}

impl<P: PermissionProvider> TrackingCapability<P> {
    pub fn new(provider: P, platform: Platform) -> Self {
        TrackingCapability { provider, platform }
    }

    async fn request_usable(&self) -> StateResult<bool> {
        let status = self.provider.request().await?;
        debug!(%status, "Tracking permission requested");
        Ok(status.is_usable())
    }
}

#[async_trait]
impl<P: PermissionProvider> Capability for TrackingCapability<P> {
    fn name(&self) -> &str {
        "tracking"
    }

    async fn is_enabled(&self) -> StateResult<bool> {
        if self.platform != Platform::Ios {
            return Ok(true);
        }

        let status = self.provider.check().await?;
        match status.resolve() {
            Some(usable) => Ok(usable),
            None => self.request_usable().await,
        }
    }

    async fn set_enabled(&self, enabled: bool) -> StateResult<bool> {
        if self.platform != Platform::Ios {
            return Ok(true);
        }

        if enabled {
            self.request_usable().await
        } else {
            // An OS permission cannot be revoked from inside the app.
            self.is_enabled().await
        }
    }
}
