//! # Push Notification Capability
//!
//! Adapts the push SDK to [`Capability`] so the notification toggle in
//! settings can be driven by [`SynchronizedCapability`](crate::capability::SynchronizedCapability).
//!
//! Turning push off never touches the SDK: the device stays subscribed and the
//! opt-out is kept as a user preference. Turning it on re-enables the SDK
//! subscription, after prompting for permission on iOS.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use shopfront_core::Platform;

use crate::capability::Capability;
use crate::error::StateResult;

/// Device registration as reported by the push SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushDeviceState {
    pub has_notification_permission: bool,
    pub is_subscribed: bool,
}

impl PushDeviceState {
    /// Notifications are delivered only with both permission and subscription.
    pub fn is_push_enabled(&self) -> bool {
        self.has_notification_permission && self.is_subscribed
    }
}

/// Port to the push notification SDK.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Current registration, or `None` before the SDK has initialized.
    async fn device_state(&self) -> StateResult<Option<PushDeviceState>>;

    /// Shows the OS permission prompt. Returns whether permission was granted.
    async fn prompt_for_permission(&self) -> StateResult<bool>;

    /// Pauses (`true`) or resumes (`false`) delivery to this device.
    async fn disable_push(&self, disabled: bool) -> StateResult<()>;
}

/// Push notifications as a [`Capability`].
pub struct PushCapability<P> {
    provider: P,
    platform: Platform,
}

impl<P: PushProvider> PushCapability<P> {
    pub fn new(provider: P, platform: Platform) -> Self {
        PushCapability { provider, platform }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: PushProvider> Capability for PushCapability<P> {
    fn name(&self) -> &str {
        "push"
    }

    async fn is_enabled(&self) -> StateResult<bool> {
        let state = self.provider.device_state().await?;
        Ok(state.map(|s| s.is_push_enabled()).unwrap_or(false))
    }

    async fn set_enabled(&self, enabled: bool) -> StateResult<bool> {
        if !enabled {
            debug!("Push opt-out kept as preference, SDK stays subscribed");
            return Ok(false);
        }

        match self.platform {
            Platform::Android => {
                self.provider.disable_push(false).await?;
                Ok(true)
            }
            Platform::Ios => {
                let granted = self.provider.prompt_for_permission().await?;
                self.provider.disable_push(false).await?;
                if !granted {
                    info!("Push permission denied, must be enabled from system settings");
                }
                Ok(granted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakePush {
        state: Option<PushDeviceState>,
        grant: bool,
        offline: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakePush {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushProvider for FakePush {
        async fn device_state(&self) -> StateResult<Option<PushDeviceState>> {
            if self.offline {
                return Err(StateError::CapabilityUnavailable {
                    capability: "push".into(),
                    reason: "sdk not initialized".into(),
                });
            }
            Ok(self.state)
        }

        async fn prompt_for_permission(&self) -> StateResult<bool> {
            self.calls.lock().unwrap().push("prompt".into());
            Ok(self.grant)
        }

        async fn disable_push(&self, disabled: bool) -> StateResult<()> {
            self.calls.lock().unwrap().push(format!("disable_push({disabled})"));
            Ok(())
        }
    }

    fn device(permission: bool, subscribed: bool) -> Option<PushDeviceState> {
        Some(PushDeviceState {
            has_notification_permission: permission,
            is_subscribed: subscribed,
        })
    }

    #[tokio::test]
    async fn test_enabled_requires_permission_and_subscription() {
        for (state, expected) in [
            (device(true, true), true),
            (device(true, false), false),
            (device(false, true), false),
            (None, false),
        ] {
            let push = PushCapability::new(
                FakePush {
                    state,
                    ..Default::default()
                },
                Platform::Android,
            );
            assert_eq!(push.is_enabled().await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_sdk_failure_propagates() {
        let push = PushCapability::new(
            FakePush {
                offline: true,
                ..Default::default()
            },
            Platform::Ios,
        );
        assert!(push.is_enabled().await.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_disable_leaves_sdk_alone() {
        let push = PushCapability::new(FakePush::default(), Platform::Ios);
        assert!(!push.set_enabled(false).await.unwrap());
        assert!(push.provider().calls().is_empty());
    }

    #[tokio::test]
    async fn test_enable_on_android_resubscribes_without_prompt() {
        let push = PushCapability::new(FakePush::default(), Platform::Android);
        assert!(push.set_enabled(true).await.unwrap());
        assert_eq!(push.provider().calls(), vec!["disable_push(false)"]);
    }

    #[tokio::test]
    async fn test_enable_on_ios_returns_prompt_answer() {
        for grant in [true, false] {
            let push = PushCapability::new(
                FakePush {
                    grant,
                    ..Default::default()
                },
                Platform::Ios,
            );
            assert_eq!(push.set_enabled(true).await.unwrap(), grant);
            assert_eq!(push.provider().calls(), vec!["prompt", "disable_push(false)"]);
        }
    }

    #[test]
    fn test_device_state_wire_format() {
        let state: PushDeviceState =
            serde_json::from_str(r#"{"hasNotificationPermission":true,"isSubscribed":false}"#)
                .unwrap();
        assert!(state.has_notification_permission);
        assert!(!state.is_push_enabled());
    }
}
