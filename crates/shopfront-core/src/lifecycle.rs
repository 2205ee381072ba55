//! # Application Lifecycle
//!
//! The host application's visibility states and the transitions between them.
//!
//! ## State Diagram
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        App Lifecycle States                             │
//! │                                                                         │
//! │            ┌──────────┐   user switches away   ┌────────────┐          │
//! │            │  Active  │ ─────────────────────► │ Background │          │
//! │            │          │ ◄───────────────────── │            │          │
//! │            └────┬─────┘   FOREGROUND TRANSITION └────────────┘          │
//! │                 │  ▲                                  ▲                 │
//! │   system sheet  │  │ FOREGROUND TRANSITION            │                 │
//! │                 ▼  │                                  │                 │
//! │            ┌──────────┐                               │                 │
//! │            │ Inactive │ ──────────────────────────────┘                 │
//! │            └──────────┘                                                 │
//! │                                                                         │
//! │  A foreground transition is any change whose new state is Active.      │
//! │  Inactive → Active counts: it is how iOS returns from a permission      │
//! │  dialog.                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;

// =============================================================================
// App State
// =============================================================================

/// Visibility state reported by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AppState {
    /// In the foreground and receiving input.
    #[default]
    Active,
    /// Not visible.
    Background,
    /// Visible but not receiving input (system sheet, app switcher).
    Inactive,
}

impl AppState {
    pub fn is_active(&self) -> bool {
        matches!(self, AppState::Active)
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppState::Active => write!(f, "active"),
            AppState::Background => write!(f, "background"),
            AppState::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for AppState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" | "foreground" => Ok(AppState::Active),
            "background" => Ok(AppState::Background),
            "inactive" => Ok(AppState::Inactive),
            other => Err(CoreError::UnknownAppState(other.to_string())),
        }
    }
}

// =============================================================================
// Lifecycle Event
// =============================================================================

/// A change of application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub previous: AppState,
    pub current: AppState,
}

impl LifecycleEvent {
    pub fn new(previous: AppState, current: AppState) -> Self {
        LifecycleEvent { previous, current }
    }

    /// Returns true if the app just came back to the foreground.
    pub fn is_foreground_transition(&self) -> bool {
        !self.previous.is_active() && self.current.is_active()
    }

    /// Returns true if the app just left the foreground.
    pub fn is_background_transition(&self) -> bool {
        self.previous.is_active() && !self.current.is_active()
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.previous, self.current)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_parsing() {
        assert_eq!("active".parse::<AppState>().unwrap(), AppState::Active);
        assert_eq!("Background".parse::<AppState>().unwrap(), AppState::Background);
        assert_eq!("inactive".parse::<AppState>().unwrap(), AppState::Inactive);
        assert!("unknown".parse::<AppState>().is_err());
    }

    #[test]
    fn test_foreground_transitions() {
        use AppState::*;
        assert!(LifecycleEvent::new(Background, Active).is_foreground_transition());
        assert!(LifecycleEvent::new(Inactive, Active).is_foreground_transition());
        assert!(!LifecycleEvent::new(Active, Background).is_foreground_transition());
        assert!(!LifecycleEvent::new(Inactive, Background).is_foreground_transition());
    }

    #[test]
    fn test_background_transitions() {
        use AppState::*;
        assert!(LifecycleEvent::new(Active, Background).is_background_transition());
        assert!(LifecycleEvent::new(Active, Inactive).is_background_transition());
        assert!(!LifecycleEvent::new(Background, Inactive).is_background_transition());
    }

    #[test]
    fn test_event_display() {
        let event = LifecycleEvent::new(AppState::Background, AppState::Active);
        assert_eq!(event.to_string(), "background -> active");
    }
}
