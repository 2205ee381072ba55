//! # Capability State Machine
//!
//! Local mirror of an externally owned boolean (a device permission, a push
//! subscription). The external system is the source of truth; this type only
//! records what the last resolved call reported.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Capability Sync State Machine                        │
//! │                                                                         │
//! │  ┌───────────────┐  query resolves   ┌─────────────────┐               │
//! │  │ Uninitialized │ ────────────────► │  Synced(value)  │ ◄──┐          │
//! │  │ enabled=false │   (Activation)    │                 │    │          │
//! │  └───────────────┘                   └────────┬────────┘    │          │
//! │                                               │             │          │
//! │           foreground: query ──► wait ──► query│             │          │
//! │           (Foreground, ForegroundConfirm)     │             │          │
//! │                                               │             │          │
//! │           toggle: mutate(!value) resolves     │             │          │
//! │           (Toggle)                            └─────────────┘          │
//! │                                                                         │
//! │  Every resolution overwrites the value unconditionally.                │
//! │  A failed call leaves the state untouched.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Sync Trigger
// =============================================================================

/// What caused a capability call to be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SyncTrigger {
    /// Initial query when the owner activates.
    Activation,
    /// First query after a foreground transition.
    Foreground,
    /// Delayed second query after a foreground transition.
    ForegroundConfirm,
    /// User-requested mutation.
    Toggle,
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncTrigger::Activation => write!(f, "activation"),
            SyncTrigger::Foreground => write!(f, "foreground"),
            SyncTrigger::ForegroundConfirm => write!(f, "foreground_confirm"),
            SyncTrigger::Toggle => write!(f, "toggle"),
        }
    }
}

// =============================================================================
// Capability Phase
// =============================================================================

/// Whether the external value has been observed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CapabilityPhase {
    #[default]
    Uninitialized,
    Synced(bool),
}

// =============================================================================
// Capability State
// =============================================================================

/// Current knowledge about one capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilityState {
    phase: CapabilityPhase,
    last_trigger: Option<SyncTrigger>,
    resolutions: u64,
}

impl CapabilityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CapabilityPhase {
        self.phase
    }

    /// The value to show. `false` until the first resolution.
    pub fn enabled(&self) -> bool {
        match self.phase {
            CapabilityPhase::Uninitialized => false,
            CapabilityPhase::Synced(value) => value,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self.phase, CapabilityPhase::Synced(_))
    }

    /// The trigger of the most recent resolution.
    pub fn last_trigger(&self) -> Option<SyncTrigger> {
        self.last_trigger
    }

    /// Number of resolutions applied so far.
    pub fn resolutions(&self) -> u64 {
        self.resolutions
    }

    /// The value a toggle request asks the external system for.
    pub fn toggle_target(&self) -> bool {
        !self.enabled()
    }

    /// Records a resolved call. Returns true if the visible value changed.
    pub fn apply(&mut self, trigger: SyncTrigger, value: bool) -> bool {
        let before = self.enabled();
        self.phase = CapabilityPhase::Synced(value);
        self.last_trigger = Some(trigger);
        self.resolutions += 1;
        before != value
    }

    pub fn snapshot(&self) -> CapabilitySnapshot {
        CapabilitySnapshot {
            enabled: self.enabled(),
            synced: self.is_synced(),
            last_trigger: self.last_trigger,
        }
    }
}

// =============================================================================
// Capability Snapshot (UI DTO)
// =============================================================================

/// What a UI control bound to a capability renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CapabilitySnapshot {
    pub enabled: bool,
    pub synced: bool,
    pub last_trigger: Option<SyncTrigger>,
}

// =============================================================================
// Unit Tests
// =============================================================================
