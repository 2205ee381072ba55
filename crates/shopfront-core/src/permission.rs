//! # Permissions
//!
//! OS permission statuses as reported by the platform permission APIs.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Permission Status → Usable?                          │
//! │                                                                         │
//! │  granted      ──► yes                                                  │
//! │  limited      ──► yes   (partial grant is enough for tracking)         │
//! │  unavailable  ──► yes   (feature absent on device, nothing to block)   │
//! │  blocked      ──► no    (user must change it in system settings)       │
//! │  denied       ──► ask   (not decided yet; a request may show a dialog) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;

/// Mobile platform the app runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Ios,
    Android,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Ios => write!(f, "ios"),
            Platform::Android => write!(f, "android"),
        }
    }
}

/// Result of checking or requesting an OS permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PermissionStatus {
    Granted,
    Limited,
    Unavailable,
    Denied,
    Blocked,
}

impl PermissionStatus {
    /// Returns `Some(usable)` for a settled status, `None` when the user has
    /// not decided yet.
    pub fn resolve(&self) -> Option<bool> {
        match self {
            PermissionStatus::Granted
            | PermissionStatus::Limited
            | PermissionStatus::Unavailable => Some(true),
            PermissionStatus::Blocked => Some(false),
            PermissionStatus::Denied => None,
        }
    }

    /// Like [`resolve`](Self::resolve), but an undecided status counts as
    /// not usable. Used after a request, when the user had their chance.
    pub fn is_usable(&self) -> bool {
        self.resolve().unwrap_or(false)
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PermissionStatus::Granted => "granted",
            PermissionStatus::Limited => "limited",
            PermissionStatus::Unavailable => "unavailable",
            PermissionStatus::Denied => "denied",
            PermissionStatus::Blocked => "blocked",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PermissionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "granted" => Ok(PermissionStatus::Granted),
            "limited" => Ok(PermissionStatus::Limited),
            "unavailable" => Ok(PermissionStatus::Unavailable),
            "denied" => Ok(PermissionStatus::Denied),
            "blocked" => Ok(PermissionStatus::Blocked),
            other => Err(CoreError::UnknownPermissionStatus(other.to_string())),
        }
    }
}
