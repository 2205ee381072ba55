//! # State Configuration
//!
//! Configuration for the cache and capability synchronization layer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOPFRONT_CACHE_PREFIX=@ns:                                        │
//! │     SHOPFRONT_CONFIRM_DELAY_MS=1000                                    │
//! │     SHOPFRONT_LIFECYCLE_CAPACITY=16                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/shopfront/state.toml (Linux)                             │
//! │     ~/Library/Application Support/com.shopfront.app/state.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # state.toml
//! [cache]
//! prefix = "@ns:"
//!
//! [capability]
//! confirm_delay_ms = 1000
//!
//! [lifecycle]
//! channel_capacity = 16
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use shopfront_core::{DEFAULT_CACHE_PREFIX, DEFAULT_CONFIRM_DELAY_MS};

use crate::error::{StateError, StateResult};

/// Longest confirmation delay accepted. Anything longer is a typo in ms vs s.
const MAX_CONFIRM_DELAY_MS: u64 = 60_000;

// =============================================================================
// Cache Settings
// =============================================================================

/// How cache entries are named in the key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Prefix prepended to every store key.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    DEFAULT_CACHE_PREFIX.to_string()
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            prefix: default_prefix(),
        }
    }
}

// =============================================================================
// Capability Settings
// =============================================================================

/// Timing of capability resynchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitySettings {
    /// Delay between the first and the confirmatory query after the app
    /// returns to the foreground (milliseconds).
    #[serde(default = "default_confirm_delay")]
    pub confirm_delay_ms: u64,
}

fn default_confirm_delay() -> u64 {
    DEFAULT_CONFIRM_DELAY_MS
}

impl Default for CapabilitySettings {
    fn default() -> Self {
        CapabilitySettings {
            confirm_delay_ms: default_confirm_delay(),
        }
    }
}

impl CapabilitySettings {
    pub fn confirm_delay(&self) -> Duration {
        Duration::from_millis(self.confirm_delay_ms)
    }
}

// =============================================================================
// Lifecycle Settings
// =============================================================================

/// Lifecycle bus sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleSettings {
    /// Events buffered per subscriber before slow listeners start lagging.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    16
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        LifecycleSettings {
            channel_capacity: default_channel_capacity(),
        }
    }
}

// =============================================================================
// Main State Configuration
// =============================================================================

/// Complete state-layer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub capability: CapabilitySettings,

    #[serde(default)]
    pub lifecycle: LifecycleSettings,
}

impl StateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (state.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StateResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading state config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load state config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> StateResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StateError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "State config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StateResult<()> {
        if self.cache.prefix.is_empty() {
            return Err(StateError::InvalidConfig(
                "cache.prefix must not be empty".into(),
            ));
        }

        let delay = self.capability.confirm_delay_ms;
        if delay == 0 || delay > MAX_CONFIRM_DELAY_MS {
            return Err(StateError::InvalidConfig(format!(
                "capability.confirm_delay_ms must be between 1 and {}, got {}",
                MAX_CONFIRM_DELAY_MS, delay
            )));
        }

        if self.lifecycle.channel_capacity == 0 {
            return Err(StateError::InvalidConfig(
                "lifecycle.channel_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(prefix) = std::env::var("SHOPFRONT_CACHE_PREFIX") {
            debug!(prefix = %prefix, "Overriding cache prefix from environment");
            self.cache.prefix = prefix;
        }

        if let Ok(delay) = std::env::var("SHOPFRONT_CONFIRM_DELAY_MS") {
            match delay.parse::<u64>() {
                Ok(ms) => {
                    debug!(ms, "Overriding confirm delay from environment");
                    self.capability.confirm_delay_ms = ms;
                }
                Err(_) => warn!(value = %delay, "Ignoring non-numeric SHOPFRONT_CONFIRM_DELAY_MS"),
            }
        }

        if let Ok(capacity) = std::env::var("SHOPFRONT_LIFECYCLE_CAPACITY") {
            if let Ok(c) = capacity.parse::<usize>() {
                self.lifecycle.channel_capacity = c;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shopfront", "app")
            .map(|dirs| dirs.config_dir().join("state.toml"))
    }
}
