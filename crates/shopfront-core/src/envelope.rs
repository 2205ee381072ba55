//! # Cache Envelope
//!
//! Rules for laying cached values out in a flat string key-value store.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Key-Value Store Layout                           │
//! │                                                                         │
//! │  store key                        │ stored string                       │
//! │  ─────────────────────────────────┼──────────────────────────────────   │
//! │  @ns:recent_searches              │ ["jordan 1","dunk low"]             │
//! │  @ns:detected_location            │ {"country":"SG"}                    │
//! │  @ns:detected_location_exp        │ 1767225600000   (epoch millis)      │
//! │  @ns:token                        │ eyJhbGciOi...   (legacy raw string) │
//! │                                                                         │
//! │  READ RULES:                                                           │
//! │  1. If <key>_exp exists and is in the past → treat as missing          │
//! │  2. If the item is missing → missing                                   │
//! │  3. If the item parses as JSON → that JSON value                       │
//! │  4. Otherwise → the raw string itself                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::cache_key::CacheKey;
use crate::error::{CoreError, CoreResult};

/// Suffix appended to a storage key to hold its expiry deadline.
pub const EXPIRY_SUFFIX: &str = "_exp";

/// Returns the store key holding the value for `key`.
pub fn storage_key(prefix: &str, key: CacheKey) -> String {
    format!("{}{}", prefix, key.as_str())
}

/// Returns the store key holding the expiry deadline for `key`.
pub fn expiry_key(prefix: &str, key: CacheKey) -> String {
    format!("{}{}{}", prefix, key.as_str(), EXPIRY_SUFFIX)
}

/// Computes the expiry deadline, in epoch milliseconds, for a value written
/// at `now` that should live for `minutes`.
pub fn expiry_deadline(now: DateTime<Utc>, minutes: u32) -> CoreResult<i64> {
    if minutes == 0 {
        return Err(CoreError::InvalidExpiry { minutes });
    }
    Ok((now + Duration::minutes(i64::from(minutes))).timestamp_millis())
}

/// Returns true if the stored expiry marker says the value is stale at `now`.
///
/// A missing marker means the value never expires. A marker that is not a
/// number cannot be trusted and counts as expired.
pub fn is_expired(marker: Option<&str>, now: DateTime<Utc>) -> bool {
    match marker {
        None => false,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(deadline) => deadline < now.timestamp_millis(),
            Err(_) => true,
        },
    }
}

/// Serializes a value for storage.
pub fn encode_item<T: Serialize>(key: CacheKey, value: &T) -> CoreResult<String> {
    serde_json::to_string(value).map_err(|e| CoreError::Decode {
        key: key.as_str().to_string(),
        reason: e.to_string(),
    })
}

/// Parses a stored string into JSON, keeping non-JSON strings verbatim.
pub fn parse_item(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Converts a parsed item into the caller's type.
pub fn decode_item<T: DeserializeOwned>(key: CacheKey, value: Value) -> CoreResult<T> {
    serde_json::from_value(value).map_err(|e| CoreError::Decode {
        key: key.as_str().to_string(),
        reason: e.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_storage_keys() {
        assert_eq!(storage_key("@ns:", CacheKey::Token), "@ns:token");
        assert_eq!(
            expiry_key("@ns:", CacheKey::DetectedLocation),
            "@ns:detected_location_exp"
        );
    }

    #[test]
    fn test_expiry_deadline() {
        let now = at(1_000_000);
        assert_eq!(expiry_deadline(now, 2).unwrap(), 1_000_000 + 2 * 60 * 1000);
        assert_eq!(
            expiry_deadline(now, 0),
            Err(CoreError::InvalidExpiry { minutes: 0 })
        );
    }

    #[test]
    fn test_expiry_compares_numerically() {
        // 9_999 sorts after 10_000 as text but is earlier in time.
        let now = at(10_000);
        assert!(is_expired(Some("9999"), now));
        assert!(!is_expired(Some("10001"), now));
        assert!(!is_expired(Some("10000"), now));
    }

    #[test]
    fn test_missing_and_garbage_markers() {
        let now = at(10_000);
        assert!(!is_expired(None, now));
        assert!(is_expired(Some("tomorrow"), now));
    }

    #[test]
    fn test_parse_item_keeps_raw_strings() {
        assert_eq!(parse_item("[1,2]"), json!([1, 2]));
        assert_eq!(parse_item("true"), json!(true));
        assert_eq!(parse_item("eyJhbGciOi"), json!("eyJhbGciOi"));
    }

    #[test]
    fn test_decode_item_reports_key() {
        let searches: Vec<String> =
            decode_item(CacheKey::RecentSearches, json!(["dunk low"])).unwrap();
        assert_eq!(searches, vec!["dunk low".to_string()]);

        let err = decode_item::<bool>(CacheKey::PushEnabled, json!("yes")).unwrap_err();
        assert!(matches!(err, CoreError::Decode { ref key, .. } if key == "push_enabled"));
    }

    #[test]
    fn test_encode_then_parse_matches_value() {
        let raw = encode_item(CacheKey::IsShippingSame, &true).unwrap();
        assert_eq!(raw, "true");
        assert_eq!(parse_item(&raw), json!(true));
    }
}
