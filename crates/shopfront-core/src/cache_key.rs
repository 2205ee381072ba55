//! # Cache Keys
//!
//! The closed set of names the app stores in its persistent cache.
//!
//! ## Key Catalogue
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cache Key Catalogue                             │
//! │                                                                         │
//! │  Session & identity       Checkout defaults      Discovery             │
//! │  ─────────────────        ─────────────────      ─────────             │
//! │  token                    is_delivery_same       recent_searches       │
//! │  partner_code             is_shipping_same       last_ticker_text      │
//! │  last_locale                                     viewed_products_*     │
//! │  detected_location                                                      │
//! │                                                                         │
//! │  Prompts & dialogs        Engagement                                    │
//! │  ─────────────────        ──────────                                    │
//! │  PN_prompt_series         app_open_count                                │
//! │  power_seller_dialog      signup_dropoff_tracking                       │
//! │  resell_dialog            push_enabled                                  │
//! │  is_app_review_prompted                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are an enum rather than strings so a typo is a compile error. The
//! `FromStr` impl is only for text that enters from outside the program.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// =============================================================================
// Interest Category
// =============================================================================

/// Product verticals that keep their own recently-viewed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterestCategory {
    Apparel,
    Collectibles,
    Sneakers,
}

impl InterestCategory {
    /// All categories, in display order.
    pub const ALL: [InterestCategory; 3] = [
        InterestCategory::Apparel,
        InterestCategory::Collectibles,
        InterestCategory::Sneakers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterestCategory::Apparel => "Apparel",
            InterestCategory::Collectibles => "Collectibles",
            InterestCategory::Sneakers => "Sneakers",
        }
    }
}

// =============================================================================
// Cache Key
// =============================================================================

/// A name in the persistent cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CacheKey {
    AppOpenCount,
    DetectedLocation,
    IsAppReviewPrompted,
    IsDeliverySame,
    IsShippingSame,
    LastLocale,
    LastTickerText,
    PushPromptSeries,
    PowerSellerDialog,
    PartnerCode,
    PushEnabled,
    RecentSearches,
    ResellDialog,
    SignupDropoffTracking,
    Token,
    ViewedProducts(InterestCategory),
}

impl CacheKey {
    /// Every key without a category parameter.
    const FIXED: [CacheKey; 15] = [
        CacheKey::AppOpenCount,
        CacheKey::DetectedLocation,
        CacheKey::IsAppReviewPrompted,
        CacheKey::IsDeliverySame,
        CacheKey::IsShippingSame,
        CacheKey::LastLocale,
        CacheKey::LastTickerText,
        CacheKey::PushPromptSeries,
        CacheKey::PowerSellerDialog,
        CacheKey::PartnerCode,
        CacheKey::PushEnabled,
        CacheKey::RecentSearches,
        CacheKey::ResellDialog,
        CacheKey::SignupDropoffTracking,
        CacheKey::Token,
    ];

    /// Iterates over every known key, including one per interest category.
    pub fn all() -> impl Iterator<Item = CacheKey> {
        Self::FIXED
            .into_iter()
            .chain(InterestCategory::ALL.into_iter().map(CacheKey::ViewedProducts))
    }

    /// Returns the wire name of the key.
    ///
    /// These names are already persisted on user devices and must not change.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::AppOpenCount => "app_open_count",
            CacheKey::DetectedLocation => "detected_location",
            CacheKey::IsAppReviewPrompted => "is_app_review_prompted",
            CacheKey::IsDeliverySame => "is_delivery_same",
            CacheKey::IsShippingSame => "is_shipping_same",
            CacheKey::LastLocale => "last_locale",
            CacheKey::LastTickerText => "last_ticker_text",
            CacheKey::PushPromptSeries => "PN_prompt_series",
            CacheKey::PowerSellerDialog => "power_seller_dialog",
            CacheKey::PartnerCode => "partner_code",
            CacheKey::PushEnabled => "push_enabled",
            CacheKey::RecentSearches => "recent_searches",
            CacheKey::ResellDialog => "resell_dialog",
            CacheKey::SignupDropoffTracking => "signup_dropoff_tracking",
            CacheKey::Token => "token",
            CacheKey::ViewedProducts(InterestCategory::Apparel) => "viewed_products_Apparel",
            CacheKey::ViewedProducts(InterestCategory::Collectibles) => {
                "viewed_products_Collectibles"
            }
            CacheKey::ViewedProducts(InterestCategory::Sneakers) => "viewed_products_Sneakers",
        }
    }

    /// Returns true for keys holding credentials, which must never be logged
    /// by value.
    pub fn is_sensitive(&self) -> bool {
        matches!(self, CacheKey::Token | CacheKey::PartnerCode)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheKey::all()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCacheKey(s.to_string()))
    }
}

impl TryFrom<String> for CacheKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.as_str().to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
