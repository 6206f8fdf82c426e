//! Shared data types: canonical card records, price snapshots, image assets

use serde::{Deserialize, Serialize};

/// The single authoritative record for one catalog entry, keyed by the
/// provider's stable card ID. Fields absent from the provider payload stay
/// `None` rather than being defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalCard {
    /// Stable ID assigned by the provider (unique, immutable)
    pub card_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atk: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub def: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Point-in-time marketplace prices, captured on first resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<PriceSnapshot>,
    /// Source URL of the full-resolution image at the provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url_small: Option<String>,
    /// Raw provider set list, stored verbatim as JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_sets: Option<String>,
    /// Set by the store on first insert; `None` for records not yet persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Fixed set of marketplace prices extracted from the provider payload.
/// Marketplaces outside this set are discarded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub cardmarket: Option<String>,
    pub tcgplayer: Option<String>,
    pub ebay: Option<String>,
    pub amazon: Option<String>,
    pub coolstuffinc: Option<String>,
}

/// Cached image bytes for one card. Either resolution may be absent; a
/// partial asset is a valid terminal state and is not re-fetched.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub card_id: i64,
    pub image_data: Option<Vec<u8>>,
    pub image_small_data: Option<Vec<u8>>,
    pub source_url: Option<String>,
    pub source_small_url: Option<String>,
    /// RFC 3339 timestamp of the download attempt
    pub downloaded_at: String,
}

impl ImageAsset {
    /// True if at least one resolution was retrieved
    pub fn has_any_data(&self) -> bool {
        self.image_data.is_some() || self.image_small_data.is_some()
    }
}
