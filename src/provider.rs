//! YGOPRODeck API client
//!
//! Issues one GET per search strategy and parses the response defensively:
//! every optional field is read only if present. A malformed body or a 4xx
//! status is a miss for that strategy, never a fatal error.

use crate::error::{Error, Result};
use crate::models::{CanonicalCard, PriceSnapshot};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Public YGOPRODeck card info endpoint
pub const YGOPRODECK_API_URL: &str = "https://db.ygoprodeck.com/api/v7/cardinfo.php";

const USER_AGENT: &str = "card_resolver/1.0";

/// Result page size hint for fuzzy searches
const FUZZY_RESULT_LIMIT: u32 = 10;

/// One remote search attempt. Exactly one primary query parameter per call.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchStrategy {
    /// `name=` - exact name match
    ExactName(String),
    /// `fname=` - fuzzy match, tolerant of partial or garbled text
    FuzzyName(String),
    /// `id=` - stable provider ID
    Id(i64),
}

impl SearchStrategy {
    fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            SearchStrategy::ExactName(name) => vec![("name", name.clone())],
            SearchStrategy::FuzzyName(name) => vec![
                ("fname", name.clone()),
                ("num", FUZZY_RESULT_LIMIT.to_string()),
                ("offset", "0".to_string()),
            ],
            SearchStrategy::Id(id) => vec![("id", id.to_string())],
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStrategy::ExactName(name) => write!(f, "exact name '{}'", name),
            SearchStrategy::FuzzyName(name) => write!(f, "fuzzy name '{}'", name),
            SearchStrategy::Id(id) => write!(f, "id {}", id),
        }
    }
}

/// Response envelope: the `data` array is mandatory, anything else is ignored
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    data: Vec<ApiCard>,
}

/// One card as returned by the provider
#[derive(Debug, Deserialize)]
pub struct ApiCard {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub card_type: Option<String>,
    #[serde(rename = "frameType", default)]
    pub frame_type: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub atk: Option<i32>,
    #[serde(default)]
    pub def: Option<i32>,
    #[serde(default)]
    pub level: Option<i32>,
    #[serde(default)]
    pub race: Option<String>,
    #[serde(default)]
    pub attribute: Option<String>,
    #[serde(default)]
    pub card_images: Option<Vec<ApiCardImage>>,
    #[serde(default)]
    pub card_sets: Option<serde_json::Value>,
    #[serde(default)]
    pub card_prices: Option<Vec<ApiCardPrices>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCardImage {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_url_small: Option<String>,
}

/// Marketplace price list entry; only these five keys are kept
#[derive(Debug, Deserialize)]
pub struct ApiCardPrices {
    #[serde(default)]
    pub cardmarket_price: Option<String>,
    #[serde(default)]
    pub tcgplayer_price: Option<String>,
    #[serde(default)]
    pub ebay_price: Option<String>,
    #[serde(default)]
    pub amazon_price: Option<String>,
    #[serde(default)]
    pub coolstuffinc_price: Option<String>,
}

impl ApiCard {
    /// Convert the provider payload into a canonical record.
    /// Absent fields stay unset; timestamps are assigned by the store.
    pub fn into_card(self) -> CanonicalCard {
        let (image_url, image_url_small) = match self.card_images {
            Some(images) => match images.into_iter().next() {
                Some(img) => (img.image_url, img.image_url_small),
                None => (None, None),
            },
            None => (None, None),
        };

        let prices = self
            .card_prices
            .and_then(|list| list.into_iter().next())
            .map(|p| PriceSnapshot {
                cardmarket: p.cardmarket_price,
                tcgplayer: p.tcgplayer_price,
                ebay: p.ebay_price,
                amazon: p.amazon_price,
                coolstuffinc: p.coolstuffinc_price,
            });

        let card_sets = self
            .card_sets
            .as_ref()
            .and_then(|sets| serde_json::to_string(sets).ok());

        CanonicalCard {
            card_id: self.id,
            name: self.name,
            card_type: self.card_type,
            frame_type: self.frame_type,
            description: self.desc,
            atk: self.atk,
            def: self.def,
            level: self.level,
            race: self.race,
            attribute: self.attribute,
            prices,
            image_url,
            image_url_small,
            card_sets,
            created_at: None,
            updated_at: None,
        }
    }
}

/// HTTP client for the card catalog provider with bounded timeouts
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProviderClient {
    /// Build a client with independent connect and request timeouts.
    /// The provider can be slow under load, so the request timeout is
    /// configured separately from the connect timeout.
    pub fn new(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Run one search strategy against the provider.
    ///
    /// Returns the candidate list in provider order (first element is the
    /// best match). An empty list means "no such card" for this strategy:
    /// 4xx statuses, empty `data`, and unparseable bodies all map to it.
    /// Network failures and 5xx statuses are transient errors.
    pub async fn search(&self, strategy: &SearchStrategy) -> Result<Vec<ApiCard>> {
        let query: Vec<String> = strategy
            .query_params()
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect();
        let url = format!("{}?{}", self.base_url, query.join("&"));

        log::debug!("Querying provider by {}", strategy);

        let response = self
            .http
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            // The provider signals "no card found" with a 400
            log::debug!("Provider miss ({}) for {}", status, strategy);
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(Error::HttpStatus(status));
        }

        let body = response.text().await?;
        match serde_json::from_str::<ApiEnvelope>(&body) {
            Ok(envelope) => {
                log::debug!("Provider returned {} candidate(s) for {}", envelope.data.len(), strategy);
                Ok(envelope.data)
            }
            Err(e) => {
                log::warn!("Malformed provider response for {}: {}", strategy, e);
                Ok(Vec::new())
            }
        }
    }
}

/// Cap on a single image download; a hung fetch would otherwise pin a
/// persistence worker slot
const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch raw image bytes from a URL
pub async fn fetch_image(url: &str) -> Result<Vec<u8>> {
    fetch_image_with_timeout(url, IMAGE_FETCH_TIMEOUT).await
}

/// Fetch raw image bytes from a URL with an explicit request timeout
pub async fn fetch_image_with_timeout(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    log::debug!("Fetching image from URL: {}", url);

    let response = reqwest::Client::builder()
        .timeout(timeout)
        .build()?
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await?;

    if response.status().is_success() {
        Ok(response.bytes().await?.to_vec())
    } else {
        Err(Error::ImageFetchFailed(url.to_string()))
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
