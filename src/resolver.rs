//! Card resolution orchestration
//!
//! Implements the layered lookup: local store first, then an ordered chain
//! of remote strategies, stopping at the first hit. A remote hit is returned
//! to the caller immediately and handed to the persistence queue; the caller
//! never waits for write-side work.

use crate::database;
use crate::error::Result;
use crate::models::CanonicalCard;
use crate::persist::PersistQueue;
use crate::provider::{ProviderClient, SearchStrategy};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Resolves card queries against the local store and the remote provider
pub struct CardResolver {
    db: Arc<Mutex<Connection>>,
    provider: ProviderClient,
    persist: PersistQueue,
}

impl CardResolver {
    pub fn new(db: Arc<Mutex<Connection>>, provider: ProviderClient, persist: PersistQueue) -> Self {
        Self {
            db,
            provider,
            persist,
        }
    }

    /// Resolve a card by (possibly noisy) name.
    ///
    /// Returns `Ok(None)` when no strategy matches; a transient provider
    /// failure aborts the chain and propagates. Blank input is rejected
    /// without touching the store or the network. Negative results are not
    /// cached - an identical later query retries the full chain.
    pub async fn resolve_name(&self, raw_name: &str) -> Result<Option<CanonicalCard>> {
        let name = raw_name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        // Local data always wins, even if staler than the provider
        {
            let conn = self.db.lock().unwrap();
            if let Some(card) = database::get_card_by_name(&conn, name)? {
                log::debug!("Local store hit for '{}'", name);
                return Ok(Some(card));
            }
        }

        self.run_chain(name_strategies(name)).await
    }

    /// Resolve a card by its stable provider ID
    pub async fn resolve_id(&self, card_id: i64) -> Result<Option<CanonicalCard>> {
        if card_id <= 0 {
            return Ok(None);
        }

        {
            let conn = self.db.lock().unwrap();
            if let Some(card) = database::get_card_by_id(&conn, card_id)? {
                log::debug!("Local store hit for card {}", card_id);
                return Ok(Some(card));
            }
        }

        self.run_chain(vec![SearchStrategy::Id(card_id)]).await
    }

    /// Check whether a cached image asset exists for a card
    pub fn image_exists(&self, card_id: i64) -> Result<bool> {
        let conn = self.db.lock().unwrap();
        Ok(database::image_exists(&conn, card_id)?)
    }

    /// Get cached image bytes for a card, `small` selects the resolution
    pub fn image_bytes(&self, card_id: i64, small: bool) -> Result<Option<Vec<u8>>> {
        let conn = self.db.lock().unwrap();
        Ok(database::get_image_bytes(&conn, card_id, small)?)
    }

    /// Run the strategy chain in order, returning on the first hit.
    ///
    /// Strategies execute strictly in sequence, so at most one succeeds and
    /// at most one persistence job is scheduled per resolution attempt.
    async fn run_chain(&self, strategies: Vec<SearchStrategy>) -> Result<Option<CanonicalCard>> {
        for strategy in &strategies {
            let mut candidates = self.provider.search(strategy).await?;
            if candidates.is_empty() {
                continue;
            }

            // The provider orders candidates best-first; the first element
            // is authoritative
            let card = candidates.swap_remove(0).into_card();
            log::info!("Resolved card {} ('{}') via {}", card.card_id, card.name, strategy);

            self.persist.enqueue(card.clone());
            return Ok(Some(card));
        }

        log::debug!("All {} strategies exhausted without a match", strategies.len());
        Ok(None)
    }
}

/// Build the ordered remote strategy list for a name query: exact match,
/// fuzzy match, then exact-match retries of case variants. Variants equal to
/// an already-tried string are skipped, so each spelling goes out once.
fn name_strategies(name: &str) -> Vec<SearchStrategy> {
    let mut strategies = vec![
        SearchStrategy::ExactName(name.to_string()),
        SearchStrategy::FuzzyName(name.to_string()),
    ];

    let mut tried = vec![name.to_string()];
    for variant in [name.to_lowercase(), name.to_uppercase(), title_case(name)] {
        if !tried.contains(&variant) {
            tried.push(variant.clone());
            strategies.push(SearchStrategy::ExactName(variant));
        }
    }

    strategies
}

/// Title-case a name word by word (handles ALL CAPS input from OCR)
fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
