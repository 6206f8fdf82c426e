//! Background persistence worker
//!
//! Takes newly resolved cards off the request path: writes the card record
//! and downloads/stores its images. Jobs flow through a bounded queue into a
//! dispatcher that caps concurrent persistence work with a semaphore, so
//! write-side load cannot grow unbounded under request bursts.
//!
//! All failures here are logged and swallowed - the caller's response has
//! already been returned. Concurrent jobs for the same card are not
//! deduplicated; writes are idempotent upserts, so the stored state
//! converges (at-least-once semantics).

use crate::database;
use crate::models::{CanonicalCard, ImageAsset};
use crate::provider::fetch_image;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Semaphore};

/// One unit of write-side work
#[derive(Debug)]
struct PersistJob {
    card: CanonicalCard,
}

/// Handle for submitting fire-and-forget persistence work
#[derive(Clone)]
pub struct PersistQueue {
    tx: mpsc::Sender<PersistJob>,
}

impl PersistQueue {
    /// Enqueue a card for persistence without blocking.
    ///
    /// A full queue drops the job with a warning: the record will be
    /// re-resolved and re-enqueued on a later cache miss, so dropping is
    /// safe, just wasteful.
    pub fn enqueue(&self, card: CanonicalCard) {
        let card_id = card.card_id;
        match self.tx.try_send(PersistJob { card }) {
            Ok(()) => log::debug!("Queued persistence for card {}", card_id),
            Err(TrySendError::Full(_)) => {
                log::warn!("Persistence queue full, dropping write for card {}", card_id);
            }
            Err(TrySendError::Closed(_)) => {
                log::warn!("Persistence worker stopped, dropping write for card {}", card_id);
            }
        }
    }
}

/// Spawn the persistence dispatcher and return its submission handle.
///
/// `queue_depth` bounds pending jobs; `max_concurrent` bounds simultaneous
/// persistence tasks (and therefore outbound image downloads).
pub fn spawn(
    db: Arc<Mutex<Connection>>,
    queue_depth: usize,
    max_concurrent: usize,
) -> PersistQueue {
    let (tx, mut rx) = mpsc::channel::<PersistJob>(queue_depth);

    tokio::spawn(async move {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        while let Some(job) = rx.recv().await {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let db = Arc::clone(&db);

            tokio::spawn(async move {
                persist_card(&db, &job.card).await;
                drop(permit);
            });
        }

        log::info!("Persistence queue closed, dispatcher exiting");
    });

    PersistQueue { tx }
}

/// Write a card record and, if needed, download and store its images.
///
/// Never returns an error: every failure is logged and the remaining steps
/// continue where that makes sense. A failure fetching one image resolution
/// does not abort the other; the asset is stored with whichever bytes
/// succeeded.
pub async fn persist_card(db: &Arc<Mutex<Connection>>, card: &CanonicalCard) {
    {
        let conn = db.lock().unwrap();
        if let Err(e) = database::upsert_card(&conn, card) {
            log::error!("Failed to persist card {}: {}", card.card_id, e);
        }
    }

    if card.image_url.is_none() && card.image_url_small.is_none() {
        log::debug!("Card {} has no image URLs, skipping download", card.card_id);
        return;
    }

    // Pre-existence check: an asset is created once per card and never
    // re-fetched, even if partial.
    let already_cached = {
        let conn = db.lock().unwrap();
        match database::image_exists(&conn, card.card_id) {
            Ok(exists) => exists,
            Err(e) => {
                log::error!("Failed to check image cache for card {}: {}", card.card_id, e);
                return;
            }
        }
    };
    if already_cached {
        log::debug!("Image already cached for card {}", card.card_id);
        return;
    }

    let image_data = download_if_present(card.image_url.as_deref(), card.card_id).await;
    let image_small_data = download_if_present(card.image_url_small.as_deref(), card.card_id).await;

    let asset = ImageAsset {
        card_id: card.card_id,
        image_data,
        image_small_data,
        source_url: card.image_url.clone(),
        source_small_url: card.image_url_small.clone(),
        downloaded_at: chrono::Utc::now().to_rfc3339(),
    };

    if !asset.has_any_data() {
        log::warn!("No image bytes retrieved for card {}, nothing stored", card.card_id);
        return;
    }

    let conn = db.lock().unwrap();
    if let Err(e) = database::insert_image(&conn, &asset) {
        log::error!("Failed to store image asset for card {}: {}", card.card_id, e);
    }
}

async fn download_if_present(url: Option<&str>, card_id: i64) -> Option<Vec<u8>> {
    let url = url?;
    match fetch_image(url).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!("Image download failed for card {}: {}", card_id, e);
            None
        }
    }
}
