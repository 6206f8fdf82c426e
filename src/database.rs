//! Card store and image asset store on SQLite
//!
//! Thin persistence functions only - cache precedence decisions live in the
//! resolver. Uses parameterized queries exclusively (no SQL string
//! concatenation); name lookups are case-insensitive via COLLATE NOCASE.

use crate::models::{CanonicalCard, ImageAsset, PriceSnapshot};
use rusqlite::{params, Connection};

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `cards`: canonical card records keyed by provider card ID
/// - `card_images`: cached image blobs (two resolutions) per card ID
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        -- Canonical card records
        CREATE TABLE IF NOT EXISTS cards (
            card_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            card_type TEXT,
            frame_type TEXT,
            description TEXT,
            atk INTEGER,
            def INTEGER,
            level INTEGER,
            race TEXT,
            attribute TEXT,
            prices TEXT,
            image_url TEXT,
            image_url_small TEXT,
            card_sets TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_cards_name ON cards(name COLLATE NOCASE);

        -- Cached image assets; either resolution may be absent
        CREATE TABLE IF NOT EXISTS card_images (
            card_id INTEGER PRIMARY KEY,
            image_data BLOB,
            image_small_data BLOB,
            image_size INTEGER,
            image_small_size INTEGER,
            source_url TEXT,
            source_small_url TEXT,
            downloaded_at TEXT NOT NULL,
            FOREIGN KEY (card_id) REFERENCES cards(card_id)
        );
        ",
    )?;

    log::info!("Database schema initialized");
    Ok(())
}

/// Insert or overwrite a card record keyed by card ID
///
/// Fields are overwritten, not merged. `created_at` is preserved across
/// updates; `updated_at` is bumped on every write.
pub fn upsert_card(conn: &Connection, card: &CanonicalCard) -> DbResult<()> {
    let prices_json = card
        .prices
        .as_ref()
        .and_then(|p| serde_json::to_string(p).ok());

    let mut stmt = conn.prepare_cached(
        "INSERT INTO cards
         (card_id, name, card_type, frame_type, description, atk, def, level,
          race, attribute, prices, image_url, image_url_small, card_sets)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         ON CONFLICT(card_id) DO UPDATE SET
            name = excluded.name,
            card_type = excluded.card_type,
            frame_type = excluded.frame_type,
            description = excluded.description,
            atk = excluded.atk,
            def = excluded.def,
            level = excluded.level,
            race = excluded.race,
            attribute = excluded.attribute,
            prices = excluded.prices,
            image_url = excluded.image_url,
            image_url_small = excluded.image_url_small,
            card_sets = excluded.card_sets,
            updated_at = datetime('now')",
    )?;

    stmt.execute(params![
        card.card_id,
        &card.name,
        &card.card_type,
        &card.frame_type,
        &card.description,
        card.atk,
        card.def,
        card.level,
        &card.race,
        &card.attribute,
        prices_json,
        &card.image_url,
        &card.image_url_small,
        &card.card_sets,
    ])?;

    log::debug!("Upserted card {} ('{}')", card.card_id, card.name);
    Ok(())
}

const CARD_COLUMNS: &str = "card_id, name, card_type, frame_type, description, atk, def, level,
     race, attribute, prices, image_url, image_url_small, card_sets, created_at, updated_at";

fn row_to_card(row: &rusqlite::Row<'_>) -> rusqlite::Result<CanonicalCard> {
    let prices_json: Option<String> = row.get(10)?;
    let prices: Option<PriceSnapshot> =
        prices_json.and_then(|json| serde_json::from_str(&json).ok());

    Ok(CanonicalCard {
        card_id: row.get(0)?,
        name: row.get(1)?,
        card_type: row.get(2)?,
        frame_type: row.get(3)?,
        description: row.get(4)?,
        atk: row.get(5)?,
        def: row.get(6)?,
        level: row.get(7)?,
        race: row.get(8)?,
        attribute: row.get(9)?,
        prices,
        image_url: row.get(11)?,
        image_url_small: row.get(12)?,
        card_sets: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Look up a card by exact name (case-insensitive)
pub fn get_card_by_name(conn: &Connection, name: &str) -> DbResult<Option<CanonicalCard>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM cards WHERE name = ?1 COLLATE NOCASE LIMIT 1",
        CARD_COLUMNS
    ))?;

    let mut rows = stmt.query(params![name])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_card(row)?)),
        None => Ok(None),
    }
}

/// Look up a card by its provider card ID
pub fn get_card_by_id(conn: &Connection, card_id: i64) -> DbResult<Option<CanonicalCard>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM cards WHERE card_id = ?1",
        CARD_COLUMNS
    ))?;

    let mut rows = stmt.query(params![card_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_card(row)?)),
        None => Ok(None),
    }
}

/// Check whether an image asset exists for a card (either resolution)
pub fn image_exists(conn: &Connection, card_id: i64) -> DbResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM card_images WHERE card_id = ?1",
        params![card_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Get cached image bytes for a card, `small` selects the resolution
pub fn get_image_bytes(conn: &Connection, card_id: i64, small: bool) -> DbResult<Option<Vec<u8>>> {
    let column = if small { "image_small_data" } else { "image_data" };
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {} FROM card_images WHERE card_id = ?1",
        column
    ))?;

    let mut rows = stmt.query(params![card_id])?;
    match rows.next()? {
        Some(row) => {
            let bytes: Option<Vec<u8>> = row.get(0)?;
            Ok(bytes)
        }
        None => Ok(None),
    }
}

/// Store an image asset. A pre-existing asset for the same card is
/// overwritten (last write wins).
pub fn insert_image(conn: &Connection, asset: &ImageAsset) -> DbResult<()> {
    let image_size = asset.image_data.as_ref().map(|d| d.len() as i64);
    let small_size = asset.image_small_data.as_ref().map(|d| d.len() as i64);

    let mut stmt = conn.prepare_cached(
        "INSERT OR REPLACE INTO card_images
         (card_id, image_data, image_small_data, image_size, image_small_size,
          source_url, source_small_url, downloaded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    stmt.execute(params![
        asset.card_id,
        &asset.image_data,
        &asset.image_small_data,
        image_size,
        small_size,
        &asset.source_url,
        &asset.source_small_url,
        &asset.downloaded_at,
    ])?;

    log::debug!(
        "Stored image asset for card {} (regular: {} bytes, small: {} bytes)",
        asset.card_id,
        image_size.unwrap_or(0),
        small_size.unwrap_or(0)
    );
    Ok(())
}

/// Total number of cached card records
pub fn card_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))
}

/// Total number of cached image assets
pub fn image_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM card_images", [], |row| row.get(0))
}
