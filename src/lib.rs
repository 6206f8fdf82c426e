//! Card Resolver - trading card identity resolution with a persistent cache
//!
//! Resolves a possibly noisy card name (typically from OCR) or a stable
//! provider ID to a canonical card record, minimizing calls to the slow,
//! rate-limited YGOPRODeck API. Resolved cards, their price snapshots, and
//! their images are cached in SQLite by a background worker that never
//! blocks the caller.

pub mod database;
pub mod error;
pub mod models;
pub mod persist;
pub mod provider;
pub mod resolver;
pub mod web;

pub use error::{Error, Result};
pub use models::{CanonicalCard, ImageAsset, PriceSnapshot};
pub use persist::PersistQueue;
pub use provider::{ProviderClient, SearchStrategy, YGOPRODECK_API_URL};
pub use resolver::CardResolver;
