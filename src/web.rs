//! REST surface for the card resolver
//!
//! Exposes card search (by name or provider ID), cached image serving, and
//! cache statistics. The deck-building frontend is served from a different
//! origin, so CORS is enabled.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Json, Response},
    routing::get,
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use crate::database::{card_count, image_count};
use crate::models::CanonicalCard;
use crate::resolver::CardResolver;

/// Shared application state
#[derive(Clone)]
struct AppState {
    resolver: Arc<CardResolver>,
    db: Arc<Mutex<Connection>>,
    /// Base URL clients can reach this service under, used to rewrite image
    /// URLs to the local image endpoints
    public_url: String,
}

/// Search query parameters: exactly one of `name` or `id`
#[derive(Deserialize)]
struct SearchParams {
    name: Option<String>,
    id: Option<i64>,
}

/// API response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Cache statistics
#[derive(Serialize)]
struct CacheStats {
    cards: i64,
    images: i64,
}

/// Rewrite a card's image URLs to this service's image endpoints when a
/// cached asset exists, so clients stop hitting the provider's CDN.
fn localize_image_urls(card: &mut CanonicalCard, public_url: &str, has_asset: bool) {
    if !has_asset {
        return;
    }
    card.image_url = Some(format!("{}/api/images/{}/regular", public_url, card.card_id));
    card.image_url_small = Some(format!("{}/api/images/{}/small", public_url, card.card_id));
}

/// GET /api/cards/search?name={text} | ?id={int}
async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<CanonicalCard>>, StatusCode> {
    let result = match (params.id, params.name) {
        (Some(id), _) => state.resolver.resolve_id(id).await,
        (None, Some(name)) => state.resolver.resolve_name(&name).await,
        (None, None) => return Err(StatusCode::BAD_REQUEST),
    };

    match result {
        Ok(Some(mut card)) => {
            let has_asset = state.resolver.image_exists(card.card_id).unwrap_or(false);
            localize_image_urls(&mut card, &state.public_url, has_asset);
            Ok(Json(ApiResponse {
                success: true,
                data: Some(card),
                error: None,
            }))
        }
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) if e.is_transient() => {
            log::warn!("Provider unavailable: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(e) => {
            log::error!("Resolution error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/images/{id}/{size} - size is "regular" or "small"
async fn image_handler(
    State(state): State<AppState>,
    Path((card_id, size)): Path<(i64, String)>,
) -> Response {
    let small = match size.as_str() {
        "regular" => false,
        "small" => true,
        _ => return not_found_response("unknown image size"),
    };

    match state.resolver.image_bytes(card_id, small) {
        Ok(Some(bytes)) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "image/jpeg")
            .header(header::CACHE_CONTROL, "public, max-age=86400")
            .body(Body::from(bytes))
            .unwrap(),
        Ok(None) => not_found_response("image not cached"),
        Err(e) => {
            log::error!("Image lookup failed for card {}: {}", card_id, e);
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap()
        }
    }
}

fn not_found_response(msg: &str) -> Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .body(Body::from(msg.to_string()))
        .unwrap()
}

/// GET /api/stats - cached record counts
async fn stats_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CacheStats>>, StatusCode> {
    let conn = state.db.lock().unwrap();
    match (card_count(&conn), image_count(&conn)) {
        (Ok(cards), Ok(images)) => Ok(Json(ApiResponse {
            success: true,
            data: Some(CacheStats { cards, images }),
            error: None,
        })),
        (Err(e), _) | (_, Err(e)) => {
            log::error!("Stats query failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Build the router
pub fn create_router(
    resolver: Arc<CardResolver>,
    db: Arc<Mutex<Connection>>,
    public_url: String,
) -> Router {
    let state = AppState {
        resolver,
        db,
        public_url: public_url.trim_end_matches('/').to_string(),
    };

    Router::new()
        .route("/api/cards/search", get(search_handler))
        .route("/api/images/{id}/{size}", get(image_handler))
        .route("/api/stats", get(stats_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server (async)
///
/// Binds to 0.0.0.0 (all interfaces) to work with Docker port mapping.
pub async fn serve(
    resolver: Arc<CardResolver>,
    db: Arc<Mutex<Connection>>,
    public_url: String,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(resolver, db, public_url);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Card resolver API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
