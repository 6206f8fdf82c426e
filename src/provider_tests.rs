//! Tests for the YGOPRODeck API client.

use super::{fetch_image, fetch_image_with_timeout, ApiCard, ProviderClient, SearchStrategy};
use crate::error::Error;
use std::time::Duration;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ProviderClient {
    ProviderClient::new(base_url, Duration::from_secs(5), Duration::from_secs(10)).unwrap()
}

/// Helper: one-card response body in the provider's schema
fn card_envelope_json() -> serde_json::Value {
    serde_json::json!({
        "data": [{
            "id": 46986414,
            "name": "Dark Magician",
            "type": "Normal Monster",
            "frameType": "normal",
            "desc": "The ultimate wizard in terms of attack and defense.",
            "atk": 2500,
            "def": 2100,
            "level": 7,
            "race": "Spellcaster",
            "attribute": "DARK",
            "card_images": [{
                "image_url": "https://images.example.com/46986414.jpg",
                "image_url_small": "https://images.example.com/small/46986414.jpg"
            }],
            "card_sets": [{"set_name": "Legend of Blue Eyes", "set_code": "LOB-005"}],
            "card_prices": [{
                "cardmarket_price": "0.35",
                "tcgplayer_price": "0.42",
                "ebay_price": "1.99",
                "amazon_price": "2.50",
                "coolstuffinc_price": "0.99",
                "some_future_marketplace": "9.99"
            }]
        }]
    })
}

// ── payload parsing ──────────────────────────────────────────────────

#[test]
fn deserialize_minimal_card() {
    let card: ApiCard = serde_json::from_str(r#"{"id": 123, "name": "Test Card"}"#).unwrap();
    assert_eq!(card.id, 123);
    assert_eq!(card.name, "Test Card");
    assert!(card.card_type.is_none());
    assert!(card.atk.is_none());
    assert!(card.card_images.is_none());
    assert!(card.card_prices.is_none());
}

#[test]
fn into_card_maps_all_present_fields() {
    let json = card_envelope_json();
    let card: ApiCard = serde_json::from_value(json["data"][0].clone()).unwrap();
    let card = card.into_card();

    assert_eq!(card.card_id, 46986414);
    assert_eq!(card.name, "Dark Magician");
    assert_eq!(card.card_type.as_deref(), Some("Normal Monster"));
    assert_eq!(card.frame_type.as_deref(), Some("normal"));
    assert_eq!(card.atk, Some(2500));
    assert_eq!(card.def, Some(2100));
    assert_eq!(card.level, Some(7));
    assert_eq!(card.race.as_deref(), Some("Spellcaster"));
    assert_eq!(card.attribute.as_deref(), Some("DARK"));
    assert_eq!(
        card.image_url.as_deref(),
        Some("https://images.example.com/46986414.jpg")
    );
    assert_eq!(
        card.image_url_small.as_deref(),
        Some("https://images.example.com/small/46986414.jpg")
    );
    assert!(card.card_sets.as_deref().unwrap().contains("LOB-005"));
}

#[test]
fn price_snapshot_keeps_only_known_marketplaces() {
    let json = card_envelope_json();
    let card: ApiCard = serde_json::from_value(json["data"][0].clone()).unwrap();
    let prices = card.into_card().prices.unwrap();

    assert_eq!(prices.cardmarket.as_deref(), Some("0.35"));
    assert_eq!(prices.tcgplayer.as_deref(), Some("0.42"));
    assert_eq!(prices.ebay.as_deref(), Some("1.99"));
    assert_eq!(prices.amazon.as_deref(), Some("2.50"));
    assert_eq!(prices.coolstuffinc.as_deref(), Some("0.99"));
    // "some_future_marketplace" was discarded by the fixed-key extraction
}

#[test]
fn into_card_leaves_absent_fields_unset() {
    let card: ApiCard =
        serde_json::from_str(r#"{"id": 5, "name": "Pot of Greed", "type": "Spell Card"}"#).unwrap();
    let card = card.into_card();

    assert!(card.atk.is_none());
    assert!(card.def.is_none());
    assert!(card.level.is_none());
    assert!(card.race.is_none());
    assert!(card.prices.is_none());
    assert!(card.image_url.is_none());
    assert!(card.created_at.is_none());
}

// ── search ───────────────────────────────────────────────────────────

#[tokio::test]
async fn search_exact_name_hit() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("name", "Dark Magician"))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_envelope_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let candidates = client
        .search(&SearchStrategy::ExactName("Dark Magician".to_string()))
        .await
        .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "Dark Magician");
}

#[tokio::test]
async fn fuzzy_search_sends_pagination_hints() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("fname", "Dark Magi"))
        .and(query_param("num", "10"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_envelope_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let candidates = client
        .search(&SearchStrategy::FuzzyName("Dark Magi".to_string()))
        .await
        .unwrap();
    assert_eq!(candidates.len(), 1);
}

#[tokio::test]
async fn search_by_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("id", "46986414"))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_envelope_json()))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let candidates = client.search(&SearchStrategy::Id(46986414)).await.unwrap();
    assert_eq!(candidates[0].id, 46986414);
}

#[tokio::test]
async fn client_error_status_is_a_miss() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"error": "No card matching your query was found in the database."}"#,
        ))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let candidates = client
        .search(&SearchStrategy::ExactName("Drak Magician".to_string()))
        .await
        .unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn empty_data_array_is_a_miss() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let candidates = client
        .search(&SearchStrategy::FuzzyName("zzzz".to_string()))
        .await
        .unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_miss_not_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let candidates = client
        .search(&SearchStrategy::ExactName("Dark Magician".to_string()))
        .await
        .unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn missing_data_field_is_a_miss() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"cards": []})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let candidates = client
        .search(&SearchStrategy::ExactName("Dark Magician".to_string()))
        .await
        .unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn server_error_is_transient() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client
        .search(&SearchStrategy::ExactName("Dark Magician".to_string()))
        .await
        .unwrap_err();

    match err {
        Error::HttpStatus(status) => assert_eq!(status.as_u16(), 503),
        other => panic!("expected HttpStatus, got {:?}", other),
    }
    assert!(err.is_transient());
}

// ── image fetch ──────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_image_returns_raw_bytes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFFu8, 0xD8, 0xFF]))
        .mount(&mock_server)
        .await;

    let bytes = fetch_image(&format!("{}/card.jpg", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
}

#[tokio::test]
async fn fetch_image_failure_names_the_url() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing.jpg", mock_server.uri());
    let err = fetch_image(&url).await.unwrap_err();
    match err {
        Error::ImageFetchFailed(failed_url) => assert_eq!(failed_url, url),
        other => panic!("expected ImageFetchFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_image_download_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFFu8])
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/slow.jpg", mock_server.uri());
    let err = fetch_image_with_timeout(&url, Duration::from_millis(100))
        .await
        .unwrap_err();
    match err {
        Error::Network(_) => {}
        other => panic!("expected Network, got {:?}", other),
    }
    assert!(err.is_transient());
}
