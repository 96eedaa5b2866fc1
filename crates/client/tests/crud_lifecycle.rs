//! Full CRUD lifecycle against the live mock API.
//!
//! Exercises every resource-client operation over real HTTP:
//! - create / list / fetch-one / update / delete round-trip
//! - fail-fast validation (no request leaves the client)
//! - bearer-token attachment
//! - alias-field normalization at the decode boundary

mod common;

use assert_matches::assert_matches;
use serde_json::json;

use campusmarket_client::{ApiError, FetchOptions};
use campusmarket_core::ResourceKind;
use campusmarket_mock_api::spawn;

use common::{client_for, fields};

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn crud_lifecycle_roundtrip() {
    let mock = spawn().await;
    let client = client_for(&mock);

    // Empty backend: empty list, not an error.
    let rooms = client
        .fetch_many(ResourceKind::Room, &[], FetchOptions::no_cache())
        .await
        .unwrap();
    assert!(rooms.is_empty());

    // Create.
    let created = client
        .create(
            ResourceKind::Room,
            fields(&[
                ("title", json!("Sunny single near campus")),
                ("rent", json!(480)),
                ("location", json!("Dormitory Lane 4")),
            ]),
        )
        .await
        .unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.str_field("title"), Some("Sunny single near campus"));

    // List sees it.
    let rooms = client
        .fetch_many(ResourceKind::Room, &[], FetchOptions::no_cache())
        .await
        .unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].id, created.id);

    // Update merges fields server-side.
    let updated = client
        .update(
            ResourceKind::Room,
            created.id,
            fields(&[("rent", json!(520))]),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.field("rent"), Some(&json!(520)));
    assert_eq!(updated.str_field("title"), Some("Sunny single near campus"));

    // Detail fetch returns the updated record.
    let fetched = client
        .fetch_one(ResourceKind::Room, created.id, FetchOptions::no_cache())
        .await
        .unwrap();
    assert_eq!(fetched, updated);

    // Delete, then the record is gone.
    client.remove(ResourceKind::Room, created.id).await.unwrap();
    let err = client
        .fetch_one(ResourceKind::Room, created.id, FetchOptions::no_cache())
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Http { status: 404, .. });
}

#[tokio::test]
async fn list_filters_are_passed_as_query_params() {
    let mock = spawn().await;
    let client = client_for(&mock);

    mock.state
        .seed("rides", json!({"origin": "North Campus", "destination": "Airport"}))
        .await;
    mock.state
        .seed("rides", json!({"origin": "South Campus", "destination": "Airport"}))
        .await;

    let rides = client
        .fetch_many(
            ResourceKind::Ride,
            &common::filters(&[("origin", "North Campus")]),
            FetchOptions::no_cache(),
        )
        .await
        .unwrap();

    assert_eq!(rides.len(), 1);
    assert_eq!(rides[0].str_field("origin"), Some("North Campus"));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_fails_fast_on_missing_required_field() {
    let mock = spawn().await;
    let client = client_for(&mock);

    let err = client
        .create(
            ResourceKind::Room,
            fields(&[("title", json!("No rent, no location"))]),
        )
        .await
        .unwrap_err();

    assert_matches!(err, ApiError::Validation(_));
    // The request never left the client.
    assert_eq!(mock.state.hits("POST", "rooms").await, 0);
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bearer_token_is_attached_to_requests() {
    let mock = spawn().await;
    let client = client_for(&mock);

    client
        .fetch_many(ResourceKind::Room, &[], FetchOptions::no_cache())
        .await
        .unwrap();

    assert_eq!(
        mock.state.last_authorization().await.as_deref(),
        Some("Bearer test-token")
    );
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn alias_fields_are_normalized_at_the_boundary() {
    let mock = spawn().await;
    let client = client_for(&mock);

    mock.state
        .seed("rooms", json!({"title": "Aliased", "price": 500, "photos": ["/uploads/a.jpg"]}))
        .await;

    let rooms = client
        .fetch_many(ResourceKind::Room, &[], FetchOptions::no_cache())
        .await
        .unwrap();

    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].field("rent"), Some(&json!(500)));
    assert_eq!(rooms[0].field("images"), Some(&json!(["/uploads/a.jpg"])));
    assert!(rooms[0].field("price").is_none());
    assert!(rooms[0].field("photos").is_none());
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deleting_a_missing_record_is_http_404() {
    let mock = spawn().await;
    let client = client_for(&mock);

    let err = client.remove(ResourceKind::Room, 999).await.unwrap_err();
    assert_matches!(err, ApiError::Http { status: 404, .. });
}
