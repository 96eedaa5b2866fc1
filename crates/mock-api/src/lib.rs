//! In-memory test double of the campusmarket backend.
//!
//! Serves the per-resource CRUD endpoints with the production envelope
//! shape (`{success, data?, error?, message?}`), JSON and multipart bodies,
//! exact-match query filters, and incrementing integer ids. The shared
//! [`ApiState`] exposes per-endpoint hit counters and stored records so
//! client tests can assert "no network call happened" and inspect what the
//! server persisted.
//!
//! Two fault routes exist for error-taxonomy tests: `GET /__broken`
//! answers 200 with an unparsable body, `GET /__slow` stalls long enough
//! to trip any sane client timeout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

/// Resource path segments the mock serves.
pub const RESOURCES: &[&str] = &["rooms", "rides", "lost-found", "tickets"];

/// Form field carrying file uploads.
const IMAGE_FIELD: &str = "images";

/// Form field carrying the JSON list of image URLs to delete.
const DELETED_IMAGES_FIELD: &str = "deleted_images";

/// Request bodies larger than this are rejected.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// How long `GET /__slow` stalls before answering.
const SLOW_ROUTE_DELAY: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared in-memory backend state, inspectable from tests.
#[derive(Debug, Default)]
pub struct ApiState {
    stores: RwLock<HashMap<String, Vec<Map<String, Value>>>>,
    next_id: AtomicI64,
    hits: RwLock<HashMap<String, usize>>,
    last_authorization: RwLock<Option<String>>,
}

impl ApiState {
    /// How many requests hit `method` on `/{resource}` so far.
    pub async fn hits(&self, method: &str, resource: &str) -> usize {
        self.hits
            .read()
            .await
            .get(&hit_key(method, resource))
            .copied()
            .unwrap_or(0)
    }

    /// Insert a record directly, bypassing HTTP. Returns the assigned id.
    pub async fn seed(&self, resource: &str, fields: Value) -> i64 {
        let fields = fields
            .as_object()
            .cloned()
            .expect("seed fields must be a JSON object");
        let id = self.mint_id();
        let mut record = fields;
        record.insert("id".into(), json!(id));
        self.stores
            .write()
            .await
            .entry(resource.to_string())
            .or_default()
            .push(record);
        id
    }

    /// The stored record as JSON, for test assertions.
    pub async fn record(&self, resource: &str, id: i64) -> Option<Value> {
        let stores = self.stores.read().await;
        stores
            .get(resource)?
            .iter()
            .find(|r| r.get("id") == Some(&json!(id)))
            .cloned()
            .map(Value::Object)
    }

    /// The `Authorization` header of the most recent request, if any.
    pub async fn last_authorization(&self) -> Option<String> {
        self.last_authorization.read().await.clone()
    }

    fn mint_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn record_hit(&self, method: &str, resource: &str) {
        *self
            .hits
            .write()
            .await
            .entry(hit_key(method, resource))
            .or_insert(0) += 1;
    }

    async fn capture_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if value.is_some() {
            *self.last_authorization.write().await = value;
        }
    }
}

fn hit_key(method: &str, resource: &str) -> String {
    format!("{method} {resource}")
}

pub type SharedState = Arc<ApiState>;

// ---------------------------------------------------------------------------
// Router / entry points
// ---------------------------------------------------------------------------

/// Build the router plus a handle to its shared state.
pub fn app() -> (Router, SharedState) {
    let state: SharedState = Arc::new(ApiState::default());
    let router = Router::new()
        .route("/__broken", get(broken))
        .route("/__slow", get(slow))
        .route("/{resource}", get(list_records).post(create_record))
        .route(
            "/{resource}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(state.clone());
    (router, state)
}

/// Serve on an already-bound listener (standalone bin).
pub async fn run(listener: TcpListener) -> std::io::Result<()> {
    let (router, _state) = app();
    axum::serve(listener, router).await
}

/// A spawned mock instance reachable over real HTTP.
pub struct MockApi {
    pub base_url: String,
    pub state: SharedState,
}

/// Bind port 0, serve in a background task, and hand back the base URL
/// plus the state handle. Panics on bind failure; this is test support.
pub async fn spawn() -> MockApi {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock API listener");
    let addr = listener.local_addr().expect("Mock API has no local addr");
    let (router, state) = app();
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "Mock API server stopped");
        }
    });
    MockApi {
        base_url: format!("http://{addr}"),
        state,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_records(
    State(state): State<SharedState>,
    Path(resource): Path<String>,
    Query(filters): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.capture_auth(&headers).await;
    if !known_resource(&resource) {
        return unknown_resource(&resource);
    }
    state.record_hit("GET", &resource).await;

    let stores = state.stores.read().await;
    let matching: Vec<Value> = stores
        .get(&resource)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|record| matches_filters(record, &filters))
        .map(Value::Object)
        .collect();
    envelope_ok(StatusCode::OK, Some(Value::Array(matching)))
}

async fn get_record(
    State(state): State<SharedState>,
    Path((resource, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    state.capture_auth(&headers).await;
    if !known_resource(&resource) {
        return unknown_resource(&resource);
    }
    state.record_hit("GET_ONE", &resource).await;

    match state.record(&resource, id).await {
        Some(record) => envelope_ok(StatusCode::OK, Some(record)),
        None => envelope_error(StatusCode::NOT_FOUND, &format!("No record with id {id}")),
    }
}

async fn create_record(
    State(state): State<SharedState>,
    Path(resource): Path<String>,
    request: Request,
) -> Response {
    state.capture_auth(request.headers()).await;
    if !known_resource(&resource) {
        return unknown_resource(&resource);
    }
    state.record_hit("POST", &resource).await;

    let body = match parse_body(request).await {
        Ok(body) => body,
        Err(message) => return envelope_error(StatusCode::BAD_REQUEST, &message),
    };

    let mut record = body.fields;
    apply_image_changes(&mut record, &body.uploaded, &body.deleted);
    let id = state.mint_id();
    record.insert("id".into(), json!(id));

    state
        .stores
        .write()
        .await
        .entry(resource)
        .or_default()
        .push(record.clone());

    envelope_ok(StatusCode::CREATED, Some(Value::Object(record)))
}

async fn update_record(
    State(state): State<SharedState>,
    Path((resource, id)): Path<(String, i64)>,
    request: Request,
) -> Response {
    state.capture_auth(request.headers()).await;
    if !known_resource(&resource) {
        return unknown_resource(&resource);
    }
    state.record_hit("PUT", &resource).await;

    let body = match parse_body(request).await {
        Ok(body) => body,
        Err(message) => return envelope_error(StatusCode::BAD_REQUEST, &message),
    };

    let mut stores = state.stores.write().await;
    let records = stores.entry(resource).or_default();
    let Some(record) = records.iter_mut().find(|r| r.get("id") == Some(&json!(id))) else {
        return envelope_error(StatusCode::NOT_FOUND, &format!("No record with id {id}"));
    };

    for (key, value) in body.fields {
        record.insert(key, value);
    }
    apply_image_changes(record, &body.uploaded, &body.deleted);
    record.insert("id".into(), json!(id));

    envelope_ok(StatusCode::OK, Some(Value::Object(record.clone())))
}

async fn delete_record(
    State(state): State<SharedState>,
    Path((resource, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    state.capture_auth(&headers).await;
    if !known_resource(&resource) {
        return unknown_resource(&resource);
    }
    state.record_hit("DELETE", &resource).await;

    let mut stores = state.stores.write().await;
    let records = stores.entry(resource).or_default();
    let before = records.len();
    records.retain(|r| r.get("id") != Some(&json!(id)));

    if records.len() == before {
        envelope_error(StatusCode::NOT_FOUND, &format!("No record with id {id}"))
    } else {
        envelope_ok(StatusCode::OK, None)
    }
}

async fn broken() -> Response {
    (StatusCode::OK, "this is not json").into_response()
}

async fn slow() -> Response {
    tokio::time::sleep(SLOW_ROUTE_DELAY).await;
    envelope_ok(StatusCode::OK, Some(json!([])))
}

// ---------------------------------------------------------------------------
// Body parsing
// ---------------------------------------------------------------------------

struct ParsedBody {
    fields: Map<String, Value>,
    /// URLs assigned to uploaded files, in arrival order.
    uploaded: Vec<String>,
    /// Image URLs the client asked to delete.
    deleted: Vec<String>,
}

/// Accept either a JSON object or a multipart form, mirroring the
/// production backend's create/update endpoints.
async fn parse_body(request: Request) -> Result<ParsedBody, String> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        parse_multipart(request).await
    } else {
        parse_json(request).await
    }
}

async fn parse_json(request: Request) -> Result<ParsedBody, String> {
    let bytes = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|e| format!("Failed to read body: {e}"))?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("Body is not valid JSON: {e}"))?;
    let fields = value
        .as_object()
        .cloned()
        .ok_or_else(|| "Body must be a JSON object".to_string())?;
    Ok(ParsedBody {
        fields,
        uploaded: Vec::new(),
        deleted: Vec::new(),
    })
}

async fn parse_multipart(request: Request) -> Result<ParsedBody, String> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| format!("Invalid multipart body: {e}"))?;

    let mut fields = Map::new();
    let mut uploaded = Vec::new();
    let mut deleted = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Invalid multipart field: {e}"))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == IMAGE_FIELD {
            let file_name = field.file_name().unwrap_or("upload.bin").to_string();
            // Body content is discarded; only the served URL matters here.
            field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read file part: {e}"))?;
            uploaded.push(format!("/uploads/{file_name}"));
        } else if name == DELETED_IMAGES_FIELD {
            let text = field
                .text()
                .await
                .map_err(|e| format!("Failed to read {DELETED_IMAGES_FIELD}: {e}"))?;
            deleted = serde_json::from_str(&text)
                .map_err(|e| format!("{DELETED_IMAGES_FIELD} must be a JSON string array: {e}"))?;
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| format!("Failed to read field '{name}': {e}"))?;
            fields.insert(name, Value::String(text));
        }
    }

    Ok(ParsedBody {
        fields,
        uploaded,
        deleted,
    })
}

/// Merge uploaded URLs into the record's `images` array and drop deleted
/// ones.
fn apply_image_changes(record: &mut Map<String, Value>, uploaded: &[String], deleted: &[String]) {
    if uploaded.is_empty() && deleted.is_empty() {
        return;
    }

    let mut images: Vec<String> = record
        .get(IMAGE_FIELD)
        .and_then(Value::as_array)
        .map(|urls| {
            urls.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    images.extend(uploaded.iter().cloned());
    images.retain(|url| !deleted.contains(url));
    record.insert(IMAGE_FIELD.into(), json!(images));
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn known_resource(resource: &str) -> bool {
    RESOURCES.contains(&resource)
}

fn matches_filters(record: &Map<String, Value>, filters: &HashMap<String, String>) -> bool {
    filters.iter().all(|(key, expected)| match record.get(key) {
        Some(Value::String(s)) => s == expected,
        Some(other) => other.to_string() == *expected,
        None => false,
    })
}

fn envelope_ok(status: StatusCode, data: Option<Value>) -> Response {
    let mut body = json!({"success": true});
    if let Some(data) = data {
        body["data"] = data;
    }
    (status, Json(body)).into_response()
}

fn envelope_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({"success": false, "error": message})),
    )
        .into_response()
}

fn unknown_resource(resource: &str) -> Response {
    envelope_error(
        StatusCode::NOT_FOUND,
        &format!("Unknown resource '{resource}'"),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get(router: Router, uri: &str) -> Response {
        router
            .oneshot(HttpRequest::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(router: Router, uri: &str, body: Value) -> Response {
        router
            .oneshot(
                HttpRequest::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn empty_list_returns_success_envelope() {
        let (router, _state) = app();
        let response = get(router, "/rooms").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], json!([]));
    }

    #[tokio::test]
    async fn unknown_resource_is_a_404_envelope() {
        let (router, _state) = app();
        let response = get(router, "/gadgets").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn create_assigns_incrementing_ids() {
        let (router, _state) = app();

        let first = post_json(router.clone(), "/rooms", json!({"title": "A"})).await;
        assert_eq!(first.status(), StatusCode::CREATED);
        let first = body_json(first).await;
        assert_eq!(first["data"]["id"], 1);

        let second = post_json(router, "/rooms", json!({"title": "B"})).await;
        let second = body_json(second).await;
        assert_eq!(second["data"]["id"], 2);
    }

    #[tokio::test]
    async fn list_filters_match_exactly() {
        let (router, state) = app();
        state.seed("rooms", json!({"area": "north", "title": "A"})).await;
        state.seed("rooms", json!({"area": "south", "title": "B"})).await;

        let response = get(router, "/rooms?area=north").await;
        let json = body_json(response).await;
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["title"], "A");
    }

    #[tokio::test]
    async fn numeric_filter_values_compare_by_display_form() {
        let (router, state) = app();
        state.seed("rooms", json!({"rent": 450})).await;

        let response = get(router, "/rooms?rent=450").await;
        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (router, state) = app();
        let id = state.seed("rooms", json!({"title": "A"})).await;

        let deleted = router
            .clone()
            .oneshot(
                HttpRequest::delete(format!("/rooms/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let response = get(router, &format!("/rooms/{id}")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_hits_are_counted() {
        let (router, state) = app();
        get(router.clone(), "/rooms").await;
        get(router, "/rooms").await;
        assert_eq!(state.hits("GET", "rooms").await, 2);
        assert_eq!(state.hits("GET", "rides").await, 0);
    }

    #[tokio::test]
    async fn broken_route_returns_unparsable_body() {
        let (router, _state) = app();
        let response = get(router, "/__broken").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(serde_json::from_slice::<Value>(&bytes).is_err());
    }
}
