//! The CRUD facade screens talk to.
//!
//! [`ResourceClient`] ties the transport, the response cache, and the auth
//! context together. Reads consult the cache first; every successful
//! mutation evicts all cached entries for the mutated kind, so the next
//! fetch observes the write. The client owns its cache instance --
//! lifecycle events like logout call [`ResourceClient::cache`]`().clear()`
//! explicitly instead of relying on ambient global state.
//!
//! Returned lists are the caller's own copy; the client never touches a
//! list after handing it out.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use campusmarket_core::normalize;
use campusmarket_core::resource::validate_create_fields;
use campusmarket_core::{Resource, ResourceId, ResourceKind};

use crate::auth::TokenSource;
use crate::cache::{self, CachedPayload, ResponseCache};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::multipart::UploadPayload;
use crate::transport::{Method, RequestBody, RequestOptions, Transport};

/// Cache behaviour for one read.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Consult and populate the cache for this read.
    pub cache: bool,
    /// TTL override; the client's configured default applies when `None`.
    pub cache_ttl: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cache: true,
            cache_ttl: None,
        }
    }
}

impl FetchOptions {
    /// Bypass the cache entirely (always hit the network, store nothing).
    pub fn no_cache() -> Self {
        Self {
            cache: false,
            cache_ttl: None,
        }
    }

    /// Cache with an explicit TTL.
    pub fn cached_for(ttl: Duration) -> Self {
        Self {
            cache: true,
            cache_ttl: Some(ttl),
        }
    }
}

/// CRUD client for one backend, shared by all screens.
pub struct ResourceClient {
    transport: Transport,
    cache: ResponseCache,
    auth: Arc<dyn TokenSource>,
    default_cache_ttl: Duration,
}

impl ResourceClient {
    pub fn new(config: &ClientConfig, auth: Arc<dyn TokenSource>) -> Self {
        Self {
            transport: Transport::new(config),
            cache: ResponseCache::new(),
            auth,
            default_cache_ttl: config.cache_ttl,
        }
    }

    /// The owned response cache, exposed for explicit lifecycle control
    /// (clear on logout, clear between tests).
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    // ---- reads ----

    /// Fetch a filtered list, cache-first.
    ///
    /// On a fresh cache hit the transport is not invoked at all. On a miss
    /// the server list is decoded, normalized to the kind's canonical
    /// field schema, stored under the query signature, and returned.
    pub async fn fetch_many(
        &self,
        kind: ResourceKind,
        filters: &[(String, String)],
        options: FetchOptions,
    ) -> Result<Vec<Resource>, ApiError> {
        let sig = cache::signature(kind, filters);

        if options.cache {
            if let Some(CachedPayload::List(list)) = self.cache.get(&sig) {
                tracing::debug!(kind = %kind, signature = %sig, "List served from cache");
                return Ok(list);
            }
        }

        let data = self
            .transport
            .send(
                Method::GET,
                kind.path(),
                RequestOptions {
                    params: filters.to_vec(),
                    auth_token: self.auth.bearer_token(),
                    ..Default::default()
                },
            )
            .await?;

        let mut list = decode_list(data)?;
        normalize::normalize_list(kind, &mut list);

        if options.cache {
            let ttl = options.cache_ttl.unwrap_or(self.default_cache_ttl);
            self.cache.insert(sig, CachedPayload::List(list.clone()), ttl);
        }
        Ok(list)
    }

    /// Fetch a single record, cache-first (keyed by an `id` pseudo-filter).
    pub async fn fetch_one(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        options: FetchOptions,
    ) -> Result<Resource, ApiError> {
        let pseudo_filter = [("id".to_string(), id.to_string())];
        let sig = cache::signature(kind, &pseudo_filter);

        if options.cache {
            if let Some(CachedPayload::One(resource)) = self.cache.get(&sig) {
                tracing::debug!(kind = %kind, id, "Record served from cache");
                return Ok(resource);
            }
        }

        let data = self
            .transport
            .send(
                Method::GET,
                &format!("{}/{id}", kind.path()),
                RequestOptions {
                    auth_token: self.auth.bearer_token(),
                    ..Default::default()
                },
            )
            .await?;

        let mut resource = decode_one(data)?;
        normalize::normalize_resource(kind, &mut resource);

        if options.cache {
            let ttl = options.cache_ttl.unwrap_or(self.default_cache_ttl);
            self.cache.insert(sig, CachedPayload::One(resource.clone()), ttl);
        }
        Ok(resource)
    }

    // ---- mutations ----

    /// Create a record from a JSON field map.
    ///
    /// Required fields are checked before anything is sent; a bad form
    /// fails with [`ApiError::Validation`] and costs no round-trip.
    pub async fn create(
        &self,
        kind: ResourceKind,
        fields: Map<String, Value>,
    ) -> Result<Resource, ApiError> {
        validate_create_fields(kind, &fields)?;

        let data = self
            .transport
            .send(
                Method::POST,
                kind.path(),
                RequestOptions {
                    body: RequestBody::Json(Value::Object(fields)),
                    auth_token: self.auth.bearer_token(),
                    ..Default::default()
                },
            )
            .await?;

        self.finish_mutation(kind, data)
    }

    /// Create an image-bearing record with a multipart body.
    pub async fn create_with_images(
        &self,
        kind: ResourceKind,
        payload: UploadPayload,
    ) -> Result<Resource, ApiError> {
        validate_upload_fields(kind, &payload)?;

        let data = self
            .transport
            .send(
                Method::POST,
                kind.path(),
                RequestOptions {
                    body: RequestBody::Multipart(payload),
                    auth_token: self.auth.bearer_token(),
                    ..Default::default()
                },
            )
            .await?;

        self.finish_mutation(kind, data)
    }

    /// Update a record with a JSON field map.
    pub async fn update(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        fields: Map<String, Value>,
    ) -> Result<Resource, ApiError> {
        let data = self
            .transport
            .send(
                Method::PUT,
                &format!("{}/{id}", kind.path()),
                RequestOptions {
                    body: RequestBody::Json(Value::Object(fields)),
                    auth_token: self.auth.bearer_token(),
                    ..Default::default()
                },
            )
            .await?;

        self.finish_mutation(kind, data)
    }

    /// Update an image-bearing record: new files and URL deletions travel
    /// in the same multipart request as the scalar fields.
    pub async fn update_with_images(
        &self,
        kind: ResourceKind,
        id: ResourceId,
        payload: UploadPayload,
    ) -> Result<Resource, ApiError> {
        let data = self
            .transport
            .send(
                Method::PUT,
                &format!("{}/{id}", kind.path()),
                RequestOptions {
                    body: RequestBody::Multipart(payload),
                    auth_token: self.auth.bearer_token(),
                    ..Default::default()
                },
            )
            .await?;

        self.finish_mutation(kind, data)
    }

    /// Delete a record.
    pub async fn remove(&self, kind: ResourceKind, id: ResourceId) -> Result<(), ApiError> {
        self.transport
            .send(
                Method::DELETE,
                &format!("{}/{id}", kind.path()),
                RequestOptions {
                    auth_token: self.auth.bearer_token(),
                    ..Default::default()
                },
            )
            .await?;

        self.cache.invalidate_kind(kind);
        tracing::debug!(kind = %kind, id, "Deleted record");
        Ok(())
    }

    // ---- internal ----

    /// Shared tail of every record-returning mutation: decode, normalize,
    /// and only then evict the kind's cache entries (failures must leave
    /// the cache untouched).
    fn finish_mutation(
        &self,
        kind: ResourceKind,
        data: Option<Value>,
    ) -> Result<Resource, ApiError> {
        let mut resource = decode_one(data)?;
        normalize::normalize_resource(kind, &mut resource);
        self.cache.invalidate_kind(kind);
        Ok(resource)
    }
}

/// Required-field check for multipart payloads, mirroring
/// [`validate_create_fields`] over the serialized form entries.
fn validate_upload_fields(kind: ResourceKind, payload: &UploadPayload) -> Result<(), ApiError> {
    for name in kind.required_fields() {
        let present = payload
            .fields()
            .iter()
            .any(|(key, value)| key == name && !value.trim().is_empty());
        if !present {
            return Err(ApiError::Validation(format!(
                "Missing required field '{name}' for {kind}"
            )));
        }
    }
    Ok(())
}

fn decode_list(data: Option<Value>) -> Result<Vec<Resource>, ApiError> {
    let value = data.ok_or_else(|| ApiError::Decode("List response carried no data".into()))?;
    serde_json::from_value(value)
        .map_err(|e| ApiError::Decode(format!("Unexpected list shape: {e}")))
}

fn decode_one(data: Option<Value>) -> Result<Resource, ApiError> {
    let value = data.ok_or_else(|| ApiError::Decode("Response carried no record".into()))?;
    serde_json::from_value(value)
        .map_err(|e| ApiError::Decode(format!("Unexpected record shape: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fetch_options_default_to_cached_reads() {
        let options = FetchOptions::default();
        assert!(options.cache);
        assert!(options.cache_ttl.is_none());
    }

    #[test]
    fn no_cache_disables_the_cache() {
        assert!(!FetchOptions::no_cache().cache);
    }

    #[test]
    fn decode_list_rejects_missing_data() {
        let err = decode_list(None).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn decode_list_rejects_non_list_shapes() {
        let err = decode_list(Some(json!({"id": 1}))).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn decode_one_accepts_a_record() {
        let resource = decode_one(Some(json!({"id": 4, "title": "Ride"}))).unwrap();
        assert_eq!(resource.id, 4);
        assert_eq!(resource.str_field("title"), Some("Ride"));
    }

    #[test]
    fn decode_one_rejects_records_without_id() {
        let err = decode_one(Some(json!({"title": "Ride"}))).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn upload_validation_requires_all_fields() {
        let mut fields = Map::new();
        fields.insert("title".into(), json!("Room"));
        fields.insert("rent".into(), json!(300));
        // "location" missing.
        let payload = UploadPayload::from_fields(&fields);
        let err = validate_upload_fields(ResourceKind::Room, &payload).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn upload_validation_accepts_complete_payload() {
        let mut fields = Map::new();
        fields.insert("title".into(), json!("Room"));
        fields.insert("rent".into(), json!(300));
        fields.insert("location".into(), json!("Main St 1"));
        let payload = UploadPayload::from_fields(&fields);
        assert!(validate_upload_fields(ResourceKind::Room, &payload).is_ok());
    }
}
