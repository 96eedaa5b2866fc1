use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use campusmarket_client::{ClientConfig, ResourceClient, StaticToken};
use campusmarket_mock_api::MockApi;

/// Build a `ClientConfig` pointed at a spawned mock instance, with a short
/// timeout so a broken test fails fast.
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(5),
        cache_ttl: Duration::from_secs(120),
    }
}

/// A `ResourceClient` talking to the given mock with a fixed bearer token.
pub fn client_for(mock: &MockApi) -> ResourceClient {
    ResourceClient::new(
        &test_config(&mock.base_url),
        Arc::new(StaticToken::new("test-token")),
    )
}

/// Shorthand for building a JSON field map.
pub fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Shorthand for building query filters.
pub fn filters(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
