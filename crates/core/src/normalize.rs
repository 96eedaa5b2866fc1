//! Canonical field-name normalization at the decode boundary.
//!
//! The backend is inconsistent about attribute names: a room's monthly cost
//! may arrive as `rent`, `price`, or `monthly_rent` depending on which
//! endpoint produced it. Instead of scattering fallback chains through
//! consuming code, each decoded record passes through exactly one alias
//! table here, after which downstream code sees a single spelling per
//! attribute.

use serde_json::{Map, Value};

use crate::resource::{Resource, ResourceKind};

/// Alias table entry: canonical key, then the accepted alternates in
/// priority order.
type AliasRow = (&'static str, &'static [&'static str]);

const ROOM_ALIASES: &[AliasRow] = &[
    ("rent", &["price", "monthly_rent"]),
    ("location", &["address", "area"]),
    ("images", &["photos", "image_urls"]),
    ("deposit", &["security_deposit"]),
];

const RIDE_ALIASES: &[AliasRow] = &[
    ("origin", &["from", "from_location"]),
    ("destination", &["to", "to_location"]),
    ("departure_time", &["departureTime", "depart_at"]),
    ("seats", &["available_seats", "seats_available"]),
];

const LOST_FOUND_ALIASES: &[AliasRow] = &[
    ("title", &["item_name", "name"]),
    ("location", &["found_location", "place"]),
    ("date", &["date_found", "found_on"]),
];

const TICKET_ALIASES: &[AliasRow] = &[
    ("event_name", &["event", "title"]),
    ("price", &["cost", "asking_price"]),
    ("event_date", &["date", "eventDate"]),
];

/// The alias table for one resource kind.
pub fn aliases(kind: ResourceKind) -> &'static [AliasRow] {
    match kind {
        ResourceKind::Room => ROOM_ALIASES,
        ResourceKind::Ride => RIDE_ALIASES,
        ResourceKind::LostFoundItem => LOST_FOUND_ALIASES,
        ResourceKind::Ticket => TICKET_ALIASES,
    }
}

/// Collapse alias spellings in `fields` into their canonical keys.
///
/// Rules, per table row:
/// - a non-null canonical key always wins; alias keys are dropped;
/// - otherwise the first alias present with a non-null value is moved to
///   the canonical key;
/// - remaining alias keys are removed either way, so one spelling survives.
///
/// JSON `null` counts as absent, matching the fallback behaviour the
/// backend's consumers rely on.
pub fn normalize_fields(kind: ResourceKind, fields: &mut Map<String, Value>) {
    for (canonical, alias_names) in aliases(kind) {
        let canonical_present = matches!(fields.get(*canonical), Some(v) if !v.is_null());

        if !canonical_present {
            // Promote the first alias that carries a value.
            for alias in *alias_names {
                if let Some(value) = fields.remove(*alias) {
                    if !value.is_null() {
                        fields.insert((*canonical).to_string(), value);
                        break;
                    }
                }
            }
        }

        for alias in *alias_names {
            fields.remove(*alias);
        }
        // A null canonical left behind with no alias to promote is dropped
        // so `field()` lookups see it as absent.
        if matches!(fields.get(*canonical), Some(Value::Null)) {
            fields.remove(*canonical);
        }
    }
}

/// Normalize one decoded resource in place.
pub fn normalize_resource(kind: ResourceKind, resource: &mut Resource) {
    normalize_fields(kind, &mut resource.fields);
}

/// Normalize every entry of a decoded list in place.
pub fn normalize_list(kind: ResourceKind, resources: &mut [Resource]) {
    for resource in resources {
        normalize_resource(kind, resource);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn alias_is_promoted_to_canonical_key() {
        let mut f = fields(&[("price", json!(500)), ("title", json!("Room A"))]);
        normalize_fields(ResourceKind::Room, &mut f);
        assert_eq!(f.get("rent"), Some(&json!(500)));
        assert!(!f.contains_key("price"));
        // Untouched fields survive.
        assert_eq!(f.get("title"), Some(&json!("Room A")));
    }

    #[test]
    fn canonical_key_wins_over_alias() {
        let mut f = fields(&[("rent", json!(450)), ("price", json!(999))]);
        normalize_fields(ResourceKind::Room, &mut f);
        assert_eq!(f.get("rent"), Some(&json!(450)));
        assert!(!f.contains_key("price"));
    }

    #[test]
    fn first_alias_in_priority_order_wins() {
        let mut f = fields(&[("monthly_rent", json!(300)), ("price", json!(200))]);
        normalize_fields(ResourceKind::Room, &mut f);
        // "price" is listed before "monthly_rent" in the table.
        assert_eq!(f.get("rent"), Some(&json!(200)));
        assert!(!f.contains_key("monthly_rent"));
    }

    #[test]
    fn null_alias_is_skipped() {
        let mut f = fields(&[("price", Value::Null), ("monthly_rent", json!(275))]);
        normalize_fields(ResourceKind::Room, &mut f);
        assert_eq!(f.get("rent"), Some(&json!(275)));
    }

    #[test]
    fn null_canonical_with_no_alias_is_dropped() {
        let mut f = fields(&[("rent", Value::Null)]);
        normalize_fields(ResourceKind::Room, &mut f);
        assert!(!f.contains_key("rent"));
    }

    #[test]
    fn ride_endpoints_normalize_independently() {
        let mut f = fields(&[
            ("from", json!("North Campus")),
            ("to_location", json!("Airport")),
            ("departureTime", json!("2026-09-01T06:30:00Z")),
        ]);
        normalize_fields(ResourceKind::Ride, &mut f);
        assert_eq!(f.get("origin"), Some(&json!("North Campus")));
        assert_eq!(f.get("destination"), Some(&json!("Airport")));
        assert_eq!(f.get("departure_time"), Some(&json!("2026-09-01T06:30:00Z")));
        assert!(!f.contains_key("from"));
        assert!(!f.contains_key("to_location"));
        assert!(!f.contains_key("departureTime"));
    }

    #[test]
    fn normalize_list_touches_every_entry() {
        let mut list = vec![
            Resource::with_fields(1, fields(&[("price", json!(100))])),
            Resource::with_fields(2, fields(&[("monthly_rent", json!(200))])),
        ];
        normalize_list(ResourceKind::Room, &mut list);
        assert_eq!(list[0].field("rent"), Some(&json!(100)));
        assert_eq!(list[1].field("rent"), Some(&json!(200)));
    }
}
