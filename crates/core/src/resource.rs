//! Open-schema resource records and the resource-kind table.
//!
//! The data-access layer treats every domain record (room, ride, lost item,
//! ticket) as an opaque [`Resource`]: a stable integer `id` plus an open,
//! string-keyed field map. Domain fields are never interpreted here beyond
//! the per-kind required-field checks used for fail-fast create validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Stable record identifier.
///
/// Server-assigned ids are positive. Negative ids are provisional sentinels
/// minted by [`crate::optimistic::ListReconciler`] for not-yet-confirmed
/// creates.
pub type ResourceId = i64;

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

/// The resource types exposed by the marketplace backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Room,
    Ride,
    LostFoundItem,
    Ticket,
}

impl ResourceKind {
    /// Every kind, for iteration (cache sweeps, mock stores).
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Room,
        ResourceKind::Ride,
        ResourceKind::LostFoundItem,
        ResourceKind::Ticket,
    ];

    /// URL path segment for this kind's endpoints (`GET /{path}` etc.).
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Room => "rooms",
            ResourceKind::Ride => "rides",
            ResourceKind::LostFoundItem => "lost-found",
            ResourceKind::Ticket => "tickets",
        }
    }

    /// Canonical name used in cache signatures and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Room => "room",
            ResourceKind::Ride => "ride",
            ResourceKind::LostFoundItem => "lost_found_item",
            ResourceKind::Ticket => "ticket",
        }
    }

    /// Fields that must be present and non-blank before a create request
    /// is sent. Checked client-side so a bad form never costs a round-trip.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Room => &["title", "rent", "location"],
            ResourceKind::Ride => &["origin", "destination", "departure_time"],
            ResourceKind::LostFoundItem => &["title", "location"],
            ResourceKind::Ticket => &["event_name", "price"],
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// One domain record: a stable `id` plus an open field map.
///
/// All non-`id` attributes round-trip through the flattened `fields` map,
/// so the layer carries whatever the backend sends without a per-kind
/// struct. Field values are plain JSON (string, number, bool, object,
/// array, or null).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Resource {
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    pub fn with_fields(id: ResourceId, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    /// Look up a field by name. Returns `None` for absent fields; a stored
    /// JSON `null` is returned as `Some(&Value::Null)`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Convenience accessor for string-typed fields.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// `true` while this entry carries a reconciler-minted sentinel id and
    /// has not yet been confirmed by the server.
    pub fn is_provisional(&self) -> bool {
        self.id < 0
    }
}

// ---------------------------------------------------------------------------
// Create validation
// ---------------------------------------------------------------------------

/// Check that every required field for `kind` is present and non-blank.
///
/// A field counts as missing when it is absent, JSON `null`, or a string
/// that is empty after trimming. The first offender is reported.
pub fn validate_create_fields(kind: ResourceKind, fields: &Map<String, Value>) -> Result<(), CoreError> {
    for name in kind.required_fields() {
        let missing = match fields.get(*name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            return Err(CoreError::Validation(format!(
                "Missing required field '{name}' for {kind}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
