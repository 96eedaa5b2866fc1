//! `campusmarket-core` -- domain layer for the campusmarket data-access
//! client.
//!
//! Holds everything that works on in-memory state only: the open-schema
//! [`resource::Resource`] record, per-kind field normalization, and the
//! optimistic list reconciler used by screens to hide mutation latency.
//! Nothing in this crate performs I/O; the HTTP side lives in
//! `campusmarket-client`.

pub mod error;
pub mod normalize;
pub mod optimistic;
pub mod resource;

pub use error::CoreError;
pub use resource::{Resource, ResourceId, ResourceKind};
