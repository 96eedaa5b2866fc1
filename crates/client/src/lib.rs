//! `campusmarket-client` -- data-access layer for the campusmarket backend.
//!
//! Screens talk to the backend exclusively through [`client::ResourceClient`]:
//! a CRUD facade over a single HTTP [`transport::Transport`], with
//! short-lived response caching ([`cache::ResponseCache`]) for list and
//! detail reads and kind-wide cache eviction after every successful
//! mutation (read-after-write consistency for subsequent fetches).
//!
//! The optimistic-update pattern the screens apply around these calls
//! lives in `campusmarket_core::optimistic`; this crate is the part that
//! suspends on the network.

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod multipart;
pub mod transport;

pub use auth::{StaticToken, TokenSource};
pub use cache::{CachedPayload, ResponseCache};
pub use client::{FetchOptions, ResourceClient};
pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use multipart::{FileAttachment, UploadPayload};
pub use transport::{Method, RequestBody, RequestOptions, Transport};
