//! In-memory HTTP mock engine for resource/item style REST APIs.
//!
//! The engine intercepts outbound HTTP requests matching a registered base
//! URL, keeps an in-memory store of resources and their items, and
//! synthesizes protocol-correct responses: collection listing with a small
//! `where`/`sort` query language, form-encoded create/patch with per-key
//! results, and optimistic concurrency via `If-Match` entity tags.
//!
//! - [`ApiMock`]: owns the store and configuration for one mocked API
//! - [`MockGuard`]: scoped registration handle; interception ends on drop
//! - [`dispatch`]: entry point client adapters feed intercepted requests into
//!
//! No real network I/O happens anywhere; every matched request is answered
//! inline on the calling thread.

pub mod error;
pub mod etag;
pub mod handlers;
pub mod harness;
pub mod mock;
pub mod query;
pub mod router;
pub mod store;
pub mod types;

pub use error::MockError;
pub use harness::{dispatch, MockGuard};
pub use mock::{ApiMock, DEFAULT_PK};
pub use store::{EntityStore, InsertError, Item, ETAG_FIELD};
pub use types::method::HttpMethod;
pub use types::request::MockRequest;
pub use types::response::MockResponse;
