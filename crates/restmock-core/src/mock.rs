//! The mock's public facade: construction, seeding, activation.

use crate::error::MockError;
use crate::harness::{self, MockGuard};
use crate::router::Router;
use crate::store::{EntityStore, Item};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default primary key field for resources without an explicit mapping.
pub const DEFAULT_PK: &str = "_id";

/// An in-memory mock of one resource/item style REST API.
///
/// Owns the entity store and primary-key configuration for a single base
/// URL. Construction intercepts nothing; call [`ApiMock::activate`] and hold
/// the returned guard for as long as requests should be answered.
///
/// ```
/// use restmock_core::{dispatch, ApiMock, MockRequest};
///
/// let mock = ApiMock::new("http://example-host/api/");
/// let _guard = mock.activate();
///
/// let response = dispatch(&MockRequest::get("http://example-host/api/things"))
///     .expect("intercepted");
/// assert_eq!(response.status, 200);
/// ```
#[derive(Debug, Clone)]
pub struct ApiMock {
    base_url: String,
    router: Router,
    store: Arc<Mutex<EntityStore>>,
}

impl ApiMock {
    /// Create a mock anchored at `base_url`, with [`DEFAULT_PK`] as the
    /// default primary key field.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            router: Router::new(&base_url),
            store: Arc::new(Mutex::new(EntityStore::new(DEFAULT_PK, HashMap::new()))),
            base_url,
        }
    }

    /// Replace the default primary key field.
    pub fn with_default_pk(self, field: impl Into<String>) -> Self {
        self.lock_store().set_default_pk(field);
        self
    }

    /// Designate `field` as the primary key for one resource.
    pub fn with_pk(self, resource: impl Into<String>, field: impl Into<String>) -> Self {
        self.lock_store().map_pk(resource, field);
        self
    }

    /// Base URL this mock answers under.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bulk-load items for a resource, bypassing the POST protocol.
    ///
    /// Fails when any item lacks the resource's primary key field; nothing
    /// from the batch is stored in that case.
    pub fn seed(&self, resource: &str, items: Vec<Item>) -> Result<(), MockError> {
        self.lock_store().seed(resource, items)
    }

    /// Register this mock for interception.
    ///
    /// The mock answers matching requests for exactly as long as the guard
    /// lives; dropping it deregisters the mock on every exit path. Mocks
    /// with distinct base URLs may be active simultaneously.
    #[must_use = "interception ends when the guard is dropped"]
    pub fn activate(&self) -> MockGuard {
        harness::register(
            self.base_url.clone(),
            self.router.clone(),
            Arc::clone(&self.store),
        )
    }

    fn lock_store(&self) -> MutexGuard<'_, EntityStore> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
