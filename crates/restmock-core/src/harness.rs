//! Process-wide interception registry and the dispatch entry point.
//!
//! Activating a mock registers its base URL here; dropping the returned
//! [`MockGuard`] deregisters it again. Client adapters feed every outbound
//! request through [`dispatch`]; a `None` answer means no active mock claims
//! the request and the client's own error handling applies.

use crate::handlers::{collection, item};
use crate::router::{RouteTarget, Router};
use crate::store::EntityStore;
use crate::types::request::MockRequest;
use crate::types::response::MockResponse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);
static REGISTRY: Mutex<Vec<Registration>> = Mutex::new(Vec::new());

#[derive(Debug)]
struct Registration {
    id: u64,
    base_url: String,
    router: Router,
    store: Arc<Mutex<EntityStore>>,
}

/// Scoped registration handle for an active mock.
///
/// Deregistration happens on drop, so interception ends even on error exit
/// paths.
#[derive(Debug)]
pub struct MockGuard {
    id: u64,
}

impl Drop for MockGuard {
    fn drop(&mut self) {
        lock_registry().retain(|registration| registration.id != self.id);
        tracing::debug!(id = self.id, "mock deregistered");
    }
}

pub(crate) fn register(
    base_url: String,
    router: Router,
    store: Arc<Mutex<EntityStore>>,
) -> MockGuard {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(id, %base_url, "mock registered");
    lock_registry().push(Registration {
        id,
        base_url,
        router,
        store,
    });
    MockGuard { id }
}

/// Answer an intercepted request from the active mocks.
///
/// The first registered mock whose base URL prefixes the request URL and
/// whose router accepts the path shape and method produces the response,
/// synchronously on the calling thread. `None` means the request is not
/// intercepted.
pub fn dispatch(request: &MockRequest) -> Option<MockResponse> {
    let registry = lock_registry();
    for registration in registry.iter() {
        if !matches_base(&registration.base_url, &request.url) {
            continue;
        }
        let Some(target) = registration.router.route(request.method, request.path()) else {
            continue;
        };

        let mut store = registration
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let response = match target {
            RouteTarget::Collection { resource } => {
                collection::respond(&mut store, &resource, request)
            }
            RouteTarget::Item { resource, item_id } => {
                item::respond(&mut store, &resource, &item_id, request)
            }
        };
        return Some(response);
    }
    None
}

/// Whether `url` falls under `base` (segment-aligned prefix match).
fn matches_base(base: &str, url: &str) -> bool {
    let base = base.trim_end_matches('/');
    match url.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

fn lock_registry() -> MutexGuard<'static, Vec<Registration>> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}
