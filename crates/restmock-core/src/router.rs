//! URL-shape and method routing for intercepted requests.

use crate::types::method::HttpMethod;
use std::collections::HashSet;

/// Where a request landed: a collection or a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    Collection {
        resource: String,
    },
    Item {
        resource: String,
        item_id: String,
    },
}

/// Matches the two URL shapes served under a base URL.
///
/// Path parsing drops empty segments and any segment equal to one of the
/// base URL's own path segments (the API namespace) before extracting the
/// resource name and item id. The base prefix is therefore discarded rather
/// than matched structurally; anchoring on the base URL happens at dispatch.
#[derive(Debug, Clone)]
pub struct Router {
    namespace: HashSet<String>,
}

impl Router {
    /// Build a router for a base URL such as `http://localhost/api/`.
    pub fn new(base_url: &str) -> Self {
        Self {
            namespace: base_path_segments(base_url),
        }
    }

    /// Match a request path and method to a route target.
    ///
    /// Collections serve GET, POST and DELETE; items serve GET, PATCH and
    /// DELETE. Anything else is not intercepted (`None`) and stays the
    /// surrounding client's problem.
    pub fn route(&self, method: HttpMethod, path: &str) -> Option<RouteTarget> {
        let segments: Vec<&str> = path
            .split('/')
            .filter(|segment| !segment.is_empty() && !self.namespace.contains(*segment))
            .collect();

        match segments.as_slice() {
            [resource] => match method {
                HttpMethod::Get | HttpMethod::Post | HttpMethod::Delete => {
                    Some(RouteTarget::Collection {
                        resource: (*resource).to_string(),
                    })
                }
                _ => None,
            },
            [resource, item_id] => match method {
                HttpMethod::Get | HttpMethod::Patch | HttpMethod::Delete => {
                    Some(RouteTarget::Item {
                        resource: (*resource).to_string(),
                        item_id: (*item_id).to_string(),
                    })
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// Path segments of a base URL, e.g. `{"api"}` for `http://host/api/`.
fn base_path_segments(base_url: &str) -> HashSet<String> {
    let without_scheme = match base_url.find("://") {
        Some(idx) => &base_url[idx + 3..],
        None => base_url,
    };
    let path = match without_scheme.find('/') {
        Some(idx) => &without_scheme[idx..],
        None => "",
    };
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
