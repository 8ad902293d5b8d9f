//! Collection endpoint: list, create, clear.

use crate::query::{apply_sort, evaluate, parse_sort};
use crate::store::{EntityStore, InsertError, Item};
use crate::types::method::HttpMethod;
use crate::types::request::{parse_form, MockRequest};
use crate::types::response::MockResponse;
use serde_json::{json, Map, Value};

/// Answer a collection-level request (GET, POST or DELETE).
pub fn respond(store: &mut EntityStore, resource: &str, request: &MockRequest) -> MockResponse {
    match request.method {
        HttpMethod::Get => list(store, resource, request),
        HttpMethod::Post => create(store, resource, request),
        HttpMethod::Delete => {
            store.delete_resource(resource);
            MockResponse::empty(200)
        }
        // the router admits only the three methods above
        _ => MockResponse::empty(405),
    }
}

/// List the resource, refined by the optional `where`/`sort` querystrings.
fn list(store: &EntityStore, resource: &str, request: &MockRequest) -> MockResponse {
    let mut items = store.list(resource);
    let params = request.query_params();

    if let Some(raw) = params.get("where") {
        items = apply_where(items, raw);
    }
    if let Some(raw) = params.get("sort") {
        apply_sort_refinement(&mut items, raw);
    }

    MockResponse::json(200, json!({ "_items": items }))
}

/// Filter through the `where` document, keeping the unfiltered list when the
/// document does not parse or evaluate.
fn apply_where(items: Vec<Item>, raw: &str) -> Vec<Item> {
    let doc: Value = match serde_json::from_str(raw) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!(%err, "ignoring malformed 'where' document");
            return items;
        }
    };
    match evaluate(&items, &doc) {
        Ok(filtered) => filtered,
        Err(err) => {
            tracing::debug!(%err, "ignoring unevaluable 'where' document");
            items
        }
    }
}

/// Sort by the `sort` document, skipping the pass when it does not parse.
fn apply_sort_refinement(items: &mut [Item], raw: &str) {
    let doc: Value = match serde_json::from_str(raw) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!(%err, "ignoring malformed 'sort' document");
            return;
        }
    };
    match parse_sort(&doc) {
        Ok(keys) => apply_sort(items, &keys),
        Err(err) => tracing::debug!(%err, "ignoring unevaluable 'sort' document"),
    }
}

/// Store each form-encoded sub-item, reporting a per-key result.
///
/// The response is always 200; conflicts and malformed sub-items surface as
/// `"status": "ERR"` entries the caller must inspect.
fn create(store: &mut EntityStore, resource: &str, request: &MockRequest) -> MockResponse {
    let body = request.body.as_deref().unwrap_or("");
    let mut out = Map::new();
    for (key, raw) in parse_form(body) {
        out.insert(key, sub_item_result(store, resource, &raw));
    }
    MockResponse::json(200, Value::Object(out))
}

fn sub_item_result(store: &mut EntityStore, resource: &str, raw: &str) -> Value {
    let item: Item = match serde_json::from_str(raw) {
        Ok(item) => item,
        Err(_) => return error_result("malformed document"),
    };
    match store.insert(resource, item) {
        Ok(tag) => json!({ "status": "OK", "etag": tag }),
        Err(InsertError::DuplicateKey { .. }) => error_result("pk not unique"),
        Err(InsertError::MissingPrimaryKey { .. }) => error_result("pk missing"),
    }
}

fn error_result(issue: &str) -> Value {
    json!({ "status": "ERR", "issues": [issue] })
}
