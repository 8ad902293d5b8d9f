//! Item endpoint: read, conditional patch, conditional delete.

use crate::store::{EntityStore, Item, ETAG_FIELD};
use crate::types::method::HttpMethod;
use crate::types::request::{parse_form, MockRequest};
use crate::types::response::MockResponse;
use serde_json::{json, Map, Value};

/// Answer an item-level request (GET, PATCH or DELETE).
///
/// Walks the conditional-update protocol: an absent item answers 404 (GET)
/// or 405 (anything else); PATCH and DELETE demand an `If-Match` header
/// carrying the item's current etag — 403 when the header is missing, 412 on
/// a tag mismatch. The same checks apply to both write methods.
pub fn respond(
    store: &mut EntityStore,
    resource: &str,
    item_id: &str,
    request: &MockRequest,
) -> MockResponse {
    let Some(stored) = store.get(resource, item_id).cloned() else {
        let status = if request.method == HttpMethod::Get {
            404
        } else {
            405
        };
        return MockResponse::empty(status);
    };

    if matches!(request.method, HttpMethod::Patch | HttpMethod::Delete) {
        let current = stored
            .get(ETAG_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default();
        match request.header("If-Match") {
            None => return MockResponse::empty(403),
            Some(supplied) if supplied != current => return MockResponse::empty(412),
            Some(_) => {}
        }
    }

    match request.method {
        HttpMethod::Get => MockResponse::json(200, Value::Object(stored)),
        HttpMethod::Delete => {
            store.delete_item(resource, item_id);
            MockResponse::empty(200)
        }
        HttpMethod::Patch => patch(store, resource, item_id, request),
        _ => MockResponse::empty(405),
    }
}

/// Merge each form-encoded patch document, reporting a per-key result.
///
/// Every merged document earns the item a fresh etag; the `If-Match` check
/// already happened against the tag current at request entry.
fn patch(
    store: &mut EntityStore,
    resource: &str,
    item_id: &str,
    request: &MockRequest,
) -> MockResponse {
    let body = request.body.as_deref().unwrap_or("");
    let mut out = Map::new();
    for (key, raw) in parse_form(body) {
        let result = match serde_json::from_str::<Item>(&raw) {
            Ok(doc) => match store.update(resource, item_id, doc) {
                Some(tag) => json!({ "status": "OK", "etag": tag }),
                None => json!({ "status": "ERR", "issues": ["item not found"] }),
            },
            Err(_) => json!({ "status": "ERR", "issues": ["malformed document"] }),
        };
        out.insert(key, result);
    }
    MockResponse::json(200, Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    const URL: &str = "http://localhost/api/mymodel/mypk1";

    fn store_with_item() -> (EntityStore, String) {
        let mut store = EntityStore::new("testpk", HashMap::new());
        let tag = store
            .insert(
                "mymodel",
                json!({ "testpk": "mypk1", "content": "test content" })
                    .as_object()
                    .cloned()
                    .expect("object literal"),
            )
            .expect("Should insert");
        (store, tag)
    }

    fn patch_body(key: &str, doc: &Value) -> String {
        format!("{key}={}", urlencoding::encode(&doc.to_string()))
    }

    #[rstest]
    #[case(HttpMethod::Get, 404)]
    #[case(HttpMethod::Patch, 405)]
    #[case(HttpMethod::Delete, 405)]
    fn test_absent_item_statuses(#[case] method: HttpMethod, #[case] expected: u16) {
        let mut store = EntityStore::new("testpk", HashMap::new());
        let request = MockRequest::new(method, URL);
        let response = respond(&mut store, "mymodel", "mypk1", &request);
        assert_eq!(response.status, expected);
        assert_eq!(response.body_text(), "{}");
    }

    #[rstest]
    fn test_get_returns_item_without_touching_etag() {
        let (mut store, tag) = store_with_item();
        let response = respond(&mut store, "mymodel", "mypk1", &MockRequest::get(URL));

        assert_eq!(response.status, 200);
        assert_eq!(response.body["testpk"], "mypk1");
        assert_eq!(response.body["content"], "test content");
        assert_eq!(response.body["etag"], tag.as_str());

        let again = respond(&mut store, "mymodel", "mypk1", &MockRequest::get(URL));
        assert_eq!(again.body["etag"], tag.as_str());
    }

    #[rstest]
    fn test_patch_and_delete_without_if_match_are_forbidden() {
        let (mut store, _tag) = store_with_item();

        let patch = MockRequest::patch(URL, patch_body("data", &json!({ "content": "new" })));
        assert_eq!(respond(&mut store, "mymodel", "mypk1", &patch).status, 403);

        let delete = MockRequest::delete(URL);
        assert_eq!(respond(&mut store, "mymodel", "mypk1", &delete).status, 403);

        // nothing changed
        assert_eq!(store.len("mymodel"), 1);
        assert_eq!(
            store.get("mymodel", "mypk1").expect("Stored")["content"],
            "test content"
        );
    }

    #[rstest]
    fn test_patch_and_delete_with_wrong_etag_fail_precondition() {
        let (mut store, _tag) = store_with_item();

        let patch = MockRequest::patch(URL, patch_body("data", &json!({ "content": "new" })))
            .with_header("If-Match", "falsyetag");
        assert_eq!(respond(&mut store, "mymodel", "mypk1", &patch).status, 412);

        let delete = MockRequest::delete(URL).with_header("If-Match", "falsyetag");
        assert_eq!(respond(&mut store, "mymodel", "mypk1", &delete).status, 412);

        assert_eq!(store.len("mymodel"), 1);
    }

    #[rstest]
    fn test_patch_with_matching_etag_merges_and_retags() {
        let (mut store, tag) = store_with_item();
        let request = MockRequest::patch(URL, patch_body("data", &json!({ "content": "new content" })))
            .with_header("If-Match", tag.clone());

        let response = respond(&mut store, "mymodel", "mypk1", &request);
        assert_eq!(response.status, 200);
        assert_eq!(response.body["data"]["status"], "OK");
        let new_tag = response.body["data"]["etag"].as_str().expect("etag string");
        assert_ne!(new_tag, tag);

        let item = store.get("mymodel", "mypk1").expect("Stored");
        assert_eq!(item["content"], "new content");
        assert_eq!(item["testpk"], "mypk1");
        assert_eq!(item["etag"], new_tag);
    }

    #[rstest]
    fn test_patch_accepts_lowercase_if_match_header() {
        let (mut store, tag) = store_with_item();
        let request = MockRequest::patch(URL, patch_body("data", &json!({ "content": "new" })))
            .with_header("if-match", tag);
        assert_eq!(respond(&mut store, "mymodel", "mypk1", &request).status, 200);
    }

    #[rstest]
    fn test_patch_with_malformed_document_reports_per_key_error() {
        let (mut store, tag) = store_with_item();
        let request =
            MockRequest::patch(URL, "data=not-json".to_string()).with_header("If-Match", tag.clone());

        let response = respond(&mut store, "mymodel", "mypk1", &request);
        assert_eq!(response.status, 200);
        assert_eq!(
            response.body["data"],
            json!({ "status": "ERR", "issues": ["malformed document"] })
        );
        // item untouched, etag intact
        assert_eq!(
            store.get("mymodel", "mypk1").expect("Stored")["etag"],
            tag.as_str()
        );
    }

    #[rstest]
    fn test_delete_with_matching_etag_removes_item() {
        let (mut store, tag) = store_with_item();
        let request = MockRequest::delete(URL).with_header("If-Match", tag);

        let response = respond(&mut store, "mymodel", "mypk1", &request);
        assert_eq!(response.status, 200);
        assert_eq!(response.body_text(), "{}");
        assert_eq!(store.len("mymodel"), 0);
    }
}
