//! In-memory entity store: resources, items and primary keys.

use crate::error::MockError;
use crate::etag::new_tag;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Field injected into every stored item to carry its entity tag.
pub const ETAG_FIELD: &str = "etag";

/// A single record within a resource.
pub type Item = serde_json::Map<String, Value>;

/// Logical failures of [`EntityStore::insert`].
///
/// Neither is a hard error: the collection POST handler folds them into
/// per-key `"status": "ERR"` results inside an overall 200 response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InsertError {
    /// The primary key value is already taken within the resource.
    #[error("primary key '{key}' already exists in resource '{resource}'")]
    DuplicateKey { resource: String, key: String },
    /// The item carries no value for the resource's primary key field.
    #[error("item for resource '{resource}' is missing primary key field '{pk}'")]
    MissingPrimaryKey { resource: String, pk: String },
}

/// Keyed in-memory storage of resources and their items.
///
/// The single source of truth for everything the mock serves. Resources are
/// plain maps from primary-key value to item; they are materialized on first
/// write and never as a side effect of a read. All operations are
/// synchronous and assume serialized access.
#[derive(Debug, Clone)]
pub struct EntityStore {
    items: HashMap<String, HashMap<String, Item>>,
    pk_maps: HashMap<String, String>,
    default_pk: String,
}

impl EntityStore {
    /// Create an empty store with the given default primary key field.
    pub fn new(default_pk: impl Into<String>, pk_maps: HashMap<String, String>) -> Self {
        Self {
            items: HashMap::new(),
            pk_maps,
            default_pk: default_pk.into(),
        }
    }

    /// Replace the default primary key field.
    pub fn set_default_pk(&mut self, field: impl Into<String>) {
        self.default_pk = field.into();
    }

    /// Designate `field` as the primary key for one resource.
    pub fn map_pk(&mut self, resource: impl Into<String>, field: impl Into<String>) {
        self.pk_maps.insert(resource.into(), field.into());
    }

    /// Primary key field for a resource: configured mapping, else the default.
    pub fn primary_key(&self, resource: &str) -> &str {
        self.pk_maps
            .get(resource)
            .map(String::as_str)
            .unwrap_or(&self.default_pk)
    }

    /// All items currently stored for a resource, in no guaranteed order.
    pub fn list(&self, resource: &str) -> Vec<Item> {
        self.items
            .get(resource)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Look up one item by its primary key value.
    pub fn get(&self, resource: &str, key: &str) -> Option<&Item> {
        self.items.get(resource)?.get(key)
    }

    /// Number of items stored for a resource.
    pub fn len(&self, resource: &str) -> usize {
        self.items.get(resource).map(HashMap::len).unwrap_or(0)
    }

    /// Bulk-load items, bypassing the POST protocol.
    ///
    /// The whole batch is validated first; an item without the resource's
    /// primary key field is a test-setup bug and nothing is stored. Items
    /// keep a caller-provided non-empty etag so tests can stage known tags,
    /// otherwise a fresh one is injected.
    pub fn seed(&mut self, resource: &str, items: Vec<Item>) -> Result<(), MockError> {
        let pk = self.primary_key(resource).to_string();

        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            let key = item
                .get(&pk)
                .map(pk_key)
                .ok_or_else(|| MockError::MissingPrimaryKey {
                    resource: resource.to_string(),
                    pk: pk.clone(),
                })?;
            keyed.push((key, item));
        }

        let entries = self.items.entry(resource.to_string()).or_default();
        for (key, mut item) in keyed {
            let has_tag = item
                .get(ETAG_FIELD)
                .and_then(Value::as_str)
                .is_some_and(|tag| !tag.is_empty());
            if !has_tag {
                item.insert(ETAG_FIELD.to_string(), Value::String(new_tag()));
            }
            entries.insert(key, item);
        }
        Ok(())
    }

    /// Store a new item, injecting a fresh etag.
    ///
    /// Returns the assigned etag, or the logical failure when the primary
    /// key value is missing or already taken. A rejected insert leaves the
    /// resource untouched.
    pub fn insert(&mut self, resource: &str, mut item: Item) -> Result<String, InsertError> {
        let pk = self.primary_key(resource).to_string();
        let key = item
            .get(&pk)
            .map(pk_key)
            .ok_or_else(|| InsertError::MissingPrimaryKey {
                resource: resource.to_string(),
                pk: pk.clone(),
            })?;

        let entries = self.items.entry(resource.to_string()).or_default();
        if entries.contains_key(&key) {
            return Err(InsertError::DuplicateKey {
                resource: resource.to_string(),
                key,
            });
        }

        let tag = new_tag();
        item.insert(ETAG_FIELD.to_string(), Value::String(tag.clone()));
        entries.insert(key, item);
        Ok(tag)
    }

    /// Merge a patch into an existing item and assign a new etag.
    ///
    /// Shallow field overwrite; the resource's primary key field and the
    /// etag field are not patchable. Returns the new etag, or `None` when no
    /// item is stored under `key` (callers check existence first).
    pub fn update(&mut self, resource: &str, key: &str, patch: Item) -> Option<String> {
        let pk = self.primary_key(resource).to_string();
        let item = self.items.get_mut(resource)?.get_mut(key)?;

        for (field, value) in patch {
            if field == pk || field == ETAG_FIELD {
                continue;
            }
            item.insert(field, value);
        }
        let tag = new_tag();
        item.insert(ETAG_FIELD.to_string(), Value::String(tag.clone()));
        Some(tag)
    }

    /// Remove one item. Returns whether it was present.
    pub fn delete_item(&mut self, resource: &str, key: &str) -> bool {
        self.items
            .get_mut(resource)
            .is_some_and(|entries| entries.remove(key).is_some())
    }

    /// Drop a resource and all of its items.
    pub fn delete_resource(&mut self, resource: &str) {
        self.items.remove(resource);
    }
}

/// Canonical storage key for a primary key value.
///
/// JSON strings key by their contents so item URL segments line up with
/// stored keys; any other value keys by its compact serialization.
pub fn pk_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn store() -> EntityStore {
        EntityStore::new("testpk", HashMap::new())
    }

    fn obj(value: Value) -> Item {
        value.as_object().cloned().expect("object literal")
    }

    #[rstest]
    fn test_primary_key_uses_mapping_then_default() {
        let mut store = store();
        store.map_pk("articles", "slug");
        assert_eq!(store.primary_key("articles"), "slug");
        assert_eq!(store.primary_key("anything-else"), "testpk");
    }

    #[rstest]
    fn test_insert_injects_fresh_etag_and_lists_item() {
        let mut store = store();
        let tag = store
            .insert("mymodel", obj(json!({ "testpk": "mypk1", "content": "test content" })))
            .expect("Should insert");
        assert!(!tag.is_empty());

        let items = store.list("mymodel");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["testpk"], "mypk1");
        assert_eq!(items[0]["content"], "test content");
        assert_eq!(items[0][ETAG_FIELD], Value::String(tag));
    }

    #[rstest]
    fn test_insert_duplicate_key_is_rejected_and_store_unchanged() {
        let mut store = store();
        store
            .insert("mymodel", obj(json!({ "testpk": "mypk1", "content": "first" })))
            .expect("Should insert");

        let result = store.insert("mymodel", obj(json!({ "testpk": "mypk1", "content": "second" })));
        assert!(matches!(result, Err(InsertError::DuplicateKey { .. })));
        assert_eq!(store.len("mymodel"), 1);
        assert_eq!(store.list("mymodel")[0]["content"], "first");
    }

    #[rstest]
    fn test_insert_missing_pk_is_rejected() {
        let mut store = store();
        let result = store.insert("mymodel", obj(json!({ "content": "no key" })));
        assert_eq!(
            result,
            Err(InsertError::MissingPrimaryKey {
                resource: "mymodel".to_string(),
                pk: "testpk".to_string(),
            })
        );
        assert_eq!(store.len("mymodel"), 0);
    }

    #[rstest]
    fn test_update_changes_etag_and_preserves_pk() {
        let mut store = store();
        let old_tag = store
            .insert("mymodel", obj(json!({ "testpk": "mypk1", "content": "old" })))
            .expect("Should insert");

        let updated_tag = store
            .update(
                "mymodel",
                "mypk1",
                obj(json!({ "content": "new", "testpk": "hijacked", "etag": "forged" })),
            )
            .expect("Item exists");

        assert_ne!(updated_tag, old_tag);
        let item = store.get("mymodel", "mypk1").expect("Still stored");
        assert_eq!(item["content"], "new");
        assert_eq!(item["testpk"], "mypk1");
        assert_eq!(item[ETAG_FIELD], Value::String(updated_tag));
    }

    #[rstest]
    fn test_update_absent_item_returns_none() {
        let mut store = store();
        assert_eq!(store.update("mymodel", "nope", Item::new()), None);
    }

    #[rstest]
    fn test_list_and_get_do_not_alter_etags() {
        let mut store = store();
        let tag = store
            .insert("mymodel", obj(json!({ "testpk": "mypk1" })))
            .expect("Should insert");

        let _ = store.list("mymodel");
        let _ = store.get("mymodel", "mypk1");
        assert_eq!(
            store.get("mymodel", "mypk1").expect("Stored")[ETAG_FIELD],
            Value::String(tag)
        );
    }

    #[rstest]
    fn test_seed_rejects_batch_with_missing_pk_atomically() {
        let mut store = store();
        let result = store.seed(
            "mymodel",
            vec![
                obj(json!({ "testpk": "a" })),
                obj(json!({ "content": "no key" })),
            ],
        );
        assert_eq!(
            result,
            Err(MockError::MissingPrimaryKey {
                resource: "mymodel".to_string(),
                pk: "testpk".to_string(),
            })
        );
        assert_eq!(store.len("mymodel"), 0);
    }

    #[rstest]
    fn test_seed_keeps_provided_etag_and_tags_the_rest() {
        let mut store = store();
        store
            .seed(
                "mymodel",
                vec![
                    obj(json!({ "testpk": "a", "etag": "known-tag" })),
                    obj(json!({ "testpk": "b" })),
                ],
            )
            .expect("Should seed");

        assert_eq!(
            store.get("mymodel", "a").expect("Seeded")[ETAG_FIELD],
            Value::String("known-tag".to_string())
        );
        let tagged = store.get("mymodel", "b").expect("Seeded");
        assert!(tagged[ETAG_FIELD].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[rstest]
    fn test_delete_item_and_resource() {
        let mut store = store();
        store
            .seed(
                "mymodel",
                vec![obj(json!({ "testpk": "a" })), obj(json!({ "testpk": "b" }))],
            )
            .expect("Should seed");

        assert!(store.delete_item("mymodel", "a"));
        assert!(!store.delete_item("mymodel", "a"));
        assert_eq!(store.len("mymodel"), 1);

        store.delete_resource("mymodel");
        assert_eq!(store.len("mymodel"), 0);
        assert!(store.list("mymodel").is_empty());
    }

    #[rstest]
    fn test_reads_on_unknown_resource_are_empty() {
        let store = store();
        assert!(store.list("never-seen").is_empty());
        assert_eq!(store.get("never-seen", "x"), None);
        assert_eq!(store.len("never-seen"), 0);
    }

    #[rstest]
    #[case(json!("mypk1"), "mypk1")]
    #[case(json!(42), "42")]
    #[case(json!(true), "true")]
    fn test_pk_key_canonical_forms(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(pk_key(&value), expected);
    }
}
