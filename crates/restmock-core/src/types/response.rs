//! Synthesized HTTP response.

use serde_json::{json, Value};
use std::collections::HashMap;

/// A (status, headers, body) triple delivered to the intercepted client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// JSON response body
    pub body: Value,
}

impl MockResponse {
    /// Build a JSON response; stamps the JSON content type header.
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            body,
        }
    }

    /// Build a response with the literal `{}` body.
    pub fn empty(status: u16) -> Self {
        Self::json(status, json!({}))
    }

    /// Serialized body, as put on the wire.
    pub fn body_text(&self) -> String {
        self.body.to_string()
    }
}
