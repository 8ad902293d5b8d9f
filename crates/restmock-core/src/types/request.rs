//! Intercepted HTTP request and its decoding helpers.

use crate::types::method::HttpMethod;
use std::collections::HashMap;

/// An HTTP request captured before it reaches a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute request URL (scheme, host, path, optional query string)
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Raw request body, if any
    pub body: Option<String>,
}

impl MockRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        let mut request = Self::new(HttpMethod::Post, url);
        request.body = Some(body.into());
        request
    }

    pub fn patch(url: impl Into<String>, body: impl Into<String>) -> Self {
        let mut request = Self::new(HttpMethod::Patch, url);
        request.body = Some(body.into());
        request
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Attach a header, builder style.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// URL path without scheme, authority or query string.
    pub fn path(&self) -> &str {
        let without_query = self.url.split('?').next().unwrap_or("");
        let after_scheme = match without_query.find("://") {
            Some(idx) => &without_query[idx + 3..],
            // already a bare path
            None => return without_query,
        };
        match after_scheme.find('/') {
            Some(idx) => &after_scheme[idx..],
            None => "/",
        }
    }

    /// Query string portion of the URL, if any.
    pub fn query_string(&self) -> Option<&str> {
        self.url.split_once('?').map(|(_, query)| query)
    }

    /// Parsed query parameters, percent-decoded.
    pub fn query_params(&self) -> HashMap<String, String> {
        self.query_string()
            .map(parse_query_string)
            .unwrap_or_default()
    }
}

/// Parse a query string into a map with form decoding.
///
/// Later occurrences of a key overwrite earlier ones; the collection GET
/// refinements (`where`, `sort`) each carry a single JSON document.
pub fn parse_query_string(query_str: &str) -> HashMap<String, String> {
    let mut result = HashMap::new();
    for pair in query_str.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = split_pair(pair);
        result.insert(key, value);
    }
    result
}

/// Parse a form-encoded body into key/value pairs, preserving pair order.
///
/// Write handlers report one result per pair key, so order carries through
/// to the response body. Each value is itself a JSON-encoded document; the
/// double encoding is part of the emulated wire protocol.
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(split_pair)
        .collect()
}

fn split_pair(pair: &str) -> (String, String) {
    let mut parts = pair.splitn(2, '=');
    let key = decode_component(parts.next().unwrap_or(""));
    let value = decode_component(parts.next().unwrap_or(""));
    (key, value)
}

/// Decode one `application/x-www-form-urlencoded` component: `+` is a space,
/// then percent escapes.
fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .unwrap_or_else(|_| raw.as_str().into())
        .to_string()
}
