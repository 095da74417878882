//! Framework-neutral view of an incoming request.

use std::collections::HashMap;

use http::{HeaderMap, Method, Uri};

#[derive(Debug, Clone)]
pub struct ShieldRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    form: HashMap<String, String>,
}

impl ShieldRequest {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            form: HashMap::new(),
        }
    }

    /// Convenience constructor for tests and demos.
    pub fn get(uri: &str) -> Result<Self, http::uri::InvalidUri> {
        Ok(Self::new(Method::GET, uri.parse()?))
    }

    pub fn post(uri: &str) -> Result<Self, http::uri::InvalidUri> {
        Ok(Self::new(Method::POST, uri.parse()?))
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.form = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    pub fn with_form_body(self, body: &[u8]) -> Self {
        let fields: Vec<(String, String)> = url::form_urlencoded::parse(body)
            .into_owned()
            .collect();
        self.with_form(fields)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Path and query as received, e.g. `/auth/confirm?user_id=1&expires=...`.
    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    pub fn form(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }

    /// Form field first, then query parameter.
    pub fn input(&self, name: &str) -> Option<String> {
        self.form(name)
            .map(str::to_string)
            .or_else(|| self.query(name))
    }

    /// Checkbox-style truthiness of an input (`1`, `on`, `true`, `yes`).
    pub fn boolean(&self, name: &str) -> bool {
        self.input(name)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "on" | "true" | "yes"))
            .unwrap_or(false)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Methods that must not change state.
    pub fn is_read_only(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }
}
