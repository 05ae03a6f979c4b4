use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

/// An intercepted page request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url }
    }

    /// Create a GET request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Identity of this request as seen from a worker serving `origin`.
    pub fn key(&self, origin: &Url) -> RequestKey {
        RequestKey::new(&self.url, origin)
    }
}

/// Cache identity of a request.
///
/// Same-origin requests are keyed by path and query (`/gallery.jpg`), so the
/// manifest's paths and page fetches agree. Anything else is keyed by the full
/// URL. Fragments never take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn new(url: &Url, origin: &Url) -> Self {
        if url.origin() == origin.origin() {
            let mut key = url.path().to_string();
            if let Some(query) = url.query() {
                key.push('?');
                key.push_str(query);
            }
            Self(key)
        } else {
            let mut url = url.clone();
            url.set_fragment(None);
            Self(url.into())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for RequestKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
