use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

const ALLOW_ORIGIN_HEADER: &str = "access-control-allow-origin";

/// Origin classification of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Served from the worker's own origin.
    #[default]
    Basic,
    /// Cross-origin, shared through CORS.
    Cors,
    /// Cross-origin without CORS headers.
    Opaque,
}

impl ResponseType {
    /// Classify a response by where it finally came from.
    ///
    /// `response_url` is the URL after redirects, so a same-origin request that
    /// was redirected off-origin is not `Basic`.
    pub fn classify(response_url: &Url, origin: &Url, headers: &[(String, String)]) -> Self {
        if response_url.origin() == origin.origin() {
            ResponseType::Basic
        } else if headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(ALLOW_ORIGIN_HEADER))
        {
            ResponseType::Cors
        } else {
            ResponseType::Opaque
        }
    }
}

/// A response as delivered to the page.
///
/// The body is a `Bytes` handle, so `clone()` yields an independent copy the
/// worker can persist while the live response goes back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub url: Url,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub response_type: ResponseType,
}

impl Response {
    /// Check if the status is 2xx.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://sugarnail.test/").unwrap()
    }

    #[test]
    fn test_same_origin_is_basic() {
        let url = Url::parse("https://sugarnail.test/assets/logo.jpg").unwrap();
        assert_eq!(ResponseType::classify(&url, &origin(), &[]), ResponseType::Basic);
    }

    #[test]
    fn test_cross_origin_with_allow_origin_is_cors() {
        let url = Url::parse("https://cdn.example.com/lib.js").unwrap();
        let headers = vec![("Access-Control-Allow-Origin".to_string(), "*".to_string())];
        assert_eq!(ResponseType::classify(&url, &origin(), &headers), ResponseType::Cors);
    }

    #[test]
    fn test_cross_origin_without_cors_is_opaque() {
        let url = Url::parse("http://sugarnail.test/app.js").unwrap();
        assert_eq!(ResponseType::classify(&url, &origin(), &[]), ResponseType::Opaque);
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let response = Response {
            url: origin(),
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("Content-Type".to_string(), "text/html".to_string())],
            body: Bytes::from_static(b"<html>"),
            response_type: ResponseType::Basic,
        };
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert!(response.ok());
    }
}
