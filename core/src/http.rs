//! HTTP exchange types passed across the `Transport` seam.
//!
//! # Design
//! Requests and responses are plain data. The resource client builds an
//! `HttpRequest`, hands it to a transport, and classifies the `HttpResponse`
//! that comes back. Nothing here performs I/O, so classification can be
//! tested with hand-built responses.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data. Requests issued by the resource
/// client never carry a body; POST parameters travel in the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// `status` is `None` when the exchange completed without an HTTP status
/// line; `body` is `None` when the transport obtained no body at all.
/// Headers whose values are not visible ASCII are left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: Option<u16>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(status),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// First header value with a case-insensitive `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_inclusive() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(299, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(300, "").is_success());
    }

    #[test]
    fn missing_status_is_not_success() {
        let response = HttpResponse {
            status: None,
            headers: Vec::new(),
            body: Some(b"{}".to_vec()),
        };
        assert!(!response.is_success());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = HttpRequest {
            method: HttpMethod::Post,
            url: "https://api.example.com/me".to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        };
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.header("accept"), None);
    }

    #[test]
    fn response_headers_are_kept_and_searchable() {
        let response = HttpResponse::new(200, "{}")
            .with_header("Content-Type", "application/json")
            .with_header("X-Request-Id", "abc")
            .with_header("x-request-id", "def");
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("X-REQUEST-ID"), Some("abc"));
        assert_eq!(response.header("etag"), None);
        assert_eq!(response.headers.len(), 3);
    }
}
