//! The built HTTP request and its HTTP/1.1 wire form.

use std::str::FromStr;

use bytes::Bytes;

use crate::error::NetworkError;

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP HEAD method.
    Head,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP DELETE method.
    Delete,
    /// HTTP PATCH method.
    Patch,
}

impl HttpMethod {
    /// The method token as it appears on the request line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = NetworkError;

    /// Parse a method token. Method names are case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "" => Err(NetworkError::InvalidMethod("method is empty".to_string())),
            other => Err(NetworkError::InvalidMethod(format!(
                "unsupported method '{other}'"
            ))),
        }
    }
}

/// A built HTTP request ready to be written to a transport.
///
/// Produced by [`HttpRequestBuilder::build`](super::HttpRequestBuilder::build).
/// The header list already contains every computed header, so
/// [`to_bytes`](Self::to_bytes) is a plain concatenation.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub(crate) method: HttpMethod,
    pub(crate) target: String,
    pub(crate) request_uri: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) keep_alive: bool,
}

impl HttpRequest {
    /// The request method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The configured URL with the query parameters appended.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The request-target sent on the request line (`path[?query]`).
    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    /// All headers in the order they are serialized.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Every value of a header, matched case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The body bytes, already compressed if gzip was requested.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether the connection should be kept open after this request.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// The request line and headers, terminated by the blank line.
    pub fn head(&self) -> String {
        let mut head = format!("{} {} HTTP/1.1\r\n", self.method, self.request_uri);
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        head
    }

    /// [`head`](Self::head) as bytes, for vectored writes next to [`body`](Self::body).
    pub fn head_bytes(&self) -> Bytes {
        Bytes::from(self.head())
    }

    /// The complete message: head followed by body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let head = self.head();
        let mut message = Vec::with_capacity(head.len() + self.body.len());
        message.extend_from_slice(head.as_bytes());
        message.extend_from_slice(&self.body);
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip() {
        for method in [
            HttpMethod::Get,
            HttpMethod::Head,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Delete,
            HttpMethod::Patch,
        ] {
            assert_eq!(method.as_str().parse::<HttpMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_method_is_case_sensitive() {
        assert!(matches!(
            "get".parse::<HttpMethod>(),
            Err(NetworkError::InvalidMethod(_))
        ));
        assert!("OPTIONS".parse::<HttpMethod>().is_err());
        assert!("".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn test_serialization() {
        let request = HttpRequest {
            method: HttpMethod::Post,
            target: "http://example.com/items?a=1".to_string(),
            request_uri: "/items?a=1".to_string(),
            headers: vec![
                ("Host".to_string(), "example.com".to_string()),
                ("Content-Length".to_string(), "2".to_string()),
            ],
            body: Bytes::from_static(b"hi"),
            keep_alive: true,
        };

        assert_eq!(
            request.head(),
            "POST /items?a=1 HTTP/1.1\r\nHost: example.com\r\nContent-Length: 2\r\n\r\n"
        );
        assert!(request.to_bytes().ends_with(b"\r\n\r\nhi"));
        assert_eq!(request.header("content-length"), Some("2"));
    }
}
