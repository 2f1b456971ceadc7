//! Fluent construction of [`HttpRequest`] values.

use std::path::Path;

use bytes::Bytes;
use serde::Serialize;

use super::auth::Authentication;
use super::compress::Compressor;
use super::multipart::{MultipartBody, UploadFile, media_type_for_path};
use super::request::{HttpMethod, HttpRequest};
use crate::error::{NetworkError, Result};

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Builder for HTTP requests.
///
/// Every setter takes the builder by value and returns it, so configuration
/// reads as one chain ending in [`build`](Self::build). `build` consumes the
/// builder; clone it first to produce several requests from one
/// configuration.
///
/// # Body selection
///
/// Uploads added with [`file`](Self::file) or [`file_data`](Self::file_data)
/// take precedence: when any exist the body is a `multipart/form-data` form
/// and [`data`](Self::data) is ignored.
///
/// # Target forms
///
/// An absolute `http`/`https` URL yields an origin-form request line and a
/// computed `Host` header. A URL starting with `/` is sent as-is and no
/// `Host` is computed; HTTP/1.1 requires one, so add it with
/// [`header`](Self::header). A fragment is never sent.
///
/// # Header precedence
///
/// User headers are serialized first, in call order. The builder then adds
/// `Host`, `Content-Type`, `Content-Encoding`, `Content-Length`, `Connection`
/// and `Authorization`. A user header named `Host`, `Content-Type`,
/// `Connection` or `Authorization` replaces the computed one. A user
/// `Content-Length` or `Content-Encoding` is discarded, because those must
/// describe the body the builder produced.
///
/// # Example
///
/// ```ignore
/// let request = HttpRequestBuilder::new()
///     .post()
///     .url("http://example.com/upload")
///     .parameter("tag", "holiday")
///     .file_data("image", "beach.jpg", jpeg_bytes, "image/jpeg")
///     .auth_basic("user", "pass")
///     .build()?;
/// ```
#[derive(Clone, Debug)]
pub struct HttpRequestBuilder {
    method: Option<String>,
    url: String,
    parameters: Vec<(String, String)>,
    data: Bytes,
    json: bool,
    files: Vec<UploadFile>,
    gzip: bool,
    compressor: Compressor,
    headers: Vec<(String, String)>,
    keep_alive: bool,
    auth: Option<Authentication>,
    deferred_error: Option<NetworkError>,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRequestBuilder {
    /// Create an empty builder. A method and URL must be set before building.
    pub fn new() -> Self {
        Self {
            method: None,
            url: String::new(),
            parameters: Vec::new(),
            data: Bytes::new(),
            json: false,
            files: Vec::new(),
            gzip: false,
            compressor: Compressor::default(),
            headers: Vec::new(),
            keep_alive: true,
            auth: None,
            deferred_error: None,
        }
    }

    /// Create a builder with the method already set.
    pub fn with_method(method: impl Into<String>) -> Self {
        Self::new().method(method)
    }

    /// Set the request method. Validated by [`build`](Self::build).
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Use GET.
    pub fn get(self) -> Self {
        self.method(HttpMethod::Get.as_str())
    }

    /// Use HEAD.
    pub fn head(self) -> Self {
        self.method(HttpMethod::Head.as_str())
    }

    /// Use POST.
    pub fn post(self) -> Self {
        self.method(HttpMethod::Post.as_str())
    }

    /// Use PUT.
    pub fn put(self) -> Self {
        self.method(HttpMethod::Put.as_str())
    }

    /// Use DELETE.
    pub fn delete(self) -> Self {
        self.method(HttpMethod::Delete.as_str())
    }

    /// Use PATCH.
    pub fn patch(self) -> Self {
        self.method(HttpMethod::Patch.as_str())
    }

    /// Set the request URL, either absolute (`http://host/path`) or
    /// origin-form (`/path`).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Append a query parameter. Repeated keys are kept in call order.
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    /// Set the raw request body.
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Mark the body set with [`data`](Self::data) as JSON.
    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Serialize `value` as the JSON body.
    pub fn json_body<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.data = Bytes::from(body);
                self.json = true;
            }
            Err(e) => self.defer_error(e.into()),
        }
        self
    }

    /// Upload a file from disk.
    ///
    /// The file is read immediately. If that fails the error is returned by
    /// [`build`](Self::build). An empty `content_type` is inferred from the
    /// file extension.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        path: impl AsRef<Path>,
        content_type: impl Into<String>,
    ) -> Self {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(data) => {
                let mut content_type = content_type.into();
                if content_type.is_empty() {
                    content_type = media_type_for_path(path).to_string();
                }
                self.files
                    .push(UploadFile::new(name, file_name, data, content_type));
            }
            Err(e) => {
                tracing::warn!(target: "courier::http", "Failed to read upload file '{}': {}", path.display(), e);
                self.defer_error(NetworkError::Upload(format!(
                    "cannot read '{}': {e}",
                    path.display()
                )));
            }
        }
        self
    }

    /// Upload in-memory data as a file part.
    pub fn file_data(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> Self {
        self.files
            .push(UploadFile::new(name, file_name, data, content_type));
        self
    }

    /// Compress the body and send `Content-Encoding: gzip`.
    ///
    /// Most servers do not accept compressed request bodies.
    pub fn gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    /// Replace the function used by [`gzip`](Self::gzip).
    pub fn compressor(mut self, compressor: Compressor) -> Self {
        self.compressor = compressor;
        self
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send `Connection: keep-alive` (default) or `Connection: close`.
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Send `Authorization: <scheme> <credentials>`.
    pub fn auth(mut self, scheme: impl Into<String>, credentials: impl Into<String>) -> Self {
        self.auth = Some(Authentication::Scheme {
            scheme: scheme.into(),
            credentials: credentials.into(),
        });
        self
    }

    /// Use HTTP Basic authentication.
    pub fn auth_basic(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(Authentication::Basic {
            username: login.into(),
            password: password.into(),
        });
        self
    }

    /// Use bearer token authentication.
    pub fn auth_bearer(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(Authentication::Bearer(token.into()));
        self
    }

    fn defer_error(&mut self, error: NetworkError) {
        if self.deferred_error.is_none() {
            self.deferred_error = Some(error);
        }
    }

    /// Validate the configuration and produce the request.
    pub fn build(self) -> Result<HttpRequest> {
        if let Some(error) = self.deferred_error {
            return Err(error);
        }

        let method: HttpMethod = self
            .method
            .as_deref()
            .ok_or_else(|| NetworkError::InvalidMethod("method is not set".to_string()))?
            .parse()?;

        let target = append_query(&self.url, &self.parameters);
        let (request_uri, host) = split_target(&target)?;

        for (name, value) in &self.headers {
            http::HeaderName::from_bytes(name.as_bytes())?;
            http::HeaderValue::from_str(value)?;
        }
        for file in &self.files {
            http::HeaderValue::from_str(file.effective_content_type()).map_err(|_| {
                NetworkError::InvalidHeader(format!(
                    "content type of upload '{}' is not a valid header value",
                    file.name
                ))
            })?;
        }
        let authorization = self.auth.as_ref().map(authorization_value).transpose()?;

        let (body, content_type) = if !self.files.is_empty() {
            if !self.data.is_empty() {
                tracing::debug!(target: "courier::http", "Uploads present, ignoring {} bytes of data", self.data.len());
            }
            let form = MultipartBody::encode(&self.files);
            let content_type = form.content_type();
            (form.into_bytes(), Some(content_type))
        } else if self.json {
            (self.data, Some(JSON_CONTENT_TYPE.to_string()))
        } else if !self.data.is_empty() {
            (self.data, Some(TEXT_CONTENT_TYPE.to_string()))
        } else {
            (self.data, None)
        };

        let (body, content_encoding) = if self.gzip && !body.is_empty() {
            let compressed = self
                .compressor
                .compress(&body)
                .map_err(|e| NetworkError::Compression(e.to_string()))?;
            tracing::debug!(target: "courier::http", "Compressed body from {} to {} bytes", body.len(), compressed.len());
            (Bytes::from(compressed), Some("gzip"))
        } else {
            (body, None)
        };

        let mut headers: Vec<(String, String)> = Vec::with_capacity(self.headers.len() + 6);
        for (name, value) in self.headers {
            if name.eq_ignore_ascii_case("Content-Length")
                || name.eq_ignore_ascii_case("Content-Encoding")
            {
                tracing::warn!(target: "courier::http", "Dropping user-supplied '{}' header", name);
                continue;
            }
            headers.push((name, value));
        }

        if let Some(host) = host
            && !has_header(&headers, "Host")
        {
            headers.push(("Host".to_string(), host));
        }
        if let Some(content_type) = content_type
            && !has_header(&headers, "Content-Type")
        {
            headers.push(("Content-Type".to_string(), content_type));
        }
        if let Some(encoding) = content_encoding {
            headers.push(("Content-Encoding".to_string(), encoding.to_string()));
        }
        headers.push(("Content-Length".to_string(), body.len().to_string()));
        if !has_header(&headers, "Connection") {
            let connection = if self.keep_alive { "keep-alive" } else { "close" };
            headers.push(("Connection".to_string(), connection.to_string()));
        }
        if let Some(value) = authorization
            && !has_header(&headers, "Authorization")
        {
            headers.push(("Authorization".to_string(), value));
        }
        if !has_header(&headers, "Host") {
            tracing::warn!(target: "courier::http", "Request to '{}' has no Host header", request_uri);
        }

        tracing::debug!(target: "courier::http", "Built {} {} ({} body bytes)", method, target, body.len());

        Ok(HttpRequest {
            method,
            target,
            request_uri,
            headers,
            body,
            keep_alive: self.keep_alive,
        })
    }
}

/// The `Authorization` value, rejected if the scheme is not a token or the
/// value would not survive as a single header line.
fn authorization_value(auth: &Authentication) -> Result<String> {
    let scheme = auth.scheme();
    if scheme.is_empty() || http::HeaderName::from_bytes(scheme.as_bytes()).is_err() {
        return Err(NetworkError::InvalidHeader(format!(
            "invalid authorization scheme '{}'",
            scheme.escape_debug()
        )));
    }
    let value = auth.header_value();
    http::HeaderValue::from_str(&value).map_err(|_| {
        NetworkError::InvalidHeader("authorization credentials contain invalid characters".to_string())
    })?;
    Ok(value)
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
}

/// Append URL-encoded query pairs to `url`, ahead of any fragment.
fn append_query(url: &str, parameters: &[(String, String)]) -> String {
    let (base, fragment) = match url.find('#') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };
    let mut target = base.to_string();
    let mut separator = if base.contains('?') { '&' } else { '?' };
    for (key, value) in parameters {
        target.push(separator);
        target.extend(url::form_urlencoded::byte_serialize(key.as_bytes()));
        target.push('=');
        target.extend(url::form_urlencoded::byte_serialize(value.as_bytes()));
        separator = '&';
    }
    target.push_str(fragment);
    target
}

/// Split a target into the request-line URI and, for absolute URLs, the
/// `Host` header value.
fn split_target(target: &str) -> Result<(String, Option<String>)> {
    if target.is_empty() {
        return Err(NetworkError::InvalidUrl("URL is not set".to_string()));
    }
    if target.starts_with('/') {
        let request_uri = target.split('#').next().unwrap_or(target);
        return Ok((request_uri.to_string(), None));
    }

    let url = url::Url::parse(target)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(NetworkError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    let host = url
        .host_str()
        .ok_or_else(|| NetworkError::InvalidUrl(format!("no host in '{target}'")))?;
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let mut request_uri = url.path().to_string();
    if let Some(query) = url.query() {
        request_uri.push('?');
        request_uri.push_str(query);
    }
    Ok((request_uri, Some(host)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_query() {
        let pairs = vec![
            ("q".to_string(), "a b".to_string()),
            ("x".to_string(), "1&2".to_string()),
        ];
        assert_eq!(append_query("/search", &pairs), "/search?q=a+b&x=1%262");
        assert_eq!(append_query("/search?page=2", &pairs[..1]), "/search?page=2&q=a+b");
        assert_eq!(append_query("/plain", &[]), "/plain");
    }

    #[test]
    fn test_split_target_absolute() {
        let (uri, host) = split_target("http://example.com:8080/a/b?c=d").unwrap();
        assert_eq!(uri, "/a/b?c=d");
        assert_eq!(host.as_deref(), Some("example.com:8080"));

        let (uri, host) = split_target("https://example.com").unwrap();
        assert_eq!(uri, "/");
        assert_eq!(host.as_deref(), Some("example.com"));
    }

    #[test]
    fn test_split_target_origin_form() {
        let (uri, host) = split_target("/status").unwrap();
        assert_eq!(uri, "/status");
        assert!(host.is_none());
    }

    #[test]
    fn test_query_goes_before_fragment() {
        let pairs = vec![("q".to_string(), "1".to_string())];
        assert_eq!(append_query("http://h/p#top", &pairs), "http://h/p?q=1#top");
        assert_eq!(append_query("/p?a=b#top", &pairs), "/p?a=b&q=1#top");

        let (uri, _) = split_target("/p?q=1#top").unwrap();
        assert_eq!(uri, "/p?q=1");
    }

    #[test]
    fn test_split_target_rejects_bad_urls() {
        assert!(matches!(split_target(""), Err(NetworkError::InvalidUrl(_))));
        assert!(matches!(split_target("example.com/x"), Err(NetworkError::InvalidUrl(_))));
        assert!(matches!(split_target("ftp://example.com/x"), Err(NetworkError::InvalidUrl(_))));
    }

    #[test]
    fn test_defer_error_keeps_first() {
        let mut builder = HttpRequestBuilder::new();
        builder.defer_error(NetworkError::Upload("first".into()));
        builder.defer_error(NetworkError::Upload("second".into()));
        assert!(matches!(builder.deferred_error, Some(NetworkError::Upload(ref m)) if m == "first"));
    }
}
