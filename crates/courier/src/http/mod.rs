//! HTTP/1.1 request construction.
//!
//! [`HttpRequestBuilder`] collects method, URL, query parameters, body,
//! uploads, headers and credentials, then [`build`](HttpRequestBuilder::build)
//! validates them and produces an immutable [`HttpRequest`]. Building never
//! touches the network; the request is handed to a transport as bytes.
//!
//! # Example
//!
//! ```ignore
//! use courier::http::HttpRequestBuilder;
//!
//! let request = HttpRequestBuilder::new()
//!     .post()
//!     .url("http://example.com/api/items")
//!     .parameter("dry_run", "true")
//!     .data(r#"{"name":"widget"}"#)
//!     .json(true)
//!     .auth_bearer("token123")
//!     .build()?;
//!
//! let head = request.head_bytes();
//! transport.write(&[&head[..], &request.body()[..]])?;
//! ```

mod auth;
mod builder;
mod compress;
mod multipart;
mod request;

pub use auth::Authentication;
pub use builder::HttpRequestBuilder;
pub use compress::Compressor;
pub use multipart::{DEFAULT_CONTENT_TYPE, MultipartBody, UploadFile, media_type_for_path};
pub use request::{HttpMethod, HttpRequest};
