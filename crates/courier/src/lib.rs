//! HTTP/1.1 request construction and a blocking transport for sending it.
//!
//! The crate has two independent halves:
//!
//! - **Request building** ([`http`]): a fluent [`HttpRequestBuilder`] that
//!   produces an immutable [`HttpRequest`] with query encoding, raw or JSON
//!   bodies, multipart uploads, optional gzip, authentication and
//!   connection-persistence headers.
//! - **Transport** ([`transport`]): a [`BlockingTransport`] that offers
//!   blocking `connect`/`write`/`read_some`/`close` calls on top of an
//!   asynchronous tokio stream, plain or TLS.
//!
//! The builder knows nothing about sockets and the transport knows nothing
//! about HTTP; a request is serialized to bytes and written by the caller.
//!
//! # Example
//!
//! ```ignore
//! use courier::{BlockingTransport, HttpRequestBuilder, TransportConfig};
//!
//! let request = HttpRequestBuilder::new()
//!     .get()
//!     .url("http://example.com/search")
//!     .parameter("q", "rust")
//!     .keep_alive(false)
//!     .build()?;
//!
//! let mut transport = BlockingTransport::connect("example.com", 80, TransportConfig::default())?;
//! transport.write(&[&request.to_bytes()[..]])?;
//!
//! let mut response = Vec::new();
//! let mut buf = [0u8; 4096];
//! loop {
//!     let n = transport.read_some(&mut buf)?;
//!     if n == 0 {
//!         break;
//!     }
//!     response.extend_from_slice(&buf[..n]);
//! }
//! transport.close();
//! ```
//!
//! # Logging
//!
//! Diagnostics are emitted through `tracing` under the `courier::http`,
//! `courier::transport` and `courier::tls` targets. No subscriber is
//! installed by this crate.

mod error;
pub mod http;
pub mod runtime;
pub mod tls;
pub mod transport;

pub use error::{ErrorKind, NetworkError, Result};

// Re-export commonly used types at the crate root
pub use self::http::{
    Authentication, Compressor, HttpMethod, HttpRequest, HttpRequestBuilder, UploadFile,
};
pub use tls::{Certificate, TlsConfig, TlsVersion};
pub use transport::{BlockingTransport, TransportConfig, TransportState};
