//! Blocking transport over an asynchronous socket.
//!
//! [`BlockingTransport`] owns one stream and exposes `connect`, `write`,
//! `read_some` and `close` as ordinary blocking calls. Each call hands a
//! single asynchronous operation to the tokio reactor through
//! [`Completion`] and suspends the caller until it finishes.
//!
//! Any stream implementing tokio's `AsyncRead + AsyncWrite` can be wrapped:
//! plain TCP, TLS via rustls, or an in-memory mock.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use courier::transport::{BlockingTransport, TransportConfig};
//!
//! let config = TransportConfig::new()
//!     .connect_timeout(Duration::from_secs(5))
//!     .read_timeout(Duration::from_secs(30));
//!
//! let mut transport = BlockingTransport::connect("127.0.0.1", 8080, config)?;
//! transport.write(&[b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n".as_slice()])?;
//!
//! let mut buf = vec![0u8; 8192];
//! loop {
//!     let n = transport.read_some(&mut buf)?;
//!     if n == 0 {
//!         break;
//!     }
//!     handle(&buf[..n]);
//! }
//! transport.close();
//! ```

mod adapter;
mod completion;
mod config;
mod state;
mod stream;

pub use adapter::BlockingTransport;
pub use completion::Completion;
pub use config::TransportConfig;
pub use state::TransportState;
pub use stream::MaybeTlsStream;
