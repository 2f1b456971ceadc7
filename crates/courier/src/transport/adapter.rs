//! Blocking connection over an asynchronous stream.

use std::io::{self, IoSlice};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::runtime::Handle;

use super::completion::Completion;
use super::config::TransportConfig;
use super::state::TransportState;
use super::stream::{self, MaybeTlsStream};
use crate::error::{NetworkError, Result};
use crate::tls::TlsConfig;

/// A blocking connection backed by an asynchronous stream.
///
/// Each [`write`](Self::write) or [`read_some`](Self::read_some) issues its
/// asynchronous operation on the runtime and suspends the calling thread
/// until it completes. Every I/O method takes `&mut self`, so at most one
/// operation is in flight per transport; share a transport across threads
/// only behind your own synchronization.
///
/// Once [`close`](Self::close) has been called the transport is
/// [`TransportState::Closed`] for good and further I/O fails with
/// [`NetworkError::Closed`]. I/O errors and timeouts do not close the
/// transport.
///
/// Blocking calls must not be made from inside an async context.
///
/// # Example
///
/// ```ignore
/// use courier::transport::{BlockingTransport, TransportConfig};
///
/// let mut transport = BlockingTransport::connect("example.com", 80, TransportConfig::default())?;
/// let head = request.head_bytes();
/// transport.write(&[&head[..], &request.body()[..]])?;
///
/// let mut buf = [0u8; 4096];
/// let n = transport.read_some(&mut buf)?;
/// transport.close();
/// ```
pub struct BlockingTransport<S> {
    stream: Option<S>,
    completion: Completion,
    config: TransportConfig,
}

impl BlockingTransport<MaybeTlsStream> {
    /// Connect to `host:port` over plain TCP.
    pub fn connect(host: &str, port: u16, config: TransportConfig) -> Result<Self> {
        Self::open(host, port, None, config)
    }

    /// Connect to `host:port` and perform a TLS handshake with `host` as the
    /// server name.
    pub fn connect_tls(
        host: &str,
        port: u16,
        tls: &TlsConfig,
        config: TransportConfig,
    ) -> Result<Self> {
        Self::open(host, port, Some(tls), config)
    }

    fn open(
        host: &str,
        port: u16,
        tls: Option<&TlsConfig>,
        config: TransportConfig,
    ) -> Result<Self> {
        let completion = Completion::new(crate::runtime::handle());
        tracing::debug!(target: "courier::transport", "Connecting to {}:{} (tls: {})", host, port, tls.is_some());

        let stream = completion.wait(
            config.connect_timeout,
            stream::open(host, port, config.no_delay, tls),
        )?;

        tracing::debug!(target: "courier::transport", "Connected to {}:{}", host, port);
        Ok(Self {
            stream: Some(stream),
            completion,
            config,
        })
    }
}

impl<S> BlockingTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream, driven by the shared runtime.
    pub fn from_stream(stream: S, config: TransportConfig) -> Self {
        Self::with_handle(stream, crate::runtime::handle(), config)
    }

    /// Wrap an already connected stream, driven by the runtime behind
    /// `handle`. The stream must belong to that runtime's reactor.
    ///
    /// Blocking through a handle only makes progress if the runtime's I/O
    /// and timer drivers run elsewhere. A multi-thread runtime does that on
    /// its workers. A `current_thread` runtime does not unless another
    /// thread is inside its `block_on`; otherwise every call hangs.
    pub fn with_handle(stream: S, handle: Handle, config: TransportConfig) -> Self {
        Self {
            stream: Some(stream),
            completion: Completion::new(handle),
            config,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TransportState {
        if self.stream.is_some() {
            TransportState::Open
        } else {
            TransportState::Closed
        }
    }

    /// Whether the transport can still perform I/O.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// The transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Write every byte of `buffers`, in order, as one logical write.
    ///
    /// Partial writes are continued until all bytes are accepted; the call
    /// returns the total only after the stream has been flushed.
    pub fn write(&mut self, buffers: &[&[u8]]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(NetworkError::Closed)?;
        self.completion
            .wait(self.config.write_timeout, async move {
                write_all_vectored(stream, buffers)
                    .await
                    .map_err(NetworkError::from)
            })
    }

    /// Perform exactly one read into `buf`. `Ok(0)` means end of stream.
    pub fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(NetworkError::Closed)?;
        let n = self.completion.wait(self.config.read_timeout, async move {
            stream.read(buf).await.map_err(NetworkError::from)
        })?;
        tracing::trace!(target: "courier::transport", "Read {} bytes", n);
        Ok(n)
    }

    /// Shut down and release the stream. Safe to call more than once.
    pub fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        let result = self
            .completion
            .wait(self.config.write_timeout, async move {
                stream.shutdown().await.map_err(NetworkError::from)
            });
        match result {
            Ok(()) => tracing::debug!(target: "courier::transport", "Transport closed"),
            Err(e) => tracing::warn!(target: "courier::transport", "Error while closing transport: {}", e),
        }
    }
}

impl<S> std::fmt::Debug for BlockingTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingTransport")
            .field("open", &self.stream.is_some())
            .field("config", &self.config)
            .finish()
    }
}

async fn write_all_vectored<S>(stream: &mut S, buffers: &[&[u8]]) -> io::Result<usize>
where
    S: AsyncWrite + Unpin,
{
    let mut slices: Vec<IoSlice<'_>> = buffers
        .iter()
        .filter(|buf| !buf.is_empty())
        .map(|buf| IoSlice::new(buf))
        .collect();
    let mut remaining: &mut [IoSlice<'_>] = &mut slices;
    let mut total = 0;

    while !remaining.is_empty() {
        let n = stream.write_vectored(remaining).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "stream accepted no bytes",
            ));
        }
        total += n;
        tracing::trace!(target: "courier::transport", "Wrote {} bytes ({} total)", n, total);
        IoSlice::advance_slices(&mut remaining, n);
    }

    stream.flush().await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::io::ReadBuf;

    use super::*;
    use crate::error::ErrorKind;

    /// Accepts at most `chunk` bytes per write call and records everything.
    #[derive(Clone, Default)]
    struct ChunkedSink {
        chunk: usize,
        written: Arc<Mutex<Vec<u8>>>,
        write_calls: Arc<Mutex<usize>>,
        stalled_reads: bool,
    }

    impl AsyncRead for ChunkedSink {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.stalled_reads {
                return Poll::Pending;
            }
            buf.put_slice(b"pong");
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for ChunkedSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            *self.write_calls.lock() += 1;
            let n = buf.len().min(self.chunk);
            self.written.lock().extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn sink(chunk: usize) -> ChunkedSink {
        ChunkedSink {
            chunk,
            ..Default::default()
        }
    }

    #[test]
    fn test_partial_writes_are_continued() {
        let mock = sink(6);
        let mut transport = BlockingTransport::from_stream(mock.clone(), TransportConfig::default());

        let written = transport.write(&[b"0123456789".as_slice()]).unwrap();
        assert_eq!(written, 10);
        assert_eq!(*mock.write_calls.lock(), 2);
        assert_eq!(mock.written.lock().as_slice(), b"0123456789");
    }

    #[test]
    fn test_multiple_buffers_written_in_order() {
        let mock = sink(3);
        let mut transport = BlockingTransport::from_stream(mock.clone(), TransportConfig::default());

        let written = transport.write(&[b"head|".as_slice(), b"", b"body"]).unwrap();
        assert_eq!(written, 9);
        assert_eq!(mock.written.lock().as_slice(), b"head|body");
    }

    #[test]
    fn test_zero_length_write_is_an_error() {
        let mut transport = BlockingTransport::from_stream(sink(0), TransportConfig::default());
        let err = transport.write(&[b"data".as_slice()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(transport.is_open());
    }

    #[test]
    fn test_read_some_single_read() {
        let mut transport = BlockingTransport::from_stream(sink(8), TransportConfig::default());
        let mut buf = [0u8; 16];
        let n = transport.read_some(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"pong");
    }

    #[test]
    fn test_read_timeout_keeps_transport_open() {
        let mock = ChunkedSink {
            chunk: 8,
            stalled_reads: true,
            ..Default::default()
        };
        let config = TransportConfig::new().read_timeout(Duration::from_millis(20));
        let mut transport = BlockingTransport::from_stream(mock, config);

        let mut buf = [0u8; 16];
        let err = transport.read_some(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(transport.state(), TransportState::Open);
    }

    #[test]
    fn test_with_handle_of_multi_thread_runtime() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let mock = sink(4);
        let config = TransportConfig::new().write_timeout(Duration::from_secs(5));
        let mut transport = BlockingTransport::with_handle(mock.clone(), rt.handle().clone(), config);

        assert_eq!(transport.write(&[b"abcdef".as_slice()]).unwrap(), 6);
        assert_eq!(mock.written.lock().as_slice(), b"abcdef");
        transport.close();
    }

    #[test]
    fn test_closed_transport_performs_no_io() {
        let mock = sink(8);
        let mut transport = BlockingTransport::from_stream(mock.clone(), TransportConfig::default());

        transport.close();
        transport.close();
        assert_eq!(transport.state(), TransportState::Closed);

        let err = transport.write(&[b"late".as_slice()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        let mut buf = [0u8; 4];
        let err = transport.read_some(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
        assert_eq!(*mock.write_calls.lock(), 0);
    }
}
