//! Configuration for blocking transports.

use std::time::Duration;

/// Socket options and per-operation deadlines for a
/// [`BlockingTransport`](super::BlockingTransport).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    /// Enable TCP_NODELAY (disable Nagle's algorithm).
    pub no_delay: bool,
    /// Connection timeout (TCP connect plus TLS handshake).
    pub connect_timeout: Option<Duration>,
    /// Deadline for a single `read_some`. `None` means no timeout.
    pub read_timeout: Option<Duration>,
    /// Deadline for a single `write`, covering every partial write. `None`
    /// means no timeout.
    pub write_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            no_delay: true,
            connect_timeout: Some(Duration::from_secs(30)),
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl TransportConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable TCP_NODELAY.
    pub fn no_delay(mut self, enabled: bool) -> Self {
        self.no_delay = enabled;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Disable the connection timeout.
    pub fn no_connect_timeout(mut self) -> Self {
        self.connect_timeout = None;
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the write timeout.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }
}
