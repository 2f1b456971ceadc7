//! Lifecycle state of a blocking transport.

/// Current state of a [`BlockingTransport`](super::BlockingTransport).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    /// The stream is usable for I/O.
    Open,
    /// The stream has been released. Terminal.
    Closed,
}

impl std::fmt::Display for TransportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
