//! Blocking wait on a single asynchronous operation.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::error::{NetworkError, Result};

/// Runs one asynchronous operation to completion while the calling thread
/// is suspended.
///
/// The operation's future is driven by the runtime behind `handle`; its
/// reactor delivers the I/O readiness and the caller resumes once the
/// future resolves. If a deadline is given and elapses first, the future is
/// dropped, which cancels the underlying operation, and the caller gets
/// [`NetworkError::Timeout`].
#[derive(Clone, Debug)]
pub struct Completion {
    handle: Handle,
}

impl Completion {
    /// Create a completion bound to a runtime.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// The runtime handle operations run on.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Block until `op` finishes or `deadline` elapses.
    ///
    /// Must be called from a thread that is not itself running async code;
    /// in that case this returns a configuration error instead of blocking
    /// the executor.
    pub fn wait<F, T>(&self, deadline: Option<Duration>, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if Handle::try_current().is_ok() {
            return Err(NetworkError::Configuration(
                "blocking transport call made from inside an async runtime".to_string(),
            ));
        }

        self.handle.block_on(async move {
            match deadline {
                Some(limit) => match tokio::time::timeout(limit, op).await {
                    Ok(result) => result,
                    Err(_) => Err(NetworkError::Timeout),
                },
                None => op.await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn completion() -> Completion {
        Completion::new(crate::runtime::handle())
    }

    #[test]
    fn test_wait_returns_result() {
        let value = completion().wait(None, async { Ok(7) }).unwrap();
        assert_eq!(value, 7);

        let err = completion()
            .wait::<_, ()>(None, async { Err(NetworkError::Io("reset".into())) })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_wait_times_out() {
        let err = completion()
            .wait::<_, ()>(
                Some(Duration::from_millis(20)),
                std::future::pending::<Result<()>>(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_wait_inside_runtime_is_rejected() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let completion = completion();
        let result = rt.block_on(async { completion.wait(None, async { Ok(()) }) });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Configuration);
    }
}
