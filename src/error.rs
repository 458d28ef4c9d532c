use std::time::Duration;

use thiserror::Error;

use crate::runtime::RuntimeError;

/// Why a monitor stopped.
#[derive(Debug, Error)]
pub enum Error {
    /// The cancellation token fired.  Never retried.
    #[error("monitor cancelled")]
    Cancelled,
    #[error("failed to stream events: {0}")]
    Stream(#[source] RuntimeError),
    #[error("failed to refresh containers: {0}")]
    Refresh(#[source] RuntimeError),
    #[error("failed to subscribe to events: {0}")]
    Subscribe(#[source] RuntimeError),
    #[error("container refresh timed out after {0:?}")]
    PullTimeout(Duration),
    #[error("event stream ended")]
    StreamEnded,
    /// Reconnect gave up; carries the error from the final attempt.
    #[error("giving up after {attempts} attempts: {source}")]
    RetryExhausted {
        /// Consecutive failed sessions since the last stable one.
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// The runtime error behind this failure, if any.
    pub fn runtime_error(&self) -> Option<&RuntimeError> {
        match self {
            Error::Stream(e) | Error::Refresh(e) | Error::Subscribe(e) => Some(e),
            Error::RetryExhausted { source, .. } => source.runtime_error(),
            _ => None,
        }
    }
}
