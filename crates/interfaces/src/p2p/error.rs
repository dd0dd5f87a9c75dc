use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Result alias for result of a request.
pub type RequestResult<T> = Result<T, RequestError>;

/// Error variants that can happen when sending requests to a peer session.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum RequestError {
    /// The channel to the peer session closed before a response arrived.
    #[error("closed channel to the peer")]
    ChannelClosed,
    /// The connection to the peer dropped while handling the request.
    #[error("connection to a peer dropped while handling the request")]
    ConnectionDropped,
    /// The request timed out while awaiting a response.
    #[error("request timed out while awaiting response")]
    Timeout,
    /// The peer answered with something that failed validation.
    #[error("received bad response")]
    BadResponse,
}

// === impl RequestError ===

impl RequestError {
    /// Indicates whether this error is retryable or fatal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::ConnectionDropped)
    }

    /// Whether the error happened because the channel was closed.
    pub fn is_channel_closed(&self) -> bool {
        matches!(self, Self::ChannelClosed)
    }
}

impl<T> From<mpsc::error::SendError<T>> for RequestError {
    fn from(_: mpsc::error::SendError<T>) -> Self {
        Self::ChannelClosed
    }
}

impl From<oneshot::error::RecvError> for RequestError {
    fn from(_: oneshot::error::RecvError) -> Self {
        Self::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_variants() {
        assert!(RequestError::Timeout.is_retryable());
        assert!(RequestError::ConnectionDropped.is_retryable());
        assert!(!RequestError::BadResponse.is_retryable());
        assert!(RequestError::ChannelClosed.is_channel_closed());
    }
}
