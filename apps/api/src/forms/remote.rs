use async_trait::async_trait;
use thiserror::Error;

use crate::forms::errors::{FieldErrorSet, SubmissionResult};
use crate::forms::normalize::FormData;

/// Failures that prevented a remote operation from producing a
/// [`SubmissionResult`] at all.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never completed (connection refused, reset, DNS...).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote operation timed out")]
    Timeout,

    /// The remote side answered with something outside the contract.
    #[error("remote contract violation: {0}")]
    Contract(String),
}

impl RemoteError {
    /// Whole-form message shown to the user for recoverable failures.
    /// Contract violations have none; they propagate to the caller.
    pub fn user_message(&self) -> Option<FieldErrorSet> {
        match self {
            RemoteError::Transport(_) => Some(FieldErrorSet::form(
                "Could not reach the server. Check your connection and try again.",
            )),
            RemoteError::Timeout => Some(FieldErrorSet::form(
                "The server took too long to respond. Please try again.",
            )),
            RemoteError::Contract(_) => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_decode() {
            RemoteError::Contract(e.to_string())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

/// A save or delete call on the persistence side.
///
/// Expected business failures come back as `SubmissionResult::Error`; an
/// `Err` is reserved for failures where no result exists.
#[async_trait]
pub trait RemoteOperation<T>: Send + Sync {
    async fn call(&self, form: &FormData) -> Result<SubmissionResult<T>, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_and_timeout_have_distinct_messages() {
        let transport = RemoteError::Transport("refused".into()).user_message().unwrap();
        let timeout = RemoteError::Timeout.user_message().unwrap();
        assert_ne!(transport, timeout);
        assert!(transport.field_errors.is_empty());
        assert_eq!(timeout.form_errors.len(), 1);
    }

    #[test]
    fn test_contract_violation_has_no_user_message() {
        assert!(RemoteError::Contract("bad body".into()).user_message().is_none());
    }
}
