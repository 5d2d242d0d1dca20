//! Contract between the transcript controller and the remote model.
//!
//! A [`SessionProvider`] opens conversation contexts; each
//! [`SessionHandle`] turns one user message into a lazy stream of text
//! fragments. The stream is finite and cannot be restarted. It may fail at any
//! point, including after it has already produced fragments.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use futures_util::stream::BoxStream;

/// Fragments of one model response, in the order the model produced them.
pub type FragmentStream = BoxStream<'static, Result<String, StreamError>>;

pub trait SessionProvider: Send + Sync {
    fn create_session(
        &self,
        system_instruction: &str,
    ) -> Result<Arc<dyn SessionHandle>, ProviderError>;
}

pub trait SessionHandle: Send + Sync {
    /// Starts a response for `user_text`. No request is made until the
    /// returned stream is first polled.
    fn stream_response(&self, user_text: &str) -> FragmentStream;
}

/// Failures raised while opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Credentials or configuration needed to reach the model are missing.
    Unavailable { reason: String },
}

impl ProviderError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Unavailable { reason } => {
                write!(f, "Model provider unavailable: {reason}")
            }
        }
    }
}

impl Error for ProviderError {}

/// A failure while a response was being streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    message: String,
}

impl StreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream error: {}", self.message)
    }
}

impl Error for StreamError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_mentions_reason() {
        let err = ProviderError::unavailable("GEMINI_API_KEY is not set");
        assert_eq!(
            err.to_string(),
            "Model provider unavailable: GEMINI_API_KEY is not set"
        );
    }

    #[test]
    fn stream_error_keeps_raw_message() {
        let err = StreamError::new("connection reset");
        assert_eq!(err.message(), "connection reset");
        assert_eq!(err.to_string(), "Stream error: connection reset");
    }
}
