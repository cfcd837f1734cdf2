use thiserror::Error;

/// Errors produced while fetching entropy or sampling from it.
///
/// None of these are retried. A failed fetch fails the whole call and no
/// partial result is returned.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller input that can never succeed. Reported before any fetch.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Transport failure, non-success status, or `success: false` payload.
    #[error("entropy source unavailable: {0}")]
    SourceUnavailable(String),

    /// The source answered, but the data has the wrong shape.
    #[error("entropy source protocol error: {0}")]
    SourceProtocolError(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Error::SourceProtocolError(msg.into())
    }

    /// True for failures that came from the entropy source rather than the caller.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            Error::SourceUnavailable(_) | Error::SourceProtocolError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
