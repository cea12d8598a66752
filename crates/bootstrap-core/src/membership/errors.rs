use thiserror::Error;

/// Errors that can occur when talking to the etcd v2 members API.
///
/// None of these are fatal to a bootstrap run: probe failures are swallowed by
/// [`MembershipQuery`](super::MembershipQuery) and mutation failures are downgraded to
/// warnings by [`MembershipMutator`](super::MembershipMutator).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MembershipError {
    /// Request exceeded the configured timeout duration.
    #[error("Request timeout")]
    Timeout,

    /// Failed to establish a connection to the member endpoint.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Non-2xx status code.
    ///
    /// First field is the HTTP status code, second is the (truncated) response body.
    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    /// Response body could not be decoded as a member list.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The coordinator or member URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl MembershipError {
    /// Returns `true` if the endpoint was not reachable at all.
    ///
    /// Unreachable endpoints are the normal case while a cluster is being formed.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Timeout | Self::ConnectionFailed(_))
    }

    /// Returns the HTTP status code if the endpoint answered with a non-2xx status.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError(status, _) => Some(*status),
            _ => None,
        }
    }
}
