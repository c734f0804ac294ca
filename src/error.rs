use std::result;

/// Failures surfaced by the digest filter.
///
/// A missing or malformed challenge is not an error; it simply means digest
/// authentication does not apply to the response.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The challenge offered a quality of protection other than `auth`
    #[error("Unsupported digest qop: {0}")]
    UnsupportedQop(String),

    /// A usable challenge arrived, but no credentials could be resolved for the request
    #[error("Digest authentication requested, but no credentials are available")]
    CredentialsMissing,

    /// The digest function failed its self test while building the authenticator
    #[error("Digest function {0} is unavailable")]
    DigestUnavailable(&'static str),

    /// The composed Authorization value is not a valid header value
    #[error("Invalid Authorization header value")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
}

pub type Result<T> = result::Result<T, Error>;
