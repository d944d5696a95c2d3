//! Error types for reference resolution

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolveError>;

/// Failures surfaced by the resolution pipeline.
///
/// Intentional no-ops (excluded base images, references already pinned to the
/// current digest) are not errors; they are reported through
/// [`crate::resolver::Resolution::Skipped`]. Everything here is either a
/// fixable input problem or a transport failure the caller may want to
/// classify as retryable.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The matched text did not decompose into a registry/repository plus
    /// exactly one tag or digest.
    #[error("invalid container reference: {0}")]
    InvalidReference(String),

    /// The platform constraint was not of the form `os/arch`.
    #[error("platform must be in the format os/arch, got: {0}")]
    InvalidPlatform(String),

    /// Token exchange with the registry's auth endpoint failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The registry answered, but not with something usable.
    #[error("registry error: {0}")]
    Registry(String),

    /// Transport-level failure, propagated verbatim so callers can inspect
    /// timeouts, connection errors and cancellation.
    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
