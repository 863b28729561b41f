//! Unified error type.

/// The error type returned by vigil's fallible operations.
///
/// Application-level errors (404, 503, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// startup and infrastructure failures: bad configuration, binding to a port,
/// registering metrics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}
