//! Unified error type.

use crate::config::ConfigError;
use crate::pattern::PatternError;

/// The error type returned by trellis' fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// startup and infrastructure failures: a malformed route pattern, a bad
/// configuration file, binding to a port.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("route: {0}")]
    Pattern(#[from] PatternError),
}
