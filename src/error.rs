//! Pool error types
//!
//! This module distinguishes the three ways a pool operation can fail:
//! rejected configuration, a pool that has been shut down, and a transport
//! that could not be established. Callers use the distinction to tell
//! "pool unusable" from "transient network issue".

use std::fmt;

use crate::config::ConfigError;

/// Errors returned by pool construction and borrow operations
#[derive(Debug)]
#[non_exhaustive]
pub enum PoolError {
    /// Construction parameters were rejected; no pool was created
    InvalidConfig(ConfigError),

    /// The pool has been shut down and no longer hands out connections
    Closed,

    /// The transport could not be established
    ///
    /// Carries the dialer's error unchanged. During construction this also
    /// aborts the initial fill, after already-dialed connections have been
    /// really closed.
    Dial(anyhow::Error),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(e) => write!(f, "invalid pool configuration: {}", e),
            Self::Closed => write!(f, "connection pool is closed"),
            Self::Dial(e) => write!(f, "failed to dial backend: {}", e),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidConfig(e) => Some(e),
            Self::Closed => None,
            Self::Dial(e) => Some(e.as_ref()),
        }
    }
}

impl PoolError {
    /// Check whether this error means the pool has been shut down
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Check whether this error came from the dial boundary
    #[must_use]
    pub const fn is_dial_error(&self) -> bool {
        matches!(self, Self::Dial(_))
    }

    /// Check whether construction parameters were rejected
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub const fn log_level(&self) -> tracing::Level {
        match self {
            // Misconfiguration needs operator attention
            Self::InvalidConfig(_) => tracing::Level::ERROR,
            // Dial failures might be transient
            Self::Dial(_) => tracing::Level::WARN,
            // Expected during shutdown
            Self::Closed => tracing::Level::DEBUG,
        }
    }
}

impl From<ConfigError> for PoolError {
    fn from(err: ConfigError) -> Self {
        Self::InvalidConfig(err)
    }
}
