//! Pool sizing configuration
//!
//! This module defines the two knobs a pool exposes: how many connections to
//! pre-warm at construction and how many idle connections to retain.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default idle-store capacity when none is configured
const DEFAULT_MAX_IDLE: usize = 8;

/// Errors produced when validating pool sizing parameters
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The idle store must be able to hold at least one connection
    #[error("max_idle must be greater than zero")]
    ZeroMaxIdle,

    /// Pre-warmed connections could never all fit into the idle store
    #[error("initial_connections ({initial}) exceeds max_idle ({max_idle})")]
    InitialExceedsMax { initial: usize, max_idle: usize },
}

/// Sizing parameters for a [`ChannelPool`](crate::ChannelPool)
///
/// `initial_connections` are dialed eagerly when the pool is constructed and
/// placed into the idle store. `max_idle` caps the idle store only: the number
/// of concurrently *borrowed* connections is unbounded, and connections
/// released in excess of `max_idle` are really closed instead of retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Connections dialed synchronously at construction
    #[serde(default)]
    pub initial_connections: usize,

    /// Idle-store capacity; also the recycle threshold
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,
}

fn default_max_idle() -> usize {
    DEFAULT_MAX_IDLE
}

impl PoolConfig {
    /// Create a configuration with the given sizes
    #[must_use]
    pub const fn new(initial_connections: usize, max_idle: usize) -> Self {
        Self {
            initial_connections,
            max_idle,
        }
    }

    /// Check that the sizes describe a usable pool
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `max_idle` is zero or smaller than
    /// `initial_connections`. Negative sizes are unrepresentable by
    /// construction.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_idle == 0 {
            return Err(ConfigError::ZeroMaxIdle);
        }
        if self.initial_connections > self.max_idle {
            return Err(ConfigError::InitialExceedsMax {
                initial: self.initial_connections,
                max_idle: self.max_idle,
            });
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_connections: 0,
            max_idle: DEFAULT_MAX_IDLE,
        }
    }
}
