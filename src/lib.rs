//! Bounded, growable pooling of reusable async stream connections
//!
//! This crate provides a thread-safe pool of live connections to a single
//! remote endpoint. Establishing a connection is expensive (TCP handshake,
//! socket tuning); callers that issue many short request/response exchanges
//! amortize that cost by borrowing a connection from the pool and releasing
//! it back when done, instead of dialing per exchange.
//!
//! The pool keeps a bounded idle store. Borrowing serves from the idle store
//! when possible and dials fresh connections on demand when it is empty, so
//! callers never block waiting for a slot. Releasing a borrowed connection
//! recycles it into the idle store; once the store is full (or the pool has
//! been shut down) the surplus connection is really closed instead.
//!
//! # Example
//!
//! ```no_run
//! use stream_pool::{ChannelPool, PoolConfig, TcpDialer};
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let dialer = TcpDialer::new("backend.example.com", 7000);
//! let pool = ChannelPool::connect(PoolConfig::new(2, 8), dialer).await?;
//!
//! let mut conn = pool.get().await?;
//! conn.write_all(b"ping\n").await?;
//! let mut buf = [0u8; 64];
//! let _n = conn.read(&mut buf).await?;
//! conn.release().await?; // back into the idle store
//!
//! pool.close().await; // drain and really close idle connections
//! # Ok(())
//! # }
//! ```
//!
//! The transport is pluggable: anything implementing [`Dial`] can back the
//! pool, and the pooled connection type only needs to be an [`AsyncStream`].
//! [`TcpDialer`] is the batteries-included TCP implementation;
//! [`MockDialer`] provides in-memory connections for tests.

pub mod config;
pub mod dial;
pub mod error;
pub mod pool;
pub mod stream;
pub mod types;

pub use config::{ConfigError, PoolConfig};
pub use dial::{Dial, DialCounter, DialObserver, InstrumentedDialer, MockDialer, TcpDialer};
pub use error::PoolError;
pub use pool::{ChannelPool, PooledConn};
pub use stream::AsyncStream;
pub use types::{DialedConnections, IdleConnections, MaxIdleConnections, PoolStatus};
