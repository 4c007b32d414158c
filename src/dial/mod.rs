//! Dial boundary: how the pool obtains new connections
//!
//! The pool depends on exactly one capability from its environment: "given no
//! arguments, produce a live bidirectional byte stream to a predetermined
//! remote endpoint, or fail". This module defines that capability as the
//! [`Dial`] trait and provides:
//! - [`TcpDialer`]: tuned TCP connections to a fixed `host:port`
//! - [`InstrumentedDialer`]: wraps any dialer with a [`DialObserver`]
//! - [`MockDialer`]: in-memory connections for tests

mod instrument;
mod mock;
mod tcp;

pub use instrument::{DialCounter, DialObserver, InstrumentedDialer};
pub use mock::MockDialer;
pub use tcp::TcpDialer;

use anyhow::Result;
use async_trait::async_trait;

use crate::stream::AsyncStream;

/// Produces one live connection to a predetermined remote endpoint
///
/// Implementations close over whatever addressing and credentials they need;
/// the pool never sees an address. Dialing may block on I/O for as long as the
/// transport allows — the pool imposes no timeout of its own, so a dialer
/// wanting a deadline must apply it internally.
///
/// Must be safe to invoke concurrently: the pool dials from multiple tasks
/// whenever the idle store is empty.
#[async_trait]
pub trait Dial: Send + Sync {
    /// Connection type produced by this dialer
    type Conn: AsyncStream + 'static;

    /// Establish one new connection
    ///
    /// # Errors
    ///
    /// Returns the transport's own error when the connection cannot be
    /// established. The pool surfaces it to the borrower unchanged.
    async fn dial(&self) -> Result<Self::Conn>;
}

/// Sharing a dialer between a pool and other holders (tests, metrics) only
/// needs an `Arc`.
#[async_trait]
impl<D: Dial + ?Sized> Dial for std::sync::Arc<D> {
    type Conn = D::Conn;

    async fn dial(&self) -> Result<Self::Conn> {
        (**self).dial().await
    }
}
