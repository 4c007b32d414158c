//! In-memory dialer for tests
//!
//! Produces [`tokio::io::DuplexStream`] pairs instead of real sockets. The
//! far end of every dialed connection is retained so tests can drive the
//! "remote" side and observe whether the near end was really closed (EOF) or
//! kept alive by recycling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::DuplexStream;

use super::Dial;

/// Buffer size of the in-memory pipe
const PIPE_BUFFER: usize = 4096;

/// Dialer producing in-memory duplex connections
///
/// # Examples
///
/// ```
/// use stream_pool::{ChannelPool, MockDialer, PoolConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let pool = ChannelPool::connect(PoolConfig::new(1, 3), MockDialer::new()).await?;
/// assert_eq!(pool.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockDialer {
    attempts: AtomicUsize,
    fail_from: Option<usize>,
    peers: Mutex<Vec<DuplexStream>>,
}

impl MockDialer {
    /// Create a dialer where every dial succeeds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every dial attempt from the given zero-based attempt index on
    ///
    /// `with_failure_after(0)` fails immediately; `with_failure_after(1)`
    /// lets the first dial succeed and fails the rest.
    #[must_use]
    pub fn with_failure_after(mut self, attempt: usize) -> Self {
        self.fail_from = Some(attempt);
        self
    }

    /// Total dial attempts made, successful or not
    #[must_use]
    pub fn dial_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Take the retained far ends of every successful dial, in dial order
    ///
    /// Reading `Ok(0)` on a far end means the near end was really closed;
    /// a pending read means it is still alive (idle or borrowed).
    #[must_use]
    pub fn take_peers(&self) -> Vec<DuplexStream> {
        std::mem::take(&mut *self.peers.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl Dial for MockDialer {
    type Conn = DuplexStream;

    async fn dial(&self) -> Result<DuplexStream> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(fail_from) = self.fail_from
            && attempt >= fail_from
        {
            anyhow::bail!("mock dial refused (attempt {})", attempt);
        }

        let (local, peer) = tokio::io::duplex(PIPE_BUFFER);
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(peer);
        Ok(local)
    }
}
