//! Pooled-connection wrapper
//!
//! [`PooledConn`] is the handle a borrower holds. It forwards reads and
//! writes to the underlying connection unchanged; what it changes is the end
//! of life. Releasing the handle recycles the connection into the pool's idle
//! store, and only the pool's verdict (closed, or store full) turns a release
//! into a real close.

use std::fmt;
use std::io;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tracing::debug;

use crate::dial::Dial;
use crate::pool::PoolCore;

/// A connection borrowed from a [`ChannelPool`](crate::ChannelPool)
///
/// Wraps exactly one live connection plus a back-reference to the owning
/// pool. Ownership makes the aliasing rule structural: a connection handed to
/// one borrower cannot be observed by another until it has been recycled.
///
/// Ending a borrow:
/// - [`release`](Self::release) hands the connection back to the pool and
///   reports a real-close failure if the pool refuses it. Because it consumes
///   the handle, a double close is unrepresentable.
/// - Dropping the handle recycles too, silently; use it when there is no
///   caller to report to.
/// - [`detach`](Self::detach) removes the connection from pool management
///   entirely, for callers that detect a broken connection and want it shed.
///
/// Shutting the transport down directly (through the forwarded `AsyncWrite`)
/// and then dropping the handle would recycle a dead connection; the pool
/// does not health-check idle connections, so prefer `release` or `detach`.
pub struct PooledConn<D: Dial> {
    conn: Option<D::Conn>,
    pool: Arc<PoolCore<D>>,
}

impl<D: Dial> PooledConn<D> {
    pub(crate) fn new(conn: D::Conn, pool: Arc<PoolCore<D>>) -> Self {
        Self {
            conn: Some(conn),
            pool,
        }
    }

    fn stream(&self) -> &D::Conn {
        self.conn.as_ref().expect("connection already released")
    }

    fn stream_mut(&mut self) -> &mut D::Conn {
        self.conn.as_mut().expect("connection already released")
    }

    /// Hand the connection back to the pool
    ///
    /// Recycles into the idle store when the pool is open and below capacity.
    /// Otherwise the connection is really closed: its transport is shut down
    /// gracefully and the socket released.
    ///
    /// # Errors
    ///
    /// Returns the shutdown error when a real close fails. The connection is
    /// considered gone either way; bookkeeping is unaffected by the error.
    pub async fn release(mut self) -> io::Result<()> {
        let conn = self.conn.take().expect("connection already released");
        match self.pool.try_recycle(conn) {
            Ok(()) => {
                debug!("connection recycled into idle store");
                Ok(())
            }
            Err(mut conn) => {
                debug!("pool closed or idle store full, really closing connection");
                conn.shutdown().await
            }
        }
    }

    /// Take the raw connection out of pool management
    ///
    /// The pool forgets the connection entirely; the caller owns its
    /// lifecycle from here on. Use this to shed a connection observed to be
    /// broken instead of recycling it.
    #[must_use]
    pub fn detach(mut self) -> D::Conn {
        self.conn.take().expect("connection already released")
    }
}

impl<D: Dial> Drop for PooledConn<D> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take()
            && let Err(conn) = self.pool.try_recycle(conn)
        {
            // No caller to report a close failure to here; dropping the
            // transport releases the socket.
            debug!("dropping connection not accepted by pool");
            drop(conn);
        }
    }
}

impl<D: Dial> fmt::Debug for PooledConn<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConn")
            .field("released", &self.conn.is_none())
            .finish_non_exhaustive()
    }
}

impl<D: Dial> Deref for PooledConn<D> {
    type Target = D::Conn;

    fn deref(&self) -> &Self::Target {
        self.stream()
    }
}

impl<D: Dial> DerefMut for PooledConn<D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.stream_mut()
    }
}

impl<D: Dial> AsyncRead for PooledConn<D> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(self.get_mut().stream_mut()).poll_read(cx, buf)
    }
}

impl<D: Dial> AsyncWrite for PooledConn<D> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(self.get_mut().stream_mut()).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(self.get_mut().stream_mut()).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(self.get_mut().stream_mut()).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::dial::MockDialer;
    use crate::pool::ChannelPool;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, DuplexStream};

    async fn assert_really_closed(mut peer: DuplexStream) {
        let mut buf = [0u8; 1];
        let n = tokio::time::timeout(Duration::from_secs(1), peer.read(&mut buf))
            .await
            .expect("peer read should see EOF, not hang")
            .expect("peer read should not error");
        assert_eq!(n, 0);
    }

    async fn assert_still_open(peer: &mut DuplexStream) {
        let mut buf = [0u8; 1];
        let read = tokio::time::timeout(Duration::from_millis(50), peer.read(&mut buf)).await;
        assert!(read.is_err(), "expected no EOF on a live connection");
    }

    #[tokio::test]
    async fn test_io_forwards_to_underlying_connection() {
        use tokio::io::AsyncWriteExt;

        let dialer = Arc::new(MockDialer::new());
        let pool = ChannelPool::connect(PoolConfig::new(1, 3), Arc::clone(&dialer))
            .await
            .unwrap();
        let mut peer = dialer.take_peers().pop().unwrap();

        let mut conn = pool.get().await.unwrap();
        conn.write_all(b"request").await.unwrap();

        let mut buf = [0u8; 7];
        peer.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"request");

        peer.write_all(b"response").await.unwrap();
        let mut buf = [0u8; 8];
        conn.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"response");
    }

    #[tokio::test]
    async fn test_drop_recycles_into_pool() {
        let pool = ChannelPool::connect(PoolConfig::new(1, 3), MockDialer::new())
            .await
            .unwrap();

        let conn = pool.get().await.unwrap();
        assert_eq!(pool.len(), 0);
        drop(conn);
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn test_release_against_full_store_really_closes() {
        let dialer = Arc::new(MockDialer::new());
        let pool = ChannelPool::connect(PoolConfig::new(0, 1), Arc::clone(&dialer))
            .await
            .unwrap();

        let first = pool.get().await.unwrap();
        let second = pool.get().await.unwrap();
        let mut peers = dialer.take_peers();

        first.release().await.unwrap();
        assert_eq!(pool.len(), 1);

        // Store is at capacity: the second connection must be shed
        second.release().await.unwrap();
        assert_eq!(pool.len(), 1);

        let second_peer = peers.pop().unwrap();
        assert_really_closed(second_peer).await;
        assert_still_open(&mut peers.pop().unwrap()).await;
    }

    #[tokio::test]
    async fn test_release_after_close_really_closes() {
        let dialer = Arc::new(MockDialer::new());
        let pool = ChannelPool::connect(PoolConfig::new(0, 3), Arc::clone(&dialer))
            .await
            .unwrap();

        let conn = pool.get().await.unwrap();
        pool.close().await;

        conn.release().await.unwrap();
        assert_eq!(pool.len(), 0, "must not be re-added after shutdown");
        assert_really_closed(dialer.take_peers().pop().unwrap()).await;
    }

    #[tokio::test]
    async fn test_drop_against_closed_pool_really_closes() {
        let dialer = Arc::new(MockDialer::new());
        let pool = ChannelPool::connect(PoolConfig::new(0, 3), Arc::clone(&dialer))
            .await
            .unwrap();

        let conn = pool.get().await.unwrap();
        pool.close().await;
        drop(conn);

        assert_eq!(pool.len(), 0);
        assert_really_closed(dialer.take_peers().pop().unwrap()).await;
    }

    #[tokio::test]
    async fn test_detach_removes_from_pool_management() {
        let dialer = Arc::new(MockDialer::new());
        let pool = ChannelPool::connect(PoolConfig::new(1, 3), Arc::clone(&dialer))
            .await
            .unwrap();
        let mut peer = dialer.take_peers().pop().unwrap();

        let conn = pool.get().await.unwrap();
        let raw = conn.detach();
        assert_eq!(pool.len(), 0, "detached connection must not be recycled");

        // Caller owns the raw connection now
        assert_still_open(&mut peer).await;
        drop(raw);
        assert_really_closed(peer).await;
    }

    #[tokio::test]
    async fn test_double_close_is_unrepresentable() {
        // release() and detach() consume the handle, so a second close of
        // the same borrow cannot be written. What remains observable is that
        // the drop glue after release() does not recycle a second time.
        let pool = ChannelPool::connect(PoolConfig::new(0, 3), MockDialer::new())
            .await
            .unwrap();

        let conn = pool.get().await.unwrap();
        conn.release().await.unwrap();
        assert_eq!(pool.len(), 1, "exactly one recycle per borrow");
    }
}
