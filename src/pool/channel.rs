//! Core channel-pool engine
//!
//! One lock guards the idle store together with the lifecycle flag, so borrow,
//! release, and shutdown always observe a consistent occupancy. Dialing
//! happens outside that lock: it can block on I/O indefinitely and must not
//! stall unrelated borrows or releases.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::dial::Dial;
use crate::error::PoolError;
use crate::pool::connection::PooledConn;
use crate::types::{DialedConnections, IdleConnections, MaxIdleConnections, PoolStatus};

/// Idle store plus lifecycle flag
///
/// The two live under one lock: a release racing a shutdown must observe
/// either the open store (and recycle) or the closed store (and really
/// close), never a mixture.
struct IdleStore<C> {
    conns: VecDeque<C>,
    closed: bool,
}

/// Shared pool state, held by the pool handle and by every borrowed
/// connection's back-reference
pub(crate) struct PoolCore<D: Dial> {
    dialer: D,
    max_idle: usize,
    idle: Mutex<IdleStore<D::Conn>>,
    /// Lifetime dial total for status reporting; orthogonal to the idle
    /// store, so it gets its own (lock-free) synchronization.
    dialed: AtomicUsize,
}

impl<D: Dial> PoolCore<D> {
    fn lock_idle(&self) -> MutexGuard<'_, IdleStore<D::Conn>> {
        // A panic while holding this lock can only poison a store we are
        // about to overwrite or drain; continue with the data as-is.
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide the fate of a returned connection
    ///
    /// Accepts it into the idle store while the pool is open and below
    /// capacity. Otherwise hands it back via `Err` for the caller to really
    /// close: this is how overflow connections are shed and how borrowed
    /// connections die after shutdown.
    pub(crate) fn try_recycle(&self, conn: D::Conn) -> Result<(), D::Conn> {
        let mut store = self.lock_idle();
        if store.closed || store.conns.len() >= self.max_idle {
            return Err(conn);
        }
        store.conns.push_back(conn);
        Ok(())
    }
}

/// Bounded, growable pool of live connections to one remote endpoint
///
/// Cheap to clone; all clones share the same idle store. Borrow with
/// [`get`](Self::get), hand back by releasing (or dropping) the returned
/// [`PooledConn`], and tear down with [`close`](Self::close).
///
/// The pool never blocks a borrower waiting for capacity: when the idle store
/// is empty it dials a fresh connection, even if that temporarily puts more
/// connections in flight than `max_idle`. The surplus is shed when those
/// connections are released against a full store.
pub struct ChannelPool<D: Dial> {
    core: Arc<PoolCore<D>>,
}

impl<D: Dial> Clone for ChannelPool<D> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<D: Dial> fmt::Debug for ChannelPool<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.core.lock_idle();
        f.debug_struct("ChannelPool")
            .field("idle", &store.conns.len())
            .field("max_idle", &self.core.max_idle)
            .field("closed", &store.closed)
            .finish()
    }
}

impl<D: Dial> ChannelPool<D> {
    /// Construct a pool and dial its initial connections
    ///
    /// Dials `config.initial_connections` connections before returning. If
    /// any of those dials fails, the whole construction fails: connections
    /// established so far are really closed and the dial error is returned.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] for unusable sizes,
    /// [`PoolError::Dial`] when the initial fill cannot complete.
    pub async fn connect(config: PoolConfig, dialer: D) -> Result<Self, PoolError> {
        config.validate()?;

        let core = Arc::new(PoolCore {
            dialer,
            max_idle: config.max_idle,
            idle: Mutex::new(IdleStore {
                conns: VecDeque::with_capacity(config.max_idle),
                closed: false,
            }),
            dialed: AtomicUsize::new(0),
        });

        let mut warmed: Vec<D::Conn> = Vec::with_capacity(config.initial_connections);
        for n in 0..config.initial_connections {
            match core.dialer.dial().await {
                Ok(conn) => {
                    core.dialed.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        established = n + 1,
                        total = config.initial_connections,
                        "pre-warmed connection"
                    );
                    warmed.push(conn);
                }
                Err(e) => {
                    // Abort without leaking: every connection dialed so far
                    // is really closed before the error is surfaced.
                    for mut conn in warmed {
                        if let Err(close_err) = conn.shutdown().await {
                            debug!(error = %close_err, "error closing pre-warmed connection");
                        }
                    }
                    return Err(PoolError::Dial(e));
                }
            }
        }

        core.lock_idle().conns.extend(warmed);
        info!(
            initial = config.initial_connections,
            max_idle = config.max_idle,
            "connection pool ready"
        );

        Ok(Self { core })
    }

    /// Borrow a connection
    ///
    /// Serves from the idle store when it is non-empty; otherwise dials a
    /// fresh connection. Never waits for a slot to free up. Each caller
    /// receives a distinct connection.
    ///
    /// # Errors
    ///
    /// [`PoolError::Closed`] after [`close`](Self::close),
    /// [`PoolError::Dial`] when the idle store is empty and dialing fails
    /// (pool state is unaffected).
    pub async fn get(&self) -> Result<PooledConn<D>, PoolError> {
        {
            let mut store = self.core.lock_idle();
            if store.closed {
                return Err(PoolError::Closed);
            }
            if let Some(conn) = store.conns.pop_front() {
                debug!(idle = store.conns.len(), "reusing idle connection");
                return Ok(PooledConn::new(conn, Arc::clone(&self.core)));
            }
        }

        // Idle store empty: dial outside the lock. Concurrent borrowers may
        // push the in-flight total past max_idle; the idle store itself
        // never grows past it.
        let conn = self.core.dialer.dial().await.map_err(PoolError::Dial)?;
        self.core.dialed.fetch_add(1, Ordering::Relaxed);
        debug!("idle store empty, dialed fresh connection");
        Ok(PooledConn::new(conn, Arc::clone(&self.core)))
    }

    /// Current idle-store occupancy
    ///
    /// A linearizable snapshot: always within `[0, max_idle]`, and safe to
    /// call concurrently with borrows and releases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.lock_idle().conns.len()
    }

    /// Whether the idle store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the pool has been shut down
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.core.lock_idle().closed
    }

    /// Configured idle-store capacity
    #[must_use]
    pub fn max_idle(&self) -> usize {
        self.core.max_idle
    }

    /// Snapshot of pool occupancy for monitoring
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            available: IdleConnections::new(self.len()),
            max_idle: MaxIdleConnections::new(self.core.max_idle),
            dialed: DialedConnections::new(self.core.dialed.load(Ordering::Relaxed)),
        }
    }

    /// Shut the pool down
    ///
    /// Marks the pool closed, then drains the idle store and really closes
    /// every connection found there. Borrowed connections are unaffected
    /// until their next release, which will really close them. Idempotent:
    /// a second call finds the store already closed and empty.
    pub async fn close(&self) {
        let drained: Vec<D::Conn> = {
            let mut store = self.core.lock_idle();
            store.closed = true;
            store.conns.drain(..).collect()
        };

        info!(drained = drained.len(), "closing connection pool");
        for mut conn in drained {
            if let Err(e) = conn.shutdown().await {
                warn!(error = %e, "error closing idle connection during shutdown");
            }
        }
    }
}
