//! Dial instrumentation
//!
//! The pool engine has no built-in notion of counting; observability is
//! layered onto the dial boundary instead. [`InstrumentedDialer`] wraps any
//! dialer and notifies a [`DialObserver`] once per successful dial, which is
//! enough to verify that recycling actually avoids dials.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;

use super::Dial;

/// Observer notified once per successful dial
///
/// Invoked after the transport is established and before the connection is
/// handed out. Never invoked for failed dials. Implementations must be safe
/// to call from concurrent dial attempts; any state they keep is guarded by
/// their own lock, independent of pool state.
pub trait DialObserver: Send + Sync {
    /// A dial succeeded
    fn connection_dialed(&self);
}

/// Mutex-guarded dial counter
///
/// The standard observer for tests and monitoring: counts successful dials so
/// callers can assert the pool reuses recycled connections instead of dialing
/// fresh ones.
#[derive(Debug, Default)]
pub struct DialCounter {
    count: Mutex<u64>,
}

impl DialCounter {
    /// Create a counter starting at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful dials observed so far
    #[must_use]
    pub fn count(&self) -> u64 {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DialObserver for DialCounter {
    fn connection_dialed(&self) {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }
}

/// Wraps a dialer, notifying an observer on each successful dial
///
/// Failures pass through unmodified and leave the observer untouched.
pub struct InstrumentedDialer<D> {
    inner: D,
    observer: Arc<dyn DialObserver>,
}

impl<D> InstrumentedDialer<D> {
    /// Wrap `inner`, reporting successful dials to `observer`
    pub fn new(inner: D, observer: Arc<dyn DialObserver>) -> Self {
        Self { inner, observer }
    }
}

impl<D: fmt::Debug> fmt::Debug for InstrumentedDialer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentedDialer")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<D: Dial> Dial for InstrumentedDialer<D> {
    type Conn = D::Conn;

    async fn dial(&self) -> Result<D::Conn> {
        let conn = self.inner.dial().await?;
        self.observer.connection_dialed();
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dial::MockDialer;

    #[tokio::test]
    async fn test_counter_increments_on_success() {
        let counter = Arc::new(DialCounter::new());
        let observer: Arc<dyn DialObserver> = counter.clone();
        let dialer = InstrumentedDialer::new(MockDialer::new(), observer);

        assert_eq!(counter.count(), 0);
        let _conn = dialer.dial().await.unwrap();
        assert_eq!(counter.count(), 1);
        let _conn = dialer.dial().await.unwrap();
        assert_eq!(counter.count(), 2);
    }

    #[tokio::test]
    async fn test_counter_untouched_on_failure() {
        let counter = Arc::new(DialCounter::new());
        let observer: Arc<dyn DialObserver> = counter.clone();
        let dialer = InstrumentedDialer::new(MockDialer::new().with_failure_after(0), observer);

        let err = dialer.dial().await.unwrap_err();
        assert!(err.to_string().contains("mock dial refused"));
        assert_eq!(counter.count(), 0);
    }

    #[tokio::test]
    async fn test_error_passes_through_unmodified() {
        let counter = Arc::new(DialCounter::new());
        let inner = MockDialer::new().with_failure_after(0);
        let direct_err = inner.dial().await.unwrap_err().to_string();

        let dialer = InstrumentedDialer::new(MockDialer::new().with_failure_after(0), counter);
        let wrapped_err = dialer.dial().await.unwrap_err().to_string();
        assert_eq!(direct_err, wrapped_err);
    }

    #[tokio::test]
    async fn test_concurrent_dials_all_counted() {
        let counter = Arc::new(DialCounter::new());
        let observer: Arc<dyn DialObserver> = counter.clone();
        let dialer = Arc::new(InstrumentedDialer::new(MockDialer::new(), observer));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let dialer = Arc::clone(&dialer);
                tokio::spawn(async move { dialer.dial().await.map(|_| ()) })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(counter.count(), 16);
    }
}
