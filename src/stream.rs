//! Stream bound for poolable connections
//!
//! The pool is agnostic to the transport behind a connection (TCP, TLS, Unix
//! socket, in-memory pipe). This module defines the one bound every pooled
//! connection type must satisfy.

use tokio::io::{AsyncRead, AsyncWrite};

/// Marker for async byte streams the pool can hold
///
/// Automatically implemented for any type that is `AsyncRead + AsyncWrite +
/// Unpin + Send`, so concrete transports need no explicit impl. The `Unpin`
/// requirement is what lets the pooled wrapper forward reads and writes
/// without pin projection.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> AsyncStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_transports_satisfy_bound() {
        fn assert_async_stream<T: AsyncStream>() {}
        assert_async_stream::<tokio::net::TcpStream>();
        assert_async_stream::<tokio::io::DuplexStream>();
    }
}
