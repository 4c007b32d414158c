//! Tuned TCP dialer
//!
//! Builds TCP connections with socket options suited to pooled, long-lived
//! streams: enlarged buffers, keepalive probing to detect connections the
//! remote end idled out, and Nagle disabled for request/response latency.

use anyhow::Result;
use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tracing::debug;

use super::Dial;

/// Socket buffer sizes for pooled connections (1MB each)
const RECV_BUFFER_SIZE: usize = 1024 * 1024;
const SEND_BUFFER_SIZE: usize = 1024 * 1024;

/// Keepalive: start probing after 60s idle, probe every 10s
const KEEPALIVE_IDLE: std::time::Duration = std::time::Duration::from_secs(60);
const KEEPALIVE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);

/// Dialer producing tuned TCP connections to one fixed remote address
///
/// # Examples
///
/// ```no_run
/// use stream_pool::{ChannelPool, PoolConfig, TcpDialer};
///
/// # async fn example() -> anyhow::Result<()> {
/// let dialer = TcpDialer::new("127.0.0.1", 7000);
/// let pool = ChannelPool::connect(PoolConfig::default(), dialer).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TcpDialer {
    host: String,
    port: u16,
}

impl TcpDialer {
    /// Create a dialer for the given remote endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The remote host this dialer connects to
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The remote port this dialer connects to
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve the endpoint and open a tuned TCP connection
    async fn create_tuned_tcp_stream(&self) -> Result<TcpStream> {
        let addr = format!("{}:{}", self.host, self.port);
        let socket_addrs: Vec<SocketAddr> = tokio::net::lookup_host(&addr).await?.collect();

        let socket_addr = *socket_addrs
            .first()
            .ok_or_else(|| anyhow::anyhow!("No addresses found for {}", addr))?;

        let domain = if socket_addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

        // Sized for pooled connections: large enough for bulk responses
        // without exhausting memory across a full pool.
        socket.set_recv_buffer_size(RECV_BUFFER_SIZE)?;
        socket.set_send_buffer_size(SEND_BUFFER_SIZE)?;

        // Keepalive catches connections the backend idled out while they sat
        // in the idle store.
        socket.set_keepalive(true)?;
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(KEEPALIVE_IDLE)
            .with_interval(KEEPALIVE_INTERVAL);
        socket.set_tcp_keepalive(&keepalive)?;

        // Low latency for request/response exchanges
        socket.set_nodelay(true)?;

        socket.set_reuse_address(true)?;

        socket.connect(&socket_addr.into())?;

        let std_stream: std::net::TcpStream = socket.into();
        std_stream.set_nonblocking(true)?;
        let stream = TcpStream::from_std(std_stream)?;

        Ok(stream)
    }
}

#[async_trait]
impl Dial for TcpDialer {
    type Conn = TcpStream;

    async fn dial(&self) -> Result<TcpStream> {
        debug!(host = %self.host, port = self.port, "dialing backend");
        self.create_tuned_tcp_stream().await
    }
}
