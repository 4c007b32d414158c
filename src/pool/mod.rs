//! Channel-pool engine and pooled-connection wrapper
//!
//! [`ChannelPool`] owns the bounded idle store and the dial/recycle/shutdown
//! lifecycle; [`PooledConn`] is the handle a borrower holds, whose release
//! recycles the connection instead of terminating it.

mod channel;
mod connection;

pub use channel::ChannelPool;
pub use connection::PooledConn;

pub(crate) use channel::PoolCore;
