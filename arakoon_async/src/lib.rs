//! Asynchronous client driver for Arakoon, a replicated, consistent
//! key-value store.
//!
//! `arakoon_async` speaks the same wire protocol as its synchronous sibling
//! `arakoon`, but multiplexes many outstanding requests over a single
//! socket: a background task owns the connection, writes requests as they
//! arrive, and resolves them strictly in submission order as replies come
//! back. `.clone()` is cheap, and concurrent callers never block each other
//! on a mutex the way `arakoon::Connection` does.
//!
//! Every read and write this driver issues is served strictly
//! consistently: it never asks a node for a dirty (non-master) read, even
//! though the wire format would allow it.
//!
//! # Example
//!
//! ```rust,no_run
//! use arakoon_async::{ConnectParams, Connection};
//!
//! # #[tokio::main]
//! # async fn main() -> arakoon_async::ArakoonResult<()> {
//! let params = ConnectParams::builder()
//!     .cluster_id("ricky")
//!     .host("127.0.0.1")
//!     .port(4922)
//!     .client_id("my_app")
//!     .build()?;
//! let conn = Connection::connect(&params).await?;
//! conn.hello("my_app", "ricky").await?;
//! conn.set("key", "value").await?;
//! assert_eq!(conn.get("key").await?.as_ref(), b"value");
//! # Ok(())
//! # }
//! ```
#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

#[macro_use]
extern crate log;

#[cfg(feature = "bb8_pool")]
mod bb8;

mod connection;

#[cfg(feature = "bb8_pool")]
pub use crate::bb8::ConnectionManager;

pub use crate::connection::Connection;

pub use arakoon_impl::{
    ArakoonBytes, ArakoonError, ArakoonResult, ConnectParams, ConnectParamsBuilder,
    ConnectionState, ErrorKind, FieldValue, Statistics, Step, Transaction,
};
