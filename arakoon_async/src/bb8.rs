//! Connection pooling with bb8.

use crate::{ArakoonError, ConnectParams, Connection};
use async_trait::async_trait;
use bb8::ManageConnection;

/// Implementation of bb8's
/// [`ManageConnection`](https://docs.rs/bb8/latest/bb8/trait.ManageConnection.html).
///
/// ## Example
///
/// ```rust,no_run
/// use bb8::Pool;
/// use arakoon_async::{ConnectParams, ConnectionManager};
///
/// # use arakoon_async::ArakoonResult;
/// # async fn foo() -> ArakoonResult<()> {
/// let params = ConnectParams::builder()
///     .cluster_id("ricky")
///     .host("127.0.0.1")
///     .port(4922)
///     .build()?;
/// let pool = Pool::builder()
///     .max_size(15)
///     .build(ConnectionManager::new(params))
///     .await
///     .unwrap();
///
/// let conn = pool.get().await.unwrap();
/// conn.get_key_count().await?;
/// # Ok(())}
/// ```
#[derive(Clone, Debug)]
pub struct ConnectionManager {
    connect_params: ConnectParams,
}

impl ConnectionManager {
    /// Creates a new `ConnectionManager` that opens connections with
    /// `connect_params`.
    #[must_use]
    pub fn new(connect_params: ConnectParams) -> Self {
        Self { connect_params }
    }
}

#[async_trait]
impl ManageConnection for ConnectionManager {
    type Connection = Connection;
    type Error = ArakoonError;

    async fn connect(&self) -> Result<Self::Connection, Self::Error> {
        trace!("ConnectionManager::connect()");
        Connection::connect(&self.connect_params).await
    }

    /// A lightweight, read-only liveness probe: unlike a SQL idle-check,
    /// `expect_progress_possible` round-trips through the node without
    /// touching the keyspace.
    async fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        trace!("ConnectionManager::is_valid()");
        conn.expect_progress_possible().await.map(|_| ())
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        trace!("ConnectionManager::has_broken()");
        conn.state() != crate::ConnectionState::Connected
    }
}
