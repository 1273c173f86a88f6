//! Connection pooling with r2d2.

use crate::{ArakoonError, ConnectParams, Connection};

/// Implementation of r2d2's
/// [`ManageConnection`](https://docs.rs/r2d2/*/r2d2/trait.ManageConnection.html).
///
/// ## Example
///
/// ```rust,no_run
/// use arakoon::{ConnectParams, ConnectionManager};
///
/// # use arakoon::ArakoonResult;
/// # fn foo() -> ArakoonResult<()> {
/// let params = ConnectParams::builder()
///     .cluster_id("ricky")
///     .host("127.0.0.1")
///     .port(4922)
///     .build()?;
/// let pool = r2d2::Pool::builder()
///     .max_size(15)
///     .build(ConnectionManager::new(params))
///     .unwrap();
///
/// let conn = pool.get().unwrap();
/// conn.get_key_count()?;
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

impl r2d2::ManageConnection for ConnectionManager {
    type Connection = Connection;
    type Error = ArakoonError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        trace!("ConnectionManager::connect()");
        Connection::connect(&self.connect_params)
    }

    /// A lightweight, read-only liveness probe: unlike a SQL idle-check,
    /// `expect_progress_possible` round-trips through the node without
    /// touching the keyspace.
    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        trace!("ConnectionManager::is_valid()");
        conn.expect_progress_possible().map(|_| ())
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        trace!("ConnectionManager::has_broken()");
        conn.state() != crate::ConnectionState::Connected
    }
}
