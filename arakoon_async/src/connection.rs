use arakoon_impl::message::Command;
use arakoon_impl::pipelined;
use arakoon_impl::{
    Assert, Confirm, DefragDB, Delete, DropMaster, Exists, ExpectProgressPossible, Get,
    GetKeyCount, GetStatistics, Hello, KeyRange, MultiGet, OptimizeDB, PrefixKeys, Range,
    RangeEntries, RevRangeEntries, Sequence as SequenceCommand, Set, SyncedSequence, TestAndSet,
    UserFunction, WhoMaster,
};

use crate::{
    ArakoonBytes, ArakoonResult, ConnectParams, ConnectionState, Statistics, Step, Transaction,
};

/// A pipelined, async connection to one Arakoon node.
///
/// Cloning a `Connection` shares the same background task and socket:
/// many calls may be outstanding at once, each resolved in the order it
/// was submitted, so concurrent callers never block each other on a
/// mutex the way the blocking `arakoon::Connection` does.
///
/// # Example
///
/// ```rust,no_run
/// use arakoon_async::{ConnectParams, Connection};
///
/// # #[tokio::main]
/// # async fn main() -> arakoon_async::ArakoonResult<()> {
/// let params = ConnectParams::builder()
///     .cluster_id("ricky")
///     .host("127.0.0.1")
///     .port(4922)
///     .client_id("my_app")
///     .build()?;
/// let conn = Connection::connect(&params).await?;
/// conn.hello("my_app", "ricky").await?;
/// conn.set("key", "value").await?;
/// assert_eq!(conn.get("key").await?.as_ref(), b"value");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Connection(pipelined::Connection);

impl Connection {
    /// Opens a TCP connection to `params.socket_addr()`, sends the
    /// prologue, and spawns the background task that drives the socket.
    ///
    /// # Errors
    ///
    /// Fails if the TCP connection cannot be established or the prologue
    /// cannot be written.
    pub async fn connect(params: &ConnectParams) -> ArakoonResult<Self> {
        pipelined::Connection::connect(params).await.map(Self)
    }

    /// The connection's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.0.state()
    }

    /// Sends `cmd`, always with the dirty-read flag clear: this driver
    /// only ever performs consistent reads.
    async fn call<C>(&self, cmd: C) -> ArakoonResult<C::Return>
    where
        C: Command,
        C::Return: Send + 'static,
        C::ReturnDecoder: Send + 'static,
    {
        trace!("arakoon call: opcode {:#06x}", C::OPCODE);
        self.0.call(&cmd, false).await
    }

    /// Identifies this client to the node and confirms it is talking to
    /// the expected cluster; conventionally the first request sent after
    /// connecting.
    ///
    /// # Errors
    ///
    /// `Server` with kind `WrongCluster` if `cluster_id` doesn't match the
    /// node's; any connection-level error.
    pub async fn hello(
        &self,
        client_id: impl Into<ArakoonBytes>,
        cluster_id: impl Into<ArakoonBytes>,
    ) -> ArakoonResult<ArakoonBytes> {
        self.call(Hello::new(client_id, cluster_id)).await
    }

    /// The node id of the cluster's current master, if one has been
    /// elected.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn who_master(&self) -> ArakoonResult<Option<ArakoonBytes>> {
        self.call(WhoMaster).await
    }

    /// Whether `key` is currently bound to a value.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn exists(&self, key: impl Into<ArakoonBytes>) -> ArakoonResult<bool> {
        self.call(Exists::new(key)).await.map(|b| b.0)
    }

    /// The value currently bound to `key`.
    ///
    /// # Errors
    ///
    /// `Server` with kind `NotFound` if `key` is unbound; any
    /// connection-level error.
    pub async fn get(&self, key: impl Into<ArakoonBytes>) -> ArakoonResult<ArakoonBytes> {
        self.call(Get::new(key)).await
    }

    /// Binds `key` to `value`, overwriting any prior value.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn set(
        &self,
        key: impl Into<ArakoonBytes>,
        value: impl Into<ArakoonBytes>,
    ) -> ArakoonResult<()> {
        self.call(Set::new(key, value)).await.map(drop)
    }

    /// Unbinds `key`.
    ///
    /// # Errors
    ///
    /// `Server` with kind `NotFound` if `key` is already unbound; any
    /// connection-level error.
    pub async fn delete(&self, key: impl Into<ArakoonBytes>) -> ArakoonResult<()> {
        self.call(Delete::new(key)).await.map(drop)
    }

    /// Every key currently bound whose bytes start with `prefix`.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn prefix(
        &self,
        prefix: impl Into<ArakoonBytes>,
    ) -> ArakoonResult<Vec<ArakoonBytes>> {
        self.call(PrefixKeys::all(prefix)).await
    }

    /// Like [`Connection::prefix`], but returns at most `max_elements`
    /// keys (`-1` for unbounded).
    ///
    /// # Errors
    ///
    /// `Validation` if `max_elements` doesn't fit an `Int32`; any
    /// connection-level error.
    pub async fn prefix_with_max(
        &self,
        prefix: impl Into<ArakoonBytes>,
        max_elements: i64,
    ) -> ArakoonResult<Vec<ArakoonBytes>> {
        self.call(PrefixKeys::new(prefix, max_elements)?).await
    }

    /// If the current value of `key` equals `test_value` (or `key` is
    /// absent and `test_value` is `None`), atomically sets it to
    /// `set_value` (or deletes it, if `set_value` is `None`). Returns the
    /// value that was in place beforehand.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn test_and_set(
        &self,
        key: impl Into<ArakoonBytes>,
        test_value: Option<ArakoonBytes>,
        set_value: Option<ArakoonBytes>,
    ) -> ArakoonResult<Option<ArakoonBytes>> {
        self.call(TestAndSet::new(key, test_value, set_value)).await
    }

    /// Keys between `begin_key` and `end_key`, ordered, at most
    /// `max_elements` of them (`-1` for unbounded).
    ///
    /// # Errors
    ///
    /// `Validation` if `max_elements` doesn't fit an `Int32`; any
    /// connection-level error.
    pub async fn range(
        &self,
        begin_key: Option<ArakoonBytes>,
        begin_inclusive: bool,
        end_key: Option<ArakoonBytes>,
        end_inclusive: bool,
        max_elements: i64,
    ) -> ArakoonResult<Vec<ArakoonBytes>> {
        let range =
            KeyRange::new(begin_key, begin_inclusive, end_key, end_inclusive, max_elements)?;
        self.call(Range(range)).await
    }

    /// Like [`Connection::range`], but returns `(key, value)` pairs.
    ///
    /// # Errors
    ///
    /// `Validation` if `max_elements` doesn't fit an `Int32`; any
    /// connection-level error.
    pub async fn range_entries(
        &self,
        begin_key: Option<ArakoonBytes>,
        begin_inclusive: bool,
        end_key: Option<ArakoonBytes>,
        end_inclusive: bool,
        max_elements: i64,
    ) -> ArakoonResult<Vec<(ArakoonBytes, ArakoonBytes)>> {
        let range =
            KeyRange::new(begin_key, begin_inclusive, end_key, end_inclusive, max_elements)?;
        self.call(RangeEntries(range)).await
    }

    /// Like [`Connection::range_entries`], but walks the keyspace in
    /// reverse.
    ///
    /// # Errors
    ///
    /// `Validation` if `max_elements` doesn't fit an `Int32`; any
    /// connection-level error.
    pub async fn rev_range_entries(
        &self,
        begin_key: Option<ArakoonBytes>,
        begin_inclusive: bool,
        end_key: Option<ArakoonBytes>,
        end_inclusive: bool,
        max_elements: i64,
    ) -> ArakoonResult<Vec<(ArakoonBytes, ArakoonBytes)>> {
        let range =
            KeyRange::new(begin_key, begin_inclusive, end_key, end_inclusive, max_elements)?;
        self.call(RevRangeEntries(range)).await
    }

    /// The value for each of `keys`, in the order requested.
    ///
    /// # Errors
    ///
    /// `Server` with kind `NotFound` if any key is unbound; any
    /// connection-level error.
    pub async fn multi_get(&self, keys: Vec<ArakoonBytes>) -> ArakoonResult<Vec<ArakoonBytes>> {
        self.call(MultiGet::new(keys)).await
    }

    /// Whether the cluster currently believes it can make progress (has a
    /// master and a reachable majority).
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn expect_progress_possible(&self) -> ArakoonResult<bool> {
        self.call(ExpectProgressPossible).await.map(|b| b.0)
    }

    /// Total number of keys currently stored in the cluster.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn get_key_count(&self) -> ArakoonResult<u64> {
        self.call(GetKeyCount).await.map(|v| v.0)
    }

    /// Invokes a server-side registered function by name, passing it
    /// `argument`.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn user_function(
        &self,
        function: impl Into<ArakoonBytes>,
        argument: Option<ArakoonBytes>,
    ) -> ArakoonResult<Option<ArakoonBytes>> {
        self.call(UserFunction::new(function, argument)).await
    }

    /// Sets `key` to `value`, unless it is already bound to that exact
    /// value, in which case it is a no-op.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn confirm(
        &self,
        key: impl Into<ArakoonBytes>,
        value: impl Into<ArakoonBytes>,
    ) -> ArakoonResult<()> {
        self.call(Confirm::new(key, value)).await.map(drop)
    }

    /// Fails server-side unless the value currently bound to `key` equals
    /// `value` (or both are absent).
    ///
    /// # Errors
    ///
    /// `Server` with kind `AssertionFailed` on mismatch; any
    /// connection-level error.
    pub async fn assert(
        &self,
        key: impl Into<ArakoonBytes>,
        value: Option<ArakoonBytes>,
    ) -> ArakoonResult<()> {
        self.call(Assert::new(key, value)).await.map(drop)
    }

    /// Arbitrary server-reported counters and gauges.
    ///
    /// # Errors
    ///
    /// `Protocol` if the reply is missing the mandatory `arakoon_stats`
    /// field; any connection-level error.
    pub async fn statistics(&self) -> ArakoonResult<Statistics> {
        self.call(GetStatistics).await
    }

    /// Runs `steps` as an all-or-nothing transaction, without waiting for
    /// the result to be fsynced.
    ///
    /// # Errors
    ///
    /// `Validation` if any step's key/value fails descriptor validation;
    /// `Server` if the transaction is rejected, in which case the store is
    /// left unchanged; any connection-level error.
    pub async fn sequence(&self, steps: Vec<Step>) -> ArakoonResult<()> {
        self.call(SequenceCommand(Transaction::new(steps)))
            .await
            .map(drop)
    }

    /// Like [`Connection::sequence`], but the master fsyncs before
    /// acknowledging.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::sequence`].
    pub async fn synced_sequence(&self, steps: Vec<Step>) -> ArakoonResult<()> {
        self.call(SyncedSequence(Transaction::new(steps)))
            .await
            .map(drop)
    }

    /// Triggers store optimization on the node this connection is talking
    /// to. Only meaningful against a slave node.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn optimize_db(&self) -> ArakoonResult<()> {
        self.call(OptimizeDB).await.map(drop)
    }

    /// Triggers store defragmentation on the node this connection is
    /// talking to. Only meaningful against a slave node.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn defrag_db(&self) -> ArakoonResult<()> {
        self.call(DefragDB).await.map(drop)
    }

    /// Instructs the node to drop its master role, if it currently holds
    /// one. It may regain the role before this call returns; this has no
    /// effect in a single-node cluster.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub async fn drop_master(&self) -> ArakoonResult<()> {
        self.call(DropMaster).await.map(drop)
    }
}
