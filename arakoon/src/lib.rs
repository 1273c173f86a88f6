//! Synchronous client driver for Arakoon, a replicated, consistent
//! key-value store.
//!
//! `arakoon` speaks Arakoon's binary TCP wire protocol directly: it frames
//! typed request messages, sends them to a single pre-selected cluster
//! node, and decodes typed responses, including the server's structured
//! error taxonomy. Cluster topology discovery and master failover are
//! treated as external concerns; a caller that gets back a `NotMaster`
//! error reconnects to a different node itself.
//!
//! Every read and write this driver issues is served strictly
//! consistently: it never asks a node for a dirty (non-master) read, even
//! though the wire format would allow it.
//!
//! # Example
//!
//! ```rust,no_run
//! use arakoon::{ConnectParams, Connection};
//!
//! # fn main() -> arakoon::ArakoonResult<()> {
//! let params = ConnectParams::builder()
//!     .cluster_id("ricky")
//!     .host("127.0.0.1")
//!     .port(4922)
//!     .client_id("my_app")
//!     .build()?;
//! let conn = Connection::connect(&params)?;
//! conn.hello("my_app", "ricky")?;
//! conn.set("key", "value")?;
//! assert_eq!(conn.get("key")?.as_ref(), b"value");
//! # Ok(())
//! # }
//! ```
//!
//! For an event-driven client that keeps many requests in flight over one
//! socket at once, see `arakoon_async`.
#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

#[macro_use]
extern crate log;

#[cfg(feature = "r2d2_pool")]
mod r2d2;

#[cfg(feature = "r2d2_pool")]
pub use crate::r2d2::ConnectionManager;

pub use arakoon_impl::{
    ArakoonBytes, ArakoonError, ArakoonResult, ConnectParams, ConnectParamsBuilder,
    ConnectionState, ErrorKind, FieldValue, Statistics, Step, Transaction,
};

use arakoon_impl::blocking;
use arakoon_impl::message::Command;
use arakoon_impl::{
    Assert, Confirm, Delete, DefragDB, DropMaster, Exists, ExpectProgressPossible, Get,
    GetKeyCount, GetStatistics, Hello, KeyRange, MultiGet, OptimizeDB, PrefixKeys, Range,
    RangeEntries, RevRangeEntries, Sequence as SequenceCommand, Set, SyncedSequence, TestAndSet,
    UserFunction, WhoMaster,
};

/// A blocking, mutex-serialized connection to one Arakoon node.
///
/// Every method sends one request and blocks until its reply has been
/// fully decoded. Cloning a `Connection` shares the same socket: concurrent
/// callers queue on an internal mutex for the whole exchange rather than
/// interleave bytes on the wire.
#[derive(Clone, Debug)]
pub struct Connection(blocking::Connection);

impl Connection {
    /// Opens a TCP connection to `params.socket_addr()` and sends the
    /// prologue. Send `hello` next to complete the handshake the
    /// reference client performs before any other request.
    ///
    /// # Errors
    ///
    /// Fails if the TCP connection cannot be established or the prologue
    /// cannot be written.
    pub fn connect(params: &ConnectParams) -> ArakoonResult<Self> {
        blocking::Connection::connect(params).map(Self)
    }

    /// The connection's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.0.state()
    }

    /// Sends `cmd`, always with the dirty-read flag clear: this driver
    /// only ever performs consistent reads.
    fn call<C: Command>(&self, cmd: C) -> ArakoonResult<C::Return> {
        trace!("arakoon call: opcode {:#06x}", C::OPCODE);
        self.0.call(&cmd, false)
    }

    /// Identifies this client to the node and confirms it is talking to
    /// the expected cluster; conventionally the first request sent after
    /// connecting.
    ///
    /// # Errors
    ///
    /// `Server` with kind [`ErrorKind::WrongCluster`] if `cluster_id`
    /// doesn't match the node's; any connection-level error.
    pub fn hello(
        &self,
        client_id: impl Into<ArakoonBytes>,
        cluster_id: impl Into<ArakoonBytes>,
    ) -> ArakoonResult<ArakoonBytes> {
        self.call(Hello::new(client_id, cluster_id))
    }

    /// The node id of the cluster's current master, if one has been
    /// elected.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn who_master(&self) -> ArakoonResult<Option<ArakoonBytes>> {
        self.call(WhoMaster)
    }

    /// Whether `key` is currently bound to a value.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn exists(&self, key: impl Into<ArakoonBytes>) -> ArakoonResult<bool> {
        self.call(Exists::new(key)).map(|b| b.0)
    }

    /// The value currently bound to `key`.
    ///
    /// # Errors
    ///
    /// `Server` with kind [`ErrorKind::NotFound`] if `key` is unbound; any
    /// connection-level error.
    pub fn get(&self, key: impl Into<ArakoonBytes>) -> ArakoonResult<ArakoonBytes> {
        self.call(Get::new(key))
    }

    /// Binds `key` to `value`, overwriting any prior value.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn set(
        &self,
        key: impl Into<ArakoonBytes>,
        value: impl Into<ArakoonBytes>,
    ) -> ArakoonResult<()> {
        self.call(Set::new(key, value)).map(drop)
    }

    /// Unbinds `key`.
    ///
    /// # Errors
    ///
    /// `Server` with kind [`ErrorKind::NotFound`] if `key` is already
    /// unbound; any connection-level error.
    pub fn delete(&self, key: impl Into<ArakoonBytes>) -> ArakoonResult<()> {
        self.call(Delete::new(key)).map(drop)
    }

    /// Every key currently bound whose bytes start with `prefix`.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn prefix(&self, prefix: impl Into<ArakoonBytes>) -> ArakoonResult<Vec<ArakoonBytes>> {
        self.call(PrefixKeys::all(prefix))
    }

    /// Like [`Connection::prefix`], but returns at most `max_elements`
    /// keys (`-1` for unbounded).
    ///
    /// # Errors
    ///
    /// `Validation` if `max_elements` doesn't fit an `Int32`; any
    /// connection-level error.
    pub fn prefix_with_max(
        &self,
        prefix: impl Into<ArakoonBytes>,
        max_elements: i64,
    ) -> ArakoonResult<Vec<ArakoonBytes>> {
        self.call(PrefixKeys::new(prefix, max_elements)?)
    }

    /// If the current value of `key` equals `test_value` (or `key` is
    /// absent and `test_value` is `None`), atomically sets it to
    /// `set_value` (or deletes it, if `set_value` is `None`). Returns the
    /// value that was in place beforehand.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn test_and_set(
        &self,
        key: impl Into<ArakoonBytes>,
        test_value: Option<ArakoonBytes>,
        set_value: Option<ArakoonBytes>,
    ) -> ArakoonResult<Option<ArakoonBytes>> {
        self.call(TestAndSet::new(key, test_value, set_value))
    }

    /// Keys between `begin_key` and `end_key`, ordered, at most
    /// `max_elements` of them (`-1` for unbounded).
    ///
    /// # Errors
    ///
    /// `Validation` if `max_elements` doesn't fit an `Int32`; any
    /// connection-level error.
    pub fn range(
        &self,
        begin_key: Option<ArakoonBytes>,
        begin_inclusive: bool,
        end_key: Option<ArakoonBytes>,
        end_inclusive: bool,
        max_elements: i64,
    ) -> ArakoonResult<Vec<ArakoonBytes>> {
        let range =
            KeyRange::new(begin_key, begin_inclusive, end_key, end_inclusive, max_elements)?;
        self.call(Range(range))
    }

    /// Like [`Connection::range`], but returns `(key, value)` pairs.
    ///
    /// # Errors
    ///
    /// `Validation` if `max_elements` doesn't fit an `Int32`; any
    /// connection-level error.
    pub fn range_entries(
        &self,
        begin_key: Option<ArakoonBytes>,
        begin_inclusive: bool,
        end_key: Option<ArakoonBytes>,
        end_inclusive: bool,
        max_elements: i64,
    ) -> ArakoonResult<Vec<(ArakoonBytes, ArakoonBytes)>> {
        let range =
            KeyRange::new(begin_key, begin_inclusive, end_key, end_inclusive, max_elements)?;
        self.call(RangeEntries(range))
    }

    /// Like [`Connection::range_entries`], but walks the keyspace in
    /// reverse.
    ///
    /// # Errors
    ///
    /// `Validation` if `max_elements` doesn't fit an `Int32`; any
    /// connection-level error.
    pub fn rev_range_entries(
        &self,
        begin_key: Option<ArakoonBytes>,
        begin_inclusive: bool,
        end_key: Option<ArakoonBytes>,
        end_inclusive: bool,
        max_elements: i64,
    ) -> ArakoonResult<Vec<(ArakoonBytes, ArakoonBytes)>> {
        let range =
            KeyRange::new(begin_key, begin_inclusive, end_key, end_inclusive, max_elements)?;
        self.call(RevRangeEntries(range))
    }

    /// The value for each of `keys`, in the order requested.
    ///
    /// # Errors
    ///
    /// `Server` with kind [`ErrorKind::NotFound`] if any key is unbound;
    /// any connection-level error.
    pub fn multi_get(&self, keys: Vec<ArakoonBytes>) -> ArakoonResult<Vec<ArakoonBytes>> {
        self.call(MultiGet::new(keys))
    }

    /// Whether the cluster currently believes it can make progress (has a
    /// master and a reachable majority).
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn expect_progress_possible(&self) -> ArakoonResult<bool> {
        self.call(ExpectProgressPossible).map(|b| b.0)
    }

    /// Total number of keys currently stored in the cluster.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn get_key_count(&self) -> ArakoonResult<u64> {
        self.call(GetKeyCount).map(|v| v.0)
    }

    /// Invokes a server-side registered function by name, passing it
    /// `argument`.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn user_function(
        &self,
        function: impl Into<ArakoonBytes>,
        argument: Option<ArakoonBytes>,
    ) -> ArakoonResult<Option<ArakoonBytes>> {
        self.call(UserFunction::new(function, argument))
    }

    /// Sets `key` to `value`, unless it is already bound to that exact
    /// value, in which case it is a no-op.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn confirm(
        &self,
        key: impl Into<ArakoonBytes>,
        value: impl Into<ArakoonBytes>,
    ) -> ArakoonResult<()> {
        self.call(Confirm::new(key, value)).map(drop)
    }

    /// Fails server-side unless the value currently bound to `key` equals
    /// `value` (or both are absent).
    ///
    /// # Errors
    ///
    /// `Server` with kind [`ErrorKind::AssertionFailed`] on mismatch; any
    /// connection-level error.
    pub fn assert(
        &self,
        key: impl Into<ArakoonBytes>,
        value: Option<ArakoonBytes>,
    ) -> ArakoonResult<()> {
        self.call(Assert::new(key, value)).map(drop)
    }

    /// Arbitrary server-reported counters and gauges.
    ///
    /// # Errors
    ///
    /// `Protocol` if the reply is missing the mandatory `arakoon_stats`
    /// field; any connection-level error.
    pub fn statistics(&self) -> ArakoonResult<Statistics> {
        self.call(GetStatistics)
    }

    /// Runs `steps` as an all-or-nothing transaction, without waiting for
    /// the result to be fsynced.
    ///
    /// # Errors
    ///
    /// `Validation` if any step's key/value fails descriptor validation;
    /// `Server` (e.g. [`ErrorKind::NotFound`] from a `Delete`/`AssertExists`
    /// step on a missing key) if the transaction is rejected, in which
    /// case the store is left unchanged; any connection-level error.
    pub fn sequence(&self, steps: Vec<Step>) -> ArakoonResult<()> {
        self.call(SequenceCommand(Transaction::new(steps))).map(drop)
    }

    /// Like [`Connection::sequence`], but the master fsyncs before
    /// acknowledging.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::sequence`].
    pub fn synced_sequence(&self, steps: Vec<Step>) -> ArakoonResult<()> {
        self.call(SyncedSequence(Transaction::new(steps))).map(drop)
    }

    /// Triggers store optimization on the node this connection is talking
    /// to. Only meaningful against a slave node.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn optimize_db(&self) -> ArakoonResult<()> {
        self.call(OptimizeDB).map(drop)
    }

    /// Triggers store defragmentation on the node this connection is
    /// talking to. Only meaningful against a slave node.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn defrag_db(&self) -> ArakoonResult<()> {
        self.call(DefragDB).map(drop)
    }

    /// Instructs the node to drop its master role, if it currently holds
    /// one. It may regain the role before this call returns; this has no
    /// effect in a single-node cluster.
    ///
    /// # Errors
    ///
    /// Any connection-level error.
    pub fn drop_master(&self) -> ArakoonResult<()> {
        self.call(DropMaster).map(drop)
    }
}
