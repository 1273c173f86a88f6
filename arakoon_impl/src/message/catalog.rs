//! Concrete commands. Opcodes, argument order and `HAS_ALLOW_DIRTY`
//! flags match the Arakoon wire protocol's public, stable command set.
use super::Command;
use crate::codec::{
    ArakoonBytes, Bool, BoolDecoder, Encode, Int32, ListDecoder, OptionDecoder, PairDecoder,
    Statistics, StatisticsDecoder, StringDecoder, Uint64, Uint64Decoder, Unit, UnitDecoder,
};
use crate::error::ArakoonResult;
use crate::sequence::Transaction;

/// `hello(client_id, cluster_id)` — identifies this client to the node
/// and confirms it is talking to the expected cluster. Always the first
/// message sent after the prologue handshake.
#[derive(Clone, Debug, PartialEq)]
pub struct Hello {
    pub client_id: ArakoonBytes,
    pub cluster_id: ArakoonBytes,
}

impl Hello {
    #[must_use]
    pub fn new(client_id: impl Into<ArakoonBytes>, cluster_id: impl Into<ArakoonBytes>) -> Self {
        Self {
            client_id: client_id.into(),
            cluster_id: cluster_id.into(),
        }
    }
}

impl Command for Hello {
    type Return = ArakoonBytes;
    type ReturnDecoder = StringDecoder;
    const OPCODE: u32 = 0x0001;

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.client_id.encode(out);
        self.cluster_id.encode(out);
    }
}

/// `who_master()` — the node id of the cluster's current master, if one
/// has been elected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WhoMaster;

impl Command for WhoMaster {
    type Return = Option<ArakoonBytes>;
    type ReturnDecoder = OptionDecoder<StringDecoder>;
    const OPCODE: u32 = 0x0002;

    fn encode_args(&self, _out: &mut Vec<u8>) {}
}

/// `exists(key)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Exists {
    pub key: ArakoonBytes,
}

impl Exists {
    #[must_use]
    pub fn new(key: impl Into<ArakoonBytes>) -> Self {
        Self { key: key.into() }
    }
}

impl Command for Exists {
    type Return = Bool;
    type ReturnDecoder = BoolDecoder;
    const OPCODE: u32 = 0x0007;
    const HAS_ALLOW_DIRTY: bool = true;

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.key.encode(out);
    }
}

/// `get(key)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Get {
    pub key: ArakoonBytes,
}

impl Get {
    #[must_use]
    pub fn new(key: impl Into<ArakoonBytes>) -> Self {
        Self { key: key.into() }
    }
}

impl Command for Get {
    type Return = ArakoonBytes;
    type ReturnDecoder = StringDecoder;
    const OPCODE: u32 = 0x0008;
    const HAS_ALLOW_DIRTY: bool = true;

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.key.encode(out);
    }
}

/// `set(key, value)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Set {
    pub key: ArakoonBytes,
    pub value: ArakoonBytes,
}

impl Set {
    #[must_use]
    pub fn new(key: impl Into<ArakoonBytes>, value: impl Into<ArakoonBytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Command for Set {
    type Return = Unit;
    type ReturnDecoder = UnitDecoder;
    const OPCODE: u32 = 0x0009;

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.key.encode(out);
        self.value.encode(out);
    }
}

/// `delete(key)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Delete {
    pub key: ArakoonBytes,
}

impl Delete {
    #[must_use]
    pub fn new(key: impl Into<ArakoonBytes>) -> Self {
        Self { key: key.into() }
    }
}

impl Command for Delete {
    type Return = Unit;
    type ReturnDecoder = UnitDecoder;
    const OPCODE: u32 = 0x000a;

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.key.encode(out);
    }
}

/// `prefix(prefix, max_elements)`. A negative `max_elements` (the
/// default, `-1`) returns every matching key.
#[derive(Clone, Debug, PartialEq)]
pub struct PrefixKeys {
    pub prefix: ArakoonBytes,
    pub max_elements: Int32,
}

impl PrefixKeys {
    pub fn new(prefix: impl Into<ArakoonBytes>, max_elements: i64) -> ArakoonResult<Self> {
        Ok(Self {
            prefix: prefix.into(),
            max_elements: Int32::new(max_elements)?,
        })
    }

    #[must_use]
    pub fn all(prefix: impl Into<ArakoonBytes>) -> Self {
        Self {
            prefix: prefix.into(),
            max_elements: Int32(-1),
        }
    }
}

impl Command for PrefixKeys {
    type Return = Vec<ArakoonBytes>;
    type ReturnDecoder = ListDecoder<StringDecoder>;
    const OPCODE: u32 = 0x000c;
    const HAS_ALLOW_DIRTY: bool = true;

    fn validate_args(&self) -> ArakoonResult<()> {
        self.max_elements.validate()
    }

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.prefix.encode(out);
        self.max_elements.encode(out);
    }
}

/// `test_and_set(key, test_value, set_value)`: if the current value for
/// `key` matches `test_value` (or the key is absent and `test_value` is
/// `None`), sets it to `set_value` (or deletes it if `set_value` is
/// `None`). Returns the value that was in place before the operation.
#[derive(Clone, Debug, PartialEq)]
pub struct TestAndSet {
    pub key: ArakoonBytes,
    pub test_value: Option<ArakoonBytes>,
    pub set_value: Option<ArakoonBytes>,
}

impl TestAndSet {
    #[must_use]
    pub fn new(
        key: impl Into<ArakoonBytes>,
        test_value: Option<ArakoonBytes>,
        set_value: Option<ArakoonBytes>,
    ) -> Self {
        Self {
            key: key.into(),
            test_value,
            set_value,
        }
    }
}

impl Command for TestAndSet {
    type Return = Option<ArakoonBytes>;
    type ReturnDecoder = OptionDecoder<StringDecoder>;
    const OPCODE: u32 = 0x000d;

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.key.encode(out);
        self.test_value.encode(out);
        self.set_value.encode(out);
    }
}

/// Shared argument shape of `range`, `range_entries` and
/// `rev_range_entries`.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyRange {
    pub begin_key: Option<ArakoonBytes>,
    pub begin_inclusive: bool,
    pub end_key: Option<ArakoonBytes>,
    pub end_inclusive: bool,
    pub max_elements: Int32,
}

impl KeyRange {
    pub fn new(
        begin_key: Option<ArakoonBytes>,
        begin_inclusive: bool,
        end_key: Option<ArakoonBytes>,
        end_inclusive: bool,
        max_elements: i64,
    ) -> ArakoonResult<Self> {
        Ok(Self {
            begin_key,
            begin_inclusive,
            end_key,
            end_inclusive,
            max_elements: Int32::new(max_elements)?,
        })
    }

    fn encode_fields(&self, out: &mut Vec<u8>) {
        self.begin_key.encode(out);
        Bool(self.begin_inclusive).encode(out);
        self.end_key.encode(out);
        Bool(self.end_inclusive).encode(out);
        self.max_elements.encode(out);
    }
}

/// `range(..)`: keys between `begin_key` and `end_key`.
#[derive(Clone, Debug, PartialEq)]
pub struct Range(pub KeyRange);

impl Command for Range {
    type Return = Vec<ArakoonBytes>;
    type ReturnDecoder = ListDecoder<StringDecoder>;
    const OPCODE: u32 = 0x000b;
    const HAS_ALLOW_DIRTY: bool = true;

    fn validate_args(&self) -> ArakoonResult<()> {
        self.0.max_elements.validate()
    }

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.0.encode_fields(out);
    }
}

/// `range_entries(..)`: `(key, value)` pairs between `begin_key` and
/// `end_key`.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeEntries(pub KeyRange);

impl Command for RangeEntries {
    type Return = Vec<(ArakoonBytes, ArakoonBytes)>;
    type ReturnDecoder = ListDecoder<PairDecoder<StringDecoder, StringDecoder>>;
    const OPCODE: u32 = 0x000f;
    const HAS_ALLOW_DIRTY: bool = true;

    fn validate_args(&self) -> ArakoonResult<()> {
        self.0.max_elements.validate()
    }

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.0.encode_fields(out);
    }
}

/// `rev_range_entries(..)`: like [`RangeEntries`] but walking the
/// keyspace in reverse.
#[derive(Clone, Debug, PartialEq)]
pub struct RevRangeEntries(pub KeyRange);

impl Command for RevRangeEntries {
    type Return = Vec<(ArakoonBytes, ArakoonBytes)>;
    type ReturnDecoder = ListDecoder<PairDecoder<StringDecoder, StringDecoder>>;
    const OPCODE: u32 = 0x0023;
    const HAS_ALLOW_DIRTY: bool = true;

    fn validate_args(&self) -> ArakoonResult<()> {
        self.0.max_elements.validate()
    }

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.0.encode_fields(out);
    }
}

/// `multi_get(keys)`: the values for each key, in the order requested.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiGet {
    pub keys: Vec<ArakoonBytes>,
}

impl MultiGet {
    #[must_use]
    pub fn new(keys: Vec<ArakoonBytes>) -> Self {
        Self { keys }
    }
}

impl Command for MultiGet {
    type Return = Vec<ArakoonBytes>;
    type ReturnDecoder = ListDecoder<StringDecoder>;
    const OPCODE: u32 = 0x0011;
    const HAS_ALLOW_DIRTY: bool = true;

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.keys.encode(out);
    }
}

/// `expect_progress_possible()`: whether the cluster currently believes
/// it can make progress (i.e. has a master and a majority).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpectProgressPossible;

impl Command for ExpectProgressPossible {
    type Return = Bool;
    type ReturnDecoder = BoolDecoder;
    const OPCODE: u32 = 0x0012;

    fn encode_args(&self, _out: &mut Vec<u8>) {}
}

/// `get_key_count()`: total number of keys stored in the cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetKeyCount;

impl Command for GetKeyCount {
    type Return = Uint64;
    type ReturnDecoder = Uint64Decoder;
    const OPCODE: u32 = 0x001a;

    fn encode_args(&self, _out: &mut Vec<u8>) {}
}

/// `user_function(function, argument)`: invokes a server-side registered
/// function by name.
#[derive(Clone, Debug, PartialEq)]
pub struct UserFunction {
    pub function: ArakoonBytes,
    pub argument: Option<ArakoonBytes>,
}

impl UserFunction {
    #[must_use]
    pub fn new(function: impl Into<ArakoonBytes>, argument: Option<ArakoonBytes>) -> Self {
        Self {
            function: function.into(),
            argument,
        }
    }
}

impl Command for UserFunction {
    type Return = Option<ArakoonBytes>;
    type ReturnDecoder = OptionDecoder<StringDecoder>;
    const OPCODE: u32 = 0x0015;

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.function.encode(out);
        self.argument.encode(out);
    }
}

/// `confirm(key, value)`: sets `key` to `value` unless it is already
/// equal, in which case it is a no-op.
#[derive(Clone, Debug, PartialEq)]
pub struct Confirm {
    pub key: ArakoonBytes,
    pub value: ArakoonBytes,
}

impl Confirm {
    #[must_use]
    pub fn new(key: impl Into<ArakoonBytes>, value: impl Into<ArakoonBytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Command for Confirm {
    type Return = Unit;
    type ReturnDecoder = UnitDecoder;
    const OPCODE: u32 = 0x001c;

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.key.encode(out);
        self.value.encode(out);
    }
}

/// `assert_(key, value)`: fails server-side unless the value currently
/// bound to `key` equals `value` (or both are absent).
#[derive(Clone, Debug, PartialEq)]
pub struct Assert {
    pub key: ArakoonBytes,
    pub value: Option<ArakoonBytes>,
}

impl Assert {
    #[must_use]
    pub fn new(key: impl Into<ArakoonBytes>, value: Option<ArakoonBytes>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

impl Command for Assert {
    type Return = Unit;
    type ReturnDecoder = UnitDecoder;
    const OPCODE: u32 = 0x0016;
    const HAS_ALLOW_DIRTY: bool = true;

    fn encode_args(&self, out: &mut Vec<u8>) {
        self.key.encode(out);
        self.value.encode(out);
    }
}

/// `statistics()`: arbitrary server-reported counters and gauges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetStatistics;

impl Command for GetStatistics {
    type Return = Statistics;
    type ReturnDecoder = StatisticsDecoder;
    const OPCODE: u32 = 0x0013;

    fn encode_args(&self, _out: &mut Vec<u8>) {}
}

fn encode_transaction_arg(transaction: &Transaction, out: &mut Vec<u8>) {
    let mut inner = Vec::new();
    transaction.encode(&mut inner);
    ArakoonBytes(inner).encode(out);
}

/// `sequence(steps)`: runs `steps` as an all-or-nothing transaction,
/// without waiting for the result to be fsynced.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence(pub Transaction);

impl Command for Sequence {
    type Return = Unit;
    type ReturnDecoder = UnitDecoder;
    const OPCODE: u32 = 0x0010;

    fn validate_args(&self) -> ArakoonResult<()> {
        self.0.validate()
    }

    fn encode_args(&self, out: &mut Vec<u8>) {
        encode_transaction_arg(&self.0, out);
    }
}

/// `synced_sequence(steps)`: like [`Sequence`], but the master fsyncs
/// before acknowledging.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncedSequence(pub Transaction);

impl Command for SyncedSequence {
    type Return = Unit;
    type ReturnDecoder = UnitDecoder;
    const OPCODE: u32 = 0x0024;

    fn validate_args(&self) -> ArakoonResult<()> {
        self.0.validate()
    }

    fn encode_args(&self, out: &mut Vec<u8>) {
        encode_transaction_arg(&self.0, out);
    }
}

/// `optimize_db()`: triggers store optimization on the node the command is
/// sent to. Only meaningful against a slave node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptimizeDB;

impl Command for OptimizeDB {
    type Return = Unit;
    type ReturnDecoder = UnitDecoder;
    const OPCODE: u32 = 0x0025;

    fn encode_args(&self, _out: &mut Vec<u8>) {}
}

/// `defrag_db()`: triggers store defragmentation on the node the command
/// is sent to. Only meaningful against a slave node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefragDB;

impl Command for DefragDB {
    type Return = Unit;
    type ReturnDecoder = UnitDecoder;
    const OPCODE: u32 = 0x0026;

    fn encode_args(&self, _out: &mut Vec<u8>) {}
}

/// `drop_master()`: instructs a node to drop its master role, if it
/// currently holds one. The node may regain the role before the call
/// returns; this does not work in a single-node cluster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DropMaster;

impl Command for DropMaster {
    type Return = Unit;
    type ReturnDecoder = UnitDecoder;
    const OPCODE: u32 = 0x0030;

    fn encode_args(&self, _out: &mut Vec<u8>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::encode_request;

    #[test]
    fn hello_encodes_tag_then_two_strings() {
        let cmd = Hello::new("client", "cluster");
        let bytes = encode_request(&cmd, false).unwrap();
        assert_eq!(&bytes[0..4], &(0x0001 | super::MASK).to_le_bytes());
    }

    #[test]
    fn exists_carries_allow_dirty_flag_right_after_the_tag() {
        let cmd = Exists::new("k");
        let dirty = encode_request(&cmd, true).unwrap();
        let clean = encode_request(&cmd, false).unwrap();
        assert_eq!(dirty[4], 1);
        assert_eq!(clean[4], 0);
    }

    #[test]
    fn set_has_no_allow_dirty_byte() {
        let cmd = Set::new("k", "v");
        let bytes = encode_request(&cmd, false).unwrap();
        // tag(4) + key len-prefix(4) immediately, no extra flag byte.
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
    }

    #[test]
    fn prefix_keys_rejects_out_of_range_max_elements() {
        let err = PrefixKeys::new("p", i64::from(i32::MAX) + 1);
        assert!(err.is_err());
    }

    #[test]
    fn sequence_wraps_transaction_bytes_in_a_string() {
        let tx = Transaction::new(vec![]);
        let mut raw_tx = Vec::new();
        tx.encode(&mut raw_tx);

        let cmd = Sequence(tx);
        let bytes = encode_request(&cmd, false).unwrap();
        // tag(4) + outer string length(4) + raw_tx bytes.
        assert_eq!(&bytes[4..8], &(raw_tx.len() as u32).to_le_bytes());
        assert_eq!(&bytes[8..], &raw_tx[..]);
    }

    #[test]
    fn synced_sequence_uses_its_own_opcode() {
        assert_ne!(Sequence::OPCODE, SyncedSequence::OPCODE);
    }

    #[test]
    fn admin_commands_carry_no_arguments() {
        assert_eq!(encode_request(&OptimizeDB, false).unwrap().len(), 4);
        assert_eq!(encode_request(&DefragDB, false).unwrap().len(), 4);
        assert_eq!(encode_request(&DropMaster, false).unwrap().len(), 4);
    }
}
