//! Connection lifecycle (C7): parameters, the prologue handshake, and the
//! `Disconnected -> Connected -> Faulted` state machine shared by the
//! blocking and pipelined dispatchers.
mod params;

#[cfg(feature = "async")]
pub mod pipelined;
#[cfg(feature = "sync")]
pub mod blocking;

pub use params::{ConnectParams, ConnectParamsBuilder};

use crate::codec::{ArakoonBytes, Encode, Uint32};

/// Protocol magic: sent standalone as the prologue's first field, and
/// OR'd into every command opcode to form its wire tag.
pub const MAGIC: u32 = 0xB1FF_0000;
const PROLOGUE_VERSION: u32 = 0x0000_0001;

/// Serializes the fixed 3-field preamble sent once, immediately after TCP
/// establishment and before any request: `Uint32(MAGIC) ||
/// Uint32(PROLOGUE_VERSION) || String(cluster_id)`.
pub(crate) fn encode_prologue(cluster_id: &ArakoonBytes) -> Vec<u8> {
    let mut out = Vec::new();
    Uint32(MAGIC).encode(&mut out);
    Uint32(PROLOGUE_VERSION).encode(&mut out);
    cluster_id.encode(&mut out);
    out
}

/// Lifecycle state of a connection.
///
/// A connection is created `Disconnected`; it becomes `Connected` once TCP
/// is established and the prologue has been sent; any I/O error or
/// protocol violation moves it to `Faulted` and then immediately back to
/// `Disconnected` once the socket has been closed, per spec.md §3/§4.7 ("on
/// any fault... transitions to Faulted, after which it is Disconnected
/// again and the stream is closed").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Faulted,
}
