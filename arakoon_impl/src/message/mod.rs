//! The message catalog: one `Command` implementation per Arakoon wire
//! command, each describing its own opcode, optional `allow_dirty` flag,
//! argument encoding and reply type.
mod catalog;

pub use catalog::*;

use crate::codec::Decoder;
use crate::error::ArakoonResult;

/// Mask applied to every command's opcode to form its wire tag.
pub const MASK: u32 = 0xB1FF_0000;

/// One request/response pair in the Arakoon protocol.
///
/// `Return` is the still wire-typed reply value (e.g. [`crate::codec::Bool`],
/// [`crate::codec::ArakoonBytes`]); the `sync`/`a_sync` facades convert it
/// to an ordinary Rust type before handing it to the caller.
pub trait Command {
    type Return;
    type ReturnDecoder: Decoder<Output = Self::Return> + Default;

    const OPCODE: u32;

    /// Whether the server expects an `allow_dirty` flag right after the tag.
    const HAS_ALLOW_DIRTY: bool = false;

    /// Runs before any bytes are written; checks argument bounds such as
    /// the symmetric range on `Int32` fields.
    fn validate_args(&self) -> ArakoonResult<()> {
        Ok(())
    }

    fn encode_args(&self, out: &mut Vec<u8>);
}

/// Assembles the full request body for `cmd`: tag, optional
/// `allow_dirty` flag, then its arguments.
///
/// The reference client always sends `allow_dirty = false`, noting its
/// own choice as a stopgap ("never allow dirty reads, for now"). This
/// crate instead lets the caller opt in: the wire format already
/// supports it, and dirty reads against a follower are a documented
/// Arakoon feature rather than something the protocol disallows.
pub fn encode_request<C: Command>(cmd: &C, allow_dirty: bool) -> ArakoonResult<Vec<u8>> {
    cmd.validate_args()?;
    let mut out = Vec::new();
    let tag = C::OPCODE | MASK;
    out.extend_from_slice(&tag.to_le_bytes());
    if C::HAS_ALLOW_DIRTY {
        out.push(u8::from(allow_dirty));
    }
    cmd.encode_args(&mut out);
    Ok(out)
}
