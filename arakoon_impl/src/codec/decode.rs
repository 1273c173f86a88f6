//! The stepwise decoder contract shared by the blocking and pipelined
//! dispatchers: `advance` either consumes bytes and produces a value, or
//! reports how many more bytes it needs before it can try again.
use crate::error::{ArakoonError, ArakoonResult};

/// Result of one decoding step.
#[derive(Debug)]
pub enum Progress<T> {
    /// Not enough bytes are available yet. `pos` is left unchanged; the
    /// caller must make at least this many bytes available starting at
    /// `pos` before calling `advance` again.
    Need(usize),
    /// Decoding finished; `pos` has been advanced past the consumed bytes.
    Done(T),
}

/// A push-parser for one wire type.
///
/// Implementations hold whatever intermediate state they need between
/// calls (e.g. "I've read the length prefix, now I need the body"). A
/// decoder is used exactly once to produce exactly one value.
pub trait Decoder: Default {
    type Output;

    /// Attempt to make progress using the bytes available at
    /// `buf[*pos..]`. Never consumes bytes beyond what it has fully
    /// validated; on `Need`, `*pos` is unchanged.
    fn advance(&mut self, buf: &[u8], pos: &mut usize) -> ArakoonResult<Progress<Self::Output>>;
}

/// Types that can be serialized onto the wire.
///
/// `validate` runs before any bytes are written and never touches the
/// connection; `encode` appends the wire representation to `out`.
pub trait Encode {
    fn validate(&self) -> ArakoonResult<()> {
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>);
}

/// Drives a [`Decoder`] over a buffer that is already known to be
/// complete (e.g. the body of a length-prefixed blob that has already
/// been read off the wire in full). A `Need` here means the blob itself
/// is malformed, not that more bytes are coming.
pub fn decode_complete<D: Decoder>(buf: &[u8]) -> ArakoonResult<D::Output> {
    let mut decoder = D::default();
    let mut pos = 0usize;
    match decoder.advance(buf, &mut pos)? {
        Progress::Done(value) => Ok(value),
        Progress::Need(_) => Err(ArakoonError::Protocol(
            "truncated nested structure inside a complete blob".into(),
        )),
    }
}

/// Drives a [`Decoder`] to completion by reading exactly as many bytes as
/// it asks for, one `Need` at a time. This is the blocking dispatcher's
/// half of the Need/Done contract: the reader always has the requested
/// bytes in hand before calling back in.
pub fn decode_blocking<D, R>(mut decoder: D, mut read_exact: R) -> ArakoonResult<D::Output>
where
    D: Decoder,
    R: FnMut(usize) -> ArakoonResult<Vec<u8>>,
{
    let mut buf: Vec<u8> = Vec::new();
    let mut pos = 0usize;
    loop {
        match decoder.advance(&buf, &mut pos)? {
            Progress::Done(value) => return Ok(value),
            Progress::Need(total) => {
                let missing = total - (buf.len() - pos);
                let chunk = read_exact(missing)?;
                buf.drain(..pos);
                buf.extend_from_slice(&chunk);
                pos = 0;
            }
        }
    }
}
