//! The scalar wire types: `String`, `Uint32`, `Uint64`, `Int32`, `Int64`,
//! `Float`, `Bool`, `Unit`.
//!
//! Each is a thin newtype so that the `Encode`/`Decoder` impls live next to
//! the type instead of being smeared across the message catalog.
use super::decode::{Decoder, Encode, Progress};
use crate::error::{ArakoonError, ArakoonResult};
use byteorder::{ByteOrder, LittleEndian};

/// An opaque byte string as it appears on the wire. Arakoon keys and
/// values are never assumed to be valid UTF-8.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ArakoonBytes(pub Vec<u8>);

impl From<Vec<u8>> for ArakoonBytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for ArakoonBytes {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

impl From<&str> for ArakoonBytes {
    fn from(v: &str) -> Self {
        Self(v.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for ArakoonBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Encode for ArakoonBytes {
    fn encode(&self, out: &mut Vec<u8>) {
        let mut len = [0u8; 4];
        LittleEndian::write_u32(&mut len, self.0.len() as u32);
        out.extend_from_slice(&len);
        out.extend_from_slice(&self.0);
    }
}

#[derive(Debug, Default)]
enum StringPhase {
    #[default]
    Len,
    Body(u32),
}

/// Decodes a length-prefixed [`ArakoonBytes`].
#[derive(Debug, Default)]
pub struct StringDecoder(StringPhase);

impl Decoder for StringDecoder {
    type Output = ArakoonBytes;

    fn advance(&mut self, buf: &[u8], pos: &mut usize) -> ArakoonResult<Progress<ArakoonBytes>> {
        loop {
            match self.0 {
                StringPhase::Len => {
                    if buf.len() - *pos < 4 {
                        return Ok(Progress::Need(4));
                    }
                    let len = LittleEndian::read_u32(&buf[*pos..*pos + 4]);
                    *pos += 4;
                    if len == 0 {
                        return Ok(Progress::Done(ArakoonBytes(Vec::new())));
                    }
                    self.0 = StringPhase::Body(len);
                }
                StringPhase::Body(len) => {
                    let len = len as usize;
                    if buf.len() - *pos < len {
                        return Ok(Progress::Need(len));
                    }
                    let body = buf[*pos..*pos + len].to_vec();
                    *pos += len;
                    return Ok(Progress::Done(ArakoonBytes(body)));
                }
            }
        }
    }
}

macro_rules! fixed_width_primitive {
    ($name:ident, $decoder:ident, $ty:ty, $width:expr, $read:expr, $write:expr) => {
        #[doc = concat!("Wire-level `", stringify!($name), "`, little-endian.")]
        #[derive(Copy, Clone, Debug, Default, PartialEq)]
        pub struct $name(pub $ty);

        impl Encode for $name {
            fn encode(&self, out: &mut Vec<u8>) {
                let mut buf = [0u8; $width];
                $write(&mut buf, self.0);
                out.extend_from_slice(&buf);
            }
        }

        #[doc = concat!("Decodes a ", stringify!($name), ".")]
        #[derive(Debug, Default)]
        pub struct $decoder;

        impl Decoder for $decoder {
            type Output = $name;

            fn advance(&mut self, buf: &[u8], pos: &mut usize) -> ArakoonResult<Progress<$name>> {
                if buf.len() - *pos < $width {
                    return Ok(Progress::Need($width));
                }
                let v = $read(&buf[*pos..*pos + $width]);
                *pos += $width;
                Ok(Progress::Done($name(v)))
            }
        }
    };
}

fixed_width_primitive!(
    Uint32,
    Uint32Decoder,
    u32,
    4,
    LittleEndian::read_u32,
    LittleEndian::write_u32
);
fixed_width_primitive!(
    Uint64,
    Uint64Decoder,
    u64,
    8,
    LittleEndian::read_u64,
    LittleEndian::write_u64
);
fixed_width_primitive!(
    Float,
    FloatDecoder,
    f64,
    8,
    LittleEndian::read_f64,
    LittleEndian::write_f64
);

/// Wire-level signed 32-bit integer.
///
/// The reference client validates with a symmetric bound derived from
/// `abs(value)`, which rejects `i32::MIN` along with anything outside
/// `±(2^31 - 1)` even though `i32::MIN` is otherwise representable.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Int32(pub i32);

impl Int32 {
    /// Builds an `Int32` from a widened value, applying the symmetric
    /// bound check the reference client performs before serializing.
    pub fn new(value: i64) -> ArakoonResult<Self> {
        if value.abs() > i64::from(i32::MAX) {
            return Err(ArakoonError::Validation(
                "value out of range for Int32: abs(value) exceeds 2^31 - 1",
            ));
        }
        Ok(Self(value as i32))
    }
}

impl Encode for Int32 {
    fn validate(&self) -> ArakoonResult<()> {
        Int32::new(i64::from(self.0)).map(|_| ())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, self.0);
        out.extend_from_slice(&buf);
    }
}

/// Decodes an [`Int32`]. Unlike [`Int32::new`], decoding never re-applies
/// the symmetric bound check: whatever bytes the server sent are trusted.
#[derive(Debug, Default)]
pub struct Int32Decoder;

impl Decoder for Int32Decoder {
    type Output = Int32;

    fn advance(&mut self, buf: &[u8], pos: &mut usize) -> ArakoonResult<Progress<Int32>> {
        if buf.len() - *pos < 4 {
            return Ok(Progress::Need(4));
        }
        let v = LittleEndian::read_i32(&buf[*pos..*pos + 4]);
        *pos += 4;
        Ok(Progress::Done(Int32(v)))
    }
}

/// Wire-level signed 64-bit integer, validated with the same symmetric
/// policy as [`Int32`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Int64(pub i64);

impl Int64 {
    pub fn new(value: i128) -> ArakoonResult<Self> {
        if value.abs() > i128::from(i64::MAX) {
            return Err(ArakoonError::Validation(
                "value out of range for Int64: abs(value) exceeds 2^63 - 1",
            ));
        }
        Ok(Self(value as i64))
    }
}

impl Encode for Int64 {
    fn validate(&self) -> ArakoonResult<()> {
        Int64::new(i128::from(self.0)).map(|_| ())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let mut buf = [0u8; 8];
        LittleEndian::write_i64(&mut buf, self.0);
        out.extend_from_slice(&buf);
    }
}

#[derive(Debug, Default)]
pub struct Int64Decoder;

impl Decoder for Int64Decoder {
    type Output = Int64;

    fn advance(&mut self, buf: &[u8], pos: &mut usize) -> ArakoonResult<Progress<Int64>> {
        if buf.len() - *pos < 8 {
            return Ok(Progress::Need(8));
        }
        let v = LittleEndian::read_i64(&buf[*pos..*pos + 8]);
        *pos += 8;
        Ok(Progress::Done(Int64(v)))
    }
}

/// Wire-level boolean: `0x01` for true, `0x00` for false. Any other byte
/// is a protocol violation, not a validation error: it can only arrive
/// from a non-conforming peer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Bool(pub bool);

impl Encode for Bool {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(u8::from(self.0));
    }
}

#[derive(Debug, Default)]
pub struct BoolDecoder;

impl Decoder for BoolDecoder {
    type Output = Bool;

    fn advance(&mut self, buf: &[u8], pos: &mut usize) -> ArakoonResult<Progress<Bool>> {
        if buf.len() - *pos < 1 {
            return Ok(Progress::Need(1));
        }
        let byte = buf[*pos];
        *pos += 1;
        match byte {
            0 => Ok(Progress::Done(Bool(false))),
            1 => Ok(Progress::Done(Bool(true))),
            other => Err(ArakoonError::Protocol(format!(
                "invalid Bool tag {other:#04x}"
            ))),
        }
    }
}

/// The zero-width unit type: takes up no space on the wire in either
/// direction. Present only as a return type placeholder, never validated
/// or encoded as a standalone value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Unit;

#[derive(Debug, Default)]
pub struct UnitDecoder;

impl Decoder for UnitDecoder {
    type Output = Unit;

    fn advance(&mut self, _buf: &[u8], _pos: &mut usize) -> ArakoonResult<Progress<Unit>> {
        Ok(Progress::Done(Unit))
    }
}
