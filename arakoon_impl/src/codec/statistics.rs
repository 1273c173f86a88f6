//! The `Statistics` return type used by the `Statistics` command: a
//! length-prefixed opaque blob whose body is a single named field whose
//! payload is itself a list of named fields, folding into a map.
//!
//! The blob is first read as an ordinary `String`; its contents are then
//! parsed in one shot with [`decode_complete`], since by that point every
//! byte is already in memory and a truncated record is a protocol error
//! rather than a "need more bytes" condition.
use super::composite::ListDecoder;
use super::decode::{decode_complete, Decoder, Progress};
use super::primitive::{ArakoonBytes, FloatDecoder, Int32Decoder, Int64Decoder, StringDecoder};
use crate::error::{ArakoonError, ArakoonResult};

/// A single field value inside a [`Statistics`] record.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Int(i32),
    Int64(i64),
    Float(f64),
    Str(ArakoonBytes),
    List(Vec<(ArakoonBytes, FieldValue)>),
}

/// Arbitrary server-reported statistics: an ordered list of named,
/// variably-typed fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics(pub Vec<(ArakoonBytes, FieldValue)>);

impl Statistics {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0
            .iter()
            .find(|(field_name, _)| field_name.0 == name.as_bytes())
            .map(|(_, value)| value)
    }
}

const FIELD_KIND_INT: i32 = 1;
const FIELD_KIND_INT64: i32 = 2;
const FIELD_KIND_FLOAT: i32 = 3;
const FIELD_KIND_STRING: i32 = 4;
const FIELD_KIND_LIST: i32 = 5;

/// The kind-selected decoder for a named field's payload, once its `Int32`
/// kind tag has already been consumed.
#[derive(Debug)]
enum FieldPayload {
    Int(Int32Decoder),
    Int64(Int64Decoder),
    Float(FloatDecoder),
    Str(StringDecoder),
    List(ListDecoder<NamedFieldDecoder>),
}

impl FieldPayload {
    fn from_kind(kind: i32) -> ArakoonResult<Self> {
        Ok(match kind {
            FIELD_KIND_INT => Self::Int(Int32Decoder),
            FIELD_KIND_INT64 => Self::Int64(Int64Decoder),
            FIELD_KIND_FLOAT => Self::Float(FloatDecoder),
            FIELD_KIND_STRING => Self::Str(StringDecoder::default()),
            FIELD_KIND_LIST => Self::List(ListDecoder::default()),
            other => {
                return Err(ArakoonError::Protocol(format!(
                    "unknown statistics field kind {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Default)]
enum NamedFieldPhase {
    #[default]
    Kind,
    Name(i32, StringDecoder),
    Payload(ArakoonBytes, FieldPayload),
}

/// Decodes one named field: an `Int32` kind tag, then a `String` name,
/// then the kind-selected payload. A `List`-kind payload is itself a list
/// of named fields, matching the reference client's recursive record
/// format.
#[derive(Debug, Default)]
pub struct NamedFieldDecoder(NamedFieldPhase);

impl Decoder for NamedFieldDecoder {
    type Output = (ArakoonBytes, FieldValue);

    fn advance(
        &mut self,
        buf: &[u8],
        pos: &mut usize,
    ) -> ArakoonResult<Progress<(ArakoonBytes, FieldValue)>> {
        loop {
            match &mut self.0 {
                NamedFieldPhase::Kind => match Int32Decoder.advance(buf, pos)? {
                    Progress::Need(n) => return Ok(Progress::Need(n)),
                    Progress::Done(kind) => {
                        self.0 = NamedFieldPhase::Name(kind.0, StringDecoder::default());
                    }
                },
                NamedFieldPhase::Name(kind, name_decoder) => {
                    match name_decoder.advance(buf, pos)? {
                        Progress::Need(n) => return Ok(Progress::Need(n)),
                        Progress::Done(name) => {
                            let payload = FieldPayload::from_kind(*kind)?;
                            self.0 = NamedFieldPhase::Payload(name, payload);
                        }
                    }
                }
                NamedFieldPhase::Payload(_, payload) => {
                    let value = match payload {
                        FieldPayload::Int(d) => match d.advance(buf, pos)? {
                            Progress::Need(n) => return Ok(Progress::Need(n)),
                            Progress::Done(v) => FieldValue::Int(v.0),
                        },
                        FieldPayload::Int64(d) => match d.advance(buf, pos)? {
                            Progress::Need(n) => return Ok(Progress::Need(n)),
                            Progress::Done(v) => FieldValue::Int64(v.0),
                        },
                        FieldPayload::Float(d) => match d.advance(buf, pos)? {
                            Progress::Need(n) => return Ok(Progress::Need(n)),
                            Progress::Done(v) => FieldValue::Float(v.0),
                        },
                        FieldPayload::Str(d) => match d.advance(buf, pos)? {
                            Progress::Need(n) => return Ok(Progress::Need(n)),
                            Progress::Done(v) => FieldValue::Str(v),
                        },
                        FieldPayload::List(d) => match d.advance(buf, pos)? {
                            Progress::Need(n) => return Ok(Progress::Need(n)),
                            Progress::Done(v) => FieldValue::List(v),
                        },
                    };
                    let NamedFieldPhase::Payload(name, _) =
                        std::mem::replace(&mut self.0, NamedFieldPhase::Kind)
                    else {
                        unreachable!()
                    };
                    return Ok(Progress::Done((name, value)));
                }
            }
        }
    }
}

#[derive(Debug, Default)]
enum StatisticsPhase {
    #[default]
    Blob,
    Done,
}

/// Decodes a [`Statistics`] value: one length-prefixed blob, containing a
/// single named field whose name must be `arakoon_stats` and whose `List`
/// payload folds into the returned record.
#[derive(Debug, Default)]
pub struct StatisticsDecoder {
    phase: StatisticsPhase,
    blob: StringDecoder,
}

impl Decoder for StatisticsDecoder {
    type Output = Statistics;

    fn advance(&mut self, buf: &[u8], pos: &mut usize) -> ArakoonResult<Progress<Statistics>> {
        match self.phase {
            StatisticsPhase::Blob => match self.blob.advance(buf, pos)? {
                Progress::Need(n) => Ok(Progress::Need(n)),
                Progress::Done(blob) => {
                    self.phase = StatisticsPhase::Done;
                    let (name, value) = decode_complete::<NamedFieldDecoder>(&blob.0)?;
                    if name.0 != b"arakoon_stats" {
                        return Err(ArakoonError::Protocol(
                            "statistics record is missing the required 'arakoon_stats' field"
                                .into(),
                        ));
                    }
                    let FieldValue::List(fields) = value else {
                        return Err(ArakoonError::Protocol(
                            "'arakoon_stats' field does not carry a named-field list".into(),
                        ));
                    };
                    Ok(Progress::Done(Statistics(fields)))
                }
            },
            StatisticsPhase::Done => unreachable!("StatisticsDecoder polled after completion"),
        }
    }
}
