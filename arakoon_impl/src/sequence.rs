//! The `Sequence`/transaction encoder.
//!
//! A [`Transaction`] is a list of [`Step`]s executed server-side as an
//! all-or-nothing unit. It is itself shaped like a `Step` with tag `5`
//! (an implicit outer `Sequence` step wrapping the caller's steps), which
//! is how a `Sequence` step can nest further `Sequence` steps.
use crate::codec::{ArakoonBytes, Encode};
use crate::error::ArakoonResult;

const TAG_SET: u32 = 1;
const TAG_DELETE: u32 = 2;
const TAG_SEQUENCE: u32 = 5;
const TAG_ASSERT: u32 = 8;
const TAG_ASSERT_EXISTS: u32 = 15;

/// One operation inside a [`Transaction`].
///
/// The reference client additionally reserves tag `3` for a legacy
/// `TestAndSet` step usable only inside a sequence; later Arakoon
/// revisions dropped it in favor of the top-level `TestAndSet` command,
/// which is the only form this crate exposes.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Set {
        key: ArakoonBytes,
        value: ArakoonBytes,
    },
    Delete {
        key: ArakoonBytes,
    },
    Assert {
        key: ArakoonBytes,
        value: Option<ArakoonBytes>,
    },
    AssertExists {
        key: ArakoonBytes,
    },
    Sequence(Vec<Step>),
}

impl Step {
    #[must_use]
    pub fn set(key: impl Into<ArakoonBytes>, value: impl Into<ArakoonBytes>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn delete(key: impl Into<ArakoonBytes>) -> Self {
        Self::Delete { key: key.into() }
    }

    #[must_use]
    pub fn assert(key: impl Into<ArakoonBytes>, value: Option<ArakoonBytes>) -> Self {
        Self::Assert {
            key: key.into(),
            value,
        }
    }

    #[must_use]
    pub fn assert_exists(key: impl Into<ArakoonBytes>) -> Self {
        Self::AssertExists { key: key.into() }
    }

    #[must_use]
    pub fn sequence(steps: Vec<Step>) -> Self {
        Self::Sequence(steps)
    }
}

impl Encode for Step {
    fn validate(&self) -> ArakoonResult<()> {
        match self {
            Self::Set { key, value } => {
                key.validate()?;
                value.validate()
            }
            Self::Delete { key } | Self::AssertExists { key } => key.validate(),
            Self::Assert { key, value } => {
                key.validate()?;
                value.validate()
            }
            Self::Sequence(steps) => {
                for step in steps {
                    step.validate()?;
                }
                Ok(())
            }
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Set { key, value } => {
                out.extend_from_slice(&TAG_SET.to_le_bytes());
                key.encode(out);
                value.encode(out);
            }
            Self::Delete { key } => {
                out.extend_from_slice(&TAG_DELETE.to_le_bytes());
                key.encode(out);
            }
            Self::Assert { key, value } => {
                out.extend_from_slice(&TAG_ASSERT.to_le_bytes());
                key.encode(out);
                value.encode(out);
            }
            Self::AssertExists { key } => {
                out.extend_from_slice(&TAG_ASSERT_EXISTS.to_le_bytes());
                key.encode(out);
            }
            Self::Sequence(steps) => encode_sequence_body(steps, out),
        }
    }
}

fn encode_sequence_body(steps: &[Step], out: &mut Vec<u8>) {
    out.extend_from_slice(&TAG_SEQUENCE.to_le_bytes());
    out.extend_from_slice(&(steps.len() as u32).to_le_bytes());
    for step in steps {
        step.encode(out);
    }
}

/// The whole set of steps sent with a `Sequence`/`SyncedSequence`
/// command. Wire-identical to a nested [`Step::Sequence`]; kept as a
/// distinct type so the message catalog can require "a whole
/// transaction" in its argument list rather than "any step".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transaction(pub Vec<Step>);

impl Transaction {
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps)
    }
}

impl Encode for Transaction {
    fn validate(&self) -> ArakoonResult<()> {
        for step in &self.0 {
            step.validate()?;
        }
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        encode_sequence_body(&self.0, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_is_tag_and_zero_count() {
        let tx = Transaction::new(vec![]);
        let mut buf = Vec::new();
        tx.encode(&mut buf);
        assert_eq!(buf, vec![5, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn set_step_encodes_tag_key_value() {
        let step = Step::set("k", "v");
        let mut buf = Vec::new();
        step.encode(&mut buf);
        let mut expected = TAG_SET.to_le_bytes().to_vec();
        ArakoonBytes::from("k").encode(&mut expected);
        ArakoonBytes::from("v").encode(&mut expected);
        assert_eq!(buf, expected);
    }

    #[test]
    fn nested_sequence_step_reuses_the_sequence_tag() {
        let inner = Step::sequence(vec![Step::delete("k")]);
        let mut buf = Vec::new();
        inner.encode(&mut buf);
        assert_eq!(&buf[0..4], &TAG_SEQUENCE.to_le_bytes());
        assert_eq!(&buf[4..8], &1u32.to_le_bytes());
    }

    #[test]
    fn assert_step_encodes_tag_key_and_optional_value() {
        let step = Step::assert("k", Some(ArakoonBytes::from("v")));
        let mut buf = Vec::new();
        step.encode(&mut buf);
        let mut expected = TAG_ASSERT.to_le_bytes().to_vec();
        ArakoonBytes::from("k").encode(&mut expected);
        Some(ArakoonBytes::from("v")).encode(&mut expected);
        assert_eq!(buf, expected);
    }

    #[test]
    fn assert_exists_step_encodes_tag_and_key_only() {
        let step = Step::assert_exists("k");
        let mut buf = Vec::new();
        step.encode(&mut buf);
        let mut expected = TAG_ASSERT_EXISTS.to_le_bytes().to_vec();
        ArakoonBytes::from("k").encode(&mut expected);
        assert_eq!(buf, expected);
    }

    #[test]
    fn transaction_and_equivalent_sequence_step_are_wire_identical() {
        let steps = vec![Step::set("a", "1"), Step::delete("b")];
        let mut from_transaction = Vec::new();
        Transaction::new(steps.clone()).encode(&mut from_transaction);
        let mut from_step = Vec::new();
        Step::sequence(steps).encode(&mut from_step);
        assert_eq!(from_transaction, from_step);
    }
}
