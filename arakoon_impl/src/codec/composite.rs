//! The compositional wire types: `Option<T>`, `List<T>`, and `Product`
//! (a fixed-arity tuple), all generic over an inner [`Decoder`]/[`Encode`]
//! pair so the message catalog can nest them freely (e.g. `List<Product<
//! ArakoonBytes, ArakoonBytes>>` for `RangeEntries`).
use super::decode::{Decoder, Encode, Progress};
use super::primitive::{BoolDecoder, Uint32Decoder};
use crate::error::ArakoonResult;
use byteorder::{ByteOrder, LittleEndian};
use std::marker::PhantomData;

/// An optional value: a `Bool` tag followed by the payload when present.
impl<T: Encode> Encode for Option<T> {
    fn validate(&self) -> ArakoonResult<()> {
        match self {
            Some(v) => v.validate(),
            None => Ok(()),
        }
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Some(v) => {
                out.push(1);
                v.encode(out);
            }
            None => out.push(0),
        }
    }
}

#[derive(Debug, Default)]
enum OptionPhase<D> {
    #[default]
    Tag,
    Inner(D),
}

/// Decodes an `Option<D::Output>`.
#[derive(Debug, Default)]
pub struct OptionDecoder<D>(OptionPhase<D>);

impl<D: Decoder> Decoder for OptionDecoder<D> {
    type Output = Option<D::Output>;

    fn advance(
        &mut self,
        buf: &[u8],
        pos: &mut usize,
    ) -> ArakoonResult<Progress<Option<D::Output>>> {
        loop {
            match &mut self.0 {
                OptionPhase::Tag => match BoolDecoder.advance(buf, pos)? {
                    Progress::Need(n) => return Ok(Progress::Need(n)),
                    Progress::Done(tag) => {
                        if tag.0 {
                            self.0 = OptionPhase::Inner(D::default());
                        } else {
                            return Ok(Progress::Done(None));
                        }
                    }
                },
                OptionPhase::Inner(inner) => {
                    return match inner.advance(buf, pos)? {
                        Progress::Need(n) => Ok(Progress::Need(n)),
                        Progress::Done(v) => Ok(Progress::Done(Some(v))),
                    };
                }
            }
        }
    }
}

/// A homogeneous sequence: a `Uint32` count followed by that many
/// elements, each encoded with `T`'s own descriptor.
impl<T: Encode> Encode for Vec<T> {
    fn validate(&self) -> ArakoonResult<()> {
        for item in self {
            item.validate()?;
        }
        Ok(())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        let mut len = [0u8; 4];
        LittleEndian::write_u32(&mut len, self.len() as u32);
        out.extend_from_slice(&len);
        for item in self {
            item.encode(out);
        }
    }
}

#[derive(Debug, Default)]
enum ListPhase<D: Decoder> {
    #[default]
    Count,
    Items {
        remaining: u32,
        acc: Vec<D::Output>,
        current: D,
    },
}

/// Decodes a `List<D::Output>`.
#[derive(Debug, Default)]
pub struct ListDecoder<D: Decoder>(ListPhase<D>);

impl<D: Decoder> Decoder for ListDecoder<D> {
    type Output = Vec<D::Output>;

    fn advance(
        &mut self,
        buf: &[u8],
        pos: &mut usize,
    ) -> ArakoonResult<Progress<Vec<D::Output>>> {
        loop {
            match &mut self.0 {
                ListPhase::Count => match Uint32Decoder.advance(buf, pos)? {
                    Progress::Need(n) => return Ok(Progress::Need(n)),
                    Progress::Done(count) => {
                        let remaining = count.0;
                        if remaining == 0 {
                            return Ok(Progress::Done(Vec::new()));
                        }
                        self.0 = ListPhase::Items {
                            remaining,
                            acc: Vec::with_capacity(remaining as usize),
                            current: D::default(),
                        };
                    }
                },
                ListPhase::Items {
                    remaining,
                    acc,
                    current,
                } => match current.advance(buf, pos)? {
                    Progress::Need(n) => return Ok(Progress::Need(n)),
                    Progress::Done(item) => {
                        acc.push(item);
                        *remaining -= 1;
                        if *remaining == 0 {
                            let ListPhase::Items { acc, .. } =
                                std::mem::replace(&mut self.0, ListPhase::Count)
                            else {
                                unreachable!()
                            };
                            return Ok(Progress::Done(acc));
                        }
                        *current = D::default();
                    }
                },
            }
        }
    }
}

/// A fixed-arity pair, serialized as `A` followed immediately by `B`.
/// Used for `RangeEntries`/`MultiGet`-style key/value results.
impl<A: Encode, B: Encode> Encode for (A, B) {
    fn validate(&self) -> ArakoonResult<()> {
        self.0.validate()?;
        self.1.validate()
    }

    fn encode(&self, out: &mut Vec<u8>) {
        self.0.encode(out);
        self.1.encode(out);
    }
}

#[derive(Debug, Default)]
enum PairPhase<A: Decoder, B> {
    #[default]
    First,
    Second(A::Output, B),
}

/// Decodes a `(A::Output, B::Output)` pair.
#[derive(Debug)]
pub struct PairDecoder<A: Decoder, B>(PairPhase<A, B>, PhantomData<A>);

impl<A: Decoder, B: Decoder> Default for PairDecoder<A, B> {
    fn default() -> Self {
        Self(PairPhase::default(), PhantomData)
    }
}

impl<A: Decoder, B: Decoder> Decoder for PairDecoder<A, B> {
    type Output = (A::Output, B::Output);

    fn advance(
        &mut self,
        buf: &[u8],
        pos: &mut usize,
    ) -> ArakoonResult<Progress<(A::Output, B::Output)>> {
        loop {
            match &mut self.0 {
                PairPhase::First => {
                    let mut first = A::default();
                    match first.advance(buf, pos)? {
                        Progress::Need(n) => return Ok(Progress::Need(n)),
                        Progress::Done(a) => self.0 = PairPhase::Second(a, B::default()),
                    }
                }
                PairPhase::Second(_, second) => {
                    return match second.advance(buf, pos)? {
                        Progress::Need(n) => Ok(Progress::Need(n)),
                        Progress::Done(b) => {
                            let PairPhase::Second(a, _) =
                                std::mem::replace(&mut self.0, PairPhase::First)
                            else {
                                unreachable!()
                            };
                            Ok(Progress::Done((a, b)))
                        }
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::primitive::{ArakoonBytes, StringDecoder, Uint32};

    #[test]
    fn option_none_round_trips() {
        let value: Option<ArakoonBytes> = None;
        let mut buf = Vec::new();
        value.encode(&mut buf);
        assert_eq!(buf, vec![0]);
        let mut pos = 0;
        let mut decoder = OptionDecoder::<StringDecoder>::default();
        match decoder.advance(&buf, &mut pos).unwrap() {
            Progress::Done(None) => {}
            other => panic!("expected Done(None), got {other:?}"),
        }
    }

    #[test]
    fn option_some_round_trips() {
        let value = Some(ArakoonBytes::from("x"));
        let mut buf = Vec::new();
        value.encode(&mut buf);
        let mut pos = 0;
        let mut decoder = OptionDecoder::<StringDecoder>::default();
        match decoder.advance(&buf, &mut pos).unwrap() {
            Progress::Done(Some(got)) => assert_eq!(got, ArakoonBytes::from("x")),
            other => panic!("expected Done(Some(..)), got {other:?}"),
        }
    }

    #[test]
    fn empty_list_round_trips_with_no_element_bytes() {
        let value: Vec<ArakoonBytes> = Vec::new();
        let mut buf = Vec::new();
        value.encode(&mut buf);
        assert_eq!(buf, vec![0, 0, 0, 0]);
        let mut pos = 0;
        let mut decoder = ListDecoder::<StringDecoder>::default();
        match decoder.advance(&buf, &mut pos).unwrap() {
            Progress::Done(items) => assert!(items.is_empty()),
            other => panic!("expected Done(vec![]), got {other:?}"),
        }
    }

    #[test]
    fn list_of_strings_round_trips() {
        let value = vec![
            ArakoonBytes::from("a"),
            ArakoonBytes::from("bb"),
            ArakoonBytes::from(""),
        ];
        let mut buf = Vec::new();
        value.encode(&mut buf);
        let mut pos = 0;
        let mut decoder = ListDecoder::<StringDecoder>::default();
        match decoder.advance(&buf, &mut pos).unwrap() {
            Progress::Done(items) => assert_eq!(items, value),
            other => panic!("expected Done(..), got {other:?}"),
        }
    }

    #[test]
    fn pair_round_trips() {
        let value = (ArakoonBytes::from("k"), ArakoonBytes::from("v"));
        let mut buf = Vec::new();
        value.encode(&mut buf);
        let mut pos = 0;
        let mut decoder = PairDecoder::<StringDecoder, StringDecoder>::default();
        match decoder.advance(&buf, &mut pos).unwrap() {
            Progress::Done(got) => assert_eq!(got, value),
            other => panic!("expected Done(..), got {other:?}"),
        }
    }

    #[test]
    fn decoder_partial_feed_asks_for_more() {
        let value = Uint32(7);
        let mut buf = Vec::new();
        value.encode(&mut buf);
        let mut pos = 0;
        match Uint32Decoder.advance(&buf[..2], &mut pos).unwrap() {
            Progress::Need(n) => assert_eq!(n, 4),
            other => panic!("expected Need(4), got {other:?}"),
        }
        assert_eq!(pos, 0);
    }
}
