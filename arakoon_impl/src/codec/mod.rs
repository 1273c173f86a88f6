//! Wire codec for the Arakoon protocol: the stepwise `Decoder`/`Encode`
//! contract, the scalar and compositional wire types, and the
//! `Statistics` record format.
mod composite;
mod decode;
mod primitive;
mod statistics;

pub use composite::{ListDecoder, OptionDecoder, PairDecoder};
pub use decode::{decode_blocking, decode_complete, Decoder, Encode, Progress};
pub use primitive::{
    ArakoonBytes, Bool, BoolDecoder, Float, FloatDecoder, Int32, Int32Decoder, Int64,
    Int64Decoder, StringDecoder, Uint32, Uint32Decoder, Uint64, Uint64Decoder, Unit, UnitDecoder,
};
pub use statistics::{FieldValue, NamedFieldDecoder, Statistics, StatisticsDecoder};
