//! Do not use this crate directly.
//!
//! This is the implementation crate shared by `arakoon` and
//! `arakoon_async`.
//!
//! If you need a synchronous driver, use `arakoon`.
//!
//! If you need an asynchronous driver, use `arakoon_async`.
#![deny(missing_debug_implementations)]
#![cfg_attr(not(any(feature = "sync", feature = "async")), allow(unused_imports))]
#![cfg_attr(not(any(feature = "sync", feature = "async")), allow(dead_code))]

#[macro_use]
extern crate log;

pub mod codec;
pub mod conn;
pub mod error;
pub mod message;
pub mod sequence;

#[cfg(feature = "sync")]
pub use conn::blocking;
#[cfg(feature = "async")]
pub use conn::pipelined;

pub use crate::codec::{
    ArakoonBytes, Bool, Encode, FieldValue, Float, Int32, Int64, Statistics, Uint32, Uint64, Unit,
};
pub use crate::conn::{ConnectParams, ConnectParamsBuilder, ConnectionState};
pub use crate::error::{ArakoonError, ArakoonResult, ErrorKind};
pub use crate::message::*;
pub use crate::sequence::{Step, Transaction};
