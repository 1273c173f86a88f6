//! Error taxonomy for the Arakoon wire protocol.
use thiserror::Error;

/// Numeric result code carried by every Arakoon reply.
pub const RESULT_SUCCESS: u32 = 0x0000;

/// A list specifying categories of [`ArakoonError`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ArakoonError {
    /// A value failed descriptor validation before any bytes were written.
    ///
    /// Synchronous; the connection is left untouched.
    #[error("value failed validation: {0}")]
    Validation(&'static str),

    /// A call was attempted on a closed or never-opened connection.
    ///
    /// Synchronous; the connection is left untouched.
    #[error("not connected")]
    NotConnected,

    /// The server replied with a non-zero result code.
    ///
    /// The connection remains usable after this error.
    #[error("server returned error {code:#06x}: {}", String::from_utf8_lossy(message))]
    Server {
        /// Raw numeric result code.
        code: u32,
        /// Server-supplied message, verbatim.
        message: Vec<u8>,
        /// Structured classification of `code`, when known.
        kind: ErrorKind,
    },

    /// The decoder encountered a byte sequence that cannot occur on a
    /// conforming wire stream (e.g. a `Bool` tag other than 0x00/0x01).
    ///
    /// Fatal to the connection.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// I/O error while reading from or writing to the socket.
    ///
    /// Fatal to the connection.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Abbreviation of `Result<T, ArakoonError>`.
pub type ArakoonResult<T> = std::result::Result<T, ArakoonError>;

impl ArakoonError {
    pub(crate) fn server(code: u32, message: Vec<u8>) -> Self {
        Self::Server {
            kind: ErrorKind::from_code(code),
            code,
            message,
        }
    }

    /// `true` if this error requires the connection to be torn down and
    /// reconnected (protocol violations, transport errors); `false` if the
    /// connection remains usable (validation, not-connected, server errors).
    #[must_use]
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::Io(_))
    }

    /// The structured [`ErrorKind`], if this is a server-level error.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Server { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Structured classification of a non-zero Arakoon result code.
///
/// The numeric codes are Arakoon's public, stable wire result codes, shared
/// across the project's various client implementations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    NoMagic,
    TooManyDeadNodes,
    NoHello,
    NotMaster,
    NotFound,
    WrongCluster,
    AssertionFailed,
    ReadOnly,
    OutsideRange,
    GoingDown,
    BadInput,
    NoLongerMaster,
    InconsistentRead,
    UserFunctionFailure,
    NurseryRangeError,
    /// Any code not covered by the named variants above.
    Unknown,
}

impl ErrorKind {
    fn from_code(code: u32) -> Self {
        match code {
            0x01 => Self::NoMagic,
            0x02 => Self::TooManyDeadNodes,
            0x03 => Self::NoHello,
            0x04 => Self::NotMaster,
            0x05 => Self::NotFound,
            0x06 => Self::WrongCluster,
            0x07 => Self::AssertionFailed,
            0x08 => Self::ReadOnly,
            0x09 => Self::OutsideRange,
            0x0a => Self::GoingDown,
            0x0b => Self::BadInput,
            0x0c => Self::NoLongerMaster,
            0x0d => Self::InconsistentRead,
            0x0e => Self::UserFunctionFailure,
            0x0f => Self::NurseryRangeError,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_by_code() {
        let err = ArakoonError::server(0x05, b"key not found".to_vec());
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert!(!err.is_fatal_to_connection());
    }

    #[test]
    fn unknown_code_falls_back() {
        let err = ArakoonError::server(0x42, b"??".to_vec());
        assert_eq!(err.kind(), Some(ErrorKind::Unknown));
    }

    #[test]
    fn protocol_and_io_are_fatal() {
        assert!(ArakoonError::Protocol("bad bool tag".into()).is_fatal_to_connection());
        let io = ArakoonError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(io.is_fatal_to_connection());
    }
}
