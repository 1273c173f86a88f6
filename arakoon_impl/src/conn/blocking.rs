//! The blocking dispatcher (C5) and the TCP-backed connection (C7) it
//! drives, for the `sync` feature.
//!
//! One socket per [`Connection`], guarded by a `Mutex` spanning the full
//! write-then-read exchange so concurrent callers serialize on it rather
//! than interleave bytes on the wire.
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex, PoisonError};

use crate::codec::{decode_blocking, ArakoonBytes, StringDecoder, Uint32Decoder};
use crate::conn::{encode_prologue, ConnectParams, ConnectionState};
use crate::error::{ArakoonError, ArakoonResult, RESULT_SUCCESS};
use crate::message::{encode_request, Command};

#[derive(Debug)]
struct ConnectionCore {
    state: ConnectionState,
    stream: Option<TcpStream>,
}

impl ConnectionCore {
    /// Tears down the socket and reports `err`, leaving the connection
    /// `Disconnected` for the next `connect` call, per spec.md §4.7.
    fn fault(&mut self, err: ArakoonError) -> ArakoonError {
        warn!("connection faulted: {err}");
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
        }
        self.state = ConnectionState::Disconnected;
        err
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "socket already closed"))?;
        stream.write_all(bytes)
    }

    fn read_exact_bytes(&mut self, n: usize) -> ArakoonResult<Vec<u8>> {
        let stream = self.stream.as_mut().ok_or(ArakoonError::NotConnected)?;
        let mut buf = vec![0u8; n];
        stream.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Writes the request, then drives the response decoder per spec.md
    /// §4.5: a leading `Uint32` result code, then either the command's
    /// typed payload or, on a non-zero code, a `String` error message.
    fn roundtrip<C: Command>(&mut self, request: &[u8]) -> ArakoonResult<C::Return> {
        self.write_all(request)?;
        let code = decode_blocking(Uint32Decoder, |n| self.read_exact_bytes(n))?.0;
        if code == RESULT_SUCCESS {
            decode_blocking(C::ReturnDecoder::default(), |n| self.read_exact_bytes(n))
        } else {
            let message = decode_blocking(StringDecoder::default(), |n| self.read_exact_bytes(n))?;
            Err(ArakoonError::server(code, message.0))
        }
    }
}

/// A blocking, mutex-serialized connection to one Arakoon node.
///
/// Cloning shares the same underlying socket and state: concurrent callers
/// queue on the connection's internal mutex for the whole exchange, per
/// spec.md §5 ("concurrent callers queue on the mutex").
#[derive(Clone, Debug)]
pub struct Connection(Arc<Mutex<ConnectionCore>>);

impl Connection {
    /// Opens a TCP connection to `params.socket_addr()` and sends the
    /// prologue. The connection is `Connected` on success; callers issue
    /// `hello`/other requests afterwards.
    pub fn connect(params: &ConnectParams) -> ArakoonResult<Self> {
        let stream = TcpStream::connect(params.socket_addr())?;
        let mut core = ConnectionCore {
            state: ConnectionState::Disconnected,
            stream: Some(stream),
        };
        let prologue = encode_prologue(&ArakoonBytes(params.cluster_id().to_vec()));
        if let Err(err) = core.write_all(&prologue) {
            return Err(core.fault(err.into()));
        }
        core.state = ConnectionState::Connected;
        debug!("connected to {}", params.socket_addr());
        Ok(Self(Arc::new(Mutex::new(core))))
    }

    /// The connection's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Sends `cmd` and blocks for its reply.
    ///
    /// Validation errors never touch the socket (spec.md §7 item 1).
    /// Protocol violations and transport errors fault the connection
    /// (§7 item 4/5); an Arakoon-level server error (§7 item 3) leaves it
    /// usable.
    pub fn call<C: Command>(&self, cmd: &C, allow_dirty: bool) -> ArakoonResult<C::Return> {
        let mut core = self.lock();
        if core.state != ConnectionState::Connected {
            return Err(ArakoonError::NotConnected);
        }
        let request = encode_request(cmd, allow_dirty)?;
        match core.roundtrip::<C>(&request) {
            Err(err) if err.is_fatal_to_connection() => Err(core.fault(err)),
            other => other,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ConnectionCore> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
