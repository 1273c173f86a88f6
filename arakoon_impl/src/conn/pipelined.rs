//! The pipelined dispatcher (C6) for the `async` feature.
//!
//! A single background task owns the socket. Callers hand it a request
//! and a boxed response handler through an unbounded channel and await a
//! oneshot reply; the task writes requests as they arrive and decodes
//! replies strictly in submission order, mirroring the `_handlers`
//! deque pyrakoon's Twisted-based `ArakoonProtocol` keeps in `tx.py`.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};

use crate::codec::{ArakoonBytes, Decoder, Progress, StringDecoder, Uint32Decoder};
use crate::conn::{encode_prologue, ConnectParams, ConnectionState};
use crate::error::{ArakoonError, ArakoonResult, RESULT_SUCCESS};
use crate::message::{encode_request, Command};

const READ_CHUNK: usize = 8 * 1024;

enum Phase<D: Decoder> {
    Code(Uint32Decoder),
    Payload(D),
    Error(StringDecoder),
}

/// One outstanding call's response decoder, type-erased behind
/// [`PendingResponse`] so the FIFO can hold calls with different
/// `Command::Return` types.
struct Typed<D: Decoder> {
    phase: Phase<D>,
    code: u32,
    done: Option<oneshot::Sender<ArakoonResult<D::Output>>>,
}

impl<D: Decoder> Typed<D> {
    fn complete(&mut self, result: ArakoonResult<D::Output>) {
        if let Some(tx) = self.done.take() {
            let _ = tx.send(result);
        }
    }
}

/// Whether a [`PendingResponse`] consumed a full reply from the current
/// buffer or needs more bytes from the socket before it can continue.
enum Step {
    NeedMore,
    Complete,
}

trait PendingResponse: Send {
    fn advance(&mut self, buf: &[u8], pos: &mut usize) -> Step;
}

impl<D> PendingResponse for Typed<D>
where
    D: Decoder + Send + 'static,
    D::Output: Send + 'static,
{
    fn advance(&mut self, buf: &[u8], pos: &mut usize) -> Step {
        loop {
            match &mut self.phase {
                Phase::Code(c) => match c.advance(buf, pos) {
                    Ok(Progress::Need(_)) => return Step::NeedMore,
                    Err(e) => {
                        self.complete(Err(e));
                        return Step::Complete;
                    }
                    Ok(Progress::Done(code)) => {
                        self.code = code.0;
                        self.phase = if code.0 == RESULT_SUCCESS {
                            Phase::Payload(D::default())
                        } else {
                            Phase::Error(StringDecoder::default())
                        };
                    }
                },
                Phase::Payload(d) => {
                    return match d.advance(buf, pos) {
                        Ok(Progress::Need(_)) => Step::NeedMore,
                        Ok(Progress::Done(v)) => {
                            self.complete(Ok(v));
                            Step::Complete
                        }
                        Err(e) => {
                            self.complete(Err(e));
                            Step::Complete
                        }
                    };
                }
                Phase::Error(d) => {
                    return match d.advance(buf, pos) {
                        Ok(Progress::Need(_)) => Step::NeedMore,
                        Ok(Progress::Done(msg)) => {
                            let code = self.code;
                            self.complete(Err(ArakoonError::server(code, msg.0)));
                            Step::Complete
                        }
                        Err(e) => {
                            self.complete(Err(e));
                            Step::Complete
                        }
                    };
                }
            }
        }
    }
}

/// A handler dropped before completion (submit channel torn down, or the
/// driver task exiting with queued-but-unanswered calls) reports
/// `NotConnected` rather than leaving its caller's `await` hanging
/// forever.
impl<D: Decoder> Drop for Typed<D> {
    fn drop(&mut self) {
        if let Some(tx) = self.done.take() {
            let _ = tx.send(Err(ArakoonError::NotConnected));
        }
    }
}

struct Envelope {
    request: Vec<u8>,
    handler: Box<dyn PendingResponse>,
}

/// A pipelined, async connection to one Arakoon node.
///
/// Cloning shares the same background task and socket; many calls may be
/// outstanding at once, each resolved in the order it was submitted.
#[derive(Clone)]
pub struct Connection {
    submit: mpsc::UnboundedSender<Envelope>,
    state: Arc<Mutex<ConnectionState>>,
}

impl Connection {
    /// Opens a TCP connection to `params.socket_addr()`, sends the
    /// prologue, and spawns the background read/write task.
    pub async fn connect(params: &ConnectParams) -> ArakoonResult<Self> {
        let mut stream = TcpStream::connect(params.socket_addr()).await?;
        let prologue = encode_prologue(&ArakoonBytes(params.cluster_id().to_vec()));
        stream.write_all(&prologue).await?;
        let (read_half, write_half) = stream.into_split();
        let state = Arc::new(Mutex::new(ConnectionState::Connected));
        let (submit, submit_rx) = mpsc::unbounded_channel();
        tokio::spawn(drive(read_half, write_half, submit_rx, Arc::clone(&state)));
        debug!("connected to {}", params.socket_addr());
        Ok(Self { submit, state })
    }

    /// The connection's current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.lock_state()
    }

    /// Sends `cmd` and resolves once its reply has been decoded.
    ///
    /// Validation errors never touch the socket (spec.md §7 item 1).
    /// A fault in the background task (protocol violation or transport
    /// error, §7 item 4/5) surfaces to every outstanding and future call
    /// as [`ArakoonError::NotConnected`] once the task exits; a
    /// server-level error (§7 item 3) leaves the connection usable.
    pub async fn call<C>(&self, cmd: &C, allow_dirty: bool) -> ArakoonResult<C::Return>
    where
        C: Command,
        C::Return: Send + 'static,
        C::ReturnDecoder: Send + 'static,
    {
        if *self.lock_state() != ConnectionState::Connected {
            return Err(ArakoonError::NotConnected);
        }
        let request = encode_request(cmd, allow_dirty)?;
        let (tx, rx) = oneshot::channel();
        let handler: Box<dyn PendingResponse> = Box::new(Typed::<C::ReturnDecoder> {
            phase: Phase::Code(Uint32Decoder),
            code: 0,
            done: Some(tx),
        });
        self.submit
            .send(Envelope { request, handler })
            .map_err(|_| ArakoonError::NotConnected)?;
        rx.await.unwrap_or(Err(ArakoonError::NotConnected))
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn fault(state: &Mutex<ConnectionState>) {
    warn!("connection faulted, draining outstanding calls");
    *state.lock().unwrap_or_else(PoisonError::into_inner) = ConnectionState::Disconnected;
}

/// The background read/write loop: one task per connection, writing
/// requests as they arrive and decoding replies strictly in the order
/// their requests were written.
///
/// Dropping `pending` (on any return from this function, including the
/// implicit one at loop exit) completes every still-outstanding call
/// with `NotConnected` via `Typed::drop`.
async fn drive(
    mut read_half: OwnedReadHalf,
    mut write_half: OwnedWriteHalf,
    mut submit_rx: mpsc::UnboundedReceiver<Envelope>,
    state: Arc<Mutex<ConnectionState>>,
) {
    let mut pending: VecDeque<Box<dyn PendingResponse>> = VecDeque::new();
    let mut buf: Vec<u8> = Vec::new();
    let mut pos = 0usize;
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        tokio::select! {
            submitted = submit_rx.recv() => {
                match submitted {
                    Some(Envelope { request, handler }) => {
                        if write_half.write_all(&request).await.is_err() {
                            drop(handler);
                            fault(&state);
                            return;
                        }
                        pending.push_back(handler);
                    }
                    None => return,
                }
            }
            read = read_half.read(&mut chunk) => {
                match read {
                    Ok(0) | Err(_) => {
                        fault(&state);
                        return;
                    }
                    Ok(n) => {
                        buf.drain(0..pos);
                        pos = 0;
                        buf.extend_from_slice(&chunk[..n]);
                        while let Some(front) = pending.front_mut() {
                            match front.advance(&buf, &mut pos) {
                                Step::Complete => {
                                    pending.pop_front();
                                }
                                Step::NeedMore => break,
                            }
                        }
                    }
                }
            }
        }
    }
}
