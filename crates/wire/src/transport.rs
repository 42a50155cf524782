// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Transport`: the one abstraction every node uses to speak to a peer,
//! whether that peer lives in the same process, a child process, or
//! behind a socket (`spec.md` §4.2).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use max_core::MaxError;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};

use crate::framing::{read_frame, write_frame, FramingError};
use crate::message::{Request, RequestScope, Response};

/// Errors a transport itself can raise, distinct from dispatch errors
/// returned by the receiver (`spec.md` §4.2: "a transport never
/// fabricates errors; wire errors surface as an `ErrTransport…` family").
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("transport framing error: {0}")]
    Framing(#[from] FramingError),
    #[error("response for request {0} never arrived")]
    NoResponse(String),
}

impl From<TransportError> for MaxError {
    fn from(err: TransportError) -> Self {
        MaxError::new("platform.transport_error", err.to_string())
    }
}

/// `send(request) -> response`, `close()`. The only mechanism nodes use to
/// speak to remote peers; in-process callers use it too, via
/// [`LoopbackTransport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
    async fn close(&self) -> Result<(), TransportError>;
}

/// Platform flavours named for completeness (`spec.md` §4.2). Only
/// `Loopback` and `UnixSocket` are implemented here; `Http` and
/// `NamedPipe` describe the shape a deployer would need without pulling
/// in a network stack this system doesn't otherwise need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Loopback,
    UnixSocket,
    /// Would require an HTTP client/server crate; not implemented.
    Http,
    /// Windows named-pipe equivalent of `UnixSocket`; not implemented.
    NamedPipe,
}

/// Dispatches a [`Request`] in-process. Implemented by `max-rpc`'s
/// dispatcher; kept in `max-wire` so [`LoopbackTransport`] doesn't need a
/// dependency back on `max-rpc`.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, request: Request) -> Response;
}

/// Calls a [`Dispatch`] directly in-memory — no serialization, no socket.
pub struct LoopbackTransport {
    dispatcher: Arc<dyn Dispatch>,
}

impl LoopbackTransport {
    pub fn new(dispatcher: Arc<dyn Dispatch>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        Ok(self.dispatcher.dispatch(request).await)
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<Response>>>>;

/// Framed-JSON-lines transport over a Unix domain socket. Multiple
/// requests on one connection are multiplexed by `request.id`
/// (`spec.md` §4.2).
pub struct UnixSocketTransport {
    outbox: mpsc::UnboundedSender<Request>,
    pending: PendingMap,
    reader_task: tokio::task::JoinHandle<()>,
    writer_task: tokio::task::JoinHandle<()>,
}

impl UnixSocketTransport {
    /// Spawn reader/writer tasks over an already-connected socket. Callers
    /// dial with `tokio::net::UnixStream::connect` and hand the stream in.
    pub fn spawn(stream: UnixStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        let (outbox_tx, mut outbox_rx) = mpsc::unbounded_channel::<Request>();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let writer_task = tokio::spawn(async move {
            let mut write_half = write_half;
            while let Some(request) = outbox_rx.recv().await {
                if write_frame(&mut write_half, &request).await.is_err() {
                    break;
                }
            }
        });

        let pending_for_reader = pending.clone();
        let reader_task = tokio::spawn(async move {
            let mut reader = tokio::io::BufReader::new(read_half);
            loop {
                match read_frame::<_, Response>(&mut reader).await {
                    Ok(Some(response)) => {
                        if let Some(sender) = pending_for_reader.lock().remove(response.id()) {
                            let _ = sender.send(response);
                        }
                    }
                    Ok(None) | Err(_) => break,
                }
            }
        });

        Self { outbox: outbox_tx, pending, reader_task, writer_task }
    }
}

impl Drop for UnixSocketTransport {
    fn drop(&mut self) {
        self.reader_task.abort();
        self.writer_task.abort();
    }
}

#[async_trait]
impl Transport for UnixSocketTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(request.id.clone(), tx);
        let request_id = request.id.clone();
        self.outbox.send(request).map_err(|_| TransportError::Closed)?;
        rx.await.map_err(|_| TransportError::NoResponse(request_id))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.reader_task.abort();
        self.writer_task.abort();
        Ok(())
    }
}

/// Accepts connections on a Unix domain socket and dispatches each framed
/// request to a [`Dispatch`] — the server-side half of
/// [`UnixSocketTransport`], one reader/writer pair per connection, mirroring
/// its own task split (`spec.md` §4.2).
pub struct UnixSocketServer {
    accept_task: tokio::task::JoinHandle<()>,
}

impl UnixSocketServer {
    /// Bind `path` and spawn the accept loop. Removes any stale socket file
    /// left at `path` from a prior run before binding.
    pub fn bind(path: impl AsRef<std::path::Path>, dispatcher: Arc<dyn Dispatch>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path)?;

        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _addr)) => {
                        tokio::spawn(serve_connection(stream, dispatcher.clone()));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self { accept_task })
    }
}

impl Drop for UnixSocketServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve_connection(stream: UnixStream, dispatcher: Arc<dyn Dispatch>) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = tokio::io::BufReader::new(read_half);
    loop {
        match read_frame::<_, Request>(&mut reader).await {
            Ok(Some(request)) => {
                let response = dispatcher.dispatch(request).await;
                if write_frame(&mut write_half, &response).await.is_err() {
                    break;
                }
            }
            Ok(None) | Err(_) => break,
        }
    }
}

/// Wraps an inner transport and stamps additional scope fields on
/// outgoing requests (`spec.md` §4.3). Lets a Workspace client hand out
/// Installation clients whose requests automatically carry the
/// installation ID to the Workspace RPC endpoint.
pub struct ScopedTransport {
    inner: Arc<dyn Transport>,
    stamp: RequestScope,
}

impl ScopedTransport {
    pub fn new(inner: Arc<dyn Transport>, stamp: RequestScope) -> Self {
        Self { inner, stamp }
    }
}

#[async_trait]
impl Transport for ScopedTransport {
    async fn send(&self, mut request: Request) -> Result<Response, TransportError> {
        let mut scope = request.scope.take().unwrap_or_default();
        if scope.workspace_id.is_none() {
            scope.workspace_id = self.stamp.workspace_id.clone();
        }
        if scope.installation_id.is_none() {
            scope.installation_id = self.stamp.installation_id.clone();
        }
        request.scope = if scope.is_empty() { None } else { Some(scope) };
        self.inner.send(request).await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.inner.close().await
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
