//! Connection lifecycle
//!
//! Drives one connection through `Connecting → Registered → Serving → Closed`:
//! reads the name line, registers with the ChatServer, forwards every
//! further line for routing, and tears down on read failure, write
//! failure, idle timeout or cancellation.
//!
//! The write half belongs to a dedicated writer task fed by the client's
//! outbound queue, so lines from many senders reach the socket one at a
//! time. The queue is unbounded: a slow reader builds a backlog and is
//! only torn down by a real write error.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::server::ServerCommand;
use crate::types::ClientId;

/// Per-connection settings derived from `Config`
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Longest silence tolerated on a read, if any
    pub idle_timeout: Option<Duration>,
    /// Longest accepted line in bytes
    pub max_line_length: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ConnectionSettings {
    fn from(config: &Config) -> Self {
        Self {
            idle_timeout: config.idle_timeout(),
            max_line_length: config.max_line_length,
        }
    }
}

/// Lifecycle state of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Registered,
    Serving,
    Closed,
}

/// Longest the writer spends flushing its backlog once cancelled
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

type LineReader<S> = FramedRead<ReadHalf<S>, LinesCodec>;
type LineWriter<S> = FramedWrite<WriteHalf<S>, LinesCodec>;

/// Handle a freshly accepted connection until it closes
///
/// `shutdown` is the server-wide token; the connection runs under a child
/// of it. Returns an error only when the ChatServer itself is gone.
pub async fn handle_connection<S>(
    stream: S,
    peer: String,
    cmd_tx: mpsc::Sender<ServerCommand>,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let codec = LinesCodec::new_with_max_length(settings.max_line_length);
    let mut lines = FramedRead::new(read_half, codec.clone());
    let writer = FramedWrite::new(write_half, codec);

    let (msg_tx, msg_rx) = mpsc::unbounded_channel();
    let mut conn = ConnectionLifecycle::new(peer, cmd_tx, settings, shutdown.child_token());
    let write_task = tokio::spawn(write_lines(writer, msg_rx, conn.cancel.clone()));

    match conn.register(&mut lines, msg_tx).await {
        Ok(true) => {
            let served = conn.serve(&mut lines).await;
            conn.teardown(write_task).await;
            served
        }
        Ok(false) => {
            conn.release(write_task).await;
            Ok(())
        }
        Err(e) => {
            conn.release(write_task).await;
            Err(e)
        }
    }
}

/// State of one connection task
pub struct ConnectionLifecycle {
    id: ClientId,
    peer: String,
    name: Option<String>,
    state: ConnectionState,
    cmd_tx: mpsc::Sender<ServerCommand>,
    settings: ConnectionSettings,
    cancel: CancellationToken,
}

impl ConnectionLifecycle {
    fn new(
        peer: String,
        cmd_tx: mpsc::Sender<ServerCommand>,
        settings: ConnectionSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: ClientId::new(),
            peer,
            name: None,
            state: ConnectionState::Connecting,
            cmd_tx,
            settings,
            cancel,
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!("Client {} {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }

    /// `Connecting → Registered`
    ///
    /// Returns false when the peer never sent a name or the name was
    /// refused; the connection is then closed without being announced.
    async fn register<S>(
        &mut self,
        lines: &mut LineReader<S>,
        sender: mpsc::UnboundedSender<String>,
    ) -> Result<bool, AppError>
    where
        S: AsyncRead,
    {
        let name = match read_line(lines, &self.cancel, self.settings.idle_timeout).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                debug!("Client {} from {} left before naming itself", self.id, self.peer);
                self.transition(ConnectionState::Closed);
                return Ok(false);
            }
            Err(e) => {
                debug!("Client {} from {} failed to send a name: {}", self.id, self.peer, e);
                self.transition(ConnectionState::Closed);
                return Ok(false);
            }
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let command = ServerCommand::Register {
            client_id: self.id,
            name: name.clone(),
            sender,
            cancel: self.cancel.clone(),
            reply: reply_tx,
        };
        if self.cmd_tx.send(command).await.is_err() {
            self.transition(ConnectionState::Closed);
            return Err(AppError::ChannelSend);
        }

        match reply_rx.await {
            Ok(Ok(())) => {
                info!("Client {} from {} registered as '{}'", self.id, self.peer, name);
                self.name = Some(name);
                self.transition(ConnectionState::Registered);
                Ok(true)
            }
            Ok(Err(e)) => {
                info!("Client {} from {} refused: {}", self.id, self.peer, e);
                self.transition(ConnectionState::Closed);
                Ok(false)
            }
            Err(_) => {
                self.transition(ConnectionState::Closed);
                Err(AppError::ChannelSend)
            }
        }
    }

    /// `Registered → Serving`, returning when the session ends
    async fn serve<S>(&mut self, lines: &mut LineReader<S>) -> Result<(), AppError>
    where
        S: AsyncRead,
    {
        self.transition(ConnectionState::Serving);
        let name = self.name.clone().unwrap_or_default();

        loop {
            let line = match read_line(lines, &self.cancel, self.settings.idle_timeout).await {
                Ok(Some(line)) => line,
                Ok(None) if self.cancel.is_cancelled() => {
                    debug!("Client {} cancelled", self.id);
                    return Ok(());
                }
                Ok(None) => {
                    debug!("Client {} closed the connection", self.id);
                    return Ok(());
                }
                Err(e) => {
                    debug!("Client {} read failed: {}", self.id, e);
                    return Ok(());
                }
            };

            let command = ServerCommand::Dispatch {
                client_id: self.id,
                sender_name: name.clone(),
                line,
            };
            if self.cmd_tx.send(command).await.is_err() {
                debug!("Server closed, ending session for {}", self.id);
                return Err(AppError::ChannelSend);
            }
        }
    }

    /// `Serving → Closed`: unregister (which announces the departure),
    /// then release the transport. Safe to reach more than once.
    async fn teardown(&mut self, write_task: JoinHandle<Result<(), AppError>>) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.transition(ConnectionState::Closed);

        let (reply_tx, reply_rx) = oneshot::channel();
        let command = ServerCommand::Unregister {
            client_id: self.id,
            reply: reply_tx,
        };
        if self.cmd_tx.send(command).await.is_ok() {
            let _ = reply_rx.await;
        }

        self.cancel.cancel();
        self.release(write_task).await;
        info!(
            "Client {} ('{}') disconnected",
            self.id,
            self.name.as_deref().unwrap_or_default()
        );
    }

    /// Wait for the writer to finish and log a failed release
    async fn release(&self, write_task: JoinHandle<Result<(), AppError>>) {
        match write_task.await {
            Ok(Ok(())) => debug!("Transport released for {}", self.id),
            Ok(Err(e)) => warn!("Transport for {} closed with error: {}", self.id, e),
            Err(e) => warn!("Writer task for {} panicked: {}", self.id, e),
        }
    }
}

/// Read the next line, honouring cancellation and the idle timeout
///
/// `Ok(None)` means the peer closed the stream or the token was cancelled.
async fn read_line<S>(
    lines: &mut LineReader<S>,
    cancel: &CancellationToken,
    idle_timeout: Option<Duration>,
) -> Result<Option<String>, AppError>
where
    S: AsyncRead,
{
    let next = async {
        match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, lines.next())
                .await
                .map_err(|_| AppError::IdleTimeout),
            None => Ok(lines.next().await),
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => Ok(None),
        next = next => match next? {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        },
    }
}

/// Writer task: drain the outbound queue onto the transport
///
/// Ends when the queue closes or the token is cancelled. Either way the
/// lines already queued are written out (bounded by `DRAIN_TIMEOUT`)
/// before the transport is shut down. A write error cancels the token so
/// the read side tears the connection down too.
async fn write_lines<S>(
    mut writer: LineWriter<S>,
    mut queue: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) -> Result<(), AppError>
where
    S: AsyncWrite,
{
    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = queue.recv() => match line {
                Some(line) => line,
                None => break,
            },
        };

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            sent = writer.send(line) => Some(sent),
        };

        match sent {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                debug!("Write failed: {}", e);
                cancel.cancel();
                return Err(e.into());
            }
            None => break,
        }
    }

    queue.close();
    let drain = async {
        while let Some(line) = queue.recv().await {
            writer.feed(line).await?;
        }
        SinkExt::<String>::close(&mut writer).await?;
        Ok::<_, AppError>(())
    };
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, drain).await;

    match drained {
        Ok(result) => result,
        Err(_) => {
            debug!("Backlog not flushed within {:?}, shutting down", DRAIN_TIMEOUT);
            writer.into_inner().shutdown().await?;
            Ok(())
        }
    }
}
