//! Connection handler
//!
//! Runs one client session over any line-oriented byte stream: negotiates
//! a unique name, then relays lines between the client and the ChatServer
//! until either side goes away.

use std::sync::Arc;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::AppError;
use crate::message::{Inbound, ServerMessage};
use crate::server::ServerCommand;
use crate::types::{ClientId, ClientName};

/// Session lifecycle
///
/// `Connecting → Naming → Active → Closed`; `Closed` can be entered from
/// any earlier state and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Naming,
    Active,
    Closed,
}

impl SessionState {
    /// Check whether `next` is a legal successor of this state
    pub fn can_advance_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Connecting, Naming) | (Naming, Active) => true,
            _ => false,
        }
    }
}

struct Session {
    id: ClientId,
    state: SessionState,
}

impl Session {
    fn new(id: ClientId) -> Self {
        Self {
            id,
            state: SessionState::Connecting,
        }
    }

    fn advance(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("Session {}: {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }
}

/// Handle a new connection
///
/// Returns once the session is Closed. Teardown with the ChatServer has
/// already happened by then, whatever the outcome.
pub async fn handle_connection<S>(
    stream: S,
    cmd_tx: mpsc::Sender<ServerCommand>,
    config: Arc<Config>,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let client_id = ClientId::new();
    let mut session = Session::new(client_id);
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(config.max_line_length));

    session.advance(SessionState::Naming);
    let negotiated = negotiate_name(&mut framed, &cmd_tx, client_id, config.outbound_buffer).await;
    let (name, msg_rx) = match negotiated {
        Ok(Some(registered)) => registered,
        Ok(None) => {
            session.advance(SessionState::Closed);
            debug!("Client {} left before choosing a name", client_id);
            return Ok(());
        }
        Err(e) => {
            session.advance(SessionState::Closed);
            return Err(e);
        }
    };

    session.advance(SessionState::Active);
    info!("Client {} registered as '{}'", client_id, name);

    let result = relay(framed, cmd_tx.clone(), client_id, name.clone(), msg_rx).await;

    // Ignored by the ChatServer if it already tore this session down
    let _ = cmd_tx
        .send(ServerCommand::Leave {
            client_id,
            name: name.clone(),
        })
        .await;

    session.advance(SessionState::Closed);
    info!("Client '{}' disconnected", name);

    result
}

/// Prompt until the client picks a free name
///
/// Returns None if the client disconnects first. On success the returned
/// receiver already holds `NAMEACCEPTED` and the roster.
async fn negotiate_name<S>(
    framed: &mut Framed<S, LinesCodec>,
    cmd_tx: &mpsc::Sender<ServerCommand>,
    client_id: ClientId,
    outbound_buffer: usize,
) -> Result<Option<(ClientName, mpsc::Receiver<ServerMessage>)>, AppError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        framed.send(ServerMessage::SubmitName.to_string()).await?;

        let candidate = match read_line(framed).await? {
            Inbound::Line(line) => line,
            Inbound::EndOfStream => return Ok(None),
        };
        let Some(name) = ClientName::parse(candidate) else {
            debug!("Client {} sent an empty name", client_id);
            continue;
        };

        let (msg_tx, msg_rx) = mpsc::channel(outbound_buffer);
        let (reply_tx, reply_rx) = oneshot::channel();
        cmd_tx
            .send(ServerCommand::Register {
                client_id,
                name: name.clone(),
                sender: msg_tx,
                reply: reply_tx,
            })
            .await
            .map_err(|_| AppError::ChannelSend)?;

        if reply_rx.await.map_err(|_| AppError::ChannelSend)? {
            return Ok(Some((name, msg_rx)));
        }
        debug!("Client {} asked for taken name '{}'", client_id, name);
    }
}

/// Active phase: one task reads, one task writes
///
/// Whichever finishes first ends the session and the other is aborted.
async fn relay<S>(
    framed: Framed<S, LinesCodec>,
    cmd_tx: mpsc::Sender<ServerCommand>,
    client_id: ClientId,
    name: ClientName,
    mut msg_rx: mpsc::Receiver<ServerMessage>,
) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut lines) = framed.split();

    // Spawn read task (client lines -> ServerCommand)
    let read_name = name.clone();
    let mut read_task = tokio::spawn(async move {
        loop {
            match read_line(&mut lines).await? {
                Inbound::Line(line) => {
                    let cmd = ServerCommand::Deliver {
                        client_id,
                        name: read_name.clone(),
                        line,
                    };
                    if cmd_tx.send(cmd).await.is_err() {
                        debug!("Server closed, ending read task for {}", read_name);
                        return Err(AppError::ChannelSend);
                    }
                }
                Inbound::EndOfStream => {
                    debug!("Client {} closed its stream", read_name);
                    return Ok(());
                }
            }
        }
    });

    // Spawn write task (ServerMessage -> client lines)
    let write_name = name.clone();
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = msg_rx.recv().await {
            if let Err(e) = sink.send(msg.to_string()).await {
                debug!("Write to {} failed: {}", write_name, e);
                break;
            }
        }
        debug!("Write task ended for {}", write_name);
        let _ = sink.close().await;
    });

    tokio::select! {
        res = &mut read_task => {
            write_task.abort();
            debug!("Read task completed for {}", name);
            match res {
                Ok(result) => result,
                Err(e) => {
                    error!("Read task for {} failed: {}", name, e);
                    Ok(())
                }
            }
        }
        _ = &mut write_task => {
            read_task.abort();
            debug!("Write task completed for {}", name);
            Ok(())
        }
    }
}

/// Read the next line, keeping end-of-stream distinct from an empty line
async fn read_line<R>(lines: &mut R) -> Result<Inbound, AppError>
where
    R: Stream<Item = Result<String, LinesCodecError>> + Unpin,
{
    match lines.next().await {
        Some(Ok(line)) => Ok(Inbound::Line(line)),
        Some(Err(e)) => Err(e.into()),
        None => Ok(Inbound::EndOfStream),
    }
}
