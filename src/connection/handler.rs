// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::guard::ConnectionGuard;
use super::session::SessionState;
use crate::core::commands::Outcome;
use crate::core::metrics;
use crate::core::protocol::{InboundLine, LineCodec, Reply};
use crate::core::state::{ControlReceiver, ControlSignal, ServerState};
use crate::core::{Command, MemoryDbError};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// The next step for the connection's main loop to take.
enum NextAction {
    Continue,
    ExitLoop,
}

/// Serves one client connection over any byte stream.
pub struct ConnectionHandler<S> {
    framed: Framed<S, LineCodec>,
    state: Arc<ServerState>,
    guard: ConnectionGuard,
    control_rx: ControlReceiver,
    session: SessionState,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a handler for an already-registered connection.
    pub fn new(
        stream: S,
        state: Arc<ServerState>,
        guard: ConnectionGuard,
        control_rx: ControlReceiver,
    ) -> Self {
        let codec = LineCodec::new(state.config.max_line_length);
        Self {
            framed: Framed::new(stream, codec),
            state,
            guard,
            control_rx,
            session: SessionState::Greeting,
        }
    }

    /// Runs the session to completion. Consumes the handler, so the stream is
    /// released and the connection deregistered when this returns.
    ///
    /// An `Err` means a reply could not be written; it concerns this session
    /// only.
    pub async fn run(mut self) -> Result<(), MemoryDbError> {
        self.framed.send(Reply::Welcome).await?;
        self.session = SessionState::Serving;
        debug!(
            "Connection {} ({}) is now {}.",
            self.guard.id(),
            self.guard.addr(),
            self.session
        );

        let result = self.serve().await;
        self.session = SessionState::Closed;
        debug!("Connection {} is now {}.", self.guard.id(), self.session);
        result
    }

    /// The main event loop: control signals take priority over client input.
    async fn serve(&mut self) -> Result<(), MemoryDbError> {
        loop {
            tokio::select! {
                biased;
                signal = self.control_rx.recv() => match signal {
                    Some(ControlSignal::Notice(message)) => {
                        self.framed.send(Reply::Notice(message)).await?;
                    }
                    Some(ControlSignal::Close) => {
                        info!("Closing connection {} on server request.", self.guard.addr());
                        return Ok(());
                    }
                    None => {
                        debug!("Control channel for {} closed; ending session.", self.guard.addr());
                        return Ok(());
                    }
                },
                line = self.framed.next() => match line {
                    Some(Ok(line)) => {
                        if let NextAction::ExitLoop = self.process_line(line).await? {
                            return Ok(());
                        }
                    }
                    Some(Err(e)) => {
                        if e.is_normal_disconnect() {
                            debug!("Connection from {} closed by peer: {}", self.guard.addr(), e);
                        } else {
                            warn!("Connection error for {}: {}", self.guard.addr(), e);
                        }
                        return Ok(());
                    }
                    None => {
                        debug!("Connection from {} closed by peer.", self.guard.addr());
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Executes one inbound line and writes its reply.
    async fn process_line(&mut self, line: InboundLine) -> Result<NextAction, MemoryDbError> {
        let reply = match line {
            InboundLine::Overlong => {
                let limit = self.framed.codec().max_length();
                debug!(
                    "Connection {} sent a line longer than {} bytes.",
                    self.guard.addr(),
                    limit
                );
                Reply::Error(MemoryDbError::LineTooLong(limit).to_string())
            }
            InboundLine::Text(text) => {
                let command = Command::parse(&text);
                metrics::COMMANDS_PROCESSED_TOTAL.inc();
                if let Command::Unknown(_) = command {
                    metrics::UNKNOWN_COMMANDS_TOTAL.inc();
                }
                debug!(
                    "Connection {}: received command: {}",
                    self.guard.id(),
                    command.name()
                );
                match command.execute(&self.state.store) {
                    Outcome::Reply(reply) => reply,
                    Outcome::CloseSession => {
                        debug!("Client {} sent exit.", self.guard.addr());
                        return Ok(NextAction::ExitLoop);
                    }
                }
            }
        };
        self.framed.send(reply).await?;
        Ok(NextAction::Continue)
    }
}
