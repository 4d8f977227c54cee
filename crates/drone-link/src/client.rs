//! Ground-station link client.
//!
//! One WebSocket carries everything: the one-time registration, per-tick
//! telemetry updates, and inbound commands. The link owns an IO task that
//! drains the outbound frame queue, answers pings, parses inbound command
//! frames into a channel the agent consumes, and reconnects with backoff
//! when the socket drops — replaying the registration so the ground
//! station can match the new connection to the drone it already knows.

use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use drone_core::{CommandKind, Registration, TelemetrySink, TelemetryUpdate};

use crate::backoff::Backoff;
use crate::protocol::{Inbound, Outbound};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECONNECT_BASE: Duration = Duration::from_secs(1);
const RECONNECT_MAX: Duration = Duration::from_secs(30);

/// Client end of the drone <-> ground station channel.
pub struct GroundLink {
    outbound: mpsc::UnboundedSender<Outbound>,
    commands: Option<mpsc::UnboundedReceiver<CommandKind>>,
}

impl GroundLink {
    /// Connect to the ground station and spawn the IO task.
    ///
    /// Fails only if the first connection cannot be established; once
    /// connected, later drops are handled by the reconnect loop and
    /// frames queued while the socket is down are delivered when it
    /// comes back.
    pub async fn connect(url: impl Into<String>) -> Result<GroundLink> {
        let url = url.into();
        let (socket, _) = connect_async(url.as_str()).await?;
        tracing::info!(%url, "contacted the ground station, awaiting commands");

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_io(url, socket, outbound_rx, command_tx));

        Ok(GroundLink {
            outbound: outbound_tx,
            commands: Some(command_rx),
        })
    }

    /// Queue the registration frame. The IO task re-sends it after every
    /// reconnect.
    pub fn register(&self, drone: Registration) {
        let _ = self.outbound.send(Outbound::Register { drone });
    }

    /// Take the inbound command stream. Yields `None` once the link is
    /// gone; can only be taken once.
    pub fn take_commands(&mut self) -> Option<mpsc::UnboundedReceiver<CommandKind>> {
        self.commands.take()
    }

    /// Cheap clonable handle the drone publishes telemetry through.
    pub fn sink(&self) -> LinkSink {
        LinkSink {
            outbound: self.outbound.clone(),
        }
    }
}

/// Fire-and-forget telemetry handle.
#[derive(Clone)]
pub struct LinkSink {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl TelemetrySink for LinkSink {
    fn publish(&self, update: TelemetryUpdate) {
        // A closed link drops the update; telemetry is not retried.
        let _ = self.outbound.send(Outbound::Update { update });
    }
}

#[derive(Debug, PartialEq)]
enum Session {
    /// The outbound sender side was dropped; the link is shutting down.
    Closed,
    /// The socket died; reconnect.
    Disconnected,
}

async fn run_io(
    url: String,
    socket: WsStream,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    commands: mpsc::UnboundedSender<CommandKind>,
) {
    let mut backoff = Backoff::new(RECONNECT_BASE, RECONNECT_MAX);
    let mut registration: Option<Outbound> = None;
    let mut socket = Some(socket);

    loop {
        let mut ws = match socket.take() {
            Some(ws) => ws,
            None => match connect_async(url.as_str()).await {
                Ok((ws, _)) => {
                    tracing::info!(%url, "reconnected to the ground station");
                    backoff.reset();
                    ws
                }
                Err(err) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(%url, error = %err, ?delay, "ground station unreachable, retrying");
                    tokio::time::sleep(delay).await;
                    continue;
                }
            },
        };

        // Replay a prior registration so the new connection is keyed to
        // the drone the ground station already knows.
        if let Some(frame) = &registration {
            if send_frame(&mut ws, frame).await.is_err() {
                continue;
            }
        }

        match run_session(&mut ws, &mut outbound, &commands, &mut registration).await {
            Session::Closed => return,
            Session::Disconnected => {
                tracing::warn!("lost contact with the ground station");
            }
        }
    }
}

async fn run_session(
    ws: &mut WsStream,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
    commands: &mpsc::UnboundedSender<CommandKind>,
    registration: &mut Option<Outbound>,
) -> Session {
    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    return Session::Closed;
                };
                if matches!(frame, Outbound::Register { .. }) {
                    *registration = Some(frame.clone());
                }
                if send_frame(ws, &frame).await.is_err() {
                    return Session::Disconnected;
                }
            }
            incoming = ws.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => dispatch_frame(&text, commands),
                    Some(Ok(Message::Binary(data))) => {
                        if let Ok(text) = String::from_utf8(data) {
                            dispatch_frame(&text, commands);
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if ws.send(Message::Pong(payload)).await.is_err() {
                            return Session::Disconnected;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Session::Disconnected,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => return Session::Disconnected,
                }
            }
        }
    }
}

fn dispatch_frame(text: &str, commands: &mpsc::UnboundedSender<CommandKind>) {
    match serde_json::from_str::<Inbound>(text) {
        Ok(Inbound::Command { command }) => {
            let _ = commands.send(command);
        }
        Err(err) => {
            // Unknown commands and malformed frames are ignored, not errors.
            tracing::warn!(error = %err, frame = text, "ignoring unrecognized frame");
        }
    }
}

async fn send_frame(ws: &mut WsStream, frame: &Outbound) -> Result<()> {
    let text = serde_json::to_string(frame)?;
    ws.send(Message::Text(text)).await?;
    Ok(())
}
