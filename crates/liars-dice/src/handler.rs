//! Per-connection handler: handshake, then message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version → send HandshakeAck
//!   2. Loop: inbound frames go to the room manager, room events go out
//!      to the socket, and a silent client is dropped after
//!      [`IDLE_TIMEOUT`]

use std::sync::Arc;
use std::time::Duration;

use liars_dice_protocol::{
    ClientId, Codec, Envelope, GameAction, Payload, ProtocolError,
    RoomListEntry, SystemMessage,
};
use liars_dice_room::{PlayerSender, RoomError};
use liars_dice_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::LiarsDiceError;
use crate::server::{PROTOCOL_VERSION, ServerState};

/// How long a client has to send its handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a client may stay silent before it is disconnected.
/// Clients are expected to heartbeat well within this.
const IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Drop guard that takes the client out of its room when the handler
/// exits, whatever the reason.
///
/// `Drop` is synchronous, so the leave runs in a spawned task.
struct MembershipGuard<C: Codec> {
    client: ClientId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for MembershipGuard<C> {
    fn drop(&mut self) {
        let client = self.client;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            match state.rooms.lock().await.leave_room(client).await {
                Ok(room) => {
                    tracing::info!(%client, %room, "left room on disconnect");
                }
                Err(RoomError::NotInRoom(_)) => {}
                Err(e) => {
                    tracing::debug!(%client, error = %e, "leave on disconnect failed");
                }
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), LiarsDiceError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let client = perform_handshake(&conn, &state).await?;
    tracing::info!(%conn_id, %client, "client connected");

    let _guard = MembershipGuard {
        client,
        state: Arc::clone(&state),
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut session = Session {
        conn: &conn,
        state: &state,
        client,
        events: events_tx,
        seq: 1,
    };

    let idle = tokio::time::sleep(IDLE_TIMEOUT);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%client, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%client, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut().reset(Instant::now() + IDLE_TIMEOUT);

                if session.handle_frame(&data).await? {
                    break;
                }
            }

            Some(event) = events_rx.recv() => {
                session.send(Payload::Event(event)).await?;
            }

            () = &mut idle => {
                tracing::info!(%client, "connection timed out");
                break;
            }
        }
    }

    let _ = conn.close().await;
    // _guard drops here → the client leaves its room.
    Ok(())
}

/// Receives the Handshake, checks the version, and answers with the
/// client's identity.
async fn perform_handshake<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
) -> Result<ClientId, LiarsDiceError> {
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let version = match state.codec.decode::<Envelope>(&data) {
        Ok(Envelope {
            payload: Payload::System(SystemMessage::Handshake { version }),
            ..
        }) => version,
        _ => {
            send_error(conn, state, 400, "expected Handshake", 0).await?;
            return Err(ProtocolError::InvalidMessage(
                "first message must be Handshake".into(),
            )
            .into());
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            conn,
            state,
            400,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
            0,
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    let client = ClientId(conn.id().into_inner());
    let ack = Envelope {
        seq: 0,
        timestamp: state.now_ms(),
        payload: Payload::System(SystemMessage::HandshakeAck {
            client_id: client,
            server_time: state.now_ms(),
        }),
    };
    conn.send(&state.codec.encode(&ack)?).await?;

    Ok(client)
}

/// Sends a `SystemMessage::Error` envelope outside a session.
async fn send_error<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    code: u16,
    message: &str,
    seq: u64,
) -> Result<(), LiarsDiceError> {
    let envelope = Envelope {
        seq,
        timestamp: state.now_ms(),
        payload: Payload::System(SystemMessage::Error {
            code,
            message: message.to_string(),
        }),
    };
    conn.send(&state.codec.encode(&envelope)?).await?;
    Ok(())
}

/// One handshaken client: where to write, and how to reach its room.
struct Session<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    state: &'a ServerState<C>,
    client: ClientId,
    /// Handed to any room this client sits in.
    events: PlayerSender,
    seq: u64,
}

impl<C: Codec> Session<'_, C> {
    /// Handles one inbound frame. Returns `true` if the connection should
    /// close.
    async fn handle_frame(&mut self, data: &[u8]) -> Result<bool, LiarsDiceError> {
        let envelope: Envelope = match self.state.codec.decode(data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(client = %self.client, error = %e, "failed to decode envelope");
                self.send_error(400, &format!("malformed message: {e}")).await?;
                return Ok(false);
            }
        };

        match envelope.payload {
            Payload::System(msg) => self.handle_system(msg).await,
            Payload::Action(action) => {
                self.handle_action(action).await?;
                Ok(false)
            }
            Payload::Event(_) => {
                self.send_error(400, "clients cannot send events").await?;
                Ok(false)
            }
        }
    }

    async fn handle_system(&mut self, msg: SystemMessage) -> Result<bool, LiarsDiceError> {
        let client = self.client;
        match msg {
            SystemMessage::Heartbeat { client_time } => {
                let server_time = self.state.now_ms();
                self.send(Payload::System(SystemMessage::HeartbeatAck {
                    client_time,
                    server_time,
                }))
                .await?;
            }

            SystemMessage::CreateRoom { player_name } => {
                let result = self
                    .state
                    .rooms
                    .lock()
                    .await
                    .create_room(client, player_name, self.events.clone())
                    .await;
                match result {
                    Ok((room_code, player_id)) => {
                        self.send(Payload::System(SystemMessage::RoomJoined {
                            room_code,
                            player_id,
                        }))
                        .await?;
                    }
                    Err(e) => self.send_room_error(&e).await?,
                }
            }

            SystemMessage::JoinRoom {
                room_code,
                player_name,
            } => {
                let result = self
                    .state
                    .rooms
                    .lock()
                    .await
                    .join_room(client, &room_code, player_name, self.events.clone())
                    .await;
                match result {
                    Ok(player_id) => {
                        self.send(Payload::System(SystemMessage::RoomJoined {
                            room_code,
                            player_id,
                        }))
                        .await?;
                    }
                    Err(e) => self.send_room_error(&e).await?,
                }
            }

            SystemMessage::LeaveRoom => {
                let result = self.state.rooms.lock().await.leave_room(client).await;
                match result {
                    Ok(room_code) => {
                        self.send(Payload::System(SystemMessage::RoomLeft { room_code }))
                            .await?;
                    }
                    Err(e) => self.send_room_error(&e).await?,
                }
            }

            SystemMessage::ListRooms => {
                let rooms = self
                    .state
                    .rooms
                    .lock()
                    .await
                    .list_rooms()
                    .await
                    .into_iter()
                    .map(|info| RoomListEntry {
                        room_code: info.room_code,
                        player_count: info.player_count,
                        max_players: info.max_players,
                        in_progress: info.state.is_active(),
                    })
                    .collect();
                self.send(Payload::System(SystemMessage::RoomList { rooms }))
                    .await?;
            }

            SystemMessage::Disconnect { reason } => {
                tracing::info!(%client, %reason, "client disconnected");
                return Ok(true);
            }

            other => {
                tracing::debug!(%client, message = ?other, "unexpected system message");
                self.send_error(400, "unexpected system message").await?;
            }
        }

        Ok(false)
    }

    /// Routes a game move to the client's room. Results reach every
    /// player as room events; only refusals are answered here.
    async fn handle_action(&mut self, action: GameAction) -> Result<(), LiarsDiceError> {
        let client = self.client;
        let result = {
            let rooms = self.state.rooms.lock().await;
            match action {
                GameAction::StartGame => rooms.start_game(client).await,
                GameAction::MakeBid { count, face } => {
                    rooms.make_bid(client, count, face).await
                }
                GameAction::CallLiar => rooms.call_liar(client).await.map(|_| ()),
            }
        };

        if let Err(e) = result {
            tracing::debug!(%client, error = %e, "action refused");
            self.send_room_error(&e).await?;
        }
        Ok(())
    }

    async fn send(&mut self, payload: Payload) -> Result<(), LiarsDiceError> {
        let envelope = Envelope {
            seq: next_seq(&mut self.seq),
            timestamp: self.state.now_ms(),
            payload,
        };
        self.conn.send(&self.state.codec.encode(&envelope)?).await?;
        Ok(())
    }

    async fn send_error(&mut self, code: u16, message: &str) -> Result<(), LiarsDiceError> {
        self.send(Payload::System(SystemMessage::Error {
            code,
            message: message.to_string(),
        }))
        .await
    }

    async fn send_room_error(&mut self, err: &RoomError) -> Result<(), LiarsDiceError> {
        self.send_error(err.code(), &err.to_string()).await
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

#[cfg(test)]
mod tests {
    use liars_dice_protocol::{GameEvent, JsonCodec};

    use super::*;

    #[test]
    fn test_next_seq_counts_up() {
        let mut seq = 1;
        assert_eq!(next_seq(&mut seq), 1);
        assert_eq!(next_seq(&mut seq), 2);
        assert_eq!(seq, 3);
    }

    #[test]
    fn test_room_event_frame_format() {
        let bytes = JsonCodec
            .encode(&Payload::Event(GameEvent::GameStarted))
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"type":"Event","data":{"type":"GameStarted"}}"#
        );
    }
}
