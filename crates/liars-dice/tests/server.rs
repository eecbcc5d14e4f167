//! Integration tests for the server: real WebSocket clients speaking JSON.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use liars_dice::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    start_server_with(RoomConfig::default()).await
}

async fn start_server_with(config: RoomConfig) -> String {
    let server = LiarsDiceServer::builder()
        .bind("127.0.0.1:0")
        .room_config(config)
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

fn text_frame(payload: Payload, seq: u64) -> Message {
    let envelope = Envelope {
        seq,
        timestamp: 0,
        payload,
    };
    let json = serde_json::to_string(&envelope).expect("encode");
    Message::Text(json.into())
}

async fn next_payload(ws: &mut ClientWs) -> Payload {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("server should answer within 2s")
        .expect("stream should stay open")
        .expect("frame should be valid");
    let envelope: Envelope = serde_json::from_slice(&msg.into_data()).expect("decode");
    envelope.payload
}

/// A connected, handshaken browser-like client.
struct Player {
    ws: ClientWs,
    seq: u64,
    id: ClientId,
}

impl Player {
    async fn connect(addr: &str) -> Self {
        let mut ws = connect(addr).await;
        ws.send(text_frame(
            Payload::System(SystemMessage::Handshake {
                version: PROTOCOL_VERSION,
            }),
            0,
        ))
        .await
        .expect("send handshake");

        match next_payload(&mut ws).await {
            Payload::System(SystemMessage::HandshakeAck { client_id, .. }) => Self {
                ws,
                seq: 1,
                id: client_id,
            },
            other => panic!("expected HandshakeAck, got {other:?}"),
        }
    }

    async fn send(&mut self, payload: Payload) {
        self.seq += 1;
        self.ws
            .send(text_frame(payload, self.seq))
            .await
            .expect("send");
    }

    async fn system(&mut self, msg: SystemMessage) {
        self.send(Payload::System(msg)).await;
    }

    async fn action(&mut self, action: GameAction) {
        self.send(Payload::Action(action)).await;
    }

    /// Reads payloads until `pick` accepts one, skipping the rest.
    async fn recv_until<T>(&mut self, mut pick: impl FnMut(Payload) -> Option<T>) -> T {
        for _ in 0..50 {
            if let Some(found) = pick(next_payload(&mut self.ws).await) {
                return found;
            }
        }
        panic!("expected payload never arrived");
    }

    async fn expect_error(&mut self) -> u16 {
        self.recv_until(|p| match p {
            Payload::System(SystemMessage::Error { code, .. }) => Some(code),
            _ => None,
        })
        .await
    }

    async fn expect_event(&mut self, mut pick: impl FnMut(&GameEvent) -> bool) -> GameEvent {
        self.recv_until(|p| match p {
            Payload::Event(event) if pick(&event) => Some(event),
            _ => None,
        })
        .await
    }

    async fn create_room(&mut self, name: &str) -> (RoomCode, PlayerId) {
        self.system(SystemMessage::CreateRoom {
            player_name: name.into(),
        })
        .await;
        self.recv_until(|p| match p {
            Payload::System(SystemMessage::RoomJoined {
                room_code,
                player_id,
            }) => Some((room_code, player_id)),
            _ => None,
        })
        .await
    }

    async fn join_room(&mut self, code: &str, name: &str) -> PlayerId {
        self.system(SystemMessage::JoinRoom {
            room_code: RoomCode::parse(code).expect("valid code"),
            player_name: name.into(),
        })
        .await;
        self.recv_until(|p| match p {
            Payload::System(SystemMessage::RoomJoined { player_id, .. }) => Some(player_id),
            Payload::System(SystemMessage::Error { message, .. }) => {
                panic!("join refused: {message}")
            }
            _ => None,
        })
        .await
    }
}

/// `ana` creates a room and `ben` joins it.
async fn two_players(addr: &str) -> (Player, Player, RoomCode) {
    let mut ana = Player::connect(addr).await;
    let mut ben = Player::connect(addr).await;
    let (code, _) = ana.create_room("ana").await;
    ben.join_room(code.as_str(), "ben").await;
    (ana, ben, code)
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_handshake_success() {
    let addr = start_server().await;
    let first = Player::connect(&addr).await;
    let second = Player::connect(&addr).await;

    assert!(first.id.0 > 0);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_handshake_version_mismatch() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(text_frame(
        Payload::System(SystemMessage::Handshake { version: 999 }),
        0,
    ))
    .await
    .expect("send");

    match next_payload(&mut ws).await {
        Payload::System(SystemMessage::Error { code, message }) => {
            assert_eq!(code, 400);
            assert!(message.contains("version mismatch"));
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handshake_non_handshake_first_message() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(text_frame(Payload::System(SystemMessage::ListRooms), 0))
        .await
        .expect("send");

    match next_payload(&mut ws).await {
        Payload::System(SystemMessage::Error { code, .. }) => assert_eq!(code, 400),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_heartbeat_response() {
    let addr = start_server().await;
    let mut ana = Player::connect(&addr).await;

    ana.system(SystemMessage::Heartbeat { client_time: 1234 }).await;

    let echoed = ana
        .recv_until(|p| match p {
            Payload::System(SystemMessage::HeartbeatAck { client_time, .. }) => {
                Some(client_time)
            }
            _ => None,
        })
        .await;
    assert_eq!(echoed, 1234);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection() {
    let addr = start_server().await;
    let mut ana = Player::connect(&addr).await;

    ana.ws
        .send(Message::Text("not json".to_owned().into()))
        .await
        .unwrap();
    assert_eq!(ana.expect_error().await, 400);

    ana.system(SystemMessage::Heartbeat { client_time: 1 }).await;
    ana.recv_until(|p| matches!(p, Payload::System(SystemMessage::HeartbeatAck { .. })).then_some(()))
        .await;
}

// =========================================================================
// Rooms
// =========================================================================

#[tokio::test]
async fn test_create_and_join_room() {
    let addr = start_server().await;
    let mut ana = Player::connect(&addr).await;
    let mut ben = Player::connect(&addr).await;

    let (code, ana_id) = ana.create_room("ana").await;
    assert_eq!(ana_id, PlayerId(0));
    assert_eq!(code.as_str().len(), 6);

    // Codes may be typed in any case.
    let ben_id = ben.join_room(&code.as_str().to_lowercase(), "ben").await;
    assert_eq!(ben_id, PlayerId(1));

    let event = ana
        .expect_event(|e| matches!(e, GameEvent::State { state } if state.players.len() == 2))
        .await;
    let GameEvent::State { state } = event else {
        unreachable!()
    };
    assert_eq!(state.players[1].name, "ben");
    assert!(!state.started);
}

#[tokio::test]
async fn test_join_room_not_found() {
    let addr = start_server().await;
    let mut ana = Player::connect(&addr).await;

    ana.system(SystemMessage::JoinRoom {
        room_code: RoomCode::parse("ZZZZZZ").unwrap(),
        player_name: "ana".into(),
    })
    .await;

    assert_eq!(ana.expect_error().await, 404);
}

#[tokio::test]
async fn test_join_room_duplicate_name() {
    let addr = start_server().await;
    let mut ana = Player::connect(&addr).await;
    let mut imposter = Player::connect(&addr).await;
    let (code, _) = ana.create_room("ana").await;

    imposter
        .system(SystemMessage::JoinRoom {
            room_code: code,
            player_name: "ana".into(),
        })
        .await;

    assert_eq!(imposter.expect_error().await, 409);
}

#[tokio::test]
async fn test_join_room_full() {
    let addr = start_server_with(RoomConfig {
        max_players: 2,
        ..RoomConfig::default()
    })
    .await;
    let (_ana, _ben, code) = two_players(&addr).await;
    let mut cy = Player::connect(&addr).await;

    cy.system(SystemMessage::JoinRoom {
        room_code: code,
        player_name: "cy".into(),
    })
    .await;

    assert_eq!(cy.expect_error().await, 409);
}

#[tokio::test]
async fn test_list_rooms() {
    let addr = start_server().await;
    let mut ana = Player::connect(&addr).await;
    let mut lobby = Player::connect(&addr).await;
    let (code, _) = ana.create_room("ana").await;

    lobby.system(SystemMessage::ListRooms).await;
    let rooms = lobby
        .recv_until(|p| match p {
            Payload::System(SystemMessage::RoomList { rooms }) => Some(rooms),
            _ => None,
        })
        .await;

    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_code, code);
    assert_eq!(rooms[0].player_count, 1);
    assert_eq!(rooms[0].max_players, 6);
    assert!(!rooms[0].in_progress);
}

#[tokio::test]
async fn test_leave_room_acknowledged() {
    let addr = start_server().await;
    let (_ana, mut ben, code) = two_players(&addr).await;

    ben.system(SystemMessage::LeaveRoom).await;
    let left = ben
        .recv_until(|p| match p {
            Payload::System(SystemMessage::RoomLeft { room_code }) => Some(room_code),
            _ => None,
        })
        .await;
    assert_eq!(left, code);

    ben.system(SystemMessage::LeaveRoom).await;
    assert_eq!(ben.expect_error().await, 404);
}

// =========================================================================
// Playing
// =========================================================================

#[tokio::test]
async fn test_action_outside_room() {
    let addr = start_server().await;
    let mut ana = Player::connect(&addr).await;

    ana.action(GameAction::CallLiar).await;

    assert_eq!(ana.expect_error().await, 404);
}

#[tokio::test]
async fn test_start_game_requires_creator() {
    let addr = start_server().await;
    let (_ana, mut ben, _code) = two_players(&addr).await;

    ben.action(GameAction::StartGame).await;

    assert_eq!(ben.expect_error().await, 403);
}

#[tokio::test]
async fn test_bidding_round_over_websocket() {
    let addr = start_server().await;
    let (mut ana, mut ben, _code) = two_players(&addr).await;

    ana.action(GameAction::StartGame).await;
    for player in [&mut ana, &mut ben] {
        player
            .expect_event(|e| matches!(e, GameEvent::GameStarted))
            .await;
        let dice = player
            .expect_event(|e| matches!(e, GameEvent::Dice { dice } if !dice.is_empty()))
            .await;
        assert!(matches!(dice, GameEvent::Dice { dice } if dice.len() == 6));
    }

    // Out of turn.
    ben.action(GameAction::MakeBid { count: 1, face: 2 }).await;
    assert_eq!(ben.expect_error().await, 400);

    let opening = Bid { count: 2, face: 3 };
    ana.action(GameAction::MakeBid { count: 2, face: 3 }).await;
    ben.expect_event(|e| {
        matches!(e, GameEvent::BidPlaced { player_id, bid }
            if *player_id == PlayerId(0) && *bid == opening)
    })
    .await;

    // 1x5 = 5 does not beat 2x3 = 6.
    ben.action(GameAction::MakeBid { count: 1, face: 5 }).await;
    assert_eq!(ben.expect_error().await, 400);

    ben.action(GameAction::CallLiar).await;
    for player in [&mut ana, &mut ben] {
        let resolved = player
            .expect_event(|e| matches!(e, GameEvent::ChallengeResolved { .. }))
            .await;
        let GameEvent::ChallengeResolved { challenge } = resolved else {
            unreachable!()
        };
        assert_eq!(challenge.challenger, PlayerId(1));
        assert_eq!(challenge.bidder, PlayerId(0));
        assert_eq!(challenge.bid, opening);
    }
}

#[tokio::test]
async fn test_disconnect_mid_match_hands_win_to_opponent() {
    let addr = start_server().await;
    let (mut ana, mut ben, _code) = two_players(&addr).await;

    ana.action(GameAction::StartGame).await;
    ben.expect_event(|e| matches!(e, GameEvent::GameStarted)).await;

    ana.ws.close(None).await.expect("close");

    let over = ben
        .expect_event(|e| matches!(e, GameEvent::MatchOver { .. }))
        .await;
    assert_eq!(over, GameEvent::MatchOver { winner: "ben".into() });
}

#[tokio::test]
async fn test_disconnect_message_closes_connection() {
    let addr = start_server().await;
    let mut ana = Player::connect(&addr).await;

    ana.system(SystemMessage::Disconnect {
        reason: "bye".into(),
    })
    .await;

    // The server closes; the stream ends with a close frame or EOF.
    let next = tokio::time::timeout(Duration::from_secs(2), ana.ws.next())
        .await
        .expect("server should close promptly");
    assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));
}
