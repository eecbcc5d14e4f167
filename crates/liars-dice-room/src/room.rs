//! Room actor: a Tokio task that owns one match.
//!
//! Each room runs in its own task and is driven through an mpsc channel.
//! Every command for a room is handled to completion before the next one
//! is read, so the [`Game`] inside never sees two operations at once.

use std::collections::HashMap;

use liars_dice_engine::{Challenge, Die, Game, PlayerId};
use liars_dice_protocol::{ClientId, GameEvent, RoomCode};
use tokio::sync::{mpsc, oneshot};

use crate::{RoomConfig, RoomError, RoomState};

/// Channel for delivering room events to one client's connection handler.
pub type PlayerSender = mpsc::UnboundedSender<GameEvent>;

/// Commands sent to a room actor through its channel.
///
/// Every request carries a `oneshot` reply so callers learn whether it was
/// accepted.
pub(crate) enum RoomCommand {
    Join {
        client: ClientId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<PlayerId, RoomError>>,
    },

    /// Replies with the number of members left afterwards.
    Leave {
        client: ClientId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    Start {
        client: ClientId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Bid {
        client: ClientId,
        count: u32,
        face: Die,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    CallLiar {
        client: ClientId,
        reply: oneshot::Sender<Result<Challenge, RoomError>>,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// A snapshot of room metadata (not the match itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_code: RoomCode,
    pub state: RoomState,
    /// Seated members, eliminated or not.
    pub player_count: usize,
    pub max_players: usize,
    pub creator: Option<ClientId>,
}

/// Handle to a running room actor.
///
/// Cheap to clone; the [`RoomManager`](crate::RoomManager) holds one per
/// room.
#[derive(Clone)]
pub struct RoomHandle {
    room_code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    /// Seats `client` under `name`. Room events for them go to `sender`.
    pub async fn join(
        &self,
        client: ClientId,
        name: String,
        sender: PlayerSender,
    ) -> Result<PlayerId, RoomError> {
        self.request(|reply| RoomCommand::Join {
            client,
            name,
            sender,
            reply,
        })
        .await?
    }

    /// Removes `client`, returning how many members remain.
    pub async fn leave(&self, client: ClientId) -> Result<usize, RoomError> {
        self.request(|reply| RoomCommand::Leave { client, reply })
            .await?
    }

    pub async fn start_game(&self, client: ClientId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { client, reply })
            .await?
    }

    pub async fn make_bid(
        &self,
        client: ClientId,
        count: u32,
        face: Die,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Bid {
            client,
            count,
            face,
            reply,
        })
        .await?
    }

    pub async fn call_liar(
        &self,
        client: ClientId,
    ) -> Result<Challenge, RoomError> {
        self.request(|reply| RoomCommand::CallLiar { client, reply })
            .await?
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_code.clone()))
    }

    /// Sends a command and waits for the actor's reply.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_code.clone()))
    }
}

struct Member {
    player_id: PlayerId,
    sender: PlayerSender,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_code: RoomCode,
    state: RoomState,
    config: RoomConfig,
    game: Game,
    members: HashMap<ClientId, Member>,
    creator: Option<ClientId>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room = %self.room_code, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    client,
                    name,
                    sender,
                    reply,
                } => {
                    let _ = reply.send(self.handle_join(client, name, sender));
                }
                RoomCommand::Leave { client, reply } => {
                    let _ = reply.send(self.handle_leave(client));
                }
                RoomCommand::Start { client, reply } => {
                    let _ = reply.send(self.handle_start(client));
                }
                RoomCommand::Bid {
                    client,
                    count,
                    face,
                    reply,
                } => {
                    let _ = reply.send(self.handle_bid(client, count, face));
                }
                RoomCommand::CallLiar { client, reply } => {
                    let _ = reply.send(self.handle_call_liar(client));
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(
                        room = %self.room_code,
                        from = %self.state,
                        "room shutting down"
                    );
                    break;
                }
            }
        }

        tracing::info!(room = %self.room_code, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        client: ClientId,
        name: String,
        sender: PlayerSender,
    ) -> Result<PlayerId, RoomError> {
        if !self.state.is_joinable() {
            return Err(RoomError::InvalidState(format!(
                "cannot join room in state {}",
                self.state
            )));
        }
        if self.members.contains_key(&client) {
            return Err(RoomError::AlreadyInRoom(client, self.room_code.clone()));
        }
        if self.members.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.room_code.clone()));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(RoomError::InvalidName("name cannot be empty".into()));
        }
        if self.game.players().any(|p| p.name == name) {
            return Err(RoomError::NameTaken(name.to_string()));
        }

        let player_id = self.game.add_player(name);
        self.members.insert(client, Member { player_id, sender });
        self.creator.get_or_insert(client);

        tracing::info!(
            room = %self.room_code,
            %client,
            player = %player_id,
            players = self.members.len(),
            "player joined"
        );

        self.send_dice(client);
        self.broadcast_state();
        Ok(player_id)
    }

    fn handle_leave(&mut self, client: ClientId) -> Result<usize, RoomError> {
        let member = self
            .members
            .remove(&client)
            .ok_or(RoomError::NotInRoom(client))?;
        self.game.remove_player(member.player_id);

        if self.creator == Some(client) {
            self.creator = self
                .members
                .iter()
                .min_by_key(|(_, m)| m.player_id)
                .map(|(&id, _)| id);
        }

        tracing::info!(
            room = %self.room_code,
            %client,
            player = %member.player_id,
            players = self.members.len(),
            "player left"
        );

        if self.state.is_active() {
            if let Some(winner) = self.game.game_over() {
                self.finish_match(winner);
                self.send_dice_to_all();
            } else if self.game.active_count() == 0 {
                // Only late joiners are left.
                self.game.restart_game();
                self.state = RoomState::WaitingForPlayers;
                self.send_dice_to_all();
            }
        }

        self.broadcast_state();
        Ok(self.members.len())
    }

    fn handle_start(&mut self, client: ClientId) -> Result<(), RoomError> {
        self.member(client)?;
        if self.creator != Some(client) {
            return Err(RoomError::NotCreator);
        }
        if self.state != RoomState::WaitingForPlayers {
            return Err(RoomError::InvalidState("game already in progress".into()));
        }
        let have = self.members.len();
        if have < self.config.min_players {
            return Err(RoomError::NotEnoughPlayers {
                have,
                need: self.config.min_players,
            });
        }

        self.game.start();
        self.state = RoomState::InProgress;
        tracing::info!(room = %self.room_code, players = have, "game started");

        self.broadcast(GameEvent::GameStarted);
        self.broadcast_state();
        self.send_dice_to_all();
        Ok(())
    }

    fn handle_bid(
        &mut self,
        client: ClientId,
        count: u32,
        face: Die,
    ) -> Result<(), RoomError> {
        let player_id = self.playing_member(client)?;
        self.game.make_bid(player_id, count, face)?;

        if let Some(bid) = self.game.bid() {
            self.broadcast(GameEvent::BidPlaced { player_id, bid });
        }
        self.broadcast_state();
        Ok(())
    }

    fn handle_call_liar(
        &mut self,
        client: ClientId,
    ) -> Result<Challenge, RoomError> {
        let player_id = self.playing_member(client)?;
        let challenge = self.game.call_liar(player_id)?;

        self.broadcast(GameEvent::ChallengeResolved {
            challenge: challenge.clone(),
        });
        if let Some(winner) = self.game.game_over() {
            self.finish_match(winner);
        }
        self.broadcast_state();
        self.send_dice_to_all();
        Ok(challenge)
    }

    /// The game has already been reset by `game_over`.
    fn finish_match(&mut self, winner: String) {
        tracing::info!(room = %self.room_code, %winner, "match over");
        self.state = RoomState::WaitingForPlayers;
        self.broadcast(GameEvent::MatchOver { winner });
    }

    fn member(&self, client: ClientId) -> Result<&Member, RoomError> {
        self.members
            .get(&client)
            .ok_or(RoomError::NotInRoom(client))
    }

    /// Looks up a member's seat, failing unless a match is being played.
    fn playing_member(&self, client: ClientId) -> Result<PlayerId, RoomError> {
        let player_id = self.member(client)?.player_id;
        if !self.state.is_active() {
            return Err(RoomError::InvalidState("game not in progress".into()));
        }
        Ok(player_id)
    }

    fn broadcast(&self, event: GameEvent) {
        for member in self.members.values() {
            let _ = member.sender.send(event.clone());
        }
    }

    fn broadcast_state(&self) {
        self.broadcast(GameEvent::State {
            state: self.game.public_state(),
        });
    }

    /// Sends one member their own dice. Nobody else's dice leave the room.
    fn send_dice(&self, client: ClientId) {
        let Some(member) = self.members.get(&client) else {
            return;
        };
        if let Ok(dice) = self.game.player_dice(member.player_id) {
            let _ = member.sender.send(GameEvent::Dice {
                dice: dice.to_vec(),
            });
        }
    }

    fn send_dice_to_all(&self) {
        for &client in self.members.keys() {
            self.send_dice(client);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_code: self.room_code.clone(),
            state: self.state,
            player_count: self.members.len(),
            max_players: self.config.max_players,
            creator: self.creator,
        }
    }
}

/// Spawns a room actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room(
    room_code: RoomCode,
    config: RoomConfig,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room_code: room_code.clone(),
        state: RoomState::WaitingForPlayers,
        config,
        game: Game::new(),
        members: HashMap::new(),
        creator: None,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_code,
        sender: tx,
    }
}
