//! Room manager: creates, tracks, and routes clients to rooms.

use std::collections::HashMap;

use liars_dice_engine::{Challenge, Die, PlayerId};
use liars_dice_protocol::{ClientId, RoomCode};

use crate::code;
use crate::room::spawn_room;
use crate::{PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Every live room, and which room each client sits in.
///
/// A client is in at most one room at a time. A room is destroyed as soon
/// as its last member leaves.
pub struct RoomManager {
    config: RoomConfig,
    rooms: HashMap<RoomCode, RoomHandle>,
    client_rooms: HashMap<ClientId, RoomCode>,
}

impl RoomManager {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
            client_rooms: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Opens a room under a fresh code and seats `client` as its creator.
    pub async fn create_room(
        &mut self,
        client: ClientId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(RoomCode, PlayerId), RoomError> {
        self.ensure_not_seated(client)?;

        let room_code = loop {
            let candidate = code::generate(self.config.code_len);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let handle = spawn_room(
            room_code.clone(),
            self.config.clone(),
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(room_code.clone(), handle.clone());
        tracing::info!(room = %room_code, %client, "room created");

        match handle.join(client, name, sender).await {
            Ok(player_id) => {
                self.client_rooms.insert(client, room_code.clone());
                Ok((room_code, player_id))
            }
            Err(e) => {
                // Nobody sits in it, so it must not linger.
                let _ = self.destroy_room(&room_code).await;
                Err(e)
            }
        }
    }

    /// Seats `client` in an existing room.
    pub async fn join_room(
        &mut self,
        client: ClientId,
        room_code: &RoomCode,
        name: String,
        sender: PlayerSender,
    ) -> Result<PlayerId, RoomError> {
        self.ensure_not_seated(client)?;

        let handle = self
            .rooms
            .get(room_code)
            .ok_or_else(|| RoomError::NotFound(room_code.clone()))?;

        let player_id = handle.join(client, name, sender).await?;
        self.client_rooms.insert(client, room_code.clone());
        Ok(player_id)
    }

    /// Removes `client` from their room and returns its code. Destroys the
    /// room if nobody is left.
    pub async fn leave_room(
        &mut self,
        client: ClientId,
    ) -> Result<RoomCode, RoomError> {
        let room_code = self
            .client_rooms
            .remove(&client)
            .ok_or(RoomError::NotInRoom(client))?;

        let remaining = match self.rooms.get(&room_code) {
            Some(handle) => handle.leave(client).await,
            None => Ok(0),
        };

        match remaining {
            Ok(0) | Err(RoomError::Unavailable(_)) => {
                let _ = self.destroy_room(&room_code).await;
            }
            Ok(_) => {}
            Err(e) => return Err(e),
        }
        Ok(room_code)
    }

    /// Asks `client`'s room to start a match.
    pub async fn start_game(&self, client: ClientId) -> Result<(), RoomError> {
        self.handle_for(client)?.start_game(client).await
    }

    pub async fn make_bid(
        &self,
        client: ClientId,
        count: u32,
        face: Die,
    ) -> Result<(), RoomError> {
        self.handle_for(client)?.make_bid(client, count, face).await
    }

    pub async fn call_liar(
        &self,
        client: ClientId,
    ) -> Result<Challenge, RoomError> {
        self.handle_for(client)?.call_liar(client).await
    }

    pub async fn get_room_info(
        &self,
        room_code: &RoomCode,
    ) -> Result<RoomInfo, RoomError> {
        self.rooms
            .get(room_code)
            .ok_or_else(|| RoomError::NotFound(room_code.clone()))?
            .get_info()
            .await
    }

    /// Shuts down a room and removes all its clients from the index.
    pub async fn destroy_room(
        &mut self,
        room_code: &RoomCode,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(room_code)
            .ok_or_else(|| RoomError::NotFound(room_code.clone()))?;

        let _ = handle.shutdown().await;
        self.client_rooms.retain(|_, code| code != room_code);

        tracing::info!(room = %room_code, "room destroyed");
        Ok(())
    }

    /// Returns the code of the room `client` sits in, if any.
    pub fn player_room(&self, client: ClientId) -> Option<&RoomCode> {
        self.client_rooms.get(&client)
    }

    /// Lists rooms that still seat newcomers and have a free seat.
    ///
    /// Rooms that fail to answer (shutting down) are skipped.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                if info.state.is_joinable() && info.player_count < info.max_players {
                    infos.push(info);
                }
            }
        }
        infos.sort_by(|a, b| a.room_code.as_str().cmp(b.room_code.as_str()));
        infos
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn ensure_not_seated(&self, client: ClientId) -> Result<(), RoomError> {
        match self.client_rooms.get(&client) {
            Some(current) => Err(RoomError::AlreadyInRoom(client, current.clone())),
            None => Ok(()),
        }
    }

    fn handle_for(&self, client: ClientId) -> Result<&RoomHandle, RoomError> {
        let room_code = self
            .client_rooms
            .get(&client)
            .ok_or(RoomError::NotInRoom(client))?;
        self.rooms
            .get(room_code)
            .ok_or_else(|| RoomError::NotFound(room_code.clone()))
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
