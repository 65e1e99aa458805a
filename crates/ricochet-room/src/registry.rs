//! Room registry: creates room actors on demand, tracks which room each
//! player is in, and tears rooms down when the last player leaves.
//!
//! The registry itself is a plain map; the server wraps it in a mutex and
//! only holds the lock long enough to resolve a handle. All the real work
//! happens inside the room actors.

use std::collections::HashMap;

use ricochet_protocol::{ClientIntent, PlayerId};

use crate::room::{PlayerSender, RoomHandle, RoomInfo, spawn_room};
use crate::{RoomConfig, RoomError};

/// Owns every live room actor handle and the player-to-room index.
pub struct RoomRegistry {
    config: RoomConfig,
    rooms: HashMap<String, RoomHandle>,
    player_rooms: HashMap<PlayerId, String>,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    /// Seats a player in the named room, creating the room if it does not
    /// exist yet. On success the player's mapping is recorded so later
    /// intents and the eventual disconnect route to the right actor.
    pub async fn join(
        &mut self,
        room_name: &str,
        player_id: PlayerId,
        display_name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if let Some(existing) = self.player_rooms.get(&player_id) {
            // One room per connection; rejoining the same room counts.
            return Err(RoomError::AlreadyInRoom(existing.clone()));
        }

        let created = !self.rooms.contains_key(room_name);
        let handle = self
            .rooms
            .entry(room_name.to_string())
            .or_insert_with(|| spawn_room(room_name.to_string(), self.config.clone()))
            .clone();
        if created {
            tracing::info!(room = room_name, "room created");
        }

        match handle.join(player_id, display_name, sender).await {
            Ok(()) => {
                self.player_rooms.insert(player_id, room_name.to_string());
                Ok(())
            }
            Err(err) => {
                // A join rejection against a room we just created leaves
                // it empty; reap it rather than leak the actor.
                if created {
                    self.remove_room(room_name).await;
                }
                Err(err)
            }
        }
    }

    /// Routes an intent from a joined player to their room.
    pub async fn intent(
        &self,
        player_id: PlayerId,
        intent: ClientIntent,
    ) -> Result<(), RoomError> {
        let handle = self.handle_for(player_id)?;
        handle.send_intent(player_id, intent).await
    }

    /// Removes a player on disconnect, deleting the room if it emptied.
    pub async fn leave(&mut self, player_id: PlayerId) -> Result<(), RoomError> {
        let Some(room_name) = self.player_rooms.remove(&player_id) else {
            return Err(RoomError::NotInRoom(player_id));
        };
        let Some(handle) = self.rooms.get(&room_name).cloned() else {
            return Ok(());
        };
        let now_empty = handle.leave(player_id).await?;
        if now_empty {
            self.remove_room(&room_name).await;
        }
        Ok(())
    }

    /// Room the player currently occupies, if any.
    pub fn room_of(&self, player_id: PlayerId) -> Option<&str> {
        self.player_rooms.get(&player_id).map(String::as_str)
    }

    /// Metadata for every live room.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                infos.push(info);
            }
        }
        infos
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Shuts every room down. Used on server shutdown.
    pub async fn shutdown_all(&mut self) {
        for (_, handle) in self.rooms.drain() {
            let _ = handle.shutdown().await;
        }
        self.player_rooms.clear();
    }

    fn handle_for(&self, player_id: PlayerId) -> Result<RoomHandle, RoomError> {
        let room_name = self
            .player_rooms
            .get(&player_id)
            .ok_or(RoomError::NotInRoom(player_id))?;
        self.rooms
            .get(room_name)
            .cloned()
            .ok_or_else(|| RoomError::Unavailable(room_name.clone()))
    }

    async fn remove_room(&mut self, room_name: &str) {
        if let Some(handle) = self.rooms.remove(room_name) {
            let _ = handle.shutdown().await;
            tracing::info!(room = room_name, "room removed");
        }
    }
}
