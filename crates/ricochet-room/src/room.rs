//! Room actor: an isolated Tokio task that owns one room end to end —
//! lobby membership, host role, chat, the running game, and the phase
//! timers.
//!
//! All mutation enters through the actor's mpsc mailbox and is processed
//! one command at a time, which is what makes multi-field game updates
//! (chamber index, counts, turn) safe without locks. Phase delays are
//! spawned sleepers that send a [`RoomCommand::PhaseTimer`] back into the
//! same mailbox; each timer carries the epoch it was scheduled under and
//! is dropped if the room's epoch has moved on (restart, new game,
//! teardown). The actor's event dispatch is the only place outward events
//! are produced.

use std::collections::VecDeque;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};

use ricochet_game::{ActionError, Events, GameState};
use ricochet_protocol::{
    ClientIntent, MatchSettings, MemberPublic, PlayerId, Recipient,
    RejectReason, ServerEvent,
};

use crate::{RoomConfig, RoomError};

/// Channel sender for delivering events to a player's connection handler.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Which phase transition a timer should drive when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhaseStep {
    /// Load and announce a fresh chamber.
    Round,
    /// Deal the item shipment.
    Loot,
    /// Announce the current turn and open the action window.
    Turn,
}

/// Commands sent to a room actor through its mailbox.
pub(crate) enum RoomCommand {
    /// Add a player to the room.
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player (disconnect). Replies with `true` when the room is
    /// now empty and should be deleted.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<bool>,
    },

    /// A decoded intent from a joined player.
    Intent {
        player_id: PlayerId,
        intent: ClientIntent,
    },

    /// A phase timer fired. Ignored unless `epoch` is still current.
    PhaseTimer { epoch: u64, step: PhaseStep },

    /// Request room metadata.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the actor.
    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub name: String,
    pub player_count: usize,
    pub capacity: usize,
    pub game_active: bool,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    name: String,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asks the room to seat a player.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))?
    }

    /// Removes a player. Returns `true` when the room emptied out.
    pub async fn leave(&self, player_id: PlayerId) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    /// Forwards an intent (fire-and-forget; outcomes arrive as events).
    pub async fn send_intent(
        &self,
        player_id: PlayerId,
        intent: ClientIntent,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Intent { player_id, intent })
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.name.clone()))
    }
}

/// A seated member. Join order is preserved: the member at index 0 is
/// always the host, which makes host migration on disconnect the
/// "earliest-joined remaining member" rule for free.
struct Member {
    id: PlayerId,
    name: String,
    ready: bool,
    sender: PlayerSender,
}

struct ChatLine {
    from: PlayerId,
    name: String,
    text: String,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    name: String,
    config: RoomConfig,
    settings: MatchSettings,
    members: Vec<Member>,
    chat: VecDeque<ChatLine>,
    game: Option<GameState>,
    /// Bumped on every game start, restart, and teardown. Stale phase
    /// timers compare against this and drop themselves.
    epoch: u64,
    rng: StdRng,
    self_tx: mpsc::Sender<RoomCommand>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room = %self.name, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player_id,
                    name,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(player_id, name, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    self.handle_leave(player_id);
                    let _ = reply.send(self.members.is_empty());
                }
                RoomCommand::Intent { player_id, intent } => {
                    self.handle_intent(player_id, intent);
                }
                RoomCommand::PhaseTimer { epoch, step } => {
                    self.handle_phase_timer(epoch, step);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room = %self.name, "room shutting down");
                    break;
                }
            }
        }

        // Receiver drops here; any in-flight timer's send fails silently.
        tracing::info!(room = %self.name, "room actor stopped");
    }

    // -- lobby -------------------------------------------------------------

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if self.members.len() >= self.config.capacity {
            return Err(RoomError::RoomFull(self.name.clone()));
        }
        if self
            .members
            .iter()
            .any(|m| m.name.eq_ignore_ascii_case(&name))
        {
            return Err(RoomError::NameTaken(name));
        }
        if self.game.is_some() {
            return Err(RoomError::GameInProgress(self.name.clone()));
        }

        self.members.push(Member {
            id: player_id,
            name: name.clone(),
            ready: false,
            sender,
        });
        tracing::info!(
            room = %self.name,
            %player_id,
            name,
            players = self.members.len(),
            "player joined"
        );

        self.send_to(
            player_id,
            ServerEvent::Joined {
                player_id,
                room: self.name.clone(),
                members: self.roster(),
                settings: self.settings,
            },
        );
        // Replay the transcript so late joiners see the conversation.
        for line in &self.chat {
            self.send_to(
                player_id,
                ServerEvent::Chat {
                    from: line.from,
                    name: line.name.clone(),
                    text: line.text.clone(),
                },
            );
        }
        self.broadcast_roster();
        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) {
        let Some(idx) = self.members.iter().position(|m| m.id == player_id) else {
            return;
        };
        let was_host = idx == 0;
        self.members.remove(idx);
        tracing::info!(
            room = %self.name,
            %player_id,
            players = self.members.len(),
            "player left"
        );

        if self.members.is_empty() {
            // Registry deletes us; make sure no timer can land meanwhile.
            self.epoch += 1;
            self.game = None;
            return;
        }

        self.broadcast(ServerEvent::PlayerDisconnected { player_id });

        if let Some(game) = &mut self.game {
            let events = game.remove_player(player_id);
            let game_over = game.is_over();
            self.dispatch(events);
            if game_over {
                self.epoch += 1;
            }
        }

        if was_host {
            tracing::info!(
                room = %self.name,
                new_host = %self.members[0].id,
                "host migrated"
            );
        }
        self.broadcast_roster();
    }

    // -- intents -----------------------------------------------------------

    fn handle_intent(&mut self, player_id: PlayerId, intent: ClientIntent) {
        match intent {
            ClientIntent::Join { .. } => {
                // Joins go through the registry, never the intent path.
                tracing::debug!(%player_id, "ignoring in-room join intent");
            }
            ClientIntent::ToggleReady => self.toggle_ready(player_id),
            ClientIntent::UpdateSettings { settings } => {
                self.update_settings(player_id, settings)
            }
            ClientIntent::Chat { text } => self.chat(player_id, text),
            ClientIntent::StartGame => self.start_game(player_id),
            ClientIntent::Shoot { target } => {
                self.game_action(player_id, |game, pid| game.shoot(pid, target))
            }
            ClientIntent::UseItem { slot } => {
                self.game_action(player_id, |game, pid| game.use_item(pid, slot))
            }
            ClientIntent::RequestRestart => self.restart(player_id),
        }
    }

    fn toggle_ready(&mut self, player_id: PlayerId) {
        if let Some(m) = self.members.iter_mut().find(|m| m.id == player_id) {
            m.ready = !m.ready;
            self.broadcast_roster();
        }
    }

    /// Host-gated mutation: silently ignored from anyone else or while a
    /// game is running.
    fn update_settings(&mut self, player_id: PlayerId, settings: MatchSettings) {
        if !self.is_host(player_id) || self.game.is_some() {
            return;
        }
        self.settings = settings;
        self.broadcast(ServerEvent::SettingsUpdated { settings });
    }

    fn chat(&mut self, player_id: PlayerId, text: String) {
        let Some(member) = self.members.iter().find(|m| m.id == player_id) else {
            return;
        };
        let name = member.name.clone();
        if self.chat.len() >= self.config.chat_history {
            self.chat.pop_front();
        }
        self.chat.push_back(ChatLine {
            from: player_id,
            name: name.clone(),
            text: text.clone(),
        });
        self.broadcast(ServerEvent::Chat {
            from: player_id,
            name,
            text,
        });
    }

    fn start_game(&mut self, player_id: PlayerId) {
        if !self.is_host(player_id) {
            self.reject(player_id, RejectReason::NotHost);
            return;
        }
        if self.game.is_some() {
            self.reject(player_id, RejectReason::GameInProgress);
            return;
        }
        if self.members.len() < 2 {
            self.reject(player_id, RejectReason::NotEnoughPlayers);
            return;
        }
        if !self.members.iter().all(|m| m.ready) {
            self.reject(player_id, RejectReason::PlayersNotReady);
            return;
        }

        self.epoch += 1;
        let roster: Vec<(PlayerId, String)> = self
            .members
            .iter()
            .map(|m| (m.id, m.name.clone()))
            .collect();
        let (game, events) = GameState::new(&roster, self.settings, &mut self.rng);
        self.game = Some(game);
        tracing::info!(room = %self.name, players = roster.len(), "game started");

        self.dispatch(events);
        self.schedule(PhaseStep::Round, self.config.announce_delay);
    }

    fn restart(&mut self, player_id: PlayerId) {
        if !self.is_host(player_id) {
            self.reject(player_id, RejectReason::NotHost);
            return;
        }
        // Cancels every pending phase timer for the old game.
        self.epoch += 1;
        self.game = None;
        tracing::info!(room = %self.name, "game reset to lobby");
        self.broadcast(ServerEvent::GameRestarted);
        self.broadcast_roster();
    }

    /// Runs a shoot/use-item action against the game, dispatching its
    /// events and scheduling the next round when the chamber emptied.
    fn game_action<F>(&mut self, player_id: PlayerId, f: F)
    where
        F: FnOnce(
            &mut GameState,
            PlayerId,
        ) -> Result<ricochet_game::ActionOutcome, ActionError>,
    {
        let Some(game) = &mut self.game else {
            self.reject(player_id, RejectReason::GameNotStarted);
            return;
        };

        match f(game, player_id) {
            Ok(outcome) => {
                let game_over = game.is_over();
                self.dispatch(outcome.events);
                if game_over {
                    self.epoch += 1;
                } else if outcome.round_spent {
                    self.schedule(PhaseStep::Round, self.config.announce_delay);
                }
            }
            Err(err) => match err.reject_reason() {
                Some(reason) => self.reject(player_id, reason),
                // Invalid references are silent no-ops.
                None => tracing::debug!(
                    room = %self.name,
                    %player_id,
                    error = %err,
                    "action ignored"
                ),
            },
        }
    }

    // -- phase timers ------------------------------------------------------

    fn handle_phase_timer(&mut self, epoch: u64, step: PhaseStep) {
        if epoch != self.epoch {
            tracing::debug!(
                room = %self.name,
                stale = epoch,
                current = self.epoch,
                "dropping stale phase timer"
            );
            return;
        }
        let Some(game) = &mut self.game else {
            return;
        };
        if game.is_over() {
            return;
        }

        match step {
            PhaseStep::Round => {
                let events = game.begin_round(&mut self.rng);
                self.dispatch(events);
                self.schedule(PhaseStep::Loot, self.config.loot_delay);
            }
            PhaseStep::Loot => {
                let events = game.distribute_loot(&mut self.rng);
                self.dispatch(events);
                self.schedule(PhaseStep::Turn, self.config.loot_delay);
            }
            PhaseStep::Turn => {
                let events = game.begin_turn();
                self.dispatch(events);
            }
        }
    }

    /// Spawns a sleeper that feeds a `PhaseTimer` back into the mailbox.
    /// The captured epoch is the cancellation token.
    fn schedule(&self, step: PhaseStep, delay: Duration) {
        let tx = self.self_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RoomCommand::PhaseTimer { epoch, step }).await;
        });
    }

    // -- outbound ----------------------------------------------------------

    fn roster(&self) -> Vec<MemberPublic> {
        self.members
            .iter()
            .enumerate()
            .map(|(idx, m)| MemberPublic {
                id: m.id,
                name: m.name.clone(),
                host: idx == 0,
                ready: m.ready,
            })
            .collect()
    }

    fn broadcast_roster(&self) {
        self.broadcast(ServerEvent::PlayerList {
            members: self.roster(),
        });
    }

    fn is_host(&self, player_id: PlayerId) -> bool {
        self.members.first().is_some_and(|m| m.id == player_id)
    }

    fn reject(&self, player_id: PlayerId, reason: RejectReason) {
        self.send_to(player_id, ServerEvent::Rejected { reason });
    }

    /// Delivers each event to its audience. This is the single outward
    /// path for room state.
    fn dispatch(&self, events: Events) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => self.broadcast(event),
                Recipient::Player(pid) => self.send_to(pid, event),
            }
        }
    }

    fn broadcast(&self, event: ServerEvent) {
        for m in &self.members {
            let _ = m.sender.send(event.clone());
        }
    }

    /// Silently drops if the receiver is gone (player disconnecting).
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(m) = self.members.iter().find(|m| m.id == player_id) {
            let _ = m.sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            name: self.name.clone(),
            player_count: self.members.len(),
            capacity: self.config.capacity,
            game_active: self.game.is_some(),
        }
    }
}

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room(name: String, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);

    let actor = RoomActor {
        name: name.clone(),
        config,
        settings: MatchSettings::default(),
        members: Vec::new(),
        chat: VecDeque::new(),
        game: None,
        epoch: 0,
        rng: StdRng::from_os_rng(),
        self_tx: tx.clone(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { name, sender: tx }
}
