//! The authoritative game state machine.
//!
//! One `GameState` exists per running game, owned by its room actor. All
//! methods are synchronous and deterministic given the supplied RNG; the
//! room layer decides *when* phase transitions happen (it owns the
//! delays), this module decides *what* they do.
//!
//! Phase sequence:
//!
//! ```text
//! RoundAnnounce → LootDistribution → AwaitingAction ─┬→ RoundAnnounce (chamber spent)
//!                                                    └→ GameOver (one player left)
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use ricochet_protocol::{
    GameSnapshot, Item, MatchSettings, PlayerId, Recipient, ServerEvent, Shell,
};

use crate::chamber::Chamber;
use crate::error::ActionError;
use crate::item::draw_loot;
use crate::player::Combatant;
use crate::turn::{self, ring_successor};

/// Events produced by a state transition, each paired with its audience.
pub type Events = Vec<(Recipient, ServerEvent)>;

/// Where the game currently is in its phase sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// A chamber was (or is about to be) announced; actions not accepted.
    RoundAnnounce,
    /// Item shipments are being dealt; actions not accepted.
    LootDistribution,
    /// The current player may shoot or use items.
    AwaitingAction,
    /// A winner is set; every further intent is rejected.
    GameOver,
}

/// Outcome of a shoot/use-item action.
///
/// `round_spent` tells the room the chamber emptied and the next round's
/// announce timer must be scheduled. Game over is visible through
/// [`GameState::winner`].
#[derive(Debug)]
pub struct ActionOutcome {
    pub events: Events,
    pub round_spent: bool,
}

/// Authoritative state of one running game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    settings: MatchSettings,
    /// Seat-ordered; this vec *is* the turn ring. Dead players keep their
    /// seats but are skipped by the scheduler.
    combatants: Vec<Combatant>,
    current: PlayerId,
    round: u32,
    chamber: Chamber,
    phase: Phase,
    winner: Option<PlayerId>,
}

impl GameState {
    /// Starts a game for the given roster (insertion order = seat order).
    ///
    /// Picks a uniformly random starting player. The first chamber is not
    /// loaded here — the room schedules [`begin_round`](Self::begin_round)
    /// after its announce delay.
    pub fn new(
        roster: &[(PlayerId, String)],
        settings: MatchSettings,
        rng: &mut impl Rng,
    ) -> (Self, Events) {
        debug_assert!(roster.len() >= 2);

        let combatants: Vec<Combatant> = roster
            .iter()
            .enumerate()
            .map(|(seat, (id, name))| {
                Combatant::new(*id, name.clone(), ricochet_protocol::Seat(seat), settings.starting_hp)
            })
            .collect();

        let first = combatants[rng.random_range(0..combatants.len())].id;

        let state = Self {
            settings,
            combatants,
            current: first,
            round: 0,
            chamber: Chamber::from_shells(Vec::new()),
            phase: Phase::RoundAnnounce,
            winner: None,
        };

        let events = vec![(
            Recipient::All,
            ServerEvent::GameStarted {
                players: state.publics(),
                first_turn: first,
            },
        )];
        (state, events)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn current_turn(&self) -> PlayerId {
        self.current
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Full public snapshot (no shell ordering).
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            round: self.round,
            live_remaining: self.chamber.live_remaining(),
            blank_remaining: self.chamber.blank_remaining(),
            current_turn: self.current,
            players: self.publics(),
        }
    }

    // -- phase transitions (driven by the room's timers) ------------------

    /// Loads a fresh chamber and announces the new round.
    ///
    /// Fresh chamber means fresh state: handcuffs and armed saws are
    /// cleared for every alive player, regardless of how they got there.
    pub fn begin_round(&mut self, rng: &mut impl Rng) -> Events {
        if self.is_over() {
            return Vec::new();
        }
        self.round += 1;
        self.chamber = Chamber::generate(rng);
        for c in self.combatants.iter_mut().filter(|c| c.alive) {
            c.handcuffed = false;
            c.sawed = false;
        }
        self.phase = Phase::RoundAnnounce;

        tracing::debug!(
            round = self.round,
            live = self.chamber.live_remaining(),
            blank = self.chamber.blank_remaining(),
            "round announced"
        );

        vec![(
            Recipient::All,
            ServerEvent::RoundAnnounced {
                round: self.round,
                live: self.chamber.live_remaining(),
                blank: self.chamber.blank_remaining(),
            },
        )]
    }

    /// Deals this round's item shipment to every alive player.
    ///
    /// Each player learns their own items privately; the resulting trays
    /// are then published for everyone.
    pub fn distribute_loot(&mut self, rng: &mut impl Rng) -> Events {
        if self.is_over() {
            return Vec::new();
        }
        self.phase = Phase::LootDistribution;

        let mut events = Vec::new();
        let per_player = self.settings.items_per_shipment as usize;
        for idx in 0..self.combatants.len() {
            if !self.combatants[idx].alive {
                continue;
            }
            let items = draw_loot(rng, per_player);
            for item in &items {
                self.combatants[idx].give(*item);
            }
            events.push((
                Recipient::Player(self.combatants[idx].id),
                ServerEvent::LootReceived { items },
            ));
        }
        events.push((
            Recipient::All,
            ServerEvent::LootAnnounced {
                players: self.publics(),
            },
        ));
        events
    }

    /// Opens the action window for the current player.
    pub fn begin_turn(&mut self) -> Events {
        if self.is_over() {
            return Vec::new();
        }
        self.phase = Phase::AwaitingAction;
        vec![(
            Recipient::All,
            ServerEvent::TurnAnnounced {
                player_id: self.current,
            },
        )]
    }

    // -- player actions ----------------------------------------------------

    /// Fires the current shell at `target` (which may be the shooter).
    ///
    /// # Errors
    /// - [`ActionError::NotYourTurn`] — wrong player or wrong phase.
    /// - [`ActionError::UnknownTarget`] — target missing or dead; the
    ///   caller treats this as a silent no-op.
    pub fn shoot(
        &mut self,
        shooter: PlayerId,
        target: PlayerId,
    ) -> Result<ActionOutcome, ActionError> {
        self.check_actor(shooter)?;
        let target_idx = self
            .combatants
            .iter()
            .position(|c| c.id == target && c.alive)
            .ok_or(ActionError::UnknownTarget)?;

        // Spent chamber on a shot attempt means the round is already over;
        // regenerate instead of erroring.
        let Some(shell) = self.chamber.pop() else {
            self.phase = Phase::RoundAnnounce;
            return Ok(ActionOutcome {
                events: Vec::new(),
                round_spent: true,
            });
        };

        // An armed saw is consumed by this shot whatever comes out; it
        // only doubles damage when the shell is live.
        let shooter_idx = self
            .combatants
            .iter()
            .position(|c| c.id == shooter)
            .ok_or(ActionError::UnknownTarget)?;
        let sawed = std::mem::replace(&mut self.combatants[shooter_idx].sawed, false);

        let damage = match shell {
            Shell::Live if sawed => 2,
            Shell::Live => 1,
            Shell::Blank => 0,
        };

        let killed = self.combatants[target_idx].apply_damage(damage);
        let target_hp = self.combatants[target_idx].hp;

        let mut events: Events = vec![(
            Recipient::All,
            ServerEvent::ShotResolved {
                shooter,
                target,
                shell,
                damage,
                target_hp,
            },
        )];

        if killed {
            tracing::info!(%target, "player eliminated");
            events.push((
                Recipient::All,
                ServerEvent::PlayerEliminated { player_id: target },
            ));
            if self.check_win(&mut events) {
                return Ok(ActionOutcome {
                    events,
                    round_spent: false,
                });
            }
        }

        // Self-inflicted blank: same player goes again, no cuff logic.
        if !(shell == Shell::Blank && target == shooter) {
            self.advance_turn(&mut events);
        }

        let round_spent = self.chamber.is_spent();
        if round_spent {
            self.phase = Phase::RoundAnnounce;
        } else {
            events.push((
                Recipient::All,
                ServerEvent::TurnAdvanced {
                    snapshot: self.snapshot(),
                },
            ));
        }

        Ok(ActionOutcome {
            events,
            round_spent,
        })
    }

    /// Uses the item in `slot` of the actor's bag.
    ///
    /// The item leaves the bag before its effect applies (remaining items
    /// keep their order). Multiple item uses per turn are legal.
    ///
    /// # Errors
    /// - [`ActionError::NotYourTurn`] — wrong player or wrong phase.
    /// - [`ActionError::NoSuchItem`] — empty slot.
    /// - [`ActionError::UnusableItem`] — item has no effect handler;
    ///   nothing is consumed.
    pub fn use_item(
        &mut self,
        actor: PlayerId,
        slot: usize,
    ) -> Result<ActionOutcome, ActionError> {
        self.check_actor(actor)?;
        let actor_idx = self
            .combatants
            .iter()
            .position(|c| c.id == actor)
            .ok_or(ActionError::NotYourTurn)?;

        let item = self.combatants[actor_idx]
            .bag
            .get(slot)
            .ok_or(ActionError::NoSuchItem)?;

        // Present in the loot table, effect unspecified upstream: reject
        // without consuming.
        if matches!(item, Item::BurnerPhone | Item::Inverter | Item::Adrenaline) {
            return Err(ActionError::UnusableItem);
        }

        self.combatants[actor_idx].bag.take(slot);

        let mut events: Events = Vec::new();
        let mut round_spent = false;
        let mut effect_target = None;
        let mut ejected = None;

        match item {
            Item::Beer => match self.chamber.pop() {
                Some(shell) => {
                    ejected = Some(shell);
                    if self.chamber.is_spent() {
                        self.phase = Phase::RoundAnnounce;
                        round_spent = true;
                    }
                }
                None => {
                    self.phase = Phase::RoundAnnounce;
                    round_spent = true;
                }
            },
            Item::Cigarettes => {
                self.combatants[actor_idx].heal();
            }
            Item::MagnifyingGlass => match self.chamber.peek() {
                Some(shell) => {
                    // Actor's eyes only.
                    events.push((
                        Recipient::Player(actor),
                        ServerEvent::ShellRevealed { shell },
                    ));
                }
                None => {
                    self.phase = Phase::RoundAnnounce;
                    round_spent = true;
                }
            },
            Item::Handsaw => {
                self.combatants[actor_idx].sawed = true;
            }
            Item::Handcuffs => {
                // Direct ring-successor, no skip-aware lookup.
                let victim = ring_successor(&self.combatants, actor);
                if victim != actor {
                    if let Some(v) = self.combatants.iter_mut().find(|c| c.id == victim) {
                        v.handcuffed = true;
                    }
                    effect_target = Some(victim);
                }
            }
            Item::BurnerPhone | Item::Inverter | Item::Adrenaline => unreachable!(),
        }

        events.push((
            Recipient::All,
            ServerEvent::ItemUsed {
                player_id: actor,
                item,
                target: effect_target,
                shell: ejected,
            },
        ));

        Ok(ActionOutcome {
            events,
            round_spent,
        })
    }

    /// Removes a disconnected player from the active game.
    ///
    /// Treated like an elimination but with no damage event: marked dead,
    /// out of the ring, turn advanced if it was theirs, win re-checked.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Events {
        let mut events = Vec::new();
        if self.is_over() {
            return events;
        }
        let Some(c) = self.combatants.iter_mut().find(|c| c.id == player_id) else {
            return events;
        };
        if !c.alive {
            return events;
        }
        c.alive = false;
        tracing::info!(%player_id, "player removed from active game");

        if self.check_win(&mut events) {
            return events;
        }

        if self.current == player_id {
            self.advance_turn(&mut events);
            if self.phase == Phase::AwaitingAction {
                events.push((
                    Recipient::All,
                    ServerEvent::TurnAdvanced {
                        snapshot: self.snapshot(),
                    },
                ));
            }
        }
        events
    }

    // -- internals ---------------------------------------------------------

    fn publics(&self) -> Vec<ricochet_protocol::PlayerPublic> {
        self.combatants.iter().map(|c| c.public()).collect()
    }

    fn check_actor(&self, actor: PlayerId) -> Result<(), ActionError> {
        if self.phase != Phase::AwaitingAction || self.current != actor {
            return Err(ActionError::NotYourTurn);
        }
        Ok(())
    }

    /// Sets the winner when exactly one player is left standing.
    /// Returns `true` if the game just ended.
    fn check_win(&mut self, events: &mut Events) -> bool {
        let alive: Vec<PlayerId> = self
            .combatants
            .iter()
            .filter(|c| c.alive)
            .map(|c| c.id)
            .collect();
        if alive.len() == 1 && self.winner.is_none() {
            let winner = alive[0];
            self.winner = Some(winner);
            self.phase = Phase::GameOver;
            self.current = winner;
            tracing::info!(%winner, "game over");
            events.push((Recipient::All, ServerEvent::GameOver { winner }));
            return true;
        }
        false
    }

    fn advance_turn(&mut self, events: &mut Events) {
        let outcome = turn::next_turn(&mut self.combatants, self.current);
        for skipped in &outcome.skipped {
            tracing::debug!(player_id = %skipped, "handcuffed turn skipped");
            events.push((
                Recipient::All,
                ServerEvent::HandcuffSkipped {
                    player_id: *skipped,
                },
            ));
        }
        self.current = outcome.next;
    }
}
