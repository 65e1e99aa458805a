//! Core protocol types for Ricochet's wire format.
//!
//! Everything in this module travels on the wire: these are the structures
//! that get serialized to JSON, sent over the connection, and deserialized
//! on the other side. The server is the sole source of truth — clients only
//! send *intents* ([`ClientIntent`]) and render *events* ([`ServerEvent`]).
//!
//! Hidden information matters here: the chamber's shell sequence never
//! appears in any broadcast type. Only per-shell outcomes ([`Shell`] in
//! `ShotResolved` / `ItemUsed`) and aggregate counts are public.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player, derived from their connection.
///
/// Newtype over `u64` so a `PlayerId` can't be confused with a raw number
/// or a seat index. `#[serde(transparent)]` keeps the JSON as a plain
/// number: `PlayerId(42)` serializes to `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A seat position at the table, assigned once at game start.
///
/// Stable for the whole game so clients can keep players in fixed screen
/// positions; never reused within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seat(pub usize);

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Game logic returns `(Recipient, ServerEvent)` pairs; the room actor
/// delivers each event accordingly. `Player` is how private information
/// (magnifying-glass reveals, loot contents) stays private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player in the room.
    All,
    /// One specific player.
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Game vocabulary shared with clients
// ---------------------------------------------------------------------------

/// A single shell outcome. The chamber is an ordered sequence of these,
/// known only to the server until each shell is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Shell {
    Live,
    Blank,
}

/// A consumable item. Items are plain data — their effects live in the
/// game core, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Item {
    Beer,
    Cigarettes,
    MagnifyingGlass,
    Handsaw,
    Handcuffs,
    BurnerPhone,
    Inverter,
    Adrenaline,
}

/// Host-editable match settings. Immutable once a game is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Advertised round count. Carried for clients; the match itself runs
    /// until one player remains.
    pub rounds: u32,
    /// Hit points every player starts the game with.
    pub starting_hp: u32,
    /// Items dealt to each alive player at the start of every round.
    pub items_per_shipment: u32,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            rounds: 3,
            starting_hp: 4,
            items_per_shipment: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Public snapshots
// ---------------------------------------------------------------------------

/// Publicly visible state of one player.
///
/// Everything here is table-visible in the real game: hp, status effects,
/// and which items are on a player's tray. What is *not* here: anything
/// about upcoming shells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPublic {
    pub id: PlayerId,
    pub name: String,
    pub seat: Seat,
    pub hp: u32,
    pub max_hp: u32,
    pub alive: bool,
    pub handcuffed: bool,
    pub sawed: bool,
    pub items: Vec<Item>,
}

/// A lobby-level view of a room member (no combat state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPublic {
    pub id: PlayerId,
    pub name: String,
    pub host: bool,
    pub ready: bool,
}

/// Full public game snapshot, broadcast whenever the turn changes.
///
/// Counts are aggregates over *unconsumed* shells — the ordering stays
/// server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub round: u32,
    pub live_remaining: u32,
    pub blank_remaining: u32,
    pub current_turn: PlayerId,
    pub players: Vec<PlayerPublic>,
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why an intent was rejected. Sent only to the offending connection —
/// a rejection never tears down the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    RoomFull,
    NameTaken,
    GameInProgress,
    GameNotStarted,
    NotYourTurn,
    NoSuchItem,
    UnusableItem,
    NotHost,
    NotEnoughPlayers,
    PlayersNotReady,
    NotInRoom,
    AlreadyInRoom,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RoomFull => "room is full",
            Self::NameTaken => "name already taken in this room",
            Self::GameInProgress => "game already in progress",
            Self::GameNotStarted => "no game in progress",
            Self::NotYourTurn => "not your turn",
            Self::NoSuchItem => "no item in that slot",
            Self::UnusableItem => "that item cannot be used",
            Self::NotHost => "only the host may do that",
            Self::NotEnoughPlayers => "need at least 2 players",
            Self::PlayersNotReady => "not all players are ready",
            Self::NotInRoom => "not in a room",
            Self::AlreadyInRoom => "already in a room",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ClientIntent — player → server
// ---------------------------------------------------------------------------

/// Everything a client may ask the server to do.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "Shoot", "target": 3 }` — flat and easy to build from a
/// browser client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientIntent {
    /// Join a room by name; the room is auto-created on first use of an
    /// unknown identifier. Must be the first intent on a connection.
    Join { room: String, name: String },

    /// Flip this player's ready flag.
    ToggleReady,

    /// Replace the room settings. Host-only; silently ignored while a
    /// game is active.
    UpdateSettings { settings: MatchSettings },

    /// Send a chat line to the room.
    Chat { text: String },

    /// Start the game. Host-only; requires ≥2 players, all ready.
    StartGame,

    /// Fire the current shell at a player (possibly yourself).
    Shoot { target: PlayerId },

    /// Use the item in the given inventory slot.
    UseItem { slot: usize },

    /// Reset the game back to the lobby. Host-only.
    RequestRestart,
}

// ---------------------------------------------------------------------------
// ServerEvent — server → client(s)
// ---------------------------------------------------------------------------

/// Everything the server can tell a client.
///
/// Most events are room broadcasts; `LootReceived` and `ShellRevealed`
/// are always private to one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// You joined successfully. Carries your id and the current roster.
    Joined {
        player_id: PlayerId,
        room: String,
        members: Vec<MemberPublic>,
        settings: MatchSettings,
    },

    /// The roster changed (join, leave, ready toggle, host migration).
    PlayerList { members: Vec<MemberPublic> },

    /// The host changed the room settings.
    SettingsUpdated { settings: MatchSettings },

    /// A chat line.
    Chat {
        from: PlayerId,
        name: String,
        text: String,
    },

    /// The game began: seating, starting hp, and who goes first.
    GameStarted {
        players: Vec<PlayerPublic>,
        first_turn: PlayerId,
    },

    /// A fresh chamber was loaded. Counts are public; ordering is not.
    RoundAnnounced { round: u32, live: u32, blank: u32 },

    /// Your personal item shipment for this round. Private.
    LootReceived { items: Vec<Item> },

    /// Item shipments were dealt; trays are now public.
    LootAnnounced { players: Vec<PlayerPublic> },

    /// Whose turn it is now; shoot/use-item intents are accepted.
    TurnAnnounced { player_id: PlayerId },

    /// A shot resolved: what came out and what it did.
    ShotResolved {
        shooter: PlayerId,
        target: PlayerId,
        shell: Shell,
        damage: u32,
        target_hp: u32,
    },

    /// A player's hp reached 0; they are out of the turn order.
    PlayerEliminated { player_id: PlayerId },

    /// The turn moved on; full public snapshot for re-sync.
    TurnAdvanced { snapshot: GameSnapshot },

    /// An item was consumed. `target` is set when the effect lands on
    /// another player (handcuffs); `shell` is set only for a beer
    /// ejection, where the ejected shell is visible at the table.
    ItemUsed {
        player_id: PlayerId,
        item: Item,
        target: Option<PlayerId>,
        shell: Option<Shell>,
    },

    /// Magnifying-glass result. Private to the actor.
    ShellRevealed { shell: Shell },

    /// A handcuffed player's turn was skipped (cuff consumed).
    HandcuffSkipped { player_id: PlayerId },

    /// A player's connection dropped; they are permanently out.
    PlayerDisconnected { player_id: PlayerId },

    /// One player remains standing.
    GameOver { winner: PlayerId },

    /// The host reset the game; back to the lobby.
    GameRestarted,

    /// Your last intent was rejected. Sent only to you.
    Rejected { reason: RejectReason },
}

// =========================================================================
// Tests
// =========================================================================
