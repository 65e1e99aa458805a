//! Room configuration.

use std::time::Duration;

/// Fixed per-room parameters. Unlike
/// [`MatchSettings`](ricochet_protocol::MatchSettings) these are not
/// host-editable; they are set when the registry is built (tests shrink
/// the delays to keep the suite fast).
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Seats per room. The design fixes this at 4.
    pub capacity: usize,

    /// Delay between a round announcement and the item shipment.
    pub announce_delay: Duration,

    /// Delay between the item shipment and the first turn announcement.
    pub loot_delay: Duration,

    /// Bound on the chat transcript ring buffer.
    pub chat_history: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            announce_delay: Duration::from_secs(3),
            loot_delay: Duration::from_secs(2),
            chat_history: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.capacity, 4);
        assert_eq!(config.chat_history, 50);
        assert!(config.announce_delay > config.loot_delay);
    }
}
