//! Zones and engine configuration.
//!
//! Unlike a general-purpose engine, this game has a fixed set of zones.
//! Each player owns one of each; `ZoneManager` keys them by `(PlayerId, Zone)`.
//!
//! `EngineConfig` carries the tunable rules constants. It is passed to the
//! engine explicitly and can be deserialized from JSON by tooling.

use serde::{Deserialize, Serialize};

/// A player-owned zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Zone {
    /// Draw pile (top = end of the ordered list).
    Deck,
    /// Cards in hand.
    Hand,
    /// Characters, items and locations in play.
    Play,
    /// Discard pile (banished cards end up here).
    Discard,
    /// Face-down cards used to pay ink costs.
    Inkwell,
}

impl Zone {
    /// All zones, in a stable order.
    pub const ALL: [Zone; 5] = [Zone::Deck, Zone::Hand, Zone::Play, Zone::Discard, Zone::Inkwell];
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Zone::Deck => "deck",
            Zone::Hand => "hand",
            Zone::Play => "play",
            Zone::Discard => "discard",
            Zone::Inkwell => "inkwell",
        };
        f.write_str(name)
    }
}

/// Rules constants for the resolution engine.
///
/// ```
/// use rust_lore::core::EngineConfig;
///
/// let config = EngineConfig::default().with_lore_to_win(25);
/// assert_eq!(config.lore_to_win, 25);
/// assert!(config.active_player_first);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lore a player needs to win.
    pub lore_to_win: i64,

    /// Maximum trigger resolutions processed for one externally driven
    /// action before the engine reports a runaway cascade.
    pub max_cascade_steps: usize,

    /// Whether `start_turn` draws a card for the active player.
    pub draw_on_turn_start: bool,

    /// Order simultaneously recorded triggers by controller, active player first.
    pub active_player_first: bool,

    /// Opening hand size used by `GameState::deal_opening_hands`.
    pub starting_hand_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lore_to_win: 20,
            max_cascade_steps: 512,
            draw_on_turn_start: true,
            active_player_first: true,
            starting_hand_size: 7,
        }
    }
}

impl EngineConfig {
    /// Set the lore needed to win.
    #[must_use]
    pub fn with_lore_to_win(mut self, lore: i64) -> Self {
        self.lore_to_win = lore;
        self
    }

    /// Set the cascade guard.
    #[must_use]
    pub fn with_max_cascade_steps(mut self, steps: usize) -> Self {
        self.max_cascade_steps = steps;
        self
    }

    /// Enable or disable the turn-start draw.
    #[must_use]
    pub fn with_turn_start_draw(mut self, draw: bool) -> Self {
        self.draw_on_turn_start = draw;
        self
    }

    /// Enable or disable the active-player-first trigger ordering.
    #[must_use]
    pub fn with_active_player_first(mut self, enabled: bool) -> Self {
        self.active_player_first = enabled;
        self
    }

    /// Set the opening hand size.
    #[must_use]
    pub fn with_starting_hand_size(mut self, size: usize) -> Self {
        self.starting_hand_size = size;
        self
    }
}
