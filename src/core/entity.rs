//! Entity identification.
//!
//! Every object a game can point at (a player or a card instance) has an
//! `EntityId`. Abilities refer to the objects they touch through these ids
//! rather than through references, so cards, abilities and targets never
//! form ownership cycles.
//!
//! ## ID Layout
//!
//! - `0..player_count`: reserved for players
//! - `player_count..`: card instances, allocated by `GameState`
//!
//! ```
//! use rust_lore::core::{EntityId, GameState, PlayerId, Zone};
//!
//! let mut state = GameState::new(2, 0);
//! let card = state.create_card(rust_lore::cards::CardId::new(1), PlayerId::new(0), Zone::Hand);
//! assert!(card.0 >= EntityId::first_non_player(2));
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a player or card instance within one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// First id available for card instances in a game with `player_count` players.
    #[must_use]
    pub const fn first_non_player(player_count: usize) -> u32 {
        player_count as u32
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards_start_after_players() {
        assert_eq!(EntityId::first_non_player(2), 2);
        assert_eq!(EntityId::first_non_player(4), 4);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", EntityId(42)), "Entity(42)");
    }

    #[test]
    fn test_serialization() {
        let id = EntityId(123);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
