//! Card instances - runtime card state.
//!
//! `CardInstance` represents one physical copy of a card in a game. It
//! tracks mutable state like damage, exertion and current zone. Effective
//! stats are not stored here; they are derived from the record plus the
//! continuous layers.

use serde::{Deserialize, Serialize};

use super::definition::CardId;
use crate::core::config::Zone;
use crate::core::entity::EntityId;
use crate::core::player::PlayerId;

/// A card instance in a game.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique entity ID for this instance.
    pub entity_id: EntityId,

    /// Reference to the card record.
    pub card_id: CardId,

    /// Owner (whose deck it started in). Cards always live in owner zones.
    pub owner: PlayerId,

    /// Controller (who currently controls it).
    pub controller: PlayerId,

    /// Current zone.
    pub zone: Zone,

    /// Damage counters.
    pub damage: i64,

    /// Exerted (turned sideways).
    pub exerted: bool,

    /// Entered play this turn; drying characters can't quest or challenge.
    pub drying: bool,

    /// Turn the card last entered play.
    pub turn_entered: Option<u32>,

    /// Character this card was shifted onto.
    #[serde(default)]
    pub shifted_from: Option<EntityId>,
}

impl CardInstance {
    /// Create a card instance controlled by its owner.
    #[must_use]
    pub fn new(entity_id: EntityId, card_id: CardId, owner: PlayerId, zone: Zone) -> Self {
        Self {
            entity_id,
            card_id,
            owner,
            controller: owner,
            zone,
            damage: 0,
            exerted: false,
            drying: zone == Zone::Play,
            turn_entered: None,
            shifted_from: None,
        }
    }

    #[must_use]
    pub fn is_damaged(&self) -> bool {
        self.damage > 0
    }

    #[must_use]
    pub fn is_in_play(&self) -> bool {
        self.zone == Zone::Play
    }

    /// Update the instance for a zone change.
    ///
    /// Leaving play wipes damage, exertion and control changes; entering
    /// play starts the drying period. Inkwell cards enter ready.
    pub fn move_to(&mut self, zone: Zone, turn: u32) {
        if self.zone == zone {
            return;
        }
        if self.zone == Zone::Play {
            self.damage = 0;
            self.exerted = false;
            self.drying = false;
            self.shifted_from = None;
            self.controller = self.owner;
        }
        if zone == Zone::Play {
            self.drying = true;
            self.turn_entered = Some(turn);
        }
        if zone == Zone::Inkwell || zone == Zone::Hand {
            self.exerted = false;
        }
        self.zone = zone;
    }

    /// Add damage.
    pub fn add_damage(&mut self, amount: i64) {
        self.damage += amount.max(0);
    }

    /// Remove up to `amount` damage. Returns the amount actually removed.
    pub fn remove_damage(&mut self, amount: i64) -> i64 {
        let removed = amount.clamp(0, self.damage);
        self.damage -= removed;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(zone: Zone) -> CardInstance {
        CardInstance::new(EntityId(5), CardId::new(1), PlayerId::new(0), zone)
    }

    #[test]
    fn test_new_instance() {
        let card = instance(Zone::Hand);
        assert_eq!(card.controller, PlayerId::new(0));
        assert!(!card.drying);
        assert!(instance(Zone::Play).drying);
    }

    #[test]
    fn test_damage() {
        let mut card = instance(Zone::Play);
        card.add_damage(3);
        card.add_damage(-2);
        assert_eq!(card.damage, 3);
        assert!(card.is_damaged());

        assert_eq!(card.remove_damage(5), 3);
        assert_eq!(card.damage, 0);
    }

    #[test]
    fn test_move_to_resets_play_state() {
        let mut card = instance(Zone::Hand);
        card.move_to(Zone::Play, 4);
        assert!(card.drying);
        assert_eq!(card.turn_entered, Some(4));

        card.add_damage(2);
        card.exerted = true;
        card.controller = PlayerId::new(1);
        card.move_to(Zone::Hand, 4);

        assert_eq!(card.damage, 0);
        assert!(!card.exerted);
        assert_eq!(card.controller, PlayerId::new(0));
        assert!(!card.is_in_play());
    }
}
