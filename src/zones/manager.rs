//! Zone manager for card locations and movement.
//!
//! Every zone belongs to one player and is ordered. The `ZoneManager`
//! tracks which `ZoneKey` each card is in and keeps the per-zone order:
//! - Deck: index 0 is the bottom, the last element is the top
//! - Play: order of entry, which gives stable iteration for triggers
//! - Hand, discard, inkwell: order of arrival

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::Zone;
use crate::core::entity::EntityId;
use crate::core::player::PlayerId;
use crate::core::rng::GameRng;

/// Position for inserting a card into a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Add to top of zone (e.g., top of deck).
    Top,
    /// Add to bottom of zone.
    Bottom,
    /// Insert at specific index (0 = bottom).
    Index(usize),
}

/// A specific player's zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneKey {
    pub player: PlayerId,
    pub zone: Zone,
}

impl ZoneKey {
    #[must_use]
    pub const fn new(player: PlayerId, zone: Zone) -> Self {
        Self { player, zone }
    }
}

impl std::fmt::Display for ZoneKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}'s {}", self.player, self.zone)
    }
}

/// Manages card locations across zones.
///
/// ```
/// use rust_lore::zones::{ZoneKey, ZoneManager, ZonePosition};
/// use rust_lore::core::{EntityId, PlayerId, Zone};
///
/// let mut manager = ZoneManager::new();
/// let deck = ZoneKey::new(PlayerId::new(0), Zone::Deck);
///
/// manager.add_to_zone(EntityId(10), deck, ZonePosition::Top);
/// manager.add_to_zone(EntityId(11), deck, ZonePosition::Bottom);
///
/// assert_eq!(manager.cards_in(deck), &[EntityId(11), EntityId(10)]);
/// assert_eq!(manager.top_card(deck), Some(EntityId(10)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ZoneManager {
    /// Card locations: entity_id -> zone
    locations: FxHashMap<EntityId, ZoneKey>,

    /// Ordered card lists per zone.
    zone_order: FxHashMap<ZoneKey, Vec<EntityId>>,
}

impl ZoneManager {
    /// Create a new empty zone manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_ordered(&mut self, entity: EntityId, key: ZoneKey, position: ZonePosition) {
        let order = self.zone_order.entry(key).or_default();
        match position {
            ZonePosition::Top => order.push(entity),
            ZonePosition::Bottom => order.insert(0, entity),
            ZonePosition::Index(i) => {
                let idx = i.min(order.len());
                order.insert(idx, entity);
            }
        }
    }

    /// Add a card to a zone.
    ///
    /// Panics if the entity is already in the manager.
    pub fn add_to_zone(&mut self, entity: EntityId, key: ZoneKey, position: ZonePosition) {
        if self.locations.contains_key(&entity) {
            panic!("Entity {:?} already exists in zone manager", entity);
        }

        self.locations.insert(entity, key);
        self.insert_ordered(entity, key, position);
    }

    /// Move a card to another zone.
    ///
    /// Moving within the same zone repositions the card. Returns the old
    /// zone, or `None` if the card wasn't found.
    pub fn move_to_zone(
        &mut self,
        entity: EntityId,
        new_key: ZoneKey,
        position: ZonePosition,
    ) -> Option<ZoneKey> {
        let old_key = self.locations.get(&entity).copied()?;

        if let Some(order) = self.zone_order.get_mut(&old_key) {
            order.retain(|&e| e != entity);
        }

        self.locations.insert(entity, new_key);
        self.insert_ordered(entity, new_key, position);

        Some(old_key)
    }

    /// Remove a card from the manager entirely.
    pub fn remove(&mut self, entity: EntityId) -> Option<ZoneKey> {
        let key = self.locations.remove(&entity)?;

        if let Some(order) = self.zone_order.get_mut(&key) {
            order.retain(|&e| e != entity);
        }

        Some(key)
    }

    /// Get the zone a card is in.
    #[must_use]
    pub fn zone_of(&self, entity: EntityId) -> Option<ZoneKey> {
        self.locations.get(&entity).copied()
    }

    /// Check if a card is in a specific zone.
    #[must_use]
    pub fn is_in_zone(&self, entity: EntityId, key: ZoneKey) -> bool {
        self.locations.get(&entity) == Some(&key)
    }

    /// Cards in a zone, bottom first.
    #[must_use]
    pub fn cards_in(&self, key: ZoneKey) -> &[EntityId] {
        self.zone_order.get(&key).map_or(&[], |v| v.as_slice())
    }

    /// Number of cards in a zone.
    #[must_use]
    pub fn zone_size(&self, key: ZoneKey) -> usize {
        self.cards_in(key).len()
    }

    /// Top card of a zone (last in the vec).
    #[must_use]
    pub fn top_card(&self, key: ZoneKey) -> Option<EntityId> {
        self.zone_order.get(&key)?.last().copied()
    }

    /// Remove and return the top card of a zone.
    pub fn pop_top(&mut self, key: ZoneKey) -> Option<EntityId> {
        let order = self.zone_order.get_mut(&key)?;
        let entity = order.pop()?;
        self.locations.remove(&entity);
        Some(entity)
    }

    /// Shuffle a zone.
    pub fn shuffle_zone(&mut self, key: ZoneKey, rng: &mut GameRng) {
        if let Some(order) = self.zone_order.get_mut(&key) {
            rng.shuffle(order);
        }
    }

    /// Total number of cards tracked.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.locations.len()
    }

    /// Check if the manager contains an entity.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.locations.contains_key(&entity)
    }
}
