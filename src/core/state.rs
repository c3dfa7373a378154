//! Game state.
//!
//! `GameState` is the single mutable object a game revolves around. It holds
//! turn progression, per-player counters, card locations and instances, timed
//! modifiers created by resolved abilities, and an append-only event log.
//!
//! The state does not know any rules. The resolution engine (`rules`) is the
//! only caller that mutates it during a game; tests and setup code use the
//! same methods to arrange positions.
//!
//! ## Cloning
//!
//! `clone_state()` forks the RNG so a simulated copy never replays the
//! original's shuffles. The event log is an `im::Vector` and clones in O(1).

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::config::Zone;
use super::entity::EntityId;
use super::player::{PlayerId, PlayerMap};
use super::rng::GameRng;
use crate::abilities::AbilityId;
use crate::cards::{CardId, CardInstance};
use crate::effects::layers::Modifier;
use crate::triggers::{Condition, GameEvent};
use crate::zones::{ZoneKey, ZoneManager, ZonePosition};

/// Per-player counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Lore collected so far.
    pub lore: i64,

    /// Whether the player already put a card into their inkwell this turn.
    pub inked_this_turn: bool,
}

/// When a timed modifier stops applying.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expiry {
    /// Removed by `end_turn`.
    EndOfTurn,
    /// Removed when the given player's next turn starts.
    StartOfTurn(PlayerId),
    /// Applies while the condition holds for `source`; removed once
    /// `source` leaves play.
    WhileCondition { source: EntityId, condition: Condition },
    /// Never removed while the target exists.
    Never,
}

/// A modifier applied to one entity by a resolved (non-static) ability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedModifier {
    pub target: EntityId,
    pub modifier: Modifier,
    pub expiry: Expiry,
    /// Controller of the ability that created the modifier.
    pub controller: PlayerId,
}

/// Full game state.
#[derive(Clone, Debug)]
pub struct GameState {
    player_count: usize,

    /// Turn number (starts at 1).
    pub turn_number: u32,

    /// Player whose turn it is.
    pub active_player: PlayerId,

    players: PlayerMap<PlayerState>,

    /// Card locations.
    pub zones: ZoneManager,

    cards: FxHashMap<EntityId, CardInstance>,

    timed: Vec<TimedModifier>,

    /// Once-per-turn abilities already used this turn.
    once_used: Vec<(EntityId, AbilityId)>,

    events: Vector<GameEvent>,

    winner: Option<PlayerId>,

    /// Deterministic RNG.
    pub rng: GameRng,

    next_entity_id: u32,
}

impl GameState {
    /// Create a new game state.
    #[must_use]
    pub fn new(player_count: usize, seed: u64) -> Self {
        Self {
            player_count,
            turn_number: 1,
            active_player: PlayerId::new(0),
            players: PlayerMap::with_default(player_count),
            zones: ZoneManager::new(),
            cards: FxHashMap::default(),
            timed: Vec::new(),
            once_used: Vec::new(),
            events: Vector::new(),
            winner: None,
            rng: GameRng::new(seed),
            next_entity_id: EntityId::first_non_player(player_count),
        }
    }

    /// Get player count.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Iterate over all player IDs.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::all(self.player_count)
    }

    /// Opponents of `player`, in turn order after them.
    pub fn opponents(&self, player: PlayerId) -> impl Iterator<Item = PlayerId> {
        PlayerId::turn_order_from(player, self.player_count).skip(1)
    }

    // === Players ===

    #[must_use]
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        &self.players[player]
    }

    pub fn player_mut(&mut self, player: PlayerId) -> &mut PlayerState {
        &mut self.players[player]
    }

    /// Lore of a player.
    #[must_use]
    pub fn lore(&self, player: PlayerId) -> i64 {
        self.players[player].lore
    }

    /// Change a player's lore; lore never drops below zero.
    pub fn add_lore(&mut self, player: PlayerId, delta: i64) {
        let lore = &mut self.players[player].lore;
        *lore = (*lore + delta).max(0);
    }

    // === Cards ===

    /// Allocate a new entity ID.
    pub fn alloc_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Create a card instance in one of its owner's zones.
    pub fn create_card(&mut self, card_id: CardId, owner: PlayerId, zone: Zone) -> EntityId {
        let entity = self.alloc_entity();
        let mut instance = CardInstance::new(entity, card_id, owner, zone);
        if zone == Zone::Play {
            instance.turn_entered = Some(self.turn_number);
        }
        self.cards.insert(entity, instance);
        self.zones
            .add_to_zone(entity, ZoneKey::new(owner, zone), ZonePosition::Top);
        entity
    }

    /// Get a card instance.
    #[must_use]
    pub fn card(&self, entity: EntityId) -> Option<&CardInstance> {
        self.cards.get(&entity)
    }

    /// Get a mutable card instance.
    pub fn card_mut(&mut self, entity: EntityId) -> Option<&mut CardInstance> {
        self.cards.get_mut(&entity)
    }

    /// Iterate over all card instances (unordered).
    pub fn cards(&self) -> impl Iterator<Item = &CardInstance> {
        self.cards.values()
    }

    /// Cards in a player's zone, bottom first.
    #[must_use]
    pub fn cards_in(&self, player: PlayerId, zone: Zone) -> &[EntityId] {
        self.zones.cards_in(ZoneKey::new(player, zone))
    }

    /// All cards in play, in turn order from player 0 then entry order.
    #[must_use]
    pub fn in_play(&self) -> Vec<EntityId> {
        self.player_ids()
            .flat_map(|p| self.cards_in(p, Zone::Play).iter().copied())
            .collect()
    }

    /// Check if an entity is a card currently in play.
    #[must_use]
    pub fn is_in_play(&self, entity: EntityId) -> bool {
        self.cards.get(&entity).is_some_and(|c| c.zone == Zone::Play)
    }

    /// Move a card into one of its owner's zones.
    ///
    /// Leaving play clears damage and exertion; entering play marks the card
    /// as drying and records the turn. Returns the previous zone.
    pub fn move_card(&mut self, entity: EntityId, zone: Zone, position: ZonePosition) -> Option<Zone> {
        let turn = self.turn_number;
        let card = self.cards.get_mut(&entity)?;
        let from = card.zone;
        card.move_to(zone, turn);
        let owner = card.owner;
        self.zones
            .move_to_zone(entity, ZoneKey::new(owner, zone), position)?;
        if from == Zone::Play && zone != Zone::Play {
            self.timed.retain(|t| t.target != entity);
        }
        Some(from)
    }

    /// Draw the top card of a player's deck.
    ///
    /// Returns `None` when the deck is empty.
    pub fn draw(&mut self, player: PlayerId) -> Option<EntityId> {
        let entity = self.zones.top_card(ZoneKey::new(player, Zone::Deck))?;
        self.move_card(entity, Zone::Hand, ZonePosition::Top)?;
        Some(entity)
    }

    /// Shuffle a player's deck.
    pub fn shuffle_deck(&mut self, player: PlayerId) {
        self.zones
            .shuffle_zone(ZoneKey::new(player, Zone::Deck), &mut self.rng);
    }

    /// Shuffle every deck and draw `hand_size` cards for each player.
    pub fn deal_opening_hands(&mut self, hand_size: usize) {
        for player in PlayerId::all(self.player_count) {
            self.shuffle_deck(player);
            for _ in 0..hand_size {
                if self.draw(player).is_none() {
                    break;
                }
            }
        }
    }

    // === Ink ===

    /// Ready (unexerted) cards in a player's inkwell.
    #[must_use]
    pub fn available_ink(&self, player: PlayerId) -> u32 {
        self.cards_in(player, Zone::Inkwell)
            .iter()
            .filter(|e| self.cards.get(e).is_some_and(|c| !c.exerted))
            .count() as u32
    }

    /// Exert `amount` ready ink cards. Returns `false` (paying nothing) if
    /// the player cannot afford it.
    pub fn pay_ink(&mut self, player: PlayerId, amount: u32) -> bool {
        if self.available_ink(player) < amount {
            return false;
        }
        let ready: Vec<EntityId> = self
            .cards_in(player, Zone::Inkwell)
            .iter()
            .copied()
            .filter(|e| self.cards.get(e).is_some_and(|c| !c.exerted))
            .take(amount as usize)
            .collect();
        for entity in ready {
            if let Some(card) = self.cards.get_mut(&entity) {
                card.exerted = true;
            }
        }
        true
    }

    // === Timed modifiers ===

    pub fn add_timed_modifier(&mut self, modifier: TimedModifier) {
        self.timed.push(modifier);
    }

    #[must_use]
    pub fn timed_modifiers(&self) -> &[TimedModifier] {
        &self.timed
    }

    /// Drop timed modifiers matching a predicate. Returns how many were removed.
    pub fn expire_modifiers(&mut self, expired: impl Fn(&TimedModifier) -> bool) -> usize {
        let before = self.timed.len();
        self.timed.retain(|t| !expired(t));
        before - self.timed.len()
    }

    // === Once per turn ===

    #[must_use]
    pub fn ability_used_this_turn(&self, source: EntityId, ability: AbilityId) -> bool {
        self.once_used.contains(&(source, ability))
    }

    pub fn mark_ability_used(&mut self, source: EntityId, ability: AbilityId) {
        if !self.ability_used_this_turn(source, ability) {
            self.once_used.push((source, ability));
        }
    }

    pub fn clear_turn_usage(&mut self) {
        self.once_used.clear();
    }

    // === Events ===

    /// Append an event to the log.
    pub fn record_event(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    /// Everything that happened so far, oldest first.
    #[must_use]
    pub fn event_log(&self) -> &Vector<GameEvent> {
        &self.events
    }

    // === Outcome ===

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn set_winner(&mut self, player: PlayerId) {
        if self.winner.is_none() {
            self.winner = Some(player);
        }
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    // === Cloning ===

    /// Clone the game state for simulation.
    ///
    /// Takes `&mut self` because forking the RNG advances the fork counter.
    #[must_use]
    pub fn clone_state(&mut self) -> Self {
        Self {
            rng: self.rng.fork(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(i: u8) -> PlayerId {
        PlayerId::new(i)
    }

    #[test]
    fn test_game_state_new() {
        let state = GameState::new(2, 42);

        assert_eq!(state.player_count(), 2);
        assert_eq!(state.turn_number, 1);
        assert_eq!(state.active_player, p(0));
        assert!(state.cards_in(p(0), Zone::Deck).is_empty());
        assert_eq!(state.opponents(p(0)).collect::<Vec<_>>(), vec![p(1)]);
    }

    #[test]
    fn test_alloc_entity_after_players() {
        let mut state = GameState::new(4, 42);
        let card = state.create_card(CardId::new(1), p(2), Zone::Hand);

        assert_eq!(card, EntityId(4));
        assert_eq!(state.alloc_entity(), EntityId(5));
        assert_eq!(state.card(card).map(|c| c.owner), Some(p(2)));
    }

    #[test]
    fn test_draw_from_top() {
        let mut state = GameState::new(2, 42);
        let a = state.create_card(CardId::new(1), p(0), Zone::Deck);
        let b = state.create_card(CardId::new(2), p(0), Zone::Deck);

        assert_eq!(state.draw(p(0)), Some(b));
        assert_eq!(state.cards_in(p(0), Zone::Hand), &[b]);
        assert_eq!(state.cards_in(p(0), Zone::Deck), &[a]);
        assert_eq!(state.draw(p(1)), None);
    }

    #[test]
    fn test_leaving_play_resets_instance() {
        let mut state = GameState::new(2, 1);
        let card = state.create_card(CardId::new(1), p(0), Zone::Play);
        if let Some(c) = state.card_mut(card) {
            c.damage = 3;
            c.exerted = true;
        }

        let from = state.move_card(card, Zone::Discard, ZonePosition::Top);

        assert_eq!(from, Some(Zone::Play));
        let instance = state.card(card).unwrap();
        assert_eq!(instance.damage, 0);
        assert!(!instance.exerted);
        assert!(!state.is_in_play(card));
    }

    #[test]
    fn test_pay_ink() {
        let mut state = GameState::new(2, 1);
        for id in 0..3 {
            state.create_card(CardId::new(id), p(0), Zone::Inkwell);
        }

        assert_eq!(state.available_ink(p(0)), 3);
        assert!(!state.pay_ink(p(0), 4));
        assert_eq!(state.available_ink(p(0)), 3);
        assert!(state.pay_ink(p(0), 2));
        assert_eq!(state.available_ink(p(0)), 1);
    }

    #[test]
    fn test_lore_floor_and_winner() {
        let mut state = GameState::new(2, 1);
        state.add_lore(p(1), 3);
        state.add_lore(p(1), -5);
        assert_eq!(state.lore(p(1)), 0);

        state.set_winner(p(1));
        state.set_winner(p(0));
        assert_eq!(state.winner(), Some(p(1)));
        assert!(state.is_game_over());
    }

    #[test]
    fn test_opening_hands() {
        let mut state = GameState::new(2, 9);
        for player in [p(0), p(1)] {
            for id in 0..10 {
                state.create_card(CardId::new(id), player, Zone::Deck);
            }
        }

        state.deal_opening_hands(7);

        assert_eq!(state.cards_in(p(0), Zone::Hand).len(), 7);
        assert_eq!(state.cards_in(p(1), Zone::Deck).len(), 3);
    }

    #[test]
    fn test_clone_state_is_independent() {
        let mut state = GameState::new(2, 42);
        state.create_card(CardId::new(1), p(0), Zone::Deck);
        state.add_lore(p(0), 2);

        let mut cloned = state.clone_state();
        cloned.add_lore(p(0), 5);

        assert_eq!(state.lore(p(0)), 2);
        assert_eq!(cloned.lore(p(0)), 7);
        assert_ne!(cloned.rng.seed(), state.rng.seed());
    }
}
