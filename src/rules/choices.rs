//! Player decisions.
//!
//! The engine never decides on a player's behalf. Whenever an effect or a
//! cost needs a choice it asks the engine's `DecisionMaker`, and whatever
//! comes back is clamped to the legal candidates before it is used.

use crate::core::{EntityId, PlayerId};
use crate::effects::{Effect, GameView};

/// Answers choices during resolution.
pub trait DecisionMaker {
    /// Pick targets out of `candidates`. At most `count` are used; with
    /// `up_to == false` an empty answer is replaced by the first
    /// candidates.
    fn choose_targets(
        &mut self,
        view: &GameView,
        player: PlayerId,
        candidates: &[EntityId],
        count: usize,
        up_to: bool,
    ) -> Vec<EntityId>;

    /// Pick one of `options`. `None` declines, which is only honoured when
    /// `optional` is set.
    fn choose_option(
        &mut self,
        view: &GameView,
        player: PlayerId,
        options: &[Vec<Effect>],
        optional: bool,
    ) -> Option<usize>;

    /// Pick `count` cards to discard from `hand`.
    fn choose_discard(
        &mut self,
        view: &GameView,
        player: PlayerId,
        hand: &[EntityId],
        count: usize,
    ) -> Vec<EntityId>;

    /// Pick an opponent.
    fn choose_opponent(&mut self, view: &GameView, player: PlayerId, opponents: &[PlayerId]) -> Option<PlayerId>;
}

/// Deterministic decisions: always the first legal candidates, every
/// optional effect accepted.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstChoice;

impl DecisionMaker for FirstChoice {
    fn choose_targets(
        &mut self,
        _view: &GameView,
        _player: PlayerId,
        candidates: &[EntityId],
        count: usize,
        _up_to: bool,
    ) -> Vec<EntityId> {
        candidates.iter().copied().take(count).collect()
    }

    fn choose_option(
        &mut self,
        _view: &GameView,
        _player: PlayerId,
        options: &[Vec<Effect>],
        _optional: bool,
    ) -> Option<usize> {
        (!options.is_empty()).then_some(0)
    }

    fn choose_discard(
        &mut self,
        _view: &GameView,
        _player: PlayerId,
        hand: &[EntityId],
        count: usize,
    ) -> Vec<EntityId> {
        hand.iter().copied().take(count).collect()
    }

    fn choose_opponent(&mut self, _view: &GameView, _player: PlayerId, opponents: &[PlayerId]) -> Option<PlayerId> {
        opponents.first().copied()
    }
}

/// Keep only legal picks, without duplicates, at most `count`; fall back to
/// the first candidates when a mandatory choice came back empty.
pub(crate) fn sanitize_picks(
    picks: Vec<EntityId>,
    candidates: &[EntityId],
    count: usize,
    mandatory: bool,
) -> Vec<EntityId> {
    let mut chosen: Vec<EntityId> = Vec::with_capacity(count);
    for pick in picks {
        if chosen.len() == count {
            break;
        }
        if candidates.contains(&pick) && !chosen.contains(&pick) {
            chosen.push(pick);
        }
    }
    if chosen.is_empty() && mandatory {
        chosen.extend(candidates.iter().copied().take(count));
    }
    chosen
}
