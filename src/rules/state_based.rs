//! State-based checks.
//!
//! Run after every resolved ability and every action:
//!
//! 1. recompute continuous layers and rebuild the trigger index
//! 2. banish every character or location whose damage is at least its
//!    effective willpower
//! 3. repeat while anything was banished (banishing changes layers)
//! 4. award the win to the first player, in turn order from the active
//!    player, whose lore reached the configured total
//!
//! Banishments are matched against the trigger index before it is rebuilt,
//! so a banished card's own "when this is banished" abilities fire.

use crate::core::{EntityId, GameState, PlayerId};
use crate::effects::{banish, GameView, Stat};
use crate::triggers::{GameEvent, Subscription};

use super::engine::{ResolutionEngine, ResolutionReport};

impl<'c> ResolutionEngine<'c> {
    /// Run the check. Returns the banishment events it produced, each with
    /// the subscriptions it matched.
    pub(crate) fn run_state_based(
        &mut self,
        state: &mut GameState,
        report: &mut ResolutionReport,
    ) -> Vec<(GameEvent, Vec<Subscription>)> {
        let mut produced = Vec::new();
        self.refresh(state);

        loop {
            let doomed = self.lethally_damaged(state);
            if doomed.is_empty() {
                break;
            }
            let challenge = self.challenge.take();
            for entity in doomed {
                let banisher = challenge.and_then(|(attacker, defender)| {
                    if entity == attacker {
                        Some(defender)
                    } else if entity == defender {
                        Some(attacker)
                    } else {
                        None
                    }
                });
                let Some(event) = banish(state, entity, banisher, banisher.is_some()) else {
                    continue;
                };
                tracing::debug!(card = %entity, "banished by damage");
                report.banished += 1;
                let subs = self.matches_for(state, &event);
                produced.push((event, subs));
            }
            self.refresh(state);
        }
        self.challenge = None;

        self.check_lore(state);
        produced
    }

    fn lethally_damaged(&self, state: &GameState) -> Vec<EntityId> {
        let view = GameView::new(state, self.catalog, &self.layers);
        state
            .in_play()
            .into_iter()
            .filter(|&entity| {
                let takes_damage = view
                    .record(entity)
                    .is_some_and(|r| r.category.takes_damage() && r.willpower.is_some());
                let damage = state.card(entity).map_or(0, |c| c.damage);
                takes_damage && damage >= view.effective_stat(entity, Stat::Willpower)
            })
            .collect()
    }

    fn check_lore(&self, state: &mut GameState) {
        if state.is_game_over() {
            return;
        }
        let winner: Option<PlayerId> = PlayerId::turn_order_from(state.active_player, state.player_count())
            .find(|&p| state.lore(p) >= self.config.lore_to_win);
        if let Some(player) = winner {
            tracing::debug!(%player, lore = state.lore(player), "lore total reached");
            state.set_winner(player);
        }
    }
}
