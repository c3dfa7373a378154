//! Continuous effect layers.
//!
//! Static abilities of cards in play are materialised into
//! `ContinuousEffectLayer`s, and every layer contributes `Modifier`s to the
//! entities it affects. Layers are never patched: `LayerSet::recompute`
//! rebuilds everything from the current state on each state-based check, so
//! a layer disappears as soon as its source leaves play or its condition
//! stops holding.
//!
//! Recomputation runs in two passes. Timed modifiers (from resolved
//! abilities) form the baseline; static abilities then evaluate their
//! conditions, targets and amounts against that baseline. Static layers do
//! not observe each other, which keeps the result independent of card order.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::abilities::{AbilityCategory, AbilityDefinition, AbilityId, Keyword};
use crate::cards::CardCatalog;
use crate::core::{EntityId, Expiry, GameState, PlayerId, TimedModifier, Zone};
use crate::triggers::{Condition, ConditionContext, ConditionEvaluator};

use super::effect::{Duration, Effect, Grant, Restriction, Stat};
use super::targeting::{GameView, TargetContext, TargetScope, TargetingResolver};

/// A single change applied to one entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    Stat { stat: Stat, delta: i64 },
    Keyword { keyword: Keyword, value: Option<i64> },
    Restriction(Restriction),
    Ability(Box<AbilityDefinition>),
}

impl Modifier {
    /// Modifier carried by a continuous effect, given its evaluated amount.
    #[must_use]
    pub fn from_effect(effect: &Effect, amount: i64) -> Option<Self> {
        match effect {
            Effect::ModifyStat { stat, .. } => Some(Modifier::Stat {
                stat: *stat,
                delta: amount,
            }),
            Effect::GrantAbility { grant, .. } => Some(match grant {
                Grant::Keyword { keyword, value } => Modifier::Keyword {
                    keyword: *keyword,
                    value: *value,
                },
                Grant::Ability(ability) => Modifier::Ability(ability.clone()),
            }),
            Effect::Restrict { restriction, .. } => Some(Modifier::Restriction(*restriction)),
            _ => None,
        }
    }
}

/// Accumulated modifiers of one entity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityModifiers {
    /// Deltas indexed by `Stat::index`.
    pub stats: [i64; 4],
    pub keywords: SmallVec<[(Keyword, Option<i64>); 4]>,
    pub restrictions: SmallVec<[Restriction; 2]>,
    pub abilities: Vec<AbilityDefinition>,
}

impl EntityModifiers {
    fn apply(&mut self, modifier: &Modifier) {
        match modifier {
            Modifier::Stat { stat, delta } => self.stats[stat.index()] += delta,
            Modifier::Keyword { keyword, value } => self.keywords.push((*keyword, *value)),
            Modifier::Restriction(r) => {
                if !self.restrictions.contains(r) {
                    self.restrictions.push(*r);
                }
            }
            Modifier::Ability(ability) => self.abilities.push(ability.as_ref().clone()),
        }
    }
}

/// A static effect materialised for the current state.
#[derive(Clone, Debug, PartialEq)]
pub struct ContinuousEffectLayer {
    pub ability: AbilityId,
    pub source: EntityId,
    pub controller: PlayerId,
    /// Condition that keeps the layer alive, if any.
    pub condition: Option<Condition>,
    pub effect: Effect,
    pub affected: Vec<EntityId>,
}

/// All layers plus the per-entity modifier table derived from them.
#[derive(Clone, Debug, Default)]
pub struct LayerSet {
    layers: Vec<ContinuousEffectLayer>,
    modifiers: FxHashMap<EntityId, EntityModifiers>,
}

impl LayerSet {
    /// Rebuild all layers from scratch.
    #[must_use]
    pub fn recompute(state: &GameState, catalog: &CardCatalog) -> Self {
        let empty = LayerSet::default();
        let mut baseline = LayerSet::default();
        {
            let view = GameView::new(state, catalog, &empty);
            for timed in state.timed_modifiers() {
                if Self::timed_active(&view, timed) {
                    baseline.apply(timed.target, &timed.modifier);
                }
            }
        }

        let mut result = baseline.clone();
        let view = GameView::new(state, catalog, &baseline);
        for (source, controller, ability) in Self::static_sources(&view) {
            let ctx = ConditionContext::new(&view, source, controller);
            if !ConditionEvaluator::holds(ability.condition.as_ref(), &ctx) {
                continue;
            }
            for effect in &ability.effects {
                if let Some((layer, modifier)) =
                    Self::materialize(&view, ability, source, controller, effect)
                {
                    result.push_layer(layer, &modifier);
                }
            }
        }

        tracing::trace!(layers = result.layers.len(), "recomputed continuous layers");
        result
    }

    fn timed_active(view: &GameView, timed: &TimedModifier) -> bool {
        match &timed.expiry {
            Expiry::WhileCondition { source, condition } => {
                view.state.is_in_play(*source)
                    && ConditionEvaluator::evaluate(
                        condition,
                        &ConditionContext::new(view, *source, timed.controller),
                    )
            }
            Expiry::EndOfTurn | Expiry::StartOfTurn(_) | Expiry::Never => true,
        }
    }

    /// Static abilities that may contribute layers: printed and granted
    /// static abilities of cards in play, plus self cost reductions of
    /// cards in hand.
    fn static_sources<'a>(view: &GameView<'a>) -> Vec<(EntityId, PlayerId, &'a AbilityDefinition)> {
        let mut sources = Vec::new();
        let state = view.state;
        for entity in state.in_play() {
            let Some(instance) = state.card(entity) else {
                continue;
            };
            let printed = view.catalog.abilities(instance.card_id).iter();
            for ability in printed.chain(view.granted_abilities(entity)) {
                if ability.category == AbilityCategory::Static {
                    sources.push((entity, instance.controller, ability));
                }
            }
        }
        for player in state.player_ids() {
            for &entity in state.cards_in(player, Zone::Hand) {
                let Some(instance) = state.card(entity) else {
                    continue;
                };
                for ability in view.catalog.abilities(instance.card_id) {
                    let from_hand = ability.category == AbilityCategory::Static
                        && ability.effects.iter().all(Self::applies_in_hand);
                    if from_hand {
                        sources.push((entity, player, ability));
                    }
                }
            }
        }
        sources
    }

    /// Self cost modifiers and the song marker work from hand.
    fn applies_in_hand(effect: &Effect) -> bool {
        match effect {
            Effect::ModifyStat {
                target,
                stat: Stat::Cost,
                ..
            } => target.scope == TargetScope::This,
            Effect::GrantAbility {
                target,
                grant: Grant::Keyword {
                    keyword: Keyword::Singable,
                    ..
                },
                ..
            } => target.scope == TargetScope::This,
            _ => false,
        }
    }

    fn materialize(
        view: &GameView,
        ability: &AbilityDefinition,
        source: EntityId,
        controller: PlayerId,
        effect: &Effect,
    ) -> Option<(ContinuousEffectLayer, Modifier)> {
        let (target, duration, amount) = match effect {
            Effect::ModifyStat {
                target,
                duration,
                amount,
                ..
            } => (target, duration, view.amount(amount, source, controller)),
            Effect::GrantAbility { target, duration, .. } | Effect::Restrict { target, duration, .. } => {
                (target, duration, 0)
            }
            _ => return None,
        };

        let mut condition = ability.condition.clone();
        if let Duration::WhileCondition(while_condition) = duration {
            let ctx = ConditionContext::new(view, source, controller);
            if !ConditionEvaluator::evaluate(while_condition, &ctx) {
                return None;
            }
            condition = Some(match condition {
                Some(c) => c.and(while_condition.clone()),
                None => while_condition.clone(),
            });
        }

        if matches!(target.scope, TargetScope::Chosen { .. }) {
            return None;
        }
        let ctx = TargetContext {
            source,
            controller,
            event: None,
            previous: &[],
            paid: &[],
        };
        let affected = TargetingResolver::legal_targets(view, target, &ctx);
        let modifier = Modifier::from_effect(effect, amount)?;

        let layer = ContinuousEffectLayer {
            ability: ability.id,
            source,
            controller,
            condition,
            effect: effect.clone(),
            affected,
        };
        Some((layer, modifier))
    }

    fn apply(&mut self, entity: EntityId, modifier: &Modifier) {
        self.modifiers.entry(entity).or_default().apply(modifier);
    }

    fn push_layer(&mut self, layer: ContinuousEffectLayer, modifier: &Modifier) {
        for &entity in &layer.affected {
            self.apply(entity, modifier);
        }
        self.layers.push(layer);
    }

    /// Materialised layers, in source order.
    #[must_use]
    pub fn layers(&self) -> &[ContinuousEffectLayer] {
        &self.layers
    }

    /// Layers produced by one source card.
    pub fn layers_from(&self, source: EntityId) -> impl Iterator<Item = &ContinuousEffectLayer> {
        self.layers.iter().filter(move |l| l.source == source)
    }

    #[must_use]
    pub fn modifiers(&self, entity: EntityId) -> Option<&EntityModifiers> {
        self.modifiers.get(&entity)
    }

    #[must_use]
    pub fn stat_delta(&self, entity: EntityId, stat: Stat) -> i64 {
        self.modifiers
            .get(&entity)
            .map_or(0, |m| m.stats[stat.index()])
    }

    #[must_use]
    pub fn has_keyword(&self, entity: EntityId, keyword: Keyword) -> bool {
        self.modifiers
            .get(&entity)
            .is_some_and(|m| m.keywords.iter().any(|(k, _)| *k == keyword))
    }

    /// Summed for stacking keywords, otherwise the highest value.
    #[must_use]
    pub fn keyword_value(&self, entity: EntityId, keyword: Keyword) -> Option<i64> {
        let modifiers = self.modifiers.get(&entity)?;
        let values = modifiers
            .keywords
            .iter()
            .filter(|(k, _)| *k == keyword)
            .filter_map(|(_, v)| *v);
        if keyword.stacks() {
            let mut any = false;
            let sum = values.inspect(|_| any = true).sum();
            any.then_some(sum)
        } else {
            values.max()
        }
    }

    #[must_use]
    pub fn has_restriction(&self, entity: EntityId, restriction: Restriction) -> bool {
        self.modifiers
            .get(&entity)
            .is_some_and(|m| m.restrictions.contains(&restriction))
    }

    pub fn granted_abilities(&self, entity: EntityId) -> impl Iterator<Item = &AbilityDefinition> {
        self.modifiers
            .get(&entity)
            .into_iter()
            .flat_map(|m| m.abilities.iter())
    }
}
