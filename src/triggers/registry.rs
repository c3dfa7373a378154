//! Trigger index.
//!
//! The index maps each `EventKind` to the triggered abilities currently
//! listening for it. It is not maintained incrementally: the engine rebuilds
//! it from scratch at the end of every state-based check, from the printed
//! triggered abilities of cards in play and the triggered abilities granted
//! to them by continuous or timed effects.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityCategory, AbilityDefinition, AbilityId};
use crate::core::{EntityId, PlayerId};
use crate::effects::targeting::GameView;

use super::condition::{ConditionContext, ConditionEvaluator};
use super::event::{EventKind, GameEvent};

/// One triggered ability listening on one card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subscription {
    pub ability: AbilityId,
    /// Card the ability is on.
    pub source: EntityId,
    pub controller: PlayerId,
    /// Registration order; stable tie-break for simultaneous triggers.
    pub order: u32,
}

/// Event kind -> subscriptions.
#[derive(Clone, Debug, Default)]
pub struct TriggerIndex {
    by_event: FxHashMap<EventKind, Vec<Subscription>>,
    next_order: u32,
}

impl TriggerIndex {
    /// Create a new empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every subscription.
    pub fn clear(&mut self) {
        self.by_event.clear();
        self.next_order = 0;
    }

    /// Add a subscription for a triggered ability.
    ///
    /// Non-triggered abilities are ignored.
    pub fn subscribe(&mut self, ability: &AbilityDefinition, source: EntityId, controller: PlayerId) {
        let Some(trigger) = &ability.trigger else {
            return;
        };
        if ability.category != AbilityCategory::Triggered {
            return;
        }
        let subscription = Subscription {
            ability: ability.id,
            source,
            controller,
            order: self.next_order,
        };
        self.next_order += 1;
        self.by_event.entry(trigger.event).or_default().push(subscription);
    }

    /// Rebuild from the cards in play.
    pub fn rebuild(&mut self, view: &GameView) {
        self.clear();
        for entity in view.state.in_play() {
            let Some(instance) = view.state.card(entity) else {
                continue;
            };
            let controller = instance.controller;
            for ability in view.catalog.abilities(instance.card_id) {
                self.subscribe(ability, entity, controller);
            }
            for ability in view.granted_abilities(entity) {
                self.subscribe(ability, entity, controller);
            }
        }
        tracing::trace!(subscriptions = self.len(), "rebuilt trigger index");
    }

    /// Subscriptions for an event kind, in registration order.
    #[must_use]
    pub fn subscriptions(&self, kind: EventKind) -> &[Subscription] {
        self.by_event.get(&kind).map_or(&[], |v| v.as_slice())
    }

    /// Subscriptions whose descriptor matches `event` and whose guard holds
    /// now.
    pub fn find_matches(&self, event: &GameEvent, view: &GameView) -> Vec<Subscription> {
        self.subscriptions(event.kind)
            .iter()
            .filter(|sub| {
                let Some(ability) = view.ability(sub.ability) else {
                    return false;
                };
                let Some(trigger) = &ability.trigger else {
                    return false;
                };
                let ctx = ConditionContext::new(view, sub.source, sub.controller);
                trigger.matches(event, &ctx)
                    && ConditionEvaluator::holds(ability.condition.as_ref(), &ctx)
            })
            .copied()
            .collect()
    }

    /// Total number of subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_event.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
