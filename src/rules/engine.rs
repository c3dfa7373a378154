//! Resolution engine.
//!
//! `ResolutionEngine` owns everything a game needs besides the state
//! itself: the current continuous layers, the trigger index, the FIFO
//! trigger queue and the decision maker. The `GameState` and the card
//! catalog are passed in explicitly, so any number of games can run side
//! by side against one catalog.
//!
//! ## Cascade
//!
//! `notify` processes one event to quiescence:
//!
//! 1. run a state-based check, then match the event against the trigger
//!    index and queue every match (active player's triggers first, then
//!    registration order)
//! 2. pop the oldest trigger; discard it if its source left play, unless
//!    it is a "when this is banished" trigger
//! 3. re-check its guard; a false guard suppresses the whole ability
//! 4. resolve its effects, then treat the events they caused like step 1
//!
//! Banishment events are matched against the index as it was before the
//! state-based check, so the banished card's own triggers still fire.

use crate::abilities::AbilityDefinition;
use crate::cards::CardCatalog;
use crate::core::{EngineConfig, EntityId, GameState, PlayerId};
use crate::effects::{
    EffectResolver, GameView, LayerSet, ResolutionContext, TargetContext, TargetSelector,
    TargetingResolver,
};
use crate::stack::{PendingTrigger, TriggerQueue};
use crate::triggers::{ConditionContext, ConditionEvaluator, EventKind, GameEvent, Subscription, TriggerIndex};

use super::choices::{DecisionMaker, FirstChoice};

/// Caller contract violations. Game-rule outcomes (fizzles, suppressed
/// abilities, unpayable costs) are reported as values instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("no card definition for {0}")]
    UnknownCard(EntityId),

    #[error("illegal action: {0}")]
    IllegalAction(String),

    #[error("trigger cascade exceeded {0} steps")]
    CascadeLimit(usize),
}

/// Summary of one cascade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Triggered abilities, and abilities of played actions, that resolved.
    pub resolved: u32,
    /// Abilities whose guard was false at resolution time.
    pub suppressed: u32,
    /// Effects whose mandatory target set was empty.
    pub fizzled: u32,
    /// Triggered abilities dropped because their source left play.
    pub discarded: u32,
    /// Cards banished by state-based checks.
    pub banished: u32,
}

impl ResolutionReport {
    pub fn merge(&mut self, other: ResolutionReport) {
        self.resolved += other.resolved;
        self.suppressed += other.suppressed;
        self.fizzled += other.fizzled;
        self.discarded += other.discarded;
        self.banished += other.banished;
    }
}

/// Runtime half of the system: triggers, layers, effect application.
pub struct ResolutionEngine<'c> {
    pub(crate) catalog: &'c CardCatalog,
    pub(crate) config: EngineConfig,
    pub(crate) layers: LayerSet,
    pub(crate) index: TriggerIndex,
    pub(crate) queue: TriggerQueue,
    pub(crate) decisions: Box<dyn DecisionMaker>,
    /// Attacker and defender of the challenge being resolved.
    pub(crate) challenge: Option<(EntityId, EntityId)>,
}

impl<'c> ResolutionEngine<'c> {
    /// Create an engine that answers every choice with `FirstChoice`.
    #[must_use]
    pub fn new(catalog: &'c CardCatalog, config: EngineConfig) -> Self {
        Self {
            catalog,
            config,
            layers: LayerSet::default(),
            index: TriggerIndex::new(),
            queue: TriggerQueue::new(),
            decisions: Box::new(FirstChoice),
            challenge: None,
        }
    }

    #[must_use]
    pub fn with_decisions(mut self, decisions: Box<dyn DecisionMaker>) -> Self {
        self.decisions = decisions;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &'c CardCatalog {
        self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Continuous layers as of the last state-based check.
    #[must_use]
    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    #[must_use]
    pub fn trigger_index(&self) -> &TriggerIndex {
        &self.index
    }

    /// Read-only view over `state` with the current layers.
    #[must_use]
    pub fn view<'a>(&'a self, state: &'a GameState) -> GameView<'a> {
        GameView::new(state, self.catalog, &self.layers)
    }

    /// Process an externally produced event and everything it causes.
    pub fn notify(&mut self, state: &mut GameState, event: GameEvent) -> Result<ResolutionReport, EngineError> {
        self.cascade(state, vec![event])
    }

    /// Legal targets for a selector, for validating a player's choices
    /// before an action is committed.
    #[must_use]
    pub fn legal_targets(
        &self,
        state: &GameState,
        selector: &TargetSelector,
        controller: PlayerId,
        source: EntityId,
    ) -> Vec<EntityId> {
        let ctx = TargetContext {
            source,
            controller,
            event: None,
            previous: &[],
            paid: &[],
        };
        TargetingResolver::legal_targets(&self.view(state), selector, &ctx)
    }

    /// Bring derived state up to date and resolve whatever that triggers.
    pub fn state_based_check(&mut self, state: &mut GameState) -> Result<ResolutionReport, EngineError> {
        self.cascade(state, Vec::new())
    }

    /// Recompute layers and rebuild the trigger index.
    pub(crate) fn refresh(&mut self, state: &GameState) {
        self.layers = LayerSet::recompute(state, self.catalog);
        let view = GameView::new(state, self.catalog, &self.layers);
        self.index.rebuild(&view);
    }

    /// Process `events`, then resolve queued triggers until none are left.
    pub(crate) fn cascade(
        &mut self,
        state: &mut GameState,
        events: Vec<GameEvent>,
    ) -> Result<ResolutionReport, EngineError> {
        let mut report = ResolutionReport::default();
        self.process_events(state, events, &mut report);

        let mut steps = 0;
        while let Some(trigger) = self.queue.pop() {
            if state.is_game_over() {
                self.queue.clear();
                break;
            }
            steps += 1;
            if steps > self.config.max_cascade_steps {
                self.queue.clear();
                tracing::warn!(steps, "trigger cascade limit reached");
                return Err(EngineError::CascadeLimit(self.config.max_cascade_steps));
            }
            let events = self.resolve_trigger(state, &trigger, &mut report)?;
            self.process_events(state, events, &mut report);
        }
        Ok(report)
    }

    /// Match a batch of events and run a state-based check.
    fn process_events(&mut self, state: &mut GameState, events: Vec<GameEvent>, report: &mut ResolutionReport) {
        let mut early: Vec<Option<Vec<Subscription>>> = events
            .iter()
            .map(|e| (e.kind == EventKind::Banished).then(|| self.matches_for(&*state, e)))
            .collect();

        let settled = self.run_state_based(state, report);

        for (event, matched) in events.into_iter().zip(early.iter_mut()) {
            let subs = matched.take().unwrap_or_else(|| self.matches_for(&*state, &event));
            self.enqueue(&*state, subs, &event);
            state.record_event(event);
        }
        for (event, subs) in settled {
            self.enqueue(&*state, subs, &event);
            state.record_event(event);
        }
    }

    /// Subscriptions matching an event against the current index.
    pub(crate) fn matches_for(&self, state: &GameState, event: &GameEvent) -> Vec<Subscription> {
        let view = GameView::new(state, self.catalog, &self.layers);
        let mut subs = self.index.find_matches(event, &view);
        if self.config.active_player_first {
            let active = state.active_player;
            let count = state.player_count();
            subs.sort_by_key(|s| (s.controller.turn_rank(active, count), s.order));
        } else {
            subs.sort_by_key(|s| s.order);
        }
        subs
    }

    fn enqueue(&mut self, state: &GameState, subs: Vec<Subscription>, event: &GameEvent) {
        for sub in subs {
            tracing::debug!(
                ability = %sub.ability,
                source = %sub.source,
                event = ?event.kind,
                turn = state.turn_number,
                "trigger matched"
            );
            self.queue.push(&sub, event);
        }
    }

    fn trigger_ability(&self, trigger: &PendingTrigger) -> Result<&'c AbilityDefinition, EngineError> {
        self.catalog
            .ability(trigger.ability)
            .ok_or(EngineError::UnknownCard(trigger.source))
    }

    /// Resolve one dequeued trigger. Returns the events its effects caused.
    fn resolve_trigger(
        &mut self,
        state: &mut GameState,
        trigger: &PendingTrigger,
        report: &mut ResolutionReport,
    ) -> Result<Vec<GameEvent>, EngineError> {
        let ability = self.trigger_ability(trigger)?;
        if state.card(trigger.source).is_none() {
            return Err(EngineError::UnknownEntity(trigger.source));
        }

        let leaves_play = ability.trigger.as_ref().is_some_and(|t| t.is_self_banish());
        if !state.is_in_play(trigger.source) && !leaves_play {
            tracing::debug!(ability = %trigger.ability, source = %trigger.source, "source left play, trigger discarded");
            report.discarded += 1;
            return Ok(Vec::new());
        }

        let guard_holds = {
            let view = GameView::new(&*state, self.catalog, &self.layers);
            let ctx = ConditionContext::new(&view, trigger.source, trigger.controller);
            ConditionEvaluator::holds(ability.condition.as_ref(), &ctx)
        };
        let used = ability.once_per_turn && state.ability_used_this_turn(trigger.source, ability.id);
        if !guard_holds || used {
            tracing::debug!(ability = %trigger.ability, "guard false at resolution, ability suppressed");
            report.suppressed += 1;
            return Ok(Vec::new());
        }
        if ability.once_per_turn {
            state.mark_ability_used(trigger.source, ability.id);
        }

        let mut ctx = ResolutionContext::new(trigger.source, trigger.controller)
            .with_ability(ability.id)
            .with_event(trigger.event.clone());
        let outcome = {
            let mut resolver =
                EffectResolver::new(state, self.catalog, &mut self.layers, self.decisions.as_mut());
            resolver.resolve(&ability.effects, &mut ctx);
            resolver.finish()
        };
        report.resolved += 1;
        report.fizzled += outcome.fizzled;
        Ok(outcome.events)
    }
}
