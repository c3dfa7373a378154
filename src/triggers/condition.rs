//! Trigger descriptors and guard conditions.
//!
//! A `TriggerDescriptor` is the structured match key extracted from phrases
//! like "Whenever one of your other characters is banished in a challenge".
//! A `Condition` is a guard ("if you have 3 or more cards in your hand",
//! "while this character is exerted") evaluated against a read-only
//! `GameView`.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId, Zone};
use crate::effects::targeting::{CardFilter, Comparison, GameView, Relation};

use super::event::{EventKind, GameEvent};

/// Which event participant a trigger watches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectRole {
    Source,
    Target,
    Player,
}

impl SubjectRole {
    /// Role of the card an event is "about" (see the table in `event`).
    #[must_use]
    pub const fn natural(kind: EventKind) -> Self {
        match kind {
            EventKind::TurnStarted | EventKind::TurnEnded | EventKind::CardDrawn => SubjectRole::Player,
            EventKind::Banished
            | EventKind::DamageDealt
            | EventKind::Exerted
            | EventKind::Readied
            | EventKind::SongSung => SubjectRole::Target,
            EventKind::CardPlayed
            | EventKind::CharacterQuested
            | EventKind::ChallengeDeclared
            | EventKind::CardInked => SubjectRole::Source,
        }
    }
}

/// What the watched participant must be.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TriggerSubject {
    /// The card that owns the ability.
    This,
    /// A card matching the filter, relative to the ability's controller.
    Matching(CardFilter),
    /// A player related to the ability's controller.
    Player(Relation),
    /// Anything.
    Any,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerQualifier {
    /// The event happened during a challenge.
    InChallenge,
}

/// Structured match key for triggered abilities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    pub event: EventKind,
    pub subject: TriggerSubject,
    pub role: SubjectRole,
    #[serde(default)]
    pub qualifier: Option<TriggerQualifier>,
}

impl TriggerDescriptor {
    /// "When this card ..."
    #[must_use]
    pub fn this(event: EventKind) -> Self {
        Self {
            event,
            subject: TriggerSubject::This,
            role: SubjectRole::natural(event),
            qualifier: None,
        }
    }

    /// "Whenever a card matching `filter` ..."
    #[must_use]
    pub fn matching(event: EventKind, filter: CardFilter) -> Self {
        Self {
            event,
            subject: TriggerSubject::Matching(filter),
            role: SubjectRole::natural(event),
            qualifier: None,
        }
    }

    /// "At the start of your turn", "Whenever an opponent draws"...
    #[must_use]
    pub fn player(event: EventKind, relation: Relation) -> Self {
        Self {
            event,
            subject: TriggerSubject::Player(relation),
            role: SubjectRole::Player,
            qualifier: None,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: SubjectRole) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn in_challenge(mut self) -> Self {
        self.qualifier = Some(TriggerQualifier::InChallenge);
        self
    }

    /// Whether this descriptor describes the owning card leaving play.
    /// Such triggers resolve even though their source is gone.
    #[must_use]
    pub fn is_self_banish(&self) -> bool {
        self.event == EventKind::Banished
            && self.subject == TriggerSubject::This
            && self.role == SubjectRole::Target
    }

    /// Check an event against this descriptor.
    #[must_use]
    pub fn matches(&self, event: &GameEvent, ctx: &ConditionContext) -> bool {
        if event.kind != self.event {
            return false;
        }
        if self.qualifier == Some(TriggerQualifier::InChallenge) && !event.in_challenge() {
            return false;
        }

        let entity = match self.role {
            SubjectRole::Source => event.source,
            SubjectRole::Target => event.target,
            SubjectRole::Player => None,
        };

        match &self.subject {
            TriggerSubject::Any => true,
            TriggerSubject::This => entity == Some(ctx.source),
            TriggerSubject::Matching(filter) => entity.is_some_and(|e| {
                ctx.view.matches_filter(e, filter, ctx.controller, Some(ctx.source))
            }),
            TriggerSubject::Player(relation) => {
                let player = match self.role {
                    SubjectRole::Player => event.player,
                    _ => entity.and_then(|e| ctx.view.controller(e)),
                };
                player.is_some_and(|p| relation.holds(p, ctx.controller))
            }
        }
    }
}

/// A guard condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    YourTurn,
    OpponentsTurn,
    /// You control at least `at_least` cards matching the filter.
    ControlsMatching { filter: CardFilter, at_least: u32 },
    /// Your hand size compared to a value.
    HandSize { comparison: Comparison, value: i64 },
    SourceExerted,
    SourceDamaged,
    LoreAtLeast(i64),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Add another condition with AND.
    #[must_use]
    pub fn and(self, other: Condition) -> Self {
        match self {
            Self::All(mut conditions) => {
                conditions.push(other);
                Self::All(conditions)
            }
            _ => Self::All(vec![self, other]),
        }
    }

    /// Negate this condition.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

/// Context for evaluating conditions and trigger descriptors.
pub struct ConditionContext<'v, 'a> {
    pub view: &'v GameView<'a>,
    /// Card that owns the ability.
    pub source: EntityId,
    /// Controller of that card.
    pub controller: PlayerId,
}

impl<'v, 'a> ConditionContext<'v, 'a> {
    pub fn new(view: &'v GameView<'a>, source: EntityId, controller: PlayerId) -> Self {
        Self {
            view,
            source,
            controller,
        }
    }
}

/// Evaluator for guard conditions.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Check if a condition is satisfied.
    pub fn evaluate(condition: &Condition, ctx: &ConditionContext) -> bool {
        let state = ctx.view.state;
        match condition {
            Condition::YourTurn => state.active_player == ctx.controller,

            Condition::OpponentsTurn => state.active_player != ctx.controller,

            Condition::ControlsMatching { filter, at_least } => {
                let count = ctx
                    .view
                    .count_matching(filter, ctx.controller, Some(ctx.source));
                count >= *at_least as usize
            }

            Condition::HandSize { comparison, value } => {
                let size = state.cards_in(ctx.controller, Zone::Hand).len() as i64;
                comparison.holds(size, *value)
            }

            Condition::SourceExerted => state.card(ctx.source).is_some_and(|c| c.exerted),

            Condition::SourceDamaged => state.card(ctx.source).is_some_and(|c| c.is_damaged()),

            Condition::LoreAtLeast(n) => state.lore(ctx.controller) >= *n,

            Condition::All(conditions) => conditions.iter().all(|c| Self::evaluate(c, ctx)),

            Condition::Any(conditions) => conditions.iter().any(|c| Self::evaluate(c, ctx)),

            Condition::Not(inner) => !Self::evaluate(inner, ctx),
        }
    }

    /// Evaluate an optional guard; no guard always holds.
    pub fn holds(condition: Option<&Condition>, ctx: &ConditionContext) -> bool {
        condition.is_none_or(|c| Self::evaluate(c, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardCatalog, CardCategory, CardId, CardRecord};
    use crate::core::GameState;
    use crate::effects::layers::LayerSet;

    fn catalog() -> CardCatalog {
        let mut catalog = CardCatalog::new();
        for (id, name) in [(1, "Ariel"), (2, "Ursula")] {
            let record = CardRecord::new(CardId::new(id), name, CardCategory::Character, 2).with_stats(2, 3, 1);
            catalog.insert(record, Vec::new()).unwrap();
        }
        catalog
    }

    #[test]
    fn test_turn_conditions() {
        let catalog = catalog();
        let mut state = GameState::new(2, 1);
        let ariel = state.create_card(CardId::new(1), PlayerId::new(0), Zone::Play);
        let layers = LayerSet::default();
        let view = GameView::new(&state, &catalog, &layers);
        let ctx = ConditionContext::new(&view, ariel, PlayerId::new(0));

        assert!(ConditionEvaluator::evaluate(&Condition::YourTurn, &ctx));
        assert!(!ConditionEvaluator::evaluate(&Condition::OpponentsTurn, &ctx));
        assert!(ConditionEvaluator::evaluate(&Condition::OpponentsTurn.negate().and(Condition::YourTurn), &ctx));
        assert!(ConditionEvaluator::holds(None, &ctx));
    }

    #[test]
    fn test_controls_and_hand_size() {
        let catalog = catalog();
        let mut state = GameState::new(2, 1);
        let ariel = state.create_card(CardId::new(1), PlayerId::new(0), Zone::Play);
        state.create_card(CardId::new(2), PlayerId::new(0), Zone::Play);
        state.create_card(CardId::new(2), PlayerId::new(0), Zone::Hand);
        let layers = LayerSet::default();
        let view = GameView::new(&state, &catalog, &layers);
        let ctx = ConditionContext::new(&view, ariel, PlayerId::new(0));

        let other_character = Condition::ControlsMatching {
            filter: CardFilter::characters().yours().other(),
            at_least: 1,
        };
        assert!(ConditionEvaluator::evaluate(&other_character, &ctx));

        let named = Condition::ControlsMatching {
            filter: CardFilter::characters().named("Ursula"),
            at_least: 2,
        };
        assert!(!ConditionEvaluator::evaluate(&named, &ctx));

        let empty_hand = Condition::HandSize {
            comparison: Comparison::AtMost,
            value: 0,
        };
        assert!(!ConditionEvaluator::evaluate(&empty_hand, &ctx));
    }

    #[test]
    fn test_descriptor_matching() {
        let catalog = catalog();
        let mut state = GameState::new(2, 1);
        let ariel = state.create_card(CardId::new(1), PlayerId::new(0), Zone::Play);
        let ursula = state.create_card(CardId::new(2), PlayerId::new(1), Zone::Play);
        let layers = LayerSet::default();
        let view = GameView::new(&state, &catalog, &layers);
        let ctx = ConditionContext::new(&view, ariel, PlayerId::new(0));

        let quests = TriggerDescriptor::this(EventKind::CharacterQuested);
        assert!(quests.matches(&GameEvent::quested(ariel, PlayerId::new(0), 1), &ctx));
        assert!(!quests.matches(&GameEvent::quested(ursula, PlayerId::new(1), 1), &ctx));

        let banished_in_challenge = TriggerDescriptor::this(EventKind::Banished).in_challenge();
        assert!(banished_in_challenge.is_self_banish());
        let plain = GameEvent::banished(ariel, PlayerId::new(0), None);
        assert!(!banished_in_challenge.matches(&plain, &ctx));
        assert!(banished_in_challenge.matches(&plain.with_tag(crate::triggers::CHALLENGE_TAG), &ctx));

        let opponent_turn = TriggerDescriptor::player(EventKind::TurnStarted, Relation::Opponent);
        assert!(opponent_turn.matches(&GameEvent::turn_started(PlayerId::new(1)), &ctx));
        assert!(!opponent_turn.matches(&GameEvent::turn_started(PlayerId::new(0)), &ctx));

        let opposing_banished = TriggerDescriptor::matching(EventKind::Banished, CardFilter::characters().anywhere().opposing());
        assert!(opposing_banished.matches(&GameEvent::banished(ursula, PlayerId::new(1), None), &ctx));
    }
}
