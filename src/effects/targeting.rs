//! Effect targeting.
//!
//! - `CardFilter`: predicate over zone, controller relation, category,
//!   classification, name, damage/exertion and effective stats
//! - `TargetSelector`: a scope ("chosen", "all", "this") plus a filter
//! - `GameView`: read-only facade over state, catalog and current layers
//! - `TargetingResolver`: turns a selector into the legal target set

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::abilities::{AbilityDefinition, AbilityId, Keyword};
use crate::cards::{CardCatalog, CardCategory, CardRecord};
use crate::core::{EntityId, GameState, PlayerId, Zone};
use crate::triggers::{GameEvent, SubjectRole};

use super::effect::{Amount, Restriction, Stat};
use super::layers::LayerSet;

/// Relation between a player and an ability's controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[default]
    Any,
    You,
    Opponent,
}

impl Relation {
    #[must_use]
    pub fn holds(self, player: PlayerId, controller: PlayerId) -> bool {
        match self {
            Relation::Any => true,
            Relation::You => player == controller,
            Relation::Opponent => player != controller,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    AtLeast,
    AtMost,
    Equal,
}

impl Comparison {
    #[must_use]
    pub fn holds(self, actual: i64, expected: i64) -> bool {
        match self {
            Comparison::AtLeast => actual >= expected,
            Comparison::AtMost => actual <= expected,
            Comparison::Equal => actual == expected,
        }
    }
}

/// "with 3 ¤ or more", "with cost 2 or less"
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatComparison {
    pub stat: Stat,
    pub comparison: Comparison,
    pub value: i64,
}

fn default_zone() -> Option<Zone> {
    Some(Zone::Play)
}

/// Predicate over cards. Every field narrows the match; the default
/// matches any card in play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardFilter {
    /// `None` matches any zone.
    #[serde(default = "default_zone")]
    pub zone: Option<Zone>,
    #[serde(default)]
    pub controller: Relation,
    /// Empty matches any category.
    #[serde(default)]
    pub categories: SmallVec<[CardCategory; 2]>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Same name as a card paid as a cost ("with the same name as the
    /// banished character").
    #[serde(default)]
    pub same_name_as_paid: bool,
    /// "other": excludes the source card.
    #[serde(default)]
    pub exclude_self: bool,
    #[serde(default)]
    pub damaged: Option<bool>,
    #[serde(default)]
    pub exerted: Option<bool>,
    #[serde(default)]
    pub stat: Option<StatComparison>,
    #[serde(default)]
    pub keyword: Option<Keyword>,
}

impl Default for CardFilter {
    fn default() -> Self {
        Self {
            zone: default_zone(),
            controller: Relation::Any,
            categories: SmallVec::new(),
            classification: None,
            name: None,
            same_name_as_paid: false,
            exclude_self: false,
            damaged: None,
            exerted: None,
            stat: None,
            keyword: None,
        }
    }
}

impl CardFilter {
    /// Any card in play.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn characters() -> Self {
        Self::any().category(CardCategory::Character)
    }

    #[must_use]
    pub fn category(mut self, category: CardCategory) -> Self {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
        self
    }

    #[must_use]
    pub fn in_zone(mut self, zone: Zone) -> Self {
        self.zone = Some(zone);
        self
    }

    /// Match cards in any zone.
    #[must_use]
    pub fn anywhere(mut self) -> Self {
        self.zone = None;
        self
    }

    #[must_use]
    pub fn yours(mut self) -> Self {
        self.controller = Relation::You;
        self
    }

    #[must_use]
    pub fn opposing(mut self) -> Self {
        self.controller = Relation::Opponent;
        self
    }

    #[must_use]
    pub fn other(mut self) -> Self {
        self.exclude_self = true;
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn classified(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }

    #[must_use]
    pub fn damaged(mut self) -> Self {
        self.damaged = Some(true);
        self
    }

    #[must_use]
    pub fn exerted(mut self, exerted: bool) -> Self {
        self.exerted = Some(exerted);
        self
    }

    #[must_use]
    pub fn with_stat(mut self, stat: Stat, comparison: Comparison, value: i64) -> Self {
        self.stat = Some(StatComparison {
            stat,
            comparison,
            value,
        });
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        self.keyword = Some(keyword);
        self
    }

    #[must_use]
    pub fn same_name_as_paid(mut self) -> Self {
        self.same_name_as_paid = true;
        self
    }
}

/// Who an effect selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetScope {
    /// The source card.
    This,
    /// Chosen by the controller.
    Chosen { count: u32, up_to: bool },
    /// Every matching card.
    All,
    /// Every matching card controlled by an opponent.
    EachOpponents,
    /// The card the triggering event is about ("that character").
    EventSubject,
    /// The event's source ("the challenging character").
    EventSource,
    /// The previous effect's targets ("them", "it").
    Previous,
    /// The card paid as a cost.
    Paid,
}

/// A scope plus a filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetSelector {
    pub scope: TargetScope,
    pub filter: CardFilter,
}

impl TargetSelector {
    #[must_use]
    pub fn new(scope: TargetScope, filter: CardFilter) -> Self {
        Self { scope, filter }
    }

    #[must_use]
    pub fn this() -> Self {
        Self::new(TargetScope::This, CardFilter::any())
    }

    /// "chosen <filter>"
    #[must_use]
    pub fn chosen(filter: CardFilter) -> Self {
        Self::new(TargetScope::Chosen { count: 1, up_to: false }, filter)
    }

    /// "up to N chosen <filter>"
    #[must_use]
    pub fn chosen_up_to(filter: CardFilter, count: u32) -> Self {
        Self::new(TargetScope::Chosen { count, up_to: true }, filter)
    }

    #[must_use]
    pub fn all(filter: CardFilter) -> Self {
        Self::new(TargetScope::All, filter)
    }

    #[must_use]
    pub fn each_opposing(filter: CardFilter) -> Self {
        Self::new(TargetScope::EachOpponents, filter.opposing())
    }

    #[must_use]
    pub fn event_subject() -> Self {
        Self::new(TargetScope::EventSubject, CardFilter::any().anywhere())
    }

    #[must_use]
    pub fn event_source() -> Self {
        Self::new(TargetScope::EventSource, CardFilter::any().anywhere())
    }

    #[must_use]
    pub fn previous() -> Self {
        Self::new(TargetScope::Previous, CardFilter::any().anywhere())
    }

    #[must_use]
    pub fn paid() -> Self {
        Self::new(TargetScope::Paid, CardFilter::any().anywhere())
    }

    /// Whether an empty legal set makes the effect fizzle. "up to" and
    /// "all" selections resolve with zero targets instead.
    #[must_use]
    pub fn is_mandatory(&self) -> bool {
        !matches!(
            self.scope,
            TargetScope::Chosen { up_to: true, .. } | TargetScope::All | TargetScope::EachOpponents
        )
    }
}

/// Player-targeting selectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSelector {
    You,
    EachOpponent,
    EachPlayer,
    ChosenOpponent,
    /// Controller of the previous effect's targets (or of the event subject).
    TargetController,
}

/// Context for filter matching.
#[derive(Clone, Copy, Debug)]
pub struct FilterContext<'p> {
    pub controller: PlayerId,
    pub source: Option<EntityId>,
    pub paid: &'p [EntityId],
}

/// Read-only view used by conditions, targeting and layer recomputation.
#[derive(Clone, Copy)]
pub struct GameView<'a> {
    pub state: &'a GameState,
    pub catalog: &'a CardCatalog,
    pub layers: &'a LayerSet,
}

impl<'a> GameView<'a> {
    #[must_use]
    pub fn new(state: &'a GameState, catalog: &'a CardCatalog, layers: &'a LayerSet) -> Self {
        Self {
            state,
            catalog,
            layers,
        }
    }

    /// Printed record of a card instance.
    #[must_use]
    pub fn record(&self, entity: EntityId) -> Option<&'a CardRecord> {
        let instance = self.state.card(entity)?;
        self.catalog.record(instance.card_id)
    }

    #[must_use]
    pub fn controller(&self, entity: EntityId) -> Option<PlayerId> {
        self.state.card(entity).map(|c| c.controller)
    }

    #[must_use]
    pub fn ability(&self, id: AbilityId) -> Option<&'a AbilityDefinition> {
        self.catalog.ability(id)
    }

    /// Printed value of a stat, before modifiers.
    #[must_use]
    pub fn base_stat(&self, entity: EntityId, stat: Stat) -> i64 {
        let Some(record) = self.record(entity) else {
            return 0;
        };
        match stat {
            Stat::Strength => record.strength.unwrap_or(0),
            Stat::Willpower => record.willpower.unwrap_or(0),
            Stat::Lore => record.lore.unwrap_or(0),
            Stat::Cost => i64::from(record.cost),
        }
    }

    /// Printed value plus layer modifiers; never below zero.
    #[must_use]
    pub fn effective_stat(&self, entity: EntityId, stat: Stat) -> i64 {
        (self.base_stat(entity, stat) + self.layers.stat_delta(entity, stat)).max(0)
    }

    #[must_use]
    pub fn has_keyword(&self, entity: EntityId, keyword: Keyword) -> bool {
        self.layers.has_keyword(entity, keyword)
    }

    /// Keyword value; stacking keywords (Challenger, Resist) add up.
    #[must_use]
    pub fn keyword_value(&self, entity: EntityId, keyword: Keyword) -> Option<i64> {
        self.layers.keyword_value(entity, keyword)
    }

    #[must_use]
    pub fn has_restriction(&self, entity: EntityId, restriction: Restriction) -> bool {
        self.layers.has_restriction(entity, restriction)
    }

    /// Abilities granted to an entity by layers.
    pub fn granted_abilities(&self, entity: EntityId) -> impl Iterator<Item = &'a AbilityDefinition> + 'a {
        self.layers.granted_abilities(entity)
    }

    /// Check a card against a filter.
    #[must_use]
    pub fn matches(&self, entity: EntityId, filter: &CardFilter, ctx: &FilterContext) -> bool {
        let Some(instance) = self.state.card(entity) else {
            return false;
        };
        let Some(record) = self.catalog.record(instance.card_id) else {
            return false;
        };

        if filter.zone.is_some_and(|z| z != instance.zone) {
            return false;
        }
        if !filter.controller.holds(instance.controller, ctx.controller) {
            return false;
        }
        if !filter.categories.is_empty() && !filter.categories.contains(&record.category) {
            return false;
        }
        if filter.exclude_self && ctx.source == Some(entity) {
            return false;
        }
        if let Some(classification) = &filter.classification {
            if !record.has_classification(classification) {
                return false;
            }
        }
        if let Some(name) = &filter.name {
            if !record.name.eq_ignore_ascii_case(name) {
                return false;
            }
        }
        if filter.same_name_as_paid {
            let same = ctx
                .paid
                .iter()
                .filter_map(|p| self.record(*p))
                .any(|paid| paid.name.eq_ignore_ascii_case(&record.name));
            if !same {
                return false;
            }
        }
        if filter.damaged.is_some_and(|d| d != instance.is_damaged()) {
            return false;
        }
        if filter.exerted.is_some_and(|e| e != instance.exerted) {
            return false;
        }
        if let Some(cmp) = &filter.stat {
            if !cmp
                .comparison
                .holds(self.effective_stat(entity, cmp.stat), cmp.value)
            {
                return false;
            }
        }
        if let Some(keyword) = filter.keyword {
            if !self.has_keyword(entity, keyword) {
                return false;
            }
        }
        true
    }

    /// Shorthand for [`GameView::matches`] without paid cards.
    #[must_use]
    pub fn matches_filter(
        &self,
        entity: EntityId,
        filter: &CardFilter,
        controller: PlayerId,
        source: Option<EntityId>,
    ) -> bool {
        let ctx = FilterContext {
            controller,
            source,
            paid: &[],
        };
        self.matches(entity, filter, &ctx)
    }

    /// All cards matching a filter: per player in seat order, then zone order.
    #[must_use]
    pub fn candidates(&self, filter: &CardFilter, ctx: &FilterContext) -> Vec<EntityId> {
        let zones: SmallVec<[Zone; 5]> = match filter.zone {
            Some(zone) => SmallVec::from_slice(&[zone]),
            None => SmallVec::from_slice(&Zone::ALL),
        };
        let mut found = Vec::new();
        for player in self.state.player_ids() {
            for zone in &zones {
                for &entity in self.state.cards_in(player, *zone) {
                    if self.matches(entity, filter, ctx) {
                        found.push(entity);
                    }
                }
            }
        }
        found
    }

    #[must_use]
    pub fn count_matching(&self, filter: &CardFilter, controller: PlayerId, source: Option<EntityId>) -> usize {
        let ctx = FilterContext {
            controller,
            source,
            paid: &[],
        };
        self.candidates(filter, &ctx).len()
    }

    /// Evaluate an amount for an ability on `source`.
    #[must_use]
    pub fn amount(&self, amount: &Amount, source: EntityId, controller: PlayerId) -> i64 {
        match amount {
            Amount::Fixed(n) => *n,
            Amount::ForEach { per, filter } => {
                per * self.count_matching(filter, controller, Some(source)) as i64
            }
            Amount::SourceStat(stat) => self.effective_stat(source, *stat),
        }
    }
}

/// Everything a selector may refer back to.
#[derive(Clone, Copy, Debug)]
pub struct TargetContext<'p> {
    pub source: EntityId,
    pub controller: PlayerId,
    pub event: Option<&'p GameEvent>,
    pub previous: &'p [EntityId],
    pub paid: &'p [EntityId],
}

/// Evaluates selectors against the current view.
pub struct TargetingResolver;

impl TargetingResolver {
    /// Legal targets for a selector.
    ///
    /// For `Chosen` scopes this is the candidate set the controller picks
    /// from; opposing cards with Ward are excluded. For the other scopes it
    /// is the final target set.
    #[must_use]
    pub fn legal_targets(view: &GameView, selector: &TargetSelector, ctx: &TargetContext) -> Vec<EntityId> {
        let filter_ctx = FilterContext {
            controller: ctx.controller,
            source: Some(ctx.source),
            paid: ctx.paid,
        };
        let exists = |e: &EntityId| view.state.card(*e).is_some();

        match selector.scope {
            TargetScope::This => std::iter::once(ctx.source).filter(exists).collect(),

            TargetScope::Chosen { .. } => view
                .candidates(&selector.filter, &filter_ctx)
                .into_iter()
                .filter(|&e| {
                    let opposing = view.controller(e).is_some_and(|c| c != ctx.controller);
                    !(opposing && view.has_keyword(e, Keyword::Ward))
                })
                .collect(),

            TargetScope::All => view.candidates(&selector.filter, &filter_ctx),

            TargetScope::EachOpponents => {
                let mut filter = selector.filter.clone();
                filter.controller = Relation::Opponent;
                view.candidates(&filter, &filter_ctx)
            }

            TargetScope::EventSubject => {
                let subject = ctx.event.and_then(|event| match SubjectRole::natural(event.kind) {
                    SubjectRole::Source => event.source,
                    SubjectRole::Target | SubjectRole::Player => event.target,
                });
                subject
                    .into_iter()
                    .filter(|&e| view.matches(e, &selector.filter, &filter_ctx))
                    .collect()
            }

            TargetScope::EventSource => ctx
                .event
                .and_then(|event| event.source)
                .into_iter()
                .filter(|&e| view.matches(e, &selector.filter, &filter_ctx))
                .collect(),

            TargetScope::Previous => ctx.previous.iter().copied().filter(exists).collect(),

            TargetScope::Paid => ctx.paid.iter().copied().filter(exists).collect(),
        }
    }

    /// Resolve a player selector. `ChosenOpponent` yields every opponent;
    /// the engine narrows it through its decision maker.
    #[must_use]
    pub fn players(
        view: &GameView,
        selector: PlayerSelector,
        controller: PlayerId,
        previous: &[EntityId],
        event: Option<&GameEvent>,
    ) -> Vec<PlayerId> {
        let state = view.state;
        match selector {
            PlayerSelector::You => vec![controller],
            PlayerSelector::EachOpponent | PlayerSelector::ChosenOpponent => {
                state.opponents(controller).collect()
            }
            PlayerSelector::EachPlayer => {
                PlayerId::turn_order_from(controller, state.player_count()).collect()
            }
            PlayerSelector::TargetController => {
                let subject = previous
                    .first()
                    .copied()
                    .or_else(|| event.and_then(|e| e.target.or(e.source)));
                subject
                    .and_then(|e| view.controller(e))
                    .map_or_else(Vec::new, |p| vec![p])
            }
        }
    }
}
