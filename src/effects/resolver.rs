//! Effect resolution - executing effects on game state.
//!
//! `EffectResolver` applies a list of effect nodes in declared order. Each
//! `Effect` kind has exactly one handler. Handlers resolve their selectors
//! through the `TargetingResolver`, ask the `DecisionMaker` for choices, and
//! record the `GameEvent`s they cause; the engine matches those events
//! against the trigger index once the ability has finished.
//!
//! An effect whose mandatory target set is empty fizzles: nothing happens
//! and the fizzle is counted, the remaining effects still resolve.

use crate::abilities::{AbilityId, Keyword};
use crate::cards::{CardCatalog, CardCategory};
use crate::core::{EntityId, Expiry, GameState, PlayerId, TimedModifier, Zone};
use crate::rules::choices::{sanitize_picks, DecisionMaker};
use crate::triggers::{Condition, ConditionContext, ConditionEvaluator, GameEvent, CHALLENGE_TAG};
use crate::zones::ZonePosition;

use super::effect::{Amount, ChoiceMode, Destination, Duration, Effect, Restriction};
use super::layers::{LayerSet, Modifier};
use super::targeting::{
    CardFilter, FilterContext, GameView, PlayerSelector, TargetContext, TargetScope, TargetSelector,
    TargetingResolver,
};

/// Everything an ability's effects may refer back to while resolving.
#[derive(Clone, Debug)]
pub struct ResolutionContext {
    pub ability: Option<AbilityId>,
    /// Card the ability belongs to.
    pub source: EntityId,
    pub controller: PlayerId,
    /// Event that triggered the ability.
    pub event: Option<GameEvent>,
    /// Cards chosen while paying costs.
    pub paid: Vec<EntityId>,
    /// Targets of the most recent targeting effect.
    pub previous: Vec<EntityId>,
}

impl ResolutionContext {
    #[must_use]
    pub fn new(source: EntityId, controller: PlayerId) -> Self {
        Self {
            ability: None,
            source,
            controller,
            event: None,
            paid: Vec::new(),
            previous: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_ability(mut self, ability: AbilityId) -> Self {
        self.ability = Some(ability);
        self
    }

    #[must_use]
    pub fn with_event(mut self, event: GameEvent) -> Self {
        self.event = Some(event);
        self
    }

    #[must_use]
    pub fn with_paid(mut self, paid: Vec<EntityId>) -> Self {
        self.paid = paid;
        self
    }
}

/// What resolving a list of effects did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectOutcome {
    pub applied: u32,
    pub fizzled: u32,
    /// Events caused, in order.
    pub events: Vec<GameEvent>,
}

/// Resolves effects on game state.
pub struct EffectResolver<'r> {
    state: &'r mut GameState,
    catalog: &'r CardCatalog,
    layers: &'r mut LayerSet,
    decisions: &'r mut dyn DecisionMaker,
    vanishing: Vec<EntityId>,
    outcome: EffectOutcome,
}

impl<'r> EffectResolver<'r> {
    pub fn new(
        state: &'r mut GameState,
        catalog: &'r CardCatalog,
        layers: &'r mut LayerSet,
        decisions: &'r mut dyn DecisionMaker,
    ) -> Self {
        Self {
            state,
            catalog,
            layers,
            decisions,
            vanishing: Vec::new(),
            outcome: EffectOutcome::default(),
        }
    }

    /// Resolve effects in order. Layers are recomputed after every effect
    /// so later effects see earlier stat changes.
    pub fn resolve(&mut self, effects: &[Effect], ctx: &mut ResolutionContext) {
        for effect in effects {
            if self.state.is_game_over() {
                break;
            }
            let applied = self.resolve_effect(effect, ctx);
            if applied {
                self.outcome.applied += 1;
            } else {
                self.outcome.fizzled += 1;
                tracing::debug!(
                    effect = effect.kind_name(),
                    source = %ctx.source,
                    "effect fizzled"
                );
            }
            self.banish_vanishing(ctx);
            *self.layers = LayerSet::recompute(&*self.state, self.catalog);
        }
    }

    /// Evaluate an ability's guard against the state as it is now.
    #[must_use]
    pub fn guard_holds(&self, condition: Option<&Condition>, ctx: &ResolutionContext) -> bool {
        let view = GameView::new(&*self.state, self.catalog, &*self.layers);
        ConditionEvaluator::holds(condition, &ConditionContext::new(&view, ctx.source, ctx.controller))
    }

    #[must_use]
    pub fn finish(self) -> EffectOutcome {
        self.outcome
    }

    fn resolve_effect(&mut self, effect: &Effect, ctx: &mut ResolutionContext) -> bool {
        match effect {
            Effect::ModifyStat {
                target,
                amount,
                duration,
                ..
            } => {
                let amount = self.amount(amount, ctx);
                self.apply_timed(effect, target, amount, duration, ctx)
            }
            Effect::GrantAbility { target, duration, .. } | Effect::Restrict { target, duration, .. } => {
                self.apply_timed(effect, target, 0, duration, ctx)
            }
            Effect::MoveDamage { from, to, amount, up_to } => self.move_damage(from, to, *amount, *up_to, ctx),
            Effect::DealDamage { target, amount } => self.deal_damage(target, amount, ctx),
            Effect::RemoveDamage { target, amount, .. } => self.remove_damage(target, *amount, ctx),
            Effect::Draw { player, count } => self.draw(*player, count, ctx),
            Effect::Discard { player, count, filter } => self.discard(*player, *count, filter, ctx),
            Effect::MoveZone { target, to } => self.move_zone(target, to, ctx),
            Effect::SetExerted { target, exerted } => self.set_exerted(target, *exerted, ctx),
            Effect::GainLore { player, amount } => self.gain_lore(*player, amount, ctx),
            Effect::Choice { mode, options } => self.choose(*mode, options, ctx),
        }
    }

    // === Selection ===

    /// Resolve a selector. `None` means a mandatory selection came up empty.
    fn select(&mut self, selector: &TargetSelector, ctx: &mut ResolutionContext) -> Option<Vec<EntityId>> {
        let view = GameView::new(&*self.state, self.catalog, &*self.layers);
        let target_ctx = TargetContext {
            source: ctx.source,
            controller: ctx.controller,
            event: ctx.event.as_ref(),
            previous: &ctx.previous,
            paid: &ctx.paid,
        };
        let legal = TargetingResolver::legal_targets(&view, selector, &target_ctx);
        let targets = match selector.scope {
            TargetScope::Chosen { count, up_to } => {
                let count = count as usize;
                let picks = self
                    .decisions
                    .choose_targets(&view, ctx.controller, &legal, count, up_to);
                let chosen = sanitize_picks(picks, &legal, count, !up_to);
                let from_action = view
                    .record(ctx.source)
                    .is_some_and(|r| r.category == CardCategory::Action);
                if from_action {
                    self.vanishing.extend(chosen.iter().copied().filter(|&e| {
                        view.controller(e).is_some_and(|c| c != ctx.controller)
                            && view.has_keyword(e, Keyword::Vanish)
                    }));
                }
                chosen
            }
            _ => legal,
        };

        if targets.is_empty() && selector.is_mandatory() {
            return None;
        }
        if !targets.is_empty() {
            ctx.previous.clone_from(&targets);
        }
        Some(targets)
    }

    fn players(&mut self, selector: PlayerSelector, ctx: &ResolutionContext) -> Vec<PlayerId> {
        let view = GameView::new(&*self.state, self.catalog, &*self.layers);
        let players =
            TargetingResolver::players(&view, selector, ctx.controller, &ctx.previous, ctx.event.as_ref());
        if selector != PlayerSelector::ChosenOpponent {
            return players;
        }
        self.decisions
            .choose_opponent(&view, ctx.controller, &players)
            .filter(|p| players.contains(p))
            .or_else(|| players.first().copied())
            .into_iter()
            .collect()
    }

    fn amount(&self, amount: &Amount, ctx: &ResolutionContext) -> i64 {
        GameView::new(&*self.state, self.catalog, &*self.layers).amount(amount, ctx.source, ctx.controller)
    }

    fn banish_vanishing(&mut self, ctx: &ResolutionContext) {
        for entity in std::mem::take(&mut self.vanishing) {
            if let Some(event) = banish(self.state, entity, Some(ctx.source), false) {
                self.outcome.events.push(event);
            }
        }
    }

    // === Handlers ===

    fn apply_timed(
        &mut self,
        effect: &Effect,
        target: &TargetSelector,
        amount: i64,
        duration: &Duration,
        ctx: &mut ResolutionContext,
    ) -> bool {
        let Some(modifier) = Modifier::from_effect(effect, amount) else {
            return false;
        };
        let Some(targets) = self.select(target, ctx) else {
            return false;
        };
        let expiry = expiry_for(duration, ctx);
        for entity in targets {
            self.state.add_timed_modifier(TimedModifier {
                target: entity,
                modifier: modifier.clone(),
                expiry: expiry.clone(),
                controller: ctx.controller,
            });
        }
        true
    }

    fn move_damage(
        &mut self,
        from: &TargetSelector,
        to: &TargetSelector,
        amount: u32,
        up_to: bool,
        ctx: &mut ResolutionContext,
    ) -> bool {
        let Some(sources) = self.select(from, ctx) else {
            return false;
        };
        let Some(destinations) = self.select(to, ctx) else {
            return false;
        };
        let (Some(&from), Some(&to)) = (sources.first(), destinations.first()) else {
            return up_to;
        };
        if from == to || !self.takes_damage(to) {
            return up_to;
        }
        let moved = self
            .state
            .card_mut(from)
            .map_or(0, |c| c.remove_damage(i64::from(amount)));
        if let Some(card) = self.state.card_mut(to) {
            card.add_damage(moved);
        }
        ctx.previous = vec![to];
        moved > 0 || up_to
    }

    fn deal_damage(&mut self, target: &TargetSelector, amount: &Amount, ctx: &mut ResolutionContext) -> bool {
        let amount = self.amount(amount, ctx);
        let Some(targets) = self.select(target, ctx) else {
            return false;
        };
        for entity in targets {
            if let Some(event) = deal_damage(self.state, self.catalog, self.layers, Some(ctx.source), entity, amount) {
                self.outcome.events.push(event);
            }
        }
        true
    }

    fn remove_damage(&mut self, target: &TargetSelector, amount: u32, ctx: &mut ResolutionContext) -> bool {
        let Some(targets) = self.select(target, ctx) else {
            return false;
        };
        for entity in targets {
            if let Some(card) = self.state.card_mut(entity) {
                card.remove_damage(i64::from(amount));
            }
        }
        true
    }

    fn draw(&mut self, player: PlayerSelector, count: &Amount, ctx: &ResolutionContext) -> bool {
        let count = self.amount(count, ctx).max(0);
        for player in self.players(player, ctx) {
            for _ in 0..count {
                let Some(card) = self.state.draw(player) else {
                    break;
                };
                self.outcome.events.push(GameEvent::drawn(card, player));
            }
        }
        true
    }

    fn discard(&mut self, player: PlayerSelector, count: u32, filter: &CardFilter, ctx: &ResolutionContext) -> bool {
        let mut filter = filter.clone().in_zone(Zone::Hand);
        filter.controller = super::targeting::Relation::Any;
        for player in self.players(player, ctx) {
            let view = GameView::new(&*self.state, self.catalog, &*self.layers);
            let filter_ctx = FilterContext {
                controller: player,
                source: Some(ctx.source),
                paid: &ctx.paid,
            };
            let hand: Vec<EntityId> = self
                .state
                .cards_in(player, Zone::Hand)
                .iter()
                .copied()
                .filter(|&e| view.matches(e, &filter, &filter_ctx))
                .collect();
            let picks = self.decisions.choose_discard(&view, player, &hand, count as usize);
            for entity in sanitize_picks(picks, &hand, count as usize, true) {
                self.state.move_card(entity, Zone::Discard, ZonePosition::Top);
            }
        }
        true
    }

    fn move_zone(&mut self, target: &TargetSelector, to: &Destination, ctx: &mut ResolutionContext) -> bool {
        let Some(targets) = self.select(target, ctx) else {
            return false;
        };
        for entity in targets {
            let Some(owner) = self.state.card(entity).map(|c| c.owner) else {
                continue;
            };
            match to {
                Destination::Discard => {
                    if self.state.is_in_play(entity) {
                        if let Some(event) = banish(self.state, entity, Some(ctx.source), false) {
                            self.outcome.events.push(event);
                        }
                    } else {
                        self.state.move_card(entity, Zone::Discard, ZonePosition::Top);
                    }
                }
                Destination::Hand => {
                    self.state.move_card(entity, Zone::Hand, ZonePosition::Top);
                }
                Destination::DeckBottom => {
                    self.state.move_card(entity, Zone::Deck, ZonePosition::Bottom);
                }
                Destination::DeckShuffled => {
                    self.state.move_card(entity, Zone::Deck, ZonePosition::Top);
                    self.state.shuffle_deck(owner);
                }
                Destination::Inkwell { exerted } => {
                    self.state.move_card(entity, Zone::Inkwell, ZonePosition::Top);
                    if let Some(card) = self.state.card_mut(entity) {
                        card.exerted = *exerted;
                    }
                }
                Destination::Play { exerted, damage } => {
                    let entered = !self.state.is_in_play(entity);
                    if entered {
                        self.state.move_card(entity, Zone::Play, ZonePosition::Top);
                    }
                    if let Some(card) = self.state.card_mut(entity) {
                        card.exerted |= *exerted;
                        card.add_damage(i64::from(*damage));
                    }
                    if entered {
                        self.outcome.events.push(GameEvent::card_played(entity, ctx.controller));
                    }
                }
            }
        }
        true
    }

    fn set_exerted(&mut self, target: &TargetSelector, exerted: bool, ctx: &mut ResolutionContext) -> bool {
        let Some(targets) = self.select(target, ctx) else {
            return false;
        };
        for entity in targets {
            let cant_ready = self.layers.has_restriction(entity, Restriction::CantReady);
            let Some(card) = self.state.card_mut(entity) else {
                continue;
            };
            if card.exerted == exerted || (!exerted && cant_ready) {
                continue;
            }
            card.exerted = exerted;
            let controller = card.controller;
            self.outcome.events.push(if exerted {
                GameEvent::exerted(entity, controller)
            } else {
                GameEvent::readied(entity, controller)
            });
        }
        true
    }

    fn gain_lore(&mut self, player: PlayerSelector, amount: &Amount, ctx: &ResolutionContext) -> bool {
        let amount = self.amount(amount, ctx);
        for player in self.players(player, ctx) {
            self.state.add_lore(player, amount);
        }
        true
    }

    fn choose(&mut self, mode: ChoiceMode, options: &[Vec<Effect>], ctx: &mut ResolutionContext) -> bool {
        let optional = mode == ChoiceMode::May;
        let picked = {
            let view = GameView::new(&*self.state, self.catalog, &*self.layers);
            self.decisions.choose_option(&view, ctx.controller, options, optional)
        };
        let index = match picked {
            Some(i) if i < options.len() => Some(i),
            _ if optional => None,
            _ => (!options.is_empty()).then_some(0),
        };
        if let Some(i) = index {
            self.resolve(&options[i], ctx);
        }
        true
    }

    fn takes_damage(&self, entity: EntityId) -> bool {
        self.state.is_in_play(entity)
            && GameView::new(&*self.state, self.catalog, &*self.layers)
                .record(entity)
                .is_some_and(|r| r.category.takes_damage())
    }
}

/// Expiry of a modifier created by a resolved effect.
fn expiry_for(duration: &Duration, ctx: &ResolutionContext) -> Expiry {
    match duration {
        Duration::Instant | Duration::UntilEndOfTurn => Expiry::EndOfTurn,
        Duration::UntilYourNextTurn => Expiry::StartOfTurn(ctx.controller),
        Duration::WhileCondition(condition) => Expiry::WhileCondition {
            source: ctx.source,
            condition: condition.clone(),
        },
        Duration::Permanent => Expiry::Never,
    }
}

/// Deal damage to a card in play, reduced by Resist. Returns the
/// `DamageDealt` event, or `None` when no damage was dealt.
pub(crate) fn deal_damage(
    state: &mut GameState,
    catalog: &CardCatalog,
    layers: &LayerSet,
    source: Option<EntityId>,
    target: EntityId,
    amount: i64,
) -> Option<GameEvent> {
    let dealt = {
        let view = GameView::new(&*state, catalog, layers);
        if !state.is_in_play(target) || !view.record(target).is_some_and(|r| r.category.takes_damage()) {
            return None;
        }
        amount - view.keyword_value(target, Keyword::Resist).unwrap_or(0)
    };
    if dealt <= 0 {
        return None;
    }
    state.card_mut(target)?.add_damage(dealt);
    Some(GameEvent::damage(source, target, dealt))
}

/// Move a card from play to its owner's discard. Returns the `Banished`
/// event, or `None` if the card was not in play.
pub(crate) fn banish(
    state: &mut GameState,
    entity: EntityId,
    banisher: Option<EntityId>,
    in_challenge: bool,
) -> Option<GameEvent> {
    if !state.is_in_play(entity) {
        return None;
    }
    let controller = state.card(entity)?.controller;
    state.move_card(entity, Zone::Discard, ZonePosition::Top)?;
    let event = GameEvent::banished(entity, controller, banisher);
    Some(if in_challenge {
        event.with_tag(CHALLENGE_TAG)
    } else {
        event
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, CardRecord};
    use crate::effects::Stat;
    use crate::rules::FirstChoice;
    use crate::triggers::EventKind;

    fn catalog() -> CardCatalog {
        let mut catalog = CardCatalog::new();
        let cards = [
            CardRecord::new(CardId::new(1), "Knight", CardCategory::Character, 3).with_stats(2, 4, 1),
            CardRecord::new(CardId::new(2), "Squire", CardCategory::Character, 1).with_stats(1, 2, 1),
            CardRecord::new(CardId::new(3), "Fireball", CardCategory::Action, 2),
        ];
        for card in cards {
            catalog.insert(card, Vec::new()).unwrap();
        }
        catalog
    }

    fn resolve(
        state: &mut GameState,
        catalog: &CardCatalog,
        effects: &[Effect],
        ctx: &mut ResolutionContext,
    ) -> EffectOutcome {
        let mut layers = LayerSet::recompute(state, catalog);
        let mut decisions = FirstChoice;
        let mut resolver = EffectResolver::new(state, catalog, &mut layers, &mut decisions);
        resolver.resolve(effects, ctx);
        resolver.finish()
    }

    #[test]
    fn test_deal_damage_emits_event() {
        let catalog = catalog();
        let mut state = GameState::new(2, 1);
        let spell = state.create_card(CardId::new(3), PlayerId::new(0), Zone::Hand);
        let enemy = state.create_card(CardId::new(1), PlayerId::new(1), Zone::Play);

        let effects = [Effect::DealDamage {
            target: TargetSelector::chosen(CardFilter::characters()),
            amount: Amount::Fixed(2),
        }];
        let mut ctx = ResolutionContext::new(spell, PlayerId::new(0));
        let outcome = resolve(&mut state, &catalog, &effects, &mut ctx);

        assert_eq!(outcome.applied, 1);
        assert_eq!(state.card(enemy).unwrap().damage, 2);
        assert_eq!(outcome.events[0].kind, EventKind::DamageDealt);
        assert_eq!(ctx.previous, vec![enemy]);
    }

    #[test]
    fn test_empty_mandatory_target_fizzles() {
        let catalog = catalog();
        let mut state = GameState::new(2, 1);
        let spell = state.create_card(CardId::new(3), PlayerId::new(0), Zone::Hand);
        let mine = state.create_card(CardId::new(2), PlayerId::new(0), Zone::Play);

        let effects = [
            Effect::DealDamage {
                target: TargetSelector::chosen(CardFilter::characters().opposing()),
                amount: Amount::Fixed(2),
            },
            Effect::Draw {
                player: PlayerSelector::You,
                count: Amount::Fixed(1),
            },
        ];
        let mut ctx = ResolutionContext::new(spell, PlayerId::new(0));
        let outcome = resolve(&mut state, &catalog, &effects, &mut ctx);

        assert_eq!(outcome.fizzled, 1);
        assert_eq!(outcome.applied, 1);
        assert_eq!(state.card(mine).unwrap().damage, 0);
    }

    #[test]
    fn test_timed_stat_modifier() {
        let catalog = catalog();
        let mut state = GameState::new(2, 1);
        let knight = state.create_card(CardId::new(1), PlayerId::new(0), Zone::Play);

        let effects = [Effect::ModifyStat {
            target: TargetSelector::this(),
            stat: Stat::Strength,
            amount: Amount::Fixed(3),
            duration: Duration::UntilEndOfTurn,
        }];
        let mut ctx = ResolutionContext::new(knight, PlayerId::new(0));
        resolve(&mut state, &catalog, &effects, &mut ctx);

        let layers = LayerSet::recompute(&state, &catalog);
        let view = GameView::new(&state, &catalog, &layers);
        assert_eq!(view.effective_stat(knight, Stat::Strength), 5);
        assert_eq!(state.timed_modifiers()[0].expiry, Expiry::EndOfTurn);
    }

    #[test]
    fn test_banish_and_return_to_hand() {
        let catalog = catalog();
        let mut state = GameState::new(2, 1);
        let spell = state.create_card(CardId::new(3), PlayerId::new(0), Zone::Hand);
        let enemy = state.create_card(CardId::new(2), PlayerId::new(1), Zone::Play);
        let mine = state.create_card(CardId::new(2), PlayerId::new(0), Zone::Play);

        let effects = [
            Effect::MoveZone {
                target: TargetSelector::chosen(CardFilter::characters().opposing()),
                to: Destination::Discard,
            },
            Effect::MoveZone {
                target: TargetSelector::chosen(CardFilter::characters().yours()),
                to: Destination::Hand,
            },
        ];
        let mut ctx = ResolutionContext::new(spell, PlayerId::new(0));
        let outcome = resolve(&mut state, &catalog, &effects, &mut ctx);

        assert_eq!(state.card(enemy).unwrap().zone, Zone::Discard);
        assert_eq!(state.card(mine).unwrap().zone, Zone::Hand);
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].target, Some(enemy));
        assert_eq!(outcome.events[0].source, Some(spell));
    }

    #[test]
    fn test_optional_choice_accepted() {
        let catalog = catalog();
        let mut state = GameState::new(2, 1);
        let knight = state.create_card(CardId::new(1), PlayerId::new(0), Zone::Play);
        state.create_card(CardId::new(2), PlayerId::new(0), Zone::Deck);

        let effects = [Effect::may(vec![Effect::Draw {
            player: PlayerSelector::You,
            count: Amount::Fixed(1),
        }])];
        let mut ctx = ResolutionContext::new(knight, PlayerId::new(0));
        let outcome = resolve(&mut state, &catalog, &effects, &mut ctx);

        assert_eq!(state.cards_in(PlayerId::new(0), Zone::Hand).len(), 1);
        assert_eq!(outcome.events[0].kind, EventKind::CardDrawn);
    }

    #[test]
    fn test_move_damage() {
        let catalog = catalog();
        let mut state = GameState::new(2, 1);
        let mine = state.create_card(CardId::new(1), PlayerId::new(0), Zone::Play);
        let enemy = state.create_card(CardId::new(1), PlayerId::new(1), Zone::Play);
        state.card_mut(mine).unwrap().damage = 2;

        let effects = [Effect::MoveDamage {
            from: TargetSelector::chosen(CardFilter::characters().yours()),
            to: TargetSelector::chosen(CardFilter::characters().opposing()),
            amount: 1,
            up_to: false,
        }];
        let mut ctx = ResolutionContext::new(mine, PlayerId::new(0));
        resolve(&mut state, &catalog, &effects, &mut ctx);

        assert_eq!(state.card(mine).unwrap().damage, 1);
        assert_eq!(state.card(enemy).unwrap().damage, 1);
    }
}
