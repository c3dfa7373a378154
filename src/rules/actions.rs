//! Turn actions.
//!
//! These are the only ways a game moves forward besides effects. Each
//! action checks its legality against the current layers, mutates the
//! state, and hands the events it caused to the cascade.
//!
//! Illegal requests (questing with an exerted character, playing a card
//! that is not in hand) are caller errors. Costs that cannot be paid are
//! not: `play_card` and `activate` report them as
//! `ActionOutcome::Unavailable`.

use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityCategory, AbilityId, AbilityOrigin, CostToken, Keyword};
use crate::cards::{CardCategory, CardInstance, CardRecord};
use crate::core::{EntityId, Expiry, GameState, PlayerId, Zone};
use crate::effects::{
    banish, deal_damage, Destination, Effect, EffectResolver, FilterContext, GameView, ResolutionContext,
    Restriction, Stat, TargetScope,
};
use crate::triggers::{ConditionContext, ConditionEvaluator, GameEvent, CHALLENGE_TAG};
use crate::zones::ZonePosition;

use super::choices::sanitize_picks;
use super::engine::{EngineError, ResolutionEngine, ResolutionReport};

/// How a card is played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    /// Pay the card's effective ink cost.
    Normal,
    /// Pay the Shift cost and put the card on top of a same-named character.
    Shift { onto: EntityId },
    /// Exert a character to play a song for free.
    Sing { singer: EntityId },
}

/// Why a cost could not be paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shortfall {
    NotEnoughInk,
    SourceExerted,
    SourceDrying,
    /// No legal card to banish or discard.
    NoCostCard,
    AlreadyUsed,
    ConditionUnmet,
}

/// Result of an action that has a cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Done(ResolutionReport),
    /// Nothing was paid and nothing happened.
    Unavailable(Shortfall),
}

impl ActionOutcome {
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, ActionOutcome::Done(_))
    }

    #[must_use]
    pub fn report(&self) -> Option<&ResolutionReport> {
        match self {
            ActionOutcome::Done(report) => Some(report),
            ActionOutcome::Unavailable(_) => None,
        }
    }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), EngineError> {
    if condition {
        Ok(())
    } else {
        Err(EngineError::IllegalAction(message()))
    }
}

impl<'c> ResolutionEngine<'c> {
    fn lookup(&self, state: &GameState, entity: EntityId) -> Result<(CardInstance, &'c CardRecord), EngineError> {
        let instance = state.card(entity).ok_or(EngineError::UnknownEntity(entity))?;
        let record = self
            .catalog
            .record(instance.card_id)
            .ok_or(EngineError::UnknownCard(entity))?;
        Ok((instance.clone(), record))
    }

    // === Turn structure ===

    /// Start the active player's turn: expire their "until your next turn"
    /// modifiers, ready and dry their cards, reset the ink flag, and draw
    /// (except on the very first turn of the game).
    pub fn start_turn(&mut self, state: &mut GameState) -> Result<ResolutionReport, EngineError> {
        let player = state.active_player;
        state.expire_modifiers(|t| t.expiry == Expiry::StartOfTurn(player));
        self.refresh(state);

        for zone in [Zone::Play, Zone::Inkwell] {
            let entities = state.cards_in(player, zone).to_vec();
            for entity in entities {
                let cant_ready = zone == Zone::Play && self.layers.has_restriction(entity, Restriction::CantReady);
                if let Some(card) = state.card_mut(entity) {
                    if !cant_ready {
                        card.exerted = false;
                    }
                    card.drying = false;
                }
            }
        }
        state.player_mut(player).inked_this_turn = false;

        let mut events = vec![GameEvent::turn_started(player)];
        if self.config.draw_on_turn_start && state.turn_number > 1 {
            if let Some(card) = state.draw(player) {
                events.push(GameEvent::drawn(card, player));
            }
        }
        tracing::debug!(%player, turn = state.turn_number, "turn started");
        self.cascade(state, events)
    }

    /// End the active player's turn. End-of-turn triggers resolve while
    /// "this turn" effects still apply; those expire afterwards and the
    /// next player becomes active.
    pub fn end_turn(&mut self, state: &mut GameState) -> Result<ResolutionReport, EngineError> {
        let player = state.active_player;
        let mut report = self.cascade(state, vec![GameEvent::turn_ended(player)])?;

        let expired = state.expire_modifiers(|t| t.expiry == Expiry::EndOfTurn);
        state.clear_turn_usage();
        state.active_player = player.next(state.player_count());
        state.turn_number += 1;
        tracing::debug!(%player, expired, "turn ended");

        report.merge(self.state_based_check(state)?);
        Ok(report)
    }

    // === Actions ===

    /// Put a card from hand into its owner's inkwell, once per turn.
    pub fn ink_card(&mut self, state: &mut GameState, entity: EntityId) -> Result<ResolutionReport, EngineError> {
        let (card, record) = self.lookup(state, entity)?;
        let player = card.owner;
        ensure(card.zone == Zone::Hand, || format!("{entity} is not in hand"))?;
        ensure(player == state.active_player, || format!("{player} is not the active player"))?;
        ensure(record.inkable, || format!("{} is not inkable", record.display_name()))?;
        ensure(!state.player(player).inked_this_turn, || format!("{player} already inked this turn"))?;

        state.move_card(entity, Zone::Inkwell, ZonePosition::Top);
        state.player_mut(player).inked_this_turn = true;
        self.cascade(state, vec![GameEvent::inked(entity, player)])
    }

    /// Play a card from hand.
    pub fn play_card(
        &mut self,
        state: &mut GameState,
        entity: EntityId,
        mode: PlayMode,
    ) -> Result<ActionOutcome, EngineError> {
        self.refresh(state);
        let catalog = self.catalog;
        let (card, record) = self.lookup(state, entity)?;
        let player = card.owner;
        ensure(card.zone == Zone::Hand, || format!("{entity} is not in hand"))?;
        ensure(player == state.active_player, || format!("{player} is not the active player"))?;

        let mut events = Vec::new();
        let mut paid = Vec::new();
        match mode {
            PlayMode::Normal => {
                let cost = self.view(state).effective_stat(entity, Stat::Cost);
                let cost = u32::try_from(cost).unwrap_or(0);
                if !state.pay_ink(player, cost) {
                    return Ok(ActionOutcome::Unavailable(Shortfall::NotEnoughInk));
                }
            }
            PlayMode::Shift { onto } => {
                let (base, base_record) = self.lookup(state, onto)?;
                ensure(base.zone == Zone::Play && base.controller == player, || {
                    format!("{onto} is not one of {player}'s cards in play")
                })?;
                ensure(base_record.name.eq_ignore_ascii_case(&record.name), || {
                    format!("{} cannot shift onto {}", record.display_name(), base_record.display_name())
                })?;
                let shift = catalog
                    .abilities(card.card_id)
                    .iter()
                    .find(|a| a.is_keyword(Keyword::Shift))
                    .ok_or_else(|| EngineError::IllegalAction(format!("{} has no Shift", record.display_name())))?;
                match self.pay_costs(state, entity, player, &shift.costs, &mut events) {
                    Ok(cards) => paid = cards,
                    Err(shortfall) => return Ok(ActionOutcome::Unavailable(shortfall)),
                }
            }
            PlayMode::Sing { singer } => {
                ensure(record.is_song(), || format!("{} is not a song", record.display_name()))?;
                self.check_singer(state, singer, player, record, entity)?;
                if let Some(c) = state.card_mut(singer) {
                    c.exerted = true;
                }
                events.push(GameEvent::exerted(singer, player));
            }
        }

        let mut report = ResolutionReport::default();
        if record.category.is_permanent() {
            state.move_card(entity, Zone::Play, ZonePosition::Top);
            self.apply_entry_effects(state, entity);
            let mut played = GameEvent::card_played(entity, player);
            if let PlayMode::Shift { onto } = mode {
                let (base, _) = self.lookup(state, onto)?;
                state.move_card(onto, Zone::Discard, ZonePosition::Top);
                if let Some(c) = state.card_mut(entity) {
                    c.damage = base.damage;
                    c.exerted = base.exerted;
                    c.drying = base.drying;
                    c.shifted_from = Some(onto);
                }
                played = played.with_tag("shift");
            }
            events.push(played);
        } else {
            events.push(GameEvent::card_played(entity, player));
            if let PlayMode::Sing { singer } = mode {
                events.push(GameEvent::song_sung(entity, singer, player));
            }
            let outcome = {
                let mut ctx = ResolutionContext::new(entity, player).with_paid(paid);
                let mut resolver = EffectResolver::new(state, catalog, &mut self.layers, self.decisions.as_mut());
                for ability in catalog.abilities(card.card_id) {
                    let resolves_on_play = ability.category == AbilityCategory::Static
                        && matches!(ability.origin, AbilityOrigin::Named | AbilityOrigin::Unlabeled);
                    if !resolves_on_play {
                        continue;
                    }
                    ctx.ability = Some(ability.id);
                    if !resolver.guard_holds(ability.condition.as_ref(), &ctx) {
                        tracing::debug!(ability = %ability.id, "guard false on play, ability suppressed");
                        report.suppressed += 1;
                        continue;
                    }
                    resolver.resolve(&ability.effects, &mut ctx);
                    report.resolved += 1;
                }
                resolver.finish()
            };
            report.fizzled += outcome.fizzled;
            events.extend(outcome.events);
            state.move_card(entity, Zone::Discard, ZonePosition::Top);
        }

        tracing::debug!(card = %record.display_name(), %player, ?mode, "card played");
        report.merge(self.cascade(state, events)?);
        Ok(ActionOutcome::Done(report))
    }

    fn check_singer(
        &self,
        state: &GameState,
        singer: EntityId,
        player: PlayerId,
        song: &CardRecord,
        song_entity: EntityId,
    ) -> Result<(), EngineError> {
        let (card, record) = self.lookup(state, singer)?;
        let view = self.view(state);
        ensure(card.zone == Zone::Play && card.controller == player, || {
            format!("{singer} is not one of {player}'s cards in play")
        })?;
        ensure(record.category == CardCategory::Character, || format!("{singer} is not a character"))?;
        ensure(!card.exerted && !card.drying, || format!("{singer} cannot exert to sing"))?;
        ensure(!view.has_restriction(singer, Restriction::CantSing), || format!("{singer} can't sing"))?;

        let required = view
            .keyword_value(song_entity, Keyword::Singable)
            .unwrap_or_else(|| i64::from(song.cost));
        let cost = view.effective_stat(singer, Stat::Cost);
        let singer_value = view.keyword_value(singer, Keyword::Singer).unwrap_or(0);
        ensure(cost.max(singer_value) >= required, || {
            format!("{} cannot sing {}", record.display_name(), song.display_name())
        })
    }

    /// Apply "enters play exerted" and "enters play with N damage".
    fn apply_entry_effects(&self, state: &mut GameState, entity: EntityId) {
        let Some(card_id) = state.card(entity).map(|c| c.card_id) else {
            return;
        };
        for ability in self.catalog.abilities(card_id) {
            if ability.category != AbilityCategory::Static {
                continue;
            }
            for effect in &ability.effects {
                if let Effect::MoveZone {
                    target,
                    to: Destination::Play { exerted, damage },
                } = effect
                {
                    if target.scope != TargetScope::This {
                        continue;
                    }
                    if let Some(card) = state.card_mut(entity) {
                        card.exerted |= *exerted;
                        card.add_damage(i64::from(*damage));
                    }
                }
            }
        }
    }

    /// Quest: exert a ready, dry character and gain its effective lore.
    pub fn quest(&mut self, state: &mut GameState, entity: EntityId) -> Result<ResolutionReport, EngineError> {
        self.refresh(state);
        let (card, record) = self.lookup(state, entity)?;
        let player = card.controller;
        ensure(card.zone == Zone::Play && record.category == CardCategory::Character, || {
            format!("{entity} is not a character in play")
        })?;
        ensure(player == state.active_player, || format!("{player} is not the active player"))?;
        ensure(!card.exerted, || format!("{entity} is exerted"))?;
        ensure(!card.drying, || format!("{entity} is still drying"))?;
        let view = self.view(state);
        ensure(!view.has_restriction(entity, Restriction::CantQuest), || format!("{entity} can't quest"))?;
        ensure(!view.has_keyword(entity, Keyword::Reckless), || format!("{entity} is reckless"))?;

        let lore = view.effective_stat(entity, Stat::Lore);
        if let Some(c) = state.card_mut(entity) {
            c.exerted = true;
        }
        state.add_lore(player, lore);
        self.cascade(state, vec![GameEvent::quested(entity, player, lore)])
    }

    /// Challenge an opposing character or location.
    ///
    /// "Whenever this character challenges" abilities resolve before damage
    /// is dealt. Attacker and defender then deal damage simultaneously;
    /// Challenger adds to the attacker's strength and Resist reduces damage
    /// taken. Banishments caused by that damage are tagged `challenge`.
    pub fn challenge(
        &mut self,
        state: &mut GameState,
        attacker: EntityId,
        defender: EntityId,
    ) -> Result<ResolutionReport, EngineError> {
        self.refresh(state);
        self.check_challenge(state, attacker, defender)?;
        let player = state.active_player;

        if let Some(c) = state.card_mut(attacker) {
            c.exerted = true;
        }
        let mut report = self.cascade(state, vec![GameEvent::challenge(attacker, defender, player)])?;
        if !state.is_in_play(attacker) || !state.is_in_play(defender) || state.is_game_over() {
            return Ok(report);
        }

        let (attack, defense) = {
            let view = self.view(state);
            let attack = view.effective_stat(attacker, Stat::Strength)
                + view.keyword_value(attacker, Keyword::Challenger).unwrap_or(0);
            let defense = match view.record(defender).map(|r| r.category) {
                Some(CardCategory::Character) => view.effective_stat(defender, Stat::Strength),
                _ => 0,
            };
            (attack, defense)
        };
        let dealt = [
            deal_damage(state, self.catalog, &self.layers, Some(attacker), defender, attack),
            deal_damage(state, self.catalog, &self.layers, Some(defender), attacker, defense),
        ];
        let events: Vec<GameEvent> = dealt
            .into_iter()
            .flatten()
            .map(|e| e.with_tag(CHALLENGE_TAG))
            .collect();

        self.challenge = Some((attacker, defender));
        report.merge(self.cascade(state, events)?);
        self.challenge = None;
        Ok(report)
    }

    fn check_challenge(&self, state: &GameState, attacker: EntityId, defender: EntityId) -> Result<(), EngineError> {
        let (a, a_record) = self.lookup(state, attacker)?;
        let (d, d_record) = self.lookup(state, defender)?;
        let view = self.view(state);

        ensure(a.zone == Zone::Play && a_record.category == CardCategory::Character, || {
            format!("{attacker} is not a character in play")
        })?;
        ensure(a.controller == state.active_player, || format!("{attacker} is not the active player's"))?;
        ensure(!a.exerted, || format!("{attacker} is exerted"))?;
        ensure(!a.drying || view.has_keyword(attacker, Keyword::Rush), || {
            format!("{attacker} is still drying")
        })?;
        ensure(!view.has_restriction(attacker, Restriction::CantChallenge), || {
            format!("{attacker} can't challenge")
        })?;

        ensure(d.zone == Zone::Play && d_record.category.takes_damage(), || {
            format!("{defender} cannot be challenged")
        })?;
        ensure(d.controller != a.controller, || format!("{defender} is not an opposing card"))?;
        if d_record.category == CardCategory::Character {
            ensure(d.exerted, || format!("{defender} is not exerted"))?;
        }
        ensure(!view.has_restriction(defender, Restriction::CantBeChallenged), || {
            format!("{defender} can't be challenged")
        })?;
        if view.has_keyword(defender, Keyword::Evasive) {
            ensure(view.has_keyword(attacker, Keyword::Evasive), || {
                format!("{defender} can only be challenged by evasive characters")
            })?;
        }
        if !view.has_keyword(defender, Keyword::Bodyguard) {
            let guarded = state.cards_in(d.controller, Zone::Play).iter().any(|&e| {
                e != defender
                    && view.has_keyword(e, Keyword::Bodyguard)
                    && state.card(e).is_some_and(|c| c.exerted)
            });
            ensure(!guarded, || format!("an exerted bodyguard must be challenged before {defender}"))?;
        }
        Ok(())
    }

    /// Use an activated ability. Every cost is checked before any is paid.
    pub fn activate(
        &mut self,
        state: &mut GameState,
        source: EntityId,
        ability: AbilityId,
    ) -> Result<ActionOutcome, EngineError> {
        self.refresh(state);
        let (card, record) = self.lookup(state, source)?;
        let player = card.controller;
        ensure(card.zone == Zone::Play, || format!("{source} is not in play"))?;
        ensure(player == state.active_player, || format!("{player} is not the active player"))?;

        let catalog = self.catalog;
        let definition = catalog
            .ability(ability)
            .filter(|a| a.category == AbilityCategory::Activated)
            .ok_or_else(|| EngineError::IllegalAction(format!("{ability} is not an activated ability")))?;
        let owned = ability.card == card.card_id
            || self.layers.granted_abilities(source).any(|a| a.id == ability);
        ensure(owned, || format!("{} does not have {ability}", record.display_name()))?;

        if definition.once_per_turn && state.ability_used_this_turn(source, ability) {
            return Ok(ActionOutcome::Unavailable(Shortfall::AlreadyUsed));
        }
        let guard = {
            let view = self.view(state);
            ConditionEvaluator::holds(definition.condition.as_ref(), &ConditionContext::new(&view, source, player))
        };
        if !guard {
            return Ok(ActionOutcome::Unavailable(Shortfall::ConditionUnmet));
        }

        let mut events = Vec::new();
        let paid = match self.pay_costs(state, source, player, &definition.costs, &mut events) {
            Ok(paid) => paid,
            Err(shortfall) => return Ok(ActionOutcome::Unavailable(shortfall)),
        };
        if definition.once_per_turn {
            state.mark_ability_used(source, ability);
        }

        let outcome = {
            let mut ctx = ResolutionContext::new(source, player)
                .with_ability(ability)
                .with_paid(paid);
            let mut resolver = EffectResolver::new(state, catalog, &mut self.layers, self.decisions.as_mut());
            resolver.resolve(&definition.effects, &mut ctx);
            resolver.finish()
        };
        events.extend(outcome.events);
        tracing::debug!(%ability, %source, "ability activated");

        let mut report = ResolutionReport {
            fizzled: outcome.fizzled,
            ..ResolutionReport::default()
        };
        report.merge(self.cascade(state, events)?);
        Ok(ActionOutcome::Done(report))
    }

    /// Check every cost token, then pay them all. Returns the cards chosen
    /// while paying. Nothing is paid when any token is unpayable.
    fn pay_costs(
        &mut self,
        state: &mut GameState,
        source: EntityId,
        controller: PlayerId,
        costs: &[CostToken],
        events: &mut Vec<GameEvent>,
    ) -> Result<Vec<EntityId>, Shortfall> {
        let mut ink = 0;
        let mut exert_self = false;
        let mut banish_self = false;
        let mut to_banish = Vec::new();
        let mut to_discard = Vec::new();

        {
            let view = GameView::new(&*state, self.catalog, &self.layers);
            let source_card = state.card(source).ok_or(Shortfall::NoCostCard)?;
            let filter_ctx = FilterContext {
                controller,
                source: Some(source),
                paid: &[],
            };

            for token in costs {
                match token {
                    CostToken::ExertSelf => {
                        if source_card.exerted {
                            return Err(Shortfall::SourceExerted);
                        }
                        let is_character = view.record(source).is_some_and(|r| r.category == CardCategory::Character);
                        if is_character && source_card.drying {
                            return Err(Shortfall::SourceDrying);
                        }
                        exert_self = true;
                    }
                    CostToken::Ink(n) => ink += n,
                    CostToken::BanishSelf => banish_self = true,
                    CostToken::BanishOther(filter) => {
                        let candidates: Vec<EntityId> = view
                            .candidates(filter, &filter_ctx)
                            .into_iter()
                            .filter(|e| *e != source && !to_banish.contains(e))
                            .collect();
                        let picks = self.decisions.choose_targets(&view, controller, &candidates, 1, false);
                        let picked = sanitize_picks(picks, &candidates, 1, true);
                        if picked.is_empty() {
                            return Err(Shortfall::NoCostCard);
                        }
                        to_banish.extend(picked);
                    }
                    CostToken::Discard { count, filter } => {
                        let filter = filter.clone().in_zone(Zone::Hand);
                        let hand: Vec<EntityId> = state
                            .cards_in(controller, Zone::Hand)
                            .iter()
                            .copied()
                            .filter(|e| *e != source && !to_discard.contains(e))
                            .filter(|&e| view.matches(e, &filter, &filter_ctx))
                            .collect();
                        let count = *count as usize;
                        let picks = self.decisions.choose_discard(&view, controller, &hand, count);
                        let picked = sanitize_picks(picks, &hand, count, true);
                        if picked.len() < count {
                            return Err(Shortfall::NoCostCard);
                        }
                        to_discard.extend(picked);
                    }
                }
            }
        }
        if state.available_ink(controller) < ink {
            return Err(Shortfall::NotEnoughInk);
        }

        state.pay_ink(controller, ink);
        if exert_self {
            if let Some(card) = state.card_mut(source) {
                card.exerted = true;
            }
            events.push(GameEvent::exerted(source, controller));
        }
        if banish_self {
            events.extend(banish(state, source, Some(source), false));
        }
        for &entity in &to_banish {
            events.extend(banish(state, entity, Some(source), false));
        }
        for &entity in &to_discard {
            state.move_card(entity, Zone::Discard, ZonePosition::Top);
        }

        let mut paid = to_banish;
        paid.extend(to_discard);
        Ok(paid)
    }
}
