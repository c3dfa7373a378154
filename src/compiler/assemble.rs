//! Ability assembler: one segment in, validated abilities out.

use crate::abilities::{AbilityCategory, AbilityDefinition, AbilityId, AbilityOrigin};
use crate::cards::CardId;

use super::classify::{classify, Clause};
use super::error::CompileError;
use super::extract::split_guard;
use super::keyword;
use super::patterns::PhraseContext;
use super::segment::{Segment, SegmentKind};
use super::text::lower;
use super::Compiler;

/// Result of assembling one ability candidate.
pub(crate) struct Candidate {
    pub id: AbilityId,
    pub ability: Result<AbilityDefinition, CompileError>,
    /// Sentence tails the effect rows left over.
    pub unmatched: Vec<String>,
}

impl Candidate {
    fn fully_matched(id: AbilityId, ability: Result<AbilityDefinition, CompileError>) -> Self {
        Self {
            id,
            ability,
            unmatched: Vec::new(),
        }
    }
}

impl Compiler {
    /// Assemble one segment. `next` is the first free ordinal and is
    /// advanced past every ability the segment produces.
    pub(crate) fn assemble(&self, segment: &Segment, card: CardId, next: &mut u16) -> Vec<Candidate> {
        let mut take = || {
            let id = AbilityId::new(card, *next);
            *next = next.saturating_add(1);
            id
        };

        match segment.kind {
            SegmentKind::Keyword => match keyword::recognize(&segment.text) {
                Some(keywords) => keywords
                    .into_iter()
                    .map(|kw| {
                        let id = take();
                        Candidate::fully_matched(id, keyword::build(id, kw, &segment.text))
                    })
                    .collect(),
                None => {
                    let id = take();
                    vec![self.candidate(id, &segment.text, AbilityOrigin::Unlabeled, None, 0)]
                }
            },
            SegmentKind::Reminder => {
                let id = take();
                let candidate = match keyword::singable_cost(&segment.text) {
                    Some(cost) => Candidate::fully_matched(id, Ok(keyword::build_singable(id, cost, &segment.text))),
                    None => {
                        let inner = segment.text.trim().trim_start_matches('(').trim_end_matches(')');
                        let mut candidate = self.candidate(id, inner, AbilityOrigin::Reminder, None, 0);
                        if let Ok(ability) = &mut candidate.ability {
                            ability.text = segment.text.clone();
                        }
                        candidate
                    }
                };
                vec![candidate]
            }
            SegmentKind::Named | SegmentKind::Unlabeled => {
                let origin = if segment.kind == SegmentKind::Named {
                    AbilityOrigin::Named
                } else {
                    AbilityOrigin::Unlabeled
                };
                // A compound trigger becomes one ability per event.
                (0..self.trigger_count(&segment.text))
                    .map(|variant| self.candidate(take(), &segment.text, origin, segment.name.as_deref(), variant))
                    .collect()
            }
        }
    }

    fn candidate(
        &self,
        id: AbilityId,
        text: &str,
        origin: AbilityOrigin,
        name: Option<&str>,
        variant: usize,
    ) -> Candidate {
        let mut unmatched = Vec::new();
        let ability = self.compile_variant(id, text, origin, name, variant, &mut unmatched);
        Candidate { id, ability, unmatched }
    }

    /// Number of trigger events a clause names; 1 when it has none.
    fn trigger_count(&self, text: &str) -> usize {
        match classify(&lower(text.trim())) {
            Clause::Triggered(clause_text) => self
                .triggers
                .parse(clause_text)
                .map_or(1, |parsed| parsed.descriptors.len()),
            _ => 1,
        }
    }

    /// Classify a clause, extract its trigger, guard and costs, then its
    /// effects. Quoted abilities inside are compiled with nested ids.
    pub(crate) fn compile_clause(
        &self,
        id: AbilityId,
        text: &str,
        origin: AbilityOrigin,
        name: Option<&str>,
    ) -> Result<AbilityDefinition, CompileError> {
        self.compile_variant(id, text, origin, name, 0, &mut Vec::new())
    }

    /// As `compile_clause`, taking the `variant`th event of a compound
    /// trigger and collecting the text no effect row matched.
    fn compile_variant(
        &self,
        id: AbilityId,
        text: &str,
        origin: AbilityOrigin,
        name: Option<&str>,
        variant: usize,
        unmatched: &mut Vec<String>,
    ) -> Result<AbilityDefinition, CompileError> {
        let text = text.trim();
        let lowered = lower(text);
        let clause = classify(&lowered);
        let mut ability = AbilityDefinition::new(id, clause.category(), origin, text);
        ability.name = name.map(str::to_string);

        let body = match clause {
            Clause::Activated { costs, body } => {
                ability.costs = costs;
                body
            }
            Clause::Triggered(clause_text) => {
                let mut parsed = self.triggers.parse(clause_text).ok_or_else(|| CompileError::MissingTrigger {
                    text: text.to_string(),
                })?;
                if variant >= parsed.descriptors.len() {
                    return Err(CompileError::MissingTrigger { text: text.to_string() });
                }
                ability.trigger = Some(parsed.descriptors.swap_remove(variant));
                ability.condition = parsed.condition;
                ability.once_per_turn = parsed.once_per_turn;
                parsed.rest
            }
            Clause::Static(clause_text) => match split_guard(clause_text) {
                Some((guard, body)) => {
                    ability.condition = Some(guard);
                    body
                }
                None => clause_text,
            },
        };

        let offset = offset_in(&lowered, body).unwrap_or(0);
        let original = text.get(offset..).unwrap_or(text);
        let is_static = ability.category == AbilityCategory::Static;
        let has_event = ability.category == AbilityCategory::Triggered;

        let mut nested_index = 0u16;
        let mut nested = |quoted: &str| -> Result<AbilityDefinition, CompileError> {
            nested_index += 1;
            self.compile_clause(id.nested(nested_index), quoted, AbilityOrigin::Granted, None)
        };
        let mut ctx = PhraseContext::new(original, is_static, has_event, &mut nested);
        ability.effects = self.patterns.effects(body, &mut ctx);
        unmatched.append(&mut ctx.unmatched);

        if ability.effects.is_empty() {
            return Err(CompileError::NoEffects { text: text.to_string() });
        }
        ability.validate()?;
        Ok(ability)
    }
}

/// Byte offset of `inner` inside `outer`, when it is a subslice.
fn offset_in(outer: &str, inner: &str) -> Option<usize> {
    let start = (inner.as_ptr() as usize).checked_sub(outer.as_ptr() as usize)?;
    (start + inner.len() <= outer.len()).then_some(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Effect, Grant, TargetScope};
    use crate::triggers::{Condition, EventKind};

    fn compile(text: &str) -> Result<AbilityDefinition, CompileError> {
        let compiler = Compiler::try_new().unwrap();
        compiler.compile_clause(AbilityId::new(CardId::new(9), 0), text, AbilityOrigin::Named, Some("TEST"))
    }

    #[test]
    fn test_triggered_with_guard() {
        let ability = compile("Whenever this character quests, if you have 3 or more other characters in play, gain 1 lore.").unwrap();
        assert_eq!(ability.category, AbilityCategory::Triggered);
        assert_eq!(ability.trigger.as_ref().map(|t| t.event), Some(EventKind::CharacterQuested));
        assert!(ability.condition.is_some());
        assert_eq!(ability.effects.len(), 1);
    }

    #[test]
    fn test_static_guard() {
        let ability = compile("While this character is exerted, it gets +2 {W}.").unwrap();
        assert_eq!(ability.condition, Some(Condition::SourceExerted));
        assert_eq!(ability.effects[0].target().map(|t| t.scope.clone()), Some(TargetScope::This));
    }

    #[test]
    fn test_quoted_grant_is_nested() {
        let ability = compile(
            "{E} - Chosen character gains \"When this character is banished, you may draw a card.\" this turn.",
        )
        .unwrap();
        assert_eq!(ability.category, AbilityCategory::Activated);
        let Effect::GrantAbility { grant: Grant::Ability(granted), .. } = &ability.effects[0] else {
            panic!("expected a granted ability");
        };
        assert_eq!(granted.origin, AbilityOrigin::Granted);
        assert_eq!(granted.id, ability.id.nested(1));
        assert_eq!(granted.category, AbilityCategory::Triggered);
        assert!(granted.text.starts_with("When this character"));
    }

    #[test]
    fn test_compound_trigger_splits_into_two_abilities() {
        let compiler = Compiler::try_new().unwrap();
        let segment = Segment {
            kind: SegmentKind::Named,
            name: Some("HELLO".to_string()),
            text: "When you play this character and whenever he quests, draw a card.".to_string(),
        };
        let mut next = 3;
        let candidates = compiler.assemble(&segment, CardId::new(9), &mut next);

        assert_eq!(next, 5);
        let abilities: Vec<_> = candidates.into_iter().map(|c| c.ability.unwrap()).collect();
        assert_eq!(abilities.len(), 2);
        assert_eq!(abilities[0].id.ordinal, 3);
        assert_eq!(abilities[1].id.ordinal, 4);
        assert_eq!(abilities[0].trigger.as_ref().map(|t| t.event), Some(EventKind::CardPlayed));
        assert_eq!(abilities[1].trigger.as_ref().map(|t| t.event), Some(EventKind::CharacterQuested));
        assert_eq!(abilities[0].effects, abilities[1].effects);
        assert!(abilities.iter().all(|a| a.name.as_deref() == Some("HELLO")));
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(compile("Do a little dance."), Err(CompileError::NoEffects { .. })));
        assert!(matches!(
            compile("Whenever the moon is full, draw a card."),
            Err(CompileError::MissingTrigger { .. })
        ));
    }
}
