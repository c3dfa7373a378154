//! Ability definitions - the compiler's output unit.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::cost::CostToken;
use super::keyword::{Keyword, KeywordAbility};
use crate::cards::CardId;
use crate::compiler::CompileError;
use crate::effects::Effect;
use crate::triggers::{Condition, TriggerDescriptor};

/// Stable ability identity: owning card + ordinal position.
///
/// Abilities nested inside a grant effect ("gains \"When ...\"") keep the
/// ordinal of the ability that grants them and get a non-zero `nested` index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilityId {
    pub card: CardId,
    pub ordinal: u16,
    pub nested: u16,
}

impl AbilityId {
    #[must_use]
    pub const fn new(card: CardId, ordinal: u16) -> Self {
        Self {
            card,
            ordinal,
            nested: 0,
        }
    }

    #[must_use]
    pub const fn nested(self, index: u16) -> Self {
        Self {
            nested: index,
            ..self
        }
    }
}

impl std::fmt::Display for AbilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nested == 0 {
            write!(f, "{}#{}", self.card, self.ordinal)
        } else {
            write!(f, "{}#{}.{}", self.card, self.ordinal, self.nested)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityCategory {
    Static,
    Triggered,
    Activated,
}

/// How the ability's text was laid out on the card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityOrigin {
    /// Keyword with reminder text.
    Keyword,
    /// Ability with an all-caps name header.
    Named,
    /// Bare parenthetical, such as a song's singing reminder.
    Reminder,
    /// Plain text without a header (action effects).
    Unlabeled,
    /// Quoted ability granted by another ability.
    Granted,
}

/// A compiled ability.
///
/// Invariants (checked by [`AbilityDefinition::validate`]):
/// - at least one effect
/// - activated abilities have at least one cost
/// - triggered abilities have a trigger
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub id: AbilityId,
    pub card: CardId,
    pub category: AbilityCategory,
    pub origin: AbilityOrigin,

    /// Name header, e.g. "HEROISM".
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub keyword: Option<KeywordAbility>,

    /// Raw text the ability was compiled from.
    pub text: String,

    #[serde(default)]
    pub trigger: Option<TriggerDescriptor>,

    /// Guard: checked when a trigger fires and again at resolution; for
    /// static abilities it gates the whole layer.
    #[serde(default)]
    pub condition: Option<Condition>,

    #[serde(default)]
    pub costs: SmallVec<[CostToken; 2]>,

    pub effects: Vec<Effect>,

    /// At most once per turn ("Once during your turn, whenever ...").
    #[serde(default)]
    pub once_per_turn: bool,
}

impl AbilityDefinition {
    /// Create an ability with no trigger, guard, costs or effects.
    #[must_use]
    pub fn new(
        id: AbilityId,
        category: AbilityCategory,
        origin: AbilityOrigin,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            card: id.card,
            category,
            origin,
            name: None,
            keyword: None,
            text: text.into(),
            trigger: None,
            condition: None,
            costs: SmallVec::new(),
            effects: Vec::new(),
            once_per_turn: false,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: KeywordAbility) -> Self {
        self.keyword = Some(keyword);
        self
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: TriggerDescriptor) -> Self {
        self.trigger = Some(trigger);
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: CostToken) -> Self {
        self.costs.push(cost);
        self
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.keyword.as_ref().is_some_and(|k| k.keyword == keyword)
    }

    /// Check the structural invariants, including nested granted abilities.
    pub fn validate(&self) -> Result<(), CompileError> {
        if self.effects.is_empty() {
            return Err(CompileError::NoEffects {
                text: self.text.clone(),
            });
        }
        if self.category == AbilityCategory::Activated && self.costs.is_empty() {
            return Err(CompileError::MissingCost {
                text: self.text.clone(),
            });
        }
        if self.category == AbilityCategory::Triggered && self.trigger.is_none() {
            return Err(CompileError::MissingTrigger {
                text: self.text.clone(),
            });
        }
        for effect in &self.effects {
            for nested in effect.granted_abilities() {
                nested.validate()?;
            }
        }
        Ok(())
    }

    /// Find an ability nested inside this one's grant effects.
    #[must_use]
    pub fn find_nested(&self, id: AbilityId) -> Option<&AbilityDefinition> {
        self.effects
            .iter()
            .flat_map(Effect::granted_abilities)
            .find_map(|nested| {
                if nested.id == id {
                    Some(nested)
                } else {
                    nested.find_nested(id)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Duration, Grant, TargetSelector};
    use crate::triggers::{EventKind, TriggerDescriptor};

    fn id() -> AbilityId {
        AbilityId::new(CardId::new(4), 1)
    }

    fn grant_evasive() -> Effect {
        Effect::GrantAbility {
            target: TargetSelector::this(),
            grant: Grant::keyword(Keyword::Evasive),
            duration: Duration::Permanent,
        }
    }

    #[test]
    fn test_ability_id_display() {
        assert_eq!(id().to_string(), "Card(4)#1");
        assert_eq!(id().nested(2).to_string(), "Card(4)#1.2");
    }

    #[test]
    fn test_validate_requires_effects() {
        let ability = AbilityDefinition::new(id(), AbilityCategory::Static, AbilityOrigin::Named, "x");
        assert!(matches!(ability.validate(), Err(CompileError::NoEffects { .. })));

        let ability = ability.with_effect(grant_evasive());
        assert!(ability.validate().is_ok());
    }

    #[test]
    fn test_validate_activated_needs_cost() {
        let ability = AbilityDefinition::new(id(), AbilityCategory::Activated, AbilityOrigin::Named, "x")
            .with_effect(grant_evasive());
        assert!(matches!(ability.validate(), Err(CompileError::MissingCost { .. })));
        assert!(ability.with_cost(CostToken::ExertSelf).validate().is_ok());
    }

    #[test]
    fn test_validate_triggered_needs_trigger() {
        let ability = AbilityDefinition::new(id(), AbilityCategory::Triggered, AbilityOrigin::Named, "x")
            .with_effect(grant_evasive());
        assert!(matches!(ability.validate(), Err(CompileError::MissingTrigger { .. })));

        let ability = ability.with_trigger(TriggerDescriptor::this(EventKind::CharacterQuested));
        assert!(ability.validate().is_ok());
    }

    #[test]
    fn test_nested_lookup() {
        let inner = AbilityDefinition::new(id().nested(1), AbilityCategory::Static, AbilityOrigin::Granted, "inner")
            .with_effect(grant_evasive());
        let outer = AbilityDefinition::new(id(), AbilityCategory::Static, AbilityOrigin::Named, "outer")
            .with_effect(Effect::GrantAbility {
                target: TargetSelector::this(),
                grant: Grant::Ability(Box::new(inner)),
                duration: Duration::UntilEndOfTurn,
            });

        assert_eq!(outer.find_nested(id().nested(1)).map(|a| a.text.as_str()), Some("inner"));
        assert!(outer.find_nested(id().nested(2)).is_none());
    }
}
