//! Effect definitions.
//!
//! Effects are the structured nodes the compiler emits and the resolver
//! executes. The set is closed: every kind has exactly one handler in
//! `EffectResolver`, so adding a kind is a compile error until it is
//! handled.

use serde::{Deserialize, Serialize};

use crate::abilities::{AbilityDefinition, Keyword};
use crate::triggers::Condition;

use super::targeting::{CardFilter, PlayerSelector, TargetSelector};

/// A card statistic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Strength,
    Willpower,
    Lore,
    /// Ink cost; modifications apply to cards in hand.
    Cost,
}

impl Stat {
    pub const ALL: [Stat; 4] = [Stat::Strength, Stat::Willpower, Stat::Lore, Stat::Cost];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Stat::Strength => 0,
            Stat::Willpower => 1,
            Stat::Lore => 2,
            Stat::Cost => 3,
        }
    }
}

/// How long an effect lasts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Duration {
    /// One-shot (damage, draw, zone moves).
    Instant,
    /// "this turn"
    UntilEndOfTurn,
    /// "until the start of your next turn"
    UntilYourNextTurn,
    /// "while ..." / "during your turn"
    WhileCondition(Condition),
    /// For as long as the source is in play (static) or forever (resolved).
    Permanent,
}

/// A numeric magnitude.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Amount {
    Fixed(i64),
    /// `per` for each card matching the filter ("+1 ¤ for each other character you have").
    ForEach { per: i64, filter: CardFilter },
    /// The source card's effective stat ("equal to this character's ¤").
    SourceStat(Stat),
}

impl Amount {
    /// The fixed value, if the amount does not depend on game state.
    #[must_use]
    pub fn fixed(&self) -> Option<i64> {
        match self {
            Amount::Fixed(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<i64> for Amount {
    fn from(n: i64) -> Self {
        Amount::Fixed(n)
    }
}

/// Where a zone move sends its targets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// Banish: from play to discard, emitting `Banished`.
    Discard,
    Hand,
    DeckBottom,
    DeckShuffled,
    Inkwell { exerted: bool },
    /// Put into play. Also used by "enters play with N damage/exerted".
    Play { exerted: bool, damage: u32 },
}

/// A hard prohibition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Restriction {
    CantQuest,
    CantChallenge,
    CantReady,
    CantBeChallenged,
    CantSing,
}

/// What a grant effect attaches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Grant {
    Keyword { keyword: Keyword, value: Option<i64> },
    /// A quoted ability, compiled into its own definition.
    Ability(Box<AbilityDefinition>),
}

impl Grant {
    #[must_use]
    pub fn keyword(keyword: Keyword) -> Self {
        Grant::Keyword { keyword, value: None }
    }

    #[must_use]
    pub fn keyword_with(keyword: Keyword, value: i64) -> Self {
        Grant::Keyword {
            keyword,
            value: Some(value),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChoiceMode {
    /// "Choose one:" - exactly one option resolves.
    One,
    /// "you may" - the single option may be declined.
    May,
}

/// A structured effect node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// "gets +2 ¤ this turn"
    ModifyStat {
        target: TargetSelector,
        stat: Stat,
        amount: Amount,
        duration: Duration,
    },

    /// "Move 1 damage counter from chosen character to chosen opposing character"
    MoveDamage {
        from: TargetSelector,
        to: TargetSelector,
        amount: u32,
        up_to: bool,
    },

    /// "Deal 2 damage to chosen character"
    DealDamage { target: TargetSelector, amount: Amount },

    /// "Remove up to 3 damage from chosen character"
    RemoveDamage {
        target: TargetSelector,
        amount: u32,
        up_to: bool,
    },

    /// "draw 2 cards"
    Draw { player: PlayerSelector, count: Amount },

    /// "each opponent chooses and discards a card"
    Discard {
        player: PlayerSelector,
        count: u32,
        filter: CardFilter,
    },

    /// Banish, return to hand, put on the bottom of a deck, ink, play.
    MoveZone {
        target: TargetSelector,
        to: Destination,
    },

    /// Exert or ready.
    SetExerted { target: TargetSelector, exerted: bool },

    /// Attach a keyword or quoted ability.
    GrantAbility {
        target: TargetSelector,
        grant: Grant,
        duration: Duration,
    },

    /// "can't quest during their next turn"
    Restrict {
        target: TargetSelector,
        restriction: Restriction,
        duration: Duration,
    },

    /// Gain (positive) or lose (negative) lore.
    GainLore { player: PlayerSelector, amount: Amount },

    /// Mutually exclusive or optional effect bundles.
    Choice {
        mode: ChoiceMode,
        options: Vec<Vec<Effect>>,
    },
}

impl Effect {
    /// Wrap effects in an optional "you may" choice.
    #[must_use]
    pub fn may(effects: Vec<Effect>) -> Self {
        Effect::Choice {
            mode: ChoiceMode::May,
            options: vec![effects],
        }
    }

    /// Short kind name, used in logs and reports.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Effect::ModifyStat { .. } => "modify_stat",
            Effect::MoveDamage { .. } => "move_damage",
            Effect::DealDamage { .. } => "deal_damage",
            Effect::RemoveDamage { .. } => "remove_damage",
            Effect::Draw { .. } => "draw",
            Effect::Discard { .. } => "discard",
            Effect::MoveZone { .. } => "move_zone",
            Effect::SetExerted { .. } => "set_exerted",
            Effect::GrantAbility { .. } => "grant_ability",
            Effect::Restrict { .. } => "restrict",
            Effect::GainLore { .. } => "gain_lore",
            Effect::Choice { .. } => "choice",
        }
    }

    /// Primary card selector, if the effect targets cards.
    #[must_use]
    pub fn target(&self) -> Option<&TargetSelector> {
        match self {
            Effect::ModifyStat { target, .. }
            | Effect::DealDamage { target, .. }
            | Effect::RemoveDamage { target, .. }
            | Effect::MoveZone { target, .. }
            | Effect::SetExerted { target, .. }
            | Effect::GrantAbility { target, .. }
            | Effect::Restrict { target, .. } => Some(target),
            Effect::MoveDamage { to, .. } => Some(to),
            Effect::Draw { .. }
            | Effect::Discard { .. }
            | Effect::GainLore { .. }
            | Effect::Choice { .. } => None,
        }
    }

    /// Quoted abilities granted by this effect (searching choice options).
    #[must_use]
    pub fn granted_abilities(&self) -> Vec<&AbilityDefinition> {
        match self {
            Effect::GrantAbility {
                grant: Grant::Ability(ability),
                ..
            } => vec![ability.as_ref()],
            Effect::Choice { options, .. } => options
                .iter()
                .flatten()
                .flat_map(Effect::granted_abilities)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether a static ability with this effect contributes a continuous
    /// layer (as opposed to a play-time replacement like "enters play
    /// exerted").
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Effect::ModifyStat { .. } | Effect::GrantAbility { .. } | Effect::Restrict { .. }
        )
    }
}
