//! Cost tokens for activated abilities and Shift.
//!
//! All tokens of one ability are paid together or not at all; the engine
//! checks every token before paying any of them.

use serde::{Deserialize, Serialize};

use crate::effects::CardFilter;

/// One component of an ability's cost.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CostToken {
    /// Exert this card (⟳).
    ExertSelf,
    /// Pay ink (exert ready inkwell cards).
    Ink(u32),
    /// Banish this card.
    BanishSelf,
    /// Banish another card you control that matches the filter.
    BanishOther(CardFilter),
    /// Discard cards from hand that match the filter.
    Discard { count: u32, filter: CardFilter },
}

impl CostToken {
    /// Whether the token chooses a card, making it available to the
    /// effect as "the paid card".
    #[must_use]
    pub fn selects_card(&self) -> bool {
        matches!(self, CostToken::BanishOther(_) | CostToken::Discard { .. })
    }
}

impl std::fmt::Display for CostToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CostToken::ExertSelf => f.write_str("exert"),
            CostToken::Ink(n) => write!(f, "{n} ink"),
            CostToken::BanishSelf => f.write_str("banish this"),
            CostToken::BanishOther(_) => f.write_str("banish another"),
            CostToken::Discard { count, .. } => write!(f, "discard {count}"),
        }
    }
}
