//! Clause classifier.
//!
//! Cost-and-dash prefix wins over trigger phrases: "{E} - When ..." is
//! still activated.

use smallvec::SmallVec;

use crate::abilities::{AbilityCategory, CostToken};

use super::extract::{parse_costs, TriggerTable};

/// A classified clause (lowercased text).
#[derive(Clone, Debug, PartialEq)]
pub enum Clause<'t> {
    Activated {
        costs: SmallVec<[CostToken; 2]>,
        body: &'t str,
    },
    Triggered(&'t str),
    Static(&'t str),
}

impl Clause<'_> {
    #[must_use]
    pub fn category(&self) -> AbilityCategory {
        match self {
            Clause::Activated { .. } => AbilityCategory::Activated,
            Clause::Triggered(_) => AbilityCategory::Triggered,
            Clause::Static(_) => AbilityCategory::Static,
        }
    }
}

#[must_use]
pub fn classify(text: &str) -> Clause<'_> {
    let text = text.trim();
    if let Some((head, body)) = text.split_once(" - ") {
        if let Some(costs) = parse_costs(head) {
            return Clause::Activated {
                costs,
                body: body.trim(),
            };
        }
    }
    if TriggerTable::is_trigger(text) {
        Clause::Triggered(text)
    } else {
        Clause::Static(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(classify("{e} - draw a card.").category(), AbilityCategory::Activated);
        assert_eq!(
            classify("whenever this character quests, draw a card.").category(),
            AbilityCategory::Triggered
        );
        assert_eq!(classify("your other characters get +1 {s}.").category(), AbilityCategory::Static);
    }

    #[test]
    fn test_cost_prefix_wins() {
        let clause = classify("{e}, 2 {i} - when you next play a character this turn, draw a card.");
        let Clause::Activated { costs, body } = clause else {
            panic!("expected an activated clause");
        };
        assert_eq!(costs.len(), 2);
        assert!(body.starts_with("when you next"));
    }

    #[test]
    fn test_dash_without_costs_is_not_activated() {
        let clause = classify("choose one - draw a card or gain 1 lore.");
        assert_eq!(clause.category(), AbilityCategory::Static);
    }
}
