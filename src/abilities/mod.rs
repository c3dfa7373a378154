//! Ability data model.
//!
//! An `AbilityDefinition` is one compiled ability of a card: its category,
//! optional trigger, guard condition, costs and the ordered effect list.
//! Abilities are plain data; the compiler builds them and the resolution
//! engine interprets them.

pub mod cost;
pub mod definition;
pub mod keyword;

pub use cost::CostToken;
pub use definition::{AbilityCategory, AbilityDefinition, AbilityId, AbilityOrigin};
pub use keyword::{Keyword, KeywordAbility, KeywordGrammar, KeywordValue};
