//! Keyword recognizer and keyword ability builder.
//!
//! Recognition looks only at the text before the reminder parenthesis:
//! "Shift 4 (...)", "Singer 5 (...)", "Evasive, Ward", "Shift: Discard a
//! song card (...)". Anything the table does not accept falls through to
//! the generic static-text path.

use smallvec::{smallvec, SmallVec};

use crate::abilities::{
    AbilityCategory, AbilityDefinition, AbilityId, AbilityOrigin, CostToken, Keyword, KeywordAbility,
    KeywordGrammar, KeywordValue,
};
use crate::effects::{Amount, CardFilter, Duration, Effect, Grant, Stat, TargetSelector};
use crate::triggers::{EventKind, TriggerDescriptor};

use super::error::CompileError;
use super::extract;
use super::text::lower;

/// Recognize a keyword unit. Returns one entry per listed keyword.
#[must_use]
pub fn recognize(unit: &str) -> Option<Vec<KeywordAbility>> {
    let head = unit.split('(').next().unwrap_or(unit).trim().trim_end_matches('.');
    if head.is_empty() {
        return None;
    }

    if let Some(text) = strip_keyword(head, Keyword::Shift).and_then(|rest| rest.strip_prefix(':')) {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        return Some(vec![KeywordAbility {
            keyword: Keyword::Shift,
            value: Some(KeywordValue::Text(text.to_string())),
        }]);
    }

    head.split(',').map(|part| recognize_one(part.trim())).collect()
}

fn recognize_one(part: &str) -> Option<KeywordAbility> {
    let keyword = Keyword::PRINTED
        .iter()
        .copied()
        .find(|k| strip_keyword(part, *k).is_some())?;
    let rest = strip_keyword(part, keyword)?.trim();

    match keyword.grammar() {
        KeywordGrammar::Bare => rest.is_empty().then(|| KeywordAbility::bare(keyword)),
        KeywordGrammar::Number => parse_value(rest).map(|n| KeywordAbility::numeric(keyword, n)),
        KeywordGrammar::Bonus => parse_value(rest.strip_prefix('+').unwrap_or(rest))
            .map(|n| KeywordAbility::numeric(keyword, n)),
        KeywordGrammar::NumberOrText => {
            let number = rest.strip_suffix("{I}").unwrap_or(rest).trim();
            parse_value(number).map(|n| KeywordAbility::numeric(keyword, n))
        }
    }
}

fn parse_value(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// Strip a keyword name from the start of `text`, case-insensitively,
/// when it ends at a word boundary.
fn strip_keyword(text: &str, keyword: Keyword) -> Option<&str> {
    let name = keyword.name();
    let head = text.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let rest = &text[name.len()..];
    match rest.chars().next() {
        None | Some(' ' | ':') => Some(rest),
        _ => None,
    }
}

/// Build the ability for one recognized keyword.
pub fn build(
    id: AbilityId,
    keyword: KeywordAbility,
    text: &str,
) -> Result<AbilityDefinition, CompileError> {
    let value = keyword.value.as_ref().and_then(KeywordValue::as_number);

    let ability = match keyword.keyword {
        Keyword::Support => {
            AbilityDefinition::new(id, AbilityCategory::Triggered, AbilityOrigin::Keyword, text)
                .with_trigger(TriggerDescriptor::this(EventKind::CharacterQuested))
                .with_effect(Effect::may(vec![Effect::ModifyStat {
                    target: TargetSelector::chosen(CardFilter::characters().yours().other()),
                    stat: Stat::Strength,
                    amount: Amount::SourceStat(Stat::Strength),
                    duration: Duration::UntilEndOfTurn,
                }]))
        }
        other => {
            let mut ability = AbilityDefinition::new(id, AbilityCategory::Static, AbilityOrigin::Keyword, text)
                .with_effect(Effect::GrantAbility {
                    target: TargetSelector::this(),
                    grant: Grant::Keyword { keyword: other, value },
                    duration: Duration::Permanent,
                });
            if other == Keyword::Shift {
                ability.costs = shift_costs(&keyword, text)?;
            }
            ability
        }
    };
    Ok(ability.with_keyword(keyword))
}

fn shift_costs(keyword: &KeywordAbility, text: &str) -> Result<SmallVec<[CostToken; 2]>, CompileError> {
    match &keyword.value {
        Some(KeywordValue::Number(n)) => {
            let ink = u32::try_from(*n).map_err(|_| CompileError::InvalidPattern {
                name: "shift".to_string(),
                message: format!("negative shift cost {n}"),
            })?;
            Ok(smallvec![CostToken::Ink(ink)])
        }
        Some(KeywordValue::Text(cost)) => {
            extract::parse_costs(&lower(cost)).ok_or_else(|| CompileError::InvalidPattern {
                name: "shift".to_string(),
                message: format!("unrecognized shift cost in {text:?}"),
            })
        }
        None => Err(CompileError::MissingCost { text: text.to_string() }),
    }
}

/// Song reminder: "(A character with cost N or more can {E} to sing this
/// song for free.)" yields the minimum singer cost.
#[must_use]
pub fn singable_cost(reminder: &str) -> Option<i64> {
    let inner = lower(reminder);
    let inner = inner.trim().trim_start_matches('(').trim_end_matches(')');
    let rest = inner.strip_prefix("a character with cost ")?;
    let (number, rest) = rest.split_once(' ')?;
    let rest = rest.strip_prefix("or more ")?;
    let rest = rest.strip_prefix("can ").or_else(|| rest.strip_prefix("may "))?;
    let rest = rest.strip_prefix("{e} to ").unwrap_or(rest);
    rest.starts_with("sing this").then_some(())?;
    number.parse().ok()
}

/// Build the static marker ability for a song reminder.
#[must_use]
pub fn build_singable(id: AbilityId, cost: i64, text: &str) -> AbilityDefinition {
    AbilityDefinition::new(id, AbilityCategory::Static, AbilityOrigin::Reminder, text).with_effect(
        Effect::GrantAbility {
            target: TargetSelector::this(),
            grant: Grant::keyword_with(Keyword::Singable, cost),
            duration: Duration::Permanent,
        },
    )
}
