//! Noun phrases: card filters and target selectors.
//!
//! Input is lowercased, normalized text such as "your other hero
//! characters", "chosen opposing character with 3 {s} or more" or "up to
//! 2 chosen damaged characters".

use crate::abilities::Keyword;
use crate::cards::CardCategory;
use crate::core::Zone;
use crate::effects::{CardFilter, Comparison, Stat, TargetScope, TargetSelector};

use super::text::parse_count;

/// What a pronoun or "that character" refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Antecedent {
    /// An earlier effect of the same ability selected cards.
    pub has_previous: bool,
    /// The ability is triggered, so an event subject exists.
    pub has_event: bool,
}

impl Antecedent {
    fn pronoun(self) -> TargetSelector {
        if self.has_previous {
            TargetSelector::previous()
        } else {
            TargetSelector::this()
        }
    }

    fn demonstrative(self) -> TargetSelector {
        if self.has_previous || !self.has_event {
            self.pronoun()
        } else {
            TargetSelector::event_subject()
        }
    }
}

const PRONOUNS: [&str; 9] = ["it", "they", "them", "he", "she", "him", "her", "itself", "themselves"];

/// Parse a target phrase.
#[must_use]
pub fn parse_target(phrase: &str, antecedent: Antecedent) -> Option<TargetSelector> {
    let phrase = phrase.trim().trim_end_matches('.').trim();

    if PRONOUNS.contains(&phrase) {
        return Some(antecedent.pronoun());
    }
    if let Some(noun) = phrase.strip_prefix("this ") {
        return is_noun(noun).then(TargetSelector::this);
    }
    if let Some(noun) = phrase.strip_prefix("that ") {
        return is_noun(noun).then(|| antecedent.demonstrative());
    }
    match phrase {
        "the challenging character" => return Some(TargetSelector::event_source()),
        "the challenged character" | "the banished character" => {
            return Some(TargetSelector::event_subject())
        }
        _ => {}
    }

    if let Some(rest) = phrase.strip_prefix("another chosen ") {
        return parse_filter(rest).map(|f| TargetSelector::chosen(f.other()));
    }
    if let Some(rest) = phrase.strip_prefix("chosen ") {
        return parse_filter(rest).map(TargetSelector::chosen);
    }
    if let Some(rest) = phrase.strip_prefix("up to ") {
        let (count, rest) = rest.split_once(' ')?;
        let count = u32::try_from(parse_count(count)?).ok()?;
        let rest = rest.strip_prefix("chosen ").unwrap_or(rest);
        return parse_filter(rest).map(|f| TargetSelector::chosen_up_to(f, count));
    }
    if let Some(rest) = phrase.strip_prefix("one of your ") {
        return parse_filter(&format!("your {rest}")).map(TargetSelector::chosen);
    }
    if let Some(rest) = phrase.strip_prefix("each of your ") {
        return parse_filter(&format!("your {rest}")).map(TargetSelector::all);
    }
    if let Some(rest) = phrase
        .strip_prefix("each opposing ")
        .or_else(|| phrase.strip_prefix("all opposing "))
        .or_else(|| phrase.strip_prefix("each opponent's "))
    {
        return parse_filter(rest).map(TargetSelector::each_opposing);
    }
    if let Some(rest) = phrase.strip_prefix("all ").or_else(|| phrase.strip_prefix("each ")) {
        return parse_filter(rest).map(TargetSelector::all);
    }
    if phrase.starts_with("your ") {
        return parse_filter(phrase).map(TargetSelector::all);
    }

    let (count, rest) = phrase.split_once(' ')?;
    let count = u32::try_from(parse_count(count)?).ok()?;
    let rest = rest.strip_prefix("chosen ").unwrap_or(rest);
    parse_filter(rest).map(|f| TargetSelector::new(TargetScope::Chosen { count, up_to: false }, f))
}

fn is_noun(word: &str) -> bool {
    matches!(word, "character" | "item" | "location" | "card" | "song" | "action")
}

/// Parse a filter phrase: qualifiers, a noun, then suffixes.
#[must_use]
pub fn parse_filter(phrase: &str) -> Option<CardFilter> {
    let (head, mut filter) = parse_suffixes(phrase.trim())?;

    let mut words: Vec<&str> = head.split_whitespace().collect();
    let noun = words.pop()?;
    apply_noun(&mut filter, noun)?;
    if matches!(noun, "card" | "cards") {
        if let Some(&kind) = words.last() {
            if kind != "card" && apply_noun(&mut filter, kind).is_some() {
                words.pop();
            }
        }
    }
    if words.len() >= 2 && words[words.len() - 1] == "or" {
        let other = words[words.len() - 2];
        apply_noun(&mut filter, other)?;
        words.truncate(words.len() - 2);
    }

    let mut classification = Vec::new();
    for word in words {
        match word {
            "a" | "an" | "the" => {}
            "your" => filter = filter.yours(),
            "opposing" | "opponent's" | "opponents'" => filter = filter.opposing(),
            "other" | "another" => filter = filter.other(),
            "damaged" => filter = filter.damaged(),
            "undamaged" => filter.damaged = Some(false),
            "exerted" => filter = filter.exerted(true),
            "ready" => filter = filter.exerted(false),
            other => classification.push(other),
        }
    }
    if !classification.is_empty() {
        filter = filter.classified(classification.join(" "));
    }
    Some(filter)
}

fn apply_noun(filter: &mut CardFilter, noun: &str) -> Option<()> {
    let singular = noun.strip_suffix('s').unwrap_or(noun);
    match singular {
        "character" => filter.categories.push(CardCategory::Character),
        "item" => filter.categories.push(CardCategory::Item),
        "location" => filter.categories.push(CardCategory::Location),
        "action" => filter.categories.push(CardCategory::Action),
        "song" => {
            filter.categories.push(CardCategory::Action);
            filter.classification = Some("song".to_string());
        }
        "card" => {}
        _ => return None,
    }
    Some(())
}

/// Peel trailing qualifiers ("named X", "with 2 {s} or more", "in your
/// hand") off a filter phrase.
fn parse_suffixes(phrase: &str) -> Option<(&str, CardFilter)> {
    let mut filter = CardFilter::any();
    let mut head = phrase;

    if let Some((rest, name)) = head.split_once(" named ") {
        filter.name = Some(name.trim().to_string());
        head = rest;
    }

    for (suffix, zone, yours) in [
        (" in your hand", Zone::Hand, true),
        (" from your hand", Zone::Hand, true),
        (" in your discard", Zone::Discard, true),
        (" from your discard", Zone::Discard, true),
        (" in play", Zone::Play, false),
        (" of yours", Zone::Play, true),
    ] {
        if let Some(rest) = head.strip_suffix(suffix) {
            filter.zone = Some(zone);
            if yours {
                filter = filter.yours();
            }
            head = rest;
        }
    }

    if let Some(rest) = head.strip_suffix(" with the same name as the banished character") {
        filter = filter.same_name_as_paid();
        head = rest;
    }
    if let Some(rest) = head.strip_suffix(" with damage") {
        filter = filter.damaged();
        head = rest;
    }

    if let Some((rest, with)) = head.split_once(" with ") {
        apply_with(&mut filter, with)?;
        head = rest;
    }
    Some((head, filter))
}

/// "cost 2 or less", "3 {s} or more", "evasive"
fn apply_with(filter: &mut CardFilter, with: &str) -> Option<()> {
    if let Some(keyword) = Keyword::from_name(with) {
        filter.keyword = Some(keyword);
        return Some(());
    }

    let (measure, comparison) = if let Some(m) = with.strip_suffix(" or less") {
        (m, Comparison::AtMost)
    } else if let Some(m) = with.strip_suffix(" or more") {
        (m, Comparison::AtLeast)
    } else {
        (with, Comparison::Equal)
    };

    let (stat, value) = if let Some(value) = measure.strip_prefix("cost ") {
        (Stat::Cost, value)
    } else {
        let (value, symbol) = measure.split_once(' ')?;
        (stat_symbol(symbol)?, value)
    };
    let value = parse_count(value)?;
    *filter = std::mem::take(filter).with_stat(stat, comparison, value);
    Some(())
}

/// `{s}`, `{w}`, `{l}` to a stat.
#[must_use]
pub fn stat_symbol(symbol: &str) -> Option<Stat> {
    match symbol.trim() {
        "{s}" | "strength" => Some(Stat::Strength),
        "{w}" | "willpower" => Some(Stat::Willpower),
        "{l}" | "lore" => Some(Stat::Lore),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Relation;

    fn target(phrase: &str) -> TargetSelector {
        parse_target(phrase, Antecedent::default()).unwrap()
    }

    #[test]
    fn test_chosen_filters() {
        let selector = target("chosen opposing character with 3 {s} or more");
        assert_eq!(selector.scope, TargetScope::Chosen { count: 1, up_to: false });
        assert_eq!(selector.filter.controller, Relation::Opponent);
        assert_eq!(selector.filter.categories.as_slice(), &[CardCategory::Character]);
        assert_eq!(
            selector.filter.stat.map(|s| (s.stat, s.comparison, s.value)),
            Some((Stat::Strength, Comparison::AtLeast, 3))
        );

        let selector = target("up to 2 chosen damaged characters");
        assert_eq!(selector.scope, TargetScope::Chosen { count: 2, up_to: true });
        assert_eq!(selector.filter.damaged, Some(true));
    }

    #[test]
    fn test_group_filters() {
        let selector = target("your other hero characters");
        assert_eq!(selector.scope, TargetScope::All);
        assert!(selector.filter.exclude_self);
        assert_eq!(selector.filter.classification.as_deref(), Some("hero"));

        let selector = target("each opposing character");
        assert_eq!(selector.scope, TargetScope::EachOpponents);

        let selector = target("chosen character or location");
        assert_eq!(selector.filter.categories.len(), 2);
    }

    #[test]
    fn test_pronouns_and_references() {
        assert_eq!(target("it").scope, TargetScope::This);
        let after = Antecedent {
            has_previous: true,
            has_event: false,
        };
        assert_eq!(parse_target("them", after).map(|t| t.scope), Some(TargetScope::Previous));

        let triggered = Antecedent {
            has_previous: false,
            has_event: true,
        };
        assert_eq!(
            parse_target("that character", triggered).map(|t| t.scope),
            Some(TargetScope::EventSubject)
        );
        assert_eq!(target("this item").scope, TargetScope::This);
        assert_eq!(target("the challenging character").scope, TargetScope::EventSource);
    }

    #[test]
    fn test_zones_and_names() {
        let filter = parse_filter("a character card from your discard").unwrap();
        assert_eq!(filter.zone, Some(Zone::Discard));
        assert_eq!(filter.controller, Relation::You);

        let filter = parse_filter("a character with the same name as the banished character").unwrap();
        assert!(filter.same_name_as_paid);

        let filter = parse_filter("character named stitch").unwrap();
        assert_eq!(filter.name.as_deref(), Some("stitch"));

        let filter = parse_filter("song card").unwrap();
        assert_eq!(filter.classification.as_deref(), Some("song"));

        assert!(parse_filter("chosen wizard").is_none());
        assert_eq!(parse_filter("character with cost 2 or less").and_then(|f| f.stat).map(|s| s.stat), Some(Stat::Cost));
    }
}
