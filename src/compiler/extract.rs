//! Trigger, condition and cost extraction.
//!
//! Trigger phrases are an ordered table of regexes, each paired with a
//! builder for the `TriggerDescriptor`. Costs and conditions are short
//! enough to parse with prefix matching.

use regex_lite::{Captures, Regex};
use smallvec::{smallvec, SmallVec};

use crate::abilities::CostToken;
use crate::core::Zone;
use crate::effects::{CardFilter, Comparison, Relation};
use crate::triggers::{Condition, EventKind, SubjectRole, TriggerDescriptor};

use super::error::CompileError;
use super::target::parse_filter;
use super::text::parse_count;

/// Parse a comma-separated cost list ("{e}, banish one of your other
/// characters"). All tokens must parse.
#[must_use]
pub fn parse_costs(text: &str) -> Option<SmallVec<[CostToken; 2]>> {
    let mut costs = SmallVec::new();
    for part in text.split(',') {
        let part = part.trim().trim_start_matches("and ").trim();
        if part.is_empty() {
            return None;
        }
        costs.push(parse_cost(part)?);
    }
    (!costs.is_empty()).then_some(costs)
}

fn parse_cost(part: &str) -> Option<CostToken> {
    if part == "{e}" {
        return Some(CostToken::ExertSelf);
    }
    if let Some(n) = part.strip_suffix(" {i}") {
        return u32::try_from(parse_count(n)?).ok().map(CostToken::Ink);
    }
    if let Some(rest) = part.strip_prefix("banish ") {
        if matches!(rest, "this character" | "this item" | "this location") {
            return Some(CostToken::BanishSelf);
        }
        let rest = rest.strip_prefix("one of ").unwrap_or(rest);
        let filter = parse_filter(rest)?;
        return Some(CostToken::BanishOther(filter.yours()));
    }
    let discard = part
        .strip_prefix("choose and discard ")
        .or_else(|| part.strip_prefix("discard "))?;
    let (count, rest) = discard.split_once(' ')?;
    let count = u32::try_from(parse_count(count)?).ok()?;
    let filter = parse_filter(rest)?.in_zone(Zone::Hand).yours();
    Some(CostToken::Discard { count, filter })
}

/// A trigger clause split from its body.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerClause<'t> {
    /// One descriptor per event; "when you play this character and
    /// whenever he quests" has two.
    pub descriptors: SmallVec<[TriggerDescriptor; 2]>,
    pub condition: Option<Condition>,
    pub once_per_turn: bool,
    /// Text after the trigger phrase.
    pub rest: &'t str,
}

type TriggerBuilder = fn(&Captures) -> Option<TriggerDescriptor>;

struct TriggerPattern {
    name: &'static str,
    regex: Regex,
    build: TriggerBuilder,
}

/// Ordered trigger-phrase table.
pub struct TriggerTable {
    patterns: Vec<TriggerPattern>,
}

fn group<'c>(caps: &'c Captures, name: &str) -> Option<&'c str> {
    caps.name(name).map(|m| m.as_str())
}

fn row(
    name: &'static str,
    source: impl Into<String>,
    build: TriggerBuilder,
) -> (&'static str, String, TriggerBuilder) {
    (name, source.into(), build)
}

const SUBJECT: &str = r"(?:this character|this item|this location|this card)";

fn trigger_rows() -> Vec<(&'static str, String, TriggerBuilder)> {
    vec![
        row(
            "played_self",
            format!(r"^when(?:ever)? you play {SUBJECT}"),
            |_| Some(TriggerDescriptor::this(EventKind::CardPlayed)),
        ),
        row(
            "quests_self",
            format!(r"^when(?:ever)? {SUBJECT} quests"),
            |_| Some(TriggerDescriptor::this(EventKind::CharacterQuested)),
        ),
        row(
            "banishes_in_challenge",
            format!(r"^when(?:ever)? {SUBJECT} banishes another character in a challenge"),
            |_| {
                Some(
                    TriggerDescriptor::this(EventKind::Banished)
                        .with_role(SubjectRole::Source)
                        .in_challenge(),
                )
            },
        ),
        row(
            "challenges_self",
            format!(r"^when(?:ever)? {SUBJECT} challenges(?: another character| a character)?"),
            |_| Some(TriggerDescriptor::this(EventKind::ChallengeDeclared)),
        ),
        row(
            "challenged_self",
            format!(r"^when(?:ever)? {SUBJECT} is challenged"),
            |_| Some(TriggerDescriptor::this(EventKind::ChallengeDeclared).with_role(SubjectRole::Target)),
        ),
        row(
            "banished_self",
            format!(r"^when(?:ever)? {SUBJECT} is banished(?P<challenge> in a challenge)?"),
            |caps| {
                let descriptor = TriggerDescriptor::this(EventKind::Banished);
                Some(if caps.name("challenge").is_some() {
                    descriptor.in_challenge()
                } else {
                    descriptor
                })
            },
        ),
        row(
            "dealt_damage_self",
            format!(r"^when(?:ever)? {SUBJECT} is dealt damage"),
            |_| Some(TriggerDescriptor::this(EventKind::DamageDealt)),
        ),
        row(
            "sings_self",
            format!(r"^when(?:ever)? {SUBJECT} sings a song"),
            |_| Some(TriggerDescriptor::this(EventKind::SongSung)),
        ),
        row(
            "exerted_self",
            format!(r"^when(?:ever)? {SUBJECT} (?:is exerted|exerts)"),
            |_| Some(TriggerDescriptor::this(EventKind::Exerted)),
        ),
        row(
            "you_play_song",
            r"^when(?:ever)? you play a song",
            |_| {
                Some(TriggerDescriptor::matching(
                    EventKind::CardPlayed,
                    CardFilter::any().anywhere().yours().classified("song"),
                ))
            },
        ),
        row(
            "player_plays",
            r"^when(?:ever)? (?P<who>you play|an opponent plays) (?P<what>.+?)$",
            |caps| {
                let filter = parse_filter(group(caps, "what")?)?.anywhere();
                let filter = if group(caps, "who")? == "you play" {
                    filter.yours()
                } else {
                    filter.opposing()
                };
                Some(TriggerDescriptor::matching(EventKind::CardPlayed, filter))
            },
        ),
        row(
            "group_quests",
            r"^when(?:ever)? (?:one of )?(?P<what>your .+?|an opposing .+?|another .+?) quests",
            |caps| {
                let filter = parse_filter(group(caps, "what")?)?;
                Some(TriggerDescriptor::matching(EventKind::CharacterQuested, filter))
            },
        ),
        row(
            "group_challenged",
            r"^when(?:ever)? (?:one of )?(?P<what>your .+?|an opposing .+?|another .+?) is challenged",
            |caps| {
                let filter = parse_filter(group(caps, "what")?)?;
                Some(
                    TriggerDescriptor::matching(EventKind::ChallengeDeclared, filter)
                        .with_role(SubjectRole::Target),
                )
            },
        ),
        row(
            "group_banished",
            r"^when(?:ever)? (?:one of )?(?P<what>your .+?|an opposing .+?|another .+?|a character) is banished(?P<challenge> in a challenge)?",
            |caps| {
                let filter = parse_filter(group(caps, "what")?)?.anywhere();
                let descriptor = TriggerDescriptor::matching(EventKind::Banished, filter);
                Some(if caps.name("challenge").is_some() {
                    descriptor.in_challenge()
                } else {
                    descriptor
                })
            },
        ),
        row(
            "player_draws",
            r"^when(?:ever)? (?P<who>you draw|an opponent draws) (?:a card|cards)",
            |caps| {
                let relation = if group(caps, "who")? == "you draw" {
                    Relation::You
                } else {
                    Relation::Opponent
                };
                Some(TriggerDescriptor::player(EventKind::CardDrawn, relation))
            },
        ),
        row(
            "player_inks",
            r"^when(?:ever)? you (?:ink a card|put a card into your inkwell)",
            |_| Some(TriggerDescriptor::player(EventKind::CardInked, Relation::You)),
        ),
        row(
            "turn_boundary",
            r"^at the (?P<edge>start|end) of (?P<whose>your|each opponent's|an opponent's|each) turn",
            |caps| {
                let event = if group(caps, "edge")? == "start" {
                    EventKind::TurnStarted
                } else {
                    EventKind::TurnEnded
                };
                let relation = match group(caps, "whose")? {
                    "your" => Relation::You,
                    "each" => Relation::Any,
                    _ => Relation::Opponent,
                };
                Some(TriggerDescriptor::player(event, relation))
            },
        ),
    ]
}

impl TriggerTable {
    /// Compile the table; a bad row is an error.
    pub fn try_new() -> Result<Self, CompileError> {
        let patterns = trigger_rows()
            .into_iter()
            .map(|(name, source, build)| {
                Regex::new(&source)
                    .map(|regex| TriggerPattern { name, regex, build })
                    .map_err(|e| CompileError::InvalidPattern {
                        name: name.to_string(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Compile the table, skipping rows that fail.
    #[must_use]
    pub fn new() -> Self {
        let mut patterns = Vec::new();
        for (name, source, build) in trigger_rows() {
            match Regex::new(&source) {
                Ok(regex) => patterns.push(TriggerPattern { name, regex, build }),
                Err(error) => tracing::warn!(pattern = name, %error, "skipping trigger pattern"),
            }
        }
        Self { patterns }
    }

    /// Split a triggered clause into its trigger and body.
    ///
    /// Handles the "once during your turn," / "during your turn," prefixes
    /// and an "if ..." guard directly after the trigger.
    #[must_use]
    pub fn parse<'t>(&self, text: &'t str) -> Option<TriggerClause<'t>> {
        let mut once_per_turn = false;
        let mut condition = None;
        let mut rest = text.trim();

        if let Some(r) = rest.strip_prefix("once during your turn, ") {
            once_per_turn = true;
            condition = Some(Condition::YourTurn);
            rest = r;
        } else if let Some((turn, r)) = split_turn_prefix(rest) {
            condition = Some(turn);
            rest = r;
        }

        let (head, body) = rest.split_once(", ")?;
        // The compound split goes first: "you play (.+)" would swallow it.
        let descriptors = match split_compound(head) {
            Some((first, second)) => smallvec![self.match_head(first)?, self.match_head(&second)?],
            None => smallvec![self.match_head(head)?],
        };

        let (guard, body) = match split_guard(body) {
            Some((guard, body)) => (Some(guard), body),
            None => (None, body),
        };
        let condition = match (condition, guard) {
            (Some(a), Some(b)) => Some(a.and(b)),
            (a, b) => a.or(b),
        };

        Some(TriggerClause {
            descriptors,
            condition,
            once_per_turn,
            rest: body,
        })
    }

    fn match_head(&self, head: &str) -> Option<TriggerDescriptor> {
        self.patterns.iter().find_map(|pattern| {
            let caps = pattern.regex.captures(head)?;
            let whole = caps.get(0)?;
            if !head[whole.end()..].trim().is_empty() {
                return None;
            }
            let descriptor = (pattern.build)(&caps)?;
            tracing::trace!(pattern = pattern.name, "trigger matched");
            Some(descriptor)
        })
    }

    /// Whether the text opens with a trigger phrase.
    #[must_use]
    pub fn is_trigger(text: &str) -> bool {
        let text = text.trim_start();
        let text = text
            .strip_prefix("once during your turn, ")
            .or_else(|| split_turn_prefix(text).map(|(_, r)| r))
            .unwrap_or(text);
        text.starts_with("when ") || text.starts_with("whenever ") || text.starts_with("at the start of ") || text.starts_with("at the end of ")
    }
}

impl Default for TriggerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Split "when you play this character and whenever he quests" into two
/// trigger phrases, the second with its pronoun replaced by the card.
fn split_compound(head: &str) -> Option<(&str, String)> {
    let (first, second) = head
        .split_once(" and whenever ")
        .or_else(|| head.split_once(" and when "))?;
    Some((first, format!("whenever {}", as_this_character(second))))
}

fn as_this_character(phrase: &str) -> String {
    for pronoun in ["he ", "she ", "it "] {
        if let Some(rest) = phrase.strip_prefix(pronoun) {
            return format!("this character {rest}");
        }
    }
    if let Some(rest) = phrase.strip_prefix("they're ") {
        return format!("this character is {rest}");
    }
    let Some(rest) = phrase.strip_prefix("they ") else {
        return phrase.to_string();
    };
    // Plural verb to singular: "quest" to "quests", "are" to "is".
    let (verb, tail) = rest.split_once(' ').unwrap_or((rest, ""));
    let verb = if verb == "are" { "is".to_string() } else { format!("{verb}s") };
    format!("this character {verb} {tail}").trim_end().to_string()
}

fn split_turn_prefix(text: &str) -> Option<(Condition, &str)> {
    if let Some(rest) = text.strip_prefix("during your turn, ") {
        return Some((Condition::YourTurn, rest));
    }
    text.strip_prefix("during an opponent's turn, ")
        .or_else(|| text.strip_prefix("during opponents' turns, "))
        .map(|rest| (Condition::OpponentsTurn, rest))
}

/// Split a leading guard ("if ..., ", "while ..., ", "during your turn, ")
/// from the clause body.
#[must_use]
pub fn split_guard(text: &str) -> Option<(Condition, &str)> {
    let text = text.trim_start();
    if let Some(found) = split_turn_prefix(text) {
        return Some(found);
    }
    let rest = text
        .strip_prefix("if ")
        .or_else(|| text.strip_prefix("while "))?;
    let (guard, body) = rest.split_once(", ")?;
    Some((parse_condition(guard)?, body))
}

/// Parse a condition phrase.
#[must_use]
pub fn parse_condition(text: &str) -> Option<Condition> {
    let text = text.trim();
    match text {
        "this character is exerted" | "this item is exerted" => return Some(Condition::SourceExerted),
        "this character is damaged" | "this character has damage" => return Some(Condition::SourceDamaged),
        "it's your turn" | "it is your turn" => return Some(Condition::YourTurn),
        "it's an opponent's turn" | "it isn't your turn" => return Some(Condition::OpponentsTurn),
        "you have no cards in your hand" => {
            return Some(Condition::HandSize {
                comparison: Comparison::AtMost,
                value: 0,
            })
        }
        _ => {}
    }

    if let Some(rest) = text.strip_prefix("this character isn't ") {
        return parse_condition(&format!("this character is {rest}")).map(Condition::negate);
    }

    let rest = text.strip_prefix("you have ")?;
    if let Some(lore) = rest.strip_suffix(" or more lore") {
        return parse_count(lore).map(Condition::LoreAtLeast);
    }
    if let Some(cards) = rest
        .strip_suffix(" or more cards in your hand")
        .or_else(|| rest.strip_suffix(" or more cards in hand"))
    {
        return parse_count(cards).map(|value| Condition::HandSize {
            comparison: Comparison::AtLeast,
            value,
        });
    }
    if let Some(cards) = rest.strip_suffix(" or fewer cards in your hand") {
        return parse_count(cards).map(|value| Condition::HandSize {
            comparison: Comparison::AtMost,
            value,
        });
    }

    let rest = rest.strip_suffix(" in play").unwrap_or(rest);
    if let Some(what) = rest.strip_prefix("no ") {
        let filter = parse_filter(&format!("your {what}"))?;
        return Some(Condition::negate(Condition::ControlsMatching { filter, at_least: 1 }));
    }
    let (count, what) = rest.split_once(' ')?;
    let at_least = u32::try_from(parse_count(count)?).ok()?;
    let what = what.strip_prefix("or more ").unwrap_or(what);
    let filter = parse_filter(&format!("your {what}"))?;
    Some(Condition::ControlsMatching { filter, at_least })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardCategory;
    use crate::triggers::{TriggerQualifier, TriggerSubject};

    fn table() -> TriggerTable {
        TriggerTable::try_new().unwrap()
    }

    #[test]
    fn test_cost_lists() {
        let costs = parse_costs("{e}, banish one of your other characters").unwrap();
        assert_eq!(costs.len(), 2);
        assert_eq!(costs[0], CostToken::ExertSelf);
        assert!(matches!(&costs[1], CostToken::BanishOther(f) if f.exclude_self && f.controller == Relation::You));

        assert_eq!(parse_costs("2 {i}").map(|c| c[0].clone()), Some(CostToken::Ink(2)));
        assert_eq!(parse_costs("banish this item").map(|c| c[0].clone()), Some(CostToken::BanishSelf));
        assert!(matches!(
            parse_costs("discard a song card").as_deref(),
            Some([CostToken::Discard { count: 1, .. }])
        ));
        assert!(parse_costs("sing a song").is_none());
        assert!(parse_costs("{e}, ").is_none());
    }

    #[test]
    fn test_self_triggers() {
        let clause = table().parse("whenever this character quests, you may draw a card.").unwrap();
        assert_eq!(clause.descriptors[0], TriggerDescriptor::this(EventKind::CharacterQuested));
        assert_eq!(clause.rest, "you may draw a card.");
        assert!(clause.condition.is_none());

        let clause = table().parse("when this character is banished in a challenge, gain 2 lore.").unwrap();
        assert_eq!(clause.descriptors[0].qualifier, Some(TriggerQualifier::InChallenge));
        assert!(clause.descriptors[0].is_self_banish());

        let clause = table().parse("when you play this character, draw a card.").unwrap();
        assert_eq!(clause.descriptors[0].event, EventKind::CardPlayed);
    }

    #[test]
    fn test_group_triggers_and_guards() {
        let clause = table()
            .parse("once during your turn, whenever one of your other characters is banished, if you have 3 or more cards in your hand, gain 1 lore.")
            .unwrap();
        assert!(clause.once_per_turn);
        assert_eq!(clause.descriptors[0].event, EventKind::Banished);
        let TriggerSubject::Matching(filter) = &clause.descriptors[0].subject else {
            panic!("expected a filter subject");
        };
        assert_eq!(filter.zone, None);
        assert!(filter.exclude_self);
        assert!(matches!(clause.condition, Some(Condition::All(ref c)) if c.len() == 2));
        assert_eq!(clause.rest, "gain 1 lore.");

        let clause = table().parse("at the start of your turn, draw a card.").unwrap();
        assert_eq!(clause.descriptors[0], TriggerDescriptor::player(EventKind::TurnStarted, Relation::You));

        let clause = table().parse("whenever you play an item, gain 1 lore.").unwrap();
        let TriggerSubject::Matching(filter) = &clause.descriptors[0].subject else {
            panic!("expected a filter subject");
        };
        assert_eq!(filter.categories.as_slice(), &[CardCategory::Item]);

        assert!(table().parse("whenever the moon rises, draw a card.").is_none());
    }

    #[test]
    fn test_compound_trigger() {
        let clause = table()
            .parse("when you play this character and whenever he quests, draw a card.")
            .unwrap();
        assert_eq!(
            clause.descriptors.as_slice(),
            &[
                TriggerDescriptor::this(EventKind::CardPlayed),
                TriggerDescriptor::this(EventKind::CharacterQuested),
            ]
        );
        assert_eq!(clause.rest, "draw a card.");

        let clause = table()
            .parse("when you play this character and whenever they're challenged, gain 1 lore.")
            .unwrap();
        assert_eq!(clause.descriptors[1].event, EventKind::ChallengeDeclared);
        assert_eq!(clause.descriptors[1].role, SubjectRole::Target);

        let clause = table()
            .parse("when you play this character and whenever she challenges another character, draw a card.")
            .unwrap();
        assert_eq!(clause.descriptors[1], TriggerDescriptor::this(EventKind::ChallengeDeclared));

        assert!(table().parse("when you play this character and whenever it rains, draw a card.").is_none());
    }

    #[test]
    fn test_is_trigger() {
        assert!(TriggerTable::is_trigger("whenever this character quests, draw a card."));
        assert!(TriggerTable::is_trigger("during your turn, whenever a card is put into your inkwell, gain 1 lore."));
        assert!(!TriggerTable::is_trigger("your other characters get +1 {s}."));
    }

    #[test]
    fn test_conditions() {
        assert_eq!(parse_condition("this character is exerted"), Some(Condition::SourceExerted));
        assert_eq!(
            parse_condition("you have 2 or more other characters in play"),
            Some(Condition::ControlsMatching {
                filter: CardFilter::characters().yours().other(),
                at_least: 2,
            })
        );
        assert_eq!(
            parse_condition("you have a character named elsa in play"),
            Some(Condition::ControlsMatching {
                filter: CardFilter::characters().yours().named("elsa"),
                at_least: 1,
            })
        );
        assert_eq!(parse_condition("you have 10 or more lore"), Some(Condition::LoreAtLeast(10)));
        assert!(matches!(parse_condition("you have no other characters in play"), Some(Condition::Not(_))));
        assert!(parse_condition("the stars align").is_none());

        let (guard, body) = split_guard("while this character is exerted, it gets +2 {w}.").unwrap();
        assert_eq!(guard, Condition::SourceExerted);
        assert_eq!(body, "it gets +2 {w}.");
    }
}
