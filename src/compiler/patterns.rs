//! Effect pattern library.
//!
//! An ordered table of independent matchers. Each row owns an anchored
//! regex and a builder that turns the captures into effects. A clause is
//! split into sentences (and "Choose one:" bullets); each sentence is
//! matched from the front, the matched span consumed, connectors ("and",
//! "then", commas) skipped, and matching repeats until the sentence is
//! exhausted or no row fires.
//!
//! New phrasings are added by appending rows to `effect_rows`.

use regex_lite::{Captures, Regex};

use crate::abilities::{AbilityDefinition, Keyword};
use crate::core::Zone;
use crate::effects::{
    Amount, CardFilter, ChoiceMode, Destination, Duration, Effect, Grant, PlayerSelector, Restriction, Stat,
    TargetScope, TargetSelector,
};

use super::error::CompileError;
use super::target::{parse_filter, parse_target, stat_symbol, Antecedent};
use super::text::parse_count;

/// Compiles a quoted ability into a nested definition.
pub(crate) type NestedCompiler<'a> = dyn FnMut(&str) -> Result<AbilityDefinition, CompileError> + 'a;

/// State shared by the rows while one clause is matched.
pub(crate) struct PhraseContext<'a, 'n> {
    pub antecedent: Antecedent,
    /// Static abilities default to permanent durations.
    pub is_static: bool,
    /// Normalized text with original casing, byte-aligned with the
    /// lowercased clause.
    original: &'a str,
    /// Offset of the slice being matched inside `original`; `None` when the
    /// slice was rewritten and no longer lines up.
    offset: Option<usize>,
    /// Subject of the last matched effect, reused by "... and gain Ward".
    subject: Option<String>,
    /// Sentence tails no row matched.
    pub unmatched: Vec<String>,
    nested: &'n mut NestedCompiler<'a>,
}

impl<'a, 'n> PhraseContext<'a, 'n> {
    pub(crate) fn new(original: &'a str, is_static: bool, has_event: bool, nested: &'n mut NestedCompiler<'a>) -> Self {
        Self {
            antecedent: Antecedent {
                has_previous: false,
                has_event,
            },
            is_static,
            original,
            offset: Some(0),
            subject: None,
            unmatched: Vec::new(),
            nested,
        }
    }

    /// Parse a target phrase and remember it as the running subject.
    fn target(&mut self, phrase: &str) -> Option<TargetSelector> {
        let selector = parse_target(phrase, self.antecedent)?;
        let reuse = match selector.scope {
            TargetScope::Chosen { .. } | TargetScope::EventSubject | TargetScope::EventSource => "them".to_string(),
            _ => phrase.trim().to_string(),
        };
        self.subject = Some(reuse);
        Some(selector)
    }

    /// Text of a capture with its original casing, when available.
    fn original_text(&self, caps: &Captures, name: &str) -> Option<String> {
        let m = caps.name(name)?;
        let text = self
            .offset
            .and_then(|offset| self.original.get(offset + m.start()..offset + m.end()));
        Some(text.unwrap_or(m.as_str()).to_string())
    }
}

fn duration(caps: &Captures) -> Duration {
    match group(caps, "dur").map(str::trim) {
        None | Some("") => Duration::Permanent,
        Some("this turn" | "for the rest of this turn" | "until the end of the turn" | "until the end of this turn") => {
            Duration::UntilEndOfTurn
        }
        Some(_) => Duration::UntilYourNextTurn,
    }
}

type EffectBuilder = fn(&Captures<'_>, &mut PhraseContext<'_, '_>) -> Option<Vec<Effect>>;

struct EffectPattern {
    name: &'static str,
    regex: Regex,
    build: EffectBuilder,
}

fn row(name: &'static str, source: impl Into<String>, build: EffectBuilder) -> (&'static str, String, EffectBuilder) {
    (name, source.into(), build)
}

fn group<'c>(caps: &'c Captures, name: &str) -> Option<&'c str> {
    caps.name(name).map(|m| m.as_str())
}

fn count_u32(text: &str) -> Option<u32> {
    if text == "all" {
        return Some(u32::MAX);
    }
    u32::try_from(parse_count(text)?).ok()
}

const END: &str = r"(?:$|, | and )";
const DURATION: &str = r"(?P<dur> this turn| for the rest of this turn| until the end of (?:the|this) turn| until the start of your next turn| during their next turn| at the start of their next turn)?";
const PLAYER: &str = r"(?:(?P<who>you|each player|each opponent|chosen opponent|they|that player|its player|their player) )?";
const OWNER: &str = r"(?:their|its|your|his|her)(?: owner's| player's)?";

fn player(caps: &Captures) -> PlayerSelector {
    match group(caps, "who") {
        Some("each player") => PlayerSelector::EachPlayer,
        Some("each opponent") => PlayerSelector::EachOpponent,
        Some("chosen opponent") => PlayerSelector::ChosenOpponent,
        Some("they" | "that player" | "its player" | "their player") => PlayerSelector::TargetController,
        _ => PlayerSelector::You,
    }
}

/// Later effects on the same chosen cards refer back instead of choosing
/// again.
fn follow_up(target: &TargetSelector) -> TargetSelector {
    match target.scope {
        TargetScope::Chosen { .. } => TargetSelector::previous(),
        _ => target.clone(),
    }
}

/// "for each other character you have in play", "for each card in your hand"
fn parse_each(phrase: &str) -> Option<CardFilter> {
    let phrase = phrase.trim();
    if phrase == "card in your hand" {
        return Some(CardFilter::any().in_zone(Zone::Hand).yours());
    }
    if let Some(what) = phrase
        .strip_suffix(" you have in play")
        .or_else(|| phrase.strip_suffix(" you have"))
    {
        return parse_filter(&format!("your {what}"));
    }
    parse_filter(phrase)
}

/// "+1 {s} and +2 {w}" to (delta, stat) pairs.
fn parse_mods(text: &str) -> Option<Vec<(i64, Stat)>> {
    text.split(" and ")
        .flat_map(|part| part.split(','))
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (delta, symbol) = part.split_once(' ')?;
            Some((delta.parse().ok()?, stat_symbol(symbol)?))
        })
        .collect()
}

fn restriction(word: &str) -> Option<Restriction> {
    match word.trim() {
        "quest" => Some(Restriction::CantQuest),
        "challenge" => Some(Restriction::CantChallenge),
        "ready" => Some(Restriction::CantReady),
        "be challenged" => Some(Restriction::CantBeChallenged),
        "sing songs" | "{e} to sing songs" | "sing" => Some(Restriction::CantSing),
        _ => None,
    }
}

fn effect_rows() -> Vec<(&'static str, String, EffectBuilder)> {
    vec![
        row(
            "enters_play",
            format!(r"^(?:this character|this item|this location) enters play (?:(?P<ex>exerted)|with (?P<n>\d+) damage(?: counters?)?(?: on (?:it|them))?){END}"),
            |caps, _| {
                let damage = group(caps, "n").and_then(count_u32).unwrap_or(0);
                Some(vec![Effect::MoveZone {
                    target: TargetSelector::this(),
                    to: Destination::Play {
                        exerted: caps.name("ex").is_some(),
                        damage,
                    },
                }])
            },
        ),
        row(
            "cost_reduction",
            format!(r"^you pay (?P<n>\d+) \{{i\}} less to play (?P<t>.+?){END}"),
            |caps, ctx| {
                let n = parse_count(group(caps, "n")?)?;
                let phrase = group(caps, "t")?;
                let target = match phrase {
                    "this character" | "this item" | "this location" | "this card" | "this song" => {
                        TargetSelector::this()
                    }
                    _ => {
                        let filter = parse_filter(phrase)?;
                        TargetSelector::all(filter.in_zone(Zone::Hand).yours())
                    }
                };
                let duration = if ctx.is_static {
                    Duration::Permanent
                } else {
                    Duration::UntilEndOfTurn
                };
                Some(vec![Effect::ModifyStat {
                    target,
                    stat: Stat::Cost,
                    amount: Amount::Fixed(-n),
                    duration,
                }])
            },
        ),
        row(
            "modify_stat",
            format!(r"^(?P<t>.+?) gets? (?P<mods>[+-]\d+ \{{[swl]\}}(?:(?:,|, and| and) [+-]\d+ \{{[swl]\}})*){DURATION}(?: for each (?P<each>.+?))?{END}"),
            |caps, ctx| {
                let target = ctx.target(group(caps, "t")?)?;
                let duration = duration(caps);
                let each = match group(caps, "each") {
                    Some(phrase) => Some(parse_each(phrase)?),
                    None => None,
                };
                let mods = parse_mods(group(caps, "mods")?)?;
                let effects = mods
                    .into_iter()
                    .enumerate()
                    .map(|(i, (delta, stat))| Effect::ModifyStat {
                        target: if i == 0 { target.clone() } else { follow_up(&target) },
                        stat,
                        amount: match &each {
                            Some(filter) => Amount::ForEach {
                                per: delta,
                                filter: filter.clone(),
                            },
                            None => Amount::Fixed(delta),
                        },
                        duration: duration.clone(),
                    })
                    .collect();
                Some(effects)
            },
        ),
        row(
            "grant_keyword",
            format!(r"^(?P<t>.+?) (?:gains?|get|gets) (?P<kw>evasive|ward|rush|reckless|bodyguard|support|vanish|challenger \+\d+|resist \+\d+|singer \d+){DURATION}{END}"),
            |caps, ctx| {
                let target = ctx.target(group(caps, "t")?)?;
                let (name, value) = match group(caps, "kw")?.split_once(' ') {
                    Some((name, value)) => (name, Some(value.trim_start_matches('+').parse().ok()?)),
                    None => (group(caps, "kw")?, None),
                };
                let keyword = Keyword::from_name(name)?;
                Some(vec![Effect::GrantAbility {
                    target,
                    grant: Grant::Keyword { keyword, value },
                    duration: duration(caps),
                }])
            },
        ),
        row(
            "grant_quoted",
            format!(r#"^(?P<t>.+?) (?:gains?|gets|has|have) "(?P<q>[^"]+)"{DURATION}{END}"#),
            |caps, ctx| {
                let target = ctx.target(group(caps, "t")?)?;
                let quoted = ctx.original_text(caps, "q")?;
                let ability = match (ctx.nested)(&quoted) {
                    Ok(ability) => ability,
                    Err(error) => {
                        tracing::debug!(%error, text = %quoted, "quoted ability rejected");
                        return None;
                    }
                };
                Some(vec![Effect::GrantAbility {
                    target,
                    grant: Grant::Ability(Box::new(ability)),
                    duration: duration(caps),
                }])
            },
        ),
        row(
            "restrict",
            format!(r"^(?P<t>.+?) (?:can't|cannot) (?P<r>quest or challenge|challenge or quest|quest|challenge|ready|be challenged|sing songs|\{{e\}} to sing songs){DURATION}{END}"),
            |caps, ctx| {
                let target = ctx.target(group(caps, "t")?)?;
                let duration = duration(caps);
                group(caps, "r")?
                    .split(" or ")
                    .enumerate()
                    .map(|(i, word)| {
                        Some(Effect::Restrict {
                            target: if i == 0 { target.clone() } else { follow_up(&target) },
                            restriction: restriction(word)?,
                            duration: duration.clone(),
                        })
                    })
                    .collect()
            },
        ),
        row(
            "deal_damage",
            format!(r"^(?:this character |it )?deals? (?P<n>\d+) damage to (?P<t>.+?){END}"),
            |caps, ctx| {
                let amount = parse_count(group(caps, "n")?)?;
                Some(vec![Effect::DealDamage {
                    target: ctx.target(group(caps, "t")?)?,
                    amount: Amount::Fixed(amount),
                }])
            },
        ),
        row(
            "deal_damage_equal",
            format!(r"^deal damage to (?P<t>.+?) equal to (?:this character's|their|its) (?P<s>\{{[swl]\}}){END}"),
            |caps, ctx| {
                let stat = stat_symbol(group(caps, "s")?)?;
                Some(vec![Effect::DealDamage {
                    target: ctx.target(group(caps, "t")?)?,
                    amount: Amount::SourceStat(stat),
                }])
            },
        ),
        row(
            "move_damage",
            format!(r"^move (?P<up>up to )?(?P<n>\d+|a|an|one) damage(?: counters?)? from (?P<from>.+?) to (?P<to>.+?){END}"),
            |caps, ctx| {
                let amount = count_u32(group(caps, "n")?)?;
                let from = ctx.target(group(caps, "from")?)?;
                ctx.antecedent.has_previous = false;
                let to = ctx.target(group(caps, "to")?)?;
                Some(vec![Effect::MoveDamage {
                    from,
                    to,
                    amount,
                    up_to: caps.name("up").is_some(),
                }])
            },
        ),
        row(
            "remove_damage",
            format!(r"^remove (?P<up>up to )?(?P<n>\d+|all) damage(?: counters?)? from (?P<t>.+?){END}"),
            |caps, ctx| {
                let amount = count_u32(group(caps, "n")?)?;
                Some(vec![Effect::RemoveDamage {
                    target: ctx.target(group(caps, "t")?)?,
                    amount,
                    up_to: caps.name("up").is_some() || amount == u32::MAX,
                }])
            },
        ),
        row(
            "draw",
            format!(r"^{PLAYER}draws? (?P<n>a|an|one|two|three|four|five|\d+) cards?{END}"),
            |caps, _| {
                let count = parse_count(group(caps, "n")?)?;
                Some(vec![Effect::Draw {
                    player: player(caps),
                    count: Amount::Fixed(count),
                }])
            },
        ),
        row(
            "discard",
            format!(r"^{PLAYER}(?:chooses? and )?discards? (?P<n>a|an|one|two|three|\d+) (?P<what>(?:[a-z]+ )*?)cards?(?: at random)?{END}"),
            |caps, _| {
                let count = count_u32(group(caps, "n")?)?;
                let what = group(caps, "what").unwrap_or("").trim();
                let filter = if what.is_empty() {
                    CardFilter::any()
                } else {
                    parse_filter(&format!("{what} card"))?
                };
                Some(vec![Effect::Discard {
                    player: player(caps),
                    count,
                    filter: filter.in_zone(Zone::Hand),
                }])
            },
        ),
        row(
            "lore",
            format!(r"^{PLAYER}(?P<verb>gains?|loses?) (?P<n>\d+) lore{END}"),
            |caps, _| {
                let n = parse_count(group(caps, "n")?)?;
                let amount = if group(caps, "verb")?.starts_with("lose") { -n } else { n };
                Some(vec![Effect::GainLore {
                    player: player(caps),
                    amount: Amount::Fixed(amount),
                }])
            },
        ),
        row(
            "banish",
            format!(r"^banish (?P<t>.+?){END}"),
            |caps, ctx| {
                Some(vec![Effect::MoveZone {
                    target: ctx.target(group(caps, "t")?)?,
                    to: Destination::Discard,
                }])
            },
        ),
        row(
            "return_to_hand",
            format!(r"^return (?P<t>.+?) to {OWNER} hand{END}"),
            |caps, ctx| {
                Some(vec![Effect::MoveZone {
                    target: ctx.target(group(caps, "t")?)?,
                    to: Destination::Hand,
                }])
            },
        ),
        row(
            "deck_bottom",
            format!(r"^put (?P<t>.+?) on the bottom of {OWNER} deck{END}"),
            |caps, ctx| {
                Some(vec![Effect::MoveZone {
                    target: ctx.target(group(caps, "t")?)?,
                    to: Destination::DeckBottom,
                }])
            },
        ),
        row(
            "shuffle_into_deck",
            format!(r"^shuffle (?P<t>.+?) into {OWNER} deck{END}"),
            |caps, ctx| {
                Some(vec![Effect::MoveZone {
                    target: ctx.target(group(caps, "t")?)?,
                    to: Destination::DeckShuffled,
                }])
            },
        ),
        row(
            "inkwell",
            format!(r"^put (?P<t>.+?) into {OWNER} inkwell(?: facedown)?(?P<ex> and exerted| exerted)?{END}"),
            |caps, ctx| {
                Some(vec![Effect::MoveZone {
                    target: ctx.target(group(caps, "t")?)?,
                    to: Destination::Inkwell {
                        exerted: caps.name("ex").is_some(),
                    },
                }])
            },
        ),
        row(
            "play_for_free",
            format!(r"^play (?P<what>.+?) for free{END}"),
            |caps, ctx| {
                let mut filter = parse_filter(group(caps, "what")?)?;
                let permanent = !filter.categories.is_empty()
                    && filter.categories.iter().all(|c| c.is_permanent());
                if !permanent {
                    return None;
                }
                if filter.zone == Some(Zone::Play) {
                    filter = filter.in_zone(Zone::Hand);
                }
                ctx.subject = Some("them".to_string());
                Some(vec![Effect::MoveZone {
                    target: TargetSelector::chosen(filter.yours()),
                    to: Destination::Play {
                        exerted: false,
                        damage: 0,
                    },
                }])
            },
        ),
        row(
            "exert_or_ready",
            format!(r"^(?P<v>exert|ready) (?P<t>.+?){END}"),
            |caps, ctx| {
                Some(vec![Effect::SetExerted {
                    target: ctx.target(group(caps, "t")?)?,
                    exerted: group(caps, "v")? == "exert",
                }])
            },
        ),
    ]
}

/// The compiled effect table.
pub struct PatternLibrary {
    patterns: Vec<EffectPattern>,
}

impl PatternLibrary {
    /// Compile every row; a bad row is an error.
    pub fn try_new() -> Result<Self, CompileError> {
        let patterns = effect_rows()
            .into_iter()
            .map(|(name, source, build)| {
                Regex::new(&source)
                    .map(|regex| EffectPattern { name, regex, build })
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
        for (name, source, build) in effect_rows() {
            match Regex::new(&source) {
                Ok(regex) => patterns.push(EffectPattern { name, regex, build }),
                Err(error) => tracing::warn!(pattern = name, %error, "skipping effect pattern"),
            }
        }
        Self { patterns }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Extract the effects of a clause body (lowercased, with `ctx`
    /// holding the original-case text at the same offsets).
    pub(crate) fn effects(&self, body: &str, ctx: &mut PhraseContext) -> Vec<Effect> {
        if let Some(options) = self.choose_one(body, ctx) {
            return options;
        }

        let mut effects = Vec::new();
        for (start, sentence) in sentences(body) {
            ctx.offset = Some(start);
            effects.extend(self.sentence(sentence, ctx));
        }
        effects
    }

    /// "Choose one: • A • B" as a single choice effect.
    fn choose_one(&self, body: &str, ctx: &mut PhraseContext) -> Option<Vec<Effect>> {
        let rest = body.trim_start().strip_prefix("choose one:")?;
        let base = body.len() - rest.len();
        let mut options = Vec::new();
        let mut cursor = 0;
        for piece in rest.split('•') {
            let start = base + cursor;
            cursor += piece.len() + '•'.len_utf8();
            if piece.trim().is_empty() {
                continue;
            }
            ctx.antecedent.has_previous = false;
            let mut option = Vec::new();
            for (offset, sentence) in sentences(piece) {
                ctx.offset = Some(start + offset);
                option.extend(self.sentence(sentence, ctx));
            }
            if option.is_empty() {
                tracing::debug!(option = piece.trim(), "choice option not recognized");
                return Some(Vec::new());
            }
            options.push(option);
        }
        if options.len() < 2 {
            return Some(Vec::new());
        }
        Some(vec![Effect::Choice {
            mode: ChoiceMode::One,
            options,
        }])
    }

    fn sentence(&self, sentence: &str, ctx: &mut PhraseContext) -> Vec<Effect> {
        let trimmed = sentence.trim_start();
        let lead = sentence.len() - trimmed.len();
        if let Some(rest) = trimmed.strip_prefix("you may ") {
            let skip = lead + "you may ".len();
            ctx.offset = ctx.offset.map(|o| o + skip);
            let inner = self.span(rest, ctx);
            return if inner.is_empty() {
                inner
            } else {
                vec![Effect::may(inner)]
            };
        }
        ctx.offset = ctx.offset.map(|o| o + lead);
        self.span(trimmed, ctx)
    }

    /// Match rows from the front of `text` until it is used up.
    fn span(&self, text: &str, ctx: &mut PhraseContext) -> Vec<Effect> {
        let mut effects = Vec::new();
        let mut rest = text.trim_end().to_string();
        let mut aligned = true;

        while !rest.is_empty() {
            let matched = self.match_front(&rest, ctx);
            let (consumed, built) = match matched {
                Some(found) => found,
                None => {
                    // "..., and gain Ward": retry with the running subject.
                    let Some(subject) = ctx.subject.clone() else {
                        tracing::debug!(residue = %rest, "unmatched residue");
                        ctx.unmatched.push(rest);
                        break;
                    };
                    let retry = format!("{subject} {rest}");
                    let saved = ctx.offset.take();
                    let found = self.match_front(&retry, ctx);
                    ctx.offset = saved;
                    match found {
                        Some((consumed, built)) if consumed > subject.len() + 1 => {
                            aligned = false;
                            (consumed - subject.len() - 1, built)
                        }
                        _ => {
                            tracing::debug!(residue = %rest, "unmatched residue");
                            ctx.unmatched.push(rest);
                            break;
                        }
                    }
                }
            };

            if built.iter().any(|e| e.target().is_some()) {
                ctx.antecedent.has_previous = true;
            }
            effects.extend(built);

            let remaining = &rest[consumed.min(rest.len())..];
            let next = strip_connectors(remaining);
            let skipped = rest.len() - next.len();
            ctx.offset = if aligned { ctx.offset.map(|o| o + skipped) } else { None };
            rest = next.to_string();
        }
        effects
    }

    /// First row that matches at the front; returns the consumed length.
    fn match_front(&self, text: &str, ctx: &mut PhraseContext) -> Option<(usize, Vec<Effect>)> {
        self.patterns.iter().find_map(|pattern| {
            let caps = pattern.regex.captures(text)?;
            let whole = caps.get(0)?;
            let effects = (pattern.build)(&caps, ctx)?;
            if effects.is_empty() {
                return None;
            }
            tracing::trace!(pattern = pattern.name, span = whole.as_str(), "effect matched");
            Some((whole.end(), effects))
        })
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_connectors(text: &str) -> &str {
    let mut text = text;
    loop {
        let next = text
            .trim_start_matches([',', ' ', ';'])
            .trim_start_matches("and ")
            .trim_start_matches("then ");
        if next.len() == text.len() {
            return next;
        }
        text = next;
    }
}

/// Sentence spans with their byte offsets. Periods inside quotes and line
/// breaks inside a sentence are handled; the trailing period is dropped.
fn sentences(text: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut in_quote = false;
    let mut start = 0;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_quote = !in_quote,
            b'.' if !in_quote && bytes.get(i + 1).map_or(true, |n| n.is_ascii_whitespace()) => {
                spans.push((start, &text[start..i]));
                start = i + 1;
            }
            b'\n' if !in_quote => {
                spans.push((start, &text[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    spans.push((start, &text[start..]));
    spans
        .into_iter()
        .filter_map(|(offset, span)| {
            let opened = span.trim_start().trim_start_matches('•').trim_start();
            let trimmed = opened.trim_end();
            (!trimmed.is_empty()).then(|| (offset + span.len() - opened.len(), trimmed))
        })
        .collect()
}
