//! Compiler integration tests.
//!
//! Scenario tests over realistic card text, plus property tests: ability
//! counts never fall below the number of keyword and named blocks, every
//! ability satisfies the structural invariants, and compiling is
//! idempotent.

use proptest::prelude::*;

use rust_lore::abilities::{AbilityCategory, AbilityDefinition, AbilityOrigin, CostToken, Keyword, KeywordValue};
use rust_lore::cards::{CardCategory, CardId, CardRecord};
use rust_lore::compiler::{Compiler, CompileError};
use rust_lore::effects::{Destination, Duration, Effect, Grant, Stat, TargetScope};
use rust_lore::triggers::{Condition, EventKind};

fn character(blocks: &[&str]) -> CardRecord {
    blocks.iter().fold(
        CardRecord::new(CardId::new(100), "Tester", CardCategory::Character, 3).with_stats(2, 3, 1),
        |record, block| record.with_text(*block),
    )
}

fn compile(blocks: &[&str]) -> Vec<AbilityDefinition> {
    Compiler::standard().compile(&character(blocks))
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_keyword_plus_named_trigger() {
    let abilities = compile(&[
        "Evasive (Only characters with Evasive can challenge this character.)",
        "TAKE NOTES Whenever this character quests, draw a card.",
    ]);

    assert_eq!(abilities.len(), 2);
    assert_eq!(abilities[0].category, AbilityCategory::Static);
    assert_eq!(abilities[0].origin, AbilityOrigin::Keyword);
    assert_eq!(abilities[1].category, AbilityCategory::Triggered);
    assert_eq!(abilities[1].trigger.as_ref().map(|t| t.event), Some(EventKind::CharacterQuested));
    assert!(abilities.iter().all(|a| !a.effects.is_empty()));
}

#[test]
fn test_banish_cost_activated() {
    let abilities = compile(&[
        "⟳, Banish one of your other characters — Play a character with the same name as the banished character for free.",
    ]);

    assert_eq!(abilities.len(), 1);
    let ability = &abilities[0];
    assert_eq!(ability.category, AbilityCategory::Activated);
    assert_eq!(ability.costs.len(), 2);
    assert!(matches!(ability.costs[1], CostToken::BanishOther(_)));
    assert!(matches!(
        &ability.effects[..],
        [Effect::MoveZone { to: Destination::Play { .. }, .. }]
    ));
}

#[test]
fn test_song_bare_reminder() {
    let song = CardRecord::new(CardId::new(101), "Ballad", CardCategory::Action, 5)
        .with_classification("Song")
        .with_text("(A character with cost 5 or more can ⟳ to sing this song for free.)")
        .with_text("Each opponent loses 2 lore.");
    let abilities = Compiler::standard().compile(&song);

    assert_eq!(abilities.len(), 2);
    assert_eq!(abilities[0].category, AbilityCategory::Static);
    assert!(matches!(
        &abilities[0].effects[..],
        [Effect::GrantAbility { grant: Grant::Keyword { keyword: Keyword::Singable, value: Some(5) }, .. }]
    ));
}

#[test]
fn test_keyword_values() {
    let shift = compile(&["Shift 4 (You may pay 4 ⬡ to play this on top of one of your characters named Tester.)"]);
    assert_eq!(shift[0].keyword.as_ref().and_then(|k| k.value.clone()), Some(KeywordValue::Number(4)));
    assert_eq!(shift[0].costs.as_slice(), &[CostToken::Ink(4)]);

    let singer = compile(&["Singer 4 (This character counts as cost 4 to sing songs.)"]);
    assert_eq!(singer[0].keyword.as_ref().and_then(|k| k.value.clone()), Some(KeywordValue::Number(4)));

    let textual = compile(&["Shift: Discard a song card (You may discard a song card to play this on top of one of your characters named Tester.)"]);
    assert!(matches!(
        textual[0].keyword.as_ref().and_then(|k| k.value.clone()),
        Some(KeywordValue::Text(text)) if text == "Discard a song card"
    ));
}

#[test]
fn test_support_is_triggered() {
    let abilities = compile(&["Support (Whenever this character quests, you may add their {S} to another chosen character's {S} this turn.)"]);
    assert_eq!(abilities.len(), 1);
    assert_eq!(abilities[0].category, AbilityCategory::Triggered);
    assert!(abilities[0].is_keyword(Keyword::Support));
}

#[test]
fn test_multiple_reminders_on_one_line() {
    let abilities = compile(&["Rush (This character can challenge the turn they're played.) Ward (Opponents can't choose this character except to challenge.)"]);
    assert_eq!(abilities.len(), 2);
    assert!(abilities[0].is_keyword(Keyword::Rush));
    assert!(abilities[1].is_keyword(Keyword::Ward));
}

#[test]
fn test_compound_effects_and_pronouns() {
    let abilities = compile(&[
        "BATTLE CRY When you play this character, chosen character gets +2 {S} this turn and gains Evasive this turn.",
    ]);
    let effects = &abilities[0].effects;
    assert_eq!(effects.len(), 2);
    assert!(matches!(
        &effects[0],
        Effect::ModifyStat { stat: Stat::Strength, duration: Duration::UntilEndOfTurn, target, .. }
            if matches!(target.scope, TargetScope::Chosen { count: 1, up_to: false })
    ));
    assert_eq!(effects[1].target().map(|t| t.scope.clone()), Some(TargetScope::Previous));
}

#[test]
fn test_once_per_turn_and_guard() {
    let abilities = compile(&[
        "LUCKY BREAK Once during your turn, whenever this character is challenged, if you have 10 or more lore, draw 2 cards.",
    ]);
    let ability = &abilities[0];
    assert!(ability.once_per_turn);
    assert_eq!(
        ability.condition,
        Some(Condition::YourTurn.and(Condition::LoreAtLeast(10)))
    );
}

#[test]
fn test_play_and_quest_trigger() {
    let compilation = Compiler::standard().compile_with_diagnostics(&character(&[
        "Ward (Opponents can't choose this character except to challenge.)",
        "HELLO When you play this character and whenever he quests, draw a card.",
    ]));

    assert!(compilation.diagnostics.is_empty());
    let abilities = &compilation.abilities;
    assert_eq!(abilities.len(), 3);
    assert_eq!(abilities.iter().map(|a| a.id.ordinal).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(abilities[1].trigger.as_ref().map(|t| t.event), Some(EventKind::CardPlayed));
    assert_eq!(abilities[2].trigger.as_ref().map(|t| t.event), Some(EventKind::CharacterQuested));
    assert!(abilities[1..].iter().all(|a| matches!(&a.effects[..], [Effect::Draw { .. }])));
}

#[test]
fn test_granted_quoted_ability() {
    let abilities = compile(&[
        "DARK PACT Your other characters gain \"When this character is banished, you may draw a card.\"",
    ]);
    let [Effect::GrantAbility { target, grant: Grant::Ability(granted), duration }] = &abilities[0].effects[..] else {
        panic!("expected a single grant");
    };
    assert_eq!(target.scope, TargetScope::All);
    assert_eq!(*duration, Duration::Permanent);
    assert_eq!(granted.origin, AbilityOrigin::Granted);
    assert_eq!(granted.trigger.as_ref().map(|t| t.event), Some(EventKind::Banished));
}

#[test]
fn test_unparseable_block_is_reported_not_fatal() {
    let compilation = Compiler::standard().compile_with_diagnostics(&character(&[
        "MYSTERY Rearrange the cosmos.",
        "Bodyguard (This character may enter play exerted. An opposing character who challenges one of your characters must choose one with Bodyguard if able.)",
    ]));
    assert_eq!(compilation.abilities.len(), 1);
    assert_eq!(compilation.diagnostics.len(), 1);
    assert!(matches!(compilation.diagnostics[0].error, CompileError::NoEffects { .. }));
    assert!(compilation.diagnostics[0].to_string().contains("Tester"));
}

#[test]
fn test_abilities_serialize() {
    let abilities = compile(&["STRAIGHTEN HAIR ⟳ - Remove up to 1 damage from chosen character."]);
    let json = serde_json::to_string(&abilities).unwrap();
    let back: Vec<AbilityDefinition> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, abilities);
}

// =============================================================================
// Properties
// =============================================================================

const KEYWORD_BLOCKS: &[&str] = &[
    "Evasive (Only characters with Evasive can challenge this character.)",
    "Ward (Opponents can't choose this character except to challenge.)",
    "Rush (This character can challenge the turn they're played.)",
    "Reckless (This character can't quest and must challenge each turn if able.)",
    "Challenger +2 (While challenging, this character gets +2 {S}.)",
    "Resist +1 (Damage dealt to this character is reduced by 1.)",
    "Singer 5 (This character counts as cost 5 to sing songs.)",
    "Shift 3 (You may pay 3 ⬡ to play this on top of one of your characters named Tester.)",
    "Bodyguard (This character may enter play exerted.)",
    "Support (Whenever this character quests, you may add their {S} to another chosen character's {S} this turn.)",
];

const NAMED_BLOCKS: &[&str] = &[
    "TAKE NOTES Whenever this character quests, draw a card.",
    "LOOK AHEAD When you play this character, you may draw a card.",
    "INSPIRE Your other characters get +1 {S}.",
    "GUARD DUTY While this character is exerted, it gets +2 {W}.",
    "STRAIGHTEN HAIR ⟳ - Remove up to 1 damage from chosen character.",
    "FINAL WORD When this character is banished, each opponent loses 1 lore.",
    "HEAVY HAND Whenever this character challenges another character, chosen opposing character can't quest during their next turn.",
    "BACK OFF ⟳, 2 ⬡ - Return chosen character with cost 2 or less to their player's hand.",
    "HOLD STILL During your turn, this character gains Evasive.",
    "SHARE When you play this character, each player draws a card.",
];

fn template_card() -> impl Strategy<Value = (Vec<&'static str>, usize)> {
    (
        proptest::sample::subsequence(KEYWORD_BLOCKS, 0..=3),
        proptest::sample::subsequence(NAMED_BLOCKS, 0..=3),
    )
        .prop_map(|(keywords, named)| {
            let count = keywords.len() + named.len();
            (keywords.into_iter().chain(named).collect(), count)
        })
}

fn check_invariants(ability: &AbilityDefinition) {
    assert!(!ability.effects.is_empty());
    if ability.category == AbilityCategory::Activated {
        assert!(!ability.costs.is_empty());
    }
    if ability.category == AbilityCategory::Triggered {
        assert!(ability.trigger.is_some());
    }
    assert!(ability.validate().is_ok());
}

proptest! {
    #[test]
    fn prop_ability_count_covers_blocks((blocks, count) in template_card()) {
        let abilities = compile(&blocks);
        prop_assert!(abilities.len() >= count);
    }

    #[test]
    fn prop_invariants_and_idempotence((blocks, _) in template_card()) {
        let record = character(&blocks);
        let first = Compiler::standard().compile(&record);
        let second = Compiler::standard().compile(&record);
        prop_assert_eq!(&first, &second);
        for ability in &first {
            check_invariants(ability);
        }
    }

    #[test]
    fn prop_arbitrary_text_never_panics(text in "[A-Za-z ,.{}()\"⟳⬡+0-9-]{0,80}") {
        let compilation = Compiler::standard().compile_with_diagnostics(&character(&[text.as_str()]));
        for ability in &compilation.abilities {
            check_invariants(ability);
        }
    }
}
