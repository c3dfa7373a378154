//! Resolution engine integration tests.
//!
//! Every card here goes through the real compiler, so these also check
//! that compiled abilities mean what their text says at runtime.

use rust_lore::abilities::AbilityId;
use rust_lore::cards::{CardCatalog, CardCategory, CardId, CardRecord};
use rust_lore::compiler::Compiler;
use rust_lore::core::{EngineConfig, EntityId, GameState, PlayerId, Zone};
use rust_lore::effects::Stat;
use rust_lore::rules::{ActionOutcome, EngineError, PlayMode, ResolutionEngine};
use rust_lore::triggers::GameEvent;
use rust_lore::zones::ZonePosition;

const ROCK: CardId = CardId::new(1);
const PAWN: CardId = CardId::new(2);
const FUMBLER: CardId = CardId::new(3);
const MARTYR: CardId = CardId::new(4);
const BRUISER: CardId = CardId::new(5);
const PURGER: CardId = CardId::new(6);
const SCRIBE: CardId = CardId::new(7);
const ZAP: CardId = CardId::new(8);
const LEADER: CardId = CardId::new(9);
const SENTRY: CardId = CardId::new(10);
const HADES_BASE: CardId = CardId::new(11);
const HADES_SHIFT: CardId = CardId::new(12);
const TUNE: CardId = CardId::new(13);
const RECRUITER: CardId = CardId::new(14);
const ZED: CardId = CardId::new(15);
const CALL_ZED: CardId = CardId::new(16);
const PATRON: CardId = CardId::new(17);

fn p(i: u8) -> PlayerId {
    PlayerId::new(i)
}

fn catalog() -> CardCatalog {
    let compiler = Compiler::standard();
    let mut catalog = CardCatalog::new();
    let cards = vec![
        CardRecord::new(ROCK, "Rock", CardCategory::Item, 1).with_inkable(true),
        CardRecord::new(PAWN, "Pawn", CardCategory::Character, 1).with_stats(1, 2, 1),
        CardRecord::new(FUMBLER, "Fumbler", CardCategory::Character, 2)
            .with_stats(1, 3, 1)
            .with_text("FUMBLE Whenever this character quests, discard a card.")
            .with_text("SHOW OFF Whenever this character quests, if you have 3 or more cards in your hand, gain 2 lore."),
        CardRecord::new(MARTYR, "Martyr", CardCategory::Character, 2)
            .with_stats(1, 2, 1)
            .with_text("FAREWELL When this character is banished, draw a card."),
        CardRecord::new(BRUISER, "Bruiser", CardCategory::Character, 4).with_stats(3, 4, 1),
        CardRecord::new(PURGER, "Purger", CardCategory::Character, 5)
            .with_stats(2, 5, 1)
            .with_text("CLEAN SWEEP At the start of your turn, banish all other characters."),
        CardRecord::new(SCRIBE, "Scribe", CardCategory::Character, 2)
            .with_stats(1, 2, 1)
            .with_text("STUDY At the start of your turn, draw a card."),
        CardRecord::new(ZAP, "Zap", CardCategory::Action, 1).with_text("Deal 2 damage to chosen opposing character."),
        CardRecord::new(LEADER, "Leader", CardCategory::Character, 3)
            .with_stats(2, 3, 1)
            .with_text("INSPIRE Your other characters get +1 {S}."),
        CardRecord::new(SENTRY, "Sentry", CardCategory::Character, 2)
            .with_stats(1, 2, 1)
            .with_text("GUARD DUTY While this character is exerted, it gets +2 {W}."),
        CardRecord::new(HADES_BASE, "Hades", CardCategory::Character, 3)
            .with_version("Lord of the Dead")
            .with_stats(2, 4, 1),
        CardRecord::new(HADES_SHIFT, "Hades", CardCategory::Character, 7)
            .with_version("Infernal Schemer")
            .with_stats(5, 5, 2)
            .with_text("Shift 4 (You may pay 4 ⬡ to play this on top of one of your characters named Hades.)"),
        CardRecord::new(TUNE, "Tune", CardCategory::Action, 3)
            .with_classification("Song")
            .with_text("(A character with cost 3 or more can ⟳ to sing this song for free.)")
            .with_text("Draw 2 cards."),
        CardRecord::new(RECRUITER, "Recruiter", CardCategory::Character, 3)
            .with_stats(1, 3, 1)
            .with_text("CALL FOR AID ⟳, Banish one of your other characters — Play a character with the same name as the banished character for free."),
        CardRecord::new(ZED, "Zed", CardCategory::Character, 2).with_stats(1, 2, 1),
        CardRecord::new(CALL_ZED, "Call Zed", CardCategory::Action, 1)
            .with_text("If you have a character named Zed in play, draw 2 cards."),
        CardRecord::new(PATRON, "Patron", CardCategory::Character, 4)
            .with_stats(2, 5, 1)
            .with_text("LAST WISH Your other characters gain \"When this character is banished, draw a card.\""),
    ];
    for card in cards {
        catalog.register(card, compiler).unwrap();
    }
    catalog
}

fn ready_in_play(state: &mut GameState, card: CardId, owner: PlayerId) -> EntityId {
    let entity = state.create_card(card, owner, Zone::Play);
    state.card_mut(entity).unwrap().drying = false;
    entity
}

fn add_ink(state: &mut GameState, owner: PlayerId, amount: usize) {
    for _ in 0..amount {
        state.create_card(ROCK, owner, Zone::Inkwell);
    }
}

#[test]
fn test_guard_false_at_resolution_suppresses_everything() {
    let catalog = catalog();
    let mut engine = ResolutionEngine::new(&catalog, EngineConfig::default());
    let mut state = GameState::new(2, 7);
    let fumbler = ready_in_play(&mut state, FUMBLER, p(0));
    for _ in 0..3 {
        state.create_card(PAWN, p(0), Zone::Hand);
    }

    let report = engine.notify(&mut state, GameEvent::quested(fumbler, p(0), 1)).unwrap();

    // Both matched with 3 cards in hand; the discard ran first.
    assert_eq!(report.resolved, 1);
    assert_eq!(report.suppressed, 1);
    assert_eq!(state.cards_in(p(0), Zone::Hand).len(), 2);
    assert_eq!(state.lore(p(0)), 0);
}

#[test]
fn test_self_banish_trigger_resolves_after_leaving_play() {
    let catalog = catalog();
    let mut engine = ResolutionEngine::new(&catalog, EngineConfig::default());
    let mut state = GameState::new(2, 7);
    let bruiser = ready_in_play(&mut state, BRUISER, p(0));
    let martyr = ready_in_play(&mut state, MARTYR, p(1));
    state.card_mut(martyr).unwrap().exerted = true;
    state.create_card(PAWN, p(1), Zone::Deck);

    let report = engine.challenge(&mut state, bruiser, martyr).unwrap();

    assert_eq!(state.card(martyr).unwrap().zone, Zone::Discard);
    assert_eq!(report.banished, 1);
    assert_eq!(report.resolved, 1);
    assert_eq!(state.cards_in(p(1), Zone::Hand).len(), 1);
    assert!(state.event_log().iter().any(|e| e.in_challenge()));
}

#[test]
fn test_granted_banish_trigger_fires() {
    let catalog = catalog();
    let mut engine = ResolutionEngine::new(&catalog, EngineConfig::default());
    let mut state = GameState::new(2, 7);
    let patron = ready_in_play(&mut state, PATRON, p(0));
    let pawn = ready_in_play(&mut state, PAWN, p(0));
    state.create_card(ROCK, p(0), Zone::Deck);
    state.card_mut(pawn).unwrap().damage = 2;

    let report = engine.state_based_check(&mut state).unwrap();

    assert_eq!(report.banished, 1);
    assert_eq!(report.resolved, 1);
    assert_eq!(state.card(pawn).unwrap().zone, Zone::Discard);
    assert!(state.is_in_play(patron));
    assert_eq!(state.cards_in(p(0), Zone::Hand).len(), 1);
}

#[test]
fn test_trigger_discarded_when_source_leaves_play() {
    let catalog = catalog();
    let mut engine = ResolutionEngine::new(&catalog, EngineConfig::default());
    let mut state = GameState::new(2, 7);
    let purger = ready_in_play(&mut state, PURGER, p(0));
    let scribe = ready_in_play(&mut state, SCRIBE, p(0));
    state.create_card(PAWN, p(0), Zone::Deck);

    let report = engine.notify(&mut state, GameEvent::turn_started(p(0))).unwrap();

    assert_eq!(report.resolved, 1);
    assert_eq!(report.discarded, 1);
    assert!(state.is_in_play(purger));
    assert!(!state.is_in_play(scribe));
    assert!(state.cards_in(p(0), Zone::Hand).is_empty());
}

#[test]
fn test_empty_mandatory_target_fizzles() {
    let catalog = catalog();
    let mut engine = ResolutionEngine::new(&catalog, EngineConfig::default());
    let mut state = GameState::new(2, 7);
    let zap = state.create_card(ZAP, p(0), Zone::Hand);
    let mine = ready_in_play(&mut state, PAWN, p(0));
    add_ink(&mut state, p(0), 1);

    let outcome = engine.play_card(&mut state, zap, PlayMode::Normal).unwrap();

    assert_eq!(outcome.report().map(|r| r.fizzled), Some(1));
    assert_eq!(state.card(mine).unwrap().damage, 0);
    assert_eq!(state.card(zap).unwrap().zone, Zone::Discard);
}

#[test]
fn test_action_guard_checked_on_play() {
    let catalog = catalog();
    let mut engine = ResolutionEngine::new(&catalog, EngineConfig::default());
    let mut state = GameState::new(2, 7);
    let first = state.create_card(CALL_ZED, p(0), Zone::Hand);
    let second = state.create_card(CALL_ZED, p(0), Zone::Hand);
    for _ in 0..3 {
        state.create_card(PAWN, p(0), Zone::Deck);
    }
    add_ink(&mut state, p(0), 2);

    let outcome = engine.play_card(&mut state, first, PlayMode::Normal).unwrap();

    let report = outcome.report().copied().unwrap();
    assert_eq!(report.suppressed, 1);
    assert_eq!(report.resolved, 0);
    assert_eq!(state.card(first).unwrap().zone, Zone::Discard);
    assert_eq!(state.cards_in(p(0), Zone::Hand), [second].as_slice());

    ready_in_play(&mut state, ZED, p(0));
    let outcome = engine.play_card(&mut state, second, PlayMode::Normal).unwrap();

    assert_eq!(outcome.report().map(|r| (r.resolved, r.suppressed)), Some((1, 0)));
    assert_eq!(state.cards_in(p(0), Zone::Hand).len(), 2);
}

#[test]
fn test_static_layers_follow_their_source() {
    let catalog = catalog();
    let mut engine = ResolutionEngine::new(&catalog, EngineConfig::default());
    let mut state = GameState::new(2, 7);
    let leader = ready_in_play(&mut state, LEADER, p(0));
    let pawn = ready_in_play(&mut state, PAWN, p(0));
    let sentry = ready_in_play(&mut state, SENTRY, p(0));

    engine.state_based_check(&mut state).unwrap();
    assert_eq!(engine.view(&state).effective_stat(pawn, Stat::Strength), 2);
    assert_eq!(engine.view(&state).effective_stat(leader, Stat::Strength), 2);
    assert_eq!(engine.view(&state).effective_stat(sentry, Stat::Willpower), 2);

    state.card_mut(sentry).unwrap().exerted = true;
    state.move_card(leader, Zone::Discard, ZonePosition::Top);
    engine.state_based_check(&mut state).unwrap();

    assert_eq!(engine.view(&state).effective_stat(pawn, Stat::Strength), 1);
    assert_eq!(engine.view(&state).effective_stat(sentry, Stat::Willpower), 4);
}

#[test]
fn test_shift_onto_same_name() {
    let catalog = catalog();
    let mut engine = ResolutionEngine::new(&catalog, EngineConfig::default());
    let mut state = GameState::new(2, 7);
    let base = ready_in_play(&mut state, HADES_BASE, p(0));
    state.card_mut(base).unwrap().damage = 1;
    let shifted = state.create_card(HADES_SHIFT, p(0), Zone::Hand);
    add_ink(&mut state, p(0), 4);

    let outcome = engine.play_card(&mut state, shifted, PlayMode::Shift { onto: base }).unwrap();

    assert!(outcome.is_done());
    assert!(state.is_in_play(shifted));
    assert_eq!(state.card(base).unwrap().zone, Zone::Discard);
    assert_eq!(state.card(shifted).unwrap().damage, 1);
    assert_eq!(state.available_ink(p(0)), 0);
}

#[test]
fn test_sing_song_for_free() {
    let catalog = catalog();
    let mut engine = ResolutionEngine::new(&catalog, EngineConfig::default());
    let mut state = GameState::new(2, 7);
    let singer = ready_in_play(&mut state, LEADER, p(0));
    let cheap = ready_in_play(&mut state, PAWN, p(0));
    let song = state.create_card(TUNE, p(0), Zone::Hand);
    for _ in 0..2 {
        state.create_card(PAWN, p(0), Zone::Deck);
    }

    assert!(matches!(
        engine.play_card(&mut state, song, PlayMode::Sing { singer: cheap }),
        Err(EngineError::IllegalAction(_))
    ));

    let outcome = engine.play_card(&mut state, song, PlayMode::Sing { singer }).unwrap();

    assert!(outcome.is_done());
    assert!(state.card(singer).unwrap().exerted);
    assert_eq!(state.cards_in(p(0), Zone::Hand).len(), 2);
    assert_eq!(state.card(song).unwrap().zone, Zone::Discard);
}

#[test]
fn test_activate_pays_all_costs_or_none() {
    let catalog = catalog();
    let mut engine = ResolutionEngine::new(&catalog, EngineConfig::default());
    let mut state = GameState::new(2, 7);
    let recruiter = ready_in_play(&mut state, RECRUITER, p(0));
    let ability = AbilityId::new(RECRUITER, 0);

    let outcome = engine.activate(&mut state, recruiter, ability).unwrap();
    assert!(matches!(outcome, ActionOutcome::Unavailable(_)));
    assert!(!state.card(recruiter).unwrap().exerted);

    let pawn = ready_in_play(&mut state, PAWN, p(0));
    let replacement = state.create_card(PAWN, p(0), Zone::Hand);

    let outcome = engine.activate(&mut state, recruiter, ability).unwrap();

    assert!(outcome.is_done());
    assert!(state.card(recruiter).unwrap().exerted);
    assert_eq!(state.card(pawn).unwrap().zone, Zone::Discard);
    assert!(state.is_in_play(replacement));
}
