//! Rules-text compiler: `CardRecord` text to `AbilityDefinition`s.
//!
//! Pipeline, per card:
//!
//! 1. `text`: normalize glyphs, quotes and dashes
//! 2. `segment`: one unit per ability (keyword, named, reminder, unlabeled)
//! 3. `keyword`: keyword table lookup and keyword ability builders
//! 4. `classify`: activated / triggered / static
//! 5. `extract`: trigger descriptors, guard conditions, cost tokens
//! 6. `patterns`: ordered effect pattern table
//! 7. `assemble`: combine, assign ids, validate
//!
//! A rejected ability never aborts the card: it is logged, reported as a
//! [`Diagnostic`] and dropped.
//!
//! ## Example
//!
//! ```
//! use rust_lore::abilities::AbilityCategory;
//! use rust_lore::cards::{CardCategory, CardId, CardRecord};
//! use rust_lore::compiler::Compiler;
//!
//! let record = CardRecord::new(CardId::new(1), "Scout", CardCategory::Character, 3)
//!     .with_stats(2, 3, 1)
//!     .with_text("Evasive (Only characters with Evasive can challenge this character.)")
//!     .with_text("TAKE NOTES Whenever this character quests, draw a card.");
//!
//! let abilities = Compiler::standard().compile(&record);
//! assert_eq!(abilities.len(), 2);
//! assert_eq!(abilities[0].category, AbilityCategory::Static);
//! assert_eq!(abilities[1].category, AbilityCategory::Triggered);
//! ```

mod assemble;
mod classify;
mod error;
mod extract;
mod keyword;
mod patterns;
mod segment;
mod target;
mod text;

use std::sync::OnceLock;

use crate::abilities::AbilityDefinition;
use assemble::Candidate;
use crate::cards::CardRecord;

pub use classify::{classify, Clause};
pub use error::{CompileError, Diagnostic};
pub use extract::{parse_condition, parse_costs, TriggerTable};
pub use patterns::PatternLibrary;
pub use segment::{segment, Segment, SegmentKind};
pub use target::{parse_filter, parse_target, Antecedent};
pub use text::normalize;

/// Abilities of one card plus the candidates that were rejected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Compilation {
    pub abilities: Vec<AbilityDefinition>,
    /// Rejected candidates.
    pub diagnostics: Vec<Diagnostic>,
    /// Text that accepted abilities were compiled without
    /// (`CompileError::Unmatched`).
    pub unmatched: Vec<Diagnostic>,
}

/// The compiler: the trigger table and the effect pattern library.
///
/// Compiling is a pure function of the record; the same record always
/// yields the same abilities with the same ids.
pub struct Compiler {
    triggers: TriggerTable,
    patterns: PatternLibrary,
}

impl Compiler {
    /// Build the tables, skipping any row whose regex fails to compile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            triggers: TriggerTable::new(),
            patterns: PatternLibrary::new(),
        }
    }

    /// Build the tables, failing on the first bad row.
    pub fn try_new() -> Result<Self, CompileError> {
        Ok(Self {
            triggers: TriggerTable::try_new()?,
            patterns: PatternLibrary::try_new()?,
        })
    }

    /// Shared instance with the built-in tables.
    #[must_use]
    pub fn standard() -> &'static Compiler {
        static STANDARD: OnceLock<Compiler> = OnceLock::new();
        STANDARD.get_or_init(Compiler::new)
    }

    /// Compile a card, dropping (and logging) rejected abilities.
    #[must_use]
    pub fn compile(&self, record: &CardRecord) -> Vec<AbilityDefinition> {
        self.compile_with_diagnostics(record).abilities
    }

    /// Compile a card and report every rejected candidate.
    #[must_use]
    pub fn compile_with_diagnostics(&self, record: &CardRecord) -> Compilation {
        let blocks: Vec<String> = record.text.iter().map(|block| normalize(block)).collect();
        let mut compilation = Compilation::default();
        let mut next = 0u16;

        for unit in segment(&blocks) {
            for Candidate { id, ability, unmatched } in self.assemble(&unit, record.id, &mut next) {
                match ability {
                    Ok(ability) => {
                        for residue in unmatched {
                            tracing::warn!(
                                card = %record.display_name(),
                                text = %unit.text,
                                %residue,
                                "ability compiled without part of its text"
                            );
                            compilation.unmatched.push(Diagnostic {
                                card: record.id,
                                card_name: record.display_name(),
                                ordinal: id.ordinal,
                                text: unit.text.clone(),
                                error: CompileError::Unmatched { text: residue },
                            });
                        }
                        compilation.abilities.push(ability);
                    }
                    Err(error) => {
                        tracing::warn!(
                            card = %record.display_name(),
                            text = %unit.text,
                            %error,
                            "dropping ability"
                        );
                        compilation.diagnostics.push(Diagnostic {
                            card: record.id,
                            card_name: record.display_name(),
                            ordinal: id.ordinal,
                            text: unit.text.clone(),
                            error,
                        });
                    }
                }
            }
        }

        tracing::debug!(
            card = %record.display_name(),
            abilities = compilation.abilities.len(),
            rejected = compilation.diagnostics.len(),
            unmatched = compilation.unmatched.len(),
            "compiled card"
        );
        compilation
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("patterns", &self.patterns.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::{AbilityCategory, AbilityOrigin, CostToken, Keyword, KeywordValue};
    use crate::cards::{CardCategory, CardId};

    fn compiler() -> Compiler {
        Compiler::try_new().unwrap()
    }

    fn card(blocks: &[&str]) -> CardRecord {
        blocks.iter().fold(
            CardRecord::new(CardId::new(40), "Test Card", CardCategory::Character, 4).with_stats(2, 4, 1),
            |record, block| record.with_text(*block),
        )
    }

    #[test]
    fn test_keyword_values() {
        let compiler = compiler();
        let shift = compiler.compile(&card(&["Shift 4 (You may pay 4 {I} to play this on top of one of your characters named Hades.)"]));
        assert_eq!(shift[0].keyword.as_ref().and_then(|k| k.value.as_ref()), Some(&KeywordValue::Number(4)));

        let singer = compiler.compile(&card(&["Singer 4 (This character counts as cost 4 to sing songs.)"]));
        assert_eq!(singer[0].keyword.as_ref().and_then(|k| k.value.as_ref()), Some(&KeywordValue::Number(4)));

        let text = compiler.compile(&card(&["Shift: Discard a song card (You may discard a song card to play this on top of one of your characters named Ariel.)"]));
        assert!(matches!(
            text[0].keyword.as_ref().and_then(|k| k.value.as_ref()),
            Some(KeywordValue::Text(_))
        ));
    }

    #[test]
    fn test_keyword_and_named_trigger() {
        let abilities = compiler().compile(&card(&[
            "Bodyguard (This character may enter play exerted. An opposing character who challenges one of your characters must choose one with Bodyguard if able.)",
            "HEROISM When this character is banished in a challenge, you may return this card to your hand.",
        ]));
        assert_eq!(abilities.len(), 2);
        assert_eq!(abilities[0].category, AbilityCategory::Static);
        assert!(abilities[0].is_keyword(Keyword::Bodyguard));
        assert_eq!(abilities[1].category, AbilityCategory::Triggered);
        assert_eq!(abilities[1].name.as_deref(), Some("HEROISM"));
        assert!(abilities.iter().all(|a| !a.effects.is_empty()));
    }

    #[test]
    fn test_activated_with_two_costs() {
        let abilities = compiler().compile(&card(&[
            "⟳, Banish one of your other characters — Play a character with the same name as the banished character for free.",
        ]));
        assert_eq!(abilities.len(), 1);
        assert_eq!(abilities[0].category, AbilityCategory::Activated);
        assert_eq!(abilities[0].costs.len(), 2);
        assert_eq!(abilities[0].costs[0], CostToken::ExertSelf);
        assert!(!abilities[0].effects.is_empty());
    }

    #[test]
    fn test_song_reminder_is_static() {
        let song = CardRecord::new(CardId::new(41), "Tune", CardCategory::Action, 3)
            .with_classification("Song")
            .with_text("(A character with cost 3 or more can ⟳ to sing this song for free.)")
            .with_text("Deal 2 damage to chosen character.");
        let abilities = compiler().compile(&song);
        assert_eq!(abilities.len(), 2);
        assert_eq!(abilities[0].category, AbilityCategory::Static);
        assert_eq!(abilities[0].origin, AbilityOrigin::Reminder);
        assert_eq!(abilities[1].origin, AbilityOrigin::Unlabeled);
    }

    #[test]
    fn test_diagnostics_keep_the_rest() {
        let compilation = compiler().compile_with_diagnostics(&card(&[
            "Evasive (Only characters with Evasive can challenge this character.)",
            "STRANGE MAGIC Look at the top 3 cards of your deck and put them back in any order.",
            "ROAR Whenever this character quests, each opponent loses 1 lore.",
        ]));
        assert_eq!(compilation.abilities.len(), 2);
        assert_eq!(compilation.diagnostics.len(), 1);
        let diagnostic = &compilation.diagnostics[0];
        assert_eq!(diagnostic.ordinal, 1);
        assert!(matches!(diagnostic.error, CompileError::NoEffects { .. }));
        assert_eq!(compilation.abilities[1].id.ordinal, 2);
    }

    #[test]
    fn test_partial_compile_is_reported() {
        let compilation = compiler().compile_with_diagnostics(&card(&[
            "ODD JOB Whenever this character quests, draw a card and rearrange the cosmos.",
        ]));
        assert_eq!(compilation.abilities.len(), 1);
        assert!(compilation.diagnostics.is_empty());
        assert_eq!(compilation.unmatched.len(), 1);
        let diagnostic = &compilation.unmatched[0];
        assert_eq!(diagnostic.ordinal, 0);
        assert_eq!(
            diagnostic.error,
            CompileError::Unmatched {
                text: "rearrange the cosmos".to_string()
            }
        );
    }

    #[test]
    fn test_keyword_list_and_idempotence() {
        let compiler = compiler();
        let record = card(&["Evasive, Ward", "Rush (This character can challenge the turn they're played.)"]);
        let first = compiler.compile(&record);
        assert_eq!(first.len(), 3);
        assert_eq!(first.iter().map(|a| a.id.ordinal).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(first, compiler.compile(&record));
    }

    #[test]
    fn test_choose_one_block() {
        let action = CardRecord::new(CardId::new(42), "Pick", CardCategory::Action, 2)
            .with_text("Choose one:\n• Draw 2 cards.\n• Each opponent loses 1 lore.");
        let abilities = compiler().compile(&action);
        assert_eq!(abilities.len(), 1);
        assert_eq!(abilities[0].effects.len(), 1);
    }
}
