//! Segmenter: rules-text blocks to one unit per ability.
//!
//! Boundaries:
//! - a closing parenthesis followed by more text ends a keyword unit
//!   ("Evasive (...) Ward (...)")
//! - an all-caps header followed by sentence text opens a named unit
//! - a parenthetical at the start of a line with no header is a bare
//!   reminder (a song's "can sing this for free")
//! - lines that open nothing new continue the previous named or unlabeled
//!   unit of the same block (bullets of "Choose one:")
//!
//! Keyword lists ("Evasive, Ward") stay one unit here; the keyword
//! recognizer splits them.

use super::keyword;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Keyword,
    Named,
    Reminder,
    Unlabeled,
}

/// One ability-sized piece of normalized text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Header of a named unit.
    pub name: Option<String>,
    /// Text without the header. Reminders keep their parentheses.
    pub text: String,
}

impl Segment {
    fn new(kind: SegmentKind, name: Option<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            name,
            text: text.into(),
        }
    }
}

/// Split normalized blocks into segments.
#[must_use]
pub fn segment(blocks: &[String]) -> Vec<Segment> {
    let mut segments = Vec::new();
    for block in blocks {
        let block_start = segments.len();
        for line in block.lines() {
            for unit in split_reminders(line) {
                push_unit(&mut segments, block_start, unit);
            }
        }
    }
    segments
}

fn push_unit(segments: &mut Vec<Segment>, block_start: usize, unit: &str) {
    let unit = unit.trim();
    if unit.is_empty() {
        return;
    }

    if unit.starts_with('(') {
        segments.push(Segment::new(SegmentKind::Reminder, None, unit));
        return;
    }
    if keyword::recognize(unit).is_some() {
        segments.push(Segment::new(SegmentKind::Keyword, None, unit));
        return;
    }
    if let Some((name, rest)) = split_header(unit) {
        segments.push(Segment::new(SegmentKind::Named, Some(name.to_string()), rest));
        return;
    }

    let continues = segments.len() > block_start
        && segments
            .last()
            .is_some_and(|s| matches!(s.kind, SegmentKind::Named | SegmentKind::Unlabeled));
    match segments.last_mut() {
        Some(previous) if continues => {
            previous.text.push('\n');
            previous.text.push_str(unit);
        }
        _ => segments.push(Segment::new(SegmentKind::Unlabeled, None, unit)),
    }
}

/// Split a line after each top-level closing parenthesis that is followed
/// by more text.
fn split_reminders(line: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in line.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' if depth > 0 => {
                depth -= 1;
                let end = i + ch.len_utf8();
                if depth == 0 && !line[end..].trim().is_empty() {
                    units.push(&line[start..end]);
                    start = end;
                }
            }
            _ => {}
        }
    }
    units.push(&line[start..]);
    units
}

/// Split a leading all-caps header from the sentence text.
///
/// A header word has an uppercase letter, no lowercase letter and is not
/// a braced symbol. Trailing single-letter words ("A", "I") belong to the
/// sentence.
pub(crate) fn split_header(unit: &str) -> Option<(&str, &str)> {
    let mut end = 0;
    let mut words: Vec<(usize, &str)> = Vec::new();
    for (offset, word) in word_offsets(unit) {
        if !is_header_word(word) {
            break;
        }
        words.push((offset, word));
        end = offset + word.len();
    }
    while let Some(&(offset, word)) = words.last() {
        if word.chars().filter(char::is_ascii_alphabetic).count() > 1 {
            break;
        }
        words.pop();
        end = offset;
    }
    if words.is_empty() {
        return None;
    }

    let name = unit[..end].trim();
    let rest = unit[end..].trim();
    if rest.is_empty() {
        return None;
    }
    Some((name, rest))
}

fn word_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split(' ').scan(0, |offset, word| {
        let start = *offset;
        *offset += word.len() + 1;
        Some((start, word))
    })
}

fn is_header_word(word: &str) -> bool {
    !word.starts_with('{')
        && word.chars().any(char::is_uppercase)
        && !word.chars().any(char::is_lowercase)
}
