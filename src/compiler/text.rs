//! Text normalization.
//!
//! Card data spells its symbols two ways: braced letters (`{E}`) and the
//! printed glyphs (`⟳`). Everything is folded to the braced form so the
//! pattern library only knows one spelling:
//!
//! | Glyph | Braced | Meaning   |
//! |-------|--------|-----------|
//! | ⟳     | `{E}`  | exert     |
//! | ⬡     | `{I}`  | ink       |
//! | ¤     | `{S}`  | strength  |
//! | ⛉     | `{W}`  | willpower |
//! | ◊     | `{L}`  | lore      |
//!
//! Curly quotes become straight quotes, every dash variant used as a
//! separator becomes ` - ` and runs of spaces collapse. Line breaks are
//! kept; the segmenter needs them.

/// Normalize one rules-text block.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '⟳' => out.push_str("{E}"),
            '⬡' => out.push_str("{I}"),
            '¤' => out.push_str("{S}"),
            '⛉' => out.push_str("{W}"),
            '◊' => out.push_str("{L}"),
            '‘' | '’' => out.push('\''),
            '“' | '”' => out.push('"'),
            '—' | '–' => out.push_str(" - "),
            '−' => out.push('-'),
            '\r' => {}
            '\t' | '\u{a0}' => out.push(' '),
            other => out.push(other),
        }
    }
    collapse_spaces(&out)
}

fn collapse_spaces(text: &str) -> String {
    text.lines()
        .map(|line| line.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lowercase for matching. ASCII-only so byte offsets line up with the
/// normalized original.
#[must_use]
pub fn lower(text: &str) -> String {
    text.to_ascii_lowercase()
}

/// Parse a count word: digits, "a"/"an", or a number word up to ten.
#[must_use]
pub fn parse_count(word: &str) -> Option<i64> {
    let word = word.trim();
    if let Ok(n) = word.parse::<i64>() {
        return Some(n);
    }
    let n = match word {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        _ => return None,
    };
    Some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_folded() {
        assert_eq!(normalize("⟳ — Draw a card."), "{E} - Draw a card.");
        assert_eq!(normalize("Shift 5 ⬡"), "Shift 5 {I}");
        assert_eq!(normalize("gets +2 ¤ and +1 ◊"), "gets +2 {S} and +1 {L}");
    }

    #[test]
    fn test_quotes_and_spaces() {
        assert_eq!(normalize("gains “Evasive”  this turn"), "gains \"Evasive\" this turn");
        assert_eq!(normalize("can’t quest"), "can't quest");
        assert_eq!(normalize("Choose one:\r\n\n• Draw"), "Choose one:\n• Draw");
    }

    #[test]
    fn test_lower_keeps_offsets() {
        let text = normalize("Gets +1 ¤ – Naïve");
        assert_eq!(lower(&text).len(), text.len());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("an"), Some(1));
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count("seven"), Some(7));
        assert_eq!(parse_count("many"), None);
    }
}
