// Dweve Kotlin LSP - Heuristic Kotlin Language Server
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Position and range utilities.
//!
//! All character offsets used by the analyses are counted in Unicode scalar
//! values of the line, never in bytes, so slicing can not split a multi-byte
//! character. [`PositionMapper`] translates them to and from the encoding
//! negotiated with the client.

use tower_lsp::lsp_types::{Position, PositionEncodingKind, Range};

/// A word found in a line, with char offsets `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl Word {
    /// Range of this word on the given line.
    pub fn range(&self, line: u32) -> Range {
        range_on_line(line, self.start, self.end)
    }
}

/// Identifier characters: alphanumeric or underscore.
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `s` is a syntactically valid identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Number of chars in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Convert a byte offset into a char offset. Offsets inside a multi-byte
/// character round down.
pub fn byte_to_char(s: &str, byte_idx: usize) -> usize {
    s.char_indices().take_while(|(i, _)| *i < byte_idx).count()
}

/// Convert a char offset into a byte offset, clamped to the string length.
pub fn char_to_byte(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// The text of line `line`, without its terminator.
pub fn line_at(text: &str, line: u32) -> Option<&str> {
    text.lines().nth(line as usize)
}

pub fn line_count(text: &str) -> usize {
    text.lines().count()
}

/// A single-line range `[start, end)` in chars.
pub fn range_on_line(line: u32, start: usize, end: usize) -> Range {
    Range {
        start: Position {
            line,
            character: start as u32,
        },
        end: Position {
            line,
            character: end as u32,
        },
    }
}

/// Range covering the whole of `line_text`.
pub fn full_line_range(line: u32, line_text: &str) -> Range {
    range_on_line(line, 0, char_len(line_text))
}

/// Offset of the first non-whitespace char of a line.
pub fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Extract the identifier under or touching the cursor.
///
/// A cursor placed right after the last character of a word still selects
/// that word. Returns `None` past the end of the line or on whitespace and
/// punctuation.
pub fn word_at(line: &str, character: usize) -> Option<Word> {
    let chars: Vec<char> = line.chars().collect();
    if character > chars.len() {
        return None;
    }

    let mut start = character;
    while start > 0 && is_identifier_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = character;
    while end < chars.len() && is_identifier_char(chars[end]) {
        end += 1;
    }

    if start == end {
        return None;
    }
    Some(Word {
        text: chars[start..end].iter().collect(),
        start,
        end,
    })
}

/// Word under the cursor at `position` in `text`.
pub fn word_at_position(text: &str, position: Position) -> Option<Word> {
    let line = line_at(text, position.line)?;
    word_at(line, position.character as usize)
}

/// The maximal run of identifier characters ending at the cursor.
///
/// Returns `None` if the cursor is past the end of the line; an empty string
/// if the character before the cursor is not an identifier character.
pub fn identifier_prefix(line: &str, character: usize) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    if character > chars.len() {
        return None;
    }
    let mut start = character;
    while start > 0 && is_identifier_char(chars[start - 1]) {
        start -= 1;
    }
    Some(chars[start..character].iter().collect())
}

/// Whole-word occurrences of `word` in a single line, as char offsets.
///
/// An occurrence counts only when the characters on both sides are not
/// identifier characters, so `name` does not match inside `userName`.
pub fn find_whole_word(line: &str, word: &str) -> Vec<(usize, usize)> {
    if word.is_empty() {
        return Vec::new();
    }
    let word_chars = char_len(word);
    line.match_indices(word)
        .filter(|(byte_idx, _)| {
            let before = line[..*byte_idx].chars().next_back();
            let after = line[byte_idx + word.len()..].chars().next();
            !before.is_some_and(is_identifier_char) && !after.is_some_and(is_identifier_char)
        })
        .map(|(byte_idx, _)| {
            let start = byte_to_char(line, byte_idx);
            (start, start + word_chars)
        })
        .collect()
}

/// Whole-word occurrences of `word` across the document, in document order.
pub fn find_word_occurrences(text: &str, word: &str) -> Vec<Range> {
    text.lines()
        .enumerate()
        .flat_map(|(line_idx, line)| {
            find_whole_word(line, word)
                .into_iter()
                .map(move |(start, end)| range_on_line(line_idx as u32, start, end))
        })
        .collect()
}

/// Whether `position` lies within the document's lines.
pub fn position_in_document(text: &str, position: Position) -> bool {
    line_at(text, position.line)
        .is_some_and(|line| position.character as usize <= char_len(line))
}

/// Unit in which the client counts `Position::character`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionEncoding {
    /// UTF-16 code units, the protocol default.
    #[default]
    Utf16,
    /// Unicode scalar values, the unit the analyses use.
    Utf32,
}

impl PositionEncoding {
    /// Pick UTF-32 when the client offers it, UTF-16 otherwise.
    pub fn negotiate(offered: Option<&[PositionEncodingKind]>) -> Self {
        match offered {
            Some(kinds) if kinds.contains(&PositionEncodingKind::UTF32) => Self::Utf32,
            _ => Self::Utf16,
        }
    }

    pub fn kind(self) -> PositionEncodingKind {
        match self {
            Self::Utf16 => PositionEncodingKind::UTF16,
            Self::Utf32 => PositionEncodingKind::UTF32,
        }
    }
}

/// UTF-16 column of char offset `col`. Offsets past the end of the line keep
/// their distance from it.
pub fn char_to_utf16(line: &str, col: usize) -> usize {
    let len = char_len(line);
    let within: usize = line.chars().take(col).map(char::len_utf16).sum();
    within + col.saturating_sub(len)
}

/// Char offset of UTF-16 column `col`. A column inside a surrogate pair
/// rounds down; columns past the end keep their distance from it.
pub fn utf16_to_char(line: &str, col: usize) -> usize {
    let mut units = 0;
    for (idx, c) in line.chars().enumerate() {
        let next = units + c.len_utf16();
        if next > col {
            return idx;
        }
        units = next;
    }
    char_len(line) + col.saturating_sub(units)
}

/// Translates positions of one document between the client encoding and
/// char offsets.
pub struct PositionMapper<'a> {
    lines: Vec<&'a str>,
    encoding: PositionEncoding,
}

impl<'a> PositionMapper<'a> {
    pub fn new(text: &'a str, encoding: PositionEncoding) -> Self {
        let lines = match encoding {
            PositionEncoding::Utf16 => text.lines().collect(),
            PositionEncoding::Utf32 => Vec::new(),
        };
        Self { lines, encoding }
    }

    fn line(&self, line: u32) -> Option<&'a str> {
        self.lines.get(line as usize).copied()
    }

    /// Client position to char position.
    pub fn to_chars(&self, position: Position) -> Position {
        match (self.encoding, self.line(position.line)) {
            (PositionEncoding::Utf16, Some(line)) => Position::new(
                position.line,
                utf16_to_char(line, position.character as usize) as u32,
            ),
            _ => position,
        }
    }

    /// Char position to client position.
    pub fn from_chars(&self, position: Position) -> Position {
        match (self.encoding, self.line(position.line)) {
            (PositionEncoding::Utf16, Some(line)) => Position::new(
                position.line,
                char_to_utf16(line, position.character as usize) as u32,
            ),
            _ => position,
        }
    }

    pub fn range_to_chars(&self, range: Range) -> Range {
        Range::new(self.to_chars(range.start), self.to_chars(range.end))
    }

    pub fn range_from_chars(&self, range: Range) -> Range {
        Range::new(self.from_chars(range.start), self.from_chars(range.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifier() {
        assert!(is_valid_identifier("foo"));
        assert!(is_valid_identifier("_bar9"));
        assert!(is_valid_identifier("CamelCase"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("9lives"));
        assert!(!is_valid_identifier("has-dash"));
        assert!(!is_valid_identifier("two words"));
    }

    #[test]
    fn test_word_at() {
        let line = "    val userName = name";
        let word = word_at(line, 10).unwrap();
        assert_eq!(word.text, "userName");
        assert_eq!((word.start, word.end), (8, 16));

        // Cursor right after the word.
        assert_eq!(word_at(line, 16).unwrap().text, "userName");
        // Cursor at end of line.
        assert_eq!(word_at(line, 23).unwrap().text, "name");
        // Whitespace between words.
        assert!(word_at(line, 2).is_none());
        // Past the end.
        assert!(word_at(line, 24).is_none());
    }

    #[test]
    fn test_word_at_multibyte() {
        let line = "val é = größe";
        let word = word_at(line, 9).unwrap();
        assert_eq!(word.text, "größe");
        assert_eq!((word.start, word.end), (8, 13));
    }

    #[test]
    fn test_identifier_prefix() {
        assert_eq!(identifier_prefix("    prin", 8).unwrap(), "prin");
        assert_eq!(identifier_prefix("foo.ba", 6).unwrap(), "ba");
        assert_eq!(identifier_prefix("foo.", 4).unwrap(), "");
        assert_eq!(identifier_prefix("abc", 1).unwrap(), "a");
        assert!(identifier_prefix("abc", 4).is_none());
    }

    #[test]
    fn test_find_whole_word() {
        let line = "name + userName + name_2 + (name)";
        assert_eq!(find_whole_word(line, "name"), vec![(0, 4), (28, 32)]);
        assert!(find_whole_word(line, "").is_empty());
    }

    #[test]
    fn test_find_word_occurrences() {
        let text = "fun greet(name: String) {\n    println(name)\n}\n";
        let ranges = find_word_occurrences(text, "name");
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], range_on_line(0, 10, 14));
        assert_eq!(ranges[1], range_on_line(1, 12, 16));
    }

    #[test]
    fn test_byte_char_conversions() {
        let s = "aé b";
        assert_eq!(byte_to_char(s, 3), 2);
        assert_eq!(char_to_byte(s, 2), 3);
        assert_eq!(char_to_byte(s, 10), s.len());
    }

    #[test]
    fn test_position_in_document() {
        let text = "ab\ncde\n";
        assert!(position_in_document(text, Position::new(1, 3)));
        assert!(!position_in_document(text, Position::new(1, 4)));
        assert!(!position_in_document(text, Position::new(2, 0)));
    }

    #[test]
    fn test_utf16_columns() {
        let line = "val s = \"😀\"; val count = 1";
        // The emoji is one char but two UTF-16 units.
        assert_eq!(char_to_utf16(line, 17), 18);
        assert_eq!(utf16_to_char(line, 18), 17);
        // Inside the surrogate pair.
        assert_eq!(utf16_to_char(line, 10), 9);
        // Past the end of the line.
        assert_eq!(char_to_utf16("ab", 4), 4);
        assert_eq!(utf16_to_char("😀", 5), 4);
    }

    #[test]
    fn test_position_mapper() {
        let text = "val s = \"😀\"; val count = 1\nval t = 2\n";
        let mapper = PositionMapper::new(text, PositionEncoding::Utf16);
        assert_eq!(mapper.from_chars(Position::new(0, 17)), Position::new(0, 18));
        assert_eq!(mapper.to_chars(Position::new(0, 18)), Position::new(0, 17));
        assert_eq!(mapper.from_chars(Position::new(1, 4)), Position::new(1, 4));
        // Lines past the end are left alone.
        assert_eq!(mapper.to_chars(Position::new(9, 3)), Position::new(9, 3));

        let utf32 = PositionMapper::new(text, PositionEncoding::Utf32);
        assert_eq!(utf32.from_chars(Position::new(0, 17)), Position::new(0, 17));
    }

    #[test]
    fn test_negotiate_encoding() {
        assert_eq!(PositionEncoding::negotiate(None), PositionEncoding::Utf16);
        let offered = vec![PositionEncodingKind::UTF16, PositionEncodingKind::UTF32];
        assert_eq!(
            PositionEncoding::negotiate(Some(offered.as_slice())),
            PositionEncoding::Utf32
        );
        let offered = vec![PositionEncodingKind::UTF8];
        assert_eq!(
            PositionEncoding::negotiate(Some(offered.as_slice())),
            PositionEncoding::Utf16
        );
    }
}
