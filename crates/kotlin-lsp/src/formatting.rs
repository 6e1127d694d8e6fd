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

//! Whole-document formatting.
//!
//! Strips trailing whitespace from every line, drops trailing blank lines
//! and ends a non-empty document with exactly one newline. The result is a
//! single edit replacing the whole document.

use crate::constants::POSITION_ZERO;
use crate::utils::char_len;
use tower_lsp::lsp_types::{Position, Range, TextEdit};

/// The formatted text.
pub fn format_text(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Formatting edits, or `None` when the document is already formatted.
pub fn format_document(text: &str) -> Option<Vec<TextEdit>> {
    let formatted = format_text(text);
    if formatted == text {
        return None;
    }
    let last = text.rsplit('\n').next().unwrap_or_default();
    let end_line = text.matches('\n').count() as u32;
    Some(vec![TextEdit {
        range: Range {
            start: Position {
                line: POSITION_ZERO,
                character: POSITION_ZERO,
            },
            end: Position {
                line: end_line,
                character: char_len(last) as u32,
            },
        },
        new_text: formatted,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_whitespace_and_newlines() {
        assert_eq!(format_text("val a = 1   \n\tfun f() {}\t\n\n\n"), "val a = 1\n\tfun f() {}\n");
        assert_eq!(format_text("val a = 1"), "val a = 1\n");
        assert_eq!(format_text("\n\n  \n"), "");
    }

    #[test]
    fn test_crlf_normalized() {
        assert_eq!(format_text("a\r\nb\r\n"), "a\nb\n");
    }

    #[test]
    fn test_already_formatted() {
        assert!(format_document("class A\n").is_none());
        assert!(format_document("").is_none());
    }

    #[test]
    fn test_single_whole_document_edit() {
        let edits = format_document("class A  \n\n").unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "class A\n");
        assert_eq!(edits[0].range.start, Position::new(0, 0));
        assert_eq!(edits[0].range.end, Position::new(2, 0));
    }

    #[test]
    fn test_edit_ends_at_last_character() {
        let edits = format_document("val a = 1 ").unwrap();
        assert_eq!(edits[0].range.end, Position::new(0, 10));
    }
}
