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

//! Semantic highlighting.
//!
//! Every line is scanned independently for comments, reserved words and
//! built-in types, declaration names and literals. Block comment state is
//! the only thing carried from one line to the next. Candidates of a line
//! are sorted by start character; a candidate starting inside an earlier
//! accepted token is dropped, so a keyword inside a string or a comment is
//! not highlighted twice.
//!
//! The stream uses the usual LSP delta encoding: five integers per token,
//! `(deltaLine, deltaStart, length, tokenType, tokenModifiers)`. Starts and
//! lengths are converted to the negotiated position encoding before
//! encoding.

use crate::analysis::{extract_declaration, extract_literals, DeclarationKind, LiteralKind};
use crate::patterns::{is_builtin_type, is_keyword, is_modifier};
use crate::utils::{char_to_utf16, is_identifier_char, PositionEncoding};
use tower_lsp::lsp_types::*;
use tracing::debug;

/// Token types in legend order.
pub const SEMANTIC_TOKEN_TYPES: &[SemanticTokenType] = &[
    SemanticTokenType::KEYWORD,
    SemanticTokenType::MODIFIER,
    SemanticTokenType::TYPE,
    SemanticTokenType::CLASS,
    SemanticTokenType::INTERFACE,
    SemanticTokenType::ENUM,
    SemanticTokenType::FUNCTION,
    SemanticTokenType::PROPERTY,
    SemanticTokenType::STRING,
    SemanticTokenType::NUMBER,
    SemanticTokenType::COMMENT,
];

/// Token modifiers in legend order; modifier `i` is bit `1 << i`.
pub const SEMANTIC_TOKEN_MODIFIERS: &[SemanticTokenModifier] = &[
    SemanticTokenModifier::DECLARATION,
    SemanticTokenModifier::READONLY,
    SemanticTokenModifier::ABSTRACT,
    SemanticTokenModifier::ASYNC,
    SemanticTokenModifier::DOCUMENTATION,
    SemanticTokenModifier::DEFAULT_LIBRARY,
];

/// Indices into [`SEMANTIC_TOKEN_TYPES`].
pub mod token_types {
    pub const KEYWORD: u32 = 0;
    pub const MODIFIER: u32 = 1;
    pub const TYPE: u32 = 2;
    pub const CLASS: u32 = 3;
    pub const INTERFACE: u32 = 4;
    pub const ENUM: u32 = 5;
    pub const FUNCTION: u32 = 6;
    pub const PROPERTY: u32 = 7;
    pub const STRING: u32 = 8;
    pub const NUMBER: u32 = 9;
    pub const COMMENT: u32 = 10;
}

/// Bits of [`SEMANTIC_TOKEN_MODIFIERS`].
pub mod modifier_bits {
    pub const DECLARATION: u32 = 1 << 0;
    pub const READONLY: u32 = 1 << 1;
    pub const ABSTRACT: u32 = 1 << 2;
    pub const ASYNC: u32 = 1 << 3;
    pub const DOCUMENTATION: u32 = 1 << 4;
    pub const DEFAULT_LIBRARY: u32 = 1 << 5;
}

pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: SEMANTIC_TOKEN_TYPES.to_vec(),
        token_modifiers: SEMANTIC_TOKEN_MODIFIERS.to_vec(),
    }
}

/// A token at an absolute position, before delta encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsoluteToken {
    pub line: u32,
    pub start: u32,
    pub length: u32,
    pub token_type: u32,
    pub modifiers: u32,
}

impl AbsoluteToken {
    fn new(line: u32, start: usize, end: usize, token_type: u32, modifiers: u32) -> Self {
        Self {
            line,
            start: start as u32,
            length: end.saturating_sub(start) as u32,
            token_type,
            modifiers,
        }
    }

    fn end(&self) -> u32 {
        self.start + self.length
    }
}

/// Open block comment carried across lines; `true` for KDoc.
type BlockState = Option<bool>;

fn find_seq(chars: &[char], from: usize, needle: &[char]) -> Option<usize> {
    if from >= chars.len() {
        return None;
    }
    chars[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn comment_tokens(line_idx: u32, chars: &[char], state: &mut BlockState) -> Vec<AbsoluteToken> {
    let mut tokens = Vec::new();
    let mut push = |start: usize, end: usize, doc: bool| {
        if end > start {
            let modifiers = if doc { modifier_bits::DOCUMENTATION } else { 0 };
            tokens.push(AbsoluteToken::new(line_idx, start, end, token_types::COMMENT, modifiers));
        }
    };

    let mut pos = 0;
    while pos <= chars.len() {
        if let Some(doc) = *state {
            match find_seq(chars, pos, &['*', '/']) {
                Some(close) => {
                    push(pos, close + 2, doc);
                    *state = None;
                    pos = close + 2;
                }
                None => {
                    push(pos, chars.len(), doc);
                    break;
                }
            }
            continue;
        }

        let line_comment = find_seq(chars, pos, &['/', '/']);
        let block_open = find_seq(chars, pos, &['/', '*']);
        match (line_comment, block_open) {
            (Some(lc), bo) if bo.map_or(true, |b| lc < b) => {
                push(lc, chars.len(), false);
                break;
            }
            (_, Some(open)) => {
                let doc = chars.get(open + 2) == Some(&'*') && chars.get(open + 3) != Some(&'/');
                match find_seq(chars, open + 2, &['*', '/']) {
                    Some(close) => {
                        push(open, close + 2, doc);
                        pos = close + 2;
                    }
                    None => {
                        push(open, chars.len(), doc);
                        *state = Some(doc);
                        break;
                    }
                }
            }
            _ => break,
        }
    }
    tokens
}

fn word_tokens(line_idx: u32, chars: &[char]) -> Vec<AbsoluteToken> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if !is_identifier_char(chars[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len() && is_identifier_char(chars[i]) {
            i += 1;
        }
        if chars[start].is_ascii_digit() || (start > 0 && chars[start - 1] == '.') {
            continue;
        }
        let word: String = chars[start..i].iter().collect();
        let classified = if is_keyword(&word) {
            Some((token_types::KEYWORD, 0))
        } else if is_modifier(&word) {
            Some((token_types::MODIFIER, 0))
        } else if is_builtin_type(&word) {
            Some((token_types::TYPE, modifier_bits::DEFAULT_LIBRARY))
        } else {
            None
        };
        if let Some((token_type, modifiers)) = classified {
            tokens.push(AbsoluteToken::new(line_idx, start, i, token_type, modifiers));
        }
    }
    tokens
}

fn declaration_token(line_idx: u32, line: &str) -> Option<AbsoluteToken> {
    let decl = extract_declaration(line_idx, line)?;
    let token_type = match decl.kind {
        DeclarationKind::Class | DeclarationKind::Object => token_types::CLASS,
        DeclarationKind::Interface => token_types::INTERFACE,
        DeclarationKind::Enum => token_types::ENUM,
        DeclarationKind::Function => token_types::FUNCTION,
        DeclarationKind::Property => token_types::PROPERTY,
    };
    let mut modifiers = modifier_bits::DECLARATION;
    if decl.kind == DeclarationKind::Property && !decl.mutable {
        modifiers |= modifier_bits::READONLY;
    }
    for modifier in &decl.modifiers {
        match modifier.as_str() {
            "abstract" => modifiers |= modifier_bits::ABSTRACT,
            "suspend" => modifiers |= modifier_bits::ASYNC,
            _ => {}
        }
    }
    Some(AbsoluteToken::new(
        line_idx,
        decl.selection_range.start.character as usize,
        decl.selection_range.end.character as usize,
        token_type,
        modifiers,
    ))
}

fn literal_tokens(line_idx: u32, line: &str) -> Vec<AbsoluteToken> {
    extract_literals(line)
        .into_iter()
        .map(|lit| {
            let token_type = match lit.kind {
                LiteralKind::String => token_types::STRING,
                LiteralKind::Number => token_types::NUMBER,
            };
            AbsoluteToken::new(line_idx, lit.start, lit.end, token_type, 0)
        })
        .collect()
}

/// Tokens of one line, sorted by start and free of overlaps.
fn scan_line(line_idx: u32, line: &str, state: &mut BlockState) -> Vec<AbsoluteToken> {
    let chars: Vec<char> = line.chars().collect();
    let mut candidates = comment_tokens(line_idx, &chars, state);
    candidates.extend(word_tokens(line_idx, &chars));
    candidates.extend(declaration_token(line_idx, line));
    candidates.extend(literal_tokens(line_idx, line));

    // Longer first on equal start; comments and strings then shadow what
    // they contain.
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.length.cmp(&a.length)));

    let mut accepted: Vec<AbsoluteToken> = Vec::with_capacity(candidates.len());
    for token in candidates {
        if token.length == 0 {
            continue;
        }
        if accepted.last().is_some_and(|prev| token.start < prev.end()) {
            continue;
        }
        accepted.push(token);
    }
    accepted
}

/// Absolute tokens of the whole document, sorted by `(line, start)`.
pub fn scan_document(text: &str) -> Vec<AbsoluteToken> {
    let mut state: BlockState = None;
    text.lines()
        .enumerate()
        .flat_map(|(idx, line)| scan_line(idx as u32, line, &mut state))
        .collect()
}

/// Delta-encode sorted tokens. The first token's line is taken relative to
/// `base_line`.
pub fn encode_tokens(tokens: &[AbsoluteToken], base_line: u32) -> Vec<SemanticToken> {
    let mut prev_line = base_line;
    let mut prev_start = 0u32;
    tokens
        .iter()
        .map(|token| {
            let delta_line = token.line.saturating_sub(prev_line);
            let delta_start = if delta_line == 0 {
                token.start.saturating_sub(prev_start)
            } else {
                token.start
            };
            prev_line = token.line;
            prev_start = token.start;
            SemanticToken {
                delta_line,
                delta_start,
                length: token.length,
                token_type: token.token_type,
                token_modifiers_bitset: token.modifiers,
            }
        })
        .collect()
}

/// Inverse of [`encode_tokens`] for the same `base_line`.
pub fn decode_tokens(data: &[SemanticToken], base_line: u32) -> Vec<AbsoluteToken> {
    let mut line = base_line;
    let mut start = 0u32;
    data.iter()
        .map(|token| {
            if token.delta_line == 0 {
                start += token.delta_start;
            } else {
                line += token.delta_line;
                start = token.delta_start;
            }
            AbsoluteToken {
                line,
                start,
                length: token.length,
                token_type: token.token_type,
                modifiers: token.token_modifiers_bitset,
            }
        })
        .collect()
}

/// Re-express char columns in the client encoding.
pub fn to_encoding(tokens: Vec<AbsoluteToken>, text: &str, encoding: PositionEncoding) -> Vec<AbsoluteToken> {
    if encoding == PositionEncoding::Utf32 {
        return tokens;
    }
    let lines: Vec<&str> = text.lines().collect();
    tokens
        .into_iter()
        .map(|token| {
            let line = lines.get(token.line as usize).copied().unwrap_or_default();
            let start = char_to_utf16(line, token.start as usize);
            let end = char_to_utf16(line, token.end() as usize);
            AbsoluteToken {
                start: start as u32,
                length: (end - start) as u32,
                ..token
            }
        })
        .collect()
}

pub fn get_semantic_tokens_full(text: &str, encoding: PositionEncoding) -> SemanticTokens {
    let tokens = to_encoding(scan_document(text), text, encoding);
    debug!("Encoding {} semantic tokens", tokens.len());
    SemanticTokens {
        result_id: None,
        data: encode_tokens(&tokens, 0),
    }
}

/// Tokens on lines `range.start.line..=range.end.line`, with deltas starting
/// from `range.start.line`.
pub fn get_semantic_tokens_range(
    text: &str,
    range: Range,
    encoding: PositionEncoding,
) -> SemanticTokens {
    let first = range.start.line;
    let last = range.end.line.max(first);
    let tokens: Vec<AbsoluteToken> = scan_document(text)
        .into_iter()
        .filter(|t| t.line >= first && t.line <= last)
        .collect();
    SemanticTokens {
        result_id: None,
        data: encode_tokens(&to_encoding(tokens, text, encoding), first),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types_on(tokens: &[AbsoluteToken], line: u32) -> Vec<(u32, u32, u32)> {
        tokens
            .iter()
            .filter(|t| t.line == line)
            .map(|t| (t.start, t.length, t.token_type))
            .collect()
    }

    #[test]
    fn test_legend_indices() {
        assert_eq!(SEMANTIC_TOKEN_TYPES[token_types::KEYWORD as usize], SemanticTokenType::KEYWORD);
        assert_eq!(SEMANTIC_TOKEN_TYPES[token_types::COMMENT as usize], SemanticTokenType::COMMENT);
        assert_eq!(SEMANTIC_TOKEN_TYPES[token_types::PROPERTY as usize], SemanticTokenType::PROPERTY);
        assert_eq!(
            SEMANTIC_TOKEN_MODIFIERS[modifier_bits::DOCUMENTATION.trailing_zeros() as usize],
            SemanticTokenModifier::DOCUMENTATION
        );
        assert_eq!(legend().token_types.len(), SEMANTIC_TOKEN_TYPES.len());
    }

    #[test]
    fn test_declaration_line() {
        let tokens = scan_document("val answer: Int = 42 // the answer\n");
        assert_eq!(
            types_on(&tokens, 0),
            vec![
                (0, 3, token_types::KEYWORD),
                (4, 6, token_types::PROPERTY),
                (12, 3, token_types::TYPE),
                (18, 2, token_types::NUMBER),
                (21, 13, token_types::COMMENT),
            ]
        );
        assert_eq!(tokens[1].modifiers, modifier_bits::DECLARATION | modifier_bits::READONLY);
    }

    #[test]
    fn test_keyword_inside_string_is_shadowed() {
        let tokens = scan_document("println(\"val 1\")\n");
        assert_eq!(types_on(&tokens, 0), vec![(8, 7, token_types::STRING)]);
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let text = "/**\n * Docs for val\n */\nfun f() {}\n";
        let tokens = scan_document(text);
        assert_eq!(types_on(&tokens, 0), vec![(0, 3, token_types::COMMENT)]);
        assert_eq!(types_on(&tokens, 1), vec![(0, 15, token_types::COMMENT)]);
        assert_eq!(types_on(&tokens, 2), vec![(0, 3, token_types::COMMENT)]);
        assert!(tokens[..3].iter().all(|t| t.modifiers == modifier_bits::DOCUMENTATION));
        assert_eq!(
            types_on(&tokens, 3),
            vec![(0, 3, token_types::KEYWORD), (4, 1, token_types::FUNCTION)]
        );
    }

    #[test]
    fn test_inline_block_comment() {
        let tokens = scan_document("val /* x */ y = 1\n");
        assert_eq!(types_on(&tokens, 0)[1], (4, 7, token_types::COMMENT));
    }

    #[test]
    fn test_sorted_by_line_and_start() {
        let text = "package demo\n\nclass A {\n    suspend fun run(): Unit {}\n}\n";
        let tokens = scan_document(text);
        assert!(tokens
            .windows(2)
            .all(|w| (w[0].line, w[0].start) < (w[1].line, w[1].start)));
        let run = tokens
            .iter()
            .find(|t| t.token_type == token_types::FUNCTION)
            .unwrap();
        assert_eq!(run.modifiers, modifier_bits::DECLARATION | modifier_bits::ASYNC);
    }

    #[test]
    fn test_encode_deltas() {
        let tokens = vec![
            AbsoluteToken { line: 1, start: 4, length: 3, token_type: 0, modifiers: 0 },
            AbsoluteToken { line: 1, start: 10, length: 2, token_type: 1, modifiers: 0 },
            AbsoluteToken { line: 3, start: 2, length: 1, token_type: 2, modifiers: 1 },
        ];
        let data = encode_tokens(&tokens, 0);
        let flat: Vec<(u32, u32)> = data.iter().map(|t| (t.delta_line, t.delta_start)).collect();
        assert_eq!(flat, vec![(1, 4), (0, 6), (2, 2)]);
        assert_eq!(decode_tokens(&data, 0), tokens);
    }

    #[test]
    fn test_range_uses_first_line_as_baseline() {
        let text = "val a = 1\nval b = 2\nval c = 3\n";
        let result = get_semantic_tokens_range(
            text,
            Range::new(Position::new(1, 0), Position::new(1, 9)),
            PositionEncoding::Utf32,
        );
        assert_eq!(result.data[0].delta_line, 0);
        let decoded = decode_tokens(&result.data, 1);
        assert!(decoded.iter().all(|t| t.line == 1));
        assert_eq!(decoded.len(), 3);
    }

    #[test]
    fn test_range_beyond_document() {
        let result = get_semantic_tokens_range(
            "val a = 1\n",
            Range::new(Position::new(5, 0), Position::new(9, 0)),
            PositionEncoding::Utf16,
        );
        assert!(result.data.is_empty());
    }

    #[test]
    fn test_columns_follow_client_encoding() {
        let text = "val s = \"😀\"; val count = 1\n";
        let starts = |encoding| {
            let data = get_semantic_tokens_full(text, encoding).data;
            decode_tokens(&data, 0)
                .into_iter()
                .map(|t| (t.token_type, t.start, t.length))
                .collect::<Vec<_>>()
        };

        let utf16 = starts(PositionEncoding::Utf16);
        assert!(utf16.contains(&(token_types::STRING, 8, 4)));
        assert!(utf16.contains(&(token_types::KEYWORD, 14, 3)));
        assert!(utf16.contains(&(token_types::NUMBER, 26, 1)));

        let utf32 = starts(PositionEncoding::Utf32);
        assert!(utf32.contains(&(token_types::STRING, 8, 3)));
        assert!(utf32.contains(&(token_types::KEYWORD, 13, 3)));
    }
}
