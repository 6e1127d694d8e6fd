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

//! Structural extraction for Kotlin sources.
//!
//! This module turns raw text into typed facts:
//! - Declarations (classes, interfaces, objects, enums, functions,
//!   properties) with their name ranges, modifiers and signature parts
//! - String, character and numeric literals per line
//!
//! Nothing here is cached. Callers run the extractors on the snapshot they
//! are answering a request for and drop the results afterwards.
//!
//! # Limitations
//!
//! Matching is line based and not grammar aware. A declaration-looking line
//! inside a raw string is reported as a declaration, and literals inside
//! comments are still reported as literals.

use crate::patterns::{
    is_modifier, CLASS_DECL, FUNCTION_DECL, INTERFACE_DECL, NUMBER_LITERAL, OBJECT_DECL,
    PROPERTY_DECL, RETURN_TYPE, STRING_LITERAL,
};
use crate::utils::{byte_to_char, char_len, full_line_range, indentation, range_on_line};
use regex::Captures;
use tower_lsp::lsp_types::Range;
use tracing::debug;

/// Kind of a recognized declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Class,
    Interface,
    Function,
    Property,
    Object,
    Enum,
}

impl DeclarationKind {
    /// Lowercase label used in messages and markup.
    pub fn label(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::Property => "property",
            Self::Object => "object",
            Self::Enum => "enum",
        }
    }

    /// Classes, interfaces, objects and enums.
    pub fn is_type_like(self) -> bool {
        matches!(
            self,
            Self::Class | Self::Interface | Self::Object | Self::Enum
        )
    }
}

/// A recognized definition site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    /// Zero-based line of the declaration.
    pub line: u32,
    /// The whole line.
    pub range: Range,
    /// The name only.
    pub selection_range: Range,
    /// Modifier keywords in source order (`private`, `data`, `suspend`, ...).
    pub modifiers: Vec<String>,
    /// The trimmed source line.
    pub signature: String,
    /// Parameter list text of a function, without parentheses.
    pub parameters: Option<String>,
    /// Return type of a function, or declared type of a property.
    pub type_annotation: Option<String>,
    /// `var` properties.
    pub mutable: bool,
}

impl Declaration {
    /// Canonical one-line signature, e.g. `fun greet(name: String): String`.
    pub fn render_signature(&self) -> String {
        let mut out = String::new();
        for modifier in &self.modifiers {
            out.push_str(modifier);
            out.push(' ');
        }
        match self.kind {
            DeclarationKind::Class | DeclarationKind::Enum => {
                out.push_str("class ");
                out.push_str(&self.name);
            }
            DeclarationKind::Interface => {
                out.push_str("interface ");
                out.push_str(&self.name);
            }
            DeclarationKind::Object => {
                out.push_str("object ");
                out.push_str(&self.name);
            }
            DeclarationKind::Function => {
                out.push_str("fun ");
                out.push_str(&self.name);
                out.push('(');
                out.push_str(self.parameters.as_deref().unwrap_or("").trim());
                out.push(')');
                if let Some(ret) = &self.type_annotation {
                    out.push_str(": ");
                    out.push_str(ret);
                }
            }
            DeclarationKind::Property => {
                out.push_str(if self.mutable { "var " } else { "val " });
                out.push_str(&self.name);
                if let Some(ty) = &self.type_annotation {
                    out.push_str(": ");
                    out.push_str(ty);
                }
            }
        }
        out
    }
}

fn captured_modifiers(caps: &Captures<'_>) -> Vec<String> {
    caps.get(1)
        .map(|m| {
            m.as_str()
                .split_whitespace()
                .filter(|w| is_modifier(w))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Try to recognize a declaration on one line.
///
/// Patterns are tried in priority order: class-like (class, enum, object),
/// interface, function, property. At most one declaration is produced.
pub fn extract_declaration(line_idx: u32, line: &str) -> Option<Declaration> {
    let leading = indentation(line);
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let build = |kind: DeclarationKind, caps: &Captures<'_>, name_group: usize| {
        let name_match = caps.get(name_group)?;
        let start = leading + byte_to_char(trimmed, name_match.start());
        let end = start + char_len(name_match.as_str());
        Some(Declaration {
            name: name_match.as_str().to_string(),
            kind,
            line: line_idx,
            range: full_line_range(line_idx, line),
            selection_range: range_on_line(line_idx, start, end),
            modifiers: captured_modifiers(caps),
            signature: trimmed.to_string(),
            parameters: None,
            type_annotation: None,
            mutable: false,
        })
    };

    if let Some(caps) = CLASS_DECL.captures(trimmed) {
        let mut decl = build(DeclarationKind::Class, &caps, 2)?;
        if decl.modifiers.iter().any(|m| m == "enum") {
            decl.kind = DeclarationKind::Enum;
        }
        return Some(decl);
    }
    if let Some(caps) = OBJECT_DECL.captures(trimmed) {
        return build(DeclarationKind::Object, &caps, 2);
    }
    if let Some(caps) = INTERFACE_DECL.captures(trimmed) {
        return build(DeclarationKind::Interface, &caps, 2);
    }
    if let Some(caps) = FUNCTION_DECL.captures(trimmed) {
        let mut decl = build(DeclarationKind::Function, &caps, 2)?;
        decl.parameters = Some(caps.get(3).map_or("", |m| m.as_str()).trim().to_string());
        if let Some(close) = caps.get(4) {
            decl.type_annotation = RETURN_TYPE
                .captures(&trimmed[close.end()..])
                .and_then(|c| c.get(1))
                .and_then(|m| non_empty(m.as_str()));
        }
        return Some(decl);
    }
    if let Some(caps) = PROPERTY_DECL.captures(trimmed) {
        let mut decl = build(DeclarationKind::Property, &caps, 3)?;
        decl.mutable = caps.get(2).is_some_and(|m| m.as_str() == "var");
        decl.type_annotation = caps.get(4).and_then(|m| non_empty(m.as_str()));
        return Some(decl);
    }
    None
}

/// Every declaration in the document, in line order.
pub fn extract_declarations(text: &str) -> Vec<Declaration> {
    let declarations: Vec<Declaration> = text
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| extract_declaration(idx as u32, line))
        .collect();
    debug!("Extracted {} declarations", declarations.len());
    declarations
}

/// Kind of a literal span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Number,
}

/// A literal within one line, `[start, end)` in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralSpan {
    pub kind: LiteralKind,
    pub start: usize,
    pub end: usize,
}

/// String, character and numeric literals of a line.
///
/// Numbers inside string literals are not reported. Comment state is not
/// consulted.
pub fn extract_literals(line: &str) -> Vec<LiteralSpan> {
    let mut spans: Vec<LiteralSpan> = STRING_LITERAL
        .find_iter(line)
        .map(|m| LiteralSpan {
            kind: LiteralKind::String,
            start: byte_to_char(line, m.start()),
            end: byte_to_char(line, m.end()),
        })
        .collect();

    let numbers: Vec<LiteralSpan> = NUMBER_LITERAL
        .find_iter(line)
        .map(|m| LiteralSpan {
            kind: LiteralKind::Number,
            start: byte_to_char(line, m.start()),
            end: byte_to_char(line, m.end()),
        })
        .filter(|n| !spans.iter().any(|s| n.start >= s.start && n.start < s.end))
        .collect();

    spans.extend(numbers);
    spans.sort_by_key(|s| s.start);
    spans
}
