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

//! Hover information.
//!
//! The word under the cursor is resolved in a fixed order, first match wins:
//!
//! 1. reserved word with a static description,
//! 2. function declared in the document,
//! 3. class, interface, object or enum declared in the document,
//! 4. property declared in the document.
//!
//! Declarations render as a `kotlin` code block holding the signature,
//! followed by their KDoc when one is attached.

use crate::analysis::{extract_declarations, Declaration, DeclarationKind};
use crate::documentation::documentation_for;
use crate::patterns::keyword_doc;
use crate::utils::{line_at, word_at};
use tower_lsp::lsp_types::*;
use tracing::debug;

/// Get hover information for a position.
///
/// Returns `None` past the end of the document, on whitespace and
/// punctuation, and for words nothing is known about.
pub fn get_hover(text: &str, position: Position) -> Option<Hover> {
    let line = line_at(text, position.line)?;
    let word = word_at(line, position.character as usize)?;

    let value = if let Some(description) = keyword_doc(&word.text) {
        keyword_hover(&word.text, description)
    } else {
        let declarations = extract_declarations(text);
        let decl = find_declaration(&declarations, &word.text)?;
        debug!(
            "Hover on '{}' resolved to {} at line {}",
            word.text,
            decl.kind.label(),
            decl.line
        );
        declaration_hover(text, decl)
    };

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(word.range(position.line)),
    })
}

/// Resolve `name` against declarations: functions first, then type-like
/// declarations, then properties.
pub fn find_declaration<'a>(declarations: &'a [Declaration], name: &str) -> Option<&'a Declaration> {
    let by = |pred: fn(DeclarationKind) -> bool| {
        declarations
            .iter()
            .find(|d| d.name == name && pred(d.kind))
    };
    by(|k| k == DeclarationKind::Function)
        .or_else(|| by(DeclarationKind::is_type_like))
        .or_else(|| by(|k| k == DeclarationKind::Property))
}

fn keyword_hover(word: &str, description: &str) -> String {
    format!("**{}** *(keyword)*\n\n---\n\n{}", word, description)
}

/// Markdown for a declaration: signature block, then documentation.
pub fn declaration_hover(text: &str, decl: &Declaration) -> String {
    let mut value = format!("```kotlin\n{}\n```", decl.render_signature());
    if let Some(doc) = documentation_for(text, decl) {
        value.push_str("\n\n---\n\n");
        value.push_str(&doc);
    }
    value
}
