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

//! Definitions and references.
//!
//! Both work on the word under the cursor and scan the document in line
//! order. References are every whole-word occurrence, declaration site
//! included. The definition is the first line whose trimmed text matches a
//! class-like, function or property declaration of exactly that name.

use crate::analysis::DeclarationKind;
use crate::patterns::{declaration_of_kind, function_declaration, property_declaration};
use crate::utils::{find_whole_word, find_word_occurrences, range_on_line, word_at_position};
use tower_lsp::lsp_types::{Location, Position, Url};
use tracing::debug;

/// All whole-word occurrences of the word at `position`.
pub fn find_references(uri: &Url, text: &str, position: Position) -> Vec<Location> {
    let Some(word) = word_at_position(text, position) else {
        return Vec::new();
    };
    let locations: Vec<Location> = find_word_occurrences(text, &word.text)
        .into_iter()
        .map(|range| Location::new(uri.clone(), range))
        .collect();
    debug!("Found {} references to '{}'", locations.len(), word.text);
    locations
}

/// The declaration site of the word at `position`.
///
/// The returned range covers the declared name on the matching line.
pub fn find_definition(uri: &Url, text: &str, position: Position) -> Option<Location> {
    let word = word_at_position(text, position)?;
    let patterns = [
        declaration_of_kind(DeclarationKind::Class, &word.text),
        function_declaration(&word.text),
        property_declaration(&word.text),
    ];

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if !patterns.iter().any(|p| p.is_match(trimmed)) {
            continue;
        }
        // The name is the first whole-word occurrence on a declaration line.
        let Some(&(start, end)) = find_whole_word(line, &word.text).first() else {
            continue;
        };
        debug!("Definition of '{}' found at line {}", word.text, idx);
        return Some(Location::new(
            uri.clone(),
            range_on_line(idx as u32, start, end),
        ));
    }
    None
}
