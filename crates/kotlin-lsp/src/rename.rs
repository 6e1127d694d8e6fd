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

//! Rename.
//!
//! Both the word under the cursor and the new name must be valid
//! identifiers that are not reserved words. Renaming rewrites every
//! whole-word occurrence in the document, so it touches exactly the ranges
//! reference search reports.

use crate::patterns::is_keyword;
use crate::utils::{find_word_occurrences, is_valid_identifier, word_at_position};
use std::collections::HashMap;
use tower_lsp::lsp_types::*;
use tracing::debug;

/// A name that may be renamed, or given as a new name.
pub fn is_renameable(name: &str) -> bool {
    !name.is_empty() && is_valid_identifier(name) && !is_keyword(name)
}

/// Range and current text of the symbol at `position`, or `None` when it
/// can not be renamed.
pub fn prepare_rename(text: &str, position: Position) -> Option<PrepareRenameResponse> {
    let word = word_at_position(text, position)?;
    if !is_renameable(&word.text) {
        debug!("Declining rename of '{}'", word.text);
        return None;
    }
    Some(PrepareRenameResponse::RangeWithPlaceholder {
        range: word.range(position.line),
        placeholder: word.text,
    })
}

/// Edits renaming the symbol at `position` to `new_name`.
///
/// Returns `None` when there is no renameable symbol at `position`, and an
/// empty edit when `new_name` is not acceptable.
pub fn rename(uri: &Url, text: &str, position: Position, new_name: &str) -> Option<WorkspaceEdit> {
    let word = word_at_position(text, position)?;
    if !is_renameable(&word.text) {
        return None;
    }
    if !is_renameable(new_name) {
        debug!("Rejected new name '{}'", new_name);
        return Some(WorkspaceEdit::default());
    }

    let edits: Vec<TextEdit> = find_word_occurrences(text, &word.text)
        .into_iter()
        .map(|range| TextEdit::new(range, new_name.to_string()))
        .collect();
    debug!(
        "Renaming '{}' to '{}': {} edits",
        word.text,
        new_name,
        edits.len()
    );

    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits);
    Some(WorkspaceEdit {
        changes: Some(changes),
        ..Default::default()
    })
}
