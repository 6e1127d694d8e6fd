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

//! Code actions.
//!
//! Quick fixes are chosen from the diagnostic message:
//!
//! - unused import: delete the flagged range,
//! - trailing comma: delete the comma,
//! - naming convention: flip the case of the first character of the name,
//! - discouraged pattern: replace the match with its suggested alternative.
//!
//! Organize imports and format document are always offered as commands
//! without edits. Extract function is offered when the selection spans
//! more than one line; it carries no edit.

use crate::constants::{COMMAND_FORMAT_DOCUMENT, COMMAND_ORGANIZE_IMPORTS};
use crate::diagnostics::{MSG_NAMING_LOWERCASE, MSG_NAMING_UPPERCASE, MSG_UNUSED_IMPORT};
use crate::patterns::DISCOURAGED_PATTERNS;
use crate::utils::{line_at, range_on_line};
use serde_json::json;
use std::collections::HashMap;
use tower_lsp::lsp_types::*;

const MSG_TRAILING_COMMA: &str = "trailing comma";

/// Fix associated with a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickFix {
    RemoveUnusedImport,
    RemoveTrailingComma,
    FixNamingCase,
    ReplaceDiscouraged(String),
}

/// Pick the fix for `diagnostic` from its message.
pub fn classify(diagnostic: &Diagnostic) -> Option<QuickFix> {
    let message = diagnostic.message.as_str();
    if message.starts_with(MSG_UNUSED_IMPORT) {
        return Some(QuickFix::RemoveUnusedImport);
    }
    if message.to_lowercase().contains(MSG_TRAILING_COMMA) {
        return Some(QuickFix::RemoveTrailingComma);
    }
    if message.ends_with(MSG_NAMING_UPPERCASE) || message.ends_with(MSG_NAMING_LOWERCASE) {
        return Some(QuickFix::FixNamingCase);
    }
    let from_data = diagnostic
        .data
        .as_ref()
        .and_then(|data| data.get("replacement"))
        .and_then(|val| val.as_str())
        .map(str::to_string);
    from_data
        .or_else(|| {
            DISCOURAGED_PATTERNS
                .iter()
                .find(|p| p.message == message)
                .map(|p| p.replacement.to_string())
        })
        .map(QuickFix::ReplaceDiscouraged)
}

/// `name` with the case of its first character flipped.
pub fn flip_first_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => first.to_lowercase().chain(chars).collect(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn text_in_range(text: &str, range: &Range) -> Option<String> {
    let line = line_at(text, range.start.line)?;
    let start = range.start.character as usize;
    let end = if range.end.line == range.start.line {
        range.end.character as usize
    } else {
        usize::MAX
    };
    let taken: String = line.chars().skip(start).take(end.saturating_sub(start)).collect();
    (!taken.is_empty()).then_some(taken)
}

fn comma_range(text: &str, range: &Range) -> Option<Range> {
    let line_idx = range.start.line;
    let line = line_at(text, line_idx)?;
    let chars: Vec<char> = line.chars().collect();
    let start = range.start.character as usize;
    let end = if range.end.line == line_idx && range.end.character as usize > start {
        (range.end.character as usize).min(chars.len())
    } else {
        chars.len()
    };
    let offset = chars.get(start..end)?.iter().rposition(|c| *c == ',')?;
    Some(range_on_line(line_idx, start + offset, start + offset + 1))
}

fn quick_fix(
    uri: &Url,
    title: String,
    diagnostic: &Diagnostic,
    edit: TextEdit,
) -> CodeActionOrCommand {
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), vec![edit]);
    CodeActionOrCommand::CodeAction(CodeAction {
        title,
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: Some(vec![diagnostic.clone()]),
        edit: Some(WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        }),
        is_preferred: Some(true),
        ..Default::default()
    })
}

/// Quick fix for one diagnostic, if its message has a known fix.
pub fn action_for_diagnostic(
    uri: &Url,
    text: &str,
    diagnostic: &Diagnostic,
) -> Option<CodeActionOrCommand> {
    let fix = classify(diagnostic)?;
    let action = match fix {
        QuickFix::RemoveUnusedImport => quick_fix(
            uri,
            "Remove unused import".to_string(),
            diagnostic,
            TextEdit::new(diagnostic.range, String::new()),
        ),
        QuickFix::RemoveTrailingComma => quick_fix(
            uri,
            "Remove trailing comma".to_string(),
            diagnostic,
            TextEdit::new(comma_range(text, &diagnostic.range)?, String::new()),
        ),
        QuickFix::FixNamingCase => {
            let name = text_in_range(text, &diagnostic.range)?;
            let fixed = flip_first_case(&name);
            quick_fix(
                uri,
                format!("Rename '{}' to '{}'", name, fixed),
                diagnostic,
                TextEdit::new(diagnostic.range, fixed),
            )
        }
        QuickFix::ReplaceDiscouraged(replacement) => quick_fix(
            uri,
            format!("Replace with '{}'", replacement),
            diagnostic,
            TextEdit::new(diagnostic.range, replacement),
        ),
    };
    Some(action)
}

fn command_action(uri: &Url, title: &str, kind: CodeActionKind, command: &str) -> CodeActionOrCommand {
    CodeActionOrCommand::CodeAction(CodeAction {
        title: title.to_string(),
        kind: Some(kind),
        command: Some(Command {
            title: title.to_string(),
            command: command.to_string(),
            arguments: Some(vec![json!(uri.as_str())]),
        }),
        ..Default::default()
    })
}

/// All code actions for `range`, given the diagnostics the client sent.
pub fn get_code_actions(
    uri: &Url,
    text: &str,
    range: Range,
    diagnostics: &[Diagnostic],
) -> Vec<CodeActionOrCommand> {
    let mut actions: Vec<CodeActionOrCommand> = diagnostics
        .iter()
        .filter_map(|d| action_for_diagnostic(uri, text, d))
        .collect();

    actions.push(command_action(
        uri,
        "Organize imports",
        CodeActionKind::SOURCE_ORGANIZE_IMPORTS,
        COMMAND_ORGANIZE_IMPORTS,
    ));
    actions.push(command_action(
        uri,
        "Format document",
        CodeActionKind::SOURCE,
        COMMAND_FORMAT_DOCUMENT,
    ));

    if range.start.line != range.end.line {
        actions.push(CodeActionOrCommand::CodeAction(CodeAction {
            title: "Extract to function".to_string(),
            kind: Some(CodeActionKind::REFACTOR_EXTRACT),
            ..Default::default()
        }));
    }
    actions
}
