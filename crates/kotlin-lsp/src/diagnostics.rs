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

//! Heuristic diagnostics.
//!
//! Each check is a [`DiagnosticRule`]. Rules are independent of each other
//! and of their order; [`get_diagnostics`] runs them all over the current
//! text and concatenates the findings.
//!
//! | Rule id              | Severity    | Finding                                  |
//! |----------------------|-------------|------------------------------------------|
//! | `brace-balance`      | Warning     | `}` without a matching `{`               |
//! | `unused-import`      | Hint        | imported name never used                 |
//! | `naming-convention`  | Warning     | lowercase type or uppercase function     |
//! | `discouraged-pattern`| Information | `!!`, `Thread.sleep(`, ...               |
//!
//! No rule looks at other files.

use crate::analysis::{extract_declarations, Declaration, DeclarationKind};
use crate::constants::DIAGNOSTIC_SOURCE;
use crate::patterns::{import_simple_name, is_import_line, DISCOURAGED_PATTERNS};
use crate::utils::{char_len, find_whole_word, indentation, range_on_line};
use serde_json::json;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Range};
use tracing::debug;

pub const MSG_UNMATCHED_BRACE: &str = "possible unmatched closing brace";
pub const MSG_UNUSED_IMPORT: &str = "unused import";
pub const MSG_NAMING_UPPERCASE: &str = "name should start with uppercase";
pub const MSG_NAMING_LOWERCASE: &str = "name should start with lowercase";

/// Input shared by all rules for one run.
pub struct RuleContext<'a> {
    pub text: &'a str,
    pub lines: Vec<&'a str>,
    pub declarations: Vec<Declaration>,
}

impl<'a> RuleContext<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            lines: text.lines().collect(),
            declarations: extract_declarations(text),
        }
    }
}

/// A single heuristic check.
pub trait DiagnosticRule: Send + Sync {
    /// Rule identifier, published as the diagnostic code.
    fn id(&self) -> &str;

    /// Rule description.
    fn description(&self) -> &str;

    /// Run the rule.
    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Diagnostic>;
}

fn diagnostic(
    range: Range,
    severity: DiagnosticSeverity,
    message: impl Into<String>,
    rule_id: &str,
) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(severity),
        code: Some(NumberOrString::String(rule_id.to_string())),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: message.into(),
        ..Default::default()
    }
}

/// Rule: closing braces that do not close anything.
///
/// A running depth is kept over the whole document. A `}` seen at depth zero
/// is flagged and the depth stays at zero.
pub struct BraceBalanceRule;

impl DiagnosticRule for BraceBalanceRule {
    fn id(&self) -> &str {
        "brace-balance"
    }

    fn description(&self) -> &str {
        "Flag closing braces without a matching opening brace"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut depth = 0usize;

        for (idx, line) in ctx.lines.iter().enumerate() {
            let mut flagged = false;
            for (col, ch) in line.chars().enumerate() {
                match ch {
                    '{' => depth += 1,
                    '}' if depth > 0 => depth -= 1,
                    '}' => {
                        if !flagged {
                            diagnostics.push(diagnostic(
                                range_on_line(idx as u32, col, col + 1),
                                DiagnosticSeverity::WARNING,
                                MSG_UNMATCHED_BRACE,
                                self.id(),
                            ));
                            flagged = true;
                        }
                    }
                    _ => {}
                }
            }
        }
        diagnostics
    }
}

/// Rule: imports whose simple name never appears outside the import block.
pub struct UnusedImportRule;

impl DiagnosticRule for UnusedImportRule {
    fn id(&self) -> &str {
        "unused-import"
    }

    fn description(&self) -> &str {
        "Flag imports whose name is not used in the document"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let body: Vec<&str> = ctx
            .lines
            .iter()
            .copied()
            .filter(|l| !is_import_line(l.trim()))
            .collect();

        let mut diagnostics = Vec::new();
        for (idx, line) in ctx.lines.iter().enumerate() {
            let trimmed = line.trim();
            let Some(name) = import_simple_name(trimmed) else {
                continue;
            };
            let used = body.iter().any(|l| !find_whole_word(l, &name).is_empty());
            if !used {
                let start = indentation(line);
                diagnostics.push(diagnostic(
                    range_on_line(idx as u32, start, start + char_len(trimmed)),
                    DiagnosticSeverity::HINT,
                    format!("{} '{}'", MSG_UNUSED_IMPORT, name),
                    self.id(),
                ));
            }
        }
        diagnostics
    }
}

/// Rule: type names start uppercase, function names lowercase.
pub struct NamingConventionRule;

impl DiagnosticRule for NamingConventionRule {
    fn id(&self) -> &str {
        "naming-convention"
    }

    fn description(&self) -> &str {
        "Check class and function naming conventions"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        ctx.declarations
            .iter()
            .filter_map(|decl| {
                let first = decl.name.chars().next()?;
                let message = match decl.kind {
                    kind if kind.is_type_like() && first.is_lowercase() => {
                        format!("{} {}", kind.label(), MSG_NAMING_UPPERCASE)
                    }
                    DeclarationKind::Function if first.is_uppercase() => {
                        format!("function {}", MSG_NAMING_LOWERCASE)
                    }
                    _ => return None,
                };
                Some(diagnostic(
                    decl.selection_range,
                    DiagnosticSeverity::WARNING,
                    message,
                    self.id(),
                ))
            })
            .collect()
    }
}

/// Rule: discouraged substrings with a suggested alternative.
///
/// The replacement travels in the diagnostic's `data` as
/// `{"replacement": "..."}`.
pub struct DiscouragedPatternRule;

impl DiagnosticRule for DiscouragedPatternRule {
    fn id(&self) -> &str {
        "discouraged-pattern"
    }

    fn description(&self) -> &str {
        "Flag discouraged constructs and suggest an alternative"
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (idx, line) in ctx.lines.iter().enumerate() {
            for pattern in DISCOURAGED_PATTERNS {
                for (byte_idx, _) in line.match_indices(pattern.needle) {
                    let start = char_len(&line[..byte_idx]);
                    let mut diag = diagnostic(
                        range_on_line(idx as u32, start, start + char_len(pattern.needle)),
                        DiagnosticSeverity::INFORMATION,
                        pattern.message,
                        self.id(),
                    );
                    diag.data = Some(json!({ "replacement": pattern.replacement }));
                    diagnostics.push(diag);
                }
            }
        }
        diagnostics
    }
}

/// The built-in rule set.
pub fn default_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![
        Box::new(BraceBalanceRule),
        Box::new(UnusedImportRule),
        Box::new(NamingConventionRule),
        Box::new(DiscouragedPatternRule),
    ]
}

/// Run every rule over `text`.
pub fn get_diagnostics(text: &str) -> Vec<Diagnostic> {
    let ctx = RuleContext::new(text);
    let mut diagnostics = Vec::new();
    for rule in default_rules() {
        let found = rule.check(&ctx);
        if !found.is_empty() {
            debug!("Rule '{}' produced {} diagnostics", rule.id(), found.len());
        }
        diagnostics.extend(found);
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(rule: &dyn DiagnosticRule, text: &str) -> Vec<Diagnostic> {
        rule.check(&RuleContext::new(text))
    }

    #[test]
    fn test_lowercase_class_only_warning() {
        let diagnostics = get_diagnostics("class foo {\n}\n");
        assert_eq!(diagnostics.len(), 1);
        let diag = &diagnostics[0];
        assert_eq!(diag.message, "class name should start with uppercase");
        assert_eq!(diag.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(diag.range, range_on_line(0, 6, 9));
        assert_eq!(diag.source.as_deref(), Some(DIAGNOSTIC_SOURCE));
    }

    #[test]
    fn test_uppercase_function() {
        let diagnostics = run(&NamingConventionRule, "fun DoThing() {}\nfun doThing() {}\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "function name should start with lowercase");
    }

    #[test]
    fn test_brace_balance() {
        let text = "fun f() {\n}\n}\n  } }\n";
        let diagnostics = run(&BraceBalanceRule, text);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].range, range_on_line(2, 0, 1));
        // One finding per line.
        assert_eq!(diagnostics[1].range, range_on_line(3, 2, 3));
        assert_eq!(diagnostics[0].message, MSG_UNMATCHED_BRACE);
    }

    #[test]
    fn test_balanced_braces_are_clean() {
        let text = "class A {\n    fun f() {\n        if (x) { y() } else { z() }\n    }\n}\n";
        assert!(run(&BraceBalanceRule, text).is_empty());
    }

    #[test]
    fn test_unused_import() {
        let text = "import a.B\nimport a.C\nimport a.D\n\nval c: C = D()\n";
        let diagnostics = run(&UnusedImportRule, text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "unused import 'B'");
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::HINT));
        assert_eq!(diagnostics[0].range, range_on_line(0, 0, 10));
    }

    #[test]
    fn test_unused_import_alias_and_wildcard() {
        let text = "import a.Long as L\nimport b.*\nval x: L = 1\n";
        assert!(run(&UnusedImportRule, text).is_empty());
    }

    #[test]
    fn test_unused_import_whole_word() {
        let text = "import a.B\nval Bx = 1\n";
        assert_eq!(run(&UnusedImportRule, text).len(), 1);
    }

    #[test]
    fn test_discouraged_patterns() {
        let text = "val n = user!!.name\nThread.sleep(100)\n";
        let diagnostics = run(&DiscouragedPatternRule, text);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].range, range_on_line(0, 12, 14));
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::INFORMATION));
        assert_eq!(diagnostics[0].data, Some(json!({ "replacement": "?." })));
        assert_eq!(diagnostics[1].range, range_on_line(1, 0, 13));
    }

    #[test]
    fn test_rule_ids_unique() {
        let rules = default_rules();
        let mut ids: Vec<&str> = rules.iter().map(|r| r.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
        assert!(rules.iter().all(|r| !r.description().is_empty()));
    }
}
