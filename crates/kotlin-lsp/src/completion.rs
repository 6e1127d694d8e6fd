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

//! Autocompletion.
//!
//! Candidates come in four groups, always in this order:
//!
//! 1. reserved words starting with the identifier prefix at the cursor
//!    (case-insensitive),
//! 2. built-in type names, filtered the same way,
//! 3. every function declared in the document, inserted as `name()`,
//! 4. every property declared in the document, labelled mutable or
//!    immutable.
//!
//! There is no ranking inside a group and no fuzzy matching. Each item
//! carries `{ uri, category }` as `data` so that
//! [`resolve_completion`] can attach documentation later.

use crate::analysis::{extract_declarations, DeclarationKind};
use crate::hover::declaration_hover;
use crate::patterns::{is_modifier, keyword_doc, BUILTIN_TYPES, KEYWORDS, MODIFIERS};
use crate::utils::{identifier_prefix, line_at};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tower_lsp::lsp_types::*;
use tracing::debug;

/// Group a completion item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionCategory {
    Keyword,
    Type,
    Function,
    Property,
}

impl CompletionCategory {
    fn rank(self) -> u8 {
        match self {
            Self::Keyword => 0,
            Self::Type => 1,
            Self::Function => 2,
            Self::Property => 3,
        }
    }
}

/// Payload stored in `CompletionItem::data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionData {
    pub uri: Url,
    pub category: CompletionCategory,
}

impl CompletionData {
    pub fn from_item(item: &CompletionItem) -> Option<Self> {
        serde_json::from_value(item.data.clone()?).ok()
    }
}

fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate.to_lowercase().starts_with(&prefix.to_lowercase())
}

struct ItemBuilder<'a> {
    uri: &'a Url,
    items: Vec<CompletionItem>,
    seen: HashSet<(CompletionCategory, String)>,
}

impl<'a> ItemBuilder<'a> {
    fn push(
        &mut self,
        category: CompletionCategory,
        label: &str,
        kind: CompletionItemKind,
        detail: String,
        insert_text: Option<String>,
    ) {
        if label.is_empty() || !self.seen.insert((category, label.to_string())) {
            return;
        }
        let data = CompletionData {
            uri: self.uri.clone(),
            category,
        };
        self.items.push(CompletionItem {
            label: label.to_string(),
            kind: Some(kind),
            detail: Some(detail),
            insert_text,
            insert_text_format: Some(InsertTextFormat::PLAIN_TEXT),
            sort_text: Some(format!("{}_{:04}", category.rank(), self.items.len())),
            data: serde_json::to_value(data).ok(),
            ..Default::default()
        });
    }
}

/// Get completions for a position in the document.
pub fn get_completions(uri: &Url, text: &str, position: Position) -> Vec<CompletionItem> {
    let Some(line) = line_at(text, position.line) else {
        return Vec::new();
    };
    let Some(prefix) = identifier_prefix(line, position.character as usize) else {
        return Vec::new();
    };

    let mut builder = ItemBuilder {
        uri,
        items: Vec::new(),
        seen: HashSet::new(),
    };

    for word in KEYWORDS.iter().chain(MODIFIERS) {
        if starts_with_ignore_case(word, &prefix) {
            let detail = if is_modifier(word) { "modifier" } else { "keyword" };
            builder.push(
                CompletionCategory::Keyword,
                word,
                CompletionItemKind::KEYWORD,
                detail.to_string(),
                None,
            );
        }
    }

    for ty in BUILTIN_TYPES {
        if starts_with_ignore_case(ty, &prefix) {
            builder.push(
                CompletionCategory::Type,
                ty,
                CompletionItemKind::CLASS,
                "built-in type".to_string(),
                None,
            );
        }
    }

    let declarations = extract_declarations(text);
    for decl in declarations.iter().filter(|d| d.kind == DeclarationKind::Function) {
        builder.push(
            CompletionCategory::Function,
            &decl.name,
            CompletionItemKind::FUNCTION,
            decl.render_signature(),
            Some(format!("{}()", decl.name)),
        );
    }
    for decl in declarations.iter().filter(|d| d.kind == DeclarationKind::Property) {
        let mutability = if decl.mutable { "mutable" } else { "immutable" };
        builder.push(
            CompletionCategory::Property,
            &decl.name,
            CompletionItemKind::VARIABLE,
            format!("{} ({})", decl.render_signature(), mutability),
            None,
        );
    }

    debug!(
        "Prefix '{}' at {}:{} produced {} completion items",
        prefix,
        position.line,
        position.character,
        builder.items.len()
    );
    builder.items
}

/// Attach documentation to an item returned by [`get_completions`].
///
/// `text` is the current content of the document named in the item's
/// data, if that document is still open. Label, kind and data are left
/// as they are.
pub fn resolve_completion(mut item: CompletionItem, text: Option<&str>) -> CompletionItem {
    let Some(data) = CompletionData::from_item(&item) else {
        return item;
    };

    let documentation = match data.category {
        CompletionCategory::Keyword => Some(Documentation::String(
            keyword_doc(&item.label)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Kotlin keyword `{}`.", item.label)),
        )),
        CompletionCategory::Type => Some(Documentation::String(format!(
            "Built-in Kotlin type `{}`.",
            item.label
        ))),
        CompletionCategory::Function | CompletionCategory::Property => {
            let wanted = if data.category == CompletionCategory::Function {
                DeclarationKind::Function
            } else {
                DeclarationKind::Property
            };
            text.and_then(|text| {
                extract_declarations(text)
                    .iter()
                    .find(|d| d.kind == wanted && d.name == item.label)
                    .map(|decl| {
                        Documentation::MarkupContent(MarkupContent {
                            kind: MarkupKind::Markdown,
                            value: declaration_hover(text, decl),
                        })
                    })
            })
        }
    };

    if documentation.is_some() {
        item.documentation = documentation;
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
/**
 * Adds numbers.
 */
fun add(a: Int, b: Int): Int = a + b
val total = add(1, 2)
var counter = 0
fun add(a: Int) = a
va
";

    fn uri() -> Url {
        Url::parse("file:///tmp/Add.kt").unwrap()
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn test_category_order_and_prefix() {
        let items = get_completions(&uri(), SOURCE, Position::new(7, 2));
        let labels = labels(&items);
        assert_eq!(labels[..4], ["val", "var", "vararg", "value"]);
        // Declarations are not filtered and functions come before properties.
        assert_eq!(labels[4..], ["add", "total", "counter"]);
    }

    #[test]
    fn test_modifiers_offered_with_keywords() {
        let items = get_completions(&uri(), "    over", Position::new(0, 8));
        assert_eq!(labels(&items)[0], "override");
        assert_eq!(items[0].kind, Some(CompletionItemKind::KEYWORD));
        assert_eq!(items[0].detail.as_deref(), Some("modifier"));
    }

    #[test]
    fn test_overloads_listed_once() {
        let items = get_completions(&uri(), SOURCE, Position::new(7, 2));
        assert_eq!(items.iter().filter(|i| i.label == "add").count(), 1);
    }

    #[test]
    fn test_case_insensitive_types() {
        let items = get_completions(&uri(), "val s: str", Position::new(0, 10));
        assert_eq!(items[0].label, "String");
        assert_eq!(items[0].kind, Some(CompletionItemKind::CLASS));
    }

    #[test]
    fn test_function_and_property_items() {
        let items = get_completions(&uri(), SOURCE, Position::new(7, 2));
        let add = items.iter().find(|i| i.label == "add").unwrap();
        assert_eq!(add.insert_text.as_deref(), Some("add()"));
        assert_eq!(add.kind, Some(CompletionItemKind::FUNCTION));

        let counter = items.iter().find(|i| i.label == "counter").unwrap();
        assert_eq!(counter.detail.as_deref(), Some("var counter (mutable)"));
        let total = items.iter().find(|i| i.label == "total").unwrap();
        assert_eq!(total.detail.as_deref(), Some("val total (immutable)"));
    }

    #[test]
    fn test_sort_text_keeps_order() {
        let items = get_completions(&uri(), SOURCE, Position::new(7, 2));
        let sort: Vec<&str> = items.iter().map(|i| i.sort_text.as_deref().unwrap()).collect();
        let mut sorted = sort.clone();
        sorted.sort();
        assert_eq!(sort, sorted);
    }

    #[test]
    fn test_out_of_range() {
        assert!(get_completions(&uri(), SOURCE, Position::new(30, 0)).is_empty());
        assert!(get_completions(&uri(), SOURCE, Position::new(7, 9)).is_empty());
    }

    #[test]
    fn test_resolve_function_docs() {
        let items = get_completions(&uri(), SOURCE, Position::new(7, 2));
        let add = items.into_iter().find(|i| i.label == "add").unwrap();
        let data_before = add.data.clone();
        let resolved = resolve_completion(add, Some(SOURCE));
        assert_eq!(resolved.data, data_before);
        match resolved.documentation {
            Some(Documentation::MarkupContent(m)) => {
                assert!(m.value.contains("fun add(a: Int, b: Int): Int"));
                assert!(m.value.contains("Adds numbers."));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_resolve_keyword_and_closed_document() {
        let items = get_completions(&uri(), SOURCE, Position::new(7, 2));
        let val = resolve_completion(items[0].clone(), None);
        assert_eq!(
            val.documentation,
            Some(Documentation::String(keyword_doc("val").unwrap().to_string()))
        );

        let total = items.into_iter().find(|i| i.label == "total").unwrap();
        assert!(resolve_completion(total, None).documentation.is_none());
    }

    #[test]
    fn test_resolve_without_data() {
        let item = CompletionItem::new_simple("x".to_string(), "y".to_string());
        assert_eq!(resolve_completion(item.clone(), Some(SOURCE)), item);
    }
}
