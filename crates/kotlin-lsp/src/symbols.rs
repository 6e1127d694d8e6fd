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

//! Document and workspace symbols.
//!
//! Document symbols are a flat list, one entry per recognized declaration,
//! in line order. Workspace symbols are answered from a
//! [`WorkspaceSymbolRegistry`] which nothing populates yet: analysis is
//! single-document, so a workspace query always comes back empty.

use crate::analysis::{extract_declarations, Declaration, DeclarationKind};
use parking_lot::RwLock;
use tower_lsp::lsp_types::*;
use tracing::debug;

/// LSP symbol kind of a declaration kind.
pub fn symbol_kind(kind: DeclarationKind) -> SymbolKind {
    match kind {
        DeclarationKind::Class => SymbolKind::CLASS,
        DeclarationKind::Interface => SymbolKind::INTERFACE,
        DeclarationKind::Function => SymbolKind::FUNCTION,
        DeclarationKind::Property => SymbolKind::PROPERTY,
        DeclarationKind::Object => SymbolKind::OBJECT,
        DeclarationKind::Enum => SymbolKind::ENUM,
    }
}

#[allow(deprecated)]
fn document_symbol(decl: &Declaration) -> DocumentSymbol {
    DocumentSymbol {
        name: decl.name.clone(),
        detail: Some(decl.render_signature()),
        kind: symbol_kind(decl.kind),
        tags: None,
        deprecated: None,
        range: decl.range,
        selection_range: decl.selection_range,
        children: None,
    }
}

/// Get document symbols for outline view.
pub fn get_document_symbols(text: &str) -> Vec<DocumentSymbol> {
    let symbols: Vec<DocumentSymbol> = extract_declarations(text)
        .iter()
        .map(document_symbol)
        .collect();
    debug!("Built {} document symbols", symbols.len());
    symbols
}

/// Symbols known across the workspace.
///
/// Only holds what is explicitly registered; the server does not index
/// files on its own.
#[derive(Debug, Default)]
pub struct WorkspaceSymbolRegistry {
    symbols: RwLock<Vec<SymbolInformation>>,
}

impl WorkspaceSymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, symbol: SymbolInformation) {
        self.symbols.write().push(symbol);
    }

    pub fn len(&self) -> usize {
        self.symbols.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.read().is_empty()
    }

    /// Registered symbols whose name contains `query`, case-insensitively.
    /// An empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<SymbolInformation> {
        let query = query.to_lowercase();
        self.symbols
            .read()
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_symbols() {
        let text = "package demo\n\ninterface Shape\ndata class Circle(val r: Double) : Shape {\n    fun area(): Double = 3.14 * r * r\n}\nobject Registry\nenum class Color { RED }\n";
        let symbols = get_document_symbols(text);
        let summary: Vec<(&str, SymbolKind)> =
            symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("Shape", SymbolKind::INTERFACE),
                ("Circle", SymbolKind::CLASS),
                ("area", SymbolKind::FUNCTION),
                ("Registry", SymbolKind::OBJECT),
                ("Color", SymbolKind::ENUM),
            ]
        );
        let area = &symbols[2];
        assert_eq!(area.selection_range, crate::utils::range_on_line(4, 8, 12));
        assert_eq!(area.range.start.line, 4);
        assert_eq!(area.detail.as_deref(), Some("fun area(): Double"));
    }

    #[test]
    fn test_empty_document() {
        assert!(get_document_symbols("").is_empty());
    }

    #[test]
    #[allow(deprecated)]
    fn test_registry_search() {
        let registry = WorkspaceSymbolRegistry::new();
        assert!(registry.search("").is_empty());

        let uri = Url::parse("file:///a.kt").unwrap();
        registry.register(SymbolInformation {
            name: "UserRepository".to_string(),
            kind: SymbolKind::CLASS,
            tags: None,
            deprecated: None,
            location: Location::new(uri, Range::default()),
            container_name: None,
        });
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.search("repo").len(), 1);
        assert!(registry.search("service").is_empty());
    }
}
