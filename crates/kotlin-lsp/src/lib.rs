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

//! Kotlin Language Server Protocol (LSP) Implementation
//!
//! A heuristic language server for Kotlin. Instead of a compiler front end
//! it recognizes declarations, literals, comments and brace structure with
//! line-oriented patterns, and recomputes every answer from the current text
//! of a single document.
//!
//! # Features
//!
//! - **Diagnostics**: brace balance, unused imports, naming conventions and
//!   discouraged constructs
//! - **Autocomplete**: keywords, built-in types and declarations of the document
//! - **Hover**: keyword descriptions and declaration signatures with KDoc
//! - **Go to Definition / Find References**: whole-word search in the document
//! - **Document Symbols**: flat outline of declarations
//! - **Folding**: blocks, functions, comments and import runs
//! - **Semantic Highlighting**: full and range requests
//! - **Rename**: with prepare, rejecting reserved words
//! - **Code Actions**: quick fixes for the diagnostics above
//! - **Formatting**: trailing whitespace and final newline
//!
//! # Limitations
//!
//! Matching is not grammar-aware. A keyword or declaration-looking text
//! inside a string or comment can be picked up by the extractors, and
//! workspace symbol search only returns what has been registered explicitly.
//!
//! # Usage
//!
//! ```bash
//! # Run the language server (stdio transport)
//! kotlin-lsp
//!
//! # With debug logging
//! RUST_LOG=kotlin_lsp=debug kotlin-lsp
//! ```
//!
//! ## Programmatic Usage
//!
//! ```no_run
//! use kotlin_lsp::KotlinLanguageServer;
//! use tower_lsp::{LspService, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stdin = tokio::io::stdin();
//!     let stdout = tokio::io::stdout();
//!
//!     let (service, socket) = LspService::new(KotlinLanguageServer::new);
//!
//!     Server::new(stdin, stdout, socket).serve(service).await;
//! }
//! ```
//!
//! # Architecture
//!
//! - `backend`: LSP protocol handlers
//! - [`document_manager`]: open documents with size limit and LRU eviction
//! - [`utils`], [`patterns`], [`analysis`]: positions, pattern catalog and
//!   structural extractors shared by every feature
//! - [`diagnostics`], [`completion`], [`hover`], [`documentation`],
//!   [`symbols`], [`references`], [`folding`], [`semantic_tokens`],
//!   [`rename`], [`code_actions`], [`formatting`]: one module per feature

pub mod analysis;
mod backend;
pub mod code_actions;
pub mod completion;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod document_manager;
pub mod documentation;
pub mod error;
pub mod folding;
pub mod formatting;
pub mod hover;
pub mod patterns;
pub mod references;
pub mod rename;
pub mod semantic_tokens;
pub mod symbols;
pub mod utils;

pub use backend::KotlinLanguageServer;
pub use config::{ServerConfig, TraceLevel};
pub use document_manager::{CacheStatistics, DocumentManager, DocumentSnapshot};
pub use error::ServerError;
pub use utils::PositionEncoding;

/// LSP server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
