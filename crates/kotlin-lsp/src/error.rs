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

//! Structured error types for the Kotlin language server.
//!
//! Request handlers are fail-soft: an error never reaches the client as a
//! JSON-RPC failure. Instead handlers log the `ServerError` and answer with
//! the empty or null result for the request. Only startup failures are
//! fatal.

use thiserror::Error;
use tower_lsp::lsp_types::Url;

/// The main error type for language server operations.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Document exceeds the configured size limit and was not stored.
    #[error("Document '{uri}' is too large ({size} bytes). Maximum allowed: {max} bytes")]
    DocumentTooLarge {
        /// The document identifier
        uri: Url,
        /// The actual document size in bytes
        size: usize,
        /// The maximum allowed size in bytes
        max: usize,
    },

    /// Initialization options could not be deserialized.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    /// The logging subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ServerError>;
