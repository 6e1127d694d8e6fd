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

//! LSP constants and magic number definitions.
//!
//! # Organization
//!
//! Constants are organized by category:
//! - **Memory Limits**: Document and store size constraints
//! - **Analysis Tuning**: Thresholds used by the heuristic extractors
//! - **LSP Protocol**: Protocol-specific identifiers and defaults

// ============================================================================
// Memory Limits
// ============================================================================

/// Bytes per megabyte (1024 * 1024).
pub const BYTES_PER_MEGABYTE: usize = 1024 * 1024;

/// Default maximum document size in bytes (50 MB).
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 50 * BYTES_PER_MEGABYTE;

/// Default maximum number of simultaneously open documents (1000).
///
/// When the limit is reached the least recently used document is evicted.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1000;

// ============================================================================
// Analysis Tuning
// ============================================================================

/// Minimum number of consecutive single-line comments that fold together.
pub const MIN_COMMENT_RUN: usize = 3;

/// Minimum number of consecutive import lines that fold together.
pub const MIN_IMPORT_RUN: usize = 3;

// ============================================================================
// LSP Protocol Constants
// ============================================================================

/// Source tag attached to every published diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "kotlin-lsp";

/// Language identifier sent by clients for Kotlin buffers.
pub const LANGUAGE_ID: &str = "kotlin";

/// Command identifier for the organize-imports command.
pub const COMMAND_ORGANIZE_IMPORTS: &str = "kotlin.organizeImports";

/// Command identifier for the run-tests command.
pub const COMMAND_RUN_TESTS: &str = "kotlin.runTests";

/// Command identifier attached to the format-document source action.
pub const COMMAND_FORMAT_DOCUMENT: &str = "kotlin.formatDocument";

/// Characters that trigger completion in addition to identifier typing.
pub const COMPLETION_TRIGGER_CHARACTERS: [&str; 2] = [".", ":"];

/// Zero-based position start index.
pub const POSITION_ZERO: u32 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_conversions() {
        assert_eq!(BYTES_PER_MEGABYTE, 1048576);
        assert_eq!(DEFAULT_MAX_DOCUMENT_SIZE, 52428800);
    }

    #[test]
    fn test_run_thresholds() {
        // Runs of fewer than three lines are left unfolded.
        assert_eq!(MIN_COMMENT_RUN, 3);
        assert_eq!(MIN_IMPORT_RUN, 3);
    }

    #[test]
    fn test_command_ids_are_distinct() {
        assert_ne!(COMMAND_ORGANIZE_IMPORTS, COMMAND_RUN_TESTS);
        assert_ne!(COMMAND_ORGANIZE_IMPORTS, COMMAND_FORMAT_DOCUMENT);
        assert!(COMMAND_RUN_TESTS.starts_with("kotlin."));
    }
}
