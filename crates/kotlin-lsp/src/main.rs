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

//! Kotlin Language Server binary.
//!
//! Serves LSP over stdio. Logs go to stderr and are filtered with
//! `RUST_LOG` on top of the defaults `kotlin_lsp=info,tower_lsp=info`.
//!
//! # Editor Integration
//!
//! ## Neovim (nvim-lspconfig)
//!
//! ```lua
//! require('lspconfig.configs').kotlin_heuristic = {
//!   default_config = {
//!     cmd = { 'kotlin-lsp' },
//!     filetypes = { 'kotlin' },
//!     root_dir = function() return vim.fn.getcwd() end,
//!   },
//! }
//! require('lspconfig').kotlin_heuristic.setup {}
//! ```

use kotlin_lsp::{KotlinLanguageServer, ServerError};
use std::process::ExitCode;
use tower_lsp::{LspService, Server};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

fn directive(value: &str) -> Result<Directive, ServerError> {
    value
        .parse()
        .map_err(|e| ServerError::LoggingInit(format!("invalid directive '{}': {}", value, e)))
}

fn init_logging() -> Result<(), ServerError> {
    let filter = EnvFilter::from_default_env()
        .add_directive(directive("kotlin_lsp=info")?)
        .add_directive(directive("tower_lsp=info")?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()
        .map_err(|e| ServerError::LoggingInit(e.to_string()))
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("kotlin-lsp: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("Starting Kotlin Language Server v{}", kotlin_lsp::VERSION);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(KotlinLanguageServer::new);

    Server::new(stdin, stdout, socket).serve(service).await;

    tracing::info!("Kotlin Language Server exited");
    ExitCode::SUCCESS
}
