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

//! LSP backend implementation.
//!
//! Every request reads an immutable snapshot of the document from the
//! [`DocumentManager`] and recomputes its answer from that text. Nothing
//! derived from a document is kept between requests.
//!
//! Diagnostics are pushed right after `didOpen`, `didChange` and `didSave`,
//! computed on the same task; there is no background analysis.
//!
//! Requests for documents that are not open, and positions outside the
//! document, produce empty results instead of errors.
//!
//! The feature modules work in char columns. Positions are translated at this
//! boundary when the client counts UTF-16 code units.

use crate::code_actions::get_code_actions;
use crate::completion::{get_completions, resolve_completion, CompletionData};
use crate::config::ServerConfig;
use crate::constants::{
    BYTES_PER_MEGABYTE, COMMAND_FORMAT_DOCUMENT, COMMAND_ORGANIZE_IMPORTS, COMMAND_RUN_TESTS,
    COMPLETION_TRIGGER_CHARACTERS, DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_DOCUMENT_SIZE,
    LANGUAGE_ID,
};
use crate::diagnostics::get_diagnostics;
use crate::document_manager::{CacheStatistics, DocumentManager};
use crate::error::ServerError;
use crate::folding::get_folding_ranges;
use crate::formatting::format_document;
use crate::hover::get_hover;
use crate::references::{find_definition, find_references};
use crate::rename::{prepare_rename, rename};
use crate::semantic_tokens::{get_semantic_tokens_full, get_semantic_tokens_range, legend};
use crate::symbols::{get_document_symbols, WorkspaceSymbolRegistry};
use crate::utils::{PositionEncoding, PositionMapper};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, error, info, warn};

/// Commands accepted by `workspace/executeCommand`.
const COMMANDS: &[&str] = &[
    COMMAND_ORGANIZE_IMPORTS,
    COMMAND_RUN_TESTS,
    COMMAND_FORMAT_DOCUMENT,
];

/// Kotlin Language Server backend.
pub struct KotlinLanguageServer {
    /// LSP client connection.
    client: Client,
    /// Open documents.
    document_manager: Arc<DocumentManager>,
    /// Settings received at initialization.
    config: RwLock<ServerConfig>,
    /// Column unit agreed with the client at initialization.
    encoding: RwLock<PositionEncoding>,
    workspace_symbols: WorkspaceSymbolRegistry,
}

impl KotlinLanguageServer {
    /// Create a new language server with default limits.
    ///
    /// Default settings:
    /// - Max open documents: 1000
    /// - Max document size: 50 MB
    pub fn new(client: Client) -> Self {
        Self::with_config(client, DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_DOCUMENT_SIZE)
    }

    /// Create a new language server with custom store limits.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use kotlin_lsp::KotlinLanguageServer;
    /// use tower_lsp::Client;
    ///
    /// fn create_server(client: Client) -> KotlinLanguageServer {
    ///     // Up to 200 documents of at most 4 MB each
    ///     KotlinLanguageServer::with_config(client, 200, 4 * 1024 * 1024)
    /// }
    /// ```
    pub fn with_config(client: Client, max_cache_size: usize, max_document_size: usize) -> Self {
        Self {
            client,
            document_manager: Arc::new(DocumentManager::new(max_cache_size, max_document_size)),
            config: RwLock::new(ServerConfig::default()),
            encoding: RwLock::new(PositionEncoding::default()),
            workspace_symbols: WorkspaceSymbolRegistry::new(),
        }
    }

    /// Get current cache statistics.
    pub fn cache_statistics(&self) -> CacheStatistics {
        self.document_manager.statistics()
    }

    pub fn set_max_cache_size(&self, new_max: usize) {
        self.document_manager.set_max_cache_size(new_max);
    }

    pub fn max_cache_size(&self) -> usize {
        self.document_manager.max_cache_size()
    }

    pub fn set_max_document_size(&self, new_max: usize) {
        self.document_manager.set_max_document_size(new_max);
    }

    pub fn max_document_size(&self) -> usize {
        self.document_manager.max_document_size()
    }

    /// Settings currently in effect.
    pub fn config(&self) -> ServerConfig {
        self.config.read().clone()
    }

    /// Position encoding in effect.
    pub fn position_encoding(&self) -> PositionEncoding {
        *self.encoding.read()
    }

    fn enabled(&self) -> bool {
        self.config.read().enabled
    }

    fn mapper<'a>(&self, text: &'a str) -> PositionMapper<'a> {
        PositionMapper::new(text, self.position_encoding())
    }

    /// Capabilities for the given settings. A disabled server offers none.
    pub fn capabilities(config: &ServerConfig, encoding: PositionEncoding) -> ServerCapabilities {
        if !config.enabled {
            return ServerCapabilities::default();
        }
        ServerCapabilities {
            position_encoding: Some(encoding.kind()),
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    will_save: Some(true),
                    will_save_wait_until: Some(true),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(true),
                    })),
                },
            )),
            completion_provider: Some(CompletionOptions {
                resolve_provider: Some(true),
                trigger_characters: Some(
                    COMPLETION_TRIGGER_CHARACTERS
                        .iter()
                        .map(|c| c.to_string())
                        .collect(),
                ),
                work_done_progress_options: Default::default(),
                all_commit_characters: None,
                completion_item: None,
            }),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            definition_provider: Some(OneOf::Left(true)),
            references_provider: Some(OneOf::Left(true)),
            document_symbol_provider: Some(OneOf::Left(true)),
            workspace_symbol_provider: Some(OneOf::Left(true)),
            code_action_provider: Some(CodeActionProviderCapability::Options(
                CodeActionOptions {
                    code_action_kinds: Some(vec![
                        CodeActionKind::QUICKFIX,
                        CodeActionKind::SOURCE,
                        CodeActionKind::SOURCE_ORGANIZE_IMPORTS,
                        CodeActionKind::REFACTOR_EXTRACT,
                    ]),
                    work_done_progress_options: Default::default(),
                    resolve_provider: Some(false),
                },
            )),
            document_formatting_provider: Some(OneOf::Left(true)),
            rename_provider: Some(OneOf::Right(RenameOptions {
                prepare_provider: Some(true),
                work_done_progress_options: Default::default(),
            })),
            folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
                work_done_progress_options: Default::default(),
            }),
            semantic_tokens_provider: Some(
                SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
                    work_done_progress_options: Default::default(),
                    legend: legend(),
                    range: Some(true),
                    full: Some(SemanticTokensFullOptions::Bool(true)),
                }),
            ),
            ..Default::default()
        }
    }

    /// Current text of an open document, if the server is enabled.
    fn text(&self, uri: &Url) -> Option<Arc<str>> {
        if !self.enabled() {
            return None;
        }
        let text = self.document_manager.text(uri);
        if text.is_none() {
            debug!("Request for {} ignored (document not open)", uri);
        }
        text
    }

    /// Mirror a request summary to the client log when tracing is on.
    async fn trace(&self, message: String) {
        let level = self.config.read().trace;
        if level.is_enabled() {
            self.client.log_message(MessageType::LOG, message).await;
        }
    }

    /// Run all diagnostic rules on the current text and publish them.
    async fn publish_diagnostics(&self, uri: &Url) {
        if !self.enabled() {
            return;
        }
        let Some(snapshot) = self.document_manager.snapshot(uri) else {
            warn!("Cannot publish diagnostics for {} (document not open)", uri);
            return;
        };
        let mapper = self.mapper(&snapshot.text);
        let diagnostics: Vec<Diagnostic> = get_diagnostics(&snapshot.text)
            .into_iter()
            .map(|d| Diagnostic {
                range: mapper.range_from_chars(d.range),
                ..d
            })
            .collect();
        debug!(
            "Publishing {} diagnostics for {} (version {})",
            diagnostics.len(),
            uri,
            snapshot.version
        );
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, Some(snapshot.version))
            .await;
    }

    async fn report_store_error(&self, err: ServerError) {
        match &err {
            ServerError::DocumentTooLarge { size, max, .. } => {
                error!("{}", err);
                self.client
                    .show_message(
                        MessageType::ERROR,
                        format!(
                            "Document too large: {} bytes exceeds maximum of {} bytes ({} MB)",
                            size,
                            max,
                            max / BYTES_PER_MEGABYTE
                        ),
                    )
                    .await;
            }
            _ => warn!("{}", err),
        }
    }
}

fn map_location(mapper: &PositionMapper<'_>, location: Location) -> Location {
    Location {
        range: mapper.range_from_chars(location.range),
        ..location
    }
}

#[allow(deprecated)]
fn map_symbol(mapper: &PositionMapper<'_>, symbol: DocumentSymbol) -> DocumentSymbol {
    DocumentSymbol {
        range: mapper.range_from_chars(symbol.range),
        selection_range: mapper.range_from_chars(symbol.selection_range),
        children: symbol
            .children
            .map(|children| children.into_iter().map(|c| map_symbol(mapper, c)).collect()),
        ..symbol
    }
}

fn map_edits(mapper: &PositionMapper<'_>, edits: Vec<TextEdit>) -> Vec<TextEdit> {
    edits
        .into_iter()
        .map(|edit| TextEdit {
            range: mapper.range_from_chars(edit.range),
            ..edit
        })
        .collect()
}

fn map_workspace_edit(mapper: &PositionMapper<'_>, edit: WorkspaceEdit) -> WorkspaceEdit {
    WorkspaceEdit {
        changes: edit.changes.map(|changes| {
            changes
                .into_iter()
                .map(|(uri, edits)| (uri, map_edits(mapper, edits)))
                .collect()
        }),
        ..edit
    }
}

fn map_code_action(mapper: &PositionMapper<'_>, action: CodeActionOrCommand) -> CodeActionOrCommand {
    match action {
        CodeActionOrCommand::CodeAction(action) => CodeActionOrCommand::CodeAction(CodeAction {
            diagnostics: action.diagnostics.map(|diagnostics| {
                diagnostics
                    .into_iter()
                    .map(|d| Diagnostic {
                        range: mapper.range_from_chars(d.range),
                        ..d
                    })
                    .collect()
            }),
            edit: action.edit.map(|edit| map_workspace_edit(mapper, edit)),
            ..action
        }),
        command => command,
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for KotlinLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Kotlin Language Server initializing");

        let config = ServerConfig::from_initialization_options(
            params.initialization_options.as_ref(),
        )
        .unwrap_or_else(|e| {
            warn!("{}, using defaults", e);
            ServerConfig::default()
        });
        if !config.enabled {
            info!("Kotlin Language Server disabled by configuration");
        }
        if let Some(path) = &config.language_server_path {
            debug!("Configured language server path: {}", path);
        }
        if let Some(java_home) = &config.java_home {
            debug!("Configured java home: {}", java_home);
        }

        let encoding = PositionEncoding::negotiate(
            params
                .capabilities
                .general
                .as_ref()
                .and_then(|general| general.position_encodings.as_deref()),
        );
        debug!("Position encoding: {:?}", encoding);

        let capabilities = Self::capabilities(&config, encoding);
        *self.config.write() = config;
        *self.encoding.write() = encoding;

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "kotlin-lsp".to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("Kotlin Language Server initialized");
        self.trace(format!("kotlin-lsp {} ready", crate::VERSION))
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Kotlin Language Server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        info!(
            "Document opened: {} ({} bytes, {} lines)",
            doc.uri,
            doc.text.len(),
            doc.text.lines().count()
        );
        if !self.enabled() {
            return;
        }
        if doc.language_id != LANGUAGE_ID {
            warn!(
                "Document {} has language id '{}', analyzing it as {}",
                doc.uri, doc.language_id, LANGUAGE_ID
            );
        }

        match self
            .document_manager
            .open(&doc.uri, &doc.text, doc.version, &doc.language_id)
        {
            Ok(()) => self.publish_diagnostics(&doc.uri).await,
            Err(e) => self.report_store_error(e).await,
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        debug!("Document change event received for: {}", uri);

        let Some(change) = params.content_changes.into_iter().last() else {
            warn!("Document change event for {} had no content changes", uri);
            return;
        };
        if !self.enabled() {
            return;
        }

        match self
            .document_manager
            .update(&uri, &change.text, Some(version))
        {
            Ok(_) => self.publish_diagnostics(&uri).await,
            Err(e) => self.report_store_error(e).await,
        }
    }

    async fn will_save(&self, params: WillSaveTextDocumentParams) {
        debug!(
            "Will save {} ({:?})",
            params.text_document.uri, params.reason
        );
    }

    async fn will_save_wait_until(
        &self,
        params: WillSaveTextDocumentParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        debug!("Will save (wait until) {}", params.text_document.uri);
        Ok(None)
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document saved: {}", uri);
        if let Some(text) = params.text {
            if let Err(e) = self.document_manager.update(&uri, &text, None) {
                self.report_store_error(e).await;
                return;
            }
        }
        self.publish_diagnostics(&uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Document closed: {}", uri);
        self.document_manager.remove(&uri);
        if self.enabled() {
            self.client.publish_diagnostics(uri, vec![], None).await;
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        debug!(
            "Completion request for {} at {}:{}",
            uri, position.line, position.character
        );

        let Some(text) = self.text(uri) else {
            return Ok(None);
        };
        let items = get_completions(uri, &text, self.mapper(&text).to_chars(position));
        self.trace(format!(
            "completion {}:{}:{} -> {} items",
            uri,
            position.line,
            position.character,
            items.len()
        ))
        .await;
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn completion_resolve(&self, item: CompletionItem) -> Result<CompletionItem> {
        let text = CompletionData::from_item(&item).and_then(|data| self.text(&data.uri));
        Ok(resolve_completion(item, text.as_deref()))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!(
            "Hover request for {} at {}:{}",
            uri, position.line, position.character
        );

        let Some(text) = self.text(uri) else {
            return Ok(None);
        };
        let mapper = self.mapper(&text);
        Ok(get_hover(&text, mapper.to_chars(position)).map(|hover| Hover {
            range: hover.range.map(|r| mapper.range_from_chars(r)),
            ..hover
        }))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some(text) = self.text(uri) else {
            return Ok(None);
        };
        let mapper = self.mapper(&text);
        Ok(find_definition(uri, &text, mapper.to_chars(position))
            .map(|location| GotoDefinitionResponse::Scalar(map_location(&mapper, location))))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(text) = self.text(uri) else {
            return Ok(None);
        };
        let mapper = self.mapper(&text);
        let locations: Vec<Location> = find_references(uri, &text, mapper.to_chars(position))
            .into_iter()
            .map(|location| map_location(&mapper, location))
            .collect();
        self.trace(format!(
            "references {}:{}:{} -> {}",
            uri,
            position.line,
            position.character,
            locations.len()
        ))
        .await;
        Ok(Some(locations))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let Some(text) = self.text(&params.text_document.uri) else {
            return Ok(None);
        };
        let mapper = self.mapper(&text);
        let symbols = get_document_symbols(&text)
            .into_iter()
            .map(|symbol| map_symbol(&mapper, symbol))
            .collect();
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        if !self.enabled() {
            return Ok(None);
        }
        Ok(Some(self.workspace_symbols.search(&params.query)))
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = &params.text_document.uri;
        let Some(text) = self.text(uri) else {
            return Ok(None);
        };
        let mapper = self.mapper(&text);
        let diagnostics: Vec<Diagnostic> = params
            .context
            .diagnostics
            .into_iter()
            .map(|d| Diagnostic {
                range: mapper.range_to_chars(d.range),
                ..d
            })
            .collect();
        let actions: Vec<CodeActionOrCommand> =
            get_code_actions(uri, &text, mapper.range_to_chars(params.range), &diagnostics)
                .into_iter()
                .map(|action| map_code_action(&mapper, action))
                .collect();
        debug!("Providing {} code actions for {}", actions.len(), uri);
        Ok(Some(actions))
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let uri = &params.text_document.uri;
        debug!("Document formatting request for: {}", uri);

        let Some(text) = self.text(uri) else {
            warn!("Cannot format non-existent document: {}", uri);
            return Ok(None);
        };
        let Some(edits) = format_document(&text) else {
            debug!("Document {} is already formatted correctly", uri);
            return Ok(None);
        };
        let mapper = self.mapper(&text);
        Ok(Some(map_edits(&mapper, edits)))
    }

    async fn prepare_rename(
        &self,
        params: TextDocumentPositionParams,
    ) -> Result<Option<PrepareRenameResponse>> {
        let Some(text) = self.text(&params.text_document.uri) else {
            return Ok(None);
        };
        let mapper = self.mapper(&text);
        Ok(
            prepare_rename(&text, mapper.to_chars(params.position)).map(|response| match response {
                PrepareRenameResponse::RangeWithPlaceholder { range, placeholder } => {
                    PrepareRenameResponse::RangeWithPlaceholder {
                        range: mapper.range_from_chars(range),
                        placeholder,
                    }
                }
                PrepareRenameResponse::Range(range) => {
                    PrepareRenameResponse::Range(mapper.range_from_chars(range))
                }
                other => other,
            }),
        )
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let Some(text) = self.text(uri) else {
            return Ok(None);
        };
        let mapper = self.mapper(&text);
        Ok(rename(uri, &text, mapper.to_chars(position), &params.new_name)
            .map(|edit| map_workspace_edit(&mapper, edit)))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let Some(text) = self.text(&params.text_document.uri) else {
            return Ok(None);
        };
        Ok(Some(get_folding_ranges(&text)))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let Some(text) = self.text(&params.text_document.uri) else {
            return Ok(None);
        };
        Ok(Some(SemanticTokensResult::Tokens(get_semantic_tokens_full(
            &text,
            self.position_encoding(),
        ))))
    }

    async fn semantic_tokens_range(
        &self,
        params: SemanticTokensRangeParams,
    ) -> Result<Option<SemanticTokensRangeResult>> {
        let Some(text) = self.text(&params.text_document.uri) else {
            return Ok(None);
        };
        Ok(Some(SemanticTokensRangeResult::Tokens(
            get_semantic_tokens_range(&text, params.range, self.position_encoding()),
        )))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        if COMMANDS.contains(&params.command.as_str()) {
            info!(
                "Executing command '{}' with {} arguments",
                params.command,
                params.arguments.len()
            );
        } else {
            warn!("Ignoring unknown command '{}'", params.command);
        }
        Ok(None)
    }
}
