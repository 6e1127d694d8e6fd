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

//! Document store with LRU eviction.
//!
//! This module owns the text of every open document. It is the only shared
//! mutable state in the server: analysis results are never cached, every
//! request takes a [`DocumentSnapshot`] and re-derives what it needs.
//!
//! # Responsibilities
//!
//! - Document storage keyed by URI
//! - Version tracking (versions only increase)
//! - LRU-based eviction when too many documents are open
//! - Document size limit enforcement
//! - Cache statistics
//!
//! # Thread Safety
//!
//! Documents live in a `DashMap` so independent documents can be read and
//! written in parallel. Each document state sits behind a
//! `parking_lot::RwLock`: writers replace the whole text under the write
//! lock, readers copy out an immutable snapshot under the read lock, so a
//! request never observes a half-applied change.

use crate::error::{Result, ServerError};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use ropey::Rope;
use std::sync::Arc;
use std::time::Instant;
use tower_lsp::lsp_types::Url;
use tracing::{debug, error, info, warn};

use crate::constants::LANGUAGE_ID;
pub use crate::constants::{DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_DOCUMENT_SIZE};

/// Stored state of one open document.
pub struct DocumentState {
    /// Current content.
    pub rope: Rope,
    /// Version counter, strictly increasing across changes.
    pub version: i32,
    /// Language tag declared by the client on open.
    pub language_id: String,
    /// Last access timestamp for LRU eviction.
    pub last_access: Instant,
}

/// Immutable view of a document handed to request handlers.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub uri: Url,
    pub text: Arc<str>,
    pub version: i32,
    pub language_id: String,
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct CacheStatistics {
    /// Snapshot requests that found the document.
    pub hits: u64,
    /// Snapshot requests for documents that are not open.
    pub misses: u64,
    /// Documents evicted due to the open-document limit.
    pub evictions: u64,
    /// Current number of open documents.
    pub current_size: usize,
    /// Maximum number of open documents.
    pub max_size: usize,
}

/// Document store with LRU eviction and size limits.
///
/// # Example
///
/// ```
/// use kotlin_lsp::document_manager::DocumentManager;
/// use tower_lsp::lsp_types::Url;
///
/// let manager = DocumentManager::new(100, 1024 * 1024);
/// let uri = Url::parse("file:///Main.kt").unwrap();
/// manager.open(&uri, "fun main() {}\n", 1, "kotlin").unwrap();
///
/// let snapshot = manager.snapshot(&uri).unwrap();
/// assert_eq!(&*snapshot.text, "fun main() {}\n");
/// assert_eq!(snapshot.version, 1);
/// ```
pub struct DocumentManager {
    documents: DashMap<Url, Arc<RwLock<DocumentState>>>,
    cache_stats: Mutex<CacheStatistics>,
    max_cache_size: RwLock<usize>,
    max_document_size: RwLock<usize>,
}

impl Default for DocumentManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_SIZE, DEFAULT_MAX_DOCUMENT_SIZE)
    }
}

impl DocumentManager {
    /// Create a new document store with the given limits.
    pub fn new(max_cache_size: usize, max_document_size: usize) -> Self {
        Self {
            documents: DashMap::new(),
            cache_stats: Mutex::new(CacheStatistics {
                max_size: max_cache_size,
                ..Default::default()
            }),
            max_cache_size: RwLock::new(max_cache_size),
            max_document_size: RwLock::new(max_document_size),
        }
    }

    /// Get current cache statistics.
    pub fn statistics(&self) -> CacheStatistics {
        let mut stats = self.cache_stats.lock();
        stats.current_size = self.documents.len();
        stats.clone()
    }

    /// Update the open-document limit.
    pub fn set_max_cache_size(&self, new_max: usize) {
        *self.max_cache_size.write() = new_max;
        self.cache_stats.lock().max_size = new_max;
        debug!("Cache max size updated to: {}", new_max);
    }

    pub fn max_cache_size(&self) -> usize {
        *self.max_cache_size.read()
    }

    /// Update the per-document size limit.
    pub fn set_max_document_size(&self, new_max: usize) {
        *self.max_document_size.write() = new_max;
        debug!("Max document size updated to: {} bytes", new_max);
    }

    pub fn max_document_size(&self) -> usize {
        *self.max_document_size.read()
    }

    fn check_size(&self, uri: &Url, text: &str) -> Result<()> {
        let max = self.max_document_size();
        if text.len() > max {
            warn!(
                "Document size limit exceeded for {}: {} bytes > {} bytes maximum (rejected)",
                uri,
                text.len(),
                max
            );
            return Err(ServerError::DocumentTooLarge {
                uri: uri.clone(),
                size: text.len(),
                max,
            });
        }
        Ok(())
    }

    /// Store a newly opened document.
    ///
    /// Opening a URI that is already open replaces its text, keeping the
    /// version monotonic.
    pub fn open(&self, uri: &Url, text: &str, version: i32, language_id: &str) -> Result<()> {
        self.check_size(uri, text)?;

        if let Some(state_ref) = self.documents.get(uri) {
            let mut state = state_ref.write();
            state.rope = Rope::from_str(text);
            state.version = next_version(state.version, Some(version));
            state.language_id = language_id.to_string();
            state.last_access = Instant::now();
            debug!("Re-opened document {} at version {}", uri, state.version);
            return Ok(());
        }

        self.insert_new(uri, text, version, language_id);
        Ok(())
    }

    fn insert_new(&self, uri: &Url, text: &str, version: i32, language_id: &str) {
        let max_cache = self.max_cache_size();
        if self.documents.len() >= max_cache {
            warn!(
                "Cache limit reached ({}/{}), triggering LRU eviction before inserting {}",
                self.documents.len(),
                max_cache,
                uri
            );
            self.evict_lru_document();
        }

        let state = DocumentState {
            rope: Rope::from_str(text),
            version,
            language_id: language_id.to_string(),
            last_access: Instant::now(),
        };
        self.documents
            .insert(uri.clone(), Arc::new(RwLock::new(state)));
        debug!(
            "New document registered: {} ({} bytes, version {}, language '{}')",
            uri,
            text.len(),
            version,
            language_id
        );
    }

    /// Replace the whole text of a document.
    ///
    /// Returns the version now stored. A client version that does not move
    /// forward is replaced by the stored version plus one. A document missing
    /// from the store (evicted while the editor kept it open) is inserted
    /// again with the supplied version, or 1.
    pub fn update(&self, uri: &Url, text: &str, version: Option<i32>) -> Result<i32> {
        self.check_size(uri, text)?;

        let Some(state_ref) = self.documents.get(uri).map(|entry| Arc::clone(entry.value()))
        else {
            let version = version.unwrap_or(1);
            info!("Document {} not in store, re-inserting at version {}", uri, version);
            self.insert_new(uri, text, version, LANGUAGE_ID);
            return Ok(version);
        };
        let mut state = state_ref.write();
        let new_version = next_version(state.version, version);
        if version.is_some_and(|v| v != new_version) {
            warn!(
                "Stale version {:?} for {} (stored {}), using {}",
                version, uri, state.version, new_version
            );
        }
        state.rope = Rope::from_str(text);
        state.version = new_version;
        state.last_access = Instant::now();
        debug!(
            "Document {} updated to version {} ({} bytes)",
            uri,
            new_version,
            text.len()
        );
        Ok(new_version)
    }

    /// Take an immutable snapshot of a document.
    ///
    /// Returns `None` if the document is not open.
    pub fn snapshot(&self, uri: &Url) -> Option<DocumentSnapshot> {
        let snapshot = self.documents.get(uri).map(|entry| {
            let mut state = entry.write();
            state.last_access = Instant::now();
            DocumentSnapshot {
                uri: uri.clone(),
                text: Arc::from(state.rope.to_string()),
                version: state.version,
                language_id: state.language_id.clone(),
            }
        });

        let mut stats = self.cache_stats.lock();
        if snapshot.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        snapshot
    }

    /// Text of a document, if open.
    pub fn text(&self, uri: &Url) -> Option<Arc<str>> {
        self.snapshot(uri).map(|s| s.text)
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    /// Remove a document. Returns `true` if it was open.
    pub fn remove(&self, uri: &Url) -> bool {
        self.documents.remove(uri).is_some()
    }

    /// All open document URIs.
    pub fn all_uris(&self) -> Vec<Url> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn evict_lru_document(&self) {
        if self.documents.is_empty() {
            warn!("LRU eviction requested but cache is empty (no-op)");
            return;
        }

        let mut lru: Option<(Url, Instant)> = None;
        for entry in self.documents.iter() {
            let last_access = entry.value().read().last_access;
            if lru.as_ref().map_or(true, |(_, t)| last_access < *t) {
                lru = Some((entry.key().clone(), last_access));
            }
        }

        match lru {
            Some((uri, last_access)) => {
                warn!(
                    "Evicting LRU document {} (idle for {:?})",
                    uri,
                    last_access.elapsed()
                );
                self.documents.remove(&uri);
                let mut stats = self.cache_stats.lock();
                stats.evictions += 1;
            }
            None => error!("LRU eviction failed: no document found despite non-empty cache"),
        }
    }

    /// Remove every document and reset the counters.
    pub fn clear(&self) {
        self.documents.clear();
        let mut stats = self.cache_stats.lock();
        stats.hits = 0;
        stats.misses = 0;
        stats.evictions = 0;
    }
}

fn next_version(current: i32, supplied: Option<i32>) -> i32 {
    match supplied {
        Some(v) if v > current => v,
        _ => current.saturating_add(1),
    }
}
