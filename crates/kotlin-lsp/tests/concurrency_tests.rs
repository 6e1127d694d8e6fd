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

//! Concurrency tests for kotlin-lsp.
//!
//! The document store is the only shared state, so these tests hammer it
//! from plain `std::thread`s while other threads run analyses on the
//! snapshots they read.

use kotlin_lsp::diagnostics::get_diagnostics;
use kotlin_lsp::folding::get_folding_ranges;
use kotlin_lsp::semantic_tokens::get_semantic_tokens_full;
use kotlin_lsp::symbols::get_document_symbols;
use kotlin_lsp::utils::PositionEncoding;
use kotlin_lsp::DocumentManager;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tower_lsp::lsp_types::Url;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn sample_document(variant: usize) -> String {
    format!(
        "import kotlin.math.max\n\nclass Service{} {{\n    val limit: Int = {}\n\n    fun run(): Int {{\n        return max(limit, 0)\n    }}\n}}\n",
        variant, variant
    )
}

fn test_uri(id: usize) -> Url {
    Url::parse(&format!("file:///src/Service{}.kt", id)).unwrap()
}

// ============================================================================
// DOCUMENT STORE
// ============================================================================

#[test]
fn test_concurrent_open_distinct_documents() {
    let manager = Arc::new(DocumentManager::new(1000, 1024 * 1024));
    let mut handles = vec![];

    for t in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let id = t * 100 + i;
                manager
                    .open(&test_uri(id), &sample_document(id), 1, "kotlin")
                    .expect("open failed");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(manager.len(), 200);
    for t in 0..8 {
        let snapshot = manager.snapshot(&test_uri(t * 100)).unwrap();
        assert!(snapshot.text.contains(&format!("class Service{} ", t * 100)));
    }
}

#[test]
fn test_versions_only_increase_under_contention() {
    let manager = Arc::new(DocumentManager::new(10, 1024 * 1024));
    let uri = test_uri(0);
    manager.open(&uri, &sample_document(0), 1, "kotlin").unwrap();

    let mut handles = vec![];
    for t in 0..6 {
        let manager = Arc::clone(&manager);
        let uri = uri.clone();
        handles.push(thread::spawn(move || {
            let mut last = 0;
            for i in 0..50 {
                // Half the writers send stale client versions.
                let supplied = if t % 2 == 0 { Some(i) } else { None };
                let version = manager
                    .update(&uri, &sample_document(t), supplied)
                    .expect("update failed");
                assert!(version > last, "version went from {} to {}", last, version);
                last = version;
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // Every update moved the version forward by at least one.
    assert!(manager.snapshot(&uri).unwrap().version >= 1 + 6 * 50);
}

#[test]
fn test_readers_never_see_partial_text() {
    let manager = Arc::new(DocumentManager::new(10, 1024 * 1024));
    let uri = test_uri(1);
    manager.open(&uri, &sample_document(0), 1, "kotlin").unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reads = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    {
        let manager = Arc::clone(&manager);
        let uri = uri.clone();
        let done = Arc::clone(&done);
        handles.push(thread::spawn(move || {
            for i in 0..200 {
                manager
                    .update(&uri, &sample_document(i % 7), None)
                    .expect("update failed");
            }
            done.store(true, Ordering::SeqCst);
        }));
    }

    for _ in 0..4 {
        let manager = Arc::clone(&manager);
        let uri = uri.clone();
        let done = Arc::clone(&done);
        let reads = Arc::clone(&reads);
        handles.push(thread::spawn(move || {
            let mut last_version = 0;
            while !done.load(Ordering::SeqCst) {
                let snapshot = manager.snapshot(&uri).expect("document vanished");
                let whole = (0..7).any(|v| *snapshot.text == sample_document(v));
                assert!(whole, "torn read: {:?}", snapshot.text);
                assert!(snapshot.version >= last_version);
                last_version = snapshot.version;
                reads.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    assert!(manager.statistics().hits as usize >= reads.load(Ordering::Relaxed));
}

#[test]
fn test_lru_eviction_under_concurrent_opens() {
    let max_cache = 16;
    let threads = 4;
    let manager = Arc::new(DocumentManager::new(max_cache, 1024 * 1024));
    let mut handles = vec![];

    for t in 0..threads {
        let manager = Arc::clone(&manager);
        handles.push(thread::spawn(move || {
            for i in 0..40 {
                let id = t * 1000 + i;
                manager
                    .open(&test_uri(id), &sample_document(id), 1, "kotlin")
                    .expect("open failed");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let stats = manager.statistics();
    assert!(stats.evictions > 0);
    assert!(stats.current_size < threads * 40);

    // Once writers are done the cap holds again after the next open.
    manager.set_max_cache_size(stats.current_size);
    manager
        .open(&test_uri(99_999), &sample_document(0), 1, "kotlin")
        .unwrap();
    assert_eq!(manager.len(), stats.current_size);
}

#[test]
fn test_concurrent_close_and_open() {
    let manager = Arc::new(DocumentManager::new(100, 1024 * 1024));
    let mut handles = vec![];

    for t in 0..4 {
        let manager = Arc::clone(&manager);
        handles.push(thread::spawn(move || {
            let uri = test_uri(t);
            for i in 0..100 {
                manager
                    .open(&uri, &sample_document(i), 1, "kotlin")
                    .expect("open failed");
                assert!(manager.remove(&uri));
            }
        }));
    }
    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert!(manager.is_empty());
}

// ============================================================================
// ANALYSIS ON SNAPSHOTS
// ============================================================================

#[test]
fn test_concurrent_analysis_while_writing() {
    let manager = Arc::new(DocumentManager::new(10, 1024 * 1024));
    let uri = test_uri(2);
    manager.open(&uri, &sample_document(0), 1, "kotlin").unwrap();

    let analyses = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    {
        let manager = Arc::clone(&manager);
        let uri = uri.clone();
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                manager
                    .update(&uri, &sample_document(i), None)
                    .expect("update failed");
            }
        }));
    }

    for _ in 0..4 {
        let manager = Arc::clone(&manager);
        let uri = uri.clone();
        let analyses = Arc::clone(&analyses);
        handles.push(thread::spawn(move || {
            for _ in 0..50 {
                let text = manager.text(&uri).expect("document vanished");
                assert!(get_diagnostics(&text).is_empty());
                assert_eq!(get_document_symbols(&text).len(), 3);
                assert!(!get_folding_ranges(&text).is_empty());
                let tokens = get_semantic_tokens_full(&text, PositionEncoding::Utf16);
                assert!(!tokens.data.is_empty());
                analyses.fetch_add(1, Ordering::Relaxed);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    assert_eq!(analyses.load(Ordering::Relaxed), 200);
}
