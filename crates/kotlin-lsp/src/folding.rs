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

//! Folding regions.
//!
//! Five independent passes contribute regions:
//!
//! 1. **Braces**: a stack of `(line, kind)` pushed on `{` and popped on `}`
//! 2. **Functions**: each `fun ... {` opener matched to its closing brace
//! 3. **Block comments**: `/* ... */` and `/** ... */` across lines
//! 4. **Comment runs**: three or more consecutive `//` lines
//! 5. **Import runs**: three or more consecutive `import` lines
//!
//! The union is sorted by start line. Passes are not merged, so a function
//! body is reported by both the brace pass and the function pass.
//!
//! Malformed input is tolerated: closers without an opener are ignored and
//! unterminated blocks or comments simply produce no region.

use crate::analysis::{extract_declaration, DeclarationKind};
use crate::constants::{MIN_COMMENT_RUN, MIN_IMPORT_RUN};
use crate::patterns::{
    is_import_line, is_line_comment, BLOCK_COMMENT_CLOSE, BLOCK_COMMENT_OPEN, DOC_COMMENT_OPEN,
};
use tower_lsp::lsp_types::{FoldingRange, FoldingRangeKind};
use tracing::debug;

/// Kind of block opened by a `{`, inferred from the opening line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Class, interface, object or enum body.
    Type,
    Function,
    /// Any other block (control flow, lambdas, initializers).
    Block,
}

/// A line span `[start_line, end_line]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start_line: u32,
    pub end_line: u32,
}

/// A brace-delimited region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceRegion {
    pub span: LineSpan,
    pub kind: BlockKind,
}

/// A block comment region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRegion {
    pub span: LineSpan,
    /// Opened with `/**`.
    pub documentation: bool,
}

fn infer_block_kind(line_idx: u32, line: &str) -> BlockKind {
    match extract_declaration(line_idx, line).map(|d| d.kind) {
        Some(DeclarationKind::Function) => BlockKind::Function,
        Some(kind) if kind.is_type_like() => BlockKind::Type,
        _ => BlockKind::Block,
    }
}

/// Brace-delimited regions spanning more than one line.
pub fn brace_regions(text: &str) -> Vec<BraceRegion> {
    let mut stack: Vec<(u32, BlockKind)> = Vec::new();
    let mut regions = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_idx = idx as u32;
        for ch in line.chars() {
            match ch {
                '{' => stack.push((line_idx, infer_block_kind(line_idx, line))),
                '}' => {
                    if let Some((start_line, kind)) = stack.pop() {
                        if line_idx > start_line {
                            regions.push(BraceRegion {
                                span: LineSpan {
                                    start_line,
                                    end_line: line_idx,
                                },
                                kind,
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if !stack.is_empty() {
        debug!("{} unclosed braces ignored for folding", stack.len());
    }
    regions
}

/// Regions keyed only on function openers.
pub fn function_regions(text: &str) -> Vec<LineSpan> {
    let lines: Vec<&str> = text.lines().collect();
    let mut regions = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let is_function = extract_declaration(idx as u32, line)
            .is_some_and(|d| d.kind == DeclarationKind::Function);
        let Some(open) = line.find('{') else {
            continue;
        };
        if !is_function {
            continue;
        }

        let mut depth = 0usize;
        let mut close_line = None;
        'scan: for (offset, scan) in lines[idx..].iter().enumerate() {
            let chars: &str = if offset == 0 { &scan[open..] } else { scan };
            for ch in chars.chars() {
                match ch {
                    '{' => depth += 1,
                    '}' => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            close_line = Some(idx + offset);
                            break 'scan;
                        }
                    }
                    _ => {}
                }
            }
        }

        if let Some(end) = close_line.filter(|end| *end > idx) {
            regions.push(LineSpan {
                start_line: idx as u32,
                end_line: end as u32,
            });
        }
    }
    regions
}

/// Block and documentation comments spanning more than one line.
pub fn block_comment_regions(text: &str) -> Vec<CommentRegion> {
    let mut regions = Vec::new();
    let mut open: Option<(u32, bool)> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_idx = idx as u32;
        match open {
            None => {
                let Some(pos) = line.find(BLOCK_COMMENT_OPEN) else {
                    continue;
                };
                let after = &line[pos + BLOCK_COMMENT_OPEN.len()..];
                if after.contains(BLOCK_COMMENT_CLOSE) {
                    continue;
                }
                let documentation = line[pos..].starts_with(DOC_COMMENT_OPEN);
                open = Some((line_idx, documentation));
            }
            Some((start_line, documentation)) => {
                if line.contains(BLOCK_COMMENT_CLOSE) {
                    regions.push(CommentRegion {
                        span: LineSpan {
                            start_line,
                            end_line: line_idx,
                        },
                        documentation,
                    });
                    open = None;
                }
            }
        }
    }
    regions
}

/// Runs of at least `min_len` consecutive lines satisfying `pred`,
/// including a run that reaches the end of the document.
fn consecutive_runs(text: &str, min_len: usize, pred: impl Fn(&str) -> bool) -> Vec<LineSpan> {
    let mut runs = Vec::new();
    let mut run_start: Option<usize> = None;
    let mut line_total = 0;

    let close = |start: usize, end_exclusive: usize, runs: &mut Vec<LineSpan>| {
        if end_exclusive - start >= min_len {
            runs.push(LineSpan {
                start_line: start as u32,
                end_line: (end_exclusive - 1) as u32,
            });
        }
    };

    for (idx, line) in text.lines().enumerate() {
        line_total = idx + 1;
        if pred(line.trim()) {
            run_start.get_or_insert(idx);
        } else if let Some(start) = run_start.take() {
            close(start, idx, &mut runs);
        }
    }
    if let Some(start) = run_start {
        close(start, line_total, &mut runs);
    }
    runs
}

/// Runs of three or more `//` comment lines.
pub fn line_comment_runs(text: &str) -> Vec<LineSpan> {
    consecutive_runs(text, MIN_COMMENT_RUN, is_line_comment)
}

/// Runs of three or more import lines.
pub fn import_runs(text: &str) -> Vec<LineSpan> {
    consecutive_runs(text, MIN_IMPORT_RUN, is_import_line)
}

fn folding_range(span: LineSpan, kind: Option<FoldingRangeKind>) -> FoldingRange {
    FoldingRange {
        start_line: span.start_line,
        start_character: None,
        end_line: span.end_line,
        end_character: None,
        kind,
        collapsed_text: None,
    }
}

/// All folding ranges of the document, sorted by start line.
pub fn get_folding_ranges(text: &str) -> Vec<FoldingRange> {
    let mut ranges: Vec<FoldingRange> = Vec::new();

    ranges.extend(
        brace_regions(text)
            .into_iter()
            .map(|r| folding_range(r.span, None)),
    );
    ranges.extend(
        function_regions(text)
            .into_iter()
            .map(|span| folding_range(span, Some(FoldingRangeKind::Region))),
    );
    ranges.extend(
        block_comment_regions(text)
            .into_iter()
            .map(|r| folding_range(r.span, Some(FoldingRangeKind::Comment))),
    );
    ranges.extend(
        line_comment_runs(text)
            .into_iter()
            .map(|span| folding_range(span, Some(FoldingRangeKind::Comment))),
    );
    ranges.extend(
        import_runs(text)
            .into_iter()
            .map(|span| folding_range(span, Some(FoldingRangeKind::Imports))),
    );

    ranges.sort_by_key(|r| r.start_line);
    debug!("Computed {} folding ranges", ranges.len());
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brace_regions_nested() {
        let text = "class A {\n    fun f() {\n        x()\n    }\n}\n";
        let regions = brace_regions(text);
        assert_eq!(
            regions,
            vec![
                BraceRegion {
                    span: LineSpan { start_line: 1, end_line: 3 },
                    kind: BlockKind::Function,
                },
                BraceRegion {
                    span: LineSpan { start_line: 0, end_line: 4 },
                    kind: BlockKind::Type,
                },
            ]
        );
    }

    #[test]
    fn test_single_line_blocks_do_not_fold() {
        assert!(brace_regions("fun f() { return 1 }\n").is_empty());
    }

    #[test]
    fn test_unmatched_closers_are_ignored() {
        let text = "}\n}\nif (x) {\n}\n";
        let regions = brace_regions(text);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].span, LineSpan { start_line: 2, end_line: 3 });
        assert_eq!(regions[0].kind, BlockKind::Block);
    }

    #[test]
    fn test_function_regions() {
        let text = "fun a() {\n    if (x) {\n    }\n}\nfun b() = 1\n";
        assert_eq!(
            function_regions(text),
            vec![LineSpan { start_line: 0, end_line: 3 }]
        );
    }

    #[test]
    fn test_block_comment_regions() {
        let text = "/**\n * Doc\n */\nclass A\n/* one line */\n/*\n plain\n*/\n";
        let regions = block_comment_regions(text);
        assert_eq!(regions.len(), 2);
        assert!(regions[0].documentation);
        assert_eq!(regions[0].span, LineSpan { start_line: 0, end_line: 2 });
        assert!(!regions[1].documentation);
        assert_eq!(regions[1].span, LineSpan { start_line: 5, end_line: 7 });
    }

    #[test]
    fn test_comment_runs_need_three_lines() {
        let text = "// a\n// b\nval x = 1\n// c\n// d\n// e\n";
        assert_eq!(
            line_comment_runs(text),
            vec![LineSpan { start_line: 3, end_line: 5 }]
        );
    }

    #[test]
    fn test_import_run_at_end_of_file() {
        let text = "package p\n\nimport a.B\nimport a.C\nimport a.D";
        assert_eq!(
            import_runs(text),
            vec![LineSpan { start_line: 2, end_line: 4 }]
        );
    }

    #[test]
    fn test_folding_ranges_sorted() {
        let text = "import a.B\nimport a.C\nimport a.D\n\nclass A {\n    fun f() {\n    }\n}\n";
        let ranges = get_folding_ranges(text);
        let starts: Vec<u32> = ranges.iter().map(|r| r.start_line).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
        assert!(ranges.iter().all(|r| r.start_line < r.end_line));
        assert!(ranges
            .iter()
            .any(|r| r.kind == Some(FoldingRangeKind::Imports) && r.end_line == 2));
        // The function body is reported by both the brace and function passes.
        assert_eq!(ranges.iter().filter(|r| r.start_line == 5).count(), 2);
    }
}
