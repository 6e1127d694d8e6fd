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

//! KDoc extraction and rendering.
//!
//! A documentation block is attached to a declaration only when it sits
//! directly above it (one blank line in between is allowed) and has the
//! shape
//!
//! ```text
//! /**
//!  * Free text.
//!  * @param name description
//!  */
//! fun declaration()
//! ```
//!
//! that is: an opener line starting with `/**`, body lines each starting
//! with `*`, and a closing line that is exactly `*/`. Anything else found
//! above the declaration means "no documentation".

use crate::analysis::{Declaration, DeclarationKind};
use crate::patterns::{BLOCK_COMMENT_CLOSE, DOC_COMMENT_OPEN};

/// A block tag such as `@param name text` or `@return text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTag {
    pub name: String,
    pub subject: Option<String>,
    pub text: String,
}

/// Parsed documentation comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    pub description: String,
    pub tags: Vec<DocTag>,
}

impl DocComment {
    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.tags.is_empty()
    }

    fn tagged<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DocTag> + 'a {
        self.tags.iter().filter(move |t| t.name == name)
    }
}

/// Tags whose first word names a subject (`@param x ...`).
const SUBJECT_TAGS: &[&str] = &["param", "property", "throws", "exception", "sample", "see"];

/// Find the raw body lines of the documentation block above `decl_line`.
///
/// The returned lines still carry their leading `*` markers.
pub fn find_doc_block<'a>(lines: &[&'a str], decl_line: usize) -> Option<Vec<&'a str>> {
    if decl_line == 0 || decl_line > lines.len() {
        return None;
    }
    let mut idx = decl_line - 1;
    if lines[idx].trim().is_empty() {
        idx = idx.checked_sub(1)?;
    }
    if lines[idx].trim() != BLOCK_COMMENT_CLOSE {
        return None;
    }

    let mut body = Vec::new();
    while idx > 0 {
        idx -= 1;
        let trimmed = lines[idx].trim();
        if let Some(rest) = trimmed.strip_prefix(DOC_COMMENT_OPEN) {
            if !rest.trim().is_empty() {
                body.push(rest);
            }
            body.reverse();
            return Some(body);
        }
        if !trimmed.starts_with('*') {
            return None;
        }
        body.push(trimmed);
    }
    None
}

fn strip_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line.strip_prefix('*').unwrap_or(line);
    line.strip_prefix(' ').unwrap_or(line).trim_end()
}

/// Parse body lines into description and tags.
pub fn parse_doc_block(body: &[&str]) -> DocComment {
    let mut description: Vec<&str> = Vec::new();
    let mut tags: Vec<DocTag> = Vec::new();

    for raw in body {
        let line = strip_marker(raw);
        if let Some(tag_line) = line.strip_prefix('@') {
            let (name, rest) = split_word(tag_line);
            let (subject, text) = if SUBJECT_TAGS.contains(&name) {
                let (subject, text) = split_word(rest);
                (Some(subject.to_string()).filter(|s| !s.is_empty()), text)
            } else {
                (None, rest)
            };
            tags.push(DocTag {
                name: name.to_string(),
                subject,
                text: text.to_string(),
            });
        } else if let Some(tag) = tags.last_mut() {
            if !line.is_empty() {
                if !tag.text.is_empty() {
                    tag.text.push(' ');
                }
                tag.text.push_str(line.trim());
            }
        } else {
            description.push(line);
        }
    }

    DocComment {
        description: join_paragraphs(&description),
        tags,
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim()),
        None => (s, ""),
    }
}

/// Join lines, keeping blank lines as paragraph breaks.
fn join_paragraphs(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut pending_break = false;
    for line in lines {
        if line.is_empty() {
            pending_break = !out.is_empty();
            continue;
        }
        if pending_break {
            out.push_str("\n\n");
            pending_break = false;
        } else if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(line);
    }
    out
}

/// Render parsed documentation as markdown for a declaration of `kind`.
///
/// Functions show the free-text description only; their `@param` and
/// `@return` tags are dropped.
pub fn render_documentation(kind: DeclarationKind, doc: &DocComment) -> String {
    let mut sections: Vec<String> = Vec::new();
    if !doc.description.is_empty() {
        sections.push(doc.description.clone());
    }

    match kind {
        DeclarationKind::Function => {
            let throws: Vec<String> = doc
                .tagged("throws")
                .chain(doc.tagged("exception"))
                .map(subject_item)
                .collect();
            if !throws.is_empty() {
                sections.push(format!("**Throws**\n{}", throws.join("\n")));
            }
        }
        DeclarationKind::Class | DeclarationKind::Enum => {
            let props: Vec<String> = doc
                .tagged("property")
                .chain(doc.tagged("param"))
                .map(subject_item)
                .collect();
            if !props.is_empty() {
                sections.push(format!("**Properties**\n{}", props.join("\n")));
            }
            if let Some(ctor) = doc.tagged("constructor").next() {
                if !ctor.text.is_empty() {
                    sections.push(format!("**Constructor**: {}", ctor.text));
                }
            }
        }
        DeclarationKind::Interface | DeclarationKind::Object | DeclarationKind::Property => {}
    }

    let see: Vec<String> = doc
        .tagged("see")
        .filter_map(|t| t.subject.as_ref().map(|s| format!("`{}`", s)))
        .collect();
    if !see.is_empty() {
        sections.push(format!("*See also:* {}", see.join(", ")));
    }

    sections.join("\n\n")
}

fn subject_item(tag: &DocTag) -> String {
    match (&tag.subject, tag.text.is_empty()) {
        (Some(subject), true) => format!("- `{}`", subject),
        (Some(subject), false) => format!("- `{}`: {}", subject, tag.text),
        (None, _) => format!("- {}", tag.text),
    }
}

/// Documentation for `decl` in `text`, rendered for its kind.
pub fn documentation_for(text: &str, decl: &Declaration) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let body = find_doc_block(&lines, decl.line as usize)?;
    let doc = parse_doc_block(&body);
    if doc.is_empty() {
        return None;
    }
    let rendered = render_documentation(decl.kind, &doc);
    (!rendered.is_empty()).then_some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extract_declaration;

    const GREET: &str = "\
/**
 * Greets someone.
 *
 * Politely.
 * @param name who to greet
 * @return the greeting
 */
fun greet(name: String): String = \"hi $name\"
";

    #[test]
    fn test_function_doc_drops_param_and_return() {
        let decl = extract_declaration(7, "fun greet(name: String): String = \"hi $name\"").unwrap();
        let doc = documentation_for(GREET, &decl).unwrap();
        assert_eq!(doc, "Greets someone.\n\nPolitely.");
    }

    #[test]
    fn test_parse_tags() {
        let lines: Vec<&str> = GREET.lines().collect();
        let body = find_doc_block(&lines, 7).unwrap();
        let doc = parse_doc_block(&body);
        assert_eq!(doc.tags.len(), 2);
        assert_eq!(doc.tags[0].name, "param");
        assert_eq!(doc.tags[0].subject.as_deref(), Some("name"));
        assert_eq!(doc.tags[0].text, "who to greet");
        assert_eq!(doc.tags[1].name, "return");
        assert_eq!(doc.tags[1].subject, None);
    }

    #[test]
    fn test_one_blank_line_allowed() {
        let text = "/**\n * A user.\n */\n\nclass User\n";
        let decl = extract_declaration(4, "class User").unwrap();
        assert_eq!(documentation_for(text, &decl).as_deref(), Some("A user."));
    }

    #[test]
    fn test_two_blank_lines_break_attachment() {
        let text = "/**\n * A user.\n */\n\n\nclass User\n";
        let decl = extract_declaration(5, "class User").unwrap();
        assert!(documentation_for(text, &decl).is_none());
    }

    #[test]
    fn test_other_line_in_between() {
        let text = "/**\n * A user.\n */\n@Serializable\nclass User\n";
        let decl = extract_declaration(4, "class User").unwrap();
        assert!(documentation_for(text, &decl).is_none());
    }

    #[test]
    fn test_plain_block_comment_not_documentation() {
        let lines = vec!["/*", " * Not docs.", " */", "class User"];
        assert!(find_doc_block(&lines, 3).is_none());
    }

    #[test]
    fn test_body_line_without_star() {
        let lines = vec!["/**", " * ok", "   broken", " */", "class User"];
        assert!(find_doc_block(&lines, 4).is_none());
    }

    #[test]
    fn test_class_properties() {
        let text = "/**\n * A point.\n * @property x horizontal\n * @property y\n */\ndata class Point(val x: Int, val y: Int)\n";
        let decl = extract_declaration(5, "data class Point(val x: Int, val y: Int)").unwrap();
        let doc = documentation_for(text, &decl).unwrap();
        assert!(doc.starts_with("A point."));
        assert!(doc.contains("**Properties**\n- `x`: horizontal\n- `y`"));
    }

    #[test]
    fn test_opener_with_text_and_tag_continuation() {
        let lines = vec!["/** Loads data.", " * @throws IOException when", " *   the disk fails", " */", "fun load()"];
        let body = find_doc_block(&lines, 4).unwrap();
        let doc = parse_doc_block(&body);
        assert_eq!(doc.description, "Loads data.");
        assert_eq!(doc.tags[0].text, "when the disk fails");
        let rendered = render_documentation(DeclarationKind::Function, &doc);
        assert!(rendered.contains("**Throws**\n- `IOException`: when the disk fails"));
    }

    #[test]
    fn test_first_line_has_no_docs() {
        let lines = vec!["class User"];
        assert!(find_doc_block(&lines, 0).is_none());
    }
}
