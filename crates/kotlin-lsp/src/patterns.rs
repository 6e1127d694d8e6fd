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

//! Pattern catalog for Kotlin sources.
//!
//! Fixed word sets (reserved words, built-in types, modifiers), the keyword
//! hover table, the discouraged-pattern table, and the structural regexes
//! every extractor matches against.
//!
//! Structural patterns anchor on the *trimmed* line. Patterns that embed a
//! specific name check the token boundary after it, so `fun greet` does not
//! match a search for `gree`.

use crate::analysis::DeclarationKind;
use once_cell::sync::Lazy;
use regex::Regex;

/// Kotlin hard and soft keywords.
pub const KEYWORDS: &[&str] = &[
    // hard
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw",
    "true", "try", "typealias", "typeof", "val", "var", "when", "while",
    // soft
    "by", "catch", "constructor", "delegate", "dynamic", "field", "file", "finally", "get",
    "import", "init", "param", "property", "receiver", "set", "setparam", "where",
];

/// Kotlin modifier keywords.
pub const MODIFIERS: &[&str] = &[
    "abstract", "actual", "annotation", "companion", "const", "crossinline", "data", "enum",
    "expect", "external", "final", "infix", "inline", "inner", "internal", "lateinit",
    "noinline", "open", "operator", "out", "override", "private", "protected", "public",
    "reified", "sealed", "suspend", "tailrec", "vararg", "value",
];

/// Built-in and standard library type names.
pub const BUILTIN_TYPES: &[&str] = &[
    "Any", "Unit", "Nothing", "Int", "Long", "Short", "Byte", "Float", "Double", "Boolean",
    "Char", "String", "Number", "Array", "IntArray", "LongArray", "ByteArray", "CharArray",
    "DoubleArray", "FloatArray", "BooleanArray", "List", "MutableList", "Set", "MutableSet",
    "Map", "MutableMap", "Collection", "Iterable", "Sequence", "Pair", "Triple", "Result",
    "Comparable", "Throwable", "Exception",
];

/// Short static descriptions shown when hovering a reserved word.
pub const KEYWORD_DOCS: &[(&str, &str)] = &[
    ("val", "Declares a read-only property or local variable. It can be assigned only once."),
    ("var", "Declares a mutable property or local variable."),
    ("fun", "Declares a function."),
    ("class", "Declares a class."),
    ("interface", "Declares an interface."),
    ("object", "Declares a singleton object, or an object expression."),
    ("when", "Conditional expression matching its argument against a sequence of branches."),
    ("if", "Conditional expression."),
    ("else", "Alternative branch of an `if` or `when` expression."),
    ("for", "Iterates over anything that provides an iterator."),
    ("while", "Loop executed while its condition holds."),
    ("return", "Returns from the nearest enclosing function or anonymous function."),
    ("null", "The value of a nullable reference that points to nothing."),
    ("is", "Checks that a value has a certain type, enabling a smart cast."),
    ("as", "Casts a value to a type, or renames an import."),
    ("in", "Membership check, range iteration, or contravariant type parameter."),
    ("try", "Begins a block whose exceptions can be handled by `catch`."),
    ("throw", "Throws an exception."),
    ("import", "Makes a declaration from another package available by its simple name."),
    ("package", "Declares the package of the current file."),
    ("this", "Refers to the current receiver."),
    ("super", "Refers to the superclass implementation of a member."),
    ("typealias", "Declares an alternative name for an existing type."),
    ("by", "Delegates an interface implementation or a property accessor."),
];

/// A discouraged substring, the message reported for it, and its suggested
/// replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscouragedPattern {
    pub needle: &'static str,
    pub message: &'static str,
    pub replacement: &'static str,
}

pub const DISCOURAGED_PATTERNS: &[DiscouragedPattern] = &[
    DiscouragedPattern {
        needle: "!!",
        message: "avoid the not-null assertion operator '!!', prefer a safe call '?.'",
        replacement: "?.",
    },
    DiscouragedPattern {
        needle: "Thread.sleep(",
        message: "avoid blocking 'Thread.sleep(', prefer the suspending 'delay('",
        replacement: "delay(",
    },
    DiscouragedPattern {
        needle: "System.out.println(",
        message: "avoid 'System.out.println(', prefer 'println('",
        replacement: "println(",
    },
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_modifier(word: &str) -> bool {
    MODIFIERS.contains(&word)
}

pub fn is_builtin_type(word: &str) -> bool {
    BUILTIN_TYPES.contains(&word)
}

/// Static hover text for a reserved word.
pub fn keyword_doc(word: &str) -> Option<&'static str> {
    KEYWORD_DOCS
        .iter()
        .find(|(kw, _)| *kw == word)
        .map(|(_, doc)| *doc)
}

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_]*";

/// End of a looked-up name: any char that can not continue an identifier.
/// Matches `utils::is_identifier_char`, which accepts Unicode letters and
/// digits.
const NAME_END: &str = r"(?:[^\p{Alphabetic}\p{N}_]|$)";

/// Zero or more modifier keywords, each followed by whitespace, captured as
/// one group. Annotations such as `@JvmStatic` may precede them.
fn modifiers_group() -> String {
    format!(
        r"((?:@{ident}(?:\([^)]*\))?\s+)*(?:(?:{mods})\s+)*)",
        ident = IDENT,
        mods = MODIFIERS.join("|")
    )
}

fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        // Built from constants and escaped names only.
        Err(e) => panic!("invalid built-in pattern {pattern:?}: {e}"),
    }
}

/// `class Name`, `data class Name`, `enum class Name`.
/// Groups: 1 modifiers (including `enum`), 2 name.
pub static CLASS_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"^{mods}class\s+({ident})",
        mods = modifiers_group(),
        ident = IDENT
    ))
});

/// `interface Name`, `fun interface Name`. Groups: 1 modifiers, 2 name.
pub static INTERFACE_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"^{mods}(?:fun\s+)?interface\s+({ident})",
        mods = modifiers_group(),
        ident = IDENT
    ))
});

/// `object Name`, `companion object Name`. Groups: 1 modifiers, 2 name.
pub static OBJECT_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"^{mods}object\s+({ident})",
        mods = modifiers_group(),
        ident = IDENT
    ))
});

/// `fun name(params)`, with optional type parameters and receiver.
/// Groups: 1 modifiers, 2 name, 3 parameters, 4 closing paren.
pub static FUNCTION_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"^{mods}fun\s+(?:<[^>]*>\s*)?(?:[A-Za-z_][A-Za-z0-9_<>?,\s]*\.)?({ident})\s*\(([^)]*)(\))?",
        mods = modifiers_group(),
        ident = IDENT
    ))
});

/// Return type following a function's closing paren.
pub static RETURN_TYPE: Lazy<Regex> = Lazy::new(|| compile(r"^\s*:\s*([^{=]+)"));

/// `val name: Type = ...`, `var name`. Groups: 1 modifiers, 2 val/var,
/// 3 name, 4 type.
pub static PROPERTY_DECL: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"^{mods}(val|var)\s+(?:[A-Za-z_][A-Za-z0-9_<>?]*\.)?({ident})(?:\s*:\s*([^=]+?))?\s*(?:=|\bby\b|$)",
        mods = modifiers_group(),
        ident = IDENT
    ))
});

/// `import a.b.C` or `import a.b.C as D`. Groups: 1 path, 2 alias.
pub static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| {
    compile(&format!(
        r"^import\s+({ident}(?:\.{ident})*(?:\.\*)?)(?:\s+as\s+({ident}))?",
        ident = IDENT
    ))
});

/// String and character literals.
pub static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| compile(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)'"#));

/// Numeric literals: hex, binary, decimal with optional fraction, exponent
/// and suffix.
pub static NUMBER_LITERAL: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(?:0[xX][0-9A-Fa-f_]+|0[bB][01_]+|[0-9][0-9_]*(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?)[fFLuU]?\b")
});

pub const LINE_COMMENT: &str = "//";
pub const BLOCK_COMMENT_OPEN: &str = "/*";
pub const BLOCK_COMMENT_CLOSE: &str = "*/";
pub const DOC_COMMENT_OPEN: &str = "/**";

pub fn is_line_comment(trimmed: &str) -> bool {
    trimmed.starts_with(LINE_COMMENT)
}

pub fn is_import_line(trimmed: &str) -> bool {
    IMPORT_LINE.is_match(trimmed)
}

/// Trailing simple name of an import, honoring `as` aliases.
///
/// Returns `None` for wildcard imports and for lines that are not imports.
pub fn import_simple_name(trimmed: &str) -> Option<String> {
    let caps = IMPORT_LINE.captures(trimmed)?;
    if let Some(alias) = caps.get(2) {
        return Some(alias.as_str().to_string());
    }
    let path = caps.get(1)?.as_str();
    if path.ends_with(".*") {
        return None;
    }
    path.rsplit('.').next().map(str::to_string)
}

/// Boundary-checked pattern for a declaration of `kind` named `name`.
///
/// All class-like kinds (class, enum, object, interface) are matched by a
/// single alternation since a lookup by name does not know which one the
/// user meant.
pub fn declaration_of_kind(kind: DeclarationKind, name: &str) -> Regex {
    let mods = modifiers_group();
    let name = regex::escape(name);
    let pattern = match kind {
        DeclarationKind::Class
        | DeclarationKind::Enum
        | DeclarationKind::Object
        | DeclarationKind::Interface => format!(
            r"^{mods}(?:(?:enum\s+)?class|(?:fun\s+)?interface|object)\s+{name}{end}",
            end = NAME_END
        ),
        DeclarationKind::Function => function_declaration_pattern(&mods, &name),
        DeclarationKind::Property => property_declaration_pattern(&mods, &name),
    };
    compile(&pattern)
}

/// Boundary-checked pattern for `fun name(`.
pub fn function_declaration(name: &str) -> Regex {
    compile(&function_declaration_pattern(
        &modifiers_group(),
        &regex::escape(name),
    ))
}

/// Boundary-checked pattern for `val name` / `var name`.
pub fn property_declaration(name: &str) -> Regex {
    compile(&property_declaration_pattern(
        &modifiers_group(),
        &regex::escape(name),
    ))
}

fn function_declaration_pattern(mods: &str, name: &str) -> String {
    format!(
        r"^{mods}fun\s+(?:<[^>]*>\s*)?(?:[A-Za-z_][A-Za-z0-9_<>?,\s]*\.)?{name}\s*\("
    )
}

fn property_declaration_pattern(mods: &str, name: &str) -> String {
    format!(
        r"^{mods}(?:val|var)\s+(?:[A-Za-z_][A-Za-z0-9_<>?]*\.)?{name}{end}",
        end = NAME_END
    )
}
