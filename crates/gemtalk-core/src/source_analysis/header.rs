// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Selector shapes and method header lines.
//!
//! A method's first line is its signature: `foo`, `+ other`, or
//! `at: index put: value`. Planners parse it to learn the selector and
//! argument names, and render new signatures when a selector changes.

use ecow::EcoString;
use serde::Serialize;

use super::scan::{MAX_BINARY_LEN, ident_end, is_binary_char, is_ident_start, is_identifier};

/// The three selector shapes of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    /// `foo`: no arguments.
    Unary,
    /// `+`, `->`, `<=`: one argument.
    Binary,
    /// `at:put:`: one argument per keyword token.
    Keyword,
}

impl std::fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Unary => "unary",
            Self::Binary => "binary",
            Self::Keyword => "keyword",
        })
    }
}

/// Classifies a selector string, or returns `None` if it is malformed.
///
/// # Examples
///
/// ```
/// use gemtalk_core::source_analysis::{SelectorKind, selector_kind};
///
/// assert_eq!(selector_kind("size"), Some(SelectorKind::Unary));
/// assert_eq!(selector_kind("<="), Some(SelectorKind::Binary));
/// assert_eq!(selector_kind("at:put:"), Some(SelectorKind::Keyword));
/// assert_eq!(selector_kind("at:put"), None);
/// ```
#[must_use]
pub fn selector_kind(selector: &str) -> Option<SelectorKind> {
    if is_identifier(selector) {
        return Some(SelectorKind::Unary);
    }
    let bytes = selector.as_bytes();
    if !bytes.is_empty() && bytes.len() <= MAX_BINARY_LEN && bytes.iter().all(|&b| is_binary_char(b)) {
        return Some(SelectorKind::Binary);
    }
    if selector.ends_with(':') && keyword_parts(selector).iter().all(|part| is_identifier(&part[..part.len() - 1])) {
        return Some(SelectorKind::Keyword);
    }
    None
}

/// Splits a keyword selector into its tokens, colons kept: `at:put:` → `["at:", "put:"]`.
#[must_use]
pub fn keyword_parts(selector: &str) -> Vec<&str> {
    selector.split_inclusive(':').collect()
}

/// Number of arguments a well-formed selector takes.
#[must_use]
pub fn selector_arity(selector: &str) -> usize {
    match selector_kind(selector) {
        Some(SelectorKind::Unary) | None => 0,
        Some(SelectorKind::Binary) => 1,
        Some(SelectorKind::Keyword) => keyword_parts(selector).len(),
    }
}

/// A parsed method signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodHeader {
    /// Full selector, e.g. `at:put:`.
    pub selector: EcoString,
    /// Selector shape.
    pub kind: SelectorKind,
    /// Selector tokens: one entry for unary/binary, one per keyword otherwise.
    pub parts: Vec<EcoString>,
    /// Argument names in order.
    pub arguments: Vec<EcoString>,
    /// Byte offset just past the signature within the header line.
    #[serde(skip)]
    pub signature_end: usize,
}

impl MethodHeader {
    /// Parses the signature at the start of `line`.
    ///
    /// Anything after the signature (a trailing comment, or the body of a
    /// one-line method) is left alone; `signature_end` marks where it starts.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let bytes = line.as_bytes();
        let mut pos = skip_blanks(bytes, 0);
        let first = *bytes.get(pos)?;

        if is_binary_char(first) {
            let start = pos;
            while pos < bytes.len() && is_binary_char(bytes[pos]) && pos - start < MAX_BINARY_LEN {
                pos += 1;
            }
            let selector = &line[start..pos];
            let arg_start = skip_blanks(bytes, pos);
            let arg_end = ident_end(bytes, arg_start);
            let argument = &line[arg_start..arg_end];
            if !is_identifier(argument) || is_binary_char(*bytes.get(pos).unwrap_or(&b' ')) {
                return None;
            }
            return Some(Self {
                selector: selector.into(),
                kind: SelectorKind::Binary,
                parts: vec![selector.into()],
                arguments: vec![argument.into()],
                signature_end: arg_end,
            });
        }

        if !is_ident_start(first) {
            return None;
        }

        let word_end = ident_end(bytes, pos);
        if bytes.get(word_end) != Some(&b':') || bytes.get(word_end + 1) == Some(&b'=') {
            let selector = &line[pos..word_end];
            return Some(Self {
                selector: selector.into(),
                kind: SelectorKind::Unary,
                parts: vec![selector.into()],
                arguments: Vec::new(),
                signature_end: word_end,
            });
        }

        let mut parts = Vec::new();
        let mut arguments = Vec::new();
        let mut signature_end = pos;
        loop {
            let word_end = ident_end(bytes, pos);
            if word_end == pos || bytes.get(word_end) != Some(&b':') {
                break;
            }
            let keyword = &line[pos..=word_end];
            let arg_start = skip_blanks(bytes, word_end + 1);
            let arg_end = ident_end(bytes, arg_start);
            let argument = &line[arg_start..arg_end];
            if !is_identifier(argument) || bytes.get(arg_end) == Some(&b':') {
                break;
            }
            parts.push(EcoString::from(keyword));
            arguments.push(EcoString::from(argument));
            signature_end = arg_end;
            pos = skip_blanks(bytes, arg_end);
            if pos >= bytes.len() || !is_ident_start(bytes[pos]) {
                break;
            }
        }

        if parts.is_empty() {
            return None;
        }
        let selector = EcoString::from(parts.iter().map(EcoString::as_str).collect::<String>());
        Some(Self {
            selector,
            kind: SelectorKind::Keyword,
            parts,
            arguments,
            signature_end,
        })
    }

    /// Builds a header from selector tokens and argument names.
    ///
    /// `parts.len()` must equal `arguments.len()` for keyword selectors.
    #[must_use]
    pub fn from_parts(kind: SelectorKind, parts: Vec<EcoString>, arguments: Vec<EcoString>) -> Self {
        let selector = EcoString::from(parts.iter().map(EcoString::as_str).collect::<String>());
        Self {
            selector,
            kind,
            parts,
            arguments,
            signature_end: 0,
        }
    }

    /// Renders the signature, e.g. `at: index put: value`.
    #[must_use]
    pub fn render(&self) -> String {
        self.render_with(&self.arguments)
    }

    /// Renders the selector applied to the given argument expressions.
    ///
    /// Used both for signatures (argument names) and for forwarding sends.
    #[must_use]
    pub fn render_with<S: AsRef<str>>(&self, arguments: &[S]) -> String {
        match self.kind {
            SelectorKind::Unary => self.selector.to_string(),
            SelectorKind::Binary => match arguments.first() {
                Some(arg) => format!("{} {}", self.selector, arg.as_ref()),
                None => self.selector.to_string(),
            },
            SelectorKind::Keyword => self
                .parts
                .iter()
                .zip(arguments)
                .map(|(part, arg)| format!("{part} {}", arg.as_ref()))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn skip_blanks(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t' | b'\r') {
        pos += 1;
    }
    pos
}
