// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Offset-based text rewriting.
//!
//! Planners never re-render a method. They collect [`TextEdit`]s against the
//! exact spans the scanners reported and splice them in, so everything
//! outside the edited selector tokens survives byte for byte.

use ecow::EcoString;

use crate::send_detection::{ScanRegion, SendType, detect_sends, keyword_runs};
use crate::source_analysis::{ClassifiedSource, MethodHeader, SelectorKind, Span, keyword_parts, selector_kind, split_header};

/// Replace `span` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Span,
    pub replacement: String,
}

impl TextEdit {
    #[must_use]
    pub fn new(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }
}

/// Applies edits in offset order. An edit overlapping an earlier one is dropped.
#[must_use]
pub fn apply_edits(text: &str, mut edits: Vec<TextEdit>) -> String {
    edits.sort_by_key(|edit| (edit.span.start(), edit.span.end()));
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    for edit in edits {
        if edit.span.start() < copied || edit.span.end() > text.len() {
            continue;
        }
        out.push_str(&text[copied..edit.span.start()]);
        out.push_str(&edit.replacement);
        copied = edit.span.end();
    }
    out.push_str(&text[copied..]);
    out
}

/// Result of a textual rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub source: String,
    /// Number of sends (or sites) replaced.
    pub replacements: usize,
}

/// Selector tokens: keyword parts for keyword selectors, the selector itself otherwise.
pub(crate) fn selector_tokens(selector: &str) -> Vec<EcoString> {
    match selector_kind(selector) {
        Some(SelectorKind::Keyword) => keyword_parts(selector).into_iter().map(EcoString::from).collect(),
        _ => vec![EcoString::from(selector)],
    }
}

/// Renames every send of `old` in the body of `text` to `new`.
///
/// Both selectors must have the same shape and arity. A keyword send is only
/// renamed when its whole token run spells `old`, so `at:` never matches
/// inside `at:put:`.
#[must_use]
pub fn rename_sends(text: &str, old: &str, new: &str) -> Rewritten {
    let src = ClassifiedSource::new(text);
    let mut edits = Vec::new();

    if selector_kind(old) == Some(SelectorKind::Keyword) {
        let region = ScanRegion::body(&src);
        let new_parts = selector_tokens(new);
        for run in keyword_runs(&region).into_iter().filter(|run| run.selector == old) {
            edits.extend(
                run.tokens
                    .iter()
                    .zip(&new_parts)
                    .map(|(token, part)| TextEdit::new(*token, part.as_str())),
            );
        }
    } else {
        edits.extend(
            detect_sends(&src)
                .into_iter()
                .filter(|send| send.selector == old && send.send_type != SendType::Keyword)
                .map(|send| TextEdit::new(send.span(), new)),
        );
    }

    let replacements = if selector_kind(old) == Some(SelectorKind::Keyword) {
        edits.len() / selector_tokens(old).len().max(1)
    } else {
        edits.len()
    };
    Rewritten {
        source: apply_edits(text, edits),
        replacements,
    }
}

/// Parses the header line of a method's source.
pub(crate) fn parse_header(text: &str) -> Option<MethodHeader> {
    MethodHeader::parse(split_header(text).0)
}

/// Replaces the signature of `text` with `new_header`, keeping the rest of the
/// header line and the body untouched.
#[must_use]
pub fn replace_header(text: &str, header: &MethodHeader, new_header: &MethodHeader) -> String {
    format!("{}{}", new_header.render(), &text[header.signature_end..])
}

/// Renames a method: its signature and every send of `old` in its own body.
///
/// Returns `None` when the header line cannot be parsed.
#[must_use]
pub fn rename_method_source(text: &str, old: &str, new: &str) -> Option<Rewritten> {
    let header = parse_header(text)?;
    let new_header = MethodHeader::from_parts(header.kind, selector_tokens(new), header.arguments.clone());
    let body = rename_sends(text, old, new);
    Some(Rewritten {
        source: replace_header(&body.source, &header, &new_header),
        replacements: body.replacements,
    })
}
