// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Top-level statement splitting.
//!
//! A statement ends at a code `.` outside every `()`, `[]` and `{}` group.
//! Slices are trimmed of whitespace and comments at both ends (string literals
//! are kept) and empty slices are dropped.

use serde::Serialize;

use crate::source_analysis::scan::{self, Nesting, TemporariesBlock};
use crate::source_analysis::{ClassifiedSource, Span, split_header};

/// How a statement begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Starts with `^`.
    Return,
    /// Contains a code `:=`.
    Assignment,
    Expression,
}

/// One trimmed top-level statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StatementSpan {
    pub span: Span,
    pub kind: StatementKind,
}

/// The body of a method, split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SplitBody {
    pub body_start: usize,
    pub temporaries: Option<TemporariesBlock>,
    pub statements: Vec<StatementSpan>,
}

/// Splits the body of a classified method into temporaries and statements.
pub(crate) fn split_body(src: &ClassifiedSource<'_>) -> SplitBody {
    let (_, body_start) = split_header(src.text());
    let preamble = scan::preamble(src, body_start);
    let statements = split_statements(src, Span::new(preamble.end, src.len()));
    SplitBody {
        body_start,
        temporaries: preamble.temporaries,
        statements,
    }
}

/// Splits `region` on top-level statement terminators.
pub(crate) fn split_statements(src: &ClassifiedSource<'_>, region: Span) -> Vec<StatementSpan> {
    let bytes = src.bytes();
    let mut nesting = Nesting::default();
    let mut statements = Vec::new();
    let mut segment_start = region.start();

    for pos in region.start()..region.end() {
        if !src.is_code(pos) {
            continue;
        }
        let _ = nesting.step(bytes[pos]);
        if nesting.is_top_level() && scan::is_statement_terminator(src, pos) {
            statements.extend(trimmed_statement(src, Span::new(segment_start, pos)));
            segment_start = pos + 1;
        }
    }
    statements.extend(trimmed_statement(src, Span::new(segment_start, region.end())));
    statements
}

fn trimmed_statement(src: &ClassifiedSource<'_>, raw: Span) -> Option<StatementSpan> {
    let span = trim(src, raw)?;
    Some(StatementSpan {
        span,
        kind: statement_kind(src, span),
    })
}

/// Narrows `raw` to its first and last significant bytes.
pub(crate) fn trim(src: &ClassifiedSource<'_>, raw: Span) -> Option<Span> {
    let start = (raw.start()..raw.end()).find(|&i| src.is_significant(i))?;
    let last = (start..raw.end()).rev().find(|&i| src.is_significant(i))?;
    Some(Span::new(start, last + 1))
}

fn statement_kind(src: &ClassifiedSource<'_>, span: Span) -> StatementKind {
    if src.is_code_byte(span.start(), b'^') {
        StatementKind::Return
    } else if (span.start()..span.end()).any(|i| scan::is_assignment_at(src, i)) {
        StatementKind::Assignment
    } else {
        StatementKind::Expression
    }
}
