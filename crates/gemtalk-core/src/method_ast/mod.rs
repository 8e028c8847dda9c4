// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lightweight method AST.
//!
//! **DDD Context:** Source Analysis
//!
//! Not a syntax tree: a method is reduced to its header line, temporaries and
//! top-level statements, each statement carrying the sends found inside it.
//! Everything is rebuilt from the text on every call.
//!
//! ```
//! use gemtalk_core::method_ast::{StatementKind, build_method_ast};
//!
//! let ast = build_method_ast("total\n    | sum |\n    sum := 0.\n    ^sum");
//! assert_eq!(ast.temporaries, vec!["sum"]);
//! assert_eq!(ast.statements.len(), 2);
//! assert_eq!(ast.statements[1].statement_kind, StatementKind::Return);
//! ```

mod statements;
mod summary;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::send_detection::{SendRecord, analysis_limitations, detect_sends_with};
use crate::source_analysis::{ClassifiedSource, PositionIndex, Span, split_header};

pub use statements::StatementKind;
pub(crate) use statements::{SplitBody, StatementSpan, split_body, split_statements, trim};
pub use summary::{BRANCH_SELECTORS, ControlFlowSummary, LOOP_SELECTORS, StructureSummary};

/// One top-level statement of a method body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementRecord {
    /// 1-based position among the method's statements.
    pub statement_index: u32,
    pub statement_kind: StatementKind,
    pub source_text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    /// Sends lying entirely inside this statement.
    pub sends: Vec<SendRecord>,
}

impl StatementRecord {
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.start_offset, self.end_offset)
    }
}

/// The analysed shape of one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodAst {
    pub header_source: String,
    pub body_start_offset: usize,
    pub temporaries: Vec<String>,
    pub statements: Vec<StatementRecord>,
    pub sends: Vec<SendRecord>,
    pub structure_summary: StructureSummary,
    pub control_flow_summary: ControlFlowSummary,
    pub analysis_limitations: Vec<String>,
}

/// Analyses a method's full source text (header line plus body).
#[must_use]
#[instrument(skip_all, fields(len = text.len()))]
pub fn build_method_ast(text: &str) -> MethodAst {
    let source = ClassifiedSource::new(text);
    let positions = PositionIndex::new(text);
    let sends = detect_sends_with(&source, &positions);
    let body = split_body(&source);
    let (header, _) = split_header(text);

    let temporaries: Vec<String> = body
        .temporaries
        .map(|block| block.names(&source).into_iter().map(ToString::to_string).collect())
        .unwrap_or_default();

    let statements: Vec<StatementRecord> = body
        .statements
        .iter()
        .zip(1u32..)
        .map(|(statement, index)| statement_record(&source, &positions, &sends, *statement, index))
        .collect();

    let body_span = Span::new(body.body_start, text.len());
    let mut structure_summary = summary::structure_summary(&source, body_span, &sends);
    structure_summary.statement_count = u32::try_from(statements.len()).unwrap_or(u32::MAX);
    structure_summary.temporaries_count = u32::try_from(temporaries.len()).unwrap_or(u32::MAX);
    let control_flow_summary = summary::control_flow_summary(&source, body_span, &sends);

    debug!(
        statements = statements.len(),
        sends = sends.len(),
        "Built method AST"
    );

    MethodAst {
        header_source: header.to_string(),
        body_start_offset: body.body_start,
        temporaries,
        statements,
        sends,
        structure_summary,
        control_flow_summary,
        analysis_limitations: analysis_limitations(),
    }
}

fn statement_record(
    source: &ClassifiedSource<'_>,
    positions: &PositionIndex,
    sends: &[SendRecord],
    statement: StatementSpan,
    statement_index: u32,
) -> StatementRecord {
    let span = statement.span;
    let (start, end) = positions.span_bounds(span);
    StatementRecord {
        statement_index,
        statement_kind: statement.kind,
        source_text: source.slice(span).to_string(),
        start_offset: span.start(),
        end_offset: span.end(),
        start_line: start.line,
        start_col: start.column,
        end_line: end.line,
        end_col: end.column,
        sends: sends
            .iter()
            .filter(|send| span.contains(send.span()))
            .cloned()
            .collect(),
    }
}
