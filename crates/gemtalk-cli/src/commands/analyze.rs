// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `gemtalk analyze` and `gemtalk sends`.

use std::fmt::Write as _;

use camino::Utf8Path;
use gemtalk_core::method_ast::{MethodAst, build_method_ast};
use gemtalk_core::send_detection::{SendRecord, SendReport, find_sends};
use miette::Result;
use serde::Serialize;
use tracing::instrument;

use super::{read_method_file, render};
use crate::config::OutputFormat;

#[instrument(skip_all, fields(%path))]
pub fn run_analyze(path: &Utf8Path, format: OutputFormat) -> Result<String> {
    let source = read_method_file(path)?;
    render(&build_method_ast(&source), format, ast_text)
}

#[instrument(skip_all, fields(%path))]
pub fn run_sends(path: &Utf8Path, selector: Option<&str>, format: OutputFormat) -> Result<String> {
    let source = read_method_file(path)?;
    render(&find_sends(&source, selector), format, report_text)
}

fn ast_text(ast: &MethodAst) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "header: {}", ast.header_source);
    if !ast.temporaries.is_empty() {
        let _ = writeln!(out, "temporaries: {}", ast.temporaries.join(" "));
    }
    let _ = writeln!(out, "statements:");
    for statement in &ast.statements {
        let _ = writeln!(
            out,
            "  {:>2} {:<10} {}:{}-{}:{}  {}",
            statement.statement_index,
            label(&statement.statement_kind),
            statement.start_line,
            statement.start_col,
            statement.end_line,
            statement.end_col,
            statement.source_text.replace('\n', " ")
        );
    }
    let summary = &ast.structure_summary;
    let flow = &ast.control_flow_summary;
    let _ = writeln!(
        out,
        "summary: {} sends ({} unary, {} binary, {} keyword), {} branches, {} loops, block depth {}",
        summary.send_count,
        summary.unary_send_count,
        summary.binary_send_count,
        summary.keyword_send_count,
        flow.branch_count,
        flow.loop_count,
        flow.max_block_depth
    );
    out.push_str(&sends_text(&ast.sends));
    out.push_str(&limitations_text(&ast.analysis_limitations));
    out
}

fn report_text(report: &SendReport) -> String {
    let mut out = sends_text(&report.sends);
    out.push_str(&limitations_text(&report.analysis_limitations));
    out
}

fn sends_text(sends: &[SendRecord]) -> String {
    let mut out = String::from("sends:\n");
    for send in sends {
        let _ = writeln!(
            out,
            "  {:<20} {:<8} {:<8} {}:{}-{}:{}",
            send.selector,
            label(&send.send_type),
            label(&send.receiver_hint),
            send.start_line,
            send.start_col,
            send.end_line,
            send.end_col
        );
    }
    out
}

/// The serialized name of a unit enum value, e.g. `self` or `keyword`.
fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|value| value.as_str().map(ToString::to_string))
        .unwrap_or_default()
}

pub(crate) fn limitations_text(limitations: &[String]) -> String {
    let mut out = String::from("limitations:\n");
    for limitation in limitations {
        let _ = writeln!(out, "  - {limitation}");
    }
    out
}
