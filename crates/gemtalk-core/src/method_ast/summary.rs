// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Structure and control-flow counters for a method body.

use std::collections::BTreeMap;

use ecow::EcoString;
use serde::Serialize;

use crate::send_detection::{ReceiverHint, SendRecord, SendType};
use crate::source_analysis::scan;
use crate::source_analysis::{ClassifiedSource, Span};

/// Selectors counted as branches.
pub const BRANCH_SELECTORS: [&str; 5] = ["ifTrue:", "ifFalse:", "ifTrue:ifFalse:", "ifNil:", "ifNotNil:"];

/// Selectors counted as loops.
pub const LOOP_SELECTORS: [&str; 3] = ["whileTrue:", "whileFalse:", "to:do:"];

/// Token and send tallies for one method body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureSummary {
    pub statement_count: u32,
    pub temporaries_count: u32,
    pub block_open_count: u32,
    pub block_close_count: u32,
    pub return_count: u32,
    pub cascade_count: u32,
    pub assignment_count: u32,
    pub statement_terminator_count: u32,
    pub send_count: u32,
    pub unary_send_count: u32,
    pub binary_send_count: u32,
    pub keyword_send_count: u32,
    pub self_send_count: u32,
    pub super_send_count: u32,
}

/// Branch and loop sends, and how deeply blocks nest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControlFlowSummary {
    pub branch_count: u32,
    pub loop_count: u32,
    pub max_block_depth: u32,
    /// Occurrences of each branch/loop selector that appears at least once.
    pub selector_counts: BTreeMap<EcoString, u32>,
}

pub(crate) fn structure_summary(
    src: &ClassifiedSource<'_>,
    body: Span,
    sends: &[SendRecord],
) -> StructureSummary {
    let bytes = src.bytes();
    let mut summary = StructureSummary::default();

    for pos in body.start()..body.end() {
        if !src.is_code(pos) {
            continue;
        }
        match bytes[pos] {
            b'[' => summary.block_open_count += 1,
            b']' => summary.block_close_count += 1,
            b'^' => summary.return_count += 1,
            b';' => summary.cascade_count += 1,
            b':' if scan::is_assignment_at(src, pos) => summary.assignment_count += 1,
            b'.' if scan::is_statement_terminator(src, pos) => {
                summary.statement_terminator_count += 1;
            }
            _ => {}
        }
    }

    for send in sends {
        summary.send_count += 1;
        match send.send_type {
            SendType::Unary => summary.unary_send_count += 1,
            SendType::Binary => summary.binary_send_count += 1,
            SendType::Keyword => summary.keyword_send_count += 1,
        }
        match send.receiver_hint {
            ReceiverHint::SelfReceiver => summary.self_send_count += 1,
            ReceiverHint::Super => summary.super_send_count += 1,
            ReceiverHint::Cascade | ReceiverHint::Unknown => {}
        }
    }

    summary
}

pub(crate) fn control_flow_summary(
    src: &ClassifiedSource<'_>,
    body: Span,
    sends: &[SendRecord],
) -> ControlFlowSummary {
    let mut summary = ControlFlowSummary::default();

    for send in sends {
        let selector = send.selector.as_str();
        let is_branch = BRANCH_SELECTORS.contains(&selector);
        let is_loop = LOOP_SELECTORS.contains(&selector);
        if is_branch {
            summary.branch_count += 1;
        }
        if is_loop {
            summary.loop_count += 1;
        }
        if is_branch || is_loop {
            *summary.selector_counts.entry(send.selector.clone()).or_default() += 1;
        }
    }

    let mut depth: u32 = 0;
    for pos in body.start()..body.end() {
        if src.is_code_byte(pos, b'[') {
            depth += 1;
            summary.max_block_depth = summary.max_block_depth.max(depth);
        } else if src.is_code_byte(pos, b']') {
            depth = depth.saturating_sub(1);
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::send_detection::detect_sends;

    fn summaries(text: &str) -> (StructureSummary, ControlFlowSummary) {
        let src = ClassifiedSource::new(text);
        let sends = detect_sends(&src);
        let body = Span::new(text.find('\n').map_or(text.len(), |n| n + 1), text.len());
        (
            structure_summary(&src, body, &sends),
            control_flow_summary(&src, body, &sends),
        )
    }

    #[test]
    fn counts_tokens_and_sends() {
        let (structure, _) = summaries("m\n    x := self foo.\n    super bar: 1; baz.\n    ^x + 2");
        assert_eq!(structure.assignment_count, 1);
        assert_eq!(structure.statement_terminator_count, 2);
        assert_eq!(structure.return_count, 1);
        assert_eq!(structure.cascade_count, 1);
        assert_eq!(structure.unary_send_count, 2);
        assert_eq!(structure.binary_send_count, 1);
        assert_eq!(structure.keyword_send_count, 1);
        assert_eq!(structure.self_send_count, 1);
        assert_eq!(structure.super_send_count, 1);
    }

    #[test]
    fn branches_loops_and_depth() {
        let (_, flow) = summaries(
            "m\n    x ifTrue: [y ifNil: [1]] ifFalse: [2].\n    1 to: 3 do: [:i | [i] value]",
        );
        assert_eq!(flow.branch_count, 2);
        assert_eq!(flow.loop_count, 1);
        assert_eq!(flow.max_block_depth, 2);
        assert_eq!(flow.selector_counts.get("ifTrue:ifFalse:"), Some(&1));
    }

    #[test]
    fn unbalanced_closers_never_go_negative() {
        let (structure, flow) = summaries("m\n    ]] [x]");
        assert_eq!(structure.block_close_count, 3);
        assert_eq!(flow.max_block_depth, 1);
    }

    #[test]
    fn delimiters_in_literals_are_not_counted() {
        let (structure, flow) = summaries("m\n    ^'[;.' , \"]^\" $[ printString");
        assert_eq!(structure.return_count, 1);
        assert_eq!(structure.cascade_count, 0);
        assert_eq!(structure.block_open_count, 0);
        assert_eq!(flow.max_block_depth, 0);
    }
}
