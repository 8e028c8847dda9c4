// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Heuristic message-send detection.
//!
//! **DDD Context:** Source Analysis
//!
//! Four independent scanners look for sends in a method body:
//!
//! - [`keyword`]: runs of `name:` tokens at the same nesting level
//! - [`receiver`]: unary/binary sends after `self`/`super` (explicit) and after
//!   any identifier, closing bracket or number (expression)
//! - [`cascade`]: unary/binary sends directly after a top-level `;`
//!
//! Their candidates are merged, deduplicated by
//! `(start_offset, end_offset, selector, send_type)` and returned in
//! `(start_offset, end_offset, selector)` order. The scan is a pure function
//! of the text, so identical input always yields identical output.
//!
//! # Adding a Scanner
//!
//! Implement [`SendScanner`] in a new module and add it to `all_scanners()`.

mod cascade;
mod keyword;
mod receiver;

use std::collections::BTreeMap;

use ecow::EcoString;
use serde::Serialize;

use crate::source_analysis::{ClassifiedSource, PositionIndex, Span, scan, split_header};

pub(crate) use keyword::keyword_runs;

/// What every payload built on send detection must disclose.
pub const ANALYSIS_LIMITATIONS: [&str; 2] = [
    "Dispatch targets are not resolved: receiver hints are textual guesses, not types, \
     so a send may reach any implementor of its selector.",
    "Detection is heuristic: sends in uncommon layouts (comments between tokens, \
     cascades nested inside parentheses or blocks, unusual literal syntax) may be missed.",
];

/// Returns [`ANALYSIS_LIMITATIONS`] as owned strings for a payload.
#[must_use]
pub fn analysis_limitations() -> Vec<String> {
    ANALYSIS_LIMITATIONS.iter().map(ToString::to_string).collect()
}

/// Shape of a detected send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendType {
    Unary,
    Binary,
    Keyword,
}

/// Best-effort textual guess at a send's receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverHint {
    #[serde(rename = "self")]
    SelfReceiver,
    Super,
    Cascade,
    Unknown,
}

/// One detected message send.
///
/// Offsets cover only the selector token(s); for a multi-keyword send they run
/// from the first keyword's start to the last keyword's end. `end_offset` is
/// exclusive; `end_line`/`end_col` locate the last selector character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendRecord {
    pub selector: EcoString,
    pub send_type: SendType,
    pub receiver_hint: ReceiverHint,
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub token_count: u32,
}

impl SendRecord {
    /// The selector span.
    #[must_use]
    pub fn span(&self) -> Span {
        Span::new(self.start_offset, self.end_offset)
    }
}

/// A send found by one scanner, before merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Candidate {
    pub selector: EcoString,
    pub send_type: SendType,
    pub receiver_hint: ReceiverHint,
    pub span: Span,
    pub token_count: u32,
}

/// The part of a method the scanners look at.
#[derive(Debug)]
pub(crate) struct ScanRegion<'a, 'src> {
    pub source: &'a ClassifiedSource<'src>,
    /// Body bytes after the header line and any temporaries declaration.
    pub span: Span,
    /// Literal arrays and block temporaries inside `span`; nothing in them is a send.
    pub excluded: Vec<Span>,
}

impl<'a, 'src> ScanRegion<'a, 'src> {
    /// The scan region of a whole method: everything after the header line,
    /// minus the leading pragmas and temporaries declaration.
    pub fn body(source: &'a ClassifiedSource<'src>) -> Self {
        let (_, body_start) = split_header(source.text());
        let span = Span::new(scan::preamble(source, body_start).end, source.len());
        let mut excluded = scan::literal_array_spans(source, span);
        excluded.extend(scan::block_temporaries_spans(source, span));
        Self {
            source,
            span,
            excluded,
        }
    }

    /// Returns true if `span` lies inside the region and outside every excluded span.
    pub fn admits(&self, span: Span) -> bool {
        self.span.contains(span) && !self.excluded.iter().any(|ex| ex.overlaps(span))
    }
}

/// A single send scanner.
pub(crate) trait SendScanner {
    fn scan(&self, region: &ScanRegion<'_, '_>, found: &mut Vec<Candidate>);
}

/// The ordered list of scanners; earlier scanners win receiver-hint ties.
fn all_scanners() -> Vec<Box<dyn SendScanner>> {
    vec![
        Box::new(receiver::ExplicitReceiverScanner),
        Box::new(keyword::KeywordScanner),
        Box::new(receiver::ExpressionReceiverScanner),
        Box::new(cascade::CascadeScanner),
    ]
}

/// Detects every send in the body of `source`.
#[must_use]
pub fn detect_sends(source: &ClassifiedSource<'_>) -> Vec<SendRecord> {
    let positions = PositionIndex::new(source.text());
    detect_sends_with(source, &positions)
}

/// Detects every send, reusing an already-built position index.
#[must_use]
pub fn detect_sends_with(source: &ClassifiedSource<'_>, positions: &PositionIndex) -> Vec<SendRecord> {
    let region = ScanRegion::body(source);
    let mut candidates = Vec::new();
    for scanner in all_scanners() {
        scanner.scan(&region, &mut candidates);
    }

    let mut merged: BTreeMap<(usize, usize, EcoString, SendType), Candidate> = BTreeMap::new();
    for candidate in candidates {
        // A keyword span covers its arguments; the scanner checks each token instead.
        let admitted = match candidate.send_type {
            SendType::Keyword => region.span.contains(candidate.span),
            SendType::Unary | SendType::Binary => region.admits(candidate.span),
        };
        if !admitted {
            continue;
        }
        let key = (
            candidate.span.start(),
            candidate.span.end(),
            candidate.selector.clone(),
            candidate.send_type,
        );
        merged
            .entry(key)
            .and_modify(|existing| {
                if existing.receiver_hint == ReceiverHint::Unknown {
                    existing.receiver_hint = candidate.receiver_hint;
                }
            })
            .or_insert(candidate);
    }

    merged
        .into_values()
        .map(|candidate| {
            let (start, end) = positions.span_bounds(candidate.span);
            SendRecord {
                selector: candidate.selector,
                send_type: candidate.send_type,
                receiver_hint: candidate.receiver_hint,
                start_offset: candidate.span.start(),
                end_offset: candidate.span.end(),
                start_line: start.line,
                start_col: start.column,
                end_line: end.line,
                end_col: end.column,
                token_count: candidate.token_count,
            }
        })
        .collect()
}

/// Sends found in one method, with the mandatory limitations disclosure.
#[derive(Debug, Clone, Serialize)]
pub struct SendReport {
    pub sends: Vec<SendRecord>,
    pub analysis_limitations: Vec<String>,
}

/// Detects the sends in `text`, optionally keeping only one selector.
#[must_use]
pub fn find_sends(text: &str, selector: Option<&str>) -> SendReport {
    let source = ClassifiedSource::new(text);
    let mut sends = detect_sends(&source);
    if let Some(selector) = selector {
        sends.retain(|send| send.selector == selector);
    }
    SendReport {
        sends,
        analysis_limitations: analysis_limitations(),
    }
}

/// Receiver hint implied by the word that ends just before `offset`.
pub(crate) fn hint_for_word(word: &str) -> ReceiverHint {
    match word {
        "self" => ReceiverHint::SelfReceiver,
        "super" => ReceiverHint::Super,
        _ => ReceiverHint::Unknown,
    }
}
