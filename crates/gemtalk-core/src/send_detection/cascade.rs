// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Cascade send scanner.
//!
//! `Transcript show: 'a'; cr; tab` sends `cr` and `tab` to the receiver of
//! the first message. Only cascades at the top level of the body are seen;
//! keyword parts after a `;` are picked up by the keyword scanner.

use super::{Candidate, ReceiverHint, ScanRegion, SendScanner, SendType};
use crate::source_analysis::scan::{self, Nesting};

pub(crate) struct CascadeScanner;

impl SendScanner for CascadeScanner {
    fn scan(&self, region: &ScanRegion<'_, '_>, found: &mut Vec<Candidate>) {
        let src = region.source;
        let bytes = src.bytes();
        let end = region.span.end();
        let mut nesting = Nesting::default();

        for pos in region.span.start()..end {
            if !src.is_code(pos) {
                continue;
            }
            let byte = bytes[pos];
            // An unmatched closer leaves the counters at zero.
            let _ = nesting.step(byte);
            if byte != b';' || !nesting.is_top_level() {
                continue;
            }

            let start = scan::skip_whitespace(src, pos + 1, end);
            if let Some(word) = scan::word_at(src, start, end) {
                if !src.is_code_byte(word.end(), b':') {
                    found.push(Candidate {
                        selector: src.slice(word).into(),
                        send_type: SendType::Unary,
                        receiver_hint: ReceiverHint::Cascade,
                        span: word,
                        token_count: 1,
                    });
                }
            } else if let Some(token) = scan::binary_token_at(src, start, end) {
                found.push(Candidate {
                    selector: src.slice(token).into(),
                    send_type: SendType::Binary,
                    receiver_hint: ReceiverHint::Cascade,
                    span: token,
                    token_count: 1,
                });
            }
        }
    }
}
