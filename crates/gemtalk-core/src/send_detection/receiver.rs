// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Unary and binary sends identified by what precedes them.
//!
//! Two scanners share the selector-side logic. The explicit scanner only
//! accepts `self`/`super` as the receiver; the expression scanner accepts any
//! identifier, a closing bracket or a number.

use super::{Candidate, ReceiverHint, ScanRegion, SendScanner, SendType, hint_for_word};
use crate::source_analysis::scan;
use crate::source_analysis::{ClassifiedSource, Span};

pub(crate) struct ExplicitReceiverScanner;

impl SendScanner for ExplicitReceiverScanner {
    fn scan(&self, region: &ScanRegion<'_, '_>, found: &mut Vec<Candidate>) {
        let src = region.source;
        let end = region.span.end();
        let mut pos = region.span.start();
        while pos < end {
            let Some(word) = scan::word_at(src, pos, end) else {
                pos += 1;
                continue;
            };
            let hint = hint_for_word(src.slice(word));
            if hint != ReceiverHint::Unknown {
                if let Some(candidate) = selector_after_receiver(src, word.end(), end, hint) {
                    found.push(candidate);
                }
            }
            pos = word.end();
        }
    }
}

pub(crate) struct ExpressionReceiverScanner;

impl SendScanner for ExpressionReceiverScanner {
    fn scan(&self, region: &ScanRegion<'_, '_>, found: &mut Vec<Candidate>) {
        let src = region.source;
        let bytes = src.bytes();
        let end = region.span.end();
        let mut pos = region.span.start();
        while pos < end {
            if !src.is_code(pos) {
                pos += 1;
                continue;
            }
            let (receiver_end, hint) = if let Some(word) = scan::word_at(src, pos, end) {
                if src.is_code_byte(word.end(), b':') {
                    pos = word.end();
                    continue;
                }
                (word.end(), hint_for_word(src.slice(word)))
            } else if let Some(number) = number_at(src, pos, end) {
                (number.end(), ReceiverHint::Unknown)
            } else if matches!(bytes[pos], b')' | b']' | b'}') {
                (pos + 1, ReceiverHint::Unknown)
            } else {
                pos += 1;
                continue;
            };
            if let Some(candidate) = selector_after_receiver(src, receiver_end, end, hint) {
                found.push(candidate);
            }
            pos = receiver_end;
        }
    }
}

/// Looks for a unary or binary selector after a receiver ending at `offset`.
fn selector_after_receiver(
    src: &ClassifiedSource<'_>,
    offset: usize,
    limit: usize,
    receiver_hint: ReceiverHint,
) -> Option<Candidate> {
    let start = scan::skip_whitespace(src, offset, limit);
    if let Some(word) = scan::word_at(src, start, limit) {
        if src.is_code_byte(word.end(), b':') {
            return None;
        }
        return Some(Candidate {
            selector: src.slice(word).into(),
            send_type: SendType::Unary,
            receiver_hint,
            span: word,
            token_count: 1,
        });
    }
    let token = scan::binary_token_at(src, start, limit)?;
    Some(Candidate {
        selector: src.slice(token).into(),
        send_type: SendType::Binary,
        receiver_hint,
        span: token,
        token_count: 1,
    })
}

/// A word-bounded decimal literal: digits with an optional `.digits` fraction.
fn number_at(src: &ClassifiedSource<'_>, offset: usize, limit: usize) -> Option<Span> {
    let bytes = src.bytes();
    if !bytes[offset].is_ascii_digit() || !scan::is_word_start(bytes, offset) {
        return None;
    }
    let digits_end = |from: usize| {
        let mut end = from;
        while end < limit && bytes[end].is_ascii_digit() {
            end += 1;
        }
        end
    };
    let mut end = digits_end(offset);
    if end + 1 < limit && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
        end = digits_end(end + 1);
    }
    (scan::is_word_end(bytes, end) && src.is_code_span(Span::new(offset, end))).then(|| Span::new(offset, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_with(scanner: &dyn SendScanner, text: &str) -> Vec<(String, SendType, ReceiverHint)> {
        let src = ClassifiedSource::new(text);
        let region = ScanRegion::body(&src);
        let mut found = Vec::new();
        scanner.scan(&region, &mut found);
        found
            .into_iter()
            .map(|c| (c.selector.to_string(), c.send_type, c.receiver_hint))
            .collect()
    }

    #[test]
    fn explicit_receiver_unary_and_binary() {
        let found = scan_with(&ExplicitReceiverScanner, "m\n  self size. super = other. x foo");
        assert_eq!(
            found,
            vec![
                ("size".to_string(), SendType::Unary, ReceiverHint::SelfReceiver),
                ("=".to_string(), SendType::Binary, ReceiverHint::Super),
            ]
        );
    }

    #[test]
    fn explicit_receiver_skips_keywords_and_lookalikes() {
        assert!(scan_with(&ExplicitReceiverScanner, "m\n  self at: 1. selfish foo. myself bar").is_empty());
    }

    #[test]
    fn expression_receivers() {
        let found = scan_with(&ExpressionReceiverScanner, "m\n  ^(a foo) , 3.5 abs , [x] value");
        let selectors: Vec<_> = found.iter().map(|(s, _, _)| s.as_str()).collect();
        assert_eq!(selectors, vec!["foo", ",", "abs", ",", "value"]);
    }

    #[test]
    fn assignment_is_not_a_binary_send() {
        let found = scan_with(&ExpressionReceiverScanner, "m\n  x := y. x:=y");
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn keyword_arguments_do_not_make_sends() {
        let found = scan_with(&ExpressionReceiverScanner, "m\n  a at: i put: v");
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn binary_run_longer_than_three_is_ignored() {
        assert!(scan_with(&ExpressionReceiverScanner, "m\n  a ==== b").is_empty());
    }
}
