// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Keyword send scanner.
//!
//! A keyword send is a maximal run of `name:` tokens at one nesting level:
//!
//! ```text
//! a at: (b at: 1) put: 2
//!   ^^^            ^^^^      at:put:  (outer run)
//!         ^^^                at:      (nested run inside the parens)
//! ```
//!
//! The run stops at a `.`, `;` or `^` at its own level, or when a closing
//! bracket leaves the group it started in. Tokens absorbed into a run never
//! start a run of their own.

use std::collections::HashSet;

use ecow::EcoString;

use super::{Candidate, ReceiverHint, ScanRegion, SendScanner, SendType, hint_for_word};
use crate::source_analysis::scan::{self, Nesting};
use crate::source_analysis::{ClassifiedSource, Span};

/// One keyword send with the span of each of its tokens.
///
/// Rewriters need the per-token spans to replace `oldA:`/`oldB:` without
/// touching the arguments between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeywordRun {
    pub selector: EcoString,
    pub tokens: Vec<Span>,
    pub receiver_hint: ReceiverHint,
}

impl KeywordRun {
    pub fn span(&self) -> Span {
        let first = self.tokens[0];
        let last = self.tokens[self.tokens.len() - 1];
        first.merge(last)
    }
}

pub(crate) struct KeywordScanner;

impl SendScanner for KeywordScanner {
    fn scan(&self, region: &ScanRegion<'_, '_>, found: &mut Vec<Candidate>) {
        for run in keyword_runs(region) {
            let token_count = u32::try_from(run.tokens.len()).unwrap_or(u32::MAX);
            found.push(Candidate {
                span: run.span(),
                selector: run.selector,
                send_type: SendType::Keyword,
                receiver_hint: run.receiver_hint,
                token_count,
            });
        }
    }
}

/// Finds every keyword run in the region, in source order.
pub(crate) fn keyword_runs(region: &ScanRegion<'_, '_>) -> Vec<KeywordRun> {
    let src = region.source;
    let end = region.span.end();
    let mut consumed = HashSet::new();
    let mut runs = Vec::new();
    let mut pos = region.span.start();

    while pos < end {
        let Some(first) = scan::keyword_token_at(src, pos, end) else {
            pos += 1;
            continue;
        };
        if consumed.contains(&first.start()) || !region.admits(first) {
            pos = first.end();
            continue;
        }

        let tokens = collect_run(src, first, end);
        consumed.extend(tokens.iter().map(|token| token.start()));
        if !tokens.iter().all(|token| region.admits(*token)) {
            pos = first.end();
            continue;
        }
        let selector = EcoString::from(tokens.iter().map(|token| src.slice(*token)).collect::<String>());
        runs.push(KeywordRun {
            selector,
            receiver_hint: receiver_hint(src, first.start(), region.span.start()),
            tokens,
        });
        pos = first.end();
    }

    runs
}

/// Extends a run from its first token to the end of its nesting scope.
fn collect_run(src: &ClassifiedSource<'_>, first: Span, end: usize) -> Vec<Span> {
    let bytes = src.bytes();
    let mut tokens = vec![first];
    let mut nesting = Nesting::default();
    let mut pos = first.end();

    while pos < end {
        if !src.is_code(pos) {
            pos += 1;
            continue;
        }
        let byte = bytes[pos];
        if nesting.is_top_level()
            && (matches!(byte, b';' | b'^') || scan::is_statement_terminator(src, pos))
        {
            break;
        }
        if !nesting.step(byte) {
            break;
        }
        if let Some(word) = scan::word_at(src, pos, end) {
            if nesting.is_top_level() {
                if let Some(token) = scan::keyword_token_at(src, pos, end) {
                    tokens.push(token);
                    pos = token.end();
                    continue;
                }
            }
            pos = word.end();
            continue;
        }
        pos += 1;
    }

    tokens
}

/// Self/Super when `self`/`super` directly precedes the run, Cascade after `;`.
fn receiver_hint(src: &ClassifiedSource<'_>, token_start: usize, floor: usize) -> ReceiverHint {
    let bytes = src.bytes();
    let before = scan::skip_whitespace_back(src, token_start, floor);
    if before == floor || !src.is_code(before - 1) {
        return ReceiverHint::Unknown;
    }
    if bytes[before - 1] == b';' {
        return ReceiverHint::Cascade;
    }
    let mut word_start = before;
    while word_start > floor && scan::is_ident_char(bytes[word_start - 1]) {
        word_start -= 1;
    }
    if word_start == before || !scan::is_word_start(bytes, word_start) {
        return ReceiverHint::Unknown;
    }
    hint_for_word(src.slice(Span::new(word_start, before)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs(text: &str) -> Vec<(String, Vec<&str>)> {
        let src = ClassifiedSource::new(text);
        let region = ScanRegion::body(&src);
        keyword_runs(&region)
            .into_iter()
            .map(|run| {
                let tokens = run.tokens.iter().map(|t| &text[t.as_range()]).collect();
                (run.selector.to_string(), tokens)
            })
            .collect()
    }

    #[test]
    fn single_run_collects_all_keywords() {
        assert_eq!(
            runs("m\n  self oldSelector: 1 with: 2"),
            vec![("oldSelector:with:".to_string(), vec!["oldSelector:", "with:"])]
        );
    }

    #[test]
    fn period_and_cascade_end_a_run() {
        let found = runs("m\n  a foo: 1. b bar: 2; baz: 3");
        let selectors: Vec<_> = found.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(selectors, vec!["foo:", "bar:", "baz:"]);
    }

    #[test]
    fn block_argument_keeps_outer_run() {
        let found = runs("m\n  x ifTrue: [y at: 1] ifFalse: [z]");
        let selectors: Vec<_> = found.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(selectors, vec!["ifTrue:ifFalse:", "at:"]);
    }

    #[test]
    fn closing_bracket_ends_inner_run() {
        let found = runs("m\n  [a with: 1] value: 2");
        let selectors: Vec<_> = found.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(selectors, vec!["with:", "value:"]);
    }

    #[test]
    fn unary_between_keywords_does_not_break_run() {
        let found = runs("m\n  a to: b size do: [:i | i]");
        assert_eq!(found[0].0, "to:do:");
    }

    #[test]
    fn excluded_arguments_do_not_split_the_run() {
        let found = runs("m\n  self assert: #(a: b:) equals: [:x | | t | t := x]");
        assert_eq!(
            found,
            vec![("assert:equals:".to_string(), vec!["assert:", "equals:"])]
        );
    }

    #[test]
    fn hints_follow_receiver_word() {
        let src = ClassifiedSource::new("m\n  super at: 1. x; at: 2. self foo at: 3");
        let region = ScanRegion::body(&src);
        let hints: Vec<_> = keyword_runs(&region).iter().map(|r| r.receiver_hint).collect();
        assert_eq!(
            hints,
            vec![ReceiverHint::Super, ReceiverHint::Cascade, ReceiverHint::Unknown]
        );
    }
}
