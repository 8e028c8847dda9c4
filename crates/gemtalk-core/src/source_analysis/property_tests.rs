// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for classification, send detection and statement
//! splitting.
//!
//! 1. **Classifier is total** — one class per byte, never panics
//! 2. **Doubled quotes stay inside the literal** — every byte of a string
//!    literal with `''` escapes is non-code
//! 3. **Detection is deterministic** — same input, same sends
//! 4. **Literal selectors are never sends** — a selector only present in a
//!    string or comment is never reported
//! 5. **Sends are sorted, deduplicated and in code** — output order and
//!    identity keys hold on arbitrary input
//! 6. **Statement splitting is total and non-overlapping**
//!
//! **DDD Context:** Source Analysis

use proptest::prelude::*;

use super::{ClassifiedSource, PositionIndex, split_header};
use crate::method_ast::build_method_ast;
use crate::send_detection::detect_sends;

// ============================================================================
// Generators
// ============================================================================

const BODY_FRAGMENTS: &[&str] = &[
    "self foo",
    "super bar: 1",
    "x := y + 2",
    "^z",
    "a at: 1 put: (b max: 3)",
    "[:e | e printString]",
    "Transcript show: 'hi'; cr",
    "'it''s'",
    "\"note.\"",
    "#(a b c)",
    "3.14 rounded",
    "$. isVowel",
    "x ifTrue: [1] ifFalse: [2]",
    "| t |",
    "(",
    "]",
];

fn method_body() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(BODY_FRAGMENTS), 0..12).prop_map(|parts| {
        let mut text = String::from("method\n    ");
        text.push_str(&parts.join(".\n    "));
        text
    })
}

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{2,8}"
}

/// Default is 512 cases; override via `PROPTEST_CASES` env var for nightly runs.
fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: the classifier covers every byte of arbitrary input.
    #[test]
    fn classifier_is_total(input in "\\PC{0,300}") {
        let src = ClassifiedSource::new(&input);
        prop_assert_eq!(src.len(), input.len());
        prop_assert_eq!(src.code_map().len(), input.len());
        let positions = PositionIndex::new(&input);
        let _ = positions.at(input.len());
    }

    /// Property 2: doubled-quote escapes never reopen code.
    #[test]
    fn doubled_quote_stays_in_string(pieces in prop::collection::vec("[a-z .:;]{0,6}", 1..5)) {
        let literal = format!("'{}'", pieces.join("''"));
        let text = format!("x := {literal}. y");
        let src = ClassifiedSource::new(&text);
        let start = 5;
        for offset in start..start + literal.len() {
            prop_assert!(!src.is_code(offset), "offset {} of {:?} is code", offset, text);
        }
        prop_assert!(src.is_code(text.len() - 1));
    }

    /// Property 3: detection is a pure function of the text.
    #[test]
    fn detection_is_deterministic(text in method_body()) {
        let first = detect_sends(&ClassifiedSource::new(&text));
        let second = detect_sends(&ClassifiedSource::new(&text));
        prop_assert_eq!(first, second);
    }

    /// Property 3b: arbitrary text never panics the analyser.
    #[test]
    fn analysis_never_panics(input in "\\PC{0,300}") {
        let _ast = build_method_ast(&input);
    }

    /// Property 4: a selector hidden in a string or comment is never detected.
    #[test]
    fn literal_selectors_are_never_sends(name in identifier(), in_comment in any::<bool>()) {
        prop_assume!(name != "yourself" && name != "size");
        let hidden = if in_comment {
            format!("\"self {name}. x {name}: 1\"")
        } else {
            format!("'self {name}. x {name}: 1'")
        };
        let text = format!("m\n    self yourself. {hidden} size");
        let sends = detect_sends(&ClassifiedSource::new(&text));
        let keyword = format!("{name}:");
        prop_assert!(sends.iter().all(|s| s.selector != name.as_str() && s.selector != keyword.as_str()));
    }

    /// Property 5: output is sorted by identity key, unique and code-only.
    #[test]
    fn sends_are_sorted_unique_and_code(text in method_body()) {
        let src = ClassifiedSource::new(&text);
        let sends = detect_sends(&src);
        let (_, body_start) = split_header(&text);
        for pair in sends.windows(2) {
            let a = (pair[0].start_offset, pair[0].end_offset, &pair[0].selector);
            let b = (pair[1].start_offset, pair[1].end_offset, &pair[1].selector);
            prop_assert!(a <= b);
            prop_assert!(
                a != b || pair[0].send_type != pair[1].send_type,
                "duplicate identity key {:?}", a
            );
        }
        for send in &sends {
            prop_assert!(send.start_offset >= body_start);
            prop_assert!(send.start_offset < send.end_offset);
            prop_assert!(send.end_offset <= text.len());
        }
    }

    /// Property 6: statements are ordered, disjoint and cover every
    /// significant byte except top-level terminators.
    #[test]
    fn statement_splitting_is_total(text in method_body()) {
        let ast = build_method_ast(&text);
        let src = ClassifiedSource::new(&text);
        for pair in ast.statements.windows(2) {
            prop_assert!(pair[0].end_offset <= pair[1].start_offset);
        }
        for (statement, index) in ast.statements.iter().zip(1u32..) {
            prop_assert_eq!(statement.statement_index, index);
            prop_assert!(!statement.source_text.is_empty());
        }
        let statements_start = ast.statements.first().map_or(text.len(), |s| s.start_offset);
        for offset in statements_start..text.len() {
            if !src.is_significant(offset) {
                continue;
            }
            let covered = ast
                .statements
                .iter()
                .any(|s| s.start_offset <= offset && offset < s.end_offset);
            prop_assert!(
                covered || src.is_code_byte(offset, b'.'),
                "byte {} of {:?} is in no statement", offset, text
            );
        }
    }
}
