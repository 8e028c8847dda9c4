// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Shared cursor and boundary helpers.
//!
//! The send scanners, the statement splitter, the summaries and the rewriters
//! all walk the same classified bytes. They share these helpers instead of
//! re-implementing string/comment skipping, nesting depth and word boundaries.

use super::{ClassifiedSource, Span};

/// Characters that may form a binary selector.
///
/// `|` is deliberately absent: in method bodies it is far more often a
/// temporaries or block-parameter bar than an `or:` operator.
const BINARY_CHARS: &[u8] = b"+-*/\\<>=~@%&?,";

/// Maximum length of a binary selector token.
pub const MAX_BINARY_LEN: usize = 3;

/// Returns true if `byte` can start an identifier.
#[must_use]
pub const fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

/// Returns true if `byte` can continue an identifier.
#[must_use]
pub const fn is_ident_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Returns true if `byte` belongs to the binary-operator charset.
#[must_use]
pub fn is_binary_char(byte: u8) -> bool {
    BINARY_CHARS.contains(&byte)
}

/// Returns true if `text` is a plain identifier.
#[must_use]
pub fn is_identifier(text: &str) -> bool {
    let bytes = text.as_bytes();
    !bytes.is_empty() && is_ident_start(bytes[0]) && bytes[1..].iter().all(|&b| is_ident_char(b))
}

/// Returns true if no identifier character sits immediately before `offset`.
#[must_use]
pub fn is_word_start(bytes: &[u8], offset: usize) -> bool {
    offset == 0 || !is_ident_char(bytes[offset - 1])
}

/// Returns true if no identifier character sits at `offset`.
#[must_use]
pub fn is_word_end(bytes: &[u8], offset: usize) -> bool {
    bytes.get(offset).is_none_or(|&b| !is_ident_char(b))
}

/// Returns the end offset of the identifier run starting at `offset`.
#[must_use]
pub fn ident_end(bytes: &[u8], offset: usize) -> usize {
    let mut end = offset;
    while end < bytes.len() && is_ident_char(bytes[end]) {
        end += 1;
    }
    end
}

/// Skips code whitespace from `offset`, stopping at `limit`.
#[must_use]
pub fn skip_whitespace(src: &ClassifiedSource<'_>, offset: usize, limit: usize) -> usize {
    let bytes = src.bytes();
    let mut pos = offset;
    while pos < limit && src.is_code(pos) && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Skips code whitespace backwards from `offset` (exclusive), stopping at `floor`.
#[must_use]
pub fn skip_whitespace_back(src: &ClassifiedSource<'_>, offset: usize, floor: usize) -> usize {
    let bytes = src.bytes();
    let mut pos = offset;
    while pos > floor && src.is_code(pos - 1) && bytes[pos - 1].is_ascii_whitespace() {
        pos -= 1;
    }
    pos
}

/// Returns the span of a code identifier starting exactly at `offset`, if the
/// identifier is word-bounded on the left.
#[must_use]
pub fn word_at(src: &ClassifiedSource<'_>, offset: usize, limit: usize) -> Option<Span> {
    let bytes = src.bytes();
    if offset >= limit || !src.is_code(offset) || !is_ident_start(bytes[offset]) {
        return None;
    }
    if !is_word_start(bytes, offset) {
        return None;
    }
    let end = ident_end(bytes, offset).min(limit);
    let span = Span::new(offset, end);
    src.is_code_span(span).then_some(span)
}

/// Returns the span of a run of code binary-operator characters starting at
/// `offset`, provided it is between 1 and [`MAX_BINARY_LEN`] characters long.
#[must_use]
pub fn binary_token_at(src: &ClassifiedSource<'_>, offset: usize, limit: usize) -> Option<Span> {
    let bytes = src.bytes();
    let mut end = offset;
    while end < limit && src.is_code(end) && is_binary_char(bytes[end]) {
        end += 1;
    }
    let len = end - offset;
    (1..=MAX_BINARY_LEN).contains(&len).then(|| Span::new(offset, end))
}

/// Returns true if the code byte at `offset` is the `:` of an `:=` assignment.
#[must_use]
pub fn is_assignment_at(src: &ClassifiedSource<'_>, offset: usize) -> bool {
    src.is_code_byte(offset, b':') && src.is_code_byte(offset + 1, b'=')
}

/// Returns true if the byte at `offset` is a code `.` that ends a statement.
///
/// A `.` between two digits is a decimal point and does not count.
#[must_use]
pub fn is_statement_terminator(src: &ClassifiedSource<'_>, offset: usize) -> bool {
    if !src.is_code_byte(offset, b'.') {
        return false;
    }
    let bytes = src.bytes();
    let digit_before = offset > 0 && bytes[offset - 1].is_ascii_digit();
    let digit_after = bytes.get(offset + 1).is_some_and(u8::is_ascii_digit);
    !(digit_before && digit_after)
}

/// Returns the span of a keyword token (`name:`) starting at `offset`.
///
/// The token must be code, word-bounded, not part of a symbol literal
/// (`#name:` or the `put:` of `#at:put:`) and not the left side of `:=`.
#[must_use]
pub fn keyword_token_at(src: &ClassifiedSource<'_>, offset: usize, limit: usize) -> Option<Span> {
    let word = word_at(src, offset, limit)?;
    let bytes = src.bytes();
    let colon = word.end();
    if colon >= limit || !src.is_code_byte(colon, b':') || is_assignment_at(src, colon) {
        return None;
    }
    if offset > 0 && matches!(bytes[offset - 1], b'#' | b':') {
        return None;
    }
    Some(Span::new(offset, colon + 1))
}

/// Per-kind nesting counters for `()`, `[]` and `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nesting {
    paren: u32,
    bracket: u32,
    brace: u32,
}

impl Nesting {
    /// Feeds one code byte into the counters.
    ///
    /// Returns `false` when `byte` closes a group that was never opened; the
    /// counters stay at zero in that case.
    pub fn step(&mut self, byte: u8) -> bool {
        let counter = match byte {
            b'(' | b')' => &mut self.paren,
            b'[' | b']' => &mut self.bracket,
            b'{' | b'}' => &mut self.brace,
            _ => return true,
        };
        if matches!(byte, b'(' | b'[' | b'{') {
            *counter += 1;
            true
        } else if *counter == 0 {
            false
        } else {
            *counter -= 1;
            true
        }
    }

    /// Returns true when no group is open.
    #[must_use]
    pub const fn is_top_level(self) -> bool {
        self.paren == 0 && self.bracket == 0 && self.brace == 0
    }
}

/// Location of a leading `| a b |` temporaries declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporariesBlock {
    /// The declaration including both bars.
    pub span: Span,
}

impl TemporariesBlock {
    /// Returns the identifiers declared between the bars.
    #[must_use]
    pub fn names<'src>(&self, src: &ClassifiedSource<'src>) -> Vec<&'src str> {
        let mut names = Vec::new();
        let mut pos = self.span.start() + 1;
        let limit = self.span.end() - 1;
        while pos < limit {
            if let Some(word) = word_at(src, pos, limit) {
                names.push(src.slice(word));
                pos = word.end();
            } else {
                pos += 1;
            }
        }
        names
    }
}

/// Pragmas and temporaries declaration that open a method body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preamble {
    /// `<primitive: 60>`-style pragmas, before or after the temporaries.
    pub pragmas: Vec<Span>,
    pub temporaries: Option<TemporariesBlock>,
    /// Offset where statements may begin.
    pub end: usize,
}

/// Reads the pragmas and temporaries declaration at the start of the body.
///
/// Leading whitespace and comments are skipped. A temporaries declaration runs
/// from a code `|` to the next code `|`; an unclosed one is ignored.
#[must_use]
pub fn preamble(src: &ClassifiedSource<'_>, body_start: usize) -> Preamble {
    let mut pragmas = Vec::new();
    let pos = skip_pragmas(src, body_start, &mut pragmas);
    let mut temporaries = None;
    if src.is_code_byte(pos, b'|') {
        if let Some(close) = (pos + 1..src.len()).find(|&i| src.is_code_byte(i, b'|')) {
            temporaries = Some(TemporariesBlock {
                span: Span::new(pos, close + 1),
            });
            skip_pragmas(src, close + 1, &mut pragmas);
        }
    }
    let end = temporaries
        .map(|block| block.span.end())
        .into_iter()
        .chain(pragmas.last().map(|pragma| pragma.end()))
        .max()
        .unwrap_or(body_start);
    Preamble {
        pragmas,
        temporaries,
        end,
    }
}

/// Finds a temporaries declaration at the start of the body, after any pragmas.
#[must_use]
pub fn temporaries_block(src: &ClassifiedSource<'_>, body_start: usize) -> Option<TemporariesBlock> {
    preamble(src, body_start).temporaries
}

fn skip_trivia(src: &ClassifiedSource<'_>, offset: usize) -> usize {
    let bytes = src.bytes();
    let mut pos = offset;
    while pos < src.len() && (!src.is_code(pos) || bytes[pos].is_ascii_whitespace()) {
        pos += 1;
    }
    pos
}

/// Collects consecutive pragmas from `offset`; returns the next code offset.
fn skip_pragmas(src: &ClassifiedSource<'_>, offset: usize, pragmas: &mut Vec<Span>) -> usize {
    let mut pos = skip_trivia(src, offset);
    while let Some(pragma) = pragma_at(src, pos) {
        pragmas.push(pragma);
        pos = skip_trivia(src, pragma.end());
    }
    pos
}

/// A `<name ...>` pragma starting at `offset`.
fn pragma_at(src: &ClassifiedSource<'_>, offset: usize) -> Option<Span> {
    if !src.is_code_byte(offset, b'<') || !src.bytes().get(offset + 1).copied().is_some_and(is_ident_start) {
        return None;
    }
    let close = (offset + 1..src.len()).find(|&i| src.is_code_byte(i, b'>'))?;
    Some(Span::new(offset, close + 1))
}

/// Finds literal arrays (`#( ... )` and `#[ ... ]`) inside `region`.
///
/// Their contents are literals, so no scanner may report sends inside them.
#[must_use]
pub fn literal_array_spans(src: &ClassifiedSource<'_>, region: Span) -> Vec<Span> {
    let bytes = src.bytes();
    let mut spans = Vec::new();
    let mut pos = region.start();
    while pos + 1 < region.end() {
        if src.is_code_byte(pos, b'#') && matches!(bytes[pos + 1], b'(' | b'[') && src.is_code(pos + 1) {
            let mut nesting = Nesting::default();
            let mut end = region.end();
            for i in pos + 1..region.end() {
                if !src.is_code(i) {
                    continue;
                }
                if !nesting.step(bytes[i]) || nesting.is_top_level() {
                    end = i + 1;
                    break;
                }
            }
            spans.push(Span::new(pos, end));
            pos = end;
        } else {
            pos += 1;
        }
    }
    spans
}

/// Finds block temporaries declarations (`[:x | | t u | ...]`) inside `region`.
///
/// The bars of a block parameter list are skipped; a second `|` pair directly
/// after it, or directly after the opening `[`, is the declaration.
#[must_use]
pub fn block_temporaries_spans(src: &ClassifiedSource<'_>, region: Span) -> Vec<Span> {
    let bytes = src.bytes();
    let end = region.end();
    let mut spans = Vec::new();
    for open in region.start()..end {
        if !src.is_code_byte(open, b'[') {
            continue;
        }
        let mut pos = skip_whitespace(src, open + 1, end);
        let mut has_params = false;
        while pos < end && src.is_code_byte(pos, b':') {
            let name_end = ident_end(bytes, pos + 1).min(end);
            if name_end == pos + 1 {
                break;
            }
            has_params = true;
            pos = skip_whitespace(src, name_end, end);
        }
        if has_params {
            if !src.is_code_byte(pos, b'|') {
                continue;
            }
            pos = skip_whitespace(src, pos + 1, end);
        }
        if pos >= end || !src.is_code_byte(pos, b'|') {
            continue;
        }
        let Some(close) = (pos + 1..end).find(|&i| src.is_code_byte(i, b'|')) else {
            continue;
        };
        let inner = Span::new(pos + 1, close);
        let only_names = (inner.start()..inner.end())
            .all(|i| src.is_code(i) && (is_ident_char(bytes[i]) || bytes[i].is_ascii_whitespace()));
        if only_names {
            spans.push(Span::new(pos, close + 1));
        }
    }
    spans
}

/// Returns the spans of every word-bounded code occurrence of `name` in `region`.
///
/// Occurrences directly followed by `:` are keyword tokens of the same
/// spelling and are skipped; `name :=` still counts.
#[must_use]
pub fn identifier_occurrences(src: &ClassifiedSource<'_>, name: &str, region: Span) -> Vec<Span> {
    let bytes = src.bytes();
    let mut found = Vec::new();
    let mut pos = region.start();
    while pos < region.end() {
        let Some(word) = word_at(src, pos, region.end()) else {
            pos += 1;
            continue;
        };
        let keyword_like =
            src.is_code_byte(word.end(), b':') && !is_assignment_at(src, word.end());
        let symbol = word.start() > 0 && bytes[word.start() - 1] == b'#';
        if src.slice(word) == name && !keyword_like && !symbol {
            found.push(word);
        }
        pos = word.end();
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_predicates() {
        assert!(is_identifier("fooBar_1"));
        assert!(!is_identifier("1foo"));
        assert!(!is_identifier("foo:"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn word_boundaries() {
        let bytes = b"self selfish";
        assert!(is_word_start(bytes, 0));
        assert!(is_word_end(bytes, 4));
        assert!(!is_word_end(bytes, 3));
        assert!(!is_word_start(bytes, 6));
    }

    #[test]
    fn keyword_token_rejects_symbols_and_assignment() {
        let src = ClassifiedSource::new("a at: 1. #at:put:. x:= 3");
        assert_eq!(keyword_token_at(&src, 2, src.len()), Some(Span::new(2, 5)));
        assert_eq!(keyword_token_at(&src, 10, src.len()), None);
        assert_eq!(keyword_token_at(&src, 13, src.len()), None);
        assert_eq!(keyword_token_at(&src, 19, src.len()), None);
    }

    #[test]
    fn binary_token_respects_length_limit() {
        let src = ClassifiedSource::new("a -> b ==== c");
        assert_eq!(binary_token_at(&src, 2, src.len()), Some(Span::new(2, 4)));
        assert_eq!(binary_token_at(&src, 7, src.len()), None);
    }

    #[test]
    fn decimal_point_is_not_a_terminator() {
        let src = ClassifiedSource::new("x := 3.14. y");
        assert!(!is_statement_terminator(&src, 6));
        assert!(is_statement_terminator(&src, 9));
    }

    #[test]
    fn nesting_never_goes_negative() {
        let mut nesting = Nesting::default();
        assert!(!nesting.step(b')'));
        assert!(nesting.is_top_level());
        assert!(nesting.step(b'['));
        assert!(nesting.step(b'('));
        assert!(!nesting.is_top_level());
        assert!(nesting.step(b')'));
        assert!(nesting.step(b']'));
        assert!(nesting.is_top_level());
    }

    #[test]
    fn temporaries_block_after_comment() {
        let text = "foo\n  \"note\" | a b |\n  a := 1";
        let src = ClassifiedSource::new(text);
        let block = temporaries_block(&src, 4).expect("temporaries");
        assert_eq!(src.slice(block.span), "| a b |");
        assert_eq!(block.names(&src), vec!["a", "b"]);
    }

    #[test]
    fn unclosed_temporaries_are_ignored() {
        let src = ClassifiedSource::new("foo\n | a b");
        assert_eq!(temporaries_block(&src, 4), None);
    }

    #[test]
    fn pragmas_before_and_after_temporaries() {
        let text = "foo\n  <primitive: 60>\n  | a |\n  <category: 'x'>\n  ^a";
        let src = ClassifiedSource::new(text);
        let found = preamble(&src, 4);
        let pragmas: Vec<_> = found.pragmas.iter().map(|p| src.slice(*p)).collect();
        assert_eq!(pragmas, vec!["<primitive: 60>", "<category: 'x'>"]);
        assert_eq!(found.temporaries.map(|t| src.slice(t.span)), Some("| a |"));
        assert_eq!(&text[found.end..], "\n  ^a");
    }

    #[test]
    fn comparison_is_not_a_pragma() {
        let src = ClassifiedSource::new("foo\n  ^a < b");
        let found = preamble(&src, 4);
        assert!(found.pragmas.is_empty());
        assert_eq!(found.end, 4);
    }

    #[test]
    fn literal_arrays_are_found() {
        let text = "x := #(foo bar (baz)). y qux";
        let src = ClassifiedSource::new(text);
        let spans = literal_array_spans(&src, Span::new(0, text.len()));
        assert_eq!(spans.len(), 1);
        assert_eq!(src.slice(spans[0]), "#(foo bar (baz))");
    }

    #[test]
    fn block_temporaries_after_parameters() {
        let text = "x do: [:each | | total | total := each]. [ | t | t ]. [:a | a | b]";
        let src = ClassifiedSource::new(text);
        let spans = block_temporaries_spans(&src, Span::new(0, text.len()));
        let found: Vec<_> = spans.iter().map(|s| src.slice(*s)).collect();
        assert_eq!(found, vec!["| total |", "| t |"]);
    }

    #[test]
    fn identifier_occurrences_skip_keywords_and_strings() {
        let text = "value: value 'value' \"value\" value := 1. #value";
        let src = ClassifiedSource::new(text);
        let found = identifier_occurrences(&src, "value", Span::new(0, text.len()));
        assert_eq!(found, vec![Span::new(7, 12), Span::new(29, 34)]);
    }
}
