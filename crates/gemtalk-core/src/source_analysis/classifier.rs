// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Code / string / comment classification of method source.
//!
//! This is the only place that understands literal and comment syntax. Every
//! other scanner asks [`ClassifiedSource::is_code`] before treating a byte as
//! syntax, so a selector that only appears inside `'...'` or `"..."` is never
//! seen as a send.
//!
//! The scan never fails: an unterminated string or comment simply leaves the
//! rest of the text non-code.

use super::Span;

/// Classification of a single source byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// Ordinary code, including whitespace between tokens.
    Code,
    /// Inside a string literal (quotes included) or the payload of a `$x` literal.
    String,
    /// Inside a `"..."` comment (quotes included).
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    InString,
    InComment,
}

/// Method source text with a per-byte classification parallel to it.
///
/// `classes.len() == text.len()` always holds. Offsets are byte offsets; all
/// syntax characters are ASCII, so every byte of a multi-byte character shares
/// the class of the region it sits in.
///
/// # Examples
///
/// ```
/// use gemtalk_core::source_analysis::ClassifiedSource;
///
/// let src = ClassifiedSource::new("x := 'a.b'");
/// assert!(src.is_code(0));
/// assert!(!src.is_code(6));
/// ```
#[derive(Debug, Clone)]
pub struct ClassifiedSource<'src> {
    text: &'src str,
    classes: Vec<CharClass>,
}

impl<'src> ClassifiedSource<'src> {
    /// Classifies `text` in a single left-to-right pass.
    #[must_use]
    pub fn new(text: &'src str) -> Self {
        let bytes = text.as_bytes();
        let mut classes = vec![CharClass::Code; bytes.len()];
        let mut state = State::Code;
        let mut i = 0;

        while i < bytes.len() {
            match state {
                State::Code => match bytes[i] {
                    b'\'' => {
                        classes[i] = CharClass::String;
                        state = State::InString;
                    }
                    b'"' => {
                        classes[i] = CharClass::Comment;
                        state = State::InComment;
                    }
                    b'$' if i + 1 < bytes.len() => {
                        // `$x` character literal: the payload is never syntax.
                        let width = text[i + 1..].chars().next().map_or(1, char::len_utf8);
                        for class in &mut classes[i + 1..i + 1 + width] {
                            *class = CharClass::String;
                        }
                        i += width;
                    }
                    _ => {}
                },
                State::InString => {
                    classes[i] = CharClass::String;
                    if bytes[i] == b'\'' {
                        if bytes.get(i + 1) == Some(&b'\'') {
                            classes[i + 1] = CharClass::String;
                            i += 1;
                        } else {
                            state = State::Code;
                        }
                    }
                }
                State::InComment => {
                    classes[i] = CharClass::Comment;
                    if bytes[i] == b'"' {
                        state = State::Code;
                    }
                }
            }
            i += 1;
        }

        Self { text, classes }
    }

    /// Returns the classified text.
    #[must_use]
    pub fn text(&self) -> &'src str {
        self.text
    }

    /// Returns the raw bytes of the classified text.
    #[must_use]
    pub fn bytes(&self) -> &'src [u8] {
        self.text.as_bytes()
    }

    /// Returns the length of the text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns the class of the byte at `offset`, or `None` past the end.
    #[must_use]
    pub fn class_at(&self, offset: usize) -> Option<CharClass> {
        self.classes.get(offset).copied()
    }

    /// Returns true if the byte at `offset` is code. Out-of-range offsets are not code.
    #[must_use]
    pub fn is_code(&self, offset: usize) -> bool {
        self.class_at(offset) == Some(CharClass::Code)
    }

    /// Returns true if every byte of `span` is code.
    #[must_use]
    pub fn is_code_span(&self, span: Span) -> bool {
        span.end() <= self.len()
            && self.classes[span.as_range()]
                .iter()
                .all(|class| *class == CharClass::Code)
    }

    /// Returns true if the byte at `offset` is code and equals `byte`.
    #[must_use]
    pub fn is_code_byte(&self, offset: usize, byte: u8) -> bool {
        self.is_code(offset) && self.bytes()[offset] == byte
    }

    /// Returns true if the byte at `offset` carries meaning for a reader:
    /// anything except code whitespace and comment text.
    #[must_use]
    pub fn is_significant(&self, offset: usize) -> bool {
        match self.class_at(offset) {
            Some(CharClass::Code) => !self.bytes()[offset].is_ascii_whitespace(),
            Some(CharClass::String) => true,
            Some(CharClass::Comment) | None => false,
        }
    }

    /// Returns the source text covered by `span`.
    #[must_use]
    pub fn slice(&self, span: Span) -> &'src str {
        &self.text[span.as_range()]
    }

    /// Returns a boolean code map, one entry per byte.
    #[must_use]
    pub fn code_map(&self) -> Vec<bool> {
        self.classes
            .iter()
            .map(|class| *class == CharClass::Code)
            .collect()
    }
}
