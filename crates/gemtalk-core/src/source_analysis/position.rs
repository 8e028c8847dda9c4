// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Offset to line/column mapping.

use serde::Serialize;

use super::Span;

/// A human-readable position in source text (line and column, both 1-indexed).
///
/// Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, in characters).
    pub column: u32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Line/column for every byte offset of a text, plus one entry for the
/// position just past the end.
#[derive(Debug, Clone)]
pub struct PositionIndex {
    positions: Vec<Position>,
}

impl PositionIndex {
    /// Builds the index for `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut positions = Vec::with_capacity(text.len() + 1);
        let mut line = 1;
        let mut column = 1;

        for ch in text.chars() {
            let here = Position::new(line, column);
            positions.extend(std::iter::repeat_n(here, ch.len_utf8()));
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        positions.push(Position::new(line, column));

        Self { positions }
    }

    /// Returns the position of `offset`, clamping offsets past the end.
    #[must_use]
    pub fn at(&self, offset: usize) -> Position {
        let last = self.positions.len() - 1;
        self.positions[offset.min(last)]
    }

    /// Returns the positions of the first and last characters of `span`.
    ///
    /// An empty span reports its start position twice.
    #[must_use]
    pub fn span_bounds(&self, span: Span) -> (Position, Position) {
        let start = self.at(span.start());
        let end = if span.is_empty() {
            start
        } else {
            self.at(span.end() - 1)
        };
        (start, end)
    }
}
