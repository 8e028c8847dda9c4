// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Character-level analysis of method source.
//!
//! **DDD Context:** Source Analysis
//!
//! Method text arrives from the image as an opaque string: a header line
//! followed by the body. Rather than parsing it, this module classifies every
//! byte as code, string literal or comment ([`ClassifiedSource`]), maps
//! offsets to line/column ([`PositionIndex`]) and provides the shared cursor
//! helpers ([`scan`]) the send detector and statement splitter are built on.
//!
//! ```
//! use gemtalk_core::source_analysis::{ClassifiedSource, PositionIndex};
//!
//! let text = "foo\n    ^'done'";
//! let src = ClassifiedSource::new(text);
//! assert!(src.is_code(8));
//! assert!(!src.is_code(10));
//! assert_eq!(PositionIndex::new(text).at(8).line, 2);
//! ```

mod classifier;
mod header;
mod position;
pub mod scan;
mod span;

#[cfg(test)]
mod property_tests;

pub use classifier::{CharClass, ClassifiedSource};
pub use header::{MethodHeader, SelectorKind, keyword_parts, selector_arity, selector_kind};
pub use position::{Position, PositionIndex};
pub use span::Span;

/// Returns the method's header line (without a trailing `\r`) and the offset
/// where the body starts: just after the first `\n`, or the text length when
/// the method is a single line.
#[must_use]
pub fn split_header(text: &str) -> (&str, usize) {
    match text.find('\n') {
        Some(newline) => (text[..newline].trim_end_matches('\r'), newline + 1),
        None => (text, text.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_header_on_first_newline() {
        assert_eq!(split_header("foo\r\n  ^1"), ("foo", 5));
        assert_eq!(split_header("foo ^1"), ("foo ^1", 6));
    }
}
