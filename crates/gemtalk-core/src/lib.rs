// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Gemtalk analysis core.
//!
//! This crate contains the method-source engine:
//! - Source classification (code vs. string/comment characters)
//! - Send detection (unary, binary, keyword and cascade sends with offsets)
//! - Lightweight method ASTs (temporaries, statements, summaries)
//! - Refactoring planners with preview/apply over an [`image::ImageSession`]
//!
//! Everything is heuristic and text-based; see
//! [`send_detection::ANALYSIS_LIMITATIONS`].

#![doc = include_str!("../../../README.md")]

pub mod image;
pub mod method_ast;
pub mod refactor;
pub mod send_detection;
pub mod source_analysis;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::image::{ImageSession, MemoryImage, MethodRef, SessionError, Side};
    pub use crate::method_ast::{MethodAst, StatementKind, StatementRecord, build_method_ast};
    pub use crate::refactor::{PreconditionError, RefactorError, RefactorSettings, RefactoringPlan};
    pub use crate::send_detection::{ReceiverHint, SendRecord, SendType, detect_sends, find_sends};
    pub use crate::source_analysis::{ClassifiedSource, Span};
}
