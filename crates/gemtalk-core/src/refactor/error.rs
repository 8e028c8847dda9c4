// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Refactoring errors.
//!
//! A [`PreconditionError`] is raised while planning, before anything is
//! written. Image failures arrive as [`SessionError`] and are passed through.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use crate::image::{MethodRef, SessionError};
use crate::source_analysis::SelectorKind;

/// A refactoring that cannot be planned as requested.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum PreconditionError {
    #[error("`{selector}` is not a valid selector: {reason}")]
    #[diagnostic(code(gemtalk::precondition::invalid_selector))]
    InvalidSelector { selector: EcoString, reason: String },

    #[error("`{old}` takes {old_arity} argument(s) but `{new}` takes {new_arity}")]
    #[diagnostic(
        code(gemtalk::precondition::arity_mismatch),
        help("use add-parameter or remove-parameter to change the number of arguments")
    )]
    ArityMismatch {
        old: EcoString,
        new: EcoString,
        old_arity: usize,
        new_arity: usize,
    },

    #[error("`{old}` is a {old_kind} selector but `{new}` is a {new_kind} selector")]
    #[diagnostic(code(gemtalk::precondition::selector_kind_mismatch))]
    SelectorKindMismatch {
        old: EcoString,
        new: EcoString,
        old_kind: SelectorKind,
        new_kind: SelectorKind,
    },

    #[error("old and new selector are both `{0}`")]
    #[diagnostic(code(gemtalk::precondition::same_selector))]
    SameSelector(EcoString),

    #[error("cannot read the header line of {0}")]
    #[diagnostic(code(gemtalk::precondition::unparseable_header))]
    UnparseableHeader(MethodRef),

    #[error("`{0}` is not a keyword selector")]
    #[diagnostic(
        code(gemtalk::precondition::keyword_selector_required),
        help("only keyword selectors have arguments to add to or remove from")
    )]
    KeywordSelectorRequired(EcoString),

    #[error("no statements were selected")]
    #[diagnostic(code(gemtalk::precondition::empty_selection))]
    EmptySelection,

    #[error("statement {index} does not exist; the method has {count} statement(s)")]
    #[diagnostic(code(gemtalk::precondition::statement_out_of_range))]
    StatementOutOfRange { index: u32, count: usize },

    #[error("statements {first} to {last} must be selected without gaps")]
    #[diagnostic(code(gemtalk::precondition::non_contiguous_selection))]
    NonContiguousSelection { first: u32, last: u32 },

    #[error("statement {0} returns; a selection containing a return cannot be extracted")]
    #[diagnostic(code(gemtalk::precondition::return_in_selection))]
    ReturnInSelection(u32),

    #[error("{0} declares temporaries and cannot be inlined")]
    #[diagnostic(code(gemtalk::precondition::inline_target_has_temporaries))]
    InlineTargetHasTemporaries(MethodRef),

    #[error("{method} has {count} statements; only single-statement methods can be inlined")]
    #[diagnostic(code(gemtalk::precondition::inline_target_not_single_statement))]
    InlineTargetNotSingleStatement { method: MethodRef, count: usize },

    #[error("{0} is an assignment and cannot be inlined as an expression")]
    #[diagnostic(code(gemtalk::precondition::inline_target_is_assignment))]
    InlineTargetIsAssignment(MethodRef),

    #[error("{caller} never sends `self {selector}`")]
    #[diagnostic(
        code(gemtalk::precondition::no_inline_sites),
        help("only unary sends whose receiver is written as `self` are inlined")
    )]
    NoInlineSites { caller: MethodRef, selector: EcoString },

    #[error("argument `{argument}` is still used in {method}")]
    #[diagnostic(
        code(gemtalk::precondition::argument_still_referenced),
        help("remove the uses of the argument from the body first")
    )]
    ArgumentStillReferenced { method: MethodRef, argument: EcoString },

    #[error("{method} has no argument named `{argument}`")]
    #[diagnostic(code(gemtalk::precondition::unknown_argument))]
    UnknownArgument { method: MethodRef, argument: EcoString },

    #[error("`{name}` is already an argument or temporary of {method}")]
    #[diagnostic(code(gemtalk::precondition::argument_name_clash))]
    ArgumentNameClash { method: MethodRef, name: EcoString },

    #[error("`{0}` is not a valid argument name")]
    #[diagnostic(code(gemtalk::precondition::invalid_argument_name))]
    InvalidArgumentName(EcoString),

    #[error("the default argument expression is empty")]
    #[diagnostic(
        code(gemtalk::precondition::empty_default_argument),
        help("existing senders need a value for the new argument, e.g. `nil`")
    )]
    EmptyDefaultArgument,

    #[error("cannot move {0} onto itself")]
    #[diagnostic(code(gemtalk::precondition::identical_move_target))]
    IdenticalMoveTarget(MethodRef),

    #[error("{0} already exists")]
    #[diagnostic(
        code(gemtalk::precondition::target_selector_exists),
        help("pass overwrite to replace the existing method")
    )]
    TargetSelectorExists(MethodRef),
}

/// Any failure of a preview or apply call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum RefactorError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Side;

    #[test]
    fn precondition_messages() {
        let err = PreconditionError::ArityMismatch {
            old: "at:put:".into(),
            new: "at:".into(),
            old_arity: 2,
            new_arity: 1,
        };
        assert_eq!(err.to_string(), "`at:put:` takes 2 argument(s) but `at:` takes 1");

        let err = PreconditionError::TargetSelectorExists(MethodRef::new("Foo", Side::Class, "bar"));
        assert_eq!(err.to_string(), "Foo class>>bar already exists");
    }

    #[test]
    fn refactor_error_is_transparent() {
        let err = RefactorError::from(PreconditionError::EmptySelection);
        assert_eq!(err.to_string(), "no statements were selected");
        assert_eq!(
            err.code().map(|code| code.to_string()),
            Some("gemtalk::precondition::empty_selection".to_string())
        );
    }
}
