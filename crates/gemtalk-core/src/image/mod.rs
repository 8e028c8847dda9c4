// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The image the refactorings read from and write to.
//!
//! **DDD Context:** Image Access
//!
//! A live image owns classes, method dictionaries and compilation. The engine
//! only talks to it through [`ImageSession`]; [`MemoryImage`] is the in-process
//! implementation used by the command-line driver and the tests.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

mod memory;

use std::fmt;

use ecow::EcoString;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::{ClassEntry, MemoryImage, MethodEntry};

/// Instance side or class side of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Instance,
    Class,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Instance => "instance",
            Self::Class => "class",
        })
    }
}

/// Identifies one method: `Foo>>bar` or `Foo class>>bar`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodRef {
    pub class_name: EcoString,
    pub side: Side,
    pub selector: EcoString,
}

impl MethodRef {
    #[must_use]
    pub fn new(class_name: impl Into<EcoString>, side: Side, selector: impl Into<EcoString>) -> Self {
        Self {
            class_name: class_name.into(),
            side,
            selector: selector.into(),
        }
    }

    /// Returns true if both methods live on the same class and side.
    #[must_use]
    pub fn same_scope(&self, other: &Self) -> bool {
        self.class_name == other.class_name && self.side == other.side
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.side {
            Side::Instance => write!(f, "{}>>{}", self.class_name, self.selector),
            Side::Class => write!(f, "{} class>>{}", self.class_name, self.selector),
        }
    }
}

/// Which methods [`ImageSession::selector_occurrences`] should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceKind {
    /// Methods defining the selector.
    Implementors,
    /// Methods whose body sends the selector.
    Senders,
}

/// Outcome of a test run inside the image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunReport {
    pub passed: u32,
    pub failed: u32,
    pub errors: u32,
    /// `Class>>selector` of every test that failed or errored.
    pub failures: Vec<String>,
}

/// A failure reported by the image.
///
/// These are passed through to the caller unchanged; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SessionError {
    #[error("class `{0}` does not exist")]
    #[diagnostic(code(gemtalk::session::class_not_found))]
    ClassNotFound(EcoString),

    #[error("method `{0}` does not exist")]
    #[diagnostic(code(gemtalk::session::method_not_found))]
    MethodNotFound(MethodRef),

    #[error("compilation in `{class_name}` failed: {reason}")]
    #[diagnostic(
        code(gemtalk::session::compile_failed),
        help("the first line of a method must be its selector and argument names")
    )]
    CompileFailed { class_name: EcoString, reason: String },

    #[error("image operation failed: {0}")]
    #[diagnostic(code(gemtalk::session::operation_failed))]
    Operation(String),
}

/// Queries and writes against a class image.
///
/// Methods that take `&mut self` change the image. Multi-step refactorings
/// call them in sequence without a transaction; wrap the call in one if the
/// image supports it.
pub trait ImageSession {
    /// Full source of a method, header line first.
    fn get_method_source(&self, method: &MethodRef) -> Result<String, SessionError>;

    /// Category (protocol) the method is filed under.
    fn get_method_category(&self, method: &MethodRef) -> Result<String, SessionError>;

    /// Selectors defined on one side of a class, sorted.
    fn list_methods(&self, class_name: &str, side: Side) -> Result<Vec<EcoString>, SessionError>;

    /// Categories in use on one side of a class, sorted and unique.
    fn list_method_categories(&self, class_name: &str, side: Side) -> Result<Vec<String>, SessionError>;

    /// Class names, optionally restricted to one package.
    fn list_classes(&self, package: Option<&str>) -> Result<Vec<EcoString>, SessionError>;

    fn list_packages(&self) -> Result<Vec<EcoString>, SessionError>;

    /// Compiles `source` into a class, replacing any method with the same selector.
    fn compile_method(
        &mut self,
        class_name: &str,
        side: Side,
        source: &str,
        category: &str,
    ) -> Result<MethodRef, SessionError>;

    fn delete_method(&mut self, method: &MethodRef) -> Result<(), SessionError>;

    /// Implementors or senders of `selector` across the whole image, sorted and unique.
    fn selector_occurrences(&self, selector: &str, kind: OccurrenceKind) -> Result<Vec<MethodRef>, SessionError>;

    /// True if `ancestor` is a proper superclass of `class_name`.
    fn class_inherits_from(&self, class_name: &str, ancestor: &str) -> Result<bool, SessionError>;

    fn get_class_definition(&self, class_name: &str) -> Result<String, SessionError>;

    /// Evaluates a code snippet and returns its printed result.
    fn run_code(&mut self, source: &str) -> Result<String, SessionError>;

    fn run_test_method(&mut self, class_name: &str, selector: &str) -> Result<TestRunReport, SessionError>;

    /// Runs every test in a class, or in every test class of a package.
    fn run_tests_in_class_or_package(&mut self, name: &str) -> Result<TestRunReport, SessionError>;

    /// True if the class side defines `selector`.
    fn implements(&self, class_name: &str, side: Side, selector: &str) -> Result<bool, SessionError> {
        Ok(self
            .list_methods(class_name, side)?
            .iter()
            .any(|defined| defined == selector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_ref_display() {
        assert_eq!(MethodRef::new("Foo", Side::Instance, "bar").to_string(), "Foo>>bar");
        assert_eq!(MethodRef::new("Foo", Side::Class, "new:").to_string(), "Foo class>>new:");
    }

    #[test]
    fn method_refs_order_by_class_side_selector() {
        let mut refs = vec![
            MethodRef::new("B", Side::Instance, "a"),
            MethodRef::new("A", Side::Class, "a"),
            MethodRef::new("A", Side::Instance, "z"),
        ];
        refs.sort();
        let shown: Vec<_> = refs.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["A>>z", "A class>>a", "B>>a"]);
    }

    #[test]
    fn session_errors_have_codes() {
        let err = SessionError::ClassNotFound("Missing".into());
        assert_eq!(err.to_string(), "class `Missing` does not exist");
        assert_eq!(
            err.code().map(|code| code.to_string()),
            Some("gemtalk::session::class_not_found".to_string())
        );
    }
}
