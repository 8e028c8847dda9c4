// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Refactoring planners.
//!
//! **DDD Context:** Refactoring
//!
//! Every refactoring is split into two steps:
//!
//! 1. **Plan**: read the methods involved, check preconditions and compute the
//!    new source text. Nothing is written; a failed precondition returns a
//!    [`PreconditionError`].
//! 2. **Apply**: hand the plan's sources to [`ImageSession::compile_method`] /
//!    [`ImageSession::delete_method`] in a fixed order.
//!
//! `preview_*` runs step 1 and `apply_*` runs both. The steps of an apply are
//! not atomic; callers that need all-or-nothing wrap the call in their own
//! transaction.
//!
//! Senders are never guessed at: a plan reports how many methods send the
//! affected selector (with up to [`RefactorSettings::sender_example_limit`]
//! examples) as warnings.

mod error;
mod extract;
mod inline;
mod move_method;
mod parameters;
mod rename;
pub mod rewrite;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::image::{ImageSession, MethodRef, SessionError, Side};

pub use error::{PreconditionError, RefactorError};
pub use extract::{ExtractMethodPlan, ExtractMethodRequest};
pub use inline::{InlineMethodPlan, InlineMethodRequest};
pub use move_method::{MoveMethodPlan, MoveMethodRequest};
pub use parameters::{AddParameterPlan, AddParameterRequest, RemoveParameterPlan, RemoveParameterRequest};
pub use rename::{RenameMethodPlan, RenameMethodRequest, RenameSelectorPlan, RenameSelectorRequest};

/// Default number of example senders listed in a warning.
pub const DEFAULT_SENDER_EXAMPLE_LIMIT: usize = 10;

/// Default category for methods whose original category is unknown.
pub const DEFAULT_CATEGORY: &str = "as yet unclassified";

/// Body indentation used for generated methods.
pub(crate) const INDENT: &str = "    ";

/// Knobs shared by every planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefactorSettings {
    pub sender_example_limit: usize,
    pub default_category: String,
}

impl Default for RefactorSettings {
    fn default() -> Self {
        Self {
            sender_example_limit: DEFAULT_SENDER_EXAMPLE_LIMIT,
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

/// How many methods a change affects, with a few named.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SenderImpact {
    pub count: usize,
    pub examples: Vec<String>,
}

impl SenderImpact {
    #[must_use]
    pub fn new(methods: &[MethodRef], limit: usize) -> Self {
        Self {
            count: methods.len(),
            examples: methods.iter().take(limit).map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `A>>x, B>>y and 3 more`.
    #[must_use]
    pub fn describe(&self) -> String {
        let listed = self.examples.join(", ");
        match self.count.saturating_sub(self.examples.len()) {
            0 => listed,
            rest => format!("{listed} and {rest} more"),
        }
    }
}

/// One method whose source a plan replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodRewrite {
    pub method: MethodRef,
    pub category: String,
    pub original_source: String,
    pub new_source: String,
    pub replacements: usize,
}

/// What an apply did to the image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyEffects {
    pub compiled: Vec<MethodRef>,
    pub deleted: Vec<MethodRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_selector_removed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_method_compiled: Option<bool>,
}

impl ApplyEffects {
    pub(crate) fn compile(
        &mut self,
        session: &mut dyn ImageSession,
        class_name: &str,
        side: Side,
        source: &str,
        category: &str,
    ) -> Result<MethodRef, SessionError> {
        let method = session.compile_method(class_name, side, source, category)?;
        info!(%method, "Compiled");
        self.compiled.push(method.clone());
        Ok(method)
    }

    pub(crate) fn delete(&mut self, session: &mut dyn ImageSession, method: &MethodRef) -> Result<(), SessionError> {
        session.delete_method(method)?;
        info!(%method, "Deleted");
        self.deleted.push(method.clone());
        Ok(())
    }
}

/// A computed refactoring that knows how to write itself to an image.
pub trait RefactoringPlan: Serialize {
    fn warnings(&self) -> &[String];

    /// Performs the plan's writes in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first [`SessionError`] reported by the image.
    fn apply_to(&self, session: &mut dyn ImageSession) -> Result<ApplyEffects, SessionError>;
}

/// A plan together with what applying it did.
#[derive(Debug, Clone, Serialize)]
pub struct Applied<P> {
    #[serde(flatten)]
    pub plan: P,
    pub applied: bool,
    #[serde(flatten)]
    pub effects: ApplyEffects,
}

/// Applies a plan and wraps the outcome.
///
/// # Errors
///
/// Returns the first image failure; earlier writes are not rolled back.
#[instrument(skip_all)]
pub fn apply_plan<P: RefactoringPlan>(plan: P, session: &mut dyn ImageSession) -> Result<Applied<P>, RefactorError> {
    let effects = plan.apply_to(session)?;
    info!(
        compiled = effects.compiled.len(),
        deleted = effects.deleted.len(),
        "Applied refactoring"
    );
    Ok(Applied {
        plan,
        applied: true,
        effects,
    })
}

/// Category of `method`, or the configured default when it has none.
pub(crate) fn category_of(
    session: &dyn ImageSession,
    method: &MethodRef,
    settings: &RefactorSettings,
) -> Result<String, SessionError> {
    let category = session.get_method_category(method)?;
    Ok(if category.trim().is_empty() {
        settings.default_category.clone()
    } else {
        category
    })
}

macro_rules! preview_and_apply {
    ($(#[$doc:meta])* $preview:ident, $apply:ident, $plan_fn:path, $request:ty, $plan:ty) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns a [`PreconditionError`] when the refactoring cannot be
        /// planned, or the [`SessionError`] of a failed image query.
        pub fn $preview(
            session: &dyn ImageSession,
            request: &$request,
            settings: &RefactorSettings,
        ) -> Result<$plan, RefactorError> {
            $plan_fn(session, request, settings)
        }

        $(#[$doc])*
        /// Plans, then writes the result to the image.
        ///
        /// # Errors
        ///
        /// As for the preview, plus the first [`SessionError`] of a failed write.
        pub fn $apply(
            session: &mut dyn ImageSession,
            request: &$request,
            settings: &RefactorSettings,
        ) -> Result<Applied<$plan>, RefactorError> {
            let plan = $plan_fn(&*session, request, settings)?;
            apply_plan(plan, session)
        }
    };
}

preview_and_apply!(
    /// Renames a selector across the image: every implementor and every sender.
    preview_rename_selector, apply_rename_selector,
    rename::plan_rename_selector, RenameSelectorRequest, RenameSelectorPlan
);
preview_and_apply!(
    /// Renames one method and the senders on its own class and side.
    preview_rename_method, apply_rename_method,
    rename::plan_rename_method, RenameMethodRequest, RenameMethodPlan
);
preview_and_apply!(
    /// Moves a method to another class or side.
    preview_move_method, apply_move_method,
    move_method::plan_move_method, MoveMethodRequest, MoveMethodPlan
);
preview_and_apply!(
    /// Adds a keyword and argument to a method, keeping the old selector as a forwarder.
    preview_add_parameter, apply_add_parameter,
    parameters::plan_add_parameter, AddParameterRequest, AddParameterPlan
);
preview_and_apply!(
    /// Removes an unused argument from a method, keeping the old selector as a lossy forwarder.
    preview_remove_parameter, apply_remove_parameter,
    parameters::plan_remove_parameter, RemoveParameterRequest, RemoveParameterPlan
);
preview_and_apply!(
    /// Extracts contiguous statements into a new unary method.
    preview_extract_method, apply_extract_method,
    extract::plan_extract_method, ExtractMethodRequest, ExtractMethodPlan
);
preview_and_apply!(
    /// Replaces `self callee` sends in a caller with the callee's expression.
    preview_inline_method, apply_inline_method,
    inline::plan_inline_method, InlineMethodRequest, InlineMethodPlan
);
