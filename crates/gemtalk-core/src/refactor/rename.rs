// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Selector renames: image-wide, or scoped to one method.

use ecow::EcoString;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::rewrite::{rename_method_source, rename_sends};
use super::{
    ApplyEffects, MethodRewrite, PreconditionError, RefactorError, RefactorSettings, RefactoringPlan, SenderImpact,
    category_of,
};
use crate::image::{ImageSession, MethodRef, OccurrenceKind, SessionError, Side};
use crate::send_detection::analysis_limitations;
use crate::source_analysis::{SelectorKind, selector_arity, selector_kind};

/// Rename `old_selector` to `new_selector` everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameSelectorRequest {
    pub old_selector: EcoString,
    pub new_selector: EcoString,
    /// Replace methods that already define `new_selector` in an implementor's class.
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameSelectorPlan {
    pub old_selector: EcoString,
    pub new_selector: EcoString,
    pub implementors: Vec<MethodRewrite>,
    pub senders: Vec<MethodRewrite>,
    /// Senders reported by the image where no send could be rewritten.
    pub unchanged_senders: Vec<MethodRef>,
    pub sender_impact: SenderImpact,
    /// `new_selector` is already implemented by a class outside the rename.
    pub new_selector_conflict: bool,
    pub overwrite: bool,
    pub warnings: Vec<String>,
    pub analysis_limitations: Vec<String>,
}

/// Checks that `old` can be renamed to `new` without changing its shape.
pub(crate) fn check_rename(old: &str, new: &str) -> Result<SelectorKind, PreconditionError> {
    let kind_of = |selector: &str| {
        selector_kind(selector).ok_or_else(|| PreconditionError::InvalidSelector {
            selector: selector.into(),
            reason: "expected a unary, binary or keyword selector".to_string(),
        })
    };
    let old_kind = kind_of(old)?;
    let new_kind = kind_of(new)?;
    if old == new {
        return Err(PreconditionError::SameSelector(old.into()));
    }
    if old_kind != new_kind {
        return Err(PreconditionError::SelectorKindMismatch {
            old: old.into(),
            new: new.into(),
            old_kind,
            new_kind,
        });
    }
    let (old_arity, new_arity) = (selector_arity(old), selector_arity(new));
    if old_arity != new_arity {
        return Err(PreconditionError::ArityMismatch {
            old: old.into(),
            new: new.into(),
            old_arity,
            new_arity,
        });
    }
    Ok(old_kind)
}

/// Rewrites the sends of `old` in each sender, sorting them into rewritten and unchanged.
fn rewrite_senders(
    session: &dyn ImageSession,
    senders: &[MethodRef],
    old: &str,
    new: &str,
    settings: &RefactorSettings,
) -> Result<(Vec<MethodRewrite>, Vec<MethodRef>), SessionError> {
    let mut rewritten = Vec::new();
    let mut unchanged = Vec::new();
    for method in senders {
        let source = session.get_method_source(method)?;
        let renamed = rename_sends(&source, old, new);
        if renamed.replacements == 0 {
            warn!(%method, "Sender has no rewritable send; left unchanged");
            unchanged.push(method.clone());
            continue;
        }
        rewritten.push(MethodRewrite {
            method: method.clone(),
            category: category_of(session, method, settings)?,
            original_source: source,
            new_source: renamed.source,
            replacements: renamed.replacements,
        });
    }
    Ok((rewritten, unchanged))
}

fn unchanged_warning(unchanged: &[MethodRef], old: &str, settings: &RefactorSettings) -> Option<String> {
    (!unchanged.is_empty()).then(|| {
        format!(
            "No send of `{old}` could be rewritten in {} sender(s); review them by hand: {}",
            unchanged.len(),
            SenderImpact::new(unchanged, settings.sender_example_limit).describe()
        )
    })
}

#[instrument(skip_all, fields(old = %request.old_selector, new = %request.new_selector))]
pub(super) fn plan_rename_selector(
    session: &dyn ImageSession,
    request: &RenameSelectorRequest,
    settings: &RefactorSettings,
) -> Result<RenameSelectorPlan, RefactorError> {
    let old = request.old_selector.as_str();
    let new = request.new_selector.as_str();
    check_rename(old, new)?;

    let mut warnings = Vec::new();
    let implementors = session.selector_occurrences(old, OccurrenceKind::Implementors)?;
    if implementors.is_empty() {
        warnings.push(format!("No class implements `{old}`; only senders are rewritten"));
    }

    let mut implementor_rewrites = Vec::new();
    for method in &implementors {
        if !request.overwrite && session.implements(&method.class_name, method.side, new)? {
            return Err(PreconditionError::TargetSelectorExists(MethodRef::new(
                method.class_name.clone(),
                method.side,
                new,
            ))
            .into());
        }
        let source = session.get_method_source(method)?;
        let renamed = rename_method_source(&source, old, new)
            .ok_or_else(|| PreconditionError::UnparseableHeader(method.clone()))?;
        implementor_rewrites.push(MethodRewrite {
            method: method.clone(),
            category: category_of(session, method, settings)?,
            original_source: source,
            new_source: renamed.source,
            replacements: renamed.replacements,
        });
    }

    let conflicts: Vec<MethodRef> = session
        .selector_occurrences(new, OccurrenceKind::Implementors)?
        .into_iter()
        .filter(|existing| !implementors.iter().any(|method| method.same_scope(existing)))
        .collect();
    if !conflicts.is_empty() {
        warnings.push(format!(
            "`{new}` is already implemented by {}; sends that reach those classes will change behaviour",
            SenderImpact::new(&conflicts, settings.sender_example_limit).describe()
        ));
    }

    let senders: Vec<MethodRef> = session
        .selector_occurrences(old, OccurrenceKind::Senders)?
        .into_iter()
        .filter(|sender| !implementors.contains(sender))
        .collect();
    let sender_impact = SenderImpact::new(&senders, settings.sender_example_limit);
    if !sender_impact.is_empty() {
        warnings.push(format!(
            "{} sender(s) of `{old}` are rewritten without knowing their receivers: {}",
            sender_impact.count,
            sender_impact.describe()
        ));
    }
    let (sender_rewrites, unchanged_senders) = rewrite_senders(session, &senders, old, new, settings)?;
    warnings.extend(unchanged_warning(&unchanged_senders, old, settings));

    debug!(
        implementors = implementor_rewrites.len(),
        senders = sender_rewrites.len(),
        "Planned selector rename"
    );

    Ok(RenameSelectorPlan {
        old_selector: request.old_selector.clone(),
        new_selector: request.new_selector.clone(),
        implementors: implementor_rewrites,
        senders: sender_rewrites,
        unchanged_senders,
        sender_impact,
        new_selector_conflict: !conflicts.is_empty(),
        overwrite: request.overwrite,
        warnings,
        analysis_limitations: analysis_limitations(),
    })
}

impl RefactoringPlan for RenameSelectorPlan {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn apply_to(&self, session: &mut dyn ImageSession) -> Result<ApplyEffects, SessionError> {
        let mut effects = ApplyEffects::default();
        for rewrite in self.implementors.iter().chain(&self.senders) {
            effects.compile(
                session,
                &rewrite.method.class_name,
                rewrite.method.side,
                &rewrite.new_source,
                &rewrite.category,
            )?;
        }
        for rewrite in &self.implementors {
            effects.delete(session, &rewrite.method)?;
        }
        effects.old_selector_removed = Some(!self.implementors.is_empty());
        Ok(effects)
    }
}

/// Rename one method, and the senders on its own class and side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameMethodRequest {
    pub class_name: EcoString,
    #[serde(default)]
    pub side: Side,
    pub old_selector: EcoString,
    pub new_selector: EcoString,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameMethodPlan {
    pub method: MethodRef,
    pub new_method: MethodRef,
    pub rewrite: MethodRewrite,
    /// Same class and side; rewritten.
    pub same_scope_senders: Vec<MethodRewrite>,
    pub unchanged_senders: Vec<MethodRef>,
    /// Any other class or side; reported only.
    pub other_senders: SenderImpact,
    /// Other implementors of the old selector, left as they are.
    pub other_implementors: SenderImpact,
    pub overwrite: bool,
    pub warnings: Vec<String>,
    pub analysis_limitations: Vec<String>,
}

#[instrument(skip_all, fields(class = %request.class_name, old = %request.old_selector, new = %request.new_selector))]
pub(super) fn plan_rename_method(
    session: &dyn ImageSession,
    request: &RenameMethodRequest,
    settings: &RefactorSettings,
) -> Result<RenameMethodPlan, RefactorError> {
    let old = request.old_selector.as_str();
    let new = request.new_selector.as_str();
    check_rename(old, new)?;

    let method = MethodRef::new(request.class_name.clone(), request.side, old);
    let new_method = MethodRef::new(request.class_name.clone(), request.side, new);
    let source = session.get_method_source(&method)?;
    if !request.overwrite && session.implements(&method.class_name, method.side, new)? {
        return Err(PreconditionError::TargetSelectorExists(new_method).into());
    }
    let renamed =
        rename_method_source(&source, old, new).ok_or_else(|| PreconditionError::UnparseableHeader(method.clone()))?;
    let rewrite = MethodRewrite {
        method: method.clone(),
        category: category_of(session, &method, settings)?,
        original_source: source,
        new_source: renamed.source,
        replacements: renamed.replacements,
    };

    let (same_scope, others): (Vec<MethodRef>, Vec<MethodRef>) = session
        .selector_occurrences(old, OccurrenceKind::Senders)?
        .into_iter()
        .filter(|sender| *sender != method)
        .partition(|sender| sender.same_scope(&method));
    let (same_scope_senders, unchanged_senders) = rewrite_senders(session, &same_scope, old, new, settings)?;

    let other_implementors: Vec<MethodRef> = session
        .selector_occurrences(old, OccurrenceKind::Implementors)?
        .into_iter()
        .filter(|implementor| *implementor != method)
        .collect();

    let mut warnings = Vec::new();
    let other_senders = SenderImpact::new(&others, settings.sender_example_limit);
    if !other_senders.is_empty() {
        warnings.push(format!(
            "{} sender(s) of `{old}` outside {} were not rewritten because their receivers are unknown: {}",
            other_senders.count,
            scope_name(&method),
            other_senders.describe()
        ));
    }
    let other_implementors = SenderImpact::new(&other_implementors, settings.sender_example_limit);
    if !other_implementors.is_empty() {
        warnings.push(format!(
            "`{old}` is still implemented by {}; polymorphic sends may now reach a different method",
            other_implementors.describe()
        ));
    }
    warnings.extend(unchanged_warning(&unchanged_senders, old, settings));

    Ok(RenameMethodPlan {
        method,
        new_method,
        rewrite,
        same_scope_senders,
        unchanged_senders,
        other_senders,
        other_implementors,
        overwrite: request.overwrite,
        warnings,
        analysis_limitations: analysis_limitations(),
    })
}

/// `Foo` or `Foo class`.
pub(crate) fn scope_name(method: &MethodRef) -> String {
    match method.side {
        Side::Instance => method.class_name.to_string(),
        Side::Class => format!("{} class", method.class_name),
    }
}

impl RefactoringPlan for RenameMethodPlan {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn apply_to(&self, session: &mut dyn ImageSession) -> Result<ApplyEffects, SessionError> {
        let mut effects = ApplyEffects::default();
        effects.compile(
            session,
            &self.method.class_name,
            self.method.side,
            &self.rewrite.new_source,
            &self.rewrite.category,
        )?;
        for sender in &self.same_scope_senders {
            effects.compile(
                session,
                &sender.method.class_name,
                sender.method.side,
                &sender.new_source,
                &sender.category,
            )?;
        }
        effects.delete(session, &self.method)?;
        effects.old_selector_removed = Some(true);
        Ok(effects)
    }
}
