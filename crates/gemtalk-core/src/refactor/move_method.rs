// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Moving a method to another class or side.

use std::collections::BTreeSet;

use ecow::EcoString;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::rename::scope_name;
use super::{
    ApplyEffects, PreconditionError, RefactorError, RefactorSettings, RefactoringPlan, SenderImpact, category_of,
};
use crate::image::{ImageSession, MethodRef, OccurrenceKind, SessionError, Side};
use crate::send_detection::{ReceiverHint, analysis_limitations, detect_sends};
use crate::source_analysis::ClassifiedSource;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveMethodRequest {
    pub source_class: EcoString,
    #[serde(default)]
    pub source_side: Side,
    pub selector: EcoString,
    pub target_class: EcoString,
    #[serde(default)]
    pub target_side: Side,
    /// Replace a method the target already defines.
    #[serde(default)]
    pub overwrite: bool,
    /// Leave the original method in place (a copy rather than a move).
    #[serde(default)]
    pub keep_source: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveMethodPlan {
    pub source: MethodRef,
    pub target: MethodRef,
    pub source_text: String,
    pub category: String,
    /// The target already defined the selector and will be overwritten.
    pub target_exists: bool,
    pub overwrite: bool,
    pub keep_source: bool,
    /// Senders on the source class and side.
    pub same_scope_senders: SenderImpact,
    /// Senders anywhere else.
    pub cross_scope_senders: SenderImpact,
    pub warnings: Vec<String>,
    pub analysis_limitations: Vec<String>,
}

#[instrument(skip_all, fields(selector = %request.selector, from = %request.source_class, to = %request.target_class))]
pub(super) fn plan_move_method(
    session: &dyn ImageSession,
    request: &MoveMethodRequest,
    settings: &RefactorSettings,
) -> Result<MoveMethodPlan, RefactorError> {
    let source = MethodRef::new(request.source_class.clone(), request.source_side, request.selector.clone());
    let target = MethodRef::new(request.target_class.clone(), request.target_side, request.selector.clone());
    if source == target {
        return Err(PreconditionError::IdenticalMoveTarget(source).into());
    }

    let source_text = session.get_method_source(&source)?;
    let category = category_of(session, &source, settings)?;
    let target_exists = session
        .list_methods(&target.class_name, target.side)?
        .iter()
        .any(|selector| *selector == request.selector);
    if target_exists && !request.overwrite {
        return Err(PreconditionError::TargetSelectorExists(target).into());
    }

    let (same_scope, cross_scope): (Vec<MethodRef>, Vec<MethodRef>) = session
        .selector_occurrences(&request.selector, OccurrenceKind::Senders)?
        .into_iter()
        .filter(|sender| *sender != source)
        .partition(|sender| sender.same_scope(&source));
    let same_scope_senders = SenderImpact::new(&same_scope, settings.sender_example_limit);
    let cross_scope_senders = SenderImpact::new(&cross_scope, settings.sender_example_limit);

    let mut warnings = Vec::new();
    if target_exists {
        warnings.push(format!("{target} already exists and will be replaced"));
    }
    if !same_scope_senders.is_empty() {
        let consequence = if request.keep_source {
            "still reach the original"
        } else {
            "will fail once the original is deleted"
        };
        warnings.push(format!(
            "{} sender(s) in {} are not rewritten and {consequence}: {}",
            same_scope_senders.count,
            scope_name(&source),
            same_scope_senders.describe()
        ));
    }
    if !cross_scope_senders.is_empty() {
        warnings.push(format!(
            "{} sender(s) elsewhere are not rewritten: {}",
            cross_scope_senders.count,
            cross_scope_senders.describe()
        ));
    }
    warnings.extend(inheritance_warning(session, &source, &target, &source_text)?);

    Ok(MoveMethodPlan {
        source,
        target,
        source_text,
        category,
        target_exists,
        overwrite: request.overwrite,
        keep_source: request.keep_source,
        same_scope_senders,
        cross_scope_senders,
        warnings,
        analysis_limitations: analysis_limitations(),
    })
}

/// Warns when the moved body talks to `self`/`super` but the target class is
/// not a subclass of the source class, so those sends may not be understood.
fn inheritance_warning(
    session: &dyn ImageSession,
    source: &MethodRef,
    target: &MethodRef,
    text: &str,
) -> Result<Option<String>, SessionError> {
    if target.class_name == source.class_name
        || session.class_inherits_from(&target.class_name, &source.class_name)?
    {
        return Ok(None);
    }
    let self_sends: BTreeSet<EcoString> = detect_sends(&ClassifiedSource::new(text))
        .into_iter()
        .filter(|send| matches!(send.receiver_hint, ReceiverHint::SelfReceiver | ReceiverHint::Super))
        .map(|send| send.selector)
        .collect();
    if self_sends.is_empty() {
        return Ok(None);
    }
    let listed: Vec<&str> = self_sends.iter().map(EcoString::as_str).collect();
    Ok(Some(format!(
        "{} does not inherit from {}; the moved method sends {} to self/super",
        target.class_name,
        source.class_name,
        listed.join(", ")
    )))
}

impl RefactoringPlan for MoveMethodPlan {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn apply_to(&self, session: &mut dyn ImageSession) -> Result<ApplyEffects, SessionError> {
        let mut effects = ApplyEffects::default();
        effects.compile(
            session,
            &self.target.class_name,
            self.target.side,
            &self.source_text,
            &self.category,
        )?;
        if !self.keep_source {
            effects.delete(session, &self.source)?;
        }
        effects.source_deleted = Some(!self.keep_source);
        Ok(effects)
    }
}
