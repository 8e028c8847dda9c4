// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Inlining a single-expression unary method into one caller.

use ecow::EcoString;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::rewrite::{TextEdit, apply_edits};
use super::{
    ApplyEffects, PreconditionError, RefactorError, RefactorSettings, RefactoringPlan, SenderImpact, category_of,
};
use crate::image::{ImageSession, MethodRef, OccurrenceKind, SessionError, Side};
use crate::method_ast::{StatementKind, StatementSpan, split_body, split_statements};
use crate::send_detection::{ScanRegion, SendType, analysis_limitations, detect_sends};
use crate::source_analysis::scan::{self, word_at};
use crate::source_analysis::{ClassifiedSource, MethodHeader, SelectorKind, Span, selector_kind, split_header};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineMethodRequest {
    pub class_name: EcoString,
    #[serde(default)]
    pub side: Side,
    pub caller_selector: EcoString,
    pub callee_selector: EcoString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineMethodPlan {
    pub caller: MethodRef,
    pub callee: MethodRef,
    pub category: String,
    pub inline_expression: String,
    pub original_caller_source: String,
    pub new_caller_source: String,
    /// `self callee` sites replaced in the caller.
    pub replaced_sites: usize,
    /// Unary sends of the callee selector the detector found in the caller.
    pub caller_send_count: usize,
    /// Methods anywhere in the image that send the callee selector.
    pub callee_senders: SenderImpact,
    pub warnings: Vec<String>,
    pub analysis_limitations: Vec<String>,
}

#[instrument(skip_all, fields(class = %request.class_name, caller = %request.caller_selector, callee = %request.callee_selector))]
pub(super) fn plan_inline_method(
    session: &dyn ImageSession,
    request: &InlineMethodRequest,
    settings: &RefactorSettings,
) -> Result<InlineMethodPlan, RefactorError> {
    if selector_kind(&request.callee_selector) != Some(SelectorKind::Unary) {
        return Err(PreconditionError::InvalidSelector {
            selector: request.callee_selector.clone(),
            reason: "only unary methods can be inlined".to_string(),
        }
        .into());
    }
    if request.caller_selector == request.callee_selector {
        return Err(PreconditionError::SameSelector(request.callee_selector.clone()).into());
    }

    let caller = MethodRef::new(request.class_name.clone(), request.side, request.caller_selector.clone());
    let callee = MethodRef::new(request.class_name.clone(), request.side, request.callee_selector.clone());
    let callee_source = session.get_method_source(&callee)?;
    let inline_expression = inline_expression(&callee, &callee_source)?;

    let caller_source = session.get_method_source(&caller)?;
    let src = ClassifiedSource::new(&caller_source);
    let sites = self_send_sites(&src, &request.callee_selector);
    if sites.is_empty() {
        return Err(PreconditionError::NoInlineSites {
            caller,
            selector: request.callee_selector.clone(),
        }
        .into());
    }
    let replaced_sites = sites.len();
    let caller_send_count = detect_sends(&src)
        .iter()
        .filter(|send| send.send_type == SendType::Unary && send.selector == request.callee_selector)
        .count();
    let new_caller_source = apply_edits(
        &caller_source,
        sites
            .into_iter()
            .map(|site| TextEdit::new(site, format!("({inline_expression})")))
            .collect(),
    );

    let callee_senders: Vec<MethodRef> = session
        .selector_occurrences(&request.callee_selector, OccurrenceKind::Senders)?
        .into_iter()
        .filter(|sender| *sender != caller)
        .collect();
    let callee_senders = SenderImpact::new(&callee_senders, settings.sender_example_limit);

    let mut warnings = Vec::new();
    if caller_send_count != replaced_sites {
        warnings.push(format!(
            "{caller} sends `{}` {caller_send_count} time(s) but only {replaced_sites} `self {}` site(s) were replaced",
            request.callee_selector, request.callee_selector
        ));
    }
    if !callee_senders.is_empty() {
        warnings.push(format!(
            "{callee} is kept; {} other sender(s) still use it: {}",
            callee_senders.count,
            callee_senders.describe()
        ));
    }
    debug!(replaced_sites, caller_send_count, "Planned inline");

    Ok(InlineMethodPlan {
        category: category_of(session, &caller, settings)?,
        caller,
        callee,
        inline_expression,
        new_caller_source,
        original_caller_source: caller_source,
        replaced_sites,
        caller_send_count,
        callee_senders,
        warnings,
        analysis_limitations: analysis_limitations(),
    })
}

/// The callee's single statement with any leading `^` removed.
///
/// A callee written on one line (`answer ^42`) has no body statements; its
/// statement is taken from the header line after the signature.
fn inline_expression(callee: &MethodRef, text: &str) -> Result<String, PreconditionError> {
    let src = ClassifiedSource::new(text);
    let body = split_body(&src);
    if body.temporaries.is_some() {
        return Err(PreconditionError::InlineTargetHasTemporaries(callee.clone()));
    }
    let statements = if body.statements.is_empty() {
        header_line_statements(&src)
    } else {
        body.statements
    };
    let [statement] = statements.as_slice() else {
        return Err(PreconditionError::InlineTargetNotSingleStatement {
            method: callee.clone(),
            count: statements.len(),
        });
    };
    match statement.kind {
        StatementKind::Assignment => Err(PreconditionError::InlineTargetIsAssignment(callee.clone())),
        StatementKind::Return => Ok(src.slice(statement.span)[1..].trim().to_string()),
        StatementKind::Expression => Ok(src.slice(statement.span).to_string()),
    }
}

fn header_line_statements(src: &ClassifiedSource<'_>) -> Vec<StatementSpan> {
    let (line, _) = split_header(src.text());
    MethodHeader::parse(line).map_or_else(Vec::new, |header| {
        split_statements(src, Span::new(header.signature_end, line.len()))
    })
}

/// Spans of `self <selector>` in the body, excluding `self selector:`.
fn self_send_sites(src: &ClassifiedSource<'_>, selector: &str) -> Vec<Span> {
    let region = ScanRegion::body(src);
    let limit = region.span.end();
    let mut sites = Vec::new();
    let mut pos = region.span.start();
    while pos < limit {
        let Some(receiver) = word_at(src, pos, limit) else {
            pos += 1;
            continue;
        };
        pos = receiver.end();
        if src.slice(receiver) != "self" {
            continue;
        }
        let Some(word) = word_at(src, scan::skip_whitespace(src, receiver.end(), limit), limit) else {
            continue;
        };
        let site = Span::new(receiver.start(), word.end());
        if src.slice(word) == selector && !src.is_code_byte(word.end(), b':') && region.admits(site) {
            sites.push(site);
            pos = word.end();
        }
    }
    sites
}

impl RefactoringPlan for InlineMethodPlan {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn apply_to(&self, session: &mut dyn ImageSession) -> Result<ApplyEffects, SessionError> {
        let mut effects = ApplyEffects::default();
        effects.compile(
            session,
            &self.caller.class_name,
            self.caller.side,
            &self.new_caller_source,
            &self.category,
        )?;
        Ok(effects)
    }
}
