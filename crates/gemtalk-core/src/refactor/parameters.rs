// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Adding and removing keyword arguments.
//!
//! Both refactorings keep existing senders working by recompiling the old
//! selector as a one-line forwarder to the new one:
//!
//! ```text
//! at: index                       at: index put: value
//!     ^self at: index ifAbsent: nil   ^self at: index       "value is dropped"
//! ```
//!
//! The add forwarder supplies a default for the new slot. The remove
//! forwarder discards the argument it no longer passes on, which is lossy
//! for any sender that relied on it; every remove plan says so first.

use ecow::EcoString;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::rewrite::{parse_header, replace_header};
use super::{
    ApplyEffects, INDENT, PreconditionError, RefactorError, RefactorSettings, RefactoringPlan, SenderImpact,
    category_of,
};
use crate::image::{ImageSession, MethodRef, OccurrenceKind, SessionError, Side};
use crate::method_ast::build_method_ast;
use crate::send_detection::analysis_limitations;
use crate::source_analysis::scan::{self, identifier_occurrences, is_identifier};
use crate::source_analysis::{ClassifiedSource, CharClass, MethodHeader, SelectorKind, Span, selector_kind};

/// Names that can never be arguments.
const RESERVED_NAMES: [&str; 6] = ["self", "super", "nil", "true", "false", "thisContext"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddParameterRequest {
    pub class_name: EcoString,
    #[serde(default)]
    pub side: Side,
    pub selector: EcoString,
    /// The keyword token to append, e.g. `ifAbsent:`.
    pub keyword: EcoString,
    pub argument_name: EcoString,
    /// Source expression the forwarder passes for the new argument.
    pub default_argument: String,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddParameterPlan {
    pub method: MethodRef,
    pub new_method: MethodRef,
    pub category: String,
    pub original_source: String,
    pub new_source: String,
    /// Recompiled under the old selector; forwards with the default argument.
    pub compatibility_source: String,
    pub sender_impact: SenderImpact,
    pub warnings: Vec<String>,
    pub analysis_limitations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveParameterRequest {
    pub class_name: EcoString,
    #[serde(default)]
    pub side: Side,
    pub selector: EcoString,
    pub argument_name: EcoString,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoveParameterPlan {
    pub method: MethodRef,
    pub new_method: MethodRef,
    pub removed_argument: EcoString,
    pub category: String,
    pub original_source: String,
    pub new_source: String,
    /// Recompiled under the old selector; silently drops the removed argument.
    pub compatibility_source: String,
    pub sender_impact: SenderImpact,
    pub warnings: Vec<String>,
    pub analysis_limitations: Vec<String>,
}

/// The target method's source and parsed keyword header.
struct KeywordMethod {
    method: MethodRef,
    source: String,
    header: MethodHeader,
}

fn load_keyword_method(
    session: &dyn ImageSession,
    class_name: &EcoString,
    side: Side,
    selector: &EcoString,
) -> Result<KeywordMethod, RefactorError> {
    if selector_kind(selector) != Some(SelectorKind::Keyword) {
        return Err(PreconditionError::KeywordSelectorRequired(selector.clone()).into());
    }
    let method = MethodRef::new(class_name.clone(), side, selector.clone());
    let source = session.get_method_source(&method)?;
    let header = parse_header(&source)
        .filter(|header| header.kind == SelectorKind::Keyword && header.selector == *selector)
        .ok_or_else(|| PreconditionError::UnparseableHeader(method.clone()))?;
    Ok(KeywordMethod { method, source, header })
}

fn check_free_selector(
    session: &dyn ImageSession,
    method: &MethodRef,
    selector: &str,
    overwrite: bool,
) -> Result<MethodRef, RefactorError> {
    let new_method = MethodRef::new(method.class_name.clone(), method.side, selector);
    if !overwrite && session.implements(&method.class_name, method.side, selector)? {
        return Err(PreconditionError::TargetSelectorExists(new_method).into());
    }
    Ok(new_method)
}

/// `header\n    ^self forwarded`.
fn forwarder(header: &MethodHeader, target: &MethodHeader, arguments: &[String]) -> String {
    format!("{}\n{INDENT}^self {}", header.render(), target.render_with(arguments))
}

/// Wraps `expression` in parentheses unless it is a single literal or name.
fn as_argument(expression: &str) -> String {
    let expression = expression.trim();
    if is_atom(expression) {
        expression.to_string()
    } else {
        format!("({expression})")
    }
}

fn is_atom(expression: &str) -> bool {
    let bytes = expression.as_bytes();
    let Some(&first) = bytes.first() else {
        return false;
    };
    if is_identifier(expression) {
        return true;
    }
    let digits = expression.strip_prefix('-').unwrap_or(expression);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit() || b == b'.') && !digits.ends_with('.') {
        return true;
    }
    match first {
        b'\'' => {
            let src = ClassifiedSource::new(expression);
            expression.len() >= 2
                && expression.ends_with('\'')
                && (0..src.len()).all(|i| src.class_at(i) == Some(CharClass::String))
                && ClassifiedSource::new(&format!("{expression} x")).is_code(expression.len() + 1)
        }
        b'#' => {
            let rest = &expression[1..];
            !rest.is_empty() && rest.bytes().all(|b| scan::is_ident_char(b) || b == b':')
        }
        b'$' => expression.chars().count() == 2,
        _ => false,
    }
}

#[instrument(skip_all, fields(class = %request.class_name, selector = %request.selector, keyword = %request.keyword))]
pub(super) fn plan_add_parameter(
    session: &dyn ImageSession,
    request: &AddParameterRequest,
    settings: &RefactorSettings,
) -> Result<AddParameterPlan, RefactorError> {
    let target = load_keyword_method(session, &request.class_name, request.side, &request.selector)?;

    if selector_kind(&request.keyword) != Some(SelectorKind::Keyword) || request.keyword.matches(':').count() != 1 {
        return Err(PreconditionError::InvalidSelector {
            selector: request.keyword.clone(),
            reason: "expected a single keyword token such as `with:`".to_string(),
        }
        .into());
    }
    let name = request.argument_name.as_str();
    if !is_identifier(name) || RESERVED_NAMES.contains(&name) {
        return Err(PreconditionError::InvalidArgumentName(request.argument_name.clone()).into());
    }
    let temporaries = build_method_ast(&target.source).temporaries;
    if target.header.arguments.iter().any(|argument| argument == name) || temporaries.iter().any(|temp| temp == name) {
        return Err(PreconditionError::ArgumentNameClash {
            method: target.method,
            name: request.argument_name.clone(),
        }
        .into());
    }
    if request.default_argument.trim().is_empty() {
        return Err(PreconditionError::EmptyDefaultArgument.into());
    }

    let mut parts = target.header.parts.clone();
    parts.push(request.keyword.clone());
    let mut arguments = target.header.arguments.clone();
    arguments.push(request.argument_name.clone());
    let new_header = MethodHeader::from_parts(SelectorKind::Keyword, parts, arguments);
    let new_method = check_free_selector(session, &target.method, &new_header.selector, request.overwrite)?;

    let new_source = replace_header(&target.source, &target.header, &new_header);
    let mut forwarded: Vec<String> = target.header.arguments.iter().map(ToString::to_string).collect();
    forwarded.push(as_argument(&request.default_argument));
    let compatibility_source = forwarder(&target.header, &new_header, &forwarded);

    let senders = session.selector_occurrences(&request.selector, OccurrenceKind::Senders)?;
    let sender_impact = SenderImpact::new(&senders, settings.sender_example_limit);
    let mut warnings = Vec::new();
    if !sender_impact.is_empty() {
        warnings.push(format!(
            "{} sender(s) keep calling `{}`, which now forwards to `{}` with `{}`: {}",
            sender_impact.count,
            request.selector,
            new_header.selector,
            as_argument(&request.default_argument),
            sender_impact.describe()
        ));
    }

    Ok(AddParameterPlan {
        category: category_of(session, &target.method, settings)?,
        method: target.method,
        new_method,
        original_source: target.source,
        new_source,
        compatibility_source,
        sender_impact,
        warnings,
        analysis_limitations: analysis_limitations(),
    })
}

impl RefactoringPlan for AddParameterPlan {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn apply_to(&self, session: &mut dyn ImageSession) -> Result<ApplyEffects, SessionError> {
        apply_with_forwarder(
            session,
            &self.method,
            &self.new_source,
            &self.compatibility_source,
            &self.category,
        )
    }
}

#[instrument(skip_all, fields(class = %request.class_name, selector = %request.selector, argument = %request.argument_name))]
pub(super) fn plan_remove_parameter(
    session: &dyn ImageSession,
    request: &RemoveParameterRequest,
    settings: &RefactorSettings,
) -> Result<RemoveParameterPlan, RefactorError> {
    let target = load_keyword_method(session, &request.class_name, request.side, &request.selector)?;
    let Some(position) = target
        .header
        .arguments
        .iter()
        .position(|argument| *argument == request.argument_name)
    else {
        return Err(PreconditionError::UnknownArgument {
            method: target.method,
            argument: request.argument_name.clone(),
        }
        .into());
    };

    let src = ClassifiedSource::new(&target.source);
    let after_signature = Span::new(target.header.signature_end, target.source.len());
    if !identifier_occurrences(&src, &request.argument_name, after_signature).is_empty() {
        return Err(PreconditionError::ArgumentStillReferenced {
            method: target.method,
            argument: request.argument_name.clone(),
        }
        .into());
    }

    let mut parts = target.header.parts.clone();
    let dropped = parts.remove(position);
    let mut arguments = target.header.arguments.clone();
    arguments.remove(position);
    let new_header = if parts.is_empty() {
        MethodHeader::from_parts(SelectorKind::Unary, vec![dropped.trim_end_matches(':').into()], Vec::new())
    } else {
        MethodHeader::from_parts(SelectorKind::Keyword, parts, arguments.clone())
    };
    let new_method = check_free_selector(session, &target.method, &new_header.selector, request.overwrite)?;

    let new_source = replace_header(&target.source, &target.header, &new_header);
    let forwarded: Vec<String> = arguments.iter().map(ToString::to_string).collect();
    let compatibility_source = forwarder(&target.header, &new_header, &forwarded);

    let senders = session.selector_occurrences(&request.selector, OccurrenceKind::Senders)?;
    let sender_impact = SenderImpact::new(&senders, settings.sender_example_limit);
    let mut warnings = vec![format!(
        "LOSSY: `{}` is kept as a forwarder to `{}` that silently discards its `{}` argument; \
         senders passing a meaningful value lose it",
        request.selector, new_header.selector, request.argument_name
    )];
    if !sender_impact.is_empty() {
        warnings.push(format!(
            "{} sender(s) go through the lossy forwarder: {}",
            sender_impact.count,
            sender_impact.describe()
        ));
    }

    Ok(RemoveParameterPlan {
        category: category_of(session, &target.method, settings)?,
        method: target.method,
        new_method,
        removed_argument: request.argument_name.clone(),
        original_source: target.source,
        new_source,
        compatibility_source,
        sender_impact,
        warnings,
        analysis_limitations: analysis_limitations(),
    })
}

impl RefactoringPlan for RemoveParameterPlan {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn apply_to(&self, session: &mut dyn ImageSession) -> Result<ApplyEffects, SessionError> {
        apply_with_forwarder(
            session,
            &self.method,
            &self.new_source,
            &self.compatibility_source,
            &self.category,
        )
    }
}

/// Compiles the new method, then the forwarder over the old selector.
fn apply_with_forwarder(
    session: &mut dyn ImageSession,
    method: &MethodRef,
    new_source: &str,
    compatibility_source: &str,
    category: &str,
) -> Result<ApplyEffects, SessionError> {
    let mut effects = ApplyEffects::default();
    effects.compile(session, &method.class_name, method.side, new_source, category)?;
    effects.compile(session, &method.class_name, method.side, compatibility_source, category)?;
    effects.compatibility_method_compiled = Some(true);
    Ok(effects)
}
