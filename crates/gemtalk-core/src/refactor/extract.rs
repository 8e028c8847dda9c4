// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Extracting statements into a new unary method.

use ecow::EcoString;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::rewrite::{TextEdit, apply_edits, parse_header};
use super::{ApplyEffects, INDENT, PreconditionError, RefactorError, RefactorSettings, RefactoringPlan, category_of};
use crate::image::{ImageSession, MethodRef, SessionError, Side};
use crate::method_ast::{StatementKind, build_method_ast};
use crate::send_detection::analysis_limitations;
use crate::source_analysis::scan::identifier_occurrences;
use crate::source_analysis::{ClassifiedSource, SelectorKind, Span, selector_kind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractMethodRequest {
    pub class_name: EcoString,
    #[serde(default)]
    pub side: Side,
    pub selector: EcoString,
    /// 1-based statement indices; must form a contiguous range.
    pub statement_indices: Vec<u32>,
    pub new_selector: EcoString,
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractMethodPlan {
    pub method: MethodRef,
    pub new_method: MethodRef,
    pub category: String,
    pub statement_indices: Vec<u32>,
    pub original_source: String,
    pub new_method_source: String,
    /// The original method with the selection replaced by `self newSelector`.
    pub rewritten_source: String,
    /// Arguments and temporaries the selection uses; the new method cannot see them.
    pub referenced_locals: Vec<String>,
    pub overwrite: bool,
    pub warnings: Vec<String>,
    pub analysis_limitations: Vec<String>,
}

/// Sorts and deduplicates `indices`, checking they name a gap-free run of
/// existing statements. Returns the first and last index.
fn selection_range(indices: &[u32], count: usize) -> Result<(u32, u32), PreconditionError> {
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return Err(PreconditionError::EmptySelection);
    };
    if let Some(&index) = sorted.iter().find(|&&index| index == 0 || index as usize > count) {
        return Err(PreconditionError::StatementOutOfRange { index, count });
    }
    if sorted.len() != (last - first + 1) as usize {
        return Err(PreconditionError::NonContiguousSelection { first, last });
    }
    Ok((first, last))
}

#[instrument(skip_all, fields(class = %request.class_name, selector = %request.selector, new = %request.new_selector))]
pub(super) fn plan_extract_method(
    session: &dyn ImageSession,
    request: &ExtractMethodRequest,
    settings: &RefactorSettings,
) -> Result<ExtractMethodPlan, RefactorError> {
    if selector_kind(&request.new_selector) != Some(SelectorKind::Unary) {
        return Err(PreconditionError::InvalidSelector {
            selector: request.new_selector.clone(),
            reason: "extracted methods take no arguments, so the selector must be unary".to_string(),
        }
        .into());
    }
    if request.new_selector == request.selector {
        return Err(PreconditionError::SameSelector(request.new_selector.clone()).into());
    }

    let method = MethodRef::new(request.class_name.clone(), request.side, request.selector.clone());
    let new_method = MethodRef::new(request.class_name.clone(), request.side, request.new_selector.clone());
    let source = session.get_method_source(&method)?;
    let ast = build_method_ast(&source);

    let (first, last) = selection_range(&request.statement_indices, ast.statements.len())?;
    let selected = &ast.statements[first as usize - 1..last as usize];
    if let Some(statement) = selected
        .iter()
        .find(|statement| statement.statement_kind == StatementKind::Return)
    {
        return Err(PreconditionError::ReturnInSelection(statement.statement_index).into());
    }
    if !request.overwrite && session.implements(&request.class_name, request.side, &request.new_selector)? {
        return Err(PreconditionError::TargetSelectorExists(new_method).into());
    }

    let body: Vec<&str> = selected.iter().map(|statement| statement.source_text.as_str()).collect();
    let new_method_source = format!("{}\n{INDENT}{}", request.new_selector, body.join(&format!(".\n{INDENT}")));
    let selection = Span::new(selected[0].start_offset, selected[selected.len() - 1].end_offset);
    let rewritten_source = apply_edits(
        &source,
        vec![TextEdit::new(selection, format!("self {}", request.new_selector))],
    );

    let referenced_locals = referenced_locals(&source, &ast.temporaries, selection);
    let mut warnings = Vec::new();
    if !referenced_locals.is_empty() {
        warnings.push(format!(
            "The selection uses {} which the extracted method cannot see; it will not compile as-is",
            referenced_locals.join(", ")
        ));
    }
    if selected.iter().any(|statement| statement.statement_kind == StatementKind::Assignment) {
        warnings.push("The selection assigns variables; those assignments move into the new method".to_string());
    }
    debug!(first, last, "Planned extraction");

    Ok(ExtractMethodPlan {
        category: category_of(session, &method, settings)?,
        method,
        new_method,
        statement_indices: (first..=last).collect(),
        new_method_source,
        rewritten_source,
        original_source: source,
        referenced_locals,
        overwrite: request.overwrite,
        warnings,
        analysis_limitations: analysis_limitations(),
    })
}

/// Method arguments and temporaries mentioned inside `selection`.
fn referenced_locals(source: &str, temporaries: &[String], selection: Span) -> Vec<String> {
    let src = ClassifiedSource::new(source);
    let arguments = parse_header(source).map(|header| header.arguments).unwrap_or_default();
    arguments
        .iter()
        .map(EcoString::as_str)
        .chain(temporaries.iter().map(String::as_str))
        .filter(|name| !identifier_occurrences(&src, name, selection).is_empty())
        .map(ToString::to_string)
        .collect()
}

impl RefactoringPlan for ExtractMethodPlan {
    fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn apply_to(&self, session: &mut dyn ImageSession) -> Result<ApplyEffects, SessionError> {
        let mut effects = ApplyEffects::default();
        effects.compile(
            session,
            &self.method.class_name,
            self.method.side,
            &self.new_method_source,
            &self.category,
        )?;
        effects.compile(
            session,
            &self.method.class_name,
            self.method.side,
            &self.rewritten_source,
            &self.category,
        )?;
        Ok(effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_is_sorted_and_deduplicated() {
        assert_eq!(selection_range(&[3, 2, 2], 4), Ok((2, 3)));
    }

    #[test]
    fn selection_errors() {
        assert_eq!(selection_range(&[], 4), Err(PreconditionError::EmptySelection));
        assert_eq!(
            selection_range(&[1, 5], 4),
            Err(PreconditionError::StatementOutOfRange { index: 5, count: 4 })
        );
        assert_eq!(
            selection_range(&[0], 4),
            Err(PreconditionError::StatementOutOfRange { index: 0, count: 4 })
        );
        assert_eq!(
            selection_range(&[1, 3], 4),
            Err(PreconditionError::NonContiguousSelection { first: 1, last: 3 })
        );
    }

    #[test]
    fn locals_inside_selection_are_found() {
        let source = "sum: a with: b\n    | t |\n    t := a + 1.\n    ^t";
        let start = source.find("t :=").unwrap();
        let selection = Span::new(start, start + "t := a + 1".len());
        assert_eq!(
            referenced_locals(source, &["t".to_string()], selection),
            vec!["a".to_string(), "t".to_string()]
        );
    }
}
