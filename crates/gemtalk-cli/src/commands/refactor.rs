// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Refactoring subcommands.
//!
//! Each command plans against a JSON image snapshot. Without `--apply` the plan
//! is printed and the snapshot is left alone; with `--apply` the plan is
//! written to the in-memory image and the snapshot is saved only if every
//! write succeeded.

use std::fmt::Write as _;

use camino::Utf8PathBuf;
use clap::{Args, Subcommand};
use gemtalk_core::image::{ImageSession, Side};
use gemtalk_core::refactor::{
    AddParameterPlan, AddParameterRequest, Applied, ExtractMethodPlan, ExtractMethodRequest, InlineMethodPlan,
    InlineMethodRequest, MethodRewrite, MoveMethodPlan, MoveMethodRequest, RefactorError, RefactorSettings,
    RefactoringPlan, RemoveParameterPlan, RemoveParameterRequest, RenameMethodPlan, RenameMethodRequest,
    RenameSelectorPlan, RenameSelectorRequest, apply_add_parameter, apply_extract_method, apply_inline_method,
    apply_move_method, apply_remove_parameter, apply_rename_method, apply_rename_selector, preview_add_parameter,
    preview_extract_method, preview_inline_method, preview_move_method, preview_remove_parameter,
    preview_rename_method, preview_rename_selector,
};
use miette::Result;
use similar::TextDiff;
use tracing::{info, instrument};

use super::analyze::limitations_text;
use super::{load_image, render, save_image};
use crate::config::OutputFormat;

/// Settings shared by every refactoring run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub settings: RefactorSettings,
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ImageArgs {
    /// Image snapshot (JSON) to plan against
    #[arg(long, value_name = "SNAPSHOT")]
    pub image: Utf8PathBuf,

    /// Write the result into the snapshot instead of only previewing it
    #[arg(long)]
    pub apply: bool,
}

#[derive(Debug, Args)]
pub struct ClassArgs {
    /// Class that owns the method
    #[arg(long = "class", value_name = "CLASS")]
    pub class_name: String,

    /// Use the class side instead of the instance side
    #[arg(long)]
    pub class_side: bool,
}

impl ClassArgs {
    fn side(&self) -> Side {
        side(self.class_side)
    }
}

fn side(class_side: bool) -> Side {
    if class_side { Side::Class } else { Side::Instance }
}

#[derive(Debug, Args)]
pub struct RenameSelectorArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    /// Selector to rename
    #[arg(long)]
    pub old: String,
    /// New selector (same kind and arity)
    #[arg(long)]
    pub new: String,
    /// Replace methods that already implement the new selector
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Args)]
pub struct RenameMethodArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    #[command(flatten)]
    pub class: ClassArgs,
    #[arg(long)]
    pub old: String,
    #[arg(long)]
    pub new: String,
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Args)]
pub struct MoveMethodArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    #[command(flatten)]
    pub class: ClassArgs,
    #[arg(long)]
    pub selector: String,
    /// Class to move the method to
    #[arg(long, value_name = "CLASS")]
    pub to_class: String,
    /// Move to the class side of the target
    #[arg(long)]
    pub to_class_side: bool,
    #[arg(long)]
    pub overwrite: bool,
    /// Copy instead of move
    #[arg(long)]
    pub keep_source: bool,
}

#[derive(Debug, Args)]
pub struct AddParameterArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    #[command(flatten)]
    pub class: ClassArgs,
    #[arg(long)]
    pub selector: String,
    /// Keyword to append, e.g. `with:`
    #[arg(long)]
    pub keyword: String,
    /// Name of the new argument
    #[arg(long = "name", value_name = "NAME")]
    pub argument_name: String,
    /// Expression the old selector passes for the new argument
    #[arg(long = "default", value_name = "EXPR")]
    pub default_argument: String,
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Args)]
pub struct RemoveParameterArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    #[command(flatten)]
    pub class: ClassArgs,
    #[arg(long)]
    pub selector: String,
    /// Argument to remove
    #[arg(long = "name", value_name = "NAME")]
    pub argument_name: String,
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Args)]
pub struct ExtractMethodArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    #[command(flatten)]
    pub class: ClassArgs,
    #[arg(long)]
    pub selector: String,
    /// 1-based statement indices, e.g. `2,3`
    #[arg(long, value_delimiter = ',', required = true)]
    pub statements: Vec<u32>,
    /// Unary selector for the extracted method
    #[arg(long = "new", value_name = "SELECTOR")]
    pub new_selector: String,
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Args)]
pub struct InlineMethodArgs {
    #[command(flatten)]
    pub image: ImageArgs,
    #[command(flatten)]
    pub class: ClassArgs,
    /// Method whose `self callee` sends are replaced
    #[arg(long)]
    pub caller: String,
    /// Unary single-expression method to inline
    #[arg(long)]
    pub callee: String,
}

#[derive(Debug, Subcommand)]
pub enum RefactorCommand {
    /// Rename a selector everywhere: implementors and senders
    RenameSelector(RenameSelectorArgs),
    /// Rename one method and the senders on its own class and side
    RenameMethod(RenameMethodArgs),
    /// Move (or copy) a method to another class or side
    MoveMethod(MoveMethodArgs),
    /// Append a keyword argument, keeping the old selector as a forwarder
    AddParameter(AddParameterArgs),
    /// Drop an unused argument, keeping the old selector as a lossy forwarder
    RemoveParameter(RemoveParameterArgs),
    /// Move contiguous statements into a new unary method
    ExtractMethod(ExtractMethodArgs),
    /// Replace `self callee` sends with the callee's expression
    InlineMethod(InlineMethodArgs),
}

impl RefactorCommand {
    /// Runs the command and returns what should be printed.
    pub fn run(&self, ctx: &RunContext) -> Result<String> {
        match self {
            Self::RenameSelector(args) => execute(
                &args.image,
                &RenameSelectorRequest {
                    old_selector: args.old.as_str().into(),
                    new_selector: args.new.as_str().into(),
                    overwrite: args.overwrite,
                },
                ctx,
                preview_rename_selector,
                apply_rename_selector,
            ),
            Self::RenameMethod(args) => execute(
                &args.image,
                &RenameMethodRequest {
                    class_name: args.class.class_name.as_str().into(),
                    side: args.class.side(),
                    old_selector: args.old.as_str().into(),
                    new_selector: args.new.as_str().into(),
                    overwrite: args.overwrite,
                },
                ctx,
                preview_rename_method,
                apply_rename_method,
            ),
            Self::MoveMethod(args) => execute(
                &args.image,
                &MoveMethodRequest {
                    source_class: args.class.class_name.as_str().into(),
                    source_side: args.class.side(),
                    selector: args.selector.as_str().into(),
                    target_class: args.to_class.as_str().into(),
                    target_side: side(args.to_class_side),
                    overwrite: args.overwrite,
                    keep_source: args.keep_source,
                },
                ctx,
                preview_move_method,
                apply_move_method,
            ),
            Self::AddParameter(args) => execute(
                &args.image,
                &AddParameterRequest {
                    class_name: args.class.class_name.as_str().into(),
                    side: args.class.side(),
                    selector: args.selector.as_str().into(),
                    keyword: args.keyword.as_str().into(),
                    argument_name: args.argument_name.as_str().into(),
                    default_argument: args.default_argument.clone(),
                    overwrite: args.overwrite,
                },
                ctx,
                preview_add_parameter,
                apply_add_parameter,
            ),
            Self::RemoveParameter(args) => execute(
                &args.image,
                &RemoveParameterRequest {
                    class_name: args.class.class_name.as_str().into(),
                    side: args.class.side(),
                    selector: args.selector.as_str().into(),
                    argument_name: args.argument_name.as_str().into(),
                    overwrite: args.overwrite,
                },
                ctx,
                preview_remove_parameter,
                apply_remove_parameter,
            ),
            Self::ExtractMethod(args) => execute(
                &args.image,
                &ExtractMethodRequest {
                    class_name: args.class.class_name.as_str().into(),
                    side: args.class.side(),
                    selector: args.selector.as_str().into(),
                    statement_indices: args.statements.clone(),
                    new_selector: args.new_selector.as_str().into(),
                    overwrite: args.overwrite,
                },
                ctx,
                preview_extract_method,
                apply_extract_method,
            ),
            Self::InlineMethod(args) => execute(
                &args.image,
                &InlineMethodRequest {
                    class_name: args.class.class_name.as_str().into(),
                    side: args.class.side(),
                    caller_selector: args.caller.as_str().into(),
                    callee_selector: args.callee.as_str().into(),
                },
                ctx,
                preview_inline_method,
                apply_inline_method,
            ),
        }
    }
}

#[instrument(skip_all, fields(image = %image.image, apply = image.apply))]
fn execute<Req, P>(
    image: &ImageArgs,
    request: &Req,
    ctx: &RunContext,
    preview: fn(&dyn ImageSession, &Req, &RefactorSettings) -> Result<P, RefactorError>,
    apply: fn(&mut dyn ImageSession, &Req, &RefactorSettings) -> Result<Applied<P>, RefactorError>,
) -> Result<String>
where
    P: RefactoringPlan + SourceChanges,
{
    let mut session = load_image(&image.image)?;
    if !image.apply {
        let plan = preview(&session, request, &ctx.settings)?;
        return render(&plan, ctx.format, plan_text::<P>);
    }
    let applied = apply(&mut session, request, &ctx.settings)?;
    save_image(&session, &image.image)?;
    info!(snapshot = %image.image, "Saved image snapshot");
    render(&applied, ctx.format, |applied| {
        let mut out = plan_text(&applied.plan);
        let _ = writeln!(
            out,
            "applied: compiled {}, deleted {}",
            applied.effects.compiled.len(),
            applied.effects.deleted.len()
        );
        out
    })
}

/// One method's before/after text, for diffs.
pub struct SourceChange<'a> {
    pub label: String,
    pub before: &'a str,
    pub after: &'a str,
}

/// The method sources a plan replaces, creates or deletes.
pub trait SourceChanges {
    fn source_changes(&self) -> Vec<SourceChange<'_>>;
}

fn rewrite_change(rewrite: &MethodRewrite) -> SourceChange<'_> {
    SourceChange {
        label: rewrite.method.to_string(),
        before: &rewrite.original_source,
        after: &rewrite.new_source,
    }
}

impl SourceChanges for RenameSelectorPlan {
    fn source_changes(&self) -> Vec<SourceChange<'_>> {
        self.implementors.iter().chain(&self.senders).map(rewrite_change).collect()
    }
}

impl SourceChanges for RenameMethodPlan {
    fn source_changes(&self) -> Vec<SourceChange<'_>> {
        std::iter::once(&self.rewrite)
            .chain(&self.same_scope_senders)
            .map(rewrite_change)
            .collect()
    }
}

impl SourceChanges for MoveMethodPlan {
    fn source_changes(&self) -> Vec<SourceChange<'_>> {
        let mut changes = vec![SourceChange {
            label: self.target.to_string(),
            before: "",
            after: &self.source_text,
        }];
        if !self.keep_source {
            changes.push(SourceChange {
                label: self.source.to_string(),
                before: &self.source_text,
                after: "",
            });
        }
        changes
    }
}

impl SourceChanges for AddParameterPlan {
    fn source_changes(&self) -> Vec<SourceChange<'_>> {
        forwarder_changes(
            &self.method.to_string(),
            &self.new_method.to_string(),
            &self.original_source,
            &self.new_source,
            &self.compatibility_source,
        )
    }
}

impl SourceChanges for RemoveParameterPlan {
    fn source_changes(&self) -> Vec<SourceChange<'_>> {
        forwarder_changes(
            &self.method.to_string(),
            &self.new_method.to_string(),
            &self.original_source,
            &self.new_source,
            &self.compatibility_source,
        )
    }
}

fn forwarder_changes<'a>(
    method: &str,
    new_method: &str,
    original: &'a str,
    new_source: &'a str,
    forwarder: &'a str,
) -> Vec<SourceChange<'a>> {
    vec![
        SourceChange {
            label: new_method.to_string(),
            before: "",
            after: new_source,
        },
        SourceChange {
            label: method.to_string(),
            before: original,
            after: forwarder,
        },
    ]
}

impl SourceChanges for ExtractMethodPlan {
    fn source_changes(&self) -> Vec<SourceChange<'_>> {
        vec![
            SourceChange {
                label: self.new_method.to_string(),
                before: "",
                after: &self.new_method_source,
            },
            SourceChange {
                label: self.method.to_string(),
                before: &self.original_source,
                after: &self.rewritten_source,
            },
        ]
    }
}

impl SourceChanges for InlineMethodPlan {
    fn source_changes(&self) -> Vec<SourceChange<'_>> {
        vec![SourceChange {
            label: self.caller.to_string(),
            before: &self.original_caller_source,
            after: &self.new_caller_source,
        }]
    }
}

/// Unified diffs of every change, then warnings and limitations.
fn plan_text<P: RefactoringPlan + SourceChanges>(plan: &P) -> String {
    let mut out = String::new();
    for change in plan.source_changes() {
        out.push_str(&unified_diff(&change));
    }
    if !plan.warnings().is_empty() {
        out.push_str("warnings:\n");
        for warning in plan.warnings() {
            let _ = writeln!(out, "  - {warning}");
        }
    }
    out.push_str(&limitations_text(&gemtalk_core::send_detection::analysis_limitations()));
    out
}

fn unified_diff(change: &SourceChange<'_>) -> String {
    let diff = TextDiff::from_lines(change.before, change.after);
    let mut unified = diff.unified_diff();
    unified
        .missing_newline_hint(false)
        .header(&format!("a/{}", change.label), &format!("b/{}", change.label));
    unified.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use gemtalk_core::image::{MemoryImage, MethodRef};

    fn snapshot(dir: &tempfile::TempDir) -> Utf8PathBuf {
        let mut image = MemoryImage::new();
        image.define_class("Object", None, "Kernel");
        image.define_class("Counter", Some("Object"), "Demo");
        for source in [
            "count\n    ^count",
            "increment\n    count := self count + 1",
            "report\n    ^self count printString",
        ] {
            image
                .compile_method("Counter", Side::Instance, source, "accessing")
                .unwrap();
        }
        let path = Utf8PathBuf::from_path_buf(dir.path().join("image.json")).expect("utf8 path");
        save_image(&image, &path).unwrap();
        path
    }

    fn rename_count(path: &Utf8Path, apply: bool) -> RefactorCommand {
        RefactorCommand::RenameMethod(RenameMethodArgs {
            image: ImageArgs {
                image: path.to_path_buf(),
                apply,
            },
            class: ClassArgs {
                class_name: "Counter".to_string(),
                class_side: false,
            },
            old: "count".to_string(),
            new: "tally".to_string(),
            overwrite: false,
        })
    }

    fn ctx(format: OutputFormat) -> RunContext {
        RunContext {
            settings: RefactorSettings::default(),
            format,
        }
    }

    #[test]
    fn preview_leaves_the_snapshot_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot(&dir);
        let before = std::fs::read_to_string(&path).unwrap();

        let out = rename_count(&path, false).run(&ctx(OutputFormat::Json)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["new_method"]["selector"], "tally");
        assert_eq!(json["same_scope_senders"].as_array().unwrap().len(), 2);
        assert!(json.get("applied").is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn apply_writes_the_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot(&dir);

        let out = rename_count(&path, true).run(&ctx(OutputFormat::Json)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["applied"], true);

        let image = load_image(&path).unwrap();
        let report = MethodRef::new("Counter", Side::Instance, "report");
        assert_eq!(
            image.get_method_source(&report).unwrap(),
            "report\n    ^self tally printString"
        );
        assert!(!image.implements("Counter", Side::Instance, "count").unwrap());
    }

    #[test]
    fn text_preview_shows_diffs() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot(&dir);

        let out = rename_count(&path, false).run(&ctx(OutputFormat::Text)).unwrap();
        assert!(out.contains("--- a/Counter>>count"));
        assert!(out.contains("+report\n") || out.contains("+    ^self tally printString"));
        assert!(out.contains("limitations:"));
    }

    #[test]
    fn precondition_failures_surface_as_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot(&dir);
        let command = RefactorCommand::ExtractMethod(ExtractMethodArgs {
            image: ImageArgs {
                image: path.clone(),
                apply: true,
            },
            class: ClassArgs {
                class_name: "Counter".to_string(),
                class_side: false,
            },
            selector: "increment".to_string(),
            statements: vec![2],
            new_selector: "bump".to_string(),
            overwrite: false,
        });
        let err = command.run(&ctx(OutputFormat::Json)).unwrap_err();
        assert!(err.to_string().contains("statement 2 does not exist"));
    }
}
