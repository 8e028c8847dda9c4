// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Refactoring planners driven end to end against an in-memory image.
//!
//! Every test builds the same small banking image, previews or applies one
//! refactoring, and checks both the plan payload and the resulting image.

use gemtalk_core::image::{ImageSession, MemoryImage, MethodRef, OccurrenceKind, SessionError, Side};
use gemtalk_core::refactor::{
    AddParameterRequest, ExtractMethodRequest, InlineMethodRequest, MoveMethodRequest, PreconditionError,
    RefactorError, RefactorSettings, RemoveParameterRequest, RenameMethodRequest, RenameSelectorRequest,
    apply_add_parameter, apply_extract_method, apply_inline_method, apply_move_method, apply_remove_parameter,
    apply_rename_method, apply_rename_selector, preview_add_parameter, preview_extract_method,
    preview_inline_method, preview_move_method, preview_remove_parameter, preview_rename_method,
    preview_rename_selector,
};

const ACCOUNT_METHODS: &[(&str, &str)] = &[
    ("balance\n    ^balance", "accessing"),
    ("deposit: amount\n    balance := balance + amount", "operations"),
    ("report\n    ^self balance printString", "printing"),
    ("exampleMethod\n    self yourself.\n    self class.\n    ^7", "examples"),
    ("scenarioD\n    self a.\n    self b.\n    ^self c.\n    self d", "examples"),
    ("oldSelector: a with: b\n    ^a + b", "operations"),
    ("otherSelector: a with: b\n    ^a - b", "operations"),
    ("caller\n    self oldSelector: 1 with: 2.\n    self otherSelector: 3 with: 4", "operations"),
    ("log: aMessage level: aLevel\n    ^aMessage", "logging"),
    ("fee\n    ^balance * 2", "fees"),
    ("charge\n    balance := balance - self fee.\n    ^self fee", "fees"),
    ("scratch\n    | t |\n    t := 1.\n    ^t", "private"),
];

fn image() -> MemoryImage {
    let mut image = MemoryImage::new();
    image.define_class("Object", None, "Kernel");
    image.define_class("Account", Some("Object"), "Banking");
    image.define_class("Savings", Some("Account"), "Banking");
    image.define_class("Ledger", Some("Object"), "Banking");
    for (source, category) in ACCOUNT_METHODS {
        image
            .compile_method("Account", Side::Instance, source, category)
            .unwrap();
    }
    image
        .compile_method("Savings", Side::Instance, "interest\n    ^self balance * 0.05", "interest")
        .unwrap();
    image
        .compile_method("Ledger", Side::Instance, "post: anAccount\n    ^anAccount balance", "posting")
        .unwrap();
    image
}

fn account(selector: &str) -> MethodRef {
    MethodRef::new("Account", Side::Instance, selector)
}

fn source(image: &MemoryImage, class_name: &str, selector: &str) -> String {
    image
        .get_method_source(&MethodRef::new(class_name, Side::Instance, selector))
        .unwrap()
}

fn has_method(image: &MemoryImage, class_name: &str, selector: &str) -> bool {
    image.implements(class_name, Side::Instance, selector).unwrap()
}

fn settings() -> RefactorSettings {
    RefactorSettings::default()
}

// ────────────────────────────────────────────────────────────────
// Selector rename
// ────────────────────────────────────────────────────────────────

fn rename_selector_request() -> RenameSelectorRequest {
    RenameSelectorRequest {
        old_selector: "oldSelector:with:".into(),
        new_selector: "newSelector:and:".into(),
        overwrite: false,
    }
}

#[test]
fn rename_selector_rewrites_matching_keyword_sends_only() {
    let image = image();
    let plan = preview_rename_selector(&image, &rename_selector_request(), &settings()).unwrap();

    assert_eq!(plan.implementors.len(), 1);
    assert_eq!(plan.implementors[0].new_source, "newSelector: a and: b\n    ^a + b");
    assert_eq!(plan.senders.len(), 1);
    assert_eq!(
        plan.senders[0].new_source,
        "caller\n    self newSelector: 1 and: 2.\n    self otherSelector: 3 with: 4"
    );
    assert_eq!(plan.sender_impact.count, 1);
    assert!(!plan.new_selector_conflict);
    assert!(plan.warnings.iter().any(|w| w.contains("Account>>caller")));
}

#[test]
fn rename_selector_apply_replaces_implementor_and_sender() {
    let mut image = image();
    let applied = apply_rename_selector(&mut image, &rename_selector_request(), &settings()).unwrap();

    assert!(applied.applied);
    assert_eq!(applied.effects.old_selector_removed, Some(true));
    assert_eq!(
        applied.effects.compiled,
        vec![account("newSelector:and:"), account("caller")]
    );
    assert_eq!(applied.effects.deleted, vec![account("oldSelector:with:")]);
    assert!(!has_method(&image, "Account", "oldSelector:with:"));
    assert_eq!(
        image.get_method_category(&account("newSelector:and:")).unwrap(),
        "operations"
    );
    assert!(source(&image, "Account", "caller").contains("self newSelector: 1 and: 2"));
}

#[test]
fn rename_selector_reaches_senders_passing_literal_arrays() {
    let mut image = image();
    image.define_class("AccountTest", Some("Object"), "Banking-Tests");
    image
        .compile_method(
            "AccountTest",
            Side::Instance,
            "testTotals\n    self oldSelector: #(1 2) with: [ | t | t := 3 ]",
            "tests",
        )
        .unwrap();
    let test_method = MethodRef::new("AccountTest", Side::Instance, "testTotals");
    assert!(
        image
            .selector_occurrences("oldSelector:with:", OccurrenceKind::Senders)
            .unwrap()
            .contains(&test_method)
    );

    let plan = preview_rename_selector(&image, &rename_selector_request(), &settings()).unwrap();
    let rewrite = plan
        .senders
        .iter()
        .find(|sender| sender.method == test_method)
        .expect("test method is a sender");
    assert_eq!(
        rewrite.new_source,
        "testTotals\n    self newSelector: #(1 2) and: [ | t | t := 3 ]"
    );
}

#[test]
fn rename_selector_apply_stops_at_a_read_only_sender() {
    let mut image = image();
    image.define_class("Frozen", Some("Object"), "Legacy");
    image
        .compile_method("Frozen", Side::Instance, "useIt\n    ^self oldSelector: 1 with: 2", "legacy")
        .unwrap();
    image.define_class("Frozen", Some("Object"), "Legacy").read_only = true;

    let result = apply_rename_selector(&mut image, &rename_selector_request(), &settings());
    let Err(RefactorError::Session(SessionError::Operation(message))) = result else {
        panic!("expected the image's operation error");
    };
    assert!(message.contains("Frozen"), "{message}");

    // Writes before the failure stay; nothing after it happens.
    assert!(has_method(&image, "Account", "newSelector:and:"));
    assert!(source(&image, "Account", "caller").contains("self newSelector: 1 and: 2"));
    assert!(has_method(&image, "Account", "oldSelector:with:"));
    assert_eq!(
        source(&image, "Frozen", "useIt"),
        "useIt\n    ^self oldSelector: 1 with: 2"
    );
}

#[test]
fn rename_selector_refuses_shape_changes_and_existing_targets() {
    let image = image();
    let mut request = rename_selector_request();
    request.new_selector = "newSelector:".into();
    assert!(matches!(
        preview_rename_selector(&image, &request, &settings()),
        Err(RefactorError::Precondition(PreconditionError::ArityMismatch { .. }))
    ));

    request.new_selector = "otherSelector:with:".into();
    assert!(matches!(
        preview_rename_selector(&image, &request, &settings()),
        Err(RefactorError::Precondition(PreconditionError::TargetSelectorExists(_)))
    ));

    request.overwrite = true;
    let plan = preview_rename_selector(&image, &request, &settings()).unwrap();
    assert_eq!(plan.implementors.len(), 1);
}

// ────────────────────────────────────────────────────────────────
// Method rename
// ────────────────────────────────────────────────────────────────

fn rename_balance() -> RenameMethodRequest {
    RenameMethodRequest {
        class_name: "Account".into(),
        side: Side::Instance,
        old_selector: "balance".into(),
        new_selector: "currentBalance".into(),
        overwrite: false,
    }
}

#[test]
fn rename_method_rewrites_same_scope_senders_and_reports_the_rest() {
    let image = image();
    let plan = preview_rename_method(&image, &rename_balance(), &settings()).unwrap();

    assert_eq!(plan.rewrite.new_source, "currentBalance\n    ^balance");
    assert_eq!(plan.same_scope_senders.len(), 1);
    assert_eq!(plan.same_scope_senders[0].method, account("report"));
    assert_eq!(
        plan.same_scope_senders[0].new_source,
        "report\n    ^self currentBalance printString"
    );
    assert_eq!(plan.other_senders.count, 2);
    assert!(plan.other_senders.examples.contains(&"Savings>>interest".to_string()));
    assert!(plan.warnings.iter().any(|w| w.contains("outside Account")));
}

#[test]
fn rename_method_apply_deletes_the_old_method() {
    let mut image = image();
    let applied = apply_rename_method(&mut image, &rename_balance(), &settings()).unwrap();

    assert_eq!(applied.effects.deleted, vec![account("balance")]);
    assert_eq!(applied.effects.old_selector_removed, Some(true));
    assert!(has_method(&image, "Account", "currentBalance"));
    assert!(!has_method(&image, "Account", "balance"));
    assert_eq!(
        source(&image, "Savings", "interest"),
        "interest\n    ^self balance * 0.05"
    );
}

// ────────────────────────────────────────────────────────────────
// Move
// ────────────────────────────────────────────────────────────────

#[test]
fn move_to_unrelated_class_warns_about_self_sends() {
    let mut image = image();
    let request = MoveMethodRequest {
        source_class: "Account".into(),
        source_side: Side::Instance,
        selector: "report".into(),
        target_class: "Ledger".into(),
        target_side: Side::Instance,
        overwrite: false,
        keep_source: false,
    };
    let plan = preview_move_method(&image, &request, &settings()).unwrap();
    assert!(!plan.target_exists);
    assert_eq!(plan.category, "printing");
    assert!(
        plan.warnings
            .iter()
            .any(|w| w.contains("Ledger does not inherit from Account") && w.contains("balance"))
    );

    let applied = apply_move_method(&mut image, &request, &settings()).unwrap();
    assert_eq!(applied.effects.source_deleted, Some(true));
    assert!(has_method(&image, "Ledger", "report"));
    assert!(!has_method(&image, "Account", "report"));
}

#[test]
fn copy_to_subclass_keeps_the_source() {
    let mut image = image();
    let request = MoveMethodRequest {
        source_class: "Account".into(),
        source_side: Side::Instance,
        selector: "fee".into(),
        target_class: "Savings".into(),
        target_side: Side::Instance,
        overwrite: false,
        keep_source: true,
    };
    let applied = apply_move_method(&mut image, &request, &settings()).unwrap();

    assert_eq!(applied.effects.source_deleted, Some(false));
    assert!(applied.effects.deleted.is_empty());
    assert_eq!(applied.plan.same_scope_senders.count, 1);
    assert!(applied.plan.warnings.iter().any(|w| w.contains("still reach the original")));
    assert!(!applied.plan.warnings.iter().any(|w| w.contains("does not inherit")));
    assert!(has_method(&image, "Account", "fee"));
    assert!(has_method(&image, "Savings", "fee"));
}

#[test]
fn move_onto_itself_is_rejected() {
    let image = image();
    let request = MoveMethodRequest {
        source_class: "Account".into(),
        source_side: Side::Instance,
        selector: "fee".into(),
        target_class: "Account".into(),
        target_side: Side::Instance,
        overwrite: true,
        keep_source: false,
    };
    assert!(matches!(
        preview_move_method(&image, &request, &settings()),
        Err(RefactorError::Precondition(PreconditionError::IdenticalMoveTarget(_)))
    ));
}

// ────────────────────────────────────────────────────────────────
// Parameters
// ────────────────────────────────────────────────────────────────

#[test]
fn add_parameter_keeps_a_forwarder() {
    let mut image = image();
    let request = AddParameterRequest {
        class_name: "Account".into(),
        side: Side::Instance,
        selector: "deposit:".into(),
        keyword: "note:".into(),
        argument_name: "aNote".into(),
        default_argument: "'none'".into(),
        overwrite: false,
    };
    let plan = preview_add_parameter(&image, &request, &settings()).unwrap();
    assert_eq!(plan.new_method, account("deposit:note:"));
    assert_eq!(
        plan.new_source,
        "deposit: amount note: aNote\n    balance := balance + amount"
    );
    assert_eq!(
        plan.compatibility_source,
        "deposit: amount\n    ^self deposit: amount note: 'none'"
    );

    let applied = apply_add_parameter(&mut image, &request, &settings()).unwrap();
    assert_eq!(applied.effects.compatibility_method_compiled, Some(true));
    assert_eq!(
        applied.effects.compiled,
        vec![account("deposit:note:"), account("deposit:")]
    );
    assert_eq!(
        source(&image, "Account", "deposit:"),
        "deposit: amount\n    ^self deposit: amount note: 'none'"
    );
}

#[test]
fn add_parameter_rejects_clashing_names() {
    let image = image();
    let request = AddParameterRequest {
        class_name: "Account".into(),
        side: Side::Instance,
        selector: "deposit:".into(),
        keyword: "note:".into(),
        argument_name: "amount".into(),
        default_argument: "nil".into(),
        overwrite: false,
    };
    assert!(matches!(
        preview_add_parameter(&image, &request, &settings()),
        Err(RefactorError::Precondition(PreconditionError::ArgumentNameClash { .. }))
    ));
}

#[test]
fn remove_parameter_is_flagged_lossy() {
    let mut image = image();
    let request = RemoveParameterRequest {
        class_name: "Account".into(),
        side: Side::Instance,
        selector: "log:level:".into(),
        argument_name: "aLevel".into(),
        overwrite: false,
    };
    let plan = preview_remove_parameter(&image, &request, &settings()).unwrap();
    assert_eq!(plan.new_source, "log: aMessage\n    ^aMessage");
    assert_eq!(
        plan.compatibility_source,
        "log: aMessage level: aLevel\n    ^self log: aMessage"
    );
    assert!(plan.warnings[0].starts_with("LOSSY"));

    let applied = apply_remove_parameter(&mut image, &request, &settings()).unwrap();
    assert!(applied.plan.warnings[0].starts_with("LOSSY"));
    assert!(has_method(&image, "Account", "log:"));
    assert!(has_method(&image, "Account", "log:level:"));
}

#[test]
fn remove_parameter_refuses_used_arguments() {
    let image = image();
    let request = RemoveParameterRequest {
        class_name: "Account".into(),
        side: Side::Instance,
        selector: "log:level:".into(),
        argument_name: "aMessage".into(),
        overwrite: false,
    };
    assert!(matches!(
        preview_remove_parameter(&image, &request, &settings()),
        Err(RefactorError::Precondition(PreconditionError::ArgumentStillReferenced { .. }))
    ));
}

// ────────────────────────────────────────────────────────────────
// Extract
// ────────────────────────────────────────────────────────────────

fn extract(selector: &str, statement_indices: Vec<u32>, new_selector: &str) -> ExtractMethodRequest {
    ExtractMethodRequest {
        class_name: "Account".into(),
        side: Side::Instance,
        selector: selector.into(),
        statement_indices,
        new_selector: new_selector.into(),
        overwrite: false,
    }
}

#[test]
fn extract_first_statement() {
    let mut image = image();
    let request = extract("exampleMethod", vec![1], "extractedFirstStep");
    let plan = preview_extract_method(&image, &request, &settings()).unwrap();
    assert_eq!(plan.new_method_source, "extractedFirstStep\n    self yourself");
    assert!(plan.rewritten_source.starts_with("exampleMethod\n    self extractedFirstStep."));
    assert_eq!(
        plan.rewritten_source,
        "exampleMethod\n    self extractedFirstStep.\n    self class.\n    ^7"
    );
    assert!(plan.referenced_locals.is_empty());

    let applied = apply_extract_method(&mut image, &request, &settings()).unwrap();
    assert_eq!(
        applied.effects.compiled,
        vec![account("extractedFirstStep"), account("exampleMethod")]
    );
    assert_eq!(
        image.get_method_category(&account("extractedFirstStep")).unwrap(),
        "examples"
    );
}

#[test]
fn extract_rejects_a_selection_containing_a_return() {
    let image = image();
    let result = preview_extract_method(&image, &extract("scenarioD", vec![2, 3, 4], "middle"), &settings());
    assert_eq!(
        result,
        Err(RefactorError::Precondition(PreconditionError::ReturnInSelection(3)))
    );
}

#[test]
fn extract_selection_errors() {
    let image = image();
    let preview = |request| preview_extract_method(&image, &request, &settings());
    assert!(matches!(
        preview(extract("scenarioD", vec![1, 4], "ends")),
        Err(RefactorError::Precondition(PreconditionError::NonContiguousSelection { first: 1, last: 4 }))
    ));
    assert!(matches!(
        preview(extract("scenarioD", vec![], "nothing")),
        Err(RefactorError::Precondition(PreconditionError::EmptySelection))
    ));
    assert!(matches!(
        preview(extract("scenarioD", vec![1], "with:")),
        Err(RefactorError::Precondition(PreconditionError::InvalidSelector { .. }))
    ));
    assert!(matches!(
        preview(extract("scenarioD", vec![1], "balance")),
        Err(RefactorError::Precondition(PreconditionError::TargetSelectorExists(_)))
    ));
}

// ────────────────────────────────────────────────────────────────
// Inline
// ────────────────────────────────────────────────────────────────

fn inline(caller: &str, callee: &str) -> InlineMethodRequest {
    InlineMethodRequest {
        class_name: "Account".into(),
        side: Side::Instance,
        caller_selector: caller.into(),
        callee_selector: callee.into(),
    }
}

#[test]
fn inline_replaces_every_self_send() {
    let mut image = image();
    let plan = preview_inline_method(&image, &inline("charge", "fee"), &settings()).unwrap();
    assert_eq!(plan.inline_expression, "balance * 2");
    assert_eq!(plan.replaced_sites, 2);
    assert_eq!(plan.caller_send_count, 2);
    assert_eq!(
        plan.new_caller_source,
        "charge\n    balance := balance - (balance * 2).\n    ^(balance * 2)"
    );
    assert!(plan.warnings.is_empty());

    let applied = apply_inline_method(&mut image, &inline("charge", "fee"), &settings()).unwrap();
    assert_eq!(applied.effects.compiled, vec![account("charge")]);
    assert!(has_method(&image, "Account", "fee"));
}

#[test]
fn inline_refuses_callee_with_temporaries_before_touching_the_caller() {
    let image = image();
    let before = source(&image, "Account", "report");
    assert_eq!(
        preview_inline_method(&image, &inline("report", "scratch"), &settings()),
        Err(RefactorError::Precondition(
            PreconditionError::InlineTargetHasTemporaries(account("scratch"))
        ))
    );
    assert_eq!(source(&image, "Account", "report"), before);
}

#[test]
fn inline_needs_a_site() {
    let image = image();
    assert!(matches!(
        preview_inline_method(&image, &inline("deposit:", "balance"), &settings()),
        Err(RefactorError::Precondition(PreconditionError::NoInlineSites { .. }))
    ));
}

// ────────────────────────────────────────────────────────────────
// Payloads
// ────────────────────────────────────────────────────────────────

#[test]
fn applied_payload_flattens_plan_and_effects() {
    let mut image = image();
    let applied = apply_rename_method(&mut image, &rename_balance(), &settings()).unwrap();
    let json = serde_json::to_value(&applied).unwrap();
    assert_eq!(json["applied"], true);
    assert_eq!(json["old_selector_removed"], true);
    assert!(json["warnings"].is_array());
    assert_eq!(json["analysis_limitations"].as_array().unwrap().len(), 2);
    assert!(json.get("source_deleted").is_none());
}

#[test]
fn sender_examples_respect_the_configured_limit() {
    let image = image();
    let settings = RefactorSettings {
        sender_example_limit: 1,
        ..RefactorSettings::default()
    };
    let plan = preview_rename_method(&image, &rename_balance(), &settings).unwrap();
    assert_eq!(plan.other_senders.count, 2);
    assert_eq!(plan.other_senders.examples.len(), 1);
    assert!(plan.other_senders.describe().ends_with("and 1 more"));
}
