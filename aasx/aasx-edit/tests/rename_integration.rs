//! Integration tests for identifier renames
//!
//! These tests verify:
//! - Renaming shells and submodels on a realistic document
//! - Reference rewriting leaves no dangling ids
//! - Renames are reversible

mod common;

use aasx_core::model::{AssetAdministrationShell, IdentifiableHandle, IdentifiableKind, Submodel};
use aasx_edit::rename::{rename_by_kind, rename_identifiable, rename_referable};
use common::pump_environment;
use proptest::prelude::*;

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_rename_shell_nothing_references_it() {
    let mut env = pump_environment();
    let outcome = rename_identifiable::<AssetAdministrationShell>(&mut env, "aas-1", "aas-2").unwrap();

    assert_eq!(outcome.renamed, Some(IdentifiableHandle::shell("aas-2")));
    assert!(outcome.affected.is_empty());
    assert_eq!(outcome.rewritten_references, 0);
    assert_eq!(env.ids(IdentifiableKind::Shell), vec!["aas-2"]);
}

#[test]
fn test_rename_submodel_updates_owning_shell() {
    let mut env = pump_environment();
    let outcome = rename_identifiable::<Submodel>(&mut env, "sm-42", "sm-99").unwrap();

    assert_eq!(outcome.affected, vec![IdentifiableHandle::shell("aas-1")]);
    assert_eq!(outcome.rewritten_references, 1);

    let shell = env.shells().find_by_id("aas-1").unwrap();
    assert_eq!(shell.submodel_ids(), vec!["sm-99", "sm-docs"]);
    assert!(env.references_to(IdentifiableKind::Submodel, "sm-42").is_empty());
    assert!(env.check_consistency().is_consistent());
}

#[test]
fn test_rename_concept_description_rewrites_semantic_ids() {
    let mut env = pump_environment();
    let outcome =
        rename_by_kind(&mut env, IdentifiableKind::ConceptDescription, "cd-pressure", "cd-pressure-v2")
            .unwrap();

    assert_eq!(outcome.rewritten_references, 2);
    assert_eq!(
        outcome.affected,
        vec![IdentifiableHandle::submodel("sm-42"), IdentifiableHandle::submodel("sm-docs")]
    );
    assert!(env.check_consistency().is_consistent());
}

#[test]
fn test_rename_element_keeps_reference_resolvable() {
    let mut env = pump_environment();
    let outcome = rename_referable(&mut env, "sm-docs", &["OperatingManual"], "Manual").unwrap();

    assert_eq!(outcome.affected, vec![IdentifiableHandle::submodel("sm-42")]);
    assert!(env.check_consistency().is_consistent());
}

#[test]
fn test_rename_to_taken_id_changes_nothing() {
    let mut env = pump_environment();
    let before = env.clone();
    let err = rename_identifiable::<Submodel>(&mut env, "sm-42", "sm-docs").unwrap_err();
    assert!(err.is_duplicate_id());
    assert_eq!(env, before);
}

// ============================================================================
// Properties
// ============================================================================

fn fresh_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9:/._-]{0,24}".prop_filter("must not collide with fixture ids", |id| {
        !["sm-42", "sm-docs"].contains(&id.as_str())
    })
}

proptest! {
    #[test]
    fn prop_rename_round_trip_restores_environment(new_id in fresh_id()) {
        let original = pump_environment();
        let mut env = original.clone();

        rename_identifiable::<Submodel>(&mut env, "sm-42", &new_id).unwrap();
        rename_identifiable::<Submodel>(&mut env, &new_id, "sm-42").unwrap();

        prop_assert_eq!(env, original);
    }

    #[test]
    fn prop_no_reference_to_old_id_survives(new_id in fresh_id()) {
        let mut env = pump_environment();
        rename_identifiable::<Submodel>(&mut env, "sm-docs", &new_id).unwrap();

        prop_assert!(env.references_to(IdentifiableKind::Submodel, "sm-docs").is_empty());
        prop_assert_eq!(env.references_to(IdentifiableKind::Submodel, &new_id).len(), 2);
        prop_assert!(env.check_consistency().is_consistent());
    }
}
