//! Integration tests for editing sessions
//!
//! These tests verify:
//! - Every mutation is announced on the change channel
//! - Cut and paste moves content, copy and paste duplicates it
//! - Clones between sessions bring their supplementary files along

mod common;

use aasx_core::config::EditorConfig;
use aasx_core::error::AasxError;
use aasx_core::model::{IdentifiableHandle, IdentifiableKind, Submodel};
use aasx_core::{ChangeEvent, ChangeKind, Environment};
use aasx_edit::clone::CloneOptions;
use aasx_edit::package::{MemoryPackageStore, PackagePath, SupplementaryFileStore};
use aasx_edit::session::EditSession;
use common::{mirrored_pump_environment, pump_environment, submodel};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

fn pump_session() -> EditSession {
    EditSession::new(pump_environment(), EditorConfig::default())
}

fn drain(events: &mut broadcast::Receiver<ChangeEvent>) -> Vec<(ChangeKind, IdentifiableHandle, Vec<String>)> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push((event.kind, event.target.owner, event.target.path));
    }
    seen
}

fn keep_ids() -> CloneOptions {
    CloneOptions {
        generate_new_ids: false,
        ..CloneOptions::default()
    }
}

// ============================================================================
// Notifications
// ============================================================================

#[tokio::test]
async fn test_add_and_reorder_are_announced() {
    let mut session = pump_session();
    let mut events = session.subscribe();

    let handle = session.add(Submodel::new("sm-new", "New")).unwrap();
    session.move_up(&handle).unwrap();

    assert_eq!(
        drain(&mut events),
        vec![
            (ChangeKind::Create, submodel("sm-new"), vec![]),
            (ChangeKind::StructChange, submodel("sm-new"), vec![]),
        ]
    );
    assert_eq!(session.notifier().sent_count(), 2);
    assert!(session.add(Submodel::new("sm-new", "Again")).unwrap_err().is_duplicate_id());
}

#[tokio::test]
async fn test_rename_announces_renamed_and_affected() {
    let mut session = pump_session();
    let mut events = session.subscribe();

    let result = session
        .rename(IdentifiableKind::Submodel, "sm-42", "sm-99", &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.local.renamed.is_some());
    assert_eq!(
        drain(&mut events),
        vec![
            (ChangeKind::StructChange, submodel("sm-99"), vec![]),
            (ChangeKind::StructChange, IdentifiableHandle::shell("aas-1"), vec![]),
        ]
    );
}

#[tokio::test]
async fn test_noop_rename_is_silent() {
    let mut session = pump_session();
    let mut events = session.subscribe();
    session
        .rename(IdentifiableKind::Shell, "aas-1", "aas-1", &CancellationToken::new())
        .await
        .unwrap();
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_delete_shell_with_submodels_announces_each_delete() {
    let mut session = pump_session();
    let mut events = session.subscribe();

    let results = session
        .delete_shell_with_submodels("aas-1", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    let kinds: Vec<_> = drain(&mut events).into_iter().map(|(kind, _, _)| kind).collect();
    assert_eq!(kinds, vec![ChangeKind::Delete; 3]);
    assert_eq!(session.environment().count(IdentifiableKind::Submodel), 0);
    assert_eq!(session.environment().count(IdentifiableKind::ConceptDescription), 2);
}

// ============================================================================
// Clipboard
// ============================================================================

#[tokio::test]
async fn test_cut_and_paste_element_moves_it() {
    let mut session = pump_session();
    let mut events = session.subscribe();

    session.cut_element("sm-42", &["MaxPressure"]).unwrap();
    let paste = session.paste_element("sm-docs", &[] as &[&str]).unwrap();

    assert_eq!(paste.path, vec!["MaxPressure"]);
    assert!(paste.removed_origin.is_some());
    assert!(session.clipboard().is_empty());
    let env = session.environment();
    assert!(env.submodels().find_by_id("sm-42").unwrap().element_by_path(&["MaxPressure"]).is_none());
    assert!(env.submodels().find_by_id("sm-docs").unwrap().element_by_path(&["MaxPressure"]).is_some());
    assert_eq!(
        drain(&mut events),
        vec![
            (ChangeKind::Delete, submodel("sm-42"), vec!["MaxPressure".to_string()]),
            (ChangeKind::Create, submodel("sm-docs"), vec!["MaxPressure".to_string()]),
        ]
    );
}

#[tokio::test]
async fn test_copy_and_paste_element_gets_unique_id_short() {
    let mut session = pump_session();
    session.copy_element("sm-docs", &["RatedPressure"]).unwrap();

    let first = session.paste_element("sm-docs", &[] as &[&str]).unwrap();
    let second = session.paste_element("sm-docs", &[] as &[&str]).unwrap();

    assert_eq!(first.path, vec!["RatedPressure1"]);
    assert_eq!(second.path, vec!["RatedPressure2"]);
    assert!(!session.clipboard().is_empty());
}

#[tokio::test]
async fn test_paste_copied_shell_with_kept_ids_fails_cleanly() {
    let mut session = pump_session();
    session.copy(&IdentifiableHandle::shell("aas-1")).unwrap();
    let before = session.environment().clone();

    let err = session.paste(keep_ids()).unwrap_err();

    assert!(err.is_duplicate_id());
    assert_eq!(session.environment(), &before);
    assert!(session.clipboard().holds_identifiable());
}

#[tokio::test]
async fn test_cut_and_paste_submodel_with_kept_ids_is_a_move() {
    let mut session = pump_session();
    session.cut(&submodel("sm-42")).unwrap();

    let paste = session.paste(keep_ids()).unwrap();

    assert_eq!(paste.removed_origin, Some(submodel("sm-42")));
    assert_eq!(paste.report.root, submodel("sm-42"));
    assert_eq!(session.environment().count(IdentifiableKind::Submodel), 2);
    assert!(session.check_consistency().is_consistent());
}

#[tokio::test]
async fn test_cut_and_paste_submodel_keeps_references_valid() {
    let mut session = EditSession::new(mirrored_pump_environment(), EditorConfig::default());
    session.cut(&submodel("sm-42")).unwrap();

    let paste = session.paste(session.clone_options()).unwrap();

    assert_eq!(paste.removed_origin, Some(submodel("sm-42")));
    assert_eq!(paste.report.root, submodel("sm-42"));
    let env = session.environment();
    assert_eq!(env.count(IdentifiableKind::Submodel), 2);
    assert!(env.submodels().side_info("sm-42").unwrap().is_remote_mirrored());
    assert!(session.check_consistency().is_consistent());
}

#[tokio::test]
async fn test_cut_follows_rename_before_paste() {
    let mut session = pump_session();
    session.cut(&submodel("sm-42")).unwrap();
    session
        .rename(IdentifiableKind::Submodel, "sm-42", "sm-77", &CancellationToken::new())
        .await
        .unwrap();

    let paste = session.paste(session.clone_options()).unwrap();

    assert_eq!(paste.removed_origin, Some(submodel("sm-77")));
    let env = session.environment();
    assert!(!env.contains(IdentifiableKind::Submodel, "sm-42"));
    assert!(env.contains(IdentifiableKind::Submodel, "sm-77"));
    assert_eq!(env.count(IdentifiableKind::Submodel), 2);
    assert!(session.check_consistency().is_consistent());
}

#[tokio::test]
async fn test_paste_of_cut_fails_when_origin_is_gone() {
    let mut session = pump_session();
    session.cut(&submodel("sm-42")).unwrap();
    session
        .delete(&submodel("sm-42"), true, &CancellationToken::new())
        .await
        .unwrap();
    let before = session.environment().clone();

    let err = session.paste(session.clone_options()).unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(session.environment(), &before);
    assert!(session.clipboard().is_cut());
}

// ============================================================================
// Clone between sessions
// ============================================================================

#[tokio::test]
async fn test_clone_from_copies_package_files() {
    let manual = PackagePath::parse("/aasx/docs/manual.pdf").unwrap();
    let source_package = MemoryPackageStore::new();
    source_package.insert(manual.clone(), b"%PDF-1.7".to_vec());
    let dest_package = Arc::new(MemoryPackageStore::new());

    let mut session = EditSession::new(Environment::new(), EditorConfig::default())
        .with_package(dest_package.clone());
    let mut events = session.subscribe();

    let report = session
        .clone_from(
            &pump_environment(),
            Some(&source_package as &dyn SupplementaryFileStore),
            &IdentifiableHandle::shell("aas-1"),
            keep_ids(),
        )
        .await
        .unwrap();

    assert_eq!(report.copied_files, vec![manual.clone()]);
    assert_eq!(dest_package.read(&manual).unwrap(), b"%PDF-1.7");
    assert_eq!(drain(&mut events).len(), report.created.len());
    assert_eq!(session.environment(), &pump_environment());
}

#[tokio::test]
async fn test_fetch_stubs_requires_remote() {
    let mut session = pump_session();
    let err = session
        .fetch_stubs("http://repo", IdentifiableKind::Shell, None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AasxError::Config(_)));
}
