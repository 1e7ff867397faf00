//! Editing session over one environment.
//!
//! Every operation runs in the same order: the local mutation, then the
//! change events, then any remote or package I/O. A failing mirror or file
//! copy never undoes the local change.

use crate::clipboard::{CopyPasteBuffer, ElementPaste, IdentifiablePaste};
use crate::clone::{CloneEngine, CloneOptions, CloneReport};
use crate::delete::{self, DeleteOutcome};
use crate::package::SupplementaryFileStore;
use crate::remote::{FetchReport, MirrorOutcome, RemoteAssistant};
use crate::rename::{self, ElementRenameOutcome, RenameOutcome};
use aasx_core::config::EditorConfig;
use aasx_core::consistency::ConsistencyReport;
use aasx_core::environment::Environment;
use aasx_core::error::{AasxError, Result};
use aasx_core::model::{Identifiable, IdentifiableHandle, IdentifiableKind, SubmodelElement};
use aasx_core::notify::{ChangeEvent, ChangeKind, ChangeNotifier};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A local result together with the outcome of mirroring it remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirrored<T> {
    pub local: T,
    pub mirror: MirrorOutcome,
}

pub struct EditSession {
    env: Environment,
    clipboard: CopyPasteBuffer,
    notifier: ChangeNotifier,
    config: EditorConfig,
    cloner: CloneEngine,
    remote: Option<RemoteAssistant>,
    package: Option<Arc<dyn SupplementaryFileStore>>,
}

impl std::fmt::Debug for EditSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("shells", &self.env.shells().len())
            .field("submodels", &self.env.submodels().len())
            .field("concept_descriptions", &self.env.concept_descriptions().len())
            .field("remote", &self.remote.is_some())
            .field("package", &self.package.is_some())
            .finish_non_exhaustive()
    }
}

impl EditSession {
    pub fn new(env: Environment, config: EditorConfig) -> Self {
        Self {
            env,
            clipboard: CopyPasteBuffer::new(),
            notifier: ChangeNotifier::default(),
            cloner: CloneEngine::new(config.ids.clone()),
            config,
            remote: None,
            package: None,
        }
    }

    pub fn with_remote(mut self, remote: RemoteAssistant) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Package holding this environment's supplementary files.
    pub fn with_package(mut self, package: Arc<dyn SupplementaryFileStore>) -> Self {
        self.package = Some(package);
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn into_environment(self) -> Environment {
        self.env
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.notifier.subscribe()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn clipboard(&self) -> &CopyPasteBuffer {
        &self.clipboard
    }

    /// Clone options from the configured defaults.
    pub fn clone_options(&self) -> CloneOptions {
        CloneOptions::from(self.config.clone)
    }

    pub fn add<T: Identifiable>(&mut self, item: T) -> Result<IdentifiableHandle> {
        let handle = item.handle();
        T::store_mut(&mut self.env).add(item)?;
        self.notifier
            .emit(ChangeEvent::identifiable(handle.clone(), ChangeKind::Create));
        Ok(handle)
    }

    pub fn move_up(&mut self, handle: &IdentifiableHandle) -> Result<usize> {
        self.reorder(handle, true)
    }

    pub fn move_down(&mut self, handle: &IdentifiableHandle) -> Result<usize> {
        self.reorder(handle, false)
    }

    fn reorder(&mut self, handle: &IdentifiableHandle, up: bool) -> Result<usize> {
        let index = self.env.move_identifiable(handle, up)?;
        self.notifier
            .emit(ChangeEvent::identifiable(handle.clone(), ChangeKind::StructChange));
        Ok(index)
    }

    /// Rename an identifiable, rewrite references to it and offer to mirror
    /// the rename remotely.
    pub async fn rename(
        &mut self,
        kind: IdentifiableKind,
        old_id: &str,
        new_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Mirrored<RenameOutcome>> {
        let outcome = rename::rename_by_kind(&mut self.env, kind, old_id, new_id)?;
        let Some(renamed) = outcome.renamed.clone() else {
            return Ok(Mirrored {
                local: outcome,
                mirror: MirrorOutcome::NotApplicable,
            });
        };

        self.notifier
            .emit(ChangeEvent::identifiable(renamed.clone(), ChangeKind::StructChange));
        self.notifier.emit_all(
            outcome
                .affected
                .iter()
                .filter(|handle| **handle != renamed)
                .map(|handle| ChangeEvent::identifiable(handle.clone(), ChangeKind::StructChange)),
        );
        self.clipboard.follow_rename(kind, old_id, &renamed.id);

        let mirror = match &self.remote {
            Some(remote) => {
                remote
                    .mirror_rename(&mut self.env, kind, old_id, &renamed.id, cancel)
                    .await
            }
            None => MirrorOutcome::NotApplicable,
        };
        Ok(Mirrored {
            local: outcome,
            mirror,
        })
    }

    pub fn rename_element<S: AsRef<str>>(
        &mut self,
        submodel_id: &str,
        path: &[S],
        new_id_short: &str,
    ) -> Result<ElementRenameOutcome> {
        let outcome = rename::rename_referable(&mut self.env, submodel_id, path, new_id_short)?;
        if outcome.is_noop() {
            return Ok(outcome);
        }
        self.notifier.emit(ChangeEvent::element(
            outcome.submodel.clone(),
            outcome.new_path.clone(),
            ChangeKind::StructChange,
        ));
        self.notifier.emit_all(
            outcome
                .affected
                .iter()
                .map(|handle| ChangeEvent::identifiable(handle.clone(), ChangeKind::StructChange)),
        );
        Ok(outcome)
    }

    /// Delete an identifiable locally, then offer to delete its remote
    /// counterpart.
    pub async fn delete(
        &mut self,
        handle: &IdentifiableHandle,
        cascade: bool,
        cancel: &CancellationToken,
    ) -> Result<Mirrored<DeleteOutcome>> {
        let outcome = delete::delete_identifiable(&mut self.env, handle, cascade)?;
        self.emit_deleted(&outcome);

        let mirror = match (&self.remote, &outcome.side_info) {
            (Some(remote), Some(side_info)) => {
                remote.mirror_delete(side_info, handle.kind, cancel).await
            }
            _ => MirrorOutcome::NotApplicable,
        };
        if let MirrorOutcome::Failed { error } = &mirror {
            warn!("{} deleted locally only: {}", handle, error);
        }
        Ok(Mirrored {
            local: outcome,
            mirror,
        })
    }

    /// Delete a shell and the submodels only it references. Each deleted
    /// entry is offered for remote mirroring.
    pub async fn delete_shell_with_submodels(
        &mut self,
        shell_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Mirrored<DeleteOutcome>>> {
        let outcomes = delete::delete_shell_with_submodels(&mut self.env, shell_id)?;
        for outcome in &outcomes {
            self.emit_deleted(outcome);
        }

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let mirror = match (&self.remote, &outcome.side_info) {
                (Some(remote), Some(side_info)) => {
                    remote
                        .mirror_delete(side_info, outcome.deleted.kind, cancel)
                        .await
                }
                _ => MirrorOutcome::NotApplicable,
            };
            results.push(Mirrored {
                local: outcome,
                mirror,
            });
        }
        Ok(results)
    }

    fn emit_deleted(&self, outcome: &DeleteOutcome) {
        self.notifier
            .emit(ChangeEvent::identifiable(outcome.deleted.clone(), ChangeKind::Delete));
        self.notifier.emit_all(
            outcome
                .affected
                .iter()
                .map(|handle| ChangeEvent::identifiable(handle.clone(), ChangeKind::StructChange)),
        );
    }

    pub fn delete_element<S: AsRef<str>>(
        &mut self,
        submodel_id: &str,
        path: &[S],
    ) -> Result<SubmodelElement> {
        let element = delete::delete_element(&mut self.env, submodel_id, path)?;
        self.notifier.emit(ChangeEvent::element(
            IdentifiableHandle::submodel(submodel_id),
            path.iter().map(|s| s.as_ref().to_string()).collect(),
            ChangeKind::Delete,
        ));
        Ok(element)
    }

    /// Clone `handle` from another environment into this one. Supplementary
    /// files are copied from `source_package` when both packages are known
    /// and the options ask for it; file failures are recorded in the
    /// report.
    pub async fn clone_from(
        &mut self,
        source: &Environment,
        source_package: Option<&dyn SupplementaryFileStore>,
        handle: &IdentifiableHandle,
        options: CloneOptions,
    ) -> Result<CloneReport> {
        let mut report = self.cloner.clone_into(source, &mut self.env, handle, options)?;
        self.notifier.emit_all(report.events());

        if options.copy_supplementary_files {
            match (source_package, self.package.as_deref()) {
                (Some(source_package), Some(dest_package)) => {
                    CloneEngine::copy_supplementary_files(&mut report, source_package, dest_package)
                        .await;
                }
                _ if !report.supplementary_files.is_empty() => {
                    warn!(
                        "{} supplementary files not copied: package unavailable",
                        report.supplementary_files.len()
                    );
                }
                _ => {}
            }
        }
        if let Some(partial) = report.partial_failure() {
            warn!("Clone of {} incomplete: {}", handle, partial);
        }
        Ok(report)
    }

    /// Clone `handle` inside this environment under fresh ids. Files stay
    /// shared within the package.
    pub fn clone_within(
        &mut self,
        handle: &IdentifiableHandle,
        options: CloneOptions,
    ) -> Result<CloneReport> {
        let report = self.cloner.clone_within(&mut self.env, handle, options)?;
        self.notifier.emit_all(report.events());
        Ok(report)
    }

    pub fn copy(&mut self, handle: &IdentifiableHandle) -> Result<()> {
        self.clipboard.copy_identifiable(&self.env, handle)
    }

    pub fn cut(&mut self, handle: &IdentifiableHandle) -> Result<()> {
        self.clipboard.cut_identifiable(&self.env, handle)
    }

    pub fn copy_element<S: AsRef<str>>(&mut self, submodel_id: &str, path: &[S]) -> Result<()> {
        self.clipboard.copy_element(&self.env, submodel_id, path)
    }

    pub fn cut_element<S: AsRef<str>>(&mut self, submodel_id: &str, path: &[S]) -> Result<()> {
        self.clipboard.cut_element(&self.env, submodel_id, path)
    }

    /// Paste the buffered identifiable into this environment.
    pub fn paste(&mut self, options: CloneOptions) -> Result<IdentifiablePaste> {
        let paste = self
            .clipboard
            .paste_identifiable(&self.cloner, &mut self.env, options)?;
        if let Some(origin) = &paste.removed_origin {
            self.notifier
                .emit(ChangeEvent::identifiable(origin.clone(), ChangeKind::Delete));
        }
        self.notifier.emit_all(paste.report.events());
        Ok(paste)
    }

    pub fn paste_element<S: AsRef<str>>(
        &mut self,
        submodel_id: &str,
        parent_path: &[S],
    ) -> Result<ElementPaste> {
        let paste = self
            .clipboard
            .paste_element(&mut self.env, submodel_id, parent_path)?;
        if let Some(origin) = &paste.removed_origin {
            self.notifier.emit(ChangeEvent::element(
                IdentifiableHandle::submodel(origin.submodel_id.clone()),
                origin.path.clone(),
                ChangeKind::Delete,
            ));
        }
        self.notifier.emit(ChangeEvent::element(
            IdentifiableHandle::submodel(paste.submodel_id.clone()),
            paste.path.clone(),
            ChangeKind::Create,
        ));
        Ok(paste)
    }

    /// Pull one page of id-only stubs from a repository.
    ///
    /// # Errors
    ///
    /// `Config` when the session has no remote assistant.
    pub async fn fetch_stubs(
        &mut self,
        base: &str,
        kind: IdentifiableKind,
        cursor: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<FetchReport> {
        let Some(remote) = &self.remote else {
            return Err(AasxError::config("No remote repository configured"));
        };
        let report = remote
            .fetch_stubs(&mut self.env, base, kind, cursor, cancel)
            .await?;
        self.notifier.emit_all(
            report
                .added
                .iter()
                .map(|handle| ChangeEvent::identifiable(handle.clone(), ChangeKind::Create)),
        );
        Ok(report)
    }

    pub fn check_consistency(&self) -> ConsistencyReport {
        let report = self.env.check_consistency();
        if !report.is_consistent() {
            info!(
                "Consistency check: {} duplicate ids, {} dangling references",
                report.duplicate_ids.len(),
                report.dangling_references.len()
            );
        }
        report
    }
}
