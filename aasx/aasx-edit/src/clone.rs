//! Cloning identifiables within and across environments.
//!
//! A clone runs in two phases. Planning reads the source and destination
//! and produces every identifiable to add, with ids already assigned.
//! Applying inserts the planned identifiables into the destination. Change
//! events are derived from the finished [`CloneReport`], so nothing is
//! announced while the graph is half built.
//!
//! Supplementary files are copied in a separate, async step
//! ([`CloneEngine::copy_supplementary_files`]) once the graph clone is
//! complete. File copy failures are recorded, never rolled back.

use crate::package::{PackagePath, SupplementaryFileStore};
use crate::rename::rewrite_first_keys;
use aasx_core::config::CloneDefaults;
use aasx_core::environment::Environment;
use aasx_core::error::{AasxError, Result};
use aasx_core::idgen::IdTemplates;
use aasx_core::model::{
    AssetAdministrationShell, ConceptDescription, ElementKind, Identifiable, IdentifiableHandle,
    IdentifiableKind, Reference, Submodel, walk_elements,
};
use aasx_core::notify::{ChangeEvent, ChangeKind};
use aasx_core::traverse::ReferenceBearing;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Switches for a clone or paste.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloneOptions {
    /// Also clone referenced submodels and concept descriptions
    pub recursive: bool,
    /// Give every cloned identifiable a fresh id
    pub generate_new_ids: bool,
    /// Collect package files referenced by the clone for copying
    pub copy_supplementary_files: bool,
    /// Rewrite references to old ids inside the cloned subtree
    pub repair_self_references: bool,
}

impl From<CloneDefaults> for CloneOptions {
    fn from(defaults: CloneDefaults) -> Self {
        Self {
            recursive: defaults.recursive,
            generate_new_ids: defaults.generate_new_ids,
            copy_supplementary_files: defaults.copy_supplementary_files,
            repair_self_references: defaults.repair_self_references,
        }
    }
}

impl Default for CloneOptions {
    fn default() -> Self {
        CloneDefaults::default().into()
    }
}

/// A package file the clone depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SupplementaryFile {
    pub path: PackagePath,
    pub is_thumbnail: bool,
}

/// What a clone did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneReport {
    /// The clone of the requested identifiable
    pub root: IdentifiableHandle,
    /// Every identifiable added to the destination, in insertion order
    pub created: Vec<IdentifiableHandle>,
    /// Source identifiables left out because the destination already had them
    pub skipped: Vec<IdentifiableHandle>,
    /// Source handle and the id its clone received
    pub id_map: Vec<(IdentifiableHandle, String)>,
    pub supplementary_files: Vec<SupplementaryFile>,
    pub copied_files: Vec<PackagePath>,
    pub skipped_files: Vec<PackagePath>,
    pub failed_files: Vec<(PackagePath, String)>,
}

impl CloneReport {
    fn new(root: IdentifiableHandle) -> Self {
        Self {
            root,
            created: Vec::new(),
            skipped: Vec::new(),
            id_map: Vec::new(),
            supplementary_files: Vec::new(),
            copied_files: Vec::new(),
            skipped_files: Vec::new(),
            failed_files: Vec::new(),
        }
    }

    /// Id the clone of `source` received, if it was cloned.
    pub fn new_id_of(&self, source: &IdentifiableHandle) -> Option<&str> {
        self.id_map
            .iter()
            .find(|(handle, _)| handle == source)
            .map(|(_, id)| id.as_str())
    }

    /// One `Create` event per added identifiable.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.created
            .iter()
            .map(|handle| ChangeEvent::identifiable(handle.clone(), ChangeKind::Create))
            .collect()
    }

    /// `PartialClone` when some file copies failed.
    pub fn partial_failure(&self) -> Option<AasxError> {
        if self.failed_files.is_empty() {
            return None;
        }
        Some(AasxError::PartialClone {
            attempted: self.supplementary_files.len(),
            failed: self.failed_files.len(),
        })
    }
}

/// Identifiables to add, with final ids.
#[derive(Debug, Default)]
struct ClonePlan {
    shells: Vec<AssetAdministrationShell>,
    submodels: Vec<Submodel>,
    concept_descriptions: Vec<ConceptDescription>,
}

struct Planner<'a> {
    source: &'a Environment,
    dest: &'a Environment,
    options: CloneOptions,
    templates: &'a IdTemplates,
    taken: HashSet<IdentifiableHandle>,
    plan: ClonePlan,
    report: CloneReport,
}

impl<'a> Planner<'a> {
    fn is_free(&self, kind: IdentifiableKind, id: &str) -> bool {
        !self.dest.contains(kind, id)
            && !self.taken.contains(&IdentifiableHandle::new(kind, id))
    }

    /// Id for the clone of `source`: fresh when regenerating, else kept.
    fn assign_id(&mut self, source: &IdentifiableHandle) -> String {
        let id = if self.options.generate_new_ids {
            let kind = source.kind;
            self.templates.generate(kind, |candidate| !self.is_free(kind, candidate))
        } else {
            source.id.clone()
        };
        self.taken.insert(IdentifiableHandle::new(source.kind, id.clone()));
        self.report.id_map.push((source.clone(), id.clone()));
        self.report
            .created
            .push(IdentifiableHandle::new(source.kind, id.clone()));
        id
    }

    fn skip(&mut self, handle: IdentifiableHandle) {
        if !self.report.skipped.contains(&handle) {
            debug!("Skipping {}: already present in destination", handle);
            self.report.skipped.push(handle);
        }
    }

    fn shell(&mut self, shell: &AssetAdministrationShell) {
        let mut clone = shell.clone();
        clone.set_id(self.assign_id(&shell.handle()));

        if self.options.copy_supplementary_files {
            if let Some(thumbnail) = &shell.asset_information.default_thumbnail {
                self.record_file(&thumbnail.path, true);
            }
        }

        if self.options.recursive {
            let source = self.source;
            let mut planned: HashSet<String> = HashSet::new();
            for submodel_id in shell.submodel_ids() {
                if !planned.insert(submodel_id.clone()) {
                    continue;
                }
                let Some(submodel) = source.submodels().find_by_id(&submodel_id) else {
                    warn!("Shell {} references unknown submodel {}", shell.id, submodel_id);
                    continue;
                };
                if !self.options.generate_new_ids {
                    if self.is_free(IdentifiableKind::Submodel, &submodel_id) {
                        self.submodel(submodel);
                    } else {
                        self.skip(submodel.handle());
                    }
                    continue;
                }

                let new_id = self.submodel(submodel);
                for reference in clone.submodels.iter_mut() {
                    if reference.points_to(IdentifiableKind::Submodel, &submodel_id) {
                        *reference = Reference::model_to(IdentifiableKind::Submodel, new_id.clone());
                    }
                }
            }
            self.concept_descriptions_of(shell);
        }

        self.plan.shells.push(clone);
    }

    fn submodel(&mut self, submodel: &Submodel) -> String {
        let mut clone = submodel.clone();
        let new_id = self.assign_id(&submodel.handle());
        clone.set_id(new_id.clone());

        if self.options.copy_supplementary_files {
            walk_elements(&submodel.submodel_elements, |_, element| {
                if let ElementKind::File { value: Some(value), .. } = &element.kind {
                    self.record_file(value, false);
                }
            });
        }
        if self.options.recursive {
            self.concept_descriptions_of(submodel);
        }

        self.plan.submodels.push(clone);
        new_id
    }

    fn concept_description(&mut self, cd: &ConceptDescription) {
        let mut clone = cd.clone();
        clone.set_id(self.assign_id(&cd.handle()));
        if self.options.recursive {
            self.concept_descriptions_of(cd);
        }
        self.plan.concept_descriptions.push(clone);
    }

    /// Copy the concept descriptions named by references of `item`.
    /// Concept descriptions keep their ids and are added once.
    fn concept_descriptions_of<R: ReferenceBearing>(&mut self, item: &R) {
        let source = self.source;
        let mut wanted: Vec<String> = Vec::new();
        item.for_each_reference(|_, reference| {
            if let Some(value) = reference.first_value() {
                if source.concept_descriptions().contains(value)
                    && !wanted.iter().any(|w| w == value)
                {
                    wanted.push(value.to_string());
                }
            }
        });

        for id in wanted {
            let handle = IdentifiableHandle::concept_description(id.as_str());
            if self.taken.contains(&handle) {
                continue;
            }
            if self.dest.contains(IdentifiableKind::ConceptDescription, &id) {
                self.skip(handle);
                continue;
            }
            if let Some(cd) = source.concept_descriptions().find_by_id(&id) {
                self.taken.insert(handle.clone());
                self.report.created.push(handle);
                self.plan.concept_descriptions.push(cd.clone());
            }
        }
    }

    fn record_file(&mut self, value: &str, is_thumbnail: bool) {
        let Ok(path) = PackagePath::parse(value) else {
            debug!("Not a package file: {}", value);
            return;
        };
        if self.report.supplementary_files.iter().any(|f| f.path == path) {
            return;
        }
        self.report
            .supplementary_files
            .push(SupplementaryFile { path, is_thumbnail });
    }

    /// Point references to cloned identifiables at their clones.
    fn repair_self_references(&mut self) {
        let renames: Vec<(IdentifiableHandle, String)> = self
            .report
            .id_map
            .iter()
            .filter(|(handle, new_id)| handle.id != *new_id)
            .cloned()
            .collect();

        for (old, new_id) in &renames {
            let mut total = 0;
            for shell in &mut self.plan.shells {
                total += rewrite_first_keys(shell, old.kind, &old.id, new_id).1;
            }
            for submodel in &mut self.plan.submodels {
                total += rewrite_first_keys(submodel, old.kind, &old.id, new_id).1;
            }
            for cd in &mut self.plan.concept_descriptions {
                total += rewrite_first_keys(cd, old.kind, &old.id, new_id).1;
            }
            debug!("Repaired {} self references to {}", total, old);
        }
    }
}

/// Clones identifiables between environments.
#[derive(Debug, Clone, Default)]
pub struct CloneEngine {
    templates: IdTemplates,
}

impl CloneEngine {
    pub fn new(templates: IdTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &IdTemplates {
        &self.templates
    }

    /// Clone `handle` from `source` into `dest`.
    ///
    /// # Errors
    ///
    /// `NotFound` when `handle` is not in `source`; `DuplicateId` when ids
    /// are kept and `dest` already holds the identifiable. The destination
    /// is unchanged on error.
    pub fn clone_into(
        &self,
        source: &Environment,
        dest: &mut Environment,
        handle: &IdentifiableHandle,
        options: CloneOptions,
    ) -> Result<CloneReport> {
        let (plan, report) = self.plan(source, dest, handle, options)?;
        Self::apply(dest, plan)?;
        info!(
            "Cloned {} as {}: {} created, {} skipped",
            handle,
            report.root,
            report.created.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Clone `handle` inside the environment it lives in. Requires fresh
    /// ids; keeping them would duplicate every cloned id.
    pub fn clone_within(
        &self,
        env: &mut Environment,
        handle: &IdentifiableHandle,
        options: CloneOptions,
    ) -> Result<CloneReport> {
        if !options.generate_new_ids {
            return Err(AasxError::duplicate_id(handle.kind.as_str(), handle.id.as_str()));
        }
        let (plan, report) = self.plan(env, env, handle, options)?;
        Self::apply(env, plan)?;
        info!(
            "Cloned {} as {} within environment: {} created",
            handle,
            report.root,
            report.created.len()
        );
        Ok(report)
    }

    fn plan(
        &self,
        source: &Environment,
        dest: &Environment,
        handle: &IdentifiableHandle,
        options: CloneOptions,
    ) -> Result<(ClonePlan, CloneReport)> {
        if source.find_identifiable(handle).is_none() {
            return Err(AasxError::not_found(handle.kind.as_str(), handle.id.as_str()));
        }
        if !options.generate_new_ids && dest.contains(handle.kind, &handle.id) {
            return Err(AasxError::duplicate_id(handle.kind.as_str(), handle.id.as_str()));
        }

        let mut planner = Planner {
            source,
            dest,
            options,
            templates: &self.templates,
            taken: HashSet::new(),
            plan: ClonePlan::default(),
            report: CloneReport::new(handle.clone()),
        };

        match handle.kind {
            IdentifiableKind::Shell => {
                if let Some(shell) = source.shells().find_by_id(&handle.id) {
                    planner.shell(shell);
                }
            }
            IdentifiableKind::Submodel => {
                if let Some(submodel) = source.submodels().find_by_id(&handle.id) {
                    planner.submodel(submodel);
                }
            }
            IdentifiableKind::ConceptDescription => {
                if let Some(cd) = source.concept_descriptions().find_by_id(&handle.id) {
                    planner.concept_description(cd);
                }
            }
        }

        if options.repair_self_references {
            planner.repair_self_references();
        }

        let mut report = planner.report;
        if let Some(root_id) = report.new_id_of(handle).map(str::to_string) {
            report.root = IdentifiableHandle::new(handle.kind, root_id);
        }
        Ok((planner.plan, report))
    }

    fn apply(dest: &mut Environment, plan: ClonePlan) -> Result<()> {
        for cd in plan.concept_descriptions {
            dest.concept_descriptions_mut().add(cd)?;
        }
        for submodel in plan.submodels {
            dest.submodels_mut().add(submodel)?;
        }
        for shell in plan.shells {
            dest.shells_mut().add(shell)?;
        }
        Ok(())
    }

    /// Copy the package files recorded in `report` from `source` to `dest`.
    ///
    /// Files already present in `dest` are skipped and never overwritten.
    /// Failures are logged and recorded in the report; see
    /// [`CloneReport::partial_failure`].
    pub async fn copy_supplementary_files<S, D>(report: &mut CloneReport, source: &S, dest: &D)
    where
        S: SupplementaryFileStore + ?Sized,
        D: SupplementaryFileStore + ?Sized,
    {
        let files = report.supplementary_files.clone();
        for file in files {
            match Self::copy_file(&file, source, dest).await {
                Ok(true) => report.copied_files.push(file.path),
                Ok(false) => {
                    warn!("Destination already has {}, not overwriting", file.path);
                    report.skipped_files.push(file.path);
                }
                Err(e) => {
                    error!("Failed to copy supplementary file {}: {}", file.path, e);
                    report.failed_files.push((file.path, e.to_string()));
                }
            }
        }

        info!(
            "Supplementary files: {} copied, {} skipped, {} failed",
            report.copied_files.len(),
            report.skipped_files.len(),
            report.failed_files.len()
        );
    }

    async fn copy_file<S, D>(file: &SupplementaryFile, source: &S, dest: &D) -> Result<bool>
    where
        S: SupplementaryFileStore + ?Sized,
        D: SupplementaryFileStore + ?Sized,
    {
        if dest.exists(&file.path).await? {
            return Ok(false);
        }
        let (Some(dir), Some(name)) = (file.path.parent(), file.path.file_name()) else {
            return Err(AasxError::package(format!("Invalid package file {}", file.path)));
        };

        let temp = source
            .make_package_file_available_as_temp_file(&file.path)
            .await?;
        let result = dest
            .add_supplementary_file(&temp, &dir, name, file.is_thumbnail)
            .await;
        if let Err(e) = tokio::fs::remove_file(&temp).await {
            debug!("Could not remove temp file {}: {}", temp.display(), e);
        }
        result.map(|_| true)
    }
}
