//! Detection of duplicate identifiers and dangling model references.
//!
//! The check only reports; repairing is left to the caller.

use crate::environment::Environment;
use crate::model::{IdentifiableHandle, IdentifiableKind, Reference};
use crate::traverse::{ReferenceBearing, ReferenceSite};
use serde::Serialize;
use tracing::{debug, warn};

/// A model reference whose target does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingReference {
    pub owner: IdentifiableHandle,
    pub path: Vec<String>,
    pub reference: Reference,
}

/// Findings of a consistency pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    pub duplicate_ids: Vec<IdentifiableHandle>,
    pub dangling_references: Vec<DanglingReference>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.duplicate_ids.is_empty() && self.dangling_references.is_empty()
    }
}

impl Environment {
    /// Report duplicate identifiers and model references that fail to
    /// resolve. References whose first key is not an identifiable kind
    /// (global or external references) are not checked.
    pub fn check_consistency(&self) -> ConsistencyReport {
        let mut report = ConsistencyReport::default();

        for (kind, duplicates) in [
            (IdentifiableKind::Shell, self.asset_administration_shells.duplicate_ids()),
            (IdentifiableKind::Submodel, self.submodels.duplicate_ids()),
            (
                IdentifiableKind::ConceptDescription,
                self.concept_descriptions.duplicate_ids(),
            ),
        ] {
            report
                .duplicate_ids
                .extend(duplicates.into_iter().map(|id| IdentifiableHandle::new(kind, id)));
        }

        self.for_each_reference(|site: &ReferenceSite, reference: &Reference| {
            let addresses_identifiable = reference
                .first_key()
                .is_some_and(|key| key.key_type.is_identifiable());
            if !reference.is_model_reference() || !addresses_identifiable {
                return;
            }
            if self.resolve(reference).is_none() {
                debug!("Dangling reference {} in {}", reference, site.owner);
                report.dangling_references.push(DanglingReference {
                    owner: site.owner.clone(),
                    path: site.path.clone(),
                    reference: reference.clone(),
                });
            }
        });

        if !report.is_consistent() {
            warn!(
                "Consistency check found {} duplicate ids and {} dangling references",
                report.duplicate_ids.len(),
                report.dangling_references.len()
            );
        }
        report
    }
}
