//! Identifier and idShort renaming with reference rewriting.
//!
//! Renaming an identifiable rewrites the first key of every model reference
//! that addresses it, anywhere in the environment. The rewrite walks every
//! reference-bearing field (qualifiers, semantic ids, operation variables,
//! annotations, ...), so no reference to the old id survives.
//!
//! Renames are applied eagerly. There is no snapshot to restore; a second
//! rename with swapped arguments restores every rewritten key.

use aasx_core::environment::Environment;
use aasx_core::error::{AasxError, Result};
use aasx_core::model::{
    AssetAdministrationShell, ConceptDescription, Identifiable, IdentifiableHandle,
    IdentifiableKind, Submodel,
};
use aasx_core::traverse::ReferenceBearing;
use serde::Serialize;
use tracing::{debug, info};

/// Result of renaming an identifiable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    /// Handle under the new id; `None` when nothing was renamed
    pub renamed: Option<IdentifiableHandle>,
    /// Owners of rewritten references, deduplicated in discovery order
    pub affected: Vec<IdentifiableHandle>,
    pub rewritten_references: usize,
}

impl RenameOutcome {
    pub fn is_noop(&self) -> bool {
        self.renamed.is_none()
    }
}

/// Rename the identifiable `old_id` of type `T` to `new_id`.
///
/// An empty `new_id`, or one equal to `old_id`, is a no-op.
///
/// # Errors
///
/// `NotFound` when `old_id` is absent, `DuplicateId` when `new_id` is
/// already taken in the same store.
pub fn rename_identifiable<T: Identifiable>(
    env: &mut Environment,
    old_id: &str,
    new_id: &str,
) -> Result<RenameOutcome> {
    let new_id = new_id.trim();
    if new_id.is_empty() || new_id == old_id {
        debug!("Ignoring rename of {} {} to '{}'", T::KIND, old_id, new_id);
        return Ok(RenameOutcome::default());
    }

    let store = T::store_mut(env);
    if !store.contains(old_id) {
        return Err(AasxError::not_found(T::KIND.as_str(), old_id));
    }
    if store.contains(new_id) {
        return Err(AasxError::duplicate_id(T::KIND.as_str(), new_id));
    }
    let item = store
        .find_by_id_mut(old_id)
        .ok_or_else(|| AasxError::not_found(T::KIND.as_str(), old_id))?;
    item.set_id(new_id.to_string());
    store.rekey_side_info(old_id, new_id);

    let (affected, rewritten_references) = rewrite_first_keys(env, T::KIND, old_id, new_id);

    info!(
        "Renamed {} {} to {}: {} references rewritten in {} identifiables",
        T::KIND,
        old_id,
        new_id,
        rewritten_references,
        affected.len()
    );
    Ok(RenameOutcome {
        renamed: Some(IdentifiableHandle::new(T::KIND, new_id)),
        affected,
        rewritten_references,
    })
}

/// [`rename_identifiable`] dispatched on a runtime kind.
pub fn rename_by_kind(
    env: &mut Environment,
    kind: IdentifiableKind,
    old_id: &str,
    new_id: &str,
) -> Result<RenameOutcome> {
    match kind {
        IdentifiableKind::Shell => rename_identifiable::<AssetAdministrationShell>(env, old_id, new_id),
        IdentifiableKind::Submodel => rename_identifiable::<Submodel>(env, old_id, new_id),
        IdentifiableKind::ConceptDescription => {
            rename_identifiable::<ConceptDescription>(env, old_id, new_id)
        }
    }
}

/// Point every reference whose first key is `kind`/`old_id` at `new_id`.
/// Returns the owners of rewritten references and their count.
pub fn rewrite_first_keys<R: ReferenceBearing>(
    target: &mut R,
    kind: IdentifiableKind,
    old_id: &str,
    new_id: &str,
) -> (Vec<IdentifiableHandle>, usize) {
    let mut affected: Vec<IdentifiableHandle> = Vec::new();
    let mut rewritten = 0;

    target.for_each_reference_mut(|site, reference| {
        if !reference.points_to(kind, old_id) {
            return;
        }
        if let Some(key) = reference.keys.first_mut() {
            key.value = new_id.to_string();
            rewritten += 1;
            debug!("Rewrote reference in {} at {:?}", site.owner, site.path);
            if !affected.contains(&site.owner) {
                affected.push(site.owner.clone());
            }
        }
    });

    (affected, rewritten)
}

/// Result of renaming a submodel element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementRenameOutcome {
    pub submodel: IdentifiableHandle,
    pub old_path: Vec<String>,
    pub new_path: Vec<String>,
    pub affected: Vec<IdentifiableHandle>,
    pub rewritten_references: usize,
}

impl ElementRenameOutcome {
    pub fn is_noop(&self) -> bool {
        self.old_path == self.new_path
    }
}

/// Change the idShort of the element at `path` in submodel `submodel_id`
/// and rewrite the matching key of every model reference that navigates
/// through it.
///
/// # Errors
///
/// `NotFound` for an unknown submodel or path, `DuplicateId` when a sibling
/// already uses `new_id_short`, `InvalidInput` for elements of a list,
/// which are addressed by index.
pub fn rename_referable<S: AsRef<str>>(
    env: &mut Environment,
    submodel_id: &str,
    path: &[S],
    new_id_short: &str,
) -> Result<ElementRenameOutcome> {
    let old_path: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();
    let Some((old_id_short, parent_path)) = old_path.split_last() else {
        return Err(AasxError::invalid_input("Element path must not be empty"));
    };
    let submodel_handle = IdentifiableHandle::submodel(submodel_id);
    let path_display = old_path.join("/");

    let submodel = env
        .submodels_mut()
        .find_by_id_mut(submodel_id)
        .ok_or_else(|| AasxError::not_found("Submodel", submodel_id))?;

    let parent_is_list = !parent_path.is_empty()
        && submodel
            .element_by_path(parent_path)
            .is_some_and(|parent| parent.is_list());
    if parent_is_list {
        return Err(AasxError::invalid_input(format!(
            "Element {} is part of a list and has no idShort path",
            path_display
        )));
    }

    let new_id_short = new_id_short.trim();
    let mut new_path = parent_path.to_vec();
    new_path.push(new_id_short.to_string());

    if new_id_short.is_empty() || new_id_short == old_id_short {
        if submodel.element_by_path(&old_path).is_none() {
            return Err(AasxError::not_found("SubmodelElement", path_display));
        }
        return Ok(ElementRenameOutcome {
            submodel: submodel_handle,
            new_path: old_path.clone(),
            old_path,
            affected: Vec::new(),
            rewritten_references: 0,
        });
    }

    let siblings = submodel
        .sibling_id_shorts(parent_path)
        .ok_or_else(|| AasxError::not_found("SubmodelElement", parent_path.join("/")))?;
    if siblings.iter().any(|s| s == new_id_short) {
        return Err(AasxError::duplicate_id("SubmodelElement", new_path.join("/")));
    }

    let element = submodel
        .element_by_path_mut(&old_path)
        .ok_or_else(|| AasxError::not_found("SubmodelElement", path_display.clone()))?;
    element.id_short = new_id_short.to_string();

    let depth = old_path.len();
    let mut affected: Vec<IdentifiableHandle> = Vec::new();
    let mut rewritten_references = 0;
    env.for_each_reference_mut(|site, reference| {
        if !reference.points_to(IdentifiableKind::Submodel, submodel_id)
            || reference.keys.len() <= depth
        {
            return;
        }
        let navigates = reference.keys[1..=depth]
            .iter()
            .zip(old_path.iter())
            .all(|(key, segment)| key.value == *segment);
        if navigates {
            reference.keys[depth].value = new_id_short.to_string();
            rewritten_references += 1;
            if !affected.contains(&site.owner) {
                affected.push(site.owner.clone());
            }
        }
    });

    info!(
        "Renamed element {} in {} to {}: {} references rewritten",
        path_display, submodel_id, new_id_short, rewritten_references
    );
    Ok(ElementRenameOutcome {
        submodel: submodel_handle,
        old_path,
        new_path,
        affected,
        rewritten_references,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aasx_core::model::{KeyType, Reference, SubmodelElement};
    use aasx_core::store::{SideInfo, StubLevel};

    fn env() -> Environment {
        let mut env = Environment::new();
        let mut shell = AssetAdministrationShell::new("aas-1", "Pump");
        shell.add_submodel_ref("sm-42");
        env.shells_mut().add(shell).unwrap();
        env.submodels_mut()
            .add(
                Submodel::new("sm-42", "TechnicalData").with_element(SubmodelElement::collection(
                    "General",
                    vec![SubmodelElement::property("Weight", "12")],
                )),
            )
            .unwrap();
        env.submodels_mut()
            .add(Submodel::new("sm-links", "Links").with_element(SubmodelElement::reference_element(
                "WeightLink",
                Reference::model_to(IdentifiableKind::Submodel, "sm-42")
                    .with_key(KeyType::SubmodelElementCollection, "General")
                    .with_key(KeyType::Property, "Weight"),
            )))
            .unwrap();
        env
    }

    #[test]
    fn test_rename_rewrites_and_reports() {
        let mut env = env();
        env.set_side_info(
            IdentifiableKind::Submodel,
            SideInfo::new("sm-42", StubLevel::IdOnly).with_endpoint("http://repo/sm"),
        );

        let outcome = rename_identifiable::<Submodel>(&mut env, "sm-42", "sm-99").unwrap();
        assert_eq!(outcome.renamed, Some(IdentifiableHandle::submodel("sm-99")));
        assert_eq!(outcome.rewritten_references, 2);
        assert_eq!(
            outcome.affected,
            vec![IdentifiableHandle::shell("aas-1"), IdentifiableHandle::submodel("sm-links")]
        );
        assert!(env.submodels().side_info("sm-42").is_none());
        assert_eq!(env.submodels().side_info("sm-99").unwrap().id, "sm-99");
        assert!(env.check_consistency().is_consistent());
    }

    #[test]
    fn test_noop_and_errors() {
        let mut env = env();
        assert!(rename_by_kind(&mut env, IdentifiableKind::Submodel, "sm-42", " ").unwrap().is_noop());
        assert!(rename_by_kind(&mut env, IdentifiableKind::Submodel, "sm-42", "sm-42").unwrap().is_noop());
        assert!(rename_by_kind(&mut env, IdentifiableKind::Submodel, "sm-404", "x")
            .unwrap_err()
            .is_not_found());
        assert!(rename_by_kind(&mut env, IdentifiableKind::Submodel, "sm-42", "sm-links")
            .unwrap_err()
            .is_duplicate_id());
        assert_eq!(env.ids(IdentifiableKind::Submodel), vec!["sm-42", "sm-links"]);
    }

    #[test]
    fn test_unknown_old_id_wins_over_taken_new_id() {
        let mut env = env();
        let err = rename_identifiable::<Submodel>(&mut env, "sm-404", "sm-links").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(env.ids(IdentifiableKind::Submodel), vec!["sm-42", "sm-links"]);
    }

    #[test]
    fn test_rename_element_rewrites_path_keys() {
        let mut env = env();
        let outcome = rename_referable(&mut env, "sm-42", &["General", "Weight"], "Mass").unwrap();
        assert_eq!(outcome.new_path, vec!["General", "Mass"]);
        assert_eq!(outcome.rewritten_references, 1);
        assert_eq!(outcome.affected, vec![IdentifiableHandle::submodel("sm-links")]);
        assert!(env.check_consistency().is_consistent());
    }

    #[test]
    fn test_rename_element_sibling_collision() {
        let mut env = env();
        env.submodels_mut()
            .find_by_id_mut("sm-42")
            .unwrap()
            .submodel_elements
            .push(SubmodelElement::property("Serial", "A1"));
        let err = rename_referable(&mut env, "sm-42", &["Serial"], "General").unwrap_err();
        assert!(err.is_duplicate_id());
        assert!(rename_referable(&mut env, "sm-42", &["Missing"], "Other")
            .unwrap_err()
            .is_not_found());
    }
}
