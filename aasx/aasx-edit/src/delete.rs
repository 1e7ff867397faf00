//! Deleting identifiables and submodel elements.
//!
//! Deletes are local and immediate. The side info of a deleted
//! identifiable is handed back so the caller can offer to mirror the delete
//! on the remote repository it came from.

use aasx_core::environment::Environment;
use aasx_core::error::{AasxError, Result};
use aasx_core::model::{
    AssetAdministrationShell, ConceptDescription, Identifiable, IdentifiableHandle,
    IdentifiableKind, Submodel, SubmodelElement,
};
use aasx_core::store::SideInfo;
use tracing::{debug, info};

/// Result of deleting one identifiable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: IdentifiableHandle,
    /// Remote bookkeeping of the deleted entry
    pub side_info: Option<SideInfo>,
    /// Shells that lost a submodel reference
    pub affected: Vec<IdentifiableHandle>,
}

fn remove<T: Identifiable>(env: &mut Environment, id: &str) -> Result<Option<SideInfo>> {
    let store = T::store_mut(env);
    if !store.contains(id) {
        return Err(AasxError::not_found(T::KIND.as_str(), id));
    }
    let side_info = store.take_side_info(id);
    store.remove(id)?;
    Ok(side_info)
}

/// Remove an identifiable from its store.
///
/// With `cascade`, deleting a submodel also drops every shell reference to
/// it; the shells touched are reported as affected. Other references are
/// left in place and show up in the consistency check.
pub fn delete_identifiable(
    env: &mut Environment,
    handle: &IdentifiableHandle,
    cascade: bool,
) -> Result<DeleteOutcome> {
    let side_info = match handle.kind {
        IdentifiableKind::Shell => remove::<AssetAdministrationShell>(env, &handle.id)?,
        IdentifiableKind::Submodel => remove::<Submodel>(env, &handle.id)?,
        IdentifiableKind::ConceptDescription => remove::<ConceptDescription>(env, &handle.id)?,
    };

    let mut affected = Vec::new();
    if cascade && handle.kind == IdentifiableKind::Submodel {
        for shell in env.shells_mut().iter_mut() {
            let before = shell.submodels.len();
            shell
                .submodels
                .retain(|r| !r.points_to(IdentifiableKind::Submodel, &handle.id));
            if shell.submodels.len() != before {
                debug!("Dropped reference to {} from shell {}", handle.id, shell.id);
                affected.push(shell.handle());
            }
        }
    }

    info!(
        "Deleted {}{}",
        handle,
        if side_info.is_some() { " (remote stub)" } else { "" }
    );
    Ok(DeleteOutcome {
        deleted: handle.clone(),
        side_info,
        affected,
    })
}

/// Delete a shell together with the submodels no other shell references.
///
/// The shell's outcome comes first, followed by one per deleted submodel.
pub fn delete_shell_with_submodels(env: &mut Environment, shell_id: &str) -> Result<Vec<DeleteOutcome>> {
    let submodel_ids = env
        .shells()
        .find_by_id(shell_id)
        .ok_or_else(|| AasxError::not_found(IdentifiableKind::Shell.as_str(), shell_id))?
        .submodel_ids();

    let mut outcomes = vec![delete_identifiable(
        env,
        &IdentifiableHandle::shell(shell_id),
        false,
    )?];

    for submodel_id in submodel_ids {
        let shared = env
            .shells()
            .iter()
            .any(|shell| shell.references_submodel(&submodel_id));
        if shared || !env.submodels().contains(&submodel_id) {
            debug!("Keeping submodel {}", submodel_id);
            continue;
        }
        outcomes.push(delete_identifiable(
            env,
            &IdentifiableHandle::submodel(submodel_id),
            false,
        )?);
    }
    Ok(outcomes)
}

/// Take the element at `path` out of its container, returning its former
/// index. Inside a list the last segment is an index.
pub(crate) fn take_element<S: AsRef<str>>(
    env: &mut Environment,
    submodel_id: &str,
    path: &[S],
) -> Result<(usize, SubmodelElement)> {
    let Some((last, parent)) = path.split_last() else {
        return Err(AasxError::invalid_input("Element path must not be empty"));
    };
    let last = last.as_ref();
    let display = || {
        path.iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join("/")
    };

    let submodel = env
        .submodels_mut()
        .find_by_id_mut(submodel_id)
        .ok_or_else(|| AasxError::not_found("Submodel", submodel_id))?;
    let parent_is_list = !parent.is_empty()
        && submodel
            .element_by_path(parent)
            .is_some_and(|element| element.is_list());
    let container = submodel
        .container_mut(parent)
        .ok_or_else(|| AasxError::not_found("SubmodelElement", display()))?;

    let index = if parent_is_list {
        last.parse::<usize>().ok().filter(|index| *index < container.len())
    } else {
        container.iter().position(|element| element.id_short == last)
    }
    .ok_or_else(|| AasxError::not_found("SubmodelElement", display()))?;

    Ok((index, container.remove(index)))
}

/// Remove a submodel element. References into it are not rewritten.
pub fn delete_element<S: AsRef<str>>(
    env: &mut Environment,
    submodel_id: &str,
    path: &[S],
) -> Result<SubmodelElement> {
    let (_, element) = take_element(env, submodel_id, path)?;
    info!("Deleted element {} from {}", element.id_short, submodel_id);
    Ok(element)
}
