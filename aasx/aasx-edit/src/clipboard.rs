//! Session-scoped copy/paste buffer.
//!
//! Copying takes a snapshot of the selected identifiable (with the
//! submodels and concept descriptions a recursive paste may need) or of a
//! submodel element. Pasting replays the snapshot through the
//! [`CloneEngine`], so a paste into another environment behaves exactly
//! like a cross-environment clone.
//!
//! A cut is pasted as a move: the origin is detached before the paste and
//! the pasted root keeps its id. After that the buffer is empty.

use crate::clone::{CloneEngine, CloneOptions, CloneReport};
use crate::delete::take_element;
use crate::rename::rename_by_kind;
use aasx_core::environment::Environment;
use aasx_core::error::{AasxError, Result};
use aasx_core::model::{
    AssetAdministrationShell, ConceptDescription, Identifiable, IdentifiableHandle,
    IdentifiableKind, Submodel, SubmodelElement,
};
use aasx_core::store::SideInfo;
use aasx_core::traverse::ReferenceBearing;
use tracing::{debug, info};

/// Where a copied element came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementOrigin {
    pub submodel_id: String,
    pub path: Vec<String>,
}

#[derive(Debug, Clone)]
enum ClipboardItem {
    Identifiable {
        handle: IdentifiableHandle,
        snapshot: Environment,
    },
    Element {
        origin: ElementOrigin,
        element: SubmodelElement,
    },
}

#[derive(Debug, Clone)]
struct Clip {
    item: ClipboardItem,
    is_cut: bool,
}

/// Outcome of pasting an identifiable.
#[derive(Debug, Clone)]
pub struct IdentifiablePaste {
    pub report: CloneReport,
    /// Origin removed because the buffer held a cut
    pub removed_origin: Option<IdentifiableHandle>,
}

/// Outcome of pasting an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPaste {
    pub submodel_id: String,
    pub path: Vec<String>,
    /// Origin removed because the buffer held a cut
    pub removed_origin: Option<ElementOrigin>,
}

/// Copy/paste buffer owned by one editing session.
#[derive(Debug, Clone, Default)]
pub struct CopyPasteBuffer {
    clip: Option<Clip>,
}

impl CopyPasteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.clip.is_none()
    }

    pub fn is_cut(&self) -> bool {
        self.clip.as_ref().is_some_and(|clip| clip.is_cut)
    }

    pub fn holds_identifiable(&self) -> bool {
        matches!(
            self.clip,
            Some(Clip {
                item: ClipboardItem::Identifiable { .. },
                ..
            })
        )
    }

    pub fn holds_element(&self) -> bool {
        matches!(
            self.clip,
            Some(Clip {
                item: ClipboardItem::Element { .. },
                ..
            })
        )
    }

    pub fn clear(&mut self) {
        self.clip = None;
    }

    pub fn copy_identifiable(&mut self, env: &Environment, handle: &IdentifiableHandle) -> Result<()> {
        self.store_identifiable(env, handle, false)
    }

    pub fn cut_identifiable(&mut self, env: &Environment, handle: &IdentifiableHandle) -> Result<()> {
        self.store_identifiable(env, handle, true)
    }

    pub fn copy_element<S: AsRef<str>>(
        &mut self,
        env: &Environment,
        submodel_id: &str,
        path: &[S],
    ) -> Result<()> {
        self.store_element(env, submodel_id, path, false)
    }

    pub fn cut_element<S: AsRef<str>>(
        &mut self,
        env: &Environment,
        submodel_id: &str,
        path: &[S],
    ) -> Result<()> {
        self.store_element(env, submodel_id, path, true)
    }

    fn store_identifiable(
        &mut self,
        env: &Environment,
        handle: &IdentifiableHandle,
        is_cut: bool,
    ) -> Result<()> {
        let snapshot = snapshot(env, handle)?;
        debug!("{} {} to clipboard", if is_cut { "Cut" } else { "Copied" }, handle);
        self.clip = Some(Clip {
            item: ClipboardItem::Identifiable {
                handle: handle.clone(),
                snapshot,
            },
            is_cut,
        });
        Ok(())
    }

    fn store_element<S: AsRef<str>>(
        &mut self,
        env: &Environment,
        submodel_id: &str,
        path: &[S],
        is_cut: bool,
    ) -> Result<()> {
        let path: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();
        let submodel = env
            .submodels()
            .find_by_id(submodel_id)
            .ok_or_else(|| AasxError::not_found("Submodel", submodel_id))?;
        let element = submodel
            .element_by_path(&path)
            .ok_or_else(|| AasxError::not_found("SubmodelElement", path.join("/")))?;

        debug!(
            "{} element {} of {} to clipboard",
            if is_cut { "Cut" } else { "Copied" },
            path.join("/"),
            submodel_id
        );
        self.clip = Some(Clip {
            item: ClipboardItem::Element {
                origin: ElementOrigin {
                    submodel_id: submodel_id.to_string(),
                    path,
                },
                element: element.clone(),
            },
            is_cut,
        });
        Ok(())
    }

    /// Paste the buffered identifiable into `dest`.
    ///
    /// A cut is moved: the origin is detached and the pasted root keeps its
    /// id and side info, so references to it stay valid whatever `options`
    /// say about ids.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the buffer holds no identifiable, `NotFound` when
    /// a cut origin is no longer in `dest`, otherwise the errors of
    /// [`CloneEngine::clone_into`]. A failed paste leaves `dest` and the
    /// buffer as they were.
    pub fn paste_identifiable(
        &mut self,
        engine: &CloneEngine,
        dest: &mut Environment,
        options: CloneOptions,
    ) -> Result<IdentifiablePaste> {
        let Some(Clip {
            item: ClipboardItem::Identifiable { handle, snapshot },
            is_cut,
        }) = &self.clip
        else {
            return Err(AasxError::invalid_input("Clipboard holds no identifiable"));
        };

        if !*is_cut {
            let report = engine.clone_into(snapshot, dest, handle, options)?;
            return Ok(IdentifiablePaste {
                report,
                removed_origin: None,
            });
        }

        let Some(origin) = detach(dest, handle)? else {
            return Err(AasxError::not_found(handle.kind.as_str(), handle.id.as_str()));
        };
        let options = CloneOptions {
            generate_new_ids: false,
            ..options
        };
        let report = match engine.clone_into(snapshot, dest, handle, options) {
            Ok(report) => report,
            Err(e) => {
                origin.restore(dest)?;
                return Err(e);
            }
        };
        if let Some(info) = origin.into_side_info() {
            dest.set_side_info(handle.kind, info);
        }

        info!("Moved {}", handle);
        let removed_origin = Some(handle.clone());
        self.clip = None;
        Ok(IdentifiablePaste {
            report,
            removed_origin,
        })
    }

    /// Keep a buffered identifiable in step with a rename of `old_id` in
    /// the environment it was taken from.
    pub fn follow_rename(&mut self, kind: IdentifiableKind, old_id: &str, new_id: &str) {
        let Some(clip) = &mut self.clip else {
            return;
        };
        let stale = match &mut clip.item {
            ClipboardItem::Identifiable { handle, snapshot } => {
                if !snapshot.contains(kind, old_id) {
                    return;
                }
                match rename_by_kind(snapshot, kind, old_id, new_id) {
                    Ok(_) => {
                        if handle.kind == kind && handle.id == old_id {
                            handle.id = new_id.to_string();
                        }
                        false
                    }
                    Err(e) => {
                        debug!("Dropping clipboard content after rename of {}: {}", old_id, e);
                        true
                    }
                }
            }
            ClipboardItem::Element { origin, .. } => {
                if kind == IdentifiableKind::Submodel && origin.submodel_id == old_id {
                    origin.submodel_id = new_id.to_string();
                }
                false
            }
        };
        if stale {
            self.clip = None;
        }
    }

    /// Paste the buffered element below `parent_path` of submodel
    /// `submodel_id`. An empty parent path pastes at the submodel root.
    ///
    /// The idShort is made unique among the new siblings by appending a
    /// number; an element without one, as copied out of a list, is named
    /// after its model type. Inside a list the element is appended without
    /// an idShort check.
    pub fn paste_element<S: AsRef<str>>(
        &mut self,
        dest: &mut Environment,
        submodel_id: &str,
        parent_path: &[S],
    ) -> Result<ElementPaste> {
        let Some(Clip {
            item: ClipboardItem::Element { origin, element },
            is_cut,
        }) = &self.clip
        else {
            return Err(AasxError::invalid_input("Clipboard holds no submodel element"));
        };
        let parent_path: Vec<String> = parent_path.iter().map(|s| s.as_ref().to_string()).collect();

        let detached = if *is_cut {
            detach_element(dest, origin)?
        } else {
            None
        };

        match insert_element(dest, submodel_id, &parent_path, element.clone()) {
            Ok(path) => {
                let removed_origin = detached.map(|_| origin.clone());
                if *is_cut {
                    info!(
                        "Moved element {} of {} to {} of {}",
                        origin.path.join("/"),
                        origin.submodel_id,
                        path.join("/"),
                        submodel_id
                    );
                    self.clip = None;
                }
                Ok(ElementPaste {
                    submodel_id: submodel_id.to_string(),
                    path,
                    removed_origin,
                })
            }
            Err(e) => {
                if let Some((index, element)) = detached {
                    restore_element(dest, origin, index, element)?;
                }
                Err(e)
            }
        }
    }
}

/// Copy of the identifiable plus what a recursive paste may reach.
fn snapshot(env: &Environment, handle: &IdentifiableHandle) -> Result<Environment> {
    let mut snapshot = Environment::new();
    match handle.kind {
        IdentifiableKind::Shell => {
            let shell = find::<AssetAdministrationShell>(env, &handle.id)?;
            for submodel_id in shell.submodel_ids() {
                if let Some(submodel) = env.submodels().find_by_id(&submodel_id) {
                    add_once(&mut snapshot, submodel)?;
                    add_concept_descriptions(&mut snapshot, env, submodel)?;
                }
            }
            add_concept_descriptions(&mut snapshot, env, shell)?;
            add_once(&mut snapshot, shell)?;
        }
        IdentifiableKind::Submodel => {
            let submodel = find::<Submodel>(env, &handle.id)?;
            add_concept_descriptions(&mut snapshot, env, submodel)?;
            add_once(&mut snapshot, submodel)?;
        }
        IdentifiableKind::ConceptDescription => {
            let cd = find::<ConceptDescription>(env, &handle.id)?;
            add_concept_descriptions(&mut snapshot, env, cd)?;
            add_once(&mut snapshot, cd)?;
        }
    }
    Ok(snapshot)
}

fn find<'e, T: Identifiable>(env: &'e Environment, id: &str) -> Result<&'e T> {
    T::store(env)
        .find_by_id(id)
        .ok_or_else(|| AasxError::not_found(T::KIND.as_str(), id))
}

fn add_once<T: Identifiable>(snapshot: &mut Environment, item: &T) -> Result<()> {
    let store = T::store_mut(snapshot);
    if !store.contains(item.id()) {
        store.add(item.clone())?;
    }
    Ok(())
}

fn add_concept_descriptions<R: ReferenceBearing>(
    snapshot: &mut Environment,
    env: &Environment,
    item: &R,
) -> Result<()> {
    let mut ids: Vec<String> = Vec::new();
    item.for_each_reference(|_, reference| {
        if let Some(value) = reference.first_value() {
            if env.concept_descriptions().contains(value) && !ids.iter().any(|id| id == value) {
                ids.push(value.to_string());
            }
        }
    });
    for id in ids {
        if let Some(cd) = env.concept_descriptions().find_by_id(&id) {
            add_once(snapshot, cd)?;
        }
    }
    Ok(())
}

/// A cut identifiable taken out of its store, with what is needed to put it
/// back.
enum Detached {
    Shell(usize, AssetAdministrationShell, Option<SideInfo>),
    Submodel(usize, Submodel, Option<SideInfo>),
    ConceptDescription(usize, ConceptDescription, Option<SideInfo>),
}

impl Detached {
    fn into_side_info(self) -> Option<SideInfo> {
        match self {
            Self::Shell(_, _, info) | Self::Submodel(_, _, info) | Self::ConceptDescription(_, _, info) => {
                info
            }
        }
    }

    fn restore(self, env: &mut Environment) -> Result<()> {
        match self {
            Self::Shell(index, item, info) => reinsert(env, index, item, info),
            Self::Submodel(index, item, info) => reinsert(env, index, item, info),
            Self::ConceptDescription(index, item, info) => reinsert(env, index, item, info),
        }
    }
}

fn reinsert<T: Identifiable>(
    env: &mut Environment,
    index: usize,
    item: T,
    info: Option<SideInfo>,
) -> Result<()> {
    let store = T::store_mut(env);
    store.insert(index, item)?;
    if let Some(info) = info {
        store.set_side_info(info);
    }
    Ok(())
}

fn take<T: Identifiable>(env: &mut Environment, id: &str) -> Result<Option<(usize, T, Option<SideInfo>)>> {
    let store = T::store_mut(env);
    let Some(index) = store.index_of(id) else {
        return Ok(None);
    };
    let info = store.take_side_info(id);
    let item = store.remove(id)?;
    Ok(Some((index, item, info)))
}

fn detach(env: &mut Environment, handle: &IdentifiableHandle) -> Result<Option<Detached>> {
    Ok(match handle.kind {
        IdentifiableKind::Shell => take(env, &handle.id)?
            .map(|(index, item, info)| Detached::Shell(index, item, info)),
        IdentifiableKind::Submodel => take(env, &handle.id)?
            .map(|(index, item, info)| Detached::Submodel(index, item, info)),
        IdentifiableKind::ConceptDescription => take(env, &handle.id)?
            .map(|(index, item, info)| Detached::ConceptDescription(index, item, info)),
    })
}

fn split_path(path: &[String]) -> Result<(&String, &[String])> {
    path.split_last()
        .ok_or_else(|| AasxError::invalid_input("Element path must not be empty"))
}

fn detach_element(env: &mut Environment, origin: &ElementOrigin) -> Result<Option<(usize, SubmodelElement)>> {
    match take_element(env, &origin.submodel_id, &origin.path) {
        Ok(detached) => Ok(Some(detached)),
        Err(e) if e.is_not_found() => {
            debug!("Cut origin {} is gone, pasting as copy", origin.path.join("/"));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn restore_element(
    env: &mut Environment,
    origin: &ElementOrigin,
    index: usize,
    element: SubmodelElement,
) -> Result<()> {
    let (_, parent) = split_path(&origin.path)?;
    let container = env
        .submodels_mut()
        .find_by_id_mut(&origin.submodel_id)
        .and_then(|submodel| submodel.container_mut(parent))
        .ok_or_else(|| AasxError::not_found("SubmodelElement", parent.join("/")))?;
    let index = index.min(container.len());
    container.insert(index, element);
    Ok(())
}

fn insert_element(
    env: &mut Environment,
    submodel_id: &str,
    parent_path: &[String],
    mut element: SubmodelElement,
) -> Result<Vec<String>> {
    let submodel = env
        .submodels_mut()
        .find_by_id_mut(submodel_id)
        .ok_or_else(|| AasxError::not_found("Submodel", submodel_id))?;

    let parent_is_list = !parent_path.is_empty()
        && submodel
            .element_by_path(parent_path)
            .ok_or_else(|| AasxError::not_found("SubmodelElement", parent_path.join("/")))?
            .is_list();

    let container = submodel.container_mut(parent_path).ok_or_else(|| {
        AasxError::invalid_input(format!(
            "{} cannot hold pasted elements",
            parent_path.join("/")
        ))
    })?;

    let mut path = parent_path.to_vec();
    if parent_is_list {
        path.push(container.len().to_string());
    } else {
        if element.id_short.is_empty() {
            element.id_short = element.key_type().as_str().to_string();
        }
        element.id_short = unique_id_short(&element.id_short, container);
        path.push(element.id_short.clone());
    }
    container.push(element);
    Ok(path)
}

/// `base` if free among `siblings`, else `base` with the first free number
/// appended.
fn unique_id_short(base: &str, siblings: &[SubmodelElement]) -> String {
    let taken = |candidate: &str| siblings.iter().any(|s| s.id_short == candidate);
    if !taken(base) {
        return base.to_string();
    }
    let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
    let stem = if stem.is_empty() { base } else { stem };
    (1..)
        .map(|n| format!("{}{}", stem, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id_short() {
        let siblings = vec![
            SubmodelElement::property("Serial", "1"),
            SubmodelElement::property("Serial1", "2"),
        ];
        assert_eq!(unique_id_short("Weight", &siblings), "Weight");
        assert_eq!(unique_id_short("Serial", &siblings), "Serial2");
        assert_eq!(unique_id_short("Serial1", &siblings), "Serial2");
    }

    #[test]
    fn test_list_item_gets_id_short_outside_list() {
        let mut env = Environment::new();
        env.submodels_mut()
            .add(
                Submodel::new("sm-1", "Data")
                    .with_element(SubmodelElement::property("Property", "0"))
                    .with_element(SubmodelElement::list(
                        "Readings",
                        aasx_core::model::KeyType::Property,
                        vec![SubmodelElement::property("", "7")],
                    )),
            )
            .unwrap();

        let mut buffer = CopyPasteBuffer::new();
        buffer.copy_element(&env, "sm-1", &["Readings", "0"]).unwrap();
        let outside = buffer.paste_element(&mut env, "sm-1", &[] as &[&str]).unwrap();
        let inside = buffer.paste_element(&mut env, "sm-1", &["Readings"]).unwrap();

        assert_eq!(outside.path, vec!["Property1"]);
        assert_eq!(inside.path, vec!["Readings", "1"]);
        let submodel = env.submodels().find_by_id("sm-1").unwrap();
        assert_eq!(submodel.element_by_path(&["Property1"]).unwrap().id_short, "Property1");
        assert_eq!(submodel.element_by_path(&["Readings", "1"]).unwrap().id_short, "");
    }

    #[test]
    fn test_paste_without_content() {
        let mut buffer = CopyPasteBuffer::new();
        let mut env = Environment::new();
        assert!(buffer
            .paste_identifiable(&CloneEngine::default(), &mut env, CloneOptions::default())
            .is_err());
        assert!(buffer.paste_element(&mut env, "sm-1", &[] as &[&str]).is_err());
    }

    #[test]
    fn test_copied_element_pastes_repeatedly() {
        let mut env = Environment::new();
        env.submodels_mut()
            .add(Submodel::new("sm-1", "Data").with_element(SubmodelElement::property("Serial", "A1")))
            .unwrap();

        let mut buffer = CopyPasteBuffer::new();
        buffer.copy_element(&env, "sm-1", &["Serial"]).unwrap();
        let first = buffer.paste_element(&mut env, "sm-1", &[] as &[&str]).unwrap();
        let second = buffer.paste_element(&mut env, "sm-1", &[] as &[&str]).unwrap();

        assert_eq!(first.path, vec!["Serial1"]);
        assert_eq!(second.path, vec!["Serial2"]);
        assert!(!buffer.is_empty());
        assert_eq!(env.submodels().find_by_id("sm-1").unwrap().submodel_elements.len(), 3);
    }
}
