//! Ordered, id-keyed store for one identifiable kind.
//!
//! Insertion order is kept for display and manual reordering; lookups are
//! always by identifier. Each entry may carry a [`SideInfo`] recording that
//! the content is a stub of a remote repository entry.

use crate::error::{AasxError, Result};
use crate::model::Identifiable;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// How much of a remotely owned identifiable is resident locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StubLevel {
    /// Local content, no remote authority
    #[default]
    NotAStub,
    /// Only the identifier is known
    IdOnly,
    /// Header data loaded, element tree incomplete
    Partial,
    /// Fully loaded from the remote endpoint
    Full,
}

/// Remote bookkeeping for an identifiable populated from a repository or
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideInfo {
    pub id: String,
    pub id_short: Option<String>,
    pub stub_level: StubLevel,
    /// Endpoint the entry was fetched from
    pub queried_endpoint: Option<String>,
    /// Endpoint the entry should be addressed at; differs from the queried
    /// one after a remote rename
    pub designated_endpoint: Option<String>,
}

impl SideInfo {
    pub fn new(id: impl Into<String>, stub_level: StubLevel) -> Self {
        Self {
            id: id.into(),
            id_short: None,
            stub_level,
            queried_endpoint: None,
            designated_endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.queried_endpoint = Some(endpoint.clone());
        self.designated_endpoint = Some(endpoint);
        self
    }

    /// Endpoint to target for mirrored operations.
    pub fn endpoint(&self) -> Option<&str> {
        self.designated_endpoint
            .as_deref()
            .or(self.queried_endpoint.as_deref())
    }

    /// Whether local changes to this entry should be offered for mirroring.
    pub fn is_remote_mirrored(&self) -> bool {
        self.stub_level >= StubLevel::IdOnly && self.endpoint().is_some()
    }
}

/// Ordered collection of identifiables of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifiableStore<T> {
    items: Vec<T>,
    #[serde(skip)]
    side_info: HashMap<String, SideInfo>,
}

impl<T> Default for IdentifiableStore<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            side_info: HashMap::new(),
        }
    }
}

impl<T: Identifiable> IdentifiableStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Mutable iteration. Callers must not change identifiers through it;
    /// use the rename engine for that.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(|item| item.id())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Append an identifiable.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` when the identifier is already present and
    /// `InvalidInput` when it is empty.
    pub fn add(&mut self, item: T) -> Result<()> {
        let index = self.items.len();
        self.insert(index, item)
    }

    /// Insert an identifiable at a position (clamped to the end).
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        self.check_new_id(item.id(), None)?;
        let index = index.min(self.items.len());
        debug!("Adding {} {} at index {}", T::KIND, item.id(), index);
        self.items.insert(index, item);
        Ok(())
    }

    /// Remove an identifiable by id, dropping its side info.
    pub fn remove(&mut self, id: &str) -> Result<T> {
        let index = self
            .index_of(id)
            .ok_or_else(|| AasxError::not_found(T::KIND.as_str(), id))?;
        self.side_info.remove(id);
        debug!("Removing {} {}", T::KIND, id);
        Ok(self.items.remove(index))
    }

    /// Replace the entry at `index`, returning the previous value.
    ///
    /// # Errors
    ///
    /// Fails when the index is out of range or the new value's identifier
    /// collides with a different entry.
    pub fn update(&mut self, index: usize, value: T) -> Result<T> {
        if index >= self.items.len() {
            return Err(AasxError::invalid_input(format!(
                "{} index {} out of range (len {})",
                T::KIND,
                index,
                self.items.len()
            )));
        }
        self.check_new_id(value.id(), Some(index))?;
        let old = std::mem::replace(&mut self.items[index], value);
        if old.id() != self.items[index].id() {
            let new_id = self.items[index].id().to_string();
            self.rekey_side_info(old.id(), &new_id);
        }
        Ok(old)
    }

    /// Move an entry one position towards the front. Returns the new index.
    pub fn move_up(&mut self, id: &str) -> Result<usize> {
        let index = self.require_index(id)?;
        let target = index.saturating_sub(1);
        self.items.swap(index, target);
        Ok(target)
    }

    /// Move an entry one position towards the back. Returns the new index.
    pub fn move_down(&mut self, id: &str) -> Result<usize> {
        let index = self.require_index(id)?;
        let target = (index + 1).min(self.items.len() - 1);
        self.items.swap(index, target);
        Ok(target)
    }

    /// Move an entry to a position (clamped). Returns the new index.
    pub fn move_to(&mut self, id: &str, target: usize) -> Result<usize> {
        let index = self.require_index(id)?;
        let item = self.items.remove(index);
        let target = target.min(self.items.len());
        self.items.insert(target, item);
        Ok(target)
    }

    /// Identifiers held by more than one entry. Pre-existing duplicates are
    /// reported, never repaired.
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for id in self.ids() {
            if !seen.insert(id) && !duplicates.iter().any(|d: &String| d == id) {
                duplicates.push(id.to_string());
            }
        }
        duplicates
    }

    pub fn side_info(&self, id: &str) -> Option<&SideInfo> {
        self.side_info.get(id)
    }

    pub fn side_info_mut(&mut self, id: &str) -> Option<&mut SideInfo> {
        self.side_info.get_mut(id)
    }

    pub fn set_side_info(&mut self, info: SideInfo) {
        self.side_info.insert(info.id.clone(), info);
    }

    pub fn take_side_info(&mut self, id: &str) -> Option<SideInfo> {
        self.side_info.remove(id)
    }

    /// Move side info to a new identifier after a rename.
    pub fn rekey_side_info(&mut self, old_id: &str, new_id: &str) {
        if let Some(mut info) = self.side_info.remove(old_id) {
            info.id = new_id.to_string();
            self.side_info.insert(new_id.to_string(), info);
        }
    }

    fn require_index(&self, id: &str) -> Result<usize> {
        self.index_of(id)
            .ok_or_else(|| AasxError::not_found(T::KIND.as_str(), id))
    }

    fn check_new_id(&self, id: &str, replacing: Option<usize>) -> Result<()> {
        if id.trim().is_empty() {
            return Err(AasxError::invalid_input(format!(
                "{} identifier must not be empty",
                T::KIND
            )));
        }
        let collides = self
            .items
            .iter()
            .enumerate()
            .any(|(index, item)| Some(index) != replacing && item.id() == id);
        if collides {
            return Err(AasxError::duplicate_id(T::KIND.as_str(), id));
        }
        Ok(())
    }
}

impl<'a, T> IntoIterator for &'a IdentifiableStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Identifiable> FromIterator<T> for IdentifiableStore<T> {
    /// Collects without duplicate checks, mirroring deserialization.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            side_info: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Submodel;

    fn store() -> IdentifiableStore<Submodel> {
        let mut store = IdentifiableStore::new();
        store.add(Submodel::new("sm-1", "One")).unwrap();
        store.add(Submodel::new("sm-2", "Two")).unwrap();
        store.add(Submodel::new("sm-3", "Three")).unwrap();
        store
    }

    #[test]
    fn test_add_rejects_duplicates_and_empty_ids() {
        let mut store = store();
        let err = store.add(Submodel::new("sm-2", "Again")).unwrap_err();
        assert!(err.is_duplicate_id());
        assert!(store.add(Submodel::new("  ", "Blank")).is_err());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_index_and_lookup() {
        let store = store();
        assert_eq!(store.index_of("sm-2"), Some(1));
        assert_eq!(store.index_of("sm-9"), None);
        assert_eq!(store.find_by_id("sm-3").unwrap().id_short.as_deref(), Some("Three"));
    }

    #[test]
    fn test_reordering() {
        let mut store = store();
        assert_eq!(store.move_up("sm-3").unwrap(), 1);
        assert_eq!(store.move_up("sm-1").unwrap(), 0);
        assert_eq!(store.move_down("sm-1").unwrap(), 1);
        assert_eq!(store.move_to("sm-2", 99).unwrap(), 2);
        let ids: Vec<_> = store.ids().collect();
        assert_eq!(ids, vec!["sm-3", "sm-1", "sm-2"]);
    }

    #[test]
    fn test_update_rejects_collision_with_other_entry() {
        let mut store = store();
        assert!(store.update(0, Submodel::new("sm-2", "Clash")).is_err());
        let old = store.update(0, Submodel::new("sm-1", "Renamed")).unwrap();
        assert_eq!(old.id_short.as_deref(), Some("One"));
        assert!(store.update(7, Submodel::new("sm-7", "Out")).is_err());
    }

    #[test]
    fn test_side_info_follows_identifier() {
        let mut store = store();
        store.set_side_info(SideInfo::new("sm-1", StubLevel::IdOnly).with_endpoint("http://repo"));
        store.rekey_side_info("sm-1", "sm-100");
        assert!(store.side_info("sm-1").is_none());
        assert_eq!(store.side_info("sm-100").unwrap().id, "sm-100");

        store.set_side_info(SideInfo::new("sm-2", StubLevel::Full));
        store.remove("sm-2").unwrap();
        assert!(store.side_info("sm-2").is_none());
    }

    #[test]
    fn test_duplicate_detection() {
        let store: IdentifiableStore<Submodel> = vec![
            Submodel::new("a", "A"),
            Submodel::new("b", "B"),
            Submodel::new("a", "A2"),
            Submodel::new("a", "A3"),
        ]
        .into_iter()
        .collect();
        assert_eq!(store.duplicate_ids(), vec!["a".to_string()]);
    }

    #[test]
    fn test_mirrored_requires_endpoint() {
        let info = SideInfo::new("x", StubLevel::IdOnly);
        assert!(!info.is_remote_mirrored());
        assert!(info.clone().with_endpoint("http://repo").is_remote_mirrored());
        assert!(!SideInfo::new("x", StubLevel::NotAStub)
            .with_endpoint("http://repo")
            .is_remote_mirrored());
    }
}
