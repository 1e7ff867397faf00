//! Keys, references and identifiable handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of a key segment within a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    AssetAdministrationShell,
    Submodel,
    ConceptDescription,
    SubmodelElement,
    Property,
    MultiLanguageProperty,
    Range,
    File,
    Blob,
    ReferenceElement,
    RelationshipElement,
    AnnotatedRelationshipElement,
    SubmodelElementCollection,
    SubmodelElementList,
    Entity,
    Operation,
    BasicEventElement,
    Capability,
    DataElement,
    EventElement,
    GlobalReference,
    FragmentReference,
    Referable,
    Identifiable,
}

impl KeyType {
    /// Whether keys of this type carry a global identifier.
    pub fn is_identifiable(&self) -> bool {
        self.identifiable_kind().is_some()
    }

    /// The store kind addressed by this key type, if any.
    pub fn identifiable_kind(&self) -> Option<IdentifiableKind> {
        match self {
            Self::AssetAdministrationShell => Some(IdentifiableKind::Shell),
            Self::Submodel => Some(IdentifiableKind::Submodel),
            Self::ConceptDescription => Some(IdentifiableKind::ConceptDescription),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssetAdministrationShell => "AssetAdministrationShell",
            Self::Submodel => "Submodel",
            Self::ConceptDescription => "ConceptDescription",
            Self::SubmodelElement => "SubmodelElement",
            Self::Property => "Property",
            Self::MultiLanguageProperty => "MultiLanguageProperty",
            Self::Range => "Range",
            Self::File => "File",
            Self::Blob => "Blob",
            Self::ReferenceElement => "ReferenceElement",
            Self::RelationshipElement => "RelationshipElement",
            Self::AnnotatedRelationshipElement => "AnnotatedRelationshipElement",
            Self::SubmodelElementCollection => "SubmodelElementCollection",
            Self::SubmodelElementList => "SubmodelElementList",
            Self::Entity => "Entity",
            Self::Operation => "Operation",
            Self::BasicEventElement => "BasicEventElement",
            Self::Capability => "Capability",
            Self::DataElement => "DataElement",
            Self::EventElement => "EventElement",
            Self::GlobalReference => "GlobalReference",
            Self::FragmentReference => "FragmentReference",
            Self::Referable => "Referable",
            Self::Identifiable => "Identifiable",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed key segment: an identifier for the first key of a model
/// reference, an idShort (or list index) for the following ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub value: String,
}

impl Key {
    pub fn new(key_type: KeyType, value: impl Into<String>) -> Self {
        Self {
            key_type,
            value: value.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}", self.key_type, self.value)
    }
}

/// Whether a reference navigates the local model or points outside of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceType {
    ModelReference,
    ExternalReference,
}

/// An ordered, non-empty chain of keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(rename = "type")]
    pub reference_type: ReferenceType,
    pub keys: Vec<Key>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referred_semantic_id: Option<Box<Reference>>,
}

impl Reference {
    /// Create a model reference from keys.
    pub fn model(keys: Vec<Key>) -> Self {
        Self {
            reference_type: ReferenceType::ModelReference,
            keys,
            referred_semantic_id: None,
        }
    }

    /// Create a model reference pointing at an identifiable.
    pub fn model_to(kind: IdentifiableKind, id: impl Into<String>) -> Self {
        Self::model(vec![Key::new(kind.key_type(), id)])
    }

    /// Create an external reference with a single global key.
    pub fn external(value: impl Into<String>) -> Self {
        Self {
            reference_type: ReferenceType::ExternalReference,
            keys: vec![Key::new(KeyType::GlobalReference, value)],
            referred_semantic_id: None,
        }
    }

    /// Append a key, builder style.
    pub fn with_key(mut self, key_type: KeyType, value: impl Into<String>) -> Self {
        self.keys.push(Key::new(key_type, value));
        self
    }

    pub fn first_key(&self) -> Option<&Key> {
        self.keys.first()
    }

    pub fn is_model_reference(&self) -> bool {
        self.reference_type == ReferenceType::ModelReference
    }

    /// True when the first key addresses the given identifiable.
    pub fn points_to(&self, kind: IdentifiableKind, id: &str) -> bool {
        self.first_key()
            .is_some_and(|key| key.key_type == kind.key_type() && key.value == id)
    }

    /// The value of the first key, if any.
    pub fn first_value(&self) -> Option<&str> {
        self.first_key().map(|key| key.value.as_str())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, key) in self.keys.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

/// The three identifiable stores of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifiableKind {
    Shell,
    Submodel,
    ConceptDescription,
}

impl IdentifiableKind {
    pub const ALL: [IdentifiableKind; 3] = [Self::Shell, Self::Submodel, Self::ConceptDescription];

    /// Key type used by references to this kind.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Shell => KeyType::AssetAdministrationShell,
            Self::Submodel => KeyType::Submodel,
            Self::ConceptDescription => KeyType::ConceptDescription,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shell => "AssetAdministrationShell",
            Self::Submodel => "Submodel",
            Self::ConceptDescription => "ConceptDescription",
        }
    }
}

impl fmt::Display for IdentifiableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind plus identifier of an identifiable; stable across borrows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifiableHandle {
    pub kind: IdentifiableKind,
    pub id: String,
}

impl IdentifiableHandle {
    pub fn new(kind: IdentifiableKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn shell(id: impl Into<String>) -> Self {
        Self::new(IdentifiableKind::Shell, id)
    }

    pub fn submodel(id: impl Into<String>) -> Self {
        Self::new(IdentifiableKind::Submodel, id)
    }

    pub fn concept_description(id: impl Into<String>) -> Self {
        Self::new(IdentifiableKind::ConceptDescription, id)
    }

    /// Model reference addressing this identifiable.
    pub fn to_reference(&self) -> Reference {
        Reference::model_to(self.kind, self.id.clone())
    }

    pub fn to_key(&self) -> Key {
        Key::new(self.kind.key_type(), self.id.clone())
    }
}

impl fmt::Display for IdentifiableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
