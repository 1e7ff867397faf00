//! In-memory AAS document model.
//!
//! This module provides the typed graph the editing engines operate on:
//! keys and references, the three identifiable kinds and the submodel
//! element sum type.

pub mod common;
pub mod element;
pub mod identifiable;
pub mod key;

pub use common::*;
pub use element::{
    Direction, ElementKind, EntityType, OperationVariable, StateOfEvent, SubmodelElement,
    walk_elements,
};
pub use identifiable::{AssetAdministrationShell, ConceptDescription, Identifiable, Submodel};
pub use key::{IdentifiableHandle, IdentifiableKind, Key, KeyType, Reference, ReferenceType};
