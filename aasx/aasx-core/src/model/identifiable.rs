//! Shells, submodels and concept descriptions.

use super::common::{
    AdministrativeInformation, AssetInformation, EmbeddedDataSpecification, Extension, LangString,
    ModellingKind, Qualifier,
};
use super::element::{self, SubmodelElement};
use super::key::{IdentifiableHandle, IdentifiableKind, Reference};
use crate::environment::Environment;
use crate::store::IdentifiableStore;
use crate::traverse::ReferenceBearing;
use serde::{Deserialize, Serialize};

/// An entity with a globally unique identifier, owned by exactly one store.
pub trait Identifiable: Clone + ReferenceBearing {
    /// Store kind holding values of this type.
    const KIND: IdentifiableKind;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn id_short(&self) -> Option<&str>;

    /// Minimal value carrying only an identifier, used for remote stubs.
    fn stub(id: String) -> Self;

    fn store(env: &Environment) -> &IdentifiableStore<Self>;

    fn store_mut(env: &mut Environment) -> &mut IdentifiableStore<Self>;

    fn handle(&self) -> IdentifiableHandle {
        IdentifiableHandle::new(Self::KIND, self.id())
    }

    /// Model reference addressing this identifiable.
    fn to_reference(&self) -> Reference {
        Reference::model_to(Self::KIND, self.id())
    }
}

/// An Asset Administration Shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAdministrationShell {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_short: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administration: Option<AdministrativeInformation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<Reference>,
    #[serde(default)]
    pub asset_information: AssetInformation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submodels: Vec<Reference>,
}

impl AssetAdministrationShell {
    pub fn new(id: impl Into<String>, id_short: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_short: Some(id_short.into()),
            description: Vec::new(),
            administration: None,
            extensions: Vec::new(),
            embedded_data_specifications: Vec::new(),
            derived_from: None,
            asset_information: AssetInformation::default(),
            submodels: Vec::new(),
        }
    }

    /// Add a model reference to a submodel unless an equal one exists.
    pub fn add_submodel_ref(&mut self, submodel_id: &str) -> bool {
        if self.references_submodel(submodel_id) {
            return false;
        }
        self.submodels
            .push(Reference::model_to(IdentifiableKind::Submodel, submodel_id));
        true
    }

    pub fn references_submodel(&self, submodel_id: &str) -> bool {
        self.submodels
            .iter()
            .any(|r| r.points_to(IdentifiableKind::Submodel, submodel_id))
    }

    /// Ids of the submodels referenced by this shell, in order.
    pub fn submodel_ids(&self) -> Vec<String> {
        self.submodels
            .iter()
            .filter_map(|r| {
                let key = r.first_key()?;
                (key.key_type == IdentifiableKind::Submodel.key_type()).then(|| key.value.clone())
            })
            .collect()
    }
}

/// A submodel and its element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submodel {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_short: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administration: Option<AdministrativeInformation>,
    #[serde(default)]
    pub kind: ModellingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_id: Option<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supplemental_semantic_ids: Vec<Reference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub submodel_elements: Vec<SubmodelElement>,
}

impl Submodel {
    pub fn new(id: impl Into<String>, id_short: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_short: Some(id_short.into()),
            description: Vec::new(),
            administration: None,
            kind: ModellingKind::Instance,
            semantic_id: None,
            supplemental_semantic_ids: Vec::new(),
            qualifiers: Vec::new(),
            extensions: Vec::new(),
            embedded_data_specifications: Vec::new(),
            submodel_elements: Vec::new(),
        }
    }

    pub fn with_semantic_id(mut self, semantic_id: Reference) -> Self {
        self.semantic_id = Some(semantic_id);
        self
    }

    pub fn with_element(mut self, element: SubmodelElement) -> Self {
        self.submodel_elements.push(element);
        self
    }

    pub fn element_by_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&SubmodelElement> {
        element::find_by_path(&self.submodel_elements, path)
    }

    pub fn element_by_path_mut<S: AsRef<str>>(
        &mut self,
        path: &[S],
    ) -> Option<&mut SubmodelElement> {
        element::find_by_path_mut(&mut self.submodel_elements, path)
    }

    /// The element list at `parent_path`: the submodel root for an empty
    /// path, otherwise the child container of the addressed element.
    pub fn container_mut<S: AsRef<str>>(
        &mut self,
        parent_path: &[S],
    ) -> Option<&mut Vec<SubmodelElement>> {
        if parent_path.is_empty() {
            return Some(&mut self.submodel_elements);
        }
        self.element_by_path_mut(parent_path)?.child_list_mut()
    }

    /// idShorts of the children at `parent_path`.
    pub fn sibling_id_shorts<S: AsRef<str>>(&self, parent_path: &[S]) -> Option<Vec<String>> {
        if parent_path.is_empty() {
            return Some(
                self.submodel_elements
                    .iter()
                    .map(|e| e.id_short.clone())
                    .collect(),
            );
        }
        let parent = self.element_by_path(parent_path)?;
        Some(
            parent
                .children()
                .into_iter()
                .map(|e| e.id_short.clone())
                .collect(),
        )
    }
}

/// Semantic definition referenced by semantic ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptDescription {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_short: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administration: Option<AdministrativeInformation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub is_case_of: Vec<Reference>,
}

impl ConceptDescription {
    pub fn new(id: impl Into<String>, id_short: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            id_short: Some(id_short.into()),
            description: Vec::new(),
            administration: None,
            extensions: Vec::new(),
            embedded_data_specifications: Vec::new(),
            is_case_of: Vec::new(),
        }
    }
}

impl Identifiable for AssetAdministrationShell {
    const KIND: IdentifiableKind = IdentifiableKind::Shell;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn id_short(&self) -> Option<&str> {
        self.id_short.as_deref()
    }

    fn stub(id: String) -> Self {
        let mut shell = Self::new(id, "");
        shell.id_short = None;
        shell
    }

    fn store(env: &Environment) -> &IdentifiableStore<Self> {
        &env.asset_administration_shells
    }

    fn store_mut(env: &mut Environment) -> &mut IdentifiableStore<Self> {
        &mut env.asset_administration_shells
    }
}

impl Identifiable for Submodel {
    const KIND: IdentifiableKind = IdentifiableKind::Submodel;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn id_short(&self) -> Option<&str> {
        self.id_short.as_deref()
    }

    fn stub(id: String) -> Self {
        let mut submodel = Self::new(id, "");
        submodel.id_short = None;
        submodel
    }

    fn store(env: &Environment) -> &IdentifiableStore<Self> {
        &env.submodels
    }

    fn store_mut(env: &mut Environment) -> &mut IdentifiableStore<Self> {
        &mut env.submodels
    }
}

impl Identifiable for ConceptDescription {
    const KIND: IdentifiableKind = IdentifiableKind::ConceptDescription;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn id_short(&self) -> Option<&str> {
        self.id_short.as_deref()
    }

    fn stub(id: String) -> Self {
        let mut cd = Self::new(id, "");
        cd.id_short = None;
        cd
    }

    fn store(env: &Environment) -> &IdentifiableStore<Self> {
        &env.concept_descriptions
    }

    fn store_mut(env: &mut Environment) -> &mut IdentifiableStore<Self> {
        &mut env.concept_descriptions
    }
}
