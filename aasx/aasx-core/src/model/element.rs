//! Submodel elements as a closed sum type.
//!
//! Every element shares a header (idShort, semantics, qualifiers, ...) and
//! carries its variant payload in [`ElementKind`]. Code that needs
//! variant-specific behaviour matches on the kind exhaustively.

use super::common::{EmbeddedDataSpecification, Extension, LangString, Qualifier, SpecificAssetId};
use super::key::{KeyType, Reference};
use serde::{Deserialize, Serialize};

/// A referable node inside a submodel, identified by idShort among its
/// siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmodelElement {
    #[serde(default)]
    pub id_short: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<LangString>,
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
    #[serde(flatten)]
    pub kind: ElementKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    #[default]
    SelfManagedEntity,
    CoManagedEntity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Output,
    Input,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateOfEvent {
    #[default]
    On,
    Off,
}

/// Variant payload of a submodel element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modelType", rename_all_fields = "camelCase")]
pub enum ElementKind {
    Property {
        value_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_id: Option<Reference>,
    },
    MultiLanguageProperty {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        value: Vec<LangString>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_id: Option<Reference>,
    },
    Range {
        value_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<String>,
    },
    File {
        content_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Blob {
        content_type: String,
        /// Base64 payload
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    ReferenceElement {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Reference>,
    },
    RelationshipElement {
        first: Reference,
        second: Reference,
    },
    AnnotatedRelationshipElement {
        first: Reference,
        second: Reference,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        annotations: Vec<SubmodelElement>,
    },
    SubmodelElementCollection {
        #[serde(default)]
        value: Vec<SubmodelElement>,
    },
    SubmodelElementList {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order_relevant: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        semantic_id_list_element: Option<Reference>,
        type_value_list_element: KeyType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_type_list_element: Option<String>,
        #[serde(default)]
        value: Vec<SubmodelElement>,
    },
    Entity {
        entity_type: EntityType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        global_asset_id: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        specific_asset_ids: Vec<SpecificAssetId>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        statements: Vec<SubmodelElement>,
    },
    Operation {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        input_variables: Vec<OperationVariable>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        output_variables: Vec<OperationVariable>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        inoutput_variables: Vec<OperationVariable>,
    },
    BasicEventElement {
        observed: Reference,
        direction: Direction,
        state: StateOfEvent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_topic: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_broker: Option<Reference>,
    },
    Capability,
}

/// Operation argument, wrapped as `{"value": {...}}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationVariable {
    pub value: Box<SubmodelElement>,
}

impl OperationVariable {
    pub fn new(value: SubmodelElement) -> Self {
        Self {
            value: Box::new(value),
        }
    }
}

impl ElementKind {
    /// Key type naming this variant inside a reference.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Property { .. } => KeyType::Property,
            Self::MultiLanguageProperty { .. } => KeyType::MultiLanguageProperty,
            Self::Range { .. } => KeyType::Range,
            Self::File { .. } => KeyType::File,
            Self::Blob { .. } => KeyType::Blob,
            Self::ReferenceElement { .. } => KeyType::ReferenceElement,
            Self::RelationshipElement { .. } => KeyType::RelationshipElement,
            Self::AnnotatedRelationshipElement { .. } => KeyType::AnnotatedRelationshipElement,
            Self::SubmodelElementCollection { .. } => KeyType::SubmodelElementCollection,
            Self::SubmodelElementList { .. } => KeyType::SubmodelElementList,
            Self::Entity { .. } => KeyType::Entity,
            Self::Operation { .. } => KeyType::Operation,
            Self::BasicEventElement { .. } => KeyType::BasicEventElement,
            Self::Capability => KeyType::Capability,
        }
    }
}

impl SubmodelElement {
    /// Create an element with an empty header.
    pub fn new(id_short: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id_short: id_short.into(),
            category: None,
            description: Vec::new(),
            semantic_id: None,
            supplemental_semantic_ids: Vec::new(),
            qualifiers: Vec::new(),
            extensions: Vec::new(),
            embedded_data_specifications: Vec::new(),
            kind,
        }
    }

    pub fn property(id_short: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            id_short,
            ElementKind::Property {
                value_type: "xs:string".to_string(),
                value: Some(value.into()),
                value_id: None,
            },
        )
    }

    pub fn file(
        id_short: impl Into<String>,
        content_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(
            id_short,
            ElementKind::File {
                content_type: content_type.into(),
                value: Some(value.into()),
            },
        )
    }

    pub fn reference_element(id_short: impl Into<String>, value: Reference) -> Self {
        Self::new(id_short, ElementKind::ReferenceElement { value: Some(value) })
    }

    pub fn relationship(id_short: impl Into<String>, first: Reference, second: Reference) -> Self {
        Self::new(id_short, ElementKind::RelationshipElement { first, second })
    }

    pub fn collection(id_short: impl Into<String>, value: Vec<SubmodelElement>) -> Self {
        Self::new(id_short, ElementKind::SubmodelElementCollection { value })
    }

    pub fn list(
        id_short: impl Into<String>,
        type_value_list_element: KeyType,
        value: Vec<SubmodelElement>,
    ) -> Self {
        Self::new(
            id_short,
            ElementKind::SubmodelElementList {
                order_relevant: Some(true),
                semantic_id_list_element: None,
                type_value_list_element,
                value_type_list_element: None,
                value,
            },
        )
    }

    pub fn operation(
        id_short: impl Into<String>,
        input_variables: Vec<SubmodelElement>,
        output_variables: Vec<SubmodelElement>,
    ) -> Self {
        Self::new(
            id_short,
            ElementKind::Operation {
                input_variables: input_variables.into_iter().map(OperationVariable::new).collect(),
                output_variables: output_variables.into_iter().map(OperationVariable::new).collect(),
                inoutput_variables: Vec::new(),
            },
        )
    }

    pub fn with_semantic_id(mut self, semantic_id: Reference) -> Self {
        self.semantic_id = Some(semantic_id);
        self
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn key_type(&self) -> KeyType {
        self.kind.key_type()
    }

    /// Direct children, in model order.
    pub fn children(&self) -> Vec<&SubmodelElement> {
        match &self.kind {
            ElementKind::SubmodelElementCollection { value }
            | ElementKind::SubmodelElementList { value, .. } => value.iter().collect(),
            ElementKind::Entity { statements, .. } => statements.iter().collect(),
            ElementKind::AnnotatedRelationshipElement { annotations, .. } => {
                annotations.iter().collect()
            }
            ElementKind::Operation {
                input_variables,
                output_variables,
                inoutput_variables,
            } => input_variables
                .iter()
                .chain(output_variables.iter())
                .chain(inoutput_variables.iter())
                .map(|variable| variable.value.as_ref())
                .collect(),
            ElementKind::Property { .. }
            | ElementKind::MultiLanguageProperty { .. }
            | ElementKind::Range { .. }
            | ElementKind::File { .. }
            | ElementKind::Blob { .. }
            | ElementKind::ReferenceElement { .. }
            | ElementKind::RelationshipElement { .. }
            | ElementKind::BasicEventElement { .. }
            | ElementKind::Capability => Vec::new(),
        }
    }

    /// Direct children, mutably, in model order.
    pub fn children_mut(&mut self) -> Vec<&mut SubmodelElement> {
        match &mut self.kind {
            ElementKind::SubmodelElementCollection { value }
            | ElementKind::SubmodelElementList { value, .. } => value.iter_mut().collect(),
            ElementKind::Entity { statements, .. } => statements.iter_mut().collect(),
            ElementKind::AnnotatedRelationshipElement { annotations, .. } => {
                annotations.iter_mut().collect()
            }
            ElementKind::Operation {
                input_variables,
                output_variables,
                inoutput_variables,
            } => input_variables
                .iter_mut()
                .chain(output_variables.iter_mut())
                .chain(inoutput_variables.iter_mut())
                .map(|variable| variable.value.as_mut())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The single child container that can receive new elements. Operations
    /// hold three variable lists and are not a paste target.
    pub fn child_list_mut(&mut self) -> Option<&mut Vec<SubmodelElement>> {
        match &mut self.kind {
            ElementKind::SubmodelElementCollection { value }
            | ElementKind::SubmodelElementList { value, .. } => Some(value),
            ElementKind::Entity { statements, .. } => Some(statements),
            ElementKind::AnnotatedRelationshipElement { annotations, .. } => Some(annotations),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, ElementKind::SubmodelElementList { .. })
    }

    /// Find a direct child by idShort. Inside a list a numeric segment
    /// addresses the child by position.
    pub fn find_child(&self, segment: &str) -> Option<&SubmodelElement> {
        let children = self.children();
        if self.is_list() {
            if let Ok(index) = segment.parse::<usize>() {
                return children.get(index).copied();
            }
        }
        children.into_iter().find(|child| child.id_short == segment)
    }

    /// Mutable counterpart of [`find_child`](Self::find_child).
    pub fn find_child_mut(&mut self, segment: &str) -> Option<&mut SubmodelElement> {
        let is_list = self.is_list();
        let children = self.children_mut();
        if is_list {
            if let Ok(index) = segment.parse::<usize>() {
                return children.into_iter().nth(index);
            }
        }
        children.into_iter().find(|child| child.id_short == segment)
    }

    /// Pre-order walk over this element and its descendants. The callback
    /// receives the path from the submodel root, this element included;
    /// children of a list are addressed by index.
    pub fn walk<'a, F>(&'a self, path: &mut Vec<String>, f: &mut F)
    where
        F: FnMut(&[String], &'a SubmodelElement),
    {
        self.walk_at(self.id_short.clone(), path, f);
    }

    fn walk_at<'a, F>(&'a self, segment: String, path: &mut Vec<String>, f: &mut F)
    where
        F: FnMut(&[String], &'a SubmodelElement),
    {
        path.push(segment);
        f(path.as_slice(), self);
        let is_list = self.is_list();
        for (index, child) in self.children().into_iter().enumerate() {
            let segment = if is_list {
                index.to_string()
            } else {
                child.id_short.clone()
            };
            child.walk_at(segment, path, f);
        }
        path.pop();
    }
}

/// Pre-order walk over a list of root elements.
pub fn walk_elements<'a, F>(elements: &'a [SubmodelElement], mut f: F)
where
    F: FnMut(&[String], &'a SubmodelElement),
{
    let mut path = Vec::new();
    for element in elements {
        element.walk(&mut path, &mut f);
    }
}

/// Find an element by idShort path below a list of root elements.
pub fn find_by_path<'a, S: AsRef<str>>(
    elements: &'a [SubmodelElement],
    path: &[S],
) -> Option<&'a SubmodelElement> {
    let (first, rest) = path.split_first()?;
    let mut current = elements.iter().find(|e| e.id_short == first.as_ref())?;
    for segment in rest {
        current = current.find_child(segment.as_ref())?;
    }
    Some(current)
}

/// Mutable counterpart of [`find_by_path`].
pub fn find_by_path_mut<'a, S: AsRef<str>>(
    elements: &'a mut [SubmodelElement],
    path: &[S],
) -> Option<&'a mut SubmodelElement> {
    let (first, rest) = path.split_first()?;
    let mut current = elements.iter_mut().find(|e| e.id_short == first.as_ref())?;
    for segment in rest {
        current = current.find_child_mut(segment.as_ref())?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SubmodelElement> {
        vec![
            SubmodelElement::property("Name", "pump"),
            SubmodelElement::collection(
                "Docs",
                vec![SubmodelElement::file("Manual", "application/pdf", "/aasx/manual.pdf")],
            ),
            SubmodelElement::list(
                "Points",
                KeyType::Property,
                vec![
                    SubmodelElement::property("", "1"),
                    SubmodelElement::property("", "2"),
                ],
            ),
        ]
    }

    #[test]
    fn test_find_by_path() {
        let elements = sample();
        let manual = find_by_path(&elements, &["Docs", "Manual"]).unwrap();
        assert_eq!(manual.key_type(), KeyType::File);
        assert!(find_by_path(&elements, &["Docs", "Missing"]).is_none());
        assert!(find_by_path::<&str>(&elements, &[]).is_none());
    }

    #[test]
    fn test_list_children_by_index() {
        let elements = sample();
        let second = find_by_path(&elements, &["Points", "1"]).unwrap();
        match &second.kind {
            ElementKind::Property { value, .. } => assert_eq!(value.as_deref(), Some("2")),
            other => panic!("unexpected kind {:?}", other.key_type()),
        }
    }

    #[test]
    fn test_walk_paths() {
        let elements = sample();
        let mut seen = Vec::new();
        walk_elements(&elements, |path, _| seen.push(path.join("/")));
        assert_eq!(
            seen,
            vec!["Name", "Docs", "Docs/Manual", "Points", "Points/0", "Points/1"]
        );
    }

    #[test]
    fn test_model_type_tag() {
        let element = SubmodelElement::property("Temperature", "21.5");
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["modelType"], "Property");
        assert_eq!(json["idShort"], "Temperature");
        assert_eq!(json["valueType"], "xs:string");

        let back: SubmodelElement = serde_json::from_value(json).unwrap();
        assert_eq!(back, element);
    }
}
