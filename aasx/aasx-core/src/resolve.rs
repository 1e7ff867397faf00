//! Resolution of references to identifiables and submodel elements.

use crate::environment::{Environment, IdentifiableRef};
use crate::model::{
    AssetAdministrationShell, ConceptDescription, KeyType, Reference, Submodel, SubmodelElement,
};
use crate::traverse::ReferenceSite;

/// Target of a resolved reference.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    Shell(&'a AssetAdministrationShell),
    Submodel(&'a Submodel),
    ConceptDescription(&'a ConceptDescription),
    Element {
        submodel: &'a Submodel,
        element: &'a SubmodelElement,
    },
}

impl<'a> Resolved<'a> {
    /// The element, when the reference addressed one.
    pub fn element(&self) -> Option<&'a SubmodelElement> {
        match *self {
            Self::Element { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Nearest enclosing identifiable of the target.
    pub fn identifiable(&self) -> IdentifiableRef<'a> {
        match *self {
            Self::Shell(shell) => IdentifiableRef::Shell(shell),
            Self::Submodel(submodel) | Self::Element { submodel, .. } => {
                IdentifiableRef::Submodel(submodel)
            }
            Self::ConceptDescription(cd) => IdentifiableRef::ConceptDescription(cd),
        }
    }
}

impl Environment {
    /// Resolve a model reference.
    ///
    /// The first key must address an identifiable present in this
    /// environment. Following keys navigate the element tree by idShort (by
    /// index inside lists); a trailing fragment key is ignored. Global
    /// references never resolve.
    pub fn resolve(&self, reference: &Reference) -> Option<Resolved<'_>> {
        let (first, rest) = reference.keys.split_first()?;
        let rest = match rest.split_last() {
            Some((last, head)) if last.key_type == KeyType::FragmentReference => head,
            _ => rest,
        };

        match first.key_type {
            KeyType::AssetAdministrationShell if rest.is_empty() => self
                .asset_administration_shells
                .find_by_id(&first.value)
                .map(Resolved::Shell),
            KeyType::ConceptDescription if rest.is_empty() => self
                .concept_descriptions
                .find_by_id(&first.value)
                .map(Resolved::ConceptDescription),
            KeyType::Submodel => {
                let submodel = self.submodels.find_by_id(&first.value)?;
                if rest.is_empty() {
                    return Some(Resolved::Submodel(submodel));
                }
                let path: Vec<&str> = rest.iter().map(|key| key.value.as_str()).collect();
                let element = submodel.element_by_path(&path)?;
                Some(Resolved::Element { submodel, element })
            }
            _ => None,
        }
    }

    /// Resolve a reference down to a submodel element.
    pub fn find_referable(&self, reference: &Reference) -> Option<&SubmodelElement> {
        self.resolve(reference)?.element()
    }

    /// Owning identifiable of a reference site.
    pub fn parent_first_identifiable(&self, site: &ReferenceSite) -> Option<IdentifiableRef<'_>> {
        self.find_identifiable(&site.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IdentifiableKind, SubmodelElement};

    fn env() -> Environment {
        let mut env = Environment::new();
        env.submodels_mut()
            .add(
                Submodel::new("sm-1", "TechnicalData").with_element(SubmodelElement::collection(
                    "General",
                    vec![SubmodelElement::property("Weight", "12")],
                )),
            )
            .unwrap();
        env.concept_descriptions_mut()
            .add(ConceptDescription::new("cd-1", "Weight"))
            .unwrap();
        env
    }

    #[test]
    fn test_resolve_element_path() {
        let env = env();
        let reference = Reference::model_to(IdentifiableKind::Submodel, "sm-1")
            .with_key(KeyType::SubmodelElementCollection, "General")
            .with_key(KeyType::Property, "Weight");
        let element = env.find_referable(&reference).unwrap();
        assert_eq!(element.id_short, "Weight");
    }

    #[test]
    fn test_trailing_fragment_is_ignored() {
        let env = env();
        let reference = Reference::model_to(IdentifiableKind::Submodel, "sm-1")
            .with_key(KeyType::FragmentReference, "page=3");
        assert!(matches!(env.resolve(&reference), Some(Resolved::Submodel(_))));
    }

    #[test]
    fn test_unresolvable_references() {
        let env = env();
        assert!(env.resolve(&Reference::external("cd-1")).is_none());
        assert!(env
            .resolve(&Reference::model_to(IdentifiableKind::Submodel, "sm-404"))
            .is_none());
        let into_cd = Reference::model_to(IdentifiableKind::ConceptDescription, "cd-1")
            .with_key(KeyType::Property, "x");
        assert!(env.resolve(&into_cd).is_none());
    }
}
