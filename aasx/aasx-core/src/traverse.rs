//! Exhaustive traversal of every reference held by the document model.
//!
//! Each visited reference is reported together with its [`ReferenceSite`]:
//! the owning identifiable and the idShort path of the referable holding
//! it. Nested `referred_semantic_id` chains are visited as well.

use crate::environment::Environment;
use crate::model::{
    AdministrativeInformation, AssetAdministrationShell, ConceptDescription, ElementKind,
    EmbeddedDataSpecification, Extension, IdentifiableHandle, IdentifiableKind, Identifiable,
    OperationVariable, Qualifier, Reference, SpecificAssetId, Submodel, SubmodelElement,
};

/// Location of a reference inside an environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceSite {
    /// Nearest enclosing identifiable
    pub owner: IdentifiableHandle,
    /// idShort path of the holding element; empty when the identifiable
    /// holds the reference itself
    pub path: Vec<String>,
}

impl ReferenceSite {
    pub fn root(owner: IdentifiableHandle) -> Self {
        Self {
            owner,
            path: Vec::new(),
        }
    }

    pub fn is_identifiable_level(&self) -> bool {
        self.path.is_empty()
    }
}

/// Types that hold references somewhere in their structure.
pub trait ReferenceBearing {
    fn for_each_reference<F>(&self, f: F)
    where
        F: FnMut(&ReferenceSite, &Reference);

    fn for_each_reference_mut<F>(&mut self, f: F)
    where
        F: FnMut(&ReferenceSite, &mut Reference);
}

// One walker body, instantiated for shared and exclusive access.
macro_rules! reference_walker {
    ($walker:ident, { $($m:tt)* }) => {
        struct $walker<'f, F> {
            site: ReferenceSite,
            f: &'f mut F,
        }

        impl<F> $walker<'_, F>
        where
            F: FnMut(&ReferenceSite, & $($m)* Reference),
        {
            fn reference(&mut self, reference: & $($m)* Reference) {
                (self.f)(&self.site, reference);
                if let Some(inner) = & $($m)* reference.referred_semantic_id {
                    self.reference(inner);
                }
            }

            fn optional(&mut self, reference: & $($m)* Option<Reference>) {
                if let Some(reference) = reference {
                    self.reference(reference);
                }
            }

            fn many(&mut self, references: & $($m)* Vec<Reference>) {
                for reference in references {
                    self.reference(reference);
                }
            }

            fn qualifiers(&mut self, qualifiers: & $($m)* Vec<Qualifier>) {
                for qualifier in qualifiers {
                    self.optional(& $($m)* qualifier.semantic_id);
                    self.many(& $($m)* qualifier.supplemental_semantic_ids);
                    self.optional(& $($m)* qualifier.value_id);
                }
            }

            fn extensions(&mut self, extensions: & $($m)* Vec<Extension>) {
                for extension in extensions {
                    self.optional(& $($m)* extension.semantic_id);
                    self.many(& $($m)* extension.supplemental_semantic_ids);
                    self.many(& $($m)* extension.refers_to);
                }
            }

            fn data_specifications(&mut self, specs: & $($m)* Vec<EmbeddedDataSpecification>) {
                for spec in specs {
                    self.reference(& $($m)* spec.data_specification);
                }
            }

            fn administration(&mut self, administration: & $($m)* Option<AdministrativeInformation>) {
                if let Some(administration) = administration {
                    self.optional(& $($m)* administration.creator);
                    self.data_specifications(& $($m)* administration.embedded_data_specifications);
                }
            }

            fn specific_asset_ids(&mut self, ids: & $($m)* Vec<SpecificAssetId>) {
                for id in ids {
                    self.optional(& $($m)* id.external_subject_id);
                    self.optional(& $($m)* id.semantic_id);
                }
            }

            fn elements(&mut self, elements: & $($m)* Vec<SubmodelElement>) {
                for element in elements {
                    let segment = element.id_short.clone();
                    self.element(element, segment);
                }
            }

            fn variables(&mut self, variables: & $($m)* Vec<OperationVariable>) {
                for variable in variables {
                    let segment = variable.value.id_short.clone();
                    self.element(& $($m)* variable.value, segment);
                }
            }

            fn element(&mut self, element: & $($m)* SubmodelElement, segment: String) {
                self.site.path.push(segment);
                self.optional(& $($m)* element.semantic_id);
                self.many(& $($m)* element.supplemental_semantic_ids);
                self.qualifiers(& $($m)* element.qualifiers);
                self.extensions(& $($m)* element.extensions);
                self.data_specifications(& $($m)* element.embedded_data_specifications);
                match & $($m)* element.kind {
                    ElementKind::Property { value_id, .. }
                    | ElementKind::MultiLanguageProperty { value_id, .. } => {
                        self.optional(value_id);
                    }
                    ElementKind::ReferenceElement { value } => self.optional(value),
                    ElementKind::RelationshipElement { first, second } => {
                        self.reference(first);
                        self.reference(second);
                    }
                    ElementKind::AnnotatedRelationshipElement { first, second, annotations } => {
                        self.reference(first);
                        self.reference(second);
                        self.elements(annotations);
                    }
                    ElementKind::SubmodelElementCollection { value } => self.elements(value),
                    ElementKind::SubmodelElementList { semantic_id_list_element, value, .. } => {
                        self.optional(semantic_id_list_element);
                        for (index, child) in value.into_iter().enumerate() {
                            self.element(child, index.to_string());
                        }
                    }
                    ElementKind::Entity { specific_asset_ids, statements, .. } => {
                        self.specific_asset_ids(specific_asset_ids);
                        self.elements(statements);
                    }
                    ElementKind::Operation {
                        input_variables,
                        output_variables,
                        inoutput_variables,
                    } => {
                        self.variables(input_variables);
                        self.variables(output_variables);
                        self.variables(inoutput_variables);
                    }
                    ElementKind::BasicEventElement { observed, message_broker, .. } => {
                        self.reference(observed);
                        self.optional(message_broker);
                    }
                    ElementKind::Range { .. }
                    | ElementKind::File { .. }
                    | ElementKind::Blob { .. }
                    | ElementKind::Capability => {}
                }
                self.site.path.pop();
            }

            fn shell(&mut self, shell: & $($m)* AssetAdministrationShell) {
                self.administration(& $($m)* shell.administration);
                self.extensions(& $($m)* shell.extensions);
                self.data_specifications(& $($m)* shell.embedded_data_specifications);
                self.optional(& $($m)* shell.derived_from);
                self.specific_asset_ids(& $($m)* shell.asset_information.specific_asset_ids);
                self.many(& $($m)* shell.submodels);
            }

            fn submodel(&mut self, submodel: & $($m)* Submodel) {
                self.administration(& $($m)* submodel.administration);
                self.extensions(& $($m)* submodel.extensions);
                self.data_specifications(& $($m)* submodel.embedded_data_specifications);
                self.optional(& $($m)* submodel.semantic_id);
                self.many(& $($m)* submodel.supplemental_semantic_ids);
                self.qualifiers(& $($m)* submodel.qualifiers);
                self.elements(& $($m)* submodel.submodel_elements);
            }

            fn concept_description(&mut self, cd: & $($m)* ConceptDescription) {
                self.administration(& $($m)* cd.administration);
                self.extensions(& $($m)* cd.extensions);
                self.data_specifications(& $($m)* cd.embedded_data_specifications);
                self.many(& $($m)* cd.is_case_of);
            }
        }
    };
}

reference_walker!(Walker, {});
reference_walker!(WalkerMut, { mut });

macro_rules! impl_reference_bearing {
    ($ty:ty, $visit:ident) => {
        impl ReferenceBearing for $ty {
            fn for_each_reference<F>(&self, mut f: F)
            where
                F: FnMut(&ReferenceSite, &Reference),
            {
                let mut walker = Walker {
                    site: ReferenceSite::root(self.handle()),
                    f: &mut f,
                };
                walker.$visit(self);
            }

            fn for_each_reference_mut<F>(&mut self, mut f: F)
            where
                F: FnMut(&ReferenceSite, &mut Reference),
            {
                let mut walker = WalkerMut {
                    site: ReferenceSite::root(self.handle()),
                    f: &mut f,
                };
                walker.$visit(self);
            }
        }
    };
}

impl_reference_bearing!(AssetAdministrationShell, shell);
impl_reference_bearing!(Submodel, submodel);
impl_reference_bearing!(ConceptDescription, concept_description);

impl ReferenceBearing for Environment {
    fn for_each_reference<F>(&self, mut f: F)
    where
        F: FnMut(&ReferenceSite, &Reference),
    {
        for shell in &self.asset_administration_shells {
            shell.for_each_reference(&mut f);
        }
        for submodel in &self.submodels {
            submodel.for_each_reference(&mut f);
        }
        for cd in &self.concept_descriptions {
            cd.for_each_reference(&mut f);
        }
    }

    fn for_each_reference_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&ReferenceSite, &mut Reference),
    {
        for shell in self.asset_administration_shells.iter_mut() {
            shell.for_each_reference_mut(&mut f);
        }
        for submodel in self.submodels.iter_mut() {
            submodel.for_each_reference_mut(&mut f);
        }
        for cd in self.concept_descriptions.iter_mut() {
            cd.for_each_reference_mut(&mut f);
        }
    }
}

impl Environment {
    /// Sites of every reference whose first key addresses the given
    /// identifiable.
    pub fn references_to(&self, kind: IdentifiableKind, id: &str) -> Vec<ReferenceSite> {
        let mut sites = Vec::new();
        self.for_each_reference(|site, reference| {
            if reference.points_to(kind, id) {
                sites.push(site.clone());
            }
        });
        sites
    }

    /// Total number of references held by the environment.
    pub fn reference_count(&self) -> usize {
        let mut count = 0;
        self.for_each_reference(|_, _| count += 1);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KeyType, Qualifier};

    fn cd_ref(id: &str) -> Reference {
        Reference::model_to(IdentifiableKind::ConceptDescription, id)
    }

    #[test]
    fn test_walk_reaches_nested_fields() {
        let mut qualifier = Qualifier::new("Multiplicity", "One");
        qualifier.value_id = Some(cd_ref("cd-qualifier-value"));

        let mut semantic = Reference::external("0173-1#02-AAO677#002");
        semantic.referred_semantic_id = Some(Box::new(cd_ref("cd-referred")));

        let submodel = Submodel::new("sm-1", "Nameplate")
            .with_semantic_id(semantic)
            .with_element(
                SubmodelElement::operation(
                    "Calibrate",
                    vec![SubmodelElement::property("Offset", "0").with_semantic_id(cd_ref("cd-offset"))],
                    vec![],
                )
                .with_qualifier(qualifier),
            )
            .with_element(SubmodelElement::list(
                "Readings",
                KeyType::ReferenceElement,
                vec![SubmodelElement::reference_element("", cd_ref("cd-in-list"))],
            ));

        let mut seen = Vec::new();
        submodel.for_each_reference(|site, reference| {
            seen.push((site.path.join("/"), reference.first_value().unwrap_or("").to_string()));
        });

        assert!(seen.contains(&(String::new(), "cd-referred".to_string())));
        assert!(seen.contains(&("Calibrate".to_string(), "cd-qualifier-value".to_string())));
        assert!(seen.contains(&("Calibrate/Offset".to_string(), "cd-offset".to_string())));
        assert!(seen.contains(&("Readings/0".to_string(), "cd-in-list".to_string())));
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_mutable_walk_rewrites_in_place() {
        let mut shell = AssetAdministrationShell::new("aas-1", "Pump");
        shell.add_submodel_ref("sm-1");
        shell.add_submodel_ref("sm-2");

        shell.for_each_reference_mut(|site, reference| {
            assert_eq!(site.owner, IdentifiableHandle::shell("aas-1"));
            if reference.points_to(IdentifiableKind::Submodel, "sm-1") {
                reference.keys[0].value = "sm-9".to_string();
            }
        });

        assert_eq!(shell.submodel_ids(), vec!["sm-9", "sm-2"]);
    }
}
