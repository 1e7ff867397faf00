//! Shared fixtures for aasx-core integration tests.

#![allow(dead_code)]

use aasx_core::model::{
    AssetAdministrationShell, ConceptDescription, IdentifiableKind, KeyType, Reference, Submodel,
    SubmodelElement,
};
use aasx_core::Environment;

pub fn cd_ref(id: &str) -> Reference {
    Reference::model_to(IdentifiableKind::ConceptDescription, id)
}

/// A pump shell with a technical data submodel, a documentation submodel
/// and two concept descriptions.
pub fn pump_environment() -> Environment {
    let mut env = Environment::new();

    let mut shell = AssetAdministrationShell::new("aas-1", "Pump");
    shell.add_submodel_ref("sm-42");
    shell.add_submodel_ref("sm-docs");
    env.shells_mut().add(shell).unwrap();

    let technical = Submodel::new("sm-42", "TechnicalData")
        .with_semantic_id(cd_ref("cd-technical"))
        .with_element(SubmodelElement::property("MaxPressure", "16").with_semantic_id(cd_ref("cd-pressure")))
        .with_element(SubmodelElement::reference_element(
            "Manual",
            Reference::model_to(IdentifiableKind::Submodel, "sm-docs")
                .with_key(KeyType::File, "OperatingManual"),
        ));
    env.submodels_mut().add(technical).unwrap();

    let docs = Submodel::new("sm-docs", "Documentation").with_element(SubmodelElement::file(
        "OperatingManual",
        "application/pdf",
        "/aasx/docs/manual.pdf",
    ));
    env.submodels_mut().add(docs).unwrap();

    env.concept_descriptions_mut()
        .add(ConceptDescription::new("cd-technical", "TechnicalData"))
        .unwrap();
    env.concept_descriptions_mut()
        .add(ConceptDescription::new("cd-pressure", "MaxPressure"))
        .unwrap();

    env
}
