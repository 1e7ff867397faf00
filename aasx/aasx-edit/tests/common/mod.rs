//! Shared fixtures for aasx-edit integration tests.

#![allow(dead_code)]

use aasx_core::error::Result;
use aasx_core::model::{
    AssetAdministrationShell, ConceptDescription, IdentifiableHandle, IdentifiableKind, Key,
    KeyType, Reference, Submodel, SubmodelElement,
};
use aasx_core::{Environment, SideInfo, StubLevel};
use aasx_edit::remote::{RemotePage, RemoteRepository};
use async_trait::async_trait;
use mockall::mock;

pub const REPO: &str = "http://repo.example.com/api/v3.0";

mock! {
    pub Repository {}

    #[async_trait]
    impl RemoteRepository for Repository {
        async fn delete_identifiables(&self, base: &str, keys: &[Key]) -> Result<()>;
        async fn rename_identifiable(&self, base: &str, old_id: &str, new_id: &str) -> Result<String>;
        async fn fetch_page(
            &self,
            base: &str,
            kind: IdentifiableKind,
            cursor: Option<String>,
            limit: usize,
        ) -> Result<RemotePage>;
    }
}

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

    let docs = Submodel::new("sm-docs", "Documentation")
        .with_element(SubmodelElement::file(
            "OperatingManual",
            "application/pdf",
            "/aasx/docs/manual.pdf",
        ))
        .with_element(SubmodelElement::property("RatedPressure", "10").with_semantic_id(cd_ref("cd-pressure")));
    env.submodels_mut().add(docs).unwrap();

    env.concept_descriptions_mut()
        .add(ConceptDescription::new("cd-technical", "TechnicalData"))
        .unwrap();
    env.concept_descriptions_mut()
        .add(ConceptDescription::new("cd-pressure", "MaxPressure"))
        .unwrap();

    env
}

/// The pump environment with `sm-42` fetched from [`REPO`].
pub fn mirrored_pump_environment() -> Environment {
    let mut env = pump_environment();
    env.set_side_info(
        IdentifiableKind::Submodel,
        SideInfo::new("sm-42", StubLevel::Full).with_endpoint(format!("{}/submodels/sm-42", REPO)),
    );
    env
}

/// The pump environment where only the id of `sm-42` came from [`REPO`].
pub fn id_only_pump_environment() -> Environment {
    let mut env = pump_environment();
    env.set_side_info(
        IdentifiableKind::Submodel,
        SideInfo::new("sm-42", StubLevel::IdOnly).with_endpoint(format!("{}/submodels/sm-42", REPO)),
    );
    env
}

pub fn submodel(id: &str) -> IdentifiableHandle {
    IdentifiableHandle::submodel(id)
}
