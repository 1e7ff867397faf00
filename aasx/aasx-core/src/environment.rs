//! The environment: one store per identifiable kind.

use crate::error::{AasxError, Result};
use crate::model::{
    AssetAdministrationShell, ConceptDescription, IdentifiableHandle, IdentifiableKind, Submodel,
};
use crate::store::{IdentifiableStore, SideInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Container of all shells, submodels and concept descriptions of one
/// document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(default)]
    pub asset_administration_shells: IdentifiableStore<AssetAdministrationShell>,
    #[serde(default)]
    pub submodels: IdentifiableStore<Submodel>,
    #[serde(default)]
    pub concept_descriptions: IdentifiableStore<ConceptDescription>,
}

/// Borrowed identifiable of any kind.
#[derive(Debug, Clone, Copy)]
pub enum IdentifiableRef<'a> {
    Shell(&'a AssetAdministrationShell),
    Submodel(&'a Submodel),
    ConceptDescription(&'a ConceptDescription),
}

impl IdentifiableRef<'_> {
    pub fn id(&self) -> &str {
        match self {
            Self::Shell(shell) => &shell.id,
            Self::Submodel(submodel) => &submodel.id,
            Self::ConceptDescription(cd) => &cd.id,
        }
    }

    pub fn kind(&self) -> IdentifiableKind {
        match self {
            Self::Shell(_) => IdentifiableKind::Shell,
            Self::Submodel(_) => IdentifiableKind::Submodel,
            Self::ConceptDescription(_) => IdentifiableKind::ConceptDescription,
        }
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shells(&self) -> &IdentifiableStore<AssetAdministrationShell> {
        &self.asset_administration_shells
    }

    pub fn shells_mut(&mut self) -> &mut IdentifiableStore<AssetAdministrationShell> {
        &mut self.asset_administration_shells
    }

    pub fn submodels(&self) -> &IdentifiableStore<Submodel> {
        &self.submodels
    }

    pub fn submodels_mut(&mut self) -> &mut IdentifiableStore<Submodel> {
        &mut self.submodels
    }

    pub fn concept_descriptions(&self) -> &IdentifiableStore<ConceptDescription> {
        &self.concept_descriptions
    }

    pub fn concept_descriptions_mut(&mut self) -> &mut IdentifiableStore<ConceptDescription> {
        &mut self.concept_descriptions
    }

    pub fn find_identifiable(&self, handle: &IdentifiableHandle) -> Option<IdentifiableRef<'_>> {
        match handle.kind {
            IdentifiableKind::Shell => self
                .asset_administration_shells
                .find_by_id(&handle.id)
                .map(IdentifiableRef::Shell),
            IdentifiableKind::Submodel => self
                .submodels
                .find_by_id(&handle.id)
                .map(IdentifiableRef::Submodel),
            IdentifiableKind::ConceptDescription => self
                .concept_descriptions
                .find_by_id(&handle.id)
                .map(IdentifiableRef::ConceptDescription),
        }
    }

    pub fn contains(&self, kind: IdentifiableKind, id: &str) -> bool {
        match kind {
            IdentifiableKind::Shell => self.asset_administration_shells.contains(id),
            IdentifiableKind::Submodel => self.submodels.contains(id),
            IdentifiableKind::ConceptDescription => self.concept_descriptions.contains(id),
        }
    }

    /// Number of identifiables in the store of `kind`.
    pub fn count(&self, kind: IdentifiableKind) -> usize {
        match kind {
            IdentifiableKind::Shell => self.asset_administration_shells.len(),
            IdentifiableKind::Submodel => self.submodels.len(),
            IdentifiableKind::ConceptDescription => self.concept_descriptions.len(),
        }
    }

    /// Identifiers of the store of `kind`, in display order.
    pub fn ids(&self, kind: IdentifiableKind) -> Vec<String> {
        match kind {
            IdentifiableKind::Shell => self.asset_administration_shells.ids().map(String::from).collect(),
            IdentifiableKind::Submodel => self.submodels.ids().map(String::from).collect(),
            IdentifiableKind::ConceptDescription => {
                self.concept_descriptions.ids().map(String::from).collect()
            }
        }
    }

    pub fn side_info(&self, handle: &IdentifiableHandle) -> Option<&SideInfo> {
        match handle.kind {
            IdentifiableKind::Shell => self.asset_administration_shells.side_info(&handle.id),
            IdentifiableKind::Submodel => self.submodels.side_info(&handle.id),
            IdentifiableKind::ConceptDescription => self.concept_descriptions.side_info(&handle.id),
        }
    }

    pub fn side_info_mut(&mut self, handle: &IdentifiableHandle) -> Option<&mut SideInfo> {
        match handle.kind {
            IdentifiableKind::Shell => self.asset_administration_shells.side_info_mut(&handle.id),
            IdentifiableKind::Submodel => self.submodels.side_info_mut(&handle.id),
            IdentifiableKind::ConceptDescription => {
                self.concept_descriptions.side_info_mut(&handle.id)
            }
        }
    }

    pub fn set_side_info(&mut self, kind: IdentifiableKind, info: SideInfo) {
        match kind {
            IdentifiableKind::Shell => self.asset_administration_shells.set_side_info(info),
            IdentifiableKind::Submodel => self.submodels.set_side_info(info),
            IdentifiableKind::ConceptDescription => self.concept_descriptions.set_side_info(info),
        }
    }

    /// Move an identifiable one step up or down in its store.
    pub fn move_identifiable(&mut self, handle: &IdentifiableHandle, up: bool) -> Result<usize> {
        match (handle.kind, up) {
            (IdentifiableKind::Shell, true) => self.asset_administration_shells.move_up(&handle.id),
            (IdentifiableKind::Shell, false) => {
                self.asset_administration_shells.move_down(&handle.id)
            }
            (IdentifiableKind::Submodel, true) => self.submodels.move_up(&handle.id),
            (IdentifiableKind::Submodel, false) => self.submodels.move_down(&handle.id),
            (IdentifiableKind::ConceptDescription, true) => {
                self.concept_descriptions.move_up(&handle.id)
            }
            (IdentifiableKind::ConceptDescription, false) => {
                self.concept_descriptions.move_down(&handle.id)
            }
        }
    }

    /// Parse an environment from AAS JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load an environment from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub async fn load(path: &Path) -> Result<Self> {
        debug!("Loading environment from: {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let env = Self::from_json_str(&content)?;
        info!(
            "Loaded environment from {}: {} shells, {} submodels, {} concept descriptions",
            path.display(),
            env.asset_administration_shells.len(),
            env.submodels.len(),
            env.concept_descriptions.len()
        );
        Ok(env)
    }

    /// Save the environment as JSON, writing a temp file and renaming it
    /// into place.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_json_string()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, path).await.map_err(|e| {
            AasxError::internal(format!(
                "Failed to move environment into {}: {}",
                path.display(),
                e
            ))
        })?;

        info!("Environment saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_layout() {
        let mut env = Environment::new();
        env.submodels_mut().add(Submodel::new("sm-1", "Nameplate")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&env.to_json_string().unwrap()).unwrap();
        assert!(json["assetAdministrationShells"].as_array().unwrap().is_empty());
        assert_eq!(json["submodels"][0]["id"], "sm-1");
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let env = Environment::from_json_str(r#"{"submodels": []}"#).unwrap();
        assert!(env.shells().is_empty());
        assert!(env.concept_descriptions().is_empty());
    }

    #[test]
    fn test_operation_variables_are_wrapped() {
        let json = r#"{
            "submodels": [{
                "id": "sm-1",
                "idShort": "Maintenance",
                "submodelElements": [{
                    "idShort": "Calibrate",
                    "modelType": "Operation",
                    "inputVariables": [{"value": {
                        "idShort": "Offset",
                        "modelType": "Property",
                        "valueType": "xs:double",
                        "semanticId": {"type": "ModelReference", "keys": [{"type": "ConceptDescription", "value": "cd-offset"}]}
                    }}],
                    "outputVariables": [{"value": {"idShort": "Done", "modelType": "Property", "valueType": "xs:boolean"}}]
                }]
            }]
        }"#;

        let env = Environment::from_json_str(json).unwrap();
        let submodel = env.submodels().find_by_id("sm-1").unwrap();
        assert!(submodel.element_by_path(&["Calibrate", "Offset"]).is_some());
        assert!(submodel.element_by_path(&["Calibrate", "Done"]).is_some());
        assert_eq!(env.references_to(IdentifiableKind::ConceptDescription, "cd-offset").len(), 1);

        let written: serde_json::Value = serde_json::from_str(&env.to_json_string().unwrap()).unwrap();
        let operation = &written["submodels"][0]["submodelElements"][0];
        assert_eq!(operation["inputVariables"][0]["value"]["idShort"], "Offset");
        assert_eq!(operation["outputVariables"][0]["value"]["modelType"], "Property");
    }

    #[test]
    fn test_find_identifiable() {
        let mut env = Environment::new();
        env.shells_mut().add(AssetAdministrationShell::new("aas-1", "Pump")).unwrap();
        let found = env.find_identifiable(&IdentifiableHandle::shell("aas-1")).unwrap();
        assert_eq!(found.kind(), IdentifiableKind::Shell);
        assert!(env.find_identifiable(&IdentifiableHandle::submodel("aas-1")).is_none());
    }
}
