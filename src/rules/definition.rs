use serde::Deserialize;

/// A block record, the grouping used by exported block definitions: the owning
/// definitions key names the block, `exportedJsonBlockName` names the node type.
#[derive(Debug, Deserialize)]
pub struct RawBlock {
    #[serde(alias = "exportedJsonBlockName")]
    pub exported_json_block_name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vars: Vec<serde_json::Value>,
}

/// A single variable rule record.
#[derive(Debug, Default, Deserialize)]
pub struct RawVar {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "actionsRelativePathValue")]
    pub path: Option<String>,
    #[serde(default, alias = "metadataPath")]
    pub metadata_path: Option<String>,
    #[serde(default, alias = "metadataPaths")]
    pub metadata_paths: Option<Vec<String>>,
    #[serde(default, alias = "metadataRelativePathKey")]
    pub metadata_relative_path_key: Option<RawMetadataKey>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "elementLabel")]
    pub element_label: Option<String>,
}

/// `{ "used": true, "paths": ["Parameters.Text"] }`
#[derive(Debug, Default, Deserialize)]
pub struct RawMetadataKey {
    #[serde(default)]
    pub used: bool,
    #[serde(default)]
    pub paths: Vec<String>,
}

impl RawVar {
    /// Every declared metadata path, in declaration order, without duplicates.
    pub fn all_metadata_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = Vec::new();
        let declared = self
            .metadata_path
            .iter()
            .chain(self.metadata_paths.iter().flatten())
            .chain(
                self.metadata_relative_path_key
                    .iter()
                    .filter(|key| key.used)
                    .flat_map(|key| key.paths.iter()),
            );
        for path in declared {
            if !path.trim().is_empty() && !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }
}
