use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::{ResmgrError, ResourceType};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BenchConfig {
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,
    pub kind: ResourceType,
    #[serde(default)]
    pub keys: HashMap<String, String>,
}

impl ResourceDefinition {
    pub fn bench(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ResourceType::Bench,
            keys: HashMap::new(),
        }
    }

    pub fn device(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ResourceType::Device,
            keys: HashMap::new(),
        }
    }

    pub fn with_key(mut self, key: &str, value: &str) -> Self {
        self.keys.insert(key.to_string(), value.to_string());
        self
    }
}

impl BenchConfig {
    pub fn from_toml_str(data: &str) -> Result<Self, ResmgrError> {
        toml::from_str(data).map_err(|e| ResmgrError::Config {
            source_name: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ResmgrError> {
        let data = std::fs::read_to_string(path).map_err(|e| ResmgrError::Config {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&data).map_err(|e| ResmgrError::Config {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn find(&self, name: &str) -> Option<&ResourceDefinition> {
        self.resources
            .iter()
            .find(|resource| resource.name.eq_ignore_ascii_case(name))
    }
}
