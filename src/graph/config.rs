//! Per-graph configuration
//!
//! Key names and default labels are settings of each graph instance rather
//! than constants, so two graphs in one process can tag their elements
//! differently.

use super::id_creator::{GuidIdCreator, IdCreator, SequentialIdCreator};
use super::ontology;
use super::property::ReservedKeys;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Built-in id strategies selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    Sequential,
    Guid,
}

/// Graph configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Property key holding each element's id
    pub id_key: String,
    /// Property key holding each element's revision id
    pub rev_id_key: String,
    pub default_vertex_label: String,
    pub default_edge_label: String,
    pub default_multi_edge_label: String,
    pub default_hyper_edge_label: String,
    /// Strategy for ids the caller leaves out
    pub id_strategy: IdStrategy,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            id_key: ontology::ID_KEY.to_string(),
            rev_id_key: ontology::REV_ID_KEY.to_string(),
            default_vertex_label: "Vertex".to_string(),
            default_edge_label: "Edge".to_string(),
            default_multi_edge_label: "MultiEdge".to_string(),
            default_hyper_edge_label: "HyperEdge".to_string(),
            id_strategy: IdStrategy::Sequential,
        }
    }
}

impl GraphConfig {
    /// Parse a YAML document; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        info!("Loading graph configuration from {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn reserved_keys(&self) -> ReservedKeys {
        ReservedKeys::new(self.id_key.clone(), self.rev_id_key.clone())
    }

    /// Instantiate the configured id strategy
    pub fn id_creator(&self) -> Box<dyn IdCreator> {
        match self.id_strategy {
            IdStrategy::Sequential => Box::new(SequentialIdCreator::new()),
            IdStrategy::Guid => Box::new(GuidIdCreator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert_eq!(config.id_key, "Id");
        assert_eq!(config.rev_id_key, "RevId");
        assert_eq!(config.id_strategy, IdStrategy::Sequential);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = GraphConfig::from_yaml_str("id_key: _id\nid_strategy: guid\n").unwrap();
        assert_eq!(config.id_key, "_id");
        assert_eq!(config.rev_id_key, "RevId");
        assert_eq!(config.id_strategy, IdStrategy::Guid);
        assert!(config.reserved_keys().is_reserved("_id"));
    }

    #[test]
    fn test_yaml_roundtrip_and_bad_input() {
        let config = GraphConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(GraphConfig::from_yaml_str(&yaml).unwrap(), config);

        let err = GraphConfig::from_yaml_str("id_strategy: [oops").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_vertex_label: Person").unwrap();
        let config = GraphConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_vertex_label, "Person");

        let missing = GraphConfig::from_file("/definitely/not/here.yaml");
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
