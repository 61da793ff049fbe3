use serde::Deserialize;

use rbridge_api::oid::TypeOid;

use crate::error::ConversionError;

/// Root configuration, parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub conversion: ConversionSettings,

    /// Extra types registered in the built-in catalog.
    #[serde(default)]
    pub types: Vec<TypeAliasConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversionSettings {
    /// Reject data frames whose columns differ in length before reading rows.
    #[serde(default = "default_check_column_lengths")]
    pub check_column_lengths: bool,
}

fn default_check_column_lengths() -> bool {
    true
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            check_column_lengths: default_check_column_lengths(),
        }
    }
}

/// A type that converts exactly like an existing built-in type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeAliasConfig {
    pub oid: TypeOid,
    pub name: String,
    /// Name of the built-in type to copy I/O and classification from.
    pub like: String,
    #[serde(default)]
    pub array_oid: Option<TypeOid>,
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, ConversionError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, ConversionError> {
        toml::from_str(toml_str).map_err(|e| ConversionError::Config(e.to_string()))
    }
}
