use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::corpus::NormalizeConfig;
use crate::tokenizer::TokenizerConfig;
use crate::vectorizer::VectorizerConfig;

/// Settings for one batch build. Missing sections fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub normalize: NormalizeConfig,
    pub tokenizer: TokenizerConfig,
    pub vectorizer: VectorizerConfig,
}

impl PipelineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_file_over(path, &Self::default())
    }

    /// Read a config file whose fields replace those of `base` one by one;
    /// anything the file leaves out keeps `base`'s value. An explicit `null`
    /// clears an optional field.
    pub fn from_json_file_over<P: AsRef<Path>>(path: P, base: &Self) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let overlay: Value = serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
        let mut merged = serde_json::to_value(base)?;
        merge(&mut merged, overlay);
        let config = serde_json::from_value(merged).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}

fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
