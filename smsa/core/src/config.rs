use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE: &str = "smsa.bin";
pub const STORE_ENV: &str = "SMSA_STORE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsaConfig {
    /// Flat image holding the address space between runs.
    pub store_path: PathBuf,
}

impl Default for SmsaConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE),
        }
    }
}

impl SmsaConfig {
    pub fn with_store(path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: path.into(),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Applies `SMSA_STORE` on top of the current values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(store) = env::var_os(STORE_ENV).filter(|v| !v.is_empty()) {
            self.store_path = PathBuf::from(store);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_store_is_local_image() {
        assert_eq!(SmsaConfig::default().store_path, PathBuf::from("smsa.bin"));
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let cfg: SmsaConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, SmsaConfig::default());

        let cfg: SmsaConfig = serde_json::from_str(r#"{"store_path":"/tmp/drums.bin"}"#).unwrap();
        assert_eq!(cfg.store_path, PathBuf::from("/tmp/drums.bin"));
    }

    #[test]
    fn reads_config_file() {
        let path = env::temp_dir().join(format!("smsa-config-{}.json", std::process::id()));
        fs::write(&path, r#"{"store_path":"array.img"}"#).unwrap();
        let cfg = SmsaConfig::from_json_file(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(cfg, SmsaConfig::with_store("array.img"));
    }
}
