use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::location::Location;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the extracted `.scr` files.
    pub script_root: Option<PathBuf>,
    pub universe_script: String,
    /// Four-letter location code, optionally with `@offset`.
    pub start_location: String,
    /// Length of one script timer unit.
    pub timer_unit_ms: u32,
    /// Seeds the `random` action; entropy is used when absent.
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            script_root: None,
            universe_script: "universe.scr".to_string(),
            start_location: "gary".to_string(),
            timer_unit_ms: 100,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Reads `path` when given and present; missing fields keep their
    /// defaults.
    pub fn from_json_file(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse engine config json: {}", path.display()))
    }

    pub fn start_location(&self) -> Result<Location> {
        Location::from_code(&self.start_location)
            .with_context(|| format!("invalid start location '{}'", self.start_location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = EngineConfig::from_json_file(Some(&dir.path().join("absent.json")))?;
        assert_eq!(config, EngineConfig::default());
        assert_eq!(EngineConfig::from_json_file(None)?, EngineConfig::default());
        Ok(())
    }

    #[test]
    fn partial_json_overrides_only_named_fields() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{ "start_location": "tr1a@200", "rng_seed": 42 }"#)?;

        let config = EngineConfig::from_json_file(Some(&path))?;
        assert_eq!(config.rng_seed, Some(42));
        assert_eq!(config.timer_unit_ms, 100);
        assert_eq!(config.universe_script, "universe.scr");
        assert_eq!(
            config.start_location()?,
            Location::new(b't', b'r', b'1', b'a', 200)
        );
        Ok(())
    }

    #[test]
    fn malformed_json_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("engine.json");
        fs::write(&path, "{ not json")?;
        assert!(EngineConfig::from_json_file(Some(&path)).is_err());
        Ok(())
    }
}
