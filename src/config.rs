//! Configuration loaded from a TOML file.
//!
//! ```toml
//! [limits]
//! max_component_vertices = 16
//! max_search_states = 2000000
//! max_reference_vertices = 16
//! max_reference_steps = 50000000
//!
//! [graph]
//! undeclared = "declare"   # or "reject"
//! ```
//!
//! Every key is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::bound::Limits;
use crate::graph::UndeclaredPolicy;

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "adaptbound.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub limits: Limits,
    pub graph: GraphSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Handling of names referenced but never declared as steps.
    pub undeclared: UndeclaredPolicy,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Loads `path` if given; otherwise `adaptbound.toml` in `dir` if it
    /// exists; otherwise the defaults.
    pub fn resolve(path: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.exists() {
            log::debug!("using config {}", candidate.display());
            return Self::load(&candidate);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.graph.undeclared, UndeclaredPolicy::Declare);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [limits]
            max_reference_vertices = 8

            [graph]
            undeclared = "reject"
            "#,
        )
        .unwrap();
        assert_eq!(config.limits.max_reference_vertices, 8);
        assert_eq!(config.limits.max_component_vertices, 16);
        assert_eq!(config.graph.undeclared, UndeclaredPolicy::Reject);
    }

    #[test]
    fn test_resolve_prefers_explicit_path() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("custom.toml");
        fs::write(&explicit, "[limits]\nmax_search_states = 10\n").unwrap();
        let fallback = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&fallback, "[limits]\nmax_search_states = 20\n").unwrap();

        let config = Config::resolve(Some(&explicit), dir.path()).unwrap();
        assert_eq!(config.limits.max_search_states, 10);
        let config = Config::resolve(None, dir.path()).unwrap();
        assert_eq!(config.limits.max_search_states, 20);
    }

    #[test]
    fn test_resolve_without_file_is_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::resolve(None, dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_bad_value_has_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[graph]\nundeclared = \"maybe\"\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config"));
    }
}
