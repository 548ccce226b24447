// src/repository/config.rs

//! Distro configuration model
//!
//! The same structure describes a distribution's built-in defaults and the
//! operator's overrides from the config file:
//!
//! ```toml
//! [output]
//! verbosity = "info"
//!
//! [distros.centos]
//! archs = ["x86_64", "aarch64"]
//! versions = ["8-stream"]
//!
//! [[distros.centos.mirrors]]
//! name = "edge"
//! url = "https://mirrors.edge.kernel.org/centos/"
//!
//! [[distros.centos.repositories]]
//! name = "BaseOS"
//! uri = "/BaseOS/{{ .archs }}/os/"
//!
//! [distros.centos.vars]
//! flavor = ["os", "debug"]
//! ```

use crate::error::{Error, Result};
use crate::template::Inventory;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file read when `--config` is not given, relative to the home directory
pub const DEFAULT_CONFIG_FILE: &str = ".krawler.yaml";

/// A mirror root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mirror {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl Mirror {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

/// A repository below a version root; `uri` may be a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uri: String,
}

impl Repository {
    pub fn new(name: &str, uri: &str) -> Self {
        Self {
            name: name.to_string(),
            uri: uri.to_string(),
        }
    }
}

/// Scalar template variable value as written in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

/// A template variable: one value or a list of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    List(Vec<Scalar>),
    One(Scalar),
}

impl VarValue {
    pub fn values(&self) -> Vec<String> {
        match self {
            VarValue::List(items) => items.iter().map(ToString::to_string).collect(),
            VarValue::One(item) => vec![item.to_string()],
        }
    }
}

/// List of scalars read as strings, so `versions = [8, 9]` is accepted
fn scalar_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Vec::<Scalar>::deserialize(deserializer)?;
    Ok(items.iter().map(ToString::to_string).collect())
}

fn optional_scalar_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<Scalar>>::deserialize(deserializer)?;
    Ok(items.map(|items| items.iter().map(ToString::to_string).collect()))
}

/// Mirrors, repositories, architectures and versions of one distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistroConfig {
    #[serde(default)]
    pub mirrors: Vec<Mirror>,

    #[serde(default)]
    pub repositories: Vec<Repository>,

    #[serde(default, deserialize_with = "scalar_list")]
    pub archs: Vec<String>,

    /// `None` means discover versions by crawling the mirrors
    #[serde(default, deserialize_with = "optional_scalar_list")]
    pub versions: Option<Vec<String>>,

    /// Extra template variables available to repository URIs
    #[serde(default)]
    pub vars: BTreeMap<String, VarValue>,
}

impl DistroConfig {
    /// Template inventory: `archs`, `versions` when configured, then every
    /// configured variable (which wins over both)
    pub fn inventory(&self) -> Inventory {
        let mut inventory = Inventory::new();
        inventory.insert("archs", self.archs.iter());
        if let Some(versions) = &self.versions {
            inventory.insert("versions", versions.iter());
        }
        for (name, value) in &self.vars {
            inventory.insert(name.as_str(), value.values());
        }
        inventory
    }
}

/// Output options from the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default)]
    pub verbosity: Option<String>,

    /// Output format (text, json, yaml)
    #[serde(default)]
    pub format: Option<String>,
}

/// Top-level config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KrawlerConfig {
    #[serde(default)]
    pub output: OutputOptions,

    /// Per-distribution overrides, keyed by distro name
    #[serde(default)]
    pub distros: BTreeMap<String, DistroConfig>,
}

impl KrawlerConfig {
    /// Parse TOML config text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::ConfigError(format!("Invalid TOML config: {e}")))
    }

    /// Parse YAML config text
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| Error::ConfigError(format!("Invalid YAML config: {e}")))
    }

    /// Load a config file; `.yaml`/`.yml` files are YAML, everything else TOML
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config {}: {e}", path.display()))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&text),
            _ => Self::from_toml(&text),
        }
    }

    /// `$HOME/.krawler.yaml`, if the home directory is known
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
    }

    /// Like [`KrawlerConfig::load`], but a missing file yields the defaults
    pub fn load_if_present(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// User overrides for `distro`, empty if none are configured
    pub fn distro(&self, distro: &str) -> DistroConfig {
        self.distros.get(distro).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[output]
verbosity = "debug"

[distros.fedora]
archs = ["x86_64"]
versions = ["39", "40"]

[[distros.fedora.mirrors]]
name = "edge"
url = "https://mirrors.edge.kernel.org/fedora/releases/"

[[distros.fedora.repositories]]
uri = "/Everything/{{ .archs }}/os/"

[distros.fedora.vars]
flavor = ["os", "debug"]
release = 40
"#;

    #[test]
    fn test_parse_toml() {
        let config = KrawlerConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.output.verbosity.as_deref(), Some("debug"));

        let fedora = config.distro("fedora");
        assert_eq!(fedora.archs, vec!["x86_64"]);
        assert_eq!(fedora.versions, Some(vec!["39".to_string(), "40".to_string()]));
        assert_eq!(fedora.mirrors[0].name, "edge");
        assert_eq!(fedora.repositories[0].name, "");

        let inventory = fedora.inventory();
        assert_eq!(inventory.get("archs").unwrap(), ["x86_64"]);
        assert_eq!(inventory.get("flavor").unwrap(), ["os", "debug"]);
        assert_eq!(inventory.get("release").unwrap(), ["40"]);
        assert_eq!(inventory.get("versions").unwrap(), ["39", "40"]);
    }

    #[test]
    fn test_missing_distro_is_empty() {
        let config = KrawlerConfig::from_toml(SAMPLE).unwrap();
        let debian = config.distro("debian");
        assert!(debian.mirrors.is_empty());
        assert!(debian.versions.is_none());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
distros:
  debian:
    mirrors:
      - url: https://deb.debian.org/debian/
    versions: [bookworm]
"#;
        let config = KrawlerConfig::from_yaml(yaml).unwrap();
        let debian = config.distro("debian");
        assert_eq!(debian.mirrors[0].url, "https://deb.debian.org/debian/");
        assert_eq!(debian.versions, Some(vec!["bookworm".to_string()]));
    }

    #[test]
    fn test_numeric_versions_and_archs() {
        let config = KrawlerConfig::from_toml("[distros.centos]\nversions = [8, 9]\narchs = [\"x86_64\"]\n").unwrap();
        let centos = config.distro("centos");
        assert_eq!(centos.versions, Some(vec!["8".to_string(), "9".to_string()]));
        assert_eq!(centos.archs, vec!["x86_64"]);

        let config = KrawlerConfig::from_yaml("distros:\n  fedora:\n    versions: [39, rawhide]\n").unwrap();
        assert_eq!(
            config.distro("fedora").versions,
            Some(vec!["39".to_string(), "rawhide".to_string()])
        );
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = KrawlerConfig::load_if_present(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, KrawlerConfig::default());

        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "distros:\n  debian:\n    archs: [arm64]\n").unwrap();
        let config = KrawlerConfig::load_if_present(&path).unwrap();
        assert_eq!(config.distro("debian").archs, vec!["arm64"]);
        assert!(KrawlerConfig::default_path().map_or(true, |p| p.ends_with(DEFAULT_CONFIG_FILE)));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            KrawlerConfig::from_toml("distros = 3"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("krawler.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let config = KrawlerConfig::load(&path).unwrap();
        assert!(config.distros.contains_key("fedora"));
    }
}
