//! Rig manifests: which models to load and what they play

use marionette_core::{MarionetteError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Parsed `rig.toml`
///
/// ```toml
/// [[models]]
/// name = "puppet"
/// skeleton = "arm.skel.toml"
/// clip = "wave.anim.toml"
///
/// [[models]]
/// name = "crate"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    /// Directory relative paths resolve against; set when loaded from disk
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// Skeleton file; models without one are static
    #[serde(default)]
    pub skeleton: Option<PathBuf>,
    #[serde(default)]
    pub clip: Option<PathBuf>,
    /// Start playing `clip` as soon as the model is loaded
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
}

fn default_autoplay() -> bool {
    true
}

impl RigConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MarionetteError::AssetError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::parse(&content, path)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Parse a manifest; `path` is only used in error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let config: RigConfig = toml::from_str(content).map_err(|e| {
            MarionetteError::TomlParseError(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        for (i, model) in config.models.iter().enumerate() {
            if config.models[..i].iter().any(|m| m.name == model.name) {
                return Err(MarionetteError::AssetError(format!(
                    "{}: duplicate model name '{}'",
                    path.display(),
                    model.name
                )));
            }
            if model.clip.is_some() && model.skeleton.is_none() {
                return Err(MarionetteError::AssetError(format!(
                    "{}: model '{}' has a clip but no skeleton",
                    path.display(),
                    model.name
                )));
            }
        }
        Ok(config)
    }

    /// Resolve a manifest-relative path
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.base_dir.join(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_manifest_with_defaults() {
        let toml_str = r#"
[[models]]
name = "puppet"
skeleton = "arm.skel.toml"
clip = "wave.anim.toml"

[[models]]
name = "crate"

[[models]]
name = "paused"
skeleton = "arm.skel.toml"
clip = "wave.anim.toml"
autoplay = false
"#;
        let config = RigConfig::parse(toml_str, Path::new("rig.toml")).unwrap();
        assert_eq!(config.models.len(), 3);
        assert!(config.models[0].autoplay);
        assert!(config.models[1].skeleton.is_none());
        assert!(!config.models[2].autoplay);
    }

    #[test]
    fn reject_clip_without_skeleton() {
        let toml_str = r#"
[[models]]
name = "ghost"
clip = "wave.anim.toml"
"#;
        assert!(RigConfig::parse(toml_str, Path::new("rig.toml")).is_err());
    }

    #[test]
    fn reject_duplicate_names() {
        let toml_str = r#"
[[models]]
name = "a"

[[models]]
name = "a"
"#;
        let err = RigConfig::parse(toml_str, Path::new("rig.toml")).unwrap_err();
        assert!(err.to_string().contains("duplicate model name"));
    }

    #[test]
    fn paths_resolve_against_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.toml");
        std::fs::write(&path, "[[models]]\nname = \"a\"\n").unwrap();
        let config = RigConfig::load(&path).unwrap();
        assert_eq!(
            config.resolve(Path::new("arm.skel.toml")),
            dir.path().join("arm.skel.toml")
        );
    }
}
