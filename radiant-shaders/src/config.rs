//! Where the shader system finds its files, and how it starts up.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderSystemConfig {
    /// Application runtime data root; GL program files live in `gl/` below it.
    pub runtime_data_path: PathBuf,
    /// Content root that material files and image references resolve against.
    pub base_path: PathBuf,
    pub material_dir: String,
    pub material_extension: String,
    pub texture_prefix: String,
    /// Tried in order when an image reference has no usable extension.
    pub image_extensions: Vec<String>,
    pub use_glsl: bool,
    pub lighting_enabled: bool,
}

impl Default for ShaderSystemConfig {
    fn default() -> Self {
        Self {
            runtime_data_path: PathBuf::from("."),
            base_path: PathBuf::from("."),
            material_dir: "materials".to_string(),
            material_extension: "mtr".to_string(),
            texture_prefix: "textures/".to_string(),
            image_extensions: vec!["png".to_string()],
            use_glsl: false,
            lighting_enabled: false,
        }
    }
}

impl ShaderSystemConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn program_dir(&self) -> PathBuf {
        self.runtime_data_path.join("gl")
    }

    pub fn material_path(&self) -> PathBuf {
        self.base_path.join(&self.material_dir)
    }

    /// Map an image reference from a material (`textures/a/b` or
    /// `textures/a/b.tga`) to a file below `base_path`.
    ///
    /// Whatever extension the reference carries is replaced by each of
    /// `image_extensions` in turn, and the first existing file wins.  If none
    /// exists the first candidate is returned, so the caller's load fails and
    /// reports a sensible path.
    pub fn resolve_image(&self, reference: &str) -> PathBuf {
        let relative = Path::new(reference.trim_start_matches('/'));
        let stem = relative.with_extension("");

        let candidates: Vec<PathBuf> = self
            .image_extensions
            .iter()
            .map(|ext| self.base_path.join(stem.with_extension(ext)))
            .collect();

        candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .or(candidates.first())
            .cloned()
            .unwrap_or_else(|| self.base_path.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = ShaderSystemConfig::from_toml_str(
            r#"
base_path = "/games/darkmod"
use_glsl = true
"#,
        )
        .unwrap();
        assert_eq!(config.base_path, PathBuf::from("/games/darkmod"));
        assert!(config.use_glsl);
        assert_eq!(config.material_dir, "materials");
        assert_eq!(config.material_extension, "mtr");
        assert_eq!(config.image_extensions, vec!["png".to_string()]);
        assert_eq!(
            config.material_path(),
            PathBuf::from("/games/darkmod/materials")
        );
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(
            ShaderSystemConfig::from_toml_str("use_glsl = \"sometimes\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn serializes_back_to_toml() {
        let config = ShaderSystemConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(ShaderSystemConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn image_references_swap_extensions() {
        let config = ShaderSystemConfig {
            base_path: PathBuf::from("/nowhere"),
            image_extensions: vec!["png".into(), "tga".into()],
            ..Default::default()
        };
        assert_eq!(
            config.resolve_image("textures/wood/oak.tga"),
            PathBuf::from("/nowhere/textures/wood/oak.png")
        );
        assert_eq!(
            config.resolve_image("textures/wood/oak"),
            PathBuf::from("/nowhere/textures/wood/oak.png")
        );
    }

    #[test]
    fn existing_candidate_wins() {
        let dir = std::env::temp_dir().join(format!("shader-config-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("textures")).unwrap();
        std::fs::write(dir.join("textures/stone.tga"), b"").unwrap();
        let config = ShaderSystemConfig {
            base_path: dir.clone(),
            image_extensions: vec!["png".into(), "tga".into()],
            ..Default::default()
        };
        assert_eq!(
            config.resolve_image("textures/stone"),
            dir.join("textures/stone.tga")
        );
    }
}
