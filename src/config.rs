// Application configuration loaded from an optional TOML file

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::params::ParamInput;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "IntSar Tutorials".to_string(),
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory that relative texture paths are resolved against.
    pub root: PathBuf,
    /// Directory of numbered frames played as the panorama video.
    pub video_frames: PathBuf,
    pub video_fps: f32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            video_frames: PathBuf::from("resources/video"),
            video_fps: 30.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// env_logger filter string, e.g. `info,wgpu_core=warn`.
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveShape {
    Box,
    Circle,
    Cone,
    Cylinder,
    Dodecahedron,
    #[default]
    Sphere,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DemoOptions {
    pub primitive: PrimitiveShape,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub logging: LoggingSection,
    pub demo: DemoOptions,
    /// Parameter overrides by name, applied after the demo is built.
    pub params: BTreeMap<String, ParamInput>,
}

impl AppConfig {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Loads `path` if given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("", Path::new("empty.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.window.width, 800);
        assert_eq!(config.demo.primitive, PrimitiveShape::Sphere);
    }

    #[test]
    fn sections_are_partial() {
        let text = r##"
            [window]
            width = 1280

            [demo]
            primitive = "dodecahedron"

            [params]
            skyColor = "#ff0000"
            intensity = 0.5
            sunAxes = true
        "##;
        let config = AppConfig::from_toml(text, Path::new("app.toml")).unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.demo.primitive, PrimitiveShape::Dodecahedron);
        assert_eq!(config.params["skyColor"], ParamInput::Text("#ff0000".into()));
        assert_eq!(config.params["intensity"], ParamInput::Number(0.5));
        assert_eq!(config.params["sunAxes"], ParamInput::Bool(true));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = AppConfig::from_toml("[window\n", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
