//! Viewer configuration
//!
//! Configuration is plain JSON. Missing fields fall back to the defaults, so
//! `{"viewport": {"layout": "field_robot"}}` is a complete file.

use crate::scene::Layout;
use crate::telemetry::TelemetryPreset;
use crate::viewport::ViewportOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("window size must be non-zero, got {width}x{height}")]
    EmptyWindow { width: u32, height: u32 },
}

/// Viewer configuration for library usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Window title
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Show the frame statistics overlay (F2 toggles)
    pub show_stats: bool,
    pub viewport: ViewportOptions,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "TerraBot Viewer".to_string(),
            width: 1280,
            height: 720,
            show_stats: false,
            viewport: ViewportOptions::default(),
        }
    }
}

impl ViewerConfig {
    /// Component viewer with the sensor side panel
    pub fn for_cad_viewer() -> Self {
        Self {
            title: "TerraBot - Component Viewer".to_string(),
            viewport: ViewportOptions {
                layout: Layout::CadRobot,
                telemetry: Some(TelemetryPreset::SensorPanel),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Field simulator, running from the first frame
    pub fn for_simulator() -> Self {
        Self {
            title: "TerraBot - Field Simulator".to_string(),
            viewport: ViewportOptions {
                layout: Layout::FieldRobot,
                autostart: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Bare viewer for embedding
    pub fn minimal() -> Self {
        Self {
            title: "TerraBot".to_string(),
            width: 800,
            height: 600,
            ..Default::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file at [`Self::default_path`] if there is one
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from {}", path.display());
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/terrabot-view/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("terrabot-view").join("config.json"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyWindow {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_presets() {
        let cad = ViewerConfig::for_cad_viewer();
        assert_eq!(cad.viewport.layout, Layout::CadRobot);
        assert_eq!(cad.viewport.telemetry, Some(TelemetryPreset::SensorPanel));

        let sim = ViewerConfig::for_simulator();
        assert_eq!(sim.viewport.layout, Layout::FieldRobot);
        assert!(sim.viewport.autostart);

        assert_eq!(ViewerConfig::minimal().width, 800);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"title": "Demo", "viewport": {{"layout": "field_robot", "seed": 7}}}}"#
        )
        .unwrap();

        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.title, "Demo");
        assert_eq!(config.width, 1280);
        assert_eq!(config.viewport.layout, Layout::FieldRobot);
        assert_eq!(config.viewport.seed, 7);
        assert_eq!(config.viewport.telemetry, None);
    }

    #[test]
    fn test_load_round_trips_saved_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let original = ViewerConfig::for_cad_viewer();
        std::fs::write(&path, serde_json::to_string_pretty(&original).unwrap()).unwrap();
        assert_eq!(ViewerConfig::load(&path).unwrap(), original);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ViewerConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            ViewerConfig::load(&broken),
            Err(ConfigError::Parse { .. })
        ));

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, r#"{"width": 0}"#).unwrap();
        assert!(matches!(
            ViewerConfig::load(&empty),
            Err(ConfigError::EmptyWindow { .. })
        ));
    }

    #[test]
    fn test_default_path_names_the_app() {
        if let Some(path) = ViewerConfig::default_path() {
            assert!(path.ends_with("terrabot-view/config.json"));
        }
    }
}
