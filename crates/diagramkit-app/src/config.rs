//! Editor configuration.
//!
//! Loaded from JSON; every field is optional and falls back to its default.

use diagramkit_core::diagram::DiagramSettings;
use diagramkit_core::id::{IdSource, RandomIds, SequentialIds};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How entity ids are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Deterministic counter; reproducible across runs.
    #[default]
    Sequential,
    /// Random v4 UUIDs.
    Random,
}

impl IdStrategy {
    pub fn source(self) -> Box<dyn IdSource> {
        match self {
            IdStrategy::Sequential => Box::new(SequentialIds::new()),
            IdStrategy::Random => Box::new(RandomIds),
        }
    }
}

/// Where and how big newly created entities are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    /// Top-left corner of the first new entity.
    pub origin: Point,
    /// Diagonal offset between consecutive new entities of the same type.
    pub step: f64,
    pub shape_width: f64,
    pub shape_height: f64,
    pub container_width: f64,
    pub container_height: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            origin: Point::new(100.0, 100.0),
            step: 20.0,
            shape_width: 100.0,
            shape_height: 100.0,
            container_width: 300.0,
            container_height: 200.0,
        }
    }
}

impl Placement {
    /// Position of the `index`-th new entity.
    pub fn position(&self, index: usize) -> Point {
        self.origin + Vec2::new(self.step, self.step) * index as f64
    }
}

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub title: String,
    /// Initial UI language key.
    pub language: String,
    pub diagram: DiagramSettings,
    pub ids: IdStrategy,
    pub placement: Placement,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            title: "DiagramKit".to_string(),
            language: "en".to_string(),
            diagram: DiagramSettings::default(),
            ids: IdStrategy::default(),
            placement: Placement::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
