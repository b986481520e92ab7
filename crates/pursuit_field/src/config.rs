//! Field configuration loaded from TOML

use crate::index::IndexKind;
use crate::types::{Bounds, Point};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Construction parameters for a field index.
///
/// ```toml
/// width = 200
/// height = 200
/// kind = "kdtree"
/// rebalance_factor = 3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Largest valid x coordinate
    pub width: i64,
    /// Largest valid y coordinate
    pub height: i64,
    #[serde(default)]
    pub kind: IndexKind,
    /// Quadtree root centre. Defaults to the middle of the field.
    #[serde(default)]
    pub centre: Option<Point>,
    /// Kd-tree automatic rebuild threshold; `None` disables it.
    #[serde(default)]
    pub rebalance_factor: Option<u32>,
}

impl FieldConfig {
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width,
            height,
            kind: IndexKind::default(),
            centre: None,
            rebalance_factor: None,
        }
    }

    pub fn with_kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::field(self.width, self.height)
    }

    /// Quadtree root centre, falling back to the field midpoint.
    pub fn root_centre(&self) -> Point {
        self.centre.unwrap_or_else(|| self.bounds().centre())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: FieldConfig =
            toml::from_str(content).context("Failed to parse field configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read field config: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.width < 0 || self.height < 0 {
            return Err(anyhow::anyhow!(
                "field dimensions must be non-negative, got {}x{}",
                self.width,
                self.height
            ));
        }

        if let Some(centre) = self.centre {
            if !self.bounds().contains(centre) {
                return Err(anyhow::anyhow!(
                    "quadtree centre {} lies outside the field {}",
                    centre,
                    self.bounds()
                ));
            }
        }

        if self.rebalance_factor == Some(0) {
            return Err(anyhow::anyhow!("rebalance_factor must be at least 1"));
        }

        Ok(())
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::new(500, 500)
    }
}
