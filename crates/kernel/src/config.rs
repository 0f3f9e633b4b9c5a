//! Tuning for the governor, spatial index and culler, loadable from YAML.
//!
//! Every section and field is optional; missing values keep their defaults.
//!
//! ```yaml
//! governor:
//!   fps_throttle_low: 25
//! spatial:
//!   cell_size: 12
//! culler:
//!   world_width: 512
//!   world_height: 512
//! ```

use serde::Deserialize;
use simcore_cull::CullerConfig;
use simcore_governor::GovernorConfig;
use simcore_spatial::SpatialConfig;
use std::path::Path;

/// Errors from loading or validating a [`SimConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub governor: GovernorConfig,
    pub spatial: SpatialConfig,
    pub culler: CullerConfig,
}

impl SimConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SimConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Check the values component constructors rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.governor;
        if g.history == 0 {
            return Err(invalid("governor.history must be at least 1"));
        }
        if !(g.fps_throttle_low < g.fps_throttle_medium && g.fps_throttle_medium <= g.fps_recover) {
            return Err(invalid(
                "governor thresholds must satisfy fps_throttle_low < fps_throttle_medium <= fps_recover",
            ));
        }
        if g.low_frequency_under_load == 0 || g.medium_frequency_under_load == 0 {
            return Err(invalid("governor frequencies must be at least 1"));
        }

        let s = &self.spatial;
        if !(s.cell_size.is_finite() && s.cell_size > 0.0) {
            return Err(invalid("spatial.cell_size must be positive"));
        }

        let c = &self.culler;
        if c.chunk_size == 0 {
            return Err(invalid("culler.chunk_size must be positive"));
        }
        if c.world_width == 0 || c.world_height == 0 {
            return Err(invalid("culler world size must be positive"));
        }
        let fraction_ok = |f: f32| f > 0.0 && f <= 1.0;
        if !(fraction_ok(c.lod_full_fraction)
            && fraction_ok(c.lod_medium_fraction)
            && c.lod_full_fraction < c.lod_medium_fraction)
        {
            return Err(invalid(
                "culler LOD fractions must lie in (0, 1] with lod_full_fraction < lod_medium_fraction",
            ));
        }
        if !(c.min_zoom.is_finite() && c.min_zoom > 0.0) {
            return Err(invalid("culler.min_zoom must be positive"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_owned())
}
