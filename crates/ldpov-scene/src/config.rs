//! Render configuration.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! zoom = 1.5
//! view_rotation = [30.0, -45.0, 0.0]
//! primitives_manifest = "ldpov-primitives.inc"
//! ```

use std::path::{Path, PathBuf};

use ldpov_ir::ColorId;
use ldpov_math::Transform;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};
use crate::flatten::{FlattenOptions, DEFAULT_COLOR, DEFAULT_MAX_DEPTH};

/// Settings for one render session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Color for top-level inheriting selectors and unknown codes.
    pub default_color: ColorId,
    /// Deepest reference level that is expanded.
    pub max_depth: usize,
    /// Half-width of the random offset added to each top-level instance.
    pub jitter: f64,
    /// Seed of the jitter generator.
    pub seed: u64,
    /// Perspective camera; orthographic when false.
    pub perspective: bool,
    /// Camera distance factor.
    pub zoom: f64,
    /// View rotation in degrees about X, Y and Z, applied in that order.
    pub view_rotation: [f64; 3],
    /// File name of the header include.
    pub header_file: String,
    /// File name of the materials include.
    pub materials_file: String,
    /// File name of the primitives include.
    pub primitives_file: String,
    /// Primitive manifest listing pre-declared primitives.
    pub primitives_manifest: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_color: DEFAULT_COLOR,
            max_depth: DEFAULT_MAX_DEPTH,
            jitter: 0.3,
            seed: 0,
            perspective: true,
            zoom: 1.0,
            view_rotation: [0.0; 3],
            header_file: "ldpov-header.inc".to_string(),
            materials_file: "ldpov-materials.inc".to_string(),
            primitives_file: "ldpov-primitives.inc".to_string(),
            primitives_manifest: None,
        }
    }
}

impl RenderConfig {
    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RenderConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject values a render cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.jitter.is_nan() || self.jitter < 0.0 {
            return Err(SceneError::Config(format!(
                "jitter must be non-negative, got {}",
                self.jitter
            )));
        }
        if self.zoom.is_nan() || self.zoom <= 0.0 {
            return Err(SceneError::Config(format!(
                "zoom must be positive, got {}",
                self.zoom
            )));
        }
        if self.max_depth == 0 {
            return Err(SceneError::Config("max_depth must be at least 1".into()));
        }
        Ok(())
    }

    /// Rotation part of the view.
    pub fn view_transform(&self) -> Transform {
        let [x, y, z] = self.view_rotation.map(f64::to_radians);
        Transform::rotation_x(x)
            .compose(&Transform::rotation_y(y))
            .compose(&Transform::rotation_z(z))
    }

    /// Frame every top-level instance is placed in: the view rotation
    /// followed by the flip from LDraw's Y-down axes.
    pub fn root_transform(&self) -> Transform {
        self.view_transform()
            .compose(&Transform::scale(-1.0, -1.0, -1.0))
    }

    /// Traversal options derived from this configuration.
    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            max_depth: self.max_depth,
            fallback_color: self.default_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ldpov_math::Point3;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = RenderConfig::from_toml_str("").unwrap();
        assert_eq!(config, RenderConfig::default());
        assert_eq!(config.default_color, 7);
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn test_partial_toml() {
        let config = RenderConfig::from_toml_str(
            "zoom = 2.5\nseed = 42\nprimitives_manifest = \"prims.inc\"\n",
        )
        .unwrap();
        assert_relative_eq!(config.zoom, 2.5);
        assert_eq!(config.seed, 42);
        assert_eq!(config.primitives_manifest, Some(PathBuf::from("prims.inc")));
        assert!(config.perspective);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            RenderConfig::from_toml_str("jitter = -1.0"),
            Err(SceneError::Config(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("zoom = 0.0"),
            Err(SceneError::Config(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("max_depth = 0"),
            Err(SceneError::Config(_))
        ));
        assert!(matches!(
            RenderConfig::from_toml_str("zoom = \"far\""),
            Err(SceneError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_root_transform_flips_axes() {
        let root = RenderConfig::default().root_transform();
        let p = root.apply_point(&Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(p, Point3::new(-1.0, -2.0, -3.0), epsilon = 1e-12);
        assert!(root.is_mirroring());
    }

    #[test]
    fn test_view_rotation_order() {
        let config = RenderConfig {
            view_rotation: [90.0, 0.0, 90.0],
            ..RenderConfig::default()
        };
        // X first: Y axis goes to Z, then Z about Z stays put
        let p = config.view_transform().apply_point(&Point3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(p, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
    }
}
