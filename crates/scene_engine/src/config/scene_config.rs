//! Scene configuration
//!
//! Controls the extent and depth of the octree, transform validation and
//! culling behaviour of a [`crate::scene::Scene`].

use serde::{Serialize, Deserialize};

use super::{Config, ConfigError};
use crate::bounds::Aabb;
use crate::foundation::math::Vec3;

/// Deepest octree the scene will build
///
/// Every node is allocated up front, so depth 6 already means about 300k
/// octants; one level more is eight times that.
pub const MAX_OCTREE_DEPTH: u32 = 6;

/// # Scene Configuration
///
/// Everything a scene needs to know before its first entity is added.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Centre of the octree root
    pub world_center: Vec3,
    /// Half-extent of the (cubic) octree root along each axis
    pub world_half_extent: f32,
    /// Number of octree levels below the root
    pub octree_depth: u32,
    /// Check derived transforms for NaN/Inf; `None` = debug builds only
    pub validate_transforms: Option<bool>,
    /// Frustum culling; when disabled every visible entity is drawn
    pub enable_culling: bool,
    /// Fallback log filter for binaries embedding the scene
    pub log_level: String,
}

impl SceneConfig {
    /// Create a configuration with the default world
    pub fn new() -> Self {
        Self {
            world_center: Vec3::zeros(),
            world_half_extent: 100.0,
            octree_depth: 3,
            validate_transforms: None,
            enable_culling: true,
            log_level: "info".to_string(),
        }
    }

    /// Set the world centre and half-extent covered by the octree
    pub fn with_world(mut self, center: Vec3, half_extent: f32) -> Self {
        self.world_center = center;
        self.world_half_extent = half_extent;
        self
    }

    /// Set octree depth
    pub fn with_octree_depth(mut self, depth: u32) -> Self {
        self.octree_depth = depth;
        self
    }

    /// Force transform validation on or off
    pub fn with_transform_validation(mut self, enabled: bool) -> Self {
        self.validate_transforms = Some(enabled);
        self
    }

    /// Enable or disable frustum culling
    pub fn with_culling(mut self, enabled: bool) -> Self {
        self.enable_culling = enabled;
        self
    }

    /// Whether derived transforms should be checked for NaN/Inf
    pub fn transform_validation_enabled(&self) -> bool {
        self.validate_transforms.unwrap_or(cfg!(debug_assertions))
    }

    /// Root bounds of the octree
    pub fn world_bounds(&self) -> Aabb {
        let h = self.world_half_extent;
        Aabb::from_center_extents(self.world_center, Vec3::new(h, h, h))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world_half_extent.is_finite() && self.world_half_extent > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "world_half_extent must be positive and finite, got {}",
                self.world_half_extent
            )));
        }

        if !self.world_center.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::Invalid("world_center must be finite".to_string()));
        }

        if self.octree_depth > MAX_OCTREE_DEPTH {
            return Err(ConfigError::Invalid(format!(
                "octree_depth {} exceeds maximum of {}",
                self.octree_depth, MAX_OCTREE_DEPTH
            )));
        }

        Ok(())
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for SceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.octree_depth, 3);
        assert_eq!(config.transform_validation_enabled(), cfg!(debug_assertions));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(SceneConfig::new().with_octree_depth(12).validate().is_err());
        assert!(SceneConfig::new().with_world(Vec3::zeros(), 0.0).validate().is_err());
        assert!(SceneConfig::new().with_world(Vec3::zeros(), f32::NAN).validate().is_err());
    }

    #[test]
    fn test_depth_cap_is_inclusive() {
        assert!(SceneConfig::new().with_octree_depth(MAX_OCTREE_DEPTH).validate().is_ok());

        let err = SceneConfig::new()
            .with_octree_depth(MAX_OCTREE_DEPTH + 1)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_toml_partial_config_uses_defaults() {
        let text = "octree_depth = 5\nenable_culling = false\n";
        let config = SceneConfig::from_str_with_format(text, "scene.toml").unwrap();
        assert_eq!(config.octree_depth, 5);
        assert!(!config.enable_culling);
        assert_eq!(config.world_half_extent, 100.0);
    }

    #[test]
    fn test_ron_config_parses() {
        let text = "(world_half_extent: 50.0, validate_transforms: Some(true))";
        let config = SceneConfig::from_str_with_format(text, "scene.ron").unwrap();
        assert_eq!(config.world_half_extent, 50.0);
        assert!(config.transform_validation_enabled());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = SceneConfig::from_str_with_format("", "scene.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
