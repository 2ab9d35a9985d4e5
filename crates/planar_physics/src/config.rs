//! Physics configuration

use crate::error::{PhysicsError, Result};
use planar_math::Vec2;
use serde::{Deserialize, Serialize};

/// Physics world configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Gravity vector (default: +9.81 in Y, canvas convention with Y down)
    pub gravity: Vec2,

    /// Fixed timestep for physics simulation
    pub timestep: f32,

    /// Maximum number of substeps per frame; lag beyond this is discarded
    pub max_substeps: u32,

    /// Relaxation iterations for the detect/resolve loop per substep
    pub solver_iterations: usize,

    /// Restitution (bounciness) applied at contacts
    pub restitution: f32,

    /// Coulomb friction coefficient
    pub friction: f32,

    /// Fraction of penetration corrected positionally per resolution
    pub correction_percent: f32,

    /// Penetration depth tolerated before positional correction kicks in
    pub slop: f32,

    /// World-unit scale applied to integrated positions
    pub world_scale: f32,

    /// Bodies a quadtree leaf holds before subdividing
    pub quadtree_capacity: usize,

    /// Maximum quadtree subdivision depth
    pub quadtree_max_depth: usize,

    /// Loose expansion factor applied to quadrant boundaries
    pub quadtree_looseness: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 9.81),
            timestep: 1.0 / 60.0,
            max_substeps: 5,
            solver_iterations: 3,
            restitution: 0.8,
            friction: 0.5,
            correction_percent: 0.8,
            slop: 0.01,
            world_scale: 100.0,
            quadtree_capacity: 8,
            quadtree_max_depth: 10,
            quadtree_looseness: 1.1,
        }
    }
}

impl PhysicsConfig {
    /// Create a configuration for high-precision simulation
    pub fn high_precision() -> Self {
        Self {
            solver_iterations: 6,
            max_substeps: 8,
            ..Default::default()
        }
    }

    /// Create a configuration for fast simulation (lower quality)
    pub fn fast() -> Self {
        Self {
            solver_iterations: 1,
            max_substeps: 2,
            ..Default::default()
        }
    }

    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = Vec2::new(x, y);
        self
    }

    /// Set timestep
    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    /// Set restitution
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set friction coefficient
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Set world-unit scale
    pub fn with_world_scale(mut self, world_scale: f32) -> Self {
        self.world_scale = world_scale;
        self
    }

    /// Check the configuration for nonsensical values
    pub fn validate(&self) -> Result<()> {
        if !(self.timestep > 0.0) || !self.timestep.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "timestep must be positive and finite, got {}",
                self.timestep
            )));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max_substeps must be at least 1".into(),
            ));
        }
        if self.solver_iterations == 0 {
            return Err(PhysicsError::InvalidConfig(
                "solver_iterations must be at least 1".into(),
            ));
        }
        if !(self.restitution >= 0.0) || !(self.friction >= 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "restitution ({}) and friction ({}) must be non-negative",
                self.restitution, self.friction
            )));
        }
        if !(0.0..=1.0).contains(&self.correction_percent) {
            return Err(PhysicsError::InvalidConfig(format!(
                "correction_percent must be within [0, 1], got {}",
                self.correction_percent
            )));
        }
        if !(self.slop >= 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "slop must be non-negative, got {}",
                self.slop
            )));
        }
        if !(self.world_scale > 0.0) || !self.world_scale.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "world_scale must be positive and finite, got {}",
                self.world_scale
            )));
        }
        if self.quadtree_capacity == 0 || self.quadtree_max_depth == 0 {
            return Err(PhysicsError::InvalidConfig(
                "quadtree capacity and max depth must be at least 1".into(),
            ));
        }
        if !(self.quadtree_looseness >= 1.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "quadtree_looseness must be at least 1.0, got {}",
                self.quadtree_looseness
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PhysicsConfig::default().validate().is_ok());
        assert!(PhysicsConfig::high_precision().validate().is_ok());
        assert!(PhysicsConfig::fast().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_timestep() {
        let config = PhysicsConfig::default().with_timestep(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_correction() {
        let mut config = PhysicsConfig::default();
        config.correction_percent = 1.5;
        assert!(config.validate().is_err());
    }
}
