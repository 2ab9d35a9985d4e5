//! Error types for the physics system

use crate::body::BodyId;
use thiserror::Error;

/// Physics system errors
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Rigid body not found
    #[error("rigid body not found: {0:?}")]
    BodyNotFound(BodyId),

    /// Circle constructed with a non-positive radius
    #[error("circle radius must be positive, got {0}")]
    InvalidRadius(f32),

    /// Polygon constructed with a non-positive size
    #[error("polygon size must be positive, got {0}")]
    InvalidSize(f32),

    /// Polygon constructed with fewer than 3 sides
    #[error("polygon side count must be at least 3, got {0}")]
    InvalidSideCount(usize),

    /// Rectangle constructed with non-positive extents
    #[error("rectangle extents must be positive, got {width}x{height}")]
    InvalidExtents { width: f32, height: f32 },

    /// Body constructed with a non-positive mass
    #[error("body mass must be positive, got {0}")]
    InvalidMass(f32),

    /// Invalid configuration
    #[error("invalid physics configuration: {0}")]
    InvalidConfig(String),

    /// A body reached a non-finite numeric state during a step
    #[error("body {0:?} reached a non-finite state and was removed from simulation")]
    NonFiniteState(BodyId),
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
