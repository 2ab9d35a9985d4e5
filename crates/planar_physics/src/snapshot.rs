//! Render-ready snapshots of the simulation state
//!
//! A snapshot is a plain serializable copy of everything a renderer needs
//! for one frame: body poses with resolved world-space geometry, plus the
//! broad-phase node boundaries for debug overlays.

use crate::body::{BodyId, RigidBody, Shape};
use planar_math::{Aabb, Vec2};
use serde::{Deserialize, Serialize};

/// World-space geometry of one body's shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShapeSnapshot {
    Circle { radius: f32 },
    Polygon { world_vertices: Vec<Vec2> },
}

/// One body's pose and geometry at snapshot time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub is_static: bool,
    pub shape: ShapeSnapshot,
    pub aabb: Aabb,
}

impl BodySnapshot {
    pub fn capture(body: &RigidBody) -> Self {
        let shape = match body.shape() {
            Shape::Circle { radius } => ShapeSnapshot::Circle { radius: *radius },
            Shape::Polygon { .. } => ShapeSnapshot::Polygon {
                world_vertices: body.world_vertices(),
            },
        };
        Self {
            id: body.id(),
            position: body.position,
            rotation: body.rotation,
            velocity: body.velocity,
            angular_velocity: body.angular_velocity,
            is_static: body.is_static(),
            shape,
            aabb: body.aabb(),
        }
    }
}

/// Full-world snapshot for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub bodies: Vec<BodySnapshot>,
    /// Broad-phase node boundaries from the last completed tick
    pub quadtree_nodes: Vec<Aabb>,
}
