//! Rigid body model: shape variants, kinematic state, and the body arena

use crate::error::{PhysicsError, Result};
use planar_math::consts::TAU;
use planar_math::{Aabb, Vec2};
use serde::{Deserialize, Serialize};

/// Handle to a rigid body slot in a [`BodySet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyId(pub(crate) u32);

impl BodyId {
    pub(crate) const INVALID: Self = Self(u32::MAX);

    /// Slot index of this id
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Collision shape attached to a rigid body
///
/// A closed set of variants; all shape dispatch happens through exhaustive
/// matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    /// Circle with radius
    Circle { radius: f32 },
    /// Convex polygon with local-space vertices, wound counterclockwise
    Polygon { vertices: Vec<Vec2>, side_count: usize },
}

impl Shape {
    /// Circle shape
    pub fn circle(radius: f32) -> Result<Self> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(PhysicsError::InvalidRadius(radius));
        }
        Ok(Self::Circle { radius })
    }

    /// Regular polygon with `side_count` vertices on a circle of `size`
    pub fn regular_polygon(side_count: usize, size: f32) -> Result<Self> {
        if side_count < 3 {
            return Err(PhysicsError::InvalidSideCount(side_count));
        }
        if !(size > 0.0) || !size.is_finite() {
            return Err(PhysicsError::InvalidSize(size));
        }

        let vertices = (0..side_count)
            .map(|i| {
                let angle = TAU * i as f32 / side_count as f32 - TAU / 4.0;
                Vec2::new(size * angle.cos(), size * angle.sin())
            })
            .collect();

        Ok(Self::Polygon {
            vertices,
            side_count,
        })
    }

    /// Axis-aligned rectangle of `width` x `height` as a 4-vertex polygon
    pub fn rectangle(width: f32, height: f32) -> Result<Self> {
        if !(width > 0.0) || !(height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(PhysicsError::InvalidExtents { width, height });
        }

        let hw = width * 0.5;
        let hh = height * 0.5;
        Ok(Self::Polygon {
            vertices: vec![
                Vec2::new(-hw, -hh),
                Vec2::new(hw, -hh),
                Vec2::new(hw, hh),
                Vec2::new(-hw, hh),
            ],
            side_count: 4,
        })
    }

    /// Square with side length `size`
    pub fn square(size: f32) -> Result<Self> {
        Self::rectangle(size, size)
    }

    /// Moment of inertia about the centroid for the given mass
    ///
    /// Circles use the solid-disc formula. Polygons use the general
    /// second-moment formula, which reduces to the box formula
    /// m(w^2 + h^2)/12 for rectangles.
    pub fn inertia(&self, mass: f32) -> f32 {
        match self {
            Self::Circle { radius } => 0.5 * mass * radius * radius,
            Self::Polygon { vertices, .. } => {
                let mut numerator = 0.0;
                let mut denominator = 0.0;
                for i in 0..vertices.len() {
                    let a = vertices[i];
                    let b = vertices[(i + 1) % vertices.len()];
                    let cross = a.cross(b).abs();
                    numerator += cross * (a.dot(a) + a.dot(b) + b.dot(b));
                    denominator += cross;
                }
                if denominator > 0.0 {
                    mass / 6.0 * numerator / denominator
                } else {
                    // Degenerate vertex set; treat as a point mass
                    0.0
                }
            }
        }
    }
}

/// A simulated rigid body
///
/// Kinematic state is mutated only by the integrator and the collision
/// resolver during a tick. A body with infinite mass is static: its
/// inverse mass and inverse inertia are zero and it never moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody {
    pub(crate) id: BodyId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub rotation: f32,
    acceleration: Vec2,
    angular_acceleration: f32,
    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
    shape: Shape,
}

impl RigidBody {
    /// Create a body from a validated shape and a positive (or infinite) mass
    pub fn new(shape: Shape, mass: f32, position: Vec2) -> Result<Self> {
        if !(mass > 0.0) {
            return Err(PhysicsError::InvalidMass(mass));
        }

        let inv_mass = if mass.is_finite() { 1.0 / mass } else { 0.0 };
        let inertia = shape.inertia(mass);
        let inv_inertia = if inertia.is_finite() && inertia > 0.0 {
            1.0 / inertia
        } else {
            0.0
        };

        Ok(Self {
            id: BodyId::INVALID,
            position,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            rotation: 0.0,
            acceleration: Vec2::ZERO,
            angular_acceleration: 0.0,
            mass,
            inv_mass,
            inertia,
            inv_inertia,
            shape,
        })
    }

    /// Circle body
    pub fn circle(position: Vec2, radius: f32, mass: f32) -> Result<Self> {
        Self::new(Shape::circle(radius)?, mass, position)
    }

    /// Regular polygon body
    pub fn regular_polygon(position: Vec2, side_count: usize, size: f32, mass: f32) -> Result<Self> {
        Self::new(Shape::regular_polygon(side_count, size)?, mass, position)
    }

    /// Square body
    pub fn square(position: Vec2, size: f32, mass: f32) -> Result<Self> {
        Self::new(Shape::square(size)?, mass, position)
    }

    /// Rectangle body
    pub fn rectangle(position: Vec2, width: f32, height: f32, mass: f32) -> Result<Self> {
        Self::new(Shape::rectangle(width, height)?, mass, position)
    }

    /// Turn this body static (infinite mass, never moves)
    pub fn fixed(mut self) -> Self {
        self.mass = f32::INFINITY;
        self.inv_mass = 0.0;
        self.inertia = f32::INFINITY;
        self.inv_inertia = 0.0;
        self
    }

    /// Set initial velocity
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set initial angular velocity
    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Set initial rotation angle (radians)
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Id assigned when the body was inserted into a [`BodySet`]
    #[inline]
    pub fn id(&self) -> BodyId {
        self.id
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    #[inline]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    #[inline]
    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }

    /// Accumulate a force for the next integration step (no-op when static)
    pub fn apply_force(&mut self, force: Vec2) {
        if self.inv_mass > 0.0 {
            self.acceleration += force * self.inv_mass;
        }
    }

    /// Accumulate a gravitational acceleration directly (no-op when static)
    pub fn apply_gravity(&mut self, gravity: Vec2) {
        if self.inv_mass > 0.0 {
            self.acceleration += gravity;
        }
    }

    /// Accumulate a torque for the next integration step (no-op when static)
    pub fn apply_torque(&mut self, torque: f32) {
        if self.inv_inertia > 0.0 {
            self.angular_acceleration += torque * self.inv_inertia;
        }
    }

    /// Semi-implicit Euler integration over `dt` seconds
    ///
    /// `world_scale` converts integrated displacement into world units.
    /// Accumulated accelerations are consumed and reset.
    pub fn integrate(&mut self, dt: f32, world_scale: f32) {
        self.velocity += self.acceleration * dt;
        self.position +=
            (self.velocity * dt + self.acceleration * (dt * dt * 0.5)) * world_scale;
        self.acceleration = Vec2::ZERO;

        self.angular_velocity += self.angular_acceleration * dt;
        self.rotation += self.angular_velocity * dt;
        self.angular_acceleration = 0.0;
    }

    /// Polygon vertices in world space: rotated, then translated
    ///
    /// Recomputed on access. Empty for circles.
    pub fn world_vertices(&self) -> Vec<Vec2> {
        match &self.shape {
            Shape::Circle { .. } => Vec::new(),
            Shape::Polygon { vertices, .. } => vertices
                .iter()
                .map(|v| v.rotate(self.rotation) + self.position)
                .collect(),
        }
    }

    /// Bounding box of the body at its current position and rotation
    pub fn aabb(&self) -> Aabb {
        match &self.shape {
            Shape::Circle { radius } => Aabb::new(self.position, *radius, *radius),
            Shape::Polygon { .. } => Aabb::from_points(&self.world_vertices()),
        }
    }

    /// Whether all kinematic state is finite
    pub fn is_state_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.rotation.is_finite()
            && self.angular_velocity.is_finite()
    }
}

/// Slot arena owning all rigid bodies in a world
///
/// Ids are assigned at insertion and stay stable until removal; freed
/// slots are recycled.
#[derive(Debug, Default)]
pub struct BodySet {
    slots: Vec<Option<RigidBody>>,
    free: Vec<u32>,
    len: usize,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a body, assigning and returning its id
    pub fn insert(&mut self, mut body: RigidBody) -> BodyId {
        let id = match self.free.pop() {
            Some(slot) => BodyId(slot),
            None => {
                self.slots.push(None);
                BodyId((self.slots.len() - 1) as u32)
            }
        };
        body.id = id;
        self.slots[id.index()] = Some(body);
        self.len += 1;
        id
    }

    /// Remove a body, returning it if present
    pub fn remove(&mut self, id: BodyId) -> Option<RigidBody> {
        let slot = self.slots.get_mut(id.index())?;
        let body = slot.take()?;
        self.free.push(id.0);
        self.len -= 1;
        Some(body)
    }

    pub fn get(&self, id: BodyId) -> Option<&RigidBody> {
        self.slots.get(id.index())?.as_ref()
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut RigidBody> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// Mutable access to two distinct bodies at once
    pub fn get_pair_mut(
        &mut self,
        a: BodyId,
        b: BodyId,
    ) -> Option<(&mut RigidBody, &mut RigidBody)> {
        let (ia, ib) = (a.index(), b.index());
        if ia == ib || ia >= self.slots.len() || ib >= self.slots.len() {
            return None;
        }
        let hi = ia.max(ib);
        let (left, right) = self.slots.split_at_mut(hi);
        let low = left[ia.min(ib)].as_mut()?;
        let high = right[0].as_mut()?;
        Some(if ia < ib { (low, high) } else { (high, low) })
    }

    /// Bodies in insertion-slot order
    pub fn iter(&self) -> impl Iterator<Item = &RigidBody> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RigidBody> {
        self.slots.iter_mut().filter_map(|slot| slot.as_mut())
    }

    /// Ids of all live bodies, in slot order
    pub fn ids(&self) -> Vec<BodyId> {
        self.iter().map(|body| body.id).collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
