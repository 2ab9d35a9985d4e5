//! Planar Physics - 2D Rigid Body Simulation
//!
//! This crate provides impulse-based 2D rigid body dynamics for canvas-style
//! coordinate systems (origin top-left, +Y down).
//!
//! # Features
//!
//! - Circle and convex polygon rigid bodies (dynamic and static)
//! - Quadtree broad phase over body bounding boxes
//! - Separating Axis Theorem narrow phase with clipped contact manifolds
//! - Impulse resolution with restitution, Coulomb friction, and
//!   positional penetration correction
//! - Fixed-timestep stepping with accumulated wall-clock time
//! - Serializable world snapshots for rendering
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  PhysicsWorld                    │
//! │  ┌─────────┐  ┌───────────────────────────────┐  │
//! │  │ BodySet │  │      CollisionDetection       │  │
//! │  └─────────┘  │  ┌──────────┐  ┌───────────┐  │  │
//! │               │  │ Quadtree │  │ SAT tests │  │  │
//! │  ┌─────────┐  │  └──────────┘  └───────────┘  │  │
//! │  │ Events  │  └───────────────────────────────┘  │
//! │  └─────────┘  ┌───────────────────────────────┐  │
//! │               │       CollisionResolver       │  │
//! │               │  (impulses, friction, slop)   │  │
//! │               └───────────────────────────────┘  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use planar_physics::prelude::*;
//! use planar_math::{Aabb, Vec2};
//!
//! // A world covering an 800x600 canvas
//! let bounds = Aabb::new(Vec2::new(400.0, 300.0), 400.0, 300.0);
//! let mut world = PhysicsWorld::new(PhysicsConfig::default(), bounds).unwrap();
//!
//! // A ball dropping onto a static floor
//! let ball = world.insert_body(
//!     RigidBody::circle(Vec2::new(400.0, 100.0), 15.0, 1.0).unwrap(),
//! );
//! world.insert_body(
//!     RigidBody::rectangle(Vec2::new(400.0, 580.0), 800.0, 40.0, 1.0)
//!         .unwrap()
//!         .fixed(),
//! );
//!
//! // Step with wall-clock frame deltas
//! world.step(1.0 / 60.0).unwrap();
//! assert!(world.body(ball).unwrap().velocity.y > 0.0);
//! ```

pub mod body;
pub mod config;
pub mod contact;
pub mod detection;
pub mod error;
pub mod events;
pub mod quadtree;
pub mod resolver;
pub mod snapshot;
pub mod world;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::body::{BodyId, BodySet, RigidBody, Shape};
    pub use crate::config::PhysicsConfig;
    pub use crate::contact::{CollisionData, ContactSet};
    pub use crate::error::{PhysicsError, Result};
    pub use crate::events::{CollisionEvent, EventCollector};
    pub use crate::snapshot::{BodySnapshot, ShapeSnapshot, WorldSnapshot};
    pub use crate::world::PhysicsWorld;
}

pub use prelude::*;
