//! Top-level simulation world and fixed-timestep driver

use crate::body::{BodyId, BodySet, RigidBody};
use crate::config::PhysicsConfig;
use crate::detection::CollisionDetection;
use crate::error::{PhysicsError, Result};
use crate::events::{CollisionEvent, EventCollector};
use crate::resolver::CollisionResolver;
use crate::snapshot::{BodySnapshot, WorldSnapshot};
use planar_math::{Aabb, Vec2};

/// A complete physics simulation
///
/// Owns the body arena, the collision pipeline, and the fixed-timestep
/// accumulator. Callers feed it wall-clock frame deltas through
/// [`PhysicsWorld::step`]; internally the world always advances in fixed
/// increments of the configured timestep.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    bodies: BodySet,
    detection: CollisionDetection,
    resolver: CollisionResolver,
    events: EventCollector,
    accumulated_time: f32,
}

impl PhysicsWorld {
    /// Create a world simulating bodies within `bounds`
    pub fn new(config: PhysicsConfig, bounds: Aabb) -> Result<Self> {
        config.validate()?;
        let detection = CollisionDetection::new(bounds, &config);
        let resolver = CollisionResolver::new(&config);
        Ok(Self {
            config,
            bodies: BodySet::new(),
            detection,
            resolver,
            events: EventCollector::new(),
            accumulated_time: 0.0,
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn bounds(&self) -> Aabb {
        self.detection.bounds()
    }

    /// Add a body to the simulation, returning its handle
    pub fn insert_body(&mut self, body: RigidBody) -> BodyId {
        self.bodies.insert(body)
    }

    /// Remove a body from the simulation
    pub fn remove_body(&mut self, id: BodyId) -> Result<RigidBody> {
        self.bodies.remove(id).ok_or(PhysicsError::BodyNotFound(id))
    }

    pub fn body(&self, id: BodyId) -> Result<&RigidBody> {
        self.bodies.get(id).ok_or(PhysicsError::BodyNotFound(id))
    }

    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut RigidBody> {
        self.bodies.get_mut(id).ok_or(PhysicsError::BodyNotFound(id))
    }

    pub fn bodies(&self) -> impl Iterator<Item = &RigidBody> {
        self.bodies.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Queue a force on a body for the next tick
    pub fn apply_force(&mut self, id: BodyId, force: Vec2) -> Result<()> {
        self.body_mut(id)?.apply_force(force);
        Ok(())
    }

    /// Queue a torque on a body for the next tick
    pub fn apply_torque(&mut self, id: BodyId, torque: f32) -> Result<()> {
        self.body_mut(id)?.apply_torque(torque);
        Ok(())
    }

    /// Advance the simulation by `frame_dt` seconds of wall time
    ///
    /// Runs as many fixed ticks as the accumulated time allows, up to
    /// `max_substeps` per call. Remaining lag beyond that cap is dropped
    /// so a long stall cannot snowball into ever-longer steps.
    pub fn step(&mut self, frame_dt: f32) -> Result<()> {
        if !(frame_dt >= 0.0) || !frame_dt.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "frame delta must be finite and non-negative, got {frame_dt}"
            )));
        }

        self.events.clear();
        self.accumulated_time += frame_dt;

        let dt = self.config.timestep;
        let mut substeps = 0;
        while self.accumulated_time >= dt {
            if substeps == self.config.max_substeps {
                log::debug!(
                    "dropping {:.4}s of simulation lag after {} substeps",
                    self.accumulated_time,
                    substeps
                );
                self.accumulated_time = 0.0;
                break;
            }
            self.tick(dt)?;
            self.accumulated_time -= dt;
            substeps += 1;
        }

        Ok(())
    }

    /// One fixed tick: forces, integration, collision sweep, validation
    fn tick(&mut self, dt: f32) -> Result<()> {
        let gravity = self.config.gravity;
        let world_scale = self.config.world_scale;
        for body in self.bodies.iter_mut() {
            body.apply_gravity(gravity);
            body.integrate(dt, world_scale);
        }

        self.detection
            .check_for_collision(&mut self.bodies, &self.resolver, &mut self.events);

        self.validate_bodies()
    }

    /// Evict any body whose state went non-finite
    ///
    /// The offending body is removed so the rest of the simulation stays
    /// usable, and the first eviction is reported as an error.
    fn validate_bodies(&mut self) -> Result<()> {
        let mut first_bad = None;
        for id in self.bodies.ids() {
            let finite = self
                .bodies
                .get(id)
                .map(|body| body.is_state_finite())
                .unwrap_or(true);
            if !finite {
                log::error!("body {:?} reached non-finite state, removing it", id);
                self.bodies.remove(id);
                first_bad.get_or_insert(id);
            }
        }
        match first_bad {
            Some(id) => Err(PhysicsError::NonFiniteState(id)),
            None => Ok(()),
        }
    }

    /// Collisions observed during the most recent [`PhysicsWorld::step`]
    pub fn collision_events(&self) -> &[CollisionEvent] {
        self.events.events()
    }

    /// Serializable copy of the current state for rendering
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            bodies: self.bodies.iter().map(BodySnapshot::capture).collect(),
            quadtree_nodes: self.detection.quadtree_boundaries().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn world_with(config: PhysicsConfig) -> PhysicsWorld {
        let bounds = Aabb::new(Vec2::new(400.0, 300.0), 400.0, 300.0);
        PhysicsWorld::new(config, bounds).unwrap()
    }

    fn no_gravity() -> PhysicsConfig {
        PhysicsConfig::default().with_gravity(0.0, 0.0)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = PhysicsConfig::default().with_timestep(0.0);
        let bounds = Aabb::new(Vec2::ZERO, 10.0, 10.0);
        assert!(PhysicsWorld::new(config, bounds).is_err());
    }

    #[test]
    fn test_body_falls_under_gravity() {
        let mut world = world_with(PhysicsConfig::default());
        let id = world.insert_body(
            RigidBody::circle(Vec2::new(400.0, 100.0), 10.0, 1.0).unwrap(),
        );

        world.step(1.0 / 60.0).unwrap();

        let body = world.body(id).unwrap();
        assert!(body.velocity.y > 0.0, "gravity should pull downward (+y)");
        assert!(body.position.y > 100.0);
        assert_relative_eq!(body.position.x, 400.0);
    }

    #[test]
    fn test_static_body_ignores_gravity() {
        let mut world = world_with(PhysicsConfig::default());
        let id = world.insert_body(
            RigidBody::square(Vec2::new(400.0, 500.0), 50.0, 1.0)
                .unwrap()
                .fixed(),
        );

        for _ in 0..10 {
            world.step(1.0 / 60.0).unwrap();
        }

        assert_eq!(world.body(id).unwrap().position, Vec2::new(400.0, 500.0));
    }

    #[test]
    fn test_accumulator_only_ticks_on_full_timesteps() {
        let mut world = world_with(PhysicsConfig::default());
        let id = world.insert_body(
            RigidBody::circle(Vec2::new(400.0, 100.0), 10.0, 1.0).unwrap(),
        );

        // Half a timestep: nothing should move yet
        world.step(0.5 / 60.0).unwrap();
        assert_eq!(world.body(id).unwrap().position, Vec2::new(400.0, 100.0));

        // The second half completes one tick
        world.step(0.5 / 60.0).unwrap();
        assert!(world.body(id).unwrap().position.y > 100.0);
    }

    #[test]
    fn test_lag_is_dropped_after_substep_cap() {
        let mut world = world_with(no_gravity());
        let id = world.insert_body(
            RigidBody::circle(Vec2::new(100.0, 100.0), 10.0, 1.0)
                .unwrap()
                .with_velocity(Vec2::new(1.0, 0.0)),
        );

        // A huge stall: only max_substeps ticks run, the rest is discarded
        world.step(10.0).unwrap();
        let after_stall = world.body(id).unwrap().position.x;
        let max = world.config().max_substeps as f32;
        let expected =
            100.0 + max * world.config().timestep * world.config().world_scale;
        assert_relative_eq!(after_stall, expected, epsilon = 1e-3);

        // And the accumulator was reset: a zero-dt step runs nothing
        world.step(0.0).unwrap();
        assert_relative_eq!(world.body(id).unwrap().position.x, after_stall);
    }

    #[test]
    fn test_collision_produces_event_and_separation() {
        let mut world = world_with(no_gravity());
        let a = world.insert_body(
            RigidBody::circle(Vec2::new(390.0, 300.0), 10.0, 1.0)
                .unwrap()
                .with_velocity(Vec2::new(0.05, 0.0)),
        );
        let b = world.insert_body(
            RigidBody::circle(Vec2::new(405.0, 300.0), 10.0, 1.0)
                .unwrap()
                .with_velocity(Vec2::new(-0.05, 0.0)),
        );

        world.step(1.0 / 60.0).unwrap();

        assert_eq!(world.collision_events().len(), 1);
        // After resolution the pair is moving apart
        let va = world.body(a).unwrap().velocity;
        let vb = world.body(b).unwrap().velocity;
        assert!(va.x < vb.x);
    }

    #[test]
    fn test_resting_stack_stays_in_place() {
        let mut world = world_with(no_gravity());
        // Two squares stacked with a hair of overlap
        let top = world.insert_body(
            RigidBody::square(Vec2::new(400.0, 290.1), 10.0, 1.0).unwrap(),
        );
        let bottom = world.insert_body(
            RigidBody::square(Vec2::new(400.0, 300.0), 10.0, 1.0).unwrap(),
        );

        for _ in 0..60 {
            world.step(1.0 / 60.0).unwrap();
        }

        // Correction acts only along the vertical normal: no sideways drift
        assert_relative_eq!(world.body(top).unwrap().position.x, 400.0, epsilon = 1e-3);
        assert_relative_eq!(
            world.body(bottom).unwrap().position.x,
            400.0,
            epsilon = 1e-3
        );
        let gap = world.body(bottom).unwrap().position.y
            - world.body(top).unwrap().position.y;
        assert!(gap >= 10.0 - world.config().slop - 1e-3);
    }

    #[test]
    fn test_square_resting_on_static_square_stays_bounded() {
        let mut world = world_with(PhysicsConfig::default());
        let floor = world.insert_body(
            RigidBody::square(Vec2::new(400.0, 300.0), 10.0, 1.0)
                .unwrap()
                .fixed(),
        );
        let top = world.insert_body(
            RigidBody::square(Vec2::new(400.0, 290.0), 10.0, 1.0).unwrap(),
        );

        // Under gravity the resting body may bounce on the contact, but it
        // must never tunnel in or wander sideways
        for _ in 0..100 {
            world.step(1.0 / 60.0).unwrap();
            let gap = world.body(floor).unwrap().position.y
                - world.body(top).unwrap().position.y;
            assert!(gap > 7.0, "body sank into its support, gap {gap}");
            // Sequential contact solving leaves tiny asymmetric friction
            // impulses, so sideways motion is bounded rather than zero
            assert!(
                (world.body(top).unwrap().position.x - 400.0).abs() < 1.0,
                "vertical contact produced runaway sideways drift"
            );
        }
    }

    #[test]
    fn test_non_finite_body_is_evicted() {
        let mut world = world_with(no_gravity());
        let bad = world.insert_body(
            RigidBody::circle(Vec2::new(400.0, 300.0), 10.0, 1.0).unwrap(),
        );
        let good = world.insert_body(
            RigidBody::circle(Vec2::new(100.0, 100.0), 10.0, 1.0).unwrap(),
        );

        world
            .apply_force(bad, Vec2::new(f32::INFINITY, 0.0))
            .unwrap();
        let err = world.step(1.0 / 60.0).unwrap_err();
        assert!(matches!(err, PhysicsError::NonFiniteState(id) if id == bad));

        // The poisoned body is gone, the healthy one survives
        assert!(world.body(bad).is_err());
        assert!(world.body(good).is_ok());
    }

    #[test]
    fn test_missing_body_errors() {
        let mut world = world_with(no_gravity());
        let id = world.insert_body(RigidBody::circle(Vec2::ZERO, 1.0, 1.0).unwrap());
        world.remove_body(id).unwrap();

        assert!(matches!(
            world.apply_force(id, Vec2::X),
            Err(PhysicsError::BodyNotFound(_))
        ));
    }

    #[test]
    fn test_snapshot_captures_all_bodies() {
        let mut world = world_with(no_gravity());
        world.insert_body(RigidBody::circle(Vec2::new(100.0, 100.0), 5.0, 1.0).unwrap());
        world.insert_body(RigidBody::square(Vec2::new(200.0, 200.0), 10.0, 1.0).unwrap());

        world.step(1.0 / 60.0).unwrap();
        let snap = world.snapshot();
        assert_eq!(snap.bodies.len(), 2);
        assert!(!snap.quadtree_nodes.is_empty());
    }
}
