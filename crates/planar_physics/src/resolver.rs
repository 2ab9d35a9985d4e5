//! Impulse-based collision resolution with friction and angular response

use crate::body::{BodySet, RigidBody};
use crate::config::PhysicsConfig;
use crate::contact::CollisionData;
use planar_math::vector::cross_scalar_vector;
use planar_math::Vec2;

/// Resolves detected collisions by mutating body velocities and positions
///
/// Velocity changes come from normal and Coulomb-friction impulses per
/// contact point; interpenetration is corrected positionally, separate
/// from the velocity solve (Baumgarte-style).
pub struct CollisionResolver {
    restitution: f32,
    friction: f32,
    correction_percent: f32,
    slop: f32,
}

impl CollisionResolver {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            restitution: config.restitution,
            friction: config.friction,
            correction_percent: config.correction_percent,
            slop: config.slop,
        }
    }

    /// Apply impulses and positional correction for one collision
    ///
    /// No-op when both bodies are static.
    pub fn execute(&self, data: &CollisionData, bodies: &mut BodySet) {
        let Some((body_a, body_b)) = bodies.get_pair_mut(data.body_a, data.body_b) else {
            return;
        };
        if body_a.inv_mass() == 0.0 && body_b.inv_mass() == 0.0 {
            return;
        }

        self.correct_positions(body_a, body_b, data.normal, data.penetration);

        let normal = data.normal;
        let contact_count = data.contacts.len();
        if contact_count == 0 {
            return;
        }
        let share = 1.0 / contact_count as f32;

        for &contact in data.contacts.iter() {
            let lever_a = contact - body_a.position;
            let lever_b = contact - body_b.position;

            let relative_velocity = (body_b.velocity
                + cross_scalar_vector(body_b.angular_velocity, lever_b))
                - (body_a.velocity + cross_scalar_vector(body_a.angular_velocity, lever_a));

            let closing_speed = relative_velocity.dot(normal);
            if closing_speed > 0.0 {
                // Already separating at this contact
                continue;
            }

            let torque_arm_a = lever_a.cross(normal);
            let torque_arm_b = lever_b.cross(normal);
            let effective_inv_mass = body_a.inv_mass()
                + body_b.inv_mass()
                + torque_arm_a * torque_arm_a * body_a.inv_inertia()
                + torque_arm_b * torque_arm_b * body_b.inv_inertia();
            if effective_inv_mass <= 0.0 {
                continue;
            }

            let impulse_magnitude =
                -(1.0 + self.restitution) * closing_speed / effective_inv_mass * share;
            apply_impulse(body_a, body_b, lever_a, lever_b, normal * impulse_magnitude);

            // Coulomb friction along the tangential rest of the relative
            // velocity; skipped when the contact velocity is purely normal
            let tangential = relative_velocity - normal * closing_speed;
            if tangential.length_squared() > 1e-12 {
                let tangent = tangential.normalize();
                let friction_magnitude = -relative_velocity.dot(tangent) / effective_inv_mass * share;
                let max_friction = self.friction * impulse_magnitude.abs();
                let friction_magnitude = friction_magnitude.clamp(-max_friction, max_friction);
                apply_impulse(body_a, body_b, lever_a, lever_b, tangent * friction_magnitude);
            }
        }
    }

    /// Move the bodies apart along the normal, split by inverse-mass share
    ///
    /// Penetration below the slop threshold is tolerated to keep resting
    /// contacts from jittering.
    fn correct_positions(
        &self,
        body_a: &mut RigidBody,
        body_b: &mut RigidBody,
        normal: Vec2,
        penetration: f32,
    ) {
        let total_inv_mass = body_a.inv_mass() + body_b.inv_mass();
        if total_inv_mass <= 0.0 {
            return;
        }

        let magnitude =
            (penetration - self.slop).max(0.0) / total_inv_mass * self.correction_percent;
        let correction = normal * magnitude;

        body_a.position -= correction * body_a.inv_mass();
        body_b.position += correction * body_b.inv_mass();
    }
}

/// Apply equal and opposite linear + angular impulses at a contact
fn apply_impulse(
    body_a: &mut RigidBody,
    body_b: &mut RigidBody,
    lever_a: Vec2,
    lever_b: Vec2,
    impulse: Vec2,
) {
    body_a.velocity -= impulse * body_a.inv_mass();
    body_a.angular_velocity -= lever_a.cross(impulse) * body_a.inv_inertia();

    body_b.velocity += impulse * body_b.inv_mass();
    body_b.angular_velocity += lever_b.cross(impulse) * body_b.inv_inertia();
}
