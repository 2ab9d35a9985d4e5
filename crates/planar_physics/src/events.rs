//! Collision events collected during a tick

use crate::body::BodyId;
use crate::contact::{CollisionData, ContactSet};
use planar_math::Vec2;

/// Record of one collision observed during a tick
///
/// Captured from the narrow-phase result before resolution mutates the
/// bodies, so the stored velocities-of-approach geometry reflects the
/// moment of impact.
#[derive(Debug, Clone, Copy)]
pub struct CollisionEvent {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Unit normal from body A toward body B
    pub normal: Vec2,
    pub penetration: f32,
    pub contacts: ContactSet,
}

impl CollisionEvent {
    pub(crate) fn from_data(data: &CollisionData) -> Self {
        Self {
            body_a: data.body_a,
            body_b: data.body_b,
            normal: data.normal,
            penetration: data.penetration,
            contacts: data.contacts,
        }
    }
}

/// Per-tick collision event buffer
///
/// Cleared at the start of every step; consumers read it between steps.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<CollisionEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn push(&mut self, event: CollisionEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_clears_between_ticks() {
        let mut collector = EventCollector::new();
        collector.push(CollisionEvent {
            body_a: BodyId(0),
            body_b: BodyId(1),
            normal: Vec2::X,
            penetration: 0.5,
            contacts: ContactSet::one(Vec2::ZERO),
        });
        assert_eq!(collector.len(), 1);

        collector.clear();
        assert!(collector.is_empty());
    }
}
