//! Contact data produced by the narrow phase

use crate::body::BodyId;
use planar_math::Vec2;

/// Up to two world-space contact points sharing one collision normal
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactSet {
    points: [Vec2; 2],
    len: u8,
}

impl ContactSet {
    pub const fn new() -> Self {
        Self {
            points: [Vec2::ZERO; 2],
            len: 0,
        }
    }

    /// Single-point set
    pub fn one(point: Vec2) -> Self {
        let mut set = Self::new();
        set.push(point);
        set
    }

    /// Append a point; a manifold never holds more than two
    pub fn push(&mut self, point: Vec2) {
        debug_assert!(self.len < 2, "contact manifold overflow");
        if (self.len as usize) < self.points.len() {
            self.points[self.len as usize] = point;
            self.len += 1;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Vec2] {
        &self.points[..self.len as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec2> {
        self.as_slice().iter()
    }
}

/// Result of one narrow-phase pair test
///
/// Transient: produced per detected pair and consumed immediately by the
/// resolver, never retained across ticks.
#[derive(Debug, Clone, Copy)]
pub struct CollisionData {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Unit collision normal, oriented from body A toward body B
    pub normal: Vec2,
    /// Non-negative penetration depth along the normal
    pub penetration: f32,
    /// World-space contact points (0 to 2)
    pub contacts: ContactSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_set_capacity() {
        let mut set = ContactSet::new();
        assert!(set.is_empty());
        set.push(Vec2::new(1.0, 0.0));
        set.push(Vec2::new(2.0, 0.0));
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[1], Vec2::new(2.0, 0.0));
    }
}
