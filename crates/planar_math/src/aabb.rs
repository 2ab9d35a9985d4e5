//! Axis-aligned bounding boxes for broad-phase queries

use crate::vector::Vec2;

/// Axis-Aligned Bounding Box, stored as center plus half-extents
///
/// Half-extents are expected to be non-negative.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub center: Vec2,
    pub half_width: f32,
    pub half_height: f32,
}

impl Aabb {
    /// Create from center and half-extents
    #[inline]
    pub const fn new(center: Vec2, half_width: f32, half_height: f32) -> Self {
        Self {
            center,
            half_width,
            half_height,
        }
    }

    /// Create from min and max corners
    #[inline]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_width: (max.x - min.x) * 0.5,
            half_height: (max.y - min.y) * 0.5,
        }
    }

    /// Tightest box around a set of points
    ///
    /// Returns a degenerate zero-extent box at the origin for an empty
    /// slice.
    pub fn from_points(points: &[Vec2]) -> Self {
        let Some(&first) = points.first() else {
            return Self::new(Vec2::ZERO, 0.0, 0.0);
        };

        let mut min = first;
        let mut max = first;
        for &point in &points[1..] {
            min = min.min(point);
            max = max.max(point);
        }
        Self::from_min_max(min, max)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - Vec2::new(self.half_width, self.half_height)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + Vec2::new(self.half_width, self.half_height)
    }

    /// Box with both half-extents multiplied by `factor`, same center
    #[inline]
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            center: self.center,
            half_width: self.half_width * factor,
            half_height: self.half_height * factor,
        }
    }

    /// Check if a point is inside (inclusive bounds)
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.center.x - self.half_width
            && point.x <= self.center.x + self.half_width
            && point.y >= self.center.y - self.half_height
            && point.y <= self.center.y + self.half_height
    }

    /// Check if two boxes overlap
    ///
    /// False only when one box is strictly outside the other along x or y.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        (self.center.x - other.center.x).abs() <= self.half_width + other.half_width
            && (self.center.y - other.center.y).abs() <= self.half_height + other.half_height
    }
}
