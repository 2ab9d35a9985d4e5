//! Narrow-phase collision detection
//!
//! Dispatches shape pairs to circle/circle, circle/polygon, and
//! polygon/polygon tests. Polygon tests use the Separating Axis Theorem
//! and exit on the first separating axis found. Every returned manifold
//! carries a unit normal oriented from body A toward body B.

use crate::body::{BodyId, BodySet, RigidBody, Shape};
use crate::config::PhysicsConfig;
use crate::contact::{CollisionData, ContactSet};
use crate::events::{CollisionEvent, EventCollector};
use crate::quadtree::Quadtree;
use crate::resolver::CollisionResolver;
use planar_math::{Aabb, Vec2};
use std::collections::HashSet;

const GEOMETRY_EPSILON: f32 = 1e-6;

/// Broad-phase + narrow-phase orchestrator
///
/// Owns the pooled quadtree and the per-sweep scratch buffers so that
/// stepping does not allocate once the pools are warm.
pub struct CollisionDetection {
    bounds: Aabb,
    quadtree: Quadtree,
    iterations: usize,
    candidates: Vec<BodyId>,
    tested: HashSet<(u32, u32)>,
}

impl CollisionDetection {
    /// Create a detector over the given world bounds
    pub fn new(bounds: Aabb, config: &PhysicsConfig) -> Self {
        Self {
            bounds,
            quadtree: Quadtree::new(
                config.quadtree_capacity,
                config.quadtree_max_depth,
                config.quadtree_looseness,
            ),
            iterations: config.solver_iterations,
            candidates: Vec::new(),
            tested: HashSet::new(),
        }
    }

    /// World bounds covered by the broad phase
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Quadtree node boundaries from the last sweep, for debug rendering
    pub fn quadtree_boundaries(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.quadtree.node_boundaries()
    }

    /// Run one tick's collision sweep
    ///
    /// Rebuilds the quadtree from current body positions, then runs the
    /// fixed relaxation iteration count: every body queries its own AABB,
    /// each distinct candidate pair is tested, and hits are resolved in
    /// place. Events are recorded on the first iteration only, so each
    /// colliding pair is reported once per tick.
    pub fn check_for_collision(
        &mut self,
        bodies: &mut BodySet,
        resolver: &CollisionResolver,
        events: &mut EventCollector,
    ) {
        self.quadtree.rebuild(self.bounds);
        let ids = bodies.ids();
        for &id in &ids {
            if let Some(body) = bodies.get(id) {
                self.quadtree.insert(id, body.aabb());
            }
        }

        for iteration in 0..self.iterations {
            self.tested.clear();

            for &id in &ids {
                let Some(body) = bodies.get(id) else { continue };
                let range = body.aabb();

                self.candidates.clear();
                self.quadtree.query(&range, &mut self.candidates);

                for i in 0..self.candidates.len() {
                    let other = self.candidates[i];
                    if other == id {
                        continue;
                    }
                    let key = pair_key(id, other);
                    if !self.tested.insert(key) {
                        continue;
                    }

                    let (Some(a), Some(b)) = (bodies.get(id), bodies.get(other)) else {
                        continue;
                    };
                    if let Some(data) = detect(a, b) {
                        resolver.execute(&data, bodies);
                        if iteration == 0 {
                            events.push(CollisionEvent::from_data(&data));
                        }
                    }
                }
            }
        }
    }
}

fn pair_key(a: BodyId, b: BodyId) -> (u32, u32) {
    let (a, b) = (a.index() as u32, b.index() as u32);
    if a < b { (a, b) } else { (b, a) }
}

/// Narrow-phase manifold before body ids are attached
struct Manifold {
    normal: Vec2,
    penetration: f32,
    contacts: ContactSet,
}

/// Test a body pair, dispatched by shape variant
///
/// Returns `None` when the shapes do not overlap. The normal of a
/// returned manifold satisfies `dot(normal, pos_b - pos_a) >= 0`.
pub fn detect(a: &RigidBody, b: &RigidBody) -> Option<CollisionData> {
    let manifold = match (a.shape(), b.shape()) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(a.position, *ra, b.position, *rb)
        }
        (Shape::Circle { radius }, Shape::Polygon { .. }) => {
            circle_polygon(a.position, *radius, b)
        }
        (Shape::Polygon { .. }, Shape::Circle { radius }) => {
            // Computed circle-first; flip the normal back into a->b order
            circle_polygon(b.position, *radius, a).map(|m| Manifold {
                normal: -m.normal,
                ..m
            })
        }
        (Shape::Polygon { .. }, Shape::Polygon { .. }) => polygon_polygon(a, b),
    }?;

    Some(CollisionData {
        body_a: a.id(),
        body_b: b.id(),
        normal: manifold.normal,
        penetration: manifold.penetration,
        contacts: manifold.contacts,
    })
}

/// Circles overlap iff center distance is within the radii sum
fn circle_circle(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> Option<Manifold> {
    let radii = radius_a + radius_b;
    let delta = pos_b - pos_a;
    let distance = delta.length();

    if distance > radii {
        return None;
    }

    // Coincident centers would produce a zero-length normal; pick a
    // fixed axis instead of letting NaN through.
    let (normal, penetration) = if distance > GEOMETRY_EPSILON {
        (delta / distance, radii - distance)
    } else {
        (Vec2::X, radii)
    };

    let contact = pos_a + normal * radius_a;
    Some(Manifold {
        normal,
        penetration,
        contacts: ContactSet::one(contact),
    })
}

/// SAT test of a circle against a convex polygon
///
/// Axes are the polygon's face normals plus the axis from the circle
/// center to the nearest polygon vertex. The returned normal points from
/// the circle toward the polygon.
fn circle_polygon(center: Vec2, radius: f32, polygon: &RigidBody) -> Option<Manifold> {
    let vertices = polygon.world_vertices();
    debug_assert!(vertices.len() >= 3);

    let mut axes = face_normals(&vertices);
    if let Some(axis) = circle_axis(center, &vertices) {
        axes.push(axis);
    }

    let mut min_penetration = f32::INFINITY;
    let mut best_axis = Vec2::ZERO;

    for axis in axes {
        let center_projection = center.dot(axis);
        let (circle_min, circle_max) = (center_projection - radius, center_projection + radius);
        let (poly_min, poly_max) = project_polygon(&vertices, axis);

        if circle_max < poly_min || circle_min > poly_max {
            return None;
        }

        let overlap = (circle_max - poly_min).min(poly_max - circle_min);
        if overlap < min_penetration {
            min_penetration = overlap;
            best_axis = axis;
        }
    }

    let normal = orient_axis(center, polygon.position, best_axis);
    let contact = closest_point_on_polygon(center, &vertices);

    Some(Manifold {
        normal,
        penetration: min_penetration,
        contacts: ContactSet::one(contact),
    })
}

/// SAT test of two convex polygons with a clipped two-point manifold
fn polygon_polygon(a: &RigidBody, b: &RigidBody) -> Option<Manifold> {
    let verts_a = a.world_vertices();
    let verts_b = b.world_vertices();
    let axes_a = face_normals(&verts_a);
    let axes_b = face_normals(&verts_b);

    let mut min_penetration = f32::INFINITY;
    let mut best_axis = Vec2::ZERO;
    let mut reference_is_a = true;

    for (index, axis) in axes_a.iter().chain(axes_b.iter()).enumerate() {
        let (min_a, max_a) = project_polygon(&verts_a, *axis);
        let (min_b, max_b) = project_polygon(&verts_b, *axis);

        if max_a < min_b || min_a > max_b {
            return None;
        }

        let overlap = (max_a - min_b).min(max_b - min_a);
        if overlap < min_penetration {
            min_penetration = overlap;
            best_axis = *axis;
            reference_is_a = index < axes_a.len();
        }
    }

    let normal = orient_axis(a.position, b.position, best_axis);

    // The polygon that produced the minimal-overlap axis owns the
    // reference face; the other polygon is incident. The reference face
    // must point from the reference body toward the incident one.
    let (reference, incident, face_dir) = if reference_is_a {
        (&verts_a, &verts_b, normal)
    } else {
        (&verts_b, &verts_a, -normal)
    };

    let contacts = clip_contacts(reference, incident, face_dir);

    Some(Manifold {
        normal,
        penetration: min_penetration,
        contacts,
    })
}

/// Outward unit normals of each polygon face (counterclockwise winding)
fn face_normals(vertices: &[Vec2]) -> Vec<Vec2> {
    (0..vertices.len())
        .map(|i| {
            let edge = vertices[(i + 1) % vertices.len()] - vertices[i];
            Vec2::new(edge.y, -edge.x).normalize()
        })
        .collect()
}

/// Projection interval of polygon vertices onto an axis
fn project_polygon(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    let mut min = vertices[0].dot(axis);
    let mut max = min;
    for vertex in &vertices[1..] {
        let projection = vertex.dot(axis);
        min = min.min(projection);
        max = max.max(projection);
    }
    (min, max)
}

/// Axis from the circle center to the nearest polygon vertex
///
/// `None` when the center coincides with the nearest vertex; the face
/// normals alone suffice in that case.
fn circle_axis(center: Vec2, vertices: &[Vec2]) -> Option<Vec2> {
    let mut closest = vertices[0];
    let mut closest_distance_sq = (center - vertices[0]).length_squared();

    for &vertex in &vertices[1..] {
        let distance_sq = (center - vertex).length_squared();
        if distance_sq < closest_distance_sq {
            closest_distance_sq = distance_sq;
            closest = vertex;
        }
    }

    let axis = (center - closest).normalize();
    (axis != Vec2::ZERO).then_some(axis)
}

/// Flip `axis` if needed so it points from `pos_a` toward `pos_b`
fn orient_axis(pos_a: Vec2, pos_b: Vec2, axis: Vec2) -> Vec2 {
    if (pos_b - pos_a).dot(axis) < 0.0 {
        -axis
    } else {
        axis
    }
}

/// Closest point to `point` over all polygon edges
///
/// Segment projection clamped to [0, 1] per edge.
fn closest_point_on_polygon(point: Vec2, vertices: &[Vec2]) -> Vec2 {
    let mut best = vertices[0];
    let mut best_distance_sq = f32::INFINITY;

    for i in 0..vertices.len() {
        let start = vertices[i];
        let end = vertices[(i + 1) % vertices.len()];
        let candidate = closest_point_on_segment(point, start, end);
        let distance_sq = (point - candidate).length_squared();
        if distance_sq < best_distance_sq {
            best_distance_sq = distance_sq;
            best = candidate;
        }
    }

    best
}

fn closest_point_on_segment(point: Vec2, start: Vec2, end: Vec2) -> Vec2 {
    let edge = end - start;
    let length_sq = edge.length_squared();
    if length_sq < GEOMETRY_EPSILON {
        return start;
    }
    let t = ((point - start).dot(edge) / length_sq).clamp(0.0, 1.0);
    start + edge * t
}

/// Edge of `vertices` whose outward normal is most aligned (or, with
/// `most_aligned` false, most anti-aligned) with `direction`
fn select_edge(vertices: &[Vec2], direction: Vec2, most_aligned: bool) -> (Vec2, Vec2) {
    let mut best_index = 0;
    let mut best_dot = if most_aligned {
        f32::NEG_INFINITY
    } else {
        f32::INFINITY
    };

    for i in 0..vertices.len() {
        let edge = vertices[(i + 1) % vertices.len()] - vertices[i];
        let normal = Vec2::new(edge.y, -edge.x).normalize();
        let alignment = normal.dot(direction);
        let better = if most_aligned {
            alignment > best_dot
        } else {
            alignment < best_dot
        };
        if better {
            best_dot = alignment;
            best_index = i;
        }
    }

    (
        vertices[best_index],
        vertices[(best_index + 1) % vertices.len()],
    )
}

/// Build the polygon-polygon contact manifold
///
/// Clips the incident edge against the two side planes erected at the
/// reference edge endpoints, then projects survivors onto the reference
/// face to remove tangential drift. Yields 0, 1, or 2 points, all within
/// the reference edge's extent.
fn clip_contacts(reference: &[Vec2], incident: &[Vec2], face_dir: Vec2) -> ContactSet {
    let (ref_start, ref_end) = select_edge(reference, face_dir, true);
    let (inc_start, inc_end) = select_edge(incident, face_dir, false);

    let tangent = (ref_end - ref_start).normalize();
    if tangent == Vec2::ZERO {
        return ContactSet::new();
    }

    // First side plane: keep what lies past the reference edge start
    let first = clip_segment(inc_start, inc_end, ref_start, tangent);
    let clipped = match first.len() {
        2 => clip_segment(first.as_slice()[0], first.as_slice()[1], ref_end, -tangent),
        1 => {
            let point = first.as_slice()[0];
            if (point - ref_end).dot(-tangent) >= 0.0 {
                ContactSet::one(point)
            } else {
                ContactSet::new()
            }
        }
        _ => ContactSet::new(),
    };

    let mut contacts = ContactSet::new();
    for &point in clipped.iter() {
        let drift = (point - ref_start).dot(face_dir);
        contacts.push(point - face_dir * drift);
    }
    contacts
}

/// Clip a segment against the half-plane `dot(p - plane_point, plane_normal) >= 0`
fn clip_segment(start: Vec2, end: Vec2, plane_point: Vec2, plane_normal: Vec2) -> ContactSet {
    let mut out = ContactSet::new();
    let distance_start = (start - plane_point).dot(plane_normal);
    let distance_end = (end - plane_point).dot(plane_normal);

    if distance_start >= 0.0 {
        out.push(start);
    }
    if distance_end >= 0.0 {
        out.push(end);
    }
    if distance_start * distance_end < 0.0 {
        let t = distance_start / (distance_start - distance_end);
        out.push(start + (end - start) * t);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::events::EventCollector;
    use approx::assert_relative_eq;

    fn circle(x: f32, y: f32, radius: f32) -> RigidBody {
        RigidBody::circle(Vec2::new(x, y), radius, 1.0).unwrap()
    }

    fn square(x: f32, y: f32, size: f32) -> RigidBody {
        RigidBody::square(Vec2::new(x, y), size, 1.0).unwrap()
    }

    #[test]
    fn test_circle_circle_hit() {
        let a = circle(0.0, 0.0, 10.0);
        let b = circle(15.0, 0.0, 10.0);

        let data = detect(&a, &b).unwrap();
        assert_relative_eq!(data.penetration, 5.0);
        assert_relative_eq!(data.normal.x, 1.0);
        assert_relative_eq!(data.normal.y, 0.0);
        assert_eq!(data.contacts.len(), 1);
        assert_relative_eq!(data.contacts.as_slice()[0].x, 10.0);
    }

    #[test]
    fn test_circle_circle_miss() {
        let a = circle(0.0, 0.0, 10.0);
        let b = circle(25.0, 0.0, 10.0);
        assert!(detect(&a, &b).is_none());
    }

    #[test]
    fn test_circle_circle_touching_counts() {
        let a = circle(0.0, 0.0, 10.0);
        let b = circle(20.0, 0.0, 10.0);
        let data = detect(&a, &b).unwrap();
        assert_relative_eq!(data.penetration, 0.0);
    }

    #[test]
    fn test_coincident_circles_have_finite_normal() {
        let a = circle(5.0, 5.0, 3.0);
        let b = circle(5.0, 5.0, 3.0);
        let data = detect(&a, &b).unwrap();
        assert!(data.normal.is_finite());
        assert_relative_eq!(data.normal.length(), 1.0);
        assert_relative_eq!(data.penetration, 6.0);
    }

    #[test]
    fn test_normal_points_a_to_b() {
        let cases = [
            (circle(0.0, 0.0, 10.0), circle(15.0, 0.0, 10.0)),
            (circle(15.0, 0.0, 10.0), circle(0.0, 0.0, 10.0)),
            (square(0.0, 0.0, 10.0), square(8.0, 2.0, 10.0)),
            (circle(0.0, 0.0, 6.0), square(8.0, 0.0, 10.0)),
            (square(8.0, 0.0, 10.0), circle(0.0, 0.0, 6.0)),
        ];
        for (a, b) in cases {
            let data = detect(&a, &b).unwrap();
            assert!(data.normal.dot(b.position - a.position) >= 0.0);
            assert_relative_eq!(data.normal.length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_sat_no_false_positive() {
        // Clearly separated along x
        let a = square(0.0, 0.0, 10.0);
        let b = square(20.0, 0.0, 10.0);
        assert!(detect(&a, &b).is_none());

        // Diagonal separation only visible on a rotated axis
        let a = square(0.0, 0.0, 10.0).with_rotation(std::f32::consts::FRAC_PI_4);
        let b = square(14.0, 14.0, 10.0);
        assert!(detect(&a, &b).is_none());
    }

    #[test]
    fn test_circle_polygon_hit() {
        let a = circle(0.0, 0.0, 6.0);
        let b = square(8.0, 0.0, 10.0); // face at x = 3
        let data = detect(&a, &b).unwrap();

        assert_relative_eq!(data.penetration, 3.0, epsilon = 1e-5);
        assert_relative_eq!(data.normal.x, 1.0, epsilon = 1e-5);
        // Contact is the closest point on the square's edge
        assert_eq!(data.contacts.len(), 1);
        assert_relative_eq!(data.contacts.as_slice()[0].x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(data.contacts.as_slice()[0].y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_circle_polygon_miss_on_vertex_axis() {
        // Circle near a corner: both face axes overlap slightly but the
        // corner-to-center axis separates
        let a = circle(6.8, 6.8, 2.0);
        let b = square(0.0, 0.0, 10.0); // corners at (+-5, +-5)
        assert!(detect(&a, &b).is_none());
    }

    #[test]
    fn test_polygon_polygon_two_contact_points() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(8.0, 0.0, 10.0);
        let data = detect(&a, &b).unwrap();

        assert_relative_eq!(data.penetration, 2.0, epsilon = 1e-5);
        assert_relative_eq!(data.normal.x, 1.0, epsilon = 1e-5);
        assert_eq!(data.contacts.len(), 2);

        // Both contacts lie on the reference face (x = 5) within its extent
        for point in data.contacts.iter() {
            assert_relative_eq!(point.x, 5.0, epsilon = 1e-4);
            assert!(point.y >= -5.0 - 1e-4 && point.y <= 5.0 + 1e-4);
        }
    }

    #[test]
    fn test_clip_yields_at_most_two_points() {
        let out = clip_segment(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::ZERO,
            Vec2::X,
        );
        assert!(out.len() <= 2);

        let out = clip_segment(
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::ZERO,
            Vec2::X,
        );
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_offset_squares_clip_within_reference_extent() {
        // Overlapping squares offset vertically: the incident edge sticks
        // out past the reference edge and must be clipped back
        let a = square(0.0, 0.0, 10.0);
        let b = square(8.0, 4.0, 10.0);
        let data = detect(&a, &b).unwrap();

        assert!(data.contacts.len() >= 1 && data.contacts.len() <= 2);
        for point in data.contacts.iter() {
            assert!(point.y >= -5.0 - 1e-4 && point.y <= 5.0 + 1e-4);
        }
    }

    #[test]
    fn test_broad_phase_feeds_narrow_phase() {
        let config = PhysicsConfig::default();
        let mut bodies = BodySet::new();
        let a = bodies.insert(circle(40.0, 50.0, 10.0));
        let b = bodies.insert(circle(55.0, 50.0, 10.0));
        // Far away, should never be touched
        let c = bodies.insert(circle(500.0, 500.0, 10.0));

        let bounds = Aabb::new(Vec2::new(300.0, 300.0), 300.0, 300.0);
        let mut detection = CollisionDetection::new(bounds, &config);
        let resolver = CollisionResolver::new(&config);
        let mut events = EventCollector::new();

        detection.check_for_collision(&mut bodies, &resolver, &mut events);

        assert_eq!(events.len(), 1);
        let event = &events.events()[0];
        assert_eq!(pair_key(event.body_a, event.body_b), pair_key(a, b));
        assert_eq!(bodies.get(c).unwrap().velocity, Vec2::ZERO);
    }
}
