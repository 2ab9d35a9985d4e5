//! Broad-phase quadtree over body bounding boxes
//!
//! Rebuilt from scratch every tick (bodies move every tick; keeping an
//! incremental structure correct would cost more than it saves). Node
//! storage is pooled: `rebuild` resets the live node count and reuses
//! node allocations from previous ticks.

use crate::body::BodyId;
use planar_math::{Aabb, Vec2};

#[derive(Debug)]
struct Node {
    boundary: Aabb,
    depth: usize,
    children: Option<[u32; 4]>,
    entries: Vec<(BodyId, Aabb)>,
}

/// Pooled quadtree used by the broad phase
///
/// Bodies are keyed by their full AABB: a body whose box straddles a
/// quadrant boundary is registered in every overlapped leaf, so a query
/// from either side finds it.
#[derive(Debug)]
pub struct Quadtree {
    nodes: Vec<Node>,
    live: usize,
    capacity: usize,
    max_depth: usize,
    looseness: f32,
}

impl Quadtree {
    pub fn new(capacity: usize, max_depth: usize, looseness: f32) -> Self {
        Self {
            nodes: Vec::new(),
            live: 0,
            capacity: capacity.max(1),
            max_depth: max_depth.max(1),
            looseness,
        }
    }

    /// Reset to a single empty root covering `boundary`, reusing pooled nodes
    pub fn rebuild(&mut self, boundary: Aabb) {
        self.live = 0;
        self.alloc(boundary, 0);
    }

    fn alloc(&mut self, boundary: Aabb, depth: usize) -> u32 {
        let idx = self.live;
        if idx == self.nodes.len() {
            self.nodes.push(Node {
                boundary,
                depth,
                children: None,
                entries: Vec::new(),
            });
        } else {
            let node = &mut self.nodes[idx];
            node.boundary = boundary;
            node.depth = depth;
            node.children = None;
            node.entries.clear();
        }
        self.live += 1;
        idx as u32
    }

    /// Insert a body; ignored when its AABB is wholly outside the root
    pub fn insert(&mut self, id: BodyId, aabb: Aabb) {
        if self.live == 0 || !self.nodes[0].boundary.intersects(&aabb) {
            return;
        }
        self.insert_at(0, id, aabb);
    }

    fn insert_at(&mut self, idx: u32, id: BodyId, aabb: Aabb) {
        let i = idx as usize;

        if let Some(children) = self.nodes[i].children {
            for child in children {
                if self.nodes[child as usize].boundary.intersects(&aabb) {
                    self.insert_at(child, id, aabb);
                }
            }
            return;
        }

        self.nodes[i].entries.push((id, aabb));

        if self.nodes[i].entries.len() > self.capacity && self.nodes[i].depth < self.max_depth {
            self.subdivide(idx);
        }
    }

    /// Split a leaf into four loose quadrants and redistribute its entries
    fn subdivide(&mut self, idx: u32) {
        let i = idx as usize;
        let boundary = self.nodes[i].boundary;
        let depth = self.nodes[i].depth;
        let mut entries = std::mem::take(&mut self.nodes[i].entries);

        let hw = boundary.half_width * 0.5;
        let hh = boundary.half_height * 0.5;
        let offsets = [(-1.0f32, -1.0f32), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)];

        let mut children = [0u32; 4];
        for (slot, (ox, oy)) in children.iter_mut().zip(offsets) {
            let center = boundary.center + Vec2::new(ox * hw, oy * hh);
            let quadrant = Aabb::new(center, hw * self.looseness, hh * self.looseness);
            *slot = self.alloc(quadrant, depth + 1);
        }
        self.nodes[i].children = Some(children);

        for &(entry_id, entry_aabb) in &entries {
            self.insert_at(idx, entry_id, entry_aabb);
        }

        // Hand the (now empty) storage back to the pooled node
        entries.clear();
        self.nodes[i].entries = entries;
    }

    /// Collect ids of bodies whose AABB overlaps `range` into `out`
    ///
    /// Only children whose boundary intersects the range are visited, and
    /// each leaf entry is tested against the range itself before being
    /// returned. Results are deduplicated (a body can live in several
    /// leaves) and sorted by slot index.
    pub fn query(&self, range: &Aabb, out: &mut Vec<BodyId>) {
        if self.live == 0 {
            return;
        }
        self.query_node(0, range, out);
        out.sort_unstable_by_key(|id| id.index());
        out.dedup();
    }

    fn query_node(&self, idx: u32, range: &Aabb, out: &mut Vec<BodyId>) {
        let node = &self.nodes[idx as usize];
        if !node.boundary.intersects(range) {
            return;
        }

        if let Some(children) = node.children {
            for child in children {
                self.query_node(child, range, out);
            }
            return;
        }

        for &(id, aabb) in &node.entries {
            if aabb.intersects(range) {
                out.push(id);
            }
        }
    }

    /// Boundaries of all live nodes, for debug rendering
    pub fn node_boundaries(&self) -> impl Iterator<Item = Aabb> + '_ {
        self.nodes[..self.live].iter().map(|node| node.boundary)
    }

    /// Number of live nodes in the current tick's tree
    pub fn node_count(&self) -> usize {
        self.live
    }
}
