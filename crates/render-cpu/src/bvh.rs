//! Flat bounding-volume hierarchy with median splits.
//!
//! The same structure serves both levels: per-mesh BLASes index triangles,
//! the TLAS indexes whole meshes. Nodes live in one contiguous array; an
//! internal node's left child always directly follows it, so only the right
//! child index is stored.

use glam::Vec3;
use rayview_scene::Aabb;

const LEAF_SIZE: usize = 4;

/// A ray with a live `[tmin, tmax]` interval that traversal shrinks as
/// closer hits are found.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
    pub tmin: f32,
    pub tmax: f32,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir,
            tmin: 1e-4,
            tmax: f32::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    bounds: Aabb,
    /// Leaf: start offset into `order`. Internal: index of the right child
    /// (the left child is the node immediately after this one).
    first: u32,
    /// Primitive count; zero marks an internal node.
    count: u32,
}

/// Flat BVH over a set of primitive bounds.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<Node>,
    order: Vec<u32>,
}

impl Bvh {
    /// Build over one bounding box per primitive.
    pub fn build(bounds: &[Aabb]) -> Self {
        let mut bvh = Self {
            nodes: Vec::new(),
            order: (0..bounds.len() as u32).collect(),
        };
        if !bounds.is_empty() {
            let centers: Vec<Vec3> = bounds.iter().map(Aabb::center).collect();
            bvh.build_range(bounds, &centers, 0, bounds.len());
        }
        bvh
    }

    fn build_range(&mut self, bounds: &[Aabb], centers: &[Vec3], start: usize, end: usize) -> u32 {
        let node_idx = self.nodes.len() as u32;
        let mut node_bounds = Aabb::empty();
        let mut center_bounds = Aabb::empty();
        for &prim in &self.order[start..end] {
            node_bounds.union(&bounds[prim as usize]);
            center_bounds.grow(centers[prim as usize]);
        }
        self.nodes.push(Node {
            bounds: node_bounds,
            first: start as u32,
            count: (end - start) as u32,
        });

        let extent = center_bounds.diagonal();
        if end - start <= LEAF_SIZE || extent.max_element() <= 0.0 {
            return node_idx; // stays a leaf
        }

        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };
        self.order[start..end].sort_unstable_by(|a, b| {
            let ca = centers[*a as usize][axis];
            let cb = centers[*b as usize][axis];
            ca.total_cmp(&cb)
        });
        let mid = (start + end) / 2;

        let left = self.build_range(bounds, centers, start, mid);
        debug_assert_eq!(left, node_idx + 1);
        let right = self.build_range(bounds, centers, mid, end);
        self.nodes[node_idx as usize].first = right;
        self.nodes[node_idx as usize].count = 0;
        node_idx
    }

    /// Find the closest hit along `ray`.
    ///
    /// `test` intersects one primitive against the ray's current interval
    /// and returns the hit distance if it beats `ray.tmax`. The interval
    /// shrinks as hits come in, pruning the rest of the traversal.
    pub fn intersect<F>(&self, ray: &Ray, mut test: F) -> Option<(f32, u32)>
    where
        F: FnMut(u32, &Ray) -> Option<f32>,
    {
        if self.nodes.is_empty() {
            return None;
        }
        let mut ray = *ray;
        let mut best: Option<(f32, u32)> = None;
        let mut stack = [0u32; 64];
        let mut depth = 0usize;
        stack[depth] = 0;
        depth += 1;

        while depth > 0 {
            depth -= 1;
            let node = &self.nodes[stack[depth] as usize];
            if !hit_aabb(&node.bounds, &ray) {
                continue;
            }
            if node.count > 0 {
                for &prim in &self.order[node.first as usize..(node.first + node.count) as usize] {
                    if let Some(t) = test(prim, &ray) {
                        if t >= ray.tmin && t < ray.tmax {
                            ray.tmax = t;
                            best = Some((t, prim));
                        }
                    }
                }
            } else {
                let parent = stack[depth];
                stack[depth] = node.first; // right child
                depth += 1;
                stack[depth] = parent + 1; // left child, visited first
                depth += 1;
            }
        }
        best
    }
}

/// Slab test against the ray's current interval.
fn hit_aabb(bounds: &Aabb, ray: &Ray) -> bool {
    let inv = ray.dir.recip();
    let t0 = (bounds.min - ray.origin) * inv;
    let t1 = (bounds.max - ray.origin) * inv;
    let lo = t0.min(t1);
    let hi = t0.max(t1);
    let tmin = lo.max_element().max(ray.tmin);
    let tmax = hi.min_element().min(ray.tmax);
    tmin <= tmax
}

/// Möller–Trumbore ray/triangle intersection. Returns the hit distance.
pub fn intersect_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let p = ray.dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < 1e-9 {
        return None; // ray parallel to the triangle plane
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - v0;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t > ray.tmin && t < ray.tmax).then_some(t)
}
