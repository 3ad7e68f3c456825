//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree is stored flat: a `Vec<BvhNode>` addressed by `i32` ids with `-1`
//! as the "no node" sentinel. The root is node 0 and a parent's slot is
//! reserved before its children are built, so children always have larger
//! ids than their parent. Every leaf holds exactly one object.
//!
//! The node layout is `#[repr(C)]` + `Pod` so the array can be handed to a
//! GPU backend unchanged through [`Bvh::as_bytes`].

use bytemuck::{Pod, Zeroable};
use lux_core::{Object, Shape};
use lux_math::{Aabb, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::BvhError;

/// Sentinel for a missing child or an interior node's object id.
pub const NO_NODE: i32 = -1;

/// Padding applied to leaf boxes so flat primitives still have volume.
const LEAF_PADDING: f32 = 1e-4;

/// Relative slack when comparing a split's cost against not splitting.
const SAH_TOLERANCE: f32 = 1e-4;

/// One node of the flattened tree.
///
/// Leaves have `object_id >= 0` and no children. Interior nodes have
/// `object_id == -1` and at least one child.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BvhNode {
    pub bounds: Aabb,
    pub object_id: i32,
    pub left_id: i32,
    pub right_id: i32,
}

impl BvhNode {
    pub fn leaf(bounds: Aabb, object_id: usize) -> Self {
        Self {
            bounds,
            object_id: object_id as i32,
            left_id: NO_NODE,
            right_id: NO_NODE,
        }
    }

    pub fn interior(bounds: Aabb, left_id: i32, right_id: i32) -> Self {
        Self {
            bounds,
            object_id: NO_NODE,
            left_id,
            right_id,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.object_id >= 0
    }

    /// Object referenced by a leaf.
    #[inline]
    pub fn object(&self) -> Option<usize> {
        self.is_leaf().then_some(self.object_id as usize)
    }

    /// Existing children, left first.
    pub fn children(&self) -> impl Iterator<Item = usize> {
        [self.left_id, self.right_id]
            .into_iter()
            .filter(|&id| id >= 0)
            .map(|id| id as usize)
    }
}

/// How an interior node partitions its objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Round-robin axis (`depth % 3`), split at the median position.
    #[default]
    Median,
    /// Cheapest surface area heuristic split over all three axes.
    SurfaceArea,
}

/// Bounding box of a single object, padded slightly.
///
/// Disks and planes use `position ± bounding_radius`, which over-covers
/// them but never misses a hit.
pub fn leaf_bounds(object: &Object) -> Aabb {
    let bounds = match object.shape {
        Shape::Sphere { center, radius } => {
            let r = Vec3::splat(radius.abs());
            Aabb::new(center - r, center + r)
        }
        Shape::Cube { min, max } => Aabb::from_points(min, max),
        Shape::Triangle { vertices, .. } => Aabb::enclosing(vertices),
        Shape::Plane { .. } | Shape::Disk { .. } => {
            let c = object.position();
            let r = Vec3::splat(object.bounding_radius());
            Aabb::new(c - r, c + r)
        }
    };

    let pad = Vec3::splat(LEAF_PADDING);
    Aabb::new(bounds.min - pad, bounds.max + pad)
}

/// Flat BVH over a scene's objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    depth: usize,
    strategy: SplitStrategy,
}

impl Bvh {
    /// Build a tree over `objects` using ids `[0, objects.len())`.
    pub fn build(objects: &[Object], strategy: SplitStrategy) -> Self {
        let mut builder = Builder {
            objects,
            strategy,
            nodes: Vec::with_capacity(objects.len().saturating_mul(2)),
            depth: 0,
        };

        let mut ids: Vec<usize> = (0..objects.len()).collect();
        builder.insert(&mut ids, 0);

        log::debug!(
            "BVH built: {} objects, {} nodes, depth {}, {:?} split",
            objects.len(),
            builder.nodes.len(),
            builder.depth,
            strategy
        );

        Self {
            nodes: builder.nodes,
            depth: builder.depth,
            strategy,
        }
    }

    /// Adopt a node array produced elsewhere (cache file, GPU builder).
    ///
    /// The array must describe a single tree rooted at node 0 with every
    /// child stored after its parent and inside its parent's box, and every
    /// leaf referencing an object below `object_count`.
    pub fn from_nodes(nodes: Vec<BvhNode>, object_count: usize) -> Result<Self, BvhError> {
        let len = nodes.len();
        let mut level = vec![usize::MAX; len];
        if len > 0 {
            level[0] = 0;
        }

        for (i, node) in nodes.iter().enumerate() {
            if node.object_id >= 0 {
                if node.left_id != NO_NODE || node.right_id != NO_NODE {
                    return Err(BvhError::InvalidLeaf { node: i });
                }
                let object = node.object_id as usize;
                if object >= object_count {
                    return Err(BvhError::ObjectOutOfRange {
                        node: i,
                        object,
                        count: object_count,
                    });
                }
            } else if node.object_id != NO_NODE {
                return Err(BvhError::InvalidLeaf { node: i });
            } else if node.left_id == NO_NODE && node.right_id == NO_NODE {
                return Err(BvhError::InvalidInterior { node: i });
            }

            // Parents come first, so `level[i]` is settled by now
            if level[i] == usize::MAX {
                return Err(BvhError::Unreachable { node: i });
            }

            for child in [node.left_id, node.right_id] {
                if child == NO_NODE {
                    continue;
                }
                if child <= i as i32 || child as usize >= len {
                    return Err(BvhError::ChildOutOfOrder { node: i, child });
                }
                let c = child as usize;
                if !node.bounds.contains(&nodes[c].bounds) {
                    return Err(BvhError::BoundsMismatch { node: i, child: c });
                }
                if level[c] != usize::MAX {
                    return Err(BvhError::SharedChild { child: c });
                }
                level[c] = level[i] + 1;
            }
        }

        let depth = level.iter().copied().max().unwrap_or(0);

        Ok(Self {
            nodes,
            depth,
            strategy: SplitStrategy::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Deepest node level, with the root at level 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn strategy(&self) -> SplitStrategy {
        self.strategy
    }

    pub fn root(&self) -> Option<&BvhNode> {
        self.nodes.first()
    }

    /// World bounds of the whole tree, empty for an empty tree.
    pub fn bounds(&self) -> Aabb {
        self.root().map_or(Aabb::EMPTY, |n| n.bounds)
    }

    /// Raw node bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }
}

struct Builder<'a> {
    objects: &'a [Object],
    strategy: SplitStrategy,
    nodes: Vec<BvhNode>,
    depth: usize,
}

impl Builder<'_> {
    fn insert(&mut self, ids: &mut [usize], depth: usize) -> i32 {
        match ids.len() {
            0 => return NO_NODE,
            1 => {
                self.depth = self.depth.max(depth);
                let object = ids[0];
                self.nodes.push(BvhNode::leaf(leaf_bounds(&self.objects[object]), object));
                return (self.nodes.len() - 1) as i32;
            }
            _ => {}
        }

        let mid = match self.strategy {
            SplitStrategy::Median => {
                sort_by_axis(self.objects, ids, depth % 3);
                ids.len() / 2
            }
            SplitStrategy::SurfaceArea => self.surface_area_split(ids),
        };

        // Reserve our slot so children land after us
        let index = self.nodes.len();
        self.nodes.push(BvhNode::interior(Aabb::EMPTY, NO_NODE, NO_NODE));

        let (left, right) = ids.split_at_mut(mid);
        let left_id = self.insert(left, depth + 1);
        let right_id = self.insert(right, depth + 1);

        let mut bounds = Aabb::EMPTY;
        for child in [left_id, right_id] {
            if child != NO_NODE {
                bounds.expand(&self.nodes[child as usize].bounds);
            }
        }
        self.nodes[index] = BvhNode::interior(bounds, left_id, right_id);

        index as i32
    }

    /// Sort `ids` along the cheapest SAH axis and return the split index.
    fn surface_area_split(&self, ids: &mut [usize]) -> usize {
        let n = ids.len();
        let mut best = (f32::INFINITY, 0, n / 2);
        let mut suffix = vec![Aabb::EMPTY; n + 1];

        for axis in 0..3 {
            sort_by_axis(self.objects, ids, axis);

            for i in (0..n).rev() {
                suffix[i] = Aabb::surrounding(&suffix[i + 1], &leaf_bounds(&self.objects[ids[i]]));
            }

            let mut prefix = Aabb::EMPTY;
            for i in 1..n {
                prefix.expand(&leaf_bounds(&self.objects[ids[i - 1]]));
                let cost = prefix.surface_area() * i as f32
                    + suffix[i].surface_area() * (n - i) as f32;
                if cost < best.0 {
                    best = (cost, axis, i);
                }
            }
        }

        sort_by_axis(self.objects, ids, best.1);

        // When no split beats keeping everything together, as with
        // coincident boxes, halve the set to keep the tree balanced
        let unsplit = suffix[0].surface_area() * n as f32;
        if best.0 >= unsplit * (1.0 - SAH_TOLERANCE) {
            return n / 2;
        }
        best.2
    }
}

/// Stable sort of object ids by one axis of their position.
fn sort_by_axis(objects: &[Object], ids: &mut [usize], axis: usize) {
    ids.sort_by(|&a, &b| {
        objects[a].position()[axis].total_cmp(&objects[b].position()[axis])
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_of_spheres(n: usize) -> Vec<Object> {
        (0..n)
            .map(|i| Object::sphere(Vec3::new(i as f32 * 3.0, 0.0, 0.0), 1.0, 0))
            .collect()
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = Bvh::build(&[], SplitStrategy::Median);
        assert!(bvh.is_empty());
        assert_eq!(bvh.len(), 0);
        assert!(bvh.root().is_none());
        assert!(bvh.bounds().is_empty());
    }

    #[test]
    fn test_bvh_single_object_is_leaf() {
        let objects = row_of_spheres(1);
        let bvh = Bvh::build(&objects, SplitStrategy::Median);

        assert_eq!(bvh.len(), 1);
        assert_eq!(bvh.depth(), 0);
        assert_eq!(bvh.nodes()[0].object(), Some(0));
    }

    #[test]
    fn test_bvh_node_count_and_order() {
        let objects = row_of_spheres(7);
        let bvh = Bvh::build(&objects, SplitStrategy::Median);

        // One leaf per object, a full binary tree has n - 1 interior nodes
        assert_eq!(bvh.len(), 13);
        for (i, node) in bvh.nodes().iter().enumerate() {
            for child in node.children() {
                assert!(child > i);
            }
        }
        assert_eq!(bvh.nodes().iter().filter(|n| n.is_leaf()).count(), 7);
    }

    #[test]
    fn test_median_split_layout() {
        // Four spheres along x: root splits on x, [0,1] left, [2,3] right
        let objects = row_of_spheres(4);
        let bvh = Bvh::build(&objects, SplitStrategy::Median);
        let nodes = bvh.nodes();

        assert_eq!(nodes[0].left_id, 1);
        let left = &nodes[1];
        let right = &nodes[nodes[0].right_id as usize];

        let left_objects: Vec<_> = left.children().filter_map(|c| nodes[c].object()).collect();
        let right_objects: Vec<_> = right.children().filter_map(|c| nodes[c].object()).collect();
        assert_eq!(left_objects, vec![0, 1]);
        assert_eq!(right_objects, vec![2, 3]);
        assert_eq!(bvh.depth(), 2);
    }

    #[test]
    fn test_leaf_bounds_contain_points() {
        let tri = Object::triangle(Vec3::ZERO, Vec3::X, Vec3::new(0.0, 2.0, -1.0), 0);
        let b = leaf_bounds(&tri);
        for v in [Vec3::ZERO, Vec3::X, Vec3::new(0.0, 2.0, -1.0)] {
            assert!(b.contains_point(v));
        }

        let cube = Object::cube(Vec3::ONE, -Vec3::ONE, 0);
        let b = leaf_bounds(&cube);
        assert!(b.contains_point(Vec3::ONE) && b.contains_point(-Vec3::ONE));

        let sphere = Object::sphere(Vec3::new(1.0, 2.0, 3.0), 0.5, 0);
        let b = leaf_bounds(&sphere);
        assert!(b.contains_point(Vec3::new(1.5, 2.0, 3.0)));
        assert!(b.contains_point(Vec3::new(1.0, 2.0, 2.5)));
    }

    #[test]
    fn test_disk_bounds_cover_rim() {
        let disk = Object::disk(Vec3::ZERO, Vec3::Y, 2.0, 0);
        let b = leaf_bounds(&disk);
        assert!(b.contains_point(Vec3::new(2.0, 0.0, 0.0)));
        assert!(b.contains_point(Vec3::new(0.0, 0.0, -2.0)));
    }

    #[test]
    fn test_root_bounds_union_of_leaves() {
        let objects = vec![
            Object::sphere(Vec3::new(-4.0, 0.0, 0.0), 1.0, 0),
            Object::cube(Vec3::new(2.0, 2.0, 2.0), Vec3::new(3.0, 5.0, 3.0), 0),
            Object::triangle(Vec3::ZERO, Vec3::new(0.0, -6.0, 0.0), Vec3::Z, 0),
        ];
        let bvh = Bvh::build(&objects, SplitStrategy::Median);

        let mut union = Aabb::EMPTY;
        for o in &objects {
            union.expand(&leaf_bounds(o));
        }
        assert!((bvh.bounds().min - union.min).length() < 1e-6);
        assert!((bvh.bounds().max - union.max).length() < 1e-6);
    }

    #[test]
    fn test_surface_area_split_separates_clusters() {
        // Two tight clusters far apart: SAH should cut between them
        let mut objects = Vec::new();
        for i in 0..3 {
            objects.push(Object::sphere(Vec3::new(i as f32 * 0.1, 0.0, 0.0), 0.1, 0));
        }
        objects.push(Object::sphere(Vec3::new(100.0, 0.0, 0.0), 0.1, 0));

        let bvh = Bvh::build(&objects, SplitStrategy::SurfaceArea);
        let nodes = bvh.nodes();
        let right = &nodes[nodes[0].right_id as usize];

        assert_eq!(right.object(), Some(3));
        assert_eq!(bvh.len(), 7);
    }

    #[test]
    fn test_surface_area_coincident_objects_stay_balanced() {
        let objects: Vec<Object> = (0..64).map(|_| Object::sphere(Vec3::ZERO, 1.0, 0)).collect();

        let sah = Bvh::build(&objects, SplitStrategy::SurfaceArea);
        let median = Bvh::build(&objects, SplitStrategy::Median);
        assert_eq!(median.depth(), 6);
        assert_eq!(sah.depth(), 6);
        assert_eq!(sah.len(), 127);
        assert_eq!(sah.strategy(), SplitStrategy::SurfaceArea);
    }

    #[test]
    fn test_as_bytes_layout() {
        let objects = row_of_spheres(3);
        let bvh = Bvh::build(&objects, SplitStrategy::Median);

        assert_eq!(std::mem::size_of::<BvhNode>(), 36);
        assert_eq!(bvh.as_bytes().len(), bvh.len() * 36);
    }

    #[test]
    fn test_from_nodes_roundtrip() {
        let objects = row_of_spheres(5);
        let built = Bvh::build(&objects, SplitStrategy::Median);

        let adopted = Bvh::from_nodes(built.nodes().to_vec(), objects.len()).unwrap();
        assert_eq!(adopted.nodes(), built.nodes());
        assert_eq!(adopted.depth(), built.depth());
    }

    #[test]
    fn test_from_nodes_rejects_bad_trees() {
        let b = Aabb::new(Vec3::ZERO, Vec3::ONE);

        let backwards = vec![BvhNode::interior(b, 0, NO_NODE)];
        assert_eq!(
            Bvh::from_nodes(backwards, 1),
            Err(BvhError::ChildOutOfOrder { node: 0, child: 0 })
        );

        let dangling = vec![BvhNode::interior(b, NO_NODE, NO_NODE)];
        assert_eq!(
            Bvh::from_nodes(dangling, 1),
            Err(BvhError::InvalidInterior { node: 0 })
        );

        let orphan = vec![BvhNode::leaf(b, 0), BvhNode::leaf(b, 0)];
        assert_eq!(Bvh::from_nodes(orphan, 1), Err(BvhError::Unreachable { node: 1 }));

        let shared = vec![
            BvhNode::interior(b, 1, 2),
            BvhNode::interior(b, 2, NO_NODE),
            BvhNode::leaf(b, 0),
        ];
        assert_eq!(Bvh::from_nodes(shared, 1), Err(BvhError::SharedChild { child: 2 }));

        let escaping = vec![
            BvhNode::interior(b, 1, NO_NODE),
            BvhNode::leaf(Aabb::new(Vec3::ZERO, Vec3::splat(2.0)), 0),
        ];
        assert_eq!(
            Bvh::from_nodes(escaping, 1),
            Err(BvhError::BoundsMismatch { node: 0, child: 1 })
        );

        let out_of_range = vec![BvhNode::leaf(b, 4)];
        assert!(matches!(
            Bvh::from_nodes(out_of_range, 2),
            Err(BvhError::ObjectOutOfRange { object: 4, .. })
        ));
    }
}
