//! Closest-hit queries over the scene's objects.

use lux_core::Object;
use lux_math::{Interval, Ray, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::bvh::Bvh;
use crate::error::TraversalError;
use crate::intersect::{intersect_object, surface_normal, surface_uv, Intersection};

/// Hits at or below this distance are ignored to avoid self-intersection.
pub const HIT_EPSILON: f32 = 0.01;

/// Nearest intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub distance: f32,
    pub point: Vec3,
    /// Surface normal, always facing against the ray
    pub normal: Vec3,
    /// Whether the ray hit the outside of the surface
    pub front_face: bool,
    pub object_id: usize,
    pub uv: Vec2,
}

impl Hit {
    fn new(objects: &[Object], ray: &Ray, object_id: usize, isect: &Intersection) -> Self {
        let object = &objects[object_id];
        let point = ray.at(isect.t);
        let outward = surface_normal(object, point, isect);

        let front_face = ray.direction.dot(outward) < 0.0;
        let normal = if front_face { outward } else { -outward };

        Self {
            distance: isect.t,
            point,
            normal,
            front_face,
            object_id,
            uv: surface_uv(object, point, outward, isect),
        }
    }
}

/// Fixed-capacity stack of node ids for iterative tree walks.
///
/// Pushing past the capacity is an error instead of a reallocation, so a
/// malformed tree cannot grow it without bound.
#[derive(Debug, Clone)]
pub struct TraversalStack {
    items: Vec<u32>,
    capacity: usize,
}

impl TraversalStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[inline]
    pub fn push(&mut self, id: u32) -> Result<(), TraversalError> {
        if self.items.len() >= self.capacity {
            return Err(TraversalError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.items.push(id);
        Ok(())
    }

    #[inline]
    pub fn pop(&mut self) -> Option<u32> {
        self.items.pop()
    }
}

/// A strategy for finding the closest hit.
///
/// Implementations are shared read-only across render workers; per-worker
/// scratch space lives in the [`TraversalStack`] passed in.
pub trait Traversal: Send + Sync {
    fn closest_hit(
        &self,
        objects: &[Object],
        ray: &Ray,
        stack: &mut TraversalStack,
    ) -> Result<Option<Hit>, TraversalError>;

    /// Stack size this strategy needs for a full walk.
    fn stack_capacity(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// Which traversal a renderer should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalKind {
    Linear,
    #[default]
    Bvh,
}

/// Running closest candidate, shared by both strategies.
struct Closest {
    best: Option<(usize, Intersection)>,
    max: f32,
}

impl Closest {
    fn new() -> Self {
        Self {
            best: None,
            max: f32::INFINITY,
        }
    }

    /// Strict less-than: on equal distances the first object tested wins.
    #[inline]
    fn test(&mut self, objects: &[Object], ray: &Ray, object_id: usize) {
        if let Some(isect) = intersect_object(ray, &objects[object_id]) {
            if Interval::new(HIT_EPSILON, self.max).surrounds(isect.t) {
                self.max = isect.t;
                self.best = Some((object_id, isect));
            }
        }
    }

    fn finish(self, objects: &[Object], ray: &Ray) -> Option<Hit> {
        self.best
            .map(|(object_id, isect)| Hit::new(objects, ray, object_id, &isect))
    }
}

/// Brute force over every object in id order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTraversal;

impl Traversal for LinearTraversal {
    fn closest_hit(
        &self,
        objects: &[Object],
        ray: &Ray,
        _stack: &mut TraversalStack,
    ) -> Result<Option<Hit>, TraversalError> {
        let mut closest = Closest::new();
        for id in 0..objects.len() {
            closest.test(objects, ray, id);
        }
        Ok(closest.finish(objects, ray))
    }

    fn stack_capacity(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

impl Traversal for Bvh {
    fn closest_hit(
        &self,
        objects: &[Object],
        ray: &Ray,
        stack: &mut TraversalStack,
    ) -> Result<Option<Hit>, TraversalError> {
        let nodes = self.nodes();
        if nodes.is_empty() {
            return Ok(None);
        }

        let mut closest = Closest::new();
        stack.clear();
        stack.push(0)?;

        while let Some(index) = stack.pop() {
            let node = &nodes[index as usize];

            if let Some(object_id) = node.object() {
                closest.test(objects, ray, object_id);
                continue;
            }

            for child in node.children() {
                if nodes[child].bounds.hit(ray) {
                    stack.push(child as u32)?;
                }
            }
        }

        Ok(closest.finish(objects, ray))
    }

    fn stack_capacity(&self) -> usize {
        self.depth() + 1
    }

    fn name(&self) -> &'static str {
        "bvh"
    }
}
