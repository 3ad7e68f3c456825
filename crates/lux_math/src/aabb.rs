use bytemuck::{Pod, Zeroable};

use crate::{Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// Stored as a min/max corner pair so it can sit directly inside a flat
/// node buffer shared with a compute backend.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An empty box (min > max). Expanding it by any box yields that box.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a box from its corners, used as given.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from two arbitrary opposing corners.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box containing every point of the iterator.
    pub fn enclosing<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut acc, p| {
            acc.min = acc.min.min(p);
            acc.max = acc.max.max(p);
            acc
        })
    }

    /// Grow this box to the union of itself and `other`.
    #[inline]
    pub fn expand(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Union of two boxes.
    #[inline]
    pub fn surrounding(a: &Aabb, b: &Aabb) -> Aabb {
        let mut out = *a;
        out.expand(b);
        out
    }

    /// Returns true for the `EMPTY` box or any box with an inverted axis.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Surface area `2*(dx*dy + dx*dz + dy*dz)`; an empty box has none.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Coordinate extent along one axis (0=X, 1=Y, 2=Z).
    pub fn axis(&self, n: usize) -> (f32, f32) {
        (self.min[n], self.max[n])
    }

    /// Inclusive point containment.
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Returns true if `other` lies completely inside this box.
    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
    }

    /// Slab test against the whole ray line restricted to `t >= 0`.
    ///
    /// Per-axis entry/exit distances are ordered after the division so
    /// negative direction components need no special casing.
    #[inline]
    pub fn hit(&self, ray: &Ray) -> bool {
        let inv = ray.inv_direction();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;

        let t_near = t0.min(t1).max_element();
        let t_far = t0.max(t1).min_element();

        t_near <= t_far && t_far >= 0.0
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
