use crate::Vec3;

/// A ray in 3D space with an origin and a direction.
///
/// Every producer in the renderer hands out unit-length directions; the
/// intersection routines rely on that (the sphere test drops the `a` term).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray. The direction is used as given.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Create a ray pointing from `origin` towards `target`.
    #[inline]
    pub fn towards(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, (target - origin).normalize())
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Componentwise reciprocal of the direction, used by slab tests.
    #[inline]
    pub fn inv_direction(&self) -> Vec3 {
        self.direction.recip()
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
        }
    }
}
