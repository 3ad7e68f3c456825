//! Ray/primitive intersection routines.
//!
//! Pure functions over plain geometry. A miss is reported as `None`, except
//! for the raw sphere solve which returns NaN (see `sphere`). None of these
//! routines apply the self-intersection epsilon; traversal does that.

use std::f32::consts::PI;

use lux_core::{Object, Shape};
use lux_math::{orthonormal_basis, Ray, Vec2, Vec3};

/// Determinant and distance threshold for Möller-Trumbore.
pub const TRIANGLE_EPSILON: f32 = 1e-6;

/// Threshold below which a ray counts as parallel to a plane.
const PARALLEL_EPSILON: f32 = 1e-6;

/// Candidate intersection along a ray.
///
/// `u`/`v` are barycentric coordinates for triangles and zero otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

impl Intersection {
    #[inline]
    fn at(t: f32) -> Self {
        Self { t, u: 0.0, v: 0.0 }
    }
}

/// Smaller root of `|O - C + tD|² = r²` for a unit-length direction.
///
/// There is no discriminant guard: a miss yields NaN, which fails every
/// ordering comparison downstream. Rays starting inside the sphere get a
/// negative distance and are rejected the same way.
#[inline]
pub fn sphere(ray: &Ray, center: Vec3, radius: f32) -> f32 {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let delta = b * b - c;

    -b - delta.sqrt()
}

/// Möller-Trumbore ray-triangle intersection.
pub fn triangle(ray: &Ray, vertices: &[Vec3; 3]) -> Option<Intersection> {
    let [a, b, c] = *vertices;
    let e1 = b - a;
    let e2 = c - a;

    let p = ray.direction.cross(e2);
    let det = e1.dot(p);

    // Degenerate triangle or ray parallel to its plane
    if det.abs() < TRIANGLE_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = inv_det * s.dot(p);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = inv_det * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = inv_det * e2.dot(q);
    if t <= TRIANGLE_EPSILON {
        return None;
    }

    Some(Intersection { t, u, v })
}

/// Distance to the infinite plane through `center` with unit `normal`.
#[inline]
fn plane_distance(ray: &Ray, center: Vec3, normal: Vec3) -> Option<f32> {
    let denom = ray.direction.dot(normal);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    Some((center - ray.origin).dot(normal) / denom)
}

/// Finite rectangle of `width` x `height` centred on `center`.
pub fn plane(ray: &Ray, center: Vec3, normal: Vec3, width: f32, height: f32) -> Option<Intersection> {
    let t = plane_distance(ray, center, normal)?;
    let (tangent, bitangent) = orthonormal_basis(normal);
    let local = ray.at(t) - center;

    if local.dot(tangent).abs() > 0.5 * width || local.dot(bitangent).abs() > 0.5 * height {
        return None;
    }
    Some(Intersection::at(t))
}

pub fn disk(ray: &Ray, center: Vec3, normal: Vec3, radius: f32) -> Option<Intersection> {
    let t = plane_distance(ray, center, normal)?;
    if (ray.at(t) - center).length_squared() > radius * radius {
        return None;
    }
    Some(Intersection::at(t))
}

/// Axis-aligned cube. Rays starting inside report the exit distance.
pub fn cube(ray: &Ray, min: Vec3, max: Vec3) -> Option<Intersection> {
    let inv = ray.inv_direction();
    let t0 = (min - ray.origin) * inv;
    let t1 = (max - ray.origin) * inv;

    let t_near = t0.min(t1).max_element();
    let t_far = t0.max(t1).min_element();

    if t_near > t_far || t_far < 0.0 {
        return None;
    }
    Some(Intersection::at(if t_near >= 0.0 { t_near } else { t_far }))
}

/// Dispatch on the object's shape.
pub fn intersect_object(ray: &Ray, object: &Object) -> Option<Intersection> {
    match object.shape {
        Shape::Sphere { center, radius } => {
            let t = sphere(ray, center, radius);
            // NaN is the sphere's miss value
            (!t.is_nan()).then(|| Intersection::at(t))
        }
        Shape::Plane {
            center,
            normal,
            width,
            height,
        } => plane(ray, center, normal, width, height),
        Shape::Disk {
            center,
            normal,
            radius,
        } => disk(ray, center, normal, radius),
        Shape::Cube { min, max } => cube(ray, min, max),
        Shape::Triangle { ref vertices, .. } => triangle(ray, vertices),
    }
}

/// Outward surface normal at `point`.
///
/// Triangles interpolate their vertex normals with the barycentric
/// coordinates of `hit`. Degenerate inputs produce NaN rather than panicking.
pub fn surface_normal(object: &Object, point: Vec3, hit: &Intersection) -> Vec3 {
    match object.shape {
        Shape::Sphere { center, .. } => (point - center).normalize(),
        Shape::Plane { normal, .. } | Shape::Disk { normal, .. } => normal,
        Shape::Cube { min, max } => cube_face_normal(point, min, max),
        Shape::Triangle { normals, .. } => {
            let w = 1.0 - hit.u - hit.v;
            (normals[0] * w + normals[1] * hit.u + normals[2] * hit.v).normalize()
        }
    }
}

fn cube_face_normal(point: Vec3, min: Vec3, max: Vec3) -> Vec3 {
    let half = (max - min) * 0.5;
    let local = (point - (min + max) * 0.5) / half;
    let a = local.abs();

    if a.x >= a.y && a.x >= a.z {
        Vec3::new(local.x.signum(), 0.0, 0.0)
    } else if a.y >= a.z {
        Vec3::new(0.0, local.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, local.z.signum())
    }
}

/// Texture coordinates at `point` with outward `normal`.
pub fn surface_uv(object: &Object, point: Vec3, normal: Vec3, hit: &Intersection) -> Vec2 {
    match object.shape {
        Shape::Sphere { .. } => {
            let u = (normal.z.atan2(normal.x) + PI) / (2.0 * PI);
            let v = normal.y.clamp(-1.0, 1.0).acos() / PI;
            Vec2::new(u, v)
        }
        Shape::Plane {
            center,
            normal,
            width,
            height,
        } => {
            let (tangent, bitangent) = orthonormal_basis(normal);
            let local = point - center;
            Vec2::new(local.dot(tangent) / width + 0.5, local.dot(bitangent) / height + 0.5)
        }
        Shape::Disk {
            center,
            normal,
            radius,
        } => {
            let (tangent, bitangent) = orthonormal_basis(normal);
            let local = point - center;
            let theta = local.dot(bitangent).atan2(local.dot(tangent));
            Vec2::new((theta + PI) / (2.0 * PI), local.length() / radius)
        }
        Shape::Cube { min, max } => {
            let rel = (point - min) / (max - min);
            if normal.x.abs() > 0.5 {
                Vec2::new(rel.y, rel.z)
            } else if normal.y.abs() > 0.5 {
                Vec2::new(rel.x, rel.z)
            } else {
                Vec2::new(rel.x, rel.y)
            }
        }
        Shape::Triangle { .. } => Vec2::new(hit.u, hit.v),
    }
}
