//! Scene primitives.
//!
//! Objects are plain records: geometry tagged by `Shape` plus the index of
//! the material used to shade them. They are immutable once the scene has
//! been loaded; acceleration structures refer to them by index.

use lux_math::Vec3;
use serde::{Deserialize, Serialize};

/// Primitive geometry of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Sphere {
        center: Vec3,
        radius: f32,
    },
    /// Finite rectangle centred on `center`, spanning `width` x `height`
    /// in the plane orthogonal to `normal`.
    Plane {
        center: Vec3,
        normal: Vec3,
        width: f32,
        height: f32,
    },
    Disk {
        center: Vec3,
        normal: Vec3,
        radius: f32,
    },
    /// Axis-aligned cube given by two opposing corners.
    Cube {
        min: Vec3,
        max: Vec3,
    },
    /// Triangle with per-vertex shading normals.
    Triangle {
        vertices: [Vec3; 3],
        normals: [Vec3; 3],
    },
}

/// A renderable object: geometry plus material index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub shape: Shape,
    pub material_id: usize,
}

impl Object {
    pub fn new(shape: Shape, material_id: usize) -> Self {
        Self { shape, material_id }
    }

    pub fn sphere(center: Vec3, radius: f32, material_id: usize) -> Self {
        Self::new(
            Shape::Sphere {
                center,
                radius: radius.max(0.0),
            },
            material_id,
        )
    }

    pub fn plane(center: Vec3, normal: Vec3, width: f32, height: f32, material_id: usize) -> Self {
        Self::new(
            Shape::Plane {
                center,
                normal: normal.normalize(),
                width,
                height,
            },
            material_id,
        )
    }

    pub fn disk(center: Vec3, normal: Vec3, radius: f32, material_id: usize) -> Self {
        Self::new(
            Shape::Disk {
                center,
                normal: normal.normalize(),
                radius,
            },
            material_id,
        )
    }

    /// Cube from any two opposing corners.
    pub fn cube(a: Vec3, b: Vec3, material_id: usize) -> Self {
        Self::new(
            Shape::Cube {
                min: a.min(b),
                max: a.max(b),
            },
            material_id,
        )
    }

    /// Flat-shaded triangle: every vertex gets the face normal.
    ///
    /// A degenerate triangle gets a NaN normal; it is never hit anyway.
    pub fn triangle(a: Vec3, b: Vec3, c: Vec3, material_id: usize) -> Self {
        let n = (b - a).cross(c - a).normalize();
        Self::triangle_with_normals([a, b, c], [n, n, n], material_id)
    }

    /// Smooth-shaded triangle with explicit vertex normals.
    pub fn triangle_with_normals(vertices: [Vec3; 3], normals: [Vec3; 3], material_id: usize) -> Self {
        Self::new(Shape::Triangle { vertices, normals }, material_id)
    }

    /// Representative point used as the BVH sort key.
    ///
    /// Cubes report their min corner and triangles their centroid.
    pub fn position(&self) -> Vec3 {
        match self.shape {
            Shape::Sphere { center, .. } | Shape::Plane { center, .. } | Shape::Disk { center, .. } => {
                center
            }
            Shape::Cube { min, .. } => min,
            Shape::Triangle { vertices, .. } => (vertices[0] + vertices[1] + vertices[2]) / 3.0,
        }
    }

    /// Radius of a sphere around `position()` that encloses the object.
    ///
    /// Only meaningful for round and planar shapes; box-like shapes return
    /// their half diagonal.
    pub fn bounding_radius(&self) -> f32 {
        match self.shape {
            Shape::Sphere { radius, .. } | Shape::Disk { radius, .. } => radius,
            Shape::Plane { width, height, .. } => 0.5 * (width * width + height * height).sqrt(),
            Shape::Cube { min, max } => 0.5 * (max - min).length(),
            Shape::Triangle { vertices, .. } => {
                let c = self.position();
                vertices
                    .iter()
                    .map(|v| v.distance(c))
                    .fold(0.0, f32::max)
            }
        }
    }

    /// Short name of the shape, for logs.
    pub fn kind(&self) -> &'static str {
        match self.shape {
            Shape::Sphere { .. } => "sphere",
            Shape::Plane { .. } => "plane",
            Shape::Disk { .. } => "disk",
            Shape::Cube { .. } => "cube",
            Shape::Triangle { .. } => "triangle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_orders_corners() {
        let cube = Object::cube(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, 0.0), 0);
        match cube.shape {
            Shape::Cube { min, max } => {
                assert_eq!(min, Vec3::new(-1.0, -1.0, 0.0));
                assert_eq!(max, Vec3::new(1.0, 1.0, 2.0));
            }
            _ => panic!("expected cube"),
        }
        assert_eq!(cube.position(), Vec3::new(-1.0, -1.0, 0.0));
    }

    #[test]
    fn test_triangle_position_is_centroid() {
        let tri = Object::triangle(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0), 0);
        assert_eq!(tri.position(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_flat_triangle_normal() {
        let tri = Object::triangle(Vec3::ZERO, Vec3::X, Vec3::Y, 0);
        match tri.shape {
            Shape::Triangle { normals, .. } => {
                for n in normals {
                    assert!((n - Vec3::Z).length() < 1e-6);
                }
            }
            _ => panic!("expected triangle"),
        }
    }

    #[test]
    fn test_plane_bounding_radius_is_half_diagonal() {
        let plane = Object::plane(Vec3::ZERO, Vec3::Y, 6.0, 8.0, 0);
        assert!((plane.bounding_radius() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_shape_serde_tagged() {
        let obj = Object::sphere(Vec3::new(0.0, 1.0, 0.0), 2.0, 3);
        let json = serde_json::to_string(&obj).unwrap();
        assert!(json.contains("\"type\":\"sphere\""));
        let back: Object = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obj);
        // Log name matches the serde tag
        assert_eq!(obj.kind(), "sphere");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Object::disk(Vec3::ZERO, Vec3::Y, 1.0, 0).kind(), "disk");
        assert_eq!(Object::cube(Vec3::ZERO, Vec3::ONE, 0).kind(), "cube");
        assert_eq!(Object::triangle(Vec3::ZERO, Vec3::X, Vec3::Y, 0).kind(), "triangle");
    }
}
