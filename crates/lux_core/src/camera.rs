//! Pinhole camera owned by the input layer.
//!
//! The renderer only reads the camera. Moving it is the caller's job, and so
//! is restarting accumulation afterwards.

use lux_math::{Ray, Vec3};
use serde::{Deserialize, Serialize};

const WORLD_UP: Vec3 = Vec3::Y;

/// Camera described by a position and an orthonormal basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,

    /// Vertical field of view in degrees
    pub fov: f32,
    /// Width divided by height
    pub aspect_ratio: f32,
    /// Distance to the image plane
    pub near: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            front: Vec3::Z,
            up: Vec3::Y,
            right: Vec3::X,
            fov: 45.0,
            aspect_ratio: 1.0,
            near: 0.1,
        }
    }
}

impl Camera {
    /// Create a camera at `position` looking at `target`.
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self {
            position,
            ..Default::default()
        };
        camera.look_at(target);
        camera
    }

    /// Set vertical field of view (degrees).
    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self
    }

    /// Match the aspect ratio to an image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.aspect_ratio = width as f32 / height.max(1) as f32;
        self
    }

    /// Re-aim the camera, rebuilding the basis against world up.
    pub fn look_at(&mut self, target: Vec3) {
        self.front = (target - self.position).normalize();
        self.right = WORLD_UP.cross(self.front).normalize();
        self.up = self.front.cross(self.right).normalize();
    }

    /// World-space point on the image plane for continuous pixel
    /// coordinates `(x, y)`; `(0, 0)` is the top-left image corner.
    pub fn pixel_position(&self, x: f32, y: f32, width: u32, height: u32) -> Vec3 {
        let tan_half_fov = (self.fov.to_radians() * 0.5).tan();
        let camera_x = (2.0 * x / width as f32 - 1.0) * self.aspect_ratio * tan_half_fov * self.near;
        let camera_y = (1.0 - 2.0 * y / height as f32) * tan_half_fov * self.near;

        self.position + self.front * self.near + self.right * camera_x + self.up * camera_y
    }

    /// Unit ray from the camera through continuous pixel coordinates.
    pub fn ray_through(&self, x: f32, y: f32, width: u32, height: u32) -> Ray {
        Ray::towards(self.position, self.pixel_position(x, y, width, height))
    }
}
