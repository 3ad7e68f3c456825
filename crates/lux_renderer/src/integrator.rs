//! Path tracing integrator.
//!
//! Each pixel traces one jittered path per frame and folds it into the
//! running mean kept in the frame buffer. The random sequence of a pixel
//! depends only on the frame counter and the pixel index, so identical
//! state always renders an identical frame regardless of thread count.

use std::f32::consts::PI;
use std::ops::Range;

use lux_core::{Camera, Color, Scene};
use lux_math::{lerp3, Ray, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::TraversalError;
use crate::sampling::{pixel_seed, scatter_direction};
use crate::shading::{clamp_color, emission, evaluate};
use crate::traversal::{Traversal, TraversalStack};

/// Default number of path segments per sample.
pub const DEFAULT_MAX_BOUNCES: u32 = 4;

/// Compute sky gradient background.
pub fn sky_gradient(direction: Vec3) -> Color {
    let unit_direction = direction.normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Equirectangular lookup coordinates for an escaping direction.
///
/// `u` spans `[0, 2]` and relies on the sampler wrapping it.
#[inline]
pub fn environment_uv(direction: Vec3) -> (f32, f32) {
    let u = (direction.x.atan2(direction.z) + PI) / PI;
    let v = (-direction.y).clamp(-1.0, 1.0).acos() / PI;
    (u, v)
}

/// Fold this frame's sample into the running mean.
///
/// Frame 0 stores the sample as is, discarding whatever was there.
#[inline]
pub fn accumulate(previous: Color, sample: Color, frame: u32) -> Color {
    if frame == 0 {
        sample
    } else {
        lerp3(previous, sample, 1.0 / (frame as f32 + 1.0))
    }
}

/// Read-only view of everything a worker needs to trace paths.
#[derive(Clone, Copy)]
pub struct PathTracer<'a> {
    scene: &'a Scene,
    camera: &'a Camera,
    traversal: &'a dyn Traversal,
    max_bounces: u32,
}

impl<'a> PathTracer<'a> {
    pub fn new(
        scene: &'a Scene,
        camera: &'a Camera,
        traversal: &'a dyn Traversal,
        max_bounces: u32,
    ) -> Self {
        Self {
            scene,
            camera,
            traversal,
            max_bounces,
        }
    }

    /// Radiance for rays that leave the scene.
    pub fn background(&self, direction: Vec3) -> Color {
        match self.scene.environment {
            Some(texture) => {
                let (u, v) = environment_uv(direction);
                self.scene.textures.sample(texture, u, v)
            }
            None => sky_gradient(direction),
        }
    }

    /// One jittered sample for pixel `(x, y)` of `frame`.
    pub fn sample_pixel(
        &self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame: u32,
        stack: &mut TraversalStack,
    ) -> Result<Color, TraversalError> {
        let index = y as usize * width as usize + x as usize;
        let mut rng = Pcg32::seed_from_u64(pixel_seed(frame, index));

        let jx: f32 = rng.gen_range(-0.5..0.5);
        let jy: f32 = rng.gen_range(-0.5..0.5);
        let ray = self
            .camera
            .ray_through(x as f32 + 0.5 + jx, y as f32 + 0.5 + jy, width, height);

        self.trace(ray, &mut rng, stack)
    }

    /// Follow one path for up to `max_bounces` segments.
    pub fn trace<R: Rng + ?Sized>(
        &self,
        mut ray: Ray,
        rng: &mut R,
        stack: &mut TraversalStack,
    ) -> Result<Color, TraversalError> {
        let mut radiance = Color::ZERO;
        let mut throughput = Color::ONE;

        for _ in 0..self.max_bounces {
            let Some(hit) = self
                .traversal
                .closest_hit(&self.scene.objects, &ray, stack)?
            else {
                radiance = clamp_color(radiance + throughput * self.background(ray.direction));
                break;
            };

            let object = &self.scene.objects[hit.object_id];
            let material = &self.scene.materials[object.material_id];
            let texel = material
                .texture_id
                .map_or(Color::ONE, |t| self.scene.textures.sample(t, hit.uv.x, hit.uv.y));

            let light = -ray.direction;
            let view = scatter_direction(material, &hit, ray.direction, rng);

            let shaded = evaluate(material, texel, hit.normal, light, view) + emission(material, texel);
            radiance = clamp_color(radiance + throughput * shaded);

            let cos_light = hit.normal.dot(light);
            throughput = clamp_color(throughput * texel * material.albedo * 2.0 * cos_light);

            ray = Ray::new(hit.point, view);
        }

        Ok(radiance)
    }

    /// Render a band of rows into `band`, which holds exactly those rows.
    pub fn render_rows(
        &self,
        band: &mut [Color],
        rows: Range<usize>,
        width: u32,
        height: u32,
        frame: u32,
    ) -> Result<(), TraversalError> {
        if width == 0 {
            return Ok(());
        }

        let mut stack = TraversalStack::new(self.traversal.stack_capacity());
        let w = width as usize;

        for (i, pixel) in band.iter_mut().enumerate() {
            let x = (i % w) as u32;
            let y = (rows.start + i / w) as u32;
            let sample = self.sample_pixel(x, y, width, height, frame, &mut stack)?;
            *pixel = accumulate(*pixel, sample, frame);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::LinearTraversal;
    use lux_core::{Material, Object};

    fn lit_scene() -> (Scene, Camera) {
        let mut scene = Scene::new();
        let m = scene.add_material(Material::diffuse(Color::new(0.7, 0.3, 0.3)));
        scene.add_object(Object::sphere(Vec3::new(0.0, 0.0, 5.0), 1.0, m));
        let camera = Camera::new(Vec3::ZERO, Vec3::Z).with_resolution(8, 8);
        (scene, camera)
    }

    #[test]
    fn test_sky_gradient() {
        let up = sky_gradient(Vec3::Y);
        let down = sky_gradient(-Vec3::Y);
        assert!((up - Color::new(0.5, 0.7, 1.0)).length() < 1e-5);
        assert!((down - Color::ONE).length() < 1e-5);
    }

    #[test]
    fn test_environment_uv_ranges() {
        let (u, v) = environment_uv(Vec3::Z);
        assert!((u - 1.0).abs() < 1e-5);
        assert!((v - 0.5).abs() < 1e-5);

        let (_, v) = environment_uv(-Vec3::Y);
        assert!(v.abs() < 1e-5);
    }

    #[test]
    fn test_accumulate_first_frame_is_raw() {
        let prev = Color::splat(0.9);
        let sample = Color::new(0.1, 0.2, 0.3);
        assert_eq!(accumulate(prev, sample, 0), sample);
    }

    #[test]
    fn test_accumulate_running_mean() {
        let samples = [Color::splat(0.2), Color::splat(0.4), Color::splat(0.9)];
        let mut pixel = Color::ZERO;
        for (frame, s) in samples.iter().enumerate() {
            pixel = accumulate(pixel, *s, frame as u32);
        }
        assert!((pixel - Color::splat(0.5)).length() < 1e-5);
    }

    #[test]
    fn test_miss_returns_background() {
        let scene = Scene::new();
        let camera = Camera::default();
        let tracer = PathTracer::new(&scene, &camera, &LinearTraversal, DEFAULT_MAX_BOUNCES);
        let mut stack = TraversalStack::new(0);
        let mut rng = Pcg32::seed_from_u64(1);

        let c = tracer
            .trace(Ray::new(Vec3::ZERO, Vec3::Y), &mut rng, &mut stack)
            .unwrap();
        assert!((c - sky_gradient(Vec3::Y)).length() < 1e-5);
    }

    #[test]
    fn test_zero_bounces_is_black() {
        let (scene, camera) = lit_scene();
        let tracer = PathTracer::new(&scene, &camera, &LinearTraversal, 0);
        let mut stack = TraversalStack::new(0);
        let c = tracer.sample_pixel(4, 4, 8, 8, 0, &mut stack).unwrap();
        assert_eq!(c, Color::ZERO);
    }

    #[test]
    fn test_first_hit_not_scaled_by_own_albedo() {
        let mut scene = Scene::new();
        let m = scene.add_material(Material::emissive(Color::splat(0.2), 5.0));
        scene.add_object(Object::sphere(Vec3::new(0.0, 0.0, 5.0), 1.0, m));
        let camera = Camera::default();
        let tracer = PathTracer::new(&scene, &camera, &LinearTraversal, 1);
        let mut stack = TraversalStack::new(0);
        let mut rng = Pcg32::seed_from_u64(4);

        let c = tracer
            .trace(Ray::new(Vec3::ZERO, Vec3::Z), &mut rng, &mut stack)
            .unwrap();
        assert!((c - Color::ONE).length() < 1e-5);
    }

    #[test]
    fn test_sample_is_deterministic_and_bounded() {
        let (scene, camera) = lit_scene();
        let tracer = PathTracer::new(&scene, &camera, &LinearTraversal, DEFAULT_MAX_BOUNCES);
        let mut stack = TraversalStack::new(0);

        let a = tracer.sample_pixel(4, 4, 8, 8, 3, &mut stack).unwrap();
        let b = tracer.sample_pixel(4, 4, 8, 8, 3, &mut stack).unwrap();
        assert_eq!(a, b);
        for ch in a.to_array() {
            assert!((0.0..=1.0).contains(&ch));
        }
    }

    #[test]
    fn test_environment_texture_used_on_miss() {
        let mut scene = Scene::new();
        let env = scene.textures.insert_solid(Color::new(1.0, 0.0, 0.0)).unwrap();
        let scene = scene.with_environment(env);
        let camera = Camera::default();
        let tracer = PathTracer::new(&scene, &camera, &LinearTraversal, DEFAULT_MAX_BOUNCES);
        let mut stack = TraversalStack::new(0);
        let mut rng = Pcg32::seed_from_u64(9);

        let c = tracer
            .trace(Ray::new(Vec3::ZERO, Vec3::X), &mut rng, &mut stack)
            .unwrap();
        assert!((c - Color::new(1.0, 0.0, 0.0)).length() < 1e-2);
    }
}
