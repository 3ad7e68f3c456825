//! Built-in demo scene.

use anyhow::Result;
use lux_core::texture::pack_rgba8;
use lux_core::{Camera, Color, Material, Object, Scene};
use lux_math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed seed so the demo is the same on every run.
const DEMO_SEED: u64 = 0x1ce5_7a11;

fn checker_texels(size: u32, a: [u8; 4], b: [u8; 4]) -> Vec<u32> {
    (0..size * size)
        .map(|i| {
            let (x, y) = (i % size, i / size);
            pack_rgba8(if (x + y) % 2 == 0 { a } else { b })
        })
        .collect()
}

pub fn build_scene() -> Result<(Scene, Camera)> {
    let mut scene = Scene::new();

    let checker = scene
        .textures
        .insert(8, 8, &checker_texels(8, [230, 230, 230, 255], [40, 40, 40, 255]))?;

    // Ground
    let ground = scene.add_material(Material::diffuse(Color::new(0.5, 0.5, 0.5)).with_texture(checker));
    scene.add_object(Object::plane(Vec3::ZERO, Vec3::Y, 40.0, 40.0, ground));

    // Three main spheres
    let glass = scene.add_material(Material::glass(1.5));
    let brown = scene.add_material(Material::diffuse(Color::new(0.4, 0.2, 0.1)).with_sheen(0.5, 0.3));
    let metal = scene.add_material(Material::metal(Color::new(0.7, 0.6, 0.5), 0.05).with_anisotropy(0.6, 0.1));
    scene.add_object(Object::sphere(Vec3::new(0.0, 1.0, 0.0), 1.0, glass));
    scene.add_object(Object::sphere(Vec3::new(-4.0, 1.0, 0.0), 1.0, brown));
    scene.add_object(Object::sphere(Vec3::new(4.0, 1.0, 0.0), 1.0, metal));

    // Lacquered box and a small tent of triangles behind it
    let lacquer = scene.add_material(Material::diffuse(Color::new(0.1, 0.3, 0.6)).with_clearcoat(1.0, 0.1));
    scene.add_object(Object::cube(Vec3::new(-1.0, 0.0, -3.5), Vec3::new(1.0, 1.2, -2.5), lacquer));

    let tent = scene.add_material(Material::metal(Color::new(0.8, 0.5, 0.2), 0.3));
    let apex = Vec3::new(0.0, 2.2, -5.0);
    let corners = [
        Vec3::new(-1.2, 0.0, -6.0),
        Vec3::new(1.2, 0.0, -6.0),
        Vec3::new(1.2, 0.0, -4.0),
        Vec3::new(-1.2, 0.0, -4.0),
    ];
    for i in 0..4 {
        scene.add_object(Object::triangle(corners[i], corners[(i + 1) % 4], apex, tent));
    }

    // Overhead light
    let light = scene.add_material(Material::emissive(Color::new(1.0, 0.95, 0.85), 4.0));
    scene.add_object(Object::disk(Vec3::new(0.0, 6.0, 0.0), -Vec3::Y, 2.0, light));

    // Small random spheres
    let mut rng = StdRng::seed_from_u64(DEMO_SEED);
    for a in -5..5 {
        for b in -5..5 {
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );

            if (center - Vec3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let choose_mat: f32 = rng.gen();
            let material = if choose_mat < 0.8 {
                let albedo = Color::new(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                );
                Material::diffuse(albedo)
            } else if choose_mat < 0.95 {
                let albedo = Color::new(
                    0.5 + 0.5 * rng.gen::<f32>(),
                    0.5 + 0.5 * rng.gen::<f32>(),
                    0.5 + 0.5 * rng.gen::<f32>(),
                );
                Material::metal(albedo, 0.5 * rng.gen::<f32>())
            } else {
                Material::glass(1.5)
            };

            let id = scene.add_material(material);
            scene.add_object(Object::sphere(center, 0.2, id));
        }
    }

    log::info!(
        "Demo scene: {} objects, {} materials",
        scene.objects.len(),
        scene.materials.len()
    );

    let camera = Camera::new(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO).with_fov(20.0);
    Ok((scene, camera))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_scene_is_valid() {
        let (scene, _) = build_scene().unwrap();
        assert!(scene.validate().is_ok());
        assert!(scene.object_count() > 10);
        assert_eq!(scene.textures.len(), 1);
    }

    #[test]
    fn test_demo_scene_is_deterministic() {
        let (a, _) = build_scene().unwrap();
        let (b, _) = build_scene().unwrap();
        assert_eq!(a.objects, b.objects);
    }
}
