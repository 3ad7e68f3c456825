//! Random direction sampling and the per-pixel seed.

use lux_core::Material;
use lux_math::{lerp3, Vec3};
use rand::Rng;

use crate::traversal::Hit;

/// Seed for one pixel of one frame: frame counter in the high half, pixel
/// index in the low half.
#[inline]
pub fn pixel_seed(frame: u32, pixel_index: usize) -> u64 {
    (u64::from(frame) << 32) | (pixel_index as u64 & 0xFFFF_FFFF)
}

/// Uniform random point on the unit sphere.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    // Rejection sampling keeps the distribution uniform
    loop {
        let v = Vec3::new(
            rng.gen::<f32>() * 2.0 - 1.0,
            rng.gen::<f32>() * 2.0 - 1.0,
            rng.gen::<f32>() * 2.0 - 1.0,
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

/// Cosine-weighted direction around `normal`.
pub fn cosine_direction<R: Rng + ?Sized>(normal: Vec3, rng: &mut R) -> Vec3 {
    let dir = normal + random_unit_vector(rng);
    // Sample landed opposite the normal
    if dir.length_squared() < 1e-8 {
        return normal;
    }
    dir.normalize()
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract unit `uv` through a surface with normal `n` facing against it.
///
/// Falls back to the mirror direction on total internal reflection.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    if etai_over_etat * sin_theta > 1.0 {
        return reflect(uv, n);
    }

    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// Next path direction: diffuse, mirror and refraction blended by
/// `metallic` and then `transparency`.
pub fn scatter_direction<R: Rng + ?Sized>(
    material: &Material,
    hit: &Hit,
    incoming: Vec3,
    rng: &mut R,
) -> Vec3 {
    let diffuse = cosine_direction(hit.normal, rng);
    let mirror = reflect(incoming, hit.normal);

    let eta = if hit.front_face {
        1.0 / material.refractive_index
    } else {
        material.refractive_index
    };
    let refraction = refract(incoming, hit.normal, eta);

    lerp3(lerp3(diffuse, mirror, material.metallic), refraction, material.transparency).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lux_core::Color;
    use lux_math::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hit_facing_up(front_face: bool) -> Hit {
        Hit {
            distance: 1.0,
            point: Vec3::ZERO,
            normal: Vec3::Y,
            front_face,
            object_id: 0,
            uv: Vec2::ZERO,
        }
    }

    #[test]
    fn test_pixel_seed_layout() {
        assert_eq!(pixel_seed(0, 7), 7);
        assert_eq!(pixel_seed(1, 0), 1 << 32);
        assert_ne!(pixel_seed(1, 5), pixel_seed(2, 5));
    }

    #[test]
    fn test_random_unit_vector_length() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_cosine_direction_hemisphere() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let d = cosine_direction(Vec3::Y, &mut rng);
            assert!(d.dot(Vec3::Y) >= -1e-5);
        }
    }

    #[test]
    fn test_reflect() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_straight_through() {
        let r = refract(-Vec3::Y, Vec3::Y, 1.0 / 1.5);
        assert!((r - -Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_total_internal_reflection_mirrors() {
        // Grazing ray leaving glass
        let d = Vec3::new(0.9, -0.1, 0.0).normalize();
        let r = refract(d, Vec3::Y, 1.5);
        assert!((r - reflect(d, Vec3::Y)).length() < 1e-5);
    }

    #[test]
    fn test_scatter_blend_endpoints() {
        let mut rng = StdRng::seed_from_u64(3);
        let incoming = Vec3::new(1.0, -1.0, 0.0).normalize();

        let mirror = Material::metal(Color::ONE, 0.0);
        let d = scatter_direction(&mirror, &hit_facing_up(true), incoming, &mut rng);
        assert!((d - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-5);

        let glass = Material::glass(1.0);
        let d = scatter_direction(&glass, &hit_facing_up(true), incoming, &mut rng);
        assert!((d - incoming).length() < 1e-4);
    }
}
