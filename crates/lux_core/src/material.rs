//! Surface description consumed by the multi-lobe shading model.

use lux_math::Vec3;
use serde::{Deserialize, Serialize};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Physically-inspired material with artist-friendly parameters.
///
/// Colors are linear RGB. Scalar parameters live in `[0, 1]` except
/// `refractive_index` (>= 1) and `emission_intensity` (>= 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Base color (albedo for dielectrics, reflectance for metals)
    pub albedo: Color,

    /// Tint applied to the dielectric specular lobe
    pub tint: Color,

    /// Specular color at normal incidence for dielectrics
    pub specular: Color,

    /// Color filter applied to light transmitted through the surface
    pub transmission_filter: Color,

    /// Scales the specular lobe
    pub specular_intensity: f32,

    /// 0 = smooth/glossy, 1 = rough/diffuse
    pub roughness: f32,

    /// 0 = dielectric, 1 = metal
    pub metallic: f32,

    /// 0 = opaque, 1 = fully transmissive
    pub transparency: f32,

    pub refractive_index: f32,

    /// 0 = isotropic; towards 1 stretches highlights along the tangent
    pub anisotropy: f32,

    /// Rotation of the anisotropy tangent, in turns (0..1)
    pub anisotropy_rotation: f32,

    /// Clearcoat layer strength
    pub clearcoat_thickness: f32,

    /// 0 = glossy coat, 1 = satin coat
    pub clearcoat_roughness: f32,

    /// Grazing retro-reflection for cloth-like materials
    pub sheen: f32,

    /// Blends the sheen color from white towards the albedo hue
    pub tint_roughness: f32,

    /// Radiance emitted per unit albedo; zero disables emission
    pub emission_intensity: f32,

    /// Texture in the scene atlas modulating the albedo
    pub texture_id: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Color::new(0.8, 0.8, 0.8),
            tint: Color::ONE,
            specular: Color::splat(0.04),
            transmission_filter: Color::ONE,
            specular_intensity: 0.5,
            roughness: 0.5,
            metallic: 0.0,
            transparency: 0.0,
            refractive_index: 1.5,
            anisotropy: 0.0,
            anisotropy_rotation: 0.0,
            clearcoat_thickness: 0.0,
            clearcoat_roughness: 0.5,
            sheen: 0.0,
            tint_roughness: 0.5,
            emission_intensity: 0.0,
            texture_id: None,
        }
    }
}

impl Material {
    /// Create a new material with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a simple diffuse material.
    pub fn diffuse(albedo: Color) -> Self {
        Self {
            albedo,
            roughness: 1.0,
            specular_intensity: 0.0,
            ..Default::default()
        }
    }

    /// Create a metallic material.
    pub fn metal(albedo: Color, roughness: f32) -> Self {
        Self {
            albedo,
            metallic: 1.0,
            specular_intensity: 1.0,
            ..Default::default()
        }
        .with_roughness(roughness)
    }

    /// Create a clear dielectric such as glass or water.
    pub fn glass(refractive_index: f32) -> Self {
        Self {
            albedo: Color::ONE,
            roughness: 0.0,
            transparency: 1.0,
            specular_intensity: 1.0,
            ..Default::default()
        }
        .with_refractive_index(refractive_index)
    }

    /// Create a light-emitting material.
    pub fn emissive(color: Color, intensity: f32) -> Self {
        Self {
            albedo: color,
            roughness: 1.0,
            specular_intensity: 0.0,
            emission_intensity: intensity.max(0.0),
            ..Default::default()
        }
    }

    /// Builder method to set albedo.
    pub fn with_albedo(mut self, albedo: Color) -> Self {
        self.albedo = albedo;
        self
    }

    /// Builder method to set metallic.
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Builder method to set roughness.
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    pub fn with_transparency(mut self, transparency: f32) -> Self {
        self.transparency = transparency.clamp(0.0, 1.0);
        self
    }

    pub fn with_refractive_index(mut self, ior: f32) -> Self {
        self.refractive_index = ior.max(1.0);
        self
    }

    pub fn with_anisotropy(mut self, anisotropy: f32, rotation: f32) -> Self {
        self.anisotropy = anisotropy.clamp(0.0, 1.0);
        self.anisotropy_rotation = rotation.rem_euclid(1.0);
        self
    }

    pub fn with_clearcoat(mut self, thickness: f32, roughness: f32) -> Self {
        self.clearcoat_thickness = thickness.clamp(0.0, 1.0);
        self.clearcoat_roughness = roughness.clamp(0.0, 1.0);
        self
    }

    pub fn with_sheen(mut self, sheen: f32, tint_roughness: f32) -> Self {
        self.sheen = sheen.clamp(0.0, 1.0);
        self.tint_roughness = tint_roughness.clamp(0.0, 1.0);
        self
    }

    pub fn with_emission(mut self, intensity: f32) -> Self {
        self.emission_intensity = intensity.max(0.0);
        self
    }

    pub fn with_texture(mut self, texture_id: usize) -> Self {
        self.texture_id = Some(texture_id);
        self
    }

    /// Check if this material is emissive.
    pub fn is_emissive(&self) -> bool {
        self.emission_intensity > 0.0
    }
}
