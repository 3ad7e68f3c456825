//! Multi-lobe reflectance model.
//!
//! Five lobes in the spirit of the Disney principled BRDF: diffuse with
//! retro-reflection, anisotropic GGX specular, an approximate specular
//! transmission, a GTR1 clearcoat and a tinted sheen. All lobe math runs in a
//! local shading frame whose `y` axis is the surface normal.

use std::f32::consts::PI;

use lux_core::{Color, Material};
use lux_math::{lerp3, orthonormal_basis, Interval, Vec3};

/// Smallest roughness alpha fed to the microfacet terms.
const ALPHA_MIN: f32 = 0.001;

/// Floor for cosines that end up in a denominator.
const COS_MIN: f32 = 1e-4;

/// Surface frame with the normal on `y` and the tangent on `x`.
#[derive(Debug, Clone, Copy)]
pub struct ShadingFrame {
    pub tangent: Vec3,
    pub normal: Vec3,
    pub bitangent: Vec3,
}

impl ShadingFrame {
    /// Build a frame around `normal`, spinning the tangent by `rotation`
    /// (in turns, so 1.0 is a full revolution).
    pub fn new(normal: Vec3, rotation: f32) -> Self {
        let (t, b) = orthonormal_basis(normal);
        let (sin, cos) = (rotation * 2.0 * PI).sin_cos();

        Self {
            tangent: t * cos + b * sin,
            normal,
            bitangent: b * cos - t * sin,
        }
    }

    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.tangent), v.dot(self.normal), v.dot(self.bitangent))
    }
}

/// Luminance of a color (Rec. 709).
#[inline]
pub fn luminance(c: Color) -> f32 {
    0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z
}

/// Schlick weight for Fresnel: `(1 - cos)^5`.
#[inline]
pub fn schlick_weight(cos_theta: f32) -> f32 {
    let x = (1.0 - cos_theta).clamp(0.0, 1.0);
    let x2 = x * x;
    x2 * x2 * x
}

/// Hue of `albedo` with its luminance normalized out.
#[inline]
pub fn tint(albedo: Color) -> Color {
    let lum = luminance(albedo);
    if lum > 0.0 {
        albedo / lum
    } else {
        Color::ONE
    }
}

pub fn sheen(cos_light_half: f32, base: Color, material: &Material) -> Color {
    let color = lerp3(Color::ONE, tint(base), material.tint_roughness);
    color * schlick_weight(cos_light_half) * material.sheen
}

/// Diffuse lobe with the Disney retro-reflection term.
pub fn diffuse(cos_view: f32, cos_light: f32, roughness: f32) -> f32 {
    let fl = schlick_weight(cos_light);
    let fv = schlick_weight(cos_view);

    let r = 0.5 + 2.0 * cos_light * cos_light * roughness * roughness;
    let retro = r * (fl + fv + fl * fv * (r - 1.0));

    ((1.0 - 0.5 * fl) * (1.0 - 0.5 * fv) + retro) / PI
}

/// Anisotropic roughness alphas `(ax, ay)`.
#[inline]
fn anisotropic_alpha(material: &Material) -> (f32, f32) {
    let aspect = (1.0 - 0.9 * material.anisotropy).sqrt();
    let r2 = material.roughness * material.roughness;
    ((r2 / aspect).max(ALPHA_MIN), (r2 * aspect).max(ALPHA_MIN))
}

/// Anisotropic GGX distribution for a local half vector.
pub fn ggx_anisotropic(h: Vec3, ax: f32, ay: f32) -> f32 {
    let t = h.x * h.x / (ax * ax) + h.z * h.z / (ay * ay) + h.y * h.y;
    1.0 / (PI * ax * ay * t * t)
}

/// Separable Smith masking for one local direction.
pub fn smith_g1_anisotropic(v: Vec3, h: Vec3, ax: f32, ay: f32) -> f32 {
    let cos2_theta = (h.y * h.y).max(COS_MIN);
    let tan2_theta = (1.0 - cos2_theta) / cos2_theta;

    let cos2_phi = v.x * v.x;
    let sin2_phi = 1.0 - cos2_phi;
    let a2 = cos2_phi * ax * ax + sin2_phi * ay * ay;

    let lambda = 0.5 * (-1.0 + (1.0 + a2 * tan2_theta).sqrt());
    1.0 / (1.0 + lambda)
}

pub fn specular(l: Vec3, v: Vec3, h: Vec3, material: &Material) -> f32 {
    let (ax, ay) = anisotropic_alpha(material);

    let d = ggx_anisotropic(h, ax, ay);
    let gl = smith_g1_anisotropic(l, h, ax, ay);
    let gv = smith_g1_anisotropic(v, h, ax, ay);

    d * gl * gv / (4.0 * l.y.abs().max(COS_MIN) * v.y.abs().max(COS_MIN))
}

/// Rough approximation of specular transmission.
pub fn transmission(l: Vec3, v: Vec3, h: Vec3, material: &Material) -> f32 {
    let (ax, ay) = anisotropic_alpha(material);
    let cos_view_half = v.dot(h) * h.y;
    let eta = 1.0 / material.refractive_index;

    let d = ggx_anisotropic(h, ax, ay);
    let gl = smith_g1_anisotropic(l, h, ax, ay);
    let gv = smith_g1_anisotropic(v, h, ax, ay);
    let f = eta + (1.0 - eta) * schlick_weight(cos_view_half);

    d * f * gl * gv
}

/// Generalized Trowbridge-Reitz with gamma = 1.
pub fn gtr1(cos_half: f32, alpha: f32) -> f32 {
    if alpha >= 1.0 {
        return 1.0 / PI;
    }
    let a2 = alpha * alpha;
    (a2 - 1.0) / (PI * a2.ln() * (1.0 + (a2 - 1.0) * cos_half * cos_half))
}

/// Separable Smith GGX term with a fixed alpha.
pub fn smith_g_ggx(cos: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    2.0 / (1.0 + (a2 + (1.0 - a2) * cos * cos).sqrt())
}

pub fn clearcoat(l: Vec3, v: Vec3, h: Vec3, material: &Material) -> f32 {
    let alpha = 0.1 + (0.001 - 0.1) * material.clearcoat_roughness;

    let d = gtr1(h.y.abs(), alpha);
    let gl = smith_g_ggx(l.y.abs(), 0.25);
    let gv = smith_g_ggx(v.y.abs(), 0.25);
    let f = 0.04 + 0.96 * schlick_weight(l.dot(h));

    0.25 * d * gl * gv * f
}

/// Lobe weights `[diffuse, specular, transmission, clearcoat]`, summing to 1.
pub fn lobe_weights(material: &Material) -> [f32; 4] {
    let m = material.metallic;
    let t = material.transparency;
    let w = [(1.0 - m) * (1.0 - t), 1.0, (1.0 - m) * t, material.clearcoat_thickness];

    let sum: f32 = w.iter().sum();
    w.map(|x| x / sum)
}

/// Clamp each channel to `[0, 1]`. NaN channels stay NaN.
#[inline]
pub fn clamp_color(c: Color) -> Color {
    let unit = Interval::UNIT;
    Color::new(unit.clamp(c.x), unit.clamp(c.y), unit.clamp(c.z))
}

/// Combined reflectance at a hit, clamped to `[0, 1]`.
///
/// `light` and `view` point away from the surface; `texel` is the texture
/// sample at the hit (white when untextured).
pub fn evaluate(material: &Material, texel: Color, normal: Vec3, light: Vec3, view: Vec3) -> Color {
    let frame = ShadingFrame::new(normal, material.anisotropy_rotation);
    let l = frame.to_local(light);
    let v = frame.to_local(view);

    let sum = l + v;
    let h = if sum.length_squared() > 1e-12 {
        sum.normalize()
    } else {
        Vec3::Y
    };

    let base = material.albedo * texel;
    let cos_light_half = l.dot(h);

    let diffuse_lobe =
        base * diffuse(v.y.abs(), l.y.abs(), material.roughness) + sheen(cos_light_half, base, material);

    let spec_color = lerp3(
        material.specular * material.tint * material.specular_intensity,
        base,
        material.metallic,
    );
    let specular_lobe = spec_color * specular(l, v, h, material);

    let transmission_lobe = material.transmission_filter * base * transmission(l, v, h, material);
    let clearcoat_lobe = Color::splat(clearcoat(l, v, h, material));

    let [wd, ws, wt, wc] = lobe_weights(material);
    clamp_color(diffuse_lobe * wd + specular_lobe * ws + transmission_lobe * wt + clearcoat_lobe * wc)
}

/// Emitted radiance, zero for non-emissive materials.
#[inline]
pub fn emission(material: &Material, texel: Color) -> Color {
    if material.is_emissive() {
        material.albedo * texel * material.emission_intensity
    } else {
        Color::ZERO
    }
}
