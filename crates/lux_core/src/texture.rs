//! Texture storage shared by every material in a scene.
//!
//! All texels live in one flat array of packed RGBA8 values so the same
//! buffer can be uploaded unchanged to a compute backend. A
//! `TextureDescriptor` names a `width x height` block inside that array;
//! several materials (or several descriptors) may point at the same block.

use lux_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

const ONE_OVER_U8_MAX: f32 = 1.0 / 255.0;

/// Location of one texture inside the shared texel array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    /// Index of the first texel of the block
    pub offset: usize,
}

impl TextureDescriptor {
    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the block lies inside a texel array of `len` entries.
    /// An offset so large that the block end overflows never fits.
    pub fn fits_in(&self, len: usize) -> bool {
        self.offset
            .checked_add(self.texel_count())
            .is_some_and(|end| end <= len)
    }
}

/// Pack an RGBA8 quadruple; byte 0 holds red.
#[inline]
pub fn pack_rgba8(rgba: [u8; 4]) -> u32 {
    u32::from_le_bytes(rgba)
}

/// Unpack a texel into linear 0..1 RGB (alpha is dropped).
#[inline]
pub fn unpack_rgb(texel: u32) -> Vec3 {
    let [r, g, b, _] = texel.to_le_bytes();
    Vec3::new(r as f32, g as f32, b as f32) * ONE_OVER_U8_MAX
}

/// Descriptor table plus the flat texel array it indexes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextureAtlas {
    descriptors: Vec<TextureDescriptor>,
    texels: Vec<u32>,
}

impl TextureAtlas {
    /// Create an empty atlas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new texel block and return its texture id.
    pub fn insert(&mut self, width: u32, height: u32, texels: &[u32]) -> SceneResult<usize> {
        if width == 0 || height == 0 {
            return Err(SceneError::EmptyTexture { width, height });
        }
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(SceneError::TexelCountMismatch {
                width,
                height,
                expected,
                actual: texels.len(),
            });
        }

        let offset = self.texels.len();
        self.texels.extend_from_slice(texels);
        self.descriptors.push(TextureDescriptor {
            width,
            height,
            offset,
        });

        log::debug!(
            "Added texture {} ({}x{}, offset {})",
            self.descriptors.len() - 1,
            width,
            height,
            offset
        );

        Ok(self.descriptors.len() - 1)
    }

    /// Register a descriptor over texels that are already stored.
    pub fn insert_descriptor(&mut self, descriptor: TextureDescriptor) -> SceneResult<usize> {
        let id = self.descriptors.len();
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(SceneError::EmptyTexture {
                width: descriptor.width,
                height: descriptor.height,
            });
        }
        if !descriptor.fits_in(self.texels.len()) {
            return Err(SceneError::TextureBlockOutOfBounds {
                texture: id,
                offset: descriptor.offset,
                len: self.texels.len(),
            });
        }
        self.descriptors.push(descriptor);
        Ok(id)
    }

    /// Re-check every descriptor against the texel array, for atlases that
    /// were deserialized rather than built through `insert`.
    pub fn validate(&self) -> SceneResult<()> {
        for (id, desc) in self.descriptors.iter().enumerate() {
            if desc.width == 0 || desc.height == 0 {
                return Err(SceneError::EmptyTexture {
                    width: desc.width,
                    height: desc.height,
                });
            }
            if !desc.fits_in(self.texels.len()) {
                return Err(SceneError::TextureBlockOutOfBounds {
                    texture: id,
                    offset: desc.offset,
                    len: self.texels.len(),
                });
            }
        }
        Ok(())
    }

    /// Convenience for a 1x1 texture of one color.
    pub fn insert_solid(&mut self, color: Vec3) -> SceneResult<usize> {
        let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        let texel = pack_rgba8([c.x as u8, c.y as u8, c.z as u8, 255]);
        self.insert(1, 1, &[texel])
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptor(&self, id: usize) -> Option<&TextureDescriptor> {
        self.descriptors.get(id)
    }

    pub fn descriptors(&self) -> &[TextureDescriptor] {
        &self.descriptors
    }

    /// The flat texel array, ready for upload.
    pub fn texels(&self) -> &[u32] {
        &self.texels
    }

    /// Sample texture `id` at `(u, v)` with bilinear filtering.
    ///
    /// Coordinates wrap into `[0, 1)`; the right/bottom neighbours clamp at
    /// the block edge so a sample never reads a neighbouring block. `id`
    /// must be valid (checked by `Scene::validate`).
    pub fn sample(&self, id: usize, u: f32, v: f32) -> Vec3 {
        let desc = self.descriptors[id];
        let (w, h) = (desc.width as usize, desc.height as usize);

        let x = u.rem_euclid(1.0) * (w - 1) as f32;
        let y = v.rem_euclid(1.0) * (h - 1) as f32;

        let x0 = (x.floor() as usize).min(w - 1);
        let y0 = (y.floor() as usize).min(h - 1);
        let x1 = (x0 + 1).min(w - 1);
        let y1 = (y0 + 1).min(h - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let texel = |tx: usize, ty: usize| unpack_rgb(self.texels[desc.offset + ty * w + tx]);

        texel(x0, y0) * (1.0 - fx) * (1.0 - fy)
            + texel(x1, y0) * fx * (1.0 - fy)
            + texel(x0, y1) * (1.0 - fx) * fy
            + texel(x1, y1) * fx * fy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn test_pack_unpack() {
        let texel = pack_rgba8([255, 0, 51, 255]);
        assert!(approx(unpack_rgb(texel), Vec3::new(1.0, 0.0, 0.2)));
    }

    #[test]
    fn test_solid_texture_samples_everywhere() {
        let mut atlas = TextureAtlas::new();
        let id = atlas.insert_solid(Vec3::new(1.0, 0.0, 0.0)).unwrap();

        for (u, v) in [(0.0, 0.0), (0.5, 0.5), (0.99, 0.3), (-2.25, 7.5)] {
            assert!(approx(atlas.sample(id, u, v), Vec3::new(1.0, 0.0, 0.0)));
        }
    }

    #[test]
    fn test_bilinear_midpoint() {
        let mut atlas = TextureAtlas::new();
        let black = pack_rgba8([0, 0, 0, 255]);
        let white = pack_rgba8([255, 255, 255, 255]);
        let id = atlas.insert(2, 1, &[black, white]).unwrap();

        let mid = atlas.sample(id, 0.5, 0.0);
        assert!(approx(mid, Vec3::splat(0.5)));
    }

    #[test]
    fn test_blocks_do_not_bleed() {
        let mut atlas = TextureAtlas::new();
        let red = pack_rgba8([255, 0, 0, 255]);
        let blue = pack_rgba8([0, 0, 255, 255]);
        let first = atlas.insert(2, 2, &[red; 4]).unwrap();
        let second = atlas.insert(2, 2, &[blue; 4]).unwrap();

        assert!(approx(atlas.sample(first, 0.999, 0.999), Vec3::X));
        assert!(approx(atlas.sample(second, 0.0, 0.0), Vec3::Z));
        assert_eq!(atlas.descriptor(second).unwrap().offset, 4);
    }

    #[test]
    fn test_texel_count_mismatch() {
        let mut atlas = TextureAtlas::new();
        let err = atlas.insert(2, 2, &[0; 3]).unwrap_err();
        assert!(matches!(err, SceneError::TexelCountMismatch { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn test_validate_deserialized_atlas() {
        let json = r#"{ "descriptors": [{ "width": 2, "height": 2, "offset": 1 }], "texels": [0, 0, 0, 0] }"#;
        let atlas: TextureAtlas = serde_json::from_str(json).unwrap();
        assert!(matches!(
            atlas.validate(),
            Err(SceneError::TextureBlockOutOfBounds { texture: 0, offset: 1, len: 4 })
        ));
    }

    #[test]
    fn test_validate_rejects_overflowing_offset() {
        let json = format!(
            r#"{{ "descriptors": [{{ "width": 2, "height": 2, "offset": {} }}], "texels": [0, 0, 0, 0] }}"#,
            usize::MAX - 1
        );
        let atlas: TextureAtlas = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            atlas.validate(),
            Err(SceneError::TextureBlockOutOfBounds { texture: 0, .. })
        ));

        let mut atlas = TextureAtlas::new();
        atlas.insert(1, 1, &[0]).unwrap();
        let huge = TextureDescriptor { width: 2, height: 2, offset: usize::MAX };
        assert!(atlas.insert_descriptor(huge).is_err());
    }

    #[test]
    fn test_shared_descriptor_bounds() {
        let mut atlas = TextureAtlas::new();
        atlas.insert(2, 2, &[0; 4]).unwrap();

        let shared = TextureDescriptor { width: 2, height: 1, offset: 2 };
        assert_eq!(atlas.insert_descriptor(shared).unwrap(), 1);

        let overrun = TextureDescriptor { width: 2, height: 2, offset: 2 };
        assert!(matches!(
            atlas.insert_descriptor(overrun),
            Err(SceneError::TextureBlockOutOfBounds { .. })
        ));
    }
}
