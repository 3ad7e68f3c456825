//! Scene aggregate for Lux.
//!
//! Owns the object, material, and texture lists produced by the loaders.
//! Everything here is built once and then shared read-only with the render
//! workers; a scene change means building a new `Scene`.

use lux_math::Aabb;
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::{Material, Object, TextureAtlas};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    pub objects: Vec<Object>,
    pub materials: Vec<Material>,
    pub textures: TextureAtlas,
    /// Equirectangular texture sampled by rays that escape the scene.
    /// `None` falls back to a sky gradient.
    pub environment: Option<usize>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a material and return its id.
    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add an object and return its id.
    pub fn add_object(&mut self, object: Object) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn with_environment(mut self, texture_id: usize) -> Self {
        self.environment = Some(texture_id);
        self
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Check every cross reference once so the render loop can index freely.
    pub fn validate(&self) -> SceneResult<()> {
        self.textures.validate()?;

        let material_count = self.materials.len();
        let texture_count = self.textures.len();

        for (i, object) in self.objects.iter().enumerate() {
            if object.material_id >= material_count {
                return Err(SceneError::MaterialOutOfRange {
                    object: i,
                    material: object.material_id,
                    count: material_count,
                });
            }
        }

        for (i, material) in self.materials.iter().enumerate() {
            if let Some(texture) = material.texture_id {
                if texture >= texture_count {
                    return Err(SceneError::TextureOutOfRange {
                        material: i,
                        texture,
                        count: texture_count,
                    });
                }
            }
        }

        if let Some(texture) = self.environment {
            if texture >= texture_count {
                return Err(SceneError::EnvironmentOutOfRange {
                    texture,
                    count: texture_count,
                });
            }
        }

        log::debug!(
            "Scene validated: {} objects, {} materials, {} textures",
            self.objects.len(),
            material_count,
            texture_count
        );

        Ok(())
    }

    /// Rough world bounds from object positions and bounding radii.
    pub fn approximate_bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        for object in &self.objects {
            let c = object.position();
            let r = lux_math::Vec3::splat(object.bounding_radius());
            bounds.expand(&Aabb::new(c - r, c + r));
        }
        bounds
    }
}
