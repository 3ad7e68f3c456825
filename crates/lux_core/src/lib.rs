//! Lux Core - read-only scene snapshot consumed by the renderer.
//!
//! This crate provides:
//!
//! - **Geometry**: `Object` records tagged by `Shape`
//! - **Shading inputs**: `Material`, `TextureAtlas`
//! - **Viewing**: `Camera`
//! - **Aggregate**: `Scene`, validated once at load
//!
//! Scene/material text parsers live outside this crate; they produce the
//! lists stored here.
//!
//! # Example
//!
//! ```ignore
//! use lux_core::{Material, Object, Scene};
//!
//! let mut scene = Scene::new();
//! let red = scene.add_material(Material::diffuse(Color::new(0.8, 0.1, 0.1)));
//! scene.add_object(Object::sphere(Vec3::ZERO, 1.0, red));
//! scene.validate()?;
//! ```

pub mod camera;
pub mod error;
pub mod material;
pub mod object;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use camera::Camera;
pub use error::{SceneError, SceneResult};
pub use material::{Color, Material};
pub use object::{Object, Shape};
pub use scene::Scene;
pub use texture::{TextureAtlas, TextureDescriptor};
