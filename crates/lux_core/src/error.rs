use thiserror::Error;

/// Errors raised while assembling or validating a scene snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("object {object} references material {material}, but only {count} materials exist")]
    MaterialOutOfRange {
        object: usize,
        material: usize,
        count: usize,
    },

    #[error("material {material} references texture {texture}, but only {count} textures exist")]
    TextureOutOfRange {
        material: usize,
        texture: usize,
        count: usize,
    },

    #[error("environment texture {texture} does not exist ({count} textures loaded)")]
    EnvironmentOutOfRange { texture: usize, count: usize },

    #[error("texture block {width}x{height} needs {expected} texels, got {actual}")]
    TexelCountMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("texture must have non-zero dimensions, got {width}x{height}")]
    EmptyTexture { width: u32, height: u32 },

    #[error("texture {texture} block at offset {offset} overruns the texel array ({len} texels)")]
    TextureBlockOutOfBounds {
        texture: usize,
        offset: usize,
        len: usize,
    },
}

pub type SceneResult<T> = Result<T, SceneError>;
