//! Error types for BVH adoption, traversal, and frame rendering.

use lux_core::SceneError;
use thiserror::Error;

/// A node array that breaks the flat-tree invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BvhError {
    #[error("node {node}: leaf must have object_id >= 0 and no children")]
    InvalidLeaf { node: usize },

    #[error("node {node}: interior node needs at least one child")]
    InvalidInterior { node: usize },

    #[error("node {node}: child {child} must be stored after its parent and inside the array")]
    ChildOutOfOrder { node: usize, child: i32 },

    #[error("node {node}: box does not contain the box of child {child}")]
    BoundsMismatch { node: usize, child: usize },

    #[error("node {child} is referenced by more than one parent")]
    SharedChild { child: usize },

    #[error("node {node} is not reachable from the root")]
    Unreachable { node: usize },

    #[error("node {node} references object {object}, but the scene has {count} objects")]
    ObjectOutOfRange {
        node: usize,
        object: usize,
        count: usize,
    },
}

/// Failures while walking an acceleration structure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraversalError {
    #[error("traversal stack overflow: capacity {capacity} exceeded")]
    StackOverflow { capacity: usize },
}

/// Top-level renderer errors.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid scene: {0}")]
    Scene(#[from] SceneError),

    #[error("invalid BVH: {0}")]
    Bvh(#[from] BvhError),

    #[error("traversal failed: {0}")]
    Traversal(#[from] TraversalError),

    #[error("failed to start render workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type RenderResult<T> = Result<T, RenderError>;
