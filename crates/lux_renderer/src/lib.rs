//! Lux Renderer - CPU path tracing over a flat BVH.
//!
//! Builds a bounding volume hierarchy over a `lux_core::Scene`, traces one
//! jittered path per pixel per frame on a persistent rayon pool, and keeps
//! a running mean of the samples in a caller-owned `FrameBuffer`.
//!
//! The node array ([`Bvh::as_bytes`]) and the texture atlas are flat buffers
//! so a GPU backend can run the same algorithms against them.

pub mod bvh;
pub mod error;
pub mod framebuffer;
pub mod integrator;
pub mod intersect;
pub mod partition;
mod renderer;
pub mod sampling;
pub mod shading;
pub mod stats;
pub mod traversal;

pub use bvh::{leaf_bounds, Bvh, BvhNode, SplitStrategy, NO_NODE};
pub use error::{BvhError, RenderError, RenderResult, TraversalError};
pub use framebuffer::{color_to_rgba, linear_to_gamma, FrameBuffer};
pub use integrator::{PathTracer, DEFAULT_MAX_BOUNCES};
pub use partition::row_ranges;
pub use renderer::{RenderConfig, RenderContext, Renderer};
pub use stats::{FrameStats, Moments, StatsSummary};
pub use traversal::{Hit, LinearTraversal, Traversal, TraversalKind, TraversalStack, HIT_EPSILON};
