//! Frame renderer: configuration, per-scene state and the worker pool.

use std::time::{Duration, Instant};

use lux_core::{Camera, Scene};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bvh::{Bvh, BvhNode, SplitStrategy};
use crate::error::RenderResult;
use crate::framebuffer::FrameBuffer;
use crate::integrator::{PathTracer, DEFAULT_MAX_BOUNCES};
use crate::partition::{row_ranges, split_rows};
use crate::traversal::{LinearTraversal, Traversal, TraversalKind};

/// Render settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Worker threads, 0 picks the available parallelism
    pub threads: usize,
    /// Maximum path segments per sample
    pub max_bounces: u32,
    pub traversal: TraversalKind,
    pub split_strategy: SplitStrategy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            max_bounces: DEFAULT_MAX_BOUNCES,
            traversal: TraversalKind::Bvh,
            split_strategy: SplitStrategy::Median,
        }
    }
}

impl RenderConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_max_bounces(mut self, max_bounces: u32) -> Self {
        self.max_bounces = max_bounces;
        self
    }

    pub fn with_traversal(mut self, traversal: TraversalKind) -> Self {
        self.traversal = traversal;
        self
    }

    pub fn with_split_strategy(mut self, split_strategy: SplitStrategy) -> Self {
        self.split_strategy = split_strategy;
        self
    }

    /// Thread count with 0 resolved to the machine's parallelism.
    pub fn resolved_threads(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        std::thread::available_parallelism().map_or(1, |n| n.get())
    }
}

/// Everything that persists between frames of one scene.
///
/// The frame counter drives both the per-pixel seeds and the running mean;
/// whoever moves the camera or edits the scene must reset it.
#[derive(Debug, Clone)]
pub struct RenderContext {
    scene: Scene,
    bvh: Option<Bvh>,
    camera: Camera,
    frame_counter: u32,
}

impl RenderContext {
    /// Validate `scene` and wrap it for rendering, without a BVH.
    pub fn new(scene: Scene, camera: Camera) -> RenderResult<Self> {
        scene.validate()?;
        Ok(Self {
            scene,
            bvh: None,
            camera,
            frame_counter: 0,
        })
    }

    /// Build a BVH over the scene's objects.
    pub fn build_bvh(&mut self, strategy: SplitStrategy) -> &Bvh {
        self.frame_counter = 0;
        self.bvh.insert(Bvh::build(&self.scene.objects, strategy))
    }

    /// Adopt a node array built elsewhere after checking it against the scene.
    pub fn adopt_bvh_nodes(&mut self, nodes: Vec<BvhNode>) -> RenderResult<()> {
        let bvh = Bvh::from_nodes(nodes, self.scene.object_count())?;
        self.bvh = Some(bvh);
        self.frame_counter = 0;
        Ok(())
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Move the camera and restart accumulation.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.reset_accumulation();
    }

    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    /// Next frame overwrites the buffer with its raw sample.
    pub fn reset_accumulation(&mut self) {
        self.frame_counter = 0;
    }
}

/// CPU renderer backed by a persistent rayon pool.
pub struct Renderer {
    pool: rayon::ThreadPool,
    config: RenderConfig,
    threads: usize,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> RenderResult<Self> {
        let threads = config.resolved_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lux-worker-{i}"))
            .build()?;

        log::info!(
            "Renderer started: {} threads, {:?} traversal, max {} bounces",
            threads,
            config.traversal,
            config.max_bounces
        );

        Ok(Self {
            pool,
            config,
            threads,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    fn traversal<'a>(&self, ctx: &'a RenderContext) -> &'a dyn Traversal {
        match (self.config.traversal, ctx.bvh()) {
            (TraversalKind::Bvh, Some(bvh)) => bvh as &dyn Traversal,
            (TraversalKind::Bvh, None) => {
                if ctx.frame_counter == 0 {
                    log::warn!("No BVH built, falling back to linear traversal");
                }
                &LinearTraversal
            }
            (TraversalKind::Linear, _) => &LinearTraversal,
        }
    }

    /// Render one frame into `frame`, advance the frame counter and return
    /// the wall time the frame took.
    ///
    /// Blocks until every row band is done. On error the buffer may be
    /// partially updated and the counter is left unchanged.
    pub fn render(&self, ctx: &mut RenderContext, frame: &mut FrameBuffer) -> RenderResult<Duration> {
        let start = Instant::now();
        let (width, height) = (frame.width(), frame.height());
        let frame_index = ctx.frame_counter;

        let traversal_name = {
            let traversal = self.traversal(ctx);
            let tracer = PathTracer::new(&ctx.scene, &ctx.camera, traversal, self.config.max_bounces);

            let ranges = row_ranges(height as usize, self.threads);
            let bands = split_rows(frame.pixels_mut(), width as usize, &ranges);

            self.pool.install(|| {
                bands
                    .into_par_iter()
                    .zip(ranges)
                    .try_for_each(|(band, rows)| tracer.render_rows(band, rows, width, height, frame_index))
            })?;

            traversal.name()
        };

        let elapsed = start.elapsed();
        log::debug!(
            "Frame {} rendered in {:.2?} ({} traversal)",
            frame_index,
            elapsed,
            traversal_name
        );

        ctx.frame_counter = ctx.frame_counter.wrapping_add(1);
        Ok(elapsed)
    }
}
