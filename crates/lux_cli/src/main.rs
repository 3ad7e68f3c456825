//! Lux - render a scene to a PPM file.
//!
//! Usage: lux <width> <height> <frames> <output.ppm> [config.json] [scene.json]
//!
//! Without a scene file a built-in demo scene is rendered. Frames are
//! accumulated into one buffer, so more frames means less noise.

mod demo;
mod ppm;

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use lux_core::{Camera, Scene};
use lux_math::Vec3;
use lux_renderer::{FrameBuffer, FrameStats, RenderConfig, RenderContext, Renderer, TraversalKind};

struct Args {
    width: u32,
    height: u32,
    frames: u32,
    output: PathBuf,
    config: Option<PathBuf>,
    scene: Option<PathBuf>,
}

impl Args {
    fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().collect();
        if args.len() < 5 || args.len() > 7 {
            bail!(
                "Usage: {} <width> <height> <frames> <output.ppm> [config.json] [scene.json]",
                args.first().map_or("lux", String::as_str)
            );
        }

        let width: u32 = args[1].parse().with_context(|| format!("invalid width '{}'", args[1]))?;
        let height: u32 = args[2].parse().with_context(|| format!("invalid height '{}'", args[2]))?;
        let frames: u32 = args[3].parse().with_context(|| format!("invalid frame count '{}'", args[3]))?;
        if width == 0 || height == 0 {
            bail!("image size must be non-zero, got {}x{}", width, height);
        }

        Ok(Self {
            width,
            height,
            frames,
            output: PathBuf::from(&args[4]),
            config: args.get(5).map(PathBuf::from),
            scene: args.get(6).map(PathBuf::from),
        })
    }
}

fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    let Some(path) = path else {
        return Ok(RenderConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

fn load_scene(path: &Path) -> Result<Scene> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene {}", path.display()))?;
    let scene: Scene = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse scene {}", path.display()))?;
    let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
    for object in &scene.objects {
        *kinds.entry(object.kind()).or_default() += 1;
    }
    log::info!(
        "Loaded scene from {}: {} objects {:?}, {} materials",
        path.display(),
        scene.objects.len(),
        kinds,
        scene.materials.len()
    );
    Ok(scene)
}

/// Camera that looks at the whole scene from the -Z side.
fn frame_scene(scene: &Scene) -> Camera {
    let bounds = scene.approximate_bounds();
    if bounds.is_empty() {
        return Camera::default();
    }

    let center = bounds.centroid();
    let extent = (bounds.max - bounds.min).max_element().max(1.0);
    Camera::new(center + Vec3::new(0.0, 0.3 * extent, -1.6 * extent), center)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("Starting Lux");

    let args = Args::parse()?;
    let config = load_config(args.config.as_deref())?;

    let (scene, camera) = match &args.scene {
        Some(path) => {
            let scene = load_scene(path)?;
            let camera = frame_scene(&scene);
            (scene, camera)
        }
        None => demo::build_scene()?,
    };
    let camera = camera.with_resolution(args.width, args.height);

    let mut ctx = RenderContext::new(scene, camera).context("scene failed validation")?;
    if config.traversal == TraversalKind::Bvh {
        let start = Instant::now();
        let bvh = ctx.build_bvh(config.split_strategy);
        log::info!(
            "BVH built in {:.2?}: {} nodes, depth {}, {:?} split",
            start.elapsed(),
            bvh.len(),
            bvh.depth(),
            bvh.strategy()
        );
    }

    let renderer = Renderer::new(config)?;
    let mut frame = FrameBuffer::new(args.width, args.height);

    log::info!(
        "Rendering {}x{}, {} frames",
        args.width,
        args.height,
        args.frames
    );
    let start = Instant::now();
    let mut stats = FrameStats::new();
    for _ in 0..args.frames {
        stats.record(renderer.render(&mut ctx, &mut frame)?);
    }
    log::info!("Rendered in {:.2?}", start.elapsed());
    if let Some(summary) = stats.summary() {
        log::info!("Frame stats: {}", summary);
    }

    ppm::save_ppm(&frame, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("Saved to {}", args.output.display());

    Ok(())
}
