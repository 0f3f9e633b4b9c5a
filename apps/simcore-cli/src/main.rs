use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use simcore_cull::{ChunkVisibilityCuller, CullingStats};
use simcore_governor::{FrameTimer, SystemReport};
use simcore_kernel::{SimConfig, Simulation, World};

mod busywork;

use busywork::Busywork;

#[derive(Parser)]
#[command(name = "simcore-cli", about = "Exercise the simulation performance core")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file overriding governor, spatial and culler tuning
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Run synthetic behavior systems over a random world and report costs
    Stress {
        /// Number of entities to spawn
        #[arg(short, long, default_value = "2000")]
        entities: usize,
        /// Number of frames to run
        #[arg(short, long, default_value = "240")]
        frames: u64,
        /// Number of synthetic systems
        #[arg(short, long, default_value = "40")]
        systems: usize,
        /// Frame rate fed to the governor each frame
        #[arg(long, value_enum, default_value_t = FpsProfile::Dip)]
        fps_profile: FpsProfile,
        /// Seed for the world layout and the systems' randomness
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which chunks and tiles a viewport covers
    Cull {
        #[arg(long, default_value = "0")]
        x: f32,
        #[arg(long, default_value = "0")]
        y: f32,
        #[arg(long, default_value = "32")]
        width: f32,
        #[arg(long, default_value = "32")]
        height: f32,
        #[arg(long, default_value = "1")]
        zoom: f32,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FpsProfile {
    /// Constant 60 FPS
    Steady,
    /// Healthy, then a slump below 30, a partial recovery, then healthy again
    Dip,
    /// Derived from measured frame times
    Measured,
}

impl FpsProfile {
    fn fps(self, frame: u64, frames: u64, timer: &FrameTimer) -> f32 {
        match self {
            FpsProfile::Steady => 60.0,
            FpsProfile::Dip => {
                let quarter = (frames / 4).max(1);
                match frame / quarter {
                    1 => 22.0,
                    2 => 40.0,
                    _ => 60.0,
                }
            }
            FpsProfile::Measured if timer.is_empty() => 60.0,
            FpsProfile::Measured => timer.fps(),
        }
    }
}

#[derive(Serialize)]
struct StressReport<'a> {
    frames: u64,
    entities: usize,
    average_frame_ms: f64,
    max_frame_ms: f64,
    systems: &'a [SystemReport],
    culling: CullingStats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("simcore-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", simcore_common::crate_info());
            println!("governor: {}", simcore_governor::crate_info());
            println!("spatial: {}", simcore_spatial::crate_info());
            println!("cull: {}", simcore_cull::crate_info());
            println!("kernel: {}", simcore_kernel::crate_info());
        }
        Commands::Stress {
            entities,
            frames,
            systems,
            fps_profile,
            seed,
            json,
        } => run_stress(&config, entities, frames, systems, fps_profile, seed, json)?,
        Commands::Cull {
            x,
            y,
            width,
            height,
            zoom,
        } => run_cull(&config, x, y, width, height, zoom),
    }

    Ok(())
}

fn run_stress(
    config: &SimConfig,
    entities: usize,
    frames: u64,
    systems: usize,
    profile: FpsProfile,
    seed: u64,
    json: bool,
) -> anyhow::Result<()> {
    let (world_w, world_h) = (
        config.culler.world_width as f32,
        config.culler.world_height as f32,
    );
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut world = World::with_seed(seed);
    for _ in 0..entities {
        world.spawn(glam::Vec2::new(rng.f32() * world_w, rng.f32() * world_h));
    }

    let mut sim = Simulation::new(world, config);
    for i in 0..systems {
        sim.add_system(Box::new(Busywork::new(i, 8)));
    }
    tracing::info!(entities, systems, frames, ?profile, "stress run starting");

    let mut timer = FrameTimer::new(config.governor.history);
    let mut skipped_total = 0;
    for frame in 0..frames {
        let fps = profile.fps(frame, frames, &timer);
        let summary = sim.run_frame(fps);
        timer.record(summary.elapsed);
        skipped_total += summary.skipped;
    }
    tracing::info!(skipped_total, "stress run complete");

    let culling = {
        let (w, h) = (world_w * 0.5, world_h * 0.5);
        sim.cull_view(w * 0.5, h * 0.5, w, h, 1.0);
        *sim.culler().stats()
    };
    let average_frame_ms = ms(timer.average());
    let max_frame_ms = ms(timer.max());
    let report = sim.governor_mut().performance_report();

    if json {
        let out = StressReport {
            frames,
            entities,
            average_frame_ms,
            max_frame_ms,
            systems: report,
            culling,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{:<16} {:<9} {:>9} {:>9} {:>6} {:>5}",
        "system", "priority", "avg ms", "last ms", "skips", "freq"
    );
    for row in report {
        println!(
            "{:<16} {:<9} {:>9.4} {:>9.4} {:>6} {:>5}",
            row.name, row.priority, row.avg_time_ms, row.last_time_ms, row.skip_count, row.frequency
        );
    }
    println!();
    println!("frames: {frames}, avg {average_frame_ms:.3} ms, max {max_frame_ms:.3} ms");
    println!(
        "culling: {} total, {} visible, {} culled (ratio {:.2})",
        culling.total_entities,
        culling.visible_entities,
        culling.culled_entities,
        culling.culling_ratio
    );
    Ok(())
}

fn run_cull(config: &SimConfig, x: f32, y: f32, width: f32, height: f32, zoom: f32) {
    let mut culler = ChunkVisibilityCuller::new(config.culler);
    culler.set_viewport(x, y, width, height, zoom);

    let (cols, rows) = culler.chunk_grid();
    println!(
        "world {}x{}, chunk grid {cols}x{rows}, {} visible",
        culler.world_size().0,
        culler.world_size().1,
        culler.visible_chunk_count()
    );
    for cy in 0..rows as i32 {
        let line: String = (0..cols as i32)
            .map(|cx| if culler.is_chunk_visible(cx, cy) { '#' } else { '.' })
            .collect();
        println!("  {line}");
    }

    let b = culler.visible_tile_bounds();
    println!(
        "tiles: x {}..{}, y {}..{} ({} tiles)",
        b.start_x,
        b.end_x,
        b.start_y,
        b.end_y,
        b.width() * b.height()
    );
    let (cx, cy) = culler.viewport().center();
    println!(
        "center ({cx:.1}, {cy:.1}): lod {}, detail {}",
        culler.lod_level(cx, cy).as_u8(),
        culler.should_render_detail(cx, cy)
    );
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
