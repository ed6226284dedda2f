//! Dynamic Atlas CLI
//!
//! Pack rectangle lists into an atlas and stress the allocator.

use clap::{Parser, Subcommand};
use dynamic_atlas::{render_layout_png, AtlasManager, PlacementReport, Region};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "dynamic-atlas")]
#[command(author, version, about = "Dynamic 2D rectangle allocator for texture atlases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a JSON list of [width, height] pairs into one atlas
    Pack {
        /// Atlas width
        #[arg(long)]
        width: u32,

        /// Atlas height
        #[arg(long)]
        height: u32,

        /// Input JSON file, e.g. [[16, 16], [32, 8]]
        #[arg(short, long)]
        input: PathBuf,

        /// Write the placement report as JSON
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Render the resulting layout as PNG
        #[arg(long)]
        png: Option<PathBuf>,
    },

    /// Run a seeded allocate/free loop, checking consistency after every step
    Churn {
        /// Atlas width
        #[arg(long, default_value = "256")]
        width: u32,

        /// Atlas height
        #[arg(long, default_value = "256")]
        height: u32,

        /// Number of operations
        #[arg(short = 'n', long, default_value = "10000")]
        iterations: usize,

        /// Largest requested side
        #[arg(long, default_value = "16")]
        max_side: u32,

        /// Maximum number of live allocations
        #[arg(long, default_value = "64")]
        max_live: usize,

        /// RNG seed
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Pack {
            width,
            height,
            input,
            report,
            png,
        } => {
            pack_from_json(width, height, &input, report, png)?;
        }
        Commands::Churn {
            width,
            height,
            iterations,
            max_side,
            max_live,
            seed,
        } => {
            churn(width, height, iterations, max_side, max_live, seed)?;
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore the error if a subscriber is already set.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn check_dimensions(width: u32, height: u32) -> Result<(), Box<dyn std::error::Error>> {
    if width == 0 || height == 0 {
        return Err(format!("atlas dimensions must not be zero ({}x{})", width, height).into());
    }
    Ok(())
}

fn pack_from_json(
    width: u32,
    height: u32,
    input_path: &PathBuf,
    report_path: Option<PathBuf>,
    png_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    check_dimensions(width, height)?;

    println!("Loading sizes from {:?}...", input_path);
    let json_content = fs::read_to_string(input_path)?;
    let sizes: Vec<(u32, u32)> = serde_json::from_str(&json_content)?;
    println!("  Loaded {} requests", sizes.len());

    let mut atlas = AtlasManager::new(width, height);
    let report = PlacementReport::pack(&mut atlas, &sizes);

    println!("Packed into {}x{} atlas:", width, height);
    println!("  - Placed: {}", report.placed);
    println!("  - Failed: {}", report.failed);
    println!("  - Free regions: {}", report.free_region_count);
    println!("  - Utilization: {:.1}%", report.utilization * 100.0);

    if let Some(path) = report_path {
        fs::write(&path, report.to_json()?)?;
        println!("Wrote report to {:?}", path);
    }

    if let Some(path) = png_path {
        fs::write(&path, render_layout_png(&atlas)?)?;
        println!("Wrote layout to {:?}", path);
    }

    for region in report.regions() {
        atlas.free(region);
    }
    atlas.destroy();

    Ok(())
}

fn churn(
    width: u32,
    height: u32,
    iterations: usize,
    max_side: u32,
    max_live: usize,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    check_dimensions(width, height)?;
    let max_side = max_side.max(1);

    let mut atlas = AtlasManager::new(width, height);
    let mut rng = SeededRng::new(seed);
    let mut live: Vec<Region> = Vec::new();
    let mut failures = 0usize;
    let mut peak_nodes = atlas.node_count();

    for step in 0..iterations {
        let free_one = !live.is_empty() && (live.len() >= max_live || rng.chance(0.4));
        if free_one {
            let index = rng.next_range(0, live.len() as u64) as usize;
            atlas.free(live.swap_remove(index));
        } else {
            let w = rng.next_range(1, u64::from(max_side) + 1) as u32;
            let h = rng.next_range(1, u64::from(max_side) + 1) as u32;
            let region = atlas.allocate(w, h);
            if region.is_empty() {
                failures += 1;
            } else {
                live.push(region);
            }
        }

        if let Err(err) = atlas.verify() {
            return Err(format!("step {}: {}", step, err).into());
        }
        peak_nodes = peak_nodes.max(atlas.node_count());
    }

    println!("Churned {} operations on a {}x{} atlas:", iterations, width, height);
    println!("  - Live allocations: {}", live.len());
    println!("  - Failed allocations: {}", failures);
    println!("  - Free regions: {}", atlas.free_region_count());
    println!("  - Peak tree nodes: {}", peak_nodes);

    for region in live {
        atlas.free(region);
    }
    atlas.verify()?;
    println!("  - Free regions after release: {}", atlas.free_region_count());
    atlas.destroy();

    Ok(())
}

/// Simple LCG PRNG for deterministic churn.
struct SeededRng {
    state: u64,
}

impl SeededRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        // LCG parameters from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        // High bits of an LCG are the well-mixed ones.
        min + ((self.next_u64() >> 33) % (max - min))
    }

    fn chance(&mut self, p: f64) -> bool {
        ((self.next_u64() >> 11) as f64 / (1u64 << 53) as f64) < p
    }
}
