//! Reconstruct 3D wires from a structure-from-motion reconstruction and the
//! 2D line detections of its images.
//!
//! Every shot with a detection record is reconstructed independently, then
//! the per-image observations are merged across views.
//!
//! Usage:
//!   cargo run --bin reconstruct_wires -- reconstruction.meshed.json detections.json -o out

use anyhow::{bail, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use wirecrate_algorithms::{ImageWireframe, WireframeConfig};
use wirecrate_core::{image_number_from_name, DetectionRecord};
use wirecrate_io::{read_detections, read_reconstructions, write_line_set, write_observation, WriteOptions};

#[derive(Parser, Debug)]
#[command(author, version, about = "Reconstruct 3D wires from line detections")]
struct Args {
    /// Reconstruction JSON with per-shot vertices
    reconstruction: PathBuf,

    /// Detection JSON with one record per image
    detections: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Optional JSON WireframeConfig; defaults are used if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Index of the reconstruction to use
    #[arg(long, default_value_t = 0)]
    index: usize,

    /// Seed of the per-image random generators
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Color fitted inliers white and outliers red
    #[arg(long)]
    color_inliers: bool,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<WireframeConfig> {
    let Some(path) = path else {
        return Ok(WireframeConfig::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

fn write_observations(dir: &Path, wireframe: &ImageWireframe) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;
    for (i, observation) in wireframe.observations().iter().enumerate() {
        write_observation(dir.join(format!("line_{i}.ply")), observation, wireframe.vertex_colors(i))?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    config.color_inliers |= args.color_inliers;
    config.validate()?;

    let reconstructions = read_reconstructions(&args.reconstruction)?;
    let Some(reconstruction) = reconstructions.get(args.index) else {
        bail!("{} holds {} reconstructions", args.reconstruction.display(), reconstructions.len());
    };

    let records: HashMap<i32, DetectionRecord> = read_detections(&args.detections)?
        .into_iter()
        .map(|r| (r.image_id, r))
        .collect();

    let jobs: Vec<_> = reconstruction
        .sorted_shots()
        .into_iter()
        .filter_map(|(name, shot)| {
            let record = image_number_from_name(name).and_then(|id| records.get(&id));
            if record.is_none() {
                log::warn!("no detections for shot {name}");
            }
            record.map(|r| (r, shot))
        })
        .collect();
    if jobs.is_empty() {
        bail!("no shot has a detection record");
    }

    let wireframes = jobs
        .par_iter()
        .enumerate()
        .map(|(i, (record, shot))| -> anyhow::Result<ImageWireframe> {
            let mut rng = StdRng::seed_from_u64(args.seed + i as u64);
            let camera = reconstruction.camera_for(shot)?;
            let points = shot.points();
            Ok(ImageWireframe::build(record, camera, &shot.pose(), &points, &config, &mut rng)?)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    for wireframe in &wireframes {
        let dir = args.output.join("images").join(format!("image_{}", wireframe.image_id()));
        write_observations(&dir, wireframe)?;
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut views = wireframes.into_iter();
    let Some(mut combined) = views.next() else {
        bail!("no image was reconstructed");
    };
    for view in views {
        let passes = combined.combine(view, &mut rng);
        log::debug!("merge settled after {passes} passes");
    }

    write_observations(&args.output.join("merged"), &combined)?;
    let wireframe = combined.wireframe();
    let path = args.output.join("wireframe.ply");
    write_line_set(&path, &wireframe, &WriteOptions::default())?;

    println!(
        "{} lines from {} observations written to {}",
        wireframe.edge_count(),
        combined.observations().len(),
        path.display()
    );
    Ok(())
}
