//! Group the edges of a line-set file and replace each group by one edge.
//!
//! With `--filter close` every group of nearby edges is written as
//! `complex_<i>.ply` and its consensus edge as `simplified_<i>.ply`; all
//! consensus edges together go to `wireframe_simplified.ply`. With
//! `--filter parallel` the groups of parallel edges are written as
//! `parallel_<i>.ply`.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};
use wirecrate_algorithms::{cluster_line_set, fit_basis, manhattan_line_set, parallel_groups, ClusterConfig};
use wirecrate_core::LineSet;
use wirecrate_io::{read_line_set, write_line_set, WriteOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Filter {
    Close,
    Parallel,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Simplify a line-set file")]
struct Args {
    /// Line-set file to load
    filename: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = Filter::Close)]
    filter: Filter,

    /// Optional JSON ClusterConfig; defaults are used if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the grouping tolerance
    #[arg(long)]
    tol: Option<f64>,

    /// Overrides the minimum group size
    #[arg(long)]
    min_group: Option<usize>,

    /// Also write the simplified edges snapped to a fitted Manhattan basis
    #[arg(long)]
    manhattan: bool,

    #[arg(long, default_value_t = 100)]
    basis_iterations: usize,

    #[arg(long, default_value_t = 0.1)]
    basis_threshold: f64,

    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn load_config(args: &Args) -> anyhow::Result<ClusterConfig> {
    let mut config: ClusterConfig = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text)?
        }
        None => ClusterConfig::default(),
    };
    if let Some(tol) = args.tol {
        config.tolerance = tol;
    }
    if let Some(min_group) = args.min_group {
        config.min_group = min_group;
    }
    config.validate()?;
    Ok(config)
}

fn write(dir: &Path, name: &str, set: &LineSet) -> anyhow::Result<()> {
    write_line_set(dir.join(name), set, &WriteOptions::default())?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = load_config(&args)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    let set = read_line_set(&args.filename)?;
    println!("Loaded {} total edges", set.edge_count());
    fs::create_dir_all(&args.output)?;

    if args.filter == Filter::Parallel {
        let groups = parallel_groups(&set, config.tolerance, config.min_group);
        for (i, group) in groups.iter().enumerate() {
            write(&args.output, &format!("parallel_{i}.ply"), group)?;
        }
        println!("Found {} groups of parallel edges", groups.len());
        return Ok(());
    }

    let clusters = cluster_line_set(&set, &config, &mut rng);
    let mut simplified = LineSet::new();
    for (i, cluster) in clusters.iter().enumerate() {
        write(&args.output, &format!("complex_{i}.ply"), &cluster.members)?;
        write(&args.output, &format!("simplified_{i}.ply"), &cluster.combined)?;
        simplified = simplified.combine(cluster.combined.clone());
    }
    write(&args.output, "wireframe_simplified.ply", &simplified)?;
    println!("Simplified {} edges into {}", set.edge_count(), simplified.edge_count());

    if args.manhattan {
        match fit_basis(&simplified, args.basis_iterations, args.basis_threshold, &mut rng) {
            Some((basis, inliers)) => {
                log::info!("basis supported by {inliers} edges: {:?}", basis.rows());
                let snapped = manhattan_line_set(simplified, &basis, args.basis_threshold);
                write(&args.output, "manhattan.ply", &snapped)?;
            }
            None => log::warn!("too few edges to fit a Manhattan basis"),
        }
    }
    Ok(())
}
