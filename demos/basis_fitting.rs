//! Recover a known Manhattan basis from noisy synthetic line directions.
//!
//! Writes the edges with the fitted axes appended to `<output>`, and only the
//! basis-aligned edges to `<output>_filtered.ply`.

use clap::Parser;
use nalgebra::Matrix3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use wirecrate_algorithms::{add_basis_directions, filter_basis_directions};
use wirecrate_core::{EdgeLabel, LineSet, Point3d, Segment, Vector3d};
use wirecrate_io::{write_line_set, WriteOptions};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fit a Manhattan basis to random noisy directions")]
struct Args {
    /// Output file
    output: PathBuf,

    /// Number of random lines
    #[arg(short, default_value_t = 20)]
    n: usize,

    #[arg(short, long, default_value_t = 20)]
    iterations: usize,

    /// Inlier threshold on the alignment error
    #[arg(short, long, default_value_t = 0.25)]
    threshold: f64,

    /// Largest magnitude of the noise added to each direction
    #[arg(long, default_value_t = 0.1)]
    noise: f64,

    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn random_basis<R: Rng>(rng: &mut R) -> Matrix3<f64> {
    let v1 = Vector3d::new(rng.gen(), rng.gen(), rng.gen());
    let v2 = Vector3d::new(rng.gen(), rng.gen(), rng.gen());
    let b2 = v1.cross(&v2);
    let b3 = v1.cross(&b2);
    Matrix3::from_rows(&[
        v1.normalize().transpose(),
        b2.normalize().transpose(),
        b3.normalize().transpose(),
    ])
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let rotation = random_basis(&mut rng);
    let scale = 2.0 * args.noise / 3.0_f64.sqrt();
    let set: LineSet = (0..args.n)
        .map(|_| {
            let axis = rotation.row(rng.gen_range(0..3)).transpose();
            let noise = Vector3d::new(rng.gen(), rng.gen(), rng.gen()).add_scalar(-0.5) * scale;
            let edge = Segment::new(Point3d::origin(), Point3d::from(axis + noise));
            (edge, EdgeLabel::SENTINEL)
        })
        .collect();

    let Some((with_axes, basis)) = add_basis_directions(set, args.iterations, args.threshold, &mut rng) else {
        anyhow::bail!("no basis could be fitted to {} directions", args.n);
    };
    write_line_set(&args.output, &with_axes, &WriteOptions::default())?;

    let filtered = filter_basis_directions(with_axes, &basis, args.threshold);
    let stem = args.output.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let filtered_path = args.output.with_file_name(format!("{stem}_filtered.ply"));
    write_line_set(&filtered_path, &filtered, &WriteOptions::default())?;

    println!("Actual rot: {rotation}");
    println!("Est rot: {}", basis.rows());
    println!("R * R': {}", rotation * basis.rows().transpose());
    Ok(())
}
