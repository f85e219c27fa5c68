//! Recursively merge every line-set file in a directory into one file.
//!
//! Usage:
//!   cargo run --bin merge_ply -- out/images -o out/all_lines.ply

use clap::Parser;
use std::path::PathBuf;
use wirecrate_io::merge_directory;

#[derive(Parser, Debug)]
#[command(author, version, about = "Merge every .ply file below a directory")]
struct Args {
    /// Directory to scan recursively
    directory: PathBuf,

    /// Merged output file
    #[arg(short, long, default_value = "merged.ply")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let summary = merge_directory(&args.directory, &args.output)?;
    println!(
        "Merged {} files: {} vertices, {} edges",
        summary.files, summary.vertices, summary.edges
    );
    Ok(())
}
