//! I/O operations for line sets
//!
//! This crate reads and writes the ASCII PLY line-set format, merges whole
//! directories of line-set files into one, and loads the JSON inputs of the
//! reconstruction: structure-from-motion shots and 2D line detections.

pub mod ply;
pub mod merge;
pub mod sfm;
pub mod detections;
pub mod error;

pub use error::*;
pub use ply::{
    read_line_set, read_line_set_from, write_line_set, write_line_set_to, write_observation, PlyHeader, PlyLines,
    WriteOptions,
};
pub use merge::{collect_ply_files, merge_directory, MergeSummary};
pub use sfm::{read_reconstructions, Reconstruction, Shot};
pub use detections::{read_detections, LineCoordinates, RawDetections};

#[cfg(test)]
mod tests;
