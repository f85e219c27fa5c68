//! # WireCrate Algorithms
//!
//! Robust fitting and aggregation of 3D line segments.
//!
//! This crate provides the RANSAC engine and its line and Manhattan-basis
//! estimators, association of 3D points with detected 2D lines, cross-view
//! merging, clustering with consensus fitting, and the 2D line graph.

pub mod config;
pub mod ransac;
pub mod line_fit;
pub mod manhattan;
pub mod association;
pub mod merge;
pub mod clustering;
pub mod graph;
pub mod wireframe;

// Re-export commonly used items
pub use config::*;
pub use ransac::*;
pub use line_fit::*;
pub use manhattan::*;
pub use association::*;
pub use merge::*;
pub use clustering::*;
pub use graph::*;
pub use wireframe::*;
