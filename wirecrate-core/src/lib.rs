//! Core data structures for wirecrate
//!
//! This crate provides the geometric value types shared by the fitting and
//! I/O crates: points, 3D and image-plane segments, labelled line sets,
//! camera projection, 2D detection records and line observations.

pub mod point;
pub mod segment;
pub mod point_cloud;
pub mod line_set;
pub mod traits;
pub mod camera;
pub mod detection;
pub mod observation;
pub mod error;

pub use point::*;
pub use segment::*;
pub use point_cloud::*;
pub use line_set::*;
pub use traits::*;
pub use camera::*;
pub use detection::*;
pub use observation::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Isometry3, Matrix3, Point2, Point3, Vector2, Vector3};
