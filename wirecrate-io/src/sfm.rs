//! Structure-from-motion reconstructions in the OpenSfM JSON layout
//!
//! A reconstruction file holds a list of reconstructions, each mapping camera
//! ids to intrinsics and image names to shots. Meshed reconstructions carry
//! the 3D points visible in each shot as the shot's `vertices`.

use crate::error::{IoError, Result};
use crate::ply::open;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::BufReader;
use std::path::Path;
use wirecrate_core::{Camera, CameraPose, Point3d, Vector3d};

/// One registered image
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Shot {
    /// World-to-camera rotation as an axis-angle vector
    pub rotation: [f64; 3],
    pub translation: [f64; 3],
    /// Id of the camera in [`Reconstruction::cameras`]
    pub camera: String,
    #[serde(default)]
    pub vertices: Vec<[f64; 3]>,
}

impl Shot {
    pub fn pose(&self) -> CameraPose {
        CameraPose::new(Vector3d::from(self.rotation), Vector3d::from(self.translation))
    }

    pub fn points(&self) -> Vec<Point3d> {
        self.vertices.iter().map(|&v| Point3d::from(v)).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Reconstruction {
    #[serde(default)]
    pub cameras: HashMap<String, Camera>,
    #[serde(default)]
    pub shots: HashMap<String, Shot>,
}

impl Reconstruction {
    /// Intrinsics of the camera that took `shot`
    pub fn camera_for(&self, shot: &Shot) -> Result<&Camera> {
        self.cameras.get(&shot.camera).ok_or_else(|| IoError::InvalidFormat {
            format: format!("shot refers to unknown camera `{}`", shot.camera),
        })
    }

    /// Shots sorted by image name
    pub fn sorted_shots(&self) -> Vec<(&str, &Shot)> {
        let mut shots: Vec<(&str, &Shot)> = self.shots.iter().map(|(name, shot)| (name.as_str(), shot)).collect();
        shots.sort_by(|a, b| a.0.cmp(b.0));
        shots
    }
}

pub fn parse_reconstructions(json: &str) -> Result<Vec<Reconstruction>> {
    Ok(serde_json::from_str(json)?)
}

/// Read every reconstruction of a `reconstruction.json`-style file
pub fn read_reconstructions<P: AsRef<Path>>(path: P) -> Result<Vec<Reconstruction>> {
    let reader = BufReader::new(open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"[{
        "cameras": {
            "v2 unknown 640 480 perspective 0.9": {
                "projection_type": "perspective",
                "width": 640, "height": 480,
                "focal": 0.9, "k1": -0.01, "k2": 0.002
            }
        },
        "shots": {
            "img_2.png": {
                "rotation": [0.0, 0.1, 0.0],
                "translation": [1.0, 2.0, 3.0],
                "camera": "v2 unknown 640 480 perspective 0.9",
                "vertices": [[0.0, 0.0, 1.0], [1.0, 1.0, 1.0]],
                "faces": [[0, 1, 0]]
            },
            "img_1.png": {
                "rotation": [0.0, 0.0, 0.0],
                "translation": [0.0, 0.0, 0.0],
                "camera": "missing"
            }
        }
    }]"#;

    #[test]
    fn test_parse_reconstruction() {
        let recs = parse_reconstructions(JSON).unwrap();
        assert_eq!(recs.len(), 1);
        let rec = &recs[0];

        let shots = rec.sorted_shots();
        assert_eq!(shots[0].0, "img_1.png");
        assert_eq!(shots[1].0, "img_2.png");

        let shot = shots[1].1;
        assert_eq!(shot.points().len(), 2);
        assert_eq!(shot.pose().translation, Vector3d::new(1.0, 2.0, 3.0));
        let camera = rec.camera_for(shot).unwrap();
        assert_eq!(camera.width, 640);
        assert_eq!(camera.k2, 0.002);

        assert!(shots[0].1.vertices.is_empty());
        assert!(rec.camera_for(shots[0].1).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_reconstructions("{"), Err(IoError::Json(_))));
    }
}
