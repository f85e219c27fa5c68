//! Tests for directory merging

use crate::error::IoError;
use crate::merge::*;
use crate::ply::{read_line_set, write_line_set, WriteOptions};
use std::fs;
use std::path::Path;
use wirecrate_core::{EdgeLabel, LineSet, Point3d, Segment};

fn edge_set(x: f64, label: EdgeLabel) -> LineSet {
    let mut set = LineSet::new();
    set.push_edge(
        Segment::new(Point3d::new(x, 0.0, 0.0), Point3d::new(x, 1.0, 0.0)),
        label,
    );
    set
}

fn write(path: &Path, set: &LineSet, options: &WriteOptions) {
    write_line_set(path, set, options).unwrap();
}

#[test]
fn test_collect_nested_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("b/inner")).unwrap();
    fs::write(dir.path().join("a.ply"), "").unwrap();
    fs::write(dir.path().join("notes.txt"), "").unwrap();
    fs::write(dir.path().join("b/inner/c.ply"), "").unwrap();
    fs::write(dir.path().join("c.ply"), "").unwrap();

    let files = collect_ply_files(dir.path()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|f| f.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.ply", "c.ply", "b/inner/c.ply"]);
}

#[test]
fn test_merge_reindexes_edges() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lines");
    fs::create_dir_all(input.join("sub")).unwrap();

    let mut first = edge_set(0.0, EdgeLabel::new(1, 0));
    first.push_vertex(Point3d::new(5.0, 5.0, 5.0));
    write(&input.join("a.ply"), &first, &WriteOptions::default());
    write(
        &input.join("sub/b.ply"),
        &edge_set(2.0, EdgeLabel::new(2, 4)),
        &WriteOptions::default().without_labels(),
    );

    let output = dir.path().join("merged.ply");
    let summary = merge_directory(&input, &output).unwrap();
    assert_eq!(
        summary,
        MergeSummary {
            files: 2,
            vertices: 5,
            edges: 2
        }
    );

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("element vertex 5\ncomment space"));
    assert!(text.contains("element edge 2\ncomment space"));
    assert!(text.ends_with("1 2 255 255 255 1 0\n3 4 255 255 255 -1 -1\n"));

    let merged = read_line_set(&output).unwrap();
    assert_eq!(merged.vertices(), &[Point3d::new(5.0, 5.0, 5.0)]);
    assert_eq!(merged.edge_count(), 2);
    assert_eq!(merged.edges()[1].start, Point3d::new(2.0, 0.0, 0.0));
    assert_eq!(merged.labels(), &[EdgeLabel::new(1, 0), EdgeLabel::SENTINEL]);
}

#[test]
fn test_merge_skips_its_own_output() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a.ply"), &edge_set(0.0, EdgeLabel::new(0, 0)), &WriteOptions::default());

    let output = dir.path().join("wireframe.ply");
    merge_directory(dir.path(), &output).unwrap();
    let again = merge_directory(dir.path(), &output).unwrap();
    assert_eq!(again.files, 1);
    assert_eq!(read_line_set(&output).unwrap().edge_count(), 1);
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out").with_extension("ply");
    let summary = merge_directory(dir.path(), &output).unwrap();
    assert_eq!(summary, MergeSummary::default());
    assert!(read_line_set(&output).unwrap().is_empty());
}

#[test]
fn test_malformed_input_fails_the_merge() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lines");
    fs::create_dir(&input).unwrap();
    write(&input.join("a.ply"), &edge_set(0.0, EdgeLabel::new(0, 0)), &WriteOptions::default());
    fs::write(input.join("b.ply"), "ply\nformat ascii 1.0\nelement vertex 3\nend_header\n0 0 0\n").unwrap();

    let output = dir.path().join("merged.ply");
    let err = merge_directory(&input, &output).unwrap_err();
    assert!(matches!(err, IoError::Truncated { element: "vertex", expected: 3, found: 1 }));
    assert!(!output.exists());
}

#[test]
fn test_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let err = merge_directory(dir.path().join("absent"), dir.path().join("out.ply")).unwrap_err();
    assert!(matches!(err, IoError::FileNotFound { .. }));
}
