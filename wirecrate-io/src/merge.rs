//! Merging every line-set file under a directory tree into one file
//!
//! Vertex lines are streamed to the output as they are read; edge lines are
//! re-indexed by the number of vertices written before their file and held
//! until all vertices are out. The totals are unknown until the scan ends, so
//! the header is written with blank placeholders that are overwritten in place.

use crate::error::{IoError, Result};
use crate::ply::{open, parse_edge_line, parse_vertex_line, read_header, write_atomically, DataLines, ELEMENT_EDGE, ELEMENT_VERTEX};
use std::fs;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Width of the blank field reserved for each count
const PLACEHOLDER_WIDTH: usize = 53;

/// Written over a placeholder; the rest of the blank field becomes a comment line
const PLACEHOLDER_FILL: &str = "\ncomment space";

/// Totals of a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub files: usize,
    pub vertices: usize,
    pub edges: usize,
}

/// Every `.ply` file below `dir`, recursively.
///
/// Directories are walked depth-first with an explicit stack; entries of each
/// directory are visited in name order.
pub fn collect_ply_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(IoError::FileNotFound {
            path: dir.display().to_string(),
        });
    }

    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let mut entries = fs::read_dir(&current)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        let mut subdirs = Vec::new();
        for path in entries {
            if path.is_dir() {
                subdirs.push(path);
            } else if path.extension().map_or(false, |ext| ext == "ply") {
                files.push(path);
            }
        }
        stack.extend(subdirs.into_iter().rev());
    }
    Ok(files)
}

fn merged_header() -> Vec<String> {
    let placeholder = " ".repeat(PLACEHOLDER_WIDTH);
    let mut header = crate::ply::header_lines(0, 0, true);
    for line in header.iter_mut() {
        if line.starts_with(ELEMENT_VERTEX) {
            *line = format!("{ELEMENT_VERTEX}{placeholder}");
        } else if line.starts_with(ELEMENT_EDGE) {
            *line = format!("{ELEMENT_EDGE}{placeholder}");
        }
    }
    header
}

/// Byte offset of the placeholder following `prefix`
fn placeholder_offset(header: &[String], prefix: &str) -> Option<u64> {
    let mut offset = 0;
    for line in header {
        if line.starts_with(prefix) {
            return Some((offset + prefix.len()) as u64);
        }
        offset += line.len() + 1;
    }
    None
}

fn patch_count<F: Write + Seek>(file: &mut F, offset: Option<u64>, count: usize) -> Result<()> {
    let text = format!("{count}{PLACEHOLDER_FILL}");
    let offset = offset.ok_or_else(|| IoError::InvalidFormat {
        format: "merged header has no count field".to_string(),
    })?;
    if text.len() > PLACEHOLDER_WIDTH {
        return Err(IoError::CountOverflow(count));
    }
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Stream the vertices of one file to `out` and buffer its re-indexed edges
fn merge_file<W: Write>(path: &Path, offset: usize, out: &mut W, edges: &mut Vec<String>) -> Result<(usize, usize)> {
    let mut reader = BufReader::new(open(path)?);
    let header = read_header(&mut reader)?;
    let mut data = DataLines::new(reader, &header);

    for found in 0..header.vertex_count {
        let (line_no, line) = data.expect_line("vertex", header.vertex_count, found)?;
        parse_vertex_line(&line, line_no)?;
        writeln!(out, "{}", line.trim())?;
    }
    for found in 0..header.edge_count {
        let (line_no, line) = data.expect_line("edge", header.edge_count, found)?;
        let record = parse_edge_line(&line, line_no)?;
        if record.vertex1 >= header.vertex_count || record.vertex2 >= header.vertex_count {
            return Err(IoError::ParseError {
                line: line_no,
                message: format!("edge references a vertex beyond the {} declared", header.vertex_count),
            });
        }
        edges.push(record.to_line(offset, true));
    }
    data.expect_end()?;
    Ok((header.vertex_count, header.edge_count))
}

/// Merge every `.ply` file under `dir` into `output`.
///
/// Edges without a label are written with the sentinel label. An existing
/// `output` inside `dir` is not merged into itself. Any malformed input fails
/// the whole merge and leaves `output` untouched.
pub fn merge_directory<P: AsRef<Path>, Q: AsRef<Path>>(dir: P, output: Q) -> Result<MergeSummary> {
    let output = output.as_ref();
    let own = output.canonicalize().ok();
    let files: Vec<PathBuf> = collect_ply_files(dir)?
        .into_iter()
        .filter(|f| own.is_none() || f.canonicalize().ok() != own)
        .collect();

    let header = merged_header();
    let mut summary = MergeSummary::default();

    write_atomically(output, |file| {
        let mut edges = Vec::new();
        {
            let mut writer = BufWriter::new(&mut *file);
            for line in &header {
                writeln!(writer, "{line}")?;
            }
            for path in &files {
                let (vertices, edge_count) = merge_file(path, summary.vertices, &mut writer, &mut edges)?;
                log::debug!("{}: {} vertices, {} edges", path.display(), vertices, edge_count);
                summary.files += 1;
                summary.vertices += vertices;
                summary.edges += edge_count;
            }
            for line in &edges {
                writeln!(writer, "{line}")?;
            }
            writer.flush()?;
        }

        patch_count(file, placeholder_offset(&header, ELEMENT_VERTEX), summary.vertices)?;
        patch_count(file, placeholder_offset(&header, ELEMENT_EDGE), summary.edges)?;
        file.flush()?;
        Ok(())
    })?;

    log::info!(
        "merged {} files into {}: {} vertices, {} edges",
        summary.files,
        output.display(),
        summary.vertices,
        summary.edges
    );
    Ok(summary)
}
