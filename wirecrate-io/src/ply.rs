//! ASCII PLY files holding line sets
//!
//! A file lists the free vertices, then the two endpoints of every edge, then
//! one line per edge referencing its endpoints by index. Edge lines may carry
//! the `(image, line)` label of the detection the edge came from.

use crate::error::{IoError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use wirecrate_core::{Color, EdgeLabel, LineObservation, LineSet, Point3d, Segment, WHITE};

pub(crate) const ELEMENT_VERTEX: &str = "element vertex ";
pub(crate) const ELEMENT_EDGE: &str = "element edge ";

const VERTEX_PROPERTIES: [&str; 6] = [
    "property float x",
    "property float y",
    "property float z",
    "property uchar red",
    "property uchar green",
    "property uchar blue",
];

const EDGE_PROPERTIES: [&str; 5] = [
    "property int vertex1",
    "property int vertex2",
    "property uchar red",
    "property uchar green",
    "property uchar blue",
];

const LABEL_PROPERTIES: [&str; 2] = ["property int image", "property int line"];

/// Options for writing a line set
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    /// Color of every element without an explicit color
    pub color: Color,
    /// Colors of the free vertices, in order; missing entries use `color`
    pub vertex_colors: Option<Vec<Color>>,
    /// Declare and write the label pair of every edge
    pub labels: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            color: WHITE,
            vertex_colors: None,
            labels: true,
        }
    }
}

impl WriteOptions {
    pub fn with_vertex_colors(mut self, colors: Vec<Color>) -> Self {
        self.vertex_colors = Some(colors);
        self
    }

    pub fn without_labels(mut self) -> Self {
        self.labels = false;
        self
    }
}

/// Header lines, without line terminators
pub fn header_lines(vertex_count: usize, edge_count: usize, labels: bool) -> Vec<String> {
    let mut lines = vec![
        "ply".to_string(),
        "format ascii 1.0".to_string(),
        format!("{ELEMENT_VERTEX}{vertex_count}"),
    ];
    lines.extend(VERTEX_PROPERTIES.iter().map(|p| p.to_string()));
    lines.push(format!("{ELEMENT_EDGE}{edge_count}"));
    lines.extend(EDGE_PROPERTIES.iter().map(|p| p.to_string()));
    if labels {
        lines.extend(LABEL_PROPERTIES.iter().map(|p| p.to_string()));
    }
    lines.push("end_header".to_string());
    lines
}

fn vertex_line(p: &Point3d, c: &Color) -> String {
    format!("{} {} {} {} {} {}", p.x, p.y, p.z, c[0], c[1], c[2])
}

/// One parsed edge line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRecord {
    pub vertex1: usize,
    pub vertex2: usize,
    pub color: Color,
    pub label: EdgeLabel,
}

impl EdgeRecord {
    /// Format with both indices shifted by `offset`, with or without the label pair
    pub fn to_line(&self, offset: usize, labels: bool) -> String {
        let c = self.color;
        let mut line = format!(
            "{} {} {} {} {}",
            self.vertex1 + offset,
            self.vertex2 + offset,
            c[0],
            c[1],
            c[2]
        );
        if labels {
            line.push(' ');
            line.push_str(&self.label.to_string());
        }
        line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Header,
    Vertices,
    Endpoints,
    Edges,
    Done,
}

/// Lazily produced lines of a line-set file, without line terminators.
///
/// The sequence is finite; build a new one with [`PlyLines::new`] to start over.
#[derive(Debug, Clone)]
pub struct PlyLines<'a> {
    set: &'a LineSet,
    options: &'a WriteOptions,
    header: std::vec::IntoIter<String>,
    stage: Stage,
    index: usize,
}

impl<'a> PlyLines<'a> {
    pub fn new(set: &'a LineSet, options: &'a WriteOptions) -> Self {
        let header = header_lines(set.serialized_vertex_count(), set.edge_count(), options.labels);
        Self {
            set,
            options,
            header: header.into_iter(),
            stage: Stage::Header,
            index: 0,
        }
    }

    fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        self.index = 0;
    }
}

impl Iterator for PlyLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.stage {
                Stage::Header => match self.header.next() {
                    Some(line) => return Some(line),
                    None => self.advance(Stage::Vertices),
                },
                Stage::Vertices => {
                    if let Some(p) = self.set.vertices().get(self.index) {
                        let color = self
                            .options
                            .vertex_colors
                            .as_ref()
                            .and_then(|colors| colors.get(self.index))
                            .unwrap_or(&self.options.color);
                        self.index += 1;
                        return Some(vertex_line(p, color));
                    }
                    self.advance(Stage::Endpoints);
                }
                Stage::Endpoints => {
                    if let Some(edge) = self.set.edges().get(self.index / 2) {
                        let p = if self.index % 2 == 0 { &edge.start } else { &edge.end };
                        self.index += 1;
                        return Some(vertex_line(p, &self.options.color));
                    }
                    self.advance(Stage::Edges);
                }
                Stage::Edges => {
                    if let Some(label) = self.set.labels().get(self.index) {
                        let first = self.set.vertices().len() + 2 * self.index;
                        let record = EdgeRecord {
                            vertex1: first,
                            vertex2: first + 1,
                            color: self.options.color,
                            label: *label,
                        };
                        self.index += 1;
                        return Some(record.to_line(0, self.options.labels));
                    }
                    self.advance(Stage::Done);
                }
                Stage::Done => return None,
            }
        }
    }
}

/// Stream a line set to `writer`
pub fn write_line_set_to<W: Write>(writer: &mut W, set: &LineSet, options: &WriteOptions) -> Result<()> {
    for line in PlyLines::new(set, options) {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Create `path` by writing a temporary file beside it and renaming it into
/// place; on failure no file is left at `path`.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.persist(path)?;
    Ok(())
}

/// Write a line set to `path`
pub fn write_line_set<P: AsRef<Path>>(path: P, set: &LineSet, options: &WriteOptions) -> Result<()> {
    write_atomically(path.as_ref(), |file| {
        let mut writer = BufWriter::new(file);
        write_line_set_to(&mut writer, set, options)?;
        writer.flush()?;
        Ok(())
    })
}

/// Write one observation: its cloud as vertices and its fitted segment as the edge
pub fn write_observation<P: AsRef<Path>>(
    path: P,
    observation: &LineObservation,
    vertex_colors: Option<Vec<Color>>,
) -> Result<()> {
    let options = WriteOptions {
        vertex_colors,
        ..Default::default()
    };
    write_line_set(path, &observation.to_line_set(), &options)
}

/// Element counts declared by a header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlyHeader {
    pub vertex_count: usize,
    pub edge_count: usize,
    /// Edges declare the two label properties
    pub edge_labels: bool,
    /// Number of header lines, `end_header` included
    pub line_count: usize,
}

fn field<T: FromStr>(token: &str, line: usize, what: &str) -> Result<T> {
    token.parse().map_err(|_| IoError::ParseError {
        line,
        message: format!("invalid {what} `{token}`"),
    })
}

#[derive(PartialEq)]
enum Element {
    None,
    Vertex,
    Edge,
    Other,
}

/// Parse a header, leaving `reader` at the first data line
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader> {
    let mut header = PlyHeader::default();
    let mut current = Element::None;
    let mut edge_properties = 0;
    let mut buf = String::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            return Err(IoError::InvalidFormat {
                format: "header ends before end_header".to_string(),
            });
        }
        line_no += 1;
        let line = buf.trim();

        if line_no == 1 {
            if line != "ply" {
                return Err(IoError::InvalidFormat {
                    format: format!("expected `ply` magic, found `{line}`"),
                });
            }
            continue;
        }
        if line_no == 2 {
            if !line.starts_with("format ascii") {
                return Err(IoError::InvalidFormat {
                    format: format!("only ASCII files are supported, found `{line}`"),
                });
            }
            continue;
        }

        let mut words = line.split_whitespace();
        match words.next() {
            None | Some("comment") | Some("obj_info") => {}
            Some("end_header") => {
                header.edge_labels = edge_properties >= EDGE_PROPERTIES.len() + LABEL_PROPERTIES.len();
                header.line_count = line_no;
                return Ok(header);
            }
            Some("element") => {
                let name = words.next().unwrap_or_default();
                let count: usize = field(words.next().unwrap_or_default(), line_no, "element count")?;
                current = match name {
                    "vertex" => {
                        header.vertex_count = count;
                        Element::Vertex
                    }
                    "edge" => {
                        header.edge_count = count;
                        Element::Edge
                    }
                    other if count > 0 => {
                        return Err(IoError::UnsupportedElement(format!("{other} ({count} entries)")));
                    }
                    _ => Element::Other,
                };
            }
            Some("property") => {
                if current == Element::Edge {
                    edge_properties += 1;
                }
            }
            Some(other) => {
                return Err(IoError::ParseError {
                    line: line_no,
                    message: format!("unexpected header keyword `{other}`"),
                });
            }
        }
    }
}

/// Non-blank data lines with their 1-based file line numbers
pub(crate) struct DataLines<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> DataLines<R> {
    pub(crate) fn new(reader: R, header: &PlyHeader) -> Self {
        Self {
            lines: reader.lines(),
            line_no: header.line_count,
        }
    }

    pub(crate) fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            if !line.trim().is_empty() {
                return Ok(Some((self.line_no, line)));
            }
        }
        Ok(None)
    }

    /// The next line of an element that still has `expected - found` lines to come
    pub(crate) fn expect_line(&mut self, element: &'static str, expected: usize, found: usize) -> Result<(usize, String)> {
        self.next_line()?.ok_or(IoError::Truncated {
            element,
            expected,
            found,
        })
    }

    /// Fail if anything but blank lines remains
    pub(crate) fn expect_end(&mut self) -> Result<()> {
        match self.next_line()? {
            Some((line, _)) => Err(IoError::TrailingData { line }),
            None => Ok(()),
        }
    }
}

/// Parse `x y z [r g b]`
pub fn parse_vertex_line(line: &str, line_no: usize) -> Result<Point3d> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(IoError::ParseError {
            line: line_no,
            message: format!("vertex line has {} fields, expected at least 3", tokens.len()),
        });
    }
    Ok(Point3d::new(
        field(tokens[0], line_no, "coordinate")?,
        field(tokens[1], line_no, "coordinate")?,
        field(tokens[2], line_no, "coordinate")?,
    ))
}

/// Parse `v1 v2 r g b [image line]`; an edge without a label gets the sentinel
pub fn parse_edge_line(line: &str, line_no: usize) -> Result<EdgeRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let label = match tokens.len() {
        5 => EdgeLabel::SENTINEL,
        7 => EdgeLabel::new(
            field(tokens[5], line_no, "label")?,
            field(tokens[6], line_no, "label")?,
        ),
        n => {
            return Err(IoError::ParseError {
                line: line_no,
                message: format!("edge line has {n} fields, expected 5 or 7"),
            })
        }
    };
    Ok(EdgeRecord {
        vertex1: field(tokens[0], line_no, "vertex index")?,
        vertex2: field(tokens[1], line_no, "vertex index")?,
        color: [
            field(tokens[2], line_no, "color")?,
            field(tokens[3], line_no, "color")?,
            field(tokens[4], line_no, "color")?,
        ],
        label,
    })
}

/// Read a line set.
///
/// Exactly the declared vertex and edge lines must follow the header. Vertices
/// referenced by an edge become that edge's endpoints; the rest are free vertices.
pub fn read_line_set_from<R: BufRead>(mut reader: R) -> Result<LineSet> {
    let header = read_header(&mut reader)?;
    let mut data = DataLines::new(reader, &header);

    let mut vertices = Vec::with_capacity(header.vertex_count);
    for found in 0..header.vertex_count {
        let (line_no, line) = data.expect_line("vertex", header.vertex_count, found)?;
        vertices.push(parse_vertex_line(&line, line_no)?);
    }

    let mut records = Vec::with_capacity(header.edge_count);
    for found in 0..header.edge_count {
        let (line_no, line) = data.expect_line("edge", header.edge_count, found)?;
        let record = parse_edge_line(&line, line_no)?;
        if record.vertex1 >= vertices.len() || record.vertex2 >= vertices.len() {
            return Err(IoError::ParseError {
                line: line_no,
                message: format!("edge references a vertex beyond the {} declared", vertices.len()),
            });
        }
        records.push(record);
    }
    data.expect_end()?;

    let mut referenced = vec![false; vertices.len()];
    for r in &records {
        referenced[r.vertex1] = true;
        referenced[r.vertex2] = true;
    }
    let free: Vec<Point3d> = vertices
        .iter()
        .zip(&referenced)
        .filter(|(_, used)| !**used)
        .map(|(v, _)| *v)
        .collect();
    let edges = records
        .iter()
        .map(|r| Segment::new(vertices[r.vertex1], vertices[r.vertex2]))
        .collect();
    let labels = records.iter().map(|r| r.label).collect();

    Ok(LineSet::from_parts(free, edges, labels)?)
}

pub(crate) fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IoError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => IoError::Io(e),
    })
}

/// Read a line set from `path`
pub fn read_line_set<P: AsRef<Path>>(path: P) -> Result<LineSet> {
    let path = path.as_ref();
    read_line_set_from(BufReader::new(open(path)?))
}
