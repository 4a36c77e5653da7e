//! Parser for the `NODE_COORD_SECTION` subset of the TSPLIB format, plus
//! the coordinate normalization used to place a TSPLIB instance onto a
//! geographic (lat, lon) window.

use crate::error::{Result, SimError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A single `(id, x, y)` triple as it appears in `NODE_COORD_SECTION`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TspNode {
    pub id: i64,
    pub x: f64,
    pub y: f64,
}

/// The parsed contents of a TSPLIB file: its declared name and ordered nodes.
#[derive(Debug, Clone, Default)]
pub struct TspInstance {
    pub name: String,
    pub nodes: Vec<TspNode>,
}

/// Parse a TSPLIB file, recognizing `NAME` headers and the
/// `NODE_COORD_SECTION` block. Other headers are ignored. Malformed
/// coordinate lines are skipped silently. Fails with
/// [`SimError::InvalidFormat`] if no coordinates were parsed.
pub fn parse_tsplib<P: AsRef<Path>>(path: P) -> Result<TspInstance> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)?;
    let reader = BufReader::new(file);

    let mut name = String::new();
    let mut in_coord_section = false;
    let mut nodes = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line == "EOF" {
            continue;
        }

        if let Some(rest) = line.strip_prefix("NAME") {
            name = rest.trim_start_matches(':').trim().to_string();
            continue;
        }

        if line == "NODE_COORD_SECTION" {
            in_coord_section = true;
            continue;
        }

        if !in_coord_section {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }
        let (id, x, y) = match (parts[0].parse(), parts[1].parse(), parts[2].parse()) {
            (Ok(id), Ok(x), Ok(y)) => (id, x, y),
            _ => continue,
        };
        nodes.push(TspNode { id, x, y });
    }

    if nodes.is_empty() {
        return Err(SimError::InvalidFormat {
            path: path_ref.display().to_string(),
            reason: "no coordinates parsed from NODE_COORD_SECTION".to_string(),
        });
    }

    Ok(TspInstance { name, nodes })
}

/// Euclidean distance between two TSPLIB nodes in their native coordinate
/// system (used for k-NN neighbour selection, before normalization).
pub fn tsp_euclidean(a: &TspNode, b: &TspNode) -> f64 {
    crate::geometry::euclidean((a.x, a.y), (b.x, b.y))
}

/// Normalize a set of TSPLIB coordinates into a geographic (lat, lon)
/// window, preserving aspect ratio with a `cos(mean_latitude)` correction
/// so that the original shape is not distorted.
///
/// Returns `(lat, lon)` pairs in the same order as `nodes`.
pub fn normalize_coordinates(
    nodes: &[TspNode],
    lat_range: (f64, f64),
    lon_range: (f64, f64),
) -> Vec<(f64, f64)> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let xs: Vec<f64> = nodes.iter().map(|n| n.x).collect();
    let ys: Vec<f64> = nodes.iter().map(|n| n.y).collect();

    let x_min = xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let y_min = ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let y_max = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let x_span = if x_max != x_min { x_max - x_min } else { 1.0 };
    let y_span = if y_max != y_min { y_max - y_min } else { 1.0 };

    let (lat_min, lat_max) = lat_range;
    let (lon_min, lon_max) = lon_range;

    let lat_span_target = lat_max - lat_min;
    let lon_span_target = lon_max - lon_min;

    let avg_lat_rad = ((lat_min + lat_max) / 2.0).to_radians();
    let lon_correction = avg_lat_rad.cos();

    let target_height = lat_span_target;
    let target_width = lon_span_target * lon_correction;

    let scale_y = target_height / y_span;
    let scale_x = target_width / x_span;
    let scale = scale_x.min(scale_y);

    let lat_center = (lat_min + lat_max) / 2.0;
    let lon_center = (lon_min + lon_max) / 2.0;

    nodes
        .iter()
        .map(|node| {
            let rel_x = node.x - (x_min + x_max) / 2.0;
            let rel_y = node.y - (y_min + y_max) / 2.0;

            let scaled_y = rel_y * scale;
            let scaled_x = rel_x * scale;

            let d_lat = scaled_y;
            let d_lon = scaled_x / lon_correction;

            (lat_center + d_lat, lon_center + d_lon)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{contents}").unwrap();
        f
    }

    #[test]
    fn parses_name_and_coords() {
        let f = write_fixture(
            "NAME: toy\nCOMMENT: a toy instance\nNODE_COORD_SECTION\n1 0.0 0.0\n2 3.0 4.0\nEOF\n",
        );
        let parsed = parse_tsplib(f.path()).unwrap();
        assert_eq!(parsed.name, "toy");
        assert_eq!(parsed.nodes.len(), 2);
        assert_eq!(parsed.nodes[1], TspNode { id: 2, x: 3.0, y: 4.0 });
    }

    #[test]
    fn skips_malformed_lines() {
        let f = write_fixture("NODE_COORD_SECTION\n1 0.0 0.0\nnotanumber x y\n2 1.0 1.0\nEOF\n");
        let parsed = parse_tsplib(f.path()).unwrap();
        assert_eq!(parsed.nodes.len(), 2);
    }

    #[test]
    fn empty_coord_section_is_invalid_format() {
        let f = write_fixture("NAME: empty\nEOF\n");
        let err = parse_tsplib(f.path()).unwrap_err();
        assert!(matches!(err, SimError::InvalidFormat { .. }));
    }

    #[test]
    fn normalization_stays_within_window() {
        let nodes = vec![
            TspNode { id: 1, x: 0.0, y: 0.0 },
            TspNode { id: 2, x: 100.0, y: 0.0 },
            TspNode { id: 3, x: 0.0, y: 50.0 },
            TspNode { id: 4, x: 100.0, y: 50.0 },
        ];
        let coords = normalize_coordinates(&nodes, (45.0, 55.0), (14.0, 24.0));
        assert_eq!(coords.len(), 4);
        for (lat, lon) in coords {
            assert!((45.0..=55.0).contains(&lat), "lat {lat} out of range");
            assert!((14.0..=24.0).contains(&lon), "lon {lon} out of range");
        }
    }
}
