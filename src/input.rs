// Text point files:
//
//   0.01            distance threshold
//   3               number of points
//   1.0<TAB>2.0<TAB>3.0
//   ...

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use super::error::{Error, Result};
use super::geometry::Point3D;

// Upper bound on the preallocation taken from the header's point count.
const CAPACITY_HINT: usize = 1 << 20;

#[derive(Clone,Debug,PartialEq)]
pub struct PointFile {
    pub threshold: f64,
    pub points: Vec<Point3D>,
}

pub fn read_point_file(path: &Path) -> Result<PointFile> {
    let file = File::open(path)?;
    parse_point_file(BufReader::new(file))
}

pub fn parse_point_file<R: BufRead>(reader: R) -> Result<PointFile> {
    let mut lines = reader.lines();

    let threshold: f64 = parse_header(lines.next(), 1, "distance threshold")?;
    let expected: usize = parse_header(lines.next(), 2, "point count")?;

    let mut points = Vec::with_capacity(expected.min(CAPACITY_HINT));
    for (i, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        points.push(parse_point(&line, i + 3)?);
    }

    if points.len() != expected {
        return Err(Error::PointCount { expected, found: points.len() });
    }

    Ok(PointFile { threshold, points })
}

fn parse_header<T: FromStr>(line: Option<std::io::Result<String>>, number: usize, what: &str) -> Result<T> {
    let line = match line {
        Some(l) => l?,
        None => return Err(Error::Parse { line: number, message: format!("missing {}", what) }),
    };
    line.trim().parse::<T>().map_err(|_| Error::Parse {
        line: number,
        message: format!("invalid {} {:?}", what, line.trim()),
    })
}

fn parse_point(line: &str, number: usize) -> Result<Point3D> {
    let values = line.split_whitespace()
        .map(|token| token.parse::<f64>())
        .collect::<std::result::Result<Vec<f64>, _>>()
        .map_err(|e| Error::Parse { line: number, message: format!("invalid coordinate: {}", e) })?;

    match values.as_slice() {
        [x, y, z] => Ok(Point3D { x: *x, y: *y, z: *z }),
        _ => Err(Error::Parse { line: number, message: format!("expected 3 coordinates, found {}", values.len()) }),
    }
}
