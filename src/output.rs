use std::fs::File;
use std::io::Write;
use std::path::Path;
use super::error::Result;
use super::geometry::Plane;

const DECIMALS: f64 = 1e6;

// Rounded to six decimals, with -0 written as 0 so that output is stable
// regardless of which side the normal ended up pointing.
pub fn round_coefficient(value: f64) -> f64 {
    let rounded = (value * DECIMALS).round() / DECIMALS;
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub fn format_plane(plane: &Plane) -> String {
    plane.coefficients().iter()
        .map(|v| format!("{:.6} ", round_coefficient(*v)))
        .collect()
}

pub fn write_plane(path: &Path, plane: &Plane) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(format_plane(plane).as_bytes())?;
    Ok(())
}
