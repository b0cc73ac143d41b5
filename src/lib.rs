//! Robust estimation of the dominant plane (typically the road or ground
//! surface) in a 3D point cloud using random sample consensus.

pub mod distance;
pub mod error;
pub mod geometry;
pub mod input;
pub mod las;
pub mod linear_regression;
pub mod output;
pub mod ransac;

pub use error::{Error, Result};
pub use geometry::{Bounds, Plane, Point3D};
pub use ransac::{search, Consensus, RansacParameters, RansacSearch, SearchState};
