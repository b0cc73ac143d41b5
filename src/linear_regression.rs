use nalgebra::{Matrix3, Vector3};
use super::geometry::{Plane, Point3D};

/*  Plane normal from the adjugate of the covariance matrix.

        | xx xy xz |
    C = | xy yy yz |   (sums over centred points)
        | xz yz zz |

    For points on a plane, C has rank 2 and every non-zero row of adj(C) is
    parallel to the normal. The row whose diagonal cofactor is largest is the
    best conditioned one, so that is the one we use:

    det_x = yy*zz - yz*yz   ->  (det_x, xz*yz - xy*zz, xy*yz - xz*yy)
    det_y = xx*zz - xz*xz   ->  (xz*yz - xy*zz, det_y, xy*xz - yz*xx)
    det_z = xx*yy - xy*xy   ->  (xy*yz - xz*yy, xy*xz - yz*xx, det_z)
*/

// Adapted from: https://www.ilikebigbits.com/2017_09_25_plane_from_points_2.html

// The largest cofactor must exceed this fraction of trace(C)². Collinear or
// coincident points end up (numerically) at zero.
const DEGENERACY_TOLERANCE: f64 = 1e-12;

pub fn centroid(points: &[Point3D]) -> Point3D {
    let sum = points.iter().fold(Point3D::origin(), |acc, p| acc + *p);
    sum * (1.0 / (points.len() as f64))
}

pub fn covariance(points: &[Point3D], centroid: &Point3D) -> Matrix3<f64> {
    points.iter().fold(Matrix3::zeros(), |m, p| {
        let r = Vector3::new(p.x - centroid.x, p.y - centroid.y, p.z - centroid.z);
        m + r * r.transpose()
    })
}

impl Plane {

    // Fit a plane to a collection of points.
    // Returns None if the points do not span a plane.
    pub fn from_points(points: &[Point3D]) -> Option<Plane> {
        if points.len() < 3 {
            return None;
        }

        let centroid = centroid(points);
        let m = covariance(points, &centroid);
        let (xx, xy, xz) = (m[(0,0)], m[(0,1)], m[(0,2)]);
        let (yy, yz, zz) = (m[(1,1)], m[(1,2)], m[(2,2)]);

        let det_x = yy*zz - yz*yz;
        let det_y = xx*zz - xz*xz;
        let det_z = xx*yy - xy*xy;
        let det_max = det_x.max(det_y).max(det_z);

        // Negated so that NaN counts as degenerate.
        let trace = xx + yy + zz;
        if !(det_max > DEGENERACY_TOLERANCE * trace * trace) {
            return None;
        }

        let dir = if det_max == det_x {
            Point3D { x: det_x, y: xz*yz - xy*zz, z: xy*yz - xz*yy }
        } else if det_max == det_y {
            Point3D { x: xz*yz - xy*zz, y: det_y, z: xy*xz - yz*xx }
        } else {
            Point3D { x: xy*yz - xz*yy, y: xy*xz - yz*xx, z: det_z }
        };

        let length = dir.length();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        let normal = dir * (1.0 / length);

        Some(Plane {
            a: normal.x,
            b: normal.y,
            c: normal.z,
            d: -normal.dot(&points[0]),
        })
    }
}
