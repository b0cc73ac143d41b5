use std::ops::{Add, Mul, Sub};

#[derive(Copy,Clone,Debug,PartialEq)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Point3D {
        Point3D { x, y, z }
    }

    pub fn origin() -> Point3D {
        Point3D { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn dot(&self, other: &Point3D) -> f64 {
        self.x*other.x + self.y*other.y + self.z*other.z
    }

    pub fn length(&self) -> f64 {
        f64::sqrt(self.dot(self))
    }
}

impl Add for Point3D {
    type Output = Point3D;
    fn add(self, other: Point3D) -> Point3D {
        Point3D { x: self.x + other.x, y: self.y + other.y, z: self.z + other.z }
    }
}

impl Sub for Point3D {
    type Output = Point3D;
    fn sub(self, other: Point3D) -> Point3D {
        Point3D { x: self.x - other.x, y: self.y - other.y, z: self.z - other.z }
    }
}

impl Mul<f64> for Point3D {
    type Output = Point3D;
    fn mul(self, k: f64) -> Point3D {
        Point3D { x: self.x * k, y: self.y * k, z: self.z * k }
    }
}

/// Implicit plane a·x + b·y + c·z + d = 0.
///
/// Planes produced by [`Plane::from_points`] always carry a unit normal. A plane
/// built by hand through the public fields may not, which is why distances
/// renormalize.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct Plane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Plane {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Plane {
        Plane { a, b, c, d }
    }

    pub fn normal(&self) -> Point3D {
        Point3D { x: self.a, y: self.b, z: self.c }
    }

    pub fn normal_length(&self) -> f64 {
        self.normal().length()
    }

    pub fn coefficients(&self) -> [f64;4] {
        [self.a, self.b, self.c, self.d]
    }

    // Angle in radians between the plane normal and the z axis, ignoring the
    // normal's orientation. Zero for a horizontal plane.
    pub fn angle_to_vertical(&self) -> f64 {
        let l = self.normal_length();
        if l == 0.0 {
            return f64::NAN;
        }
        f64::acos((self.c.abs() / l).min(1.0))
    }
}

#[derive(Clone,Debug,PartialEq)]
pub struct Bounds {
    pub lower: Point3D,
    pub upper: Point3D,
}

impl Bounds {
    pub fn of_points(points: &[Point3D]) -> Option<Bounds> {
        if points.is_empty() {
            return None;
        }
        let lower = Point3D {
            x: points.iter().map(|p| p.x).fold(0./0., f64::min),
            y: points.iter().map(|p| p.y).fold(0./0., f64::min),
            z: points.iter().map(|p| p.z).fold(0./0., f64::min),
        };
        let upper = Point3D {
            x: points.iter().map(|p| p.x).fold(0./0., f64::max),
            y: points.iter().map(|p| p.y).fold(0./0., f64::max),
            z: points.iter().map(|p| p.z).fold(0./0., f64::max),
        };
        Some(Bounds { lower, upper })
    }

    pub fn size(&self) -> Point3D {
        self.upper - self.lower
    }
}
