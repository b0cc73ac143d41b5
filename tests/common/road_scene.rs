use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vagplan::{Plane, Point3D};

/// The road surface used by the synthetic scenes: slightly tilted, about
/// 1.7 m below the sensor.
pub fn road_plane() -> Plane {
    let (a, b, c, d) = (-0.0147, -0.0015, 1.0, 1.7);
    let l = f64::sqrt(a*a + b*b + c*c);
    Plane::new(a / l, b / l, c / l, d / l)
}

/// Road points with up to `noise` metres of jitter along the normal, followed
/// by `clutter` points well above the road (vegetation, cars, walls).
pub fn road_scene(seed: u64, road: usize, clutter: usize, noise: f64) -> Vec<Point3D> {
    let plane = road_plane();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(road + clutter);

    for i in 0..(road + clutter) {
        let x: f64 = rng.gen_range(-20.0..20.0);
        let y: f64 = rng.gen_range(-8.0..8.0);
        let z = -(plane.a*x + plane.b*y + plane.d) / plane.c;
        let lift: f64 = if i >= road {
            rng.gen_range(0.5..4.0)
        } else if noise > 0.0 {
            rng.gen_range(-noise..=noise)
        } else {
            0.0
        };
        points.push(Point3D::new(x, y, z + lift));
    }
    points
}
