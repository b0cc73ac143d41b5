//! RANSAC search for the dominant plane in a point cloud.
//!
//! Each iteration fits a plane through three distinct random points, counts the
//! points within `threshold` of it and keeps the candidate with the most
//! inliers. When the iterations are spent, the plane is refitted over the whole
//! winning inlier set.
//!
//! ```rust,ignore
//! let parameters = RansacParameters::default().with_threshold(0.05);
//! let mut search = RansacSearch::seeded(parameters, 42);
//! let consensus = search.run(&points);
//! if let Some(plane) = consensus.plane { ... }
//! ```

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::distance;
use super::error::{Error, Result};
use super::geometry::{Plane, Point3D};

pub const DEFAULT_MAX_ITERATIONS: usize = 3000;
pub const DEFAULT_THRESHOLD: f64 = 0.01;

const SAMPLE_SIZE: usize = 3;

#[derive(Clone,Debug,PartialEq)]
pub struct RansacParameters {
    /// Largest point-to-plane distance (inclusive) that counts as an inlier.
    pub threshold: f64,

    /// Upper bound on the number of iterations. The search runs at most
    /// half as many iterations as there are points.
    pub max_iterations: usize,
}

impl Default for RansacParameters {
    fn default() -> Self {
        RansacParameters {
            threshold: DEFAULT_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl RansacParameters {
    pub fn new(threshold: f64, max_iterations: usize) -> Self {
        RansacParameters { threshold, max_iterations }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.threshold >= 0.0) {
            return Err(Error::InvalidParameter(format!("threshold must be a non-negative number, got {}", self.threshold)));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter("iteration budget must be positive".to_string()));
        }
        Ok(())
    }

    pub fn iterations_for(&self, num_points: usize) -> usize {
        usize::min(self.max_iterations, num_points / 2)
    }
}

/// Best candidate seen so far.
///
/// Starts with no winner. A new inlier set replaces the current one only if it
/// is strictly larger, so among equally large sets the first one found wins.
#[derive(Clone,Debug,Default)]
pub struct SearchState {
    best: Option<Vec<usize>>,
    iterations: usize,
    degenerate_samples: usize,
}

impl SearchState {
    pub fn new() -> Self {
        SearchState::default()
    }

    /// Returns true if `inliers` became the new best set.
    pub fn offer(&mut self, inliers: Vec<usize>) -> bool {
        let better = match &self.best {
            None => true,
            Some(best) => inliers.len() > best.len(),
        };
        if better {
            trace!("New best candidate with {} inliers", inliers.len());
            self.best = Some(inliers);
        }
        better
    }

    pub fn best_count(&self) -> Option<usize> {
        self.best.as_ref().map(|b| b.len())
    }

    pub fn inliers(&self) -> &[usize] {
        self.best.as_deref().unwrap_or(&[])
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn degenerate_samples(&self) -> usize {
        self.degenerate_samples
    }

    /// Refit over the winning inlier set. Fewer than three inliers means no
    /// consensus and no plane.
    pub fn finish(self, points: &[Point3D]) -> Consensus {
        let SearchState { best, iterations, degenerate_samples } = self;
        let inliers = best.unwrap_or_default();

        let plane = if inliers.len() >= SAMPLE_SIZE {
            let inlier_points: Vec<Point3D> = inliers.iter().map(|&i| points[i]).collect();
            Plane::from_points(&inlier_points)
        } else {
            None
        };

        debug!("RANSAC finished after {} iterations ({} degenerate), {} of {} points are inliers",
            iterations, degenerate_samples, inliers.len(), points.len());

        Consensus { plane, inliers, iterations, degenerate_samples }
    }
}

#[derive(Clone,Debug)]
pub struct Consensus {
    /// Plane refitted over all inliers, if a consensus was found.
    pub plane: Option<Plane>,
    /// Indices of the winning inlier set.
    pub inliers: Vec<usize>,
    pub iterations: usize,
    pub degenerate_samples: usize,
}

pub struct RansacSearch<R: Rng> {
    parameters: RansacParameters,
    rng: R,
}

impl RansacSearch<StdRng> {
    pub fn seeded(parameters: RansacParameters, seed: u64) -> Self {
        RansacSearch::new(parameters, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(parameters: RansacParameters) -> Self {
        RansacSearch::new(parameters, StdRng::from_entropy())
    }
}

impl<R: Rng> RansacSearch<R> {
    pub fn new(parameters: RansacParameters, rng: R) -> Self {
        RansacSearch { parameters, rng }
    }

    pub fn parameters(&self) -> &RansacParameters {
        &self.parameters
    }

    pub fn iterations_for(&self, num_points: usize) -> usize {
        self.parameters.iterations_for(num_points)
    }

    /// Run a single iteration against `state`, returning the candidate plane
    /// unless the sample was degenerate.
    pub fn step(&mut self, points: &[Point3D], state: &mut SearchState) -> Option<Plane> {
        if points.len() < SAMPLE_SIZE {
            return None;
        }
        state.iterations += 1;

        let sample = draw_sample(&mut self.rng, points.len());
        match evaluate(points, sample, self.parameters.threshold) {
            Some((plane, inliers)) => {
                state.offer(inliers);
                Some(plane)
            },
            None => {
                state.degenerate_samples += 1;
                None
            },
        }
    }

    pub fn run(&mut self, points: &[Point3D]) -> Consensus {
        let mut state = SearchState::new();
        if points.len() >= SAMPLE_SIZE {
            for _ in 0..self.iterations_for(points.len()) {
                self.step(points, &mut state);
            }
        }
        state.finish(points)
    }

    /// Same search with the iterations spread over the rayon thread pool.
    ///
    /// Every iteration gets its own generator seeded from `self`, and equally
    /// large inlier sets are resolved in favour of the lower iteration index,
    /// so a seeded search gives the same result regardless of scheduling.
    pub fn run_parallel(&mut self, points: &[Point3D]) -> Consensus {
        if points.len() < SAMPLE_SIZE {
            return SearchState::new().finish(points);
        }

        let iterations = self.iterations_for(points.len());
        let seeds: Vec<u64> = (0..iterations).map(|_| self.rng.gen()).collect();
        let threshold = self.parameters.threshold;
        let n = points.len();

        let best = seeds.par_iter()
            .enumerate()
            .map(|(iteration, seed)| {
                let mut rng = StdRng::seed_from_u64(*seed);
                let sample = draw_sample(&mut rng, n);
                match evaluate(points, sample, threshold) {
                    Some((_, inliers)) => Candidate { iteration, inliers: Some(inliers), degenerate_samples: 0 },
                    None => Candidate { iteration, inliers: None, degenerate_samples: 1 },
                }
            })
            .reduce(Candidate::none, Candidate::merge);

        SearchState {
            best: best.inliers,
            iterations,
            degenerate_samples: best.degenerate_samples,
        }.finish(points)
    }
}

struct Candidate {
    iteration: usize,
    inliers: Option<Vec<usize>>,
    degenerate_samples: usize,
}

impl Candidate {
    fn none() -> Candidate {
        Candidate { iteration: usize::MAX, inliers: None, degenerate_samples: 0 }
    }

    fn merge(self, other: Candidate) -> Candidate {
        let degenerate_samples = self.degenerate_samples + other.degenerate_samples;
        let keep_self = match (&self.inliers, &other.inliers) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a.len() > b.len() || (a.len() == b.len() && self.iteration < other.iteration),
        };
        let winner = if keep_self { self } else { other };
        Candidate { degenerate_samples, ..winner }
    }
}

// Three distinct indices in 0..n, uniformly. Needs n >= 3.
fn draw_sample<R: Rng + ?Sized>(rng: &mut R, n: usize) -> [usize; SAMPLE_SIZE] {
    let mut sample = [0usize; SAMPLE_SIZE];
    let mut chosen = 0;
    while chosen < SAMPLE_SIZE {
        let idx = rng.gen_range(0..n);
        if !sample[..chosen].contains(&idx) {
            sample[chosen] = idx;
            chosen += 1;
        }
    }
    sample
}

fn evaluate(points: &[Point3D], sample: [usize; SAMPLE_SIZE], threshold: f64) -> Option<(Plane, Vec<usize>)> {
    let chosen = [points[sample[0]], points[sample[1]], points[sample[2]]];
    let plane = Plane::from_points(&chosen)?;
    let inliers = distance::inliers(points, &plane, threshold);
    Some((plane, inliers))
}

/// Estimate the dominant plane of `points`, or `None` if no three points agree
/// on one.
pub fn search<R: Rng>(points: &[Point3D], threshold: f64, max_iterations: usize, rng: R) -> Option<Plane> {
    RansacSearch::new(RansacParameters::new(threshold, max_iterations), rng)
        .run(points)
        .plane
}
