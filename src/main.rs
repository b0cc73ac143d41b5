extern crate getopts;
extern crate colored;

use getopts::{Matches, Options};
use std::env;
use std::path::Path;
use std::process;
use std::str::FromStr;
use colored::*;
use indicatif::ProgressBar;
use rand::rngs::StdRng;

use vagplan::{input, las, output};
use vagplan::{Bounds, Consensus, Error, Point3D, RansacParameters, RansacSearch, SearchState};
use vagplan::ransac::DEFAULT_MAX_ITERATIONS;

const VERSION: &'static str = env!("CARGO_PKG_VERSION");
const DEFAULT_OUTPUT: &'static str = "output.txt";

fn print_usage(program: &str, opts: Options) {
    let brief = format!("Usage: {} [options] <point file | las file>", program);
    print!("{}", opts.usage(&brief));
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("o", "output", "write the plane coefficients to FILE (default output.txt)", "FILE");
    opts.optopt("n", "iterations", "maximum number of RANSAC iterations (default 3000)", "N");
    opts.optopt("p", "threshold", "inlier distance threshold. Required for LAS input, overrides the point file otherwise.", "P");
    opts.optopt("s", "seed", "seed the random generator for a reproducible run", "SEED");
    opts.optopt("c", "classification", "LAS classification to use (default 2, ground)", "CLASS");
    opts.optflag("a", "all-points", "use every LAS point regardless of classification");
    opts.optflag("j", "parallel", "spread the iterations over all cores");
    opts.optflag("q", "quiet", "hide additional information while running");
    opts.optflag("h", "help", "show this help menu");
    let matches = match opts.parse(&args[1..]) {
        Ok(m) => { m }
        Err(f) => {
            eprintln!("[{}] {}", "ERROR".red(), f);
            print_usage(&program, opts);
            process::exit(1);
        }
    };
    if matches.opt_present("h") || matches.free.is_empty() {
        print_usage(&program, opts);
        return;
    }
    let verbose = !matches.opt_present("q");

    if verbose {
        println!("{} {}\n", "Vägplan".bold(), VERSION);
    }

    if let Err(e) = run(&matches, verbose) {
        eprintln!("[{}] {}", "ERROR".red(), e);
        process::exit(1);
    }
}

fn run(matches: &Matches, verbose: bool) -> vagplan::Result<()> {
    let module = "INPUT".green();

    let path = Path::new(&matches.free[0]);
    let output_path = matches.opt_str("o").unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let max_iterations = parse_opt::<usize>(matches, "n")?.unwrap_or(DEFAULT_MAX_ITERATIONS);
    let seed = parse_opt::<u64>(matches, "s")?;

    let (file_threshold, points) = if is_las(path) {
        let classification = if matches.opt_present("a") {
            None
        } else {
            Some(parse_opt::<u8>(matches, "c")?.unwrap_or(las::GROUND))
        };
        let (header, points) = las::read_points(path, classification)?;
        if verbose {
            println!("[{}] LAS {}.{}, point format {}, {} records", &module,
                header.version_major, header.version_minor, header.point_data_format_id, header.number_of_point_records);
        }
        (None, points)
    } else {
        let file = input::read_point_file(path)?;
        (Some(file.threshold), file.points)
    };

    let threshold = match parse_opt::<f64>(matches, "p")?.or(file_threshold) {
        Some(t) => t,
        None => return Err(Error::InvalidParameter("LAS input needs a distance threshold (-p)".to_string())),
    };
    let parameters = RansacParameters::new(threshold, max_iterations);
    parameters.validate()?;

    if verbose {
        println!("[{}] {} points read from {}", &module, points.len(), path.display());
        if let Some(bounds) = Bounds::of_points(&points) {
            let size = bounds.size();
            println!("[{}] Extent {:.2} x {:.2} x {:.2} m", &module, size.x, size.y, size.z);
        }
    }

    let consensus = match seed {
        Some(s) => estimate(RansacSearch::seeded(parameters, s), &points, matches.opt_present("j"), verbose),
        None => estimate(RansacSearch::from_entropy(parameters), &points, matches.opt_present("j"), verbose),
    };

    report(&consensus, &points, Path::new(&output_path), verbose)
}

fn estimate(mut search: RansacSearch<StdRng>, points: &[Point3D], parallel: bool, verbose: bool) -> Consensus {
    let module = "RANSAC".blue();
    let iterations = search.iterations_for(points.len());

    if verbose {
        println!("[{}] {} iterations, threshold {}{}", &module, iterations, search.parameters().threshold,
            if parallel { ", parallel" } else { "" });
    }

    if parallel {
        return search.run_parallel(points);
    }

    let bar = if verbose { ProgressBar::new(iterations as u64) } else { ProgressBar::hidden() };
    let mut state = SearchState::new();
    for _ in 0..iterations {
        search.step(points, &mut state);
        bar.inc(1);
    }
    bar.finish_and_clear();
    state.finish(points)
}

fn report(consensus: &Consensus, points: &[Point3D], output_path: &Path, verbose: bool) -> vagplan::Result<()> {
    let module = "OUT".red();

    let plane = match consensus.plane {
        Some(p) => p,
        None => {
            if verbose {
                println!("[{}] No plane found ({} iterations, {} degenerate samples)", &module,
                    consensus.iterations, consensus.degenerate_samples);
            }
            return Ok(());
        }
    };

    output::write_plane(output_path, &plane)?;

    if verbose {
        let share = 100.0 * (consensus.inliers.len() as f64) / (points.len() as f64);
        println!("[{}] {} inliers ({:.1}%), {} degenerate samples", &module,
            consensus.inliers.len(), share, consensus.degenerate_samples);
        println!("[{}] Plane {}", &module, output::format_plane(&plane).trim_end());
        println!("[{}] Tilt from horizontal: {:.3}°", &module, plane.angle_to_vertical().to_degrees());
        println!("[{}] Written to {}", &module, output_path.display());
    }
    Ok(())
}

fn is_las(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.eq_ignore_ascii_case("las") || e.eq_ignore_ascii_case("laz"),
        None => false,
    }
}

fn parse_opt<T: FromStr>(matches: &Matches, name: &str) -> vagplan::Result<Option<T>> {
    match matches.opt_str(name) {
        None => Ok(None),
        Some(s) => s.parse::<T>()
            .map(Some)
            .map_err(|_| Error::InvalidParameter(format!("invalid value {:?} for -{}", s, name))),
    }
}
