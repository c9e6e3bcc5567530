//! Scaling runs for the satellite radar.
//!
//! Times the locator over index windows of increasing width and the
//! satellite scan over increasing radii, to show how cost grows with the
//! number of indices and with R.

use std::time::Instant;

use num_bigint::BigUint;

use landscape_core::{Family, PowerDifference, PrimalityOracle};
use satellite_radar::{Granularity, IndexSource, SatelliteScanner, StarLocator};

/// Start of the locator windows; large enough that Q(n) has ~480 digits.
const WINDOW_START: u64 = 20_000_000_000;

/// Quadruplet base from the built-in catalog: four consecutive stars.
const STAR_BASE: u64 = 117_309_848;

fn main() {
    println!("================================================================");
    println!("  SCALING: locator and satellite scan for n^47 - (n-1)^47");
    println!("================================================================\n");

    let family = PowerDifference::default();
    let oracle = PrimalityOracle::default();

    bench_locator(&family, &oracle);
    bench_scan(&family, &oracle);
}

fn bench_locator(family: &PowerDifference, oracle: &PrimalityOracle) {
    println!("--- Locator: indices examined vs wall time ---");
    println!("{:>8} {:>8} {:>10} {:>12} {:>12}", "width", "stars", "rejected", "oracle", "secs");

    let locator = StarLocator::new(family, oracle);
    for width in [1_000u64, 5_000, 20_000] {
        let source = IndexSource::range(WINDOW_START, WINDOW_START + width);
        let start = Instant::now();
        match locator.find_stars_par(&source) {
            Ok(report) => println!(
                "{:>8} {:>8} {:>10} {:>12} {:>12.2}",
                width,
                report.stats.stars,
                report.stats.quick_rejected,
                report.stats.oracle_calls,
                start.elapsed().as_secs_f64()
            ),
            Err(e) => println!("{:>8} failed: {}", width, e),
        }
    }
    println!();
}

fn bench_scan(family: &PowerDifference, oracle: &PrimalityOracle) {
    println!("--- Satellite scan: radius vs wall time (4 stars) ---");
    println!(
        "{:>6} {:>12} {:>10} {:>11} {:>10} {:>10}",
        "R", "granularity", "candidates", "satellites", "secs", "ms/cand"
    );

    let locator = StarLocator::new(family, oracle);
    let source = IndexSource::range(STAR_BASE, STAR_BASE + 4);
    let stars = match locator.find_stars_par(&source) {
        Ok(report) => report.stars,
        Err(e) => {
            println!("could not locate stars: {}", e);
            return;
        }
    };
    if stars.is_empty() {
        println!("no stars at n={}..{}", STAR_BASE, STAR_BASE + 4);
        return;
    }

    for radius in [100u64, 500, 1000, 2000] {
        for granularity in [Granularity::PerStar, Granularity::PerCandidate] {
            let scanner = SatelliteScanner::new(oracle, family.admissibility(), granularity);
            let start = Instant::now();
            let mut candidates = 0;
            let mut satellites = 0;
            for star in &stars {
                match scanner.scan_with_stats(star, radius) {
                    Ok((_, stats)) => {
                        candidates += stats.candidates;
                        satellites += stats.satellites;
                    }
                    Err(e) => println!("n={}: {}", star.n, e),
                }
            }
            let secs = start.elapsed().as_secs_f64();
            println!(
                "{:>6} {:>12} {:>10} {:>11} {:>10.2} {:>10.3}",
                radius,
                format!("{:?}", granularity),
                candidates,
                satellites,
                secs,
                if candidates > 0 { 1000.0 * secs / candidates as f64 } else { 0.0 }
            );
        }
    }

    let digits: Vec<usize> = stars.iter().map(|s| s.digit_length).collect();
    println!("\nStars n={}.. have {:?} digits", BigUint::from(STAR_BASE), digits);
}
