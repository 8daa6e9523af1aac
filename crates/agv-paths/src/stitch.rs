//! Combining per-segment path pools into full routes.

use std::collections::HashSet;

use agv_core::Point;
use rand::{Rng, RngExt};

/// Concatenate segments that share their junction cells.
///
/// Segment `i + 1` is expected to start where segment `i` ends; the shared
/// cell is kept once.
pub fn join<S: AsRef<[Point]>>(segments: &[S]) -> Vec<Point> {
    let mut route: Vec<Point> = Vec::new();
    for seg in segments {
        let seg = seg.as_ref();
        let skip = usize::from(route.last().is_some() && route.last() == seg.first());
        route.extend_from_slice(&seg[skip..]);
    }
    route
}

/// Number of combinations in the Cartesian product of `pools`, saturating.
pub fn product_len(pools: &[Vec<Vec<Point>>]) -> usize {
    pools
        .iter()
        .fold(1usize, |acc, pool| acc.saturating_mul(pool.len()))
}

/// The first `cap` routes of the Cartesian product of `pools`, in odometer
/// order (last segment varies fastest).
pub fn product(pools: &[Vec<Vec<Point>>], cap: usize) -> Vec<Vec<Point>> {
    if pools.is_empty() || pools.iter().any(Vec::is_empty) {
        return Vec::new();
    }
    let total = product_len(pools).min(cap);
    let mut out = Vec::with_capacity(total);
    let mut digits = vec![0usize; pools.len()];
    let mut picked: Vec<&[Point]> = Vec::with_capacity(pools.len());

    while out.len() < total {
        picked.clear();
        picked.extend(digits.iter().zip(pools).map(|(&d, pool)| pool[d].as_slice()));
        out.push(join(&picked));

        // Advance the odometer.
        let mut i = pools.len();
        loop {
            if i == 0 {
                return out;
            }
            i -= 1;
            digits[i] += 1;
            if digits[i] < pools[i].len() {
                break;
            }
            digits[i] = 0;
        }
    }
    out
}

/// Cartesian product of `pools` capped at `cap` routes. When the product is
/// larger than `cap`, a uniform random subset of distinct combinations is
/// drawn instead of the first `cap`.
pub fn sample_product<R: Rng>(
    pools: &[Vec<Vec<Point>>],
    cap: usize,
    rng: &mut R,
) -> Vec<Vec<Point>> {
    if pools.is_empty() || pools.iter().any(Vec::is_empty) {
        return Vec::new();
    }
    if product_len(pools) <= cap {
        return product(pools, cap);
    }

    let mut chosen: HashSet<Vec<usize>> = HashSet::with_capacity(cap);
    let mut out = Vec::with_capacity(cap);
    let mut picked: Vec<&[Point]> = Vec::with_capacity(pools.len());
    // The product is strictly larger than `cap`, so distinct draws exist;
    // the attempt bound only guards against pathological luck.
    let mut attempts = cap.saturating_mul(20);
    while out.len() < cap && attempts > 0 {
        attempts -= 1;
        let digits: Vec<usize> = pools
            .iter()
            .map(|pool| rng.random_range(0..pool.len()))
            .collect();
        if !chosen.insert(digits.clone()) {
            continue;
        }
        picked.clear();
        picked.extend(digits.iter().zip(pools).map(|(&d, pool)| pool[d].as_slice()));
        out.push(join(&picked));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn p(r: i32, c: i32) -> Point {
        Point::new(r, c)
    }

    #[test]
    fn join_drops_shared_junction() {
        let a = vec![p(0, 0), p(0, 1)];
        let b = vec![p(0, 1), p(0, 2)];
        assert_eq!(join(&[a, b]), vec![p(0, 0), p(0, 1), p(0, 2)]);
    }

    #[test]
    fn product_enumerates_all_combinations() {
        let pools = vec![
            vec![vec![p(0, 0), p(0, 1)], vec![p(0, 0), p(1, 1)]],
            vec![vec![p(0, 1), p(0, 2)], vec![p(1, 1), p(0, 2)], vec![p(0, 2)]],
        ];
        assert_eq!(product_len(&pools), 6);
        let all = product(&pools, 100);
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], vec![p(0, 0), p(0, 1), p(0, 2)]);
        assert_eq!(product(&pools, 4).len(), 4);
    }

    #[test]
    fn product_with_empty_pool_is_empty() {
        let pools = vec![vec![vec![p(0, 0)]], vec![]];
        assert!(product(&pools, 10).is_empty());
    }

    #[test]
    fn sample_product_respects_cap_and_distinctness() {
        let seg = |c: i32| vec![p(0, 0), p(1, c)];
        let tail = |c: i32| vec![p(1, c), p(2, c)];
        let pools = vec![
            (0..10).map(seg).collect::<Vec<_>>(),
            (0..10).map(tail).collect::<Vec<_>>(),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let routes = sample_product(&pools, 15, &mut rng);
        assert_eq!(routes.len(), 15);
        let distinct: HashSet<_> = routes.iter().collect();
        assert_eq!(distinct.len(), 15);
    }
}
