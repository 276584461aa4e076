//! Dominant color clustering
//!
//! Bounded k-means over sampled RGB pixels. Centroid initialization is
//! random, so the RNG is injected: production callers pass a thread RNG,
//! tests pass a seeded PCG and assert structural invariants (population
//! sum, ordering) rather than exact centroids.

use std::collections::HashSet;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::color::{self, Rgb};

/// Upper bound on k-means refinement passes.
pub const MAX_ITERATIONS: usize = 10;

/// A representative color and the fraction of samples nearest to it.
///
/// Populations of the clusters returned by one extraction sum to 1.0
/// (within floating error).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ColorCluster {
    pub centroid: Rgb,
    pub population: f64,
}

/// Working centroid kept in floating point so means don't lose precision
/// across iterations.
#[derive(Debug, Clone, Copy)]
struct Centroid {
    r: f64,
    g: f64,
    b: f64,
}

impl Centroid {
    fn from_rgb(c: Rgb) -> Self {
        Centroid {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
        }
    }

    fn to_rgb(self) -> Rgb {
        Rgb {
            r: self.r.round().clamp(0.0, 255.0) as u8,
            g: self.g.round().clamp(0.0, 255.0) as u8,
            b: self.b.round().clamp(0.0, 255.0) as u8,
        }
    }

    fn distance_sq(&self, p: Rgb) -> f64 {
        let dr = self.r - p.r as f64;
        let dg = self.g - p.g as f64;
        let db = self.b - p.b as f64;
        dr * dr + dg * dg + db * db
    }
}

/// Cluster `pixels` into at most `k` dominant colors, sorted descending by
/// population share.
///
/// Empty input or `k == 0` yields an empty list, which downstream stages
/// treat as "no data, use the fallback palette". Clusters that end up with
/// no assigned samples are dropped.
pub fn dominant_colors<R: Rng + ?Sized>(pixels: &[Rgb], k: usize, rng: &mut R) -> Vec<ColorCluster> {
    if pixels.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut centroids = init_centroids(pixels, k, rng);
    let mut assignments = vec![0usize; pixels.len()];

    for iteration in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, &pixel) in pixels.iter().enumerate() {
            let nearest = nearest_centroid(&centroids, pixel);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }
        if !changed && iteration > 0 {
            debug!(iteration, "k-means converged early");
            break;
        }

        // Recompute each centroid as the mean of its assigned samples;
        // a centroid with no samples keeps its previous position.
        let mut sums = vec![(0.0f64, 0.0f64, 0.0f64, 0usize); centroids.len()];
        for (i, &pixel) in pixels.iter().enumerate() {
            let s = &mut sums[assignments[i]];
            s.0 += pixel.r as f64;
            s.1 += pixel.g as f64;
            s.2 += pixel.b as f64;
            s.3 += 1;
        }
        for (centroid, &(r, g, b, count)) in centroids.iter_mut().zip(&sums) {
            if count > 0 {
                let n = count as f64;
                *centroid = Centroid {
                    r: r / n,
                    g: g / n,
                    b: b / n,
                };
            }
        }
    }

    let mut counts = vec![0usize; centroids.len()];
    for &a in &assignments {
        counts[a] += 1;
    }

    let total = pixels.len() as f64;
    let mut clusters: Vec<ColorCluster> = centroids
        .iter()
        .zip(&counts)
        .filter(|(_, &count)| count > 0)
        .map(|(centroid, &count)| ColorCluster {
            centroid: centroid.to_rgb(),
            population: count as f64 / total,
        })
        .collect();

    clusters.sort_by(|a, b| {
        b.population
            .partial_cmp(&a.population)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!(
        requested_k = k,
        cluster_count = clusters.len(),
        samples = pixels.len(),
        "Clustering complete"
    );
    clusters
}

/// Pick up to `k` distinct sample indices as the starting centroids.
/// With fewer than `k` samples, effective k shrinks to what's available.
fn init_centroids<R: Rng + ?Sized>(pixels: &[Rgb], k: usize, rng: &mut R) -> Vec<Centroid> {
    if pixels.len() <= k {
        return pixels.iter().map(|&p| Centroid::from_rgb(p)).collect();
    }

    let mut chosen = HashSet::with_capacity(k);
    while chosen.len() < k {
        chosen.insert(rng.random_range(0..pixels.len()));
    }
    chosen
        .into_iter()
        .map(|i| Centroid::from_rgb(pixels[i]))
        .collect()
}

fn nearest_centroid(centroids: &[Centroid], pixel: Rgb) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let d = centroid.distance_sq(pixel);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Whether the two most populous clusters are far enough apart to use the
/// runner-up as an independent secondary color.
pub fn top_two_are_distinct(clusters: &[ColorCluster]) -> bool {
    match clusters {
        [first, second, ..] => color::colors_are_distinct(first.centroid, second.centroid),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    fn rng() -> Pcg64Mcg {
        Pcg64Mcg::seed_from_u64(42)
    }

    #[test]
    fn test_empty_input_yields_no_clusters() {
        assert!(dominant_colors(&[], 5, &mut rng()).is_empty());
    }

    #[test]
    fn test_zero_k_yields_no_clusters() {
        let pixels = vec![Rgb::new(10, 20, 30); 50];
        assert!(dominant_colors(&pixels, 0, &mut rng()).is_empty());
    }

    #[test]
    fn test_uniform_input_collapses_to_one_cluster() {
        let pixels = vec![Rgb::new(33, 100, 200); 20];
        let clusters = dominant_colors(&pixels, 2, &mut rng());
        assert_eq!(clusters.len(), 1);
        assert!((clusters[0].population - 1.0).abs() < 1e-9);
        assert_eq!(clusters[0].centroid, Rgb::new(33, 100, 200));
    }

    #[test]
    fn test_populations_sum_to_one() {
        let mut pixels = Vec::new();
        for i in 0..90u8 {
            pixels.push(Rgb::new(i, 255 - i, i / 2));
        }
        for k in 1..=6 {
            let clusters = dominant_colors(&pixels, k, &mut rng());
            let sum: f64 = clusters.iter().map(|c| c.population).sum();
            assert!((sum - 1.0).abs() < 1e-9, "k={} sum={}", k, sum);
        }
    }

    #[test]
    fn test_clusters_sorted_descending_by_population() {
        // 60 red-ish, 30 green-ish, 10 blue-ish
        let mut pixels = Vec::new();
        pixels.extend(std::iter::repeat(Rgb::new(250, 5, 5)).take(60));
        pixels.extend(std::iter::repeat(Rgb::new(5, 250, 5)).take(30));
        pixels.extend(std::iter::repeat(Rgb::new(5, 5, 250)).take(10));
        let clusters = dominant_colors(&pixels, 3, &mut rng());
        for pair in clusters.windows(2) {
            assert!(pair[0].population >= pair[1].population);
        }
        // Dominant cluster is the red mass
        assert!(clusters[0].centroid.r > 200);
        assert!((clusters[0].population - 0.6).abs() < 0.1);
    }

    #[test]
    fn test_k_larger_than_sample_count_shrinks() {
        let pixels = vec![Rgb::new(1, 2, 3), Rgb::new(200, 200, 200)];
        let clusters = dominant_colors(&pixels, 8, &mut rng());
        assert!(clusters.len() <= 2);
        let sum: f64 = clusters.iter().map(|c| c.population).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_separated_masses_recover_their_means() {
        let mut pixels = Vec::new();
        pixels.extend(std::iter::repeat(Rgb::new(240, 10, 10)).take(50));
        pixels.extend(std::iter::repeat(Rgb::new(10, 10, 240)).take(50));
        let clusters = dominant_colors(&pixels, 2, &mut rng());
        assert_eq!(clusters.len(), 2);
        assert!(top_two_are_distinct(&clusters));
        for cluster in &clusters {
            assert!((cluster.population - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_top_two_distinct_requires_two_clusters() {
        let one = vec![ColorCluster {
            centroid: Rgb::new(1, 2, 3),
            population: 1.0,
        }];
        assert!(!top_two_are_distinct(&one));
        assert!(!top_two_are_distinct(&[]));
    }
}
